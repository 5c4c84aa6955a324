//! Beat-tracking accuracy metrics.
//!
//! Matches the conventions of the usual beat evaluation toolkits: F-measure
//! with a ±70 ms window, and the continuity metrics CMLt/AMLt with 17.5 %
//! phase and tempo tolerances. All functions expect their inputs sorted
//! ascending; the report layer sorts after loading.

/// Half-width of the F-measure matching window, in seconds.
pub const FMEASURE_WINDOW: f64 = 0.07;
/// Allowed deviation of a detection from its annotation, as a fraction of
/// the local inter-annotation interval.
pub const PHASE_TOLERANCE: f64 = 0.175;
/// Allowed deviation of the inter-detection interval from the local
/// inter-annotation interval, as a fraction of the latter.
pub const TEMPO_TOLERANCE: f64 = 0.175;

/// Scores for one detection sequence against one annotation sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatMetrics {
    pub fmeasure: f64,
    pub cmlt: f64,
    pub amlt: f64,
}

/// Evaluate detected beats against ground-truth annotations.
pub fn evaluate_beats(detections: &[f64], annotations: &[f64]) -> BeatMetrics {
    BeatMetrics {
        fmeasure: f_measure(detections, annotations),
        cmlt: cml_t(detections, annotations),
        amlt: aml_t(detections, annotations),
    }
}

/// F-measure with one-to-one greedy matching inside a ±70 ms window.
pub fn f_measure(detections: &[f64], annotations: &[f64]) -> f64 {
    if detections.is_empty() && annotations.is_empty() {
        return 1.0;
    }

    let mut true_positives = 0usize;
    let mut ai = 0usize;
    for &d in detections {
        while ai < annotations.len() && annotations[ai] < d - FMEASURE_WINDOW {
            ai += 1;
        }
        if ai < annotations.len() && (annotations[ai] - d).abs() <= FMEASURE_WINDOW {
            true_positives += 1;
            ai += 1;
        }
    }

    let false_positives = detections.len() - true_positives;
    let false_negatives = annotations.len() - true_positives;
    let denominator = 2 * true_positives + false_positives + false_negatives;
    if denominator == 0 {
        1.0
    } else {
        2.0 * true_positives as f64 / denominator as f64
    }
}

/// Continuity at the correct metrical level, total: the fraction of
/// detections that are phase- and tempo-consistent with the annotations,
/// normalized by the longer of the two sequences.
pub fn cml_t(detections: &[f64], annotations: &[f64]) -> f64 {
    if detections.is_empty() && annotations.is_empty() {
        return 1.0;
    }
    let flags = correct_flags(detections, annotations);
    let denominator = detections.len().max(annotations.len());
    flags.iter().filter(|&&ok| ok).count() as f64 / denominator as f64
}

/// Continuity at allowed metrical levels, total: the best CMLt over the
/// annotation sequence and its metrical variations (offbeat, double tempo,
/// half tempo at both phases).
pub fn aml_t(detections: &[f64], annotations: &[f64]) -> f64 {
    let mut best = cml_t(detections, annotations);
    for variation in metrical_variations(annotations) {
        best = best.max(cml_t(detections, &variation));
    }
    best
}

/// Mark each detection as correct or not. A detection is correct when it is
/// within the phase tolerance of its nearest annotation and the local
/// inter-detection interval is within the tempo tolerance of the local
/// inter-annotation interval. Both intervals need a neighbour, so sequences
/// shorter than two beats score zero.
fn correct_flags(detections: &[f64], annotations: &[f64]) -> Vec<bool> {
    let mut flags = vec![false; detections.len()];
    if detections.len() < 2 || annotations.len() < 2 {
        return flags;
    }

    for (i, &d) in detections.iter().enumerate() {
        let k = nearest_index(annotations, d);
        let annotation_interval = if k > 0 {
            annotations[k] - annotations[k - 1]
        } else {
            annotations[k + 1] - annotations[k]
        };
        if annotation_interval <= 0.0 {
            continue;
        }

        let detection_interval = if i > 0 {
            detections[i] - detections[i - 1]
        } else {
            detections[1] - detections[0]
        };

        let phase_ok = (d - annotations[k]).abs() < PHASE_TOLERANCE * annotation_interval;
        let tempo_ok =
            (detection_interval - annotation_interval).abs() < TEMPO_TOLERANCE * annotation_interval;
        flags[i] = phase_ok && tempo_ok;
    }

    flags
}

/// Index of the element of `xs` closest to `v`. `xs` must be non-empty and
/// sorted.
fn nearest_index(xs: &[f64], v: f64) -> usize {
    match xs.binary_search_by(|x| x.total_cmp(&v)) {
        Ok(i) => i,
        Err(0) => 0,
        Err(i) if i >= xs.len() => xs.len() - 1,
        Err(i) => {
            if v - xs[i - 1] <= xs[i] - v {
                i - 1
            } else {
                i
            }
        }
    }
}

/// Metrical variations a tracker is commonly off by: the offbeat, double
/// tempo, and half tempo starting on either beat.
fn metrical_variations(annotations: &[f64]) -> Vec<Vec<f64>> {
    let offbeat: Vec<f64> = annotations
        .windows(2)
        .map(|w| (w[0] + w[1]) / 2.0)
        .collect();

    let mut double = Vec::with_capacity(annotations.len() * 2);
    for w in annotations.windows(2) {
        double.push(w[0]);
        double.push((w[0] + w[1]) / 2.0);
    }
    if let Some(&last) = annotations.last() {
        double.push(last);
    }

    let half_even: Vec<f64> = annotations.iter().copied().step_by(2).collect();
    let half_odd: Vec<f64> = annotations.iter().copied().skip(1).step_by(2).collect();

    vec![offbeat, double, half_even, half_odd]
}
