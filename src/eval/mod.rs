// Evaluation of an external beat tracker's output against the ground truth
// extracted from beatmaps.

mod metrics;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

pub use metrics::{
    BeatMetrics, FMEASURE_WINDOW, PHASE_TOLERANCE, TEMPO_TOLERANCE, aml_t, cml_t, evaluate_beats,
    f_measure,
};

/// One CSV row: a song's beat and downbeat scores.
#[derive(Debug, Clone, Serialize)]
pub struct EvalRow {
    pub song_id: String,
    pub beat_fmeasure: f64,
    pub beat_cmlt: f64,
    pub beat_amlt: f64,
    pub downbeat_fmeasure: f64,
    pub downbeat_cmlt: f64,
    pub downbeat_amlt: f64,
}

/// Evaluate every annotated song that has predictions.
///
/// Annotations are `<id>_beats_metered.txt` files (tab-separated time and
/// beat-in-bar, downbeats being the rows with beat 1); predictions are
/// `<id>_beats.txt` and `<id>_downbeats.txt` with one timestamp per line.
/// Songs missing either prediction file are skipped. The output CSV carries
/// one row per song plus a final MEAN row averaging each metric. Returns the
/// number of evaluated songs.
pub fn evaluate_directory(
    predictions: &Path,
    annotations: &Path,
    out_csv: &Path,
) -> Result<usize> {
    let mut rows = Vec::new();

    for (song_id, annotation_path) in annotation_files(annotations)? {
        let beat_path = predictions.join(format!("{song_id}_beats.txt"));
        let downbeat_path = predictions.join(format!("{song_id}_downbeats.txt"));
        if !beat_path.is_file() || !downbeat_path.is_file() {
            tracing::debug!("no predictions for {song_id}, skipping");
            continue;
        }

        let (gt_beats, gt_downbeats) = load_annotations(&annotation_path)?;
        let detected_beats = load_times(&beat_path)?;
        let detected_downbeats = load_times(&downbeat_path)?;

        let beat = evaluate_beats(&detected_beats, &gt_beats);
        let downbeat = evaluate_beats(&detected_downbeats, &gt_downbeats);
        rows.push(EvalRow {
            song_id,
            beat_fmeasure: beat.fmeasure,
            beat_cmlt: beat.cmlt,
            beat_amlt: beat.amlt,
            downbeat_fmeasure: downbeat.fmeasure,
            downbeat_cmlt: downbeat.cmlt,
            downbeat_amlt: downbeat.amlt,
        });
    }

    let evaluated = rows.len();
    if let Some(mean) = mean_row(&rows) {
        rows.push(mean);
    }

    let mut writer = csv::Writer::from_path(out_csv)
        .with_context(|| format!("cannot create {}", out_csv.display()))?;
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(evaluated)
}

/// Annotation files in `dir`, sorted by song id.
fn annotation_files(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("cannot read directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(song_id) = name.strip_suffix("_beats_metered.txt") {
            files.push((song_id.to_string(), path.clone()));
        }
    }
    files.sort();

    Ok(files)
}

/// Load a ground-truth annotation file, splitting out the downbeats.
fn load_annotations(path: &Path) -> Result<(Vec<f64>, Vec<f64>)> {
    let content =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;

    let mut beats = Vec::new();
    let mut downbeats = Vec::new();
    for line in content.lines() {
        let mut fields = line.split_whitespace();
        let (Some(time), Some(beat)) = (fields.next(), fields.next()) else {
            continue;
        };
        let time: f64 = time
            .parse()
            .with_context(|| format!("bad beat time {time:?} in {}", path.display()))?;
        let beat: u32 = beat
            .parse()
            .with_context(|| format!("bad beat index {beat:?} in {}", path.display()))?;

        beats.push(time);
        if beat == 1 {
            downbeats.push(time);
        }
    }
    beats.sort_by(|a, b| a.total_cmp(b));
    downbeats.sort_by(|a, b| a.total_cmp(b));

    Ok((beats, downbeats))
}

/// Load a prediction file: one timestamp per line, extra columns ignored.
fn load_times(path: &Path) -> Result<Vec<f64>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;

    let mut times = Vec::new();
    for line in content.lines() {
        let Some(first) = line.split_whitespace().next() else {
            continue;
        };
        let time: f64 = first
            .parse()
            .with_context(|| format!("bad timestamp {first:?} in {}", path.display()))?;
        times.push(time);
    }
    times.sort_by(|a, b| a.total_cmp(b));

    Ok(times)
}

fn mean_row(rows: &[EvalRow]) -> Option<EvalRow> {
    if rows.is_empty() {
        return None;
    }
    let n = rows.len() as f64;
    let mean = |f: fn(&EvalRow) -> f64| rows.iter().map(f).sum::<f64>() / n;

    Some(EvalRow {
        song_id: "MEAN".to_string(),
        beat_fmeasure: mean(|r| r.beat_fmeasure),
        beat_cmlt: mean(|r| r.beat_cmlt),
        beat_amlt: mean(|r| r.beat_amlt),
        downbeat_fmeasure: mean(|r| r.downbeat_fmeasure),
        downbeat_cmlt: mean(|r| r.downbeat_cmlt),
        downbeat_amlt: mean(|r| r.downbeat_amlt),
    })
}
