use crate::error::DatasetError;

use super::TimingBreakpoint;

/// One derived beat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatEvent {
    /// Seconds from track start.
    pub time_seconds: f64,
    /// 1-based position within the bar, cycling up to the meter of the
    /// segment that generated this beat.
    pub beat_in_bar: u32,
}

/// Derive the complete beat grid for a track.
///
/// Each uninherited timing point opens a segment that runs until the next
/// point (the last one runs until `duration_ms`). Within a segment, beats are
/// spaced `beat_length` ms apart and `beat_in_bar` restarts at 1: a tempo or
/// meter change re-anchors the downbeat to the breakpoint's own phase rather
/// than carrying the previous segment's position over. Beats at negative
/// times (pre-roll) are stepped through but not emitted, which keeps the
/// first emitted beat phase-aligned.
///
/// Breakpoints are sorted internally, so callers need not pre-sort. The clock
/// advances by repeated addition (`t += beat_length`) instead of the closed
/// form `start + k * beat_length`; annotations regenerated for an existing
/// dataset must keep the same floating-point drift near segment ends.
pub fn derive_beat_grid(
    breakpoints: &[TimingBreakpoint],
    duration_ms: f64,
) -> Result<Vec<BeatEvent>, DatasetError> {
    for bp in breakpoints {
        if bp.meter < 1 {
            return Err(DatasetError::InvalidBreakpoint(format!(
                "meter must be a positive integer, got {} at {} ms",
                bp.meter, bp.time
            )));
        }
        if !(bp.beat_length > 0.0) {
            return Err(DatasetError::InvalidBreakpoint(format!(
                "beat length must be positive, got {} at {} ms",
                bp.beat_length, bp.time
            )));
        }
    }

    let mut points = breakpoints.to_vec();
    points.sort_by(|a, b| a.time.total_cmp(&b.time));

    let mut events = Vec::new();
    for (i, start) in points.iter().enumerate() {
        let segment_end = points
            .get(i + 1)
            .map_or(duration_ms, |next| next.time)
            .min(duration_ms);
        let meter = start.meter as u32;

        let mut beat_in_bar: u32 = 1;
        let mut t = start.time;
        while t < segment_end {
            if t >= 0.0 {
                events.push(BeatEvent {
                    time_seconds: t / 1000.0,
                    beat_in_bar,
                });
            }
            beat_in_bar = (beat_in_bar % meter) + 1;
            t += start.beat_length;
        }
    }

    Ok(events)
}
