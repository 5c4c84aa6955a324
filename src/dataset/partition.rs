use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::archive::read_breakpoints;

/// How a beatmap's uninherited timing points are spread over the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingClass {
    /// Exactly one tempo for the whole song.
    SingleTimingPoint,
    /// Several tempi with at least one pair closer than the separation
    /// threshold; hard for beat trackers to follow.
    MultipleClose,
    /// Several tempi, all comfortably apart.
    MultipleSpread,
}

impl TimingClass {
    /// Classify by the timestamps of a chart's uninherited timing points.
    /// Zero points is degenerate and lands in `MultipleSpread`.
    pub fn classify(times: &[f64], min_separation_ms: f64) -> Self {
        if times.len() == 1 {
            return Self::SingleTimingPoint;
        }
        let mut sorted = times.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        if sorted.windows(2).any(|w| w[1] - w[0] < min_separation_ms) {
            Self::MultipleClose
        } else {
            Self::MultipleSpread
        }
    }

    /// Output subdirectory for this class.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::SingleTimingPoint => "single_timing_point",
            Self::MultipleClose => "multiple_timings_close",
            Self::MultipleSpread => "multiple_timings_spread",
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PartitionSummary {
    pub single: usize,
    pub close: usize,
    pub spread: usize,
    pub failed: usize,
}

/// Sort the archives in `input` into per-class subdirectories of `output`,
/// moving the files. Reads timing points straight out of each zip without
/// extracting it. Returns the per-class counts.
pub fn partition_directory(
    input: &Path,
    output: &Path,
    min_separation_ms: f64,
) -> Result<PartitionSummary> {
    let mut summary = PartitionSummary::default();

    for path in super::list_archives(input)? {
        match partition_one(&path, output, min_separation_ms) {
            Ok(class) => {
                match class {
                    TimingClass::SingleTimingPoint => summary.single += 1,
                    TimingClass::MultipleClose => summary.close += 1,
                    TimingClass::MultipleSpread => summary.spread += 1,
                }
                tracing::info!("{} -> {}", path.display(), class.dir_name());
            }
            Err(e) => {
                summary.failed += 1;
                tracing::warn!("skipping {}: {e:#}", path.display());
            }
        }
    }

    Ok(summary)
}

fn partition_one(path: &Path, output: &Path, min_separation_ms: f64) -> Result<TimingClass> {
    let breakpoints = read_breakpoints(path)?;
    let times: Vec<f64> = breakpoints.iter().map(|b| b.time).collect();
    let class = TimingClass::classify(&times, min_separation_ms);

    let dest_dir = output.join(class.dir_name());
    fs::create_dir_all(&dest_dir)
        .with_context(|| format!("cannot create {}", dest_dir.display()))?;

    let file_name = path.file_name().context("archive has no file name")?;
    let dest = dest_dir.join(file_name);
    fs::rename(path, &dest)
        .with_context(|| format!("cannot move archive to {}", dest.display()))?;

    Ok(class)
}
