use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::archive::extract_beatmap;
use crate::audio::probe_duration_ms;

use super::{list_archives, song_name};

/// One metadata CSV row per chart.
///
/// `variation_rating` is `(uninherited_count - 1) / duration_seconds`: tempo
/// changes per second of audio, zero for a song with a single steady tempo.
#[derive(Debug, Clone, Serialize)]
pub struct SongInfoRow {
    pub song_name: String,
    pub title: String,
    pub artist: String,
    pub creator: String,
    pub tags: String,
    pub num_timing_points: usize,
    pub num_uninherited_points: usize,
    /// Empty when the audio file is missing or unreadable.
    pub duration_seconds: Option<f64>,
    pub variation_rating: Option<f64>,
}

/// Write one CSV row per parsable archive in `input`. Unlike the converter,
/// a chart whose audio cannot be probed still gets a row; only archives with
/// no readable chart are skipped. Returns the number of rows written.
pub fn export_song_info(input: &Path, out_csv: &Path) -> Result<usize> {
    let archives = list_archives(input)?;
    let mut writer = csv::Writer::from_path(out_csv)
        .with_context(|| format!("cannot create {}", out_csv.display()))?;

    let mut written = 0;
    for path in &archives {
        match collect_song_info(path) {
            Ok(row) => {
                writer.serialize(&row)?;
                written += 1;
            }
            Err(e) => tracing::warn!("skipping {}: {e:#}", path.display()),
        }
    }
    writer.flush()?;

    Ok(written)
}

fn collect_song_info(path: &Path) -> Result<SongInfoRow> {
    let beatmap = extract_beatmap(path)?;
    let chart = &beatmap.chart;

    let duration_seconds = match beatmap.audio_path() {
        Ok(audio_path) => match probe_duration_ms(&audio_path) {
            Ok(ms) => Some(ms / 1000.0),
            Err(e) => {
                tracing::debug!("no duration for {}: {e}", path.display());
                None
            }
        },
        Err(e) => {
            tracing::debug!("no audio for {}: {e}", path.display());
            None
        }
    };

    let num_uninherited = chart.breakpoints.len();
    let variation_rating = duration_seconds
        .filter(|d| *d > 0.0)
        .map(|d| (num_uninherited as f64 - 1.0) / d);

    Ok(SongInfoRow {
        song_name: song_name(path),
        title: chart.metadata.title.clone(),
        artist: chart.metadata.artist.clone(),
        creator: chart.metadata.creator.clone(),
        tags: chart.metadata.tags.clone(),
        num_timing_points: chart.timing_point_count,
        num_uninherited_points: num_uninherited,
        duration_seconds,
        variation_rating,
    })
}
