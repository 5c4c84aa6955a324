use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::archive::extract_beatmap;

use super::{list_archives, song_name};

/// Dump each archive's uninherited timing points as pretty-printed JSON and
/// copy its audio track alongside, for tooling that consumes raw breakpoints
/// instead of derived beat grids. Returns the number of exported beatmaps.
pub fn export_timing_points(input: &Path, output: &Path) -> Result<usize> {
    let archives = list_archives(input)?;
    let audio_dir = output.join("audio");
    let json_dir = output.join("timing_points");

    let mut exported = 0;
    for path in &archives {
        match export_one(path, &audio_dir, &json_dir) {
            Ok(()) => {
                exported += 1;
                tracing::info!("exported timing points for {}", path.display());
            }
            Err(e) => tracing::warn!("skipping {}: {e:#}", path.display()),
        }
    }

    Ok(exported)
}

fn export_one(osz: &Path, audio_dir: &Path, json_dir: &Path) -> Result<()> {
    let song = song_name(osz);

    let beatmap = extract_beatmap(osz)?;
    let audio_path = beatmap.audio_path()?;
    let json = serde_json::to_string_pretty(&beatmap.chart.breakpoints)?;

    fs::create_dir_all(audio_dir)
        .with_context(|| format!("cannot create {}", audio_dir.display()))?;
    fs::create_dir_all(json_dir)
        .with_context(|| format!("cannot create {}", json_dir.display()))?;

    let ext = audio_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("mp3");
    fs::copy(&audio_path, audio_dir.join(format!("{song}.{ext}")))
        .with_context(|| format!("cannot copy audio for {song}"))?;

    let json_path = json_dir.join(format!("{song}_uninherited.json"));
    fs::write(&json_path, json).with_context(|| format!("cannot write {}", json_path.display()))
}
