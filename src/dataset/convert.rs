use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::archive::extract_beatmap;
use crate::audio::probe_duration_ms;
use crate::chart::{BeatEvent, derive_beat_grid};

use super::{Checkpoint, list_archives, song_name};

/// Convert every .osz archive in `input` into an audio file plus a beat
/// annotation file under `output` (`audio/` and `annotations/`).
///
/// Archives are visited in file-name order. When a checkpoint is supplied,
/// items up to and including its marker are skipped, and the marker advances
/// after each successful conversion; failed items are not recorded, so an
/// interrupted run retries them. Returns the number of converted beatmaps.
pub fn convert_directory(
    input: &Path,
    output: &Path,
    mut checkpoint: Option<&mut Checkpoint>,
) -> Result<usize> {
    let archives = list_archives(input)?;
    let audio_dir = output.join("audio");
    let annotation_dir = output.join("annotations");

    let start = checkpoint
        .as_ref()
        .and_then(|cp| cp.last_processed())
        .and_then(|last| {
            archives
                .iter()
                .position(|p| p.file_name().is_some_and(|n| n.to_string_lossy() == last))
        })
        .map(|i| i + 1)
        .unwrap_or(0);

    if start > 0 {
        tracing::info!("resuming at item {}/{}", start + 1, archives.len());
    }

    let mut converted = 0;
    for path in &archives[start..] {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match process_beatmap(path, &audio_dir, &annotation_dir) {
            Ok(beats) => {
                converted += 1;
                tracing::info!("converted {name} ({beats} beats)");
                if let Some(cp) = checkpoint.as_deref_mut() {
                    cp.record(&name)?;
                }
            }
            Err(e) => tracing::warn!("skipping {name}: {e:#}"),
        }
    }

    Ok(converted)
}

/// Convert a single archive. Outputs are written only after extraction,
/// probing and derivation have all succeeded, so a failed item leaves
/// nothing behind. Returns the number of derived beats.
fn process_beatmap(osz: &Path, audio_dir: &Path, annotation_dir: &Path) -> Result<usize> {
    let song = song_name(osz);

    let beatmap = extract_beatmap(osz)?;
    let audio_path = beatmap.audio_path()?;
    let duration_ms = probe_duration_ms(&audio_path)?;
    let beats = derive_beat_grid(&beatmap.chart.breakpoints, duration_ms)?;

    fs::create_dir_all(audio_dir)
        .with_context(|| format!("cannot create {}", audio_dir.display()))?;
    fs::create_dir_all(annotation_dir)
        .with_context(|| format!("cannot create {}", annotation_dir.display()))?;

    let ext = audio_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("mp3");
    let audio_dest = audio_dir.join(format!("{song}.{ext}"));
    fs::copy(&audio_path, &audio_dest)
        .with_context(|| format!("cannot copy audio to {}", audio_dest.display()))?;

    let annotation_path = annotation_dir.join(format!("{song}_beats_metered.txt"));
    write_annotations(&annotation_path, &beats)?;

    Ok(beats.len())
}

/// Write beat events as tab-separated `time_seconds<TAB>beat_in_bar` rows,
/// time printed with six decimals to match existing ground-truth files.
pub fn write_annotations(path: &Path, beats: &[BeatEvent]) -> Result<()> {
    let mut out = String::with_capacity(beats.len() * 12);
    for beat in beats {
        out.push_str(&format!("{:.6}\t{}\n", beat.time_seconds, beat.beat_in_bar));
    }
    fs::write(path, out).with_context(|| format!("cannot write {}", path.display()))
}
