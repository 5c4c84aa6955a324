use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;
use zip::ZipArchive;

use crate::chart::{Chart, TimingBreakpoint, parse_chart};
use crate::error::DatasetError;
use crate::util::find_file_case_insensitive;

/// A beatmap archive unpacked into a scoped temporary directory.
///
/// The extracted files live exactly as long as this value; dropping it (on
/// success or failure alike) removes the temporary directory.
pub struct ExtractedBeatmap {
    _tempdir: TempDir,
    archive_path: PathBuf,
    root: PathBuf,
    pub chart: Chart,
    pub chart_path: PathBuf,
}

impl ExtractedBeatmap {
    /// Locate the audio file referenced by the chart's `[General]` section,
    /// tolerating case mismatches between chart and archive.
    pub fn audio_path(&self) -> Result<PathBuf, DatasetError> {
        let name =
            self.chart
                .audio_filename
                .as_deref()
                .ok_or_else(|| DatasetError::MissingAudioFile {
                    archive: self.archive_path.clone(),
                    name: "(chart names no audio file)".to_string(),
                })?;

        find_file_case_insensitive(&self.root, name).ok_or_else(|| {
            DatasetError::MissingAudioFile {
                archive: self.archive_path.clone(),
                name: name.to_string(),
            }
        })
    }
}

/// Unpack an .osz archive and parse the first chart inside it.
///
/// When an archive ships several difficulties, the first .osu member wins;
/// they all share the same audio and timing.
pub fn extract_beatmap(path: &Path) -> Result<ExtractedBeatmap> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mut zip = ZipArchive::new(file).map_err(|e| DatasetError::MalformedArchive {
        path: path.to_path_buf(),
        source: e,
    })?;

    let tempdir = tempfile::tempdir().context("cannot create extraction directory")?;
    zip.extract(tempdir.path())
        .map_err(|e| DatasetError::MalformedArchive {
            path: path.to_path_buf(),
            source: e,
        })?;

    let chart_name =
        first_chart_member(&mut zip).ok_or_else(|| DatasetError::MissingChartFile {
            archive: path.to_path_buf(),
        })?;
    let chart_path = tempdir.path().join(&chart_name);
    let source = read_chart_text(&chart_path)?;
    let chart = parse_chart(&source);

    Ok(ExtractedBeatmap {
        root: tempdir.path().to_path_buf(),
        _tempdir: tempdir,
        archive_path: path.to_path_buf(),
        chart,
        chart_path,
    })
}

/// Read the uninherited timing points of an archive without unpacking it.
/// Used by the partitioner, which only classifies and moves files.
pub fn read_breakpoints(path: &Path) -> Result<Vec<TimingBreakpoint>> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mut zip = ZipArchive::new(file).map_err(|e| DatasetError::MalformedArchive {
        path: path.to_path_buf(),
        source: e,
    })?;

    let index = (0..zip.len())
        .find(|&i| {
            zip.by_index(i)
                .map(|member| member.name().ends_with(".osu"))
                .unwrap_or(false)
        })
        .ok_or_else(|| DatasetError::MissingChartFile {
            archive: path.to_path_buf(),
        })?;

    let mut member = zip
        .by_index(index)
        .map_err(|e| DatasetError::MalformedArchive {
            path: path.to_path_buf(),
            source: e,
        })?;
    let mut bytes = Vec::new();
    member
        .read_to_end(&mut bytes)
        .with_context(|| format!("cannot read chart from {}", path.display()))?;

    Ok(parse_chart(&String::from_utf8_lossy(&bytes)).breakpoints)
}

fn first_chart_member<R: Read + io::Seek>(zip: &mut ZipArchive<R>) -> Option<String> {
    (0..zip.len()).find_map(|i| {
        let member = zip.by_index(i).ok()?;
        member
            .name()
            .ends_with(".osu")
            .then(|| member.name().to_string())
    })
}

/// Charts are nominally UTF-8, but older ones occasionally are not; fall
/// back to a lossy decode rather than failing the beatmap.
fn read_chart_text(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(source) => Ok(source),
        Err(e) if e.kind() == io::ErrorKind::InvalidData => {
            let bytes =
                fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        Err(e) => Err(e).with_context(|| format!("cannot read {}", path.display())),
    }
}
