use serde::{Deserialize, Serialize};

/// One uninherited timing point: a tempo marker that starts a new segment.
///
/// `time` may be negative (audio pre-roll before the nominal chart start).
/// `beat_length` and `meter` are taken as written in the chart; validation
/// happens at the grid-derivation boundary, not here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingBreakpoint {
    /// Milliseconds from track start.
    pub time: f64,
    /// Milliseconds per beat at this tempo.
    pub beat_length: f64,
    /// Beats per bar.
    pub meter: i32,
}

/// Descriptive fields from the `[Metadata]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartMetadata {
    pub title: String,
    pub artist: String,
    pub creator: String,
    pub tags: String,
}

impl Default for ChartMetadata {
    fn default() -> Self {
        Self {
            title: "Unknown".to_string(),
            artist: "Unknown".to_string(),
            creator: "Unknown".to_string(),
            tags: String::new(),
        }
    }
}

/// The subset of an .osu chart this toolkit cares about.
#[derive(Debug, Clone)]
pub struct Chart {
    pub metadata: ChartMetadata,
    /// Audio file named by the `[General]` section, relative to the archive root.
    pub audio_filename: Option<String>,
    /// Uninherited timing points, in file order.
    pub breakpoints: Vec<TimingBreakpoint>,
    /// Every row of the `[TimingPoints]` section, inherited ones included.
    pub timing_point_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    General,
    Metadata,
    TimingPoints,
    Other,
}

/// Parse the sections of an .osu chart.
///
/// Malformed timing rows (fewer than seven fields, unparsable numerics) are
/// skipped; charts in the wild carry plenty of them and a bad row must not
/// fail the whole beatmap. They still count towards `timing_point_count`.
pub fn parse_chart(source: &str) -> Chart {
    let mut metadata = ChartMetadata::default();
    let mut audio_filename = None;
    let mut breakpoints = Vec::new();
    let mut timing_point_count = 0;
    let mut section = Section::Other;

    for raw in source.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
            section = match name {
                "General" => Section::General,
                "Metadata" => Section::Metadata,
                "TimingPoints" => Section::TimingPoints,
                _ => Section::Other,
            };
            continue;
        }

        match section {
            Section::General => {
                if let Some(value) = line.strip_prefix("AudioFilename:") {
                    audio_filename = Some(value.trim().to_string());
                }
            }
            Section::Metadata => {
                if let Some((key, value)) = line.split_once(':') {
                    let value = value.trim();
                    match key.trim() {
                        "Title" => metadata.title = value.to_string(),
                        "Artist" => metadata.artist = value.to_string(),
                        "Creator" => metadata.creator = value.to_string(),
                        "Tags" => metadata.tags = value.to_string(),
                        _ => {}
                    }
                }
            }
            Section::TimingPoints => {
                timing_point_count += 1;
                if let Some(breakpoint) = parse_timing_row(line) {
                    breakpoints.push(breakpoint);
                }
            }
            Section::Other => {}
        }
    }

    Chart {
        metadata,
        audio_filename,
        breakpoints,
        timing_point_count,
    }
}

/// Parse one `[TimingPoints]` row, returning the breakpoint only if the row
/// is uninherited (field 6 == 1). Inherited points adjust secondary
/// parameters and carry no tempo of their own.
fn parse_timing_row(line: &str) -> Option<TimingBreakpoint> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < 7 {
        return None;
    }
    let time = fields[0].trim().parse::<f64>().ok()?;
    let beat_length = fields[1].trim().parse::<f64>().ok()?;
    let meter = fields[2].trim().parse::<i32>().ok()?;
    let uninherited = fields[6].trim().parse::<i32>().ok()? == 1;

    uninherited.then_some(TimingBreakpoint {
        time,
        beat_length,
        meter,
    })
}
