mod grid;
mod parser;

pub use grid::{BeatEvent, derive_beat_grid};
pub use parser::{Chart, ChartMetadata, TimingBreakpoint, parse_chart};
