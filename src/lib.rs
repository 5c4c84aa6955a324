pub mod archive;
pub mod audio;
pub mod chart;
pub mod dataset;
pub mod error;
pub mod eval;
pub mod util;
