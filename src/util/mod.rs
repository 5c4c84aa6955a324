mod file;
mod logging;

pub use file::find_file_case_insensitive;
pub use logging::init_logging;
