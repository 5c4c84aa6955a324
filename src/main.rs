use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use beatset::dataset::{self, Checkpoint};
use beatset::eval;
use beatset::util::init_logging;

#[derive(Parser)]
#[command(name = "beatset", version, about = "osu! beatmap archives to beat-tracking datasets")]
struct Cli {
    /// Show debug logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert .osz archives into audio plus beat annotation pairs
    Convert {
        /// Directory containing .osz archives.
        input: PathBuf,
        /// Dataset output directory.
        #[arg(short, long, default_value = "dataset")]
        output: PathBuf,
        /// Resume marker file; pass the same path again to continue an
        /// interrupted run.
        #[arg(long)]
        checkpoint: Option<PathBuf>,
    },
    /// Export per-song metadata to CSV
    Info {
        /// Directory containing .osz archives.
        input: PathBuf,
        /// Output CSV path.
        #[arg(short, long, default_value = "song_info.csv")]
        output: PathBuf,
    },
    /// Sort archives into folders by timing-point separation
    Partition {
        /// Directory containing .osz archives.
        input: PathBuf,
        /// Directory receiving the per-class folders.
        #[arg(short, long, default_value = "partitioned")]
        output: PathBuf,
        /// Timing points closer than this count as hard to track.
        #[arg(long, default_value_t = 5000.0)]
        min_separation_ms: f64,
    },
    /// Score beat tracker predictions against extracted ground truth
    Evaluate {
        /// Directory with <id>_beats.txt and <id>_downbeats.txt files.
        predictions: PathBuf,
        /// Directory with <id>_beats_metered.txt ground-truth files.
        annotations: PathBuf,
        /// Output CSV path.
        #[arg(short, long, default_value = "evaluation.csv")]
        output: PathBuf,
    },
    /// Dump each archive's uninherited timing points as JSON
    TimingPoints {
        /// Directory containing .osz archives.
        input: PathBuf,
        /// Output directory.
        #[arg(short, long, default_value = "timing")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Command::Convert {
            input,
            output,
            checkpoint,
        } => {
            let mut checkpoint = checkpoint.map(Checkpoint::load);
            let converted = dataset::convert_directory(&input, &output, checkpoint.as_mut())?;
            tracing::info!("converted {converted} beatmaps into {}", output.display());
        }
        Command::Info { input, output } => {
            let written = dataset::export_song_info(&input, &output)?;
            tracing::info!("wrote {written} rows to {}", output.display());
        }
        Command::Partition {
            input,
            output,
            min_separation_ms,
        } => {
            let summary = dataset::partition_directory(&input, &output, min_separation_ms)?;
            tracing::info!(
                "partitioned: {} single, {} close, {} spread, {} failed",
                summary.single,
                summary.close,
                summary.spread,
                summary.failed
            );
        }
        Command::Evaluate {
            predictions,
            annotations,
            output,
        } => {
            let evaluated = eval::evaluate_directory(&predictions, &annotations, &output)?;
            tracing::info!("evaluated {evaluated} songs into {}", output.display());
        }
        Command::TimingPoints { input, output } => {
            let exported = dataset::export_timing_points(&input, &output)?;
            tracing::info!("exported timing points for {exported} beatmaps");
        }
    }

    Ok(())
}
