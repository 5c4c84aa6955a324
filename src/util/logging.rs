use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize the logging system with tracing.
///
/// The `verbose` flag controls whether debug logs are shown. Logs go to
/// stderr; this is a one-shot batch tool, so there is no file sink.
pub fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("beatset=debug,warn")
    } else {
        EnvFilter::new("beatset=info,warn")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();

    Ok(())
}
