use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter, e.g. `stagesync=debug`
pub const LOG_ENV: &str = "STAGESYNC_LOG";

/// Install the stderr subscriber. `STAGESYNC_LOG` wins over `-v`.
pub fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
