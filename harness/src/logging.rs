use tracing_subscriber::EnvFilter;

/// Log to stderr, filtered by `RUST_LOG` or else by `level`. Stdout is left
/// for program output.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
