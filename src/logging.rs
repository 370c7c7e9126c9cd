use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. Logs go to stderr so report tables on
/// stdout stay readable; `RUST_LOG` overrides the default level.
pub fn init_logging(debug: bool) {
    let default = if debug { "vahan_report=debug" } else { "vahan_report=info" };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
