use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber for the simulator binary.
///
/// `RUST_LOG` overrides the default filter. Output is JSON when
/// `UNO_LOG_JSON=1`, human-readable otherwise.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,uno_coordinator=debug"));

    let json = std::env::var("UNO_LOG_JSON").is_ok_and(|v| v == "1");
    let base = fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(base.with_ansi(false).json()).init();
    } else {
        registry.with(base).init();
    }
}
