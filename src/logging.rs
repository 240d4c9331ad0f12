use tracing::{Level, level_filters::LevelFilter};
use tracing_subscriber::{
    EnvFilter, FmtSubscriber,
    fmt::{format::FmtSpan, time::LocalTime},
};

/// Initialize process logging from `RUST_LOG`, falling back to `level` when it is unset.
///
/// Only covers the binary's own lines (startup, accept loop). Each middleware logs
/// through its own logger.
pub fn init_logging(level: Level) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_timer(LocalTime::rfc_3339())
        .with_ansi(true)
        .with_level(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    tracing::debug!("Logging system initialized with default level: {}", level);
    Ok(())
}
