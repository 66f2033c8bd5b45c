use anyhow::Result;
use sparkify_dwh::{
    pipeline::{open_and_run, Stage},
    EtlConfig,
};
use std::env;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

/// Drop and re-create every warehouse table, leaving them empty.
fn main() -> Result<()> {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(log_level.parse().unwrap_or(Level::INFO.into())),
        )
        .init();

    let path = EtlConfig::resolve_path(env::args().nth(1));
    let config = EtlConfig::load(&path)?;

    let report = open_and_run(&config, &[Stage::ResetSchema])?;
    info!(elapsed = ?report.elapsed, "tables created");
    Ok(())
}
