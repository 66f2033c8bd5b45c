use anyhow::Result;
use sparkify_dwh::{
    pipeline::{open_and_run, Stage},
    transform::Derivation,
    EtlConfig,
};
use std::env;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let mut filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sparkify_dwh=info"));
    if let Ok(level) = env::var("LOG_LEVEL") {
        filter = filter.add_directive(level.parse().unwrap_or(Level::INFO.into()));
    }
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) load config ──────────────────────────────────────────────
    let path = EtlConfig::resolve_path(env::args().nth(1));
    let config = EtlConfig::load(&path)?;

    // ─── 3) reset, load staging, derive ──────────────────────────────
    let report =
        open_and_run(&config, &Stage::ALL).inspect_err(|e| error!("run failed: {e:#}"))?;

    if let Some(load) = report.load {
        info!(events = load.events, songs = load.songs, "staging rows");
    }
    if let Some(transform) = &report.transform {
        for d in Derivation::ALL {
            if let Some(rows) = transform.rows_for(d) {
                info!(table = d.target().name(), rows, "warehouse rows");
            }
        }
    }
    info!(elapsed = ?report.elapsed, "done");
    Ok(())
}
