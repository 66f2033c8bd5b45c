use anyhow::{Context, Result};
use sparkify_dwh::{
    pipeline::{Pipeline, Stage},
    Dialect, EtlConfig, ScriptWarehouse,
};
use std::{env, path::PathBuf};
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

const USAGE: &str = "usage: render-sql [config.yaml] [redshift|duckdb] [output.sql]";

/// Print (or write) every statement a full run would execute, without touching a
/// warehouse.
fn main() -> Result<()> {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "warn".to_string());
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(log_level.parse().unwrap_or(Level::WARN.into())),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let path = EtlConfig::resolve_path(args.next());
    let dialect = match args.next() {
        Some(name) => name.parse::<Dialect>().context(USAGE)?,
        None => Dialect::Redshift,
    };
    let output = args.next().map(PathBuf::from);

    // The file's own backend does not matter here; only the chosen dialect does.
    let config = EtlConfig::read(&path).context(USAGE)?;
    config.validate_script(dialect)?;

    let warehouse = ScriptWarehouse::new(dialect);
    Pipeline::new(&config).run_stages(&warehouse, &Stage::ALL)?;

    match output {
        Some(path) => {
            warehouse.write_to(&path)?;
            info!(path = %path.display(), "script written");
        }
        None => print!("{}", warehouse.script()),
    }
    Ok(())
}
