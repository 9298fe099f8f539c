//! covstat server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `COVSTAT_*` environment variables, opens the SQLite history cache, and
//! serves the JSON API over HTTP.
//!
//! # One-shot mode
//!
//! ```sh
//! cargo run -p covstat-server -- --ask "total cases italy today"
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use chrono::Utc;
use clap::Parser;
use covstat_engine::Engine;
use covstat_server::{AppState, LiveBackend, ServerConfig, chart::SvgChartRenderer};
use covstat_sources::{EcdcSource, WorldometerSource};
use covstat_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about = "covstat insight query server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Answer a single query on stdout and exit.
  #[arg(long, value_name = "TEXT")]
  ask: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("COVSTAT"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let engine = Arc::new(open_engine(&server_cfg).await?);
  if let Err(e) = engine.freshness().load().await {
    warn!(error = %e, "could not load reference set from store");
  }

  if let Some(text) = cli.ask {
    let request_id = Uuid::new_v4().to_string();
    let outcome = engine.answer(&text, &request_id).await;
    println!("{}", outcome.describe());
    return Ok(());
  }

  // Prime the cache; a failure here is retried on the first query.
  if let Err(e) = engine.freshness().ensure_fresh(Utc::now().date_naive()).await {
    warn!(error = %e, "startup refresh failed");
  }

  let app = covstat_server::router(AppState { engine });
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

async fn open_engine(cfg: &ServerConfig) -> anyhow::Result<Engine<LiveBackend>> {
  let store_path = expand_tilde(&cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let historical = EcdcSource::new(&cfg.historical_url, cfg.fetch_timeout())
    .context("failed to build historical source")?;
  let live = WorldometerSource::new(&cfg.live_url, cfg.fetch_timeout())
    .context("failed to build live source")?;
  let renderer = SvgChartRenderer::new(expand_tilde(&cfg.chart_dir));

  Ok(Engine::new(store, historical, live, renderer, cfg.freshness()))
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
