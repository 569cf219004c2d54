//! Operations portal server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store, and serves the JSON API under `/api`.
//!
//! Signup only ever creates employees. Promote a reviewer with:
//!
//! ```text
//! portal set-role --email boss@example.com --role manager
//! ```

mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use axum::Router;
use clap::{Parser, Subcommand};
use portal_api::{AppState, IdentityKeys};
use portal_core::{role::Role, store::UserStore};
use portal_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "Internal operations portal")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (default).
  Serve,
  /// Change the role of an existing account.
  SetRole {
    #[arg(long)]
    email: String,
    /// employee, manager or admin.
    #[arg(long)]
    role:  Role,
  },
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
  let cfg = ServerConfig::load(&cli.config)?;

  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(cfg, store).await,
    Command::SetRole { email, role } => set_role(&store, &email, role).await,
  }
}

async fn serve(cfg: ServerConfig, store: SqliteStore) -> anyhow::Result<()> {
  let identity = IdentityKeys::new(cfg.jwt_secret.as_bytes(), cfg.token_ttl());
  let state = AppState::new(Arc::new(store), cfg.overlap_policy(), identity);

  let app = Router::new()
    .nest("/api", portal_api::api_router(state))
    .layer(TimeoutLayer::new(cfg.request_timeout()))
    .layer(TraceLayer::new_for_http());

  let address = cfg.address();
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

async fn set_role(store: &SqliteStore, email: &str, role: Role) -> anyhow::Result<()> {
  let user = store
    .set_role(email, role)
    .await
    .context("failed to update role")?
    .with_context(|| format!("no account with email {email}"))?;
  println!("{} is now {}", user.email, user.role);
  Ok(())
}
