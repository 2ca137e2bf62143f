//! campus-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) and `CAMPUS_*`
//! environment variables, opens the SQLite store, and serves the JSON API
//! over HTTP.
//!
//! # Bootstrapping
//!
//! The first administrator has to be created out of band:
//!
//! ```
//! cargo run -p campus-server -- create-admin "Head Office" office@school.test
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use campus_api::AppState;
use campus_core::{
  store::UserStore as _,
  user::{NewUser, RecordStatus, Role},
};
use campus_server::ServerConfig;
use campus_store_sqlite::SqliteStore;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Campus school administration server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Create an administrator account. The password is read from stdin.
  CreateAdmin {
    /// Display name.
    name:  String,
    email: String,
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

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("CAMPUS"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;
  let api_settings = server_cfg
    .api_settings()
    .context("invalid configuration")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if let Some(Command::CreateAdmin { name, email }) = cli.command {
    return create_admin(&store, name, email).await;
  }

  let state = AppState::new(Arc::new(store), api_settings);
  let app = campus_server::router(state);
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

async fn create_admin(
  store: &SqliteStore,
  name: String,
  email: String,
) -> anyhow::Result<()> {
  let password = read_password()?;
  anyhow::ensure!(!password.is_empty(), "password must not be empty");

  let password_hash = campus_api::auth::hash_password(&password)
    .context("failed to hash password")?;
  let user = store
    .add_user(NewUser {
      name,
      email,
      role: Role::Admin,
      status: RecordStatus::Active,
      password_hash,
    })
    .await
    .context("failed to create administrator")?;

  tracing::info!(user_id = %user.user_id, email = %user.email, "administrator created");
  println!("{}", user.user_id);
  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_owned())
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
