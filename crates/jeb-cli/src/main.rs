//! `jeb`: management commands for the JEB importer.
//!
//! # Usage
//!
//! ```text
//! jeb import --type startups
//! jeb sync-all --pretty
//! jeb serve
//! jeb hash-password
//! ```
//!
//! Settings come from `jeb.toml` (or `--config`) and `JEB_*` environment
//! variables. Logs go to stderr; stdout carries only JSON.

mod settings;

use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::{Parser, Subcommand, ValueEnum};
use jeb_api::AppState;
use jeb_core::entity::EntityKind;
use jeb_store_sqlite::SqliteStore;
use jeb_sync::{EntityReport, Syncer};
use rand_core::OsRng;
use serde::Serialize;
use settings::Settings;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "jeb", author, version, about = "Import data from the JEB API")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "jeb.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Import one entity type and print its JSON summary.
  Import {
    #[arg(long = "type", value_enum)]
    kind: ImportType,
  },
  /// Sync every entity type and print the per-entity JSON results.
  SyncAll {
    /// Indent the JSON output.
    #[arg(long)]
    pretty: bool,
  },
  /// Serve the operator API.
  Serve,
  /// Print the argon2 hash of a password read from stdin.
  HashPassword,
}

#[derive(Clone, Copy, ValueEnum)]
enum ImportType {
  Users,
  Startups,
  Events,
  News,
}

impl From<ImportType> for EntityKind {
  fn from(value: ImportType) -> Self {
    match value {
      ImportType::Users => EntityKind::User,
      ImportType::Startups => EntityKind::Startup,
      ImportType::Events => EntityKind::Event,
      ImportType::News => EntityKind::News,
    }
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if let Command::HashPassword = cli.command {
    hash_password()?;
    return Ok(ExitCode::SUCCESS);
  }

  let settings = Settings::load(&cli.config)?;
  let store_path = settings.store_path();
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let syncer = Syncer::new(Arc::new(store), settings.sync_config()?)
    .context("failed to build the JEB API client")?;

  match cli.command {
    Command::Import { kind } => {
      let kind = EntityKind::from(kind);
      eprintln!("Importing {}...", kind.resource());
      let report = EntityReport::from(syncer.sync(kind).await);
      print_json(&report, true)?;
      if report.ok() {
        eprintln!("Import of {} finished.", kind.resource());
        Ok(ExitCode::SUCCESS)
      } else {
        eprintln!("Import of {} failed.", kind.resource());
        Ok(ExitCode::FAILURE)
      }
    }
    Command::SyncAll { pretty } => {
      let report = syncer.sync_all().await;
      print_json(&report, pretty)?;
      if report.all_ok() {
        eprintln!("Full sync finished.");
        Ok(ExitCode::SUCCESS)
      } else {
        let failed: Vec<&str> = report.failed().map(EntityKind::resource).collect();
        eprintln!("One or more syncs failed: {}", failed.join(", "));
        Ok(ExitCode::FAILURE)
      }
    }
    Command::Serve => {
      let state = AppState {
        syncer,
        auth: Arc::new(settings.auth_config()?),
      };
      let app = jeb_api::router(state);
      let address = settings.address();

      tracing::info!("Listening on http://{address}");
      let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
      axum::serve(listener, app).await.context("server error")?;
      Ok(ExitCode::SUCCESS)
    }
    Command::HashPassword => Ok(ExitCode::SUCCESS),
  }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
  let text = if pretty {
    serde_json::to_string_pretty(value)?
  } else {
    serde_json::to_string(value)?
  };
  println!("{text}");
  Ok(())
}

fn hash_password() -> anyhow::Result<()> {
  let password = read_password()?;
  let salt = SaltString::generate(&mut OsRng);
  let hash = Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
    .to_string();
  println!("{hash}");
  Ok(())
}

/// Read one line from stdin. The prompt goes to stderr.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  eprint!("Password: ");
  io::stderr().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}
