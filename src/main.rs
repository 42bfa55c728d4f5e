//! # Planscan CLI
//!
//! ```bash
//! planscan --config ./config/planscan.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `planscan scan` | Run one scan, update the cache, print a summary |
//! | `planscan diff` | Scan without writing and show changes vs the cache |
//! | `planscan serve` | Start the scheduled scan loop and the HTTP API |
//! | `planscan token issue <email>` | Mint a bearer token for API access |

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

use planscan::auth::TokenAuthorizer;
use planscan::cache::CacheStore;
use planscan::config::{self, Config};
use planscan::diff::diff_scans;
use planscan::models::ChangeSet;
use planscan::notes::NoteStore;
use planscan::scan::ScanOrchestrator;
use planscan::{sched, server, source};

/// Discipline-aware project file scanner with a JSON cache and an
/// authenticated HTTP API.
#[derive(Parser)]
#[command(
    name = "planscan",
    about = "Discipline-aware project file scanner with a JSON cache and an authenticated HTTP API",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/planscan.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one scan, write the cache, and print a per-discipline summary.
    Scan {
        /// Print the resulting change set as JSON instead of a summary.
        #[arg(long)]
        json: bool,
    },

    /// Run a scan without touching the cache and report what would change.
    Diff,

    /// Start the scheduled scan loop and the HTTP API server.
    Serve,

    /// Manage API bearer tokens.
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Mint a signed bearer token for an email address.
    ///
    /// The token only grants access while the email is listed in the
    /// authorized-emails file.
    Issue {
        email: String,

        /// Token lifetime in days (defaults to auth.token_ttl_days).
        #[arg(long)]
        ttl_days: Option<i64>,
    },
}

fn build_orchestrator(
    config: &Arc<Config>,
) -> Result<(ScanOrchestrator, Arc<Mutex<NoteStore>>)> {
    let source = source::from_config(config)?;
    let notes = Arc::new(Mutex::new(NoteStore::load(&config.notes_file)));
    let orchestrator = ScanOrchestrator::new(config.clone(), source, notes.clone());
    Ok((orchestrator, notes))
}

fn print_changes(changes: &ChangeSet) {
    println!(
        "  changes: {} added, {} modified, {} removed",
        changes.added.len(),
        changes.modified.len(),
        changes.removed.len()
    );
    for (discipline, name) in &changes.added {
        println!("    + {discipline}/{name}");
    }
    for (discipline, name) in &changes.modified {
        println!("    ~ {discipline}/{name}");
    }
    for (discipline, name) in &changes.removed {
        println!("    - {discipline}/{name}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Arc::new(config::load_config(&cli.config)?);

    match cli.command {
        Commands::Scan { json } => {
            let (orchestrator, _notes) = build_orchestrator(&config)?;
            let cache = CacheStore::new(&config.cache_file);
            let changes = orchestrator.run_and_store(&cache).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&changes)?);
            } else {
                println!("scan written to {}", cache.path().display());
                print_changes(&changes);
            }
        }

        Commands::Diff => {
            let (orchestrator, _notes) = build_orchestrator(&config)?;
            let cache = CacheStore::new(&config.cache_file);
            let previous = cache.read()?;
            let current = orchestrator.run_once().await;
            let changes = diff_scans(previous.as_ref(), &current);

            if previous.is_none() {
                println!("no cached scan to compare against");
            }
            print_changes(&changes);
        }

        Commands::Serve => {
            let (orchestrator, notes) = build_orchestrator(&config)?;
            let cache = Arc::new(CacheStore::new(&config.cache_file));
            let authorizer = Arc::new(TokenAuthorizer::from_config(&config.auth)?);

            let trigger =
                sched::spawn_scan_loop(orchestrator, cache.clone(), config.scan.interval_secs);

            server::run_server(config, cache, notes, authorizer, trigger).await?;
        }

        Commands::Token {
            action: TokenAction::Issue { email, ttl_days },
        } => {
            let authorizer = TokenAuthorizer::from_config(&config.auth)?;
            if !authorizer.is_email_authorized(&email) {
                eprintln!(
                    "warning: '{email}' is not in the authorized-emails file; \
                     the token will be rejected until it is added"
                );
            }
            let ttl = chrono::Duration::days(ttl_days.unwrap_or(config.auth.token_ttl_days));
            println!("{}", authorizer.issue(&email, ttl));
        }
    }

    Ok(())
}
