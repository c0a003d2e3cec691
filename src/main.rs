mod accounts;
mod config;
mod error;
mod models;
mod scraper;
mod storage;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::accounts::AccountStore;
use crate::config::AppConfig;
use crate::error::{FieldError, ScrapeError};
use crate::models::{AccountRecord, ScrapeOutcome};
use crate::scraper::http_client::HttpClient;
use crate::scraper::SummonerScraper;
use crate::storage::Repository;

#[derive(Parser)]
#[command(name = "lol-accounts", about = "League account table with scraped profile stats", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Store an account and fetch its stats
    Add {
        #[arg(long)]
        id: i64,
        /// In-game display name (leave empty to skip scraping)
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        region: String,
        #[arg(long)]
        username: String,
        #[arg(long, env = "LOLACC_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Delete a stored account
    Remove { id: i64 },

    /// Show one stored account with fresh stats
    Show {
        id: i64,
        #[arg(long)]
        json: bool,
    },

    /// Batch-scrape every stored account
    List {
        #[arg(long)]
        json: bool,
    },

    /// Look up a profile without storing anything
    Scrape { region: String, name: String },

    /// Apply schema migrations
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "lol_accounts=info,warn",
        1 => "lol_accounts=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load()?;

    match cli.command {
        Command::Scrape { region, name } => {
            let scraper = SummonerScraper::new(&config.scraper).context("Failed to build scraper")?;
            let (outcome, name) = scraper.scrape_account(&name, &region).await;
            match outcome {
                ScrapeOutcome::Found(stats) => println!(
                    "{} ({}): level {}, {}, {} games",
                    name, region, stats.level, stats.rank, stats.games_played
                ),
                ScrapeOutcome::Malformed(ScrapeError::UnexpectedStructure(errors)) => {
                    let fields: Vec<_> = errors.iter().map(FieldError::field).collect();
                    println!("{} ({}): unexpected page structure in {}", name, region, fields.join(", "));
                }
                other => println!("{} ({}): {}", name, region, other.label()),
            }
        }

        Command::Migrate => {
            let repo = Repository::open(&config.storage.db_path)?;
            repo.run_migrations()?;
            println!("Migrations applied. {} accounts stored.", repo.account_count()?);
        }

        Command::Add { id, name, region, username, password } => {
            let mut store = open_store(&config)?;
            let (account, handle) = store.add(AccountRecord::new(id, name, region, username, password))?;
            info!("Account {} saved", id);

            if let Some(handle) = handle {
                handle.await.context("stats fetch task failed")?;
            }
            print_account(&account.lock().await.clone());
        }

        Command::Remove { id } => {
            let mut store = open_store(&config)?;
            if !store.remove(&AccountRecord::new(id, "", "", "", ""))? {
                bail!("No account with id {}", id);
            }
            println!("Account {} removed.", id);
        }

        Command::Show { id, json } => {
            let mut store = open_store(&config)?;
            let mut record = AccountRecord::new(id, "", "", "", "");
            if !store.reload(&mut record)? {
                bail!("No account with id {}", id);
            }
            let (account, handle) = store.create(
                record.id,
                record.display_name,
                record.region,
                record.login_username,
                record.login_secret,
            );
            if let Some(handle) = handle {
                handle.await.context("stats fetch task failed")?;
            }

            let record = account.lock().await.clone();
            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                print_account(&record);
            }
        }

        Command::List { json } => {
            let mut store = open_store(&config)?;
            store.load_all()?;
            if store.is_empty() {
                println!("No accounts — run `lol-accounts add` first.");
                return Ok(());
            }
            store.refresh_all().await;

            let records = store.snapshot().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                println!("{} accounts:", records.len());
                for record in &records {
                    print_account(record);
                }
            }
        }
    }

    Ok(())
}

fn open_store(config: &AppConfig) -> Result<AccountStore<HttpClient>> {
    let repo = Repository::open(&config.storage.db_path)?;
    if config.storage.run_migrations {
        repo.run_migrations()?;
    }
    let scraper = SummonerScraper::new(&config.scraper).context("Failed to build scraper")?;
    Ok(AccountStore::new(repo, Arc::new(scraper)))
}

fn print_account(record: &AccountRecord) {
    let name = if record.has_display_name() { record.display_name.as_str() } else { "—" };
    let stats = match &record.fetched_data {
        Some(s) => format!("level {:>4} | {:<16} | {:>5} games", s.level, s.rank, s.games_played),
        None => "no data".to_string(),
    };
    println!("  #{:<4} {:<20} {:<6} {:<16} {}", record.id, name, record.region, record.login_username, stats);
}
