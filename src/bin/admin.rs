//! CLI administration tool for tinylink.
//!
//! Reads the same database the server writes, without going through HTTP.
//!
//! # Usage
//!
//! ```bash
//! # Check database connection
//! cargo run --bin admin -- db check
//!
//! # Totals across all records
//! cargo run --bin admin -- stats
//!
//! # One record with its effective visit count
//! cargo run --bin admin -- show aB3_x9
//! ```
//!
//! # Environment Variables
//!
//! Same as the server: `DATABASE_URL` (or `DB_*` components), and optionally
//! `REDIS_URL` so `show` can include visits not yet flushed.

use tinylink::application::services::StatsService;
use tinylink::config::{Config, mask_connection_string};
use tinylink::infrastructure::cache::{CacheService, NullCache, RedisCache};
use tinylink::infrastructure::persistence::PgUrlRepository;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for inspecting tinylink.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show totals across all short URLs
    Stats,

    /// Show one short URL with its effective visit count
    Show {
        /// Short code to look up
        code: String,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let pool = PgPool::connect(&config.database_url)
        .await
        .with_context(|| {
            format!(
                "Failed to connect to {}",
                mask_connection_string(&config.database_url)
            )
        })?;

    match cli.command {
        Commands::Stats => handle_stats(&pool).await?,
        Commands::Show { code } => handle_show(&config, pool, &code).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

/// Prints record, expiry and durable visit totals.
async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "Statistics".bright_blue().bold());
    println!();

    let (records, expired, visits): (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*),
            COUNT(*) FILTER (WHERE expires_at IS NOT NULL AND expires_at <= NOW()),
            COALESCE(SUM(visits), 0)::BIGINT
        FROM urls
        "#,
    )
    .fetch_one(pool)
    .await?;

    println!(
        "  Short URLs:      {}",
        records.to_string().bright_green().bold()
    );
    println!("  Expired:         {}", expired.to_string().yellow());
    println!(
        "  Durable visits:  {}",
        visits.to_string().bright_green().bold()
    );
    println!();

    Ok(())
}

async fn handle_show(config: &Config, pool: PgPool, code: &str) -> Result<()> {
    let cache: Arc<dyn CacheService> = match &config.redis_url {
        Some(url) => match RedisCache::connect(url, config.cache_timeout()).await {
            Ok(redis) => Arc::new(redis),
            Err(e) => {
                println!(
                    "{} {}",
                    "Redis unavailable, showing durable count only:".yellow(),
                    e
                );
                Arc::new(NullCache::new())
            }
        },
        None => Arc::new(NullCache::new()),
    };

    let repository = Arc::new(PgUrlRepository::new(
        Arc::new(pool),
        config.store_timeout(),
    ));
    let stats = StatsService::new(repository, cache);

    match stats.stats(code).await {
        Ok(record) => {
            println!("{}", record.short_code.bright_blue().bold());
            println!("  Long URL:   {}", record.long_url.bright_white());
            println!("  Visits:     {}", record.visits.to_string().bright_green().bold());
            println!("  Created:    {}", record.created_at);
            match record.expires_at {
                Some(at) if record.is_expired() => {
                    println!("  Expires:    {} {}", at, "(expired)".red())
                }
                Some(at) => println!("  Expires:    {at}"),
                None => println!("  Expires:    {}", "never".dimmed()),
            }
        }
        Err(e) => println!("{} {}", "Error:".red().bold(), e),
    }

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            println!("{}", "Database connection OK".green().bold());
            println!("  PostgreSQL: {}", version.bright_white());
        }
    }

    Ok(())
}
