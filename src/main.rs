//! Mashebi API - server and account provisioning entry point

use mashebi_api::auth::hash_password;
use mashebi_api::core::config::{CliArgs, Command};
use mashebi_api::db::{AccountRepository, NewAccount};
use mashebi_api::{api, core, db};

use anyhow::{Context, Result};
use clap::Parser;
use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    // Logging isn't initialized yet, so configuration errors go to stderr
    let config = match core::Config::load(&cli_args) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let _logger = match core::Logger::init(&config.logging) {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return Err(e);
        }
    };

    info!(version = mashebi_api::VERSION, "Starting Mashebi API");
    info!(path = ?config.database.path, "Database configuration");

    let db = Arc::new(
        db::DatabaseManager::new(
            &config.database.path,
            config.database.connection_pool_size,
            Duration::from_millis(config.database.busy_timeout),
            Duration::from_secs(config.database.connection_timeout),
        )
        .context("Failed to open database")?,
    );
    info!(pool_size = db.pool_size(), "Database initialized successfully");

    match cli_args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let server_url = format!("http://{}:{}", config.server.host, config.server.port);
            let server = api::ApiServer::new(config, db)?;

            info!(url = %server_url, "Server ready - starting to serve requests");
            server.serve().await?;
        }
        Command::AddAccount {
            username,
            account_name,
            email,
            inactive,
        } => {
            add_account(db, username, account_name, email, !inactive).await?;
        }
    }

    Ok(())
}

/// Provision an account with the password read from stdin
async fn add_account(
    db: Arc<db::DatabaseManager>,
    username: String,
    account_name: String,
    email: String,
    is_active: bool,
) -> Result<()> {
    let mut password = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut password)
        .context("Failed to read password from stdin")?;
    let password = password.trim_end_matches(['\r', '\n']);

    if username.trim().is_empty() || account_name.trim().is_empty() || password.trim().is_empty() {
        anyhow::bail!("username, account name and password must not be empty");
    }

    let password_hash = hash_password(password)?;

    let id = AccountRepository::new(db)
        .create(NewAccount {
            account_name,
            username: username.trim().to_string(),
            email,
            password_hash,
            is_active,
        })
        .await
        .context("Failed to create account (is the username taken?)")?;

    info!(account_id = id, username = %username.trim(), is_active, "Account created");
    println!("{}", id);

    Ok(())
}
