//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use taksi_core::auth::AccountKind;
use taksi_core::config;

mod commands;

#[derive(Parser)]
#[command(name = "taksi")]
#[command(version)]
#[command(about = "Ride-hailing client auth CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in with phone number and password
    Login {
        /// Phone number (national format, e.g. 05551234567)
        #[arg(long)]
        phone: String,

        /// Use the driver account namespace
        #[arg(long)]
        driver: bool,
    },

    /// Log out (clear the stored session)
    Logout {
        /// Use the driver account namespace
        #[arg(long)]
        driver: bool,
    },

    /// Show the current session, if any
    Status {
        /// Use the driver account namespace
        #[arg(long)]
        driver: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
}

fn account_kind(driver: bool) -> AccountKind {
    if driver {
        AccountKind::Driver
    } else {
        AccountKind::Rider
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = config::Config::load().context("load config")?;

    match cli.command {
        Commands::Login { phone, driver } => {
            commands::auth::login(&config, account_kind(driver), &phone).await
        }
        Commands::Logout { driver } => commands::auth::logout(account_kind(driver)),
        Commands::Status { driver } => commands::auth::status(account_kind(driver)),
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
        },
    }
}
