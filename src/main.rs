//! svn-auth-manager - SVN credential management for a git-SVN bridge.
//!
//! Keeps SVN credentials in an encrypted `SQLite` database, maps SVN
//! usernames to git author identities, and refreshes the local SVN auth
//! cache by re-validating stored credentials, restoring the previous cache
//! when validation fails.

mod application;
mod cli;
mod domain;
mod infrastructure;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use application::{accounts, AuthCacheReset};
use cli::{Cli, Commands};
use domain::AppConfig;
use infrastructure::{load_config, ErrorMailer, UserStore};

fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Main application logic.
fn run(cli: Cli) -> domain::Result<()> {
    let config = load_config()?;

    match cli.command {
        Commands::AddUser { svn_username } => {
            let store = UserStore::open(&config.db_path())?;
            let record = accounts::add_user(&store, &svn_username)?;
            println!(
                "{} Saved SVN user {}",
                "✓".green().bold(),
                record.svn_username
            );
        }
        Commands::ChangePasswd { svn_username } => {
            let store = UserStore::open(&config.db_path())?;
            accounts::change_password(&store, &svn_username)?;
            println!(
                "{} Password updated for {}",
                "✓".green().bold(),
                svn_username
            );
        }
        Commands::ResetAuth { email, svn_url } => {
            let store = UserStore::open(&config.db_path())?;
            let mailer = ErrorMailer::new(config.mail.clone());
            AuthCacheReset::new(&store, &mailer, config.svn_auth_dir()).run(&email, &svn_url)?;
            println!(
                "{} SVN auth cache refreshed for {}",
                "✓".green().bold(),
                email
            );
        }
        Commands::Author { svn_username } => {
            // Plain output only: git parses this line.
            let store = UserStore::open(&config.db_path())?;
            println!("{}", accounts::author_line(&store, &svn_username)?);
        }
        Commands::Paths => {
            cmd_paths(&config);
        }
    }

    Ok(())
}

/// Show the resolved paths command.
fn cmd_paths(config: &AppConfig) {
    println!("config:         {}", AppConfig::config_file_path().display());
    println!("database:       {}", config.db_path().display());
    println!("svn auth cache: {}", config.svn_auth_dir().display());
}

/// Setup tracing/logging based on verbosity level.
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
