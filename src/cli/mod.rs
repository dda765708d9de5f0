//! CLI interface using clap.
//!
//! Provides command-line arguments and subcommands for the tool.

use clap::{Parser, Subcommand};

const CONFIG_HELP: &str = "\
Configuration (TOML, <config dir>/svn-auth-manager/config.toml):

  [paths]
  db_file                  encrypted user database
                           (default: <config dir>/svn-auth-manager/userinfo.db)
  svn_auth_dir             SVN auth cache directory
                           (default: ~/.subversion/auth)

  [mail]
  enabled                  send error mails when `svn info` fails
                           (default: false)
  smtp_username            SMTP username (no default)
  smtp_password            SMTP password (no default)
  smtp_host                SMTP server host (default: smtp.gmail.com)
  smtp_port                SMTP server port (default: 587)
  from                     From: header (default: smtp_username)
  subject                  Subject: header (built-in default)
  body                     body template with {name}, {program}, {username}
                           and {details} placeholders (built-in default)
  skip_certificate_check   do not verify the SMTP server certificate
                           (default: true)";

/// Helper utility for running a git-SVN bridge.
///
/// Manages SVN authentication for git and user mapping between git and SVN.
#[derive(Parser, Debug)]
#[command(name = "svn-auth-manager")]
#[command(author, version, about, long_about = None)]
#[command(after_long_help = CONFIG_HELP)]
pub struct Cli {
    /// Enable verbose logging (use multiple times for more verbosity).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add user information to the database, or overwrite an existing user.
    AddUser {
        /// SVN username to enroll.
        svn_username: String,
    },

    /// Change a user's SVN password in the database.
    ChangePasswd {
        /// SVN username whose password changes.
        svn_username: String,
    },

    /// Reset the SVN auth cache with a user's credentials.
    ///
    /// Backs up the cache directory, runs `svn info` against the URL and
    /// restores the backup if validation fails.
    ResetAuth {
        /// Email address of the enrolled user.
        email: String,

        /// SVN repository URL to validate against.
        svn_url: String,
    },

    /// Print `Name <email>` for an SVN username, for `git --authors-prog`.
    Author {
        /// SVN username to look up.
        svn_username: String,
    },

    /// Show the configuration, database and auth cache paths in use.
    Paths,
}
