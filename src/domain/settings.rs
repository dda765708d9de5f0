//! Application configuration models.
//!
//! Every setting has a documented default; a missing config file or a
//! missing key means "use the default", never an error.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Program name, used for directory names, backup suffixes and mail text.
pub const APP_NAME: &str = "svn-auth-manager";

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Filesystem locations.
    #[serde(default)]
    pub paths: PathConfig,

    /// Error-mail settings.
    #[serde(default)]
    pub mail: MailConfig,
}

/// Path configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfig {
    /// Encrypted user database location (optional).
    #[serde(default)]
    pub db_file: Option<PathBuf>,

    /// SVN authentication cache directory (optional).
    #[serde(default)]
    pub svn_auth_dir: Option<PathBuf>,
}

/// Settings for error mails sent when `svn info` fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Whether error mails are sent at all.
    #[serde(default)]
    pub enabled: bool,

    /// SMTP username. No default.
    #[serde(default)]
    pub smtp_username: Option<String>,

    /// SMTP password. No default.
    #[serde(default)]
    pub smtp_password: Option<String>,

    /// SMTP server host name.
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    /// SMTP server port (STARTTLS).
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// Mail From: header; the SMTP username if unset.
    #[serde(default)]
    pub from: Option<String>,

    /// Mail Subject: header; a built-in default if unset.
    #[serde(default)]
    pub subject: Option<String>,

    /// Mail body template with `{name}`, `{program}`, `{username}` and
    /// `{details}` placeholders; a built-in default if unset.
    #[serde(default)]
    pub body: Option<String>,

    /// Skip SMTP server certificate verification.
    #[serde(default = "default_skip_certificate_check")]
    pub skip_certificate_check: bool,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_username: None,
            smtp_password: None,
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            from: None,
            subject: None,
            body: None,
            skip_certificate_check: default_skip_certificate_check(),
        }
    }
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

const fn default_smtp_port() -> u16 {
    587
}

const fn default_skip_certificate_check() -> bool {
    true
}

impl AppConfig {
    /// Get the configuration directory.
    #[must_use]
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_NAME)
    }

    /// Get the config file path.
    #[must_use]
    pub fn config_file_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Get the encrypted user database path, using the default if not
    /// configured.
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.paths
            .db_file
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("userinfo.db"))
    }

    /// Get the SVN auth cache directory, using the default if not
    /// configured.
    #[must_use]
    pub fn svn_auth_dir(&self) -> PathBuf {
        self.paths.svn_auth_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".subversion")
                .join("auth")
        })
    }
}
