//! Error notification over SMTP.
//!
//! Sends a failure report to the affected user when an auth-cache reset
//! fails. Delivery is opt-in through the `[mail]` config section; when it is
//! disabled, [`FailureNotifier::notify`] reports that no attempt was made.

use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Address, Message, SmtpTransport, Transport};

use crate::domain::settings::{MailConfig, APP_NAME};
use crate::domain::{AppError, FailureNotifier, Result, UserRecord};

const SUBJECT_DEFAULT: &str = "[{program}] SVN ACCESS ERROR";

const BODY_DEFAULT: &str = "Hi {name}!

An error occurred while accessing SVN with your credentials.
Either your credentials are wrong or the SVN repository is down.

If your password has changed, then please update it with

 {program} change-passwd {username}

on the git-svn bridge host, or ask for help from the person who manages it.

Details:
--------------------------------------------------------------------------
{details}
--------------------------------------------------------------------------

Best,
{program}";

/// Checks address syntax the same way message building would.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    email.parse::<Address>().is_ok()
}

/// SMTP-backed notifier configured from the `[mail]` section.
pub struct ErrorMailer {
    config: MailConfig,
}

impl ErrorMailer {
    /// Create a mailer over the given settings.
    #[must_use]
    pub const fn new(config: MailConfig) -> Self {
        Self { config }
    }

    fn build_message(&self, user: &UserRecord, detail: &str) -> Result<Message> {
        let from = self
            .config
            .from
            .clone()
            .or_else(|| self.config.smtp_username.clone())
            .ok_or_else(|| AppError::Config {
                message: "mail.from or mail.smtp_username must be set when mail is enabled"
                    .to_string(),
            })?;

        let subject = self
            .config
            .subject
            .clone()
            .unwrap_or_else(|| SUBJECT_DEFAULT.to_string())
            .replace("{program}", APP_NAME);

        let body = self
            .config
            .body
            .clone()
            .unwrap_or_else(|| BODY_DEFAULT.to_string())
            .replace("{name}", &user.name)
            .replace("{program}", APP_NAME)
            .replace("{username}", &user.svn_username)
            .replace("{details}", detail);

        Message::builder()
            .from(parse_mailbox(&from)?)
            .to(parse_mailbox(&user.email)?)
            .subject(subject)
            .body(body)
            .map_err(|e| AppError::Mail {
                message: e.to_string(),
            })
    }

    fn transport(&self) -> Result<SmtpTransport> {
        let mut tls = TlsParameters::builder(self.config.smtp_host.clone());
        if self.config.skip_certificate_check {
            tls = tls.dangerous_accept_invalid_certs(true);
        }
        let tls = tls.build().map_err(|e| AppError::Mail {
            message: format!("TLS setup failed: {e}"),
        })?;

        let mut builder = SmtpTransport::builder_dangerous(self.config.smtp_host.as_str())
            .port(self.config.smtp_port)
            .tls(Tls::Required(tls));

        if let (Some(username), Some(password)) =
            (&self.config.smtp_username, &self.config.smtp_password)
        {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(builder.build())
    }
}

impl FailureNotifier for ErrorMailer {
    fn notify(&self, user: &UserRecord, detail: &str) -> Result<bool> {
        if !self.config.enabled {
            return Ok(false);
        }

        let message = self.build_message(user, detail)?;
        self.transport()?
            .send(&message)
            .map_err(|e| AppError::Mail {
                message: e.to_string(),
            })?;

        tracing::info!(to = %user.email, "Error mail delivered");
        Ok(true)
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address.parse::<Mailbox>().map_err(|e| AppError::Mail {
        message: format!("Bad mail address {address}: {e}"),
    })
}
