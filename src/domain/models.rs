//! Domain models for stored SVN users.

use std::fmt;

use crate::domain::{AppError, Result};

/// Fixed placeholder substituted for the SVN password anywhere it could end
/// up in logged or surfaced text.
pub const SECRET_MASK: &str = "*****";

/// A stored SVN user: the SVN credentials plus the git author identity
/// mapped to them.
#[derive(Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// SVN username, unique across the store.
    pub svn_username: String,
    /// Email address, unique across the store.
    pub email: String,
    /// Full name, used for the git author mapping.
    pub name: String,
    /// SVN password. Sensitive; never logged or printed in cleartext.
    pub svn_password: String,
}

impl UserRecord {
    /// Line for `git --authors-prog`: `Name <email>`.
    #[must_use]
    pub fn author_line(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }

    /// Checks that every field is present. Records are stored whole or not
    /// at all; a partially filled record must never reach the database.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("SVN username", &self.svn_username),
            ("Email", &self.email),
            ("Name", &self.name),
            ("SVN password", &self.svn_password),
        ];
        for (field, value) in fields {
            if value.is_empty() {
                return Err(AppError::validation(format!("{field} cannot be empty")));
            }
        }
        Ok(())
    }
}

// The password stays out of debug dumps and log output.
impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("svn_username", &self.svn_username)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("svn_password", &SECRET_MASK)
            .finish()
    }
}

/// Collaborator that delivers a failure report to a user.
///
/// Whether delivery is possible at all (e.g. mail sending disabled) is the
/// implementation's own concern; `notify` returns whether a delivery attempt
/// was actually made.
pub trait FailureNotifier {
    /// Attempts to tell `user` that re-validating their credentials failed,
    /// with `detail` as the (already masked) diagnostic text.
    fn notify(&self, user: &UserRecord, detail: &str) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> UserRecord {
        UserRecord {
            svn_username: "alice".into(),
            email: "alice@example.com".into(),
            name: "Alice Example".into(),
            svn_password: "hunter2".into(),
        }
    }

    #[test]
    fn test_author_line() {
        assert_eq!(sample().author_line(), "Alice Example <alice@example.com>");
    }

    #[test]
    fn test_validate_accepts_full_record() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_field() {
        let mut record = sample();
        record.name.clear();
        let err = record.validate().unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn test_debug_masks_password() {
        let dump = format!("{:?}", sample());
        assert!(!dump.contains("hunter2"));
        assert!(dump.contains(SECRET_MASK));
    }
}
