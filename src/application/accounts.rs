//! User enrollment and maintenance flows.
//!
//! These drive the interactive prompts and the credential store; SVN itself
//! is never touched here.

use crate::domain::{AppError, Result, UserRecord};
use crate::infrastructure::{console, mailer, UserStore};

/// Adds a new SVN user, or overwrites the record with the same username.
///
/// Prompts for the password (twice), email and full name.
pub fn add_user(store: &UserStore, svn_username: &str) -> Result<UserRecord> {
    println!("Adding/overwriting SVN user {svn_username}");

    let svn_password = console::prompt_password()?;
    let email = console::prompt("Email")?;
    if !mailer::is_valid_email(&email) {
        return Err(AppError::validation(format!("Invalid email: {email}")));
    }
    let name = console::prompt("Name")?;

    let record = UserRecord {
        svn_username: svn_username.to_string(),
        email,
        name,
        svn_password,
    };
    store.save(&record)?;

    Ok(record)
}

/// Replaces the stored password for an existing user. The whole record is
/// written back, not a partial update.
pub fn change_password(store: &UserStore, svn_username: &str) -> Result<()> {
    let mut record = store.load_by_username(svn_username)?;

    println!("Changing SVN password for SVN user {}", record.svn_username);
    record.svn_password = console::prompt_password()?;

    store.save(&record)
}

/// `Name <email>` line for an SVN username, for `git --authors-prog`.
pub fn author_line(store: &UserStore, svn_username: &str) -> Result<String> {
    Ok(store.load_by_username(svn_username)?.author_line())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::user_store::UserStore;
    use tempfile::tempdir;

    #[test]
    fn test_author_line_for_stored_user() {
        let dir = tempdir().unwrap();
        let store = UserStore::open(&dir.path().join("userinfo.db")).unwrap();
        store
            .save(&UserRecord {
                svn_username: "alice".into(),
                email: "alice@example.com".into(),
                name: "Alice Example".into(),
                svn_password: "pw".into(),
            })
            .unwrap();

        assert_eq!(
            author_line(&store, "alice").unwrap(),
            "Alice Example <alice@example.com>"
        );

        let err = author_line(&store, "nobody").unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }
}
