//! Encrypted credential store for SVN users.
//!
//! Owns the schema and is the only SQL surface for [`UserRecord`]. The
//! store is an explicitly constructed value; every operation that needs it
//! receives a reference.

use std::path::Path;

use crate::domain::{AppError, Result, UserRecord};
use crate::infrastructure::database::{EncryptedDatabase, NamedRow};
use crate::infrastructure::mailer;

/// Encryption key compiled into the binary. This is obscurity, not secrecy:
/// it keeps the user database unreadable to casual inspection of the host,
/// nothing more.
const ENCRYPTION_KEY: &str = "change-this-before-deploying";

/// Credential store over the encrypted user database.
pub struct UserStore {
    db: EncryptedDatabase,
}

impl UserStore {
    /// Opens the store at `path`, creating the file and schema as needed.
    pub fn open(path: &Path) -> Result<Self> {
        Self::with_database(EncryptedDatabase::open(path, ENCRYPTION_KEY)?)
    }

    fn with_database(db: EncryptedDatabase) -> Result<Self> {
        db.update(
            "CREATE TABLE IF NOT EXISTS user (\
             svn_username TEXT UNIQUE NOT NULL, \
             email TEXT UNIQUE NOT NULL, \
             name TEXT NOT NULL, \
             svn_password TEXT NOT NULL)",
            &[],
        )?;
        Ok(Self { db })
    }

    /// Inserts the record, or fully replaces the row with the same SVN
    /// username.
    ///
    /// # Errors
    /// An email that already belongs to a different SVN username surfaces
    /// as the native unique-constraint `Database` error; it is not
    /// reconciled here.
    pub fn save(&self, record: &UserRecord) -> Result<()> {
        record.validate()?;
        if !mailer::is_valid_email(&record.email) {
            return Err(AppError::validation(format!(
                "Invalid email: {}",
                record.email
            )));
        }

        self.db.update(
            "INSERT INTO user (svn_username, email, name, svn_password) \
             VALUES (?, ?, ?, ?) \
             ON CONFLICT(svn_username) DO UPDATE SET \
             email = excluded.email, \
             name = excluded.name, \
             svn_password = excluded.svn_password",
            &[
                record.svn_username.as_str(),
                record.email.as_str(),
                record.name.as_str(),
                record.svn_password.as_str(),
            ],
        )?;

        tracing::debug!(user = %record.svn_username, "User record saved");
        Ok(())
    }

    /// Loads the record with exactly this SVN username.
    pub fn load_by_username(&self, svn_username: &str) -> Result<UserRecord> {
        self.load_one(
            "svn_username = ?",
            svn_username,
            &format!("user {svn_username}"),
        )
    }

    /// Loads the record with exactly this email address.
    pub fn load_by_email(&self, email: &str) -> Result<UserRecord> {
        self.load_one("email = ?", email, &format!("email {email}"))
    }

    fn load_one(&self, predicate: &str, value: &str, entity: &str) -> Result<UserRecord> {
        let rows = self.db.query(
            &format!(
                "SELECT svn_username, email, name, svn_password FROM user WHERE {predicate}"
            ),
            &[value],
        )?;

        // The unique constraints should make more than one match impossible,
        // but nothing ties those constraints to this read; check here too.
        match rows.as_slice() {
            [] => Err(AppError::NotFound {
                entity: entity.to_string(),
            }),
            [row] => record_from_row(row),
            _ => Err(AppError::AmbiguousRecord {
                entity: entity.to_string(),
            }),
        }
    }
}

fn record_from_row(row: &NamedRow) -> Result<UserRecord> {
    let field = |name: &str| -> Result<String> {
        row.iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| AppError::Database {
                message: format!("Missing column {name} in user row"),
                source: None,
            })
    };

    Ok(UserRecord {
        svn_username: field("svn_username")?,
        email: field("email")?,
        name: field("name")?,
        svn_password: field("svn_password")?,
    })
}
