//! SVN auth cache reset.
//!
//! Re-validates a user's stored credentials by running `svn info` against a
//! cleared auth cache directory, restoring the previous cache if validation
//! fails. The directory is exclusively owned by the running transaction;
//! callers must not start two resets over the same directory at once.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use crate::domain::settings::APP_NAME;
use crate::domain::{AppError, FailureNotifier, Result, UserRecord, SECRET_MASK};
use crate::infrastructure::mailer;
use crate::infrastructure::UserStore;

/// Output of one `svn info` run, both streams fully drained.
struct SvnOutput {
    success: bool,
    stdout: String,
    stderr: String,
}

/// One credential re-validation run over the SVN auth cache directory.
pub struct AuthCacheReset<'a> {
    store: &'a UserStore,
    notifier: &'a dyn FailureNotifier,
    auth_dir: PathBuf,
    svn_command: String,
}

impl<'a> AuthCacheReset<'a> {
    /// Create a reset transaction over `auth_dir`.
    pub fn new(
        store: &'a UserStore,
        notifier: &'a dyn FailureNotifier,
        auth_dir: PathBuf,
    ) -> Self {
        Self {
            store,
            notifier,
            auth_dir,
            svn_command: "svn".to_string(),
        }
    }

    #[cfg(test)]
    fn with_command(mut self, command: &str) -> Self {
        self.svn_command = command.to_string();
        self
    }

    /// Runs the backup, verify, commit-or-rollback sequence.
    ///
    /// On success the backup is deleted and the freshly validated cache
    /// stays live. On failure the user is notified best-effort, the stale
    /// cache is deleted and the backup moved back, then the masked `svn`
    /// diagnostic is surfaced as a `CacheReset` error.
    ///
    /// Rollback is two directory moves and not crash-atomic: a crash between
    /// deleting the stale cache and moving the backup back loses both
    /// directories, and nothing repairs that automatically on the next run.
    pub fn run(&self, email: &str, svn_url: &str) -> Result<()> {
        if !mailer::is_valid_email(email) {
            return Err(AppError::validation(format!("Invalid email: {email}")));
        }

        let user = self.store.load_by_email(email)?;

        let backup_dir = self.backup_path();
        let had_backup = self.auth_dir.exists();
        if had_backup {
            fs::rename(&self.auth_dir, &backup_dir).map_err(|e| {
                AppError::io(
                    format!("Failed to back up {}", self.auth_dir.display()),
                    e,
                )
            })?;
            tracing::debug!(backup = %backup_dir.display(), "Auth cache moved aside");
        }

        match self.run_svn_info(&user, svn_url) {
            Ok(output) if output.success => {
                if had_backup {
                    fs::remove_dir_all(&backup_dir).map_err(|e| {
                        AppError::io(
                            format!("Failed to remove backup {}", backup_dir.display()),
                            e,
                        )
                    })?;
                }
                tracing::info!(user = %user.svn_username, "SVN auth cache refreshed");
                Ok(())
            }
            Ok(output) => {
                let detail = self.failure_detail(&user, svn_url, &output);
                self.notify_failure(&user, &detail);
                self.restore_backup(had_backup, &backup_dir)?;
                Err(AppError::CacheReset { detail })
            }
            Err(spawn_error) => {
                self.restore_backup(had_backup, &backup_dir)?;
                Err(spawn_error)
            }
        }
    }

    /// Runs `svn info` with the user's credentials against `svn_url`.
    fn run_svn_info(&self, user: &UserRecord, svn_url: &str) -> Result<SvnOutput> {
        let mut child = Command::new(&self.svn_command)
            .args([
                "info",
                "--non-interactive",
                "--username",
                user.svn_username.as_str(),
                "--password",
                user.svn_password.as_str(),
                svn_url,
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| AppError::ProcessSpawn {
                command: self.masked_command(user, svn_url),
                source,
            })?;

        // Both pipes must be drained while the process runs; reading them
        // one after the other deadlocks once svn fills the second pipe's
        // OS buffer.
        let mut stdout_pipe = child.stdout.take().ok_or_else(|| AppError::Io {
            message: "Child stdout was not captured".to_string(),
            source: None,
        })?;
        let mut stderr_pipe = child.stderr.take().ok_or_else(|| AppError::Io {
            message: "Child stderr was not captured".to_string(),
            source: None,
        })?;

        let stdout_reader = thread::spawn(move || {
            let mut text = String::new();
            let _ = stdout_pipe.read_to_string(&mut text);
            text
        });

        let mut stderr_text = String::new();
        let _ = stderr_pipe.read_to_string(&mut stderr_text);
        let stdout_text = stdout_reader.join().unwrap_or_default();

        let status = child
            .wait()
            .map_err(|e| AppError::io("Failed to wait for svn", e))?;

        Ok(SvnOutput {
            success: status.success(),
            stdout: stdout_text,
            stderr: stderr_text,
        })
    }

    fn failure_detail(&self, user: &UserRecord, svn_url: &str, output: &SvnOutput) -> String {
        let detail = format!(
            "Error executing `{}`:\n{}{}",
            self.masked_command(user, svn_url),
            output.stdout,
            output.stderr
        );
        // Scrub the password in case svn echoed part of the command line.
        detail.replace(&user.svn_password, SECRET_MASK)
    }

    /// Command rendering safe for logs and error messages.
    fn masked_command(&self, user: &UserRecord, svn_url: &str) -> String {
        format!(
            "{} info --non-interactive --username {} --password {} {}",
            self.svn_command, user.svn_username, SECRET_MASK, svn_url
        )
    }

    fn notify_failure(&self, user: &UserRecord, detail: &str) {
        match self.notifier.notify(user, detail) {
            Ok(true) => tracing::info!(to = %user.email, "Error mail sent"),
            Ok(false) => {}
            Err(e) => tracing::warn!(error = %e, "Error while sending email"),
        }
    }

    /// Rolls the directory state back to where it was before the run. A
    /// failed `svn info` may or may not have recreated the live directory,
    /// and the first-ever run has no backup.
    fn restore_backup(&self, had_backup: bool, backup_dir: &Path) -> Result<()> {
        if self.auth_dir.exists() {
            fs::remove_dir_all(&self.auth_dir).map_err(|e| {
                AppError::io(
                    format!("Failed to remove stale {}", self.auth_dir.display()),
                    e,
                )
            })?;
        }
        if had_backup {
            fs::rename(backup_dir, &self.auth_dir).map_err(|e| {
                AppError::io(
                    format!("Failed to restore {}", self.auth_dir.display()),
                    e,
                )
            })?;
            tracing::debug!(path = %self.auth_dir.display(), "Auth cache restored from backup");
        }
        Ok(())
    }

    fn backup_path(&self) -> PathBuf {
        let mut name = self.auth_dir.as_os_str().to_os_string();
        name.push(".");
        name.push(APP_NAME);
        name.push("-backup");
        PathBuf::from(name)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::cell::RefCell;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    use tempfile::{tempdir, TempDir};

    use super::*;
    use crate::infrastructure::user_store::UserStore;

    const PASSWORD: &str = "s3cr3t-value";

    struct RecordingNotifier {
        details: RefCell<Vec<String>>,
    }

    impl RecordingNotifier {
        fn new() -> Self {
            Self {
                details: RefCell::new(Vec::new()),
            }
        }
    }

    impl FailureNotifier for RecordingNotifier {
        fn notify(&self, _user: &UserRecord, detail: &str) -> Result<bool> {
            self.details.borrow_mut().push(detail.to_string());
            Ok(true)
        }
    }

    struct Fixture {
        dir: TempDir,
        store: UserStore,
        notifier: RecordingNotifier,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempdir().unwrap();
            let store = UserStore::open(&dir.path().join("userinfo.db")).unwrap();
            store
                .save(&UserRecord {
                    svn_username: "alice".into(),
                    email: "alice@example.com".into(),
                    name: "Alice Example".into(),
                    svn_password: PASSWORD.into(),
                })
                .unwrap();
            Self {
                dir,
                store,
                notifier: RecordingNotifier::new(),
            }
        }

        fn auth_dir(&self) -> PathBuf {
            self.dir.path().join("auth")
        }

        fn backup_dir(&self) -> PathBuf {
            self.dir
                .path()
                .join(format!("auth.{APP_NAME}-backup"))
        }

        fn seed_live_cache(&self) {
            fs::create_dir_all(self.auth_dir()).unwrap();
            fs::write(self.auth_dir().join("marker"), "previous state").unwrap();
        }

        /// Writes an executable stand-in for `svn` built from `body`.
        fn fake_svn(&self, name: &str, body: &str) -> String {
            let path = self.dir.path().join(name);
            fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path.to_string_lossy().into_owned()
        }

        fn reset(&self) -> AuthCacheReset<'_> {
            AuthCacheReset::new(&self.store, &self.notifier, self.auth_dir())
        }
    }

    fn file_content(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_success_commits_and_keeps_live_cache() {
        let fx = Fixture::new();
        fx.seed_live_cache();
        let svn = fx.fake_svn(
            "svn-ok",
            &format!(
                "mkdir -p '{}'\necho 'refreshed' > '{}/marker'\nexit 0",
                fx.auth_dir().display(),
                fx.auth_dir().display()
            ),
        );

        fx.reset()
            .with_command(&svn)
            .run("alice@example.com", "https://svn.example.com/repo")
            .unwrap();

        assert!(fx.auth_dir().exists());
        assert!(!fx.backup_dir().exists());
        assert_eq!(file_content(&fx.auth_dir().join("marker")), "refreshed\n");
        assert!(fx.notifier.details.borrow().is_empty());
    }

    #[test]
    fn test_failure_rolls_back_and_notifies_once() {
        let fx = Fixture::new();
        fx.seed_live_cache();
        let svn = fx.fake_svn(
            "svn-fail",
            &format!(
                "mkdir -p '{}'\necho 'half-written' > '{}/marker'\n\
                 echo 'svn: some info'\necho 'E170001: authentication failed' >&2\nexit 1",
                fx.auth_dir().display(),
                fx.auth_dir().display()
            ),
        );

        let err = fx
            .reset()
            .with_command(&svn)
            .run("alice@example.com", "https://svn.example.com/repo")
            .unwrap_err();

        // Live cache is back to its pre-transaction content, no backup left.
        assert_eq!(
            file_content(&fx.auth_dir().join("marker")),
            "previous state"
        );
        assert!(!fx.backup_dir().exists());

        let AppError::CacheReset { detail } = &err else {
            panic!("expected CacheReset, got {err:?}");
        };
        assert!(detail.contains("svn: some info"));
        assert!(detail.contains("E170001: authentication failed"));
        assert!(detail.contains(SECRET_MASK));
        assert!(!detail.contains(PASSWORD));

        let details = fx.notifier.details.borrow();
        assert_eq!(details.len(), 1);
        assert!(!details[0].contains(PASSWORD));
    }

    #[test]
    fn test_first_run_failure_leaves_nothing_behind() {
        let fx = Fixture::new();
        let svn = fx.fake_svn(
            "svn-fail",
            &format!(
                "mkdir -p '{}'\necho 'E170001' >&2\nexit 1",
                fx.auth_dir().display()
            ),
        );

        let err = fx
            .reset()
            .with_command(&svn)
            .run("alice@example.com", "https://svn.example.com/repo")
            .unwrap_err();

        assert!(matches!(err, AppError::CacheReset { .. }));
        assert!(!fx.auth_dir().exists());
        assert!(!fx.backup_dir().exists());
    }

    #[test]
    fn test_large_output_on_both_streams_is_drained() {
        let fx = Fixture::new();
        fx.seed_live_cache();
        // Well past the usual 64 KiB pipe buffer on each stream.
        let svn = fx.fake_svn(
            "svn-noisy",
            &format!(
                "head -c 262144 /dev/zero | tr '\\0' 'x'\n\
                 head -c 262144 /dev/zero | tr '\\0' 'y' >&2\n\
                 mkdir -p '{}'\nexit 0",
                fx.auth_dir().display()
            ),
        );

        fx.reset()
            .with_command(&svn)
            .run("alice@example.com", "https://svn.example.com/repo")
            .unwrap();
        assert!(!fx.backup_dir().exists());
    }

    #[test]
    fn test_spawn_failure_restores_backup() {
        let fx = Fixture::new();
        fx.seed_live_cache();

        let err = fx
            .reset()
            .with_command(&fx.dir.path().join("does-not-exist").to_string_lossy())
            .run("alice@example.com", "https://svn.example.com/repo")
            .unwrap_err();

        assert!(matches!(err, AppError::ProcessSpawn { .. }));
        assert_eq!(
            file_content(&fx.auth_dir().join("marker")),
            "previous state"
        );
        assert!(!fx.backup_dir().exists());
        assert!(fx.notifier.details.borrow().is_empty());
    }

    #[test]
    fn test_unknown_email_propagates_not_found_untouched() {
        let fx = Fixture::new();
        fx.seed_live_cache();

        let err = fx
            .reset()
            .run("nobody@example.com", "https://svn.example.com/repo")
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
        // Lookup happens before any directory move.
        assert_eq!(
            file_content(&fx.auth_dir().join("marker")),
            "previous state"
        );
        assert!(!fx.backup_dir().exists());
    }

    #[test]
    fn test_malformed_email_is_validation_error() {
        let fx = Fixture::new();
        let err = fx
            .reset()
            .run("not-an-address", "https://svn.example.com/repo")
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }
}
