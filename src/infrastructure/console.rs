//! Interactive console prompts for enrollment.

use std::io::{self, BufRead, Write};

use crate::domain::{AppError, Result};

/// Prompts for one non-empty line on stdin.
pub fn prompt(field: &str) -> Result<String> {
    print!("{field}: ");
    io::stdout()
        .flush()
        .map_err(|e| AppError::io("Failed to flush prompt", e))?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| AppError::io("Failed to read input", e))?;

    non_empty(field, line.trim_end_matches(['\r', '\n']))
}

/// Prompts twice for a hidden password; both entries must match.
pub fn prompt_password() -> Result<String> {
    let first = prompt_hidden("SVN password")?;
    let second = prompt_hidden("SVN password (confirm)")?;

    if first != second {
        return Err(AppError::validation("Passwords don't match"));
    }
    Ok(first)
}

fn prompt_hidden(field: &str) -> Result<String> {
    let value = rpassword::prompt_password(format!("{field}: "))
        .map_err(|e| AppError::io("Failed to read password", e))?;
    non_empty(field, &value)
}

fn non_empty(field: &str, value: &str) -> Result<String> {
    if value.is_empty() {
        return Err(AppError::validation(format!("{field} cannot be empty")));
    }
    Ok(value.to_string())
}
