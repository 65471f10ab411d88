use anyhow::{bail, Result};
use rpassword::read_password;
use std::io::{self, Write};

/// Minimum password length in bytes; shorter secrets are refused before
/// any key derivation starts.
pub const MIN_PASSWORD_BYTES: usize = 8;

/// Prompt for the password securely. Input is hidden and not echoed.
///
/// For non-interactive use, pass `--password` or set `GITZIPQR_PASSWORD`.
/// With `confirm`, the password is asked twice and must match (used on
/// encode, where a typo would be unrecoverable).
pub fn prompt_password(confirm: bool) -> Result<String> {
    eprint!("Password: ");
    io::stderr().flush()?;
    let password = read_password()?;

    if password.len() < MIN_PASSWORD_BYTES {
        bail!("password must be at least {MIN_PASSWORD_BYTES} bytes");
    }

    if confirm {
        eprint!("Confirm password: ");
        io::stderr().flush()?;
        let again = read_password()?;
        if password != again {
            bail!("passwords do not match");
        }
    }

    Ok(password)
}

/// Resolve the password list: explicit `--password` flags win; otherwise
/// prompt interactively for a single password.
pub fn resolve_passwords(supplied: &[String], confirm: bool) -> Result<Vec<String>> {
    if supplied.is_empty() {
        return Ok(vec![prompt_password(confirm)?]);
    }
    for p in supplied {
        if p.len() < MIN_PASSWORD_BYTES {
            bail!("password must be at least {MIN_PASSWORD_BYTES} bytes");
        }
    }
    Ok(supplied.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supplied_passwords_pass_through() {
        let supplied = vec!["longenough".to_string(), "also long".to_string()];
        assert_eq!(resolve_passwords(&supplied, false).unwrap(), supplied);
    }

    #[test]
    fn short_supplied_password_rejected() {
        let supplied = vec!["short".to_string()];
        assert!(resolve_passwords(&supplied, false).is_err());
    }
}
