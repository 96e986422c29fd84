// ABOUTME: Utility functions for retry logic and identifier validation
// ABOUTME: Provides the fixed-interval connection retry loop and SQL-safety checks

use anyhow::{bail, Result};
use std::time::Duration;

/// Retry an async operation at a fixed interval until the attempt budget runs out.
///
/// Executes `operation` up to `attempts` times total, sleeping `delay` between
/// attempts. The interval is deliberately fixed rather than exponential: the
/// bounded-retries-then-terminal-error contract is the baseline behavior of
/// the connection manager.
///
/// # Arguments
///
/// * `operation` - Async operation to retry (FnMut returning Future\<Output = Result\<T\>\>)
/// * `attempts` - Total attempt budget (must be at least 1)
/// * `delay` - Fixed delay between attempts
/// * `what` - Short operation label used in log lines and the terminal error
///
/// # Returns
///
/// Returns the first successful result, or the last error wrapped in a
/// terminal context once the budget is exhausted.
///
/// # Examples
///
/// ```no_run
/// # use anyhow::Result;
/// # use std::time::Duration;
/// # use mariadb_dump_toolkit::utils::retry_fixed;
/// # async fn example() -> Result<()> {
/// let value = retry_fixed(
///     || async { Ok(42) },
///     3,
///     Duration::from_secs(2),
///     "fetch answer",
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn retry_fixed<F, Fut, T>(
    mut operation: F,
    attempts: u32,
    delay: Duration,
    what: &str,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    if attempts == 0 {
        bail!("{} needs an attempt budget of at least 1", what);
    }

    let mut last_error = None;

    for attempt in 1..=attempts {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                tracing::warn!("{} failed (attempt {}/{}): {:#}", what, attempt, attempts, e);
                last_error = Some(e);

                if attempt < attempts {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| anyhow::anyhow!("{} failed without running", what))
        .context(format!("{} failed after {} attempt(s)", what, attempts)))
}

/// Validate a MariaDB identifier (database or table name).
///
/// Identifiers are interpolated into `CREATE DATABASE`, `USE`, and
/// `SELECT * FROM` statements, so anything from an untrusted source MUST pass
/// this check first. Accepted identifiers:
/// - are 1-64 characters long (the MariaDB unquoted-identifier limit)
/// - start with a letter or underscore
/// - contain only letters, digits, and underscores
///
/// # Errors
///
/// Returns an error describing the first rule the identifier violates.
///
/// # Examples
///
/// ```
/// # use mariadb_dump_toolkit::utils::validate_identifier;
/// assert!(validate_identifier("flight_reservation").is_ok());
/// assert!(validate_identifier("bench_2024").is_ok());
///
/// assert!(validate_identifier("").is_err());
/// assert!(validate_identifier("db; DROP DATABASE prod; --").is_err());
/// ```
pub fn validate_identifier(identifier: &str) -> Result<()> {
    let trimmed = identifier.trim();
    if trimmed.is_empty() {
        bail!("Identifier cannot be empty or whitespace-only");
    }

    if trimmed.len() > 64 {
        bail!(
            "Identifier '{}' exceeds maximum length of 64 characters (got {})",
            sanitize_identifier(trimmed),
            trimmed.len()
        );
    }

    let first_char = trimmed.chars().next().unwrap();
    if !first_char.is_ascii_alphabetic() && first_char != '_' {
        bail!(
            "Identifier '{}' must start with a letter or underscore, not '{}'",
            sanitize_identifier(trimmed),
            first_char
        );
    }

    for (i, c) in trimmed.chars().enumerate() {
        if !c.is_ascii_alphanumeric() && c != '_' {
            bail!(
                "Identifier '{}' contains invalid character '{}' at position {}. \
                 Only letters, digits, and underscores are allowed",
                sanitize_identifier(trimmed),
                if c.is_control() {
                    format!("\\x{:02x}", c as u32)
                } else {
                    c.to_string()
                },
                i
            );
        }
    }

    Ok(())
}

/// Sanitize an identifier for display in error messages and logs.
///
/// Strips control characters and limits length. Display only; SQL safety
/// comes from [`validate_identifier`].
pub fn sanitize_identifier(identifier: &str) -> String {
    identifier
        .chars()
        .filter(|c| !c.is_control())
        .take(100)
        .collect()
}
