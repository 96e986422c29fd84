// ABOUTME: Replays a SQL dump against a (possibly new) database best-effort
// ABOUTME: Skips failing statements and only fails on connection, creation, or IO

use crate::config::TransferConfig;
use crate::dump::statement::split_statements;
use crate::mariadb;
use crate::outcome::OperationResult;
use anyhow::{Context, Result};
use mysql_async::prelude::*;
use std::fs;
use std::path::Path;

/// Import a SQL dump file, optionally into a newly created database.
///
/// When `new_database` is given, it is created idempotently and made active
/// before replay. The dump is split into statements (quote-aware) and each
/// non-blank statement executes independently, in original order.
///
/// Per-statement failures are **best-effort**: a failing statement is logged
/// and skipped, and replay continues. `success = true` therefore does not
/// guarantee that every statement took effect; the message reports executed
/// and skipped counts, and callers that need a stronger guarantee must check
/// them. Only a failure to read the file, open the connection, or create the
/// database is terminal.
pub async fn import_dump(
    config: &TransferConfig,
    dump_path: &Path,
    new_database: Option<&str>,
) -> OperationResult {
    OperationResult::capture(import_inner(config, dump_path, new_database).await)
}

async fn import_inner(
    config: &TransferConfig,
    dump_path: &Path,
    new_database: Option<&str>,
) -> Result<String> {
    let sql = fs::read_to_string(dump_path)
        .with_context(|| format!("Failed to read dump file at {}", dump_path.display()))?;

    let mut conn = mariadb::connect_with_retry(config).await?;

    if let Some(database) = new_database {
        mariadb::create_database(&mut conn, database).await?;
    }

    let statements = split_statements(&sql);
    tracing::info!(
        "Replaying {} statement(s) from {}",
        statements.len(),
        dump_path.display()
    );

    let mut executed = 0usize;
    let mut skipped = 0usize;
    for statement in &statements {
        match conn.query_drop(statement.as_str()).await {
            Ok(()) => executed += 1,
            Err(e) => {
                tracing::warn!("Statement failed, continuing with next: {}", e);
                skipped += 1;
            }
        }
    }

    mariadb::disconnect(conn).await;

    tracing::info!(
        "Replayed {} of {} statement(s) ({} skipped)",
        executed,
        statements.len(),
        skipped
    );

    Ok(format!(
        "Imported {} of {} statement(s) from {} ({} skipped)",
        executed,
        statements.len(),
        dump_path.display(),
        skipped
    ))
}
