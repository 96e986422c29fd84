// ABOUTME: MariaDB connection management with a bounded fixed-interval retry budget
// ABOUTME: Provides database creation/switching with identifier validation

pub mod reader;

use crate::config::TransferConfig;
use crate::utils;
use anyhow::{Context, Result};
use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, OptsBuilder};

/// Build connection options from the transfer configuration.
///
/// The connection always selects the configured default database; operations
/// that target another database switch with `USE` after connecting.
pub fn build_opts(config: &TransferConfig) -> Opts {
    OptsBuilder::default()
        .ip_or_hostname(config.host.clone())
        .tcp_port(config.port)
        .user(Some(config.user.clone()))
        .pass(Some(config.password.clone()))
        .db_name(Some(config.database.clone()))
        .into()
}

/// Connect to MariaDB with a single attempt.
///
/// # Errors
///
/// Returns an error if the server is unreachable, authentication fails, or
/// the configured default database does not exist.
pub async fn connect(config: &TransferConfig) -> Result<Conn> {
    tracing::debug!("Connecting to MariaDB at {}:{}", config.host, config.port);

    let conn = Conn::new(build_opts(config)).await.with_context(|| {
        format!(
            "Failed to connect to MariaDB at {}:{}",
            config.host, config.port
        )
    })?;

    tracing::debug!("Connected to MariaDB at {}:{}", config.host, config.port);

    Ok(conn)
}

/// Connect to MariaDB within the configured retry budget.
///
/// Attempts up to `config.max_retries` connections, sleeping the fixed
/// `config.retry_delay_secs` interval between attempts. Failed handles are
/// discarded; nothing is reused across attempts. Exhausting the budget yields
/// a terminal error carrying the last underlying cause.
///
/// # Examples
///
/// ```no_run
/// # use anyhow::Result;
/// # use mariadb_dump_toolkit::config::TransferConfig;
/// # use mariadb_dump_toolkit::mariadb::connect_with_retry;
/// # async fn example() -> Result<()> {
/// let config = TransferConfig::default();
/// let conn = connect_with_retry(&config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn connect_with_retry(config: &TransferConfig) -> Result<Conn> {
    utils::retry_fixed(
        || connect(config),
        config.max_retries,
        config.retry_delay(),
        "connect to MariaDB",
    )
    .await
}

/// Create a database if it does not already exist, then make it active.
///
/// The name is validated before being interpolated into SQL.
pub async fn create_database(conn: &mut Conn, database: &str) -> Result<()> {
    utils::validate_identifier(database).context("Invalid database name")?;

    tracing::info!("Creating database '{}' if missing", database);

    conn.query_drop(format!("CREATE DATABASE IF NOT EXISTS `{}`", database))
        .await
        .with_context(|| format!("Failed to create database '{}'", database))?;

    switch_database(conn, database).await
}

/// Switch the connection's active database with `USE`.
pub async fn switch_database(conn: &mut Conn, database: &str) -> Result<()> {
    utils::validate_identifier(database).context("Invalid database name")?;

    conn.query_drop(format!("USE `{}`", database))
        .await
        .with_context(|| format!("Failed to switch to database '{}'", database))?;

    Ok(())
}

/// Close a connection, logging instead of failing when the handshake is torn.
pub async fn disconnect(conn: Conn) {
    if let Err(e) = conn.disconnect().await {
        tracing::debug!("Error while closing MariaDB connection: {}", e);
    }
}
