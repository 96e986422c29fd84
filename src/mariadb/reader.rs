// ABOUTME: MariaDB table introspection and full-table snapshots for export
// ABOUTME: Renders engine values as text shared by the dump writer and audit report

use crate::utils;
use anyhow::{Context, Result};
use mysql_async::prelude::*;
use mysql_async::{Conn, Row, Value};

/// Transient snapshot of one table: name, ordered columns, ordered rows.
///
/// Produced while exporting; never persisted beyond the textual dump.
#[derive(Debug, Clone)]
pub struct TableSnapshot {
    pub table: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// List all tables in the connection's active database, in enumeration order.
pub async fn list_tables(conn: &mut Conn) -> Result<Vec<String>> {
    let tables: Vec<String> = conn
        .query("SHOW TABLES")
        .await
        .context("Failed to list tables")?;

    tracing::info!("Found {} table(s)", tables.len());

    Ok(tables)
}

/// Fetch the engine-reported `CREATE TABLE` statement for a table.
pub async fn show_create_table(conn: &mut Conn, table: &str) -> Result<String> {
    utils::validate_identifier(table).context("Invalid table name")?;

    let row: Option<(String, String)> = conn
        .query_first(format!("SHOW CREATE TABLE `{}`", table))
        .await
        .with_context(|| format!("Failed to read create statement for table '{}'", table))?;

    let (_, create) = row
        .ok_or_else(|| anyhow::anyhow!("Engine returned no create statement for '{}'", table))?;

    Ok(create)
}

/// Read a full-table snapshot with `SELECT *`.
///
/// For large tables this holds all rows in memory at once; the exporter
/// consumes one snapshot at a time. The column list is empty when the table
/// has no rows (no insert statement is written for empty tables).
pub async fn read_table_snapshot(conn: &mut Conn, table: &str) -> Result<TableSnapshot> {
    utils::validate_identifier(table).context("Invalid table name")?;

    tracing::debug!("Reading all rows from table '{}'", table);

    let rows: Vec<Row> = conn
        .query(format!("SELECT * FROM `{}`", table))
        .await
        .with_context(|| format!("Failed to read data from table '{}'", table))?;

    let columns = rows
        .first()
        .map(|row| {
            row.columns_ref()
                .iter()
                .map(|column| column.name_str().into_owned())
                .collect()
        })
        .unwrap_or_default();

    let rows = rows
        .into_iter()
        .map(|row| {
            (0..row.len())
                .map(|i| row.as_ref(i).cloned().unwrap_or(Value::NULL))
                .collect()
        })
        .collect::<Vec<Vec<Value>>>();

    tracing::debug!("Read {} row(s) from table '{}'", rows.len(), table);

    Ok(TableSnapshot {
        table: table.to_string(),
        columns,
        rows,
    })
}

/// Render an engine value as plain text.
///
/// This is the one textual rendering shared by the dump writer (which quotes
/// it where needed) and the consistency report (which uses it as-is):
/// - `NULL` for absent values
/// - bare literals for integers and floats
/// - lossy UTF-8 for byte strings
/// - `YYYY-MM-DD HH:MM:SS[.ffffff]` for dates, `[-]HH:MM:SS[.ffffff]` for
///   times (days folded into hours), the fraction only when nonzero
pub fn value_text(value: &Value) -> String {
    match value {
        Value::NULL => "NULL".to_string(),
        Value::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Value::Int(n) => n.to_string(),
        Value::UInt(n) => n.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Double(d) => d.to_string(),
        Value::Date(year, month, day, hour, minute, second, micros) => {
            let mut text = format!(
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                year, month, day, hour, minute, second
            );
            if *micros > 0 {
                text.push_str(&format!(".{:06}", micros));
            }
            text
        }
        Value::Time(negative, days, hours, minutes, seconds, micros) => {
            let sign = if *negative { "-" } else { "" };
            let total_hours = u64::from(*days) * 24 + u64::from(*hours);
            let mut text = format!("{}{:02}:{:02}:{:02}", sign, total_hours, minutes, seconds);
            if *micros > 0 {
                text.push_str(&format!(".{:06}", micros));
            }
            text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_text_null() {
        assert_eq!(value_text(&Value::NULL), "NULL");
    }

    #[test]
    fn test_value_text_numeric() {
        assert_eq!(value_text(&Value::Int(-42)), "-42");
        assert_eq!(value_text(&Value::UInt(42)), "42");
        assert_eq!(value_text(&Value::Double(123.456)), "123.456");
    }

    #[test]
    fn test_value_text_bytes() {
        assert_eq!(
            value_text(&Value::Bytes(b"O'Hare".to_vec())),
            "O'Hare".to_string()
        );
    }

    #[test]
    fn test_value_text_datetime() {
        let value = Value::Date(2024, 1, 15, 10, 30, 45, 0);
        assert_eq!(value_text(&value), "2024-01-15 10:30:45");

        let value = Value::Date(2024, 1, 15, 10, 30, 45, 123456);
        assert_eq!(value_text(&value), "2024-01-15 10:30:45.123456");
    }

    #[test]
    fn test_value_text_time_folds_days_into_hours() {
        let value = Value::Time(false, 1, 10, 30, 45, 0);
        assert_eq!(value_text(&value), "34:30:45");

        let value = Value::Time(true, 0, 2, 5, 0, 500000);
        assert_eq!(value_text(&value), "-02:05:00.500000");
    }
}
