// ABOUTME: Serializes a database's schema and data into a portable SQL dump file
// ABOUTME: Emits drop/create/insert statements per table in enumeration order

use crate::config::TransferConfig;
use crate::mariadb;
use crate::mariadb::reader::{self, value_text};
use crate::outcome::OperationResult;
use anyhow::{Context, Result};
use mysql_async::Value;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Export a database's schema and data to a SQL dump file.
///
/// Connects (within the retry budget), optionally switches to
/// `target_database`, enumerates tables with `SHOW TABLES`, and writes per
/// table: a `DROP TABLE IF EXISTS` statement, the engine-reported create
/// statement, and a single multi-row `INSERT` covering all rows (no insert
/// for empty tables). The produced file replays through the importer into an
/// equivalent table set, provided no table exceeds the engine's statement
/// length limit (`max_allowed_packet`); that limit is a documented
/// constraint, not handled specially.
///
/// Output is streamed; a failed export leaves any partially written file in
/// place for the caller to clean up. Any engine error aborts the whole
/// export with `success = false`.
pub async fn export_dump(
    config: &TransferConfig,
    output_path: &Path,
    target_database: Option<&str>,
) -> OperationResult {
    OperationResult::capture(export_inner(config, output_path, target_database).await)
}

async fn export_inner(
    config: &TransferConfig,
    output_path: &Path,
    target_database: Option<&str>,
) -> Result<String> {
    let mut conn = mariadb::connect_with_retry(config).await?;

    if let Some(database) = target_database {
        mariadb::switch_database(&mut conn, database).await?;
    }
    let database_name = target_database.unwrap_or(&config.database);

    tracing::info!(
        "Exporting database '{}' to {}",
        database_name,
        output_path.display()
    );

    let tables = reader::list_tables(&mut conn).await?;

    let file = File::create(output_path)
        .with_context(|| format!("Failed to create dump file at {}", output_path.display()))?;
    let mut out = BufWriter::new(file);

    let header = format!(
        "-- Database dump generated on {}\n-- Database: {}\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        database_name
    );
    out.write_all(header.as_bytes())
        .with_context(|| format!("Failed to write dump file at {}", output_path.display()))?;

    let mut row_total = 0usize;
    for table in &tables {
        let mut section = String::new();
        section.push_str(&format!("\n-- Table structure for table `{}`\n", table));
        section.push_str(&format!("DROP TABLE IF EXISTS `{}`;\n", table));

        let create = reader::show_create_table(&mut conn, table).await?;
        section.push_str(&create);
        section.push_str(";\n\n");

        section.push_str(&format!("-- Dumping data for table `{}`\n", table));
        let snapshot = reader::read_table_snapshot(&mut conn, table).await?;
        row_total += snapshot.rows.len();
        if let Some(insert) = render_insert(table, &snapshot.columns, &snapshot.rows) {
            section.push_str(&insert);
        }

        out.write_all(section.as_bytes())
            .with_context(|| format!("Failed to write dump file at {}", output_path.display()))?;
    }

    out.flush()
        .with_context(|| format!("Failed to flush dump file at {}", output_path.display()))?;

    mariadb::disconnect(conn).await;

    tracing::info!(
        "Exported {} table(s) ({} row(s)) from '{}'",
        tables.len(),
        row_total,
        database_name
    );

    Ok(format!(
        "Exported {} table(s) ({} row(s)) from '{}' to {}",
        tables.len(),
        row_total,
        database_name,
        output_path.display()
    ))
}

/// Render one multi-row `INSERT` statement covering all rows of a table.
///
/// Returns `None` for an empty row set: empty tables contribute no insert
/// statement to the dump.
///
/// # Examples
///
/// ```
/// # use mysql_async::Value;
/// # use mariadb_dump_toolkit::dump::export::render_insert;
/// let columns = vec!["id".to_string(), "name".to_string()];
/// let rows = vec![vec![Value::Int(1), Value::Bytes(b"Alice".to_vec())]];
/// let insert = render_insert("users", &columns, &rows).unwrap();
/// assert_eq!(insert, "INSERT INTO `users` (`id`,`name`) VALUES\n(1,'Alice');\n");
///
/// assert!(render_insert("users", &columns, &[]).is_none());
/// ```
pub fn render_insert(table: &str, columns: &[String], rows: &[Vec<Value>]) -> Option<String> {
    if rows.is_empty() {
        return None;
    }

    let column_list = columns
        .iter()
        .map(|column| format!("`{}`", column))
        .collect::<Vec<_>>()
        .join(",");

    let mut statement = format!("INSERT INTO `{}` ({}) VALUES\n", table, column_list);
    for (index, row) in rows.iter().enumerate() {
        let values = row.iter().map(sql_literal).collect::<Vec<_>>().join(",");
        statement.push('(');
        statement.push_str(&values);
        statement.push(')');
        statement.push_str(if index + 1 == rows.len() { ";\n" } else { ",\n" });
    }

    Some(statement)
}

/// Render an engine value as a SQL literal.
///
/// `NULL` stays bare, numeric types become bare literals, and everything
/// else is single-quoted with embedded quotes doubled. No other escaping is
/// applied; binary and temporal values are stringified through their textual
/// representation.
pub fn sql_literal(value: &Value) -> String {
    match value {
        Value::NULL
        | Value::Int(_)
        | Value::UInt(_)
        | Value::Float(_)
        | Value::Double(_) => value_text(value),
        other => format!("'{}'", value_text(other).replace('\'', "''")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_literal_null_and_numbers_stay_bare() {
        assert_eq!(sql_literal(&Value::NULL), "NULL");
        assert_eq!(sql_literal(&Value::Int(-7)), "-7");
        assert_eq!(sql_literal(&Value::UInt(7)), "7");
        assert_eq!(sql_literal(&Value::Double(1.5)), "1.5");
    }

    #[test]
    fn test_sql_literal_quotes_strings_and_doubles_embedded_quotes() {
        assert_eq!(
            sql_literal(&Value::Bytes(b"Chicago O'Hare".to_vec())),
            "'Chicago O''Hare'"
        );
        assert_eq!(sql_literal(&Value::Bytes(b"plain".to_vec())), "'plain'");
    }

    #[test]
    fn test_sql_literal_quotes_temporal_values() {
        let value = Value::Date(2024, 6, 1, 8, 15, 0, 0);
        assert_eq!(sql_literal(&value), "'2024-06-01 08:15:00'");
    }

    #[test]
    fn test_render_insert_multi_row() {
        let columns = vec!["id".to_string(), "seat".to_string()];
        let rows = vec![
            vec![Value::Int(1), Value::Bytes(b"12A".to_vec())],
            vec![Value::Int(2), Value::NULL],
        ];

        let insert = render_insert("Reserve", &columns, &rows).unwrap();
        assert_eq!(
            insert,
            "INSERT INTO `Reserve` (`id`,`seat`) VALUES\n(1,'12A'),\n(2,NULL);\n"
        );
    }

    #[test]
    fn test_render_insert_empty_table_writes_nothing() {
        let columns = vec!["id".to_string()];
        assert!(render_insert("Flight", &columns, &[]).is_none());
    }

    #[test]
    fn test_rendered_insert_survives_statement_splitting() {
        let columns = vec!["note".to_string()];
        let rows = vec![vec![Value::Bytes(b"delayed; rebooked".to_vec())]];
        let insert = render_insert("Booking", &columns, &rows).unwrap();

        let statements = crate::dump::split_statements(&insert);
        assert_eq!(statements.len(), 1);
        assert!(statements[0].contains("delayed; rebooked"));
    }
}
