// ABOUTME: Sequential import/export benchmark loop with per-phase timing
// ABOUTME: Records one result per iteration; failures never abort the loop

use crate::config::TransferConfig;
use crate::dump::export::export_dump;
use crate::dump::import::import_dump;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Result of one benchmark iteration.
///
/// On import failure the export phase is skipped and only `error` is set;
/// on export failure the import timing is kept alongside the error.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkRecord {
    pub iteration: usize,
    pub success: bool,
    pub import_secs: Option<f64>,
    pub export_secs: Option<f64>,
    pub export_file: Option<PathBuf>,
    pub error: Option<String>,
}

/// Repeatedly import the dump and export it back, timing each phase.
///
/// Iteration `i` imports `dump_path` into a fresh `benchmark_db_<i>` and, on
/// success, exports that database to `benchmark_export_<i>.sql` under
/// `output_dir`. Iterations are independent and sequential; the chunked
/// coordinator is the parallel path. A failing iteration records its error
/// and the loop continues.
///
/// # Errors
///
/// Returns an error only if `output_dir` cannot be created.
pub async fn run_benchmark(
    config: &TransferConfig,
    dump_path: &Path,
    iterations: usize,
    output_dir: &Path,
) -> Result<Vec<BenchmarkRecord>> {
    fs::create_dir_all(output_dir).with_context(|| {
        format!(
            "Failed to create benchmark output directory at {}",
            output_dir.display()
        )
    })?;

    let mut records = Vec::with_capacity(iterations);

    for iteration in 1..=iterations {
        let database = format!("benchmark_db_{}", iteration);

        let started = Instant::now();
        let import = import_dump(config, dump_path, Some(&database)).await;
        let import_secs = started.elapsed().as_secs_f64();

        if !import.success {
            tracing::warn!("Iteration {}: import failed: {}", iteration, import.message);
            records.push(BenchmarkRecord {
                iteration,
                success: false,
                import_secs: None,
                export_secs: None,
                export_file: None,
                error: Some(import.message),
            });
            continue;
        }

        let export_file = output_dir.join(format!("benchmark_export_{}.sql", iteration));
        let started = Instant::now();
        let export = export_dump(config, &export_file, Some(&database)).await;
        let export_secs = started.elapsed().as_secs_f64();

        if export.success {
            tracing::info!(
                "Iteration {}: import {:.2}s, export {:.2}s",
                iteration,
                import_secs,
                export_secs
            );
            records.push(BenchmarkRecord {
                iteration,
                success: true,
                import_secs: Some(import_secs),
                export_secs: Some(export_secs),
                export_file: Some(export_file),
                error: None,
            });
        } else {
            tracing::warn!("Iteration {}: export failed: {}", iteration, export.message);
            records.push(BenchmarkRecord {
                iteration,
                success: false,
                import_secs: Some(import_secs),
                export_secs: None,
                export_file: None,
                error: Some(export.message),
            });
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_failed_iterations_are_recorded_not_fatal() {
        let config = TransferConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            max_retries: 1,
            retry_delay_secs: 0,
            ..TransferConfig::default()
        };

        let dir = tempdir().unwrap();
        let dump = dir.path().join("dump.sql");
        fs::write(&dump, "SELECT 1;").unwrap();

        let records = run_benchmark(&config, &dump, 2, &dir.path().join("out"))
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].iteration, 1);
        assert_eq!(records[1].iteration, 2);
        for record in &records {
            assert!(!record.success);
            assert!(record.import_secs.is_none());
            assert!(record.export_secs.is_none());
            assert!(record.error.is_some());
        }
    }

    #[test]
    fn test_record_serializes_to_json() {
        let record = BenchmarkRecord {
            iteration: 1,
            success: true,
            import_secs: Some(1.25),
            export_secs: Some(0.75),
            export_file: Some(PathBuf::from("benchmark_export_1.sql")),
            error: None,
        };

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"iteration\":1"));
        assert!(json.contains("benchmark_export_1.sql"));
    }
}
