// ABOUTME: Chunked concurrent dump import into per-worker isolated databases
// ABOUTME: Aggregates worker outcomes over a channel drained after joining

use crate::config::TransferConfig;
use crate::dump::import::import_dump;
use crate::dump::statement::{partition_statements, split_statements};
use crate::utils;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::mpsc;

/// Outcome of one worker's chunk import.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkOutcome {
    pub database: String,
    pub success: bool,
    pub message: String,
    pub elapsed_secs: f64,
}

/// Database name targeted by the worker for chunk `index`.
pub fn chunk_database_name(prefix: &str, index: usize) -> String {
    format!("{}_thread_{}", prefix, index)
}

/// Write each statement chunk to its own file under `dir`.
///
/// Statements within a chunk keep their original order; rejoining the chunk
/// files in index order reproduces the original statement sequence. One file
/// is written per chunk, including empty ones, so every worker has a target.
pub fn write_chunk_files(
    statements: &[String],
    workers: usize,
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    let chunks = partition_statements(statements, workers);

    let mut paths = Vec::with_capacity(chunks.len());
    for (index, chunk) in chunks.iter().enumerate() {
        let path = dir.join(format!("chunk_{}.sql", index));
        let mut contents = String::new();
        for statement in chunk {
            contents.push_str(statement);
            contents.push_str(";\n");
        }
        fs::write(&path, &contents)
            .with_context(|| format!("Failed to write chunk file at {}", path.display()))?;
        paths.push(path);
    }

    Ok(paths)
}

/// Import a dump concurrently by partitioning it across `workers` databases.
///
/// The dump is tokenized and partitioned into `workers` contiguous,
/// order-preserving chunks (a statement is never split across chunks). Each
/// chunk is imported by its own tokio task into `<prefix>_thread_<i>`, every
/// worker owning its own connection so no execution state is shared. Chunks
/// are only self-contained if the dump is: importing one coherent schema in
/// parallel leaves later chunks without the earlier chunks' tables, which the
/// best-effort importer records as skipped statements.
///
/// Worker outcomes flow over a channel drained after all tasks are joined,
/// so the returned order reflects completion, not chunk index. Temporary
/// chunk files are deleted best-effort afterwards.
///
/// # Errors
///
/// Returns an error if the prefix is not a valid identifier, the worker
/// count is zero, or the dump/chunk files cannot be read or written.
/// Individual chunk import failures are reported in their `ChunkOutcome`,
/// never as an error.
pub async fn import_parallel(
    config: &TransferConfig,
    dump_path: &Path,
    prefix: &str,
    workers: usize,
) -> Result<Vec<ChunkOutcome>> {
    if workers == 0 {
        bail!("Worker count must be at least 1");
    }
    utils::validate_identifier(prefix).context("Invalid database name prefix")?;

    let sql = fs::read_to_string(dump_path)
        .with_context(|| format!("Failed to read dump file at {}", dump_path.display()))?;
    let statements = split_statements(&sql);

    tracing::info!(
        "Partitioning {} statement(s) into {} chunk(s)",
        statements.len(),
        workers
    );

    let chunk_dir = tempfile::Builder::new()
        .prefix("mariadb-dump-chunks-")
        .tempdir()
        .context("Failed to create chunk directory")?;
    let chunk_files = write_chunk_files(&statements, workers, chunk_dir.path())?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut handles = Vec::with_capacity(chunk_files.len());

    for (index, chunk_path) in chunk_files.iter().enumerate() {
        let database = chunk_database_name(prefix, index);
        let config = config.clone();
        let chunk_path = chunk_path.clone();
        let tx = tx.clone();

        handles.push(tokio::spawn(async move {
            let started = Instant::now();
            let result = import_dump(&config, &chunk_path, Some(&database)).await;
            let outcome = ChunkOutcome {
                database,
                success: result.success,
                message: result.message,
                elapsed_secs: started.elapsed().as_secs_f64(),
            };
            if tx.send(outcome).is_err() {
                tracing::warn!("Chunk outcome receiver dropped before aggregation");
            }
        }));
    }
    drop(tx);

    for joined in futures::future::join_all(handles).await {
        if let Err(e) = joined {
            tracing::warn!("Chunk import task panicked: {}", e);
        }
    }

    let mut outcomes = Vec::with_capacity(chunk_files.len());
    while let Some(outcome) = rx.recv().await {
        outcomes.push(outcome);
    }

    for path in &chunk_files {
        if let Err(e) = fs::remove_file(path) {
            tracing::debug!("Leaving chunk file {} behind: {}", path.display(), e);
        }
    }

    let failed = outcomes.iter().filter(|outcome| !outcome.success).count();
    tracing::info!(
        "Chunked import finished: {} worker(s), {} failed",
        outcomes.len(),
        failed
    );

    Ok(outcomes)
}
