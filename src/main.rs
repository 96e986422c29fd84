// ABOUTME: CLI entry point for mariadb-dump-toolkit
// ABOUTME: Parses subcommands and routes into the library operations

use clap::{Parser, Subcommand};
use mariadb_dump_toolkit::archive::{compress_file, decompress_file};
use mariadb_dump_toolkit::bench::run_benchmark;
use mariadb_dump_toolkit::config::TransferConfig;
use mariadb_dump_toolkit::consistency::check_consistency;
use mariadb_dump_toolkit::dump::{export_dump, import_dump};
use mariadb_dump_toolkit::outcome::OperationResult;
use mariadb_dump_toolkit::parallel::import_parallel;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mariadb-dump-toolkit")]
#[command(about = "Dump transfer, consistency auditing, and import benchmarking for MariaDB", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a SQL dump, optionally into a newly created database
    Import {
        dump: PathBuf,
        /// Create this database (if missing) and import into it
        #[arg(long)]
        database: Option<String>,
    },
    /// Export a database to a SQL dump file
    Export {
        output: PathBuf,
        /// Export this database instead of the configured default
        #[arg(long)]
        database: Option<String>,
    },
    /// Compress a file into a single-entry archive
    Compress { input: PathBuf, output: PathBuf },
    /// Extract an archive into a directory
    Decompress {
        archive: PathBuf,
        output_dir: PathBuf,
    },
    /// Run the consistency audit against the configured database
    Check {
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Import a dump concurrently into per-worker databases
    ParallelImport {
        dump: PathBuf,
        /// Target database name prefix (<prefix>_thread_<i>)
        #[arg(long, default_value = "parallel_import")]
        prefix: String,
        #[arg(long, default_value_t = 4)]
        workers: usize,
        /// Print worker outcomes as JSON
        #[arg(long)]
        json: bool,
    },
    /// Benchmark repeated import/export cycles
    Bench {
        dump: PathBuf,
        #[arg(long, default_value_t = 5)]
        iterations: usize,
        /// Directory receiving the per-iteration export files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
        /// Print iteration records as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging - default to INFO level if RUST_LOG not set
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => TransferConfig::load(path)?,
        None => TransferConfig::default(),
    };

    match cli.command {
        Commands::Import { dump, database } => {
            finish(import_dump(&config, &dump, database.as_deref()).await)
        }
        Commands::Export { output, database } => {
            finish(export_dump(&config, &output, database.as_deref()).await)
        }
        Commands::Compress { input, output } => finish(compress_file(&input, &output)),
        Commands::Decompress {
            archive,
            output_dir,
        } => finish(decompress_file(&archive, &output_dir)),
        Commands::Check { json } => {
            let (result, report) = check_consistency(&config).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for (name, outcome) in &report.checks {
                    if outcome.ran {
                        tracing::info!(
                            "{}: {} violation(s) in {:.3}s",
                            name,
                            outcome.violations,
                            outcome.elapsed_secs
                        );
                    } else {
                        tracing::warn!("{}: did not run", name);
                    }
                }
            }
            finish(result)
        }
        Commands::ParallelImport {
            dump,
            prefix,
            workers,
            json,
        } => {
            let outcomes = import_parallel(&config, &dump, &prefix, workers).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcomes)?);
            } else {
                for outcome in &outcomes {
                    tracing::info!(
                        "{}: {} in {:.2}s - {}",
                        outcome.database,
                        if outcome.success { "ok" } else { "failed" },
                        outcome.elapsed_secs,
                        outcome.message
                    );
                }
            }
            let failed = outcomes.iter().filter(|outcome| !outcome.success).count();
            if failed > 0 {
                anyhow::bail!("{} of {} chunk import(s) failed", failed, outcomes.len());
            }
            Ok(())
        }
        Commands::Bench {
            dump,
            iterations,
            output_dir,
            json,
        } => {
            let records = run_benchmark(&config, &dump, iterations, &output_dir).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                for record in &records {
                    match (record.import_secs, record.export_secs) {
                        (Some(import), Some(export)) => tracing::info!(
                            "Iteration {}: import {:.2}s, export {:.2}s",
                            record.iteration,
                            import,
                            export
                        ),
                        _ => tracing::warn!(
                            "Iteration {}: {}",
                            record.iteration,
                            record.error.as_deref().unwrap_or("failed")
                        ),
                    }
                }
            }
            let failed = records.iter().filter(|record| !record.success).count();
            if failed > 0 {
                anyhow::bail!("{} of {} benchmark iteration(s) failed", failed, records.len());
            }
            Ok(())
        }
    }
}

fn finish(result: OperationResult) -> anyhow::Result<()> {
    if result.success {
        tracing::info!("{}", result.message);
        Ok(())
    } else {
        anyhow::bail!("{}", result.message)
    }
}
