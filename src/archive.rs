// ABOUTME: Compresses dump files into single-entry DEFLATE archives and back
// ABOUTME: Pure file-to-file transforms with no database dependency

use crate::outcome::OperationResult;
use anyhow::{anyhow, Context, Result};
use flate2::read::GzDecoder;
use flate2::{Compression, GzBuilder};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

/// Compress a file into a single-entry archive.
///
/// Produces a gzip (DEFLATE) archive whose single member carries the input
/// file's base name in the header, so extraction can restore the original
/// name. Failures (missing input, unwritable output) are reported through
/// the result, never propagated.
///
/// # Examples
///
/// ```no_run
/// # use std::path::Path;
/// # use mariadb_dump_toolkit::archive::compress_file;
/// let result = compress_file(
///     Path::new("flight_database_dump.sql"),
///     Path::new("flight_database_dump.sql.gz"),
/// );
/// assert!(result.success);
/// ```
pub fn compress_file(input_path: &Path, output_path: &Path) -> OperationResult {
    OperationResult::capture(compress_inner(input_path, output_path))
}

fn compress_inner(input_path: &Path, output_path: &Path) -> Result<String> {
    let entry_name = input_path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_owned)
        .ok_or_else(|| anyhow!("Input path {} has no file name", input_path.display()))?;

    let mut input = File::open(input_path)
        .with_context(|| format!("Failed to open input file at {}", input_path.display()))?;
    let output = File::create(output_path)
        .with_context(|| format!("Failed to create archive at {}", output_path.display()))?;

    let mut encoder = GzBuilder::new()
        .filename(entry_name.as_str())
        .write(output, Compression::default());

    let bytes = io::copy(&mut input, &mut encoder)
        .with_context(|| format!("Failed to compress {}", input_path.display()))?;
    encoder
        .finish()
        .with_context(|| format!("Failed to finalize archive at {}", output_path.display()))?;

    tracing::info!(
        "Compressed {} ({} byte(s)) into {}",
        input_path.display(),
        bytes,
        output_path.display()
    );

    Ok(format!(
        "Compressed {} into {}",
        input_path.display(),
        output_path.display()
    ))
}

/// Extract an archive's entries into a directory.
///
/// The single member is written into `output_dir` under the name stored in
/// the archive header, reduced to its final path component so a crafted
/// archive cannot escape the directory; when the header carries no name, the
/// archive's own stem is used. The directory is created if missing.
/// A corrupt or missing archive is reported through the result.
pub fn decompress_file(archive_path: &Path, output_dir: &Path) -> OperationResult {
    OperationResult::capture(decompress_inner(archive_path, output_dir))
}

fn decompress_inner(archive_path: &Path, output_dir: &Path) -> Result<String> {
    let file = File::open(archive_path)
        .with_context(|| format!("Failed to open archive at {}", archive_path.display()))?;

    let mut decoder = GzDecoder::new(file);
    let mut contents = Vec::new();
    decoder
        .read_to_end(&mut contents)
        .with_context(|| format!("Failed to decompress archive at {}", archive_path.display()))?;

    let stored_name = decoder
        .header()
        .and_then(|header| header.filename())
        .and_then(|raw| std::str::from_utf8(raw).ok())
        .map(str::to_owned);
    let entry_name = stored_name
        .as_deref()
        .and_then(|name| Path::new(name).file_name())
        .and_then(|name| name.to_str())
        .map(str::to_owned)
        .unwrap_or_else(|| fallback_entry_name(archive_path));

    fs::create_dir_all(output_dir).with_context(|| {
        format!(
            "Failed to create output directory at {}",
            output_dir.display()
        )
    })?;

    let target = output_dir.join(&entry_name);
    fs::write(&target, &contents)
        .with_context(|| format!("Failed to write extracted file at {}", target.display()))?;

    tracing::info!(
        "Decompressed {} ({} byte(s)) into {}",
        archive_path.display(),
        contents.len(),
        target.display()
    );

    Ok(format!(
        "Decompressed {} into {}",
        archive_path.display(),
        target.display()
    ))
}

fn fallback_entry_name(archive_path: &Path) -> String {
    archive_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_owned)
        .unwrap_or_else(|| "archive.out".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_round_trip_is_byte_identical() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("dump.sql");
        let archive = dir.path().join("dump.sql.gz");
        let extracted_dir = dir.path().join("out");

        let payload = "CREATE TABLE t (id INT);\nINSERT INTO t VALUES (1),(2);\n";
        fs::write(&input, payload).unwrap();

        let compressed = compress_file(&input, &archive);
        assert!(compressed.success, "{}", compressed.message);

        let decompressed = decompress_file(&archive, &extracted_dir);
        assert!(decompressed.success, "{}", decompressed.message);

        let restored = fs::read(extracted_dir.join("dump.sql")).unwrap();
        assert_eq!(restored, payload.as_bytes());
    }

    #[test]
    fn test_round_trip_of_empty_file() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("empty.sql");
        let archive = dir.path().join("empty.sql.gz");
        fs::write(&input, "").unwrap();

        assert!(compress_file(&input, &archive).success);
        assert!(decompress_file(&archive, dir.path().join("out").as_path()).success);
        assert_eq!(fs::read(dir.path().join("out/empty.sql")).unwrap(), b"");
    }

    #[test]
    fn test_missing_input_is_reported() {
        let dir = tempdir().unwrap();
        let result = compress_file(
            &dir.path().join("does_not_exist.sql"),
            &dir.path().join("out.gz"),
        );

        assert!(!result.success);
        assert!(result.message.contains("Failed to open input file"));
    }

    #[test]
    fn test_corrupt_archive_is_reported() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("broken.gz");
        fs::write(&archive, b"this is not a gzip stream").unwrap();

        let result = decompress_file(&archive, &dir.path().join("out"));
        assert!(!result.success);
        assert!(result.message.contains("Failed to decompress archive"));
    }

    #[test]
    fn test_stored_entry_name_is_sanitized_to_base_name() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("dump.sql");
        fs::write(&input, "SELECT 1;").unwrap();

        // Write an archive whose stored name tries to climb out of the
        // extraction directory.
        let archive = dir.path().join("evil.gz");
        let output = File::create(&archive).unwrap();
        let mut encoder = GzBuilder::new()
            .filename("../../escape.sql")
            .write(output, Compression::default());
        let mut source = File::open(&input).unwrap();
        io::copy(&mut source, &mut encoder).unwrap();
        encoder.finish().unwrap();

        let out_dir = dir.path().join("out");
        let result = decompress_file(&archive, &out_dir);
        assert!(result.success, "{}", result.message);
        assert!(out_dir.join("escape.sql").exists());
        assert!(!dir.path().join("escape.sql").exists());
    }
}
