// ABOUTME: Uniform success/message result returned by every mutating operation
// ABOUTME: Converts internal anyhow error chains into caller-facing reports

use serde::Serialize;

/// Outcome of a mutating operation (import, export, compress, decompress).
///
/// Every public operation in this crate translates its failures into an
/// `OperationResult` instead of letting them escape. Callers must inspect
/// `success` before relying on side effects; for imports, `success = true`
/// does not guarantee that every individual statement took effect (see
/// [`crate::dump::import::import_dump`]).
#[derive(Debug, Clone, Serialize)]
pub struct OperationResult {
    pub success: bool,
    pub message: String,
}

impl OperationResult {
    /// Build a successful result with the given message.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// Build a failed result with the given message.
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    /// Convert an internal result into the uniform contract.
    ///
    /// Errors are rendered with their full context chain so the caller sees
    /// both the operation that failed and the underlying cause.
    ///
    /// # Examples
    ///
    /// ```
    /// # use mariadb_dump_toolkit::outcome::OperationResult;
    /// let ok = OperationResult::capture(Ok("done".to_string()));
    /// assert!(ok.success);
    ///
    /// let failed = OperationResult::capture(Err(anyhow::anyhow!("boom")));
    /// assert!(!failed.success);
    /// assert!(failed.message.contains("boom"));
    /// ```
    pub fn capture(result: anyhow::Result<String>) -> Self {
        match result {
            Ok(message) => Self::ok(message),
            Err(error) => Self::fail(format!("{error:#}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_capture_success() {
        let result = OperationResult::capture(Ok("all good".to_string()));
        assert!(result.success);
        assert_eq!(result.message, "all good");
    }

    #[test]
    fn test_capture_failure_includes_context_chain() {
        let inner: anyhow::Result<String> =
            Err(anyhow::anyhow!("connection refused")).context("Failed to import dump");
        let result = OperationResult::capture(inner);

        assert!(!result.success);
        assert!(result.message.contains("Failed to import dump"));
        assert!(result.message.contains("connection refused"));
    }

    #[test]
    fn test_serializes_to_json() {
        let result = OperationResult::ok("exported 3 tables");
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("exported 3 tables"));
    }
}
