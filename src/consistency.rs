// ABOUTME: Analytical audit queries against a populated reservation database
// ABOUTME: Aggregates violations, timing, and raw rows into a per-check report

use crate::config::TransferConfig;
use crate::mariadb;
use crate::mariadb::reader::value_text;
use crate::outcome::OperationResult;
use anyhow::Context;
use mysql_async::prelude::*;
use mysql_async::Row;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;

/// One named audit query. A nonempty result set indicates violations.
#[derive(Debug, Clone, Copy)]
pub struct CheckDefinition {
    pub name: &'static str,
    pub query: &'static str,
}

/// Seats assigned more than once on the same flight.
const DUPLICATE_SEATS: CheckDefinition = CheckDefinition {
    name: "duplicate_seats",
    query: "\
        SELECT f.flight_id, r.seat, COUNT(*) AS duplicates \
        FROM Flight f \
        JOIN Booking b ON f.flight_id = b.flight_id \
        JOIN Reserve r ON b.booking_id = r.booking_id \
        GROUP BY f.flight_id, r.seat \
        HAVING duplicates > 1",
};

/// Booking pairs of one passenger whose flight intervals intersect.
///
/// Overlap is strict half-open intersection
/// (`f1.departure_time < f2.arrival_time AND f2.departure_time < f1.arrival_time`):
/// back-to-back flights sharing an endpoint are not flagged. Pairs are
/// reported once via `b1.booking_id < b2.booking_id`.
const OVERLAPPING_BOOKINGS: CheckDefinition = CheckDefinition {
    name: "overlapping_bookings",
    query: "\
        SELECT b1.passenger_id, b1.booking_id, b2.booking_id AS conflicting_booking_id \
        FROM Booking b1 \
        JOIN Booking b2 \
          ON b1.passenger_id = b2.passenger_id AND b1.booking_id < b2.booking_id \
        JOIN Flight f1 ON b1.flight_id = f1.flight_id \
        JOIN Flight f2 ON b2.flight_id = f2.flight_id \
        WHERE f1.departure_time < f2.arrival_time \
          AND f2.departure_time < f1.arrival_time",
};

const CHECKS: &[CheckDefinition] = &[DUPLICATE_SEATS, OVERLAPPING_BOOKINGS];

/// The fixed audit check set, in execution order. Grows as checks are added.
pub fn audit_checks() -> &'static [CheckDefinition] {
    CHECKS
}

/// Result of one audit check run.
///
/// `ran = false` records a check whose query failed and was skipped; its
/// violation count is meaningless in that case.
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub ran: bool,
    pub violations: usize,
    pub elapsed_secs: f64,
    pub rows: Vec<Vec<String>>,
}

/// Per-check outcomes keyed by check name. Entries are only ever added.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConsistencyReport {
    pub checks: BTreeMap<String, CheckOutcome>,
}

impl ConsistencyReport {
    /// Total violations across all checks that actually ran.
    pub fn total_violations(&self) -> usize {
        self.checks
            .values()
            .filter(|outcome| outcome.ran)
            .map(|outcome| outcome.violations)
            .sum()
    }
}

/// Run the audit check set against the configured database.
///
/// A connection failure aborts the whole run with an empty report. A failure
/// in one query does not: the check is recorded with `ran = false` and the
/// run continues with the next check. Each check is timed independently.
pub async fn check_consistency(config: &TransferConfig) -> (OperationResult, ConsistencyReport) {
    let mut report = ConsistencyReport::default();

    let mut conn = match mariadb::connect_with_retry(config)
        .await
        .context("Consistency checks aborted")
    {
        Ok(conn) => conn,
        Err(e) => return (OperationResult::fail(format!("{e:#}")), report),
    };

    for check in audit_checks() {
        let started = Instant::now();
        match conn.query::<Row, _>(check.query).await {
            Ok(rows) => {
                let elapsed_secs = started.elapsed().as_secs_f64();
                let rows: Vec<Vec<String>> = rows.iter().map(row_to_text).collect();
                tracing::info!(
                    "Check '{}': {} violation(s) in {:.3}s",
                    check.name,
                    rows.len(),
                    elapsed_secs
                );
                report.checks.insert(
                    check.name.to_string(),
                    CheckOutcome {
                        ran: true,
                        violations: rows.len(),
                        elapsed_secs,
                        rows,
                    },
                );
            }
            Err(e) => {
                tracing::warn!("Check '{}' failed, skipping: {}", check.name, e);
                report.checks.insert(
                    check.name.to_string(),
                    CheckOutcome {
                        ran: false,
                        violations: 0,
                        elapsed_secs: started.elapsed().as_secs_f64(),
                        rows: Vec::new(),
                    },
                );
            }
        }
    }

    mariadb::disconnect(conn).await;

    let flagged = report
        .checks
        .values()
        .filter(|outcome| outcome.ran && outcome.violations > 0)
        .count();
    let skipped = report.checks.values().filter(|outcome| !outcome.ran).count();

    (
        OperationResult::ok(format!(
            "Completed {} consistency check(s) ({} with violations, {} skipped)",
            report.checks.len(),
            flagged,
            skipped
        )),
        report,
    )
}

fn row_to_text(row: &Row) -> Vec<String> {
    (0..row.len())
        .map(|i| {
            row.as_ref(i)
                .map(value_text)
                .unwrap_or_else(|| "NULL".to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_names_are_unique() {
        let mut names: Vec<&str> = audit_checks().iter().map(|check| check.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), audit_checks().len());
    }

    #[test]
    fn test_duplicate_seat_check_groups_by_flight_and_seat() {
        let query = DUPLICATE_SEATS.query;
        assert!(query.contains("GROUP BY f.flight_id, r.seat"));
        assert!(query.contains("HAVING duplicates > 1"));
    }

    #[test]
    fn test_overlap_predicate_is_strict_intersection() {
        let query = OVERLAPPING_BOOKINGS.query;
        assert!(query.contains("f1.departure_time < f2.arrival_time"));
        assert!(query.contains("f2.departure_time < f1.arrival_time"));
        // Each pair reported once
        assert!(query.contains("b1.booking_id < b2.booking_id"));
    }

    #[test]
    fn test_report_totals_skip_checks_that_did_not_run() {
        let mut report = ConsistencyReport::default();
        report.checks.insert(
            "a".to_string(),
            CheckOutcome {
                ran: true,
                violations: 2,
                elapsed_secs: 0.1,
                rows: Vec::new(),
            },
        );
        report.checks.insert(
            "b".to_string(),
            CheckOutcome {
                ran: false,
                violations: 0,
                elapsed_secs: 0.0,
                rows: Vec::new(),
            },
        );

        assert_eq!(report.total_violations(), 2);
    }

    #[test]
    fn test_report_serializes_to_json() {
        let mut report = ConsistencyReport::default();
        report.checks.insert(
            "duplicate_seats".to_string(),
            CheckOutcome {
                ran: true,
                violations: 1,
                elapsed_secs: 0.05,
                rows: vec![vec!["7".to_string(), "12A".to_string(), "2".to_string()]],
            },
        );

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("duplicate_seats"));
        assert!(json.contains("12A"));
        assert!(json.contains("\"ran\":true"));
    }
}
