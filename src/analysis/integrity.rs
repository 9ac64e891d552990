//! Data-integrity checks used by the self-test mode.

use crate::models::{FinancialTable, PortfolioSummary};
use serde::Serialize;

/// Absolute tolerance for the recomputed totals.
const TOTAL_TOLERANCE: f64 = 1000.0;

/// Outcome of a single integrity check.
#[derive(Debug, Clone, Serialize)]
pub struct IntegrityCheck {
    pub name: &'static str,
    pub passed: bool,
    pub message: String,
}

impl IntegrityCheck {
    fn new(name: &'static str, passed: bool, message: String) -> Self {
        Self {
            name,
            passed,
            message,
        }
    }
}

/// Recompute the headline figures independently and compare them with
/// `summary`.
pub fn integrity_checks(table: &FinancialTable, summary: &PortfolioSummary) -> Vec<IntegrityCheck> {
    let records = table.records();
    let mut checks = Vec::with_capacity(5);

    let expected_revenue: f64 = records.iter().map(|r| r.revenue).sum();
    checks.push(IntegrityCheck::new(
        "Revenue Calculation",
        (expected_revenue - summary.total_revenue).abs() < TOTAL_TOLERANCE,
        format!(
            "Expected: {:.0}, Got: {:.0}",
            expected_revenue, summary.total_revenue
        ),
    ));

    let expected_income: f64 = records.iter().map(|r| r.net_income).sum();
    checks.push(IntegrityCheck::new(
        "Net Income Calculation",
        (expected_income - summary.total_net_income).abs() < TOTAL_TOLERANCE,
        format!(
            "Expected: {:.0}, Got: {:.0}",
            expected_income, summary.total_net_income
        ),
    ));

    let mut names: Vec<&str> = records.iter().map(|r| r.company.as_str()).collect();
    names.sort_unstable();
    names.dedup();
    checks.push(IntegrityCheck::new(
        "Company Count",
        names.len() == summary.total_companies,
        format!("Expected: {}, Got: {}", names.len(), summary.total_companies),
    ));

    let all_finite = records
        .iter()
        .all(|r| r.revenue.is_finite() && r.expenses.is_finite() && r.net_income.is_finite());
    checks.push(IntegrityCheck::new(
        "Numeric Data Types",
        all_finite,
        if all_finite {
            "All financial columns are numeric".to_string()
        } else {
            "Some financial columns are not numeric".to_string()
        },
    ));

    // the loader rejects rows with missing critical cells, so every row must be counted
    checks.push(IntegrityCheck::new(
        "Record Count",
        records.len() == summary.total_records,
        format!("Expected: {}, Got: {}", records.len(), summary.total_records),
    ));

    checks
}
