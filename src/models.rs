//! Data models for the financial report generator.
//!
//! This module contains the input table, the per-row record and every
//! derived aggregate that the report, export and narrator layers consume.

use crate::error::{ReportError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

pub const COMPANY: &str = "Company";
pub const REVENUE: &str = "Revenue";
pub const EXPENSES: &str = "Expenses";
pub const NET_INCOME: &str = "Net_Income";
pub const DATE: &str = "Date";
pub const SECTOR: &str = "Sector";
pub const MARKET_CAP: &str = "Market_Cap";

/// Columns every table must carry.
pub const REQUIRED_COLUMNS: [&str; 4] = [COMPANY, REVENUE, EXPENSES, NET_INCOME];

/// Divide, returning `None` instead of an infinite or NaN result.
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    let value = numerator / denominator;
    value.is_finite().then_some(value)
}

/// Round to the two decimals used in every published table.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One input row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub company: String,
    pub date: Option<NaiveDate>,
    pub revenue: f64,
    pub expenses: f64,
    pub net_income: f64,
    pub sector: Option<String>,
    pub market_cap: Option<f64>,
    /// Columns outside the known schema, kept verbatim.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl Record {
    pub fn new(company: impl Into<String>, revenue: f64, expenses: f64, net_income: f64) -> Self {
        Self {
            company: company.into(),
            date: None,
            revenue,
            expenses,
            net_income,
            sector: None,
            market_cap: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }

    pub fn with_market_cap(mut self, market_cap: f64) -> Self {
        self.market_cap = Some(market_cap);
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Net income over revenue for this row.
    pub fn profit_ratio(&self) -> Option<f64> {
        ratio(self.net_income, self.revenue)
    }

    /// Expenses over revenue for this row.
    pub fn expense_ratio(&self) -> Option<f64> {
        ratio(self.expenses, self.revenue)
    }

    /// Numeric value of a column for this row, `None` when the cell is empty
    /// or not a number.
    pub fn numeric_value(&self, column: &str) -> Option<f64> {
        match column {
            REVENUE => Some(self.revenue),
            EXPENSES => Some(self.expenses),
            NET_INCOME => Some(self.net_income),
            MARKET_CAP => self.market_cap,
            other => self
                .extra
                .get(other)
                .and_then(|raw| raw.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite()),
        }
    }
}

/// The dataset for one session, passed explicitly into every computation.
#[derive(Debug, Clone, PartialEq)]
pub struct FinancialTable {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl FinancialTable {
    /// Build a table from a header row and its records.
    ///
    /// Fails with `MissingColumn` naming the first required column absent
    /// from `columns`.
    pub fn new(columns: Vec<String>, records: Vec<Record>) -> Result<Self> {
        if let Some(missing) = REQUIRED_COLUMNS
            .iter()
            .find(|required| !columns.iter().any(|c| c == *required))
        {
            return Err(ReportError::MissingColumn((*missing).to_string()));
        }
        Ok(Self { columns, records })
    }

    /// Build a table from in-memory records, deriving the header from which
    /// optional fields are populated.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut columns: Vec<String> = vec![COMPANY.to_string()];
        if records.iter().any(|r| r.date.is_some()) {
            columns.push(DATE.to_string());
        }
        columns.extend([REVENUE, EXPENSES, NET_INCOME].map(String::from));
        if records.iter().any(|r| r.sector.is_some()) {
            columns.push(SECTOR.to_string());
        }
        if records.iter().any(|r| r.market_cap.is_some()) {
            columns.push(MARKET_CAP.to_string());
        }
        let mut extra: Vec<&String> = records.iter().flat_map(|r| r.extra.keys()).collect();
        extra.sort();
        extra.dedup();
        columns.extend(extra.into_iter().cloned());

        Self { columns, records }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn has_sector(&self) -> bool {
        self.has_column(SECTOR)
    }

    pub fn has_market_cap(&self) -> bool {
        self.has_column(MARKET_CAP)
    }

    /// Number of distinct company names.
    pub fn distinct_companies(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.company.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Whether `name` is a column whose every non-empty cell is a number.
    pub fn is_numeric_column(&self, name: &str) -> bool {
        match name {
            REVENUE | EXPENSES | NET_INCOME => true,
            MARKET_CAP => self.has_market_cap(),
            COMPANY | SECTOR | DATE => false,
            other => {
                self.has_column(other)
                    && self.records.iter().all(|r| match r.extra.get(other) {
                        Some(raw) if !raw.trim().is_empty() => {
                            raw.trim().parse::<f64>().is_ok()
                        }
                        _ => true,
                    })
            }
        }
    }
}

/// Portfolio-wide statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_records: usize,
    pub total_companies: usize,
    pub total_revenue: f64,
    pub total_expenses: f64,
    pub total_net_income: f64,
    pub average_revenue: Option<f64>,
    pub average_expenses: Option<f64>,
    pub average_net_income: Option<f64>,
    pub revenue_std: Option<f64>,
    /// Mean of per-row net income / revenue, in percent.
    pub profit_margin_avg: Option<f64>,
    /// Mean of per-row expenses / revenue, in percent.
    pub expense_ratio_avg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_market_cap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_market_cap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap_std: Option<f64>,
}

/// Aggregates for one company across all of its rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyInsight {
    #[serde(rename = "Company")]
    pub company: String,
    #[serde(rename = "Revenue_sum")]
    pub revenue_sum: f64,
    #[serde(rename = "Revenue_mean")]
    pub revenue_mean: f64,
    #[serde(rename = "Expenses_sum")]
    pub expenses_sum: f64,
    #[serde(rename = "Expenses_mean")]
    pub expenses_mean: f64,
    #[serde(rename = "Net_Income_sum")]
    pub net_income_sum: f64,
    #[serde(rename = "Net_Income_mean")]
    pub net_income_mean: f64,
    #[serde(rename = "Market_Cap_mean")]
    pub market_cap_mean: Option<f64>,
    #[serde(rename = "Profit_Margin")]
    pub profit_margin: Option<f64>,
    #[serde(rename = "Expense_Ratio")]
    pub expense_ratio: Option<f64>,
}

/// Aggregates for one sector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorSummary {
    #[serde(rename = "Sector")]
    pub sector: String,
    #[serde(rename = "Revenue_sum")]
    pub revenue_sum: f64,
    #[serde(rename = "Revenue_mean")]
    pub revenue_mean: f64,
    #[serde(rename = "Revenue_count")]
    pub revenue_count: usize,
    #[serde(rename = "Expenses_sum")]
    pub expenses_sum: f64,
    #[serde(rename = "Expenses_mean")]
    pub expenses_mean: f64,
    #[serde(rename = "Net_Income_sum")]
    pub net_income_sum: f64,
    #[serde(rename = "Net_Income_mean")]
    pub net_income_mean: f64,
    #[serde(rename = "Market_Cap_sum")]
    pub market_cap_sum: Option<f64>,
    #[serde(rename = "Avg_Profit_Margin")]
    pub avg_profit_margin: Option<f64>,
    #[serde(rename = "Expense_Ratio")]
    pub expense_ratio: Option<f64>,
}

/// A ranked input row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPerformer {
    #[serde(rename = "Company")]
    pub company: String,
    #[serde(rename = "Revenue")]
    pub revenue: f64,
    #[serde(rename = "Expenses")]
    pub expenses: f64,
    #[serde(rename = "Net_Income")]
    pub net_income: f64,
    #[serde(rename = "Sector")]
    pub sector: Option<String>,
    /// Value of the ranking metric for this row.
    #[serde(rename = "Metric_Value")]
    pub metric_value: f64,
    #[serde(rename = "Profit_Margin")]
    pub profit_margin: Option<f64>,
}

/// Fixed-threshold risk indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFlags {
    /// Rows whose expenses exceed 80% of revenue.
    pub high_debt_companies: usize,
    /// Rows whose net income is below 5% of revenue.
    pub low_profit_margin_companies: usize,
    pub average_volatility: f64,
    /// False when net income has no spread to measure against.
    pub volatility_signal: bool,
    /// Distinct names of companies breaching either threshold, in row order.
    pub companies_at_risk: Vec<String>,
}

/// Metadata about one generated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Input file path or sample dataset name.
    pub source: String,
    pub generated_at: DateTime<Utc>,
    pub records: usize,
    pub columns: Vec<String>,
    /// Model name, or "template" for the offline summary.
    pub narration: String,
    pub duration_seconds: f64,
}

/// Everything computed for one interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub metadata: ReportMetadata,
    pub summary: PortfolioSummary,
    pub companies: Vec<CompanyInsight>,
    pub sectors: Vec<SectorSummary>,
    pub top_performers: Vec<TopPerformer>,
    /// Metric the top performers were ranked by.
    pub ranking_metric: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskFlags>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub charts: Vec<crate::charts::RenderedChart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative: Option<crate::narrator::Narrative>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_rejects_zero_denominator() {
        assert_eq!(ratio(10.0, 100.0), Some(0.1));
        assert_eq!(ratio(10.0, 0.0), None);
        assert_eq!(ratio(0.0, 0.0), None);
        assert_eq!(ratio(f64::INFINITY, 1.0), None);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(33.33333), 33.33);
        assert_eq!(round2(-1.005e2), -100.5);
        assert_eq!(round2(12.0), 12.0);
    }

    #[test]
    fn test_table_requires_columns() {
        let columns = vec!["Company".to_string(), "Revenue".to_string(), "Expenses".to_string()];
        let err = FinancialTable::new(columns, vec![]).unwrap_err();
        assert!(matches!(err, ReportError::MissingColumn(ref c) if c == "Net_Income"));
    }

    #[test]
    fn test_from_records_derives_columns() {
        let table = FinancialTable::from_records(vec![
            Record::new("A", 100.0, 90.0, 10.0).with_sector("Tech"),
            Record::new("B", 200.0, 100.0, 100.0),
        ]);
        assert!(table.has_sector());
        assert!(!table.has_market_cap());
        assert!(!table.has_column("Date"));
        assert_eq!(table.distinct_companies(), 2);
    }

    #[test]
    fn test_numeric_columns() {
        let mut record = Record::new("A", 100.0, 90.0, 10.0);
        record.extra.insert("Employees".to_string(), "42".to_string());
        record.extra.insert("Ticker".to_string(), "AAA".to_string());
        let table = FinancialTable::from_records(vec![record.clone()]);

        assert!(table.is_numeric_column("Revenue"));
        assert!(table.is_numeric_column("Employees"));
        assert!(!table.is_numeric_column("Ticker"));
        assert!(!table.is_numeric_column("Company"));
        assert!(!table.is_numeric_column("Market_Cap"));
        assert!(!table.is_numeric_column("Nope"));
        assert_eq!(record.numeric_value("Employees"), Some(42.0));
    }

    #[test]
    fn test_record_ratios() {
        let record = Record::new("A", 200.0, 150.0, 50.0);
        assert_eq!(record.profit_ratio(), Some(0.25));
        assert_eq!(record.expense_ratio(), Some(0.75));

        let empty = Record::new("Z", 0.0, 10.0, -10.0);
        assert_eq!(empty.profit_ratio(), None);
        assert_eq!(empty.expense_ratio(), None);
    }
}
