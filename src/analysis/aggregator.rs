//! Portfolio, company and sector aggregation.
//!
//! Every function here recomputes from the full table; nothing is cached
//! between calls.

use crate::error::{ReportError, Result};
use crate::models::{
    ratio, round2, CompanyInsight, FinancialTable, PortfolioSummary, Record, RiskFlags,
    SectorSummary, TopPerformer,
};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Expense / revenue above which a row is flagged.
const HIGH_EXPENSE_RATIO: f64 = 0.8;

/// Net income / revenue below which a row is flagged.
const LOW_PROFIT_RATIO: f64 = 0.05;

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample standard deviation (n - 1), `None` with fewer than two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Compute portfolio-wide statistics.
///
/// Profit margin and expense ratio are means of per-row ratios, not ratios
/// of the portfolio totals. Rows with zero revenue have no ratio and are left
/// out of those two means.
pub fn summarize(table: &FinancialTable) -> PortfolioSummary {
    let records = table.records();
    let revenue: Vec<f64> = records.iter().map(|r| r.revenue).collect();
    let expenses: Vec<f64> = records.iter().map(|r| r.expenses).collect();
    let net_income: Vec<f64> = records.iter().map(|r| r.net_income).collect();

    let margins: Vec<f64> = records.iter().filter_map(Record::profit_ratio).collect();
    let expense_ratios: Vec<f64> = records.iter().filter_map(Record::expense_ratio).collect();

    let market_caps: Vec<f64> = records.iter().filter_map(|r| r.market_cap).collect();
    let has_market_cap = table.has_market_cap();

    PortfolioSummary {
        total_records: records.len(),
        total_companies: table.distinct_companies(),
        total_revenue: revenue.iter().sum(),
        total_expenses: expenses.iter().sum(),
        total_net_income: net_income.iter().sum(),
        average_revenue: mean(&revenue),
        average_expenses: mean(&expenses),
        average_net_income: mean(&net_income),
        revenue_std: sample_std(&revenue),
        profit_margin_avg: mean(&margins).map(|m| m * 100.0),
        expense_ratio_avg: mean(&expense_ratios).map(|m| m * 100.0),
        total_market_cap: has_market_cap.then(|| market_caps.iter().sum()),
        average_market_cap: if has_market_cap { mean(&market_caps) } else { None },
        market_cap_std: if has_market_cap { sample_std(&market_caps) } else { None },
    }
}

/// Running totals for one group of rows.
#[derive(Debug, Default)]
struct Totals {
    count: usize,
    revenue: f64,
    expenses: f64,
    net_income: f64,
    market_cap: f64,
    market_cap_count: usize,
}

impl Totals {
    fn add(&mut self, record: &Record) {
        self.count += 1;
        self.revenue += record.revenue;
        self.expenses += record.expenses;
        self.net_income += record.net_income;
        if let Some(cap) = record.market_cap {
            self.market_cap += cap;
            self.market_cap_count += 1;
        }
    }

    fn mean_of(&self, total: f64) -> f64 {
        round2(total / self.count as f64)
    }

    fn percent(numerator: f64, denominator: f64) -> Option<f64> {
        ratio(numerator, denominator).map(|r| round2(r * 100.0))
    }
}

fn group_by<'a, F>(records: &'a [Record], key: F) -> BTreeMap<&'a str, Totals>
where
    F: Fn(&'a Record) -> Option<&'a str>,
{
    let mut groups: BTreeMap<&str, Totals> = BTreeMap::new();
    for record in records {
        if let Some(k) = key(record) {
            groups.entry(k).or_default().add(record);
        }
    }
    groups
}

/// One insight per distinct company, sorted by company name.
pub fn company_insights(table: &FinancialTable) -> Vec<CompanyInsight> {
    let has_market_cap = table.has_market_cap();

    group_by(table.records(), |r| Some(r.company.as_str()))
        .into_iter()
        .map(|(company, t)| CompanyInsight {
            company: company.to_string(),
            revenue_sum: round2(t.revenue),
            revenue_mean: t.mean_of(t.revenue),
            expenses_sum: round2(t.expenses),
            expenses_mean: t.mean_of(t.expenses),
            net_income_sum: round2(t.net_income),
            net_income_mean: t.mean_of(t.net_income),
            market_cap_mean: (has_market_cap && t.market_cap_count > 0)
                .then(|| round2(t.market_cap / t.market_cap_count as f64)),
            profit_margin: Totals::percent(t.net_income, t.revenue),
            expense_ratio: Totals::percent(t.expenses, t.revenue),
        })
        .collect()
}

/// One summary per distinct sector; empty when the table has no sector column.
pub fn sector_insights(table: &FinancialTable) -> Vec<SectorSummary> {
    if !table.has_sector() {
        debug!("No Sector column, skipping sector analysis");
        return Vec::new();
    }
    let has_market_cap = table.has_market_cap();

    group_by(table.records(), |r| r.sector.as_deref())
        .into_iter()
        .map(|(sector, t)| SectorSummary {
            sector: sector.to_string(),
            revenue_sum: round2(t.revenue),
            revenue_mean: t.mean_of(t.revenue),
            revenue_count: t.count,
            expenses_sum: round2(t.expenses),
            expenses_mean: t.mean_of(t.expenses),
            net_income_sum: round2(t.net_income),
            net_income_mean: t.mean_of(t.net_income),
            market_cap_sum: has_market_cap.then(|| round2(t.market_cap)),
            avg_profit_margin: Totals::percent(t.net_income, t.revenue),
            expense_ratio: Totals::percent(t.expenses, t.revenue),
        })
        .collect()
}

/// The `n` rows with the largest value of `metric`.
///
/// Ties keep the table's row order. Rows without a value for the metric are
/// skipped.
pub fn top_performers(
    table: &FinancialTable,
    metric: &str,
    n: usize,
) -> Result<Vec<TopPerformer>> {
    if !table.is_numeric_column(metric) {
        return Err(ReportError::InvalidMetric(metric.to_string()));
    }

    let mut ranked: Vec<(&Record, f64)> = table
        .records()
        .iter()
        .filter_map(|r| r.numeric_value(metric).map(|v| (r, v)))
        .collect();
    // sort_by is stable, so equal values stay in row order
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(n);

    Ok(ranked
        .into_iter()
        .map(|(r, value)| TopPerformer {
            company: r.company.clone(),
            revenue: r.revenue,
            expenses: r.expenses,
            net_income: r.net_income,
            sector: r.sector.clone(),
            metric_value: value,
            profit_margin: r.profit_ratio().map(|p| round2(p * 100.0)),
        })
        .collect())
}

/// Apply the fixed risk thresholds to every row.
///
/// A row with zero revenue has no defined ratio and counts as breaching both
/// thresholds. When net income has no spread (fewer than two rows, or all
/// equal) the volatility mean is 0.0 and `volatility_signal` is false.
pub fn risk_assessment(table: &FinancialTable) -> RiskFlags {
    let records = table.records();

    let high_expense =
        |r: &Record| r.expense_ratio().map_or(true, |ratio| ratio > HIGH_EXPENSE_RATIO);
    let low_profit =
        |r: &Record| r.profit_ratio().map_or(true, |ratio| ratio < LOW_PROFIT_RATIO);

    let net_income: Vec<f64> = records.iter().map(|r| r.net_income).collect();
    let volatility = match (mean(&net_income), sample_std(&net_income)) {
        (Some(m), Some(std)) if std > 0.0 => {
            let scores: Vec<f64> = net_income.iter().map(|ni| (ni - m).abs() / std).collect();
            mean(&scores)
        }
        _ => None,
    };

    let mut seen = HashSet::new();
    let companies_at_risk = records
        .iter()
        .filter(|&r| high_expense(r) || low_profit(r))
        .filter(|r| seen.insert(r.company.as_str()))
        .map(|r| r.company.clone())
        .collect();

    RiskFlags {
        high_debt_companies: records.iter().filter(|&r| high_expense(r)).count(),
        low_profit_margin_companies: records.iter().filter(|&r| low_profit(r)).count(),
        average_volatility: volatility.unwrap_or(0.0),
        volatility_signal: volatility.is_some(),
        companies_at_risk,
    }
}

/// The `n` companies with the largest value of `key`, undefined values last.
pub fn top_companies_by<F>(insights: &[CompanyInsight], n: usize, key: F) -> Vec<&CompanyInsight>
where
    F: Fn(&CompanyInsight) -> Option<f64>,
{
    let mut sorted: Vec<&CompanyInsight> = insights.iter().collect();
    sorted.sort_by(|a, b| match (key(a), key(b)) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    sorted.truncate(n);
    sorted
}
