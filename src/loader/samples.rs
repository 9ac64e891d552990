//! Bundled sample datasets.
//!
//! The first two mirror the dashboard's "Tech Companies" and "Mixed Sectors"
//! buttons; the remaining four are the self-test scenarios.

use crate::models::{FinancialTable, Record};
use chrono::NaiveDate;

/// A named in-memory dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SampleDataset {
    /// Three technology companies
    Tech,
    /// Four sectors, two of them loss-making
    Mixed,
    /// Large-cap success stories
    LargeCap,
    /// Mixed performance with several losses
    MixedPerformance,
    /// Small-cap high growth
    SmallCap,
    /// Crisis scenario: every company loses money
    Crisis,
}

impl SampleDataset {
    /// The self-test scenarios, in the order they are run.
    pub const SCENARIOS: [SampleDataset; 4] = [
        SampleDataset::LargeCap,
        SampleDataset::MixedPerformance,
        SampleDataset::SmallCap,
        SampleDataset::Crisis,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            SampleDataset::Tech => "Technology Companies",
            SampleDataset::Mixed => "Mixed Sectors",
            SampleDataset::LargeCap => "Large Cap Success Stories",
            SampleDataset::MixedPerformance => "Mixed Performance Companies",
            SampleDataset::SmallCap => "Small Cap High Growth",
            SampleDataset::Crisis => "Crisis Scenario Companies",
        }
    }
}

type Row = (&'static str, f64, f64, f64, &'static str, f64);

const TECH: [Row; 3] = [
    ("TechCorp A", 50e6, 35e6, 15e6, "Technology", 500e6),
    ("TechCorp B", 75e6, 55e6, 20e6, "Technology", 800e6),
    ("TechCorp C", 120e6, 85e6, 35e6, "Technology", 1200e6),
];

const MIXED: [Row; 4] = [
    ("RetailCorp", 25e6, 22e6, 3e6, "Retail", 200e6),
    ("HealthCorp", 40e6, 35e6, 5e6, "Healthcare", 450e6),
    ("EnergyCorp", 80e6, 85e6, -5e6, "Energy", 600e6),
    ("StartupCorp", 5e6, 8e6, -3e6, "Technology", 50e6),
];

const LARGE_CAP: [Row; 5] = [
    ("Apple Inc", 380e9, 270e9, 110e9, "Technology", 3000e9),
    ("Microsoft Corp", 211e9, 150e9, 61e9, "Technology", 2800e9),
    ("Alphabet Inc", 282e9, 220e9, 62e9, "Technology", 1700e9),
    ("Amazon.com Inc", 514e9, 480e9, 34e9, "E-commerce", 1500e9),
    ("Tesla Inc", 96e9, 85e9, 11e9, "Automotive", 800e9),
];

const MIXED_PERFORMANCE: [Row; 5] = [
    ("Boeing Co", 77e9, 85e9, -8e9, "Aerospace", 120e9),
    ("General Motors", 127e9, 125e9, 2e9, "Automotive", 60e9),
    ("Netflix Inc", 31e9, 28e9, 3e9, "Media", 180e9),
    ("Uber Technologies", 37e9, 42e9, -5e9, "Transportation", 80e9),
    ("WeWork Inc", 3e9, 5e9, -2e9, "Real Estate", 5e9),
];

const SMALL_CAP: [Row; 5] = [
    ("Zoom Video", 4.5e9, 3.2e9, 1.3e9, "Technology", 25e9),
    ("Palantir Technologies", 2.2e9, 2.0e9, 0.2e9, "Technology", 35e9),
    ("Snowflake Inc", 2.7e9, 2.2e9, 0.5e9, "Technology", 45e9),
    ("CrowdStrike", 3.0e9, 1.8e9, 1.2e9, "Cybersecurity", 55e9),
    ("Datadog Inc", 2.1e9, 1.5e9, 0.6e9, "Technology", 28e9),
];

const CRISIS: [Row; 5] = [
    ("Bed Bath & Beyond", 7.5e9, 9.5e9, -2.0e9, "Retail", 0.5e9),
    ("Hertz Global", 8.3e9, 9.8e9, -1.5e9, "Transportation", 1.2e9),
    ("AMC Entertainment", 4.5e9, 6.2e9, -1.7e9, "Entertainment", 8e9),
    ("GameStop Corp", 5.9e9, 6.1e9, -0.2e9, "Retail", 12e9),
    ("Blockbuster LLC", 1.2e9, 2.8e9, -1.6e9, "Entertainment", 0.1e9),
];

/// Build the table for a sample dataset.
pub fn sample_table(dataset: SampleDataset) -> FinancialTable {
    let rows: &[Row] = match dataset {
        SampleDataset::Tech => &TECH,
        SampleDataset::Mixed => &MIXED,
        SampleDataset::LargeCap => &LARGE_CAP,
        SampleDataset::MixedPerformance => &MIXED_PERFORMANCE,
        SampleDataset::SmallCap => &SMALL_CAP,
        SampleDataset::Crisis => &CRISIS,
    };
    let date = NaiveDate::from_ymd_opt(2024, 3, 31);

    let records = rows
        .iter()
        .map(|&(company, revenue, expenses, net_income, sector, market_cap)| {
            let record = Record::new(company, revenue, expenses, net_income)
                .with_sector(sector)
                .with_market_cap(market_cap);
            match date {
                Some(d) => record.with_date(d),
                None => record,
            }
        })
        .collect();

    FinancialTable::from_records(records)
}
