//! Loader for delimited financial tables.
//!
//! Reads a CSV file (or any reader) with a header row into a
//! [`FinancialTable`], trimming column names and parsing dates.

pub mod samples;

pub use samples::{sample_table, SampleDataset};

use crate::error::{ReportError, Result};
use crate::models::{
    FinancialTable, Record, COMPANY, DATE, EXPENSES, MARKET_CAP, NET_INCOME, REVENUE, SECTOR,
};
use chrono::{DateTime, NaiveDate};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Load a table from a CSV file on disk.
pub fn load_path(path: &Path) -> Result<FinancialTable> {
    info!("Loading financial data from {}", path.display());
    let file = File::open(path).map_err(|e| {
        ReportError::data_format(format!("cannot open {}: {}", path.display(), e))
    })?;
    load_reader(file)
}

/// Load a table from any reader producing CSV text.
pub fn load_reader<R: Read>(reader: R) -> Result<FinancialTable> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::Headers)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| ReportError::data_format(e.to_string()))?
        .clone();
    let columns: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();
    debug!("Columns: {:?}", columns);

    let layout = ColumnLayout::resolve(&columns)?;

    let mut records = Vec::new();
    for (index, row) in csv_reader.records().enumerate() {
        // Header is line 1.
        let line = index + 2;
        let row = row.map_err(|e| ReportError::data_format(format!("line {}: {}", line, e)))?;
        records.push(layout.parse_row(&row, line)?);
    }

    info!("Loaded {} records with {} columns", records.len(), columns.len());
    FinancialTable::new(columns, records)
}

/// Parse a calendar date in one of the accepted layouts.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Positions of the known columns within a header row.
struct ColumnLayout {
    company: usize,
    revenue: usize,
    expenses: usize,
    net_income: usize,
    date: Option<usize>,
    sector: Option<usize>,
    market_cap: Option<usize>,
    extra: Vec<(usize, String)>,
}

impl ColumnLayout {
    fn resolve(columns: &[String]) -> Result<Self> {
        let find = |name: &str| columns.iter().position(|c| c == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| ReportError::MissingColumn(name.to_string()))
        };

        let known = [COMPANY, REVENUE, EXPENSES, NET_INCOME, DATE, SECTOR, MARKET_CAP];
        let extra = columns
            .iter()
            .enumerate()
            .filter(|(_, c)| !known.contains(&c.as_str()))
            .map(|(i, c)| (i, c.clone()))
            .collect();

        Ok(Self {
            company: require(COMPANY)?,
            revenue: require(REVENUE)?,
            expenses: require(EXPENSES)?,
            net_income: require(NET_INCOME)?,
            date: find(DATE),
            sector: find(SECTOR),
            market_cap: find(MARKET_CAP),
            extra,
        })
    }

    fn parse_row(&self, row: &StringRecord, line: usize) -> Result<Record> {
        let cell = |idx: usize| row.get(idx).map(str::trim).unwrap_or("");

        let company = cell(self.company);
        if company.is_empty() {
            return Err(ReportError::data_format(format!(
                "line {}: empty {} value",
                line, COMPANY
            )));
        }

        let number = |idx: usize, column: &str| -> Result<f64> {
            let raw = cell(idx);
            let value = raw.parse::<f64>().map_err(|_| {
                ReportError::data_format(format!(
                    "line {}: {} value '{}' is not a number",
                    line, column, raw
                ))
            })?;
            if !value.is_finite() {
                return Err(ReportError::data_format(format!(
                    "line {}: {} value '{}' is not a finite number",
                    line, column, raw
                )));
            }
            Ok(value)
        };

        let date = match self.date.map(cell) {
            Some(raw) if !raw.is_empty() => Some(parse_date(raw).ok_or_else(|| {
                ReportError::data_format(format!("line {}: unparseable Date '{}'", line, raw))
            })?),
            _ => None,
        };

        let market_cap = match self.market_cap {
            Some(idx) if !cell(idx).is_empty() => Some(number(idx, MARKET_CAP)?),
            _ => None,
        };

        let sector = self
            .sector
            .map(cell)
            .filter(|s| !s.is_empty())
            .map(String::from);

        let extra: BTreeMap<String, String> = self
            .extra
            .iter()
            .map(|(idx, name)| (name.clone(), cell(*idx).to_string()))
            .collect();

        Ok(Record {
            company: company.to_string(),
            date,
            revenue: number(self.revenue, REVENUE)?,
            expenses: number(self.expenses, EXPENSES)?,
            net_income: number(self.net_income, NET_INCOME)?,
            sector,
            market_cap,
            extra,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CSV: &str = "\
 Company , Date ,Revenue,Expenses,Net_Income,Sector,Market_Cap
A,2024-03-31,100,90,10,Tech,1000
B,2024-03-31,200,100,100,,
";

    #[test]
    fn test_load_trims_headers_and_parses() {
        let table = load_reader(CSV.as_bytes()).unwrap();
        assert_eq!(
            table.columns(),
            &["Company", "Date", "Revenue", "Expenses", "Net_Income", "Sector", "Market_Cap"]
        );
        assert_eq!(table.len(), 2);

        let a = &table.records()[0];
        assert_eq!(a.company, "A");
        assert_eq!(a.date, NaiveDate::from_ymd_opt(2024, 3, 31));
        assert_eq!(a.sector.as_deref(), Some("Tech"));
        assert_eq!(a.market_cap, Some(1000.0));

        let b = &table.records()[1];
        assert_eq!(b.sector, None);
        assert_eq!(b.market_cap, None);
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "Company,Revenue,Expenses\nA,1,2\n";
        let err = load_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, ReportError::MissingColumn(ref c) if c == "Net_Income"));
    }

    #[test]
    fn test_bad_date_fails_whole_load() {
        let csv = "Company,Date,Revenue,Expenses,Net_Income\nA,2024-03-31,1,1,0\nB,not-a-date,1,1,0\n";
        let err = load_reader(csv.as_bytes()).unwrap_err();
        match err {
            ReportError::DataFormat(msg) => {
                assert!(msg.contains("line 3"));
                assert!(msg.contains("not-a-date"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ragged_rows_are_format_errors() {
        let csv = "Company,Revenue,Expenses,Net_Income\nA,1,2\n";
        let err = load_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, ReportError::DataFormat(_)));
    }

    #[test]
    fn test_non_numeric_revenue() {
        let csv = "Company,Revenue,Expenses,Net_Income\nA,lots,2,3\n";
        let err = load_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("'lots'"));
    }

    #[test]
    fn test_non_finite_cells_are_rejected() {
        let csv = "Company,Revenue,Expenses,Net_Income\nA,100,90,10\nB,NaN,100,100\n";
        let err = load_reader(csv.as_bytes()).unwrap_err();
        match err {
            ReportError::DataFormat(msg) => {
                assert!(msg.contains("line 3"));
                assert!(msg.contains("Revenue value 'NaN' is not a finite number"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let csv = "Company,Revenue,Expenses,Net_Income\nC,1,-inf,1\n";
        let err = load_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Expenses value '-inf'"));

        let csv = "Company,Revenue,Expenses,Net_Income,Market_Cap\nD,1,1,0,inf\n";
        let err = load_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Market_Cap value 'inf'"));
    }

    #[test]
    fn test_extra_columns_are_kept() {
        let csv = "Company,Revenue,Expenses,Net_Income,Employees\nA,1,2,3,40\n";
        let table = load_reader(csv.as_bytes()).unwrap();
        assert!(table.is_numeric_column("Employees"));
        assert_eq!(table.records()[0].numeric_value("Employees"), Some(40.0));
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 31);
        assert_eq!(parse_date("2024-03-31"), expected);
        assert_eq!(parse_date("2024/03/31"), expected);
        assert_eq!(parse_date("03/31/2024"), expected);
        assert_eq!(parse_date("2024-03-31T10:00:00Z"), expected);
        assert_eq!(parse_date("2024-03-31 10:00:00"), expected);
        assert_eq!(parse_date("31st March"), None);
    }

    #[test]
    fn test_load_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, CSV).unwrap();

        let table = load_path(&path).unwrap();
        assert_eq!(table.distinct_companies(), 2);

        let missing = load_path(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(missing, ReportError::DataFormat(_)));
    }

    #[test]
    fn test_load_fixture() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/quarterly_financials.csv");
        let table = load_path(&path).unwrap();

        assert_eq!(table.len(), 9);
        assert_eq!(table.distinct_companies(), 5);
        assert!(table.has_column("Date"));
        assert!(table.is_numeric_column("Employees"));

        let adatum = &table.records()[8];
        assert_eq!(adatum.market_cap, None);
        assert_eq!(adatum.date, NaiveDate::from_ymd_opt(2024, 6, 30));
        assert_eq!(table.records()[6].numeric_value("Employees"), None);
    }
}
