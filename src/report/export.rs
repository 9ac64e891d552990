//! Downloadable exports: company CSV, sector CSV and the combined JSON
//! document, each named with the generation date.

use crate::error::Result;
use crate::models::{AnalysisReport, CompanyInsight, PortfolioSummary, RiskFlags, SectorSummary};
use chrono::NaiveDate;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Files written by [`export_all`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFiles {
    pub company_csv: PathBuf,
    /// Only written when the report has sector data.
    pub sector_csv: Option<PathBuf>,
    pub json: PathBuf,
}

impl ExportedFiles {
    pub fn paths(&self) -> Vec<&Path> {
        let mut paths = vec![self.company_csv.as_path()];
        if let Some(ref sector) = self.sector_csv {
            paths.push(sector.as_path());
        }
        paths.push(self.json.as_path());
        paths
    }
}

#[derive(Serialize)]
struct FullReport<'a> {
    #[serde(rename = "Summary")]
    summary: &'a PortfolioSummary,
    #[serde(rename = "Companies")]
    companies: &'a [CompanyInsight],
    #[serde(rename = "Risk_Assessment")]
    risk: Option<&'a RiskFlags>,
}

pub fn company_csv_name(date: NaiveDate) -> String {
    format!("company_report_{}.csv", date.format("%Y%m%d"))
}

pub fn sector_csv_name(date: NaiveDate) -> String {
    format!("sector_analysis_{}.csv", date.format("%Y%m%d"))
}

pub fn json_name(date: NaiveDate) -> String {
    format!("financial_report_{}.json", date.format("%Y%m%d"))
}

/// Write `rows` as CSV with a header taken from their serialized field
/// names. Undefined values become empty cells.
pub fn write_csv<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_company_csv(path: &Path, companies: &[CompanyInsight]) -> Result<()> {
    debug!("Writing {} companies to {}", companies.len(), path.display());
    write_csv(fs::File::create(path)?, companies)
}

pub fn write_sector_csv(path: &Path, sectors: &[SectorSummary]) -> Result<()> {
    debug!("Writing {} sectors to {}", sectors.len(), path.display());
    write_csv(fs::File::create(path)?, sectors)
}

/// The combined document: `Summary`, `Companies` and `Risk_Assessment`
/// (`null` when risk was not computed).
pub fn full_report_json(report: &AnalysisReport) -> Result<String> {
    let full = FullReport {
        summary: &report.summary,
        companies: &report.companies,
        risk: report.risk.as_ref(),
    };
    Ok(serde_json::to_string_pretty(&full)?)
}

/// Write every export for `report` into `dir`, creating it if needed.
pub fn export_all(report: &AnalysisReport, dir: &Path, date: NaiveDate) -> Result<ExportedFiles> {
    fs::create_dir_all(dir)?;

    let company_csv = dir.join(company_csv_name(date));
    write_company_csv(&company_csv, &report.companies)?;

    let sector_csv = if report.sectors.is_empty() {
        None
    } else {
        let path = dir.join(sector_csv_name(date));
        write_sector_csv(&path, &report.sectors)?;
        Some(path)
    };

    let json = dir.join(json_name(date));
    fs::write(&json, full_report_json(report)?)?;

    let files = ExportedFiles {
        company_csv,
        sector_csv,
        json,
    };
    info!("Exported {} files to {}", files.paths().len(), dir.display());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{company_insights, risk_assessment, sector_insights, summarize};
    use crate::loader::{sample_table, SampleDataset};
    use crate::models::{FinancialTable, ReportMetadata, Record};
    use chrono::Utc;
    use tempfile::TempDir;

    fn report_for(table: &FinancialTable) -> AnalysisReport {
        AnalysisReport {
            metadata: ReportMetadata {
                source: "test".to_string(),
                generated_at: Utc::now(),
                records: table.len(),
                columns: table.columns().to_vec(),
                narration: "template".to_string(),
                duration_seconds: 0.0,
            },
            summary: summarize(table),
            companies: company_insights(table),
            sectors: sector_insights(table),
            top_performers: Vec::new(),
            ranking_metric: "Net_Income".to_string(),
            risk: Some(risk_assessment(table)),
            charts: Vec::new(),
            narrative: None,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
    }

    #[test]
    fn test_file_names_carry_date() {
        assert_eq!(company_csv_name(date()), "company_report_20240331.csv");
        assert_eq!(sector_csv_name(date()), "sector_analysis_20240331.csv");
        assert_eq!(json_name(date()), "financial_report_20240331.json");
    }

    #[test]
    fn test_company_csv_round_trips() {
        let table = FinancialTable::from_records(vec![
            Record::new("A", 300.0, 200.0, 100.0),
            Record::new("A", 300.0, 250.0, 50.0),
            Record::new("B", 700.0, 560.0, 140.0),
        ]);
        let companies = company_insights(&table);

        let mut buf = Vec::new();
        write_csv(&mut buf, &companies).unwrap();

        let mut rdr = csv::Reader::from_reader(buf.as_slice());
        let parsed: Vec<CompanyInsight> = rdr
            .deserialize()
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        assert_eq!(parsed.len(), companies.len());
        for (original, back) in companies.iter().zip(&parsed) {
            assert_eq!(original.company, back.company);
            assert!((original.revenue_sum - back.revenue_sum).abs() < 0.01);
            assert!((original.net_income_sum - back.net_income_sum).abs() < 0.01);
            let (m1, m2) = (original.profit_margin.unwrap(), back.profit_margin.unwrap());
            assert!((m1 - m2).abs() < 0.01);
        }
    }

    #[test]
    fn test_undefined_ratio_is_empty_cell() {
        let table = FinancialTable::from_records(vec![Record::new("Zero", 0.0, 10.0, -10.0)]);
        let mut buf = Vec::new();
        write_csv(&mut buf, &company_insights(&table)).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let data_line = text.lines().nth(1).unwrap();
        // Market_Cap_mean, Profit_Margin and Expense_Ratio are all undefined
        assert!(data_line.ends_with(",,,"));
    }

    #[test]
    fn test_export_all_writes_files() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("exports");
        let report = report_for(&sample_table(SampleDataset::Mixed));

        let files = export_all(&report, &out, date()).unwrap();
        assert_eq!(files.paths().len(), 3);
        assert!(files.company_csv.exists());
        assert!(files.sector_csv.as_ref().unwrap().exists());

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&files.json).unwrap()).unwrap();
        assert_eq!(json["Summary"]["total_companies"], 4);
        assert_eq!(json["Companies"].as_array().unwrap().len(), 4);
        assert_eq!(json["Risk_Assessment"]["high_debt_companies"], 4);
    }

    #[test]
    fn test_no_sector_csv_without_sectors() {
        let dir = TempDir::new().unwrap();
        let table = FinancialTable::from_records(vec![Record::new("A", 100.0, 90.0, 10.0)]);
        let mut report = report_for(&table);
        report.risk = None;

        let files = export_all(&report, dir.path(), date()).unwrap();
        assert!(files.sector_csv.is_none());
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&files.json).unwrap()).unwrap();
        assert!(json["Risk_Assessment"].is_null());
    }
}
