//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::charts::ChartFormat;
use crate::loader::SampleDataset;
use clap::Parser;
use std::path::PathBuf;

/// finreport - financial data analysis and reporting
///
/// Load a CSV of company financials (or a bundled sample), compute portfolio,
/// company and sector statistics with simple risk flags, and write a Markdown
/// or JSON report. With an API key, each report section also gets commentary
/// from an OpenAI-compatible chat model.
///
/// Examples:
///   finreport --input financials.csv
///   finreport --sample mixed --charts --export-dir exports
///   finreport --input q1.csv --metric Revenue --format json -o q1.json
///   finreport --self-test
///   finreport --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// CSV file to analyze
    ///
    /// Needs a header row with Company, Revenue, Expenses and Net_Income.
    /// Date, Sector and Market_Cap are optional; other columns are kept.
    #[arg(
        short,
        long,
        value_name = "FILE",
        required_unless_present_any = ["sample", "self_test", "init_config"],
        conflicts_with = "sample"
    )]
    pub input: Option<PathBuf>,

    /// Analyze a bundled sample dataset instead of a file
    #[arg(short, long, value_name = "NAME")]
    pub sample: Option<SampleDataset>,

    /// Run the integrity checks against every built-in scenario and exit
    ///
    /// Exit code 2 when any check fails.
    #[arg(long, conflicts_with_all = ["input", "sample"])]
    pub self_test: bool,

    /// Output file path for the report
    ///
    /// Default: from config or financial_report.md
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Directory for the company CSV, sector CSV and JSON exports
    #[arg(short, long, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,

    /// API key for the text-generation endpoint
    ///
    /// Without a key the report uses the built-in template summary and no
    /// network call is made.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Chat model used for commentary
    #[arg(short, long, env = "FINREPORT_MODEL")]
    pub model: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, value_name = "URL", env = "FINREPORT_API_URL")]
    pub api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Numeric column used to rank top performers
    #[arg(long, value_name = "COLUMN")]
    pub metric: Option<String>,

    /// Number of top performers to list
    #[arg(long, value_name = "COUNT")]
    pub top_n: Option<usize>,

    /// Skip the sector analysis
    #[arg(long)]
    pub no_sectors: bool,

    /// Skip the risk assessment
    #[arg(long)]
    pub no_risk: bool,

    /// Skip the commentary section entirely
    #[arg(long)]
    pub no_narrative: bool,

    /// Include charts in the report
    #[arg(long)]
    pub charts: bool,

    /// Chart output format (text, vega)
    #[arg(long, value_name = "FORMAT")]
    pub chart_format: Option<ChartFormat>,

    /// Exit with code 2 when at least COUNT companies are at risk
    ///
    /// Useful for CI pipelines. Without a value, any company at risk fails.
    #[arg(long, value_name = "COUNT", num_args = 0..=1, default_missing_value = "1")]
    pub fail_on_risk: Option<usize>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .finreport.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .finreport.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Human-readable name of the data source.
    pub fn source_label(&self) -> String {
        match (&self.input, self.sample) {
            (Some(path), _) => path.display().to_string(),
            (None, Some(sample)) => format!("sample: {}", sample.title()),
            (None, None) => String::new(),
        }
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(0) = self.top_n {
            return Err("Top-n must be at least 1".to_string());
        }

        if let Some(ref metric) = self.metric {
            if metric.trim().is_empty() {
                return Err("Metric must name a column".to_string());
            }
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(ref input) = self.input {
            if !input.exists() {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
            if !input.is_file() {
                return Err(format!("Input path is not a file: {}", input.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn make_args() -> Args {
        Args {
            input: None,
            sample: Some(SampleDataset::Tech),
            self_test: false,
            output: None,
            format: OutputFormat::Markdown,
            export_dir: None,
            api_key: None,
            model: None,
            api_url: None,
            timeout: None,
            metric: None,
            top_n: None,
            no_sectors: false,
            no_risk: false,
            no_narrative: false,
            charts: false,
            chart_format: None,
            fail_on_risk: None,
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_command_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_sample_and_flags() {
        let args = Args::try_parse_from([
            "finreport",
            "--sample",
            "mixed-performance",
            "--charts",
            "--chart-format",
            "vega",
            "--fail-on-risk",
        ])
        .unwrap();
        assert_eq!(args.sample, Some(SampleDataset::MixedPerformance));
        assert!(args.charts);
        assert_eq!(args.chart_format, Some(ChartFormat::Vega));
        assert_eq!(args.fail_on_risk, Some(1));
    }

    #[test]
    fn test_input_and_sample_conflict() {
        let result =
            Args::try_parse_from(["finreport", "--input", "a.csv", "--sample", "tech"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_source_is_required() {
        assert!(Args::try_parse_from(["finreport"]).is_err());
        assert!(Args::try_parse_from(["finreport", "--self-test"]).is_ok());
    }

    #[test]
    fn test_validation_missing_input() {
        let mut args = make_args();
        args.sample = None;
        args.input = Some(PathBuf::from("/definitely/not/here.csv"));
        assert!(args.validate().unwrap_err().contains("does not exist"));
    }

    #[test]
    fn test_validation_bad_values() {
        let mut args = make_args();
        args.top_n = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.api_url = Some("ftp://example.com".to_string());
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_source_label() {
        let args = make_args();
        assert_eq!(args.source_label(), "sample: Technology Companies");
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
