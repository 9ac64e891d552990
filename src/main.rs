//! finreport - financial data analysis and reporting
//!
//! A CLI tool that loads tabular company financials, computes portfolio,
//! company and sector statistics with simple risk flags, and writes a
//! Markdown or JSON report with optional LLM commentary.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (unreadable input, missing column, invalid metric, I/O)
//!   2 - Self-test failure, or --fail-on-risk threshold reached

mod analysis;
mod charts;
mod cli;
mod config;
mod error;
mod format;
mod loader;
mod models;
mod narrator;
mod report;

use analysis::{
    company_insights, integrity_checks, risk_assessment, sector_insights, summarize,
    top_performers,
};
use anyhow::{Context, Result};
use chrono::{Local, Utc};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use format::{money, percent};
use loader::{sample_table, SampleDataset};
use models::{AnalysisReport, FinancialTable, ReportMetadata};
use narrator::{ChatClient, NarrationInput, Narrator};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before clap reads env-backed arguments
    let dotenv = dotenvy::dotenv();

    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args)?;

    info!("finreport v{}", env!("CARGO_PKG_VERSION"));
    match dotenv {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => debug!("No .env file found"),
        Err(e) => warn!("Failed to load .env: {}", e),
    }
    debug!("Arguments: {:?}", args);

    let outcome = if args.self_test {
        run_self_test()
    } else {
        run_report(args).await
    };

    match outcome {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Report failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .finreport.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize the model, ranking metric, charts, and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) -> Result<()> {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Run the integrity checks over every built-in scenario. Returns exit code (0 or 2).
fn run_self_test() -> Result<i32> {
    println!("🧪 Running integrity checks on built-in scenarios...\n");

    let mut failures = 0;
    for dataset in SampleDataset::SCENARIOS {
        let table = sample_table(dataset);
        let summary = summarize(&table);
        println!("📊 {}", dataset.title());
        println!(
            "   Revenue: {} | Net Income: {} | Avg Margin: {}",
            money(summary.total_revenue),
            money(summary.total_net_income),
            percent(summary.profit_margin_avg, 2)
        );

        for check in integrity_checks(&table, &summary) {
            let mark = if check.passed { "✅" } else { "❌" };
            println!("   {} {}: {}", mark, check.name, check.message);
            if !check.passed {
                failures += 1;
            }
        }

        let risk = risk_assessment(&table);
        println!(
            "   Risk: {} high expense, {} low margin, {} at risk\n",
            risk.high_debt_companies,
            risk.low_profit_margin_companies,
            risk.companies_at_risk.len()
        );
    }

    if failures > 0 {
        eprintln!("⛔ {} integrity check(s) failed (exit code 2).", failures);
        return Ok(2);
    }
    println!("✅ All integrity checks passed.");
    Ok(0)
}

/// Run the complete report workflow. Returns exit code (0 or 2).
async fn run_report(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    // Step 1: Load the data
    let table = load_table(&args)?;
    println!(
        "📥 Loaded {} records ({} companies) from {}",
        table.len(),
        table.distinct_companies(),
        args.source_label()
    );

    // Step 2: Aggregate
    let summary = summarize(&table);
    let companies = company_insights(&table);
    let sectors = if config.report.include_sectors {
        sector_insights(&table)
    } else {
        Vec::new()
    };
    let top = top_performers(&table, &config.report.ranking_metric, config.report.top_n)?;
    let risk = config.report.include_risk.then(|| risk_assessment(&table));
    info!(
        "Aggregated {} companies, {} sectors, {} top performers",
        companies.len(),
        sectors.len(),
        top.len()
    );

    // Step 3: Charts
    let rendered_charts = if config.charts.enabled {
        match charts::select_renderer(config.charts.format) {
            Some(renderer) => {
                charts::render_all(renderer.as_ref(), &charts::build_charts(&table, &sectors))
            }
            None => Vec::new(),
        }
    } else {
        Vec::new()
    };

    // Step 4: Commentary
    let narrative = if config.report.include_narrative {
        let narrator = build_narrator(&args, &config)?.with_progress(!args.quiet);
        if narrator.is_remote() {
            println!("🤖 Generating commentary with {}...", config.model.name);
        }
        let risk_for_prompt = risk.clone().unwrap_or_else(|| risk_assessment(&table));
        let input = NarrationInput {
            summary: &summary,
            companies: &companies,
            sectors: &sectors,
            risk: &risk_for_prompt,
            top_performers: &top,
        };
        Some(narrator.narrate(&input).await)
    } else {
        None
    };

    // Step 5: Build and write the report
    let metadata = ReportMetadata {
        source: args.source_label(),
        generated_at: Utc::now(),
        records: table.len(),
        columns: table.columns().to_vec(),
        narration: narrative
            .as_ref()
            .map(|n| n.mode_label())
            .unwrap_or_else(|| "none".to_string()),
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };

    let report = AnalysisReport {
        metadata,
        summary,
        companies,
        sectors,
        top_performers: top,
        ranking_metric: config.report.ranking_metric.clone(),
        risk,
        charts: rendered_charts,
        narrative,
    };

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };
    let output_path = PathBuf::from(&config.general.output);
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    if let Some(ref dir) = config.general.export_dir {
        let files = report::export_all(&report, Path::new(dir), Local::now().date_naive())
            .with_context(|| format!("Failed to export to {}", dir))?;
        for path in files.paths() {
            println!("💾 Exported {}", path.display());
        }
    }

    // Print summary
    println!("\n📊 Analysis Summary:");
    println!(
        "   Companies: {} | Records: {}",
        report.summary.total_companies, report.summary.total_records
    );
    println!(
        "   Revenue: {} | Net Income: {}",
        money(report.summary.total_revenue),
        money(report.summary.total_net_income)
    );
    println!(
        "   Avg Profit Margin: {}",
        percent(report.summary.profit_margin_avg, 2)
    );
    if let Some(ref risk) = report.risk {
        println!("   Companies at risk: {}", risk.companies_at_risk.len());
    }
    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
    println!("\n✅ Report saved to: {}", output_path.display());

    // Check --fail-on-risk threshold
    if let Some(threshold) = args.fail_on_risk {
        let at_risk = report
            .risk
            .as_ref()
            .map(|r| r.companies_at_risk.len())
            .unwrap_or_else(|| risk_assessment(&table).companies_at_risk.len());
        if at_risk >= threshold {
            eprintln!(
                "\n⛔ {} companies at risk (threshold {}). Failing (exit code 2).",
                at_risk, threshold
            );
            return Ok(2);
        }
    }

    Ok(0)
}

/// Load the table named on the command line.
fn load_table(args: &Args) -> Result<FinancialTable> {
    if let Some(ref path) = args.input {
        info!("Loading {}", path.display());
        return loader::load_path(path)
            .with_context(|| format!("Failed to load {}", path.display()));
    }
    let dataset = args.sample.unwrap_or(SampleDataset::Tech);
    info!("Using sample dataset: {}", dataset.title());
    Ok(sample_table(dataset))
}

/// Remote narrator when an API key is configured, template otherwise.
fn build_narrator(args: &Args, config: &Config) -> Result<Narrator> {
    match args.api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => {
            let client = ChatClient::new(config.chat_config(key))?;
            Ok(Narrator::remote(Box::new(client)))
        }
        _ => {
            info!("No API key set, commentary will use the template summary");
            Ok(Narrator::template())
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
