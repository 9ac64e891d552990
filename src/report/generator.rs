//! Markdown report generation.
//!
//! This module renders a complete [`AnalysisReport`] as a Markdown document
//! or as pretty-printed JSON.

use crate::analysis::top_companies_by;
use crate::charts::RenderedChart;
use crate::error::Result;
use crate::format::{money, opt_money, percent, thousands};
use crate::models::{
    AnalysisReport, CompanyInsight, PortfolioSummary, ReportMetadata, RiskFlags, SectorSummary,
    TopPerformer,
};
use crate::narrator::Narrative;

/// Companies listed in each leaderboard table.
const LEADERBOARD_SIZE: usize = 5;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &AnalysisReport) -> String {
    let mut output = String::new();

    output.push_str("# Financial Analysis Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(report));
    output.push_str(&generate_summary_section(&report.summary));
    output.push_str(&generate_company_section(&report.companies));
    output.push_str(&generate_sector_section(&report.sectors));
    output.push_str(&generate_top_performers_section(
        &report.top_performers,
        &report.ranking_metric,
    ));
    if let Some(ref risk) = report.risk {
        output.push_str(&generate_risk_section(risk));
    }
    output.push_str(&generate_charts_section(&report.charts));
    if let Some(ref narrative) = report.narrative {
        output.push_str(&generate_narrative_section(narrative));
    }
    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Records:** {}\n", metadata.records));
    section.push_str(&format!("- **Columns:** {}\n", metadata.columns.join(", ")));
    section.push_str(&format!("- **Narration:** `{}`\n", metadata.narration));
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn generate_table_of_contents(report: &AnalysisReport) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Summary](#summary)\n");
    toc.push_str("- [Company Performance](#company-performance)\n");
    if !report.sectors.is_empty() {
        toc.push_str("- [Sector Analysis](#sector-analysis)\n");
    }
    if !report.top_performers.is_empty() {
        toc.push_str("- [Top Performers](#top-performers)\n");
    }
    if report.risk.is_some() {
        toc.push_str("- [Risk Assessment](#risk-assessment)\n");
    }
    if !report.charts.is_empty() {
        toc.push_str("- [Charts](#charts)\n");
    }
    if report.narrative.is_some() {
        toc.push_str("- [Insights](#insights)\n");
    }
    toc.push('\n');

    toc
}

fn generate_summary_section(summary: &PortfolioSummary) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str("| Metric | Value |\n");
    section.push_str("|:---|---:|\n");

    let mut row = |name: &str, value: String| {
        section.push_str(&format!("| {} | {} |\n", name, value));
    };
    row("Total Companies", summary.total_companies.to_string());
    row("Total Records", summary.total_records.to_string());
    row("Total Revenue", money(summary.total_revenue));
    row("Total Expenses", money(summary.total_expenses));
    row("Net Income", money(summary.total_net_income));
    row("Average Revenue", opt_money(summary.average_revenue));
    row("Average Expenses", opt_money(summary.average_expenses));
    row("Average Net Income", opt_money(summary.average_net_income));
    row("Revenue Std Dev", opt_money(summary.revenue_std));
    row("Avg Profit Margin", percent(summary.profit_margin_avg, 2));
    row("Avg Expense Ratio", percent(summary.expense_ratio_avg, 2));
    if let Some(total) = summary.total_market_cap {
        row("Total Market Cap", money(total));
        row("Average Market Cap", opt_money(summary.average_market_cap));
        row("Market Cap Std Dev", opt_money(summary.market_cap_std));
    }
    section.push('\n');

    section
}

fn company_table(companies: &[&CompanyInsight]) -> String {
    let mut table = String::new();
    table.push_str(
        "| Company | Revenue | Expenses | Net Income | Profit Margin | Expense Ratio |\n",
    );
    table.push_str("|:---|---:|---:|---:|---:|---:|\n");
    for c in companies {
        table.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            c.company,
            money(c.revenue_sum),
            money(c.expenses_sum),
            money(c.net_income_sum),
            percent(c.profit_margin, 2),
            percent(c.expense_ratio, 2)
        ));
    }
    table.push('\n');
    table
}

fn generate_company_section(companies: &[CompanyInsight]) -> String {
    let mut section = String::new();

    section.push_str("## Company Performance\n\n");
    if companies.is_empty() {
        section.push_str("No company data.\n\n");
        return section;
    }

    section.push_str(&format!("### Top {} by Revenue\n\n", LEADERBOARD_SIZE));
    section.push_str(&company_table(&top_companies_by(
        companies,
        LEADERBOARD_SIZE,
        |c| Some(c.revenue_sum),
    )));

    section.push_str(&format!("### Top {} by Profit Margin\n\n", LEADERBOARD_SIZE));
    section.push_str(&company_table(&top_companies_by(
        companies,
        LEADERBOARD_SIZE,
        |c| c.profit_margin,
    )));

    section
}

fn generate_sector_section(sectors: &[SectorSummary]) -> String {
    if sectors.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Sector Analysis\n\n");
    section.push_str(
        "| Sector | Records | Revenue | Expenses | Net Income | Avg Profit Margin | Expense Ratio |\n",
    );
    section.push_str("|:---|:---:|---:|---:|---:|---:|---:|\n");

    let mut ranked: Vec<&SectorSummary> = sectors.iter().collect();
    ranked.sort_by(|a, b| b.revenue_sum.total_cmp(&a.revenue_sum));
    for s in ranked {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} |\n",
            s.sector,
            s.revenue_count,
            money(s.revenue_sum),
            money(s.expenses_sum),
            money(s.net_income_sum),
            percent(s.avg_profit_margin, 2),
            percent(s.expense_ratio, 2)
        ));
    }
    section.push('\n');

    section
}

fn generate_top_performers_section(performers: &[TopPerformer], metric: &str) -> String {
    if performers.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Top Performers\n\n");
    section.push_str(&format!("*Ranked by `{}`*\n\n", metric));
    section.push_str(&format!(
        "| # | Company | Sector | {} | Revenue | Net Income | Profit Margin |\n",
        metric
    ));
    section.push_str("|:---:|:---|:---|---:|---:|---:|---:|\n");

    for (i, p) in performers.iter().enumerate() {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} |\n",
            i + 1,
            p.company,
            p.sector.as_deref().unwrap_or("-"),
            thousands(p.metric_value),
            money(p.revenue),
            money(p.net_income),
            percent(p.profit_margin, 2)
        ));
    }
    section.push('\n');

    section
}

fn generate_risk_section(risk: &RiskFlags) -> String {
    let mut section = String::new();

    section.push_str("## Risk Assessment\n\n");
    section.push_str("| Indicator | Value |\n");
    section.push_str("|:---|---:|\n");
    section.push_str(&format!(
        "| Rows with high expense ratio (> 80% of revenue) | {} |\n",
        risk.high_debt_companies
    ));
    section.push_str(&format!(
        "| Rows with low profit margin (< 5% of revenue) | {} |\n",
        risk.low_profit_margin_companies
    ));
    let volatility = if risk.volatility_signal {
        format!("{:.2}", risk.average_volatility)
    } else {
        "n/a".to_string()
    };
    section.push_str(&format!("| Average volatility score | {} |\n\n", volatility));

    if risk.companies_at_risk.is_empty() {
        section.push_str("No companies breach the risk thresholds.\n\n");
    } else {
        section.push_str(&format!(
            "**Companies at risk** ({} distinct; the counts above are per row):\n\n",
            risk.companies_at_risk.len()
        ));
        for company in &risk.companies_at_risk {
            section.push_str(&format!("- {}\n", company));
        }
        section.push('\n');
    }

    section
}

fn generate_charts_section(charts: &[RenderedChart]) -> String {
    if charts.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Charts\n\n");
    for chart in charts {
        section.push_str(&format!("### {}\n\n", chart.title));
        section.push_str(&format!("```{}\n", chart.language));
        section.push_str(chart.body.trim_end());
        section.push_str("\n```\n\n");
    }

    section
}

fn generate_narrative_section(narrative: &Narrative) -> String {
    let mut section = String::new();

    section.push_str("## Insights\n\n");
    match narrative {
        Narrative::Remote { model, sections } => {
            section.push_str(&format!("*Generated by `{}`*\n\n", model));
            for passage in sections {
                section.push_str(&format!("### {}\n\n", passage.section));
                if passage.generated {
                    section.push_str(passage.text.trim());
                    section.push_str("\n\n");
                } else {
                    section.push_str(&format!("> {}\n\n", passage.text.trim()));
                }
            }
        }
        Narrative::Template { summary } => {
            section.push_str(
                "*No text-generation endpoint configured; showing the basic summary.*\n\n",
            );
            section.push_str("```text\n");
            section.push_str(summary.trim_end());
            section.push_str("\n```\n\n");
        }
    }

    section
}

fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by finreport v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &AnalysisReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
