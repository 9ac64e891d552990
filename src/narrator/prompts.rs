//! Prompt construction for each report section, plus the offline template.

use super::Section;
use crate::format::{money, percent};
use crate::models::{CompanyInsight, PortfolioSummary, RiskFlags, SectorSummary, TopPerformer};

/// Companies embedded in the company-analysis prompt.
pub const MAX_COMPANIES: usize = 10;
/// Sectors embedded in the sector prompt.
pub const MAX_SECTORS: usize = 10;
/// Performers embedded in the investment prompt.
pub const MAX_PERFORMERS: usize = 5;
/// At-risk names embedded in the risk prompt.
pub const MAX_RISK_NAMES: usize = 5;

/// Aggregator output the narrator works from.
#[derive(Debug, Clone, Copy)]
pub struct NarrationInput<'a> {
    pub summary: &'a PortfolioSummary,
    pub companies: &'a [CompanyInsight],
    pub sectors: &'a [SectorSummary],
    pub risk: &'a RiskFlags,
    pub top_performers: &'a [TopPerformer],
}

/// Build the prompt for `section`, or `None` when there is nothing to
/// analyse.
pub fn section_prompt(section: Section, input: &NarrationInput<'_>) -> Option<String> {
    match section {
        Section::ExecutiveSummary => Some(executive_summary_prompt(input.summary)),
        Section::CompanyAnalysis => Some(company_prompt(input.companies)),
        Section::SectorInsights => {
            (!input.sectors.is_empty()).then(|| sector_prompt(input.sectors))
        }
        Section::RiskAnalysis => Some(risk_prompt(input.risk)),
        Section::InvestmentRecommendations => (!input.top_performers.is_empty())
            .then(|| investment_prompt(input.top_performers)),
    }
}

fn executive_summary_prompt(summary: &PortfolioSummary) -> String {
    format!(
        "As a senior financial analyst, provide an executive summary based on the following financial data:

Financial Metrics:
- Total Companies Analyzed: {}
- Total Revenue: {}
- Total Expenses: {}
- Total Net Income: {}
- Average Profit Margin: {}
- Average Expense Ratio: {}

Please provide:
1. Key financial highlights
2. Performance trends and insights
3. Risk factors to consider
4. Strategic recommendations

Keep the summary professional, concise, and actionable (max 300 words).",
        summary.total_companies,
        money(summary.total_revenue),
        money(summary.total_expenses),
        money(summary.total_net_income),
        percent(summary.profit_margin_avg, 2),
        percent(summary.expense_ratio_avg, 2),
    )
}

fn company_prompt(companies: &[CompanyInsight]) -> String {
    let mut ranked: Vec<&CompanyInsight> = companies.iter().collect();
    ranked.sort_by(|a, b| b.revenue_sum.total_cmp(&a.revenue_sum));

    let lines: Vec<String> = ranked
        .iter()
        .take(MAX_COMPANIES)
        .map(|c| {
            format!(
                "- {}: Revenue {}, Net Income {}, Profit Margin {}",
                c.company,
                money(c.revenue_sum),
                money(c.net_income_sum),
                percent(c.profit_margin, 1)
            )
        })
        .collect();

    format!(
        "Analyze the performance of these companies based on their financial metrics:

{}

Provide insights on:
1. Which companies show the strongest financial health
2. Companies that may need attention or restructuring
3. Industry patterns or trends you observe
4. Recommendations for portfolio management

Be specific and data-driven in your analysis (max 250 words).",
        lines.join("\n")
    )
}

fn sector_prompt(sectors: &[SectorSummary]) -> String {
    let mut ranked: Vec<&SectorSummary> = sectors.iter().collect();
    ranked.sort_by(|a, b| b.revenue_sum.total_cmp(&a.revenue_sum));

    let lines: Vec<String> = ranked
        .iter()
        .take(MAX_SECTORS)
        .map(|s| {
            format!(
                "- {}: Total Revenue {}, Companies: {}, Avg Profit Margin: {}",
                s.sector,
                money(s.revenue_sum),
                s.revenue_count,
                percent(s.avg_profit_margin, 1)
            )
        })
        .collect();

    format!(
        "Analyze sector performance based on the following data:

{}

Provide insights on:
1. Best performing sectors and why
2. Sectors facing challenges
3. Market opportunities and threats
4. Investment recommendations by sector

Focus on actionable insights for investors and business leaders (max 200 words).",
        lines.join("\n")
    )
}

fn risk_prompt(risk: &RiskFlags) -> String {
    let names: Vec<&str> = risk
        .companies_at_risk
        .iter()
        .take(MAX_RISK_NAMES)
        .map(String::as_str)
        .collect();
    let volatility = if risk.volatility_signal {
        format!("{:.2}", risk.average_volatility)
    } else {
        "not measurable (no spread in net income)".to_string()
    };

    format!(
        "Based on the following risk metrics, provide a comprehensive risk assessment:

Risk Indicators:
- High Debt Companies: {}
- Low Profit Margin Companies: {}
- Average Volatility Score: {}
- Companies at Risk: {}

Provide:
1. Overall risk level assessment
2. Key risk factors and their implications
3. Specific recommendations for risk mitigation
4. Monitoring strategies for ongoing risk management

Be practical and specific in your recommendations (max 250 words).",
        risk.high_debt_companies,
        risk.low_profit_margin_companies,
        volatility,
        if names.is_empty() {
            "none".to_string()
        } else {
            names.join(", ")
        }
    )
}

fn investment_prompt(performers: &[TopPerformer]) -> String {
    let lines: Vec<String> = performers
        .iter()
        .take(MAX_PERFORMERS)
        .map(|p| {
            format!(
                "- {}: Revenue {}, Net Income {}, Profit Margin {}, Sector: {}",
                p.company,
                money(p.revenue),
                money(p.net_income),
                percent(p.profit_margin, 1),
                p.sector.as_deref().unwrap_or("Unknown")
            )
        })
        .collect();

    format!(
        "Based on the top performing companies, provide investment recommendations:

Top Performers:
{}

Provide:
1. Investment attractiveness ranking
2. Growth potential assessment
3. Risk-adjusted return expectations
4. Portfolio allocation suggestions
5. Timeline recommendations (short/medium/long term)

Focus on practical investment advice (max 250 words).",
        lines.join("\n")
    )
}

/// Deterministic summary used when no remote endpoint is configured.
pub fn basic_summary(summary: &PortfolioSummary) -> String {
    let margin = summary.profit_margin_avg.unwrap_or(0.0);
    let expense_ratio = summary.expense_ratio_avg.unwrap_or(0.0);

    let profitability = if margin > 15.0 {
        "Strong profitability across portfolio"
    } else {
        "Moderate profitability levels"
    };
    let costs = if expense_ratio < 80.0 {
        "Efficient cost management"
    } else {
        "Room for cost optimization"
    };
    let revenue = if summary.total_revenue > 1e9 {
        "Healthy revenue generation"
    } else {
        "Growing revenue base"
    };

    format!(
        "FINANCIAL PERFORMANCE SUMMARY
=============================

Portfolio Overview:
• Total Companies: {}
• Combined Revenue: {}
• Combined Net Income: {}
• Average Profit Margin: {}

Key Metrics:
• Revenue per company: {}
• Net Income per company: {}
• Expense Ratio: {}

Performance Assessment:
• {}
• {}
• {}
",
        summary.total_companies,
        money(summary.total_revenue),
        money(summary.total_net_income),
        percent(summary.profit_margin_avg, 2),
        money(summary.average_revenue.unwrap_or(0.0)),
        money(summary.average_net_income.unwrap_or(0.0)),
        percent(summary.expense_ratio_avg, 2),
        profitability,
        costs,
        revenue,
    )
}
