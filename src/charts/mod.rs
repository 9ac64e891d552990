//! Chart construction and pluggable rendering.
//!
//! [`build_charts`] turns a table and its sector summary into renderer-neutral
//! [`Chart`] values. A [`ChartRenderer`] turns each one into text; callers ask
//! [`select_renderer`] for the configured format and get a fallback when that
//! format is not compiled in.

mod text;
#[cfg(feature = "vega")]
mod vega;

pub use text::TextChartRenderer;
#[cfg(feature = "vega")]
pub use vega::VegaLiteRenderer;

use crate::error::Result;
use crate::format::{money, percent};
use crate::models::{FinancialTable, SectorSummary};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Rows shown in the company breakdown chart.
const TOP_COMPANIES: usize = 10;

/// Output format requested for charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChartFormat {
    /// Plain-text bar charts
    #[default]
    Text,
    /// Vega-Lite JSON specifications
    Vega,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    GroupedBar,
    Pie,
    /// First series is x, second is y.
    Scatter,
}

/// How chart values are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueUnit {
    Money,
    Percent,
}

impl ValueUnit {
    pub fn format(&self, value: f64) -> String {
        match self {
            ValueUnit::Money => money(value),
            ValueUnit::Percent => percent(Some(value), 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

/// Renderer-neutral chart data: one label per point, one value per label in
/// every series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub id: String,
    pub title: String,
    pub kind: ChartKind,
    pub unit: ValueUnit,
    pub labels: Vec<String>,
    pub series: Vec<Series>,
    /// Optional grouping per label, used to colour scatter points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<String>>,
}

/// A chart after rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedChart {
    pub id: String,
    pub title: String,
    pub renderer: String,
    /// Markdown code-fence language for `body`.
    pub language: String,
    pub body: String,
}

/// Something that can draw a [`Chart`].
pub trait ChartRenderer {
    fn name(&self) -> &'static str;

    /// Code-fence language of the rendered output.
    fn language(&self) -> &'static str;

    /// Whether this renderer can be used in the current build.
    fn is_available(&self) -> bool;

    fn render(&self, chart: &Chart) -> Result<String>;
}

/// Every renderer compiled into this build.
pub fn renderers() -> Vec<(ChartFormat, Box<dyn ChartRenderer>)> {
    let mut list: Vec<(ChartFormat, Box<dyn ChartRenderer>)> =
        vec![(ChartFormat::Text, Box::new(TextChartRenderer::default()))];
    #[cfg(feature = "vega")]
    list.push((ChartFormat::Vega, Box::new(VegaLiteRenderer)));
    list
}

/// Renderer for `format`, falling back to any available renderer.
///
/// Returns `None` only when nothing can render charts.
pub fn select_renderer(format: ChartFormat) -> Option<Box<dyn ChartRenderer>> {
    let mut available: Vec<(ChartFormat, Box<dyn ChartRenderer>)> = renderers()
        .into_iter()
        .filter(|(_, r)| r.is_available())
        .collect();

    if let Some(pos) = available.iter().position(|(f, _)| *f == format) {
        let (_, renderer) = available.swap_remove(pos);
        debug!("Using {} chart renderer", renderer.name());
        return Some(renderer);
    }

    if available.is_empty() {
        warn!("No chart renderer available, skipping charts");
        return None;
    }
    let (_, renderer) = available.swap_remove(0);
    warn!(
        "Chart format {:?} is not available in this build, using {}",
        format,
        renderer.name()
    );
    Some(renderer)
}

/// Render every chart, dropping (and logging) the ones that fail.
pub fn render_all(renderer: &dyn ChartRenderer, charts: &[Chart]) -> Vec<RenderedChart> {
    charts
        .iter()
        .filter_map(|chart| match renderer.render(chart) {
            Ok(body) => Some(RenderedChart {
                id: chart.id.clone(),
                title: chart.title.clone(),
                renderer: renderer.name().to_string(),
                language: renderer.language().to_string(),
                body,
            }),
            Err(e) => {
                warn!("Failed to render chart {}: {}", chart.id, e);
                None
            }
        })
        .collect()
}

/// The dashboard's chart set for one table.
pub fn build_charts(table: &FinancialTable, sectors: &[SectorSummary]) -> Vec<Chart> {
    let mut charts = Vec::new();
    if table.is_empty() {
        return charts;
    }

    let records = table.records();
    charts.push(Chart {
        id: "revenue_vs_income".to_string(),
        title: "Revenue vs Net Income by Company".to_string(),
        kind: ChartKind::Scatter,
        unit: ValueUnit::Money,
        labels: records.iter().map(|r| r.company.clone()).collect(),
        series: vec![
            Series {
                name: "Revenue".to_string(),
                values: records.iter().map(|r| r.revenue).collect(),
            },
            Series {
                name: "Net Income".to_string(),
                values: records.iter().map(|r| r.net_income).collect(),
            },
        ],
        groups: table.has_sector().then(|| {
            records
                .iter()
                .map(|r| r.sector.clone().unwrap_or_default())
                .collect()
        }),
    });

    if !sectors.is_empty() {
        charts.push(Chart {
            id: "sector_revenue".to_string(),
            title: "Revenue Distribution by Sector".to_string(),
            kind: ChartKind::Pie,
            unit: ValueUnit::Money,
            labels: sectors.iter().map(|s| s.sector.clone()).collect(),
            series: vec![Series {
                name: "Revenue".to_string(),
                values: sectors.iter().map(|s| s.revenue_sum).collect(),
            }],
            groups: None,
        });

        let with_margin: Vec<&SectorSummary> = sectors
            .iter()
            .filter(|s| s.avg_profit_margin.is_some())
            .collect();
        if !with_margin.is_empty() {
            charts.push(Chart {
                id: "sector_margin".to_string(),
                title: "Average Profit Margin by Sector".to_string(),
                kind: ChartKind::Bar,
                unit: ValueUnit::Percent,
                labels: with_margin.iter().map(|s| s.sector.clone()).collect(),
                series: vec![Series {
                    name: "Profit Margin (%)".to_string(),
                    values: with_margin
                        .iter()
                        .filter_map(|s| s.avg_profit_margin)
                        .collect(),
                }],
                groups: None,
            });
        }
    }

    let mut by_revenue: Vec<_> = records.iter().collect();
    by_revenue.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    by_revenue.truncate(TOP_COMPANIES);
    charts.push(Chart {
        id: "top_companies".to_string(),
        title: format!("Top {} Companies by Revenue", by_revenue.len()),
        kind: ChartKind::GroupedBar,
        unit: ValueUnit::Money,
        labels: by_revenue.iter().map(|r| r.company.clone()).collect(),
        series: vec![
            Series {
                name: "Revenue".to_string(),
                values: by_revenue.iter().map(|r| r.revenue).collect(),
            },
            Series {
                name: "Expenses".to_string(),
                values: by_revenue.iter().map(|r| r.expenses).collect(),
            },
            Series {
                name: "Net Income".to_string(),
                values: by_revenue.iter().map(|r| r.net_income).collect(),
            },
        ],
        groups: None,
    });

    charts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::sector_insights;
    use crate::loader::{sample_table, SampleDataset};
    use crate::models::Record;

    #[test]
    fn test_build_charts_with_sectors() {
        let table = sample_table(SampleDataset::Mixed);
        let charts = build_charts(&table, &sector_insights(&table));
        let ids: Vec<&str> = charts.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["revenue_vs_income", "sector_revenue", "sector_margin", "top_companies"]
        );
        assert!(charts[0].groups.is_some());
        // largest revenue first
        assert_eq!(charts[3].labels[0], "EnergyCorp");
    }

    #[test]
    fn test_build_charts_without_sectors() {
        let table = FinancialTable::from_records(vec![
            Record::new("A", 100.0, 90.0, 10.0),
            Record::new("B", 200.0, 100.0, 100.0),
        ]);
        let charts = build_charts(&table, &[]);
        assert_eq!(charts.len(), 2);
        assert!(charts[0].groups.is_none());
        assert_eq!(charts[1].title, "Top 2 Companies by Revenue");
    }

    #[test]
    fn test_empty_table_has_no_charts() {
        let table = FinancialTable::from_records(vec![]);
        assert!(build_charts(&table, &[]).is_empty());
    }

    #[test]
    fn test_text_is_always_selectable() {
        let renderer = select_renderer(ChartFormat::Text).unwrap();
        assert_eq!(renderer.name(), "text");
        assert!(renderer.is_available());
    }

    #[cfg(feature = "vega")]
    #[test]
    fn test_vega_selected_when_compiled() {
        let renderer = select_renderer(ChartFormat::Vega).unwrap();
        assert_eq!(renderer.name(), "vega-lite");
    }

    #[cfg(not(feature = "vega"))]
    #[test]
    fn test_vega_falls_back_to_text() {
        let renderer = select_renderer(ChartFormat::Vega).unwrap();
        assert_eq!(renderer.name(), "text");
    }

    #[test]
    fn test_render_all_keeps_order() {
        let table = sample_table(SampleDataset::Tech);
        let charts = build_charts(&table, &sector_insights(&table));
        let rendered = render_all(&TextChartRenderer::default(), &charts);
        assert_eq!(rendered.len(), charts.len());
        assert_eq!(rendered[0].id, "revenue_vs_income");
        assert_eq!(rendered[0].language, "text");
    }
}
