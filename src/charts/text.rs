//! Plain-text chart rendering.

use super::{Chart, ChartKind, ChartRenderer};
use crate::error::{ReportError, Result};

const POSITIVE: char = '█';
const NEGATIVE: char = '░';

/// Horizontal bar charts drawn with block characters.
#[derive(Debug, Clone)]
pub struct TextChartRenderer {
    width: usize,
}

impl Default for TextChartRenderer {
    fn default() -> Self {
        Self { width: 40 }
    }
}

impl TextChartRenderer {
    fn bar(&self, value: f64, max_abs: f64) -> String {
        if max_abs <= 0.0 || !value.is_finite() {
            return String::new();
        }
        let len = ((value.abs() / max_abs) * self.width as f64).round() as usize;
        let ch = if value < 0.0 { NEGATIVE } else { POSITIVE };
        std::iter::repeat(ch).take(len).collect()
    }

    fn render_bars(&self, chart: &Chart, out: &mut String) {
        let Some(series) = chart.series.first() else {
            return;
        };
        let label_width = label_width(&chart.labels);
        let max_abs = max_abs(&series.values);
        let total: f64 = series.values.iter().filter(|v| **v > 0.0).sum();

        for (label, value) in chart.labels.iter().zip(&series.values) {
            let share = match chart.kind {
                ChartKind::Pie if total > 0.0 => format!(" ({:.1}%)", value / total * 100.0),
                _ => String::new(),
            };
            out.push_str(&format!(
                "{:<w$} | {} {}{}\n",
                label,
                self.bar(*value, max_abs),
                chart.unit.format(*value),
                share,
                w = label_width
            ));
        }
    }

    fn render_grouped(&self, chart: &Chart, out: &mut String) {
        let series_width = label_width(
            &chart
                .series
                .iter()
                .map(|s| s.name.clone())
                .collect::<Vec<_>>(),
        );
        let max_abs = chart
            .series
            .iter()
            .map(|s| max_abs(&s.values))
            .fold(0.0, f64::max);

        for (i, label) in chart.labels.iter().enumerate() {
            out.push_str(label);
            out.push('\n');
            for series in &chart.series {
                let value = series.values.get(i).copied().unwrap_or(0.0);
                out.push_str(&format!(
                    "  {:<w$} | {} {}\n",
                    series.name,
                    self.bar(value, max_abs),
                    chart.unit.format(value),
                    w = series_width
                ));
            }
        }
    }

    fn render_scatter(&self, chart: &Chart, out: &mut String) -> Result<()> {
        let [x, y] = chart.series.as_slice() else {
            return Err(ReportError::data_format(format!(
                "scatter chart '{}' needs exactly two series",
                chart.id
            )));
        };
        let label_width = label_width(&chart.labels);
        out.push_str(&format!(
            "{:<w$} | {} | {}\n",
            "",
            x.name,
            y.name,
            w = label_width
        ));
        for (i, label) in chart.labels.iter().enumerate() {
            let group = chart
                .groups
                .as_ref()
                .and_then(|g| g.get(i))
                .filter(|g| !g.is_empty())
                .map(|g| format!(" [{}]", g))
                .unwrap_or_default();
            out.push_str(&format!(
                "{:<w$} | {} | {}{}\n",
                label,
                chart.unit.format(x.values.get(i).copied().unwrap_or(0.0)),
                chart.unit.format(y.values.get(i).copied().unwrap_or(0.0)),
                group,
                w = label_width
            ));
        }
        Ok(())
    }
}

impl ChartRenderer for TextChartRenderer {
    fn name(&self) -> &'static str {
        "text"
    }

    fn language(&self) -> &'static str {
        "text"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn render(&self, chart: &Chart) -> Result<String> {
        let mut out = String::new();
        out.push_str(&chart.title);
        out.push('\n');
        out.push_str(&"=".repeat(chart.title.chars().count()));
        out.push('\n');

        match chart.kind {
            ChartKind::Bar | ChartKind::Pie => self.render_bars(chart, &mut out),
            ChartKind::GroupedBar => self.render_grouped(chart, &mut out),
            ChartKind::Scatter => self.render_scatter(chart, &mut out)?,
        }
        Ok(out)
    }
}

fn label_width(labels: &[String]) -> usize {
    labels.iter().map(|l| l.chars().count()).max().unwrap_or(0)
}

fn max_abs(values: &[f64]) -> f64 {
    values
        .iter()
        .filter(|v| v.is_finite())
        .map(|v| v.abs())
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::{Series, ValueUnit};

    fn bar_chart(kind: ChartKind, values: Vec<f64>) -> Chart {
        Chart {
            id: "test".to_string(),
            title: "Test".to_string(),
            kind,
            unit: ValueUnit::Money,
            labels: (0..values.len()).map(|i| format!("C{}", i)).collect(),
            series: vec![Series {
                name: "Revenue".to_string(),
                values,
            }],
            groups: None,
        }
    }

    #[test]
    fn test_bars_scale_to_width() {
        let renderer = TextChartRenderer { width: 10 };
        let out = renderer
            .render(&bar_chart(ChartKind::Bar, vec![100.0, 50.0, -100.0]))
            .unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Test");
        assert_eq!(lines[1], "====");
        assert_eq!(lines[2], "C0 | ██████████ $100");
        assert_eq!(lines[3], "C1 | █████ $50");
        assert_eq!(lines[4], "C2 | ░░░░░░░░░░ -$100");
    }

    #[test]
    fn test_pie_shows_share() {
        let renderer = TextChartRenderer { width: 4 };
        let out = renderer
            .render(&bar_chart(ChartKind::Pie, vec![75.0, 25.0]))
            .unwrap();
        assert!(out.contains("C0 | ████ $75 (75.0%)"));
        assert!(out.contains("C1 | █ $25 (25.0%)"));
    }

    #[test]
    fn test_all_zero_values_have_no_bars() {
        let out = TextChartRenderer::default()
            .render(&bar_chart(ChartKind::Bar, vec![0.0, 0.0]))
            .unwrap();
        assert!(out.contains("C0 |  $0"));
    }

    #[test]
    fn test_scatter_needs_two_series() {
        let err = TextChartRenderer::default()
            .render(&bar_chart(ChartKind::Scatter, vec![1.0]))
            .unwrap_err();
        assert!(matches!(err, ReportError::DataFormat(_)));
    }

    #[test]
    fn test_grouped_lists_every_series() {
        let chart = Chart {
            id: "g".to_string(),
            title: "Grouped".to_string(),
            kind: ChartKind::GroupedBar,
            unit: ValueUnit::Money,
            labels: vec!["Acme".to_string()],
            series: vec![
                Series {
                    name: "Revenue".to_string(),
                    values: vec![200.0],
                },
                Series {
                    name: "Net Income".to_string(),
                    values: vec![-20.0],
                },
            ],
            groups: None,
        };
        let out = TextChartRenderer { width: 10 }.render(&chart).unwrap();
        assert!(out.contains("Acme\n"));
        assert!(out.contains("  Revenue    | ██████████ $200"));
        assert!(out.contains("  Net Income | ░ -$20"));
    }
}
