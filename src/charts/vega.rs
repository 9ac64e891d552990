//! Vega-Lite specification output.

use super::{Chart, ChartKind, ChartRenderer};
use crate::error::{ReportError, Result};
use serde_json::{json, Value};

const SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

/// Emits one self-contained Vega-Lite v5 spec per chart, with the data
/// inlined.
#[derive(Debug, Clone, Copy, Default)]
pub struct VegaLiteRenderer;

impl VegaLiteRenderer {
    fn spec(&self, chart: &Chart) -> Result<Value> {
        let first = chart.series.first().ok_or_else(|| {
            ReportError::data_format(format!("chart '{}' has no series", chart.id))
        })?;

        let spec = match chart.kind {
            ChartKind::Bar => json!({
                "data": { "values": label_rows(chart, &first.values) },
                "mark": "bar",
                "encoding": {
                    "x": { "field": "label", "type": "nominal", "sort": null, "title": null },
                    "y": { "field": "value", "type": "quantitative", "title": first.name },
                    "color": {
                        "field": "value",
                        "type": "quantitative",
                        "scale": { "scheme": "redyellowgreen" },
                        "legend": null
                    }
                }
            }),
            ChartKind::Pie => json!({
                "data": { "values": label_rows(chart, &first.values) },
                "mark": "arc",
                "encoding": {
                    "theta": { "field": "value", "type": "quantitative" },
                    "color": { "field": "label", "type": "nominal", "title": null }
                }
            }),
            ChartKind::GroupedBar => {
                let rows: Vec<Value> = chart
                    .labels
                    .iter()
                    .enumerate()
                    .flat_map(|(i, label)| {
                        chart.series.iter().map(move |s| {
                            json!({
                                "label": label,
                                "series": s.name,
                                "value": s.values.get(i).copied().unwrap_or(0.0),
                            })
                        })
                    })
                    .collect();
                json!({
                    "data": { "values": rows },
                    "mark": "bar",
                    "encoding": {
                        "x": {
                            "field": "label",
                            "type": "nominal",
                            "sort": null,
                            "title": null,
                            "axis": { "labelAngle": -45 }
                        },
                        "xOffset": { "field": "series" },
                        "y": { "field": "value", "type": "quantitative", "title": null },
                        "color": { "field": "series", "type": "nominal", "title": null }
                    }
                })
            }
            ChartKind::Scatter => {
                let [x, y] = chart.series.as_slice() else {
                    return Err(ReportError::data_format(format!(
                        "scatter chart '{}' needs exactly two series",
                        chart.id
                    )));
                };
                let rows: Vec<Value> = chart
                    .labels
                    .iter()
                    .enumerate()
                    .map(|(i, label)| {
                        json!({
                            "label": label,
                            "x": x.values.get(i).copied().unwrap_or(0.0),
                            "y": y.values.get(i).copied().unwrap_or(0.0),
                            "group": chart.groups.as_ref().and_then(|g| g.get(i)),
                        })
                    })
                    .collect();
                let mut encoding = json!({
                    "x": { "field": "x", "type": "quantitative", "title": x.name },
                    "y": { "field": "y", "type": "quantitative", "title": y.name },
                    "tooltip": [{ "field": "label", "type": "nominal", "title": "Company" }]
                });
                if chart.groups.is_some() {
                    encoding["color"] = json!({
                        "field": "group",
                        "type": "nominal",
                        "title": null
                    });
                }
                json!({
                    "data": { "values": rows },
                    "mark": { "type": "point", "filled": true },
                    "encoding": encoding
                })
            }
        };

        let mut spec = spec;
        spec["$schema"] = json!(SCHEMA);
        spec["title"] = json!(chart.title);
        Ok(spec)
    }
}

impl ChartRenderer for VegaLiteRenderer {
    fn name(&self) -> &'static str {
        "vega-lite"
    }

    fn language(&self) -> &'static str {
        "vega-lite"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn render(&self, chart: &Chart) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.spec(chart)?)?)
    }
}

fn label_rows(chart: &Chart, values: &[f64]) -> Vec<Value> {
    chart
        .labels
        .iter()
        .zip(values)
        .map(|(label, value)| json!({ "label": label, "value": value }))
        .collect()
}
