use dioxus::prelude::*;
use crate::backend::dashboard::{tooltip_label, ChartModel, CHART_MAX, CHART_SERIES_LABEL, NO_CHART_DATA};
use crate::backend::models::EvaluationSeries;
use crate::components::common::{read_island, DataAlert, Loading};

pub const EVALUATION_ISLAND: &str = "employee-evaluation-data";

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 280.0;
const MARGIN_LEFT: f64 = 40.0;
const MARGIN_TOP: f64 = 20.0;
const MARGIN_BOTTOM: f64 = 40.0;
const MARGIN_RIGHT: f64 = 20.0;

#[component]
pub fn EmployeeDashboardComponent() -> Element {
    let series = use_resource(|| async move { read_island::<EvaluationSeries>(EVALUATION_ISLAND).await });

    rsx! {
        div { class: "page-container py-8 animate-fade-in",
            div { class: "page-header",
                h1 { class: "page-title", "Minhas Avaliações" }
                p { class: "text-secondary", "Evolução da sua pontuação nas avaliações de desempenho" }
            }
            div { class: "panel",
                match &*series.read() {
                    None => rsx! { Loading {} },
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "evaluation data unavailable");
                        rsx! { DataAlert { message: "{e}" } }
                    }
                    Some(Ok(data)) => match ChartModel::from_series(data.clone()) {
                        Some(chart) => rsx! { EvaluationChart { chart } },
                        None => rsx! {
                            div { class: "empty-state",
                                i { class: "bi bi-graph-up empty-state-icon" }
                                p { class: "empty-state-text", "{NO_CHART_DATA}" }
                            }
                        },
                    },
                }
            }
        }
    }
}

#[component]
fn EvaluationChart(chart: ChartModel) -> Element {
    let plot_width = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let points: Vec<(f64, f64)> = chart
        .points(plot_width, plot_height)
        .into_iter()
        .map(|(x, y)| (x + MARGIN_LEFT, y + MARGIN_TOP))
        .collect();
    let polyline = points.iter().map(|(x, y)| format!("{:.1},{:.1}", x, y)).collect::<Vec<_>>().join(" ");
    let grid: Vec<(f64, String)> = (0..=5)
        .map(|i| {
            let value = CHART_MAX / 5.0 * i as f64;
            let y = MARGIN_TOP + plot_height - value / CHART_MAX * plot_height;
            (y, format!("{:.0}", value))
        })
        .collect();
    let axis_x2 = WIDTH - MARGIN_RIGHT;
    let label_y = HEIGHT - MARGIN_BOTTOM + 18.0;
    let view_box = format!("0 0 {WIDTH} {HEIGHT}");

    rsx! {
        div { class: "chart-container",
            div { class: "chart-legend",
                span { class: "legend-swatch" }
                "{CHART_SERIES_LABEL}"
            }
            svg {
                width: "100%",
                view_box: "{view_box}",
                for (y, label) in grid {
                    line { x1: "{MARGIN_LEFT}", y1: "{y}", x2: "{axis_x2}", y2: "{y}", stroke: "#e5e7eb", stroke_width: "1" }
                    text { x: "{MARGIN_LEFT - 8.0}", y: "{y + 4.0}", fill: "#6b7280", font_size: "11", text_anchor: "end", "{label}" }
                }
                polyline { points: "{polyline}", fill: "none", stroke: "#0d6efd", stroke_width: "2" }
                for (i, (x, y)) in points.iter().copied().enumerate() {
                    g { key: "{i}",
                        circle { cx: "{x}", cy: "{y}", r: "4", fill: "#0d6efd",
                            title { "{chart.labels.get(i).cloned().unwrap_or_default()}: {tooltip_label(chart.scores.get(i).copied().unwrap_or_default())}" }
                        }
                        text { x: "{x}", y: "{label_y}", fill: "#6b7280", font_size: "11", text_anchor: "middle",
                            "{chart.labels.get(i).cloned().unwrap_or_default()}"
                        }
                    }
                }
            }
        }
    }
}
