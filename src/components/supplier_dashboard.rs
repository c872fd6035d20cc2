use dioxus::prelude::*;
use crate::backend::dashboard::{donut_arcs, DonutTooltip};
use crate::backend::export::score_text;
use crate::backend::models::{CategoryDistribution, DonutSegment, SupplierDashboardData, SupplierRow};
use crate::backend::nir::{DetailId, DetailKind, DetailToggleGroup};
use crate::backend::table::{rank_suppliers, RankingSort};
use crate::backend::AppCmd;
use crate::components::common::{read_island, DataAlert, Loading};
use crate::components::tracking_modal::TrackingModal;
use crate::components::AppState;
use tokio::sync::mpsc::UnboundedSender;

pub const DASHBOARD_ISLAND: &str = "supplier-dashboard-data";
pub const CATEGORY_ISLAND: &str = "supplier-category-data";

const DONUT_RADIUS: f64 = 70.0;
const TOOLTIP_OFFSET: f64 = 15.0;

#[component]
pub fn SupplierDashboardComponent() -> Element {
    let data = use_resource(|| async move { read_island::<SupplierDashboardData>(DASHBOARD_ISLAND).await });
    let distribution = use_resource(|| async move {
        read_island::<CategoryDistribution>(CATEGORY_ISLAND).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "category distribution unavailable");
            CategoryDistribution::new()
        })
    });

    rsx! {
        div { class: "page-container py-8 animate-fade-in",
            div { class: "page-header",
                h1 { class: "page-title", "Ranking de Fornecedores" }
                p { class: "text-secondary", "Desempenho consolidado das avaliações" }
            }
            match (&*data.read(), &*distribution.read()) {
                (Some(Ok(data)), Some(distribution)) => rsx! {
                    div { class: "dashboard-grid",
                        RankingTable { rows: data.rows.clone() }
                        CategoryDonut { segments: data.segments.clone(), distribution: distribution.clone() }
                    }
                },
                (Some(Err(e)), _) => rsx! { DataAlert { message: "{e}" } },
                _ => rsx! { Loading {} },
            }
            TrackingModal {}
        }
    }
}

#[component]
fn RankingTable(rows: Vec<SupplierRow>) -> Element {
    let mut app_state = use_context::<AppState>();
    let cmd_tx = use_context::<UnboundedSender<AppCmd>>();
    let mut sort = use_signal(|| RankingSort::Priority);
    let mut toggles = use_signal(DetailToggleGroup::default);

    let mut ranked = rows.clone();
    rank_suppliers(&mut ranked, sort());

    rsx! {
        div { class: "panel",
            div { class: "panel-header",
                h2 { class: "panel-title", "Ranking" }
                select {
                    class: "form-select form-select-sm",
                    value: "{sort().value()}",
                    onchange: move |evt| {
                        let next = RankingSort::from_value(&evt.value());
                        tracing::debug!(sort = next.value(), "ranking sort changed");
                        sort.set(next);
                    },
                    option { value: "desc", "Prioridade" }
                    option { value: "asc", "Menor pontuação" }
                    option { value: "name", "Nome" }
                }
            }
            table { class: "data-table",
                thead {
                    tr {
                        th { "#" }
                        th { "Fornecedor" }
                        th { "Performance" }
                        th { "Avaliações" }
                        th {}
                    }
                }
                tbody {
                    for (position, row) in ranked.into_iter().enumerate() {
                        {
                            let id = DetailId::new(DetailKind::Supplier, &row.id);
                            let open = toggles.read().is_open(&id);
                            let label = toggles.read().label(&id);
                            let width = row.score.clamp(0.0, 100.0);
                            let close_id = id.clone();
                            let tracked = row.clone();
                            let cmd_tx = cmd_tx.clone();
                            rsx! {
                                tr { key: "{row.id}",
                                    td { span { class: "rank-badge", "#{position + 1}" } }
                                    td { "{row.name}" }
                                    td {
                                        div { class: "score-bar",
                                            div { class: "score-bar-fill", style: "width: {width}%" }
                                        }
                                        span { class: "score-text", "{score_text(row.score)}" }
                                    }
                                    td { "{row.evaluations}" }
                                    td {
                                        button {
                                            class: "btn btn-link btn-sm",
                                            onclick: move |_| {
                                                toggles.write().toggle(id.clone());
                                            },
                                            "{label}"
                                        }
                                    }
                                }
                                if open {
                                    tr { key: "{row.id}-detail", class: "detail-row",
                                        td { colspan: "5",
                                            dl { class: "detail-list",
                                                dt { "Serviço" }
                                                dd { "{row.service}" }
                                                dt { "Contato" }
                                                dd { "{row.contact}" }
                                                dt { "Status" }
                                                dd { "{row.status_label}" }
                                                if let Some(phone) = row.phone.as_ref() {
                                                    dt { "Telefone" }
                                                    dd { "{phone}" }
                                                }
                                                if let Some(email) = row.email.as_ref() {
                                                    dt { "Email" }
                                                    dd { "{email}" }
                                                }
                                            }
                                            div { class: "detail-actions",
                                                button {
                                                    class: "btn btn-outline btn-sm",
                                                    onclick: move |_| app_state.open_tracking(&tracked, &cmd_tx),
                                                    i { class: "bi bi-clock-history me-1" }
                                                    "Acompanhamento"
                                                }
                                                button {
                                                    class: "btn btn-secondary btn-sm",
                                                    onclick: move |_| {
                                                        toggles.write().close(&close_id);
                                                    },
                                                    "Fechar"
                                                }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn CategoryDonut(segments: Vec<DonutSegment>, distribution: CategoryDistribution) -> Element {
    let mut hovered = use_signal(|| None::<(DonutTooltip, f64, f64)>);
    let circumference = 2.0 * std::f64::consts::PI * DONUT_RADIUS;
    let arcs = donut_arcs(&segments, circumference);

    rsx! {
        div { class: "panel",
            div { class: "panel-header",
                h2 { class: "panel-title", "Fornecedores por categoria" }
            }
            if arcs.is_empty() {
                p { class: "empty-state-text", "Nenhum fornecedor avaliado." }
            } else {
                svg {
                    class: "donut",
                    view_box: "0 0 200 200",
                    onmouseleave: move |_| hovered.set(None),
                    for arc in arcs {
                        {
                            let tooltip = DonutTooltip::for_segment(&distribution, &arc.segment);
                            let gap = circumference - arc.length;
                            rsx! {
                                circle {
                                    key: "{arc.segment.category}",
                                    cx: "100",
                                    cy: "100",
                                    r: "{DONUT_RADIUS}",
                                    fill: "none",
                                    stroke: "{arc.segment.color}",
                                    stroke_width: "28",
                                    stroke_dasharray: "{arc.length} {gap}",
                                    stroke_dashoffset: "{arc.offset}",
                                    transform: "rotate(-90 100 100)",
                                    onmousemove: move |evt| {
                                        let point = evt.client_coordinates();
                                        hovered.set(tooltip.clone().map(|t| (t, point.x, point.y)));
                                    },
                                }
                            }
                        }
                    }
                }
                ul { class: "donut-legend",
                    for segment in segments.iter().filter(|s| s.count > 0) {
                        li { key: "{segment.category}",
                            span { class: "legend-swatch", style: "background: {segment.color}" }
                            "{segment.label} ({segment.count})"
                        }
                    }
                }
            }
            if let Some((tooltip, x, y)) = hovered() {
                div {
                    class: "donut-tooltip",
                    style: "left: {x + TOOLTIP_OFFSET}px; top: {y + TOOLTIP_OFFSET}px",
                    div { class: "donut-tooltip-title", style: "color: {tooltip.color}", "{tooltip.title}" }
                    ul {
                        for entry in tooltip.entries {
                            li {
                                "{entry.name}"
                                if let Some(score) = entry.score {
                                    span { class: "donut-tooltip-score", " {score}" }
                                }
                            }
                        }
                    }
                    if let Some(overflow) = tooltip.overflow {
                        div { class: "donut-tooltip-more", "{overflow}" }
                    }
                }
            }
        }
    }
}
