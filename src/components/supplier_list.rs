use dioxus::prelude::*;
use tokio::sync::mpsc::UnboundedSender;
use crate::backend::export::{export_visible, score_text};
use crate::backend::format::{mask_cnpj, mask_phone};
use crate::backend::models::{SelectOption, SupplierListData, SupplierRow};
use crate::backend::nir::{DetailId, DetailKind, DetailToggleGroup};
use crate::backend::notify::ToastKind;
use crate::backend::suppliers::{DeactivateTarget, EditForm, EvaluatorChecklist};
use crate::backend::table::{FilterCriteria, ScoreFilter, SortKey, SupplierTable, TableLine};
use crate::backend::AppCmd;
use crate::components::common::{download_csv, read_island, sleep, submit_form, DataAlert, Loading, Modal};
use crate::components::tracking_modal::TrackingModal;
use crate::components::{send_cmd, AppState, EditModal};

pub const SUPPLIER_LIST_ISLAND: &str = "supplier-list-data";

#[derive(Debug, Clone, PartialEq)]
struct Controls {
    search: String,
    status: String,
    score: String,
    sort: String,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: "all".into(),
            score: ScoreFilter::All.value().into(),
            sort: SortKey::Name.value().into(),
        }
    }
}

impl Controls {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria::from_controls(&self.search, &self.status, &self.score, &self.sort)
    }
}

#[component]
pub fn SupplierListComponent() -> Element {
    let mut app_state = use_context::<AppState>();
    let mut table = use_signal(|| None::<SupplierTable>);
    let mut status_options = use_signal(Vec::<SelectOption>::new);
    let mut load_error = use_signal(|| None::<String>);
    let mut controls = use_signal(Controls::default);
    let mut filter_generation = use_signal(|| 0u64);
    let mut deactivate = use_signal(|| None::<DeactivateTarget>);
    let details = use_signal(DetailToggleGroup::default);

    use_future(move || async move {
        match read_island::<SupplierListData>(SUPPLIER_LIST_ISLAND).await {
            Ok(data) => {
                let total = app_state.config.peek().total_suppliers;
                tracing::info!(rows = data.rows.len(), "supplier list loaded");
                let mut loaded = SupplierTable::new(data.rows, total);
                loaded.apply(&controls.peek().criteria());
                app_state.checklist.set(EvaluatorChecklist::new(data.evaluators));
                status_options.set(data.status_options);
                table.set(Some(loaded));
            }
            Err(e) => {
                tracing::error!(error = %e, "supplier list unavailable");
                load_error.set(Some(e.to_string()));
            }
        }
    });

    // Applies the controls now, or after the debounce window when typing.
    let mut refilter = move |debounced: bool| {
        let generation = filter_generation() + 1;
        filter_generation.set(generation);
        spawn(async move {
            if debounced {
                let delay = app_state.config.peek().filter_debounce();
                sleep(delay).await;
                if *filter_generation.peek() != generation {
                    return;
                }
            }
            let criteria = controls.peek().criteria();
            if let Some(table) = table.write().as_mut() {
                let visible = table.apply(&criteria);
                tracing::debug!(visible, "supplier filter applied");
            }
        });
    };

    let on_export = move |_| {
        let today = chrono::Local::now().date_naive();
        let result = match table.read().as_ref() {
            Some(table) => export_visible(table, today),
            None => return,
        };
        match result {
            Ok(export) => match download_csv(&export) {
                Ok(target) => tracing::info!(%target, "supplier CSV exported"),
                Err(e) => {
                    tracing::error!(error = %e, "supplier CSV export failed");
                    app_state.notify(ToastKind::Danger, "Erro ao exportar fornecedores.");
                }
            },
            Err(warning) => app_state.notify(ToastKind::Warning, warning.to_string()),
        }
    };

    if let Some(message) = load_error() {
        return rsx! {
            div { class: "page-container py-8", DataAlert { message } }
        };
    }

    let Some(current) = table() else {
        return rsx! { Loading {} };
    };
    let current_controls = controls();

    rsx! {
        div { class: "page-container py-8 animate-fade-in",
            div { class: "page-header flex justify-between items-center",
                div {
                    h1 { class: "page-title", "Fornecedores" }
                    p { class: "text-secondary", "{current.results_label()}" }
                }
                button { class: "btn btn-outline", onclick: on_export,
                    i { class: "bi bi-download me-2" }
                    "Exportar CSV"
                }
            }

            div { class: "filter-bar",
                input {
                    class: "form-control",
                    r#type: "search",
                    placeholder: "Buscar por nome, serviço ou contato...",
                    value: "{current_controls.search}",
                    oninput: move |evt| {
                        controls.write().search = evt.value();
                        refilter(true);
                    },
                }
                select {
                    class: "form-select",
                    value: "{current_controls.status}",
                    onchange: move |evt| {
                        controls.write().status = evt.value();
                        refilter(false);
                    },
                    option { value: "all", "Todos os status" }
                    for opt in status_options() {
                        option { key: "{opt.value}", value: "{opt.value}", "{opt.label}" }
                    }
                }
                select {
                    class: "form-select",
                    value: "{current_controls.score}",
                    onchange: move |evt| {
                        controls.write().score = evt.value();
                        refilter(false);
                    },
                    for (filter, label) in ScoreFilter::OPTIONS {
                        option { value: "{filter.value()}", "{label}" }
                    }
                }
                select {
                    class: "form-select",
                    value: "{current_controls.sort}",
                    onchange: move |evt| {
                        controls.write().sort = evt.value();
                        refilter(false);
                    },
                    for (key, label) in SortKey::OPTIONS {
                        option { value: "{key.value()}", "{label}" }
                    }
                }
                button {
                    class: "btn btn-link",
                    onclick: move |_| {
                        controls.set(Controls::default());
                        refilter(false);
                    },
                    "Limpar filtros"
                }
            }

            div { class: "panel",
                if current.visible_count() == 0 {
                    div { class: "empty-state",
                        i { class: "bi bi-search empty-state-icon" }
                        p { class: "empty-state-text", "Nenhum fornecedor encontrado." }
                    }
                } else {
                    table { class: "data-table",
                        thead {
                            tr {
                                th {}
                                th { "Fornecedor" }
                                th { "Serviço" }
                                th { "Contato" }
                                th { "Performance" }
                                th { "Status" }
                                th { "Avaliações" }
                                th { "Ações" }
                            }
                        }
                        tbody {
                            for line in current.lines(&details.read()) {
                                match line {
                                    TableLine::Supplier(row) => rsx! {
                                        SupplierRowView { key: "{row.id}", row: row.clone(), deactivate, details }
                                    },
                                    TableLine::Detail(row) => rsx! {
                                        SupplierDetailRow { key: "{row.id}-detail", row: row.clone() }
                                    },
                                }
                            }
                        }
                    }
                }
            }

            EditSupplierModal {}
            if let Some(target) = deactivate() {
                DeactivateModal { target, deactivate }
            }
            TrackingModal {}
        }
    }
}

#[component]
fn SupplierRowView(
    row: SupplierRow,
    mut deactivate: Signal<Option<DeactivateTarget>>,
    mut details: Signal<DetailToggleGroup>,
) -> Element {
    let mut app_state = use_context::<AppState>();
    let cmd_tx = use_context::<UnboundedSender<AppCmd>>();
    let width = row.score.clamp(0.0, 100.0);
    let legal_name = row.legal_name.clone().unwrap_or_default();
    let detail_id = DetailId::new(DetailKind::Supplier, &row.id);
    let expanded = details.read().is_open(&detail_id);
    let chevron = if expanded { "bi bi-chevron-down" } else { "bi bi-chevron-right" };
    let toggle_label = details.read().label(&detail_id);

    let edit_id = row.id.clone();
    let edit_tx = cmd_tx.clone();
    let on_edit = move |_| {
        let with_evaluators = app_state.config.peek().permissions.manage_evaluators;
        app_state.checklist.write().clear_all();
        app_state.edit_modal.set(EditModal::Loading(edit_id.clone()));
        send_cmd(&edit_tx, AppCmd::LoadSupplierSnapshot { supplier_id: edit_id.clone(), with_evaluators });
    };

    let target_row = row.clone();
    let on_deactivate = move |_| {
        let endpoints = app_state.config.peek().endpoints.clone();
        match DeactivateTarget::new(&target_row.id, &target_row.name, &endpoints) {
            Some(target) => deactivate.set(Some(target)),
            None => tracing::warn!(supplier_id = %target_row.id, "deactivate endpoint not configured"),
        }
    };

    let tracked = row.clone();
    let on_track = move |_| app_state.open_tracking(&tracked, &cmd_tx);

    rsx! {
        tr {
            td {
                button {
                    class: "btn-icon",
                    title: toggle_label,
                    onclick: move |_| {
                        details.write().toggle(detail_id.clone());
                    },
                    i { class: "{chevron}" }
                }
            }
            td {
                div { class: "font-medium", "{row.name}" }
                if !legal_name.is_empty() {
                    div { class: "text-secondary text-sm", "{legal_name}" }
                }
            }
            td { "{row.service}" }
            td { "{row.contact}" }
            td {
                div { class: "score-bar",
                    div { class: "score-bar-fill", style: "width: {width}%" }
                }
                span { class: "score-text", "{score_text(row.score)}" }
            }
            td { span { class: "status-badge status-{row.status}", "{row.status_label}" } }
            td { "{row.evaluations}" }
            td { class: "actions",
                button { class: "btn-icon", title: "Editar", onclick: on_edit, i { class: "bi bi-pencil" } }
                button { class: "btn-icon", title: "Acompanhamento", onclick: on_track, i { class: "bi bi-clock-history" } }
                button { class: "btn-icon text-danger", title: "Desativar", onclick: on_deactivate, i { class: "bi bi-slash-circle" } }
            }
        }
    }
}

#[component]
fn SupplierDetailRow(row: SupplierRow) -> Element {
    let or_dash = |value: &Option<String>| value.clone().filter(|v| !v.trim().is_empty()).unwrap_or_else(|| "-".into());
    let phone = or_dash(&row.phone);
    let email = or_dash(&row.email);
    let cnpj = or_dash(&row.cnpj);
    let evaluators = if row.evaluators.is_empty() { "-".to_string() } else { row.evaluators.join(", ") };

    rsx! {
        tr { class: "detail-row",
            td { colspan: "8",
                div { class: "detail-grid",
                    div { class: "detail-item", i { class: "bi bi-telephone me-2" } "{phone}" }
                    div { class: "detail-item", i { class: "bi bi-envelope me-2" } "{email}" }
                    div { class: "detail-item", i { class: "bi bi-building me-2" } "{cnpj}" }
                    div { class: "detail-item", i { class: "bi bi-people me-2" } "{evaluators}" }
                }
            }
        }
    }
}

#[component]
fn EditSupplierModal() -> Element {
    let mut app_state = use_context::<AppState>();
    let EditModal::Open(form) = app_state.edit_modal.read().clone() else {
        return rsx! {};
    };
    let manage_evaluators = app_state.config.read().permissions.manage_evaluators;

    let mut update = move |change: &dyn Fn(&mut EditForm)| {
        if let EditModal::Open(form) = &mut *app_state.edit_modal.write() {
            change(form);
        }
    };

    let on_submit = move |evt: FormEvent| {
        evt.prevent_default();
        let EditModal::Open(form) = app_state.edit_modal.peek().clone() else {
            return;
        };
        let csrf = app_state.config.peek().csrf_token.clone().unwrap_or_default();
        let mut fields = vec![
            ("csrf_token".to_string(), csrf),
            ("company_name".to_string(), form.company_name.clone()),
            ("trade_name".to_string(), form.trade_name.clone()),
            ("cnpj".to_string(), form.cnpj.clone()),
            ("service_type".to_string(), form.service_type.clone()),
            ("contact_name".to_string(), form.contact_name.clone()),
            ("phone".to_string(), form.phone.clone()),
            ("email".to_string(), form.email.clone()),
            ("notes".to_string(), form.notes.clone()),
        ];
        if manage_evaluators {
            fields.extend(
                app_state.checklist.peek().selected_ids().map(|id| ("evaluator_ids".to_string(), id.clone())),
            );
        }
        tracing::info!(supplier_id = %form.supplier_id, "submitting supplier edit");
        submit_form(form.action, fields);
    };

    rsx! {
        Modal {
            title: "Editar Fornecedor",
            wide: true,
            on_close: move |_| app_state.edit_modal.set(EditModal::Closed),
            form { onsubmit: on_submit,
                div { class: "form-grid",
                    label { class: "form-label", "Razão Social"
                        input { class: "form-control", name: "company_name", value: "{form.company_name}",
                            oninput: move |e| update(&|f| f.company_name = e.value()) }
                    }
                    label { class: "form-label", "Nome Fantasia"
                        input { class: "form-control", name: "trade_name", value: "{form.trade_name}",
                            oninput: move |e| update(&|f| f.trade_name = e.value()) }
                    }
                    label { class: "form-label", "CNPJ"
                        input { class: "form-control", name: "cnpj", maxlength: "18", value: "{form.cnpj}",
                            oninput: move |e| update(&|f| f.cnpj = mask_cnpj(&e.value())) }
                    }
                    label { class: "form-label", "Tipo de Serviço"
                        input { class: "form-control", name: "service_type", value: "{form.service_type}",
                            oninput: move |e| update(&|f| f.service_type = e.value()) }
                    }
                    label { class: "form-label", "Contato"
                        input { class: "form-control", name: "contact_name", value: "{form.contact_name}",
                            oninput: move |e| update(&|f| f.contact_name = e.value()) }
                    }
                    label { class: "form-label", "Telefone"
                        input { class: "form-control", name: "phone", value: "{form.phone}",
                            oninput: move |e| update(&|f| f.phone = mask_phone(&e.value())) }
                    }
                    label { class: "form-label", "Email"
                        input { class: "form-control", r#type: "email", name: "email", value: "{form.email}",
                            oninput: move |e| update(&|f| f.email = e.value()) }
                    }
                    label { class: "form-label form-span", "Observações"
                        textarea { class: "form-control", name: "notes", rows: "3", value: "{form.notes}",
                            oninput: move |e| update(&|f| f.notes = e.value()) }
                    }
                }
                if manage_evaluators {
                    EvaluatorPicker {}
                }
                div { class: "modal-footer",
                    button { r#type: "button", class: "btn btn-secondary",
                        onclick: move |_| app_state.edit_modal.set(EditModal::Closed), "Cancelar" }
                    button { r#type: "submit", class: "btn btn-primary", "Salvar" }
                }
            }
        }
    }
}

#[component]
fn EvaluatorPicker() -> Element {
    let mut app_state = use_context::<AppState>();
    let checklist = app_state.checklist.read().clone();
    let selected = checklist.selected_count();

    rsx! {
        div { class: "evaluator-picker",
            div { class: "flex justify-between items-center",
                h3 { class: "section-title", "Avaliadores responsáveis" }
                span { class: "text-secondary text-sm", "{selected} selecionado(s)" }
            }
            input {
                class: "form-control",
                r#type: "search",
                placeholder: "Buscar avaliador...",
                value: "{checklist.search()}",
                oninput: move |e| app_state.checklist.write().set_search(&e.value()),
            }
            div { class: "flex gap-2",
                button { r#type: "button", class: "btn btn-link btn-sm",
                    onclick: move |_| app_state.checklist.write().select_all_shown(), "Selecionar visíveis" }
                button { r#type: "button", class: "btn btn-link btn-sm",
                    onclick: move |_| app_state.checklist.write().clear_all(), "Limpar" }
            }
            ul { class: "evaluator-list",
                for evaluator in checklist.shown().cloned() {
                    {
                        let checked = checklist.is_checked(&evaluator.id);
                        let id = evaluator.id.clone();
                        rsx! {
                            li { key: "{evaluator.id}",
                                label {
                                    input {
                                        r#type: "checkbox",
                                        checked,
                                        onchange: move |e| app_state.checklist.write().set_checked(&id, e.checked()),
                                    }
                                    span { class: "ms-2", "{evaluator.name}" }
                                    span { class: "text-secondary text-sm ms-2", "{evaluator.job_title}" }
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
fn DeactivateModal(target: DeactivateTarget, mut deactivate: Signal<Option<DeactivateTarget>>) -> Element {
    let app_state = use_context::<AppState>();
    let action = target.action.clone();

    rsx! {
        Modal {
            title: "Desativar Fornecedor",
            on_close: move |_| deactivate.set(None),
            p { "Tem certeza que deseja desativar o fornecedor "
                strong { "{target.supplier_name}" }
                "?"
            }
            div { class: "modal-footer",
                button { class: "btn btn-secondary", onclick: move |_| deactivate.set(None), "Cancelar" }
                button {
                    class: "btn btn-danger",
                    onclick: move |_| {
                        let csrf = app_state.config.peek().csrf_token.clone().unwrap_or_default();
                        submit_form(action.clone(), vec![("csrf_token".to_string(), csrf)]);
                    },
                    "Desativar"
                }
            }
        }
    }
}
