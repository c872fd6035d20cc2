use dioxus::prelude::*;
use chrono::{DateTime, Utc};
use std::time::Duration;
use crate::backend::format::format_date;
use crate::backend::models::{DischargeRecord, FieldKind, FieldSpec, NirBoardData, ObservationRecord};
use crate::backend::nir::{CancelObservationForm, DetailId, DetailKind, NirBoard, SAVING_LABEL};
use crate::components::admission_wizard::AdmissionWizard;
use crate::components::common::{focus_field, read_island, sleep, submit_form, DataAlert, Modal};
use crate::components::AppState;

pub const NIR_BOARD_ISLAND: &str = "nir-board-data";

const TICK: Duration = Duration::from_secs(1);

#[component]
pub fn NirBoardComponent() -> Element {
    let mut app_state = use_context::<AppState>();
    let mut load_error = use_signal(|| None::<String>);
    let mut now = use_signal(Utc::now);
    let cancel = use_signal(|| None::<CancelObservationForm>);

    use_future(move || async move {
        match read_island::<NirBoardData>(NIR_BOARD_ISLAND).await {
            Ok(data) => {
                tracing::info!(
                    observations = data.observations.len(),
                    discharges = data.discharges.len(),
                    "NIR board loaded"
                );
                app_state.nir.set(NirBoard::new(data));
            }
            Err(e) => {
                tracing::error!(error = %e, "NIR board data unavailable");
                load_error.set(Some(e.to_string()));
            }
        }
    });

    // Elapsed timers tick for the lifetime of the page.
    use_future(move || async move {
        loop {
            sleep(TICK).await;
            now.set(Utc::now());
        }
    });

    if let Some(message) = load_error() {
        return rsx! {
            div { class: "page-container py-8", DataAlert { message } }
        };
    }

    let board = app_state.nir.read();
    let observations = board.observations.clone();
    let discharges = board.discharges.clone();
    drop(board);

    rsx! {
        div { class: "page-container py-8 animate-fade-in",
            div { class: "page-header",
                h1 { class: "page-title", "Núcleo Interno de Regulação" }
            }

            div { class: "panel",
                div { class: "panel-header",
                    h2 { class: "panel-title", "Pacientes em observação" }
                }
                if observations.is_empty() {
                    p { class: "empty-state-text", "Nenhum paciente em observação." }
                } else {
                    table { class: "data-table",
                        thead {
                            tr {
                                th { "Paciente" }
                                th { "Prontuário" }
                                th { "Setor" }
                                th { "Tempo em observação" }
                                th {}
                            }
                        }
                        tbody {
                            for record in observations {
                                ObservationRow { key: "{record.id}", record: record.clone(), now: now(), cancel }
                            }
                        }
                    }
                }
            }

            div { class: "panel mt-6",
                div { class: "panel-header",
                    h2 { class: "panel-title", "Altas pendentes" }
                }
                if discharges.is_empty() {
                    p { class: "empty-state-text", "Nenhuma alta pendente." }
                } else {
                    table { class: "data-table",
                        thead {
                            tr {
                                th { "Paciente" }
                                th { "Internação" }
                                th {}
                            }
                        }
                        tbody {
                            for record in discharges {
                                DischargeRow { key: "{record.id}", record: record.clone() }
                            }
                        }
                    }
                }
            }

            if let Some(form) = cancel() {
                CancelObservationModal { form, cancel }
            }
        }
    }
}

#[component]
fn ObservationRow(record: ObservationRecord, now: DateTime<Utc>, mut cancel: Signal<Option<CancelObservationForm>>) -> Element {
    let mut app_state = use_context::<AppState>();
    let id = DetailId::new(DetailKind::Observation, &record.id);
    let board = app_state.nir.read();
    let open = board.toggles.is_open(&id);
    let label = board.toggles.label(&id);
    let elapsed = board.elapsed(&record.id, now).unwrap_or_else(|| "-".to_string());
    let has_wizard = board.wizard(&record.id).is_some();
    drop(board);

    let record_id = record.id.clone();
    let toggle_id = id.clone();
    let cancel_record = record.clone();

    rsx! {
        tr {
            td { "{record.patient_name}" }
            td { "{record.medical_record.clone().unwrap_or_default()}" }
            td { "{record.sector.clone().unwrap_or_default()}" }
            td { span { class: "elapsed-timer", "{elapsed}" } }
            td {
                button {
                    class: "btn btn-link btn-sm",
                    onclick: move |_| app_state.nir.write().toggle(toggle_id.clone()),
                    "{label}"
                }
            }
        }
        if open {
            tr { class: "detail-row",
                td { colspan: "5",
                    if has_wizard {
                        AdmissionWizard { record_id: record.id.clone() }
                    } else {
                        div { class: "flex gap-2",
                            button {
                                class: "btn btn-primary",
                                onclick: move |_| {
                                    let today = chrono::Local::now().date_naive();
                                    tracing::info!(record_id = %record_id, "starting admission wizard");
                                    app_state.nir.write().start_evolve(&record_id, today);
                                },
                                i { class: "bi bi-arrow-up-right-circle me-2" }
                                "Evoluir para Internação"
                            }
                            button {
                                class: "btn btn-outline-danger",
                                onclick: move |_| {
                                    let endpoints = app_state.config.peek().endpoints.clone();
                                    match CancelObservationForm::new(&cancel_record, &endpoints) {
                                        Some(form) => cancel.set(Some(form)),
                                        None => tracing::warn!(record_id = %cancel_record.id, "cancel endpoint not configured"),
                                    }
                                },
                                "Cancelar Observação"
                            }
                            button {
                                class: "btn btn-secondary",
                                onclick: move |_| app_state.nir.write().close(&id),
                                "Fechar"
                            }
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn DischargeRow(record: DischargeRecord) -> Element {
    let mut app_state = use_context::<AppState>();
    let id = DetailId::new(DetailKind::Alta, &record.id);
    let open = app_state.nir.read().toggles.is_open(&id);
    let label = app_state.nir.read().toggles.label(&id);
    let admitted = record.admission_date.as_deref().map(format_date).unwrap_or_default();
    let toggle_id = id.clone();

    rsx! {
        tr {
            td { "{record.patient_name}" }
            td { "{admitted}" }
            td {
                button {
                    class: "btn btn-link btn-sm",
                    onclick: move |_| app_state.nir.write().toggle(toggle_id.clone()),
                    "{label}"
                }
            }
        }
        if open {
            tr { class: "detail-row",
                td { colspan: "3",
                    AltaPanel { record_id: record.id.clone(), detail: id.clone() }
                }
            }
        }
    }
}

#[component]
fn AltaPanel(record_id: String, detail: DetailId) -> Element {
    let mut app_state = use_context::<AppState>();
    let Some(form) = app_state.nir.read().alta_form(&record_id).cloned() else {
        return rsx! {};
    };
    let saving = form.is_saving();

    let submit_id = record_id.clone();
    let on_submit = move |evt: FormEvent| {
        evt.prevent_default();
        let result = app_state.nir.write().alta_form_mut(&submit_id).map(|f| (f.action.clone(), f.submit()));
        match result {
            Some((action, Ok(fields))) => {
                tracing::info!(record_id = %submit_id, "submitting discharge");
                submit_form(action, fields);
            }
            Some((_, Err(first_invalid))) => focus_field(&first_invalid),
            None => {}
        }
    };

    rsx! {
        form { class: "alta-form", onsubmit: on_submit,
            div { class: "form-grid",
                for field in form.fields().iter().filter(|f| f.kind != FieldKind::Hidden).cloned() {
                    AltaField {
                        key: "{field.name}",
                        record_id: record_id.clone(),
                        value: form.value(&field.name).to_string(),
                        invalid: form.is_invalid(&field.name),
                        field,
                    }
                }
            }
            div { class: "form-actions",
                button {
                    r#type: "button",
                    class: "btn btn-secondary",
                    onclick: move |_| app_state.nir.write().close(&detail),
                    "Cancelar"
                }
                button { r#type: "submit", class: "btn btn-primary", disabled: saving,
                    if saving { "{SAVING_LABEL}" } else { "Registrar Alta" }
                }
            }
        }
    }
}

#[component]
fn AltaField(record_id: String, field: FieldSpec, value: String, invalid: bool) -> Element {
    let mut app_state = use_context::<AppState>();
    let class = if invalid { "form-control is-invalid" } else { "form-control" };
    let name = field.name.clone();
    let mut set = move |value: String| {
        if let Some(form) = app_state.nir.write().alta_form_mut(&record_id) {
            form.set_value(&name, &value);
        }
    };

    rsx! {
        label { class: "form-label",
            "{field.label}"
            if field.required { span { class: "text-danger", " *" } }
            match field.kind {
                FieldKind::Select => rsx! {
                    select {
                        class: "{class}",
                        name: "{field.name}",
                        value: "{value}",
                        onchange: move |e| set(e.value()),
                        option { value: "", "Selecione..." }
                        for opt in field.options.iter() {
                            option { key: "{opt.value}", value: "{opt.value}", "{opt.label}" }
                        }
                    }
                },
                FieldKind::Date => rsx! {
                    input { class: "{class}", r#type: "date", name: "{field.name}", value: "{value}",
                        oninput: move |e| set(e.value()) }
                },
                _ => rsx! {
                    input { class: "{class}", r#type: "text", name: "{field.name}", value: "{value}",
                        oninput: move |e| set(e.value()) }
                },
            }
        }
    }
}

#[component]
fn CancelObservationModal(form: CancelObservationForm, mut cancel: Signal<Option<CancelObservationForm>>) -> Element {
    let app_state = use_context::<AppState>();
    let reason_class = if form.error.is_some() { "form-control is-invalid" } else { "form-control" };

    let on_confirm = move |_| {
        let csrf = app_state.config.peek().csrf_token.clone().unwrap_or_default();
        let outcome = cancel.write().as_mut().map(|f| (f.action.clone(), f.record_id.clone(), f.submit(&csrf)));
        if let Some((action, record_id, Ok(fields))) = outcome {
            tracing::info!(%record_id, "cancelling observation");
            submit_form(action, fields);
        }
    };

    rsx! {
        Modal {
            title: "Cancelar Observação",
            on_close: move |_| cancel.set(None),
            p { "Paciente: " strong { "{form.patient_name}" } }
            label { class: "form-label", "Motivo do cancelamento"
                textarea {
                    class: "{reason_class}",
                    rows: "3",
                    value: "{form.reason}",
                    oninput: move |e| {
                        if let Some(f) = cancel.write().as_mut() {
                            f.reason = e.value();
                        }
                    },
                }
            }
            if let Some(error) = form.error {
                div { class: "invalid-feedback", "{error}" }
            }
            div { class: "modal-footer",
                button { class: "btn btn-secondary", onclick: move |_| cancel.set(None), "Voltar" }
                button { class: "btn btn-danger", onclick: on_confirm, "Confirmar Cancelamento" }
            }
        }
    }
}
