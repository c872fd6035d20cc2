use dioxus::prelude::*;
use tokio::sync::mpsc::UnboundedSender;
use crate::backend::config::build_url;
use crate::backend::nir::{DetailId, DetailKind, NirBoard};
use crate::backend::notify::ToastKind;
use crate::backend::procedures::SearchResults;
use crate::backend::wizard::{Field, Stage, Step, WizardSession, ORIGINS, SPECIALTIES};
use crate::backend::AppCmd;
use crate::components::common::{sleep, submit_form};
use crate::components::{send_cmd, AppState};

fn with_wizard<R>(mut nir: Signal<NirBoard>, record_id: &str, change: impl FnOnce(&mut WizardSession) -> R) -> Option<R> {
    nir.write().wizard_mut(record_id).map(change)
}

fn control(invalid: bool) -> &'static str {
    if invalid {
        "form-control is-invalid"
    } else {
        "form-control"
    }
}

/// Removes the validation banner once its display time is over, unless a newer one replaced it.
fn schedule_banner_dismiss(app_state: AppState, record_id: String) {
    let seq = app_state.nir.peek().wizard(&record_id).and_then(|w| w.banner()).map(|b| b.seq);
    let Some(seq) = seq else {
        return;
    };
    let delay = app_state.config.peek().banner_duration();
    spawn(async move {
        sleep(delay).await;
        with_wizard(app_state.nir, &record_id, |w| w.dismiss_banner(seq));
    });
}

fn submit_admission(mut app_state: AppState, record_id: &str) {
    let config = app_state.config.peek().clone();
    let Some(action) = build_url(&config.endpoints.evolve, record_id) else {
        tracing::error!(%record_id, "evolve endpoint not configured");
        with_wizard(app_state.nir, record_id, |w| w.submit_failed());
        app_state.notify(ToastKind::Danger, "Não foi possível enviar a internação.");
        return;
    };
    let csrf = config.csrf_token.unwrap_or_default();
    let fields = app_state.nir.peek().wizard(record_id).map(|w| w.form_fields(&csrf));
    if let Some(fields) = fields {
        tracing::info!(%record_id, "submitting admission");
        submit_form(action, fields);
    }
}

#[component]
pub fn AdmissionWizard(record_id: String) -> Element {
    let mut app_state = use_context::<AppState>();
    let cmd_tx = use_context::<UnboundedSender<AppCmd>>();
    let rid = use_hook(|| CopyValue::new(record_id.clone()));
    let nir = app_state.nir;

    let Some(wizard) = nir.read().wizard(&record_id).cloned() else {
        return rsx! {};
    };
    let stage = wizard.stage();
    let path = wizard.path();
    let is_first = path.first() == Some(&stage);
    let is_last = wizard.is_last_stage();
    let submitted = wizard.is_submitted();

    let advance = move |finish: bool| {
        let id = rid.cloned();
        let step = with_wizard(nir, &id, |w| if finish { w.finish() } else { w.next() });
        match step {
            Some(Step::Submit) => submit_admission(app_state, &id),
            Some(Step::Moved(next)) => tracing::debug!(record_id = %id, stage = next.title(), "wizard advanced"),
            Some(Step::Blocked) => schedule_banner_dismiss(app_state, id),
            None => {}
        }
    };

    let on_search = move |evt: FormEvent| {
        let id = rid.cloned();
        let Some((generation, query)) = with_wizard(nir, &id, |w| w.search.on_input(&evt.value())).flatten() else {
            return;
        };
        let cmd_tx = cmd_tx.clone();
        spawn(async move {
            let delay = app_state.config.peek().search_debounce();
            sleep(delay).await;
            let current = nir.peek().wizard(&id).is_some_and(|w| w.search.is_current(generation));
            if current {
                send_cmd(&cmd_tx, AppCmd::SearchProcedures { record_id: id, query });
            }
        });
    };

    let on_add = move |_| {
        let id = rid.cloned();
        if let Some(Err(e)) = with_wizard(nir, &id, |w| w.add_selected_procedure()) {
            app_state.notify(ToastKind::Warning, e.to_string());
        }
    };

    rsx! {
        div { class: "wizard",
            div { class: "wizard-header",
                h3 { class: "section-title", "Evoluir para Internação: {wizard.patient_name}" }
            }

            if let Some(banner) = wizard.banner() {
                div { class: "alert alert-danger animate-fade-in",
                    i { class: "bi bi-exclamation-triangle me-2" }
                    "{banner.message}"
                }
            }

            div { class: "wizard-tabs",
                for tab in path.iter().copied() {
                    button {
                        key: "{tab.title()}",
                        r#type: "button",
                        class: if tab == stage { "wizard-tab active" } else { "wizard-tab" },
                        onclick: move |_| {
                            with_wizard(nir, &rid.cloned(), |w| w.select_stage(tab));
                        },
                        i { class: "{tab.icon()} me-2" }
                        "{tab.title()}"
                        if wizard.is_completed(tab) {
                            i { class: "bi bi-check-circle-fill text-success ms-2" }
                        }
                    }
                }
            }

            div { class: "wizard-body",
                match stage {
                    Stage::Basic => rsx! {
                        div { class: "form-grid",
                            label { class: "form-label", "Data de internação *"
                                input {
                                    class: control(wizard.is_invalid(Field::AdmissionDate)),
                                    r#type: "date",
                                    name: "admission_date",
                                    value: "{wizard.admission_date}",
                                    oninput: move |e| { with_wizard(nir, &rid.cloned(), |w| w.admission_date = e.value()); },
                                }
                            }
                            label { class: "form-label", "Tipo de entrada *"
                                select {
                                    class: control(wizard.is_invalid(Field::EntryType)),
                                    name: "entry_type",
                                    value: "{wizard.entry_type()}",
                                    onchange: move |e| { with_wizard(nir, &rid.cloned(), |w| w.set_entry_type(&e.value())); },
                                    option { value: "", "Selecione..." }
                                    option { value: "ELETIVO", "Eletivo" }
                                    option { value: "URGENCIA", "Urgência" }
                                }
                            }
                            label { class: "form-label", "Tipo de internação *"
                                select {
                                    class: control(wizard.is_invalid(Field::AdmissionType)),
                                    name: "admission_type",
                                    value: "{wizard.admission_type()}",
                                    onchange: move |e| { with_wizard(nir, &rid.cloned(), |w| w.set_admission_type(&e.value())); },
                                    option { value: "", "Selecione..." }
                                    option { value: "CLINICO", "Clínico" }
                                    option { value: "CIRURGICO", "Cirúrgico" }
                                }
                            }
                            label { class: "form-label", "Origem *"
                                select {
                                    class: control(wizard.is_invalid(Field::Origin)),
                                    name: "admitted_from_origin",
                                    value: "{wizard.origin}",
                                    onchange: move |e| { with_wizard(nir, &rid.cloned(), |w| w.origin = e.value()); },
                                    for (value, label) in ORIGINS {
                                        option { value: "{value}", "{label}" }
                                    }
                                }
                            }
                            label { class: "form-label", "Data de agendamento *"
                                input {
                                    class: control(wizard.is_invalid(Field::SchedulingDate)),
                                    r#type: "date",
                                    name: "scheduling_date",
                                    value: "{wizard.scheduling_date}",
                                    oninput: move |e| { with_wizard(nir, &rid.cloned(), |w| w.scheduling_date = e.value()); },
                                }
                            }
                        }
                    },
                    Stage::Susfacil => rsx! {
                        div { class: "form-grid",
                            label {
                                class: if wizard.is_invalid(Field::SusfacilAccepted) { "form-check is-invalid" } else { "form-check" },
                                input {
                                    r#type: "checkbox",
                                    name: "susfacil_accepted",
                                    checked: wizard.susfacil_accepted(),
                                    onchange: move |e| { with_wizard(nir, &rid.cloned(), |w| w.set_susfacil_accepted(e.checked())); },
                                }
                                span { class: "ms-2", "Aceite confirmado no SUSFACIL" }
                            }
                            if wizard.susfacil_accepted() {
                                label { class: "form-label", "Data/hora do aceite *"
                                    input {
                                        class: control(wizard.is_invalid(Field::SusfacilDatetime)),
                                        r#type: "datetime-local",
                                        name: "susfacil_accept_datetime",
                                        required: true,
                                        value: "{wizard.susfacil_datetime}",
                                        oninput: move |e| { with_wizard(nir, &rid.cloned(), |w| w.susfacil_datetime = e.value()); },
                                    }
                                }
                            }
                        }
                    },
                    Stage::Procedures => rsx! {
                        div { class: "procedure-search",
                            div { class: "form-grid",
                                label { class: "form-label", "Código ou descrição"
                                    input {
                                        class: control(wizard.is_invalid(Field::Procedures)),
                                        r#type: "text",
                                        autocomplete: "off",
                                        value: "{wizard.search.query()}",
                                        oninput: on_search,
                                    }
                                }
                                label { class: "form-label", "Descrição"
                                    input {
                                        class: "form-control",
                                        r#type: "text",
                                        readonly: wizard.search.selected().is_some(),
                                        value: "{wizard.search.description()}",
                                    }
                                }
                            }
                            match wizard.search.results() {
                                SearchResults::Hidden => rsx! {},
                                SearchResults::NoMatch => rsx! {
                                    div { class: "search-results", p { class: "text-secondary", "Nenhum procedimento encontrado." } }
                                },
                                SearchResults::Failed => rsx! {
                                    div { class: "search-results", p { class: "text-danger", "Erro ao buscar procedimentos." } }
                                },
                                SearchResults::Found(hits) => rsx! {
                                    ul { class: "search-results",
                                        for (i, hit) in hits.iter().enumerate() {
                                            li {
                                                key: "{hit.code}",
                                                class: "search-result",
                                                onclick: move |_| { with_wizard(nir, &rid.cloned(), |w| w.search.select(i)); },
                                                strong { "{hit.code}" }
                                                " - {hit.description}"
                                            }
                                        }
                                    }
                                },
                            }
                            button { r#type: "button", class: "btn btn-outline", onclick: on_add,
                                i { class: "bi bi-plus-lg me-1" }
                                "Adicionar"
                            }
                        }
                        if wizard.procedures().is_empty() {
                            p { class: "text-secondary", "Nenhum procedimento adicionado." }
                        } else {
                            p { class: "text-secondary text-sm", "{wizard.procedures().len()} procedimento(s) adicionado(s)" }
                            table { class: "data-table",
                                thead {
                                    tr {
                                        th { "Código" }
                                        th { "Descrição" }
                                        th {}
                                    }
                                }
                                tbody {
                                    for (i, procedure) in wizard.procedures().items().iter().enumerate() {
                                        tr { key: "{procedure.code}",
                                            td {
                                                "{procedure.code}"
                                                if i == 0 {
                                                    span { class: "badge ms-2", "Principal" }
                                                }
                                            }
                                            td { "{procedure.description}" }
                                            td {
                                                button {
                                                    r#type: "button",
                                                    class: "btn-icon text-danger",
                                                    title: "Remover",
                                                    onclick: move |_| { with_wizard(nir, &rid.cloned(), |w| w.remove_procedure(i)); },
                                                    i { class: "bi bi-trash" }
                                                }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    },
                    Stage::Clinical => rsx! {
                        div { class: "form-grid",
                            label { class: "form-label", "Médico responsável"
                                input {
                                    class: control(wizard.is_invalid(Field::ResponsibleDoctor)),
                                    r#type: "text",
                                    name: "responsible_doctor",
                                    required: wizard.clinical_required(),
                                    value: "{wizard.responsible_doctor}",
                                    oninput: move |e| { with_wizard(nir, &rid.cloned(), |w| w.responsible_doctor = e.value()); },
                                }
                            }
                            label { class: "form-label", "Especialidade"
                                select {
                                    class: control(wizard.is_invalid(Field::Specialty)),
                                    name: "surgical_specialty",
                                    required: wizard.clinical_required(),
                                    value: "{wizard.specialty}",
                                    onchange: move |e| { with_wizard(nir, &rid.cloned(), |w| w.specialty = e.value()); },
                                    option { value: "", "Selecione..." }
                                    for (value, label) in SPECIALTIES {
                                        option { value: "{value}", "{label}" }
                                    }
                                }
                            }
                            label { class: "form-label", "CID principal"
                                select {
                                    class: control(wizard.is_invalid(Field::MainCid)),
                                    name: "main_cid",
                                    required: wizard.clinical_required(),
                                    value: "{wizard.main_cid}",
                                    onchange: move |e| { with_wizard(nir, &rid.cloned(), |w| w.main_cid = e.value()); },
                                    option { value: "", "{wizard.cid_options().placeholder()}" }
                                    for cid in wizard.cid_options().cids().iter() {
                                        option { key: "{cid.code}", value: "{cid.code}", "{cid.code} - {cid.description}" }
                                    }
                                }
                            }
                            label { class: "form-check",
                                input {
                                    r#type: "checkbox",
                                    name: "is_palliative",
                                    checked: wizard.palliative,
                                    onchange: move |e| { with_wizard(nir, &rid.cloned(), |w| w.palliative = e.checked()); },
                                }
                                span { class: "ms-2", "Paciente em cuidados paliativos" }
                            }
                        }
                    },
                }
            }

            div { class: "wizard-footer",
                button {
                    r#type: "button",
                    class: "btn btn-secondary",
                    onclick: move |_| app_state.nir.write().close(&DetailId::new(DetailKind::Observation, &rid.cloned())),
                    "Cancelar"
                }
                if !is_first {
                    button {
                        r#type: "button",
                        class: "btn btn-outline",
                        disabled: submitted,
                        onclick: move |_| { with_wizard(nir, &rid.cloned(), |w| w.previous()); },
                        i { class: "bi bi-arrow-left me-1" }
                        "Anterior"
                    }
                }
                if is_last {
                    button {
                        r#type: "button",
                        class: "btn btn-success",
                        disabled: submitted,
                        onclick: move |_| advance(true),
                        "{wizard.finish_label()}"
                    }
                } else {
                    button {
                        r#type: "button",
                        class: "btn btn-primary",
                        disabled: submitted,
                        onclick: move |_| advance(false),
                        "Próximo"
                        i { class: "bi bi-arrow-right ms-1" }
                    }
                }
            }
        }
    }
}
