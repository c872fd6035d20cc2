use dioxus::prelude::*;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use crate::backend::models::{FieldKind, ProcedureFormData};
use crate::backend::procedures::{CatalogAddError, CatalogPicker, PickerKey};
use crate::backend::AppCmd;
use crate::components::common::{read_island, sleep, submit_form, DataAlert, Loading};
use crate::components::{send_cmd, AppState};

pub const PROCEDURE_FORM_ISLAND: &str = "procedure-form-data";

const INVALID_FLAG: Duration = Duration::from_millis(1500);

/// New-admission form with the procedure catalog autocomplete.
#[component]
pub fn ProcedureFormComponent() -> Element {
    let mut app_state = use_context::<AppState>();
    let mut form = use_signal(|| None::<ProcedureFormData>);
    let mut values = use_signal(BTreeMap::<String, String>::new);
    let mut load_error = use_signal(|| None::<String>);

    use_future(move || async move {
        match read_island::<ProcedureFormData>(PROCEDURE_FORM_ISLAND).await {
            Ok(data) => {
                let can_edit = app_state.config.peek().permissions.edit_procedures;
                values.set(
                    data.fields
                        .iter()
                        .map(|f| (f.name.clone(), f.value.clone().unwrap_or_default()))
                        .collect(),
                );
                app_state.catalog.set(Some(CatalogPicker::new(data.procedures.clone(), can_edit)));
                form.set(Some(data));
            }
            Err(e) => {
                tracing::error!(error = %e, "procedure form data unavailable");
                load_error.set(Some(e.to_string()));
            }
        }
    });

    if let Some(message) = load_error() {
        return rsx! {
            div { class: "page-container py-8", DataAlert { message } }
        };
    }
    let Some(data) = form() else {
        return rsx! { Loading {} };
    };

    let action = data.action.clone();
    let declared = data.fields.clone();
    let on_submit = move |evt: FormEvent| {
        evt.prevent_default();
        let csrf = app_state.config.peek().csrf_token.clone().unwrap_or_default();
        let current = values.peek();
        let mut fields: Vec<(String, String)> = declared
            .iter()
            .filter(|f| f.name != "csrf_token")
            .map(|f| (f.name.clone(), current.get(&f.name).cloned().unwrap_or_default()))
            .collect();
        fields.insert(0, ("csrf_token".to_string(), csrf));
        if let Some(picker) = app_state.catalog.peek().as_ref() {
            for procedure in picker.procedures() {
                fields.push(("procedure_codes[]".into(), procedure.code.clone()));
                fields.push(("procedure_descriptions[]".into(), procedure.description.clone()));
            }
            if let Some((code, description)) = picker.legacy_fields() {
                fields.push(("procedure_code".into(), code.to_string()));
                fields.push(("surgical_description".into(), description.to_string()));
            }
        }
        tracing::info!(fields = fields.len(), "submitting admission form");
        submit_form(action.clone(), fields);
    };

    rsx! {
        div { class: "page-container py-8 animate-fade-in",
            div { class: "page-header",
                h1 { class: "page-title", "Nova Internação" }
            }
            form { class: "panel", onsubmit: on_submit,
                div { class: "form-grid",
                    for field in data.fields.iter().filter(|f| f.kind != FieldKind::Hidden).cloned() {
                        {
                            let value = values.read().get(&field.name).cloned().unwrap_or_default();
                            let name = field.name.clone();
                            rsx! {
                                label { key: "{field.name}", class: "form-label",
                                    "{field.label}"
                                    if field.required { span { class: "text-danger", " *" } }
                                    if field.kind == FieldKind::Select {
                                        select {
                                            class: "form-select",
                                            name: "{field.name}",
                                            required: field.required,
                                            value: "{value}",
                                            onchange: move |e| { values.write().insert(name.clone(), e.value()); },
                                            option { value: "", "Selecione..." }
                                            for opt in field.options.iter() {
                                                option { key: "{opt.value}", value: "{opt.value}", "{opt.label}" }
                                            }
                                        }
                                    } else {
                                        input {
                                            class: "form-control",
                                            r#type: if field.kind == FieldKind::Date { "date" } else { "text" },
                                            name: "{field.name}",
                                            required: field.required,
                                            value: "{value}",
                                            oninput: move |e| { values.write().insert(name.clone(), e.value()); },
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
                CatalogPickerView {}
                div { class: "form-actions",
                    button { r#type: "submit", class: "btn btn-primary", "Salvar Internação" }
                }
            }
        }
    }
}

#[component]
fn CatalogPickerView() -> Element {
    let mut app_state = use_context::<AppState>();
    let cmd_tx = use_context::<UnboundedSender<AppCmd>>();
    let mut generation = use_signal(|| 0u64);

    let Some(picker) = app_state.catalog.read().clone() else {
        return rsx! {};
    };
    let can_edit = picker.can_edit();
    let input_class = if picker.is_invalid() { "form-control is-invalid" } else { "form-control" };

    let on_input = move |evt: FormEvent| {
        if let Some(p) = app_state.catalog.write().as_mut() {
            p.on_input(&evt.value());
        }
        let current = generation() + 1;
        generation.set(current);
        let cmd_tx = cmd_tx.clone();
        spawn(async move {
            let delay = app_state.config.peek().catalog_debounce();
            sleep(delay).await;
            if *generation.peek() != current {
                return;
            }
            let query = app_state.catalog.write().as_mut().and_then(|p| p.begin_fetch());
            if let Some(query) = query {
                tracing::debug!(%query, "catalog lookup");
                send_cmd(&cmd_tx, AppCmd::SearchCatalog { query });
            }
        });
    };

    let on_keydown = move |evt: KeyboardEvent| {
        let key = match evt.key() {
            Key::ArrowDown => PickerKey::Down,
            Key::ArrowUp => PickerKey::Up,
            Key::Enter => PickerKey::Enter,
            Key::Escape => PickerKey::Escape,
            _ => return,
        };
        let consumed = app_state.catalog.write().as_mut().is_some_and(|p| p.on_key(key));
        if consumed {
            evt.prevent_default();
        }
    };

    let on_add = move |_| {
        let result = app_state.catalog.write().as_mut().map(|p| p.add_current());
        if let Some(Err(CatalogAddError::Duplicate)) = result {
            spawn(async move {
                sleep(INVALID_FLAG).await;
                if let Some(p) = app_state.catalog.write().as_mut() {
                    p.clear_invalid();
                }
            });
        }
    };

    rsx! {
        div { class: "catalog-picker",
            h3 { class: "section-title", "Procedimentos" }
            if can_edit {
                div { class: "form-grid",
                    div { class: "autocomplete",
                        label { class: "form-label", "Código"
                            input {
                                class: "{input_class}",
                                r#type: "text",
                                autocomplete: "off",
                                value: "{picker.code()}",
                                oninput: on_input,
                                onkeydown: on_keydown,
                                onblur: move |_| {
                                    if let Some(p) = app_state.catalog.write().as_mut() {
                                        p.close();
                                    }
                                },
                            }
                        }
                        if picker.is_open() {
                            ul { class: "autocomplete-list",
                                for (i, hit) in picker.suggestions().iter().enumerate() {
                                    li {
                                        key: "{hit.code}",
                                        class: if picker.highlight() == Some(i) { "autocomplete-item active" } else { "autocomplete-item" },
                                        onmousedown: move |e| {
                                            e.prevent_default();
                                            if let Some(p) = app_state.catalog.write().as_mut() {
                                                p.select(i);
                                            }
                                        },
                                        strong { "{hit.code}" }
                                        " - {hit.description}"
                                    }
                                }
                            }
                        }
                    }
                    label { class: "form-label", "Descrição"
                        input { class: "form-control", r#type: "text", readonly: true, value: "{picker.description()}" }
                    }
                }
                button { r#type: "button", class: "btn btn-outline", onclick: on_add,
                    i { class: "bi bi-plus-lg me-1" }
                    "Adicionar procedimento"
                }
            }
            if picker.procedures().is_empty() {
                p { class: "text-secondary", "Nenhum procedimento adicionado." }
            } else {
                ul { class: "procedure-list",
                    for (i, procedure) in picker.procedures().iter().enumerate() {
                        li { key: "{procedure.code}",
                            strong { "{procedure.code}" }
                            " - {procedure.description}"
                            if can_edit {
                                button {
                                    r#type: "button",
                                    class: "btn-icon text-danger ms-2",
                                    title: "Remover",
                                    onclick: move |_| {
                                        if let Some(p) = app_state.catalog.write().as_mut() {
                                            p.remove(i);
                                        }
                                    },
                                    i { class: "bi bi-x-lg" }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
