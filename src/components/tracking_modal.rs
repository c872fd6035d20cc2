use dioxus::prelude::*;
use tokio::sync::mpsc::UnboundedSender;
use crate::backend::format::format_date_time;
use crate::backend::models::{IssueAction, UploadFile};
use crate::backend::notify::ToastKind;
use crate::backend::tracking::{AttachmentView, HistoryState, ACTION_TYPES};
use crate::backend::AppCmd;
use crate::components::common::{Loading, Modal};
use crate::components::{send_cmd, AppState};

/// Supplier issue tracking: action form on top, timeline below.
#[component]
pub fn TrackingModal() -> Element {
    let mut app_state = use_context::<AppState>();
    let cmd_tx = use_context::<UnboundedSender<AppCmd>>();
    let mut lightbox = use_signal(|| None::<(String, String)>);

    let panel = app_state.tracking.read().clone();
    let Some(target) = panel.target().cloned() else {
        return rsx! {};
    };
    let draft = panel.draft;
    let history = panel.history;
    let info = target.info();

    let supplier_id = target.id.clone();
    let on_submit = move |evt: FormEvent| {
        evt.prevent_default();
        let csrf = app_state.config.peek().csrf_token.clone();
        let payload = app_state.tracking.write().draft.begin_submit(csrf);
        let Some(payload) = payload else {
            if !app_state.tracking.peek().draft.is_saving() {
                app_state.notify(ToastKind::Warning, "Descreva a ação realizada.");
            }
            return;
        };
        tracing::info!(%supplier_id, attachments = payload.attachments.len(), "registering issue action");
        send_cmd(&cmd_tx, AppCmd::SubmitIssueAction { supplier_id: supplier_id.clone(), payload });
    };

    let on_files = move |evt: FormEvent| async move {
        let mut picked = Vec::new();
        for file in evt.files() {
            match file.read_bytes().await {
                Ok(bytes) => picked.push(UploadFile {
                    name: file.name(),
                    mime_type: file.content_type().unwrap_or_else(|| "application/octet-stream".to_string()),
                    bytes: bytes.to_vec(),
                }),
                Err(e) => tracing::warn!(file = %file.name(), error = ?e, "could not read attachment"),
            }
        }
        app_state.tracking.write().draft.files = picked;
    };

    rsx! {
        Modal {
            title: target.title(),
            wide: true,
            on_close: move |_| app_state.tracking.write().close(),
            if !info.is_empty() {
                p { class: "text-secondary", "{info}" }
            }
            form { class: "tracking-form", onsubmit: on_submit,
                label { class: "form-label", "Tipo de ação"
                    select {
                        class: "form-select",
                        name: "action_type",
                        value: "{draft.action_type}",
                        onchange: move |e| app_state.tracking.write().draft.action_type = e.value(),
                        for (value, label) in ACTION_TYPES {
                            option { value: "{value}", "{label}" }
                        }
                    }
                }
                label { class: "form-label", "Descrição"
                    textarea {
                        class: "form-control",
                        name: "description",
                        rows: "3",
                        required: true,
                        value: "{draft.description}",
                        oninput: move |e| app_state.tracking.write().draft.description = e.value(),
                    }
                }
                label { class: "form-label", "Anexos"
                    input { class: "form-control", r#type: "file", multiple: true, onchange: on_files }
                }
                if let Some((header, lines)) = draft.preview() {
                    div { class: "upload-preview",
                        strong { "{header}" }
                        ul {
                            for line in lines {
                                li { "{line}" }
                            }
                        }
                    }
                }
                div { class: "modal-footer",
                    button {
                        r#type: "submit",
                        class: "btn btn-primary",
                        disabled: draft.is_saving(),
                        "{draft.submit_label()}"
                    }
                }
            }

            h3 { class: "section-title", "Histórico" }
            match history {
                HistoryState::Loading => rsx! { Loading {} },
                HistoryState::Empty => rsx! {
                    div { class: "empty-state",
                        i { class: "bi bi-inbox empty-state-icon" }
                        p { class: "empty-state-text", "Nenhuma ação registrada ainda." }
                    }
                },
                HistoryState::Failed(message) => rsx! {
                    div { class: "alert alert-danger", "{message}" }
                },
                HistoryState::Loaded(items) => rsx! {
                    ul { class: "timeline",
                        for (i, item) in items.into_iter().enumerate() {
                            TimelineEntry { key: "{i}", item, lightbox }
                        }
                    }
                },
            }
        }

        if let Some((url, filename)) = lightbox() {
            div { class: "lightbox", onclick: move |_| lightbox.set(None),
                div { class: "lightbox-content", onclick: move |e| e.stop_propagation(),
                    img { src: "{url}", alt: "{filename}" }
                    div { class: "lightbox-footer",
                        span { "{filename}" }
                        a { class: "btn btn-outline btn-sm", href: "{url}", download: "{filename}",
                            i { class: "bi bi-download me-1" }
                            "Baixar"
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn TimelineEntry(item: IssueAction, mut lightbox: Signal<Option<(String, String)>>) -> Element {
    let when = format_date_time(&item.created_at);
    let author = match (&item.user_name, &item.user_job) {
        (Some(name), Some(job)) if !job.is_empty() => format!("{} ({})", name, job),
        (Some(name), _) => name.clone(),
        _ => String::new(),
    };

    rsx! {
        li { class: "timeline-item",
            div { class: "timeline-marker", style: "background: {item.action_color}",
                i { class: "bi {item.action_icon}" }
            }
            div { class: "timeline-body",
                div { class: "flex justify-between",
                    strong { "{item.action_label}" }
                    span { class: "text-secondary text-sm", "{when}" }
                }
                p { "{item.description}" }
                if !author.is_empty() {
                    div { class: "text-secondary text-sm", "{author}" }
                }
                if !item.attachments.is_empty() {
                    div { class: "timeline-attachments",
                        for att in item.attachments.iter() {
                            match AttachmentView::from(att) {
                                AttachmentView::Image { url, filename } => {
                                    let target = (url.clone(), filename.clone());
                                    rsx! {
                                        button {
                                            class: "attachment-thumb",
                                            title: "{filename}",
                                            onclick: move |_| lightbox.set(Some(target.clone())),
                                            img { src: "{url}", alt: "{filename}" }
                                        }
                                    }
                                }
                                AttachmentView::Download { url, filename } => rsx! {
                                    a { class: "attachment-link", href: "{url}", download: "{filename}",
                                        i { class: "bi bi-paperclip me-1" }
                                        "{filename}"
                                    }
                                },
                            }
                        }
                    }
                }
            }
        }
    }
}
