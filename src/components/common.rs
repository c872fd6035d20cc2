use dioxus::prelude::*;
use crate::backend::error::{decode_island, DataError};
use crate::backend::export::CsvExport;
use crate::backend::notify::Toast;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub async fn sleep(duration: Duration) {
    #[cfg(not(target_arch = "wasm32"))]
    tokio::time::sleep(duration).await;
    #[cfg(target_arch = "wasm32")]
    gloo_timers::future::sleep(duration).await;
}

/// Reads and decodes a `<script type="application/json">` island from the host page.
pub async fn read_island<T: DeserializeOwned>(island: &str) -> Result<T, DataError> {
    let mut eval = document::eval(
        r#"
        const id = await dioxus.recv();
        const el = document.getElementById(id);
        dioxus.send(el ? el.textContent : null);
        "#,
    );
    if let Err(e) = eval.send(island) {
        tracing::warn!(island, error = ?e, "could not pass island id to eval");
    }
    let text = eval.recv::<Option<String>>().await.unwrap_or_else(|e| {
        tracing::warn!(island, error = ?e, "eval failed while reading data island");
        None
    });
    decode_island(island, text.as_deref())
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct HostInfo {
    pub origin: String,
    pub csrf_token: Option<String>,
}

/// Page origin plus the CSRF token from `input[name=csrf_token]` or the meta tag.
pub async fn read_host_info() -> HostInfo {
    let mut eval = document::eval(
        r#"
        const input = document.querySelector('input[name="csrf_token"]');
        const meta = document.querySelector('meta[name="csrf_token"]');
        const token = input ? input.value : (meta ? meta.getAttribute('content') : null);
        dioxus.send({ origin: window.location.origin, csrf_token: token });
        "#,
    );
    eval.recv::<HostInfo>().await.unwrap_or_default()
}

/// Builds a hidden form and submits it; the browser navigates away.
pub fn submit_form(action: String, fields: Vec<(String, String)>) {
    let mut eval = document::eval(
        r#"
        const [action, fields] = await dioxus.recv();
        const form = document.createElement('form');
        form.method = 'POST';
        form.action = action;
        for (const [name, value] of fields) {
            const input = document.createElement('input');
            input.type = 'hidden';
            input.name = name;
            input.value = value;
            form.appendChild(input);
        }
        document.body.appendChild(form);
        form.submit();
        "#,
    );
    if let Err(e) = eval.send((action, fields)) {
        tracing::error!(error = ?e, "failed to submit form");
    }
}

pub fn focus_field(name: &str) {
    let mut eval = document::eval(
        r#"
        const name = await dioxus.recv();
        const el = document.querySelector(`[name="${name}"]`);
        if (el) { el.focus(); el.scrollIntoView({ behavior: 'smooth', block: 'center' }); }
        "#,
    );
    if let Err(e) = eval.send(name) {
        tracing::warn!(field = name, error = ?e, "could not focus field");
    }
}

/// Browser download on web; written to the working directory elsewhere.
pub fn download_csv(export: &CsvExport) -> Result<String, String> {
    #[cfg(target_arch = "wasm32")]
    {
        let mut eval = document::eval(
            r#"
            const [href, filename] = await dioxus.recv();
            const link = document.createElement('a');
            link.href = href;
            link.download = filename;
            link.style.display = 'none';
            document.body.appendChild(link);
            link.click();
            document.body.removeChild(link);
            "#,
        );
        eval.send((export.data_uri(), export.filename.clone())).map_err(|e| format!("{:?}", e))?;
        Ok(export.filename.clone())
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let dir = std::env::current_dir().map_err(|e| e.to_string())?;
        let path = export.write_to_dir(&dir).map_err(|e| e.to_string())?;
        Ok(path.display().to_string())
    }
}

#[component]
fn ToastItem(toast: Toast) -> Element {
    let mut app_state = use_context::<crate::components::AppState>();
    let id = toast.id;
    use_future(move || async move {
        let lifetime = app_state.toasts.peek().lifetime();
        sleep(lifetime).await;
        app_state.toasts.write().expire(id);
    });
    let kind = toast.kind.css();
    let icon = toast.kind.icon();

    rsx! {
        div { class: "toast toast-{kind} animate-fade-in", role: "alert",
            i { class: "bi {icon} me-2" }
            span { "{toast.message}" }
        }
    }
}

#[component]
pub fn ToastStack() -> Element {
    let app_state = use_context::<crate::components::AppState>();
    let toasts: Vec<Toast> = app_state.toasts.read().iter().cloned().collect();

    rsx! {
        div { class: "toast-stack",
            for toast in toasts {
                ToastItem { key: "{toast.id}", toast: toast.clone() }
            }
        }
    }
}

#[component]
pub fn Modal(title: String, on_close: EventHandler<()>, children: Element, wide: Option<bool>) -> Element {
    let size = if wide.unwrap_or(false) { "modal-wide" } else { "" };
    rsx! {
        div {
            class: "modal-backdrop animate-fade-in",
            onclick: move |_| on_close.call(()),
            div {
                class: "modal-panel {size}",
                onclick: move |e| e.stop_propagation(),
                div { class: "modal-header",
                    h2 { class: "modal-title", "{title}" }
                    button { class: "btn-close", onclick: move |_| on_close.call(()), "✕" }
                }
                div { class: "modal-body", {children} }
            }
        }
    }
}

/// Error shown in place of a page whose data island could not be read.
#[component]
pub fn DataAlert(message: String) -> Element {
    rsx! {
        div { class: "alert alert-danger",
            i { class: "bi bi-exclamation-triangle me-2" }
            "{message}"
        }
    }
}

#[component]
pub fn Loading() -> Element {
    rsx! {
        div { class: "loading-state",
            div { class: "spinner-border", role: "status" }
        }
    }
}
