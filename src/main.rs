mod backend;
mod components;

use components::employee_dashboard::EmployeeDashboardComponent;
use components::nav_bar::NavComponent;
use components::nir_board::NirBoardComponent;
use components::procedure_picker::ProcedureFormComponent;
use components::supplier_dashboard::SupplierDashboardComponent;
use components::supplier_list::SupplierListComponent;
use components::AppState;

use backend::config::{PageConfig, CONFIG_ISLAND};
use backend::error::DataError;
use backend::AppCmd;
use components::common::{read_host_info, read_island};
use dioxus::prelude::*;
use tokio::sync::mpsc;

#[derive(Routable, Clone, PartialEq)]
enum Route {
    #[layout(NavComponent)]
    #[route("/")]
    EmployeeDashboardComponent {},
    #[route("/suppliers/dashboard")]
    SupplierDashboardComponent {},
    #[route("/suppliers")]
    SupplierListComponent {},
    #[route("/nir")]
    NirBoardComponent {},
    #[route("/nir/procedimentos")]
    ProcedureFormComponent {},
}

fn main() {
    backend::logging::init();
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    let mut app_state = AppState::new();
    use_context_provider(|| app_state);

    let cmd_tx = use_hook(|| {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<AppCmd>();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        spawn(backend::init(cmd_rx, event_tx));

        let apply_tx = cmd_tx.clone();
        spawn(async move {
            while let Some(event) = event_rx.recv().await {
                app_state.apply(event, &apply_tx);
            }
        });
        cmd_tx
    });
    use_context_provider(|| cmd_tx.clone());

    use_future(move || {
        let cmd_tx = cmd_tx.clone();
        async move {
            let mut config = match read_island::<PageConfig>(CONFIG_ISLAND).await {
                Ok(config) => config,
                Err(DataError::Missing(island)) => {
                    tracing::warn!(%island, "page configuration missing, using defaults");
                    PageConfig::default()
                }
                Err(e) => {
                    tracing::error!(error = %e, "page configuration unreadable, using defaults");
                    PageConfig::default()
                }
            };
            let host = read_host_info().await;
            if config.csrf_token.is_none() {
                config.csrf_token = host.csrf_token;
            }
            app_state.toasts.write().set_lifetime(config.toast_duration());
            let endpoints = config.endpoints.clone();
            app_state.config.set(config);
            if cmd_tx.send(AppCmd::Configure { endpoints, origin: host.origin }).is_err() {
                tracing::error!("backend task is not running");
            }
        }
    });

    rsx! {
        document::Stylesheet {href: asset!("/assets/main.css")}
        document::Stylesheet {href: "https://cdn.jsdelivr.net/npm/bootstrap-icons@1.11.3/font/bootstrap-icons.min.css"}
        Router::<Route> {}
    }
}
