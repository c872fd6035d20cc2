pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod format;
pub mod logging;
pub mod models;
pub mod nir;
pub mod notify;
pub mod procedures;
pub mod suppliers;
pub mod table;
pub mod tracking;
pub mod wizard;

use api::{ApiClient, IssueActionPayload};
use config::{build_url, Endpoints};
use error::ApiError;
use futures::stream::{FuturesUnordered, StreamExt};
use models::{AssignedEvaluator, ProcedureHit, SupplierSnapshot};
use notify::ToastKind;
use tokio::sync::mpsc;
use tracking::{check_action_response, HistoryState};
use tracing::{debug, error, info, warn};

#[derive(Debug)]
pub enum AppCmd {
    Configure { endpoints: Endpoints, origin: String },
    LoadSupplierSnapshot { supplier_id: String, with_evaluators: bool },
    LoadIssueHistory { supplier_id: String },
    SubmitIssueAction { supplier_id: String, payload: IssueActionPayload },
    SearchProcedures { record_id: String, query: String },
    SearchCatalog { query: String },
}

#[derive(Debug, Clone)]
pub enum AppEvent {
    SnapshotLoaded { supplier_id: String, snapshot: SupplierSnapshot },
    SnapshotFailed { supplier_id: String },
    EvaluatorsLoaded { supplier_id: String, assigned: Vec<AssignedEvaluator> },
    HistoryLoaded { supplier_id: String, state: HistoryState },
    IssueActionSaved { supplier_id: String },
    IssueActionFailed { supplier_id: String },
    ProcedureResults { record_id: String, query: String, result: Result<Vec<ProcedureHit>, String> },
    CatalogResults { query: String, hits: Vec<ProcedureHit> },
    Notify(ToastKind, String),
}

/// Executes network commands for the UI. Requests run concurrently and are
/// never cancelled; each one reports back through `event_tx`.
pub struct Backend {
    cmd_rx: mpsc::UnboundedReceiver<AppCmd>,
    event_tx: mpsc::UnboundedSender<AppEvent>,
    api: ApiClient,
    endpoints: Endpoints,
}

impl Backend {
    pub fn new(cmd_rx: mpsc::UnboundedReceiver<AppCmd>, event_tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self { cmd_rx, event_tx, api: ApiClient::new(""), endpoints: Endpoints::default() }
    }

    pub async fn run(&mut self) {
        let mut in_flight = FuturesUnordered::new();
        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(AppCmd::Configure { endpoints, origin }) => {
                        info!(%origin, "backend configured");
                        self.api = ApiClient::new(&origin);
                        self.endpoints = endpoints;
                    }
                    Some(cmd) => {
                        debug!(?cmd, "dispatching");
                        in_flight.push(handle_command(
                            self.api.clone(),
                            self.endpoints.clone(),
                            self.event_tx.clone(),
                            cmd,
                        ));
                    }
                    None => break,
                },
                Some(()) = in_flight.next(), if !in_flight.is_empty() => {}
            }
        }
        // let pending requests report before shutting down
        while in_flight.next().await.is_some() {}
        info!("backend stopped");
    }
}

fn send(event_tx: &mpsc::UnboundedSender<AppEvent>, event: AppEvent) {
    if event_tx.send(event).is_err() {
        warn!("UI event channel closed");
    }
}

async fn handle_command(
    api: ApiClient,
    endpoints: Endpoints,
    event_tx: mpsc::UnboundedSender<AppEvent>,
    cmd: AppCmd,
) {
    match cmd {
        AppCmd::Configure { .. } => {}
        AppCmd::LoadSupplierSnapshot { supplier_id, with_evaluators } => {
            let Some(url) = build_url(&endpoints.stats, &supplier_id) else {
                warn!(%supplier_id, "stats endpoint not configured");
                return;
            };
            match api.supplier_snapshot(&url).await {
                Ok(snapshot) => {
                    send(&event_tx, AppEvent::SnapshotLoaded { supplier_id: supplier_id.clone(), snapshot });
                }
                Err(e) => {
                    error!(%supplier_id, error = %e, "failed to load supplier snapshot");
                    send(&event_tx, AppEvent::SnapshotFailed { supplier_id });
                    send(&event_tx, AppEvent::Notify(ToastKind::Danger, "Erro ao carregar dados do fornecedor.".into()));
                    return;
                }
            }
            if !with_evaluators {
                return;
            }
            let Some(url) = build_url(&endpoints.evaluators, &supplier_id) else {
                return;
            };
            match api.assigned_evaluators(&url).await {
                Ok(assigned) => send(&event_tx, AppEvent::EvaluatorsLoaded { supplier_id, assigned }),
                Err(e) => {
                    warn!(%supplier_id, error = %e, "failed to load assigned evaluators");
                    send(
                        &event_tx,
                        AppEvent::Notify(
                            ToastKind::Warning,
                            "Não foi possível carregar os avaliadores atribuídos.".into(),
                        ),
                    );
                }
            }
        }
        AppCmd::LoadIssueHistory { supplier_id } => {
            let result = match build_url(&endpoints.issue_history, &supplier_id) {
                Some(url) => api.issue_history(&url).await,
                None => Err(ApiError::MissingEndpoint("issue_history")),
            };
            if let Err(e) = &result {
                error!(%supplier_id, error = %e, "failed to load issue history");
            }
            send(&event_tx, AppEvent::HistoryLoaded { supplier_id, state: HistoryState::from_response(result) });
        }
        AppCmd::SubmitIssueAction { supplier_id, payload } => {
            let result = async {
                let url = build_url(&endpoints.add_issue_action, &supplier_id)
                    .ok_or(ApiError::MissingEndpoint("add_issue_action"))?;
                check_action_response(api.add_issue_action(&url, payload).await?)
            }
            .await;
            match result {
                Ok(()) => {
                    info!(%supplier_id, "issue action registered");
                    send(&event_tx, AppEvent::IssueActionSaved { supplier_id });
                    send(&event_tx, AppEvent::Notify(ToastKind::Success, "Ação registrada com sucesso!".into()));
                }
                Err(e) => {
                    warn!(%supplier_id, error = %e, "issue action rejected");
                    send(&event_tx, AppEvent::IssueActionFailed { supplier_id });
                    send(&event_tx, AppEvent::Notify(ToastKind::Danger, e.to_string()));
                }
            }
        }
        AppCmd::SearchProcedures { record_id, query } => {
            let result = api.search_procedures(&endpoints.search_procedures, &query).await.map_err(|e| {
                warn!(%query, error = %e, "procedure search failed");
                e.to_string()
            });
            send(&event_tx, AppEvent::ProcedureResults { record_id, query, result });
        }
        AppCmd::SearchCatalog { query } => {
            match api.search_catalog(&endpoints.procedure_catalog, &query).await {
                Ok(hits) => send(&event_tx, AppEvent::CatalogResults { query, hits }),
                Err(e) => warn!(%query, error = %e, "catalog search failed"),
            }
        }
    }
}

/// Spawns nothing itself; the caller decides where the loop runs.
pub async fn init(cmd_rx: mpsc::UnboundedReceiver<AppCmd>, event_tx: mpsc::UnboundedSender<AppEvent>) {
    Backend::new(cmd_rx, event_tx).run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Minimal HTTP responder: exact path -> (status, JSON body), 404 otherwise.
    async fn stub_server(routes: Vec<(&'static str, u16, &'static str)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let routes = routes.clone();
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 8192];
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..n]).to_string();
                    let path = request.split_whitespace().nth(1).unwrap_or("").to_string();
                    let (status, body) = routes
                        .iter()
                        .find(|(p, _, _)| *p == path)
                        .map(|(_, status, body)| (*status, *body))
                        .unwrap_or((404, "{}"));
                    let response = format!(
                        "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    socket.write_all(response.as_bytes()).await.unwrap();
                    socket.shutdown().await.ok();
                });
            }
        });
        format!("http://{}", addr)
    }

    async fn run_commands(cmds: Vec<AppCmd>) -> Vec<AppEvent> {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        for cmd in cmds {
            cmd_tx.send(cmd).unwrap();
        }
        drop(cmd_tx);
        init(cmd_rx, event_tx).await;

        let mut events = Vec::new();
        while let Ok(event) = event_rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn without(f: impl FnOnce(&mut Endpoints)) -> Endpoints {
        let mut endpoints = Endpoints::default();
        f(&mut endpoints);
        endpoints
    }

    #[tokio::test]
    async fn test_missing_history_endpoint_reports_failure() {
        let events = run_commands(vec![
            AppCmd::Configure { endpoints: without(|e| e.issue_history.clear()), origin: String::new() },
            AppCmd::LoadIssueHistory { supplier_id: "3".into() },
        ])
        .await;
        assert_eq!(events.len(), 1);
        match &events[0] {
            AppEvent::HistoryLoaded { supplier_id, state: HistoryState::Failed(msg) } => {
                assert_eq!(supplier_id, "3");
                assert!(msg.starts_with("Erro ao carregar histórico: "));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_action_endpoint_keeps_form_and_notifies() {
        let events = run_commands(vec![
            AppCmd::Configure { endpoints: without(|e| e.add_issue_action.clear()), origin: String::new() },
            AppCmd::SubmitIssueAction { supplier_id: "3".into(), payload: IssueActionPayload::default() },
        ])
        .await;
        assert!(matches!(&events[0], AppEvent::IssueActionFailed { supplier_id } if supplier_id == "3"));
        assert!(matches!(&events[1], AppEvent::Notify(ToastKind::Danger, msg) if msg.contains("add_issue_action")));
    }

    #[tokio::test]
    async fn test_missing_stats_endpoint_is_silent() {
        let events = run_commands(vec![
            AppCmd::Configure { endpoints: without(|e| e.stats.clear()), origin: String::new() },
            AppCmd::LoadSupplierSnapshot { supplier_id: "3".into(), with_evaluators: true },
        ])
        .await;
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_server_yields_search_error() {
        let events = run_commands(vec![
            AppCmd::Configure { endpoints: Endpoints::default(), origin: "http://127.0.0.1:9".into() },
            AppCmd::SearchProcedures { record_id: "7".into(), query: "04".into() },
        ])
        .await;
        match &events[0] {
            AppEvent::ProcedureResults { record_id, query, result } => {
                assert_eq!(record_id, "7");
                assert_eq!(query, "04");
                assert!(result.is_err());
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_evaluator_failure_only_warns() {
        let origin = stub_server(vec![
            ("/feedback/suppliers/api/supplier/5/stats", 200, r#"{"trade_name": "Alfa"}"#),
            ("/feedback/suppliers/api/supplier/5/evaluators", 500, "{}"),
        ])
        .await;
        let events = run_commands(vec![
            AppCmd::Configure { endpoints: Endpoints::default(), origin },
            AppCmd::LoadSupplierSnapshot { supplier_id: "5".into(), with_evaluators: true },
        ])
        .await;

        assert_eq!(events.len(), 2);
        match &events[0] {
            AppEvent::SnapshotLoaded { supplier_id, snapshot } => {
                assert_eq!(supplier_id, "5");
                assert_eq!(snapshot.trade_name.as_deref(), Some("Alfa"));
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(matches!(
            &events[1],
            AppEvent::Notify(ToastKind::Warning, msg) if msg == "Não foi possível carregar os avaliadores atribuídos."
        ));
    }

    #[tokio::test]
    async fn test_assigned_evaluators_follow_snapshot() {
        let origin = stub_server(vec![
            ("/feedback/suppliers/api/supplier/5/stats", 200, "{}"),
            ("/feedback/suppliers/api/supplier/5/evaluators", 200, r#"[{"id": 9}, {"id": "12"}]"#),
        ])
        .await;
        let events = run_commands(vec![
            AppCmd::Configure { endpoints: Endpoints::default(), origin },
            AppCmd::LoadSupplierSnapshot { supplier_id: "5".into(), with_evaluators: true },
        ])
        .await;

        assert!(matches!(&events[0], AppEvent::SnapshotLoaded { .. }));
        match &events[1] {
            AppEvent::EvaluatorsLoaded { supplier_id, assigned } => {
                assert_eq!(supplier_id, "5");
                let ids: Vec<_> = assigned.iter().map(|e| e.id.as_str()).collect();
                assert_eq!(ids, vec!["9", "12"]);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_search_sends_encoded_query() {
        let origin = stub_server(vec![(
            "/nir/search_procedures?q=04+cir%C3%BArgico",
            200,
            r#"{"results": [{"code": "0401", "description": "Cirurgia"}]}"#,
        )])
        .await;
        let events = run_commands(vec![
            AppCmd::Configure { endpoints: Endpoints::default(), origin },
            AppCmd::SearchProcedures { record_id: "7".into(), query: "04 cirúrgico".into() },
        ])
        .await;
        match &events[0] {
            AppEvent::ProcedureResults { result: Ok(hits), .. } => assert_eq!(hits[0].code, "0401"),
            other => panic!("unexpected event {:?}", other),
        }
    }
}
