pub mod admission_wizard;
pub mod common;
pub mod employee_dashboard;
pub mod nav_bar;
pub mod nir_board;
pub mod procedure_picker;
pub mod supplier_dashboard;
pub mod supplier_list;
pub mod tracking_modal;

use dioxus::prelude::*;
use tokio::sync::mpsc::UnboundedSender;
use crate::backend::config::PageConfig;
use crate::backend::nir::NirBoard;
use crate::backend::notify::{ToastKind, ToastQueue};
use crate::backend::procedures::CatalogPicker;
use crate::backend::suppliers::{EditForm, EvaluatorChecklist};
use crate::backend::models::SupplierRow;
use crate::backend::tracking::{TrackingPanel, TrackingTarget};
use crate::backend::{AppCmd, AppEvent};

/// Queues a command for the backend task; a closed channel is only logged.
pub fn send_cmd(cmd_tx: &UnboundedSender<AppCmd>, cmd: AppCmd) {
    if let Err(e) = cmd_tx.send(cmd) {
        tracing::warn!(cmd = ?e.0, "backend command channel closed");
    }
}

/// Edit modal lifecycle: the modal only shows once the snapshot arrived.
#[derive(Debug, Clone, PartialEq)]
pub enum EditModal {
    Closed,
    Loading(String),
    Open(EditForm),
}

#[derive(Clone, Copy)]
pub struct AppState {
    pub config: Signal<PageConfig>,
    pub toasts: Signal<ToastQueue>,
    pub edit_modal: Signal<EditModal>,
    pub checklist: Signal<EvaluatorChecklist>,
    pub tracking: Signal<TrackingPanel>,
    pub nir: Signal<NirBoard>,
    pub catalog: Signal<Option<CatalogPicker>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            config: use_signal(PageConfig::default),
            toasts: use_signal(ToastQueue::default),
            edit_modal: use_signal(|| EditModal::Closed),
            checklist: use_signal(EvaluatorChecklist::default),
            tracking: use_signal(TrackingPanel::default),
            nir: use_signal(NirBoard::default),
            catalog: use_signal(|| None),
        }
    }

    pub fn notify(&mut self, kind: ToastKind, message: impl Into<String>) {
        self.toasts.write().push(kind, message);
    }

    /// Opens the tracking modal for `row` and fetches its timeline.
    pub fn open_tracking(&mut self, row: &SupplierRow, cmd_tx: &UnboundedSender<AppCmd>) {
        self.tracking.write().open(TrackingTarget {
            id: row.id.clone(),
            name: row.name.clone(),
            cnpj: row.cnpj.clone(),
        });
        send_cmd(cmd_tx, AppCmd::LoadIssueHistory { supplier_id: row.id.clone() });
    }

    /// Folds one backend event into the page state.
    pub fn apply(&mut self, event: AppEvent, cmd_tx: &UnboundedSender<AppCmd>) {
        match event {
            AppEvent::SnapshotLoaded { supplier_id, snapshot } => {
                let waiting = matches!(&*self.edit_modal.peek(), EditModal::Loading(id) if *id == supplier_id);
                if waiting {
                    let endpoints = self.config.peek().endpoints.clone();
                    self.edit_modal.set(EditModal::Open(EditForm::from_snapshot(&supplier_id, snapshot, &endpoints)));
                }
            }
            AppEvent::SnapshotFailed { supplier_id } => {
                let waiting = matches!(&*self.edit_modal.peek(), EditModal::Loading(id) if *id == supplier_id);
                if waiting {
                    self.edit_modal.set(EditModal::Closed);
                }
            }
            AppEvent::EvaluatorsLoaded { supplier_id, assigned } => {
                let open = matches!(&*self.edit_modal.peek(), EditModal::Open(form) if form.supplier_id == supplier_id);
                if open {
                    self.checklist.write().assign(&assigned);
                }
            }
            AppEvent::HistoryLoaded { supplier_id, state } => {
                if !self.tracking.write().history_loaded(&supplier_id, state) {
                    tracing::debug!(%supplier_id, "dropping history for a closed modal");
                }
            }
            AppEvent::IssueActionSaved { supplier_id } => {
                if self.tracking.write().action_saved(&supplier_id) {
                    send_cmd(cmd_tx, AppCmd::LoadIssueHistory { supplier_id });
                }
            }
            AppEvent::IssueActionFailed { supplier_id } => {
                self.tracking.write().action_failed(&supplier_id);
            }
            AppEvent::ProcedureResults { record_id, query, result } => {
                if let Some(wizard) = self.nir.write().wizard_mut(&record_id) {
                    wizard.search.apply_results(&query, result);
                }
            }
            AppEvent::CatalogResults { hits, .. } => {
                if let Some(picker) = self.catalog.write().as_mut() {
                    picker.set_suggestions(hits);
                }
            }
            AppEvent::Notify(kind, message) => self.notify(kind, message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::models::SupplierSnapshot;
    use crate::backend::tracking::HistoryState;
    use dioxus::dioxus_core::VirtualDom;
    use std::cell::RefCell;
    use tokio::sync::mpsc;

    struct Outcome {
        after_stale: TrackingPanel,
        panel: TrackingPanel,
        edit_modal: EditModal,
        commands: Vec<String>,
    }

    thread_local! {
        static OUTCOME: RefCell<Option<Outcome>> = const { RefCell::new(None) };
    }

    fn row(id: &str) -> SupplierRow {
        SupplierRow { id: id.to_string(), name: format!("Fornecedor {}", id), ..Default::default() }
    }

    // Supplier 1 saves an action, the user switches to supplier 2, then the replies for 1 arrive.
    fn stale_replies() -> Element {
        let mut state = AppState::new();
        use_hook(move || {
            let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel();
            state.open_tracking(&row("1"), &cmd_tx);
            state.tracking.write().draft.description = "Ligação".into();
            let _ = state.tracking.write().draft.begin_submit(None);

            state.open_tracking(&row("2"), &cmd_tx);
            state.tracking.write().draft.description = "Reunião".into();
            state.edit_modal.set(EditModal::Loading("2".into()));

            state.apply(AppEvent::IssueActionSaved { supplier_id: "1".into() }, &cmd_tx);
            state.apply(AppEvent::IssueActionFailed { supplier_id: "1".into() }, &cmd_tx);
            state.apply(AppEvent::HistoryLoaded { supplier_id: "1".into(), state: HistoryState::Empty }, &cmd_tx);
            state.apply(
                AppEvent::SnapshotLoaded { supplier_id: "1".into(), snapshot: SupplierSnapshot::default() },
                &cmd_tx,
            );
            state.apply(AppEvent::SnapshotFailed { supplier_id: "1".into() }, &cmd_tx);
            let after_stale = state.tracking.peek().clone();

            // replies for the open supplier still land
            state.apply(AppEvent::IssueActionSaved { supplier_id: "2".into() }, &cmd_tx);

            let mut commands = Vec::new();
            while let Ok(cmd) = cmd_rx.try_recv() {
                commands.push(format!("{:?}", cmd));
            }
            let outcome = Outcome {
                after_stale,
                panel: state.tracking.peek().clone(),
                edit_modal: state.edit_modal.peek().clone(),
                commands,
            };
            OUTCOME.with(|o| *o.borrow_mut() = Some(outcome));
        });
        rsx! {}
    }

    #[test]
    fn test_apply_ignores_replies_for_previous_supplier() {
        let mut dom = VirtualDom::new(stale_replies);
        dom.rebuild_in_place();
        let outcome = OUTCOME.with(|o| o.borrow_mut().take()).expect("harness did not run");

        assert_eq!(outcome.after_stale.draft.description, "Reunião");
        assert_eq!(outcome.after_stale.history, HistoryState::Loading);
        assert!(!outcome.after_stale.draft.is_saving());

        assert_eq!(outcome.panel.target().map(|t| t.id.as_str()), Some("2"));
        // the save for 2 cleared its form and reloaded its timeline, nothing else touched it
        assert_eq!(outcome.panel.draft.description, "");
        assert_eq!(outcome.panel.history, HistoryState::Loading);
        assert_eq!(outcome.edit_modal, EditModal::Loading("2".into()));

        assert_eq!(outcome.commands.len(), 3);
        assert!(outcome.commands[0].contains("supplier_id: \"1\""));
        assert!(outcome.commands[1].contains("supplier_id: \"2\""));
        assert!(outcome.commands[2].starts_with("LoadIssueHistory"));
        assert!(outcome.commands[2].contains("supplier_id: \"2\""));
    }
}
