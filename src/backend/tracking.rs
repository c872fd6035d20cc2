use crate::backend::api::IssueActionPayload;
use crate::backend::error::ApiError;
use crate::backend::format::{format_file_size, parse_timestamp};
use crate::backend::models::{
    ActionResponse, IssueAction, IssueAttachment, IssueHistoryResponse, UploadFile,
};
use std::cmp::Reverse;

const IMAGE_EXTENSIONS: [&str; 6] = [".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp"];

pub const ACTION_TYPES: [(&str, &str); 5] = [
    ("contact", "Contato com fornecedor"),
    ("notification", "Notificação formal"),
    ("meeting", "Reunião"),
    ("follow_up", "Acompanhamento"),
    ("resolved", "Problema resolvido"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct TrackingTarget {
    pub id: String,
    pub name: String,
    pub cnpj: Option<String>,
}

impl TrackingTarget {
    pub fn title(&self) -> String {
        format!("Acompanhamento - {}", self.name)
    }

    pub fn info(&self) -> String {
        match self.cnpj.as_deref() {
            Some(cnpj) if !cnpj.is_empty() => format!("CNPJ: {}", cnpj),
            _ => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryState {
    Loading,
    Loaded(Vec<IssueAction>),
    Empty,
    Failed(String),
}

impl HistoryState {
    pub fn from_response(result: Result<IssueHistoryResponse, ApiError>) -> Self {
        match result {
            Ok(response) if response.success && !response.history.is_empty() => {
                HistoryState::Loaded(timeline(response.history))
            }
            Ok(_) => HistoryState::Empty,
            Err(err) => HistoryState::Failed(format!("Erro ao carregar histórico: {}", err)),
        }
    }
}

/// Newest first; entries with unreadable timestamps go last in their original order.
pub fn timeline(mut history: Vec<IssueAction>) -> Vec<IssueAction> {
    history.sort_by_key(|item| Reverse(parse_timestamp(&item.created_at)));
    history
}

pub fn is_image_file(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttachmentView {
    /// Thumbnail opening the lightbox
    Image { url: String, filename: String },
    Download { url: String, filename: String },
}

impl From<&IssueAttachment> for AttachmentView {
    fn from(att: &IssueAttachment) -> Self {
        if is_image_file(&att.filename) {
            AttachmentView::Image { url: att.url.clone(), filename: att.filename.clone() }
        } else {
            AttachmentView::Download { url: att.url.clone(), filename: att.filename.clone() }
        }
    }
}

/// Lines shown under the file input before upload, `None` when nothing is picked.
pub fn upload_preview(files: &[(String, u64)]) -> Option<(String, Vec<String>)> {
    if files.is_empty() {
        return None;
    }
    let header = format!("{} arquivo(s) selecionado(s):", files.len());
    let lines = files
        .iter()
        .map(|(name, size)| format!("{} ({})", name, format_file_size(*size)))
        .collect();
    Some((header, lines))
}

/// Tracking form contents. Survives a failed submit untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionDraft {
    pub action_type: String,
    pub description: String,
    pub files: Vec<UploadFile>,
    saving: bool,
}

impl Default for ActionDraft {
    fn default() -> Self {
        Self {
            action_type: ACTION_TYPES[0].0.to_string(),
            description: String::new(),
            files: Vec::new(),
            saving: false,
        }
    }
}

impl ActionDraft {
    pub fn preview(&self) -> Option<(String, Vec<String>)> {
        let files: Vec<(String, u64)> =
            self.files.iter().map(|f| (f.name.clone(), f.bytes.len() as u64)).collect();
        upload_preview(&files)
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn submit_label(&self) -> &'static str {
        if self.saving {
            "Salvando..."
        } else {
            "Registrar Ação"
        }
    }

    /// `None` while a submit is in flight or the description is blank.
    pub fn begin_submit(&mut self, csrf_token: Option<String>) -> Option<IssueActionPayload> {
        if self.saving || self.description.trim().is_empty() {
            return None;
        }
        self.saving = true;
        Some(IssueActionPayload {
            csrf_token,
            action_type: self.action_type.clone(),
            description: self.description.trim().to_string(),
            attachments: self.files.clone(),
        })
    }

    pub fn succeeded(&mut self) {
        *self = Self::default();
    }

    pub fn failed(&mut self) {
        self.saving = false;
    }
}

/// The tracking modal: which supplier it shows, its timeline and the action form.
/// Replies for any other supplier are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingPanel {
    target: Option<TrackingTarget>,
    pub history: HistoryState,
    pub draft: ActionDraft,
}

impl Default for TrackingPanel {
    fn default() -> Self {
        Self { target: None, history: HistoryState::Loading, draft: ActionDraft::default() }
    }
}

impl TrackingPanel {
    pub fn open(&mut self, target: TrackingTarget) {
        *self = Self { target: Some(target), ..Self::default() };
    }

    pub fn close(&mut self) {
        *self = Self::default();
    }

    pub fn target(&self) -> Option<&TrackingTarget> {
        self.target.as_ref()
    }

    pub fn is_showing(&self, supplier_id: &str) -> bool {
        self.target.as_ref().is_some_and(|t| t.id == supplier_id)
    }

    pub fn history_loaded(&mut self, supplier_id: &str, state: HistoryState) -> bool {
        if !self.is_showing(supplier_id) {
            return false;
        }
        self.history = state;
        true
    }

    /// Clears the form and returns true when the timeline must be fetched again.
    pub fn action_saved(&mut self, supplier_id: &str) -> bool {
        if !self.is_showing(supplier_id) {
            return false;
        }
        self.draft.succeeded();
        self.history = HistoryState::Loading;
        true
    }

    pub fn action_failed(&mut self, supplier_id: &str) -> bool {
        if !self.is_showing(supplier_id) {
            return false;
        }
        self.draft.failed();
        true
    }
}

/// Turns the add-action reply into success or a user-facing rejection.
pub fn check_action_response(response: ActionResponse) -> Result<(), ApiError> {
    if response.success {
        Ok(())
    } else {
        Err(ApiError::Rejected(
            response.message.unwrap_or_else(|| "Erro ao registrar ação".to_string()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(label: &str, created_at: &str) -> IssueAction {
        IssueAction {
            action_label: label.to_string(),
            created_at: created_at.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_image_allowlist() {
        assert!(is_image_file("foto.JPG"));
        assert!(is_image_file("scan.webp"));
        assert!(!is_image_file("laudo.pdf"));
        assert!(!is_image_file("png"));
    }

    #[test]
    fn test_attachment_views() {
        let img = IssueAttachment { filename: "a.png".into(), url: "/f/1".into() };
        let doc = IssueAttachment { filename: "a.docx".into(), url: "/f/2".into() };
        assert!(matches!(AttachmentView::from(&img), AttachmentView::Image { .. }));
        assert!(matches!(AttachmentView::from(&doc), AttachmentView::Download { .. }));
    }

    #[test]
    fn test_timeline_is_reverse_chronological() {
        let ordered = timeline(vec![
            action("a", "2024-01-01T10:00:00"),
            action("b", "sem data"),
            action("c", "2024-03-01T10:00:00"),
        ]);
        let labels: Vec<_> = ordered.iter().map(|a| a.action_label.as_str()).collect();
        assert_eq!(labels, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_history_states() {
        let empty = IssueHistoryResponse { success: true, history: vec![], message: None };
        assert_eq!(HistoryState::from_response(Ok(empty)), HistoryState::Empty);

        let failed = HistoryState::from_response(Err(ApiError::Status { status: 500 }));
        assert_eq!(failed, HistoryState::Failed("Erro ao carregar histórico: Erro 500".into()));

        let loaded = IssueHistoryResponse {
            success: true,
            history: vec![action("x", "2024-01-01T00:00:00")],
            message: None,
        };
        assert!(matches!(HistoryState::from_response(Ok(loaded)), HistoryState::Loaded(ref h) if h.len() == 1));
    }

    #[test]
    fn test_upload_preview_and_rejection() {
        assert!(upload_preview(&[]).is_none());
        let (header, lines) = upload_preview(&[("nota.pdf".into(), 2048)]).unwrap();
        assert_eq!(header, "1 arquivo(s) selecionado(s):");
        assert_eq!(lines, vec!["nota.pdf (2 KB)"]);

        let err = check_action_response(ActionResponse { success: false, message: None }).unwrap_err();
        assert_eq!(err.to_string(), "Erro ao registrar ação");
        assert!(check_action_response(ActionResponse { success: true, message: None }).is_ok());
    }

    #[test]
    fn test_draft_lifecycle() {
        let mut draft = ActionDraft::default();
        assert!(draft.begin_submit(None).is_none());

        draft.description = " Ligação realizada ".into();
        draft.files.push(UploadFile { name: "a.png".into(), mime_type: "image/png".into(), bytes: vec![0; 1536] });
        assert_eq!(draft.preview().unwrap().1, vec!["a.png (1.5 KB)"]);

        let payload = draft.begin_submit(Some("tok".into())).unwrap();
        assert_eq!(payload.description, "Ligação realizada");
        assert_eq!(payload.attachments.len(), 1);
        assert_eq!(draft.submit_label(), "Salvando...");
        assert!(draft.begin_submit(None).is_none());

        draft.failed();
        assert_eq!(draft.description, " Ligação realizada ");
        assert!(!draft.is_saving());

        draft.succeeded();
        assert!(draft.files.is_empty());
        assert_eq!(draft.submit_label(), "Registrar Ação");
    }

    #[test]
    fn test_target_labels() {
        let target = TrackingTarget { id: "1".into(), name: "Alfa".into(), cnpj: None };
        assert_eq!(target.title(), "Acompanhamento - Alfa");
        assert_eq!(target.info(), "");
    }

    fn target(id: &str) -> TrackingTarget {
        TrackingTarget { id: id.into(), name: format!("Fornecedor {}", id), cnpj: None }
    }

    #[test]
    fn test_panel_ignores_replies_for_other_supplier() {
        let mut panel = TrackingPanel::default();
        panel.open(target("1"));
        panel.draft.description = "Ligação".into();
        assert!(panel.draft.begin_submit(None).is_some());

        // user switched to another supplier while the save was in flight
        panel.open(target("2"));
        panel.draft.description = "Reunião marcada".into();
        assert!(!panel.action_saved("1"));
        assert!(!panel.action_failed("1"));
        assert!(!panel.history_loaded("1", HistoryState::Empty));
        assert_eq!(panel.draft.description, "Reunião marcada");
        assert_eq!(panel.history, HistoryState::Loading);

        assert!(panel.history_loaded("2", HistoryState::Empty));
        assert_eq!(panel.history, HistoryState::Empty);
    }

    #[test]
    fn test_panel_save_resets_form_and_reloads() {
        let mut panel = TrackingPanel::default();
        panel.open(target("3"));
        panel.history = HistoryState::Empty;
        panel.draft.description = "Notificado".into();
        panel.draft.begin_submit(None);

        assert!(panel.action_saved("3"));
        assert_eq!(panel.draft, ActionDraft::default());
        assert_eq!(panel.history, HistoryState::Loading);

        panel.draft.description = "Outra".into();
        panel.draft.begin_submit(None);
        assert!(panel.action_failed("3"));
        assert!(!panel.draft.is_saving());
        assert_eq!(panel.draft.description, "Outra");

        panel.close();
        assert!(panel.target().is_none());
    }
}
