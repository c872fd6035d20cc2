use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Ids arrive as numbers from JSON endpoints and as strings from data islands.
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid id: {}", other))),
    }
}

// ---------------------------------------------------------------------------
// Suppliers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SupplierRow {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    /// Trade name, falls back to the legal name on the server side
    pub name: String,
    pub legal_name: Option<String>,
    pub service: String,
    pub contact: String,
    /// Machine status key matched by the status filter (e.g. `active`)
    pub status: String,
    pub status_label: String,
    pub score: f64,
    pub evaluations: u32,
    pub priority: Option<u32>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub cnpj: Option<String>,
    pub evaluators: Vec<String>,
    pub category: Option<String>,
}

/// Snapshot returned by the stats endpoint, used to populate the edit form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SupplierSnapshot {
    pub company_name: Option<String>,
    pub trade_name: Option<String>,
    pub cnpj: Option<String>,
    pub service_type: Option<String>,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Evaluator {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    pub username: String,
    pub job_title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssignedEvaluator {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SupplierListData {
    pub rows: Vec<SupplierRow>,
    pub evaluators: Vec<Evaluator>,
    pub status_options: Vec<SelectOption>,
}

// ---------------------------------------------------------------------------
// Issue tracking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct IssueHistoryResponse {
    pub success: bool,
    pub history: Vec<IssueAction>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct IssueAction {
    pub action_label: String,
    pub action_color: String,
    pub action_icon: String,
    pub description: String,
    pub created_at: String,
    pub user_name: Option<String>,
    pub user_job: Option<String>,
    pub attachments: Vec<IssueAttachment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IssueAttachment {
    pub filename: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ActionResponse {
    pub success: bool,
    pub message: Option<String>,
}

/// File picked in the tracking form, already read into memory.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Procedures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cid {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcedureHit {
    pub code: String,
    pub description: String,
    #[serde(default)]
    pub cids: Vec<Cid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProcedureSearchResponse {
    #[serde(default, alias = "procedures")]
    pub results: Vec<ProcedureHit>,
}

/// The catalog endpoint answers either a bare list or `{"procedures": [...]}`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CatalogResponse {
    List(Vec<ProcedureHit>),
    Wrapped { procedures: Vec<ProcedureHit> },
}

impl CatalogResponse {
    pub fn into_hits(self) -> Vec<ProcedureHit> {
        match self {
            CatalogResponse::List(hits) => hits,
            CatalogResponse::Wrapped { procedures } => procedures,
        }
    }
}

// ---------------------------------------------------------------------------
// Dashboards
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct EvaluationSeries {
    pub labels: Vec<String>,
    pub scores: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedSupplier {
    pub name: String,
    #[serde(default)]
    pub score: f64,
}

/// Category key -> suppliers in that category.
pub type CategoryDistribution = BTreeMap<String, Vec<RankedSupplier>>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct DonutSegment {
    pub category: String,
    pub label: String,
    pub color: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SupplierDashboardData {
    pub rows: Vec<SupplierRow>,
    pub segments: Vec<DonutSegment>,
}

// ---------------------------------------------------------------------------
// NIR
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Text,
    Date,
    Select,
    Hidden,
}

/// A field as declared by the server-rendered form, including its original value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub value: Option<String>,
    pub required: bool,
    pub options: Vec<SelectOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ObservationRecord {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub patient_name: String,
    pub medical_record: Option<String>,
    /// Reference timestamp for the elapsed-time ticker
    pub fa_datetime: Option<String>,
    pub sector: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct DischargeRecord {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub patient_name: String,
    pub admission_date: Option<String>,
    pub action: String,
    pub fields: Vec<FieldSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct NirBoardData {
    pub observations: Vec<ObservationRecord>,
    pub discharges: Vec<DischargeRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ProcedureFormData {
    pub action: String,
    pub fields: Vec<FieldSpec>,
    pub procedures: Vec<ProcedureHit>,
}
