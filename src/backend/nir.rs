use crate::backend::config::{build_url, Endpoints};
use crate::backend::format::{parse_timestamp, sao_paulo};
use crate::backend::models::{DischargeRecord, FieldKind, FieldSpec, NirBoardData, ObservationRecord};
use crate::backend::wizard::WizardSession;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::{BTreeMap, BTreeSet};

pub const CANCEL_REASON_REQUIRED: &str = "Por favor, informe o motivo do cancelamento.";
pub const SAVING_LABEL: &str = "Salvando...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DetailKind {
    Alta,
    Observation,
    Supplier,
}

impl DetailKind {
    pub fn label(self, open: bool) -> &'static str {
        match (self, open) {
            (_, true) => "Ocultar painel",
            (DetailKind::Alta, false) => "Ver e gerenciar",
            (DetailKind::Observation, false) => "Gerenciar Observação",
            (DetailKind::Supplier, false) => "Detalhes",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DetailId {
    pub kind: DetailKind,
    pub record_id: String,
}

impl DetailId {
    pub fn new(kind: DetailKind, record_id: &str) -> Self {
        Self { kind, record_id: record_id.to_string() }
    }
}

/// At most one detail row open per group.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DetailToggleGroup {
    open: Option<DetailId>,
}

impl DetailToggleGroup {
    /// Flips `id`; returns the rows that were closed by this click.
    pub fn toggle(&mut self, id: DetailId) -> Vec<DetailId> {
        match self.open.take() {
            Some(current) if current == id => vec![current],
            Some(current) => {
                self.open = Some(id);
                vec![current]
            }
            None => {
                self.open = Some(id);
                Vec::new()
            }
        }
    }

    pub fn close(&mut self, id: &DetailId) -> bool {
        if self.open.as_ref() == Some(id) {
            self.open = None;
            true
        } else {
            false
        }
    }

    pub fn is_open(&self, id: &DetailId) -> bool {
        self.open.as_ref() == Some(id)
    }

    pub fn label(&self, id: &DetailId) -> &'static str {
        id.kind.label(self.is_open(id))
    }
}

/// Discharge form embedded in an alta detail row.
#[derive(Debug, Clone, PartialEq)]
pub struct AltaForm {
    pub record_id: String,
    pub action: String,
    fields: Vec<FieldSpec>,
    values: BTreeMap<String, String>,
    invalid: BTreeSet<String>,
    saving: bool,
}

impl AltaForm {
    pub fn new(record: &DischargeRecord) -> Self {
        let mut form = Self {
            record_id: record.id.clone(),
            action: record.action.clone(),
            fields: record.fields.clone(),
            values: BTreeMap::new(),
            invalid: BTreeSet::new(),
            saving: false,
        };
        for field in &form.fields {
            form.values.insert(field.name.clone(), field.value.clone().unwrap_or_default());
        }
        form
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn value(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn set_value(&mut self, name: &str, value: &str) {
        self.values.insert(name.to_string(), value.to_string());
    }

    pub fn is_invalid(&self, name: &str) -> bool {
        self.invalid.contains(name)
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// Restores declared values of every visible input; the CSRF token is left alone.
    pub fn reset(&mut self) {
        for field in &self.fields {
            if field.kind == FieldKind::Hidden || field.name == "csrf_token" {
                continue;
            }
            self.values.insert(field.name.clone(), field.value.clone().unwrap_or_default());
        }
        self.invalid.clear();
        self.saving = false;
    }

    /// Marks every empty required field; `Err` carries the first one to focus.
    pub fn validate(&mut self) -> Result<(), String> {
        let mut first = None;
        for field in self.fields.iter().filter(|f| f.required) {
            let empty = self.values.get(&field.name).map_or(true, |v| v.trim().is_empty());
            if empty {
                self.invalid.insert(field.name.clone());
                first.get_or_insert_with(|| field.name.clone());
            } else {
                self.invalid.remove(&field.name);
            }
        }
        match first {
            Some(name) => Err(name),
            None => Ok(()),
        }
    }

    pub fn submit(&mut self) -> Result<Vec<(String, String)>, String> {
        self.validate()?;
        self.saving = true;
        Ok(self.fields.iter().map(|f| (f.name.clone(), self.value(&f.name).to_string())).collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CancelObservationForm {
    pub record_id: String,
    pub patient_name: String,
    pub action: String,
    pub reason: String,
    pub error: Option<&'static str>,
}

impl CancelObservationForm {
    pub fn new(record: &ObservationRecord, endpoints: &Endpoints) -> Option<Self> {
        Some(Self {
            record_id: record.id.clone(),
            patient_name: record.patient_name.clone(),
            action: build_url(&endpoints.cancel_observation, &record.id)?,
            reason: String::new(),
            error: None,
        })
    }

    pub fn submit(&mut self, csrf_token: &str) -> Result<Vec<(String, String)>, &'static str> {
        let reason = self.reason.trim();
        if reason.is_empty() {
            self.error = Some(CANCEL_REASON_REQUIRED);
            return Err(CANCEL_REASON_REQUIRED);
        }
        self.error = None;
        Ok(vec![
            ("csrf_token".to_string(), csrf_token.to_string()),
            ("cancel_reason".to_string(), reason.to_string()),
        ])
    }
}

/// Timestamps without an offset are wall-clock time at the hospital.
pub fn parse_reference(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw.trim()) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive_as_utc = parse_timestamp(raw)?;
    Some(naive_as_utc - Duration::seconds(i64::from(sao_paulo().local_minus_utc())))
}

pub fn format_elapsed(reference: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let total = (now - reference).num_seconds();
    if total < 0 {
        return "0h 0m 0s".to_string();
    }
    format!("{}h {}m {}s", total / 3600, (total % 3600) / 60, total % 60)
}

/// Per-page state of the NIR board: toggles, alta forms and wizard sessions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NirBoard {
    pub observations: Vec<ObservationRecord>,
    pub discharges: Vec<DischargeRecord>,
    pub toggles: DetailToggleGroup,
    alta_forms: BTreeMap<String, AltaForm>,
    wizards: BTreeMap<String, WizardSession>,
    references: BTreeMap<String, DateTime<Utc>>,
}

impl NirBoard {
    pub fn new(data: NirBoardData) -> Self {
        let alta_forms = data.discharges.iter().map(|d| (d.id.clone(), AltaForm::new(d))).collect();
        let references = data
            .observations
            .iter()
            .filter_map(|o| Some((o.id.clone(), parse_reference(o.fa_datetime.as_deref()?)?)))
            .collect();
        Self {
            observations: data.observations,
            discharges: data.discharges,
            toggles: DetailToggleGroup::default(),
            alta_forms,
            wizards: BTreeMap::new(),
            references,
        }
    }

    /// Opening one row closes the others and discards their in-progress state.
    pub fn toggle(&mut self, id: DetailId) {
        for closed in self.toggles.toggle(id) {
            self.discard(&closed);
        }
    }

    /// Cancel button inside a detail panel.
    pub fn close(&mut self, id: &DetailId) {
        self.toggles.close(id);
        self.discard(id);
    }

    fn discard(&mut self, id: &DetailId) {
        match id.kind {
            DetailKind::Alta => {
                if let Some(form) = self.alta_forms.get_mut(&id.record_id) {
                    form.reset();
                }
            }
            DetailKind::Observation => {
                self.wizards.remove(&id.record_id);
            }
            DetailKind::Supplier => {}
        }
    }

    pub fn alta_form(&self, record_id: &str) -> Option<&AltaForm> {
        self.alta_forms.get(record_id)
    }

    pub fn alta_form_mut(&mut self, record_id: &str) -> Option<&mut AltaForm> {
        self.alta_forms.get_mut(record_id)
    }

    pub fn start_evolve(&mut self, record_id: &str, today: NaiveDate) {
        let name = self
            .observations
            .iter()
            .find(|o| o.id == record_id)
            .map(|o| o.patient_name.clone())
            .unwrap_or_default();
        self.wizards.insert(record_id.to_string(), WizardSession::new(record_id, &name, today));
    }

    pub fn wizard(&self, record_id: &str) -> Option<&WizardSession> {
        self.wizards.get(record_id)
    }

    pub fn wizard_mut(&mut self, record_id: &str) -> Option<&mut WizardSession> {
        self.wizards.get_mut(record_id)
    }

    pub fn elapsed(&self, record_id: &str, now: DateTime<Utc>) -> Option<String> {
        self.references.get(record_id).map(|reference| format_elapsed(*reference, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn field(name: &str, value: Option<&str>, required: bool) -> FieldSpec {
        FieldSpec {
            name: name.into(),
            label: name.into(),
            kind: FieldKind::Text,
            value: value.map(str::to_string),
            required,
            options: vec![],
        }
    }

    fn discharge(id: &str) -> DischargeRecord {
        DischargeRecord {
            id: id.into(),
            patient_name: "José".into(),
            admission_date: None,
            action: format!("/nir/alta/{}", id),
            fields: vec![
                field("discharge_date", Some("2024-05-17"), true),
                field("discharge_reason", None, true),
                FieldSpec { kind: FieldKind::Hidden, ..field("csrf_token", Some("abc"), false) },
            ],
        }
    }

    fn board() -> NirBoard {
        NirBoard::new(NirBoardData {
            observations: vec![ObservationRecord {
                id: "9".into(),
                patient_name: "Ana".into(),
                fa_datetime: Some("2024-05-17T10:00:00-03:00".into()),
                ..Default::default()
            }],
            discharges: vec![discharge("1"), discharge("2")],
        })
    }

    #[test]
    fn test_elapsed_formatting() {
        let now = Utc.with_ymd_and_hms(2024, 5, 17, 12, 0, 0).unwrap();
        let reference = now - Duration::seconds(3600 + 2 * 60 + 3);
        assert_eq!(format_elapsed(reference, now), "1h 2m 3s");
        assert_eq!(format_elapsed(now + Duration::seconds(5), now), "0h 0m 0s");
        assert_eq!(format_elapsed(now - Duration::hours(30), now), "30h 0m 0s");
    }

    #[test]
    fn test_naive_reference_is_hospital_time() {
        let parsed = parse_reference("2024-05-17 10:00:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 5, 17, 13, 0, 0).unwrap());
        assert!(parse_reference("ontem").is_none());

        let board = board();
        let now = Utc.with_ymd_and_hms(2024, 5, 17, 14, 30, 15).unwrap();
        assert_eq!(board.elapsed("9", now).as_deref(), Some("1h 30m 15s"));
    }

    #[test]
    fn test_toggle_is_mutually_exclusive_and_resets_closed_form() {
        let mut board = board();
        let a = DetailId::new(DetailKind::Alta, "1");
        let b = DetailId::new(DetailKind::Alta, "2");

        board.toggle(a.clone());
        board.alta_form_mut("1").unwrap().set_value("discharge_reason", "Melhora");
        assert_eq!(board.toggles.label(&a), "Ocultar painel");

        board.toggle(b.clone());
        assert!(!board.toggles.is_open(&a));
        assert!(board.toggles.is_open(&b));
        assert_eq!(board.toggles.label(&a), "Ver e gerenciar");
        assert_eq!(board.alta_form("1").unwrap().value("discharge_reason"), "");

        board.toggle(b.clone());
        assert!(!board.toggles.is_open(&b));
    }

    #[test]
    fn test_closing_observation_discards_wizard() {
        let mut board = board();
        let obs = DetailId::new(DetailKind::Observation, "9");
        board.toggle(obs.clone());
        assert_eq!(board.toggles.label(&obs), "Ocultar painel");
        board.start_evolve("9", NaiveDate::from_ymd_opt(2024, 5, 17).unwrap());
        assert_eq!(board.wizard("9").map(|w| w.patient_name.as_str()), Some("Ana"));

        board.close(&obs);
        assert!(board.wizard("9").is_none());
        assert_eq!(board.toggles.label(&obs), "Gerenciar Observação");
    }

    #[test]
    fn test_alta_validation_and_reset() {
        let mut form = AltaForm::new(&discharge("1"));
        form.set_value("discharge_date", "");
        assert_eq!(form.submit(), Err("discharge_date".to_string()));
        assert!(form.is_invalid("discharge_date"));
        assert!(form.is_invalid("discharge_reason"));
        assert!(!form.is_saving());

        form.set_value("csrf_token", "changed");
        form.reset();
        assert_eq!(form.value("discharge_date"), "2024-05-17");
        assert_eq!(form.value("csrf_token"), "changed");
        assert!(!form.is_invalid("discharge_date"));

        form.set_value("discharge_reason", "Alta médica");
        let posted = form.submit().unwrap();
        assert!(form.is_saving());
        assert!(posted.contains(&("discharge_reason".to_string(), "Alta médica".to_string())));
    }

    #[test]
    fn test_cancel_requires_reason() {
        let record = ObservationRecord { id: "9".into(), ..Default::default() };
        let mut form = CancelObservationForm::new(&record, &Endpoints::default()).unwrap();
        assert_eq!(form.action, "/nir/observacao/9/cancelar");
        form.reason = "   ".into();
        assert_eq!(form.submit("t"), Err(CANCEL_REASON_REQUIRED));
        assert_eq!(form.error, Some(CANCEL_REASON_REQUIRED));

        form.reason = "Paciente transferido".into();
        let fields = form.submit("t").unwrap();
        assert_eq!(fields[1].1, "Paciente transferido");
        assert!(form.error.is_none());
    }

    #[test]
    fn test_close_only_affects_the_open_row() {
        let mut group = DetailToggleGroup::default();
        let a = DetailId::new(DetailKind::Supplier, "1");
        let b = DetailId::new(DetailKind::Supplier, "2");
        group.toggle(a.clone());
        assert!(!group.close(&b));
        assert!(group.is_open(&a));
        assert!(group.close(&a));
        assert!(!group.is_open(&a));
        assert_eq!(group.label(&a), "Detalhes");
    }
}
