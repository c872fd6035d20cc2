//! Admission wizard driven from an observation record.
//!
//! The stage path is a pure function of the entry and admission types:
//! `basic -> [susfacil] -> [procedures -> clinical]`. Moving forward is gated by
//! the validator of the current stage; moving back never validates.

use crate::backend::procedures::{AddProcedureError, CidOptions, ProcedureList, ProcedureSearch};
use chrono::NaiveDate;
use std::collections::BTreeSet;

pub const ORIGINS: [(&str, &str); 6] = [
    ("Iturama", "Iturama"),
    ("São Francisco", "São Francisco"),
    ("União de Minas", "União de Minas"),
    ("Carneirinho", "Carneirinho"),
    ("Limeira do Oeste", "Limeira do Oeste"),
    ("Outro", "Outro..."),
];

pub const SPECIALTIES: [(&str, &str); 10] = [
    ("CIRURGIA GERAL", "Cirurgia Geral"),
    ("CLINICO GERAL", "Clínico Geral"),
    ("DENTISTA", "Dentista"),
    ("DERMATO", "Dermatologia"),
    ("OBSTETRICIA", "Obstetrícia"),
    ("OFTALMOLOGISTA", "Oftalmologia"),
    ("ORTOPEDISTA", "Ortopedia"),
    ("UROLOGISTA", "Urologia"),
    ("VASCULAR", "Vascular"),
    ("PEDIATRIA", "Pediatria"),
];

pub const FINISH_LABEL: &str = "Confirmar Internação";
pub const SUBMITTING_LABEL: &str = "Processando...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    Eletivo,
    Urgencia,
}

impl EntryType {
    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            "ELETIVO" => Some(EntryType::Eletivo),
            "URGENCIA" => Some(EntryType::Urgencia),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionType {
    Clinico,
    Cirurgico,
}

impl AdmissionType {
    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            "CLINICO" => Some(AdmissionType::Clinico),
            "CIRURGICO" => Some(AdmissionType::Cirurgico),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Basic,
    Susfacil,
    Procedures,
    Clinical,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Basic, Stage::Susfacil, Stage::Procedures, Stage::Clinical];

    pub fn title(&self) -> &'static str {
        match self {
            Stage::Basic => "Dados Básicos",
            Stage::Susfacil => "Aceite SUSFACIL",
            Stage::Procedures => "Procedimentos",
            Stage::Clinical => "Dados Clínicos",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Stage::Basic => "bi bi-file-earmark-text",
            Stage::Susfacil => "bi bi-shield-check",
            Stage::Procedures => "bi bi-activity",
            Stage::Clinical => "bi bi-heart-pulse",
        }
    }

    fn invalid_message(&self) -> &'static str {
        match self {
            Stage::Basic => "Preencha todos os campos obrigatórios da aba Dados Básicos!",
            Stage::Susfacil => "Confirme o aceite SUSFACIL e informe a data/hora!",
            Stage::Procedures => "Adicione pelo menos um procedimento!",
            Stage::Clinical => "Preencha todos os campos obrigatórios da aba Dados Clínicos!",
        }
    }
}

pub fn stage_path(entry: Option<EntryType>, admission: Option<AdmissionType>) -> Vec<Stage> {
    let mut path = vec![Stage::Basic];
    if entry == Some(EntryType::Eletivo) {
        path.push(Stage::Susfacil);
    }
    if admission == Some(AdmissionType::Clinico) {
        path.push(Stage::Procedures);
        path.push(Stage::Clinical);
    }
    path
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    AdmissionDate,
    EntryType,
    AdmissionType,
    Origin,
    SchedulingDate,
    SusfacilAccepted,
    SusfacilDatetime,
    Procedures,
    ResponsibleDoctor,
    Specialty,
    MainCid,
}

/// Transient error shown above the tabs; `seq` lets the dismiss timer skip newer banners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub seq: u64,
    pub stage: Stage,
    pub message: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Blocked,
    Moved(Stage),
    Submit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WizardSession {
    pub record_id: String,
    pub patient_name: String,
    pub admission_date: String,
    entry_type: String,
    admission_type: String,
    pub origin: String,
    pub scheduling_date: String,
    susfacil_accepted: bool,
    pub susfacil_datetime: String,
    procedures: ProcedureList,
    pub search: ProcedureSearch,
    pub main_cid: String,
    pub responsible_doctor: String,
    pub specialty: String,
    pub palliative: bool,
    stage: Stage,
    completed: BTreeSet<Stage>,
    invalid: BTreeSet<Field>,
    banner: Option<Banner>,
    banner_seq: u64,
    submitted: bool,
}

impl WizardSession {
    pub fn new(record_id: &str, patient_name: &str, today: NaiveDate) -> Self {
        Self {
            record_id: record_id.to_string(),
            patient_name: patient_name.to_string(),
            admission_date: today.format("%Y-%m-%d").to_string(),
            entry_type: String::new(),
            admission_type: String::new(),
            origin: ORIGINS[0].0.to_string(),
            scheduling_date: String::new(),
            susfacil_accepted: false,
            susfacil_datetime: String::new(),
            procedures: ProcedureList::default(),
            search: ProcedureSearch::default(),
            main_cid: String::new(),
            responsible_doctor: String::new(),
            specialty: String::new(),
            palliative: false,
            stage: Stage::Basic,
            completed: BTreeSet::new(),
            invalid: BTreeSet::new(),
            banner: None,
            banner_seq: 0,
            submitted: false,
        }
    }

    pub fn entry_type(&self) -> &str {
        &self.entry_type
    }

    pub fn admission_type(&self) -> &str {
        &self.admission_type
    }

    pub fn set_entry_type(&mut self, value: &str) {
        self.entry_type = value.to_string();
        self.realign_stage();
    }

    pub fn set_admission_type(&mut self, value: &str) {
        self.admission_type = value.to_string();
        self.realign_stage();
    }

    fn realign_stage(&mut self) {
        if !self.path().contains(&self.stage) {
            self.stage = Stage::Basic;
        }
    }

    pub fn path(&self) -> Vec<Stage> {
        stage_path(
            EntryType::from_value(&self.entry_type),
            AdmissionType::from_value(&self.admission_type),
        )
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn is_last_stage(&self) -> bool {
        self.path().last() == Some(&self.stage)
    }

    pub fn is_completed(&self, stage: Stage) -> bool {
        self.completed.contains(&stage)
    }

    /// Clinical inputs are required only for clinical admissions.
    pub fn clinical_required(&self) -> bool {
        AdmissionType::from_value(&self.admission_type) == Some(AdmissionType::Clinico)
    }

    pub fn susfacil_accepted(&self) -> bool {
        self.susfacil_accepted
    }

    /// Unchecking hides and clears the acceptance datetime.
    pub fn set_susfacil_accepted(&mut self, accepted: bool) {
        self.susfacil_accepted = accepted;
        if !accepted {
            self.susfacil_datetime.clear();
        }
    }

    pub fn procedures(&self) -> &ProcedureList {
        &self.procedures
    }

    pub fn cid_options(&self) -> CidOptions {
        self.procedures.cid_options()
    }

    pub fn add_selected_procedure(&mut self) -> Result<(), AddProcedureError> {
        self.procedures.add(self.search.selected())?;
        self.search.clear();
        self.invalid.remove(&Field::Procedures);
        self.sync_main_cid();
        Ok(())
    }

    pub fn remove_procedure(&mut self, index: usize) {
        self.procedures.remove(index);
        self.sync_main_cid();
    }

    fn sync_main_cid(&mut self) {
        if !self.cid_options().contains(&self.main_cid) {
            self.main_cid.clear();
        }
    }

    pub fn is_invalid(&self, field: Field) -> bool {
        self.invalid.contains(&field)
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn dismiss_banner(&mut self, seq: u64) {
        if self.banner.as_ref().is_some_and(|b| b.seq == seq) {
            self.banner = None;
            self.invalid.remove(&Field::Procedures);
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Re-enables the footer after a submission that never left the page.
    pub fn submit_failed(&mut self) {
        self.submitted = false;
    }

    pub fn finish_label(&self) -> &'static str {
        if self.submitted {
            SUBMITTING_LABEL
        } else {
            FINISH_LABEL
        }
    }

    /// Fields of `stage` that are currently empty.
    pub fn missing_fields(&self, stage: Stage) -> Vec<Field> {
        let blank = |v: &str| v.trim().is_empty();
        let checks: Vec<(Field, bool)> = match stage {
            Stage::Basic => vec![
                (Field::AdmissionDate, blank(&self.admission_date)),
                (Field::EntryType, blank(&self.entry_type)),
                (Field::AdmissionType, blank(&self.admission_type)),
                (Field::Origin, blank(&self.origin)),
                (Field::SchedulingDate, blank(&self.scheduling_date)),
            ],
            Stage::Susfacil => vec![
                (Field::SusfacilAccepted, !self.susfacil_accepted),
                (Field::SusfacilDatetime, blank(&self.susfacil_datetime)),
            ],
            Stage::Procedures => vec![(Field::Procedures, self.procedures.is_empty())],
            Stage::Clinical => vec![
                (Field::ResponsibleDoctor, blank(&self.responsible_doctor)),
                (Field::Specialty, blank(&self.specialty)),
                (Field::MainCid, blank(&self.main_cid)),
            ],
        };
        checks.into_iter().filter(|(_, missing)| *missing).map(|(f, _)| f).collect()
    }

    /// Marks invalid fields and raises the banner; no stage change happens here.
    pub fn validate(&mut self, stage: Stage) -> bool {
        let missing = self.missing_fields(stage);
        for field in self.stage_fields(stage) {
            self.invalid.remove(&field);
        }
        if missing.is_empty() {
            return true;
        }
        self.invalid.extend(missing);
        self.banner_seq += 1;
        self.banner = Some(Banner { seq: self.banner_seq, stage, message: stage.invalid_message() });
        false
    }

    fn stage_fields(&self, stage: Stage) -> Vec<Field> {
        match stage {
            Stage::Basic => vec![
                Field::AdmissionDate,
                Field::EntryType,
                Field::AdmissionType,
                Field::Origin,
                Field::SchedulingDate,
            ],
            Stage::Susfacil => vec![Field::SusfacilAccepted, Field::SusfacilDatetime],
            Stage::Procedures => vec![Field::Procedures],
            Stage::Clinical => vec![Field::ResponsibleDoctor, Field::Specialty, Field::MainCid],
        }
    }

    /// "Next": validates the current stage, then moves along the path or submits at its end.
    pub fn next(&mut self) -> Step {
        if self.submitted || !self.validate(self.stage) {
            return Step::Blocked;
        }
        self.completed.insert(self.stage);
        let path = self.path();
        let following = path
            .iter()
            .position(|s| *s == self.stage)
            .and_then(|i| path.get(i + 1))
            .copied();
        match following {
            Some(stage) => {
                self.stage = stage;
                Step::Moved(stage)
            }
            None => {
                self.submitted = true;
                Step::Submit
            }
        }
    }

    /// "Confirmar Internação" on the last stage of the path.
    pub fn finish(&mut self) -> Step {
        if !self.is_last_stage() {
            return Step::Blocked;
        }
        self.next()
    }

    pub fn previous(&mut self) -> Option<Stage> {
        let path = self.path();
        let index = path.iter().position(|s| *s == self.stage)?;
        let stage = *path.get(index.checked_sub(1)?)?;
        self.stage = stage;
        Some(stage)
    }

    /// Tab header click; only stages whose predecessors on the path are completed.
    pub fn select_stage(&mut self, stage: Stage) -> bool {
        let path = self.path();
        let Some(index) = path.iter().position(|s| *s == stage) else {
            return false;
        };
        if path[..index].iter().all(|s| self.completed.contains(s)) {
            self.stage = stage;
            true
        } else {
            false
        }
    }

    /// Name/value pairs posted to the evolve endpoint.
    pub fn form_fields(&self, csrf_token: &str) -> Vec<(String, String)> {
        let mut fields: Vec<(String, String)> = vec![
            ("csrf_token".into(), csrf_token.to_string()),
            ("admission_date".into(), self.admission_date.clone()),
            ("entry_type".into(), self.entry_type.clone()),
            ("admission_type".into(), self.admission_type.clone()),
            ("admitted_from_origin".into(), self.origin.clone()),
            ("scheduling_date".into(), self.scheduling_date.clone()),
        ];
        if self.susfacil_accepted {
            fields.push(("susfacil_accepted".into(), "on".into()));
        }
        fields.push(("susfacil_accept_datetime".into(), self.susfacil_datetime.clone()));
        for procedure in self.procedures.items() {
            fields.push(("procedure_codes[]".into(), procedure.code.clone()));
            fields.push(("procedure_descriptions[]".into(), procedure.description.clone()));
        }
        if self.palliative {
            fields.push(("is_palliative".into(), "on".into()));
        }
        fields.push(("responsible_doctor".into(), self.responsible_doctor.clone()));
        fields.push(("surgical_specialty".into(), self.specialty.clone()));
        fields.push(("main_cid".into(), self.main_cid.clone()));
        fields
    }
}
