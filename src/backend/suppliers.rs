use crate::backend::config::{build_url, Endpoints};
use crate::backend::models::{AssignedEvaluator, Evaluator, SupplierSnapshot};
use std::collections::BTreeSet;

/// Values of the edit modal inputs, populated from the stats snapshot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EditForm {
    pub supplier_id: String,
    pub action: String,
    pub company_name: String,
    pub trade_name: String,
    pub cnpj: String,
    pub service_type: String,
    pub contact_name: String,
    pub phone: String,
    pub email: String,
    pub notes: String,
}

impl EditForm {
    pub fn from_snapshot(supplier_id: &str, snapshot: SupplierSnapshot, endpoints: &Endpoints) -> Self {
        Self {
            supplier_id: supplier_id.to_string(),
            action: build_url(&endpoints.edit, supplier_id).unwrap_or_default(),
            company_name: snapshot.company_name.unwrap_or_default(),
            trade_name: snapshot.trade_name.unwrap_or_default(),
            cnpj: snapshot.cnpj.unwrap_or_default(),
            service_type: snapshot.service_type.unwrap_or_default(),
            contact_name: snapshot.contact_name.unwrap_or_default(),
            phone: snapshot.phone.unwrap_or_default(),
            email: snapshot.email.unwrap_or_default(),
            notes: snapshot.notes.unwrap_or_default(),
        }
    }
}

/// Target of the deactivate confirmation; needs no fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct DeactivateTarget {
    pub supplier_name: String,
    pub action: String,
}

impl DeactivateTarget {
    pub fn new(supplier_id: &str, supplier_name: &str, endpoints: &Endpoints) -> Option<Self> {
        let action = build_url(&endpoints.deactivate, supplier_id)?;
        Some(Self { supplier_name: supplier_name.to_string(), action })
    }
}

/// Evaluator assignment checklist of the edit modal.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EvaluatorChecklist {
    evaluators: Vec<Evaluator>,
    checked: BTreeSet<String>,
    search: String,
}

impl EvaluatorChecklist {
    pub fn new(evaluators: Vec<Evaluator>) -> Self {
        Self { evaluators, checked: BTreeSet::new(), search: String::new() }
    }

    pub fn set_search(&mut self, term: &str) {
        self.search = term.to_lowercase();
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn is_shown(&self, evaluator: &Evaluator) -> bool {
        let term = &self.search;
        evaluator.name.to_lowercase().contains(term)
            || evaluator.username.to_lowercase().contains(term)
            || evaluator.job_title.to_lowercase().contains(term)
    }

    pub fn shown(&self) -> impl Iterator<Item = &Evaluator> {
        self.evaluators.iter().filter(|e| self.is_shown(e))
    }

    pub fn is_checked(&self, id: &str) -> bool {
        self.checked.contains(id)
    }

    pub fn set_checked(&mut self, id: &str, checked: bool) {
        if checked {
            self.checked.insert(id.to_string());
        } else {
            self.checked.remove(id);
        }
    }

    /// Checks every evaluator currently passing the search filter.
    pub fn select_all_shown(&mut self) {
        let ids: Vec<String> = self.shown().map(|e| e.id.clone()).collect();
        self.checked.extend(ids);
    }

    pub fn clear_all(&mut self) {
        self.checked.clear();
    }

    /// Replaces the checked set with the server-side assignment.
    pub fn assign(&mut self, assigned: &[AssignedEvaluator]) {
        self.checked = self
            .evaluators
            .iter()
            .filter(|e| assigned.iter().any(|a| a.id == e.id))
            .map(|e| e.id.clone())
            .collect();
    }

    pub fn selected_count(&self) -> usize {
        self.checked.len()
    }

    pub fn selected_ids(&self) -> impl Iterator<Item = &String> {
        self.checked.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluator(id: &str, name: &str, job: &str) -> Evaluator {
        Evaluator {
            id: id.into(),
            name: name.into(),
            username: name.to_lowercase().replace(' ', "."),
            job_title: job.into(),
        }
    }

    fn checklist() -> EvaluatorChecklist {
        EvaluatorChecklist::new(vec![
            evaluator("1", "Ana Souza", "Enfermeira"),
            evaluator("2", "Bruno Lima", "Gestor"),
            evaluator("3", "Carla Dias", "Enfermeira Chefe"),
        ])
    }

    #[test]
    fn test_select_all_only_touches_shown_evaluators() {
        let mut list = checklist();
        list.set_search("ENFERMEIRA");
        list.select_all_shown();
        assert_eq!(list.selected_count(), 2);
        assert!(list.is_checked("1"));
        assert!(!list.is_checked("2"));

        list.clear_all();
        assert_eq!(list.selected_count(), 0);
    }

    #[test]
    fn test_assign_prechecks_matching_ids() {
        let mut list = checklist();
        list.set_checked("1", true);
        let assigned: Vec<AssignedEvaluator> =
            serde_json::from_str(r#"[{"id": 2}, {"id": "3"}, {"id": 99}]"#).unwrap();
        list.assign(&assigned);
        let ids: Vec<_> = list.selected_ids().cloned().collect();
        assert_eq!(ids, vec!["2", "3"]);
    }

    #[test]
    fn test_edit_form_from_snapshot() {
        let snapshot: SupplierSnapshot = serde_json::from_str(
            r#"{"company_name": "Alfa LTDA", "cnpj": "12.345.678/0001-90", "notes": null}"#,
        )
        .unwrap();
        let form = EditForm::from_snapshot("5", snapshot, &Endpoints::default());
        assert_eq!(form.company_name, "Alfa LTDA");
        assert_eq!(form.notes, "");
        assert_eq!(form.action, "/feedback/suppliers/edit/5");
    }

    #[test]
    fn test_deactivate_target_requires_endpoint() {
        let endpoints = Endpoints { deactivate: String::new(), ..Endpoints::default() };
        assert!(DeactivateTarget::new("5", "Alfa", &endpoints).is_none());

        let target = DeactivateTarget::new("5", "Alfa", &Endpoints::default()).unwrap();
        assert_eq!(target.action, "/feedback/suppliers/delete/5");
        assert_eq!(target.supplier_name, "Alfa");
    }
}
