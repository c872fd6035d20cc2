use crate::backend::models::{Cid, ProcedureHit};
use std::fmt;

/// Minimum query length for the admission wizard search.
pub const WIZARD_MIN_QUERY: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddProcedureError {
    NotSelected,
    Duplicate,
}

impl fmt::Display for AddProcedureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddProcedureError::NotSelected => write!(
                f,
                "Por favor, selecione um procedimento da lista de busca antes de adicionar."
            ),
            AddProcedureError::Duplicate => write!(f, "Este procedimento já foi adicionado."),
        }
    }
}

/// Options of the main CID select, always derived from the first procedure.
#[derive(Debug, Clone, PartialEq)]
pub enum CidOptions {
    NeedsProcedure,
    NoneAvailable,
    Choose(Vec<Cid>),
}

impl CidOptions {
    pub fn placeholder(&self) -> &'static str {
        match self {
            CidOptions::NeedsProcedure => "Adicione um procedimento primeiro",
            CidOptions::NoneAvailable => "Nenhum CID disponível para o procedimento principal",
            CidOptions::Choose(_) => "Selecione o CID principal",
        }
    }

    pub fn cids(&self) -> &[Cid] {
        match self {
            CidOptions::Choose(cids) => cids,
            _ => &[],
        }
    }

    pub fn contains(&self, code: &str) -> bool {
        self.cids().iter().any(|c| c.code == code)
    }
}

/// Ordered list of added procedures; the first one is the main procedure.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProcedureList {
    items: Vec<ProcedureHit>,
}

impl ProcedureList {
    pub fn new(items: Vec<ProcedureHit>) -> Self {
        Self { items }
    }

    pub fn add(&mut self, selected: Option<&ProcedureHit>) -> Result<(), AddProcedureError> {
        let selected = selected.ok_or(AddProcedureError::NotSelected)?;
        if self.contains(&selected.code) {
            return Err(AddProcedureError::Duplicate);
        }
        self.items.push(selected.clone());
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Option<ProcedureHit> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.items.iter().any(|p| p.code == code)
    }

    pub fn main(&self) -> Option<&ProcedureHit> {
        self.items.first()
    }

    pub fn items(&self) -> &[ProcedureHit] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn cid_options(&self) -> CidOptions {
        match self.main() {
            None => CidOptions::NeedsProcedure,
            Some(main) if main.cids.is_empty() => CidOptions::NoneAvailable,
            Some(main) => CidOptions::Choose(main.cids.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchResults {
    Hidden,
    Found(Vec<ProcedureHit>),
    NoMatch,
    Failed,
}

/// Search-as-you-type state of the wizard procedure field.
///
/// Every keystroke bumps `generation`; a debounced request only goes out if
/// its generation is still current when the timer fires, and results for a
/// query other than the current one are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureSearch {
    query: String,
    selected: Option<ProcedureHit>,
    results: SearchResults,
    generation: u64,
}

impl Default for ProcedureSearch {
    fn default() -> Self {
        Self { query: String::new(), selected: None, results: SearchResults::Hidden, generation: 0 }
    }
}

impl ProcedureSearch {
    /// Records the raw input; returns the generation and query to schedule, if any.
    pub fn on_input(&mut self, raw: &str) -> Option<(u64, String)> {
        let query = raw.trim().to_string();
        self.generation += 1;
        if self.selected.as_ref().is_some_and(|s| s.code != query) {
            self.selected = None;
        }
        self.query = raw.to_string();
        if query.chars().count() < WIZARD_MIN_QUERY {
            self.results = SearchResults::Hidden;
            return None;
        }
        Some((self.generation, query))
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    pub fn apply_results(&mut self, query: &str, result: Result<Vec<ProcedureHit>, String>) {
        if self.query.trim() != query {
            return;
        }
        self.results = match result {
            Ok(hits) if hits.is_empty() => SearchResults::NoMatch,
            Ok(hits) => SearchResults::Found(hits),
            Err(_) => SearchResults::Failed,
        };
    }

    /// Picks a search result; the description becomes read-only with its value.
    pub fn select(&mut self, index: usize) {
        if let SearchResults::Found(hits) = &self.results {
            if let Some(hit) = hits.get(index) {
                self.query = hit.code.clone();
                self.selected = Some(hit.clone());
                self.results = SearchResults::Hidden;
            }
        }
    }

    pub fn dismiss(&mut self) {
        self.results = SearchResults::Hidden;
    }

    pub fn clear(&mut self) {
        self.generation += 1;
        self.query.clear();
        self.selected = None;
        self.results = SearchResults::Hidden;
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn selected(&self) -> Option<&ProcedureHit> {
        self.selected.as_ref()
    }

    pub fn description(&self) -> &str {
        self.selected.as_ref().map(|s| s.description.as_str()).unwrap_or("")
    }

    pub fn results(&self) -> &SearchResults {
        &self.results
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerKey {
    Down,
    Up,
    Enter,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogAddError {
    ReadOnly,
    Incomplete,
    Duplicate,
}

/// Autocomplete over the procedure catalog used by the admission form.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogPicker {
    procedures: ProcedureList,
    can_edit: bool,
    code: String,
    description: String,
    selected_code: String,
    suggestions: Vec<ProcedureHit>,
    open: bool,
    highlight: Option<usize>,
    last_query: String,
    invalid: bool,
}

impl CatalogPicker {
    pub fn new(existing: Vec<ProcedureHit>, can_edit: bool) -> Self {
        Self {
            procedures: ProcedureList::new(existing),
            can_edit,
            code: String::new(),
            description: String::new(),
            selected_code: String::new(),
            suggestions: Vec::new(),
            open: false,
            highlight: None,
            last_query: String::new(),
            invalid: false,
        }
    }

    pub fn on_input(&mut self, raw: &str) {
        self.code = raw.to_string();
        let value = raw.trim();
        if value.is_empty() || (!self.selected_code.is_empty() && value != self.selected_code) {
            self.description.clear();
            self.selected_code.clear();
        }
    }

    /// Called once the debounce settles; returns the query to send, if any.
    pub fn begin_fetch(&mut self) -> Option<String> {
        let query = self.code.trim().to_string();
        if query.is_empty() {
            self.close();
            return None;
        }
        if query == self.last_query {
            return None;
        }
        self.last_query = query.clone();
        Some(query)
    }

    pub fn set_suggestions(&mut self, hits: Vec<ProcedureHit>) {
        self.suggestions = hits;
        self.highlight = None;
        self.open = !self.suggestions.is_empty();
    }

    /// Returns `true` when the key was consumed by the open list.
    pub fn on_key(&mut self, key: PickerKey) -> bool {
        if !self.open || self.suggestions.is_empty() {
            return false;
        }
        let max = self.suggestions.len() - 1;
        match key {
            PickerKey::Down => {
                self.highlight = Some(match self.highlight {
                    Some(i) if i < max => i + 1,
                    Some(_) => 0,
                    None => 0,
                });
                true
            }
            PickerKey::Up => {
                self.highlight = Some(match self.highlight {
                    Some(i) if i > 0 => i - 1,
                    _ => max,
                });
                true
            }
            PickerKey::Enter => match self.highlight {
                Some(i) => {
                    self.select(i);
                    true
                }
                None => false,
            },
            PickerKey::Escape => {
                self.close();
                false
            }
        }
    }

    pub fn select(&mut self, index: usize) {
        if let Some(hit) = self.suggestions.get(index).cloned() {
            self.code = hit.code.clone();
            self.description = hit.description;
            self.selected_code = hit.code;
            self.close();
        }
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn add_current(&mut self) -> Result<(), CatalogAddError> {
        if !self.can_edit {
            return Err(CatalogAddError::ReadOnly);
        }
        let code = self.code.trim().to_string();
        let description = self.description.trim().to_string();
        if code.is_empty() || description.is_empty() {
            return Err(CatalogAddError::Incomplete);
        }
        if self.procedures.contains(&code) {
            self.invalid = true;
            return Err(CatalogAddError::Duplicate);
        }
        let hit = ProcedureHit { code, description, cids: Vec::new() };
        self.procedures.add(Some(&hit)).map_err(|_| CatalogAddError::Duplicate)?;
        self.code.clear();
        self.description.clear();
        self.selected_code.clear();
        Ok(())
    }

    pub fn remove(&mut self, index: usize) {
        if self.can_edit {
            self.procedures.remove(index);
        }
    }

    pub fn clear_invalid(&mut self) {
        self.invalid = false;
    }

    /// Values for the legacy single-procedure fields, taken from the first entry.
    pub fn legacy_fields(&self) -> Option<(&str, &str)> {
        self.procedures.main().map(|p| (p.code.as_str(), p.description.as_str()))
    }

    pub fn procedures(&self) -> &[ProcedureHit] {
        self.procedures.items()
    }

    pub fn can_edit(&self) -> bool {
        self.can_edit
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn suggestions(&self) -> &[ProcedureHit] {
        &self.suggestions
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn highlight(&self) -> Option<usize> {
        self.highlight
    }

    pub fn is_invalid(&self) -> bool {
        self.invalid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(code: &str, cids: &[&str]) -> ProcedureHit {
        ProcedureHit {
            code: code.to_string(),
            description: format!("Procedimento {}", code),
            cids: cids
                .iter()
                .map(|c| Cid { code: c.to_string(), description: format!("CID {}", c) })
                .collect(),
        }
    }

    #[test]
    fn test_duplicate_and_unselected_adds_are_rejected() {
        let mut list = ProcedureList::default();
        assert_eq!(list.add(None), Err(AddProcedureError::NotSelected));
        list.add(Some(&hit("0303", &["A00"]))).unwrap();
        assert_eq!(list.add(Some(&hit("0303", &[]))), Err(AddProcedureError::Duplicate));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_removing_main_promotes_second_and_regenerates_cids() {
        let mut list = ProcedureList::default();
        list.add(Some(&hit("0101", &["A01", "A02"]))).unwrap();
        list.add(Some(&hit("0202", &["B10"]))).unwrap();
        assert_eq!(list.cid_options().cids().len(), 2);

        list.remove(0);
        assert_eq!(list.main().map(|p| p.code.as_str()), Some("0202"));
        let options = list.cid_options();
        let codes: Vec<_> = options.cids().iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["B10"]);
        assert!(!options.contains("A01"));

        list.remove(0);
        assert_eq!(list.cid_options(), CidOptions::NeedsProcedure);
        assert_eq!(list.cid_options().placeholder(), "Adicione um procedimento primeiro");
        assert!(list.remove(3).is_none());
    }

    #[test]
    fn test_main_without_cids() {
        let mut list = ProcedureList::default();
        list.add(Some(&hit("0404", &[]))).unwrap();
        assert_eq!(list.cid_options(), CidOptions::NoneAvailable);
    }

    #[test]
    fn test_search_generations_and_selection_lock() {
        let mut search = ProcedureSearch::default();
        assert_eq!(search.on_input("0"), None);

        let (first, _) = search.on_input("04").unwrap();
        let (second, query) = search.on_input("040").unwrap();
        assert!(!search.is_current(first));
        assert!(search.is_current(second));

        // stale answer for "04" is ignored
        search.apply_results("04", Ok(vec![hit("0401", &[])]));
        assert_eq!(search.results(), &SearchResults::Hidden);

        search.apply_results(&query, Ok(vec![hit("0401", &[]), hit("0402", &[])]));
        search.select(1);
        assert_eq!(search.query(), "0402");
        assert_eq!(search.description(), "Procedimento 0402");

        // editing away from the selected code unlocks and clears the description
        search.on_input("040");
        assert!(search.selected().is_none());
        assert_eq!(search.description(), "");
    }

    #[test]
    fn test_search_empty_and_failed_states() {
        let mut search = ProcedureSearch::default();
        search.on_input("zz");
        search.apply_results("zz", Ok(vec![]));
        assert_eq!(search.results(), &SearchResults::NoMatch);
        search.apply_results("zz", Err("Erro 500".into()));
        assert_eq!(search.results(), &SearchResults::Failed);
    }

    #[test]
    fn test_catalog_keyboard_navigation_wraps() {
        let mut picker = CatalogPicker::new(vec![], true);
        picker.on_input("03");
        assert_eq!(picker.begin_fetch().as_deref(), Some("03"));
        assert_eq!(picker.begin_fetch(), None);

        picker.set_suggestions(vec![hit("0301", &[]), hit("0302", &[]), hit("0303", &[])]);
        assert!(picker.on_key(PickerKey::Up));
        assert_eq!(picker.highlight(), Some(2));
        assert!(picker.on_key(PickerKey::Down));
        assert_eq!(picker.highlight(), Some(0));
        assert!(picker.on_key(PickerKey::Down));
        assert!(picker.on_key(PickerKey::Enter));
        assert_eq!(picker.code(), "0302");
        assert_eq!(picker.description(), "Procedimento 0302");
        assert!(!picker.is_open());
        assert!(!picker.on_key(PickerKey::Down));
    }

    #[test]
    fn test_catalog_add_rules() {
        let mut picker = CatalogPicker::new(vec![hit("0301", &[])], true);
        picker.on_input("0301");
        assert_eq!(picker.add_current(), Err(CatalogAddError::Incomplete));

        picker.set_suggestions(vec![hit("0301", &[]), hit("0302", &[])]);
        picker.select(0);
        assert_eq!(picker.add_current(), Err(CatalogAddError::Duplicate));
        assert!(picker.is_invalid());

        picker.select(1);
        picker.add_current().unwrap();
        assert_eq!(picker.procedures().len(), 2);
        assert_eq!(picker.code(), "");
        assert_eq!(picker.legacy_fields(), Some(("0301", "Procedimento 0301")));

        let mut read_only = CatalogPicker::new(vec![hit("0301", &[])], false);
        read_only.remove(0);
        assert_eq!(read_only.procedures().len(), 1);
        assert_eq!(read_only.add_current(), Err(CatalogAddError::ReadOnly));
    }
}
