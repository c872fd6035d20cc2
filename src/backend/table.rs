use crate::backend::models::SupplierRow;
use crate::backend::nir::{DetailId, DetailKind, DetailToggleGroup};
use std::cmp::Ordering;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Only(String),
}

impl StatusFilter {
    pub fn from_value(value: &str) -> Self {
        match value {
            "" | "all" => StatusFilter::All,
            other => StatusFilter::Only(other.to_string()),
        }
    }

    pub fn value(&self) -> &str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Only(status) => status,
        }
    }
}

/// Score buckets. Boundaries are half-open: 80 is excellent, 60 is good.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreFilter {
    All,
    Excellent,
    Good,
    Poor,
    NotEvaluated,
}

impl ScoreFilter {
    pub const OPTIONS: [(ScoreFilter, &'static str); 5] = [
        (ScoreFilter::All, "Todas as pontuações"),
        (ScoreFilter::Excellent, "Excelente (≥ 80%)"),
        (ScoreFilter::Good, "Bom (60% - 79%)"),
        (ScoreFilter::Poor, "Ruim (< 60%)"),
        (ScoreFilter::NotEvaluated, "Não avaliado"),
    ];

    pub fn from_value(value: &str) -> Self {
        match value {
            "excellent" => ScoreFilter::Excellent,
            "good" => ScoreFilter::Good,
            "poor" => ScoreFilter::Poor,
            "not_evaluated" => ScoreFilter::NotEvaluated,
            _ => ScoreFilter::All,
        }
    }

    pub fn value(self) -> &'static str {
        match self {
            ScoreFilter::All => "all",
            ScoreFilter::Excellent => "excellent",
            ScoreFilter::Good => "good",
            ScoreFilter::Poor => "poor",
            ScoreFilter::NotEvaluated => "not_evaluated",
        }
    }

    pub fn accepts(self, score: f64) -> bool {
        match self {
            ScoreFilter::All => true,
            ScoreFilter::Excellent => score >= 80.0,
            ScoreFilter::Good => (60.0..80.0).contains(&score),
            ScoreFilter::Poor => score < 60.0,
            ScoreFilter::NotEvaluated => score == 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Name,
    ScoreDesc,
    ScoreAsc,
    Evaluations,
    /// Keeps the current order
    Recent,
}

impl SortKey {
    pub const OPTIONS: [(SortKey, &'static str); 5] = [
        (SortKey::Name, "Nome (A-Z)"),
        (SortKey::ScoreDesc, "Maior pontuação"),
        (SortKey::ScoreAsc, "Menor pontuação"),
        (SortKey::Evaluations, "Mais avaliações"),
        (SortKey::Recent, "Mais recentes"),
    ];

    pub fn from_value(value: &str) -> Self {
        match value {
            "score-desc" => SortKey::ScoreDesc,
            "score-asc" => SortKey::ScoreAsc,
            "evaluations" => SortKey::Evaluations,
            "recent" => SortKey::Recent,
            _ => SortKey::Name,
        }
    }

    pub fn value(self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::ScoreDesc => "score-desc",
            SortKey::ScoreAsc => "score-asc",
            SortKey::Evaluations => "evaluations",
            SortKey::Recent => "recent",
        }
    }

    pub fn compare(self, a: &SupplierRow, b: &SupplierRow) -> Ordering {
        match self {
            SortKey::Name => collate(&a.name, &b.name),
            SortKey::ScoreDesc => b.score.total_cmp(&a.score),
            SortKey::ScoreAsc => a.score.total_cmp(&b.score),
            SortKey::Evaluations => b.evaluations.cmp(&a.evaluations),
            SortKey::Recent => Ordering::Equal,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    pub search_term: String,
    pub status: StatusFilter,
    pub score: ScoreFilter,
    pub sort: SortKey,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            status: StatusFilter::All,
            score: ScoreFilter::All,
            sort: SortKey::Name,
        }
    }
}

impl FilterCriteria {
    /// Builds the criteria from raw form control values.
    pub fn from_controls(search: &str, status: &str, score: &str, sort: &str) -> Self {
        Self {
            search_term: search.trim().to_lowercase(),
            status: StatusFilter::from_value(status),
            score: ScoreFilter::from_value(score),
            sort: SortKey::from_value(sort),
        }
    }

    pub fn matches(&self, row: &SupplierRow) -> bool {
        if !self.search_term.is_empty() {
            let haystack = format!("{} {} {}", row.name, row.service, row.contact).to_lowercase();
            if !haystack.contains(&self.search_term) {
                return false;
            }
        }

        if let StatusFilter::Only(status) = &self.status {
            if *status != row.status {
                return false;
            }
        }

        self.score.accepts(row.score)
    }
}

/// Case- and accent-insensitive comparison, ties broken by the raw text.
pub fn collate(a: &str, b: &str) -> Ordering {
    fold(a).cmp(&fold(b)).then_with(|| a.cmp(b))
}

fn fold(value: &str) -> String {
    value
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

/// In-memory view-model of the suppliers table.
///
/// `apply` reorders `rows` in place: hidden rows keep their relative order,
/// visible rows are moved behind them in sorted order. A later pass-through
/// sort therefore keeps whatever order the previous sort produced. Detail
/// panels are looked up by supplier id, never by position.
#[derive(Debug, Clone, PartialEq)]
pub struct SupplierTable {
    rows: Vec<SupplierRow>,
    visible: HashSet<String>,
    configured_total: usize,
}

impl SupplierTable {
    pub fn new(rows: Vec<SupplierRow>, configured_total: usize) -> Self {
        let visible = rows.iter().map(|r| r.id.clone()).collect();
        Self { rows, visible, configured_total }
    }

    /// Applies the criteria and returns the visible count.
    pub fn apply(&mut self, criteria: &FilterCriteria) -> usize {
        let (mut shown, hidden): (Vec<SupplierRow>, Vec<SupplierRow>) =
            self.rows.drain(..).partition(|row| criteria.matches(row));
        shown.sort_by(|a, b| criteria.sort.compare(a, b));

        self.visible = shown.iter().map(|r| r.id.clone()).collect();
        self.rows = hidden;
        self.rows.extend(shown);
        self.visible.len()
    }

    pub fn rows(&self) -> &[SupplierRow] {
        &self.rows
    }

    #[cfg(test)]
    pub fn row(&self, id: &str) -> Option<&SupplierRow> {
        self.rows.iter().find(|r| r.id == id)
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.visible.contains(id)
    }

    pub fn visible_rows(&self) -> impl Iterator<Item = &SupplierRow> {
        self.rows.iter().filter(|r| self.is_visible(&r.id))
    }

    /// Visible rows in display order, each open detail row right under its supplier.
    pub fn lines<'a>(&'a self, details: &DetailToggleGroup) -> Vec<TableLine<'a>> {
        let mut lines = Vec::new();
        for row in self.visible_rows() {
            lines.push(TableLine::Supplier(row));
            if details.is_open(&DetailId::new(DetailKind::Supplier, &row.id)) {
                lines.push(TableLine::Detail(row));
            }
        }
        lines
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total(&self) -> usize {
        if self.configured_total > 0 {
            self.configured_total
        } else {
            self.rows.len()
        }
    }

    pub fn results_label(&self) -> String {
        format!("Mostrando {} de {} fornecedores", self.visible_count(), self.total())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TableLine<'a> {
    Supplier(&'a SupplierRow),
    Detail(&'a SupplierRow),
}

/// Sort options of the dashboard ranking table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingSort {
    /// Priority ascending (unranked last), ties by score descending
    Priority,
    ScoreAsc,
    Name,
}

impl RankingSort {
    pub fn from_value(value: &str) -> Self {
        match value {
            "desc" => RankingSort::Priority,
            "asc" => RankingSort::ScoreAsc,
            _ => RankingSort::Name,
        }
    }

    pub fn value(self) -> &'static str {
        match self {
            RankingSort::Priority => "desc",
            RankingSort::ScoreAsc => "asc",
            RankingSort::Name => "name",
        }
    }
}

pub fn rank_suppliers(rows: &mut [SupplierRow], sort: RankingSort) {
    rows.sort_by(|a, b| match sort {
        RankingSort::Priority => {
            let pa = a.priority.filter(|p| *p > 0).unwrap_or(999);
            let pb = b.priority.filter(|p| *p > 0).unwrap_or(999);
            pa.cmp(&pb).then_with(|| b.score.total_cmp(&a.score))
        }
        RankingSort::ScoreAsc => a.score.total_cmp(&b.score),
        RankingSort::Name => collate(&a.name, &b.name),
    });
}
