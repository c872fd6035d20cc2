use crate::backend::models::{CategoryDistribution, DonutSegment, EvaluationSeries};

pub const NO_CHART_DATA: &str = "Não há dados de avaliação suficientes para exibir o gráfico.";
pub const CHART_SERIES_LABEL: &str = "Minha Pontuação";
pub const CHART_MAX: f64 = 10.0;
const TOOLTIP_LIMIT: usize = 10;

/// Employee score chart, oldest evaluation first.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartModel {
    pub labels: Vec<String>,
    pub scores: Vec<f64>,
}

impl ChartModel {
    /// The server sends newest first; `None` when there is nothing to plot.
    pub fn from_series(series: EvaluationSeries) -> Option<Self> {
        if series.labels.is_empty() {
            return None;
        }
        let mut labels = series.labels;
        let mut scores = series.scores;
        labels.reverse();
        scores.reverse();
        Some(Self { labels, scores })
    }

    /// SVG polyline coordinates inside a `width` x `height` plot area.
    pub fn points(&self, width: f64, height: f64) -> Vec<(f64, f64)> {
        let steps = (self.scores.len().saturating_sub(1)).max(1) as f64;
        self.scores
            .iter()
            .enumerate()
            .map(|(i, score)| {
                let x = i as f64 / steps * width;
                let y = height - (score.clamp(0.0, CHART_MAX) / CHART_MAX * height);
                (x, y)
            })
            .collect()
    }
}

pub fn tooltip_label(score: f64) -> String {
    format!("{}: {:.1} / 10", CHART_SERIES_LABEL, score)
}

#[derive(Debug, Clone, PartialEq)]
pub struct TooltipEntry {
    pub name: String,
    /// Rendered only for evaluated suppliers
    pub score: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DonutTooltip {
    pub title: String,
    pub color: String,
    pub entries: Vec<TooltipEntry>,
    pub overflow: Option<String>,
}

impl DonutTooltip {
    /// `None` hides the tooltip (unknown or empty category).
    pub fn for_segment(distribution: &CategoryDistribution, segment: &DonutSegment) -> Option<Self> {
        let suppliers = distribution.get(&segment.category).filter(|s| !s.is_empty())?;
        let entries = suppliers
            .iter()
            .take(TOOLTIP_LIMIT)
            .map(|s| TooltipEntry {
                name: s.name.clone(),
                score: (s.score > 0.0).then(|| format!("{}%", s.score)),
            })
            .collect();
        let overflow = (suppliers.len() > TOOLTIP_LIMIT)
            .then(|| format!("+{} fornecedor(es)...", suppliers.len() - TOOLTIP_LIMIT));
        let color = if segment.color.is_empty() { "#333".to_string() } else { segment.color.clone() };
        Some(Self { title: segment.label.clone(), color, entries, overflow })
    }
}

/// One ring segment drawn with `stroke-dasharray` on a circle of `circumference`.
#[derive(Debug, Clone, PartialEq)]
pub struct DonutArc {
    pub segment: DonutSegment,
    pub length: f64,
    pub offset: f64,
}

pub fn donut_arcs(segments: &[DonutSegment], circumference: f64) -> Vec<DonutArc> {
    let total: usize = segments.iter().map(|s| s.count).sum();
    if total == 0 {
        return Vec::new();
    }
    let mut consumed = 0.0;
    segments
        .iter()
        .filter(|s| s.count > 0)
        .map(|s| {
            let length = s.count as f64 / total as f64 * circumference;
            let arc = DonutArc { segment: s.clone(), length, offset: -consumed };
            consumed += length;
            arc
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::models::RankedSupplier;

    fn segment(category: &str, count: usize) -> DonutSegment {
        DonutSegment {
            category: category.into(),
            label: category.to_uppercase(),
            color: String::new(),
            count,
        }
    }

    #[test]
    fn test_chart_reverses_to_chronological_order() {
        let series = EvaluationSeries {
            labels: vec!["Mar".into(), "Fev".into(), "Jan".into()],
            scores: vec![9.0, 7.5, 5.0],
        };
        let chart = ChartModel::from_series(series).unwrap();
        assert_eq!(chart.labels, vec!["Jan", "Fev", "Mar"]);
        assert_eq!(chart.scores, vec![5.0, 7.5, 9.0]);

        let points = chart.points(200.0, 100.0);
        assert_eq!(points[0], (0.0, 50.0));
        assert_eq!(points[2], (200.0, 10.0));
        assert_eq!(tooltip_label(7.5), "Minha Pontuação: 7.5 / 10");
    }

    #[test]
    fn test_empty_series_has_no_chart() {
        assert!(ChartModel::from_series(EvaluationSeries::default()).is_none());
    }

    #[test]
    fn test_tooltip_limits_entries_and_hides_zero_scores() {
        let mut distribution = CategoryDistribution::new();
        let suppliers: Vec<_> = (0..12)
            .map(|i| RankedSupplier { name: format!("F{}", i), score: if i == 0 { 0.0 } else { 85.5 } })
            .collect();
        distribution.insert("excelente".into(), suppliers);

        let tooltip = DonutTooltip::for_segment(&distribution, &segment("excelente", 12)).unwrap();
        assert_eq!(tooltip.entries.len(), 10);
        assert_eq!(tooltip.entries[0].score, None);
        assert_eq!(tooltip.entries[1].score.as_deref(), Some("85.5%"));
        assert_eq!(tooltip.overflow.as_deref(), Some("+2 fornecedor(es)..."));
        assert_eq!(tooltip.color, "#333");

        assert!(DonutTooltip::for_segment(&distribution, &segment("ruim", 0)).is_none());
    }

    #[test]
    fn test_donut_arcs_cover_circumference() {
        let arcs = donut_arcs(&[segment("a", 1), segment("b", 0), segment("c", 3)], 100.0);
        assert_eq!(arcs.len(), 2);
        assert_eq!(arcs[0].length, 25.0);
        assert_eq!(arcs[1].offset, -25.0);
        assert_eq!(arcs[1].length, 75.0);
        assert!(donut_arcs(&[], 100.0).is_empty());
    }
}
