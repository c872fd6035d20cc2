use crate::backend::models::SupplierRow;
use crate::backend::table::SupplierTable;
use base64::{engine::general_purpose, Engine as _};
use chrono::NaiveDate;
use std::fmt;
use std::path::{Path, PathBuf};

pub const CSV_HEADER: [&str; 11] = [
    "Nome Fantasia",
    "Razão Social",
    "Contato",
    "Tipo de Serviço",
    "Performance (%)",
    "Status",
    "Avaliações",
    "Telefone",
    "Email",
    "CNPJ",
    "Responsáveis",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportWarning {
    NoSuppliers,
    NothingVisible,
}

impl fmt::Display for ExportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportWarning::NoSuppliers => write!(f, "Nenhum fornecedor disponível para exportação."),
            ExportWarning::NothingVisible => {
                write!(f, "Nenhum fornecedor corresponde aos filtros atuais.")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CsvExport {
    pub filename: String,
    pub content: String,
}

impl CsvExport {
    /// `data:` URI suitable for an anchor download.
    pub fn data_uri(&self) -> String {
        format!(
            "data:text/csv;charset=utf-8;base64,{}",
            general_purpose::STANDARD.encode(self.content.as_bytes())
        )
    }

    pub fn write_to_dir(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let path = dir.join(&self.filename);
        std::fs::write(&path, self.content.as_bytes())?;
        Ok(path)
    }
}

/// Score as rendered in the table cell, without the percent sign.
pub fn score_text(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{:.0}", score)
    } else {
        format!("{:.1}", score)
    }
}

fn or_dash(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

/// One CSV line built from the text the table renders for the row.
pub fn csv_fields(row: &SupplierRow) -> [String; 11] {
    let name = or_dash(Some(&row.name));
    let legal_name = row
        .legal_name
        .as_deref()
        .map(|l| l.replace("Razão Social:", "").trim().to_string())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| name.clone());
    let evaluators = if row.evaluators.is_empty() {
        "-".to_string()
    } else {
        row.evaluators.iter().map(|e| e.trim()).collect::<Vec<_>>().join("; ")
    };

    [
        name,
        legal_name,
        or_dash(Some(&row.contact)),
        or_dash(Some(&row.service)),
        score_text(row.score),
        or_dash(Some(&row.status_label)),
        row.evaluations.to_string(),
        or_dash(row.phone.as_deref()),
        or_dash(row.email.as_deref()),
        or_dash(row.cnpj.as_deref()),
        evaluators,
    ]
}

pub fn escape_cell(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

pub fn to_csv<'a>(rows: impl IntoIterator<Item = &'a SupplierRow>) -> String {
    let header = CSV_HEADER.iter().map(|h| escape_cell(h)).collect::<Vec<_>>().join(",");
    let mut lines = vec![header];
    lines.extend(rows.into_iter().map(|row| {
        csv_fields(row).iter().map(|cell| escape_cell(cell)).collect::<Vec<_>>().join(",")
    }));
    lines.join("\n")
}

pub fn export_filename(today: NaiveDate) -> String {
    format!("fornecedores_{}.csv", today.format("%Y-%m-%d"))
}

/// Exports the rows currently visible in the table.
pub fn export_visible(table: &SupplierTable, today: NaiveDate) -> Result<CsvExport, ExportWarning> {
    if table.is_empty() {
        return Err(ExportWarning::NoSuppliers);
    }
    if table.visible_count() == 0 {
        return Err(ExportWarning::NothingVisible);
    }
    Ok(CsvExport { filename: export_filename(today), content: to_csv(table.visible_rows()) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::table::FilterCriteria;

    fn supplier(id: &str, name: &str, contact: &str) -> SupplierRow {
        SupplierRow {
            id: id.to_string(),
            name: name.to_string(),
            contact: contact.to_string(),
            service: "Manutenção".to_string(),
            status: "active".to_string(),
            status_label: "Ativo".to_string(),
            score: 72.5,
            evaluations: 4,
            ..Default::default()
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()
    }

    #[test]
    fn test_export_escapes_quotes_and_skips_hidden_rows() {
        let mut hidden = supplier("3", "Gama", "Pedro");
        hidden.status = "inactive".to_string();
        let rows = vec![supplier("1", "Alfa", "João \"Jota\" Silva"), supplier("2", "Beta", "Maria"), hidden];
        let mut table = SupplierTable::new(rows, 0);
        table.apply(&FilterCriteria::from_controls("", "active", "all", "name"));
        assert_eq!(table.visible_count(), 2);

        let export = export_visible(&table, date()).unwrap();
        let lines: Vec<_> = export.content.lines().collect();

        // header + visible rows only
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("\"Alfa\",\"Alfa\",\"João \"\"Jota\"\" Silva\","));
        assert!(lines.iter().all(|l| !l.contains("Pedro")));
        assert_eq!(export.filename, "fornecedores_2024-05-17.csv");
    }

    #[test]
    fn test_export_follows_current_sort() {
        let mut low = supplier("1", "Alfa", "a");
        low.score = 40.0;
        let mut high = supplier("2", "Beta", "b");
        high.score = 95.0;
        let mut mid = supplier("3", "Gama", "c");
        mid.score = 70.0;
        let mut table = SupplierTable::new(vec![low, high, mid], 0);

        let names = |table: &SupplierTable| -> Vec<String> {
            let export = export_visible(table, date()).unwrap();
            export.content.lines().skip(1).map(|l| l.split(',').next().unwrap_or("").to_string()).collect()
        };

        table.apply(&FilterCriteria::from_controls("", "all", "all", "score-desc"));
        assert_eq!(names(&table), vec!["\"Beta\"", "\"Gama\"", "\"Alfa\""]);

        table.apply(&FilterCriteria::from_controls("", "all", "all", "score-asc"));
        assert_eq!(names(&table), vec!["\"Alfa\"", "\"Gama\"", "\"Beta\""]);

        // pass-through sort keeps the order the last sort produced
        table.apply(&FilterCriteria::from_controls("", "all", "all", "recent"));
        assert_eq!(names(&table), vec!["\"Alfa\"", "\"Gama\"", "\"Beta\""]);
    }

    #[test]
    fn test_header_has_eleven_quoted_columns() {
        let csv = to_csv(std::iter::empty());
        assert_eq!(csv.split(',').count(), 11);
        assert!(csv.starts_with("\"Nome Fantasia\",\"Razão Social\""));
        assert!(csv.ends_with("\"Responsáveis\""));
    }

    #[test]
    fn test_fields_fall_back_to_dashes() {
        let mut row = supplier("1", "Alfa", "");
        row.legal_name = Some("Razão Social: Alfa Comércio ME".into());
        row.evaluators = vec!["Ana".into(), " Bruno ".into()];
        row.phone = Some("(34) 99999-0000".into());
        let fields = csv_fields(&row);
        assert_eq!(fields[1], "Alfa Comércio ME");
        assert_eq!(fields[2], "-");
        assert_eq!(fields[4], "72.5");
        assert_eq!(fields[7], "(34) 99999-0000");
        assert_eq!(fields[8], "-");
        assert_eq!(fields[10], "Ana; Bruno");

        let plain = csv_fields(&supplier("2", "Beta", "x"));
        assert_eq!(plain[1], "Beta");
        assert_eq!(plain[10], "-");
    }

    #[test]
    fn test_export_guards() {
        let empty = SupplierTable::new(vec![], 0);
        assert_eq!(export_visible(&empty, date()), Err(ExportWarning::NoSuppliers));

        let mut table = SupplierTable::new(vec![supplier("1", "Alfa", "x")], 0);
        table.apply(&FilterCriteria::from_controls("zzz", "all", "all", "name"));
        assert_eq!(export_visible(&table, date()), Err(ExportWarning::NothingVisible));
        assert_eq!(
            ExportWarning::NothingVisible.to_string(),
            "Nenhum fornecedor corresponde aos filtros atuais."
        );
    }

    #[test]
    fn test_write_to_dir() {
        let dir = tempfile::tempdir().unwrap();
        let table = SupplierTable::new(vec![supplier("1", "Alfa", "x")], 0);
        let export = export_visible(&table, date()).unwrap();
        let path = export.write_to_dir(dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "fornecedores_2024-05-17.csv");
        assert_eq!(std::fs::read_to_string(path).unwrap(), export.content);
        assert!(export.data_uri().starts_with("data:text/csv;charset=utf-8;base64,"));
    }
}
