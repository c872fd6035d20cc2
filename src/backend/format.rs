use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};

/// America/Sao_Paulo has been fixed at UTC-03:00 since daylight saving was abolished in 2019.
pub fn sao_paulo() -> FixedOffset {
    FixedOffset::west_opt(3 * 3600).unwrap_or_else(|| Utc.fix())
}

/// Parses an API timestamp. Timestamps without an explicit offset are UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    let trimmed = value.trim_end_matches('Z');
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// `dd/mm/yyyy`. Calendar dates are shown as-is; timestamps are shifted to Sao Paulo.
pub fn format_date(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    if let Ok(date) = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
        return date.format("%d/%m/%Y").to_string();
    }
    match parse_timestamp(value) {
        Some(dt) => dt.with_timezone(&sao_paulo()).format("%d/%m/%Y").to_string(),
        None => value.to_string(),
    }
}

/// `dd/mm/yyyy, HH:MM` in Sao Paulo time.
pub fn format_date_time(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    match parse_timestamp(value) {
        Some(dt) => dt.with_timezone(&sao_paulo()).format("%d/%m/%Y, %H:%M").to_string(),
        None => value.to_string(),
    }
}

/// Inserts `sep` after the first run of `run` digits that is followed by another digit.
fn split_first_run(value: &str, run: usize, sep: &str) -> String {
    let bytes = value.as_bytes();
    let mut streak = 0;
    for (i, b) in bytes.iter().enumerate() {
        if b.is_ascii_digit() {
            streak += 1;
            if streak > run {
                let at = i;
                return format!("{}{}{}", &value[..at], sep, &value[at..]);
            }
        } else {
            streak = 0;
        }
    }
    value.to_string()
}

fn digits(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub fn mask_cnpj(value: &str) -> String {
    let mut masked = digits(value);
    masked = split_first_run(&masked, 2, ".");
    masked = split_first_run(&masked, 3, ".");
    masked = split_first_run(&masked, 3, "/");
    masked = split_first_run(&masked, 4, "-");
    masked.chars().take(18).collect()
}

pub fn mask_phone(value: &str) -> String {
    let digits: String = digits(value).chars().take(11).collect();
    if digits.is_empty() {
        return String::new();
    }

    let mut formatted = if digits.len() > 2 {
        format!("({}) {}", &digits[..2], &digits[2..])
    } else {
        digits
    };
    if formatted.len() > 10 {
        formatted = split_first_run(&formatted, 5, "-");
    } else {
        formatted = split_first_run(&formatted, 4, "-");
    }
    formatted
}

pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const SIZES: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let k = 1024f64;
    let exp = ((bytes as f64).ln() / k.ln()).floor() as usize;
    let exp = exp.min(SIZES.len() - 1);
    let value = ((bytes as f64 / k.powi(exp as i32)) * 100.0).round() / 100.0;
    if value.fract() == 0.0 {
        format!("{:.0} {}", value, SIZES[exp])
    } else {
        format!("{} {}", value, SIZES[exp])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_cnpj() {
        assert_eq!(mask_cnpj("12345678000190"), "12.345.678/0001-90");
        assert_eq!(mask_cnpj("12.345"), "12.345");
        assert_eq!(mask_cnpj("123456789012345678"), "12.345.678/9012-34");
        assert_eq!(mask_cnpj(""), "");
    }

    #[test]
    fn test_mask_phone() {
        assert_eq!(mask_phone("11987654321"), "(11) 98765-4321");
        assert_eq!(mask_phone("(34) 3411-22"), "(34) 34112-2");
        assert_eq!(mask_phone("1198"), "(11) 98");
        assert_eq!(mask_phone("abc"), "");
    }

    #[test]
    fn test_format_date_time_converts_to_sao_paulo() {
        assert_eq!(format_date_time("2024-03-05T14:30:00"), "05/03/2024, 11:30");
        assert_eq!(format_date_time("2024-03-05T02:00:00Z"), "04/03/2024, 23:00");
        assert_eq!(format_date_time(""), "");
        assert_eq!(format_date_time("ontem"), "ontem");
    }

    #[test]
    fn test_format_date_keeps_calendar_dates() {
        assert_eq!(format_date("2024-03-05"), "05/03/2024");
        assert_eq!(format_date("2024-03-05T01:00:00Z"), "04/03/2024");
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
    }
}
