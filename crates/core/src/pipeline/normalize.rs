//! Cell- and header-level cleaning. Nothing here fails: values that cannot be read
//! come back as `None`.

use chrono::{NaiveDate, NaiveDateTime};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

// Two-digit-year patterns go first: `%Y` would otherwise read "25" as the year 25.
const DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%y %H:%M:%S",
    "%d/%m/%y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%d/%m/%y", "%d-%m-%y", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d", "%Y/%m/%d",
];

/// Canonical column name: lowercase, accents stripped, trimmed, spaces as underscores.
pub fn normalize_header(header: &str) -> String {
    let lowered = header.to_lowercase();
    // Drops every combining mark (Mn, Mc, Me); only Mn ever occurs in these Latin headers.
    let stripped: String = lowered.nfd().filter(|c| !is_combining_mark(*c)).collect();
    stripped.trim().replace(' ', "_")
}

pub fn coerce_number(raw: &str) -> Option<f64> {
    let dotted = raw.replace(',', ".");
    let value = dotted.trim().parse::<f64>().ok()?;
    (!value.is_nan()).then_some(value)
}

/// Parses a date or date-time, reading ambiguous `aa/bb/yyyy` as day/month.
pub fn parse_day_first(raw: &str) -> Option<NaiveDateTime> {
    let t = raw.trim();
    if t.is_empty() {
        return None;
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(t, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(t, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

// Cell texts read as missing, matched exactly. Sheets exports formula errors as `#N/A`.
const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn non_empty(raw: &str) -> Option<String> {
    (!NA_TOKENS.iter().any(|na| *na == raw)).then(|| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_accented_spaced_headers() {
        assert_eq!(normalize_header("  Reseña "), "resena");
        assert_eq!(normalize_header("Fecha Pedido"), "fecha_pedido");
        assert_eq!(normalize_header("CATEGORÍA"), "categoria");
        assert_eq!(normalize_header("Días Entrega"), "dias_entrega");
        assert_eq!(normalize_header("descuento_pct"), "descuento_pct");
    }

    #[test]
    fn header_normalization_is_idempotent() {
        let samples = [
            "Reseña",
            " Fecha  Analizada ",
            "İstanbul Şehir",
            "Ventas Netas Día",
            "ÅNGSTRÖM",
            "tipo_cliente",
            "\u{0065}\u{0301}xito",
            "",
        ];
        for h in samples {
            let once = normalize_header(h);
            assert_eq!(normalize_header(&once), once, "header {h:?}");
        }
    }

    #[test]
    fn coerces_comma_decimals() {
        assert_eq!(coerce_number("1234,5"), Some(1234.5));
        assert_eq!(coerce_number(" 10,25 "), Some(10.25));
        assert_eq!(coerce_number("7"), Some(7.0));
        assert_eq!(coerce_number("3.5"), Some(3.5));
    }

    #[test]
    fn non_numeric_input_is_missing() {
        assert_eq!(coerce_number(""), None);
        assert_eq!(coerce_number("n/a"), None);
        assert_eq!(coerce_number("nan"), None);
        // Thousands separators are not understood.
        assert_eq!(coerce_number("1.234,50"), None);
    }

    #[test]
    fn spreadsheet_na_markers_are_missing_text() {
        assert_eq!(non_empty("#N/A"), None);
        assert_eq!(non_empty("N/A"), None);
        assert_eq!(non_empty("NA"), None);
        assert_eq!(non_empty("null"), None);
        assert_eq!(non_empty("nan"), None);
        assert_eq!(non_empty(""), None);
        assert_eq!(non_empty("Nación"), Some("Nación".to_string()));
        assert_eq!(non_empty(" NA "), Some(" NA ".to_string()));
    }

    #[test]
    fn strips_only_marks_from_latin_headers() {
        assert_eq!(normalize_header("Provincia Envío"), "provincia_envio");
        assert_eq!(normalize_header("Ñandú"), "nandu");
        assert_eq!(normalize_header("Über Ç"), "uber_c");
    }

    #[test]
    fn parses_day_first_dates() {
        let d = parse_day_first("03/04/2025").unwrap();
        assert_eq!(d.date(), NaiveDate::from_ymd_opt(2025, 4, 3).unwrap());

        let d = parse_day_first("15-01-2025 14:30").unwrap();
        assert_eq!(d.to_string(), "2025-01-15 14:30:00");

        let d = parse_day_first("01/02/25").unwrap();
        assert_eq!(d.date(), NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());

        let d = parse_day_first("2025-02-28").unwrap();
        assert_eq!(d.date(), NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
    }

    #[test]
    fn unparseable_dates_are_missing() {
        assert_eq!(parse_day_first(""), None);
        assert_eq!(parse_day_first("ayer"), None);
        assert_eq!(parse_day_first("32/01/2025"), None);
        assert_eq!(parse_day_first("01/13/2025"), None);
    }
}
