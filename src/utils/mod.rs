use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

pub const EMPTY: &str = "—";

const GROUP_SEPARATOR: char = '\u{202f}';
const SYMBOL_SEPARATOR: char = '\u{a0}';

const MONTHS_SHORT_FR: [&str; 12] = [
    "janv.", "févr.", "mars", "avr.", "mai", "juin", "juil.", "août", "sept.", "oct.", "nov.",
    "déc.",
];

fn currency_symbol(code: &str) -> &str {
    match code {
        "EUR" => "€",
        "USD" => "$US",
        "GBP" => "£GB",
        other => other,
    }
}

/// Formats an amount the way a French locale prints currency: `1 234,50 €`.
pub fn format_amount(amount: f64, currency: Option<&str>) -> String {
    let code = currency.filter(|c| !c.is_empty()).unwrap_or("EUR");
    let fixed = format!("{:.2}", amount.abs());
    let (integer, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::new();
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(GROUP_SEPARATOR);
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!(
        "{}{},{}{}{}",
        sign,
        grouped,
        fraction,
        SYMBOL_SEPARATOR,
        currency_symbol(code)
    )
}

/// Like [`format_amount`], with an em-dash when the amount is missing.
pub fn format_optional_amount(amount: Option<f64>, currency: Option<&str>) -> String {
    match amount {
        Some(value) => format_amount(value, currency),
        None => EMPTY.to_string(),
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.date_naive());
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|datetime| datetime.date())
}

/// Short French date (`12 janv. 2024`); unparseable input is returned as-is.
pub fn format_date(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return EMPTY.to_string();
    };
    match parse_date(raw) {
        Some(date) => format!(
            "{} {} {}",
            date.day(),
            MONTHS_SHORT_FR[date.month0() as usize],
            date.year()
        ),
        None => raw.to_string(),
    }
}

/// Prints a quantity without a trailing `.0` for integral values.
pub fn format_quantity(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Pads or truncates to exactly `width` characters.
pub fn fit(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        format!("{}{}", text, " ".repeat(width - count))
    } else if width == 0 {
        String::new()
    } else {
        let mut cut: String = text.chars().take(width - 1).collect();
        cut.push('…');
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount_french_style() {
        assert_eq!(format_amount(1234.5, Some("EUR")), "1\u{202f}234,50\u{a0}€");
        assert_eq!(format_amount(0.0, None), "0,00\u{a0}€");
        assert_eq!(format_amount(-12.5, Some("USD")), "-12,50\u{a0}$US");
        assert_eq!(
            format_amount(1_000_000.0, Some("CHF")),
            "1\u{202f}000\u{202f}000,00\u{a0}CHF"
        );
    }

    #[test]
    fn test_optional_amount() {
        assert_eq!(format_optional_amount(None, Some("EUR")), "—");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(Some("2024-01-12")), "12 janv. 2024");
        assert_eq!(format_date(Some("2024-05-01T08:30:00Z")), "1 mai 2024");
        assert_eq!(format_date(Some("2024-08-03 10:00:00")), "3 août 2024");
        assert_eq!(format_date(Some("soon")), "soon");
        assert_eq!(format_date(None), "—");
        assert_eq!(format_date(Some("")), "—");
    }

    #[test]
    fn test_fit() {
        assert_eq!(fit("abc", 5), "abc  ");
        assert_eq!(fit("abcdef", 4), "abc…");
    }

    #[test]
    fn test_format_quantity() {
        assert_eq!(format_quantity(2.0), "2");
        assert_eq!(format_quantity(2.5), "2.5");
    }
}
