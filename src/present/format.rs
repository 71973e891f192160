//! Cell and currency formatting
//!
//! Presentation-only transforms; nothing here mutates the underlying rows.

use serde_json::Value;

/// Render one cell for display.
pub fn format_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::Bool(true)) => "Yes".to_string(),
        Some(Value::Bool(false)) => "No".to_string(),
        Some(object @ Value::Object(map)) => match map.get("Name").and_then(Value::as_str) {
            Some(name) => name.to_string(),
            None => object.to_string(),
        },
        Some(array @ Value::Array(_)) => array.to_string(),
        Some(Value::String(s)) => match iso_date_prefix(s) {
            Some(date) => date.to_string(),
            None => s.clone(),
        },
        Some(Value::Number(n)) => {
            if n.is_i64() || n.is_u64() {
                n.to_string()
            } else {
                let f = n.as_f64().unwrap_or(0.0);
                if f.fract() == 0.0 {
                    format!("{f:.0}")
                } else if f.abs() >= 0.01 {
                    format!("{f:.2}")
                } else {
                    n.to_string()
                }
            }
        }
    }
}

/// `YYYY-MM-DD` prefix of an ISO-ish date string, if the string has one.
fn iso_date_prefix(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    if bytes.len() < 10 {
        return None;
    }
    let digits = |range: std::ops::Range<usize>| bytes[range].iter().all(u8::is_ascii_digit);
    if digits(0..4) && bytes[4] == b'-' && digits(5..7) && bytes[7] == b'-' && digits(8..10) {
        Some(&s[..10])
    } else {
        None
    }
}

/// Prettify a CamelCase or dotted column key for table headers.
pub fn format_column_name(column: &str) -> String {
    let mut out = String::with_capacity(column.len() + 4);
    let mut prev_upper = true;
    for ch in column.chars() {
        if ch.is_uppercase() && !prev_upper && !out.ends_with(' ') {
            out.push(' ');
        }
        prev_upper = !ch.is_lowercase();
        out.push(ch);
    }
    let mut chars = out.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => out,
    }
}

/// Format a monetary amount for display: currency symbol, thousands
/// grouping, two decimal places. This is the single locale-facing boundary;
/// aggregation itself stays locale-independent.
pub fn format_currency(amount: f64, currency_code: &str, locale: &str) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let fraction = cents % 100;

    let grouped = group_thousands(whole, grouping_separator(locale));
    let decimal = decimal_separator(locale);
    let magnitude = format!("{grouped}{decimal}{fraction:02}");

    let rendered = match currency_symbol(currency_code) {
        Some(symbol) => format!("{symbol}{magnitude}"),
        None => format!("{currency_code} {magnitude}"),
    };
    if negative {
        format!("-{rendered}")
    } else {
        rendered
    }
}

fn currency_symbol(code: &str) -> Option<&'static str> {
    match code {
        "GBP" => Some("£"),
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "AUD" => Some("A$"),
        "NZD" => Some("NZ$"),
        "JPY" => Some("¥"),
        _ => None,
    }
}

fn grouping_separator(locale: &str) -> char {
    if uses_comma_decimal(locale) {
        '.'
    } else {
        ','
    }
}

fn decimal_separator(locale: &str) -> char {
    if uses_comma_decimal(locale) {
        ','
    } else {
        '.'
    }
}

fn uses_comma_decimal(locale: &str) -> bool {
    matches!(
        locale.split(['-', '_']).next().unwrap_or(""),
        "de" | "fr" | "es" | "it" | "nl" | "pt" | "da" | "fi" | "nb" | "sv"
    )
}

fn group_thousands(mut value: u64, separator: char) -> String {
    let mut groups = Vec::new();
    loop {
        let group = value % 1000;
        value /= 1000;
        if value == 0 {
            groups.push(group.to_string());
            break;
        }
        groups.push(format!("{group:03}"));
    }
    groups.reverse();
    groups.join(&separator.to_string())
}
