//! Coercion rules shared by the transform variants.
//!
//! Source data is dirty: numeric fields may hold strings, blanks or garbage.
//! Every rule here keeps the original value when coercion fails instead of
//! dropping the field or erroring.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::core::{Fields, FieldValue};

/// Interpret a value as a number using loose scripting-language rules.
///
/// Blank text and null are zero, booleans are 0/1, single-element arrays
/// unwrap, and anything unparseable is NaN.
pub fn to_number(value: &FieldValue) -> f64 {
    match value {
        FieldValue::Null => 0.0,
        FieldValue::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        FieldValue::Int(i) => *i as f64,
        FieldValue::Float(f) => *f,
        FieldValue::Text(s) => parse_number(s),
        FieldValue::DateTime(dt) => dt.timestamp_millis() as f64,
        FieldValue::Array(items) => match items.as_slice() {
            [] => 0.0,
            [single] => to_number(single),
            _ => f64::NAN,
        },
        FieldValue::Object(_) => f64::NAN,
    }
}

fn parse_number(raw: &str) -> f64 {
    let s = raw.trim();
    if s.is_empty() {
        return 0.0;
    }

    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    let radix = match s.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0o") | Some("0O") => Some(8),
        Some("0b") | Some("0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&s[2..], radix)
            .map(|n| n as f64)
            .unwrap_or(f64::NAN);
    }

    // f64::from_str also accepts "inf"/"nan" spellings, which are not numbers here.
    if !s
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
    {
        return f64::NAN;
    }

    s.parse::<f64>().unwrap_or(f64::NAN)
}

/// Truthiness: null, false, zero, NaN and empty text are falsy.
pub fn is_falsy(value: &FieldValue) -> bool {
    match value {
        FieldValue::Null => true,
        FieldValue::Bool(b) => !b,
        FieldValue::Int(i) => *i == 0,
        FieldValue::Float(f) => *f == 0.0 || f.is_nan(),
        FieldValue::Text(s) => s.is_empty(),
        FieldValue::DateTime(_) | FieldValue::Array(_) | FieldValue::Object(_) => false,
    }
}

/// Coerce to a number, keeping the original value when the result is zero or NaN.
pub fn numeric_or_original(value: FieldValue) -> FieldValue {
    let n = to_number(&value);
    if n == 0.0 || n.is_nan() {
        value
    } else {
        FieldValue::number(n)
    }
}

/// Coerce an optional numeric field, returning None when it carries no meaning.
///
/// A value is meaningless when it is falsy or reads as numeric zero ("0",
/// blank text). Non-numeric text is kept as-is.
pub fn sparse_numeric(value: Option<FieldValue>) -> Option<FieldValue> {
    let value = value?;
    if is_falsy(&value) || to_number(&value) == 0.0 {
        return None;
    }
    Some(numeric_or_original(value))
}

/// Parse a text timestamp, keeping the original value when it does not parse.
pub fn parse_date(value: FieldValue) -> FieldValue {
    let FieldValue::Text(s) = &value else {
        return value;
    };

    match parse_timestamp(s.trim()) {
        Some(dt) => FieldValue::DateTime(dt),
        None => value,
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // Offset-less timestamps are taken as UTC.
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Move a field to a new name. Absent fields stay absent.
pub fn rename(fields: &mut Fields, from: &str, to: &str) {
    if let Some(value) = fields.remove(from) {
        fields.insert(to.to_string(), value);
    }
}

/// Remove every listed field.
pub fn drop_all(fields: &mut Fields, names: &[&str]) {
    for name in names {
        fields.remove(*name);
    }
}

/// Parse the named date fields in place.
pub fn parse_dates(fields: &mut Fields, names: &[&str]) {
    for name in names {
        if let Some(value) = fields.remove(*name) {
            fields.insert(name.to_string(), parse_date(value));
        }
    }
}
