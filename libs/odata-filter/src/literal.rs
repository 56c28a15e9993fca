//! Literal recognition, type inference and value parsing.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use odata_csdl::{EdmFamily, EdmKind};
use odata_geo::looks_like_wkt;
use serde::Serialize;

/// A value bound to a SQL parameter.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Int(i64),
    Double(f64),
    Bool(bool),
    DateTime(DateTime<FixedOffset>),
    String(String),
}

impl SqlValue {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Int(v) => Some(*v as f64),
            SqlValue::Double(v) => Some(*v),
            SqlValue::String(s) => s.trim().parse().ok(),
            SqlValue::Bool(_) | SqlValue::DateTime(_) => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Int(v) => write!(f, "{v}"),
            SqlValue::Double(v) => write!(f, "{v}"),
            SqlValue::Bool(v) => write!(f, "{v}"),
            SqlValue::DateTime(v) => f.write_str(&v.to_rfc3339()),
            SqlValue::String(v) => f.write_str(v),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::String(value.to_owned())
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Double(value)
    }
}

const SPATIAL_PREFIXES: [&str; 2] = ["geography", "geometry"];

/// Split `geography'...'` / `geometry'...'` into the quoted part.
fn strip_spatial_prefix(text: &str) -> Option<&str> {
    SPATIAL_PREFIXES.iter().find_map(|prefix| {
        let head = text.get(..prefix.len())?;
        let rest = &text[prefix.len()..];
        (head.eq_ignore_ascii_case(prefix) && rest.starts_with('\'')).then_some(rest)
    })
}

/// Whether `text` is a single- or double-quoted string, or a typed spatial
/// literal.
#[must_use]
pub fn is_quoted(text: &str) -> bool {
    let text = strip_spatial_prefix(text).unwrap_or(text);
    text.len() >= 2
        && ((text.starts_with('\'') && text.ends_with('\''))
            || (text.starts_with('"') && text.ends_with('"')))
}

/// Remove the quotes (and a spatial type prefix) from a quoted literal and
/// collapse doubled single quotes. Unquoted text is returned trimmed.
#[must_use]
pub fn unquote(text: &str) -> String {
    let text = text.trim();
    if !is_quoted(text) {
        return text.to_owned();
    }
    let body = strip_spatial_prefix(text).unwrap_or(text);
    let inner = &body[1..body.len() - 1];
    if body.starts_with('\'') {
        inner.replace("''", "'")
    } else {
        inner.to_owned()
    }
}

/// Whether the unquoted text of a literal is shaped like WKT.
#[must_use]
pub fn is_wkt_literal(text: &str) -> bool {
    looks_like_wkt(&unquote(text))
}

fn looks_numeric(text: &str) -> bool {
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    digits
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || c == '.')
}

fn parse_int(text: &str) -> Option<i64> {
    looks_numeric(text).then(|| text.parse().ok()).flatten()
}

fn parse_double(text: &str) -> Option<f64> {
    looks_numeric(text)
        .then(|| text.parse::<f64>().ok())
        .flatten()
        .filter(|v| v.is_finite())
}

fn parse_bool(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Parse an ISO-8601 timestamp or date. Values without an offset are taken
/// as UTC.
#[must_use]
pub fn parse_timestamp(text: &str) -> Option<DateTime<FixedOffset>> {
    if !text.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    DateTime::parse_from_rfc3339(text)
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|n| n.and_utc().fixed_offset())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|n| n.and_utc().fixed_offset())
        })
}

/// Whether `text` is a literal rather than a property path.
#[must_use]
pub fn is_literal(text: &str) -> bool {
    let text = text.trim();
    is_quoted(text)
        || text.eq_ignore_ascii_case("null")
        || parse_bool(text).is_some()
        || parse_double(text).is_some()
        || parse_timestamp(text).is_some()
}

#[must_use]
pub fn is_null(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case("null")
}

/// EDM kind of a literal.
///
/// Quoted WKT infers as `Edm.Geography`; any other quoted text is a string.
/// Integers that fit 32 bits are `Int32`, wider ones `Int64`. Text that is not
/// recognised falls back to `Edm.String`.
#[must_use]
pub fn infer_literal_type(text: &str) -> EdmKind {
    let text = text.trim();
    if is_quoted(text) {
        return if is_wkt_literal(text) {
            EdmKind::Geography
        } else {
            EdmKind::String
        };
    }
    if let Some(v) = parse_int(text) {
        return if i32::try_from(v).is_ok() {
            EdmKind::Int32
        } else {
            EdmKind::Int64
        };
    }
    if parse_double(text).is_some() {
        return EdmKind::Double;
    }
    if parse_bool(text).is_some() {
        return EdmKind::Boolean;
    }
    if parse_timestamp(text).is_some() {
        return EdmKind::DateTimeOffset;
    }
    EdmKind::String
}

/// Kind of a literal in a slot declared as `expected`. Quoted text in a
/// string-family slot stays a string even when it reads as WKT.
#[must_use]
pub fn infer_literal_type_for(text: &str, expected: EdmFamily) -> EdmKind {
    if expected == EdmFamily::String && is_quoted(text.trim()) {
        return EdmKind::String;
    }
    infer_literal_type(text)
}

/// Whether a non-null literal may be compared against a property of kind
/// `declared`.
#[must_use]
pub fn literal_fits(declared: EdmKind, text: &str) -> bool {
    !is_null(text) && declared.accepts(infer_literal_type_for(text, declared.family()))
}

/// Typed value of a literal, ready to be bound.
#[must_use]
pub fn parse_literal_value(text: &str) -> SqlValue {
    let text = text.trim();
    if is_quoted(text) {
        return SqlValue::String(unquote(text));
    }
    if let Some(v) = parse_bool(text) {
        return SqlValue::Bool(v);
    }
    if let Some(v) = parse_int(text) {
        return SqlValue::Int(v);
    }
    if let Some(v) = parse_double(text) {
        return SqlValue::Double(v);
    }
    if let Some(v) = parse_timestamp(text) {
        return SqlValue::DateTime(v);
    }
    SqlValue::String(text.to_owned())
}
