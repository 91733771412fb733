//! Field mapping from backend JSON shapes onto [`LabelRecord`].
//!
//! | Field | order | ceremony | institution | internal |
//! |-------|-------|----------|-------------|----------|
//! | name | `title foreName surname` | `name` | `toName` | `customerName` / `name` |
//! | attention | `attention` | `toName` | `contactName` / `attention` | `department` / `attention` |
//! | code | (none) | `ceremonyCode` / `code` | `institutionCode` / `code` | `reference` / `orderNumber` |
//!
//! Address, city and phone fields share one set of source names for every kind.

use rayon::prelude::*;
use serde_json::Value;

use super::{LabelRecord, RecordKind};

const ADDRESS_LINE1: &[&str] = &["address1", "addressLine1", "address_line1"];
const ADDRESS_LINE2: &[&str] = &["address2", "addressLine2", "address_line2"];
const TOWN: &[&str] = &["town", "city"];
const COUNTY: &[&str] = &["county", "region", "state"];
const POSTCODE: &[&str] = &["postcode", "postCode", "zip"];
const PHONE: &[&str] = &["phone", "telephone", "mobile"];

/// Project one source record into a normalized label.
pub fn project(source: &Value, kind: RecordKind) -> LabelRecord {
    let city = join_non_empty(
        &[
            field(source, TOWN),
            field(source, COUNTY),
            field(source, POSTCODE),
        ],
        ", ",
    );

    let mut record = LabelRecord {
        id: String::new(),
        name: String::new(),
        address_line1: field(source, ADDRESS_LINE1),
        address_line2: field(source, ADDRESS_LINE2),
        city,
        attention: String::new(),
        phone: field(source, PHONE),
        code: String::new(),
    };

    match kind {
        RecordKind::Order => {
            record.id = field(source, &["id", "orderNumber"]);
            record.name = join_non_empty(
                &[
                    field(source, &["title"]),
                    field(source, &["foreName", "forename", "firstName"]),
                    field(source, &["surname", "lastName"]),
                ],
                " ",
            );
            record.attention = field(source, &["attention"]);
        }
        RecordKind::Ceremony => {
            record.id = field(source, &["id", "code", "ceremonyCode"]);
            record.name = field(source, &["name"]);
            record.attention = field(source, &["toName"]);
            record.code = field(source, &["ceremonyCode", "code"]);
        }
        RecordKind::Institution => {
            record.id = field(source, &["id"]);
            record.name = field(source, &["toName"]);
            record.attention = field(source, &["contactName", "attention"]);
            record.code = field(source, &["institutionCode", "code"]);
        }
        RecordKind::Internal => {
            record.id = field(source, &["id", "reference"]);
            record.name = field(source, &["customerName", "name"]);
            record.attention = field(source, &["department", "attention"]);
            record.code = field(source, &["reference", "orderNumber"]);
        }
    }

    record
}

/// Project a batch of source records, preserving input order.
pub fn project_all(sources: &[Value], kind: RecordKind) -> Vec<LabelRecord> {
    sources.par_iter().map(|s| project(s, kind)).collect()
}

/// First non-empty value among `keys`, as trimmed text.
fn field(source: &Value, keys: &[&str]) -> String {
    keys.iter()
        .map(|key| text(source.get(*key)))
        .find(|v| !v.is_empty())
        .unwrap_or_default()
}

/// Render a scalar JSON value as text. Anything that is not a string or a
/// number is treated as absent.
fn text(value: Option<&Value>) -> String {
    let raw = match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return String::new(),
    };

    // Upstream code sometimes stringifies missing values.
    if raw.eq_ignore_ascii_case("null") || raw.eq_ignore_ascii_case("undefined") {
        return String::new();
    }
    raw
}

fn join_non_empty(parts: &[String], sep: &str) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(sep)
}
