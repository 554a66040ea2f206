//! Decoding of the list columns stored on `models` rows.
//!
//! Two pipelines have written these columns over time, so a column holds
//! one of:
//!
//! - a JSON array of values: `[2025, 2030]`, `[{"key": "Pop"}]`
//! - a JSON array of JSON-encoded strings: `["{\"key\": \"Pop\"}"]`
//! - the legacy bracketed list of single-quoted JSON strings:
//!   `['{"key": "Pop"}', '{"key": "Elec"}']`
//!
//! [`classify`] picks the encoding from the text itself and
//! [`decode_list`] applies the matching decoder.

use crate::{Result, ScenarioError};
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEncoding {
    /// NULL or blank column
    Empty,
    Json,
    JsonStrings,
    LegacyBracketed,
}

/// Work out which encoding `raw` uses without decoding the elements.
pub fn classify(raw: Option<&str>) -> ListEncoding {
    let raw = match raw.map(str::trim) {
        None | Some("") => return ListEncoding::Empty,
        Some(raw) => raw,
    };
    if let Some(inner) = raw.strip_prefix('[') {
        if inner.trim_start().starts_with('\'') {
            return ListEncoding::LegacyBracketed;
        }
    }
    match serde_json::from_str::<Vec<Value>>(raw) {
        Ok(items) if !items.is_empty() && items.iter().all(Value::is_string) => {
            ListEncoding::JsonStrings
        }
        _ => ListEncoding::Json,
    }
}

/// Decode a stored list column into `T` items.
///
/// `field` names the column in errors. A failure is logged together with
/// the raw text, since it means the stored metadata is corrupt.
pub fn decode_list<T: DeserializeOwned>(field: &str, raw: Option<&str>) -> Result<Vec<T>> {
    let encoding = classify(raw);
    let text = raw.unwrap_or("").trim();
    let decoded = match encoding {
        ListEncoding::Empty => Ok(Vec::new()),
        ListEncoding::Json => serde_json::from_str::<Vec<T>>(text).map_err(|e| e.to_string()),
        // a list of plain strings is also a valid JSON list of values
        ListEncoding::JsonStrings => serde_json::from_str::<Vec<String>>(text)
            .map_err(|e| e.to_string())
            .and_then(|items| decode_elements(&items))
            .or_else(|nested| serde_json::from_str::<Vec<T>>(text).map_err(|_| nested)),
        ListEncoding::LegacyBracketed => {
            legacy_elements(text).and_then(|items| decode_elements(&items))
        }
    };
    decoded.map_err(|message| {
        log::error!(
            "[GEP] decode: model {} ({:?}) failed: {} raw={:?}",
            field,
            encoding,
            message,
            text
        );
        ScenarioError::Decode {
            field: field.to_string(),
            raw: text.to_string(),
            message,
        }
    })
}

fn decode_elements<T: DeserializeOwned>(items: &[String]) -> std::result::Result<Vec<T>, String> {
    items
        .iter()
        .map(|item| serde_json::from_str::<T>(item).map_err(|e| format!("element {:?}: {}", item, e)))
        .collect()
}

/// Split `['a', 'b\'c']` into its unquoted elements.
///
/// The outer brackets are stripped, each quoted element is unescaped and
/// the result is rebuilt as a JSON array of strings before being read back,
/// so element text goes through the same decoder as the other encodings.
fn legacy_elements(raw: &str) -> std::result::Result<Vec<String>, String> {
    let inner = raw
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| "legacy list is not bracketed".to_string())?;

    let mut items = Vec::new();
    let mut chars = inner.chars().peekable();
    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace() || *c == ',') {
            chars.next();
        }
        let quote = match chars.next() {
            None => break,
            Some(q @ ('\'' | '"')) => q,
            Some(c) => return Err(format!("unexpected {:?} outside quotes", c)),
        };
        let mut item = String::new();
        loop {
            match chars.next() {
                None => return Err("unterminated element".to_string()),
                Some('\\') => match chars.next() {
                    Some(escaped) => item.push(escaped),
                    None => return Err("dangling escape".to_string()),
                },
                Some(c) if c == quote => break,
                Some(c) => item.push(c),
            }
        }
        items.push(Value::String(item));
    }

    let wrapped = Value::Array(items).to_string();
    serde_json::from_str::<Vec<String>>(&wrapped).map_err(|e| e.to_string())
}
