//! User-supplied feature filters.
//!
//! Filters arrive either as a JSON array in the `filters` query parameter
//! or, from older clients, as bracket-indexed query-string keys:
//!
//! ```text
//! filters[0][key]=Pop&filters[0][max]=83968&filters[1][key]=Region&filters[1][options]=Coast
//! ```

use crate::{Result, ScenarioError};
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// One filter on the scenario's feature rows.
///
/// `min` and `max` are inclusive bounds and may be combined; `options` is
/// a set of allowed values. At least one of the three must be present.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterRequest {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(
        default,
        deserialize_with = "options_from_scalars",
        skip_serializing_if = "Option::is_none"
    )]
    pub options: Option<Vec<String>>,
}

impl FilterRequest {
    /// Options, or `None` when the list is missing or empty.
    pub fn options(&self) -> Option<&[String]> {
        self.options.as_deref().filter(|o| !o.is_empty())
    }

    pub fn validate(&self) -> Result<()> {
        if self.min.is_none() && self.max.is_none() && self.options().is_none() {
            return Err(ScenarioError::InvalidFilter(format!(
                "filter {:?} must include a valid value parameter name: \"min\", \"max\" or \"options\"",
                self.key
            )));
        }
        Ok(())
    }
}

/// Accept option lists mixing strings and numbers (`["Coast", 2]`).
fn options_from_scalars<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Number(serde_json::Number),
        Bool(bool),
    }

    let raw: Option<Vec<Scalar>> = Option::deserialize(deserializer)?;
    Ok(raw.map(|items| {
        items
            .into_iter()
            .map(|item| match item {
                Scalar::Text(s) => s,
                Scalar::Number(n) => n.to_string(),
                Scalar::Bool(b) => b.to_string(),
            })
            .collect()
    }))
}

/// Decode the JSON form of the `filters` parameter.
pub fn parse_json_filters(raw: &str) -> Result<Vec<FilterRequest>> {
    serde_json::from_str(raw)
        .map_err(|e| ScenarioError::MalformedInput(format!("filters parameter: {}", e)))
}

/// Pick the filters for a request: the structured ones when there are any,
/// otherwise whatever the legacy bracket keys in `raw_query` describe.
pub fn resolve_filters(
    native: Option<Vec<FilterRequest>>,
    raw_query: Option<&str>,
) -> Result<Vec<FilterRequest>> {
    match native {
        Some(filters) if !filters.is_empty() => Ok(filters),
        _ => match raw_query {
            Some(raw) => decode_legacy_filters(raw),
            None => Ok(Vec::new()),
        },
    }
}

/// Rebuild filters from bracket-indexed query-string keys.
///
/// Every `filters[...]` pair is URL-decoded, the leading `filters[` is
/// stripped and the rest is split on `[`/`]` into an index and a field.
/// A field repeated for one index accumulates into a list.
pub fn decode_legacy_filters(raw_query: &str) -> Result<Vec<FilterRequest>> {
    let mut by_index: BTreeMap<usize, BTreeMap<String, Vec<String>>> = BTreeMap::new();

    for token in raw_query.trim_start_matches('?').split('&') {
        let (raw_key, raw_value) = token.split_once('=').unwrap_or((token, ""));
        let key = url_decode(raw_key)?;
        let rest = match key.strip_prefix("filters[") {
            Some(rest) => rest,
            None => continue,
        };
        let value = url_decode(raw_value)?;

        let mut parts = rest.split(|c| c == '[' || c == ']').filter(|p| !p.is_empty());
        let index = parts
            .next()
            .and_then(|i| i.parse::<usize>().ok())
            .ok_or_else(|| ScenarioError::MalformedInput(format!("filter key {:?} has no index", key)))?;
        let field = parts
            .next()
            .ok_or_else(|| ScenarioError::MalformedInput(format!("filter key {:?} has no field", key)))?;

        by_index
            .entry(index)
            .or_default()
            .entry(field.to_string())
            .or_default()
            .push(value);
    }

    by_index
        .into_iter()
        .map(|(index, mut fields)| {
            let key = fields
                .remove("key")
                .and_then(|v| v.into_iter().next())
                .ok_or_else(|| ScenarioError::MalformedInput(format!("filters[{}] has no key", index)))?;
            let min = legacy_number(index, "min", fields.remove("min"))?;
            let max = legacy_number(index, "max", fields.remove("max"))?;
            let options = fields.remove("options");
            for field in fields.keys() {
                log::debug!("[GEP] filters[{}]: ignoring field {:?}", index, field);
            }
            Ok(FilterRequest {
                key,
                min,
                max,
                options,
            })
        })
        .collect()
}

fn url_decode(raw: &str) -> Result<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| ScenarioError::MalformedInput(format!("{:?}: {}", raw, e)))
}

fn legacy_number(index: usize, field: &str, values: Option<Vec<String>>) -> Result<Option<f64>> {
    match values.as_deref() {
        None | Some([]) => Ok(None),
        Some([value, ..]) => value.trim().parse::<f64>().map(Some).map_err(|_| {
            ScenarioError::MalformedInput(format!(
                "filters[{}][{}] is not a number: {:?}",
                index, field, value
            ))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_single_filter() {
        let filters = decode_legacy_filters("filters[0][key]=Pop&filters[0][max]=100").unwrap();
        assert_eq!(
            filters,
            vec![FilterRequest {
                key: "Pop".into(),
                max: Some(100.0),
                ..Default::default()
            }]
        );
    }

    #[test]
    fn legacy_options_accumulate_and_decode() {
        let raw = "year=2025&filters%5B1%5D%5Bkey%5D=Region\
                   &filters[1][options]=Rift+Valley&filters[1][options][]=Coast%20North\
                   &filters[0][key]=Pop&filters[0][min]=10&filters[0][max]=83968";
        let filters = decode_legacy_filters(raw).unwrap();
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].key, "Pop");
        assert_eq!(filters[0].min, Some(10.0));
        assert_eq!(filters[0].max, Some(83968.0));
        assert_eq!(filters[1].key, "Region");
        assert_eq!(
            filters[1].options,
            Some(vec!["Rift+Valley".to_string(), "Coast North".to_string()])
        );
    }

    #[test]
    fn legacy_without_filters_is_empty() {
        assert!(decode_legacy_filters("year=2030").unwrap().is_empty());
        assert!(decode_legacy_filters("").unwrap().is_empty());
    }

    #[test]
    fn legacy_malformed_inputs() {
        for raw in [
            "filters[x][key]=Pop",
            "filters[0]=Pop",
            "filters[0][max]=100",
            "filters[0][key]=Pop&filters[0][min]=lots",
            "filters[0][key]=%FF",
        ] {
            let err = decode_legacy_filters(raw).unwrap_err();
            assert!(
                matches!(err, ScenarioError::MalformedInput(_)),
                "{raw} gave {err:?}"
            );
        }
    }

    #[test]
    fn json_filters_accept_numeric_options() {
        let filters =
            parse_json_filters(r#"[{"key":"ElecType","options":[1,"2"]},{"key":"Pop","min":5}]"#)
                .unwrap();
        assert_eq!(filters[0].options, Some(vec!["1".to_string(), "2".to_string()]));
        assert_eq!(filters[1].min, Some(5.0));
        assert!(matches!(
            parse_json_filters("[{"),
            Err(ScenarioError::MalformedInput(_))
        ));
    }

    #[test]
    fn native_filters_take_precedence() {
        let native = vec![FilterRequest {
            key: "GridDist".into(),
            max: Some(5.0),
            ..Default::default()
        }];
        let resolved =
            resolve_filters(Some(native.clone()), Some("filters[0][key]=Pop&filters[0][max]=1"))
                .unwrap();
        assert_eq!(resolved, native);

        let resolved =
            resolve_filters(Some(Vec::new()), Some("filters[0][key]=Pop&filters[0][max]=1"))
                .unwrap();
        assert_eq!(resolved[0].key, "Pop");
        assert!(resolve_filters(None, None).unwrap().is_empty());
    }

    #[test]
    fn validate_requires_a_value() {
        let empty = FilterRequest {
            key: "Pop".into(),
            options: Some(Vec::new()),
            ..Default::default()
        };
        assert!(matches!(empty.validate(), Err(ScenarioError::InvalidFilter(_))));

        let bounded = FilterRequest {
            key: "Pop".into(),
            min: Some(0.0),
            ..Default::default()
        };
        assert!(bounded.validate().is_ok());
    }
}
