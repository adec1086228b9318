//! URL parameter encoding for filter groups
//!
//! A group is flattened into `filter[i][field]`, `filter[i][operator]`,
//! `filter[i][value]` and `filter[logic]` keys. Only top-level conditions are
//! encoded: nested groups and labels do not survive the round trip.

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;

use crate::utils::json::to_canonical_json;

use super::error::FilterError;
use super::types::{FilterCondition, FilterGroup, FilterLogic, Operator};

/// Flat string-keyed parameters as they appear in a query string.
pub type UrlParams = BTreeMap<String, String>;

const LOGIC_KEY: &str = "filter[logic]";

fn key(index: usize, part: &str) -> String {
    format!("filter[{}][{}]", index, part)
}

/// Serialize the top-level conditions and logic of `group`.
///
/// Values are JSON encoded, so `30` becomes `"30"` and `"abc"` becomes
/// `"\"abc\""`.
pub fn filter_group_to_url_params(group: &FilterGroup) -> UrlParams {
    if !group.groups.is_empty() {
        tracing::debug!(
            dropped = group.groups.len(),
            "Nested filter groups are not encoded in URL params"
        );
    }

    let mut params = UrlParams::new();
    for (i, condition) in group.conditions.iter().enumerate() {
        params.insert(key(i, "field"), condition.field.clone());
        params.insert(key(i, "operator"), condition.operator.to_string());
        params.insert(key(i, "value"), to_canonical_json(&condition.value));
    }
    params.insert(LOGIC_KEY.to_string(), group.logic.to_string());
    params
}

/// Rebuild a flat group from URL params, returning the failure as an error.
///
/// Indices are scanned from 0 until the first missing `field` key. A missing
/// operator falls back to `eq`; a missing or unrecognised logic falls back to
/// AND.
pub fn parse_url_params(params: &UrlParams) -> Result<FilterGroup, FilterError> {
    let mut conditions = Vec::new();

    for index in 0.. {
        let Some(field) = params.get(&key(index, "field")) else {
            break;
        };
        let operator = params
            .get(&key(index, "operator"))
            .map(|op| Operator::parse(op))
            .unwrap_or(Operator::Eq);
        let raw_value = params.get(&key(index, "value")).map_or("", String::as_str);
        let value: JsonValue = serde_json::from_str(raw_value)
            .map_err(|source| FilterError::InvalidValue { index, source })?;

        conditions.push(FilterCondition::new(field.clone(), operator, value));
    }

    if conditions.is_empty() {
        return Err(FilterError::NoConditions);
    }

    let logic = match params.get(LOGIC_KEY) {
        None => FilterLogic::And,
        Some(raw) => FilterLogic::parse(raw).unwrap_or_else(|| {
            tracing::warn!(logic = %raw, "Unrecognised filter logic, using AND");
            FilterLogic::And
        }),
    };

    Ok(FilterGroup::new(logic, conditions))
}

/// Rebuild a flat group from URL params.
///
/// Returns `None` when no condition is present or any value is not valid
/// JSON. Failures are logged, never propagated.
pub fn url_params_to_filter_group(params: &UrlParams) -> Option<FilterGroup> {
    match parse_url_params(params) {
        Ok(group) => Some(group),
        Err(FilterError::NoConditions) => None,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to parse filter URL params");
            None
        }
    }
}

/// Encode params as a query string (without the leading `?`).
pub fn to_query_string(params: &UrlParams) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Decode a query string into params.
///
/// Accepts an optional leading `?`, treats `+` as a space and skips pairs
/// that fail percent decoding. Later duplicates overwrite earlier ones.
pub fn parse_query_string(query: &str) -> UrlParams {
    let query = query.trim().trim_start_matches('?');
    let mut params = UrlParams::new();

    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        match (decode_component(raw_key), decode_component(raw_value)) {
            (Some(k), Some(v)) => {
                params.insert(k, v);
            }
            _ => tracing::debug!(pair = %pair, "Skipping undecodable query pair"),
        }
    }
    params
}

fn decode_component(raw: &str) -> Option<String> {
    urlencoding::decode(&raw.replace('+', " "))
        .ok()
        .map(|s| s.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> UrlParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn serializes_single_condition() {
        let group = FilterGroup::and(vec![FilterCondition::new("age", Operator::Eq, json!(30))]);

        let result = filter_group_to_url_params(&group);
        assert_eq!(
            result,
            params(&[
                ("filter[0][field]", "age"),
                ("filter[0][operator]", "eq"),
                ("filter[0][value]", "30"),
                ("filter[logic]", "and"),
            ])
        );
    }

    #[test]
    fn whole_float_values_encode_as_integers() {
        let group = FilterGroup::and(vec![
            FilterCondition::new("age", Operator::Eq, json!(30.0)),
            FilterCondition::new("score", Operator::In, json!([1.0, 2.5])),
        ]);
        let result = filter_group_to_url_params(&group);
        assert_eq!(result["filter[0][value]"], "30");
        assert_eq!(result["filter[1][value]"], "[1,2.5]");
    }

    #[test]
    fn string_values_are_json_encoded() {
        let group = FilterGroup::or(vec![FilterCondition::new(
            "name",
            Operator::Contains,
            json!("jo"),
        )]);
        let result = filter_group_to_url_params(&group);
        assert_eq!(result["filter[0][value]"], "\"jo\"");
        assert_eq!(result["filter[logic]"], "or");
    }

    #[test]
    fn round_trip_flat_group() {
        let group = FilterGroup::or(vec![
            FilterCondition::new("age", Operator::Between, json!([18, 65])),
            FilterCondition::new("role", Operator::In, json!(["admin", "owner"])),
            FilterCondition::new("deleted_at", Operator::IsNull, json!(null)),
            FilterCondition::new("name", Operator::Unknown("fuzzy".into()), json!("x")),
        ]);

        let decoded = url_params_to_filter_group(&filter_group_to_url_params(&group));
        assert_eq!(decoded, Some(group));
    }

    #[test]
    fn nested_groups_and_labels_are_dropped() {
        let group = FilterGroup::and(vec![
            FilterCondition::new("a", Operator::Eq, json!(1)).with_label("A"),
        ])
        .with_group(FilterGroup::or(vec![FilterCondition::new(
            "b",
            Operator::Eq,
            json!(2),
        )]));

        let encoded = filter_group_to_url_params(&group);
        assert!(!encoded.contains_key("filter[1][field]"));

        let decoded = url_params_to_filter_group(&encoded).unwrap();
        assert!(decoded.groups.is_empty());
        assert_eq!(decoded.conditions.len(), 1);
        assert_eq!(decoded.conditions[0].label, None);
    }

    #[test]
    fn scan_stops_at_first_gap() {
        let p = params(&[
            ("filter[0][field]", "a"),
            ("filter[0][operator]", "eq"),
            ("filter[0][value]", "1"),
            ("filter[2][field]", "c"),
            ("filter[2][operator]", "eq"),
            ("filter[2][value]", "3"),
        ]);
        let group = url_params_to_filter_group(&p).unwrap();
        assert_eq!(group.conditions.len(), 1);
        assert_eq!(group.logic, FilterLogic::And);
    }

    #[test]
    fn no_conditions_is_none() {
        assert_eq!(url_params_to_filter_group(&params(&[("filter[logic]", "or")])), None);
        assert!(matches!(
            parse_url_params(&UrlParams::new()),
            Err(FilterError::NoConditions)
        ));
    }

    #[test]
    fn invalid_json_value_fails_closed() {
        let p = params(&[
            ("filter[0][field]", "a"),
            ("filter[0][operator]", "eq"),
            ("filter[0][value]", "1"),
            ("filter[1][field]", "b"),
            ("filter[1][operator]", "eq"),
            ("filter[1][value]", "not json"),
        ]);
        assert_eq!(url_params_to_filter_group(&p), None);
        assert!(matches!(
            parse_url_params(&p),
            Err(FilterError::InvalidValue { index: 1, .. })
        ));
    }

    #[test]
    fn missing_value_fails_closed() {
        let p = params(&[("filter[0][field]", "a"), ("filter[0][operator]", "eq")]);
        assert_eq!(url_params_to_filter_group(&p), None);
    }

    #[test]
    fn missing_operator_defaults_to_eq() {
        let p = params(&[("filter[0][field]", "a"), ("filter[0][value]", "\"x\"")]);
        let group = url_params_to_filter_group(&p).unwrap();
        assert_eq!(group.conditions[0].operator, Operator::Eq);
        assert_eq!(group.conditions[0].value, json!("x"));
    }

    #[test]
    fn unknown_logic_defaults_to_and() {
        let p = params(&[
            ("filter[0][field]", "a"),
            ("filter[0][value]", "1"),
            ("filter[logic]", "xor"),
        ]);
        assert_eq!(url_params_to_filter_group(&p).unwrap().logic, FilterLogic::And);
    }

    #[test]
    fn query_string_round_trip() {
        let group = FilterGroup::and(vec![FilterCondition::new(
            "user.name",
            Operator::StartsWith,
            json!("Ann & Bo"),
        )]);
        let encoded = filter_group_to_url_params(&group);
        let query = to_query_string(&encoded);

        assert!(query.contains("filter%5B0%5D%5Bfield%5D=user.name"));
        assert_eq!(parse_query_string(&format!("?{}", query)), encoded);
    }

    #[test]
    fn parse_query_string_handles_plus_and_bare_keys() {
        let p = parse_query_string("a=hello+world&flag&&b=%22x%22");
        assert_eq!(p["a"], "hello world");
        assert_eq!(p["flag"], "");
        assert_eq!(p["b"], "\"x\"");
    }
}
