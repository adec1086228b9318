//! Filter evaluation
//!
//! Evaluates condition/group trees against JSON records. Evaluation is pure:
//! nothing here mutates the record or the tree.

use std::cmp::Ordering;

use serde_json::Value as JsonValue;

use crate::utils::json::{compare_values, is_blank, resolve_path, strict_eq, to_text};

use super::types::{FilterCondition, FilterGroup, FilterLogic, Operator};

/// Return the records matching `group`, in their original order.
///
/// A top-level group with no conditions and no sub-groups matches every
/// record regardless of its logic.
pub fn apply_filter<'a>(data: &'a [JsonValue], group: &FilterGroup) -> Vec<&'a JsonValue> {
    if group.is_empty() {
        return data.iter().collect();
    }

    let matched: Vec<&JsonValue> = data
        .iter()
        .filter(|record| evaluate_group(record, group))
        .collect();

    tracing::debug!(
        total = data.len(),
        matched = matched.len(),
        logic = %group.logic,
        "Applied filter"
    );
    matched
}

/// Evaluate a group: AND requires every member to hold, OR any member.
///
/// Members are the direct conditions followed by the nested groups. An empty
/// group is true under AND and false under OR.
pub fn evaluate_group(record: &JsonValue, group: &FilterGroup) -> bool {
    let conditions = group
        .conditions
        .iter()
        .map(|condition| evaluate_condition(record, condition));
    let groups = group.groups.iter().map(|sub| evaluate_group(record, sub));
    let mut results = conditions.chain(groups);

    match group.logic {
        FilterLogic::And => results.all(|r| r),
        FilterLogic::Or => results.any(|r| r),
    }
}

/// Evaluate a single condition against a record.
pub fn evaluate_condition(record: &JsonValue, condition: &FilterCondition) -> bool {
    let item = resolve_path(record, &condition.field);
    let value = &condition.value;

    match &condition.operator {
        Operator::Eq => item.is_some_and(|v| strict_eq(v, value)),
        Operator::Ne => !item.is_some_and(|v| strict_eq(v, value)),
        Operator::Gt => ordering(item, value).is_some_and(Ordering::is_gt),
        Operator::Gte => ordering(item, value).is_some_and(Ordering::is_ge),
        Operator::Lt => ordering(item, value).is_some_and(Ordering::is_lt),
        Operator::Lte => ordering(item, value).is_some_and(Ordering::is_le),
        Operator::Contains => text_match(item, value, |h, n| h.contains(n)),
        Operator::NotContains => !text_match(item, value, |h, n| h.contains(n)),
        Operator::StartsWith => text_match(item, value, |h, n| h.starts_with(n)),
        Operator::EndsWith => text_match(item, value, |h, n| h.ends_with(n)),
        Operator::In => membership(item, value).unwrap_or(false),
        Operator::NotIn => membership(item, value).is_some_and(|found| !found),
        Operator::IsNull => is_blank(item),
        Operator::IsNotNull => !is_blank(item),
        Operator::Between => between(item, value),
        Operator::Unknown(name) => {
            tracing::debug!(operator = %name, field = %condition.field, "Unknown operator, passing");
            true
        }
    }
}

fn ordering(item: Option<&JsonValue>, value: &JsonValue) -> Option<Ordering> {
    compare_values(item?, value)
}

fn text_match(item: Option<&JsonValue>, value: &JsonValue, test: fn(&str, &str) -> bool) -> bool {
    let haystack = item.map(to_text).unwrap_or_default().to_lowercase();
    let needle = to_text(value).to_lowercase();
    test(&haystack, &needle)
}

/// `None` when the operand is not an array.
fn membership(item: Option<&JsonValue>, value: &JsonValue) -> Option<bool> {
    let candidates = value.as_array()?;
    Some(item.is_some_and(|v| candidates.iter().any(|c| strict_eq(v, c))))
}

fn between(item: Option<&JsonValue>, value: &JsonValue) -> bool {
    let Some([low, high]) = value.as_array().map(Vec::as_slice) else {
        return false;
    };

    ordering(item, low).is_some_and(Ordering::is_ge)
        && ordering(item, high).is_some_and(Ordering::is_le)
}
