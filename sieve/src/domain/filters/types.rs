//! Filter type definitions
//!
//! Defines the condition/group tree evaluated against JSON records.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Comparison operator of a single condition.
///
/// Wire names are the camelCase strings used by the console search
/// components. Unrecognised names are kept verbatim in `Unknown` so they
/// survive a URL round trip and evaluate fail-open.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    In,
    NotIn,
    IsNull,
    IsNotNull,
    Between,
    Unknown(String),
}

impl Operator {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Contains => "contains",
            Self::NotContains => "notContains",
            Self::StartsWith => "startsWith",
            Self::EndsWith => "endsWith",
            Self::In => "in",
            Self::NotIn => "notIn",
            Self::IsNull => "isNull",
            Self::IsNotNull => "isNotNull",
            Self::Between => "between",
            Self::Unknown(name) => name,
        }
    }

    /// Parse a wire name. Never fails; unrecognised names become `Unknown`.
    pub fn parse(name: &str) -> Self {
        match name {
            "eq" => Self::Eq,
            "ne" => Self::Ne,
            "gt" => Self::Gt,
            "gte" => Self::Gte,
            "lt" => Self::Lt,
            "lte" => Self::Lte,
            "contains" => Self::Contains,
            "notContains" => Self::NotContains,
            "startsWith" => Self::StartsWith,
            "endsWith" => Self::EndsWith,
            "in" => Self::In,
            "notIn" => Self::NotIn,
            "isNull" => Self::IsNull,
            "isNotNull" => Self::IsNotNull,
            "between" => Self::Between,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl From<String> for Operator {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        match op {
            Operator::Unknown(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a group combines the results of its members.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterLogic {
    #[default]
    And,
    Or,
}

impl FilterLogic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }

    /// Case-insensitive parse of `and`/`or`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            _ => None,
        }
    }
}

impl fmt::Display for FilterLogic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field/operator/value test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    /// Dotted path into the record, e.g. `profile.address.city`.
    pub field: String,
    pub operator: Operator,
    #[serde(default)]
    pub value: JsonValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl FilterCondition {
    pub fn new(field: impl Into<String>, operator: Operator, value: JsonValue) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Recursive AND/OR combination of conditions and nested groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterGroup {
    pub logic: FilterLogic,
    #[serde(default)]
    pub conditions: Vec<FilterCondition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<FilterGroup>,
}

impl FilterGroup {
    pub fn new(logic: FilterLogic, conditions: Vec<FilterCondition>) -> Self {
        Self {
            logic,
            conditions,
            groups: Vec::new(),
        }
    }

    pub fn and(conditions: Vec<FilterCondition>) -> Self {
        Self::new(FilterLogic::And, conditions)
    }

    pub fn or(conditions: Vec<FilterCondition>) -> Self {
        Self::new(FilterLogic::Or, conditions)
    }

    pub fn with_condition(mut self, condition: FilterCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_group(mut self, group: FilterGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// True when the group has neither conditions nor sub-groups.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.groups.is_empty()
    }

    /// Nesting depth; a group without sub-groups has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.groups.iter().map(FilterGroup::depth).max().unwrap_or(0)
    }

    /// Total number of conditions in this group and all descendants.
    pub fn condition_count(&self) -> usize {
        self.conditions.len()
            + self
                .groups
                .iter()
                .map(FilterGroup::condition_count)
                .sum::<usize>()
    }

    /// Iterate over every condition in the tree, depth first.
    pub fn walk_conditions(&self) -> Box<dyn Iterator<Item = &FilterCondition> + '_> {
        Box::new(
            self.conditions
                .iter()
                .chain(self.groups.iter().flat_map(|g| g.walk_conditions())),
        )
    }
}
