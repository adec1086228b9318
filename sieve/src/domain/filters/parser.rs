//! Filter parsing
//!
//! Parses JSON filter groups with size, depth and field validation.

use super::error::FilterError;
use super::types::FilterGroup;

/// Maximum size of filter JSON in bytes (64KB)
pub const DEFAULT_MAX_FILTER_JSON_SIZE: usize = 64 * 1024;

/// Maximum nesting depth of groups
pub const DEFAULT_MAX_FILTER_DEPTH: usize = 16;

/// Maximum number of conditions across the whole tree
pub const DEFAULT_MAX_FILTER_CONDITIONS: usize = 50;

/// Bounds applied when parsing untrusted filter JSON
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterLimits {
    pub max_json_bytes: usize,
    pub max_depth: usize,
    pub max_conditions: usize,
    /// Field whitelist. `None` allows any field.
    pub allowed_fields: Option<Vec<String>>,
}

impl Default for FilterLimits {
    fn default() -> Self {
        Self {
            max_json_bytes: DEFAULT_MAX_FILTER_JSON_SIZE,
            max_depth: DEFAULT_MAX_FILTER_DEPTH,
            max_conditions: DEFAULT_MAX_FILTER_CONDITIONS,
            allowed_fields: None,
        }
    }
}

impl FilterLimits {
    /// A field passes when its full path or its first segment is whitelisted.
    fn field_allowed(&self, field: &str) -> bool {
        let Some(allowed) = &self.allowed_fields else {
            return true;
        };
        let root = field.split('.').next().unwrap_or(field);
        allowed.iter().any(|a| a == field || a == root)
    }
}

/// Parse a filter group from JSON text
pub fn parse_filter_group(json_str: &str, limits: &FilterLimits) -> Result<FilterGroup, FilterError> {
    if json_str.len() > limits.max_json_bytes {
        return Err(FilterError::TooLarge {
            max: limits.max_json_bytes,
        });
    }

    let group: FilterGroup = serde_json::from_str(json_str)?;
    validate_filter_group(&group, limits)?;

    tracing::debug!(
        conditions = group.condition_count(),
        depth = group.depth(),
        "Parsed filter group"
    );
    Ok(group)
}

/// Check an already-built group against the limits
pub fn validate_filter_group(group: &FilterGroup, limits: &FilterLimits) -> Result<(), FilterError> {
    let depth = group.depth();
    if depth > limits.max_depth {
        return Err(FilterError::TooDeep {
            depth,
            max: limits.max_depth,
        });
    }

    let count = group.condition_count();
    if count > limits.max_conditions {
        return Err(FilterError::TooManyConditions {
            count,
            max: limits.max_conditions,
        });
    }

    if let Some(condition) = group
        .walk_conditions()
        .find(|c| !limits.field_allowed(&c.field))
    {
        return Err(FilterError::FieldNotAllowed(condition.field.clone()));
    }

    Ok(())
}
