//! Filter-condition engine
//!
//! Evaluates AND/OR trees of field conditions against JSON records and
//! flattens them into URL parameters for search pages.
//!
//! ## Usage
//!
//! ```
//! use serde_json::json;
//! use sieve::domain::filters::{FilterCondition, FilterGroup, Operator, apply_filter};
//!
//! let data = vec![json!({"a": 1}), json!({"a": 2}), json!({"a": 3})];
//! let group = FilterGroup::and(vec![FilterCondition::new("a", Operator::Gt, json!(1))]);
//! assert_eq!(apply_filter(&data, &group).len(), 2);
//! ```

mod error;
mod evaluate;
mod parser;
mod types;
mod url_params;

pub use error::FilterError;
pub use evaluate::{apply_filter, evaluate_condition, evaluate_group};
pub use parser::{
    DEFAULT_MAX_FILTER_CONDITIONS, DEFAULT_MAX_FILTER_DEPTH, DEFAULT_MAX_FILTER_JSON_SIZE,
    FilterLimits, parse_filter_group, validate_filter_group,
};
pub use types::{FilterCondition, FilterGroup, FilterLogic, Operator};
pub use url_params::{
    UrlParams, filter_group_to_url_params, parse_query_string, parse_url_params,
    to_query_string, url_params_to_filter_group,
};
