//! Filter error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid filter JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Filter JSON exceeds maximum size of {max} bytes")]
    TooLarge { max: usize },

    #[error("Filter nesting depth {depth} exceeds maximum of {max}")]
    TooDeep { depth: usize, max: usize },

    #[error("Filter has {count} conditions, maximum is {max}")]
    TooManyConditions { count: usize, max: usize },

    #[error("Cannot filter by field: {0}")]
    FieldNotAllowed(String),

    #[error("No filter conditions found in URL parameters")]
    NoConditions,

    #[error("Invalid value for filter condition {index}: {source}")]
    InvalidValue {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}
