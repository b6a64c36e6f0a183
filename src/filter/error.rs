use thiserror::Error;

/// Errors raised while decoding, validating or compiling a filter tree
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FilterError {
    #[error("Empty filter: at least one condition is required")]
    EmptyFilter,

    #[error(
        "Unknown filter operator: '{0}'. Valid operators are: eq, ne, gt, ge, lt, le, startswith, endswith, like, ilike, notlike, notilike, in_, notin_"
    )]
    UnknownOperator(String),

    #[error("Malformed filter: {0}")]
    MalformedFilter(String),

    #[error("Filter nesting exceeds the maximum depth of {0}")]
    TooDeep(usize),

    #[error("Operation \"{op}\" is not permitted for type \"{kind}\" (field '{field}')")]
    OperatorNotPermitted {
        field: String,
        op: String,
        kind: String,
    },

    #[error("Unknown filter field: '{0}'")]
    UnknownField(String),
}

/// Errors raised while a compiled predicate is evaluated against a record
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("Operator '{op}' cannot be applied to field '{field}': {reason}")]
    Type {
        op: &'static str,
        field: String,
        reason: String,
    },

    #[error("Field '{0}' is missing from the record")]
    MissingField(String),
}
