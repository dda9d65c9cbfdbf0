use thiserror::Error;

use crate::KeyType;

/// Recoverable host-facing blackboard errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlackboardError {
    #[error("blackboard `{template}` has no key named `{key}`")]
    UnknownKey { template: String, key: String },

    #[error("key `{key}` holds {actual} values, not {expected}")]
    TypeMismatch {
        key: String,
        expected: KeyType,
        actual: KeyType,
    },
}

/// A behavior function failed while being evaluated.
///
/// Faults never propagate past the frame that raised them: the caller logs them and degrades to
/// "false", "score 0" or "no effect".
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FunctionFault {
    #[error("parameter block exhausted while reading {wanted}")]
    ParamsExhausted { wanted: &'static str },

    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    #[error("{0}")]
    Failed(String),

    #[error("function panicked: {0}")]
    Panicked(String),
}
