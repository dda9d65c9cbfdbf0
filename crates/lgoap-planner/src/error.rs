use thiserror::Error;

/// Recoverable errors surfaced to the host by agents and the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlannerError {
    #[error("domain `{domain}` is compiled for template `{expected}`, blackboard uses `{actual}`")]
    LayoutMismatch {
        domain: String,
        expected: String,
        actual: String,
    },

    #[error("layer {layer} is out of range; domain has {layer_count} layer(s)")]
    UnknownLayer { layer: usize, layer_count: usize },

    #[error("domain `{domain}` has been disposed")]
    DomainDisposed { domain: String },

    #[error("invalid planner config: {reason}")]
    InvalidConfig { reason: String },
}

pub type Result<T> = core::result::Result<T, PlannerError>;
