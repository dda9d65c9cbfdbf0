//! Structured authoring-error reports.
//!
//! Validation never throws and never mutates authored data: every problem found is collected into a
//! [`ValidationReport`], and compilation is refused while the report is non-empty.

use thiserror::Error;

use crate::{FunctionKind, KeyType, ParamKind};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationIssue {
    #[error("template `{template}` is not defined")]
    UnknownTemplate { template: String },

    #[error("template `{template}` inherits from undefined template `{parent}`")]
    MissingParent { template: String, parent: String },

    #[error("cyclic template inheritance at `{template}` ({})", .chain.join(" -> "))]
    CyclicInheritance { template: String, chain: Vec<String> },

    #[error("template `{template}` has an empty key slot at position {slot}")]
    EmptyKey { template: String, slot: usize },

    #[error("key `{key}` in template `{template}` has an invalid type")]
    InvalidKeyType { template: String, key: String },

    #[error("key `{key}` in template `{template}` is {expected} but its default is {actual}")]
    DefaultTypeMismatch {
        template: String,
        key: String,
        expected: KeyType,
        actual: KeyType,
    },

    #[error("key `{key}` in template `{template}` duplicates the key declared by `{first_declared_in}`")]
    DuplicateKey {
        key: String,
        template: String,
        first_declared_in: String,
    },

    #[error("domain `{domain}` targets template `{expected}` but was given `{actual}`")]
    TemplateMismatch {
        domain: String,
        expected: String,
        actual: String,
    },

    #[error("domain `{domain}` declares no goals")]
    NoGoals { domain: String },

    #[error("domain `{domain}` has {count} layers; at most 255 are supported")]
    TooManyLayers { domain: String, count: usize },

    #[error("layer {layer} declares no tasks")]
    EmptyLayer { layer: usize },

    #[error("task `{task}` in layer {layer} has the wrong abstract flag (expected abstract: {expected_abstract})")]
    AbstractMismatch {
        layer: usize,
        task: String,
        expected_abstract: bool,
    },

    #[error("layer {layer} has max plan size {size}; expected 1..=255")]
    InvalidMaxPlanSize { layer: usize, size: usize },

    #[error("{owner}: no {kind} named `{function}` is registered")]
    MissingFunction {
        owner: String,
        kind: FunctionKind,
        function: String,
    },

    #[error("{owner}: `{function}` takes {expected} parameter(s), {actual} given")]
    ParamCountMismatch {
        owner: String,
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error("{owner}: parameter {index} of `{function}` must be {expected}, got {actual}")]
    ParamKindMismatch {
        owner: String,
        function: String,
        index: usize,
        expected: ParamKind,
        actual: &'static str,
    },

    #[error("{owner}: blackboard has no key named `{key}`")]
    UnknownKey { owner: String, key: String },

    #[error("{owner}: key `{key}` is {actual}, expected {expected}")]
    KeyTypeMismatch {
        owner: String,
        key: String,
        expected: KeyType,
        actual: KeyType,
    },

    #[error("fallback plan expects {expected} layer(s), got {actual}")]
    FallbackLayerCount { expected: usize, actual: usize },

    #[error("fallback plan for layer {layer} references container {container}, layer has {available}")]
    InvalidFallback {
        layer: usize,
        container: usize,
        available: usize,
    },

    #[error("fallback plan for layer {layer} has {length} step(s), layer allows {max}")]
    FallbackTooLong {
        layer: usize,
        length: usize,
        max: usize,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Error)]
#[error("validation failed with {} issue(s)", .issues.len())]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Records `issue` unless an identical one was already reported.
    pub fn push_unique(&mut self, issue: ValidationIssue) {
        if !self.issues.contains(&issue) {
            self.issues.push(issue);
        }
    }

    pub fn extend(&mut self, other: ValidationReport) {
        for issue in other.issues {
            self.push_unique(issue);
        }
    }

    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<ValidationIssue> {
        self.issues
    }

    /// `Ok(value)` when nothing was reported.
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationReport> {
        if self.is_ok() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}
