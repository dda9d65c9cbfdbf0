//! Tooling primitives for LGOAP agents.
//!
//! Engine-agnostic and lightweight: deterministic trace events recorded while planning, and a
//! side registry describing where each named object landed in a compiled buffer.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod registry;
pub mod trace;

pub use registry::{CompileRecord, CompileRegistry};
pub use trace::{NullTraceSink, TraceEvent, TraceLog, TraceSink, VecTraceSink};
