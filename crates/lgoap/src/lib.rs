//! Umbrella crate that re-exports the `lgoap-*` building blocks.
//!
//! Most users want `full`: [`core`] for blackboards and behavior functions, [`planner`] for
//! domains and agents, [`tools`] for trace events and the compile registry.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

#[cfg(feature = "core")]
#[cfg_attr(docsrs, doc(cfg(feature = "core")))]
pub use lgoap_core as core;

#[cfg(feature = "tools")]
#[cfg_attr(docsrs, doc(cfg(feature = "tools")))]
pub use lgoap_tools as tools;

#[cfg(feature = "planner")]
#[cfg_attr(docsrs, doc(cfg(feature = "planner")))]
pub use lgoap_planner as planner;

/// The types needed to author a domain and tick an agent.
#[cfg(feature = "planner")]
#[cfg_attr(docsrs, doc(cfg(feature = "planner")))]
pub mod prelude {
    pub use lgoap_core::builtins::{self, Comparison};
    pub use lgoap_core::{
        Blackboard, BlackboardTemplate, Decorator, Effector, FunctionTable, KeyDecl,
        ScoreCalculator, TemplateLibrary, TickContext,
    };
    pub use lgoap_planner::{
        CompiledDomain, ContainerSelection, DomainDefinition, FallbackPlan, Goal, LgoapAgent,
        LgoapRuntime, PlanResultKind, PlannerConfig, PlanningMode, Task, TaskLayer,
    };
}
