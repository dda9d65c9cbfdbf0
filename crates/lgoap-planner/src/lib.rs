//! Layered goal/action planner over compiled LGOAP domains.
//!
//! A [`DomainDefinition`] is validated and compiled into one immutable [`CompiledDomain`]
//! buffer shared by every agent. Each [`LgoapAgent`] tick selects the most insistent goal and
//! runs an IDA* search per task layer, top-down, against its parent container's target. Passes
//! run inline or on a worker thread ([`PlanningMode`]) and are published as per-layer
//! [`PlanResultKind`] diffs.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod agent;
pub mod compiled;
pub mod compiler;
pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod job;
pub mod plan;
pub mod planner;
pub mod reader;

pub use agent::{LgoapAgent, PlannerState};
pub use compiled::CompiledDomain;
pub use config::{PlannerConfig, PlanningMode};
pub use context::{ActiveAgent, AgentId, LgoapRuntime};
pub use domain::{Action, DomainDefinition, FallbackPlan, Goal, Task, TaskLayer, MAX_PLAN_SIZE_LIMIT};
pub use error::{PlannerError, Result};
pub use job::{JobRegistry, JobSlot, JobTicket};
pub use plan::{ContainerSelection, LayerPlan, PlanResultKind, PlanSet, PlannerResult};
pub use planner::{plan_pass, select_goal, PassRequest, PlannerWorkspace};
pub use reader::{ActionView, DomainView, GoalLayerView, TargetView, TaskLayerView};
