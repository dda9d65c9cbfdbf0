//! Authored domain hierarchy: goals, task layers and fallback plans.
//!
//! Hierarchy layers are numbered top-down: layer 0 is the goal layer, layers `1..n-1` are the
//! intermediate (abstract) task layers and layer `n-1` is the bottom (concrete) task layer.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use lgoap_core::function::{self, FrameCollection};
use lgoap_core::{
    BlackboardLayout, Decorator, Effector, FunctionTable, PrepareContext, ScoreCalculator,
    ValidationIssue, ValidationReport,
};

/// Largest plan a task layer may declare; plan lengths are stored in one byte.
pub const MAX_PLAN_SIZE_LIMIT: usize = u8::MAX as usize;

/// A top-level objective: how much it currently matters, and when it is satisfied.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Goal {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub insistence: Vec<ScoreCalculator>,
    /// No decorators makes the target fake: nothing is planned below this goal.
    #[cfg_attr(feature = "serde", serde(default))]
    pub target: Vec<Decorator>,
}

impl Goal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_insistence(mut self, score: ScoreCalculator) -> Self {
        self.insistence.push(score);
        self
    }

    pub fn with_target(mut self, decorator: Decorator) -> Self {
        self.target.push(decorator);
        self
    }
}

/// Precondition, cost and effect of a task, evaluated against scratch blackboards during search.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Action {
    #[cfg_attr(feature = "serde", serde(default))]
    pub precondition: Vec<Decorator>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cost: Vec<ScoreCalculator>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub effect: Vec<Effector>,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Task {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_abstract: bool,
    /// Only meaningful for abstract tasks: the target of the layer below.
    #[cfg_attr(feature = "serde", serde(default))]
    pub target: Vec<Decorator>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub action: Action,
}

impl Task {
    /// A bottom-layer task.
    pub fn concrete(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// An intermediate-layer task.
    pub fn abstract_task(name: impl Into<String>) -> Self {
        Self {
            is_abstract: true,
            ..Self::concrete(name)
        }
    }

    pub fn requires(mut self, decorator: Decorator) -> Self {
        self.action.precondition.push(decorator);
        self
    }

    pub fn costs(mut self, score: ScoreCalculator) -> Self {
        self.action.cost.push(score);
        self
    }

    pub fn effect(mut self, effector: Effector) -> Self {
        self.action.effect.push(effector);
        self
    }

    pub fn with_target(mut self, decorator: Decorator) -> Self {
        self.target.push(decorator);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TaskLayer {
    pub max_plan_size: usize,
    pub tasks: Vec<Task>,
}

impl TaskLayer {
    pub fn new(max_plan_size: usize) -> Self {
        Self {
            max_plan_size,
            tasks: Vec::new(),
        }
    }

    pub fn with_task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }
}

/// Container indices used for a layer whose search fails, one list per hierarchy layer.
///
/// The goal layer's list holds at most one goal index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct FallbackPlan {
    pub layers: Vec<Vec<usize>>,
}

impl FallbackPlan {
    /// Goal 0 and empty task plans.
    pub fn default_for(layer_count: usize) -> Self {
        let mut layers = vec![Vec::new(); layer_count];
        if let Some(goal) = layers.first_mut() {
            goal.push(0);
        }
        Self { layers }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DomainDefinition {
    pub name: String,
    /// Blackboard template this domain reads and writes.
    pub template: String,
    pub goals: Vec<Goal>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub intermediate_layers: Vec<TaskLayer>,
    pub bottom_layer: TaskLayer,
    #[cfg_attr(feature = "serde", serde(default))]
    pub fallback: Option<FallbackPlan>,
}

impl DomainDefinition {
    pub fn new(name: impl Into<String>, template: impl Into<String>, bottom_layer: TaskLayer) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            goals: Vec::new(),
            intermediate_layers: Vec::new(),
            bottom_layer,
            fallback: None,
        }
    }

    pub fn with_goal(mut self, goal: Goal) -> Self {
        self.goals.push(goal);
        self
    }

    /// Appends an intermediate layer below the existing ones.
    pub fn with_intermediate_layer(mut self, layer: TaskLayer) -> Self {
        self.intermediate_layers.push(layer);
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackPlan) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Goal layer + intermediate layers + bottom layer.
    pub fn layer_count(&self) -> usize {
        self.intermediate_layers.len() + 2
    }

    /// Task layers in hierarchy order, paired with their hierarchy layer number.
    pub fn task_layers(&self) -> impl Iterator<Item = (usize, &TaskLayer)> {
        self.intermediate_layers
            .iter()
            .chain(core::iter::once(&self.bottom_layer))
            .enumerate()
            .map(|(i, layer)| (i + 1, layer))
    }

    /// Containers at each hierarchy layer: goals, then tasks per layer.
    pub fn container_counts(&self) -> Vec<usize> {
        core::iter::once(self.goals.len())
            .chain(self.task_layers().map(|(_, l)| l.tasks.len()))
            .collect()
    }

    /// Plan capacity per hierarchy layer; the goal layer holds one goal.
    pub fn max_plan_sizes(&self) -> Vec<usize> {
        core::iter::once(1)
            .chain(self.task_layers().map(|(_, l)| l.max_plan_size))
            .collect()
    }

    pub fn fallback_or_default(&self) -> FallbackPlan {
        self.fallback
            .clone()
            .unwrap_or_else(|| FallbackPlan::default_for(self.layer_count()))
    }

    /// Checks the domain against the blackboard layout and function table it will be compiled
    /// with. Never mutates the definition.
    pub fn validate(&self, layout: &BlackboardLayout, functions: &FunctionTable) -> ValidationReport {
        let mut report = ValidationReport::new();
        self.prepare(layout, functions, &mut report);
        report
    }

    /// Validates and resolves every function chain; `None` when anything was reported.
    pub(crate) fn prepare(
        &self,
        layout: &BlackboardLayout,
        functions: &FunctionTable,
        report: &mut ValidationReport,
    ) -> Option<PreparedDomain> {
        if self.template != layout.template() {
            report.push(ValidationIssue::TemplateMismatch {
                domain: self.name.clone(),
                expected: self.template.clone(),
                actual: layout.template().to_string(),
            });
            return None;
        }

        if self.layer_count() > usize::from(u8::MAX) {
            report.push(ValidationIssue::TooManyLayers {
                domain: self.name.clone(),
                count: self.layer_count(),
            });
            return None;
        }

        let ctx = PrepareContext { layout, functions };
        let start = report.len();

        if self.goals.is_empty() {
            report.push(ValidationIssue::NoGoals {
                domain: self.name.clone(),
            });
        }
        let goals: Vec<Option<PreparedGoal>> = self
            .goals
            .iter()
            .map(|goal| {
                let owner = format!("goal `{}`", goal.name);
                let insistence = function::prepare_score_calculators(
                    &format!("{owner} insistence"),
                    &goal.insistence,
                    ctx,
                    report,
                );
                let target =
                    function::prepare_decorators(&format!("{owner} target"), &goal.target, ctx, report);
                Some(PreparedGoal {
                    name: goal.name.clone(),
                    insistence: insistence?,
                    target: PreparedTarget::new(target?),
                })
            })
            .collect();

        let bottom = self.layer_count() - 1;
        let layers: Vec<Option<PreparedLayer>> = self
            .task_layers()
            .map(|(index, layer)| self.prepare_layer(index, index != bottom, layer, ctx, report))
            .collect();

        self.check_fallback(report);

        if report.len() > start {
            return None;
        }
        Some(PreparedDomain {
            name: self.name.clone(),
            goals: goals.into_iter().collect::<Option<Vec<_>>>()?,
            layers: layers.into_iter().collect::<Option<Vec<_>>>()?,
        })
    }

    fn prepare_layer(
        &self,
        index: usize,
        expect_abstract: bool,
        layer: &TaskLayer,
        ctx: PrepareContext<'_>,
        report: &mut ValidationReport,
    ) -> Option<PreparedLayer> {
        let mut ok = true;
        if layer.tasks.is_empty() {
            report.push(ValidationIssue::EmptyLayer { layer: index });
            ok = false;
        }
        if !(1..=MAX_PLAN_SIZE_LIMIT).contains(&layer.max_plan_size) {
            report.push(ValidationIssue::InvalidMaxPlanSize {
                layer: index,
                size: layer.max_plan_size,
            });
            ok = false;
        }

        let mut tasks = Vec::with_capacity(layer.tasks.len());
        for task in &layer.tasks {
            if task.is_abstract != expect_abstract {
                report.push(ValidationIssue::AbstractMismatch {
                    layer: index,
                    task: task.name.clone(),
                    expected_abstract: expect_abstract,
                });
                ok = false;
            }
            let owner = format!("layer {index} task `{}`", task.name);
            let precondition = function::prepare_decorators(
                &format!("{owner} precondition"),
                &task.action.precondition,
                ctx,
                report,
            );
            let cost = function::prepare_score_calculators(
                &format!("{owner} cost"),
                &task.action.cost,
                ctx,
                report,
            );
            let effect = function::prepare_effectors(
                &format!("{owner} effect"),
                &task.action.effect,
                ctx,
                report,
            );
            let target =
                function::prepare_decorators(&format!("{owner} target"), &task.target, ctx, report);

            match (precondition, cost, effect, target) {
                (Some(precondition), Some(cost), Some(effect), Some(target)) => {
                    tasks.push(PreparedTask {
                        name: task.name.clone(),
                        precondition,
                        cost,
                        effect,
                        target: PreparedTarget::new(target),
                    });
                }
                _ => ok = false,
            }
        }

        ok.then(|| PreparedLayer {
            index,
            max_plan_size: layer.max_plan_size,
            tasks,
        })
    }

    fn check_fallback(&self, report: &mut ValidationReport) {
        let Some(fallback) = &self.fallback else {
            return;
        };
        if fallback.layers.len() != self.layer_count() {
            report.push(ValidationIssue::FallbackLayerCount {
                expected: self.layer_count(),
                actual: fallback.layers.len(),
            });
            return;
        }

        let counts = self.container_counts();
        let sizes = self.max_plan_sizes();
        for (layer, plan) in fallback.layers.iter().enumerate() {
            if plan.len() > sizes[layer] {
                report.push(ValidationIssue::FallbackTooLong {
                    layer,
                    length: plan.len(),
                    max: sizes[layer],
                });
            }
            for &container in plan {
                if container >= counts[layer] {
                    report.push_unique(ValidationIssue::InvalidFallback {
                        layer,
                        container,
                        available: counts[layer],
                    });
                }
            }
        }
    }
}

/// Decorator chain plus its fake flag.
#[derive(Debug, Clone)]
pub(crate) struct PreparedTarget {
    pub(crate) is_fake: bool,
    pub(crate) decorators: FrameCollection,
}

impl PreparedTarget {
    fn new(decorators: FrameCollection) -> Self {
        Self {
            is_fake: decorators.is_empty(),
            decorators,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct PreparedGoal {
    pub(crate) name: String,
    pub(crate) insistence: FrameCollection,
    pub(crate) target: PreparedTarget,
}

#[derive(Debug, Clone)]
pub(crate) struct PreparedTask {
    pub(crate) name: String,
    pub(crate) precondition: FrameCollection,
    pub(crate) cost: FrameCollection,
    pub(crate) effect: FrameCollection,
    pub(crate) target: PreparedTarget,
}

#[derive(Debug, Clone)]
pub(crate) struct PreparedLayer {
    pub(crate) index: usize,
    pub(crate) max_plan_size: usize,
    pub(crate) tasks: Vec<PreparedTask>,
}

/// A validated domain with every function chain resolved, ready to be sized and written.
#[derive(Debug, Clone)]
pub(crate) struct PreparedDomain {
    pub(crate) name: String,
    pub(crate) goals: Vec<PreparedGoal>,
    pub(crate) layers: Vec<PreparedLayer>,
}
