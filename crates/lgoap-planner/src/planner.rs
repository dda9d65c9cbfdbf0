//! Goal selection and per-layer IDA* search.

use lgoap_core::{Blackboard, FunctionTable};
use lgoap_tools::{TraceEvent, TraceLog};

use crate::reader::{GoalLayerView, TargetView, TaskLayerView};
use crate::{CompiledDomain, PlanSet, PlannerConfig};

pub const TRACE_PLAN_START: &str = "lgoap.plan.start";
pub const TRACE_GOAL_SELECTED: &str = "lgoap.goal.selected";
pub const TRACE_LAYER_PLANNED: &str = "lgoap.layer.planned";
pub const TRACE_LAYER_EMPTY: &str = "lgoap.layer.empty";
pub const TRACE_LAYER_FALLBACK: &str = "lgoap.layer.fallback";
pub const TRACE_IDA_ITERATION: &str = "lgoap.ida.iteration";

/// Index of the highest insistence score. NaN counts as −∞; the first maximum wins.
pub fn select_goal(scores: impl IntoIterator<Item = f32>) -> usize {
    let mut best_index = 0usize;
    let mut best_score = f32::NEG_INFINITY;
    for (index, score) in scores.into_iter().enumerate() {
        let score = if score.is_nan() { f32::NEG_INFINITY } else { score };
        if index == 0 || score > best_score {
            best_index = index;
            best_score = score;
        }
    }
    best_index
}

/// Everything one planning pass mutates, so a pass can run on any thread.
///
/// `scratch[0]` holds the start state; deeper entries are forward-simulated by action effects.
#[derive(Debug, Clone)]
pub struct PlannerWorkspace {
    pub(crate) scratch: Vec<Blackboard>,
    pub(crate) plans: PlanSet,
    pub(crate) trace: TraceLog,
    path: Vec<usize>,
}

impl PlannerWorkspace {
    /// Scratch stack of `max(max_plan_size) + 1` detached copies of `blackboard`.
    pub fn new(domain: &CompiledDomain, blackboard: &Blackboard, trace_capacity: usize) -> Self {
        let depth = domain.deepest_plan() + 1;
        Self {
            scratch: (0..depth).map(|_| blackboard.scratch_copy()).collect(),
            plans: PlanSet::with_capacities(domain.max_plan_sizes()),
            trace: TraceLog::with_capacity(trace_capacity),
            path: Vec::with_capacity(depth),
        }
    }

    /// Seeds the start state for the next pass.
    pub fn load_start_state(&mut self, blackboard: &Blackboard) {
        if let Some(start) = self.scratch.first_mut() {
            start.copy_from(blackboard);
        }
    }

    pub fn plans(&self) -> &PlanSet {
        &self.plans
    }

    pub fn trace(&self) -> &TraceLog {
        &self.trace
    }

    pub fn trace_mut(&mut self) -> &mut TraceLog {
        &mut self.trace
    }
}

/// Inputs of one pass besides the workspace.
#[derive(Debug, Clone, Copy)]
pub struct PassRequest {
    pub tick: u64,
    /// Layers above this one are kept from `previous`.
    pub start_layer: usize,
}

/// Runs one planning pass into `workspace.plans`.
///
/// Layers below `start_layer` are copied from `previous` (cursors included). From there every
/// layer is planned top-down against the target of its parent's current container. While the
/// planned layers match `previous`, they keep its cursors, so children are planned under the
/// container that is actually executing.
pub fn plan_pass(
    domain: &CompiledDomain,
    config: &PlannerConfig,
    workspace: &mut PlannerWorkspace,
    previous: &PlanSet,
    request: PassRequest,
) {
    let tick = request.tick;
    let functions = domain.functions();
    workspace.trace.clear();
    workspace
        .trace
        .push(TraceEvent::new(tick, TRACE_PLAN_START).with_a(request.start_layer as u64));

    let start_layer = request.start_layer.min(domain.layer_count());
    workspace.plans.copy_prefix_from(previous, start_layer);

    if start_layer == 0 {
        let goals = domain.goal_layer();
        let goal = select_goal(goals.scores(functions, &workspace.scratch[0]));
        tracing::debug!(domain = domain.name(), goal, "selected goal");
        workspace
            .trace
            .push(TraceEvent::new(tick, TRACE_GOAL_SELECTED).with_a(goal as u64));
        if let Some(plan) = workspace.plans.layer_mut(0) {
            plan.assign([goal]);
        }
    }

    let mut resumed = true;
    for layer in start_layer..domain.layer_count() {
        if layer > 0 {
            plan_layer(domain, functions, config, workspace, layer, tick);
        }
        resumed = resumed && resume_layer(&mut workspace.plans, previous, layer);
    }
}

fn resume_layer(plans: &mut PlanSet, previous: &PlanSet, layer: usize) -> bool {
    match (plans.layer_mut(layer), previous.layer(layer)) {
        (Some(plan), Some(previous)) => plan.resume_from(previous),
        _ => false,
    }
}

fn parent_target<'a>(domain: &'a CompiledDomain, layer: usize, container: usize) -> Option<TargetView<'a>> {
    if layer == 1 {
        domain.goal_layer().target(container)
    } else {
        domain.task_layer(layer - 1)?.target(container)
    }
}

fn plan_layer(
    domain: &CompiledDomain,
    functions: &FunctionTable,
    config: &PlannerConfig,
    workspace: &mut PlannerWorkspace,
    layer: usize,
    tick: u64,
) {
    let parent = workspace.plans.layer(layer - 1).and_then(|p| p.current());
    let target = parent.and_then(|container| parent_target(domain, layer, container));
    let task_layer = domain.task_layer(layer);

    let (Some(target), Some(task_layer)) = (target, task_layer) else {
        if let Some(container) = parent {
            tracing::warn!(
                domain = domain.name(),
                layer,
                container,
                "parent container has no target; layer left empty"
            );
        }
        empty_layer(workspace, layer, tick);
        return;
    };
    if target.is_fake() {
        empty_layer(workspace, layer, tick);
        return;
    }

    match ida_star(task_layer, target, functions, config, workspace, layer, tick) {
        Some(()) => {
            let PlannerWorkspace { plans, path, trace, .. } = workspace;
            if let Some(plan) = plans.layer_mut(layer) {
                plan.assign(path.iter().copied());
            }
            tracing::debug!(domain = domain.name(), layer, length = path.len(), "planned layer");
            trace.push(
                TraceEvent::new(tick, TRACE_LAYER_PLANNED)
                    .with_a(layer as u64)
                    .with_b(path.len() as u64),
            );
        }
        None => {
            let fallback = domain.fallback().layer(layer);
            if let (Some(plan), Some(fallback)) = (workspace.plans.layer_mut(layer), fallback) {
                plan.copy_from(fallback);
            }
            tracing::debug!(domain = domain.name(), layer, "search failed; using fallback plan");
            workspace
                .trace
                .push(TraceEvent::new(tick, TRACE_LAYER_FALLBACK).with_a(layer as u64));
        }
    }
}

fn empty_layer(workspace: &mut PlannerWorkspace, layer: usize, tick: u64) {
    if let Some(plan) = workspace.plans.layer_mut(layer) {
        plan.clear();
    }
    workspace
        .trace
        .push(TraceEvent::new(tick, TRACE_LAYER_EMPTY).with_a(layer as u64));
}

/// Search state shared by every node of one IDA* iteration.
struct Search<'a, 'w> {
    layer: TaskLayerView<'a>,
    target: TargetView<'a>,
    functions: &'a FunctionTable,
    unachieved: f32,
    max_depth: usize,
    scratch: &'w mut [Blackboard],
    path: &'w mut Vec<usize>,
    min_pruned: f32,
}

impl Search<'_, '_> {
    fn dfs(&mut self, depth: usize, cost: f32, threshold: f32) -> bool {
        let h = self
            .target
            .heuristic(self.functions, &self.scratch[depth], self.unachieved);
        let f = cost + h;
        if f > threshold {
            self.min_pruned = self.min_pruned.min(f);
            return false;
        }
        if h == 0.0 {
            return true;
        }
        if depth == self.max_depth {
            return false;
        }

        for (index, action) in self.layer.actions().enumerate() {
            let (precondition, step_cost, effect) = action.split();
            if !precondition.all(self.functions, &self.scratch[depth]) {
                continue;
            }
            let step = step_cost.total(self.functions, &self.scratch[depth]).max(0.0);

            let (current, deeper) = self.scratch.split_at_mut(depth + 1);
            let next = &mut deeper[0];
            next.copy_from(&current[depth]);
            effect.apply(self.functions, next);

            self.path.push(index);
            if self.dfs(depth + 1, cost + step, threshold) {
                return true;
            }
            self.path.pop();
        }
        false
    }
}

/// IDA* over one task layer. On success the plan is in `workspace.path`.
///
/// Every outer iteration raises the threshold to the smallest f that was pruned. The search
/// fails when nothing was pruned (the depth cap exhausted every branch) or when
/// `max_ida_iterations` is reached.
fn ida_star(
    layer: TaskLayerView<'_>,
    target: TargetView<'_>,
    functions: &FunctionTable,
    config: &PlannerConfig,
    workspace: &mut PlannerWorkspace,
    layer_index: usize,
    tick: u64,
) -> Option<()> {
    let max_depth = layer.max_plan_size().min(workspace.scratch.len() - 1);
    workspace.path.clear();

    let mut threshold = target.heuristic(functions, &workspace.scratch[0], config.unachieved_heuristic);
    if threshold == 0.0 {
        return Some(());
    }

    let PlannerWorkspace { scratch, path, trace, .. } = workspace;
    let mut search = Search {
        layer,
        target,
        functions,
        unachieved: config.unachieved_heuristic,
        max_depth,
        scratch,
        path,
        min_pruned: f32::INFINITY,
    };

    for iteration in 0..config.max_ida_iterations {
        tracing::trace!(layer = layer_index, iteration, threshold, "ida iteration");
        trace.push(
            TraceEvent::new(tick, TRACE_IDA_ITERATION)
                .with_a(layer_index as u64)
                .with_b(iteration as u64),
        );

        search.path.clear();
        search.min_pruned = f32::INFINITY;
        if search.dfs(0, 0.0, threshold) {
            return Some(());
        }
        if !search.min_pruned.is_finite() {
            return None;
        }
        threshold = search.min_pruned;
    }
    None
}
