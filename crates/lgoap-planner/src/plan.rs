//! Plan buffers, plan diffing and the execution handoff.

use crate::CompiledDomain;

/// What the execution layer should do with a layer (or a whole result).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlanResultKind {
    /// No planning pass ran; keep executing.
    #[default]
    NotRequired,
    /// A pass ran and chose the same containers.
    Unchanged,
    /// Containers changed; restart execution from cursor 0.
    NewPlan,
}

/// Fixed-capacity container sequence for one hierarchy layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerPlan {
    kind: PlanResultKind,
    length: usize,
    cursor: usize,
    indices: Box<[u32]>,
}

impl LayerPlan {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            kind: PlanResultKind::NotRequired,
            length: 0,
            cursor: 0,
            indices: vec![0; capacity].into_boxed_slice(),
        }
    }

    pub fn kind(&self) -> PlanResultKind {
        self.kind
    }

    pub fn capacity(&self) -> usize {
        self.indices.len()
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices[..self.length]
    }

    /// Container under the cursor; `None` when the plan is empty or finished.
    pub fn current(&self) -> Option<usize> {
        self.indices().get(self.cursor).map(|i| *i as usize)
    }

    pub fn clear(&mut self) {
        self.length = 0;
        self.cursor = 0;
    }

    /// Appends a container; `false` when the plan is full.
    pub fn push(&mut self, container: usize) -> bool {
        if self.length == self.capacity() {
            return false;
        }
        self.indices[self.length] = container as u32;
        self.length += 1;
        true
    }

    /// Replaces the plan with `containers`, truncated to capacity. Resets the cursor.
    pub fn assign(&mut self, containers: impl IntoIterator<Item = usize>) {
        self.clear();
        for container in containers {
            if !self.push(container) {
                break;
            }
        }
    }

    /// Moves the cursor forward; returns the new current container.
    pub fn advance(&mut self) -> Option<usize> {
        if self.cursor < self.length {
            self.cursor += 1;
        }
        self.current()
    }

    /// Same containers in the same order; cursor and kind are ignored.
    pub fn same_containers(&self, other: &LayerPlan) -> bool {
        self.indices() == other.indices()
    }

    /// Takes `previous`'s cursor when both hold the same containers.
    pub fn resume_from(&mut self, previous: &LayerPlan) -> bool {
        if !self.same_containers(previous) {
            return false;
        }
        self.cursor = previous.cursor;
        true
    }

    /// Copies containers and cursor from `other`.
    pub fn copy_from(&mut self, other: &LayerPlan) {
        self.assign(other.indices().iter().map(|i| *i as usize));
        self.cursor = other.cursor.min(self.length);
    }
}

/// One [`LayerPlan`] per hierarchy layer, goal layer first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSet {
    layers: Vec<LayerPlan>,
}

impl PlanSet {
    pub fn with_capacities(capacities: &[usize]) -> Self {
        Self {
            layers: capacities.iter().map(|c| LayerPlan::with_capacity(*c)).collect(),
        }
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layer(&self, layer: usize) -> Option<&LayerPlan> {
        self.layers.get(layer)
    }

    pub fn layer_mut(&mut self, layer: usize) -> Option<&mut LayerPlan> {
        self.layers.get_mut(layer)
    }

    pub fn layers(&self) -> &[LayerPlan] {
        &self.layers
    }

    /// Selected goal, if any.
    pub fn goal(&self) -> Option<usize> {
        self.layers.first().and_then(LayerPlan::current)
    }

    pub fn cursors(&self) -> Vec<usize> {
        self.layers.iter().map(LayerPlan::cursor).collect()
    }

    /// Copies layers `..end` from `other`, cursors included.
    pub fn copy_prefix_from(&mut self, other: &PlanSet, end: usize) {
        for (mine, theirs) in self.layers.iter_mut().zip(&other.layers).take(end) {
            mine.copy_from(theirs);
        }
    }

    /// First layer whose containers differ from `other`'s.
    pub fn first_divergence(&self, other: &PlanSet) -> Option<usize> {
        self.layers
            .iter()
            .zip(&other.layers)
            .position(|(a, b)| !a.same_containers(b))
    }
}

/// A planned container handed to the execution layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerSelection {
    pub layer: usize,
    pub container: usize,
}

/// The published plan of one agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerResult {
    kind: PlanResultKind,
    plans: PlanSet,
    publications: u64,
}

impl PlannerResult {
    pub fn new(capacities: &[usize]) -> Self {
        Self {
            kind: PlanResultKind::NotRequired,
            plans: PlanSet::with_capacities(capacities),
            publications: 0,
        }
    }

    pub fn kind(&self) -> PlanResultKind {
        self.kind
    }

    pub fn plans(&self) -> &PlanSet {
        &self.plans
    }

    pub fn layer(&self, layer: usize) -> Option<&LayerPlan> {
        self.plans.layer(layer)
    }

    /// Number of planning passes published so far.
    pub fn publications(&self) -> u64 {
        self.publications
    }

    /// Marks every layer as not planned this tick. Plans and cursors are kept.
    pub fn mark_not_required(&mut self) {
        self.kind = PlanResultKind::NotRequired;
        for layer in &mut self.plans.layers {
            layer.kind = PlanResultKind::NotRequired;
        }
    }

    /// Publishes a finished pass.
    ///
    /// Layers above the first divergence keep their cursors and report `Unchanged`; the divergent
    /// layer and everything below take `next`'s containers with cursor 0 and report `NewPlan`.
    /// The first publication always diverges at layer 0.
    pub fn publish(&mut self, next: &PlanSet) -> PlanResultKind {
        let divergence = if self.publications == 0 {
            Some(0)
        } else {
            next.first_divergence(&self.plans)
        };
        self.publications += 1;

        let split = divergence.unwrap_or(self.plans.layers.len());
        for (index, (mine, theirs)) in self.plans.layers.iter_mut().zip(&next.layers).enumerate() {
            if index < split {
                mine.kind = PlanResultKind::Unchanged;
            } else {
                mine.assign(theirs.indices().iter().map(|i| *i as usize));
                mine.kind = PlanResultKind::NewPlan;
            }
        }

        self.kind = if divergence.is_some() {
            PlanResultKind::NewPlan
        } else {
            PlanResultKind::Unchanged
        };
        self.kind
    }

    /// Containers the execution layer must (re)start: the current container of every `NewPlan`
    /// layer, top-down.
    ///
    /// Indices the domain does not have are reported once each and skipped.
    pub fn handoff(&self, domain: &CompiledDomain) -> Vec<ContainerSelection> {
        let mut selections = Vec::new();
        for (layer, plan) in self.plans.layers.iter().enumerate() {
            if plan.kind != PlanResultKind::NewPlan {
                continue;
            }
            let Some(container) = plan.current() else {
                continue;
            };
            if container >= domain.container_count(layer) {
                tracing::error!(
                    domain = domain.name(),
                    layer,
                    container,
                    "could not execute container {container} at layer {layer}"
                );
                continue;
            }
            selections.push(ContainerSelection { layer, container });
        }
        selections
    }

    pub(crate) fn advance(&mut self, layer: usize) -> Option<usize> {
        self.plans.layers.get_mut(layer).and_then(LayerPlan::advance)
    }
}
