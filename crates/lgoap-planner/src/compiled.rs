use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lgoap_core::{BlackboardLayout, FunctionTable};

use crate::job::JobRegistry;
use crate::reader::{DomainView, GoalLayerView, TaskLayerView};
use crate::{FallbackPlan, PlanSet};

#[derive(Debug)]
struct DomainData {
    name: String,
    buffer: Box<[u8]>,
    layout: Arc<BlackboardLayout>,
    functions: Arc<FunctionTable>,
    layer_offsets: Vec<usize>,
    container_counts: Vec<usize>,
    max_plan_sizes: Vec<usize>,
    fallback: PlanSet,
    jobs: JobRegistry,
    disposed: AtomicBool,
}

/// Shared handle to an immutable compiled domain.
///
/// Cloning is cheap. The buffer is read by every agent planning against the domain; in-flight
/// planning jobs are tracked so [`CompiledDomain::dispose`] can wait for them.
#[derive(Debug, Clone)]
pub struct CompiledDomain {
    data: Arc<DomainData>,
}

impl CompiledDomain {
    pub(crate) fn new(
        name: String,
        buffer: Box<[u8]>,
        layout: Arc<BlackboardLayout>,
        functions: Arc<FunctionTable>,
        max_plan_sizes: Vec<usize>,
        fallback: &FallbackPlan,
    ) -> Self {
        let view = DomainView::new(&buffer);
        let layer_offsets = view.layer_offsets();
        let container_counts = core::iter::once(view.goal_layer().goal_count())
            .chain(view.task_layers().map(|l| l.task_count()))
            .collect();

        let mut plans = PlanSet::with_capacities(&max_plan_sizes);
        for (layer, containers) in fallback.layers.iter().enumerate() {
            if let Some(plan) = plans.layer_mut(layer) {
                plan.assign(containers.iter().copied());
            }
        }

        Self {
            data: Arc::new(DomainData {
                name,
                buffer,
                layout,
                functions,
                layer_offsets,
                container_counts,
                max_plan_sizes,
                fallback: plans,
                jobs: JobRegistry::default(),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data.buffer
    }

    pub fn view(&self) -> DomainView<'_> {
        DomainView::new(&self.data.buffer)
    }

    pub fn layout(&self) -> &Arc<BlackboardLayout> {
        &self.data.layout
    }

    pub fn functions(&self) -> &FunctionTable {
        &self.data.functions
    }

    /// Goal layer included.
    pub fn layer_count(&self) -> usize {
        self.data.layer_offsets.len()
    }

    pub fn container_count(&self, layer: usize) -> usize {
        self.data.container_counts.get(layer).copied().unwrap_or(0)
    }

    /// Plan capacity per layer; 1 for the goal layer.
    pub fn max_plan_sizes(&self) -> &[usize] {
        &self.data.max_plan_sizes
    }

    pub(crate) fn deepest_plan(&self) -> usize {
        self.data.max_plan_sizes.iter().skip(1).copied().max().unwrap_or(0)
    }

    pub fn goal_layer(&self) -> GoalLayerView<'_> {
        GoalLayerView::new(&self.data.buffer[self.data.layer_offsets[0]..])
    }

    /// Task layer at hierarchy position `layer` (>= 1).
    pub fn task_layer(&self, layer: usize) -> Option<TaskLayerView<'_>> {
        if layer == 0 {
            return None;
        }
        let offset = *self.data.layer_offsets.get(layer)?;
        Some(TaskLayerView::new(&self.data.buffer[offset..]))
    }

    /// Plans used for layers whose search fails.
    pub fn fallback(&self) -> &PlanSet {
        &self.data.fallback
    }

    pub fn jobs(&self) -> &JobRegistry {
        &self.data.jobs
    }

    pub fn is_disposed(&self) -> bool {
        self.data.disposed.load(Ordering::Acquire)
    }

    pub fn ptr_eq(&self, other: &CompiledDomain) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Refuses new planning passes and blocks until every in-flight job has finished.
    ///
    /// The buffer itself is released when the last handle is dropped.
    pub fn dispose(&self) {
        self.data.disposed.store(true, Ordering::Release);
        let pending = self.data.jobs.len();
        if pending > 0 {
            tracing::debug!(domain = self.name(), pending, "waiting for planning jobs before disposal");
        }
        self.data.jobs.close_and_wait();
    }
}
