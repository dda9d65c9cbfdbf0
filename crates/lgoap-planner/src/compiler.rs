//! Domain compilation: prepare (validate, resolve, size) then write top-down.

use std::sync::Arc;

use lgoap_core::function::FrameCollection;
use lgoap_core::stream::{self, Collection, Compile, CompileObserver, Cursor, SIZE_PREFIX};
use lgoap_core::{BlackboardLayout, FunctionTable, ValidationReport};
use lgoap_tools::CompileRegistry;

use crate::domain::{PreparedDomain, PreparedLayer, PreparedTarget};
use crate::{CompiledDomain, DomainDefinition};

/// A node reported to the compile observer under `name`.
struct Named<T> {
    name: String,
    node: T,
}

impl<T: Compile> Compile for Named<T> {
    fn size_for_compilation(&self) -> usize {
        self.node.size_for_compilation()
    }

    fn compile(&self, cursor: &mut Cursor<'_>) {
        cursor.begin(&self.name);
        self.node.compile(cursor);
        cursor.end();
    }
}

fn named<T>(name: impl Into<String>, node: T) -> Named<T> {
    Named {
        name: name.into(),
        node,
    }
}

/// `[size:i32][is-fake:u8][decorators]`
struct TargetNode {
    is_fake: bool,
    decorators: FrameCollection,
}

impl From<PreparedTarget> for TargetNode {
    fn from(target: PreparedTarget) -> Self {
        Self {
            is_fake: target.is_fake,
            decorators: target.decorators,
        }
    }
}

impl Compile for TargetNode {
    fn size_for_compilation(&self) -> usize {
        SIZE_PREFIX + 1 + self.decorators.size_for_compilation()
    }

    fn compile(&self, cursor: &mut Cursor<'_>) {
        cursor.write_len(self.size_for_compilation());
        cursor.write_bool(self.is_fake);
        self.decorators.compile(cursor);
    }
}

/// `[size:i32][precondition][cost][effect]`
struct ActionNode {
    precondition: Named<FrameCollection>,
    cost: Named<FrameCollection>,
    effect: Named<FrameCollection>,
}

impl Compile for ActionNode {
    fn size_for_compilation(&self) -> usize {
        SIZE_PREFIX
            + self.precondition.size_for_compilation()
            + self.cost.size_for_compilation()
            + self.effect.size_for_compilation()
    }

    fn compile(&self, cursor: &mut Cursor<'_>) {
        cursor.write_len(self.size_for_compilation());
        self.precondition.compile(cursor);
        self.cost.compile(cursor);
        self.effect.compile(cursor);
    }
}

struct GoalLayerNode {
    insistences: Collection<Named<FrameCollection>>,
    targets: Collection<Named<TargetNode>>,
}

impl Compile for GoalLayerNode {
    fn size_for_compilation(&self) -> usize {
        SIZE_PREFIX + self.insistences.size_for_compilation() + self.targets.size_for_compilation()
    }

    fn compile(&self, cursor: &mut Cursor<'_>) {
        cursor.write_len(self.size_for_compilation());
        self.insistences.compile(cursor);
        self.targets.compile(cursor);
    }
}

struct TaskLayerNode {
    max_plan_size: usize,
    actions: Collection<Named<ActionNode>>,
    targets: Collection<Named<TargetNode>>,
}

impl Compile for TaskLayerNode {
    fn size_for_compilation(&self) -> usize {
        SIZE_PREFIX + 4 + self.actions.size_for_compilation() + self.targets.size_for_compilation()
    }

    fn compile(&self, cursor: &mut Cursor<'_>) {
        cursor.write_len(self.size_for_compilation());
        cursor.write_len(self.max_plan_size);
        self.actions.compile(cursor);
        self.targets.compile(cursor);
    }
}

impl From<PreparedLayer> for TaskLayerNode {
    fn from(layer: PreparedLayer) -> Self {
        let index = layer.index;
        let mut actions = Vec::with_capacity(layer.tasks.len());
        let mut targets = Vec::with_capacity(layer.tasks.len());
        for task in layer.tasks {
            actions.push(named(
                format!("action: {}", task.name),
                ActionNode {
                    precondition: named(format!("precondition: {}", task.name), task.precondition),
                    cost: named(format!("cost: {}", task.name), task.cost),
                    effect: named(format!("effect: {}", task.name), task.effect),
                },
            ));
            targets.push(named(format!("target: {}", task.name), TargetNode::from(task.target)));
        }
        tracing::trace!(layer = index, tasks = actions.len(), "prepared task layer");
        Self {
            max_plan_size: layer.max_plan_size,
            actions: Collection::prepare(actions),
            targets: Collection::prepare(targets),
        }
    }
}

/// `[layer-count:u8][goal-layer][task-layer]*`
struct DomainNode {
    name: String,
    goal_layer: Named<GoalLayerNode>,
    task_layers: Vec<Named<TaskLayerNode>>,
}

impl From<PreparedDomain> for DomainNode {
    fn from(domain: PreparedDomain) -> Self {
        let mut insistences = Vec::with_capacity(domain.goals.len());
        let mut targets = Vec::with_capacity(domain.goals.len());
        for goal in domain.goals {
            insistences.push(named(format!("insistence: {}", goal.name), goal.insistence));
            targets.push(named(format!("target: {}", goal.name), TargetNode::from(goal.target)));
        }
        Self {
            name: domain.name,
            goal_layer: named(
                "layer 0 (goals)",
                GoalLayerNode {
                    insistences: Collection::prepare(insistences),
                    targets: Collection::prepare(targets),
                },
            ),
            task_layers: domain
                .layers
                .into_iter()
                .map(|layer| named(format!("layer {}", layer.index), TaskLayerNode::from(layer)))
                .collect(),
        }
    }
}

impl Compile for DomainNode {
    fn size_for_compilation(&self) -> usize {
        1 + self.goal_layer.size_for_compilation()
            + self
                .task_layers
                .iter()
                .map(Compile::size_for_compilation)
                .sum::<usize>()
    }

    fn compile(&self, cursor: &mut Cursor<'_>) {
        cursor.begin(&self.name);
        // Validation caps the layer count at u8::MAX.
        cursor.write_u8((1 + self.task_layers.len()) as u8);
        self.goal_layer.compile(cursor);
        for layer in &self.task_layers {
            layer.compile(cursor);
        }
        cursor.end();
    }
}

impl DomainDefinition {
    /// Validates the domain and compiles it into one shared buffer.
    pub fn compile(
        &self,
        layout: &Arc<BlackboardLayout>,
        functions: &Arc<FunctionTable>,
    ) -> Result<CompiledDomain, ValidationReport> {
        self.compile_observed(layout, functions, None)
    }

    /// Like [`DomainDefinition::compile`], recording the byte range of every named sub-object.
    pub fn compile_with_registry(
        &self,
        layout: &Arc<BlackboardLayout>,
        functions: &Arc<FunctionTable>,
        registry: &mut CompileRegistry,
    ) -> Result<CompiledDomain, ValidationReport> {
        self.compile_observed(layout, functions, Some(registry))
    }

    fn compile_observed(
        &self,
        layout: &Arc<BlackboardLayout>,
        functions: &Arc<FunctionTable>,
        observer: Option<&mut dyn CompileObserver>,
    ) -> Result<CompiledDomain, ValidationReport> {
        let mut report = ValidationReport::new();
        let Some(prepared) = self.prepare(layout, functions, &mut report) else {
            tracing::debug!(domain = %self.name, issues = report.len(), "domain failed validation");
            return Err(report);
        };

        let node = DomainNode::from(prepared);
        let buffer = match observer {
            Some(observer) => stream::compile_to_buffer_observed(&node, observer),
            None => stream::compile_to_buffer(&node),
        };
        tracing::debug!(
            domain = %self.name,
            bytes = buffer.len(),
            layers = self.layer_count(),
            "compiled domain"
        );

        Ok(CompiledDomain::new(
            self.name.clone(),
            buffer,
            Arc::clone(layout),
            Arc::clone(functions),
            self.max_plan_sizes(),
            &self.fallback_or_default(),
        ))
    }
}
