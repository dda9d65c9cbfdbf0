//! Borrowing views over a compiled domain buffer.
//!
//! Every view wraps a slice starting at its frame and computes accessors from fixed or
//! size-prefixed offsets. Views never allocate and cannot outlive the buffer they borrow.

use lgoap_core::stream::{self, CollectionView, SIZE_PREFIX};
use lgoap_core::{
    Blackboard, DecoratorCollectionView, EffectorCollectionView, FunctionTable,
    ScoreCollectionView,
};

/// `[layer-count:u8][goal-layer][task-layer]*`
#[derive(Debug, Clone, Copy)]
pub struct DomainView<'a> {
    bytes: &'a [u8],
}

impl<'a> DomainView<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn layer_count(&self) -> usize {
        usize::from(stream::read_u8(self.bytes, 0))
    }

    pub fn goal_layer(&self) -> GoalLayerView<'a> {
        GoalLayerView::new(&self.bytes[1..])
    }

    /// Task layers top-down, found by skipping each preceding layer by its size.
    pub fn task_layers(&self) -> impl Iterator<Item = TaskLayerView<'a>> {
        let bytes = self.bytes;
        let mut offset = 1 + self.goal_layer().size();
        (1..self.layer_count()).map(move |_| {
            let layer = TaskLayerView::new(&bytes[offset..]);
            offset += layer.size();
            layer
        })
    }

    /// Task layer at hierarchy position `layer` (1-based; 0 is the goal layer).
    pub fn task_layer(&self, layer: usize) -> Option<TaskLayerView<'a>> {
        layer.checked_sub(1).and_then(|i| self.task_layers().nth(i))
    }

    /// Byte offset of every hierarchy layer, goal layer first.
    pub fn layer_offsets(&self) -> Vec<usize> {
        let mut offsets = Vec::with_capacity(self.layer_count());
        let mut offset = 1;
        offsets.push(offset);
        offset += self.goal_layer().size();
        for layer in self.task_layers() {
            offsets.push(offset);
            offset += layer.size();
        }
        offsets.truncate(self.layer_count());
        offsets
    }
}

/// `[size:i32][insistences: collection<score-collection>][targets: collection<target>]`
#[derive(Debug, Clone, Copy)]
pub struct GoalLayerView<'a> {
    bytes: &'a [u8],
}

impl<'a> GoalLayerView<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes: stream::frame(bytes),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn insistences(&self) -> CollectionView<'a> {
        CollectionView::new(&self.bytes[SIZE_PREFIX..])
    }

    pub fn targets(&self) -> CollectionView<'a> {
        CollectionView::new(&self.bytes[SIZE_PREFIX + self.insistences().size()..])
    }

    pub fn goal_count(&self) -> usize {
        self.insistences().len()
    }

    pub fn insistence(&self, goal: usize) -> Option<ScoreCollectionView<'a>> {
        self.insistences().get(goal).map(ScoreCollectionView::new)
    }

    pub fn target(&self, goal: usize) -> Option<TargetView<'a>> {
        self.targets().get(goal).map(TargetView::new)
    }

    /// Insistence score of every goal, in goal order.
    pub fn scores(
        &self,
        functions: &'a FunctionTable,
        blackboard: &'a Blackboard,
    ) -> impl Iterator<Item = f32> + 'a {
        self.insistences()
            .frames()
            .map(move |frame| ScoreCollectionView::new(frame).total(functions, blackboard))
    }
}

/// `[size:i32][max-plan-size:i32][actions: collection<action>][targets: collection<target>]`
#[derive(Debug, Clone, Copy)]
pub struct TaskLayerView<'a> {
    bytes: &'a [u8],
}

const TASK_LAYER_HEADER: usize = SIZE_PREFIX + 4;

impl<'a> TaskLayerView<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes: stream::frame(bytes),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn max_plan_size(&self) -> usize {
        stream::read_len(self.bytes, SIZE_PREFIX)
    }

    pub fn actions(&self) -> impl ExactSizeIterator<Item = ActionView<'a>> {
        CollectionView::new(&self.bytes[TASK_LAYER_HEADER..])
            .frames()
            .map(ActionView::new)
    }

    pub fn targets(&self) -> CollectionView<'a> {
        let actions = CollectionView::new(&self.bytes[TASK_LAYER_HEADER..]);
        CollectionView::new(&self.bytes[TASK_LAYER_HEADER + actions.size()..])
    }

    pub fn task_count(&self) -> usize {
        CollectionView::new(&self.bytes[TASK_LAYER_HEADER..]).len()
    }

    pub fn action(&self, task: usize) -> Option<ActionView<'a>> {
        self.actions().nth(task)
    }

    pub fn target(&self, task: usize) -> Option<TargetView<'a>> {
        self.targets().get(task).map(TargetView::new)
    }
}

/// `[size:i32][precondition][cost][effect]`
#[derive(Debug, Clone, Copy)]
pub struct ActionView<'a> {
    bytes: &'a [u8],
}

impl<'a> ActionView<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes: stream::frame(bytes),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Slices the action into its three chains by their self-reported sizes.
    pub fn split(
        &self,
    ) -> (
        DecoratorCollectionView<'a>,
        ScoreCollectionView<'a>,
        EffectorCollectionView<'a>,
    ) {
        let precondition = DecoratorCollectionView::new(&self.bytes[SIZE_PREFIX..]);
        let cost_at = SIZE_PREFIX + precondition.size();
        let cost = ScoreCollectionView::new(&self.bytes[cost_at..]);
        let effect = EffectorCollectionView::new(&self.bytes[cost_at + cost.size()..]);
        (precondition, cost, effect)
    }

    pub fn precondition(&self) -> DecoratorCollectionView<'a> {
        self.split().0
    }

    pub fn cost(&self) -> ScoreCollectionView<'a> {
        self.split().1
    }

    pub fn effect(&self) -> EffectorCollectionView<'a> {
        self.split().2
    }
}

/// `[size:i32][is-fake:u8][decorator-collection]`
#[derive(Debug, Clone, Copy)]
pub struct TargetView<'a> {
    bytes: &'a [u8],
}

impl<'a> TargetView<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes: stream::frame(bytes),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Authored without decorators: nothing is planned below this container.
    pub fn is_fake(&self) -> bool {
        stream::read_bool(self.bytes, SIZE_PREFIX)
    }

    pub fn decorators(&self) -> DecoratorCollectionView<'a> {
        DecoratorCollectionView::new(&self.bytes[SIZE_PREFIX + 1..])
    }

    pub fn is_achieved(&self, functions: &FunctionTable, blackboard: &Blackboard) -> bool {
        self.decorators().all(functions, blackboard)
    }

    /// 0 when achieved, `unachieved` otherwise.
    pub fn heuristic(
        &self,
        functions: &FunctionTable,
        blackboard: &Blackboard,
        unachieved: f32,
    ) -> f32 {
        if self.is_achieved(functions, blackboard) {
            0.0
        } else {
            unachieved
        }
    }
}
