//! Behavior functions: decorators, score calculators and effectors.
//!
//! Authored functions name a native callable registered in a [`FunctionTable`] plus a parameter
//! list. Preparation resolves both against the table and a [`BlackboardLayout`] and yields a sized
//! [`FunctionFrame`]; compiled frames are read back through the `*FrameView` types:
//!
//! ```text
//! decorator : [size:i32][function:u32][invert:u8][params]
//! score     : [size:i32][function:u32][invert:u8][score:f32][params]
//! effector  : [size:i32][function:u32][params]
//! ```

use core::fmt;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::stream::{self, Collection, CollectionView, Compile, Cursor, SIZE_PREFIX};
use crate::{
    BbKey, Blackboard, BlackboardLayout, BlackboardValue, FunctionFault, KeyType, ValidationIssue,
    ValidationReport,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FunctionKind {
    Decorator,
    ScoreCalculator,
    Effector,
}

impl fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FunctionKind::Decorator => "decorator",
            FunctionKind::ScoreCalculator => "score calculator",
            FunctionKind::Effector => "effector",
        })
    }
}

/// Declared kind of one parameter slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Boolean,
    Float,
    Integer,
    Key(KeyType),
}

impl ParamKind {
    /// Encoded size: keys are `[index:u32][offset:u32]`.
    pub const fn size(self) -> usize {
        match self {
            ParamKind::Boolean => 1,
            ParamKind::Float | ParamKind::Integer => 4,
            ParamKind::Key(_) => 8,
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Boolean => f.write_str("boolean"),
            ParamKind::Float => f.write_str("float"),
            ParamKind::Integer => f.write_str("integer"),
            ParamKind::Key(ty) => write!(f, "{ty} key"),
        }
    }
}

/// Authored parameter value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Param {
    Boolean(bool),
    Float(f32),
    Integer(i32),
    /// Blackboard key, by name.
    Key(String),
}

impl Param {
    pub fn key(name: impl Into<String>) -> Self {
        Param::Key(name.into())
    }

    fn describe(&self) -> &'static str {
        match self {
            Param::Boolean(_) => "boolean",
            Param::Float(_) => "float",
            Param::Integer(_) => "integer",
            Param::Key(_) => "key",
        }
    }
}

pub type DecoratorFn = fn(&Blackboard, &mut Params<'_>) -> Result<bool, FunctionFault>;
/// Receives the frame's authored score and returns its contribution.
pub type ScoreFn = fn(&Blackboard, &mut Params<'_>, f32) -> Result<f32, FunctionFault>;
pub type EffectorFn = fn(&mut Blackboard, &mut Params<'_>) -> Result<(), FunctionFault>;

/// Index of a function inside its kind's registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FunctionId(pub u32);

pub(crate) struct Entry<F> {
    pub(crate) name: String,
    pub(crate) signature: Vec<ParamKind>,
    pub(crate) function: F,
}

/// Native callables addressable from compiled frames.
#[derive(Default)]
pub struct FunctionTable {
    decorators: Vec<Entry<DecoratorFn>>,
    scores: Vec<Entry<ScoreFn>>,
    effectors: Vec<Entry<EffectorFn>>,
    by_name: BTreeMap<(FunctionKind, String), FunctionId>,
}

impl fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionTable")
            .field("decorators", &self.decorators.iter().map(|e| &e.name).collect::<Vec<_>>())
            .field("scores", &self.scores.iter().map(|e| &e.name).collect::<Vec<_>>())
            .field("effectors", &self.effectors.iter().map(|e| &e.name).collect::<Vec<_>>())
            .finish()
    }
}

fn register<F>(
    entries: &mut Vec<Entry<F>>,
    by_name: &mut BTreeMap<(FunctionKind, String), FunctionId>,
    kind: FunctionKind,
    name: String,
    signature: &[ParamKind],
    function: F,
) -> FunctionId {
    let entry = Entry {
        name: name.clone(),
        signature: signature.to_vec(),
        function,
    };
    if let Some(id) = by_name.get(&(kind, name.clone())) {
        entries[id.0 as usize] = entry;
        return *id;
    }
    let id = FunctionId(entries.len() as u32);
    entries.push(entry);
    by_name.insert((kind, name), id);
    id
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table preloaded with [`crate::builtins`].
    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        crate::builtins::install(&mut table);
        table
    }

    /// Registers (or replaces) a decorator.
    pub fn register_decorator(
        &mut self,
        name: impl Into<String>,
        signature: &[ParamKind],
        function: DecoratorFn,
    ) -> FunctionId {
        register(
            &mut self.decorators,
            &mut self.by_name,
            FunctionKind::Decorator,
            name.into(),
            signature,
            function,
        )
    }

    pub fn register_score_calculator(
        &mut self,
        name: impl Into<String>,
        signature: &[ParamKind],
        function: ScoreFn,
    ) -> FunctionId {
        register(
            &mut self.scores,
            &mut self.by_name,
            FunctionKind::ScoreCalculator,
            name.into(),
            signature,
            function,
        )
    }

    pub fn register_effector(
        &mut self,
        name: impl Into<String>,
        signature: &[ParamKind],
        function: EffectorFn,
    ) -> FunctionId {
        register(
            &mut self.effectors,
            &mut self.by_name,
            FunctionKind::Effector,
            name.into(),
            signature,
            function,
        )
    }

    pub fn resolve(&self, kind: FunctionKind, name: &str) -> Option<FunctionId> {
        self.by_name.get(&(kind, name.to_string())).copied()
    }

    pub fn name(&self, kind: FunctionKind, id: FunctionId) -> Option<&str> {
        let index = id.0 as usize;
        match kind {
            FunctionKind::Decorator => self.decorators.get(index).map(|e| e.name.as_str()),
            FunctionKind::ScoreCalculator => self.scores.get(index).map(|e| e.name.as_str()),
            FunctionKind::Effector => self.effectors.get(index).map(|e| e.name.as_str()),
        }
    }

    pub fn signature(&self, kind: FunctionKind, id: FunctionId) -> Option<&[ParamKind]> {
        let index = id.0 as usize;
        match kind {
            FunctionKind::Decorator => self.decorators.get(index).map(|e| e.signature.as_slice()),
            FunctionKind::ScoreCalculator => self.scores.get(index).map(|e| e.signature.as_slice()),
            FunctionKind::Effector => self.effectors.get(index).map(|e| e.signature.as_slice()),
        }
    }

    pub(crate) fn decorator(&self, id: FunctionId) -> Option<&Entry<DecoratorFn>> {
        self.decorators.get(id.0 as usize)
    }

    pub(crate) fn score(&self, id: FunctionId) -> Option<&Entry<ScoreFn>> {
        self.scores.get(id.0 as usize)
    }

    pub(crate) fn effector(&self, id: FunctionId) -> Option<&Entry<EffectorFn>> {
        self.effectors.get(id.0 as usize)
    }
}

/// Sequential reader over a compiled parameter block.
#[derive(Debug, Clone, Copy)]
pub struct Params<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Params<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, len: usize, wanted: &'static str) -> Result<&'a [u8], FunctionFault> {
        if self.remaining() < len {
            return Err(FunctionFault::ParamsExhausted { wanted });
        }
        let bytes = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub fn boolean(&mut self) -> Result<bool, FunctionFault> {
        Ok(self.take(1, "boolean")?[0] != 0)
    }

    pub fn float(&mut self) -> Result<f32, FunctionFault> {
        Ok(stream::read_f32(self.take(4, "float")?, 0))
    }

    pub fn integer(&mut self) -> Result<i32, FunctionFault> {
        Ok(stream::read_i32(self.take(4, "integer")?, 0))
    }

    /// Key parameter. Validation has already checked that the key holds `T`.
    pub fn key<T: BlackboardValue>(&mut self) -> Result<BbKey<T>, FunctionFault> {
        let bytes = self.take(8, "key")?;
        Ok(BbKey::from_raw(
            stream::read_u32(bytes, 0),
            stream::read_u32(bytes, 4),
        ))
    }
}

/// What preparation resolves names against.
#[derive(Debug, Clone, Copy)]
pub struct PrepareContext<'a> {
    pub layout: &'a BlackboardLayout,
    pub functions: &'a FunctionTable,
}

/// Authored boolean predicate.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Decorator {
    pub function: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub invert: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub params: Vec<Param>,
}

impl Decorator {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            invert: false,
            params: Vec::new(),
        }
    }

    pub fn inverted(mut self) -> Self {
        self.invert = !self.invert;
        self
    }

    pub fn with_param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn prepare(
        &self,
        owner: &str,
        ctx: PrepareContext<'_>,
        report: &mut ValidationReport,
    ) -> Option<FunctionFrame> {
        let (function, params) = resolve(
            owner,
            FunctionKind::Decorator,
            &self.function,
            &self.params,
            ctx,
            report,
        )?;
        Some(FunctionFrame {
            kind: FunctionKind::Decorator,
            function,
            invert: self.invert,
            score: 0.0,
            params,
        })
    }
}

/// Authored additive scorer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScoreCalculator {
    pub function: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub invert: bool,
    pub score: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub params: Vec<Param>,
}

impl ScoreCalculator {
    pub fn new(function: impl Into<String>, score: f32) -> Self {
        Self {
            function: function.into(),
            invert: false,
            score,
            params: Vec::new(),
        }
    }

    pub fn inverted(mut self) -> Self {
        self.invert = !self.invert;
        self
    }

    pub fn with_param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn prepare(
        &self,
        owner: &str,
        ctx: PrepareContext<'_>,
        report: &mut ValidationReport,
    ) -> Option<FunctionFrame> {
        let (function, params) = resolve(
            owner,
            FunctionKind::ScoreCalculator,
            &self.function,
            &self.params,
            ctx,
            report,
        )?;
        Some(FunctionFrame {
            kind: FunctionKind::ScoreCalculator,
            function,
            invert: self.invert,
            score: self.score,
            params,
        })
    }
}

/// Authored blackboard mutation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Effector {
    pub function: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub params: Vec<Param>,
}

impl Effector {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn prepare(
        &self,
        owner: &str,
        ctx: PrepareContext<'_>,
        report: &mut ValidationReport,
    ) -> Option<FunctionFrame> {
        let (function, params) = resolve(
            owner,
            FunctionKind::Effector,
            &self.function,
            &self.params,
            ctx,
            report,
        )?;
        Some(FunctionFrame {
            kind: FunctionKind::Effector,
            function,
            invert: false,
            score: 0.0,
            params,
        })
    }
}

/// Resolves a function reference and encodes its parameters, reporting every mismatch.
fn resolve(
    owner: &str,
    kind: FunctionKind,
    name: &str,
    params: &[Param],
    ctx: PrepareContext<'_>,
    report: &mut ValidationReport,
) -> Option<(FunctionId, Vec<u8>)> {
    let Some(id) = ctx.functions.resolve(kind, name) else {
        report.push(ValidationIssue::MissingFunction {
            owner: owner.to_string(),
            kind,
            function: name.to_string(),
        });
        return None;
    };
    let signature = ctx.functions.signature(kind, id).unwrap_or(&[]);

    if signature.len() != params.len() {
        report.push(ValidationIssue::ParamCountMismatch {
            owner: owner.to_string(),
            function: name.to_string(),
            expected: signature.len(),
            actual: params.len(),
        });
        return None;
    }

    let mut encoded = Vec::with_capacity(signature.iter().map(|k| k.size()).sum());
    let mut ok = true;
    for (index, (expected, param)) in signature.iter().zip(params).enumerate() {
        match (expected, param) {
            (ParamKind::Boolean, Param::Boolean(v)) => encoded.push(u8::from(*v)),
            (ParamKind::Float, Param::Float(v)) => encoded.extend_from_slice(&v.to_le_bytes()),
            (ParamKind::Integer, Param::Integer(v)) => encoded.extend_from_slice(&v.to_le_bytes()),
            (ParamKind::Key(expected_type), Param::Key(key)) => {
                let Some(info) = ctx.layout.info(key) else {
                    report.push(ValidationIssue::UnknownKey {
                        owner: owner.to_string(),
                        key: key.clone(),
                    });
                    ok = false;
                    continue;
                };
                if info.key_type != *expected_type {
                    report.push(ValidationIssue::KeyTypeMismatch {
                        owner: owner.to_string(),
                        key: key.clone(),
                        expected: *expected_type,
                        actual: info.key_type,
                    });
                    ok = false;
                    continue;
                }
                encoded.extend_from_slice(&(info.index as u32).to_le_bytes());
                encoded.extend_from_slice(&(info.offset as u32).to_le_bytes());
            }
            (expected, param) => {
                report.push(ValidationIssue::ParamKindMismatch {
                    owner: owner.to_string(),
                    function: name.to_string(),
                    index,
                    expected: *expected,
                    actual: param.describe(),
                });
                ok = false;
            }
        }
    }

    ok.then_some((id, encoded))
}

/// A prepared, sized function frame ready to be compiled.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionFrame {
    kind: FunctionKind,
    function: FunctionId,
    invert: bool,
    score: f32,
    params: Vec<u8>,
}

/// `[size:i32][function:u32]`
pub const FRAME_HEADER: usize = SIZE_PREFIX + 4;

impl FunctionFrame {
    pub fn kind(&self) -> FunctionKind {
        self.kind
    }

    pub fn function(&self) -> FunctionId {
        self.function
    }

    fn fixed_size(&self) -> usize {
        match self.kind {
            FunctionKind::Decorator => 1,
            FunctionKind::ScoreCalculator => 1 + 4,
            FunctionKind::Effector => 0,
        }
    }
}

impl Compile for FunctionFrame {
    fn size_for_compilation(&self) -> usize {
        FRAME_HEADER + self.fixed_size() + self.params.len()
    }

    fn compile(&self, cursor: &mut Cursor<'_>) {
        cursor.write_len(self.size_for_compilation());
        cursor.write_u32(self.function.0);
        match self.kind {
            FunctionKind::Decorator => cursor.write_bool(self.invert),
            FunctionKind::ScoreCalculator => {
                cursor.write_bool(self.invert);
                cursor.write_f32(self.score);
            }
            FunctionKind::Effector => {}
        }
        cursor.write_bytes(&self.params);
    }
}

/// Prepared frames of one kind, compiled as a collection.
pub type FrameCollection = Collection<FunctionFrame>;

/// Prepares a whole list; `None` if any element failed (issues are in `report`).
pub fn prepare_decorators(
    owner: &str,
    decorators: &[Decorator],
    ctx: PrepareContext<'_>,
    report: &mut ValidationReport,
) -> Option<FrameCollection> {
    let frames: Vec<Option<FunctionFrame>> = decorators
        .iter()
        .enumerate()
        .map(|(i, d)| d.prepare(&format!("{owner}[{i}]"), ctx, report))
        .collect();
    frames.into_iter().collect::<Option<Vec<_>>>().map(Collection::prepare)
}

pub fn prepare_score_calculators(
    owner: &str,
    calculators: &[ScoreCalculator],
    ctx: PrepareContext<'_>,
    report: &mut ValidationReport,
) -> Option<FrameCollection> {
    let frames: Vec<Option<FunctionFrame>> = calculators
        .iter()
        .enumerate()
        .map(|(i, s)| s.prepare(&format!("{owner}[{i}]"), ctx, report))
        .collect();
    frames.into_iter().collect::<Option<Vec<_>>>().map(Collection::prepare)
}

pub fn prepare_effectors(
    owner: &str,
    effectors: &[Effector],
    ctx: PrepareContext<'_>,
    report: &mut ValidationReport,
) -> Option<FrameCollection> {
    let frames: Vec<Option<FunctionFrame>> = effectors
        .iter()
        .enumerate()
        .map(|(i, e)| e.prepare(&format!("{owner}[{i}]"), ctx, report))
        .collect();
    frames.into_iter().collect::<Option<Vec<_>>>().map(Collection::prepare)
}

/// Runs a native function, turning a panic into [`FunctionFault::Panicked`].
fn guarded<R>(call: impl FnOnce() -> Result<R, FunctionFault>) -> Result<R, FunctionFault> {
    panic::catch_unwind(AssertUnwindSafe(call))
        .unwrap_or_else(|payload| Err(FunctionFault::Panicked(panic_message(&*payload))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DecoratorFrameView<'a> {
    bytes: &'a [u8],
}

impl<'a> DecoratorFrameView<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes: stream::frame(bytes),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn function(&self) -> FunctionId {
        FunctionId(stream::read_u32(self.bytes, SIZE_PREFIX))
    }

    pub fn invert(&self) -> bool {
        stream::read_bool(self.bytes, FRAME_HEADER)
    }

    pub fn params(&self) -> Params<'a> {
        Params::new(&self.bytes[FRAME_HEADER + 1..])
    }

    /// Runs the predicate; faults are logged and count as `false` regardless of inversion.
    pub fn evaluate(&self, functions: &FunctionTable, blackboard: &Blackboard) -> bool {
        let Some(entry) = functions.decorator(self.function()) else {
            tracing::error!(function = self.function().0, "decorator frame references an unregistered function");
            return false;
        };
        let mut params = self.params();
        match guarded(|| (entry.function)(blackboard, &mut params)) {
            Ok(result) => result != self.invert(),
            Err(fault) => {
                tracing::warn!(function = %entry.name, %fault, "decorator faulted; treating as false");
                false
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScoreFrameView<'a> {
    bytes: &'a [u8],
}

impl<'a> ScoreFrameView<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes: stream::frame(bytes),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn function(&self) -> FunctionId {
        FunctionId(stream::read_u32(self.bytes, SIZE_PREFIX))
    }

    pub fn invert(&self) -> bool {
        stream::read_bool(self.bytes, FRAME_HEADER)
    }

    pub fn score(&self) -> f32 {
        stream::read_f32(self.bytes, FRAME_HEADER + 1)
    }

    pub fn params(&self) -> Params<'a> {
        Params::new(&self.bytes[FRAME_HEADER + 5..])
    }

    /// Contribution to a running total: `r`, or `score - r` when inverted. Faults contribute 0.
    pub fn evaluate(&self, functions: &FunctionTable, blackboard: &Blackboard) -> f32 {
        let Some(entry) = functions.score(self.function()) else {
            tracing::error!(function = self.function().0, "score frame references an unregistered function");
            return 0.0;
        };
        let score = self.score();
        let mut params = self.params();
        match guarded(|| (entry.function)(blackboard, &mut params, score)) {
            Ok(r) if self.invert() => score - r,
            Ok(r) => r,
            Err(fault) => {
                tracing::warn!(function = %entry.name, %fault, "score calculator faulted; contributing 0");
                0.0
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EffectorFrameView<'a> {
    bytes: &'a [u8],
}

impl<'a> EffectorFrameView<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes: stream::frame(bytes),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn function(&self) -> FunctionId {
        FunctionId(stream::read_u32(self.bytes, SIZE_PREFIX))
    }

    pub fn params(&self) -> Params<'a> {
        Params::new(&self.bytes[FRAME_HEADER..])
    }

    /// Applies the effect in place. A fault leaves whatever the function wrote before failing.
    pub fn apply(&self, functions: &FunctionTable, blackboard: &mut Blackboard) {
        let Some(entry) = functions.effector(self.function()) else {
            tracing::error!(function = self.function().0, "effector frame references an unregistered function");
            return;
        };
        let mut params = self.params();
        if let Err(fault) = guarded(|| (entry.function)(blackboard, &mut params)) {
            tracing::warn!(function = %entry.name, %fault, "effector faulted; effect skipped");
        }
    }
}

/// AND-chain of decorators. Empty chains hold.
#[derive(Debug, Clone, Copy)]
pub struct DecoratorCollectionView<'a>(CollectionView<'a>);

impl<'a> DecoratorCollectionView<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self(CollectionView::new(bytes))
    }

    pub fn size(&self) -> usize {
        self.0.size()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn frames(&self) -> impl Iterator<Item = DecoratorFrameView<'a>> {
        self.0.frames().map(DecoratorFrameView::new)
    }

    pub fn all(&self, functions: &FunctionTable, blackboard: &Blackboard) -> bool {
        self.frames().all(|d| d.evaluate(functions, blackboard))
    }
}

/// Sum of score contributions, starting from 0.
#[derive(Debug, Clone, Copy)]
pub struct ScoreCollectionView<'a>(CollectionView<'a>);

impl<'a> ScoreCollectionView<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self(CollectionView::new(bytes))
    }

    pub fn size(&self) -> usize {
        self.0.size()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn frames(&self) -> impl Iterator<Item = ScoreFrameView<'a>> {
        self.0.frames().map(ScoreFrameView::new)
    }

    pub fn total(&self, functions: &FunctionTable, blackboard: &Blackboard) -> f32 {
        self.frames()
            .map(|s| s.evaluate(functions, blackboard))
            .sum()
    }
}

/// Effects applied in authored order.
#[derive(Debug, Clone, Copy)]
pub struct EffectorCollectionView<'a>(CollectionView<'a>);

impl<'a> EffectorCollectionView<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self(CollectionView::new(bytes))
    }

    pub fn size(&self) -> usize {
        self.0.size()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn frames(&self) -> impl Iterator<Item = EffectorFrameView<'a>> {
        self.0.frames().map(EffectorFrameView::new)
    }

    pub fn apply(&self, functions: &FunctionTable, blackboard: &mut Blackboard) {
        for effector in self.frames() {
            effector.apply(functions, blackboard);
        }
    }
}
