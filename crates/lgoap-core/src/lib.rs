//! Compiled working memory and behavior-function frames for layered goal/action planning.
//!
//! Everything here compiles into flat byte buffers in two passes (size, then write) and is read
//! back through borrowing views. See [`stream`] for the framing shared by every compiled object.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod blackboard;
pub mod builtins;
pub mod error;
pub mod function;
pub mod key;
pub mod stream;
pub mod template;
pub mod tick;
pub mod validation;

pub use blackboard::{BbKey, Blackboard, BlackboardLayout, KeyInfo};
pub use error::{BlackboardError, FunctionFault};
pub use function::{
    Decorator, DecoratorCollectionView, DecoratorFn, DecoratorFrameView, Effector,
    EffectorCollectionView, EffectorFn, EffectorFrameView, FrameCollection, FunctionFrame,
    FunctionId, FunctionKind, FunctionTable, Param, ParamKind, Params, PrepareContext,
    ScoreCalculator, ScoreCollectionView, ScoreFn, ScoreFrameView,
};
pub use key::{
    BlackboardValue, KeyDecl, KeyTraits, KeyType, KeyValue, ObjectId, Quaternion, Vector3,
    MAX_VALUE_SIZE,
};
pub use stream::{Collection, CollectionView, Compile, CompileObserver, Cursor};
pub use template::{BlackboardTemplate, TemplateLibrary};
pub use tick::TickContext;
pub use validation::{ValidationIssue, ValidationReport};
