use std::sync::Arc;

use lgoap_core::builtins::{self, Comparison};
use lgoap_core::stream::{compile_to_buffer, COLLECTION_HEADER};
use lgoap_core::{
    function, Blackboard, BlackboardLayout, BlackboardTemplate, Decorator,
    DecoratorCollectionView, Effector, EffectorCollectionView, FunctionFault, FunctionKind, FunctionTable,
    KeyDecl, KeyType, Param, ParamKind, Params, PrepareContext, ScoreCalculator,
    ScoreCollectionView,
    TemplateLibrary, ValidationIssue, ValidationReport,
};

fn layout() -> Arc<BlackboardLayout> {
    TemplateLibrary::new()
        .with(
            BlackboardTemplate::new("Agent")
                .with_key(KeyDecl::boolean("armed", false))
                .with_key(KeyDecl::integer("ammo", 4))
                .with_key(KeyDecl::float("hunger", 0.5)),
        )
        .compile("Agent")
        .unwrap()
}

fn failing(_: &Blackboard, params: &mut Params<'_>) -> Result<bool, FunctionFault> {
    params.integer()?;
    Err(FunctionFault::Failed("sensor offline".into()))
}

fn panicking_check(_: &Blackboard, _: &mut Params<'_>) -> Result<bool, FunctionFault> {
    panic!("sensor exploded")
}

fn panicking_score(_: &Blackboard, _: &mut Params<'_>, _: f32) -> Result<f32, FunctionFault> {
    panic!("score exploded")
}

fn panicking_effect(_: &mut Blackboard, _: &mut Params<'_>) -> Result<(), FunctionFault> {
    panic!("effect exploded")
}

#[test]
fn frames_describe_their_own_size() {
    let layout = layout();
    let functions = FunctionTable::with_builtins();
    let ctx = PrepareContext {
        layout: &layout,
        functions: &functions,
    };
    let mut report = ValidationReport::new();
    let decorators = [
        builtins::always_true(),
        builtins::is_set("armed"),
        builtins::compare_int("ammo", Comparison::Greater, 2),
    ];
    let collection =
        function::prepare_decorators("test", &decorators, ctx, &mut report).unwrap();
    assert!(report.is_ok());

    let buffer = compile_to_buffer(&collection);
    let view = DecoratorCollectionView::new(&buffer);
    assert_eq!(view.size(), buffer.len());
    assert_eq!(view.len(), 3);

    // header + invert, then params: none, one key, key + op + rhs
    let sizes: Vec<usize> = view.frames().map(|f| f.size()).collect();
    assert_eq!(sizes, vec![9, 9 + 8, 9 + 8 + 4 + 4]);
    assert_eq!(COLLECTION_HEADER + sizes.iter().sum::<usize>(), buffer.len());
}

#[test]
fn decorator_chains_short_circuit_on_false() {
    let layout = layout();
    let functions = FunctionTable::with_builtins();
    let ctx = PrepareContext {
        layout: &layout,
        functions: &functions,
    };
    let mut report = ValidationReport::new();
    let decorators = [
        builtins::is_unset("armed"),
        builtins::compare_float("hunger", Comparison::GreaterOrEqual, 0.5),
    ];
    let buffer = compile_to_buffer(
        &function::prepare_decorators("test", &decorators, ctx, &mut report).unwrap(),
    );
    let view = DecoratorCollectionView::new(&buffer);

    let mut bb = layout.new_blackboard();
    assert!(view.all(&functions, &bb));
    bb.set(layout.key::<bool>("armed").unwrap(), true);
    assert!(!view.all(&functions, &bb));
}

#[test]
fn inverted_scores_contribute_the_remainder() {
    let layout = layout();
    let functions = FunctionTable::with_builtins();
    let ctx = PrepareContext {
        layout: &layout,
        functions: &functions,
    };
    let mut report = ValidationReport::new();
    let scores = [
        builtins::constant_score(2.0),
        builtins::scaled_score("hunger", 10.0).inverted(),
        builtins::score_if("armed", 100.0),
    ];
    let buffer = compile_to_buffer(
        &function::prepare_score_calculators("test", &scores, ctx, &mut report).unwrap(),
    );
    let view = ScoreCollectionView::new(&buffer);
    let bb = layout.new_blackboard();

    // 2 + (10 - 10 * 0.5) + 0
    assert_eq!(view.total(&functions, &bb), 7.0);
}

#[test]
fn effects_apply_in_order_without_flagging() {
    let layout = layout();
    let functions = FunctionTable::with_builtins();
    let ctx = PrepareContext {
        layout: &layout,
        functions: &functions,
    };
    let mut report = ValidationReport::new();
    let effects = [
        builtins::set_int("ammo", 10),
        builtins::add_int("ammo", -3),
        builtins::set_bool("armed", true),
    ];
    let buffer = compile_to_buffer(
        &function::prepare_effectors("test", &effects, ctx, &mut report).unwrap(),
    );
    let mut bb = layout.new_blackboard();
    EffectorCollectionView::new(&buffer).apply(&functions, &mut bb);

    assert_eq!(bb.get(layout.key::<i32>("ammo").unwrap()), 7);
    assert!(bb.get(layout.key::<bool>("armed").unwrap()));
    assert!(!bb.has_unexpected_changes());
}

#[test]
fn faults_degrade_to_false_even_when_inverted() {
    let layout = layout();
    let mut functions = FunctionTable::new();
    functions.register_decorator("failing", &[ParamKind::Integer], failing);
    let ctx = PrepareContext {
        layout: &layout,
        functions: &functions,
    };
    let mut report = ValidationReport::new();
    let decorators = [Decorator::new("failing")
        .inverted()
        .with_param(Param::Integer(1))];
    let buffer = compile_to_buffer(
        &function::prepare_decorators("test", &decorators, ctx, &mut report).unwrap(),
    );
    let bb = layout.new_blackboard();
    assert!(!DecoratorCollectionView::new(&buffer).all(&functions, &bb));
}

#[test]
fn unresolvable_references_become_issues() {
    let layout = layout();
    let functions = FunctionTable::with_builtins();
    let ctx = PrepareContext {
        layout: &layout,
        functions: &functions,
    };
    let mut report = ValidationReport::new();
    let decorators = [
        Decorator::new("teleported"),
        builtins::is_set("ammo"),
        builtins::is_set("missing"),
        Decorator::new(builtins::INT_COMPARE)
            .with_param(Param::key("ammo"))
            .with_param(Param::Float(1.0))
            .with_param(Param::Integer(0)),
        Decorator::new(builtins::ALWAYS).with_param(Param::Boolean(true)),
    ];
    assert!(function::prepare_decorators("goal", &decorators, ctx, &mut report).is_none());

    assert_eq!(
        report.issues(),
        &[
            ValidationIssue::MissingFunction {
                owner: "goal[0]".into(),
                kind: FunctionKind::Decorator,
                function: "teleported".into(),
            },
            ValidationIssue::KeyTypeMismatch {
                owner: "goal[1]".into(),
                key: "ammo".into(),
                expected: KeyType::Boolean,
                actual: KeyType::Integer,
            },
            ValidationIssue::UnknownKey {
                owner: "goal[2]".into(),
                key: "missing".into(),
            },
            ValidationIssue::ParamKindMismatch {
                owner: "goal[3]".into(),
                function: "int_compare".into(),
                index: 1,
                expected: ParamKind::Integer,
                actual: "float",
            },
            ValidationIssue::ParamCountMismatch {
                owner: "goal[4]".into(),
                function: "always".into(),
                expected: 0,
                actual: 1,
            },
        ]
    );
}

#[test]
fn params_reader_reports_exhaustion() {
    let bytes = 7i32.to_le_bytes();
    let mut params = Params::new(&bytes);
    assert_eq!(params.integer(), Ok(7));
    assert_eq!(params.remaining(), 0);
    assert_eq!(
        params.float(),
        Err(FunctionFault::ParamsExhausted { wanted: "float" })
    );
}

#[test]
fn re_registering_replaces_in_place() {
    let mut functions = FunctionTable::with_builtins();
    let id = functions.resolve(FunctionKind::Decorator, builtins::ALWAYS).unwrap();
    let again = functions.register_decorator(builtins::ALWAYS, &[ParamKind::Integer], failing);
    assert_eq!(id, again);
    assert_eq!(
        functions.signature(FunctionKind::Decorator, id),
        Some(&[ParamKind::Integer][..])
    );
    assert_eq!(functions.name(FunctionKind::Decorator, id), Some("always"));
}

#[test]
fn panics_degrade_like_faults() {
    let layout = layout();
    let mut functions = FunctionTable::with_builtins();
    functions.register_decorator("panicking", &[], panicking_check);
    functions.register_score_calculator("panicking", &[], panicking_score);
    functions.register_effector("panicking", &[], panicking_effect);
    let ctx = PrepareContext {
        layout: &layout,
        functions: &functions,
    };
    let mut report = ValidationReport::new();

    let decorators = [Decorator::new("panicking").inverted()];
    let decorators = compile_to_buffer(
        &function::prepare_decorators("test", &decorators, ctx, &mut report).unwrap(),
    );
    let scores = [
        builtins::constant_score(2.0),
        ScoreCalculator::new("panicking", 5.0).inverted(),
    ];
    let scores = compile_to_buffer(
        &function::prepare_score_calculators("test", &scores, ctx, &mut report).unwrap(),
    );
    let effects = [
        builtins::set_int("ammo", 1),
        Effector::new("panicking"),
        builtins::set_bool("armed", true),
    ];
    let effects = compile_to_buffer(
        &function::prepare_effectors("test", &effects, ctx, &mut report).unwrap(),
    );
    assert!(report.is_ok());

    let mut bb = layout.new_blackboard();
    assert!(!DecoratorCollectionView::new(&decorators).all(&functions, &bb));
    assert_eq!(ScoreCollectionView::new(&scores).total(&functions, &bb), 2.0);

    EffectorCollectionView::new(&effects).apply(&functions, &mut bb);
    assert_eq!(bb.get(layout.key::<i32>("ammo").unwrap()), 1);
    assert!(bb.get(layout.key::<bool>("armed").unwrap()));
}
