//! Built-in behavior functions, plus authoring helpers that reference them by name.

use crate::{
    Blackboard, Decorator, Effector, FunctionFault, FunctionTable, KeyType, ObjectId, Param,
    ParamKind, Params, ScoreCalculator,
};

pub const ALWAYS: &str = "always";
pub const BOOL_IS_SET: &str = "bool_is_set";
pub const INT_COMPARE: &str = "int_compare";
pub const FLOAT_COMPARE: &str = "float_compare";
pub const OBJECT_IS_SET: &str = "object_is_set";

pub const CONSTANT: &str = "constant";
pub const BOOL_SCORE: &str = "bool_score";
pub const FLOAT_SCALED: &str = "float_scaled";

pub const BOOL_SET: &str = "bool_set";
pub const INT_SET: &str = "int_set";
pub const INT_ADD: &str = "int_add";
pub const FLOAT_SET: &str = "float_set";
pub const FLOAT_ADD: &str = "float_add";
pub const OBJECT_CLEAR: &str = "object_clear";

/// Comparison operator, encoded as an `i32` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Comparison {
    Equal = 0,
    NotEqual = 1,
    Less = 2,
    LessOrEqual = 3,
    Greater = 4,
    GreaterOrEqual = 5,
}

impl Comparison {
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => Comparison::Equal,
            1 => Comparison::NotEqual,
            2 => Comparison::Less,
            3 => Comparison::LessOrEqual,
            4 => Comparison::Greater,
            5 => Comparison::GreaterOrEqual,
            _ => return None,
        })
    }

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn apply<T: PartialOrd>(self, lhs: T, rhs: T) -> bool {
        match self {
            Comparison::Equal => lhs == rhs,
            Comparison::NotEqual => lhs != rhs,
            Comparison::Less => lhs < rhs,
            Comparison::LessOrEqual => lhs <= rhs,
            Comparison::Greater => lhs > rhs,
            Comparison::GreaterOrEqual => lhs >= rhs,
        }
    }
}

fn comparison(params: &mut Params<'_>) -> Result<Comparison, FunctionFault> {
    let code = params.integer()?;
    Comparison::from_code(code)
        .ok_or_else(|| FunctionFault::InvalidParam(format!("unknown comparison code {code}")))
}

fn always(_: &Blackboard, _: &mut Params<'_>) -> Result<bool, FunctionFault> {
    Ok(true)
}

fn bool_is_set(bb: &Blackboard, params: &mut Params<'_>) -> Result<bool, FunctionFault> {
    Ok(bb.get(params.key::<bool>()?))
}

fn int_compare(bb: &Blackboard, params: &mut Params<'_>) -> Result<bool, FunctionFault> {
    let value = bb.get(params.key::<i32>()?);
    let op = comparison(params)?;
    Ok(op.apply(value, params.integer()?))
}

fn float_compare(bb: &Blackboard, params: &mut Params<'_>) -> Result<bool, FunctionFault> {
    let value = bb.get(params.key::<f32>()?);
    let op = comparison(params)?;
    Ok(op.apply(value, params.float()?))
}

fn object_is_set(bb: &Blackboard, params: &mut Params<'_>) -> Result<bool, FunctionFault> {
    Ok(bb.get(params.key::<ObjectId>()?).is_some())
}

fn constant(_: &Blackboard, _: &mut Params<'_>, score: f32) -> Result<f32, FunctionFault> {
    Ok(score)
}

fn bool_score(bb: &Blackboard, params: &mut Params<'_>, score: f32) -> Result<f32, FunctionFault> {
    Ok(if bb.get(params.key::<bool>()?) { score } else { 0.0 })
}

fn float_scaled(bb: &Blackboard, params: &mut Params<'_>, score: f32) -> Result<f32, FunctionFault> {
    Ok(score * bb.get(params.key::<f32>()?))
}

// Effects are anticipated writes: they never raise unexpected changes.

fn bool_set(bb: &mut Blackboard, params: &mut Params<'_>) -> Result<(), FunctionFault> {
    let key = params.key::<bool>()?;
    bb.set_expected(key, params.boolean()?);
    Ok(())
}

fn int_set(bb: &mut Blackboard, params: &mut Params<'_>) -> Result<(), FunctionFault> {
    let key = params.key::<i32>()?;
    bb.set_expected(key, params.integer()?);
    Ok(())
}

fn int_add(bb: &mut Blackboard, params: &mut Params<'_>) -> Result<(), FunctionFault> {
    let key = params.key::<i32>()?;
    let value = bb.get(key).saturating_add(params.integer()?);
    bb.set_expected(key, value);
    Ok(())
}

fn float_set(bb: &mut Blackboard, params: &mut Params<'_>) -> Result<(), FunctionFault> {
    let key = params.key::<f32>()?;
    bb.set_expected(key, params.float()?);
    Ok(())
}

fn float_add(bb: &mut Blackboard, params: &mut Params<'_>) -> Result<(), FunctionFault> {
    let key = params.key::<f32>()?;
    let value = bb.get(key) + params.float()?;
    bb.set_expected(key, value);
    Ok(())
}

fn object_clear(bb: &mut Blackboard, params: &mut Params<'_>) -> Result<(), FunctionFault> {
    let key = params.key::<ObjectId>()?;
    bb.set_expected(key, ObjectId::NONE);
    Ok(())
}

/// Registers every built-in under its public name.
pub fn install(table: &mut FunctionTable) {
    use ParamKind::{Boolean, Float, Integer, Key};

    table.register_decorator(ALWAYS, &[], always);
    table.register_decorator(BOOL_IS_SET, &[Key(KeyType::Boolean)], bool_is_set);
    table.register_decorator(INT_COMPARE, &[Key(KeyType::Integer), Integer, Integer], int_compare);
    table.register_decorator(FLOAT_COMPARE, &[Key(KeyType::Float), Integer, Float], float_compare);
    table.register_decorator(OBJECT_IS_SET, &[Key(KeyType::Object)], object_is_set);

    table.register_score_calculator(CONSTANT, &[], constant);
    table.register_score_calculator(BOOL_SCORE, &[Key(KeyType::Boolean)], bool_score);
    table.register_score_calculator(FLOAT_SCALED, &[Key(KeyType::Float)], float_scaled);

    table.register_effector(BOOL_SET, &[Key(KeyType::Boolean), Boolean], bool_set);
    table.register_effector(INT_SET, &[Key(KeyType::Integer), Integer], int_set);
    table.register_effector(INT_ADD, &[Key(KeyType::Integer), Integer], int_add);
    table.register_effector(FLOAT_SET, &[Key(KeyType::Float), Float], float_set);
    table.register_effector(FLOAT_ADD, &[Key(KeyType::Float), Float], float_add);
    table.register_effector(OBJECT_CLEAR, &[Key(KeyType::Object)], object_clear);
}

pub fn always_true() -> Decorator {
    Decorator::new(ALWAYS)
}

pub fn is_set(key: &str) -> Decorator {
    Decorator::new(BOOL_IS_SET).with_param(Param::key(key))
}

pub fn is_unset(key: &str) -> Decorator {
    is_set(key).inverted()
}

pub fn compare_int(key: &str, op: Comparison, rhs: i32) -> Decorator {
    Decorator::new(INT_COMPARE)
        .with_param(Param::key(key))
        .with_param(Param::Integer(op.code()))
        .with_param(Param::Integer(rhs))
}

pub fn compare_float(key: &str, op: Comparison, rhs: f32) -> Decorator {
    Decorator::new(FLOAT_COMPARE)
        .with_param(Param::key(key))
        .with_param(Param::Integer(op.code()))
        .with_param(Param::Float(rhs))
}

pub fn has_object(key: &str) -> Decorator {
    Decorator::new(OBJECT_IS_SET).with_param(Param::key(key))
}

pub fn constant_score(score: f32) -> ScoreCalculator {
    ScoreCalculator::new(CONSTANT, score)
}

/// `score` while the boolean key is set, else 0.
pub fn score_if(key: &str, score: f32) -> ScoreCalculator {
    ScoreCalculator::new(BOOL_SCORE, score).with_param(Param::key(key))
}

pub fn scaled_score(key: &str, factor: f32) -> ScoreCalculator {
    ScoreCalculator::new(FLOAT_SCALED, factor).with_param(Param::key(key))
}

pub fn set_bool(key: &str, value: bool) -> Effector {
    Effector::new(BOOL_SET)
        .with_param(Param::key(key))
        .with_param(Param::Boolean(value))
}

pub fn set_int(key: &str, value: i32) -> Effector {
    Effector::new(INT_SET)
        .with_param(Param::key(key))
        .with_param(Param::Integer(value))
}

pub fn add_int(key: &str, delta: i32) -> Effector {
    Effector::new(INT_ADD)
        .with_param(Param::key(key))
        .with_param(Param::Integer(delta))
}

pub fn set_float(key: &str, value: f32) -> Effector {
    Effector::new(FLOAT_SET)
        .with_param(Param::key(key))
        .with_param(Param::Float(value))
}

pub fn add_float(key: &str, delta: f32) -> Effector {
    Effector::new(FLOAT_ADD)
        .with_param(Param::key(key))
        .with_param(Param::Float(delta))
}

pub fn clear_object(key: &str) -> Effector {
    Effector::new(OBJECT_CLEAR).with_param(Param::key(key))
}
