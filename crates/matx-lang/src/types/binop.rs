//! Binary operator table: maps `(op, lhs type, rhs type)` to the result type
//! and the implementation.
//!
//! The analyzer only reads result types; the evaluator runs the functions.
//! Both consult the same table, so a program that type-checks never reaches
//! a missing runtime entry.

use std::collections::HashMap;

use crate::error::MathError;
use crate::runtime::value::Value;
use crate::syntax::ast::BinaryOp;
use crate::types::Type;
use crate::types::linalg::*;

// ─── Function pointer ────────────────────────────────────────────────────────

pub type BinopFn = fn(BinaryOp, Value, Value) -> Result<Value, MathError>;

// ─── Registry ────────────────────────────────────────────────────────────────

pub struct BinopRegistry {
    ops: HashMap<(BinaryOp, Type, Type), (Type, BinopFn)>,
}

impl BinopRegistry {
    pub fn new() -> Self {
        Self { ops: HashMap::new() }
    }

    pub fn register(&mut self, op: BinaryOp, lhs: Type, rhs: Type, ret: Type, f: BinopFn) {
        self.ops.insert((op, lhs, rhs), (ret, f));
    }

    fn register_each(&mut self, ops: &[BinaryOp], lhs: Type, rhs: Type, ret: Type, f: BinopFn) {
        for &op in ops {
            self.register(op, lhs, rhs, ret, f);
        }
    }

    /// Result type of `lhs op rhs`, or `None` when the pairing is undefined.
    pub fn result_type(&self, op: BinaryOp, lhs: Type, rhs: Type) -> Option<Type> {
        self.ops.get(&(op, lhs, rhs)).map(|(ret, _)| *ret)
    }

    /// Evaluates `l op r`. `None` when no entry exists for the operand types.
    pub fn eval(&self, op: BinaryOp, l: Value, r: Value) -> Option<Result<Value, MathError>> {
        let (f, ret) = self.ops.get(&(op, l.ty(), r.ty())).map(|(ret, f)| (*f, *ret))?;
        let result = f(op, l, r);
        debug_assert!(result.as_ref().map_or(true, |v| v.ty() == ret));
        Some(result)
    }
}

impl Default for BinopRegistry {
    fn default() -> Self {
        let mut r = Self::new();
        register_scalars(&mut r);
        register_bool(&mut r);
        register_vectors(&mut r);
        register_matrices(&mut r);
        register_quat(&mut r);
        r
    }
}

// ─── Operator groups ─────────────────────────────────────────────────────────

use BinaryOp::*;

const ARITHMETIC: [BinaryOp; 6] = [Add, Sub, Mul, Div, Mod, Pow];
const BITWISE: [BinaryOp; 5] = [BitXor, BitOr, BitAnd, Shl, Shr];
const COMPARISON: [BinaryOp; 6] = [Eq, NotEq, Gt, Lt, GtEq, LtEq];
const COMPONENTWISE: [BinaryOp; 5] = [Add, Sub, Mul, Div, IntDiv];
/// Scalar operators for matrices and quaternions, whose `*` is not componentwise between arrays.
const SCALING: [BinaryOp; 3] = [Mul, Div, IntDiv];
const EQUALITY: [BinaryOp; 2] = [Eq, NotEq];

const SCALARS: [Type; 2] = [Type::Int, Type::Num];
const VECTORS: [Type; 3] = [Type::Vec2, Type::Vec3, Type::Vec4];

// ─── int / num ───────────────────────────────────────────────────────────────

fn register_scalars(r: &mut BinopRegistry) {
    let (int, num) = (Type::Int, Type::Num);
    r.register_each(&ARITHMETIC, int, int, int, int_int);
    r.register(Div, int, int, num, int_int);
    r.register_each(&[IntDiv], int, int, int, int_int);
    r.register_each(&BITWISE, int, int, int, int_int);
    r.register_each(&COMPARISON, int, int, Type::Bool, int_int);

    for (lhs, rhs) in [(int, num), (num, int), (num, num)] {
        r.register_each(&ARITHMETIC, lhs, rhs, num, mixed_scalar);
        r.register(IntDiv, lhs, rhs, int, mixed_scalar);
        r.register_each(&COMPARISON, lhs, rhs, Type::Bool, mixed_scalar);
    }
}

fn int_int(op: BinaryOp, l: Value, r: Value) -> Result<Value, MathError> {
    let (Value::Int(a), Value::Int(b)) = (&l, &r) else { return Err(mismatch(op, &l, &r)) };
    let (a, b) = (*a, *b);
    if op.is_comparison() {
        return Ok(Value::Bool(compare(op, a, b)));
    }
    if op == Div {
        return real(op, a as f64, b as f64).map(Value::Num);
    }
    checked_int(op, a, b).map(Value::Int)
}

fn mixed_scalar(op: BinaryOp, l: Value, r: Value) -> Result<Value, MathError> {
    let (Some(a), Some(b)) = (l.as_f64(), r.as_f64()) else { return Err(mismatch(op, &l, &r)) };
    match op {
        _ if op.is_comparison() => Ok(Value::Bool(compare(op, a, b))),
        IntDiv => int_div(a, b).map(Value::Int),
        _ => real(op, a, b).map(Value::Num),
    }
}

// ─── bool ────────────────────────────────────────────────────────────────────

fn register_bool(r: &mut BinopRegistry) {
    let b = Type::Bool;
    r.register_each(&[And, Or], b, b, b, bool_bool);
    r.register_each(&COMPARISON, b, b, b, bool_bool);
}

fn bool_bool(op: BinaryOp, l: Value, r: Value) -> Result<Value, MathError> {
    let (Value::Bool(a), Value::Bool(b)) = (&l, &r) else { return Err(mismatch(op, &l, &r)) };
    Ok(Value::Bool(match op {
        And => *a && *b,
        Or  => *a || *b,
        _   => compare(op, a, b),
    }))
}

// ─── vec2 / vec3 / vec4 ──────────────────────────────────────────────────────

fn register_vectors(r: &mut BinopRegistry) {
    for v in VECTORS {
        r.register_each(&COMPONENTWISE, v, v, v, array_array);
        r.register_each(&EQUALITY, v, v, Type::Bool, array_array);
        for s in SCALARS {
            r.register_each(&COMPONENTWISE, v, s, v, array_scalar);
            r.register_each(&COMPONENTWISE, s, v, v, scalar_array);
        }
    }
}

// ─── mat3 / mat4 ─────────────────────────────────────────────────────────────

fn register_matrices(r: &mut BinopRegistry) {
    for (m, v) in [(Type::Mat3, Type::Vec3), (Type::Mat4, Type::Vec4)] {
        r.register_each(&[Add, Sub], m, m, m, array_array);
        r.register_each(&EQUALITY, m, m, Type::Bool, array_array);
        r.register(Mul, m, m, m, matrix_product);
        r.register(Mul, m, v, v, matrix_product);
        r.register(Mul, v, m, v, matrix_product);
        for s in SCALARS {
            r.register_each(&SCALING, m, s, m, array_scalar);
            r.register_each(&SCALING, s, m, m, scalar_array);
        }
    }
}

fn matrix_product(op: BinaryOp, l: Value, r: Value) -> Result<Value, MathError> {
    Ok(match (&l, &r) {
        (Value::Mat3(a), Value::Mat3(b)) => Value::Mat3(Box::new(m3_mul(a, b))),
        (Value::Mat4(a), Value::Mat4(b)) => Value::Mat4(Box::new(m4_mul(a, b))),
        (Value::Mat3(m), Value::Vec3(v)) => Value::Vec3(m3_mul_vec(m, v)),
        (Value::Mat4(m), Value::Vec4(v)) => Value::Vec4(m4_mul_vec(m, v)),
        (Value::Vec3(v), Value::Mat3(m)) => Value::Vec3(vec_mul_m3(v, m)),
        (Value::Vec4(v), Value::Mat4(m)) => Value::Vec4(vec_mul_m4(v, m)),
        _ => return Err(mismatch(op, &l, &r)),
    })
}

// ─── quat ────────────────────────────────────────────────────────────────────

fn register_quat(r: &mut BinopRegistry) {
    let q = Type::Quat;
    r.register_each(&[Add, Sub], q, q, q, array_array);
    r.register_each(&EQUALITY, q, q, Type::Bool, array_array);
    r.register_each(&[Mul, Div], q, q, q, quat_product);
    r.register(Mul, q, Type::Vec3, Type::Vec3, quat_product);
    for s in SCALARS {
        r.register_each(&SCALING, q, s, q, array_scalar);
        r.register_each(&SCALING, s, q, q, scalar_array);
        r.register(Pow, q, s, q, quat_power);
    }
}

fn quat_product(op: BinaryOp, l: Value, r: Value) -> Result<Value, MathError> {
    Ok(match (op, &l, &r) {
        (Mul, Value::Quat(p), Value::Quat(q)) => Value::Quat(q_mul(p, q)),
        (Div, Value::Quat(p), Value::Quat(q)) => Value::Quat(q_div(p, q)),
        (Mul, Value::Quat(q), Value::Vec3(v)) => Value::Vec3(q_rotate(q, v)),
        _ => return Err(mismatch(op, &l, &r)),
    })
}

fn quat_power(op: BinaryOp, l: Value, r: Value) -> Result<Value, MathError> {
    let (Value::Quat(q), Some(t)) = (&l, r.as_f64()) else { return Err(mismatch(op, &l, &r)) };
    let p = q_pow(q, t);
    match p.iter().find(|c| !c.is_finite()) {
        Some(bad) => Err(MathError::NonFinite(*bad)),
        None => Ok(Value::Quat(p)),
    }
}

// ─── Component-wise helpers ──────────────────────────────────────────────────

fn array_array(op: BinaryOp, l: Value, r: Value) -> Result<Value, MathError> {
    if let (Some(a), Some(b)) = (l.components(), r.components()) {
        match op {
            Eq => return Ok(Value::Bool(a.iter().zip(b).all(|(x, y)| x == y))),
            NotEq => return Ok(Value::Bool(a.iter().zip(b).any(|(x, y)| x != y))),
            _ => {}
        }
    }
    l.zip_components(&r, |a, b| component(op, a, b))
        .unwrap_or_else(|| Err(mismatch(op, &l, &r)))
}

fn array_scalar(op: BinaryOp, l: Value, r: Value) -> Result<Value, MathError> {
    let Some(s) = r.as_f64() else { return Err(mismatch(op, &l, &r)) };
    l.map_components(|x| component(op, x, s))
        .unwrap_or_else(|| Err(mismatch(op, &l, &r)))
}

/// The scalar stays on the left: `2 - v` is `[2 - x, ...]`.
fn scalar_array(op: BinaryOp, l: Value, r: Value) -> Result<Value, MathError> {
    let Some(s) = l.as_f64() else { return Err(mismatch(op, &l, &r)) };
    r.map_components(|x| component(op, s, x))
        .unwrap_or_else(|| Err(mismatch(op, &l, &r)))
}

// ─── Scalar kernels ──────────────────────────────────────────────────────────

fn mismatch(op: BinaryOp, l: &Value, r: &Value) -> MathError {
    MathError::Operands { op: op.symbol(), lhs: l.ty(), rhs: r.ty() }
}

fn compare<T: PartialOrd>(op: BinaryOp, a: T, b: T) -> bool {
    match op {
        Eq    => a == b,
        NotEq => a != b,
        Gt    => a > b,
        Lt    => a < b,
        GtEq  => a >= b,
        LtEq  => a <= b,
        _     => false,
    }
}

/// Checked 64-bit integer arithmetic. `//` and `%` truncate toward zero.
fn checked_int(op: BinaryOp, a: i64, b: i64) -> Result<i64, MathError> {
    let shift = |b: i64| {
        if (0..64).contains(&b) { Ok(b as u32) } else { Err(MathError::ShiftRange(b)) }
    };
    match op {
        Add => a.checked_add(b).ok_or(MathError::Overflow),
        Sub => a.checked_sub(b).ok_or(MathError::Overflow),
        Mul => a.checked_mul(b).ok_or(MathError::Overflow),
        IntDiv | Mod if b == 0 => Err(MathError::DivisionByZero),
        IntDiv => a.checked_div(b).ok_or(MathError::Overflow),
        Mod => a.checked_rem(b).ok_or(MathError::Overflow),
        Pow if b < 0 => Err(MathError::NegativeExponent(b)),
        Pow => u32::try_from(b)
            .ok()
            .and_then(|e| a.checked_pow(e))
            .ok_or(MathError::Overflow),
        BitXor => Ok(a ^ b),
        BitOr => Ok(a | b),
        BitAnd => Ok(a & b),
        Shl => Ok(a << shift(b)?),
        Shr => Ok(a >> shift(b)?),
        _ => Err(MathError::Operands { op: op.symbol(), lhs: Type::Int, rhs: Type::Int }),
    }
}

/// Floating-point arithmetic. Division by zero and non-finite results are errors.
fn real(op: BinaryOp, a: f64, b: f64) -> Result<f64, MathError> {
    let value = match op {
        Add => a + b,
        Sub => a - b,
        Mul => a * b,
        Div | Mod if b == 0.0 => return Err(MathError::DivisionByZero),
        Div => a / b,
        Mod => a % b,
        Pow => a.powf(b),
        _ => return Err(MathError::Operands { op: op.symbol(), lhs: Type::Num, rhs: Type::Num }),
    };
    finite(value)
}

/// One component of an element-wise operation. `//` truncates but stays a num.
fn component(op: BinaryOp, a: f64, b: f64) -> Result<f64, MathError> {
    match op {
        IntDiv if b == 0.0 => Err(MathError::DivisionByZero),
        IntDiv => finite((a / b).trunc()),
        _ => real(op, a, b),
    }
}

fn int_div(a: f64, b: f64) -> Result<i64, MathError> {
    if b == 0.0 {
        return Err(MathError::DivisionByZero);
    }
    to_int((a / b).trunc())
}

fn finite(value: f64) -> Result<f64, MathError> {
    if value.is_finite() { Ok(value) } else { Err(MathError::NonFinite(value)) }
}

/// Truncating conversion to `i64`; non-finite or out-of-range values are errors.
pub fn to_int(value: f64) -> Result<i64, MathError> {
    // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound
    if value.is_finite() && value >= i64::MIN as f64 && value < i64::MAX as f64 {
        Ok(value.trunc() as i64)
    } else {
        Err(MathError::NonFinite(value))
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
