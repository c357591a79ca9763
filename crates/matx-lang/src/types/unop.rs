//! Unary operator table.

use crate::error::MathError;
use crate::runtime::value::Value;
use crate::syntax::ast::UnaryOp;
use crate::types::Type;

/// Unary operators each type accepts. `++`/`--` also require a variable operand,
/// which the analyzer checks separately.
pub fn allowed(ty: Type) -> &'static [UnaryOp] {
    use UnaryOp::*;
    match ty {
        Type::Int => &[Plus, Neg, BitNot, Inc, Dec],
        Type::Num => &[Plus, Neg, Inc, Dec],
        Type::Bool => &[Not],
        Type::Vec2 | Type::Vec3 | Type::Vec4 | Type::Mat3 | Type::Mat4 | Type::Quat => &[Plus, Neg],
    }
}

/// Unary operators never change the operand type.
pub fn result_type(op: UnaryOp, ty: Type) -> Option<Type> {
    allowed(ty).contains(&op).then_some(ty)
}

pub fn eval(op: UnaryOp, v: Value) -> Result<Value, MathError> {
    use UnaryOp::*;
    let undefined = |v: &Value| MathError::Domain(format!("unary `{}` is not defined for {}", op.symbol(), v.ty()));
    match (op, v) {
        (Plus, v) if result_type(op, v.ty()).is_some() => Ok(v),
        (Neg, Value::Int(i)) => i.checked_neg().map(Value::Int).ok_or(MathError::Overflow),
        (Neg, Value::Num(n)) => Ok(Value::Num(-n)),
        (BitNot, Value::Int(i)) => Ok(Value::Int(!i)),
        (Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (Inc, Value::Int(i)) => i.checked_add(1).map(Value::Int).ok_or(MathError::Overflow),
        (Dec, Value::Int(i)) => i.checked_sub(1).map(Value::Int).ok_or(MathError::Overflow),
        (Inc, Value::Num(n)) => Ok(Value::Num(n + 1.0)),
        (Dec, Value::Num(n)) => Ok(Value::Num(n - 1.0)),
        (Neg, v) => match v.map_components(|c| Ok(-c)) {
            Some(result) => result,
            None => Err(undefined(&v)),
        },
        (_, v) => Err(undefined(&v)),
    }
}
