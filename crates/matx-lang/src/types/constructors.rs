//! Constructor signatures: a type name used as a callee, e.g. `vec3(v2, 1)`.

use crate::error::MathError;
use crate::runtime::value::Value;
use crate::types::Type;
use crate::types::binop::to_int;

const I: Type = Type::Int;
const N: Type = Type::Num;
const B: Type = Type::Bool;

/// Accepted argument lists for each type, in match priority order.
pub fn signatures(ty: Type) -> &'static [&'static [Type]] {
    match ty {
        Type::Int | Type::Num | Type::Bool => &[&[I], &[N], &[B]],
        Type::Vec2 => &[&[N, N], &[Type::Vec2]],
        Type::Vec3 => &[&[N, N, N], &[Type::Vec2, N], &[Type::Vec3]],
        Type::Vec4 => &[&[N, N, N, N], &[Type::Vec2, N, N], &[Type::Vec3, N], &[Type::Vec4]],
        Type::Mat3 => &[&[N; 9], &[Type::Mat3]],
        Type::Mat4 => &[&[N; 16], &[Type::Mat4]],
        // w first, then the vector part
        Type::Quat => &[&[N, N, N, N], &[N, Type::Vec3], &[Type::Quat]],
    }
}

/// First signature accepting `args`; int and num substitute for each other.
pub fn find_signature(ty: Type, args: &[Type]) -> Option<&'static [Type]> {
    signatures(ty).iter().copied().find(|sig| {
        sig.len() == args.len() && sig.iter().zip(args).all(|(want, got)| got.compatible(*want))
    })
}

/// Builds a value of `ty` from already-checked arguments.
pub fn construct(ty: Type, args: &[Value]) -> Result<Value, MathError> {
    let arg_types: Vec<Type> = args.iter().map(Value::ty).collect();
    if find_signature(ty, &arg_types).is_none() {
        let listed: Vec<&str> = arg_types.iter().map(|t| t.name()).collect();
        return Err(MathError::Domain(format!("no `{ty}` constructor takes ({})", listed.join(", "))));
    }

    match (ty, args) {
        (Type::Int | Type::Num | Type::Bool, [arg]) => convert(ty, arg),
        (Type::Quat, [Value::Quat(q)]) => Ok(Value::Quat(*q)),
        _ => {
            let mut flat = Vec::with_capacity(16);
            for arg in args {
                match (arg.as_f64(), arg.components()) {
                    (Some(x), _) => flat.push(x),
                    (None, Some(c)) => flat.extend_from_slice(c),
                    (None, None) => {}
                }
            }
            if ty == Type::Quat {
                // written w, x, y, z; stored x, y, z, w
                flat.rotate_left(1);
            }
            Value::from_components(ty, &flat)
                .ok_or_else(|| MathError::Domain(format!("wrong component count for `{ty}`")))
        }
    }
}

/// Scalar conversions between int, num and bool.
fn convert(ty: Type, arg: &Value) -> Result<Value, MathError> {
    Ok(match (ty, arg) {
        (Type::Int, Value::Int(i)) => Value::Int(*i),
        (Type::Int, Value::Num(n)) => Value::Int(to_int(*n)?),
        (Type::Int, Value::Bool(b)) => Value::Int(i64::from(*b)),
        (Type::Num, Value::Int(i)) => Value::Num(*i as f64),
        (Type::Num, Value::Num(n)) => Value::Num(*n),
        (Type::Num, Value::Bool(b)) => Value::Num(if *b { 1.0 } else { 0.0 }),
        (Type::Bool, Value::Bool(b)) => Value::Bool(*b),
        (Type::Bool, Value::Int(i)) => Value::Bool(*i != 0),
        (Type::Bool, Value::Num(n)) => Value::Bool(*n != 0.0),
        _ => return Err(MathError::Domain(format!("cannot convert {} to {ty}", arg.ty()))),
    })
}
