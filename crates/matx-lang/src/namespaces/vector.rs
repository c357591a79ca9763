//! `vec2`, `vec3`, `vec4`: length, dot product and normalization; `vec3`
//! also has the cross product.

use crate::error::MathError;
use crate::runtime::value::Value;
use crate::types::Type;
use super::{Export, LibraryInfo, LibraryProvider, components_arg, finite};

pub struct VectorNamespace {
    name: &'static str,
    ty: Type,
}

impl VectorNamespace {
    pub const VEC2: Self = Self { name: "vec2", ty: Type::Vec2 };
    pub const VEC3: Self = Self { name: "vec3", ty: Type::Vec3 };
    pub const VEC4: Self = Self { name: "vec4", ty: Type::Vec4 };
}

impl LibraryInfo for VectorNamespace {
    fn namespace(&self) -> &'static str { self.name }

    fn exports(&self) -> Vec<Export> {
        let v = self.ty;
        let mut exports = vec![
            Export::function("length", &[v], Type::Num),
            Export::function("dot", &[v, v], Type::Num),
            Export::function("normalize", &[v], v),
        ];
        if v == Type::Vec3 {
            exports.push(Export::function("cross", &[v, v], v));
        }
        exports
    }
}

impl LibraryProvider for VectorNamespace {
    fn field(&self, _member: &str) -> Option<Value> {
        None
    }

    fn call(&self, member: &str, args: &[Value]) -> Option<Result<Value, MathError>> {
        Some(match member {
            "length" => components_arg(args, 0).and_then(|a| finite(length(a))),
            "dot" => dot_args(args),
            "normalize" => normalize(self.ty, args),
            "cross" if self.ty == Type::Vec3 => cross(args),
            _ => return None,
        })
    }
}

fn length(c: &[f64]) -> f64 {
    c.iter().map(|x| x * x).sum::<f64>().sqrt()
}

fn dot_args(args: &[Value]) -> Result<Value, MathError> {
    let (a, b) = (components_arg(args, 0)?, components_arg(args, 1)?);
    finite(a.iter().zip(b).map(|(x, y)| x * y).sum())
}

/// The zero vector normalizes to itself.
fn normalize(ty: Type, args: &[Value]) -> Result<Value, MathError> {
    let c = components_arg(args, 0)?;
    let len = length(c);
    let scaled: Vec<f64> = if len == 0.0 { c.to_vec() } else { c.iter().map(|x| x / len).collect() };
    Value::from_components(ty, &scaled)
        .ok_or_else(|| MathError::Domain(format!("normalize expects a {ty}")))
}

fn cross(args: &[Value]) -> Result<Value, MathError> {
    let (Some(Value::Vec3(a)), Some(Value::Vec3(b))) = (args.first(), args.get(1)) else {
        return Err(MathError::Domain("cross expects two vec3 arguments".into()));
    };
    Ok(Value::Vec3([
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]))
}
