use std::fmt;

use crate::types::Type;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Num(f64),
    Bool(bool),
    Vec2([f64; 2]),
    Vec3([f64; 3]),
    Vec4([f64; 4]),
    Mat3(Box<[f64; 9]>),   // column-major 3×3
    Mat4(Box<[f64; 16]>),  // column-major 4×4
    Quat([f64; 4]),        // x, y, z, w
}

impl Value {
    pub fn ty(&self) -> Type {
        match self {
            Value::Int(_)  => Type::Int,
            Value::Num(_)  => Type::Num,
            Value::Bool(_) => Type::Bool,
            Value::Vec2(_) => Type::Vec2,
            Value::Vec3(_) => Type::Vec3,
            Value::Vec4(_) => Type::Vec4,
            Value::Mat3(_) => Type::Mat3,
            Value::Mat4(_) => Type::Mat4,
            Value::Quat(_) => Type::Quat,
        }
    }

    /// Scalar view of an int or num.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Num(n) => Some(*n),
            _ => None,
        }
    }

    /// Component storage of an indexable value.
    pub fn components(&self) -> Option<&[f64]> {
        match self {
            Value::Vec2(c) => Some(c),
            Value::Vec3(c) => Some(c),
            Value::Vec4(c) | Value::Quat(c) => Some(c),
            Value::Mat3(c) => Some(c.as_slice()),
            Value::Mat4(c) => Some(c.as_slice()),
            Value::Int(_) | Value::Num(_) | Value::Bool(_) => None,
        }
    }

    pub fn components_mut(&mut self) -> Option<&mut [f64]> {
        match self {
            Value::Vec2(c) => Some(c),
            Value::Vec3(c) => Some(c),
            Value::Vec4(c) | Value::Quat(c) => Some(c),
            Value::Mat3(c) => Some(c.as_mut_slice()),
            Value::Mat4(c) => Some(c.as_mut_slice()),
            Value::Int(_) | Value::Num(_) | Value::Bool(_) => None,
        }
    }

    /// Builds an indexable value of type `ty` from exactly its component count.
    pub fn from_components(ty: Type, c: &[f64]) -> Option<Value> {
        Some(match ty {
            Type::Vec2 => Value::Vec2(c.try_into().ok()?),
            Type::Vec3 => Value::Vec3(c.try_into().ok()?),
            Type::Vec4 => Value::Vec4(c.try_into().ok()?),
            Type::Quat => Value::Quat(c.try_into().ok()?),
            Type::Mat3 => Value::Mat3(Box::new(c.try_into().ok()?)),
            Type::Mat4 => Value::Mat4(Box::new(c.try_into().ok()?)),
            Type::Int | Type::Num | Type::Bool => return None,
        })
    }

    /// Same-typed value with `f` applied to every component.
    pub fn map_components<E>(&self, mut f: impl FnMut(f64) -> Result<f64, E>) -> Option<Result<Value, E>> {
        let src = self.components()?;
        let mut out = Vec::with_capacity(src.len());
        for &c in src {
            match f(c) {
                Ok(v) => out.push(v),
                Err(e) => return Some(Err(e)),
            }
        }
        Value::from_components(self.ty(), &out).map(Ok)
    }

    /// Same-typed value combining `self` and `other` component-wise. Both
    /// must have the same component count.
    pub fn zip_components<E>(&self, other: &Value, mut f: impl FnMut(f64, f64) -> Result<f64, E>) -> Option<Result<Value, E>> {
        let (a, b) = (self.components()?, other.components()?);
        if a.len() != b.len() {
            return None;
        }
        let mut out = Vec::with_capacity(a.len());
        for (&x, &y) in a.iter().zip(b) {
            match f(x, y) {
                Ok(v) => out.push(v),
                Err(e) => return Some(Err(e)),
            }
        }
        Value::from_components(self.ty(), &out).map(Ok)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = |f: &mut fmt::Formatter<'_>, name: &str, c: &[f64]| {
            let parts: Vec<String> = c.iter().map(|x| x.to_string()).collect();
            write!(f, "{name}({})", parts.join(", "))
        };
        match self {
            Value::Int(i)  => write!(f, "{i}"),
            Value::Num(n)  => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            // constructor argument order: w first
            Value::Quat([x, y, z, w]) => list(f, "quat", &[*w, *x, *y, *z]),
            other => match other.components() {
                Some(c) => list(f, other.ty().name(), c),
                None => Ok(()),
            },
        }
    }
}
