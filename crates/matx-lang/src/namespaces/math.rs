//! `math`: scalar helpers.

use crate::error::MathError;
use crate::runtime::value::Value;
use crate::types::Type;
use super::{Export, LibraryInfo, LibraryProvider, finite, num_arg};

pub struct MathNamespace;

const N: Type = Type::Num;

impl LibraryInfo for MathNamespace {
    fn namespace(&self) -> &'static str { "math" }

    fn exports(&self) -> Vec<Export> {
        vec![
            Export::function("sqrt",  &[N], N),
            Export::function("abs",   &[N], N),
            Export::function("sin",   &[N], N),
            Export::function("cos",   &[N], N),
            Export::function("tan",   &[N], N),
            Export::function("floor", &[N], N),
            Export::function("ceil",  &[N], N),
            Export::function("min",   &[N, N], N),
            Export::function("max",   &[N, N], N),
            Export::function("clamp", &[N, N, N], N),
            Export::function("lerp",  &[N, N, N], N),
            Export::field("pi", N),
        ]
    }
}

impl LibraryProvider for MathNamespace {
    fn field(&self, member: &str) -> Option<Value> {
        match member {
            "pi" => Some(Value::Num(std::f64::consts::PI)),
            _ => None,
        }
    }

    fn call(&self, member: &str, args: &[Value]) -> Option<Result<Value, MathError>> {
        let unary = |f: fn(f64) -> f64| num_arg(args, 0).and_then(|x| finite(f(x)));
        Some(match member {
            "sqrt"  => unary(f64::sqrt),
            "abs"   => unary(f64::abs),
            "sin"   => unary(f64::sin),
            "cos"   => unary(f64::cos),
            "tan"   => unary(f64::tan),
            "floor" => unary(f64::floor),
            "ceil"  => unary(f64::ceil),
            "min"   => binary(args, f64::min),
            "max"   => binary(args, f64::max),
            "clamp" => clamp(args),
            "lerp"  => lerp(args),
            _ => return None,
        })
    }
}

fn binary(args: &[Value], f: fn(f64, f64) -> f64) -> Result<Value, MathError> {
    finite(f(num_arg(args, 0)?, num_arg(args, 1)?))
}

fn clamp(args: &[Value]) -> Result<Value, MathError> {
    let (x, lo, hi) = (num_arg(args, 0)?, num_arg(args, 1)?, num_arg(args, 2)?);
    if lo > hi {
        return Err(MathError::Domain(format!("clamp bounds reversed: {lo} > {hi}")));
    }
    finite(x.clamp(lo, hi))
}

fn lerp(args: &[Value]) -> Result<Value, MathError> {
    let (a, b, t) = (num_arg(args, 0)?, num_arg(args, 1)?, num_arg(args, 2)?);
    finite(a + (b - a) * t)
}
