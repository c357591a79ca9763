//! `quat`: conjugate, inverse and length.

use crate::error::MathError;
use crate::runtime::value::Value;
use crate::types::Type;
use crate::types::linalg::{q_conj, q_inverse, q_length};
use super::{Export, LibraryInfo, LibraryProvider, finite};

pub struct QuatNamespace;

impl LibraryInfo for QuatNamespace {
    fn namespace(&self) -> &'static str { "quat" }

    fn exports(&self) -> Vec<Export> {
        let q = Type::Quat;
        vec![
            Export::function("conj", &[q], q),
            Export::function("inverse", &[q], q),
            Export::function("length", &[q], Type::Num),
        ]
    }
}

impl LibraryProvider for QuatNamespace {
    fn field(&self, _member: &str) -> Option<Value> {
        None
    }

    fn call(&self, member: &str, args: &[Value]) -> Option<Result<Value, MathError>> {
        let q = match args {
            [Value::Quat(q)] => q,
            _ if matches!(member, "conj" | "inverse" | "length") => {
                return Some(Err(MathError::Domain(format!("`quat.{member}` expects one quat"))));
            }
            _ => return None,
        };
        Some(match member {
            "conj" => Ok(Value::Quat(q_conj(q))),
            "inverse" => Ok(Value::Quat(q_inverse(q))),
            "length" => finite(q_length(q)),
            _ => return None,
        })
    }
}
