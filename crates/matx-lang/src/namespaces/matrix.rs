//! `mat3`, `mat4`: identity, transpose and determinant.

use crate::error::MathError;
use crate::runtime::value::Value;
use crate::types::Type;
use crate::types::linalg::{m3_det, m3_identity, m3_transpose, m4_det, m4_identity, m4_transpose};
use super::{Export, LibraryInfo, LibraryProvider, finite};

pub struct MatrixNamespace {
    name: &'static str,
    ty: Type,
}

impl MatrixNamespace {
    pub const MAT3: Self = Self { name: "mat3", ty: Type::Mat3 };
    pub const MAT4: Self = Self { name: "mat4", ty: Type::Mat4 };
}

impl LibraryInfo for MatrixNamespace {
    fn namespace(&self) -> &'static str { self.name }

    fn exports(&self) -> Vec<Export> {
        let m = self.ty;
        vec![
            Export::function("identity", &[], m),
            Export::function("transpose", &[m], m),
            Export::function("det", &[m], Type::Num),
        ]
    }
}

impl LibraryProvider for MatrixNamespace {
    fn field(&self, _member: &str) -> Option<Value> {
        None
    }

    fn call(&self, member: &str, args: &[Value]) -> Option<Result<Value, MathError>> {
        let result = match (member, self.ty, args) {
            ("identity", Type::Mat3, []) => Ok(Value::Mat3(Box::new(m3_identity()))),
            ("identity", Type::Mat4, []) => Ok(Value::Mat4(Box::new(m4_identity()))),
            ("transpose", _, [Value::Mat3(m)]) => Ok(Value::Mat3(Box::new(m3_transpose(m)))),
            ("transpose", _, [Value::Mat4(m)]) => Ok(Value::Mat4(Box::new(m4_transpose(m)))),
            ("det", _, [Value::Mat3(m)]) => finite(m3_det(m)),
            ("det", _, [Value::Mat4(m)]) => finite(m4_det(m)),
            ("identity" | "transpose" | "det", ty, _) => {
                Err(MathError::Domain(format!("`{}.{member}` called with wrong arguments", ty)))
            }
            _ => return None,
        };
        Some(result)
    }
}
