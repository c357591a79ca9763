//! `env`: read-only host state exposed to formulas (position, orientation
//! axes, mass and timing values). The embedder fills it in before evaluation.

use std::collections::HashMap;

use crate::error::MathError;
use crate::runtime::value::Value;
use crate::types::Type;
use crate::types::binop::to_int;
use super::{Export, LibraryInfo, LibraryProvider};

const FIELDS: &[(&str, Type)] = &[
    ("posX", Type::Num), ("posY", Type::Num), ("posZ", Type::Num),
    ("rotX", Type::Num), ("rotY", Type::Num), ("rotZ", Type::Num),

    ("rightX", Type::Num), ("rightY", Type::Num), ("rightZ", Type::Num),
    ("forwX", Type::Num), ("forwY", Type::Num), ("forwZ", Type::Num),
    ("upX", Type::Num), ("upY", Type::Num), ("upZ", Type::Num),

    ("Bcount", Type::Int), ("Rmass", Type::Num), ("Bmass", Type::Num),

    ("time", Type::Num), ("Ltime", Type::Num),

    ("Lval", Type::Num),
];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EnvError {
    #[error("unknown env field `{0}`")]
    UnknownField(String),
    #[error("env field `{field}` is an int, got {value}")]
    NotInteger { field: String, value: f64 },
}

/// Every field reads as zero until set.
#[derive(Debug, Clone, Default)]
pub struct EnvNamespace {
    values: HashMap<&'static str, f64>,
}

impl EnvNamespace {
    pub fn set(&mut self, field: &str, value: f64) -> Result<(), EnvError> {
        let Some(&(name, ty)) = FIELDS.iter().find(|(name, _)| *name == field) else {
            return Err(EnvError::UnknownField(field.to_string()));
        };
        if ty == Type::Int && (value.fract() != 0.0 || to_int(value).is_err()) {
            return Err(EnvError::NotInteger { field: field.to_string(), value });
        }
        self.values.insert(name, value);
        Ok(())
    }

    pub fn get(&self, field: &str) -> Option<f64> {
        FIELDS
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(name, _)| self.values.get(name).copied().unwrap_or(0.0))
    }
}

impl LibraryInfo for EnvNamespace {
    fn namespace(&self) -> &'static str { "env" }

    fn exports(&self) -> Vec<Export> {
        FIELDS.iter().map(|&(name, ty)| Export::field(name, ty)).collect()
    }
}

impl LibraryProvider for EnvNamespace {
    fn field(&self, member: &str) -> Option<Value> {
        let &(_, ty) = FIELDS.iter().find(|(name, _)| *name == member)?;
        let raw = self.get(member)?;
        Some(match ty {
            Type::Int => Value::Int(raw as i64),
            _ => Value::Num(raw),
        })
    }

    fn call(&self, _member: &str, _args: &[Value]) -> Option<Result<Value, MathError>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_default_to_zero() {
        let env = EnvNamespace::default();
        assert_eq!(env.field("upZ"), Some(Value::Num(0.0)));
        assert_eq!(env.field("Bcount"), Some(Value::Int(0)));
        assert_eq!(env.field("missing"), None);
    }

    #[test]
    fn set_checks_name_and_integrality() {
        let mut env = EnvNamespace::default();
        env.set("Bcount", 12.0).unwrap();
        assert_eq!(env.field("Bcount"), Some(Value::Int(12)));
        assert_eq!(
            env.set("Bcount", 1.5),
            Err(EnvError::NotInteger { field: "Bcount".into(), value: 1.5 })
        );
        assert_eq!(env.set("speed", 1.0), Err(EnvError::UnknownField("speed".into())));
    }

    #[test]
    fn exports_every_field() {
        let exports = EnvNamespace::default().exports();
        assert_eq!(exports.len(), 21);
        assert!(exports.iter().all(|e| e.params.is_empty()));
    }
}
