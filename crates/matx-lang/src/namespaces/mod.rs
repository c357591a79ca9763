//! Library namespaces: externally supplied fields and functions reachable
//! through dotted names such as `env.posX` or `vec3.length(v)`.
//!
//! Only the root scope sees them, after local lookup fails.

use serde::Serialize;

use crate::error::MathError;
use crate::runtime::value::Value;
use crate::types::Type;

pub mod env;
pub mod math;
pub mod matrix;
pub mod quat;
pub mod vector;

pub use env::{EnvError, EnvNamespace};

// ─── Export ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Field,
    Function,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Export {
    /// Member name without the namespace prefix.
    pub name: &'static str,
    pub kind: ExportKind,
    /// Field type, or the function's return type.
    pub ty: Type,
    pub params: Vec<Type>,
}

impl Export {
    pub fn field(name: &'static str, ty: Type) -> Self {
        Self { name, kind: ExportKind::Field, ty, params: Vec::new() }
    }

    pub fn function(name: &'static str, params: &[Type], ret: Type) -> Self {
        Self { name, kind: ExportKind::Function, ty: ret, params: params.to_vec() }
    }
}

// ─── Compile-time interface ──────────────────────────────────────────────────

/// What the analyzer needs: typed exports only.
pub trait LibraryInfo: Send + Sync {
    fn namespace(&self) -> &'static str;
    fn exports(&self) -> Vec<Export>;

    fn get_export(&self, member: &str) -> Option<Export> {
        self.exports().into_iter().find(|e| e.name == member)
    }
}

// ─── Runtime interface ───────────────────────────────────────────────────────

/// What the evaluator needs: field values and call dispatch. Arguments have
/// already been checked against the export's parameter types.
pub trait LibraryProvider: LibraryInfo {
    fn field(&self, member: &str) -> Option<Value>;

    /// `None` when the namespace has no such function.
    fn call(&self, member: &str, args: &[Value]) -> Option<Result<Value, MathError>>;
}

// ─── Registry ────────────────────────────────────────────────────────────────

pub struct LibraryRegistry {
    providers: Vec<Box<dyn LibraryProvider>>,
}

impl LibraryRegistry {
    /// No namespaces at all.
    pub fn empty() -> Self {
        Self { providers: Vec::new() }
    }

    /// Adds a namespace, replacing any registered under the same name.
    pub fn register(&mut self, provider: Box<dyn LibraryProvider>) {
        match self.providers.iter_mut().find(|p| p.namespace() == provider.namespace()) {
            Some(slot) => *slot = provider,
            None => self.providers.push(provider),
        }
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &dyn LibraryProvider> {
        self.providers.iter().map(|p| p.as_ref())
    }

    fn provider<'a>(&'a self, dotted: &'a str) -> Option<(&'a dyn LibraryProvider, &'a str)> {
        let (ns, member) = dotted.split_once('.')?;
        self.providers
            .iter()
            .find(|p| p.namespace() == ns)
            .map(|p| (p.as_ref(), member))
    }

    /// Export behind a dotted name.
    pub fn lookup(&self, dotted: &str) -> Option<Export> {
        let (provider, member) = self.provider(dotted)?;
        provider.get_export(member)
    }

    pub fn field(&self, dotted: &str) -> Option<Value> {
        let (provider, member) = self.provider(dotted)?;
        provider.field(member)
    }

    pub fn call(&self, dotted: &str, args: &[Value]) -> Option<Result<Value, MathError>> {
        let (provider, member) = self.provider(dotted)?;
        provider.call(member, args)
    }

    pub fn standard() -> Self {
        let mut r = Self::empty();
        r.register(Box::new(EnvNamespace::default()));
        r.register(Box::new(math::MathNamespace));
        r.register(Box::new(vector::VectorNamespace::VEC2));
        r.register(Box::new(vector::VectorNamespace::VEC3));
        r.register(Box::new(vector::VectorNamespace::VEC4));
        r.register(Box::new(matrix::MatrixNamespace::MAT3));
        r.register(Box::new(matrix::MatrixNamespace::MAT4));
        r.register(Box::new(quat::QuatNamespace));
        r
    }
}

impl Default for LibraryRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

// ─── Shared helpers ──────────────────────────────────────────────────────────

pub(crate) fn num_arg(args: &[Value], i: usize) -> Result<f64, MathError> {
    args.get(i)
        .and_then(Value::as_f64)
        .ok_or_else(|| MathError::Domain(format!("argument {} must be a number", i + 1)))
}

pub(crate) fn components_arg(args: &[Value], i: usize) -> Result<&[f64], MathError> {
    args.get(i)
        .and_then(Value::components)
        .ok_or_else(|| MathError::Domain(format!("argument {} must be a vector, matrix or quat", i + 1)))
}

pub(crate) fn finite(value: f64) -> Result<Value, MathError> {
    if value.is_finite() { Ok(Value::Num(value)) } else { Err(MathError::NonFinite(value)) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_lookup() {
        let r = LibraryRegistry::standard();
        let e = r.lookup("vec3.length").unwrap();
        assert_eq!(e.kind, ExportKind::Function);
        assert_eq!(e.ty, Type::Num);
        assert_eq!(e.params, vec![Type::Vec3]);
        assert_eq!(r.lookup("env.Bcount").map(|e| e.ty), Some(Type::Int));
        assert!(r.lookup("env.nope").is_none());
        assert!(r.lookup("nodots").is_none());
        assert!(r.lookup("nope.length").is_none());
    }

    #[test]
    fn dispatch() {
        let r = LibraryRegistry::standard();
        let v = Value::Vec3([3., 4., 0.]);
        assert_eq!(r.call("vec3.length", &[v]), Some(Ok(Value::Num(5.0))));
        assert_eq!(r.field("env.posX"), Some(Value::Num(0.0)));
        assert!(r.call("vec3.nope", &[]).is_none());
    }

    #[test]
    fn register_replaces_same_namespace() {
        let mut r = LibraryRegistry::standard();
        let mut env = EnvNamespace::default();
        env.set("time", 2.5).unwrap();
        r.register(Box::new(env));
        assert_eq!(r.field("env.time"), Some(Value::Num(2.5)));
        assert_eq!(r.namespaces().filter(|p| p.namespace() == "env").count(), 1);
    }
}
