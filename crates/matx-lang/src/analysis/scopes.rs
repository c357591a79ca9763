use std::collections::HashMap;

use crate::syntax::ast::Span;
use crate::types::Type;

pub type ScopeId = usize;

pub const ROOT: ScopeId = 0;

// ─── Bindings ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Root,
    Function,
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Variable {
    pub ty: Type,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instantiation {
    /// Declared, body not analyzed yet.
    Pending,
    /// Body under analysis; a call seen now is recursive.
    Active,
    Done,
}

/// A declared function. Parameter types are fixed by the first call.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub name: String,
    pub params: Vec<String>,
    pub param_types: Vec<Type>,
    pub result: Option<Type>,
    pub body: Option<ScopeId>,
    pub state: Instantiation,
}

// ─── Scope ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    pub variables: HashMap<String, Variable>,
    /// Function name to the span of its declaring statement.
    pub functions: HashMap<String, Span>,
    pub result: Option<Type>,
    /// Span of the scope's `return`, set even when its type failed to check.
    pub return_span: Option<Span>,
}

impl Scope {
    fn new(kind: ScopeKind, parent: Option<ScopeId>) -> Self {
        Self {
            kind,
            parent,
            children: Vec::new(),
            variables: HashMap::new(),
            functions: HashMap::new(),
            result: None,
            return_span: None,
        }
    }

    pub fn declares(&self, name: &str) -> bool {
        self.variables.contains_key(name) || self.functions.contains_key(name)
    }
}

// ─── ScopeTree ────────────────────────────────────────────────────────────────

/// Arena of every scope the analyzer opened, plus the type of every
/// expression it checked.
#[derive(Debug, Clone)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    signatures: HashMap<Span, Signature>,
    types: HashMap<Span, Type>,
}

impl ScopeTree {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new(ScopeKind::Root, None)],
            signatures: HashMap::new(),
            types: HashMap::new(),
        }
    }

    pub fn push(&mut self, kind: ScopeKind, parent: ScopeId) -> ScopeId {
        let id = self.scopes.len();
        self.scopes.push(Scope::new(kind, Some(parent)));
        self.scopes[parent].children.push(id);
        id
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    pub fn get_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id]
    }

    pub fn root(&self) -> &Scope {
        &self.scopes[ROOT]
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// `from` and its ancestors, innermost first.
    pub fn chain(&self, from: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(from), |&id| self.scopes[id].parent)
    }

    pub fn lookup_var(&self, from: ScopeId, name: &str) -> Option<&Variable> {
        self.chain(from).find_map(|id| self.scopes[id].variables.get(name))
    }

    /// Declaring scope and statement span of the nearest function `name`.
    pub fn lookup_fn(&self, from: ScopeId, name: &str) -> Option<(ScopeId, Span)> {
        self.chain(from)
            .find_map(|id| self.scopes[id].functions.get(name).map(|span| (id, *span)))
    }

    /// Returns `false` if `name` is already bound in `scope`.
    pub fn declare_var(&mut self, scope: ScopeId, name: &str, var: Variable) -> bool {
        if self.scopes[scope].declares(name) {
            return false;
        }
        self.scopes[scope].variables.insert(name.to_string(), var);
        true
    }

    /// Returns `false` if `name` is already bound in `scope`.
    pub fn declare_fn(&mut self, scope: ScopeId, span: Span, signature: Signature) -> bool {
        if self.scopes[scope].declares(&signature.name) {
            return false;
        }
        self.scopes[scope].functions.insert(signature.name.clone(), span);
        self.signatures.insert(span, signature);
        true
    }

    /// Signature of the function declared by the statement at `span`.
    pub fn signature(&self, span: Span) -> Option<&Signature> {
        self.signatures.get(&span)
    }

    pub fn signature_mut(&mut self, span: Span) -> Option<&mut Signature> {
        self.signatures.get_mut(&span)
    }

    pub fn record_type(&mut self, span: Span, ty: Type) {
        self.types.insert(span, ty);
    }

    /// Inferred type of the expression at `span`.
    pub fn type_at(&self, span: Span) -> Option<Type> {
        self.types.get(&span).copied()
    }
}

impl Default for ScopeTree {
    fn default() -> Self { Self::new() }
}
