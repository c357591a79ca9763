//! Walks the statement tree scope by scope, binding names and inferring the
//! type of every expression against the operator and constructor tables.
//!
//! Function bodies are checked at their first call, with each parameter
//! bound to that call's argument type. Later calls must agree with it.

use std::collections::HashMap;

use tracing::trace;

use crate::error::{Diagnostic, ErrorCode};
use crate::namespaces::{ExportKind, LibraryRegistry};
use crate::syntax::ast::*;
use crate::types::Type;
use crate::types::binop::BinopRegistry;
use crate::types::{constructors, unop};
use super::scopes::{Instantiation, ROOT, ScopeId, ScopeKind, ScopeTree, Signature, Variable};

pub struct Checker<'a> {
    tree: ScopeTree,
    libraries: &'a LibraryRegistry,
    binops: BinopRegistry,
    diagnostics: Vec<Diagnostic>,
    /// Declaring statement span to the declaration, for late body checks.
    bodies: HashMap<Span, &'a FunDecl>,
}

impl<'a> Checker<'a> {
    pub fn new(libraries: &'a LibraryRegistry) -> Self {
        Self {
            tree: ScopeTree::new(),
            libraries,
            binops: BinopRegistry::default(),
            diagnostics: Vec::new(),
            bodies: HashMap::new(),
        }
    }

    pub fn run(mut self, statements: &'a [Statement]) -> (ScopeTree, Vec<Diagnostic>) {
        self.check_scope(ROOT, statements);

        let root = self.tree.root();
        match (root.return_span, root.result) {
            (None, _) => {
                let span = statements.last().map(|s| s.span).unwrap_or(Span::point(1, 1));
                self.error(ErrorCode::S009, span, "root scope must have a return");
            }
            (Some(span), Some(ty)) if !ty.is_numeric() => {
                self.error(ErrorCode::S011, span, format!("root scope must return int or num, found {ty}"));
            }
            _ => {}
        }

        (self.tree, self.diagnostics)
    }

    fn error(&mut self, code: ErrorCode, span: Span, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::new(code, span, message));
    }

    // ─── Scopes ──────────────────────────────────────────────────────────────

    fn check_scope(&mut self, scope: ScopeId, statements: &'a [Statement]) {
        let mut returned = false;
        let mut warned = false;
        for stmt in statements {
            let is_return = matches!(stmt.kind, StmtKind::Return(_));
            if matches!(stmt.kind, StmtKind::Comment(_)) {
                continue;
            }
            if returned && !is_return && !warned {
                self.error(ErrorCode::W002, stmt.span, "statement after `return` is never executed");
                warned = true;
            }
            self.check_stmt(scope, stmt);
            returned |= is_return;
        }
        self.finish_functions(scope);
    }

    /// Zero-parameter functions nobody called are checked now; the rest
    /// have no argument types to check against.
    fn finish_functions(&mut self, scope: ScopeId) {
        let mut pending: Vec<Span> = self.tree.get(scope).functions.values().copied()
            .filter(|span| self.tree.signature(*span).is_some_and(|s| s.state == Instantiation::Pending))
            .collect();
        pending.sort_by_key(|s| (s.line, s.column));

        for span in pending {
            let Some(sig) = self.tree.signature(span) else { continue };
            if sig.params.is_empty() {
                self.instantiate(scope, span, Vec::new());
            } else {
                let msg = format!("function `{}` is never called, so its body is not checked", sig.name);
                self.error(ErrorCode::W001, span, msg);
            }
        }
    }

    // ─── Statements ──────────────────────────────────────────────────────────

    fn check_stmt(&mut self, scope: ScopeId, stmt: &'a Statement) {
        match &stmt.kind {
            StmtKind::Comment(_) => {}
            StmtKind::VarDecl { ty, name, init } => {
                self.check_var_decl(scope, stmt.span, *ty, name, init.as_ref());
            }
            StmtKind::FunDecl(decl) => self.declare_function(scope, stmt.span, decl),
            StmtKind::Return(expr) => self.check_return(scope, stmt.span, expr),
            StmtKind::Block(body) => {
                let child = self.tree.push(ScopeKind::Block, scope);
                self.check_scope(child, body);
            }
            StmtKind::Assign { name, index, op, value } => {
                self.check_assign(scope, stmt.span, name, index.as_ref(), *op, value);
            }
        }
    }

    fn check_var_decl(&mut self, scope: ScopeId, span: Span, ty: Type, name: &str, init: Option<&Expr>) {
        let init_ty = init.and_then(|e| self.infer(scope, e));

        if self.tree.get(scope).declares(name) {
            self.error(ErrorCode::S003, span, format!("`{name}` is already declared in this scope"));
            return;
        }
        if self.library_export(name, ExportKind::Field) {
            self.error(ErrorCode::S012, span, format!("`{name}` shadows a library field"));
        }
        if let Some(found) = init_ty
            && !found.assignable_to(ty)
        {
            self.error(ErrorCode::S002, span, format!("cannot initialize `{name}` of type {ty} with {found}"));
        }
        self.tree.declare_var(scope, name, Variable { ty, span });
    }

    fn declare_function(&mut self, scope: ScopeId, span: Span, decl: &'a FunDecl) {
        let name = &decl.name;
        if self.tree.get(scope).declares(name) {
            self.error(ErrorCode::S003, span, format!("`{name}` is already declared in this scope"));
            return;
        }
        if self.library_export(name, ExportKind::Function) {
            self.error(ErrorCode::S012, span, format!("`{name}` shadows a library function"));
        }
        for (i, param) in decl.params.iter().enumerate() {
            if decl.params[..i].iter().any(|p| p.name == param.name) {
                self.error(ErrorCode::S014, param.span, format!("duplicate parameter `{}`", param.name));
            }
        }

        let signature = Signature {
            name: name.clone(),
            params: decl.params.iter().map(|p| p.name.clone()).collect(),
            param_types: Vec::new(),
            result: None,
            body: None,
            state: Instantiation::Pending,
        };
        self.tree.declare_fn(scope, span, signature);
        self.bodies.insert(span, decl);
    }

    fn check_return(&mut self, scope: ScopeId, span: Span, expr: &Expr) {
        let ty = self.infer(scope, expr);
        let current = self.tree.get(scope);
        if current.kind == ScopeKind::Block {
            self.error(ErrorCode::S010, span, "a block cannot have a return");
            return;
        }
        if current.return_span.is_some() {
            self.error(ErrorCode::S008, span, "scope already has a return");
            return;
        }
        let current = self.tree.get_mut(scope);
        current.return_span = Some(span);
        current.result = ty;
    }

    fn check_assign(
        &mut self,
        scope: ScopeId,
        span: Span,
        name: &str,
        index: Option<&Expr>,
        op: Option<BinaryOp>,
        value: &Expr,
    ) {
        let value_ty = self.infer(scope, value);

        let target = match self.tree.lookup_var(scope, name) {
            Some(var) => var.ty,
            None => {
                self.unassignable(name, span);
                return;
            }
        };
        let (slot, shown) = match index {
            None => (target, name.to_string()),
            Some(index) => match self.index_type(scope, target, index, span) {
                Some(element) => (element, format!("{name}[..]")),
                None => return,
            },
        };
        let Some(value_ty) = value_ty else { return };

        let stored = match op {
            None => value_ty,
            Some(op) => match self.binops.result_type(op, slot, value_ty) {
                Some(ty) => ty,
                None => {
                    let msg = format!("operator `{}` is not defined for {slot} and {value_ty}", op.symbol());
                    self.error(ErrorCode::S005, span, msg);
                    return;
                }
            },
        };
        if !stored.assignable_to(slot) {
            self.error(ErrorCode::S002, span, format!("cannot assign {stored} to `{shown}` of type {slot}"));
        }
    }

    fn unassignable(&mut self, name: &str, span: Span) {
        if self.library_export(name, ExportKind::Field) {
            self.error(ErrorCode::S016, span, format!("library field `{name}` is read-only"));
        } else {
            self.error(ErrorCode::S001, span, format!("undefined variable `{name}`"));
        }
    }

    fn library_export(&self, name: &str, kind: ExportKind) -> bool {
        self.libraries.lookup(name).is_some_and(|e| e.kind == kind)
    }

    // ─── Functions ───────────────────────────────────────────────────────────

    fn check_call(&mut self, scope: ScopeId, name: &str, args: &[Expr], span: Span) -> Option<Type> {
        let arg_types = self.infer_all(scope, args);

        if let Some((declared_in, fn_span)) = self.tree.lookup_fn(scope, name) {
            let arg_types = arg_types?;
            let sig = self.tree.signature(fn_span)?;
            return match sig.state {
                Instantiation::Active => {
                    self.error(ErrorCode::S015, span, format!("recursive call to `{name}`"));
                    None
                }
                Instantiation::Done => {
                    let (params, result) = (sig.param_types.clone(), sig.result);
                    self.check_arguments(name, &params, &arg_types, span)?;
                    result
                }
                Instantiation::Pending => {
                    if sig.params.len() != arg_types.len() {
                        let msg = arity_message(name, sig.params.len(), arg_types.len());
                        self.error(ErrorCode::S004, span, msg);
                        return None;
                    }
                    self.instantiate(declared_in, fn_span, arg_types)
                }
            };
        }

        match self.libraries.lookup(name) {
            Some(export) if export.kind == ExportKind::Function => {
                let arg_types = arg_types?;
                self.check_arguments(name, &export.params, &arg_types, span)?;
                Some(export.ty)
            }
            _ => {
                self.error(ErrorCode::S001, span, format!("undefined function `{name}`"));
                None
            }
        }
    }

    fn check_arguments(&mut self, name: &str, params: &[Type], args: &[Type], span: Span) -> Option<()> {
        if params.len() != args.len() {
            self.error(ErrorCode::S004, span, arity_message(name, params.len(), args.len()));
            return None;
        }
        let mut ok = true;
        for (i, (want, got)) in params.iter().zip(args).enumerate() {
            if !got.assignable_to(*want) {
                let msg = format!("argument {} of `{name}` expects {want}, found {got}", i + 1);
                self.error(ErrorCode::S002, span, msg);
                ok = false;
            }
        }
        ok.then_some(())
    }

    /// Checks a function body with its parameters bound to `param_types`,
    /// in a fresh scope under the declaring one.
    fn instantiate(&mut self, declared_in: ScopeId, fn_span: Span, param_types: Vec<Type>) -> Option<Type> {
        let decl = self.bodies.get(&fn_span).copied()?;
        trace!(function = %decl.name, params = ?param_types, "checking function body");

        let body = self.tree.push(ScopeKind::Function, declared_in);
        for (param, ty) in decl.params.iter().zip(&param_types) {
            self.tree.declare_var(body, &param.name, Variable { ty: *ty, span: param.span });
        }
        let sig = self.tree.signature_mut(fn_span)?;
        sig.state = Instantiation::Active;
        sig.param_types = param_types;
        sig.body = Some(body);

        self.check_scope(body, &decl.body);

        let scope = self.tree.get(body);
        let (result, returned) = (scope.result, scope.return_span.is_some());
        if !returned {
            self.error(ErrorCode::S009, fn_span, format!("function `{}` must have a return", decl.name));
        }
        let sig = self.tree.signature_mut(fn_span)?;
        sig.state = Instantiation::Done;
        sig.result = result;
        result
    }

    // ─── Expressions ─────────────────────────────────────────────────────────

    /// Type of `expr`, or `None` after reporting why it has none.
    fn infer(&mut self, scope: ScopeId, expr: &Expr) -> Option<Type> {
        let ty = self.infer_kind(scope, expr)?;
        self.tree.record_type(expr.span, ty);
        Some(ty)
    }

    /// Infers every expression, even after one fails.
    fn infer_all(&mut self, scope: ScopeId, exprs: &[Expr]) -> Option<Vec<Type>> {
        let types: Vec<Option<Type>> = exprs.iter().map(|e| self.infer(scope, e)).collect();
        types.into_iter().collect()
    }

    fn infer_kind(&mut self, scope: ScopeId, expr: &Expr) -> Option<Type> {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Number { is_integer, .. } => Some(if *is_integer { Type::Int } else { Type::Num }),
            ExprKind::Bool(_) => Some(Type::Bool),
            ExprKind::Variable(name) => self.variable_type(scope, name, span),

            ExprKind::Binary { left, right, op } => {
                let l = self.infer(scope, left);
                let r = self.infer(scope, right);
                let (l, r) = (l?, r?);
                let ty = self.binops.result_type(*op, l, r);
                if ty.is_none() {
                    let msg = format!("operator `{}` is not defined for {l} and {r}", op.symbol());
                    self.error(ErrorCode::S005, span, msg);
                }
                ty
            }

            ExprKind::Unary { operand, op, .. } => {
                if op.is_step() {
                    let ExprKind::Variable(name) = &operand.kind else {
                        self.infer(scope, operand);
                        self.error(ErrorCode::S013, span, format!("`{}` needs a variable operand", op.symbol()));
                        return None;
                    };
                    if self.tree.lookup_var(scope, name).is_none() {
                        self.unassignable(name, operand.span);
                        return None;
                    }
                }
                let ty = self.infer(scope, operand)?;
                let result = unop::result_type(*op, ty);
                if result.is_none() {
                    self.error(ErrorCode::S005, span, format!("unary `{}` is not defined for {ty}", op.symbol()));
                }
                result
            }

            ExprKind::Constructor { ty, args } => {
                let arg_types = self.infer_all(scope, args)?;
                if constructors::find_signature(*ty, &arg_types).is_some() {
                    return Some(*ty);
                }
                let listed: Vec<&str> = arg_types.iter().map(|t| t.name()).collect();
                self.error(ErrorCode::S006, span, format!("no `{ty}` constructor takes ({})", listed.join(", ")));
                None
            }

            ExprKind::Call { name, args } => self.check_call(scope, name, args, span),

            ExprKind::Index { target, index } => {
                let target_ty = self.infer(scope, target)?;
                self.index_type(scope, target_ty, index, span)
            }
        }
    }

    fn variable_type(&mut self, scope: ScopeId, name: &str, span: Span) -> Option<Type> {
        if let Some(var) = self.tree.lookup_var(scope, name) {
            return Some(var.ty);
        }
        match self.libraries.lookup(name) {
            Some(export) if export.kind == ExportKind::Field => Some(export.ty),
            Some(_) => {
                self.error(ErrorCode::S002, span, format!("`{name}` is a function, not a value"));
                None
            }
            None if self.tree.lookup_fn(scope, name).is_some() => {
                self.error(ErrorCode::S002, span, format!("`{name}` is a function, not a value"));
                None
            }
            None => {
                self.error(ErrorCode::S001, span, format!("undefined variable `{name}`"));
                None
            }
        }
    }

    /// Element type of `target[index]`. Literal indices are range-checked here.
    fn index_type(&mut self, scope: ScopeId, target: Type, index: &Expr, span: Span) -> Option<Type> {
        let index_ty = self.infer(scope, index)?;
        let Some(count) = target.component_count() else {
            self.error(ErrorCode::S007, span, format!("{target} cannot be indexed"));
            return None;
        };
        if index_ty != Type::Int {
            self.error(ErrorCode::S002, index.span, format!("index must be int, found {index_ty}"));
            return None;
        }
        if let Some(k) = literal_index(index)
            && (k < 1 || k > count as i64)
        {
            self.error(ErrorCode::S007, index.span, format!("index {k} out of range 1..={count} for {target}"));
            return None;
        }
        target.element()
    }
}

fn arity_message(name: &str, expected: usize, found: usize) -> String {
    let plural = if expected == 1 { "" } else { "s" };
    format!("`{name}` takes {expected} argument{plural}, found {found}")
}

/// Value of an integer literal index, possibly negated.
fn literal_index(expr: &Expr) -> Option<i64> {
    match &expr.kind {
        ExprKind::Number { value, is_integer: true } => Some(*value as i64),
        ExprKind::Unary { operand, op: UnaryOp::Neg, prefix: true } => literal_index(operand).map(|k| -k),
        _ => None,
    }
}
