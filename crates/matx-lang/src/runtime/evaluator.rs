//! Tree-walking evaluator over an analyzed statement tree.
//!
//! Frames live in a stack-ordered arena. A block frame's parent is the frame
//! it appears in; a call frame's parent is the frame the function was
//! declared in, so free names in a body resolve lexically.

use std::collections::HashMap;

use tracing::trace;

use crate::analysis::ScopeTree;
use crate::config::DEFAULT_MAX_CALL_DEPTH;
use crate::error::{Diagnostic, ErrorCode, MathError};
use crate::namespaces::LibraryRegistry;
use crate::runtime::value::Value;
use crate::syntax::ast::*;
use crate::types::Type;
use crate::types::binop::BinopRegistry;
use crate::types::{constructors, unop};

// ─── Frames ──────────────────────────────────────────────────────────────────

struct Slot {
    ty: Type,
    /// `None` until the first assignment.
    value: Option<Value>,
}

struct Frame<'a> {
    parent: Option<usize>,
    variables: HashMap<String, Slot>,
    /// Function name to its declaring statement span and declaration.
    functions: HashMap<String, (Span, &'a FunDecl)>,
}

impl Frame<'_> {
    fn new(parent: Option<usize>) -> Self {
        Self { parent, variables: HashMap::new(), functions: HashMap::new() }
    }
}

// ─── Evaluator ───────────────────────────────────────────────────────────────

pub struct Evaluator<'a> {
    scopes: &'a ScopeTree,
    libraries: &'a LibraryRegistry,
    binops: BinopRegistry,
    frames: Vec<Frame<'a>>,
    max_call_depth: usize,
    call_depth: usize,
}

impl<'a> Evaluator<'a> {
    pub fn new(scopes: &'a ScopeTree, libraries: &'a LibraryRegistry) -> Self {
        Self {
            scopes,
            libraries,
            binops: BinopRegistry::default(),
            frames: Vec::new(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            call_depth: 0,
        }
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Runs the root statements and returns the value of the root `return`.
    /// The first runtime failure aborts evaluation.
    pub fn evaluate(mut self, statements: &'a [Statement]) -> Result<Value, Diagnostic> {
        self.frames.push(Frame::new(None));
        match self.exec_block(0, statements)? {
            Some(value) => Ok(value),
            None => {
                let span = statements.last().map(|s| s.span).unwrap_or(Span::point(1, 1));
                Err(Diagnostic::new(ErrorCode::R006, span, "program finished without a return"))
            }
        }
    }

    // ─── Statements ──────────────────────────────────────────────────────────

    /// Executes `statements` in `frame` up to and including the first `return`.
    fn exec_block(&mut self, frame: usize, statements: &'a [Statement]) -> Result<Option<Value>, Diagnostic> {
        for stmt in statements {
            match &stmt.kind {
                StmtKind::Comment(_) => {}
                StmtKind::VarDecl { ty, name, init } => {
                    let value = match init {
                        Some(expr) => {
                            let v = self.eval(frame, expr)?;
                            Some(coerce(v, *ty, expr.span)?)
                        }
                        None => None,
                    };
                    self.frames[frame].variables.insert(name.clone(), Slot { ty: *ty, value });
                }
                StmtKind::FunDecl(decl) => {
                    self.frames[frame].functions.insert(decl.name.clone(), (stmt.span, decl));
                }
                StmtKind::Return(expr) => return self.eval(frame, expr).map(Some),
                StmtKind::Block(body) => {
                    let child = self.push_frame(frame);
                    let result = self.exec_block(child, body);
                    self.frames.truncate(child);
                    result?;
                }
                StmtKind::Assign { name, index, op, value } => {
                    self.assign(frame, stmt.span, name, index.as_ref(), *op, value)?;
                }
            }
        }
        Ok(None)
    }

    fn push_frame(&mut self, parent: usize) -> usize {
        self.frames.push(Frame::new(Some(parent)));
        self.frames.len() - 1
    }

    /// Compound forms evaluate a synthesized `target <op> value` expression.
    fn assign(
        &mut self,
        frame: usize,
        span: Span,
        name: &str,
        index: Option<&Expr>,
        op: Option<BinaryOp>,
        value: &Expr,
    ) -> Result<(), Diagnostic> {
        let index = match index {
            Some(expr) => Some(self.eval_index(frame, expr)?),
            None => None,
        };

        let new = match op {
            None => self.eval(frame, value)?,
            Some(op) => {
                let mut target = Expr::new(ExprKind::Variable(name.to_string()), span);
                if let Some(k) = index {
                    let literal = Expr::new(ExprKind::Number { value: k as f64, is_integer: true }, span);
                    target = Expr::new(ExprKind::Index { target: Box::new(target), index: Box::new(literal) }, span);
                }
                let desugared = Expr::new(
                    ExprKind::Binary { left: Box::new(target), right: Box::new(value.clone()), op },
                    span,
                );
                self.eval(frame, &desugared)?
            }
        };

        let slot = self.slot_mut(frame, name).ok_or_else(|| unresolved(name, span))?;
        match index {
            None => slot.value = Some(coerce(new, slot.ty, span)?),
            Some(k) => {
                let Some(x) = new.as_f64() else {
                    return Err(mistyped(Type::Num, &new, span));
                };
                let current = slot.value.as_mut().ok_or_else(|| uninitialized(name, span))?;
                let components = current
                    .components_mut()
                    .ok_or_else(|| Diagnostic::new(ErrorCode::R005, span, format!("`{name}` cannot be indexed")))?;
                let i = component(k, components.len(), span)?;
                components[i] = x;
            }
        }
        Ok(())
    }

    // ─── Names ───────────────────────────────────────────────────────────────

    fn chain(&self, from: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(Some(from), |&i| self.frames[i].parent)
    }

    fn slot_mut(&mut self, frame: usize, name: &str) -> Option<&mut Slot> {
        let owner = self.chain(frame).find(|&i| self.frames[i].variables.contains_key(name))?;
        self.frames[owner].variables.get_mut(name)
    }

    fn read(&self, frame: usize, name: &str, span: Span) -> Result<Value, Diagnostic> {
        let slot = self.chain(frame).find_map(|i| self.frames[i].variables.get(name));
        match slot {
            Some(Slot { value: Some(v), .. }) => Ok(v.clone()),
            Some(Slot { value: None, .. }) => Err(uninitialized(name, span)),
            None => self.libraries.field(name).ok_or_else(|| unresolved(name, span)),
        }
    }

    fn function(&self, frame: usize, name: &str) -> Option<(usize, Span, &'a FunDecl)> {
        self.chain(frame).find_map(|i| {
            self.frames[i].functions.get(name).map(|&(span, decl)| (i, span, decl))
        })
    }

    // ─── Expressions ─────────────────────────────────────────────────────────

    fn eval(&mut self, frame: usize, expr: &Expr) -> Result<Value, Diagnostic> {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Number { value, is_integer: true } => Ok(Value::Int(*value as i64)),
            ExprKind::Number { value, .. } => Ok(Value::Num(*value)),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Variable(name) => self.read(frame, name, span),

            ExprKind::Binary { left, right, op } => {
                let l = self.eval(frame, left)?;
                let r = self.eval(frame, right)?;
                self.binary(*op, l, r, span)
            }

            ExprKind::Unary { operand, op, prefix } => {
                if op.is_step() {
                    return self.step(frame, operand, *op, *prefix, span);
                }
                let v = self.eval(frame, operand)?;
                unop::eval(*op, v).map_err(|e| math(e, span))
            }

            ExprKind::Constructor { ty, args } => {
                let args = self.eval_all(frame, args)?;
                constructors::construct(*ty, &args).map_err(|e| math(e, span))
            }

            ExprKind::Call { name, args } => {
                let args = self.eval_all(frame, args)?;
                self.call(frame, name, args, span)
            }

            ExprKind::Index { target, index } => {
                let target = self.eval(frame, target)?;
                let k = self.eval_index(frame, index)?;
                let components = target.components().ok_or_else(|| {
                    Diagnostic::new(ErrorCode::R005, span, format!("{} cannot be indexed", target.ty()))
                })?;
                let i = component(k, components.len(), span)?;
                Ok(Value::Num(components[i]))
            }
        }
    }

    fn eval_all(&mut self, frame: usize, exprs: &[Expr]) -> Result<Vec<Value>, Diagnostic> {
        exprs.iter().map(|e| self.eval(frame, e)).collect()
    }

    fn eval_index(&mut self, frame: usize, expr: &Expr) -> Result<i64, Diagnostic> {
        match self.eval(frame, expr)? {
            Value::Int(k) => Ok(k),
            other => Err(mistyped(Type::Int, &other, expr.span)),
        }
    }

    fn binary(&self, op: BinaryOp, l: Value, r: Value, span: Span) -> Result<Value, Diagnostic> {
        let (lhs, rhs) = (l.ty(), r.ty());
        match self.binops.eval(op, l, r) {
            Some(result) => result.map_err(|e| math(e, span)),
            None => Err(math(MathError::Operands { op: op.symbol(), lhs, rhs }, span)),
        }
    }

    /// `++x` yields the new value, `x++` the old one.
    fn step(&mut self, frame: usize, operand: &Expr, op: UnaryOp, prefix: bool, span: Span) -> Result<Value, Diagnostic> {
        let ExprKind::Variable(name) = &operand.kind else {
            return Err(Diagnostic::new(ErrorCode::R005, span, format!("`{}` needs a variable operand", op.symbol())));
        };
        let old = self.read(frame, name, operand.span)?;
        let new = unop::eval(op, old.clone()).map_err(|e| math(e, span))?;
        let slot = self.slot_mut(frame, name).ok_or_else(|| unresolved(name, span))?;
        slot.value = Some(new.clone());
        Ok(if prefix { new } else { old })
    }

    // ─── Calls ───────────────────────────────────────────────────────────────

    fn call(&mut self, frame: usize, name: &str, args: Vec<Value>, span: Span) -> Result<Value, Diagnostic> {
        if let Some((owner, fn_span, decl)) = self.function(frame, name) {
            return self.call_local(owner, fn_span, decl, args, span);
        }
        match self.libraries.call(name, &args) {
            Some(result) => result.map_err(|e| math(e, span)),
            None => Err(unresolved(name, span)),
        }
    }

    fn call_local(
        &mut self,
        owner: usize,
        fn_span: Span,
        decl: &'a FunDecl,
        args: Vec<Value>,
        span: Span,
    ) -> Result<Value, Diagnostic> {
        if self.call_depth >= self.max_call_depth {
            let msg = format!("call depth limit of {} exceeded", self.max_call_depth);
            return Err(Diagnostic::new(ErrorCode::R002, span, msg));
        }
        let scopes = self.scopes;
        let param_types = match scopes.signature(fn_span) {
            Some(sig) if sig.param_types.len() == args.len() => &sig.param_types,
            _ => return Err(unresolved(&decl.name, span)),
        };
        trace!(function = %decl.name, depth = self.call_depth, "call");

        let frame = self.push_frame(owner);
        let result = self.invoke(frame, decl, param_types, args, span);
        self.frames.truncate(frame);

        result?.ok_or_else(|| {
            Diagnostic::new(ErrorCode::R006, span, format!("function `{}` finished without a return", decl.name))
        })
    }

    fn invoke(
        &mut self,
        frame: usize,
        decl: &'a FunDecl,
        param_types: &[Type],
        args: Vec<Value>,
        span: Span,
    ) -> Result<Option<Value>, Diagnostic> {
        for ((param, ty), value) in decl.params.iter().zip(param_types).zip(args) {
            let value = coerce(value, *ty, span)?;
            self.frames[frame].variables.insert(param.name.clone(), Slot { ty: *ty, value: Some(value) });
        }
        self.call_depth += 1;
        let result = self.exec_block(frame, &decl.body);
        self.call_depth -= 1;
        result
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Converts between int and num when a slot or parameter asks for the other.
fn coerce(value: Value, ty: Type, span: Span) -> Result<Value, Diagnostic> {
    if value.ty() == ty {
        return Ok(value);
    }
    if value.ty().is_numeric() && ty.is_numeric() {
        return constructors::construct(ty, &[value]).map_err(|e| math(e, span));
    }
    Err(mistyped(ty, &value, span))
}

/// Zero-based position of the 1-based index `k`.
fn component(k: i64, len: usize, span: Span) -> Result<usize, Diagnostic> {
    if k < 1 || k > len as i64 {
        return Err(Diagnostic::new(ErrorCode::R001, span, format!("index {k} out of range 1..={len}")));
    }
    Ok((k - 1) as usize)
}

fn math(error: MathError, span: Span) -> Diagnostic {
    Diagnostic::new(ErrorCode::R004, span, error.to_string())
}

fn unresolved(name: &str, span: Span) -> Diagnostic {
    Diagnostic::new(ErrorCode::R005, span, format!("`{name}` is not defined"))
}

fn uninitialized(name: &str, span: Span) -> Diagnostic {
    Diagnostic::new(ErrorCode::R003, span, format!("variable `{name}` is used before it is initialized"))
}

fn mistyped(expected: Type, found: &Value, span: Span) -> Diagnostic {
    Diagnostic::new(ErrorCode::R005, span, format!("expected {expected}, found {}", found.ty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis;
    use crate::syntax::lexer::Lexer;
    use crate::syntax::parser::Parser;

    fn eval(src: &str) -> Result<Value, Diagnostic> {
        let tokens = Lexer::new(src).tokenize().expect("lex failed");
        let statements = Parser::new(tokens).parse().expect("parse failed");
        let libraries = LibraryRegistry::standard();
        let analysis = analysis::analyze(&statements, &libraries).expect("analysis failed");
        Evaluator::new(&analysis.scopes, &libraries).evaluate(&statements)
    }

    fn code(src: &str) -> ErrorCode {
        eval(src).unwrap_err().code
    }

    #[test]
    fn declared_type_coerces_initializer() {
        assert_eq!(eval("num x = 5\nreturn x"), Ok(Value::Num(5.0)));
        assert_eq!(eval("num x = 1\nx = 2\nreturn x"), Ok(Value::Num(2.0)));
    }

    #[test]
    fn compound_assignment() {
        assert_eq!(eval("num x = 5\nx += 3\nreturn x"), Ok(Value::Num(8.0)));
        assert_eq!(eval("int i = 7\ni //= 2\nreturn i"), Ok(Value::Int(3)));
        assert_eq!(eval("vec3 v = vec3(1, 2, 3)\nv[2] *= 5\nreturn v[2]"), Ok(Value::Num(10.0)));
    }

    #[test]
    fn indexed_compound_evaluates_index_once() {
        let src = "vec3 v = vec3(1, 2, 3)\nint i = 1\nv[i++] += 10\nreturn v[1] + v[2] + i";
        assert_eq!(eval(src), Ok(Value::Num(11.0 + 2.0 + 2.0)));
    }

    #[test]
    fn increments() {
        assert_eq!(eval("int i = 1\nint j = i++\nreturn j * 10 + i"), Ok(Value::Int(12)));
        assert_eq!(eval("int i = 1\nint j = ++i\nreturn j * 10 + i"), Ok(Value::Int(22)));
    }

    #[test]
    fn blocks_write_through_to_outer_variables() {
        assert_eq!(eval("num x = 1\n{ num y = 2; x = x + y; }\nreturn x"), Ok(Value::Num(3.0)));
    }

    #[test]
    fn functions_resolve_names_lexically() {
        let src = "num k = 10\nfun f(a) => a + k\n{ num k = 1000; num r = f(1); k = r; }\nreturn f(2)";
        assert_eq!(eval(src), Ok(Value::Num(12.0)));
    }

    #[test]
    fn int_arguments_widen_to_num_parameters() {
        // `a` is num from the first call, so the int argument arrives as 3.0
        assert_eq!(eval("fun f(a) => a / 2\nnum x = f(1.5)\nreturn f(3)"), Ok(Value::Num(1.5)));
    }

    #[test]
    fn runtime_errors() {
        assert_eq!(code("vec3 v = vec3(1, 2, 3)\nint i = 4\nreturn v[i]"), ErrorCode::R001);
        assert_eq!(code("vec3 v = vec3(1, 2, 3)\nint i = 0\nv[i] = 1\nreturn 1"), ErrorCode::R001);
        assert_eq!(code("num x\nreturn x"), ErrorCode::R003);
        assert_eq!(code("int z = 0\nreturn 1 // z"), ErrorCode::R004);
        assert_eq!(code("int big = 4611686018427387904\nreturn big * 2"), ErrorCode::R004);
    }

    #[test]
    fn call_depth_limit() {
        let src = "fun a() => 1\nfun b() => a()\nfun c() => b()\nreturn c()";
        let tokens = Lexer::new(src).tokenize().unwrap();
        let statements = Parser::new(tokens).parse().unwrap();
        let libraries = LibraryRegistry::standard();
        let analysis = analysis::analyze(&statements, &libraries).unwrap();
        let shallow = Evaluator::new(&analysis.scopes, &libraries).with_max_call_depth(2);
        assert_eq!(shallow.evaluate(&statements).unwrap_err().code, ErrorCode::R002);
        let deep = Evaluator::new(&analysis.scopes, &libraries).with_max_call_depth(3);
        assert_eq!(deep.evaluate(&statements), Ok(Value::Int(1)));
    }

    #[test]
    fn statements_after_return_do_not_run() {
        assert_eq!(eval("return 1\nint z = 1 // 0"), Ok(Value::Int(1)));
    }
}
