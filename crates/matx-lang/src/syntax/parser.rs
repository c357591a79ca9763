//! Statement parser.
//!
//! The driver walks the token stream and, at each statement start, picks the
//! first handler that can claim the token. The handler's scanner then decides
//! token by token where the statement ends; the buffered tokens are handed to
//! the handler's builder, which produces the node (parsing expressions and
//! nested bodies as needed).

use crate::config::DEFAULT_MAX_NESTING_DEPTH;
use crate::error::{Diagnostic, ErrorCode};
use crate::syntax::ast::*;
use crate::syntax::expr_parser::parse_expression;
use crate::syntax::token::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    max_depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, max_depth: DEFAULT_MAX_NESTING_DEPTH }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn parse(self) -> Result<Vec<Statement>, Vec<Diagnostic>> {
        let mut errors = Vec::new();
        let statements = self.parse_statements(&self.tokens, 0, &mut errors);
        if errors.is_empty() { Ok(statements) } else { Err(errors) }
    }

    fn parse_statements(&self, tokens: &[Token], depth: usize, errors: &mut Vec<Diagnostic>) -> Vec<Statement> {
        let mut statements = Vec::new();
        let mut pos = 0;

        while pos < tokens.len() {
            let first = &tokens[pos];
            if first.kind == TokenKind::End {
                pos += 1;
                continue;
            }

            let Some(handler) = Handler::ALL.into_iter().find(|h| h.can_start(&first.kind)) else {
                errors.push(Diagnostic::new(ErrorCode::P001, Span::of(first),
                    format!("unexpected token `{}`", first.kind.describe())));
                pos = recover(tokens, pos);
                continue;
            };

            let mut scanner = Scanner::new(handler);
            let mut buffer = vec![first.clone()];
            let mut finished = handler == Handler::Comment;
            pos += 1;

            while !finished && pos < tokens.len() {
                let tok = &tokens[pos];
                pos += 1;
                match scanner.feed(tok) {
                    Step::Take => buffer.push(tok.clone()),
                    Step::Skip => {}
                    Step::Finish => {
                        buffer.push(tok.clone());
                        finished = true;
                    }
                    Step::Stop => finished = true,
                }
            }

            if let Some(stmt) = self.build(handler, &buffer, depth, errors) {
                statements.push(stmt);
            }
        }

        statements
    }

    // ─── Builders ────────────────────────────────────────────────────────────

    fn build(&self, handler: Handler, buffer: &[Token], depth: usize, errors: &mut Vec<Diagnostic>) -> Option<Statement> {
        let span = match buffer {
            [only] => Span::of(only),
            [first, .., last] => Span::between(first, last),
            [] => return None,
        };
        let kind = match handler {
            Handler::Comment => match &buffer[0].kind {
                TokenKind::Comment(text) => StmtKind::Comment(text.clone()),
                _ => return None,
            },
            Handler::VarDecl   => self.build_var_decl(buffer, errors)?,
            Handler::FunDecl   => self.build_fun_decl(buffer, depth, errors)?,
            Handler::Return    => StmtKind::Return(self.tail_expression(buffer, 1, errors)?),
            Handler::Block     => StmtKind::Block(self.build_body(buffer, 0, depth, errors)?),
            Handler::VarAssign => self.build_assign(buffer, errors)?,
        };
        Some(Statement::new(kind, span))
    }

    /// `<type> <name> [= <expr>]`
    fn build_var_decl(&self, buffer: &[Token], errors: &mut Vec<Diagnostic>) -> Option<StmtKind> {
        let ty = buffer[0].kind.as_type()?;
        let Some(TokenKind::Name(name)) = buffer.get(1).map(|t| &t.kind) else {
            expected(errors, buffer, 1, &format!("variable name after `{ty}`"));
            return None;
        };
        let init = match buffer.get(2) {
            None => None,
            Some(tok) if tok.kind == TokenKind::Eq => Some(self.tail_expression(buffer, 3, errors)?),
            Some(tok) => {
                errors.push(Diagnostic::new(ErrorCode::P001, Span::of(tok),
                    format!("expected `=` after `{name}`, found `{}`", tok.kind.describe())));
                return None;
            }
        };
        Some(StmtKind::VarDecl { ty, name: name.clone(), init })
    }

    /// `fun <name>(<params>) { <body> }` or `fun <name>(<params>) => <expr>`
    fn build_fun_decl(&self, buffer: &[Token], depth: usize, errors: &mut Vec<Diagnostic>) -> Option<StmtKind> {
        let Some(TokenKind::Name(name)) = buffer.get(1).map(|t| &t.kind) else {
            expected(errors, buffer, 1, "function name after `fun`");
            return None;
        };
        if buffer.get(2).map(|t| &t.kind) != Some(&TokenKind::LParen) {
            expected(errors, buffer, 2, &format!("`(` after `{name}`"));
            return None;
        }

        // ── parameters: bare names separated by commas ───────────────────────
        let mut params = Vec::new();
        let mut pos = 3;
        loop {
            match buffer.get(pos).map(|t| &t.kind) {
                Some(TokenKind::RParen) if params.is_empty() => break,
                Some(TokenKind::Name(param)) => {
                    params.push(Param { name: param.clone(), span: Span::of(&buffer[pos]) });
                    pos += 1;
                }
                _ => {
                    malformed_params(errors, buffer, pos, "argument name expected");
                    return None;
                }
            }
            match buffer.get(pos).map(|t| &t.kind) {
                Some(TokenKind::Comma) => pos += 1,
                Some(TokenKind::RParen) => break,
                _ => {
                    malformed_params(errors, buffer, pos, "comma expected between arguments");
                    return None;
                }
            }
        }
        pos += 1; // `)`

        // ── body ─────────────────────────────────────────────────────────────
        match buffer.get(pos).map(|t| &t.kind) {
            Some(TokenKind::FatArrow) => {
                let expr = self.tail_expression(buffer, pos + 1, errors)?;
                let span = expr.span;
                Some(StmtKind::FunDecl(FunDecl {
                    name: name.clone(),
                    params,
                    is_lambda: true,
                    body: vec![Statement::new(StmtKind::Return(expr), span)],
                }))
            }
            Some(TokenKind::LBrace) => {
                let body = self.build_body(buffer, pos, depth, errors)?;
                Some(StmtKind::FunDecl(FunDecl { name: name.clone(), params, is_lambda: false, body }))
            }
            _ => {
                expected(errors, buffer, pos, "`{` or `=>` after the parameter list");
                None
            }
        }
    }

    /// `<name> [ '[' <index> ']' ] <assign-op> <expr>`
    fn build_assign(&self, buffer: &[Token], errors: &mut Vec<Diagnostic>) -> Option<StmtKind> {
        let TokenKind::Name(name) = &buffer[0].kind else { return None };
        let mut pos = 1;

        let index = if buffer.get(1).map(|t| &t.kind) == Some(&TokenKind::LBracket) {
            let Some(close) = matching_bracket(buffer, 1) else {
                errors.push(Diagnostic::new(ErrorCode::P002, Span::of(&buffer[1]),
                    "expected `]` to close the index"));
                return None;
            };
            let inner = &buffer[2..close];
            if inner.is_empty() {
                errors.push(Diagnostic::new(ErrorCode::P005, Span::between(&buffer[1], &buffer[close]),
                    "expected an index expression"));
                return None;
            }
            pos = close + 1;
            Some(parse_expression(inner, self.max_depth, errors)?)
        } else {
            None
        };

        let op = match buffer.get(pos).and_then(|t| BinaryOp::from_assignment(&t.kind)) {
            Some(op) => op,
            None => {
                expected(errors, buffer, pos, &format!("an assignment operator after `{name}`"));
                return None;
            }
        };
        let value = self.tail_expression(buffer, pos + 1, errors)?;
        Some(StmtKind::Assign { name: name.clone(), index, op, value })
    }

    /// Statements between the brace at `open` and the buffer's final `}`.
    fn build_body(&self, buffer: &[Token], open: usize, depth: usize, errors: &mut Vec<Diagnostic>) -> Option<Vec<Statement>> {
        let close = buffer.len() - 1;
        if close <= open || buffer[close].kind != TokenKind::RBrace {
            errors.push(Diagnostic::new(ErrorCode::P002, Span::of(&buffer[open]),
                "expected `}` to close the block"));
            return None;
        }
        if depth + 1 > self.max_depth {
            errors.push(Diagnostic::new(ErrorCode::P004, Span::of(&buffer[open]), "block nesting too deep"));
            return None;
        }
        Some(self.parse_statements(&buffer[open + 1..close], depth + 1, errors))
    }

    /// Everything from `start` to the end of the buffer, as one expression.
    fn tail_expression(&self, buffer: &[Token], start: usize, errors: &mut Vec<Diagnostic>) -> Option<Expr> {
        if start >= buffer.len() {
            let last = &buffer[buffer.len() - 1];
            errors.push(Diagnostic::new(ErrorCode::P005, Span::of(last),
                format!("expected an expression after `{}`", last.kind.describe())));
            return None;
        }
        parse_expression(&buffer[start..], self.max_depth, errors)
    }
}

// ─── Handlers ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Handler {
    Comment,
    VarDecl,
    FunDecl,
    Return,
    Block,
    VarAssign,
}

impl Handler {
    /// Priority order: the first handler that can start wins.
    const ALL: [Handler; 6] = [
        Handler::Comment,
        Handler::VarDecl,
        Handler::FunDecl,
        Handler::Return,
        Handler::Block,
        Handler::VarAssign,
    ];

    fn can_start(self, kind: &TokenKind) -> bool {
        match self {
            Self::Comment   => matches!(kind, TokenKind::Comment(_)),
            Self::VarDecl   => kind.is_type_keyword(),
            Self::FunDecl   => *kind == TokenKind::Fun,
            Self::Return    => *kind == TokenKind::Return,
            Self::Block     => *kind == TokenKind::LBrace,
            Self::VarAssign => matches!(kind, TokenKind::Name(_)),
        }
    }
}

enum Step {
    /// Part of the statement.
    Take,
    /// Not part of the statement, keep scanning.
    Skip,
    /// Last token of the statement.
    Finish,
    /// Terminator: ends the statement without belonging to it.
    Stop,
}

#[derive(PartialEq)]
enum Mode {
    /// Ends at the next end marker.
    Line,
    /// Function header before its body starts.
    Header,
    /// Ends where brace depth returns to zero.
    Braces,
}

/// Per-statement end detection. Fresh for every statement.
struct Scanner {
    mode: Mode,
    depth: usize,
}

impl Scanner {
    fn new(handler: Handler) -> Self {
        match handler {
            Handler::Block   => Self { mode: Mode::Braces, depth: 1 },
            Handler::FunDecl => Self { mode: Mode::Header, depth: 0 },
            _                => Self { mode: Mode::Line, depth: 0 },
        }
    }

    fn feed(&mut self, tok: &Token) -> Step {
        match self.mode {
            Mode::Line => match tok.kind {
                TokenKind::End => Step::Stop,
                TokenKind::Comment(_) => Step::Skip,
                _ => Step::Take,
            },
            Mode::Header => match tok.kind {
                TokenKind::FatArrow => { self.mode = Mode::Line; Step::Take }
                TokenKind::LBrace => { self.mode = Mode::Braces; self.depth = 1; Step::Take }
                // a line break between `)` and `{` is not a terminator
                TokenKind::End if tok.width == 0 => Step::Skip,
                TokenKind::End => Step::Stop,
                TokenKind::Comment(_) => Step::Skip,
                _ => Step::Take,
            },
            Mode::Braces => match tok.kind {
                TokenKind::LBrace => { self.depth += 1; Step::Take }
                TokenKind::RBrace => {
                    self.depth -= 1;
                    if self.depth == 0 { Step::Finish } else { Step::Take }
                }
                _ => Step::Take,
            },
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Index just past the next end marker, so one bad statement yields one error.
fn recover(tokens: &[Token], from: usize) -> usize {
    tokens[from..]
        .iter()
        .position(|t| t.kind == TokenKind::End)
        .map_or(tokens.len(), |offset| from + offset + 1)
}

/// Position of the `]` matching the `[` at `open`, honouring nesting.
fn matching_bracket(buffer: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, tok) in buffer.iter().enumerate().skip(open) {
        match tok.kind {
            TokenKind::LBracket => depth += 1,
            TokenKind::RBracket => {
                depth -= 1;
                if depth == 0 { return Some(i); }
            }
            _ => {}
        }
    }
    None
}

fn expected(errors: &mut Vec<Diagnostic>, buffer: &[Token], pos: usize, what: &str) {
    errors.push(missing(ErrorCode::P002, buffer, pos, format!("expected {what}")));
}

fn malformed_params(errors: &mut Vec<Diagnostic>, buffer: &[Token], pos: usize, msg: &str) {
    errors.push(missing(ErrorCode::P003, buffer, pos, msg.to_string()));
}

/// Diagnostic at `buffer[pos]`, or just past the statement when it ran out.
fn missing(code: ErrorCode, buffer: &[Token], pos: usize, mut msg: String) -> Diagnostic {
    match buffer.get(pos) {
        Some(tok) => {
            msg.push_str(&format!(", found `{}`", tok.kind.describe()));
            Diagnostic::new(code, Span::of(tok), msg)
        }
        None => {
            let last = &buffer[buffer.len() - 1];
            Diagnostic::new(code, Span::point(last.line, last.end_column() + 1), msg)
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::lexer::Lexer;
    use crate::types::Type;
    use pretty_assertions::assert_eq;

    fn parse(src: &str) -> Vec<Statement> {
        let tokens = Lexer::new(src).tokenize().expect("lex failed");
        Parser::new(tokens).parse().unwrap_or_else(|errs| panic!("parse failed: {errs:#?}"))
    }

    fn parse_err(src: &str) -> Vec<Diagnostic> {
        let tokens = Lexer::new(src).tokenize().expect("lex failed");
        match Parser::new(tokens).parse() {
            Ok(stmts) => panic!("expected parse to fail, got {stmts:#?}"),
            Err(errs) => errs,
        }
    }

    fn codes(errs: &[Diagnostic]) -> Vec<ErrorCode> {
        errs.iter().map(|e| e.code).collect()
    }

    #[test]
    fn var_decl_with_init() {
        let stmts = parse("num x = 1.5;");
        assert_eq!(stmts.len(), 1);
        match &stmts[0].kind {
            StmtKind::VarDecl { ty, name, init } => {
                assert_eq!(*ty, Type::Num);
                assert_eq!(name, "x");
                assert!(init.is_some());
            }
            other => panic!("expected VarDecl, got {other:?}"),
        }
    }

    #[test]
    fn var_decl_without_init() {
        let stmts = parse("vec3 v;");
        assert!(matches!(&stmts[0].kind, StmtKind::VarDecl { init: None, .. }));
    }

    #[test]
    fn statements_split_by_line_breaks() {
        let stmts = parse("int a = 1\nint b = a + 2\nreturn b");
        assert_eq!(stmts.len(), 3);
        assert!(matches!(stmts[2].kind, StmtKind::Return(_)));
    }

    #[test]
    fn statement_span_covers_first_to_last_token() {
        let stmts = parse("  num x = 12;");
        assert_eq!(stmts[0].span, Span::new(1, 3, 1, 12));
    }

    #[test]
    fn fun_decl_block_body() {
        let stmts = parse("fun erh(a, b) { return a * b; }");
        match &stmts[0].kind {
            StmtKind::FunDecl(f) => {
                assert_eq!(f.name, "erh");
                let names: Vec<&str> = f.params.iter().map(|p| p.name.as_str()).collect();
                assert_eq!(names, vec!["a", "b"]);
                assert!(!f.is_lambda);
                assert_eq!(f.body.len(), 1);
            }
            other => panic!("expected FunDecl, got {other:?}"),
        }
    }

    #[test]
    fn fun_decl_brace_on_next_line() {
        let stmts = parse("fun f(a)\n{\n  num y = a * 2\n  return y\n}\nreturn f(1)");
        assert_eq!(stmts.len(), 2);
        match &stmts[0].kind {
            StmtKind::FunDecl(f) => assert_eq!(f.body.len(), 2),
            other => panic!("expected FunDecl, got {other:?}"),
        }
    }

    #[test]
    fn fun_decl_lambda() {
        let stmts = parse("fun double(x) => x * 2;");
        match &stmts[0].kind {
            StmtKind::FunDecl(f) => {
                assert!(f.is_lambda);
                assert_eq!(f.body.len(), 1);
                assert!(matches!(f.body[0].kind, StmtKind::Return(_)));
            }
            other => panic!("expected FunDecl, got {other:?}"),
        }
    }

    #[test]
    fn fun_decl_without_params() {
        let stmts = parse("fun one() => 1");
        assert!(matches!(&stmts[0].kind, StmtKind::FunDecl(f) if f.params.is_empty()));
    }

    #[test]
    fn nested_blocks() {
        let stmts = parse("{ num a = 1; { num b = 2; } a = 3; }");
        match &stmts[0].kind {
            StmtKind::Block(body) => {
                assert_eq!(body.len(), 3);
                assert!(matches!(body[1].kind, StmtKind::Block(_)));
            }
            other => panic!("expected Block, got {other:?}"),
        }
    }

    #[test]
    fn compound_assignment() {
        let stmts = parse("x //= 2;");
        assert!(matches!(&stmts[0].kind, StmtKind::Assign { op: Some(BinaryOp::IntDiv), index: None, .. }));
        let stmts = parse("x = 2;");
        assert!(matches!(&stmts[0].kind, StmtKind::Assign { op: None, .. }));
    }

    #[test]
    fn indexed_assignment_with_nested_brackets() {
        let stmts = parse("m[v[1]] += 2;");
        match &stmts[0].kind {
            StmtKind::Assign { name, index: Some(index), op, .. } => {
                assert_eq!(name, "m");
                assert!(matches!(index.kind, ExprKind::Index { .. }));
                assert_eq!(*op, Some(BinaryOp::Add));
            }
            other => panic!("expected indexed Assign, got {other:?}"),
        }
    }

    #[test]
    fn comments_between_and_inside_statements() {
        let stmts = parse("# header\nnum x = 1 # trailing\nreturn x");
        assert_eq!(stmts.len(), 3);
        assert_eq!(stmts[0].kind, StmtKind::Comment(" header".into()));
        assert!(matches!(stmts[1].kind, StmtKind::VarDecl { .. }));
    }

    #[test]
    fn end_to_end_program_shape() {
        let src = "fun erh(a, b) { return a * b; }\n\
                   mat3 m = mat3(1,0,0, 0,1,0, 0,0,1);\n\
                   vec3 v = vec3(1,2,3);\n\
                   return erh(m, v)[2];";
        let stmts = parse(src);
        assert_eq!(stmts.len(), 4);
    }

    #[test]
    fn unexpected_token_reported_once_per_statement() {
        let errs = parse_err("+ 1 2 3; num x = 1; ) )");
        assert_eq!(codes(&errs), vec![ErrorCode::P001, ErrorCode::P001]);
    }

    #[test]
    fn missing_variable_name() {
        let errs = parse_err("num = 3;");
        assert_eq!(codes(&errs), vec![ErrorCode::P002]);
    }

    #[test]
    fn declaration_requires_equals() {
        let errs = parse_err("num x 3;");
        assert_eq!(codes(&errs), vec![ErrorCode::P001]);
    }

    #[test]
    fn assignment_requires_operator() {
        let errs = parse_err("x 3;");
        assert_eq!(codes(&errs), vec![ErrorCode::P002]);
        assert!(errs[0].message.contains("assignment operator"));
    }

    #[test]
    fn return_requires_expression() {
        let errs = parse_err("return;");
        assert_eq!(codes(&errs), vec![ErrorCode::P005]);
    }

    #[test]
    fn malformed_parameter_lists() {
        assert_eq!(codes(&parse_err("fun f(a b) => a;")), vec![ErrorCode::P003]);
        assert_eq!(codes(&parse_err("fun f(a, 1) => a;")), vec![ErrorCode::P003]);
        assert_eq!(codes(&parse_err("fun f(,) => 1;")), vec![ErrorCode::P003]);
    }

    #[test]
    fn missing_closing_brace() {
        let errs = parse_err("{ num a = 1;");
        assert_eq!(codes(&errs), vec![ErrorCode::P002]);
    }

    #[test]
    fn errors_from_independent_statements_are_collected() {
        let errs = parse_err("num = 1;\nx 2;\nreturn;");
        assert_eq!(codes(&errs), vec![ErrorCode::P002, ErrorCode::P002, ErrorCode::P005]);
    }

    #[test]
    fn errors_inside_nested_bodies_surface() {
        let errs = parse_err("{ x = ; }");
        assert_eq!(codes(&errs), vec![ErrorCode::P005]);
    }

    #[test]
    fn block_nesting_limit() {
        let src = format!("{}{}", "{".repeat(20), "}".repeat(20));
        let tokens = Lexer::new(&src).tokenize().unwrap();
        let errs = Parser::new(tokens).with_max_depth(8).parse().unwrap_err();
        assert_eq!(codes(&errs), vec![ErrorCode::P004]);
    }
}
