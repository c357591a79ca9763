//! Precedence-climbing expression parser over a token slice.
//!
//! Each call site hands in exactly the tokens of one expression (a statement
//! tail, an index, an argument list), so the parser keeps no state between
//! independent parses.
//!
//! Both the recursion depth and the height of the finished tree are bounded
//! by `max_depth`.

use crate::error::{Diagnostic, ErrorCode};
use crate::syntax::ast::{BinaryOp, Expr, ExprKind, Span, UnaryOp};
use crate::syntax::token::{Token, TokenKind};

const UNARY_PRECEDENCE: i32 = 12;
const STEP_PRECEDENCE: i32 = UNARY_PRECEDENCE + 1;
const INDEX_PRECEDENCE: i32 = 11;

/// Binding power of a token in binary position. Sentinels that close an
/// expression get -1; tokens that are not operators get 0.
pub fn precedence(kind: Option<&TokenKind>) -> i32 {
    let Some(kind) = kind else { return -1 };
    match kind {
        TokenKind::End | TokenKind::RParen | TokenKind::RBracket | TokenKind::Comma => -1,
        TokenKind::EqEq | TokenKind::BangEq | TokenKind::Gt | TokenKind::Lt
        | TokenKind::GtEq | TokenKind::LtEq | TokenKind::PipePipe => 1,
        TokenKind::AmpAmp => 2,
        TokenKind::Pipe => 3,
        TokenKind::Caret => 4,
        TokenKind::Amp => 5,
        TokenKind::LtLt | TokenKind::GtGt => 6,
        TokenKind::Plus | TokenKind::Minus => 7,
        TokenKind::Percent => 8,
        TokenKind::Star | TokenKind::Slash | TokenKind::SlashSlash => 9,
        TokenKind::StarStar => 10,
        TokenKind::LParen | TokenKind::LBracket => 11,
        _ => 0,
    }
}

/// Parse `tokens` as one complete expression. Diagnostics are appended to
/// `errors`; `None` means the expression was malformed.
pub fn parse_expression(tokens: &[Token], max_depth: usize, errors: &mut Vec<Diagnostic>) -> Option<Expr> {
    let mut parser = ExprParser { tokens, pos: 0, depth: 0, max_depth, errors };
    let (expr, _) = parser.parse(0)?;
    if let Some(tok) = parser.peek().filter(|t| t.kind != TokenKind::End) {
        let msg = format!("unexpected `{}` after expression", tok.kind.describe());
        parser.error(ErrorCode::P001, Span::of(tok), msg);
        return None;
    }
    Some(expr)
}

struct ExprParser<'t, 'e> {
    tokens: &'t [Token],
    pos: usize,
    depth: usize,
    max_depth: usize,
    errors: &'e mut Vec<Diagnostic>,
}

/// A parsed subtree and its height.
type Node = (Expr, usize);

impl<'t> ExprParser<'t, '_> {
    fn parse(&mut self, min_precedence: i32) -> Option<Node> {
        self.depth += 1;
        let result = if self.depth > self.max_depth {
            let span = self.here();
            self.error(ErrorCode::P004, span, "expression nesting too deep");
            None
        } else {
            self.parse_climbing(min_precedence)
        };
        self.depth -= 1;
        result
    }

    fn parse_climbing(&mut self, min_precedence: i32) -> Option<Node> {
        let (mut left, mut height) = self.parse_prefix()?;

        // ── postfix: `x++`, `x--`, `x[i]` ────────────────────────────────────
        loop {
            let Some(tok) = self.peek() else { break };
            if tok.kind.is_postfix() {
                let tok = self.advance();
                let op = UnaryOp::from_token(&tok.kind)?;
                let span = left.span.to(Span::of(tok));
                height = self.grow(height, span)?;
                left = Expr::new(ExprKind::Unary { operand: Box::new(left), op, prefix: false }, span);
            } else if tok.kind == TokenKind::LBracket && INDEX_PRECEDENCE >= min_precedence {
                self.advance();
                let (index, index_height) = self.parse(0)?;
                let close = self.expect(TokenKind::RBracket, "`]` to close the index")?;
                let span = left.span.to(Span::of(close));
                height = self.grow(height.max(index_height), span)?;
                left = Expr::new(ExprKind::Index { target: Box::new(left), index: Box::new(index) }, span);
            } else {
                break;
            }
        }

        // ── binary chain ─────────────────────────────────────────────────────
        loop {
            let prec = precedence(self.peek().map(|t| &t.kind));
            if prec < min_precedence {
                break;
            }
            let tok = self.advance();
            let Some(op) = BinaryOp::from_token(&tok.kind) else {
                let msg = format!("expected an operator, found `{}`", tok.kind.describe());
                self.error(ErrorCode::P001, Span::of(tok), msg);
                return None;
            };
            // `**` groups right-to-left, everything else left-to-right
            let next_min = if op == BinaryOp::Pow { prec } else { prec + 1 };
            let (right, right_height) = self.parse(next_min)?;
            let span = left.span.to(right.span);
            height = self.grow(height.max(right_height), span)?;
            left = Expr::new(ExprKind::Binary { left: Box::new(left), right: Box::new(right), op }, span);
        }

        Some((left, height))
    }

    /// Height of a node whose tallest child is `child`.
    fn grow(&mut self, child: usize, span: Span) -> Option<usize> {
        let height = child + 1;
        if height > self.max_depth {
            self.error(ErrorCode::P004, span, "expression nesting too deep");
            return None;
        }
        Some(height)
    }

    fn parse_prefix(&mut self) -> Option<Node> {
        let Some(tok) = self.peek() else {
            let span = self.here();
            self.error(ErrorCode::P005, span, "expected an expression");
            return None;
        };

        if let Some(op) = UnaryOp::from_token(&tok.kind) {
            let tok = self.advance();
            let (operand, operand_height) = self.parse(if op.is_step() { STEP_PRECEDENCE } else { UNARY_PRECEDENCE })?;
            let span = Span::of(tok).to(operand.span);
            let height = self.grow(operand_height, span)?;
            return Some((Expr::new(ExprKind::Unary { operand: Box::new(operand), op, prefix: true }, span), height));
        }

        match &tok.kind {
            TokenKind::Number(value) => {
                let value = *value;
                let tok = self.advance();
                let is_integer = value.fract() == 0.0 && value.abs() < i64::MAX as f64;
                Some((Expr::new(ExprKind::Number { value, is_integer }, Span::of(tok)), 1))
            }
            TokenKind::True | TokenKind::False => {
                let tok = self.advance();
                Some((Expr::new(ExprKind::Bool(tok.kind == TokenKind::True), Span::of(tok)), 1))
            }
            kind if kind.is_type_keyword() => {
                let tok = self.advance();
                let ty = tok.kind.as_type()?;
                self.expect(TokenKind::LParen, &format!("`(` after `{ty}`"))?;
                let (args, end, args_height) = self.parse_args()?;
                let span = Span::of(tok).to(end);
                let height = self.grow(args_height, span)?;
                Some((Expr::new(ExprKind::Constructor { ty, args }, span), height))
            }
            TokenKind::Name(name) => {
                let name = name.clone();
                let tok = self.advance();
                if self.check(TokenKind::LParen) {
                    self.advance();
                    let (args, end, args_height) = self.parse_args()?;
                    let span = Span::of(tok).to(end);
                    let height = self.grow(args_height, span)?;
                    Some((Expr::new(ExprKind::Call { name, args }, span), height))
                } else {
                    Some((Expr::new(ExprKind::Variable(name), Span::of(tok)), 1))
                }
            }
            TokenKind::LParen => {
                let open = self.advance();
                let (inner, height) = self.parse(0)?;
                let close = self.expect(TokenKind::RParen, "`)` to close the group")?;
                Some((Expr { span: Span::of(open).to(Span::of(close)), ..inner }, height))
            }
            other => {
                let msg = format!("expected an expression, found `{}`", other.describe());
                self.error(ErrorCode::P005, Span::of(tok), msg);
                None
            }
        }
    }

    /// Comma-separated arguments after an opening `(`, through the closing
    /// `)`, with the tallest argument's height.
    fn parse_args(&mut self) -> Option<(Vec<Expr>, Span, usize)> {
        let mut args = Vec::new();
        let mut height = 0;
        if self.check(TokenKind::RParen) {
            let close = self.advance();
            return Some((args, Span::of(close), height));
        }
        loop {
            let (arg, arg_height) = self.parse(0)?;
            args.push(arg);
            height = height.max(arg_height);
            match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Comma) => { self.advance(); }
                Some(TokenKind::RParen) => {
                    let close = self.advance();
                    return Some((args, Span::of(close), height));
                }
                _ => {
                    let span = self.here();
                    self.error(ErrorCode::P002, span, "expected `,` or `)` in argument list");
                    return None;
                }
            }
        }
    }

    // ─── Token primitives ────────────────────────────────────────────────────

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> &'t Token {
        let tok = &self.tokens[self.pos];
        self.pos += 1;
        tok
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().is_some_and(|t| t.kind == kind)
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Option<&'t Token> {
        if self.check(kind) {
            return Some(self.advance());
        }
        let span = self.here();
        let found = self.peek().map(|t| format!(", found `{}`", t.kind.describe())).unwrap_or_default();
        self.error(ErrorCode::P002, span, format!("expected {what}{found}"));
        None
    }

    /// Span of the current token, or just past the last one at end of slice.
    fn here(&self) -> Span {
        match (self.peek(), self.tokens.last()) {
            (Some(tok), _) => Span::of(tok),
            (None, Some(last)) => Span::point(last.line, last.end_column() + 1),
            (None, None) => Span::point(1, 1),
        }
    }

    fn error(&mut self, code: ErrorCode, span: Span, msg: impl Into<String>) {
        self.errors.push(Diagnostic::new(code, span, msg));
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::lexer::Lexer;
    use crate::types::Type;
    use pretty_assertions::assert_eq;

    fn parse(src: &str) -> Expr {
        let tokens = Lexer::new(src).tokenize().expect("lex failed");
        let mut errors = Vec::new();
        let expr = parse_expression(&tokens, 128, &mut errors);
        assert!(errors.is_empty(), "unexpected errors: {errors:#?}");
        expr.expect("parse failed")
    }

    fn parse_err(src: &str) -> Vec<Diagnostic> {
        let tokens = Lexer::new(src).tokenize().expect("lex failed");
        let mut errors = Vec::new();
        let expr = parse_expression(&tokens, 128, &mut errors);
        assert!(expr.is_none(), "expected failure, got {expr:?}");
        errors
    }

    /// Fully parenthesised rendering of a tree.
    fn show(e: &Expr) -> String {
        match &e.kind {
            ExprKind::Binary { left, right, op } => format!("({} {} {})", show(left), op.symbol(), show(right)),
            ExprKind::Unary { operand, op, prefix: true } => format!("({}{})", op.symbol(), show(operand)),
            ExprKind::Unary { operand, op, prefix: false } => format!("({}{})", show(operand), op.symbol()),
            ExprKind::Variable(name) => name.clone(),
            ExprKind::Number { value, .. } => value.to_string(),
            ExprKind::Bool(b) => b.to_string(),
            ExprKind::Constructor { ty, args } => {
                format!("{ty}({})", args.iter().map(show).collect::<Vec<_>>().join(", "))
            }
            ExprKind::Call { name, args } => {
                format!("{name}({})", args.iter().map(show).collect::<Vec<_>>().join(", "))
            }
            ExprKind::Index { target, index } => format!("{}[{}]", show(target), show(index)),
        }
    }

    #[test]
    fn multiplication_binds_tighter() {
        assert_eq!(show(&parse("1 + 2 * 3")), "(1 + (2 * 3))");
    }

    #[test]
    fn power_is_right_associative() {
        assert_eq!(show(&parse("2 ** 3 ** 2")), "(2 ** (3 ** 2))");
    }

    #[test]
    fn subtraction_is_left_associative() {
        assert_eq!(show(&parse("1 - 2 - 3")), "((1 - 2) - 3)");
        assert_eq!(show(&parse("8 // 2 * 3")), "((8 // 2) * 3)");
    }

    #[test]
    fn precedence_ladder() {
        assert_eq!(show(&parse("a || b && c")), "(a || (b && c))");
        assert_eq!(show(&parse("a | b ^ c & d")), "(a | (b ^ (c & d)))");
        assert_eq!(show(&parse("a << 1 + 2")), "(a << (1 + 2))");
        assert_eq!(show(&parse("a + b % c")), "(a + (b % c))");
        assert_eq!(show(&parse("a < b == c")), "((a < b) == c)");
    }

    #[test]
    fn parentheses_override_precedence() {
        assert_eq!(show(&parse("(1 + 2) * 3")), "((1 + 2) * 3)");
    }

    #[test]
    fn unary_prefix_and_postfix() {
        assert_eq!(show(&parse("-a * b")), "((-a) * b)");
        assert_eq!(show(&parse("!flag")), "(!flag)");
        assert_eq!(show(&parse("++i + 1")), "((++i) + 1)");
        assert_eq!(show(&parse("i++ * 2")), "((i++) * 2)");
        assert_eq!(show(&parse("-2 ** 2")), "((-2) ** 2)");
    }

    #[test]
    fn number_literal_integer_flag() {
        assert!(matches!(parse("3").kind, ExprKind::Number { is_integer: true, .. }));
        assert!(matches!(parse("1.5").kind, ExprKind::Number { is_integer: false, .. }));
    }

    #[test]
    fn constructor_and_call() {
        let e = parse("vec3(1, 2, x)");
        match &e.kind {
            ExprKind::Constructor { ty, args } => {
                assert_eq!(*ty, Type::Vec3);
                assert_eq!(args.len(), 3);
            }
            other => panic!("expected Constructor, got {other:?}"),
        }
        assert_eq!(show(&parse("vec3.length(v) * 2")), "(vec3.length(v) * 2)");
        assert_eq!(show(&parse("f()")), "f()");
    }

    #[test]
    fn indexing() {
        assert_eq!(show(&parse("erh(m, v)[2]")), "erh(m, v)[2]");
        assert_eq!(show(&parse("a * b[2]")), "(a * b[2])");
        assert_eq!(show(&parse("m[1][2]")), "m[1][2]");
        assert_eq!(show(&parse("v[i + 1]")), "v[(i + 1)]");
    }

    #[test]
    fn spans_cover_whole_expression() {
        let e = parse("a + vec2(1, 2)");
        assert_eq!(e.span, Span::new(1, 1, 1, 14));
    }

    #[test]
    fn missing_close_paren() {
        let errs = parse_err("(1 + 2");
        assert_eq!(errs[0].code, ErrorCode::P002);
    }

    #[test]
    fn missing_right_operand() {
        let errs = parse_err("1 +");
        assert_eq!(errs[0].code, ErrorCode::P005);
    }

    #[test]
    fn juxtaposed_operands() {
        let errs = parse_err("1 2");
        assert_eq!(errs[0].code, ErrorCode::P001);
        assert!(errs[0].message.contains("operator"));
    }

    #[test]
    fn stray_closing_bracket() {
        let errs = parse_err("a ]");
        assert_eq!(errs[0].code, ErrorCode::P001);
    }

    #[test]
    fn nesting_limit() {
        let src = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        let errs = parse_err(&src);
        assert!(errs.iter().any(|e| e.code == ErrorCode::P004));
    }

    #[test]
    fn long_left_chains_count_as_nesting() {
        let src = format!("1{}", "+1".repeat(10_000));
        let errs = parse_err(&src);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].code, ErrorCode::P004);

        let src = format!("v{}", "[1]".repeat(200));
        assert!(parse_err(&src).iter().any(|e| e.code == ErrorCode::P004));
    }

    #[test]
    fn chains_under_the_limit_parse() {
        let src = format!("1{}", "+1".repeat(100));
        assert!(matches!(parse(&src).kind, ExprKind::Binary { op: BinaryOp::Add, .. }));
    }
}
