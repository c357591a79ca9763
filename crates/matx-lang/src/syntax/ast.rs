use serde::Serialize;

use crate::syntax::token::{Token, TokenKind};
use crate::types::Type;

/// Source range attached to every node for error reporting. Both ends are
/// inclusive and 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize, end_line: usize, end_column: usize) -> Self {
        Self { line, column, end_line, end_column }
    }

    pub fn point(line: usize, column: usize) -> Self {
        Self::new(line, column, line, column)
    }

    pub fn of(token: &Token) -> Self {
        Self::new(token.line, token.column, token.line, token.end_column())
    }

    pub fn between(start: &Token, end: &Token) -> Self {
        Self::of(start).to(Self::of(end))
    }

    /// Span from the start of `self` to the end of `other`.
    pub fn to(self, other: Span) -> Self {
        Self::new(self.line, self.column, other.end_line, other.end_column)
    }
}

// ─── Operators ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mod,
    Mul,
    Div,
    IntDiv,
    Pow,
    BitXor,
    BitOr,
    BitAnd,
    Shl,
    Shr,
    Eq,
    NotEq,
    Gt,
    Lt,
    GtEq,
    LtEq,
    And,
    Or,
}

impl BinaryOp {
    pub fn from_token(kind: &TokenKind) -> Option<Self> {
        Some(match kind {
            TokenKind::Plus       => Self::Add,
            TokenKind::Minus      => Self::Sub,
            TokenKind::Percent    => Self::Mod,
            TokenKind::Star       => Self::Mul,
            TokenKind::Slash      => Self::Div,
            TokenKind::SlashSlash => Self::IntDiv,
            TokenKind::StarStar   => Self::Pow,
            TokenKind::Caret      => Self::BitXor,
            TokenKind::Pipe       => Self::BitOr,
            TokenKind::Amp        => Self::BitAnd,
            TokenKind::LtLt       => Self::Shl,
            TokenKind::GtGt       => Self::Shr,
            TokenKind::EqEq       => Self::Eq,
            TokenKind::BangEq     => Self::NotEq,
            TokenKind::Gt         => Self::Gt,
            TokenKind::Lt         => Self::Lt,
            TokenKind::GtEq       => Self::GtEq,
            TokenKind::LtEq       => Self::LtEq,
            TokenKind::AmpAmp     => Self::And,
            TokenKind::PipePipe   => Self::Or,
            _ => return None,
        })
    }

    /// Base operator of a compound assignment. `Some(None)` is plain `=`.
    pub fn from_assignment(kind: &TokenKind) -> Option<Option<Self>> {
        Some(Some(match kind {
            TokenKind::Eq           => return Some(None),
            TokenKind::PlusEq       => Self::Add,
            TokenKind::MinusEq      => Self::Sub,
            TokenKind::PercentEq    => Self::Mod,
            TokenKind::StarEq       => Self::Mul,
            TokenKind::SlashEq      => Self::Div,
            TokenKind::SlashSlashEq => Self::IntDiv,
            TokenKind::StarStarEq   => Self::Pow,
            TokenKind::CaretEq      => Self::BitXor,
            TokenKind::PipeEq       => Self::BitOr,
            TokenKind::AmpEq        => Self::BitAnd,
            TokenKind::LtLtEq       => Self::Shl,
            TokenKind::GtGtEq       => Self::Shr,
            TokenKind::AmpAmpEq     => Self::And,
            TokenKind::PipePipeEq   => Self::Or,
            _ => return None,
        }))
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add    => "+",
            Self::Sub    => "-",
            Self::Mod    => "%",
            Self::Mul    => "*",
            Self::Div    => "/",
            Self::IntDiv => "//",
            Self::Pow    => "**",
            Self::BitXor => "^",
            Self::BitOr  => "|",
            Self::BitAnd => "&",
            Self::Shl    => "<<",
            Self::Shr    => ">>",
            Self::Eq     => "==",
            Self::NotEq  => "!=",
            Self::Gt     => ">",
            Self::Lt     => "<",
            Self::GtEq   => ">=",
            Self::LtEq   => "<=",
            Self::And    => "&&",
            Self::Or     => "||",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(self, Self::Eq | Self::NotEq | Self::Gt | Self::Lt | Self::GtEq | Self::LtEq)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UnaryOp {
    Plus,
    Neg,
    BitNot,
    Not,
    Inc,
    Dec,
}

impl UnaryOp {
    pub fn from_token(kind: &TokenKind) -> Option<Self> {
        Some(match kind {
            TokenKind::Plus       => Self::Plus,
            TokenKind::Minus      => Self::Neg,
            TokenKind::Tilde      => Self::BitNot,
            TokenKind::Bang       => Self::Not,
            TokenKind::PlusPlus   => Self::Inc,
            TokenKind::MinusMinus => Self::Dec,
            _ => return None,
        })
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Plus   => "+",
            Self::Neg    => "-",
            Self::BitNot => "~",
            Self::Not    => "!",
            Self::Inc    => "++",
            Self::Dec    => "--",
        }
    }

    pub fn is_step(&self) -> bool {
        matches!(self, Self::Inc | Self::Dec)
    }
}

// ─── Expressions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExprKind {
    Binary {
        left: Box<Expr>,
        right: Box<Expr>,
        op: BinaryOp,
    },
    /// `-x`, `!b`, `++i` (prefix) or `i--` (postfix)
    Unary {
        operand: Box<Expr>,
        op: UnaryOp,
        prefix: bool,
    },
    Variable(String),
    Number {
        value: f64,
        is_integer: bool,
    },
    Bool(bool),
    /// Type name used as a callee: `vec3(1, 2, 3)`
    Constructor {
        ty: Type,
        args: Vec<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
    /// 1-based component access: `v[1]`
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
}

// ─── Statements ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    pub kind: StmtKind,
    /// From the statement's first token through its last.
    pub span: Span,
}

impl Statement {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StmtKind {
    /// `# text`
    Comment(String),
    /// `vec3 v = vec3(1, 2, 3)` or `num x`
    VarDecl {
        ty: Type,
        name: String,
        init: Option<Expr>,
    },
    /// `fun f(a, b) { ... }` or `fun f(a) => a * 2`
    FunDecl(FunDecl),
    /// `return expr`
    Return(Expr),
    /// `{ ... }`
    Block(Vec<Statement>),
    /// `x = e`, `x += e`, `v[2] *= e`
    Assign {
        name: String,
        index: Option<Expr>,
        /// `None` for plain `=`, otherwise the compound base operator.
        op: Option<BinaryOp>,
        value: Expr,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub is_lambda: bool,
    /// A lambda body is a single `Return` of its expression.
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    pub span: Span,
}
