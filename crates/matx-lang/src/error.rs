use serde::Serialize;

use crate::syntax::ast::Span;
use crate::types::Type;

/// Error codes prefixed by phase: L = lexer, P = parser, S = analyzer,
/// W = analyzer warning, R = evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCode {
    // Lexer
    L001, // unexpected character
    L002, // invalid number literal
    L003, // invalid operator

    // Parser
    P001, // unexpected token
    P002, // missing expected token
    P003, // malformed parameter list
    P004, // nesting too deep
    P005, // expression expected

    // Analyzer
    S001, // undefined symbol
    S002, // type mismatch
    S003, // redeclaration in same scope
    S004, // wrong argument count
    S005, // operator undefined for operand types
    S006, // no matching constructor
    S007, // invalid index
    S008, // duplicate return in scope
    S009, // missing return
    S010, // return inside a bare block
    S011, // non-numeric root result
    S012, // shadows a library symbol
    S013, // increment/decrement of a non-variable
    S014, // duplicate parameter name
    S015, // recursive call
    S016, // assignment to a library field

    // Analyzer warnings
    W001, // function never called
    W002, // unreachable statement after return

    // Evaluator
    R001, // index out of range
    R002, // call depth exceeded
    R003, // uninitialized variable
    R004, // arithmetic error
    R005, // unresolved symbol or mistyped value at runtime
    R006, // scope finished without a return value
}

impl ErrorCode {
    pub fn is_error(&self) -> bool {
        !matches!(self, Self::W001 | Self::W002)
    }

    pub fn stage(&self) -> Stage {
        match self.as_str().as_bytes()[0] {
            b'L' => Stage::Lexer,
            b'P' => Stage::Parser,
            b'R' => Stage::Evaluator,
            _ => Stage::Analyzer,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L001 => "L001",
            Self::L002 => "L002",
            Self::L003 => "L003",
            Self::P001 => "P001",
            Self::P002 => "P002",
            Self::P003 => "P003",
            Self::P004 => "P004",
            Self::P005 => "P005",
            Self::S001 => "S001",
            Self::S002 => "S002",
            Self::S003 => "S003",
            Self::S004 => "S004",
            Self::S005 => "S005",
            Self::S006 => "S006",
            Self::S007 => "S007",
            Self::S008 => "S008",
            Self::S009 => "S009",
            Self::S010 => "S010",
            Self::S011 => "S011",
            Self::S012 => "S012",
            Self::S013 => "S013",
            Self::S014 => "S014",
            Self::S015 => "S015",
            Self::S016 => "S016",
            Self::W001 => "W001",
            Self::W002 => "W002",
            Self::R001 => "R001",
            Self::R002 => "R002",
            Self::R003 => "R003",
            Self::R004 => "R004",
            Self::R005 => "R005",
            Self::R006 => "R006",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Lexer,
    Parser,
    Analyzer,
    Evaluator,
}

// ─── Diagnostic ───────────────────────────────────────────────────────────────

/// One problem found by any stage, with a start/end range suitable for
/// underlining the offending source.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("[{code}] {line}:{column} {message}")]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub stage: Stage,
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl Diagnostic {
    pub fn new(code: ErrorCode, span: Span, message: impl Into<String>) -> Self {
        Self {
            code,
            stage: code.stage(),
            message: message.into(),
            line: span.line,
            column: span.column,
            end_line: span.end_line,
            end_column: span.end_column,
        }
    }

    pub fn is_error(&self) -> bool {
        self.code.is_error()
    }
}

// ─── Value-level failures ─────────────────────────────────────────────────────

/// Failure raised by an operator, constructor or library kernel. Carries no
/// position; the evaluator attaches the span of the expression being computed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MathError {
    #[error("integer overflow")]
    Overflow,
    #[error("division by zero")]
    DivisionByZero,
    #[error("negative exponent {0} in integer power")]
    NegativeExponent(i64),
    #[error("shift amount {0} out of range 0..=63")]
    ShiftRange(i64),
    #[error("result `{0}` is not a finite number")]
    NonFinite(f64),
    #[error("{0}")]
    Domain(String),
    #[error("`{op}` is not defined for {lhs} and {rhs}")]
    Operands { op: &'static str, lhs: Type, rhs: Type },
}
