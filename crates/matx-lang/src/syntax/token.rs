use serde::Serialize;

use crate::types::Type;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TokenKind {
    // Literals
    Number(f64),
    Name(String),
    Comment(String),

    /// Statement terminator: `;`, an implicit line break, or end of input.
    End,

    // Keywords
    Fun,
    Return,
    True,
    False,

    // Type keywords
    TInt,
    TNum,
    TBool,
    TVec2,
    TVec3,
    TVec4,
    TMat3,
    TMat4,
    TQuat,

    // Arithmetic
    Plus,       // +
    Minus,      // -
    Percent,    // %
    Star,       // *
    Slash,      // /
    SlashSlash, // //
    StarStar,   // **
    PlusPlus,   // ++
    MinusMinus, // --

    // Bitwise
    Caret,      // ^
    Pipe,       // |
    Amp,        // &
    Tilde,      // ~
    LtLt,       // <<
    GtGt,       // >>

    // Assignment
    Eq,           // =
    PlusEq,       // +=
    MinusEq,      // -=
    PercentEq,    // %=
    StarEq,       // *=
    SlashEq,      // /=
    SlashSlashEq, // //=
    StarStarEq,   // **=
    CaretEq,      // ^=
    PipeEq,       // |=
    AmpEq,        // &=
    LtLtEq,       // <<=
    GtGtEq,       // >>=
    AmpAmpEq,     // &&=
    PipePipeEq,   // ||=

    // Comparison and logic
    EqEq,     // ==
    BangEq,   // !=
    Gt,       // >
    Lt,       // <
    GtEq,     // >=
    LtEq,     // <=
    AmpAmp,   // &&
    PipePipe, // ||
    Bang,     // !

    // Punctuation
    LParen,   // (
    RParen,   // )
    LBrace,   // {
    RBrace,   // }
    LBracket, // [
    RBracket, // ]
    Comma,    // ,
    Colon,    // :
    FatArrow, // =>
}

/// Every operator and punctuation spelling the lexer accepts. Each prefix of
/// an entry is itself an entry, so greedy matching never has to back off.
pub const OPERATORS: &[(&str, TokenKind)] = &[
    ("=", TokenKind::Eq),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("%", TokenKind::Percent),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("//", TokenKind::SlashSlash),
    ("**", TokenKind::StarStar),
    ("^", TokenKind::Caret),
    ("|", TokenKind::Pipe),
    ("&", TokenKind::Amp),
    ("~", TokenKind::Tilde),
    ("<<", TokenKind::LtLt),
    (">>", TokenKind::GtGt),
    ("++", TokenKind::PlusPlus),
    ("--", TokenKind::MinusMinus),
    ("+=", TokenKind::PlusEq),
    ("-=", TokenKind::MinusEq),
    ("%=", TokenKind::PercentEq),
    ("*=", TokenKind::StarEq),
    ("/=", TokenKind::SlashEq),
    ("//=", TokenKind::SlashSlashEq),
    ("**=", TokenKind::StarStarEq),
    ("^=", TokenKind::CaretEq),
    ("|=", TokenKind::PipeEq),
    ("&=", TokenKind::AmpEq),
    ("<<=", TokenKind::LtLtEq),
    (">>=", TokenKind::GtGtEq),
    ("&&=", TokenKind::AmpAmpEq),
    ("||=", TokenKind::PipePipeEq),
    ("==", TokenKind::EqEq),
    ("!=", TokenKind::BangEq),
    (">", TokenKind::Gt),
    ("<", TokenKind::Lt),
    (">=", TokenKind::GtEq),
    ("<=", TokenKind::LtEq),
    ("&&", TokenKind::AmpAmp),
    ("||", TokenKind::PipePipe),
    ("!", TokenKind::Bang),
    ("(", TokenKind::LParen),
    (")", TokenKind::RParen),
    ("{", TokenKind::LBrace),
    ("}", TokenKind::RBrace),
    ("[", TokenKind::LBracket),
    ("]", TokenKind::RBracket),
    (",", TokenKind::Comma),
    (":", TokenKind::Colon),
    ("=>", TokenKind::FatArrow),
];

pub fn operator_kind(s: &str) -> Option<TokenKind> {
    OPERATORS.iter().find(|(text, _)| *text == s).map(|(_, kind)| kind.clone())
}

pub fn is_operator_prefix(s: &str) -> bool {
    OPERATORS.iter().any(|(text, _)| text.starts_with(s))
}

/// Maps a name buffer to its keyword token, or returns `Name`.
pub fn keyword_or_name(s: String) -> TokenKind {
    match s.as_str() {
        "fun"    => TokenKind::Fun,
        "return" => TokenKind::Return,
        "true"   => TokenKind::True,
        "false"  => TokenKind::False,
        "int"    => TokenKind::TInt,
        "num"    => TokenKind::TNum,
        "bool"   => TokenKind::TBool,
        "vec2"   => TokenKind::TVec2,
        "vec3"   => TokenKind::TVec3,
        "vec4"   => TokenKind::TVec4,
        "mat3"   => TokenKind::TMat3,
        "mat4"   => TokenKind::TMat4,
        "quat"   => TokenKind::TQuat,
        _        => TokenKind::Name(s),
    }
}

impl TokenKind {
    /// The value type a type keyword names.
    pub fn as_type(&self) -> Option<Type> {
        Some(match self {
            Self::TInt  => Type::Int,
            Self::TNum  => Type::Num,
            Self::TBool => Type::Bool,
            Self::TVec2 => Type::Vec2,
            Self::TVec3 => Type::Vec3,
            Self::TVec4 => Type::Vec4,
            Self::TMat3 => Type::Mat3,
            Self::TMat4 => Type::Mat4,
            Self::TQuat => Type::Quat,
            _ => return None,
        })
    }

    pub fn is_type_keyword(&self) -> bool {
        self.as_type().is_some()
    }

    /// Prefix-legal unary operators.
    pub fn is_unary_candidate(&self) -> bool {
        matches!(self, Self::Plus | Self::Minus | Self::Tilde | Self::Bang | Self::PlusPlus | Self::MinusMinus)
    }

    pub fn is_postfix(&self) -> bool {
        matches!(self, Self::PlusPlus | Self::MinusMinus)
    }

    pub fn is_assignment(&self) -> bool {
        matches!(
            self,
            Self::Eq | Self::PlusEq | Self::MinusEq | Self::PercentEq | Self::StarEq | Self::SlashEq
            | Self::SlashSlashEq | Self::StarStarEq | Self::CaretEq | Self::PipeEq | Self::AmpEq
            | Self::LtLtEq | Self::GtGtEq | Self::AmpAmpEq | Self::PipePipeEq
        )
    }

    /// Whether a line break after this token may end the statement.
    pub fn can_end_expression(&self) -> bool {
        matches!(
            self,
            Self::Name(_) | Self::Number(_) | Self::True | Self::False
            | Self::RParen | Self::RBracket | Self::PlusPlus | Self::MinusMinus
        )
    }

    /// Source spelling, used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Name(n) => n.clone(),
            Self::Comment(_) => "comment".into(),
            Self::End => "end of statement".into(),
            Self::Fun => "fun".into(),
            Self::Return => "return".into(),
            Self::True => "true".into(),
            Self::False => "false".into(),
            other => {
                if let Some(ty) = other.as_type() {
                    return ty.to_string();
                }
                OPERATORS
                    .iter()
                    .find(|(_, kind)| kind == other)
                    .map(|(text, _)| (*text).to_string())
                    .unwrap_or_else(|| format!("{other:?}"))
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
    /// Number of source characters the token covers (0 for implicit end markers).
    pub width: usize,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, column: usize, width: usize) -> Self {
        Self { kind, line, column, width }
    }

    /// Column of the token's last character.
    pub fn end_column(&self) -> usize {
        self.column + self.width.max(1) - 1
    }
}
