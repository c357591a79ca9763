use crate::error::{Diagnostic, ErrorCode};
use crate::syntax::ast::Span;
use crate::syntax::token::{Token, TokenKind, is_operator_prefix, keyword_or_name, operator_kind};

const OPERATOR_CHARS: &str = ":,+-*/><!=|&^~%()[]{}";

pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    /// Open `(` / `[` count; line breaks inside a group never end a statement.
    groups: usize,
    tokens: Vec<Token>,
    errors: Vec<Diagnostic>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        let mut normalized = source.replace("\r\n", "\n").replace('\r', "\n");
        normalized.push('\n');
        Self {
            source: normalized.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            groups: 0,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, Vec<Diagnostic>> {
        while let Some(ch) = self.peek() {
            match ch {
                ' ' | '\t' => { self.advance(); }
                '\n' => {
                    self.line_break();
                    self.advance();
                }
                ';' => {
                    self.push(TokenKind::End, self.line, self.column, 1);
                    self.groups = 0;
                    self.advance();
                }
                '#' => self.read_comment(),
                c if c.is_ascii_digit() => self.read_number(),
                c if c.is_ascii_alphabetic() || c == '_' => self.read_name(),
                c if OPERATOR_CHARS.contains(c) => self.read_operator(),
                other => {
                    let span = Span::point(self.line, self.column);
                    self.errors.push(Diagnostic::new(ErrorCode::L001, span,
                        format!("unexpected character `{other}`")));
                    self.advance();
                }
            }
        }

        if !matches!(self.tokens.last(), Some(Token { kind: TokenKind::End, .. })) {
            self.push(TokenKind::End, self.line, self.column, 0);
        }

        if self.errors.is_empty() { Ok(self.tokens) } else { Err(self.errors) }
    }

    // ─── Primitives ──────────────────────────────────────────────────────────

    fn advance(&mut self) -> char {
        let ch = self.source[self.pos];
        self.pos += 1;
        if ch == '\n' { self.line += 1; self.column = 1; }
        else { self.column += 1; }
        ch
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn push(&mut self, kind: TokenKind, line: usize, column: usize, width: usize) {
        match kind {
            TokenKind::LParen | TokenKind::LBracket => self.groups += 1,
            TokenKind::RParen | TokenKind::RBracket => self.groups = self.groups.saturating_sub(1),
            TokenKind::LBrace | TokenKind::RBrace => self.groups = 0,
            _ => {}
        }
        self.tokens.push(Token::new(kind, line, column, width));
    }

    /// A line break ends the statement when the previous significant token
    /// can close an expression and no bracket group is open.
    fn line_break(&mut self) {
        if self.groups > 0 {
            return;
        }
        let last = self.tokens.iter().rev().find(|t| !matches!(t.kind, TokenKind::Comment(_)));
        if last.is_some_and(|t| t.kind.can_end_expression()) {
            self.push(TokenKind::End, self.line, self.column, 0);
        }
    }

    /// Grows a buffer while `accept(buffer, next)` holds; returns the buffer
    /// with its starting position.
    fn take_while(&mut self, accept: impl Fn(&str, char) -> bool) -> (String, usize, usize) {
        let (line, column) = (self.line, self.column);
        let mut buffer = String::new();
        while let Some(ch) = self.peek() {
            if !accept(&buffer, ch) { break; }
            buffer.push(self.advance());
        }
        (buffer, line, column)
    }

    // ─── Readers ─────────────────────────────────────────────────────────────

    fn read_name(&mut self) {
        let (buffer, line, column) =
            self.take_while(|_, c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
        let width = buffer.chars().count();
        self.push(keyword_or_name(buffer), line, column, width);
    }

    fn read_number(&mut self) {
        let (buffer, line, column) = self.take_while(|_, c| c.is_ascii_digit() || c == '.');
        let width = buffer.chars().count();
        match buffer.parse::<f64>() {
            Ok(value) => self.push(TokenKind::Number(value), line, column, width),
            Err(_) => {
                let span = Span::new(line, column, line, column + width - 1);
                self.errors.push(Diagnostic::new(ErrorCode::L002, span,
                    format!("invalid number `{buffer}`")));
            }
        }
    }

    fn read_operator(&mut self) {
        let (buffer, line, column) = self.take_while(|buf, c| {
            if !OPERATOR_CHARS.contains(c) { return false; }
            let mut candidate = buf.to_string();
            candidate.push(c);
            is_operator_prefix(&candidate)
        });
        let width = buffer.chars().count();
        match operator_kind(&buffer) {
            Some(kind) => self.push(kind, line, column, width),
            None => {
                let span = Span::new(line, column, line, column + width.max(1) - 1);
                self.errors.push(Diagnostic::new(ErrorCode::L003, span,
                    format!("invalid operator `{buffer}`")));
                if buffer.is_empty() {
                    self.advance();
                }
            }
        }
    }

    fn read_comment(&mut self) {
        let (line, column) = (self.line, self.column);
        self.advance(); // #
        let (text, _, _) = self.take_while(|_, c| c != '\n');
        let width = text.chars().count() + 1;
        self.push(TokenKind::Comment(text), line, column, width);
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
