pub mod analysis;
pub mod config;
pub mod error;
pub mod namespaces;
pub mod runtime;
pub mod syntax;
pub mod types;

pub use config::Options;
pub use error::{Diagnostic, ErrorCode, MathError, Stage};
pub use namespaces::{EnvError, EnvNamespace, Export, ExportKind, LibraryInfo, LibraryProvider, LibraryRegistry};
pub use runtime::value::Value;
pub use syntax::token::{Token, TokenKind};
pub use types::Type;

use tracing::debug;

use crate::analysis::ScopeTree;
use crate::runtime::evaluator::Evaluator;
use crate::syntax::ast::Statement;
use crate::syntax::lexer::Lexer;
use crate::syntax::parser::Parser;

// ─── Public API types ─────────────────────────────────────────────────────────

/// An analyzed program. Produced by `compile`; holds no library state, so it
/// can be evaluated against any session whose libraries export the same
/// symbols.
pub struct Program {
    pub statements: Vec<Statement>,
    pub scopes: ScopeTree,
    /// Analyzer warnings (W codes). Errors never reach a `Program`.
    pub warnings: Vec<Diagnostic>,
}

impl Program {
    /// Type of the root `return`: `int` or `num`.
    pub fn result_type(&self) -> Option<Type> {
        self.scopes.root().result
    }
}

/// Library namespaces and limits shared by every compilation it performs.
#[derive(Default)]
pub struct Session {
    libraries: LibraryRegistry,
    options: Options,
}

// ─── Public API ───────────────────────────────────────────────────────────────

impl Session {
    pub fn new(libraries: LibraryRegistry, options: Options) -> Self {
        Self { libraries, options }
    }

    pub fn libraries(&self) -> &LibraryRegistry {
        &self.libraries
    }

    /// Register or replace namespaces (for example a populated `env`).
    pub fn libraries_mut(&mut self) -> &mut LibraryRegistry {
        &mut self.libraries
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn tokenize(&self, source: &str) -> Result<Vec<Token>, Vec<Diagnostic>> {
        let tokens = Lexer::new(source).tokenize()?;
        debug!(tokens = tokens.len(), "lexed");
        Ok(tokens)
    }

    pub fn parse(&self, source: &str) -> Result<Vec<Statement>, Vec<Diagnostic>> {
        let tokens = self.tokenize(source)?;
        let statements = Parser::new(tokens)
            .with_max_depth(self.options.max_nesting_depth)
            .parse()?;
        debug!(statements = statements.len(), "parsed");
        Ok(statements)
    }

    /// Lex, parse and analyze. Each stage runs only if the previous one
    /// produced no errors.
    pub fn compile(&self, source: &str) -> Result<Program, Vec<Diagnostic>> {
        let statements = self.parse(source)?;
        let analysis = analysis::analyze(&statements, &self.libraries)?;
        debug!(scopes = analysis.scopes.len(), warnings = analysis.warnings.len(), "analyzed");
        Ok(Program { statements, scopes: analysis.scopes, warnings: analysis.warnings })
    }

    pub fn evaluate(&self, program: &Program) -> Result<Value, Vec<Diagnostic>> {
        let value = Evaluator::new(&program.scopes, &self.libraries)
            .with_max_call_depth(self.options.max_call_depth)
            .evaluate(&program.statements)
            .map_err(|d| vec![d])?;
        debug!(result = %value, "evaluated");
        Ok(value)
    }

    /// Compile and evaluate `source`. The result is an `int` or `num` value.
    pub fn run(&self, source: &str) -> Result<Value, Vec<Diagnostic>> {
        let program = self.compile(source)?;
        self.evaluate(&program)
    }
}

/// `compile` with the standard libraries and default options.
pub fn compile(source: &str) -> Result<Program, Vec<Diagnostic>> {
    Session::default().compile(source)
}

/// `run` with the standard libraries and default options.
pub fn run(source: &str) -> Result<Value, Vec<Diagnostic>> {
    Session::default().run(source)
}
