pub mod checker;
pub mod scopes;

#[cfg(test)]
mod tests;

use crate::error::Diagnostic;
use crate::namespaces::LibraryRegistry;
use crate::syntax::ast::Statement;
use checker::Checker;
pub use scopes::{ScopeId, ScopeKind, ScopeTree};

// ─── Result ───────────────────────────────────────────────────────────────────

pub struct Analysis {
    pub scopes: ScopeTree,
    pub warnings: Vec<Diagnostic>,
}

// ─── Entry point ─────────────────────────────────────────────────────────────

/// Builds the scope tree for `statements` and type-checks every reachable
/// expression. Library symbols resolve at the root, after local lookup.
///
/// Returns `Ok(Analysis)` if there are no errors, `Err(errors)` otherwise.
pub fn analyze(statements: &[Statement], libraries: &LibraryRegistry) -> Result<Analysis, Vec<Diagnostic>> {
    let (scopes, diagnostics) = Checker::new(libraries).run(statements);

    let (errors, warnings): (Vec<_>, Vec<_>) = diagnostics
        .into_iter()
        .partition(|d| d.is_error());

    if errors.is_empty() {
        Ok(Analysis { scopes, warnings })
    } else {
        Err(errors)
    }
}
