use serde::Deserialize;

pub const DEFAULT_MAX_NESTING_DEPTH: usize = 128;
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// Resource limits for one compilation and evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Deepest nesting of expressions and blocks the parser accepts.
    pub max_nesting_depth: usize,
    /// Deepest chain of active function calls the evaluator allows.
    pub max_call_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}
