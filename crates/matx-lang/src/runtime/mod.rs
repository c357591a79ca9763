pub mod evaluator;
pub mod value;
