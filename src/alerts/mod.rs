pub mod conditions;
pub mod evaluator;
pub mod notify;
pub mod targets;
