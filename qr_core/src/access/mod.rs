pub mod dto;
pub mod evaluator;
