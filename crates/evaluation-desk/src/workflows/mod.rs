pub mod catalog;
pub mod evaluations;
