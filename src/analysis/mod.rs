pub mod analyzer;
pub mod filters;
pub mod token;
pub mod tokenizer;
