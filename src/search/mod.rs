pub mod engine;
pub mod results;
pub mod trec;
