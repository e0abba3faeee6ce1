pub mod ast;
pub mod daat;
pub mod eval;
pub mod expansion;
pub mod parser;
pub mod proximity;
pub mod result;
