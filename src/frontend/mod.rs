pub mod ast;
pub mod diagnostic;
pub mod parser;

pub use diagnostic::{Diagnostic, SyntaxCategory};
