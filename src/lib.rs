//! Local register allocation for single-block ILOC programs.
//!
//! Source text is parsed into a symbolic block, renamed into virtual
//! registers annotated with next-use distances, then mapped onto a fixed
//! number of physical registers with spill code inserted where needed.

pub mod analysis;
pub mod backend;
pub mod driver;
pub mod error;
pub mod frontend;
pub mod ir;

pub use error::{Error, Result};
