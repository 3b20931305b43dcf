//! Checks run over a block after allocation: a register-level consistency
//! check and an interpreter for comparing a block before and after.

pub mod check;
pub mod simulate;

pub use check::{verify, CheckError};
pub use simulate::{run, Trace};
