use crate::frontend::Diagnostic;
use crate::ir::Opcode;
use std::path::PathBuf;
use thiserror::Error;

/// Failures of the renamer, allocator and text generator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Fewer than two physical registers leaves nothing once the scratch
    /// register is reserved.
    #[error("need at least 2 physical registers (one is reserved for spill code), got {0}")]
    TooFewRegisters(usize),

    #[error("symbolic register r{register} has index {id}, outside the {count} assigned when lowering")]
    SymbolicOutOfRange { register: usize, id: usize, count: usize },

    #[error("virtual register r{register} is outside the {count} produced by renaming")]
    VirtualOutOfRange { register: usize, count: usize },

    /// An operand reached a pass without the field the previous pass should
    /// have filled in.
    #[error("`{opcode}` operand {slot} has no {field} register{}", line_suffix(.line))]
    MissingRegister {
        opcode: Opcode,
        slot: usize,
        field: &'static str,
        line: Option<usize>,
    },

    #[error("`{opcode}` has no constant{}", line_suffix(.line))]
    MissingConstant { opcode: Opcode, line: Option<usize> },

    #[error("failed to format block: {0}")]
    Format(#[from] std::fmt::Error),

    /// Every allocatable register already holds a source of the instruction.
    #[error("no register can be evicted for `{opcode}`{}", line_suffix(.line))]
    RegisterPressure { opcode: Opcode, line: Option<usize> },
}

fn line_suffix(line: &Option<usize>) -> String {
    match line {
        Some(line) => format!(" on line {}", line),
        None => String::new(),
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimulationError {
    #[error("`{opcode}` reads r{register} before anything was written to it")]
    UninitialisedRegister { opcode: Opcode, register: usize },

    #[error("`{opcode}` operand {slot} has no register in this view")]
    MissingRegister { opcode: Opcode, slot: usize },

    #[error("`{opcode}` has no constant")]
    MissingConstant { opcode: Opcode },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} line(s) with syntax errors", .0.len())]
    Syntax(Vec<Diagnostic>),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
