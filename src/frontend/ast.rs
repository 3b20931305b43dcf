/// A well-formed source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub number: usize,
    pub statement: Statement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryOp {
    Load,
    Store,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mult,
    LShift,
    RShift,
}

/// Register fields hold the number after the `r` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    // load rA => rB | store rA => rB
    Memory { op: MemoryOp, source: usize, target: usize },
    LoadImmediate { constant: i64, target: usize },
    Arithmetic { op: ArithOp, left: usize, right: usize, target: usize },
    Output { constant: i64 },
    Nop,
}
