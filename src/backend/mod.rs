pub mod generator;
pub mod regalloc;
pub mod rename;

use crate::error::BackendError;
use crate::ir::lower::LoweredBlock;
use crate::ir::Block;

pub use regalloc::{AllocationStats, LocalAllocator};
pub use rename::Renamer;

#[derive(Debug, Clone)]
pub struct Renamed {
    pub block: Block,
    pub virtual_count: usize,
}

#[derive(Debug, Clone)]
pub struct Allocated {
    pub block: Block,
    pub virtual_count: usize,
    pub stats: AllocationStats,
}

pub fn rename(lowered: LoweredBlock) -> Result<Renamed, BackendError> {
    let mut block = lowered.block;
    let virtual_count = Renamer::new(lowered.symbolic_count).rename(&mut block)?;
    Ok(Renamed { block, virtual_count })
}

/// Renames `lowered` and maps it onto `registers` physical registers, the
/// last of which is reserved for spill code.
pub fn compile(lowered: LoweredBlock, registers: usize) -> Result<Allocated, BackendError> {
    regalloc::check_registers(registers)?;

    let Renamed { mut block, virtual_count } = rename(lowered)?;
    let stats = LocalAllocator::new(registers, virtual_count)?.allocate(&mut block)?;

    Ok(Allocated {
        block,
        virtual_count,
        stats,
    })
}
