//! Local register allocator for a single renamed block.
//!
//! One forward pass. Sources are resolved first (restoring spilled values),
//! registers whose value dies at the instruction are released, then the
//! destination gets a register. When no register is free the occupant whose
//! next use is furthest away is spilled to memory. Spill and restore code is
//! spliced in directly before the instruction that needed it and goes through
//! the scratch register, which never holds a program value.

use crate::error::BackendError;
use crate::ir::{
    Block, InstrId, Instruction, NextUse, Opcode, Operand, PhysicalRegister, VirtualRegister,
    DEF_SLOT,
};
use std::cmp::Reverse;

/// Address of the first spill slot. Memory from here up belongs to the
/// allocator: a program that stores into it can have the value overwritten
/// by spill code, and nothing reports it.
pub const SPILL_BASE: i64 = 32768;
pub const SPILL_SLOT_SIZE: i64 = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocationStats {
    pub spills: usize,
    pub restores: usize,
    /// Instructions added to the block.
    pub inserted: usize,
}

pub struct LocalAllocator {
    scratch: PhysicalRegister,
    virtual_to_physical: Vec<Option<PhysicalRegister>>,
    /// One entry per allocatable register; the scratch register has none.
    physical_to_virtual: Vec<Option<VirtualRegister>>,
    virtual_to_spill: Vec<Option<i64>>,
    physical_next_use: Vec<NextUse>,
    next_spill_slot: i64,
    stats: AllocationStats,
}

/// `None` sorts after every real position.
fn distance(next_use: NextUse) -> usize {
    next_use.unwrap_or(usize::MAX)
}

/// `registers` counts every physical register, including the one kept back
/// for spill code, so at least two are needed.
pub fn check_registers(registers: usize) -> Result<(), BackendError> {
    if registers < 2 {
        return Err(BackendError::TooFewRegisters(registers));
    }
    Ok(())
}

impl LocalAllocator {
    pub fn new(registers: usize, virtual_count: usize) -> Result<Self, BackendError> {
        check_registers(registers)?;
        let allocatable = registers - 1;

        Ok(Self {
            scratch: PhysicalRegister { id: allocatable },
            virtual_to_physical: vec![None; virtual_count],
            physical_to_virtual: vec![None; allocatable],
            virtual_to_spill: vec![None; virtual_count],
            physical_next_use: vec![None; allocatable],
            next_spill_slot: SPILL_BASE,
            stats: AllocationStats::default(),
        })
    }

    pub fn scratch(&self) -> PhysicalRegister {
        self.scratch
    }

    pub fn allocate(mut self, block: &mut Block) -> Result<AllocationStats, BackendError> {
        let mut cursor = block.first();

        while let Some(id) = cursor {
            self.allocate_instruction(block, id)?;
            // code inserted before `id` is never visited
            cursor = block.next(id);
        }

        log::debug!(
            "allocated {} physical register(s): {} spill(s), {} restore(s)",
            self.physical_to_virtual.len(),
            self.stats.spills,
            self.stats.restores
        );
        Ok(self.stats)
    }

    fn allocate_instruction(&mut self, block: &mut Block, at: InstrId) -> Result<(), BackendError> {
        let mut instr = block[at].clone();
        let opcode = instr.opcode;
        let line = instr.line;
        log::trace!("allocating `{}` (line {:?})", opcode, line);

        // Registers holding this instruction's sources must survive until it runs.
        let mut pinned: Vec<PhysicalRegister> = Vec::with_capacity(2);
        let mut dying: Vec<VirtualRegister> = Vec::with_capacity(2);

        for &slot in opcode.use_slots() {
            let operand = instr.operands[slot]
                .as_mut()
                .ok_or(BackendError::MissingRegister {
                    opcode,
                    slot,
                    field: "source",
                    line,
                })?;
            let vr = self.virtual_of(operand, opcode, slot, line)?;

            let pr = if let Some(address) = self.virtual_to_spill[vr.id] {
                self.restore(block, at, vr, address, &pinned, opcode, line)?
            } else if let Some(pr) = self.virtual_to_physical[vr.id] {
                pr
            } else {
                // live into the block
                let pr = self.obtain(block, at, &pinned, opcode, line)?;
                self.bind(vr, pr);
                pr
            };

            operand.physical = Some(pr);
            self.physical_next_use[pr.id] = operand.next_use;
            pinned.push(pr);
            if operand.next_use.is_none() {
                dying.push(vr);
            }
        }

        // A source dying here frees its register for the destination.
        for vr in dying {
            self.release(vr);
        }

        if opcode.defines() {
            let operand = instr.operands[DEF_SLOT]
                .as_mut()
                .ok_or(BackendError::MissingRegister {
                    opcode,
                    slot: DEF_SLOT,
                    field: "destination",
                    line,
                })?;
            let vr = self.virtual_of(operand, opcode, DEF_SLOT, line)?;

            let pr = self.obtain(block, at, &[], opcode, line)?;
            self.bind(vr, pr);
            operand.physical = Some(pr);
            self.physical_next_use[pr.id] = operand.next_use;

            if operand.next_use.is_none() {
                self.release(vr);
            }
        }

        block[at] = instr;
        Ok(())
    }

    /// A free allocatable register, spilling one if none is free.
    fn obtain(
        &mut self,
        block: &mut Block,
        at: InstrId,
        pinned: &[PhysicalRegister],
        opcode: Opcode,
        line: Option<usize>,
    ) -> Result<PhysicalRegister, BackendError> {
        match self.physical_to_virtual.iter().position(Option::is_none) {
            Some(id) => Ok(PhysicalRegister { id }),
            None => self.spill(block, at, pinned, opcode, line),
        }
    }

    /*
     * Evicts the unpinned register whose occupant is needed furthest in the
     * future, lowest register number on ties:
     *
     *   loadI <slot> => scratch
     *   store victim => scratch
     */
    fn spill(
        &mut self,
        block: &mut Block,
        at: InstrId,
        pinned: &[PhysicalRegister],
        opcode: Opcode,
        line: Option<usize>,
    ) -> Result<PhysicalRegister, BackendError> {
        let victim = (0..self.physical_to_virtual.len())
            .map(|id| PhysicalRegister { id })
            .filter(|pr| !pinned.contains(pr))
            .max_by_key(|pr| (distance(self.physical_next_use[pr.id]), Reverse(pr.id)))
            .ok_or(BackendError::RegisterPressure { opcode, line })?;

        let Some(vr) = self.physical_to_virtual[victim.id] else {
            return Ok(victim);
        };

        let address = self.next_spill_slot;
        self.next_spill_slot += SPILL_SLOT_SIZE;

        let value = Operand {
            virtual_reg: Some(vr),
            physical: Some(victim),
            ..Operand::default()
        };
        block.insert_before(
            at,
            Instruction::load_immediate(address, Operand::physical(self.scratch)),
        );
        block.insert_before(at, Instruction::store(value, Operand::physical(self.scratch)));

        self.virtual_to_spill[vr.id] = Some(address);
        self.release(vr);
        self.stats.spills += 1;
        self.stats.inserted += 2;

        log::debug!("spilled r{} from r{} to {}", vr.id, victim.id, address);
        Ok(victim)
    }

    /*
     * Reloads a spilled value into a fresh register:
     *
     *   loadI <slot> => scratch
     *   load scratch => pr
     */
    #[allow(clippy::too_many_arguments)]
    fn restore(
        &mut self,
        block: &mut Block,
        at: InstrId,
        vr: VirtualRegister,
        address: i64,
        pinned: &[PhysicalRegister],
        opcode: Opcode,
        line: Option<usize>,
    ) -> Result<PhysicalRegister, BackendError> {
        let pr = self.obtain(block, at, pinned, opcode, line)?;

        let target = Operand {
            virtual_reg: Some(vr),
            physical: Some(pr),
            ..Operand::default()
        };
        block.insert_before(
            at,
            Instruction::load_immediate(address, Operand::physical(self.scratch)),
        );
        block.insert_before(at, Instruction::load(Operand::physical(self.scratch), target));

        self.virtual_to_spill[vr.id] = None;
        self.bind(vr, pr);
        self.stats.restores += 1;
        self.stats.inserted += 2;

        log::debug!("restored r{} from {} into r{}", vr.id, address, pr.id);
        Ok(pr)
    }

    fn bind(&mut self, vr: VirtualRegister, pr: PhysicalRegister) {
        self.virtual_to_physical[vr.id] = Some(pr);
        self.physical_to_virtual[pr.id] = Some(vr);
    }

    fn release(&mut self, vr: VirtualRegister) {
        if let Some(pr) = self.virtual_to_physical[vr.id].take() {
            self.physical_to_virtual[pr.id] = None;
            self.physical_next_use[pr.id] = None;
        }
    }

    fn virtual_of(
        &self,
        operand: &Operand,
        opcode: Opcode,
        slot: usize,
        line: Option<usize>,
    ) -> Result<VirtualRegister, BackendError> {
        let vr = operand.virtual_reg.ok_or(BackendError::MissingRegister {
            opcode,
            slot,
            field: "virtual",
            line,
        })?;

        if vr.id >= self.virtual_to_physical.len() {
            return Err(BackendError::VirtualOutOfRange {
                register: vr.id,
                count: self.virtual_to_physical.len(),
            });
        }
        Ok(vr)
    }
}
