//! Renames symbolic registers into dense virtual registers.
//!
//! A single backward walk over the block. Each definition closes the live
//! range that later uses opened, so every redefinition of a symbolic register
//! starts a new virtual register. Every operand also records the position of
//! the next instruction that reads its value.

use crate::error::BackendError;
use crate::ir::{Block, Instruction, NextUse, Opcode, Operand, VirtualRegister, DEF_SLOT};

pub struct Renamer {
    /// Virtual register of the open live range of each symbolic register.
    symbolic_to_virtual: Vec<Option<VirtualRegister>>,
    /// Position of the nearest later use of each symbolic register.
    last_use: Vec<NextUse>,
    next_virtual: usize,
}

impl Renamer {
    /// `symbolic_count` is the number of dense symbolic ids lowering
    /// assigned, so tables stay proportional to the block.
    pub fn new(symbolic_count: usize) -> Self {
        Self {
            symbolic_to_virtual: vec![None; symbolic_count],
            last_use: vec![None; symbolic_count],
            next_virtual: 0,
        }
    }

    /// Annotates every register operand of `block` in place and returns the
    /// number of virtual registers created.
    pub fn rename(mut self, block: &mut Block) -> Result<usize, BackendError> {
        let mut cursor = block.last();
        let mut index = block.len();

        while let Some(id) = cursor {
            index -= 1;
            self.rename_instruction(&mut block[id], index)?;
            cursor = block.prev(id);
        }

        log::debug!(
            "renamed {} instruction(s) into {} virtual register(s)",
            block.len(),
            self.next_virtual
        );
        Ok(self.next_virtual)
    }

    fn rename_instruction(&mut self, instr: &mut Instruction, index: usize) -> Result<(), BackendError> {
        if instr.opcode.defines() {
            let opcode = instr.opcode;
            let line = instr.line;
            let operand = instr.operands[DEF_SLOT]
                .as_mut()
                .ok_or(BackendError::MissingRegister {
                    opcode,
                    slot: DEF_SLOT,
                    field: "destination",
                    line,
                })?;
            let sr = self.symbolic_index(operand, opcode, DEF_SLOT, line)?;

            let vr = self.open(sr);
            operand.virtual_reg = Some(vr);
            operand.next_use = self.last_use[sr];

            // Going backward, the definition is where this live range starts.
            self.symbolic_to_virtual[sr] = None;
            self.last_use[sr] = None;
        }

        // Both sources of `add r1, r1 => r2` see the same later use, so
        // last_use is only advanced once all uses are annotated.
        let mut used = [None; 2];
        for (n, &slot) in instr.opcode.use_slots().iter().enumerate() {
            let opcode = instr.opcode;
            let line = instr.line;
            let operand = instr.operands[slot]
                .as_mut()
                .ok_or(BackendError::MissingRegister {
                    opcode,
                    slot,
                    field: "source",
                    line,
                })?;
            let sr = self.symbolic_index(operand, opcode, slot, line)?;

            operand.virtual_reg = Some(self.open(sr));
            operand.next_use = self.last_use[sr];
            used[n] = Some(sr);
        }

        for sr in used.into_iter().flatten() {
            self.last_use[sr] = Some(index);
        }

        Ok(())
    }

    /// The pending virtual register for `sr`, creating one if none is open.
    fn open(&mut self, sr: usize) -> VirtualRegister {
        if let Some(vr) = self.symbolic_to_virtual[sr] {
            return vr;
        }

        let vr = VirtualRegister { id: self.next_virtual };
        self.next_virtual += 1;
        self.symbolic_to_virtual[sr] = Some(vr);
        vr
    }

    fn symbolic_index(
        &self,
        operand: &Operand,
        opcode: Opcode,
        slot: usize,
        line: Option<usize>,
    ) -> Result<usize, BackendError> {
        let sr = operand.symbolic.ok_or(BackendError::MissingRegister {
            opcode,
            slot,
            field: "symbolic",
            line,
        })?;

        if sr.id >= self.symbolic_to_virtual.len() {
            return Err(BackendError::SymbolicOutOfRange {
                register: sr.name,
                id: sr.id,
                count: self.symbolic_to_virtual.len(),
            });
        }
        Ok(sr.id)
    }
}
