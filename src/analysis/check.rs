use crate::ir::{Block, Opcode, PhysicalRegister, VirtualRegister};
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    Unassigned {
        position: usize,
        opcode: Opcode,
        slot: usize,
    },

    // A program value was placed in the register reserved for spill code.
    ScratchHoldsValue {
        position: usize,
        opcode: Opcode,
    },

    // A source reads a register that holds some other value at that point.
    Clobbered {
        position: usize,
        opcode: Opcode,
        register: PhysicalRegister,
        expected: VirtualRegister,
        found: Option<VirtualRegister>,
    },
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckError::Unassigned { position, opcode, slot } => {
                write!(f, "instruction {} (`{}`) operand {} has no physical register", position, opcode, slot)
            }

            CheckError::ScratchHoldsValue { position, opcode } => {
                write!(f, "instruction {} (`{}`) uses the scratch register for a program value", position, opcode)
            }

            CheckError::Clobbered { position, opcode, register, expected, found } => match found {
                Some(found) => write!(
                    f,
                    "instruction {} (`{}`) reads r{} expecting virtual r{} but it holds r{}",
                    position, opcode, register.id, expected.id, found.id
                ),
                None => write!(
                    f,
                    "instruction {} (`{}`) reads r{} expecting virtual r{} but it holds nothing",
                    position, opcode, register.id, expected.id
                ),
            },
        }
    }
}

/*
 * Checks an allocated block by tracking which virtual register each physical
 * register holds. Every source must find its own value in the register it
 * was given, which rules out two simultaneously live values sharing one.
 *
 * `registers` is the total register count, so r(registers - 1) is scratch.
 */
pub fn verify(block: &Block, registers: usize) -> Result<(), Vec<CheckError>> {
    let scratch = PhysicalRegister {
        id: registers.saturating_sub(1),
    };
    let mut errors = Vec::new();
    let mut holds: HashMap<PhysicalRegister, VirtualRegister> = HashMap::new();
    let mut seen: HashSet<VirtualRegister> = HashSet::new();

    for (position, instr) in block.iter().enumerate() {
        let opcode = instr.opcode;

        for &slot in opcode.use_slots() {
            let Some(operand) = instr.operands[slot] else {
                continue;
            };
            let Some(pr) = operand.physical else {
                errors.push(CheckError::Unassigned { position, opcode, slot });
                continue;
            };

            if pr == scratch {
                if !instr.is_synthesized() {
                    errors.push(CheckError::ScratchHoldsValue { position, opcode });
                }
                continue;
            }

            let Some(vr) = operand.virtual_reg else {
                continue;
            };

            match holds.get(&pr) {
                Some(&held) if held == vr => {}
                // first sight of a value live into the block
                None if !seen.contains(&vr) => {
                    holds.insert(pr, vr);
                    seen.insert(vr);
                }
                found => errors.push(CheckError::Clobbered {
                    position,
                    opcode,
                    register: pr,
                    expected: vr,
                    found: found.copied(),
                }),
            }
        }

        if let Some(def) = instr.definition() {
            let Some(pr) = def.physical else {
                errors.push(CheckError::Unassigned {
                    position,
                    opcode,
                    slot: crate::ir::DEF_SLOT,
                });
                continue;
            };

            if pr == scratch {
                if !instr.is_synthesized() {
                    errors.push(CheckError::ScratchHoldsValue { position, opcode });
                }
                continue;
            }

            match def.virtual_reg {
                Some(vr) => {
                    holds.insert(pr, vr);
                    seen.insert(vr);
                }
                None => {
                    holds.remove(&pr);
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
