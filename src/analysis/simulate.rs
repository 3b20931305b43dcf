use crate::backend::regalloc::SPILL_BASE;
use crate::error::SimulationError;
use crate::ir::{Block, Instruction, Opcode, RegisterView, DEF_SLOT};
use std::collections::{BTreeMap, HashMap};

/// What a block left behind: every `output` value in order, and every word
/// of memory written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trace {
    pub outputs: Vec<i64>,
    pub memory: BTreeMap<i64, i64>,
}

impl Trace {
    /// Memory below the spill area, the part the program itself can observe.
    /// Program stores at or above `SPILL_BASE` are dropped here too, so a
    /// value clobbered by spill code does not show up in a comparison.
    pub fn user_memory(&self) -> BTreeMap<i64, i64> {
        self.memory
            .iter()
            .filter(|(&address, _)| address < SPILL_BASE)
            .map(|(&address, &value)| (address, value))
            .collect()
    }
}

struct Machine {
    view: RegisterView,
    registers: HashMap<usize, i64>,
    memory: BTreeMap<i64, i64>,
    outputs: Vec<i64>,
}

impl Machine {
    fn read(&self, instr: &Instruction, slot: usize) -> Result<i64, SimulationError> {
        let register = self.register(instr, slot)?;
        self.registers
            .get(&register)
            .copied()
            .ok_or(SimulationError::UninitialisedRegister {
                opcode: instr.opcode,
                register,
            })
    }

    fn write(&mut self, instr: &Instruction, value: i64) -> Result<(), SimulationError> {
        let register = self.register(instr, DEF_SLOT)?;
        self.registers.insert(register, value);
        Ok(())
    }

    fn register(&self, instr: &Instruction, slot: usize) -> Result<usize, SimulationError> {
        instr.operands[slot]
            .and_then(|operand| operand.register(self.view))
            .ok_or(SimulationError::MissingRegister {
                opcode: instr.opcode,
                slot,
            })
    }

    fn memory_at(&self, address: i64) -> i64 {
        self.memory.get(&address).copied().unwrap_or(0)
    }

    fn step(&mut self, instr: &Instruction) -> Result<(), SimulationError> {
        let constant = || {
            instr
                .constant
                .ok_or(SimulationError::MissingConstant { opcode: instr.opcode })
        };

        match instr.opcode {
            Opcode::Load => {
                let address = self.read(instr, 0)?;
                let value = self.memory_at(address);
                self.write(instr, value)?;
            }

            Opcode::Store => {
                let address = self.read(instr, 0)?;
                let value = self.read(instr, 1)?;
                self.memory.insert(address, value);
            }

            Opcode::LoadImmediate => self.write(instr, constant()?)?,

            Opcode::Add | Opcode::Sub | Opcode::Mult | Opcode::LShift | Opcode::RShift => {
                let left = self.read(instr, 0)?;
                let right = self.read(instr, 1)?;
                let result = match instr.opcode {
                    Opcode::Add => left.wrapping_add(right),
                    Opcode::Sub => left.wrapping_sub(right),
                    Opcode::Mult => left.wrapping_mul(right),
                    // shift amounts are taken modulo 64
                    Opcode::LShift => left.wrapping_shl(right as u32),
                    _ => left.wrapping_shr(right as u32),
                };
                self.write(instr, result)?;
            }

            Opcode::Output => {
                let value = self.memory_at(constant()?);
                self.outputs.push(value);
            }

            Opcode::Nop => {}
        }

        Ok(())
    }
}

/// Executes `block` on a machine with unbounded registers named by `view`
/// and zero-initialised memory.
pub fn run(block: &Block, view: RegisterView) -> Result<Trace, SimulationError> {
    let mut machine = Machine {
        view,
        registers: HashMap::new(),
        memory: BTreeMap::new(),
        outputs: Vec::new(),
    };

    for instr in block {
        machine.step(instr)?;
    }

    log::debug!(
        "simulated {} instruction(s), {} output(s), {} word(s) written",
        block.len(),
        machine.outputs.len(),
        machine.memory.len()
    );

    Ok(Trace {
        outputs: machine.outputs,
        memory: machine.memory,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser;
    use crate::ir::lower::lower;

    fn simulate(source: &str) -> Result<Trace, SimulationError> {
        let lowered = lower(&parser::parse(source).unwrap());
        run(&lowered.block, RegisterView::Symbolic)
    }

    #[test]
    fn test_arithmetic_and_output() {
        let trace = simulate(
            "\
loadI 1024 => r0
loadI 6 => r1
loadI 7 => r2
mult r1, r2 => r3
sub r3, r1 => r4
store r4 => r0
output 1024
",
        )
        .unwrap();

        assert_eq!(trace.outputs, vec![36]);
        assert_eq!(trace.memory, BTreeMap::from([(1024, 36)]));
    }

    #[test]
    fn test_shifts_and_unwritten_memory() {
        let trace = simulate(
            "\
loadI 1 => r0
loadI 65 => r1
lshift r0, r1 => r2
loadI 0 => r5
loadI 8 => r8
sub r5, r8 => r3
rshift r3, r0 => r4
store r2 => r5
loadI 4 => r6
store r4 => r6
load r6 => r7
output 0
output 4
output 8
",
        )
        .unwrap();

        // 65 is masked to 1, and rshift keeps the sign
        assert_eq!(trace.outputs, vec![2, -4, 0]);
    }

    #[test]
    fn test_overflow_wraps() {
        let trace = simulate(
            "\
loadI 9223372036854775807 => r0
loadI 1 => r1
add r0, r1 => r2
loadI 0 => r3
store r2 => r3
output 0
",
        )
        .unwrap();

        assert_eq!(trace.outputs, vec![i64::MIN]);
    }

    #[test]
    fn test_uninitialised_register() {
        let err = simulate("loadI 4 => r1\nadd r1, r2 => r3\n").unwrap_err();
        assert_eq!(
            err,
            SimulationError::UninitialisedRegister {
                opcode: Opcode::Add,
                register: 2,
            }
        );
    }

    #[test]
    fn test_user_memory_hides_spill_area() {
        let trace = Trace {
            outputs: Vec::new(),
            memory: BTreeMap::from([(0, 1), (32764, 2), (SPILL_BASE, 3), (SPILL_BASE + 4, 4)]),
        };

        assert_eq!(trace.user_memory(), BTreeMap::from([(0, 1), (32764, 2)]));
    }
}
