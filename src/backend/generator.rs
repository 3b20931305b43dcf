use crate::error::BackendError;
use crate::ir::{Block, Instruction, Opcode, RegisterView, DEF_SLOT};
use std::fmt::Write;

/// Renders `block` as ILOC text, one instruction per line, naming registers
/// by the field `view` selects.
pub fn render(block: &Block, view: RegisterView) -> Result<String, BackendError> {
    let mut output = String::new();

    for instr in block {
        write_instruction(&mut output, instr, view)?;
    }

    Ok(output)
}

fn write_instruction(output: &mut String, instr: &Instruction, view: RegisterView) -> Result<(), BackendError> {
    let opcode = instr.opcode;

    match opcode {
        Opcode::Add | Opcode::Sub | Opcode::Mult | Opcode::LShift | Opcode::RShift => {
            let left = register(instr, 0, view)?;
            let right = register(instr, 1, view)?;
            let target = register(instr, DEF_SLOT, view)?;
            writeln!(output, "{} r{}, r{} => r{}", opcode, left, right, target)?;
        }

        Opcode::Load => {
            let address = register(instr, 0, view)?;
            let target = register(instr, DEF_SLOT, view)?;
            writeln!(output, "{} r{} => r{}", opcode, address, target)?;
        }

        // store rV => rA
        Opcode::Store => {
            let address = register(instr, 0, view)?;
            let value = register(instr, 1, view)?;
            writeln!(output, "{} r{} => r{}", opcode, value, address)?;
        }

        Opcode::LoadImmediate => {
            let constant = constant(instr)?;
            let target = register(instr, DEF_SLOT, view)?;
            writeln!(output, "{} {} => r{}", opcode, constant, target)?;
        }

        Opcode::Output => {
            writeln!(output, "{} {}", opcode, constant(instr)?)?;
        }

        Opcode::Nop => {
            writeln!(output, "{}", opcode)?;
        }
    }

    Ok(())
}

fn register(instr: &Instruction, slot: usize, view: RegisterView) -> Result<usize, BackendError> {
    instr.operands[slot]
        .and_then(|operand| operand.register(view))
        .ok_or(BackendError::MissingRegister {
            opcode: instr.opcode,
            slot,
            field: match view {
                RegisterView::Symbolic => "symbolic",
                RegisterView::Virtual => "virtual",
                RegisterView::Physical => "physical",
            },
            line: instr.line,
        })
}

fn constant(instr: &Instruction) -> Result<i64, BackendError> {
    instr.constant.ok_or(BackendError::MissingConstant {
        opcode: instr.opcode,
        line: instr.line,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser;
    use crate::ir::lower::lower;
    use crate::ir::{Operand, PhysicalRegister};

    const BLOCK: &str = "\
load r1 => r2
store r2 => r3
loadI 1024 => r4
lshift r1, r4 => r5
output 1024
nop
";

    #[test]
    fn test_symbolic_round_trip_text() {
        let lowered = lower(&parser::parse(BLOCK).unwrap());
        assert_eq!(render(&lowered.block, RegisterView::Symbolic).unwrap(), BLOCK);
    }

    #[test]
    fn test_comments_and_spacing_are_normalised() {
        let lowered = lower(&parser::parse("  add   r1,r2=>r3 // sum\n").unwrap());
        assert_eq!(
            render(&lowered.block, RegisterView::Symbolic).unwrap(),
            "add r1, r2 => r3\n"
        );
    }

    #[test]
    fn test_missing_register_in_view() {
        let lowered = lower(&parser::parse("load r1 => r2\n").unwrap());
        let err = render(&lowered.block, RegisterView::Physical).unwrap_err();

        assert_eq!(
            err,
            BackendError::MissingRegister {
                opcode: Opcode::Load,
                slot: 0,
                field: "physical",
                line: Some(1),
            }
        );
    }

    #[test]
    fn test_spill_code_renders_in_physical_view() {
        let scratch = Operand::physical(PhysicalRegister { id: 3 });
        let value = Operand::physical(PhysicalRegister { id: 0 });
        let block: Block = vec![
            Instruction::load_immediate(32768, scratch),
            Instruction::store(value, scratch),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            render(&block, RegisterView::Physical).unwrap(),
            "loadI 32768 => r3\nstore r0 => r3\n"
        );
    }

    #[test]
    fn test_empty_block() {
        assert_eq!(render(&Block::new(), RegisterView::Physical).unwrap(), "");
    }
}
