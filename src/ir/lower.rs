use crate::frontend::ast;
use crate::ir::{Block, Instruction, Opcode, Operand};
use std::collections::HashMap;

/// A symbolic block ready for renaming.
#[derive(Debug, Clone)]
pub struct LoweredBlock {
    pub block: Block,
    /// Distinct symbolic registers in the block. Their dense ids are
    /// `0..symbolic_count`.
    pub symbolic_count: usize,
}

struct Context {
    block: Block,
    /// Register number as written -> dense id.
    symbolic: HashMap<usize, usize>,
}

impl Context {
    fn new() -> Self {
        Self {
            block: Block::new(),
            symbolic: HashMap::new(),
        }
    }

    fn register(&mut self, name: usize) -> Operand {
        let next = self.symbolic.len();
        let id = *self.symbolic.entry(name).or_insert(next);
        Operand::symbolic(id, name)
    }

    fn emit_instr(&mut self, instr: Instruction, line: usize) {
        self.block.push(instr.at_line(line));
    }
}

pub fn lower(lines: &[ast::Line]) -> LoweredBlock {
    let mut ctx = Context::new();

    for line in lines {
        lower_statement(&mut ctx, &line.statement, line.number);
    }

    LoweredBlock {
        block: ctx.block,
        symbolic_count: ctx.symbolic.len(),
    }
}

fn lower_statement(ctx: &mut Context, stmt: &ast::Statement, line: usize) {
    let instr = match *stmt {
        ast::Statement::Memory { op: ast::MemoryOp::Load, source, target } => {
            let address = ctx.register(source);
            let target = ctx.register(target);
            Instruction::load(address, target)
        }

        // store rV => rA writes rV to MEM(rA)
        ast::Statement::Memory { op: ast::MemoryOp::Store, source, target } => {
            let value = ctx.register(source);
            let address = ctx.register(target);
            Instruction::store(value, address)
        }

        ast::Statement::LoadImmediate { constant, target } => {
            let target = ctx.register(target);
            Instruction::load_immediate(constant, target)
        }

        ast::Statement::Arithmetic { op, left, right, target } => {
            let opcode = match op {
                ast::ArithOp::Add => Opcode::Add,
                ast::ArithOp::Sub => Opcode::Sub,
                ast::ArithOp::Mult => Opcode::Mult,
                ast::ArithOp::LShift => Opcode::LShift,
                ast::ArithOp::RShift => Opcode::RShift,
            };
            let left = ctx.register(left);
            let right = ctx.register(right);
            let target = ctx.register(target);
            Instruction::arithmetic(opcode, left, right, target)
        }

        ast::Statement::Output { constant } => Instruction::output(constant),

        ast::Statement::Nop => Instruction::nop(),
    };

    ctx.emit_instr(instr, line);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser;
    use crate::ir::RegisterView;

    #[test]
    fn test_lower_counts_registers_and_keeps_lines() {
        let lines = parser::parse("loadI 8 => r3\n\nstore r3 => r17\noutput 8\n").unwrap();
        let lowered = lower(&lines);

        assert_eq!(lowered.symbolic_count, 2);
        assert_eq!(lowered.block.len(), 3);

        let lines: Vec<_> = lowered.block.iter().map(|i| i.line).collect();
        assert_eq!(lines, vec![Some(1), Some(3), Some(4)]);
    }

    #[test]
    fn test_store_operands_are_address_then_value() {
        let lines = parser::parse("store r1 => r2\n").unwrap();
        let lowered = lower(&lines);
        let store = lowered.block.iter().next().unwrap();

        assert_eq!(store.opcode, Opcode::Store);
        let uses: Vec<_> = store
            .uses()
            .filter_map(|o| o.register(RegisterView::Symbolic))
            .collect();
        assert_eq!(uses, vec![2, 1]);
    }

    #[test]
    fn test_block_without_registers() {
        let lines = parser::parse("nop\noutput 0\n").unwrap();
        let lowered = lower(&lines);
        assert_eq!(lowered.symbolic_count, 0);
        assert_eq!(lowered.block.len(), 2);
    }

    #[test]
    fn test_register_numbers_are_made_dense() {
        let lines = parser::parse(
            "loadI 1 => r18446744073709551615\nloadI 2 => r100000000000\nadd r100000000000, r18446744073709551615 => r4\n",
        )
        .unwrap();
        let lowered = lower(&lines);
        assert_eq!(lowered.symbolic_count, 3);

        let registers: Vec<_> = lowered
            .block
            .iter()
            .flat_map(|i| i.operands.iter().flatten().filter_map(|o| o.symbolic))
            .map(|r| (r.id, r.name))
            .collect();
        assert_eq!(
            registers,
            vec![
                (0, usize::MAX),
                (1, 100000000000),
                (1, 100000000000),
                (0, usize::MAX),
                (2, 4),
            ]
        );
    }
}
