pub mod block;
pub mod lower;

use std::fmt;

pub use block::{Block, InstrId};

/// Distance to the next instruction reading a value: the 0-based index of
/// that instruction in the block as parsed, or `None` when the value is dead.
pub type NextUse = Option<usize>;

/// A register as written in the source. `name` is the number after the `r`,
/// `id` is a dense index assigned in order of first appearance.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SymbolicRegister {
    pub id: usize,
    pub name: usize,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct VirtualRegister {
    pub id: usize,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct PhysicalRegister {
    pub id: usize,
}

/// Which register field of an operand to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterView {
    Symbolic,
    Virtual,
    Physical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Load,
    LoadImmediate,
    Store,
    Add,
    Sub,
    Mult,
    LShift,
    RShift,
    Output,
    Nop,
}

impl Opcode {
    /// Operand slots read by this opcode, in the order the allocator resolves them.
    pub fn use_slots(self) -> &'static [usize] {
        match self {
            Opcode::Add | Opcode::Sub | Opcode::Mult | Opcode::LShift | Opcode::RShift => &[0, 1],
            Opcode::Store => &[0, 1],
            Opcode::Load => &[0],
            Opcode::LoadImmediate | Opcode::Output | Opcode::Nop => &[],
        }
    }

    /// Everything except store, output and nop writes the destination slot.
    pub fn defines(self) -> bool {
        !matches!(self, Opcode::Store | Opcode::Output | Opcode::Nop)
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            Opcode::Add | Opcode::Sub | Opcode::Mult | Opcode::LShift | Opcode::RShift
        )
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Load => "load",
            Opcode::LoadImmediate => "loadI",
            Opcode::Store => "store",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mult => "mult",
            Opcode::LShift => "lshift",
            Opcode::RShift => "rshift",
            Opcode::Output => "output",
            Opcode::Nop => "nop",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// One register operand slot. The renamer fills `virtual_reg` and
/// `next_use`, the allocator fills `physical`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Operand {
    pub symbolic: Option<SymbolicRegister>,
    pub virtual_reg: Option<VirtualRegister>,
    pub physical: Option<PhysicalRegister>,
    pub next_use: NextUse,
}

impl Operand {
    pub fn symbolic(id: usize, name: usize) -> Self {
        Self {
            symbolic: Some(SymbolicRegister { id, name }),
            ..Self::default()
        }
    }

    pub fn physical(reg: PhysicalRegister) -> Self {
        Self {
            physical: Some(reg),
            ..Self::default()
        }
    }

    pub fn register(&self, view: RegisterView) -> Option<usize> {
        match view {
            RegisterView::Symbolic => self.symbolic.map(|r| r.name),
            RegisterView::Virtual => self.virtual_reg.map(|r| r.id),
            RegisterView::Physical => self.physical.map(|r| r.id),
        }
    }
}

/*
 * Operand slot layout
 *
 *   arithmetic   [0] = source A   [1] = source B   [2] = destination
 *   load         [0] = address                     [2] = destination
 *   store        [0] = address    [1] = value
 *   loadI        constant                          [2] = destination
 *   output       constant
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub constant: Option<i64>,
    pub operands: [Option<Operand>; 3],
    /// Source line, `None` for spill and restore code.
    pub line: Option<usize>,
}

pub const DEF_SLOT: usize = 2;

impl Instruction {
    pub fn new(opcode: Opcode, constant: Option<i64>, operands: [Option<Operand>; 3]) -> Self {
        Self {
            opcode,
            constant,
            operands,
            line: None,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn load_immediate(constant: i64, target: Operand) -> Self {
        Self::new(Opcode::LoadImmediate, Some(constant), [None, None, Some(target)])
    }

    pub fn load(address: Operand, target: Operand) -> Self {
        Self::new(Opcode::Load, None, [Some(address), None, Some(target)])
    }

    pub fn store(value: Operand, address: Operand) -> Self {
        Self::new(Opcode::Store, None, [Some(address), Some(value), None])
    }

    pub fn arithmetic(opcode: Opcode, left: Operand, right: Operand, target: Operand) -> Self {
        debug_assert!(opcode.is_arithmetic());
        Self::new(opcode, None, [Some(left), Some(right), Some(target)])
    }

    pub fn output(constant: i64) -> Self {
        Self::new(Opcode::Output, Some(constant), [None, None, None])
    }

    pub fn nop() -> Self {
        Self::new(Opcode::Nop, None, [None, None, None])
    }

    pub fn definition(&self) -> Option<&Operand> {
        if self.opcode.defines() {
            self.operands[DEF_SLOT].as_ref()
        } else {
            None
        }
    }

    pub fn uses(&self) -> impl Iterator<Item = &Operand> + '_ {
        self.opcode
            .use_slots()
            .iter()
            .filter_map(move |&slot| self.operands[slot].as_ref())
    }

    /// Spill and restore code has no source line.
    pub fn is_synthesized(&self) -> bool {
        self.line.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_roles() {
        let add = Instruction::arithmetic(
            Opcode::Add,
            Operand::symbolic(0, 1),
            Operand::symbolic(1, 2),
            Operand::symbolic(2, 3),
        );
        let uses: Vec<_> = add.uses().filter_map(|o| o.register(RegisterView::Symbolic)).collect();
        assert_eq!(uses, vec![1, 2]);
        assert_eq!(add.definition().and_then(|o| o.register(RegisterView::Symbolic)), Some(3));

        // store rV => rA keeps the address in the first slot
        let store = Instruction::store(Operand::symbolic(0, 7), Operand::symbolic(1, 8));
        let uses: Vec<_> = store.uses().filter_map(|o| o.register(RegisterView::Symbolic)).collect();
        assert_eq!(uses, vec![8, 7]);
        assert!(store.definition().is_none());
    }

    #[test]
    fn test_constant_only_opcodes_have_no_registers() {
        let load_i = Instruction::load_immediate(4, Operand::symbolic(0, 0));
        assert_eq!(load_i.uses().count(), 0);
        assert!(load_i.definition().is_some());

        assert_eq!(Instruction::output(4).uses().count(), 0);
        assert!(Instruction::output(4).definition().is_none());
        assert!(Instruction::nop().definition().is_none());
    }
}
