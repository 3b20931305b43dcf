use crate::ir::Instruction;
use std::ops::{Index, IndexMut};

/// Handle to an instruction inside a `Block`. Handles stay valid across
/// insertions; nodes are never removed.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct InstrId(usize);

#[derive(Debug, Clone)]
struct Node {
    instr: Instruction,
    prev: Option<InstrId>,
    next: Option<InstrId>,
}

/*
 * A single basic block stored as an arena of doubly linked nodes.
 *
 * Program order is given by the prev/next links, not by arena position, so
 * spill and restore code can be spliced in front of the instruction the
 * allocator is visiting without disturbing the walk to its successor.
 */
#[derive(Debug, Clone, Default)]
pub struct Block {
    nodes: Vec<Node>,
    head: Option<InstrId>,
    tail: Option<InstrId>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn first(&self) -> Option<InstrId> {
        self.head
    }

    pub fn last(&self) -> Option<InstrId> {
        self.tail
    }

    pub fn next(&self, id: InstrId) -> Option<InstrId> {
        self.nodes[id.0].next
    }

    pub fn prev(&self, id: InstrId) -> Option<InstrId> {
        self.nodes[id.0].prev
    }

    /// Appends `instr` at the end of the block.
    pub fn push(&mut self, instr: Instruction) -> InstrId {
        let id = InstrId(self.nodes.len());
        self.nodes.push(Node {
            instr,
            prev: self.tail,
            next: None,
        });

        match self.tail {
            Some(tail) => self.nodes[tail.0].next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        id
    }

    /// Links `instr` immediately before `at`. The node at `at` keeps its
    /// contents and its successor.
    pub fn insert_before(&mut self, at: InstrId, instr: Instruction) -> InstrId {
        let id = InstrId(self.nodes.len());
        let prev = self.nodes[at.0].prev;
        self.nodes.push(Node {
            instr,
            prev,
            next: Some(at),
        });

        match prev {
            Some(prev) => self.nodes[prev.0].next = Some(id),
            None => self.head = Some(id),
        }
        self.nodes[at.0].prev = Some(id);
        id
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            block: self,
            cursor: self.head,
        }
    }

    /// Handles in program order, collected so the block can be mutated
    /// while walking them.
    pub fn ids(&self) -> Vec<InstrId> {
        let mut ids = Vec::with_capacity(self.nodes.len());
        let mut cursor = self.head;
        while let Some(id) = cursor {
            ids.push(id);
            cursor = self.next(id);
        }
        ids
    }
}

impl Index<InstrId> for Block {
    type Output = Instruction;

    fn index(&self, id: InstrId) -> &Instruction {
        &self.nodes[id.0].instr
    }
}

impl IndexMut<InstrId> for Block {
    fn index_mut(&mut self, id: InstrId) -> &mut Instruction {
        &mut self.nodes[id.0].instr
    }
}

impl FromIterator<Instruction> for Block {
    fn from_iter<T: IntoIterator<Item = Instruction>>(iter: T) -> Self {
        let mut block = Block::new();
        for instr in iter {
            block.push(instr);
        }
        block
    }
}

impl<'a> IntoIterator for &'a Block {
    type Item = &'a Instruction;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

pub struct Iter<'a> {
    block: &'a Block,
    cursor: Option<InstrId>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Instruction;

    fn next(&mut self) -> Option<&'a Instruction> {
        let id = self.cursor?;
        self.cursor = self.block.next(id);
        Some(&self.block[id])
    }
}
