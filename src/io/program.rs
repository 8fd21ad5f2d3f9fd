use std::fmt;
use std::sync::Arc;

/// A single unit of program work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// Pure CPU burst.
    Execute,
    /// IO wait for the given number of ticks. Always positive.
    Block(u32),
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Execute => write!(f, "execute"),
            Instruction::Block(duration) => write!(f, "block {duration}"),
        }
    }
}

/// An immutable program: a display name plus its instruction sequence.
#[derive(Debug, Clone)]
pub struct Program {
    name: String,
    instructions: Arc<[Instruction]>,
    execute_count: usize,
    block_count: usize,
}

impl Program {
    pub fn new(name: impl Into<String>, instructions: Vec<Instruction>) -> Program {
        let block_count = instructions
            .iter()
            .filter(|ins| matches!(ins, Instruction::Block(_)))
            .count();

        Program {
            name: name.into(),
            execute_count: instructions.len() - block_count,
            block_count,
            instructions: instructions.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn execute_count(&self) -> usize {
        self.execute_count
    }

    pub fn block_count(&self) -> usize {
        self.block_count
    }
}
