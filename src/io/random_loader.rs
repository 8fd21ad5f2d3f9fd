use std::sync::{Mutex, PoisonError};

use super::{Instruction, LoadError, Program, ProgramLoader, SimRng};

/// Upper bound (inclusive) for generated block durations.
const MAX_BLOCK_TIME: u32 = 20;

/// Which mix of instructions to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    /// Each instruction is a fair coin flip.
    None,
    /// At least half of the instructions block.
    Io,
    /// At least half of the instructions execute.
    Cpu,
}

/// Synthesises programs instead of reading them. Identifiers are `<n>`,
/// `IO<n>` or `CPU<n>` where `n` is the instruction count.
pub struct RandomProgramLoader {
    rng: Mutex<SimRng>,
}

impl RandomProgramLoader {
    pub fn new(seed: Option<u64>) -> RandomProgramLoader {
        let rng = match seed {
            Some(seed) => SimRng::new(seed),
            None => SimRng::from_time(),
        };
        RandomProgramLoader {
            rng: Mutex::new(rng),
        }
    }

    pub fn generate(&self, size: usize, bias: Bias) -> Program {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);

        match bias {
            Bias::None => {
                let instructions = (0..size)
                    .map(|_| {
                        if rng.gen_bool() {
                            Instruction::Execute
                        } else {
                            random_block(&mut rng)
                        }
                    })
                    .collect();
                Program::new("Random", instructions)
            }
            Bias::Io | Bias::Cpu => {
                let majority = majority_count(&mut rng, size);
                let mut instructions = Vec::with_capacity(size);
                for i in 0..size {
                    let in_majority = i < majority;
                    let block = in_majority == (bias == Bias::Io);
                    instructions.push(if block {
                        random_block(&mut rng)
                    } else {
                        Instruction::Execute
                    });
                }
                rng.shuffle(&mut instructions);

                let name = if bias == Bias::Io { "IO" } else { "CPU" };
                Program::new(name, instructions)
            }
        }
    }
}

impl ProgramLoader for RandomProgramLoader {
    fn load_program(&self, identifier: &str) -> Result<Program, LoadError> {
        let (bias, digits) = if let Some(rest) = identifier.strip_prefix("IO") {
            (Bias::Io, rest)
        } else if let Some(rest) = identifier.strip_prefix("CPU") {
            (Bias::Cpu, rest)
        } else {
            (Bias::None, identifier)
        };

        match digits.parse::<usize>() {
            Ok(size) if size > 0 => Ok(self.generate(size, bias)),
            _ => Err(LoadError::InvalidGeneratorSpec(identifier.to_string())),
        }
    }
}

fn random_block(rng: &mut SimRng) -> Instruction {
    Instruction::Block(rng.gen_range(1, MAX_BLOCK_TIME + 1))
}

/// Picks how many instructions fall in the favoured class, never less than half.
fn majority_count(rng: &mut SimRng, size: usize) -> usize {
    if size == 0 {
        return 0;
    }
    let count = (rng.next_u64() % size as u64) as usize;
    count.max(size - count)
}
