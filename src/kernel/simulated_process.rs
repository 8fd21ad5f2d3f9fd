use std::thread;
use std::time::Duration;

use log::debug;

use crate::io::{Instruction, Program};

/// Where a process stands after running one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessState {
    Ready,
    Waiting,
    Terminated,
}

/// A running instance of a [`Program`].
///
/// The cursor only moves forward. `remaining_block_ticks > 0` exactly while
/// the process waits on IO.
#[derive(Debug)]
pub struct SimulatedProcess {
    pid: u64,
    program: Program,
    cursor: usize,
    remaining_block_ticks: u32,
}

impl SimulatedProcess {
    pub fn new(pid: u64, program: Program) -> SimulatedProcess {
        SimulatedProcess {
            pid,
            program,
            cursor: 0,
            remaining_block_ticks: 0,
        }
    }

    pub fn pid(&self) -> u64 {
        self.pid
    }

    pub fn name(&self) -> &str {
        self.program.name()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn remaining_block_ticks(&self) -> u32 {
        self.remaining_block_ticks
    }

    pub fn is_done(&self) -> bool {
        self.cursor >= self.program.len()
    }

    pub fn is_blocked(&self) -> bool {
        self.remaining_block_ticks > 0
    }

    /// Gives the program back, e.g. when admission is refused.
    pub fn into_program(self) -> Program {
        self.program
    }

    /// Runs the instruction under the cursor for one quantum of wall-clock
    /// time and advances past it. A `Block` only arms the block counter; the
    /// dispatcher counts it down while the process sits in the blocked queue.
    pub(crate) fn run_instruction(&mut self, quantum: Duration) -> ProcessState {
        let Some(&instruction) = self.program.instructions().get(self.cursor) else {
            return ProcessState::Terminated;
        };

        debug!("[{}] {}: Executing", self.pid, self.name());
        if !quantum.is_zero() {
            thread::sleep(quantum);
        }

        if let Instruction::Block(duration) = instruction {
            debug!("[{}] {}: Blocking for {}", self.pid, self.name(), duration);
            self.remaining_block_ticks = duration;
        }
        self.cursor += 1;

        self.state()
    }

    /// Ages the IO wait by one tick.
    pub(crate) fn decrement_block_time(&mut self) {
        self.remaining_block_ticks = self.remaining_block_ticks.saturating_sub(1);
    }

    pub(crate) fn state(&self) -> ProcessState {
        if self.is_done() {
            ProcessState::Terminated
        } else if self.is_blocked() {
            ProcessState::Waiting
        } else {
            ProcessState::Ready
        }
    }
}
