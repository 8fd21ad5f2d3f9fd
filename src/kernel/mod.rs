mod load_signal;
mod long_term_scheduler;
mod short_term_scheduler;
mod simulated_process;

pub mod driver;

use std::sync::Arc;

pub use driver::Driver;
pub use load_signal::LoadSignal;
pub use long_term_scheduler::{AdmissionError, LongTermScheduler};
pub use short_term_scheduler::{
    ProcessSummary, QueueSnapshot, ShortTermScheduler, SimulationStatus, TickOutcome,
    INFINITE_LOAD,
};
pub use simulated_process::SimulatedProcess;

/// Operator controls for the dispatcher.
pub trait ControlInterface: Send + Sync {
    fn start_simulation(&self);
    fn suspend_simulation(&self);
    fn resume_simulation(&self);
    fn stop_simulation(&self);
    fn display_process_queues(&self);
}

/// Job submission into the admission queue.
pub trait SubmissionInterface: Send + Sync {
    /// Returns `false` if the identifier could not be loaded.
    fn submit_job(&self, identifier: &str) -> bool;
    fn display_submission_queue(&self);
}

/// What the long-term scheduler needs from the short-term one.
pub trait InterSchedulerInterface: Send + Sync {
    /// Places a process in the CPU-bound ready queue unconditionally.
    fn add_process(&self, process: SimulatedProcess);

    /// Current number of resident processes, or `usize::MAX` while not running.
    fn process_load(&self) -> usize;

    /// Adds the process only if the dispatcher is running and its load is
    /// below `max_load`, checked atomically. Hands the process back otherwise.
    fn try_add_process(
        &self,
        process: SimulatedProcess,
        max_load: usize,
    ) -> Result<(), SimulatedProcess>;

    /// Signal notified whenever admission may become possible.
    fn load_signal(&self) -> Arc<LoadSignal>;
}
