use std::collections::VecDeque;
use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, error, info};

use super::{InterSchedulerInterface, LoadSignal, SimulatedProcess, SubmissionInterface};
use crate::io::{Notifier, Program, ProgramLoader};

/// Upper bound on one admission wait, in case a wakeup is missed.
const ADMISSION_RECHECK: Duration = Duration::from_millis(50);

/// Why a single admission attempt did not admit anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionError {
    QueueEmpty,
    /// Dispatcher is at the load ceiling or not running.
    AtCapacity,
}

impl fmt::Display for AdmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueEmpty => write!(f, "no programs in queue"),
            Self::AtCapacity => write!(f, "dispatcher cannot take more processes"),
        }
    }
}

impl Error for AdmissionError {}

/// Admission control. Holds submitted programs and releases them to the
/// short-term scheduler in FIFO order while its load is below `max_load`.
///
/// Process ids are handed out at admission, so rejected submissions never
/// consume one.
///
/// The submission queue lock is only held for queue edits, never while
/// waiting on the dispatcher.
pub struct LongTermScheduler {
    max_load: usize,
    program_queue: Mutex<VecDeque<Program>>,
    /// Held for a whole admission attempt, which keeps admissions serialised.
    next_pid: Mutex<u64>,
    sts: Arc<dyn InterSchedulerInterface>,
    loader: Box<dyn ProgramLoader>,
    notifier: Mutex<Option<Arc<dyn Notifier>>>,
    signal: Arc<LoadSignal>,
    running: AtomicBool,
}

impl LongTermScheduler {
    pub fn new(
        max_load: usize,
        sts: Arc<dyn InterSchedulerInterface>,
        loader: Box<dyn ProgramLoader>,
    ) -> LongTermScheduler {
        let signal = sts.load_signal();
        LongTermScheduler {
            max_load,
            program_queue: Mutex::new(VecDeque::new()),
            next_pid: Mutex::new(1),
            sts,
            loader,
            notifier: Mutex::new(None),
            signal,
            running: AtomicBool::new(true),
        }
    }

    pub fn set_notifier(&self, notifier: Arc<dyn Notifier>) {
        *self.notifier.lock().unwrap_or_else(PoisonError::into_inner) = Some(notifier);
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Program>> {
        self.program_queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Names of the queued programs, head first.
    pub fn queued_programs(&self) -> Vec<String> {
        self.lock()
            .iter()
            .map(|program| program.name().to_string())
            .collect()
    }

    pub fn has_programs(&self) -> bool {
        !self.lock().is_empty()
    }

    /// Tries to admit the head of the queue. On success returns the new pid.
    ///
    /// The head is out of the queue while the dispatcher is consulted, so
    /// submissions and queue listings never wait on a running tick.
    pub fn step(&self) -> Result<u64, AdmissionError> {
        let mut next_pid = self.next_pid.lock().unwrap_or_else(PoisonError::into_inner);
        let program = self
            .lock()
            .pop_front()
            .ok_or(AdmissionError::QueueEmpty)?;

        let pid = *next_pid;
        match self
            .sts
            .try_add_process(SimulatedProcess::new(pid, program), self.max_load)
        {
            Ok(()) => {
                *next_pid += 1;
                Ok(pid)
            }
            Err(process) => {
                self.lock().push_front(process.into_program());
                Err(AdmissionError::AtCapacity)
            }
        }
    }

    /// Admission loop. One admission per iteration; sleeps on the load
    /// signal whenever nothing can be admitted.
    pub fn run(&self) {
        info!("Long-term scheduler started (max load {})", self.max_load);
        while self.running.load(Ordering::Acquire) {
            let seen = self.signal.generation();
            match self.step() {
                Ok(pid) => debug!("Admitted pid {pid}"),
                Err(_) => {
                    self.signal.wait_past(seen, ADMISSION_RECHECK);
                }
            }
        }
        info!("Long-term scheduler exited");
    }

    /// Ends [`run`](Self::run). Queued programs are abandoned.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
        self.signal.notify();
    }
}

impl SubmissionInterface for LongTermScheduler {
    fn submit_job(&self, identifier: &str) -> bool {
        let program = match self.loader.load_program(identifier) {
            Ok(program) => program,
            Err(err) => {
                error!("{err}");
                return false;
            }
        };

        info!(
            "Submitted '{}' as {} ({} execute, {} block)",
            identifier,
            program.name(),
            program.execute_count(),
            program.block_count()
        );
        self.lock().push_back(program);
        self.signal.notify();
        true
    }

    fn display_submission_queue(&self) {
        let Some(notifier) = self
            .notifier
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        else {
            return;
        };

        let mut message = String::from("Submission queue:");
        for name in self.queued_programs() {
            message.push_str(" | ");
            message.push_str(&name);
        }
        notifier.display(&message);
    }
}
