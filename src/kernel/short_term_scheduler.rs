use std::collections::VecDeque;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use log::{debug, info, trace};

use super::simulated_process::ProcessState;
use super::{ControlInterface, InterSchedulerInterface, LoadSignal, SimulatedProcess};
use crate::io::Notifier;

/// Load reported while the dispatcher is not running.
pub const INFINITE_LOAD: usize = usize::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationStatus {
    Stopped,
    Running,
    Suspended,
}

/// What one pass of the tick loop did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running, nothing touched.
    Idle,
    /// Both ready queues were empty; one quantum passed and the blocked queue aged.
    NothingReady,
    /// This many dispatch attempts ran a process.
    Dispatched(usize),
}

#[derive(Debug, Clone, Copy)]
enum ReadyClass {
    CpuBound,
    IoBound,
}

/// Dispatch order within one tick: CPU-bound work gets two slots, IO-bound one.
const TICK_SLOTS: [ReadyClass; 3] = [
    ReadyClass::CpuBound,
    ReadyClass::CpuBound,
    ReadyClass::IoBound,
];

/// Observed burst history, used to classify a process.
#[derive(Debug, Default, Clone, Copy)]
struct BurstCounts {
    execute_count: u32,
    block_count: u32,
}

impl BurstCounts {
    /// Ties count as CPU-bound.
    fn is_io_bound(&self) -> bool {
        self.block_count > self.execute_count
    }
}

#[derive(Debug)]
struct QueuedProcess {
    process: SimulatedProcess,
    bursts: BurstCounts,
}

struct Queues {
    status: SimulationStatus,
    cpu_bound_queue: VecDeque<QueuedProcess>,
    io_bound_queue: VecDeque<QueuedProcess>,
    blocked_queue: VecDeque<QueuedProcess>,
}

impl Queues {
    fn new() -> Queues {
        Queues {
            status: SimulationStatus::Stopped,
            cpu_bound_queue: VecDeque::new(),
            io_bound_queue: VecDeque::new(),
            blocked_queue: VecDeque::new(),
        }
    }

    fn load(&self) -> usize {
        self.cpu_bound_queue.len() + self.io_bound_queue.len() + self.blocked_queue.len()
    }

    fn clear(&mut self) {
        self.cpu_bound_queue.clear();
        self.io_bound_queue.clear();
        self.blocked_queue.clear();
    }

    fn admit(&mut self, process: SimulatedProcess) {
        if process.is_done() {
            info!("[{}] {}: Finished", process.pid(), process.name());
            return;
        }

        self.cpu_bound_queue.push_back(QueuedProcess {
            process,
            bursts: BurstCounts::default(),
        });
    }

    fn push_ready(&mut self, entry: QueuedProcess) {
        if entry.bursts.is_io_bound() {
            self.io_bound_queue.push_back(entry);
        } else {
            self.cpu_bound_queue.push_back(entry);
        }
    }

    /// Runs the head of the given ready queue for one instruction and files
    /// it by the result. Returns `None` if that queue was empty.
    fn run_next(&mut self, class: ReadyClass, quantum: Duration) -> Option<ProcessState> {
        let queue = match class {
            ReadyClass::CpuBound => &mut self.cpu_bound_queue,
            ReadyClass::IoBound => &mut self.io_bound_queue,
        };
        let mut entry = queue.pop_front()?;

        let state = entry.process.run_instruction(quantum);
        match state {
            ProcessState::Terminated => {
                info!("[{}] {}: Finished", entry.process.pid(), entry.process.name());
            }
            ProcessState::Waiting => {
                entry.bursts.block_count += 1;
                self.blocked_queue.push_back(entry);
            }
            ProcessState::Ready => {
                entry.bursts.execute_count += 1;
                self.push_ready(entry);
            }
        }
        Some(state)
    }

    /// Counts every blocked process down by one tick, moving the ones that
    /// reach zero to a ready queue.
    fn age_blocked_queue(&mut self) {
        for _ in 0..self.blocked_queue.len() {
            let Some(mut entry) = self.blocked_queue.pop_front() else {
                break;
            };
            entry.process.decrement_block_time();
            if entry.process.is_blocked() {
                self.blocked_queue.push_back(entry);
            } else {
                debug!("[{}] {}: Unblocked", entry.process.pid(), entry.process.name());
                self.push_ready(entry);
            }
        }
    }

    fn snapshot(&self) -> QueueSnapshot {
        fn summarize(queue: &VecDeque<QueuedProcess>) -> Vec<ProcessSummary> {
            queue
                .iter()
                .map(|entry| ProcessSummary {
                    pid: entry.process.pid(),
                    name: entry.process.name().to_string(),
                    cursor: entry.process.cursor(),
                    remaining_block_ticks: entry.process.remaining_block_ticks(),
                    execute_count: entry.bursts.execute_count,
                    block_count: entry.bursts.block_count,
                })
                .collect()
        }

        QueueSnapshot {
            status: self.status,
            blocked: summarize(&self.blocked_queue),
            io_bound: summarize(&self.io_bound_queue),
            cpu_bound: summarize(&self.cpu_bound_queue),
        }
    }
}

/// One resident process as seen from outside the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSummary {
    pub pid: u64,
    pub name: String,
    pub cursor: usize,
    pub remaining_block_ticks: u32,
    pub execute_count: u32,
    pub block_count: u32,
}

/// Consistent view of all three dispatcher queues, front first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSnapshot {
    pub status: SimulationStatus,
    pub blocked: Vec<ProcessSummary>,
    pub io_bound: Vec<ProcessSummary>,
    pub cpu_bound: Vec<ProcessSummary>,
}

impl QueueSnapshot {
    pub fn load(&self) -> usize {
        self.blocked.len() + self.io_bound.len() + self.cpu_bound.len()
    }

    /// Operator-facing listing, one line per queue.
    pub fn render(&self) -> String {
        let mut message = String::new();
        for (label, queue) in [
            ("Blocked queue:", &self.blocked),
            ("IO-bound queue:", &self.io_bound),
            ("CPU-bound queue:", &self.cpu_bound),
        ] {
            message.push_str(label);
            for process in queue {
                let _ = write!(message, " ({}, {})", process.pid, process.name);
            }
            message.push('\n');
        }
        message
    }
}

/// The dispatcher. Time-slices resident processes, keeping CPU-bound and
/// IO-bound work in separate ready queues.
///
/// All queue state sits behind one lock that is held for a whole tick, so
/// callers never see a half-applied tick.
pub struct ShortTermScheduler {
    queues: Mutex<Queues>,
    quantum: Duration,
    tick_period: Duration,
    signal: Arc<LoadSignal>,
    notifier: Mutex<Option<Arc<dyn Notifier>>>,
    shutdown: AtomicBool,
}

impl ShortTermScheduler {
    pub fn new(quantum: Duration, tick_period: Duration) -> ShortTermScheduler {
        ShortTermScheduler {
            queues: Mutex::new(Queues::new()),
            quantum,
            tick_period,
            signal: Arc::new(LoadSignal::new()),
            notifier: Mutex::new(None),
            shutdown: AtomicBool::new(false),
        }
    }

    pub fn set_notifier(&self, notifier: Arc<dyn Notifier>) {
        *self.notifier.lock().unwrap_or_else(PoisonError::into_inner) = Some(notifier);
    }

    fn lock(&self) -> MutexGuard<'_, Queues> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> SimulationStatus {
        self.lock().status
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        self.lock().snapshot()
    }

    fn set_status(&self, status: SimulationStatus) {
        self.lock().status = status;
        self.signal.notify();
    }

    /// One pass of the tick loop, without the tick-period sleep.
    ///
    /// Tries two CPU-bound slots then one IO-bound slot. If none found work,
    /// one quantum of idle time passes instead. The blocked queue ages exactly
    /// once either way.
    pub fn tick(&self) -> TickOutcome {
        let mut queues = self.lock();
        if queues.status != SimulationStatus::Running {
            return TickOutcome::Idle;
        }

        let mut dispatched = 0;
        let mut finished = 0;
        for class in TICK_SLOTS {
            match queues.run_next(class, self.quantum) {
                Some(ProcessState::Terminated) => {
                    dispatched += 1;
                    finished += 1;
                }
                Some(_) => dispatched += 1,
                None => {}
            }
        }

        if dispatched == 0 && !self.quantum.is_zero() {
            thread::sleep(self.quantum);
        }
        queues.age_blocked_queue();
        drop(queues);

        if finished > 0 {
            self.signal.notify();
        }

        if dispatched == 0 {
            TickOutcome::NothingReady
        } else {
            TickOutcome::Dispatched(dispatched)
        }
    }

    /// Tick loop. Runs until [`shutdown`](Self::shutdown), regardless of the
    /// simulation status, which only gates whether a tick does work.
    pub fn run(&self) {
        info!("Short-term scheduler started");
        while !self.shutdown.load(Ordering::Acquire) {
            thread::sleep(self.tick_period);
            if self.tick() == TickOutcome::NothingReady {
                trace!("No ready process, idled one quantum");
            }
        }
        info!("Short-term scheduler exited");
    }

    /// Ends [`run`](Self::run) at the next tick boundary.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }
}

impl InterSchedulerInterface for ShortTermScheduler {
    fn add_process(&self, process: SimulatedProcess) {
        info!("[{}] {}: Admitted", process.pid(), process.name());
        self.lock().admit(process);
    }

    fn process_load(&self) -> usize {
        let queues = self.lock();
        if queues.status != SimulationStatus::Running {
            return INFINITE_LOAD;
        }
        queues.load()
    }

    fn try_add_process(
        &self,
        process: SimulatedProcess,
        max_load: usize,
    ) -> Result<(), SimulatedProcess> {
        let mut queues = self.lock();
        if queues.status != SimulationStatus::Running || queues.load() >= max_load {
            return Err(process);
        }

        info!("[{}] {}: Admitted", process.pid(), process.name());
        queues.admit(process);
        Ok(())
    }

    fn load_signal(&self) -> Arc<LoadSignal> {
        self.signal.clone()
    }
}

impl ControlInterface for ShortTermScheduler {
    fn start_simulation(&self) {
        self.set_status(SimulationStatus::Running);
        info!("Simulation started");
    }

    fn suspend_simulation(&self) {
        self.set_status(SimulationStatus::Suspended);
        info!("Simulation suspended");
    }

    fn resume_simulation(&self) {
        self.set_status(SimulationStatus::Running);
        info!("Simulation resumed");
    }

    /// Hard reset: every resident process is discarded.
    fn stop_simulation(&self) {
        {
            let mut queues = self.lock();
            queues.status = SimulationStatus::Stopped;
            queues.clear();
        }
        self.signal.notify();
        info!("Simulation stopped");
    }

    fn display_process_queues(&self) {
        let Some(notifier) = self
            .notifier
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        else {
            return;
        };

        let message = self.snapshot().render();
        notifier.display(&message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{Instruction, Program};

    use Instruction::{Block, Execute};

    #[derive(Default)]
    struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
    }

    impl Notifier for RecordingNotifier {
        fn display(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    fn scheduler() -> ShortTermScheduler {
        ShortTermScheduler::new(Duration::ZERO, Duration::from_millis(1))
    }

    fn process(pid: u64, name: &str, instructions: Vec<Instruction>) -> SimulatedProcess {
        SimulatedProcess::new(pid, Program::new(name, instructions))
    }

    fn pids(queue: &[ProcessSummary]) -> Vec<u64> {
        queue.iter().map(|p| p.pid).collect()
    }

    #[test]
    fn test_load_is_infinite_unless_running() {
        let sts = scheduler();
        assert_eq!(sts.status(), SimulationStatus::Stopped);
        assert_eq!(sts.process_load(), INFINITE_LOAD);

        sts.add_process(process(1, "a", vec![Execute]));
        assert_eq!(sts.process_load(), INFINITE_LOAD);

        sts.start_simulation();
        assert_eq!(sts.process_load(), 1);

        sts.suspend_simulation();
        assert_eq!(sts.process_load(), INFINITE_LOAD);
    }

    #[test]
    fn test_new_process_starts_cpu_bound() {
        let sts = scheduler();
        sts.start_simulation();
        sts.add_process(process(1, "a", vec![Block(2), Execute]));

        let snapshot = sts.snapshot();
        assert_eq!(pids(&snapshot.cpu_bound), vec![1]);
        assert!(snapshot.io_bound.is_empty());
        assert!(snapshot.blocked.is_empty());
        assert_eq!(snapshot.cpu_bound[0].execute_count, 0);
        assert_eq!(snapshot.cpu_bound[0].block_count, 0);
    }

    #[test]
    fn test_empty_program_is_never_resident() {
        let sts = scheduler();
        sts.start_simulation();
        sts.add_process(process(1, "empty", Vec::new()));

        assert_eq!(sts.process_load(), 0);
    }

    #[test]
    fn test_block_execute_block_lifecycle() {
        // [execute, block 5, execute]: both CPU slots of the first tick go to
        // the same process, the second one blocks it.
        let sts = scheduler();
        sts.start_simulation();
        sts.add_process(process(1, "three", vec![Execute, Block(5), Execute]));
        assert_eq!(sts.process_load(), 1);

        assert_eq!(sts.tick(), TickOutcome::Dispatched(2));
        let snapshot = sts.snapshot();
        assert_eq!(pids(&snapshot.blocked), vec![1]);
        let blocked = &snapshot.blocked[0];
        assert_eq!(blocked.cursor, 2);
        assert_eq!(blocked.execute_count, 1);
        assert_eq!(blocked.block_count, 1);
        // Aged once in the tick it blocked.
        assert_eq!(blocked.remaining_block_ticks, 4);

        for remaining in [3, 2, 1] {
            assert_eq!(sts.tick(), TickOutcome::NothingReady);
            let snapshot = sts.snapshot();
            assert_eq!(snapshot.blocked[0].remaining_block_ticks, remaining);
        }

        // Unblocks with one execute and one block: tie, so CPU-bound.
        assert_eq!(sts.tick(), TickOutcome::NothingReady);
        let snapshot = sts.snapshot();
        assert!(snapshot.blocked.is_empty());
        assert!(snapshot.io_bound.is_empty());
        assert_eq!(pids(&snapshot.cpu_bound), vec![1]);
        assert_eq!(sts.process_load(), 1);

        assert_eq!(sts.tick(), TickOutcome::Dispatched(1));
        assert_eq!(sts.process_load(), 0);
        assert_eq!(sts.snapshot().load(), 0);
    }

    #[test]
    fn test_block_heavy_process_migrates_to_io_queue_and_back() {
        let sts = scheduler();
        sts.start_simulation();
        sts.add_process(process(7, "io", vec![Block(1), Execute, Execute]));

        // Blocks, then ages out in the same tick with block_count 1 > execute_count 0.
        assert_eq!(sts.tick(), TickOutcome::Dispatched(1));
        let snapshot = sts.snapshot();
        assert_eq!(pids(&snapshot.io_bound), vec![7]);
        assert!(snapshot.cpu_bound.is_empty());

        // Only the IO slot runs it; the tie sends it back to CPU-bound.
        assert_eq!(sts.tick(), TickOutcome::Dispatched(1));
        let snapshot = sts.snapshot();
        assert_eq!(pids(&snapshot.cpu_bound), vec![7]);
        assert_eq!(snapshot.cpu_bound[0].execute_count, 1);
        assert_eq!(snapshot.cpu_bound[0].block_count, 1);

        assert_eq!(sts.tick(), TickOutcome::Dispatched(1));
        assert_eq!(sts.process_load(), 0);
    }

    #[test]
    fn test_two_cpu_slots_and_one_io_slot_per_tick() {
        let sts = scheduler();
        sts.start_simulation();
        for pid in 1..=3 {
            sts.add_process(process(pid, "cpu", vec![Execute, Execute, Execute]));
        }
        sts.add_process(process(4, "io", vec![Block(1), Execute, Execute, Execute]));

        // Tick 1: pids 1 and 2 run, nothing IO-bound yet.
        assert_eq!(sts.tick(), TickOutcome::Dispatched(2));
        assert_eq!(pids(&sts.snapshot().cpu_bound), vec![3, 4, 1, 2]);

        // Tick 2: pids 3 and 4 run; 4 blocks and becomes IO-bound after aging.
        assert_eq!(sts.tick(), TickOutcome::Dispatched(2));
        let snapshot = sts.snapshot();
        assert_eq!(pids(&snapshot.cpu_bound), vec![1, 2, 3]);
        assert_eq!(pids(&snapshot.io_bound), vec![4]);

        // Tick 3: two CPU slots plus the IO slot.
        assert_eq!(sts.tick(), TickOutcome::Dispatched(3));
        let snapshot = sts.snapshot();
        assert_eq!(pids(&snapshot.cpu_bound), vec![3, 1, 2, 4]);
        assert!(snapshot.io_bound.is_empty());
    }

    #[test]
    fn test_ties_stay_cpu_bound() {
        let counts = BurstCounts {
            execute_count: 3,
            block_count: 3,
        };
        assert!(!counts.is_io_bound());
        assert!(BurstCounts {
            execute_count: 2,
            block_count: 3
        }
        .is_io_bound());
        assert!(!BurstCounts::default().is_io_bound());
    }

    #[test]
    fn test_blocked_processes_never_in_ready_queues() {
        let sts = scheduler();
        sts.start_simulation();
        sts.add_process(process(1, "a", vec![Block(3), Block(2), Execute, Block(1), Execute]));
        sts.add_process(process(2, "b", vec![Execute, Block(4), Execute, Execute]));
        sts.add_process(process(3, "c", vec![Block(1), Block(1), Block(1), Execute]));

        for _ in 0..40 {
            sts.tick();
            let snapshot = sts.snapshot();
            for p in snapshot.cpu_bound.iter().chain(&snapshot.io_bound) {
                assert_eq!(p.remaining_block_ticks, 0);
            }
            for p in &snapshot.blocked {
                assert!(p.remaining_block_ticks > 0);
            }
            for p in &snapshot.io_bound {
                assert!(p.block_count > p.execute_count);
            }
            for p in &snapshot.cpu_bound {
                assert!(p.block_count <= p.execute_count);
            }
            assert_eq!(sts.process_load(), snapshot.load());
        }
        assert_eq!(sts.process_load(), 0);
    }

    #[test]
    fn test_tick_idles_unless_running() {
        let sts = scheduler();
        sts.add_process(process(1, "a", vec![Execute]));
        assert_eq!(sts.tick(), TickOutcome::Idle);

        sts.start_simulation();
        sts.suspend_simulation();
        assert_eq!(sts.tick(), TickOutcome::Idle);
        assert_eq!(pids(&sts.snapshot().cpu_bound), vec![1]);
    }

    #[test]
    fn test_suspend_twice_keeps_queues() {
        let sts = scheduler();
        sts.start_simulation();
        sts.add_process(process(1, "a", vec![Execute, Block(3), Execute]));
        sts.add_process(process(2, "b", vec![Execute, Execute]));
        sts.tick();

        sts.suspend_simulation();
        let first = sts.snapshot();
        sts.suspend_simulation();
        let second = sts.snapshot();

        assert_eq!(second.status, SimulationStatus::Suspended);
        assert_eq!(first, second);

        sts.resume_simulation();
        assert_eq!(sts.status(), SimulationStatus::Running);
        assert_eq!(sts.process_load(), first.load());
    }

    #[test]
    fn test_stop_clears_everything() {
        let sts = scheduler();
        sts.start_simulation();
        sts.add_process(process(1, "a", vec![Execute, Block(9), Execute]));
        sts.add_process(process(2, "b", vec![Execute, Execute, Execute]));
        sts.tick();
        assert!(sts.process_load() > 0);

        sts.stop_simulation();
        assert_eq!(sts.status(), SimulationStatus::Stopped);
        assert_eq!(sts.process_load(), INFINITE_LOAD);

        sts.start_simulation();
        assert_eq!(sts.process_load(), 0);
        assert_eq!(sts.snapshot().load(), 0);
    }

    #[test]
    fn test_try_add_respects_status_and_ceiling() {
        let sts = scheduler();

        let refused = sts.try_add_process(process(1, "a", vec![Execute]), 2);
        let returned = refused.unwrap_err();
        assert_eq!(returned.pid(), 1);

        sts.start_simulation();
        assert!(sts.try_add_process(returned, 2).is_ok());
        assert!(sts.try_add_process(process(2, "b", vec![Execute]), 2).is_ok());
        assert!(sts.try_add_process(process(3, "c", vec![Execute]), 2).is_err());
        assert_eq!(sts.process_load(), 2);
    }

    #[test]
    fn test_finishing_process_notifies_load_signal() {
        let sts = scheduler();
        sts.start_simulation();
        sts.add_process(process(1, "a", vec![Execute]));

        let signal = sts.load_signal();
        let seen = signal.generation();
        sts.tick();

        assert!(signal.wait_past(seen, Duration::ZERO));
    }

    #[test]
    fn test_display_process_queues() {
        let sts = scheduler();
        let notifier = Arc::new(RecordingNotifier::default());
        sts.set_notifier(notifier.clone());
        sts.start_simulation();
        sts.add_process(process(1, "alpha", vec![Block(2), Execute]));
        sts.add_process(process(2, "beta", vec![Execute, Execute]));
        sts.tick();

        sts.display_process_queues();

        let messages = notifier.messages.lock().unwrap();
        assert_eq!(
            messages.as_slice(),
            ["Blocked queue: (1, alpha)\nIO-bound queue:\nCPU-bound queue: (2, beta)\n"]
        );
    }

    #[test]
    fn test_display_without_notifier_is_noop() {
        let sts = scheduler();
        sts.display_process_queues();
    }

    #[test]
    fn test_run_loop_exits_on_shutdown() {
        let sts = Arc::new(scheduler());
        sts.start_simulation();
        sts.add_process(process(1, "a", vec![Execute, Execute]));

        let handle = {
            let sts = sts.clone();
            thread::spawn(move || sts.run())
        };

        let mut waited = 0;
        while sts.process_load() != 0 && waited < 2000 {
            thread::sleep(Duration::from_millis(1));
            waited += 1;
        }
        assert_eq!(sts.process_load(), 0);

        sts.shutdown();
        handle.join().unwrap();
    }
}
