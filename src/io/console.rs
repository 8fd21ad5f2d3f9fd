use std::io::{self, BufRead, Write};

use log::{info, warn};

use crate::kernel::{ControlInterface, SubmissionInterface};

/// Receives human-readable status reports from the schedulers.
pub trait Notifier: Send + Sync {
    fn display(&self, message: &str);
}

/// Prints status reports to stdout.
pub struct StdoutNotifier;

impl Notifier for StdoutNotifier {
    fn display(&self, message: &str) {
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{}", message.trim_end());
        let _ = out.flush();
    }
}

/// An operator command read from the console.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Suspend,
    Resume,
    Stop,
    Queues,
    Submissions,
    Submit(String),
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Option<Command> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match (word, rest.is_empty()) {
            ("start", true) => Command::Start,
            ("suspend", true) => Command::Suspend,
            ("resume", true) => Command::Resume,
            ("stop", true) => Command::Stop,
            ("queues", true) => Command::Queues,
            ("submissions", true) => Command::Submissions,
            ("submit", false) => Command::Submit(rest.to_string()),
            ("help", true) => Command::Help,
            ("quit" | "exit", true) => Command::Quit,
            _ => return None,
        };
        Some(command)
    }
}

const HELP: &str = "\
commands:
  start            start the simulation
  suspend          pause dispatching, keep queues
  resume           continue after suspend
  stop             stop and clear all process queues
  queues           show ready and blocked queues
  submissions      show jobs waiting for admission
  submit <id>      submit a program
  quit             exit";

/// Line-oriented operator console driving both schedulers until `quit` or EOF.
pub struct Console<'a> {
    control: &'a dyn ControlInterface,
    submission: &'a dyn SubmissionInterface,
}

impl<'a> Console<'a> {
    pub fn new(
        control: &'a dyn ControlInterface,
        submission: &'a dyn SubmissionInterface,
    ) -> Console<'a> {
        Console {
            control,
            submission,
        }
    }

    pub fn run<R: BufRead, W: Write>(&self, input: R, mut output: W) -> io::Result<()> {
        writeln!(output, "{HELP}")?;

        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let Some(command) = Command::parse(&line) else {
                warn!("Unrecognised command: {}", line.trim());
                writeln!(output, "unrecognised command, type 'help'")?;
                continue;
            };

            if !self.execute(command, &mut output)? {
                break;
            }
        }

        Ok(())
    }

    /// Returns `false` once the console should exit.
    fn execute<W: Write>(&self, command: Command, output: &mut W) -> io::Result<bool> {
        match command {
            Command::Start => {
                info!("Starting simulation");
                self.control.start_simulation();
            }
            Command::Suspend => {
                info!("Suspending simulation");
                self.control.suspend_simulation();
            }
            Command::Resume => {
                info!("Resuming simulation");
                self.control.resume_simulation();
            }
            Command::Stop => {
                info!("Stopping simulation");
                self.control.stop_simulation();
            }
            Command::Queues => self.control.display_process_queues(),
            Command::Submissions => self.submission.display_submission_queue(),
            Command::Submit(identifier) => {
                if self.submission.submit_job(&identifier) {
                    writeln!(output, "submitted '{identifier}'")?;
                } else {
                    writeln!(output, "rejected '{identifier}'")?;
                }
            }
            Command::Help => writeln!(output, "{HELP}")?,
            Command::Quit => return Ok(false),
        }
        Ok(true)
    }
}
