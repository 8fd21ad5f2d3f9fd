use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{error, info};

use super::*;

use crate::config::{LoaderKind, SimConfig};
use crate::io::{FileProgramLoader, Notifier, ProgramLoader, RandomProgramLoader};

/// Holds both schedulers and the threads running their loops.
pub struct Driver {
    sts: Arc<ShortTermScheduler>,
    lts: Arc<LongTermScheduler>,
    threads: Vec<JoinHandle<()>>,
}

impl Driver {
    pub fn new(config: &SimConfig, notifier: Arc<dyn Notifier>) -> Driver {
        let loader: Box<dyn ProgramLoader> = match config.loader {
            LoaderKind::File => Box::new(FileProgramLoader::new(config.program_dir.clone())),
            LoaderKind::Random => Box::new(RandomProgramLoader::new(config.seed)),
        };
        Driver::with_loader(config, loader, notifier)
    }

    pub fn with_loader(
        config: &SimConfig,
        loader: Box<dyn ProgramLoader>,
        notifier: Arc<dyn Notifier>,
    ) -> Driver {
        let sts = Arc::new(ShortTermScheduler::new(config.quantum(), config.tick_period()));
        let lts = Arc::new(LongTermScheduler::new(config.max_load, sts.clone(), loader));

        sts.set_notifier(notifier.clone());
        lts.set_notifier(notifier);

        Driver {
            sts,
            lts,
            threads: Vec::new(),
        }
    }

    pub fn short_term_scheduler(&self) -> &ShortTermScheduler {
        &self.sts
    }

    pub fn long_term_scheduler(&self) -> &LongTermScheduler {
        &self.lts
    }

    /// Spawns the tick loop and the admission loop. The simulation itself
    /// stays stopped until `start_simulation`.
    pub fn start(&mut self) -> io::Result<()> {
        if !self.threads.is_empty() {
            return Ok(());
        }

        info!("Starting the driver.");
        let sts = self.sts.clone();
        self.threads.push(
            thread::Builder::new()
                .name("short-term-scheduler".into())
                .spawn(move || sts.run())?,
        );

        let lts = self.lts.clone();
        self.threads.push(
            thread::Builder::new()
                .name("long-term-scheduler".into())
                .spawn(move || lts.run())?,
        );

        Ok(())
    }

    /// Stops both loops and waits for their threads.
    pub fn shutdown(&mut self) {
        if self.threads.is_empty() {
            return;
        }

        info!("Shutting down the driver.");
        self.lts.stop();
        self.sts.shutdown();
        for handle in self.threads.drain(..) {
            let name = handle.thread().name().unwrap_or("scheduler").to_string();
            if handle.join().is_err() {
                error!("Thread '{name}' panicked");
            }
        }
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        self.shutdown();
    }
}
