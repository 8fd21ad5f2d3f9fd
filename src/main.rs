use std::process::ExitCode;
use std::sync::Arc;

use log::error;

use process_scheduler_simulator::cli::{CliArgs, USAGE};
use process_scheduler_simulator::config::SimConfig;
use process_scheduler_simulator::io::{Console, StdoutNotifier};
use process_scheduler_simulator::kernel::Driver;

fn main() -> ExitCode {
    let args = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("error: {err}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };
    if args.help {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    let mut config = match &args.config {
        Some(path) => match SimConfig::from_file(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("error: {err}");
                return ExitCode::from(2);
            }
        },
        None => SimConfig::default(),
    };
    args.apply(&mut config);
    if let Err(err) = config.validate() {
        eprintln!("error: {err}");
        return ExitCode::from(2);
    }

    let default_filter = config.log_level.as_deref().unwrap_or("info");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let mut driver = Driver::new(&config, Arc::new(StdoutNotifier));
    if let Err(err) = driver.start() {
        error!("Failed to spawn scheduler threads: {err}");
        return ExitCode::FAILURE;
    }

    let console = Console::new(driver.short_term_scheduler(), driver.long_term_scheduler());
    let stdin = std::io::stdin();
    let result = console.run(stdin.lock(), std::io::stdout());
    drop(console);

    driver.shutdown();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("Console failed: {err}");
            ExitCode::FAILURE
        }
    }
}
