pub mod console;
pub mod error;
pub mod loader;
pub mod program;
pub mod random_loader;
pub mod rng;

pub use console::{Console, Notifier, StdoutNotifier};
pub use error::{LoadError, ParseError};
pub use loader::{FileProgramLoader, ProgramLoader};
pub use program::{Instruction, Program};
pub use random_loader::RandomProgramLoader;
pub use rng::SimRng;
