//! Two-tier process scheduling simulator.
//!
//! A long-term scheduler admits submitted programs while the short-term
//! scheduler's load is below a ceiling; the short-term scheduler time-slices
//! the admitted processes, keeping CPU-bound and IO-bound work apart.

pub mod cli;
pub mod config;
pub mod io;
pub mod kernel;
