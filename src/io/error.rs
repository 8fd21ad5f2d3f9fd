//! Errors raised while turning a job identifier into a [`Program`].
//!
//! None of these reach the scheduling core. The long-term scheduler logs
//! them and reports a plain rejection to whoever submitted the job.
//!
//! [`Program`]: super::Program

use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Structural problems in a textual program source.
///
/// Line numbers are 1-based and count only non-blank lines.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    /// Fewer than the header, `begin` and `end` lines.
    TooFewLines,
    /// Header line has no program name.
    MalformedHeader,
    /// Second line is not `begin`.
    MissingBegin,
    /// Last line is not `end`.
    MissingEnd,
    /// Instruction keyword other than `execute` or `block`.
    UnknownInstruction { line: usize, keyword: String },
    /// `block` without a positive integer duration.
    InvalidBlockDuration { line: usize, value: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewLines => write!(f, "too few lines in program"),
            Self::MalformedHeader => write!(f, "failed to parse program header"),
            Self::MissingBegin => write!(f, "missing program begin"),
            Self::MissingEnd => {
                write!(f, "missing program end, program is possibly truncated")
            }
            Self::UnknownInstruction { line, keyword } => {
                write!(f, "line {line}: unknown instruction '{keyword}'")
            }
            Self::InvalidBlockDuration { line, value } => {
                write!(f, "line {line}: invalid block duration '{value}'")
            }
        }
    }
}

impl Error for ParseError {}

/// Failure to produce a program for a submitted identifier.
#[derive(Debug)]
#[non_exhaustive]
pub enum LoadError {
    /// The program source could not be read.
    Io { path: PathBuf, source: io::Error },
    /// The program source was read but is malformed.
    Parse { identifier: String, source: ParseError },
    /// The identifier is not a valid generator request (`<n>`, `IO<n>`, `CPU<n>`).
    InvalidGeneratorSpec(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to load program '{}': {source}", path.display())
            }
            Self::Parse { identifier, source } => {
                write!(f, "failed to parse program '{identifier}': {source}")
            }
            Self::InvalidGeneratorSpec(spec) => {
                write!(f, "invalid generator request '{spec}'")
            }
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::InvalidGeneratorSpec(_) => None,
        }
    }
}
