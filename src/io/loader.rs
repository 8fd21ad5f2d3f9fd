use std::fs;
use std::path::{Path, PathBuf};

use super::{Instruction, LoadError, ParseError, Program};

/// Resolves a job identifier into a [`Program`].
pub trait ProgramLoader: Send + Sync {
    fn load_program(&self, identifier: &str) -> Result<Program, LoadError>;
}

/// Loads programs from text files. Identifiers are file paths, relative
/// ones resolved against `base_dir` when it is set.
pub struct FileProgramLoader {
    base_dir: Option<PathBuf>,
}

impl FileProgramLoader {
    pub fn new(base_dir: Option<PathBuf>) -> FileProgramLoader {
        FileProgramLoader { base_dir }
    }

    fn resolve(&self, identifier: &str) -> PathBuf {
        let path = Path::new(identifier);
        match &self.base_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl ProgramLoader for FileProgramLoader {
    fn load_program(&self, identifier: &str) -> Result<Program, LoadError> {
        let path = self.resolve(identifier);
        let source = fs::read_to_string(&path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;

        parse_program(&source).map_err(|source| LoadError::Parse {
            identifier: identifier.to_string(),
            source,
        })
    }
}

/// Parses the textual program format:
///
/// ```text
/// program <name>
/// begin
/// execute
/// block 5
/// end
/// ```
///
/// Blank lines are skipped and every line is trimmed.
pub fn parse_program(source: &str) -> Result<Program, ParseError> {
    let lines: Vec<&str> = source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.len() < 3 {
        return Err(ParseError::TooFewLines);
    }

    let name = parse_header(lines[0])?;

    if lines[1] != "begin" {
        return Err(ParseError::MissingBegin);
    }

    let last = lines.len() - 1;
    if lines[last] != "end" {
        return Err(ParseError::MissingEnd);
    }

    let instructions = lines[2..last]
        .iter()
        .enumerate()
        .map(|(idx, line)| parse_instruction(line, idx + 3))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Program::new(name, instructions))
}

/// The program name is the second token of the header. The keyword is not checked.
fn parse_header(header: &str) -> Result<&str, ParseError> {
    header
        .split_whitespace()
        .nth(1)
        .ok_or(ParseError::MalformedHeader)
}

fn parse_instruction(line: &str, line_no: usize) -> Result<Instruction, ParseError> {
    let mut parts = line.split_whitespace();

    match parts.next() {
        Some("execute") if parts.next().is_none() => Ok(Instruction::Execute),
        Some("block") => {
            let value = parts.next().unwrap_or_default();
            let invalid = || ParseError::InvalidBlockDuration {
                line: line_no,
                value: value.to_string(),
            };

            if parts.next().is_some() {
                return Err(invalid());
            }

            match value.parse::<u32>() {
                Ok(duration) if duration > 0 => Ok(Instruction::Block(duration)),
                _ => Err(invalid()),
            }
        }
        _ => Err(ParseError::UnknownInstruction {
            line: line_no,
            keyword: line.to_string(),
        }),
    }
}
