//! Error type for the dump splitter.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SplitError {
    /// A flush was needed before any marker line named a target file.
    /// `line` is the 1-based input line that triggered it, 0 at end of an empty input.
    #[error("no target file defined at line {line}: no marker line with a separator seen yet")]
    UndefinedTarget { line: usize },

    #[error("failed to read input: {0}")]
    Read(#[source] io::Error),

    /// Opening or appending to an output file failed
    #[error("failed to append to '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid marker pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, SplitError>;
