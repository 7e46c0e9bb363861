//! Error types shared by the VM parser and code writer.

use std::fmt;

#[derive(Debug)]
pub enum VmError {
    Io(std::io::Error),
    /// A command line has no tokens at all (e.g. a blank line reached the parser).
    EmptyCommand,
    /// `push`/`pop`/`function`/`call` is missing its numeric second argument.
    MissingArg2(String),
    /// The second argument could not be parsed as a decimal integer.
    InvalidArg2(String),
    /// `arg1`/`arg2` was called for a command type that doesn't carry one.
    NoSuchArg(&'static str),
    /// An arithmetic mnemonic outside the fixed set `add|sub|neg|eq|gt|lt|and|or|not`.
    UnknownArithmetic(String),
    /// A segment name outside the fixed set of eight.
    UnknownSegment(String),
    /// `pop constant ...`, which is illegal by definition.
    PopToConstant,
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::EmptyCommand => write!(f, "empty VM command"),
            Self::MissingArg2(cmd) => write!(f, "command `{cmd}` is missing its index argument"),
            Self::InvalidArg2(val) => write!(f, "`{val}` is not a valid integer index"),
            Self::NoSuchArg(which) => write!(f, "{which} is not defined for this command type"),
            Self::UnknownArithmetic(op) => write!(f, "unknown arithmetic command: {op}"),
            Self::UnknownSegment(seg) => write!(f, "unknown memory segment: {seg}"),
            Self::PopToConstant => write!(f, "cannot pop to the constant segment"),
        }
    }
}

impl std::error::Error for VmError {}

impl From<std::io::Error> for VmError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, VmError>;
