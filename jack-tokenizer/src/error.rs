use std::fmt;

#[derive(Debug)]
pub enum LexError {
    Io(std::io::Error),
    /// A `"` was opened but no closing `"` was found before a newline or EOF.
    UnterminatedString,
    /// A `/*` was opened but no closing `*/` was found before EOF.
    UnterminatedComment,
    /// A digit run did not fit a 32-bit signed integer.
    IntegerOverflow(String),
    /// The current byte starts no valid token: not whitespace, not a
    /// comment opener, not a digit, not an identifier character, not a
    /// string quote, and not one of the fixed symbols.
    UnrecognizedCharacter(char),
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::UnterminatedString => write!(f, "unterminated string constant"),
            Self::UnterminatedComment => write!(f, "unterminated block comment"),
            Self::IntegerOverflow(digits) => {
                write!(f, "integer constant `{digits}` does not fit in 32 bits")
            }
            Self::UnrecognizedCharacter(c) => write!(f, "unrecognized character `{c}`"),
        }
    }
}

impl std::error::Error for LexError {}

impl From<std::io::Error> for LexError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, LexError>;
