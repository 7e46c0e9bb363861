use std::fmt;

#[derive(Debug)]
pub enum JackError {
    Io(std::io::Error),
    Lex(jack_tokenizer::LexError),
    UnexpectedToken { expected: String, found: String },
    UnexpectedEof { expected: String },
    /// An identifier was used in a context that requires it to already be
    /// declared (a `let`/term reference, or a method-call receiver lookup).
    UndeclaredIdentifier(String),
}

impl fmt::Display for JackError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Lex(e) => write!(f, "{e}"),
            Self::UnexpectedToken { expected, found } => {
                write!(f, "expected {expected} but found `{found}`")
            }
            Self::UnexpectedEof { expected } => {
                write!(f, "expected {expected} but reached end of input")
            }
            Self::UndeclaredIdentifier(name) => write!(f, "undeclared identifier `{name}`"),
        }
    }
}

impl std::error::Error for JackError {}

impl From<std::io::Error> for JackError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<jack_tokenizer::LexError> for JackError {
    fn from(e: jack_tokenizer::LexError) -> Self {
        Self::Lex(e)
    }
}

pub type Result<T> = std::result::Result<T, JackError>;
