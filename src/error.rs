use rustyline::error::ReadlineError;
use std::{convert::From, fmt};

/// Simple custom Error for the debugger console
pub struct Error {
    pub kind: ErrorKind,
    pub msg: String,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ErrorKind {
    /// malformed expression text (lexing or parsing)
    Syntax,
    /// well-formed expression that can't be evaluated (identifier, division by zero)
    Evaluation,
    /// error accessing the machine's memory or loading an image into it
    Memory,
    /// underlying io error
    IO,
    /// the line editor failed
    Console,
    /// catch-all for other errors
    General,
}

impl Error {
    pub fn new(kind: ErrorKind, message: &str) -> Error {
        Error {
            kind,
            msg: String::from(message),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self { Error::new(ErrorKind::IO, e.to_string().as_str()) }
}

impl From<ReadlineError> for Error {
    fn from(e: ReadlineError) -> Self {
        match e {
            ReadlineError::Io(e) => Error::from(e),
            e => Error::new(ErrorKind::Console, e.to_string().as_str()),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "{}: {}", red!("armdbg::Error"), self.msg) }
}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "{}", self.msg) }
}
impl std::error::Error for Error {}
