//! Error type for the output writers (spec §7 "External-process failure" is
//! handled at the call site by skipping the artifact; I/O failures here are
//! propagated so the core never partially writes a final artifact).
use std::{error, fmt, io};

pub type IoResult<T> = Result<T, ShastaIoError>;

#[derive(Debug)]
pub enum ShastaIoError {
    Io(io::Error),
}

impl From<io::Error> for ShastaIoError {
    fn from(error: io::Error) -> Self {
        ShastaIoError::Io(error)
    }
}

impl fmt::Display for ShastaIoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShastaIoError::Io(err) => write!(f, "I/O error writing assembly output: {}", err),
        }
    }
}

impl error::Error for ShastaIoError {}
