use std::{error, fmt, io};

pub type CoreResult<T> = Result<T, ShastaCoreError>;

#[derive(Debug)]
pub enum ShastaCoreError {
    Config(toml::de::Error),
    Io(io::Error),
    ShastaIo(shasta_io::ShastaIoError),
}

impl From<io::Error> for ShastaCoreError {
    fn from(error: io::Error) -> Self {
        ShastaCoreError::Io(error)
    }
}

impl From<shasta_io::ShastaIoError> for ShastaCoreError {
    fn from(error: shasta_io::ShastaIoError) -> Self {
        ShastaCoreError::ShastaIo(error)
    }
}

impl fmt::Display for ShastaCoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShastaCoreError::Config(error) => write!(f, "invalid configuration: {error}"),
            ShastaCoreError::Io(error) => write!(f, "I/O error: {error}"),
            ShastaCoreError::ShastaIo(error) => write!(f, "output error: {error}"),
        }
    }
}

impl error::Error for ShastaCoreError {}
