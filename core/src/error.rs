use std::fmt;
use thiserror::Error;

/// Part of the WAV stream a read was trying to fill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSection {
    Header,
    Payload,
}

impl fmt::Display for StreamSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamSection::Header => f.write_str("header"),
            StreamSection::Payload => f.write_str("payload"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AfskError {
    #[error("Truncated stream: {section} needs {expected} bytes, got {actual}")]
    TruncatedStream {
        section: StreamSection,
        expected: usize,
        actual: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported WAV format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, AfskError>;
