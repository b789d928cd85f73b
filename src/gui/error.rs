use std::{error::Error, fmt::Display};

/// Anything that can go wrong while driving the terminal.
#[derive(Debug)]
pub enum ViewerError {
    /// The terminal could not be set up, drawn to, or restored
    IOError(std::io::Error),
}

impl Display for ViewerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#?}", self)
    }
}

impl Error for ViewerError {}

impl From<std::io::Error> for ViewerError {
    fn from(value: std::io::Error) -> Self {
        Self::IOError(value)
    }
}
