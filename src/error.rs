use serde::ser;
use thiserror::Error;

use std::fmt::Display;
use std::io;

/// Errors that can occur while building a querystring.
#[derive(Error, Debug)]
pub enum Error {
    /// Custom string-based error raised by a `Serialize` implementation.
    #[error("{0}")]
    Custom(String),

    /// The top-level value was not a struct or map.
    #[error("cannot encode {0} at the top level. Try encoding a struct or a map.")]
    TopLevel(&'static str),

    /// The value has a shape that has no querystring representation.
    #[error("unsupported value: {0}")]
    Unsupported(String),

    /// The value is nested more deeply than `Config::max_depth` allows.
    #[error("maximum nesting depth of {0} exceeded")]
    MaxDepthExceeded(usize),

    /// Failure writing the querystring to a sink.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Generate error to show top-level type cannot be encoded.
    pub fn top_level(object: &'static str) -> Self {
        Error::TopLevel(object)
    }

    pub(crate) fn unsupported<T: Display>(what: T) -> Self {
        Error::Unsupported(what.to_string())
    }
}

impl ser::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: Display,
    {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
