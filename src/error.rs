//! Error handling for the curlish library.
//!
//! Every failure a request can run into is one of the variants below. None
//! of them are retried internally: configuration problems surface when the
//! client is set up, while transport and parse failures surface as a failed
//! call with no [`Response`](crate::Response) produced.

use std::io;
use thiserror::Error;

/// Errors that can happen when using curlish.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid client setup.
    ///
    /// Raised eagerly while configuring (an unusable cookie directory, a file
    /// attachment that does not exist) and when the transport reports an
    /// error code that is not part of the known code table.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The request URL was empty or could not be used.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The transport produced no result for the call.
    ///
    /// `name` is looked up from the native code table, `message` is the
    /// transport's own description.
    #[error("{name}: {message}")]
    Transport {
        code: u32,
        name: &'static str,
        message: String,
    },

    /// The raw response could not be split into a header block and a body,
    /// or no status line was found.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Attempt to mutate a store that was built as a read-only snapshot.
    #[error("Cannot modify a frozen store")]
    FrozenStore,

    /// A payload could not be serialized to JSON.
    #[error("Serialization error")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    /// I/O Error.
    ///
    /// Raised while resolving file attachments or touching the cookie file.
    #[error("I/O error")]
    IOError {
        #[from]
        source: io::Error,
    },
}

impl Error {
    /// Builds a [`Error::Transport`] from a native error code.
    ///
    /// Codes missing from the table are a programming or environment error
    /// rather than a transient one, so they become [`Error::Configuration`].
    pub fn transport(code: u32, message: impl Into<String>) -> Self {
        match crate::transport::code_name(code) {
            Some(name) => Error::Transport {
                code,
                name,
                message: message.into(),
            },
            None => Error::Configuration(format!("Unknown transport error code: {code}")),
        }
    }
}

/// Result type alias for operations that can fail with a curlish error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_code_becomes_transport_error() {
        let err = Error::transport(28, "Operation timed out after 5000 ms");
        match err {
            Error::Transport {
                code,
                name,
                ref message,
            } => {
                assert_eq!(code, 28);
                assert_eq!(name, "CURLE_OPERATION_TIMEOUTED");
                assert_eq!(message, "Operation timed out after 5000 ms");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "CURLE_OPERATION_TIMEOUTED: Operation timed out after 5000 ms"
        );
    }

    #[test]
    fn test_unknown_code_is_configuration_error() {
        let err = Error::transport(9999, "???");
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("9999"));
    }
}
