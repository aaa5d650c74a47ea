//! Error types for the imagegraph crate.

use std::fmt;

/// Result type for imagegraph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while caching node assets.
#[derive(Debug)]
pub enum Error {
    /// HTTP request failed.
    Http {
        /// The URL that failed.
        url: String,
        /// The error message.
        message: String,
    },
    /// HTTP response had a non-success status code.
    HttpStatus {
        /// The URL that returned the error.
        url: String,
        /// The HTTP status code.
        status: u16,
    },
    /// Asset decoding failed.
    Decode(imagegraph_decode::DecodeError),
    /// A fetcher broke the event contract.
    InvalidData {
        /// Context for where the error occurred.
        context: &'static str,
        /// Description of what was invalid.
        detail: String,
    },
    /// Settings cannot be turned into a working cache.
    Config {
        /// Description of the problem.
        detail: String,
    },
}

impl Error {
    /// Whether the failure happened on the wire, so retrying may succeed.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Http { .. } | Error::HttpStatus { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Http { url, message } => {
                write!(f, "http request to {url} failed: {message}")
            }
            Error::HttpStatus { url, status } => {
                write!(f, "http request to {url} returned status {status}")
            }
            Error::Decode(e) => write!(f, "decode error: {e}"),
            Error::InvalidData { context, detail } => {
                write!(f, "invalid {context}: {detail}")
            }
            Error::Config { detail } => write!(f, "invalid settings: {detail}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<imagegraph_decode::DecodeError> for Error {
    fn from(e: imagegraph_decode::DecodeError) -> Self {
        Error::Decode(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imagegraph_decode::DecodeError;

    #[test]
    fn test_is_transport() {
        let http = Error::Http {
            url: "http://a".to_string(),
            message: "connection reset".to_string(),
        };
        let status = Error::HttpStatus {
            url: "http://a".to_string(),
            status: 503,
        };
        let decode = Error::from(DecodeError::BufferTooSmall {
            expected: 1,
            actual: 0,
        });

        assert!(http.is_transport());
        assert!(status.is_transport());
        assert!(!decode.is_transport());
    }

    #[test]
    fn test_display() {
        let err = Error::HttpStatus {
            url: "http://a/mesh".to_string(),
            status: 404,
        };
        assert_eq!(err.to_string(), "http request to http://a/mesh returned status 404");
    }

    #[test]
    fn test_decode_source() {
        use std::error::Error as _;

        let err = Error::from(DecodeError::InvalidFormat {
            context: "bitmap",
            detail: "bad header".to_string(),
        });
        assert!(err.source().is_some());
    }
}
