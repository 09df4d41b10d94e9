/*!
    Error taxonomy of the binding layer.
*/

use std::fmt;

/**
    Error type for the libav binding crates.

    The first six variants form the closed taxonomy that every negative
    native return value maps into (see [`crate::status::translate`]).
    [`Error::ContextClosed`] is raised by the binding itself when a wrapper
    is used after its native handle has been released; the translator never
    produces it.

    [`Error::EndOfStream`] and [`Error::WouldBlockRetry`] are expected
    control-flow conditions, not failures: end of stream terminates a read
    loop cleanly, and would-block means the same call should be retried once
    more input (or output capacity) is available.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Error {
    /// Clean end of input. Terminal, but not a failure.
    EndOfStream,
    /// Transient condition. The caller must retry the call later.
    WouldBlockRetry,
    /// Malformed input data.
    InvalidData,
    /// Valid but unhandled input (unknown container, missing codec, ...).
    Unsupported,
    /// Allocation or capacity failure in the native library.
    ResourceExhausted,
    /// Wrapper used after its native handle was released.
    ContextClosed,
    /// Unmapped native code, carrying the raw value for diagnostics.
    Unknown(i32),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EndOfStream => write!(f, "end of stream"),
            Self::WouldBlockRetry => write!(f, "resource temporarily unavailable, retry"),
            Self::InvalidData => write!(f, "invalid data found when processing input"),
            Self::Unsupported => write!(f, "input is valid but not supported"),
            Self::ResourceExhausted => write!(f, "native resource exhausted"),
            Self::ContextClosed => write!(f, "context already closed"),
            Self::Unknown(code) => write!(f, "unknown native error (code {code})"),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /**
        Returns true if this is the clean end-of-stream condition.
    */
    pub const fn is_end_of_stream(self) -> bool {
        matches!(self, Self::EndOfStream)
    }

    /**
        Returns true if this is the transient would-block condition.
    */
    pub const fn is_retry(self) -> bool {
        matches!(self, Self::WouldBlockRetry)
    }

    /**
        Returns true for real failures.

        End of stream and would-block are expected conditions and are not
        failures; everything else is.
    */
    pub const fn is_failure(self) -> bool {
        !matches!(self, Self::EndOfStream | Self::WouldBlockRetry)
    }
}

/**
    Result type alias for the libav binding crates.
*/
pub type Result<T> = std::result::Result<T, Error>;

// Errors cross thread boundaries in caller code even though sessions do not.
static_assertions::assert_impl_all!(Error: Send, Sync);
