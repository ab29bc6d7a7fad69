// vim: tw=80
//! Failures reported by test doubles.
use std::fmt;

use thiserror::Error;

use crate::{value::Value, verification::VerificationMode};

/// Result type used throughout mockingbird.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Machine-stable classification of an [`Error`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    /// Malformed pattern or verification configuration.
    Argument,
    /// A strict double received a call that no rule allows.
    UnexpectedInvocation,
    /// An answer could not be produced.
    Answer,
    /// A quantified or ordered expectation was not met.
    Verification,
    /// The signature checker rejected the shape of a call or declaration.
    Shape,
    /// A matcher was used incorrectly, e.g. reading an empty captor.
    Matcher,
    /// A `then_raise` answer.
    Raised,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Argument => "ArgumentError",
            ErrorKind::UnexpectedInvocation => "UnexpectedInvocation",
            ErrorKind::Answer => "AnswerError",
            ErrorKind::Verification => "VerificationError",
            ErrorKind::Shape => "ShapeError",
            ErrorKind::Matcher => "MatcherError",
            ErrorKind::Raised => "Raised",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every way a double can fail.
///
/// Errors are never retried or swallowed by mockingbird.  The `Display`
/// output is deterministic so that tests may compare it verbatim.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    #[error("{0}")]
    Argument(String),

    #[error("{message}")]
    UnexpectedInvocation {
        /// The offending call, rendered.
        call: String,
        /// Rules declared for the same member, most recent first.
        declared: Vec<String>,
        message: String,
    },

    #[error("{0}")]
    Answer(String),

    #[error("{message}")]
    Verification {
        /// The wanted invocation, rendered.
        wanted: String,
        /// The wanted count, when the failure is about a count.
        mode: Option<VerificationMode>,
        /// How many matching calls were counted against `mode`.
        actual: Option<usize>,
        /// The matching calls, rendered; empty means none.
        found: Vec<String>,
        /// Other recorded calls the failure cites.
        seen: Vec<String>,
        message: String,
    },

    #[error("{0}")]
    Shape(String),

    #[error("{0}")]
    Matcher(String),

    #[error("raised {0}")]
    Raised(Value),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Argument(_) => ErrorKind::Argument,
            Error::UnexpectedInvocation{..} => ErrorKind::UnexpectedInvocation,
            Error::Answer(_) => ErrorKind::Answer,
            Error::Verification{..} => ErrorKind::Verification,
            Error::Shape(_) => ErrorKind::Shape,
            Error::Matcher(_) => ErrorKind::Matcher,
            Error::Raised(_) => ErrorKind::Raised,
        }
    }

    pub(crate) fn argument(msg: impl Into<String>) -> Self {
        Error::Argument(msg.into())
    }

    /// A verification failure that is not about a call count.
    pub(crate) fn verification(wanted: impl Into<String>, seen: Vec<String>,
                               message: impl Into<String>) -> Self
    {
        Error::Verification {
            wanted: wanted.into(),
            mode: None,
            actual: None,
            found: Vec::new(),
            seen,
            message: message.into()
        }
    }

    /// Shorthand for verification failures that carry no call listing.
    pub(crate) fn verification_msg(wanted: impl Into<String>,
                                   message: impl Into<String>) -> Self
    {
        Error::verification(wanted, Vec::new(), message)
    }
}
