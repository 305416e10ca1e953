//! Error types for the parser core.
//!
//! Recoverable syntax problems are not errors in this sense: they are reported
//! through the [`Logger`](lorikeet_common::Logger) and parsing continues. The
//! types here describe what actually stops a parse.

use lorikeet_common::Diagnostic;
use thiserror::Error;

/// Failure of the byte-stream collaborator.
#[derive(Debug, Error)]
pub enum InputError {
    /// The underlying reader failed.
    #[error("failed to read input: {0}")]
    Read(#[from] std::io::Error),
}

/// No transcoder is available for a character encoding label.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscoderError {
    /// The label names no known character encoding.
    #[error("character encoding '{0}' is not available")]
    Unavailable(String),
}

/// Failure of the [`Resolver`](crate::Resolver) collaborator.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Nothing could be found under the given identifiers.
    #[error("no resource for public id '{public_ident}', system id '{system_ident}'")]
    NotFound {
        /// Public identifier, possibly empty.
        public_ident: String,
        /// System identifier, possibly empty.
        system_ident: String,
    },
    /// The resource exists but could not be opened.
    #[error("failed to open '{uri}': {source}")]
    Io {
        /// The resolved URI.
        uri: String,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The resolver does not handle this kind of identifier.
    #[error("unsupported identifier '{0}'")]
    Unsupported(String),
}

/// Reason a parse was aborted.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The byte stream failed.
    #[error(transparent)]
    Input(#[from] InputError),
    /// The input uses a construct whose semantics are deliberately not
    /// implemented. The parser refuses to guess.
    #[error("{0} are not yet implemented")]
    Unimplemented(&'static str),
    /// A problem was reported while `die_on_first_error` was in effect.
    #[error("{0}")]
    Fatal(Diagnostic),
}

impl ParseError {
    /// True for the "not implemented" signal.
    #[must_use]
    pub const fn is_unimplemented(&self) -> bool {
        matches!(self, Self::Unimplemented(_))
    }
}
