//! Codec error types.

use thiserror::Error;

/// Errors produced by the primitive codec and the tag-driven decoder.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The input slice is shorter than the declared read size.
    #[error("insufficient data: expected at least {expected} bytes, got {actual}")]
    InsufficientData {
        /// Bytes the read required.
        expected: usize,
        /// Bytes available.
        actual: usize,
    },

    /// A dynamic field (sequence, byte run, EBCDIC run) has no `size` tag.
    #[error("field '{field}' has no size tag")]
    MissingSize {
        /// The layout field missing its size.
        field: String,
    },

    /// A `size=Name` reference names a sibling that has not been decoded yet.
    #[error("field '{field}' references unknown sibling '{reference}'")]
    UnresolvedRef {
        /// The field carrying the reference.
        field: String,
        /// The sibling name that could not be resolved.
        reference: String,
    },

    /// Malformed tag syntax (e.g. `size=` with an empty value).
    #[error("malformed tag '{tag}'")]
    TagSyntax {
        /// The offending tag text.
        tag: String,
    },

    /// A decoded record does not contain the requested field.
    #[error("decoded record has no field '{name}'")]
    MissingField {
        /// The requested field name.
        name: String,
    },

    /// A decoded record field has a different kind than requested.
    #[error("field '{name}' is not a {expected}")]
    WrongKind {
        /// The requested field name.
        name: String,
        /// The kind the caller expected.
        expected: &'static str,
    },
}
