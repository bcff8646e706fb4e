//! Errors surfaced by an encode call.
//!
//! Every failure during a traversal is reported as a single [`EncodeError`]
//! returned from [`Encoder::encode`](crate::Encoder::encode). Output already
//! written to the sink before the failure is not retracted; callers that need
//! atomic output should encode into a byte buffer first.

use std::io;

use crate::type_info::KeyType;

/// A boxed error returned by user-supplied marshal and extension hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The terminal failure of an encode call.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EncodeError {
    /// An encode was attempted before an output target was configured.
    #[error("encoder not initialized: no output target has been set")]
    Uninitialized,

    /// The value's runtime kind has no encoding strategy.
    #[error("unsupported value of type `{type_name}`: {reason}")]
    Unsupported {
        /// The concrete type that could not be encoded.
        type_name: &'static str,

        /// What about the value is unsupported.
        reason: &'static str,
    },

    /// A struct pointer was reached twice on the current encode path.
    #[error("circular reference found: {address:#x} of type `{type_name}`")]
    CircularReference {
        /// The struct type behind the pointer.
        type_name: &'static str,

        /// The address of the struct.
        address: usize,
    },

    /// A map-by-slice sequence had an odd number of elements.
    #[error("map-by-slice requires an even sequence length, got {len}")]
    MalformedFlattenedSequence {
        /// The offending length.
        len: usize,
    },

    /// A raw pre-encoded value was supplied while the `raw` option is off.
    #[error("raw value of {len} bytes rejected: the `raw` option is not set")]
    RawDisallowed {
        /// The number of raw bytes that were rejected.
        len: usize,
    },

    /// A channel without receive capability was supplied.
    #[error("send-only channel of type `{type_name}` cannot be encoded")]
    SendOnlyChannel {
        /// The channel type.
        type_name: &'static str,
    },

    /// A user-supplied marshal method or extension returned an error.
    #[error("custom marshaler for `{type_name}` failed")]
    CustomMarshalFailure {
        /// The type whose marshaler failed.
        type_name: &'static str,

        /// The error returned by the marshaler.
        #[source]
        source: BoxError,
    },

    /// A struct key could not be parsed as the struct's numeric key type.
    #[error("struct key `{key}` cannot be encoded as {key_type:?}")]
    InvalidKeyEncoding {
        /// The declared key text.
        key: String,

        /// The key type the struct requested.
        key_type: KeyType,
    },

    /// Writing to the output target failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl EncodeError {
    pub(crate) fn custom(type_name: &'static str, source: BoxError) -> Self {
        Self::CustomMarshalFailure { type_name, source }
    }
}
