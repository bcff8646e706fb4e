//! Encoding configuration.
//!
//! [`CodecOptions`] is fixed for the lifetime of a [`Handle`](crate::Handle)
//! and therefore for every encoder built from it.
//!
//! ```ignore
//! use std::time::Duration;
//! use trellis_codec::{ChanRecvTimeout, CodecOptions};
//!
//! let options = CodecOptions::builder()
//!     .canonical(true)
//!     .check_circular_ref(true)
//!     .chan_recv_timeout(ChanRecvTimeout::For(Duration::from_millis(50)))
//!     .build();
//! ```

use std::time::Duration;

use bon::Builder;

/// How long a channel value is drained before it is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChanRecvTimeout {
    /// Consume only the elements currently buffered; never blocks.
    #[default]
    Available,

    /// Consume until the channel is closed; may block indefinitely.
    UntilClosed,

    /// Consume until the duration has elapsed or the channel is closed.
    For(Duration),
}

/// Options that control how values are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Builder)]
#[allow(clippy::struct_excessive_bools)]
pub struct CodecOptions {
    /// The capacity of the internal buffer placed in front of a stream
    /// target. Zero writes straight through to the stream.
    #[builder(default)]
    pub writer_buffer_size: usize,

    /// The drain policy for channel values.
    #[builder(default)]
    pub chan_recv_timeout: ChanRecvTimeout,

    /// Encode every struct positionally as an array instead of a map.
    #[builder(default)]
    pub struct_to_array: bool,

    /// Produce deterministic output: map keys are sorted and struct fields
    /// are written in key order.
    #[builder(default)]
    pub canonical: bool,

    /// Fail fast when a struct pointer is reached twice on the same path.
    #[builder(default)]
    pub check_circular_ref: bool,

    /// Decide emptiness by descending into pointers, interfaces and struct
    /// fields instead of comparing against the zero value.
    #[builder(default)]
    pub recursive_empty_check: bool,

    /// Allow [`Raw`](crate::Raw) values to be written verbatim.
    #[builder(default)]
    pub raw: bool,

    /// Encode strings as uninterpreted byte strings.
    #[builder(default)]
    pub string_to_raw: bool,

    /// Hint for drivers to prefer the smallest representation.
    #[builder(default)]
    pub optimum_size: bool,
}

impl Default for CodecOptions {
    fn default() -> Self { Self::builder().build() }
}
