//! The wire-format driver contract.
//!
//! A [`Driver`] is the thin, format-specific half of an encoder. The engine
//! decides *what* to write and in which nesting order; the driver decides
//! *how* each primitive looks on the wire. Every method receives the
//! [`EncWriter`] owned by the encoder, so drivers hold no output state of
//! their own.
//!
//! # Example
//!
//! ```ignore
//! use std::{io::{self, Write}, time::SystemTime};
//! use trellis_codec::{Driver, EncWriter};
//!
//! #[derive(Default)]
//! struct Tagged;
//!
//! impl Driver for Tagged {
//!     fn encode_nil(&mut self, w: &mut EncWriter) -> io::Result<()> {
//!         w.write_u8(0)
//!     }
//!
//!     fn encode_int(&mut self, w: &mut EncWriter, v: i64) -> io::Result<()> {
//!         w.write_u8(1)?;
//!         w.write_all(&v.to_le_bytes())
//!     }
//!
//!     // ... implement the other required methods
//! }
//! ```

use std::{io, time::SystemTime};

use crate::{marshal::RawExt, options::CodecOptions, writer::EncWriter};

/// The container context an encoder is currently writing into.
///
/// The encoder updates its state *after* invoking a separator hook, so a hook
/// receives the state that was current before it, e.g. a text format can skip
/// the comma in front of the first array element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContainerState {
    /// Not inside any container.
    #[default]
    None,

    /// A map was just started.
    MapStart,

    /// A map key is being written.
    MapKey,

    /// A map value is being written.
    MapValue,

    /// An array was just started.
    ArrayStart,

    /// An array element is being written.
    ArrayElem,
}

/// Primitive write operations for one wire format.
///
/// Methods with default implementations are optional hooks; binary formats
/// typically leave the separator and end-of-container hooks as no-ops.
pub trait Driver {
    // =========================================================================
    // Required methods
    // =========================================================================

    /// Writes a nil value.
    fn encode_nil(&mut self, w: &mut EncWriter) -> io::Result<()>;

    /// Writes a signed integer.
    fn encode_int(&mut self, w: &mut EncWriter, v: i64) -> io::Result<()>;

    /// Writes an unsigned integer.
    fn encode_uint(&mut self, w: &mut EncWriter, v: u64) -> io::Result<()>;

    /// Writes a boolean.
    fn encode_bool(&mut self, w: &mut EncWriter, v: bool) -> io::Result<()>;

    /// Writes a 32-bit float.
    fn encode_f32(&mut self, w: &mut EncWriter, v: f32) -> io::Result<()>;

    /// Writes a 64-bit float.
    fn encode_f64(&mut self, w: &mut EncWriter, v: f64) -> io::Result<()>;

    /// Writes a UTF-8 string.
    fn encode_string(&mut self, w: &mut EncWriter, v: &str) -> io::Result<()>;

    /// Writes an uninterpreted byte string.
    fn encode_string_bytes_raw(
        &mut self,
        w: &mut EncWriter,
        v: &[u8],
    ) -> io::Result<()>;

    /// Writes a timestamp.
    fn encode_time(&mut self, w: &mut EncWriter, v: SystemTime)
    -> io::Result<()>;

    /// Writes an extension payload produced by a registered
    /// [`Ext`](crate::Ext) under its application-defined tag.
    fn encode_ext(
        &mut self,
        w: &mut EncWriter,
        tag: u64,
        data: &[u8],
    ) -> io::Result<()>;

    /// Starts an array of `len` elements.
    fn write_array_start(
        &mut self,
        w: &mut EncWriter,
        len: usize,
    ) -> io::Result<()>;

    /// Starts a map of `len` key/value pairs.
    fn write_map_start(&mut self, w: &mut EncWriter, len: usize)
    -> io::Result<()>;

    // =========================================================================
    // Optional hooks
    // =========================================================================

    /// Writes a pre-tagged extension value.
    ///
    /// Default implementation forwards to [`encode_ext`](Self::encode_ext).
    fn encode_raw_ext(
        &mut self,
        w: &mut EncWriter,
        ext: &RawExt,
    ) -> io::Result<()> {
        self.encode_ext(w, ext.tag, &ext.data)
    }

    /// Writes a struct field name used as a map key.
    ///
    /// `ascii_alnum` is `true` when the name is a plain ASCII identifier and
    /// needs no escaping. Default implementation writes a string.
    fn encode_field_name(
        &mut self,
        w: &mut EncWriter,
        name: &str,
        ascii_alnum: bool,
    ) -> io::Result<()> {
        let _ = ascii_alnum;
        self.encode_string(w, name)
    }

    /// Ends the current array.
    fn write_array_end(&mut self, w: &mut EncWriter) -> io::Result<()> {
        let _ = w;
        Ok(())
    }

    /// Ends the current map.
    fn write_map_end(&mut self, w: &mut EncWriter) -> io::Result<()> {
        let _ = w;
        Ok(())
    }

    /// Called before each array element.
    fn write_array_elem(
        &mut self,
        w: &mut EncWriter,
        prev: ContainerState,
    ) -> io::Result<()> {
        let _ = (w, prev);
        Ok(())
    }

    /// Called before each map key.
    fn write_map_elem_key(
        &mut self,
        w: &mut EncWriter,
        prev: ContainerState,
    ) -> io::Result<()> {
        let _ = (w, prev);
        Ok(())
    }

    /// Called between a map key and its value.
    fn write_map_elem_value(
        &mut self,
        w: &mut EncWriter,
        prev: ContainerState,
    ) -> io::Result<()> {
        let _ = (w, prev);
        Ok(())
    }

    /// Whether the format is JSON, so output of a
    /// [`JsonMarshal`](crate::JsonMarshal) can be written into it as-is.
    /// Other formats encode such values by their kind.
    fn writes_json(&self) -> bool { false }

    /// Clears per-stream driver state when the encoder is rebound to a new
    /// output target.
    fn reset(&mut self, options: &CodecOptions) { let _ = options; }

    /// Called once the outermost encode call has completed.
    fn at_end_of_encode(&mut self, w: &mut EncWriter) -> io::Result<()> {
        let _ = w;
        Ok(())
    }
}
