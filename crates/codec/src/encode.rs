//! The encoder: dispatch, traversal, and the container-nesting contract.
//!
//! An [`Encoder`] pairs a wire-format [`Driver`] with an output target and a
//! shared [`Handle`]. Each [`Encoder::encode`] call walks one value top-down:
//!
//! 1. nil values are written as nil
//! 2. pointers are dereferenced, and with
//!    [`check_circular_ref`](CodecOptions::check_circular_ref) set, struct
//!    targets are tracked on an identity stack for the duration of their
//!    encode
//! 3. interfaces are unwrapped to their concrete value
//! 4. the value's [`Strategy`] is looked up (and cached) by concrete type
//! 5. the strategy writes the value, recursing into children
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use trellis_codec::{Encoder, Handle};
//!
//! let handle = Arc::new(Handle::default());
//! let mut encoder =
//!     Encoder::to_bytes(MyDriver::default(), handle, Vec::new());
//!
//! encoder.encode(&vec![1u32, 2, 3])?;
//! let bytes = encoder.take_bytes();
//! ```

use std::{
    any::TypeId,
    fmt::Debug,
    io::{self, Write},
    mem,
    sync::Arc,
    time::SystemTime,
};

use crate::{
    driver::{ContainerState, Driver},
    error::EncodeError,
    handle::{CodecFn, Handle, Strategy},
    options::CodecOptions,
    reflect::{Pointer, Reflect, Value, type_id_of},
    registry,
    type_info::{Kind, TypeInfo},
    writer::EncWriter,
};

mod maps;
mod seq;
mod structs;

/// A cached strategy slot owned by the caller of `encode_value`. Containers
/// keep one across their elements so homogeneous elements skip the handle
/// lookup.
pub(crate) type FnSlot = Option<Arc<CodecFn>>;

/// The encoding surface handed to [`SelfEncode`](crate::SelfEncode)
/// implementations.
///
/// Container methods must be called in the same order the engine uses:
/// `array_start`, then `array_elem` before every element, then `array_end`;
/// `map_start`, then `map_key` before every key and `map_value` before every
/// value, then `map_end`.
pub trait Emit {
    /// The options of the encoder.
    fn options(&self) -> &CodecOptions;

    /// Encodes a nested value with the full engine.
    ///
    /// # Errors
    ///
    /// Returns any error the nested encode produces.
    fn encode(&mut self, value: &dyn Reflect) -> Result<(), EncodeError>;

    /// Writes nil.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the output fails.
    fn emit_nil(&mut self) -> Result<(), EncodeError>;

    /// Writes a boolean.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the output fails.
    fn emit_bool(&mut self, v: bool) -> Result<(), EncodeError>;

    /// Writes a signed integer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the output fails.
    fn emit_int(&mut self, v: i64) -> Result<(), EncodeError>;

    /// Writes an unsigned integer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the output fails.
    fn emit_uint(&mut self, v: u64) -> Result<(), EncodeError>;

    /// Writes a 32-bit float.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the output fails.
    fn emit_f32(&mut self, v: f32) -> Result<(), EncodeError>;

    /// Writes a 64-bit float.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the output fails.
    fn emit_f64(&mut self, v: f64) -> Result<(), EncodeError>;

    /// Writes a UTF-8 string, regardless of
    /// [`string_to_raw`](CodecOptions::string_to_raw).
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the output fails.
    fn emit_str(&mut self, v: &str) -> Result<(), EncodeError>;

    /// Writes a raw byte string.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the output fails.
    fn emit_bytes(&mut self, v: &[u8]) -> Result<(), EncodeError>;

    /// Writes a timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the output fails.
    fn emit_time(&mut self, v: SystemTime) -> Result<(), EncodeError>;

    /// Writes an extension payload under `tag`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the output fails.
    fn emit_ext(&mut self, tag: u64, data: &[u8]) -> Result<(), EncodeError>;

    /// Starts an array of `len` elements.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the output fails.
    fn array_start(&mut self, len: usize) -> Result<(), EncodeError>;

    /// Precedes each array element.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the output fails.
    fn array_elem(&mut self) -> Result<(), EncodeError>;

    /// Ends the current array.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the output fails.
    fn array_end(&mut self) -> Result<(), EncodeError>;

    /// Starts a map of `len` entries.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the output fails.
    fn map_start(&mut self, len: usize) -> Result<(), EncodeError>;

    /// Precedes each map key.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the output fails.
    fn map_key(&mut self) -> Result<(), EncodeError>;

    /// Precedes each map value.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the output fails.
    fn map_value(&mut self) -> Result<(), EncodeError>;

    /// Ends the current map.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the output fails.
    fn map_end(&mut self) -> Result<(), EncodeError>;
}

#[derive(Debug, Clone, Copy)]
struct FieldRecord {
    index: usize,
    as_nil: bool,
}

/// Encodes values through a [`Driver`] into one output target at a time.
///
/// An encoder is built once and rebound to new outputs with
/// [`reset`](Self::reset) or [`reset_bytes`](Self::reset_bytes). It is not
/// meant to be shared between threads; the [`Handle`] it holds is.
pub struct Encoder<D> {
    driver: D,
    handle: Arc<Handle>,
    wr: EncWriter,

    scratch: Vec<u8>,
    key_bufs: Vec<Vec<u8>>,
    field_pool: Vec<Vec<FieldRecord>>,

    circular: Vec<(TypeId, usize)>,
    container: ContainerState,
    calls: usize,
}

impl<D: Driver> Encoder<D> {
    /// Creates an encoder without an output target.
    ///
    /// Every [`encode`](Self::encode) fails with
    /// [`EncodeError::Uninitialized`] until one of the reset methods is
    /// called.
    #[must_use]
    pub fn new(driver: D, handle: Arc<Handle>) -> Self {
        Self {
            driver,
            handle,
            wr: EncWriter::unset(),
            scratch: Vec::new(),
            key_bufs: Vec::new(),
            field_pool: Vec::new(),
            circular: Vec::new(),
            container: ContainerState::None,
            calls: 0,
        }
    }

    /// Creates an encoder appending to `buf`.
    #[must_use]
    pub fn to_bytes(driver: D, handle: Arc<Handle>, buf: Vec<u8>) -> Self {
        let mut encoder = Self::new(driver, handle);
        encoder.reset_bytes(buf);
        encoder
    }

    /// Creates an encoder writing to `writer`.
    #[must_use]
    pub fn to_writer(
        driver: D,
        handle: Arc<Handle>,
        writer: impl Write + Send + 'static,
    ) -> Self {
        let mut encoder = Self::new(driver, handle);
        encoder.reset(writer);
        encoder
    }

    /// Rebinds the encoder to `writer`, buffered per
    /// [`writer_buffer_size`](CodecOptions::writer_buffer_size).
    pub fn reset(&mut self, writer: impl Write + Send + 'static) {
        let size = self.handle.options().writer_buffer_size;
        self.wr = EncWriter::stream(Box::new(writer), size);
        self.reset_state();
    }

    /// Rebinds the encoder to append to `buf`.
    pub fn reset_bytes(&mut self, buf: Vec<u8>) {
        self.wr = EncWriter::bytes(buf);
        self.reset_state();
    }

    fn reset_state(&mut self) {
        self.container = ContainerState::None;
        self.calls = 0;
        self.circular.clear();
        self.driver.reset(self.handle.options());

        tracing::debug!(writer = ?self.wr, "encoder reset");
    }

    /// The bytes written so far to an in-memory target.
    #[must_use]
    pub fn bytes(&self) -> Option<&[u8]> { self.wr.as_bytes() }

    /// Takes the bytes written so far to an in-memory target.
    pub fn take_bytes(&mut self) -> Option<Vec<u8>> { self.wr.take_bytes() }

    /// The container context of the value currently being written.
    #[must_use]
    pub const fn container_state(&self) -> ContainerState { self.container }

    /// The handle shared with other encoders.
    #[must_use]
    pub const fn handle(&self) -> &Arc<Handle> { &self.handle }

    /// The wire-format driver.
    #[must_use]
    pub const fn driver(&self) -> &D { &self.driver }

    /// The wire-format driver, mutably.
    pub const fn driver_mut(&mut self) -> &mut D { &mut self.driver }

    /// The options of the handle.
    #[must_use]
    pub fn options(&self) -> &CodecOptions { self.handle.options() }

    /// Encodes `value` to the output target.
    ///
    /// Calls may nest, e.g. from a [`SelfEncode`](crate::SelfEncode)
    /// implementation; the driver's end-of-encode hook runs and buffered
    /// output is flushed only when the outermost call completes.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::Uninitialized`] if no output target is set, or
    /// the first error met while walking `value`. Output written before the
    /// failure stays written.
    pub fn encode(&mut self, value: &dyn Reflect) -> Result<(), EncodeError> {
        if !self.wr.is_set() {
            return Err(EncodeError::Uninitialized);
        }

        self.calls += 1;
        let result = self.encode_value(value, &mut None);
        self.calls -= 1;

        // nested calls leave cleanup and flushing to the outermost one
        if self.calls > 0 {
            return result;
        }

        if let Err(error) = result {
            self.circular.clear();
            self.container = ContainerState::None;
            return Err(error);
        }

        self.driver.at_end_of_encode(&mut self.wr)?;
        self.wr.end()?;

        Ok(())
    }

    /// Encodes `value`, panicking on failure.
    ///
    /// # Panics
    ///
    /// Panics with the error [`encode`](Self::encode) would have returned.
    pub fn must_encode(&mut self, value: &dyn Reflect) {
        if let Err(error) = self.encode(value) {
            panic!("encode failed: {error}");
        }
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    pub(crate) fn encode_value(
        &mut self,
        value: &dyn Reflect,
        slot: &mut FnSlot,
    ) -> Result<(), EncodeError> {
        let mut pushed = 0;
        let result = self.encode_deref(value, slot, &mut pushed);

        let keep = self.circular.len().saturating_sub(pushed);
        self.circular.truncate(keep);

        result
    }

    fn encode_deref(
        &mut self,
        mut value: &dyn Reflect,
        slot: &mut FnSlot,
        pushed: &mut usize,
    ) -> Result<(), EncodeError> {
        let view = loop {
            match value.reflect() {
                Value::Nil => return Ok(self.driver.encode_nil(&mut self.wr)?),
                Value::Ptr(ptr) => {
                    if self.handle.options().check_circular_ref {
                        self.enter_pointer(ptr, pushed)?;
                    }
                    value = ptr.target();
                }
                Value::Interface(inner) => value = inner,
                view => break view,
            }
        };

        let codec = self.resolve(value, slot);
        self.encode_with(value, view, &codec)
    }

    fn enter_pointer(
        &mut self,
        ptr: Pointer<'_>,
        pushed: &mut usize,
    ) -> Result<(), EncodeError> {
        let info = registry::type_info_for(ptr.target());
        if info.kind() != Kind::Struct {
            return Ok(());
        }

        let identity = (info.type_id(), ptr.addr());
        if self.circular.contains(&identity) {
            tracing::debug!(
                type_name = info.name(),
                address = ptr.addr(),
                depth = self.circular.len(),
                "circular reference detected"
            );

            return Err(EncodeError::CircularReference {
                type_name: info.name(),
                address: ptr.addr(),
            });
        }

        self.circular.push(identity);
        *pushed += 1;
        Ok(())
    }

    fn resolve(&self, value: &dyn Reflect, slot: &mut FnSlot) -> Arc<CodecFn> {
        let type_id = type_id_of(value);

        match slot {
            Some(codec) if codec.info().type_id() == type_id => codec.clone(),
            _ => {
                let codec = self.handle.codec_fn(value);
                *slot = Some(codec.clone());
                codec
            }
        }
    }

    fn encode_with(
        &mut self,
        value: &dyn Reflect,
        view: Value<'_>,
        codec: &CodecFn,
    ) -> Result<(), EncodeError> {
        let info = codec.info();
        let name = info.name();

        match codec.strategy() {
            Strategy::SelfEncode => match value.as_self_encode() {
                Some(this) => this.encode_self(self),
                None => self.encode_builtin(value, view, info),
            },

            Strategy::Ext(entry) => {
                let data = entry
                    .ext()
                    .write_ext(value)
                    .map_err(|e| EncodeError::custom(name, e))?;
                self.driver.encode_ext(&mut self.wr, entry.tag(), &data)?;
                Ok(())
            }

            Strategy::BinaryMarshal => match value.as_binary_marshal() {
                Some(this) => {
                    let bytes = this
                        .marshal_binary()
                        .map_err(|e| EncodeError::custom(name, e))?;
                    self.driver.encode_string_bytes_raw(&mut self.wr, &bytes)?;
                    Ok(())
                }
                None => self.encode_builtin(value, view, info),
            },

            Strategy::TextMarshal => match value.as_text_marshal() {
                Some(this) => {
                    let text = this
                        .marshal_text()
                        .map_err(|e| EncodeError::custom(name, e))?;
                    self.driver.encode_string(&mut self.wr, &text)?;
                    Ok(())
                }
                None => self.encode_builtin(value, view, info),
            },

            Strategy::JsonMarshal => match value.as_json_marshal() {
                Some(this) if self.driver.writes_json() => {
                    let doc = this
                        .marshal_json()
                        .map_err(|e| EncodeError::custom(name, e))?;
                    self.wr.write_all(&doc)?;
                    Ok(())
                }
                _ => self.encode_builtin(value, view, info),
            },

            Strategy::Raw | Strategy::Kind(_) => {
                self.encode_builtin(value, view, info)
            }
        }
    }

    fn encode_builtin(
        &mut self,
        value: &dyn Reflect,
        view: Value<'_>,
        info: &TypeInfo,
    ) -> Result<(), EncodeError> {
        let w = &mut self.wr;

        match view {
            Value::Nil => self.driver.encode_nil(w)?,
            Value::Bool(v) => self.driver.encode_bool(w, v)?,
            Value::Int(v) => self.driver.encode_int(w, v)?,
            Value::Uint(v) => self.driver.encode_uint(w, v)?,
            Value::F32(v) => self.driver.encode_f32(w, v)?,
            Value::F64(v) => self.driver.encode_f64(w, v)?,
            Value::Str(v) => {
                if self.handle.options().string_to_raw {
                    self.driver.encode_string_bytes_raw(w, v.as_bytes())?;
                } else {
                    self.driver.encode_string(w, v)?;
                }
            }
            Value::Bytes(v) => self.driver.encode_string_bytes_raw(w, v)?,
            Value::Time(v) => self.driver.encode_time(w, v)?,
            Value::Raw(v) => {
                if !self.handle.options().raw {
                    return Err(EncodeError::RawDisallowed { len: v.len() });
                }
                w.write_all(v)?;
            }
            Value::RawExt(v) => self.driver.encode_raw_ext(w, v)?,

            Value::Seq(seq) => return self.encode_seq(seq, info),
            Value::Map(map) => return self.encode_map(map, info),
            Value::Struct(fields) => {
                return self.encode_struct(value, fields, info);
            }
            Value::Chan(chan) => return self.encode_chan(chan, info),

            Value::Ptr(ptr) => {
                return self.encode_value(ptr.target(), &mut None);
            }
            Value::Interface(inner) => {
                return self.encode_value(inner, &mut None);
            }
            Value::Func => {
                return Err(EncodeError::Unsupported {
                    type_name: info.name(),
                    reason: "function values have no encoding",
                });
            }
        }

        Ok(())
    }

    // =========================================================================
    // Container tracking
    // =========================================================================

    fn write_array_start(&mut self, len: usize) -> io::Result<()> {
        self.driver.write_array_start(&mut self.wr, len)?;
        self.container = ContainerState::ArrayStart;
        Ok(())
    }

    fn write_array_elem(&mut self) -> io::Result<()> {
        self.driver.write_array_elem(&mut self.wr, self.container)?;
        self.container = ContainerState::ArrayElem;
        Ok(())
    }

    fn write_array_end(&mut self) -> io::Result<()> {
        self.driver.write_array_end(&mut self.wr)?;
        self.container = ContainerState::None;
        Ok(())
    }

    fn write_map_start(&mut self, len: usize) -> io::Result<()> {
        self.driver.write_map_start(&mut self.wr, len)?;
        self.container = ContainerState::MapStart;
        Ok(())
    }

    fn write_map_elem_key(&mut self) -> io::Result<()> {
        self.driver.write_map_elem_key(&mut self.wr, self.container)?;
        self.container = ContainerState::MapKey;
        Ok(())
    }

    fn write_map_elem_value(&mut self) -> io::Result<()> {
        self.driver.write_map_elem_value(&mut self.wr, self.container)?;
        self.container = ContainerState::MapValue;
        Ok(())
    }

    fn write_map_end(&mut self) -> io::Result<()> {
        self.driver.write_map_end(&mut self.wr)?;
        self.container = ContainerState::None;
        Ok(())
    }

    /// Encodes `value` into `buf` instead of the output target, for ordering
    /// canonical map keys by their encoded form.
    fn encode_detached(
        &mut self,
        value: &dyn Reflect,
        buf: Vec<u8>,
    ) -> Result<Vec<u8>, EncodeError> {
        let outer = mem::replace(&mut self.wr, EncWriter::bytes(buf));
        let container =
            mem::replace(&mut self.container, ContainerState::MapKey);

        let result = self.encode_value(value, &mut None).and_then(|()| {
            Ok(self.driver.at_end_of_encode(&mut self.wr)?)
        });

        let mut detached = mem::replace(&mut self.wr, outer);
        self.container = container;

        result.map(|()| detached.take_bytes().unwrap_or_default())
    }
}

impl<D: Driver> Emit for Encoder<D> {
    fn options(&self) -> &CodecOptions { self.handle.options() }

    fn encode(&mut self, value: &dyn Reflect) -> Result<(), EncodeError> {
        Self::encode(self, value)
    }

    fn emit_nil(&mut self) -> Result<(), EncodeError> {
        Ok(self.driver.encode_nil(&mut self.wr)?)
    }

    fn emit_bool(&mut self, v: bool) -> Result<(), EncodeError> {
        Ok(self.driver.encode_bool(&mut self.wr, v)?)
    }

    fn emit_int(&mut self, v: i64) -> Result<(), EncodeError> {
        Ok(self.driver.encode_int(&mut self.wr, v)?)
    }

    fn emit_uint(&mut self, v: u64) -> Result<(), EncodeError> {
        Ok(self.driver.encode_uint(&mut self.wr, v)?)
    }

    fn emit_f32(&mut self, v: f32) -> Result<(), EncodeError> {
        Ok(self.driver.encode_f32(&mut self.wr, v)?)
    }

    fn emit_f64(&mut self, v: f64) -> Result<(), EncodeError> {
        Ok(self.driver.encode_f64(&mut self.wr, v)?)
    }

    fn emit_str(&mut self, v: &str) -> Result<(), EncodeError> {
        Ok(self.driver.encode_string(&mut self.wr, v)?)
    }

    fn emit_bytes(&mut self, v: &[u8]) -> Result<(), EncodeError> {
        Ok(self.driver.encode_string_bytes_raw(&mut self.wr, v)?)
    }

    fn emit_time(&mut self, v: SystemTime) -> Result<(), EncodeError> {
        Ok(self.driver.encode_time(&mut self.wr, v)?)
    }

    fn emit_ext(&mut self, tag: u64, data: &[u8]) -> Result<(), EncodeError> {
        Ok(self.driver.encode_ext(&mut self.wr, tag, data)?)
    }

    fn array_start(&mut self, len: usize) -> Result<(), EncodeError> {
        Ok(self.write_array_start(len)?)
    }

    fn array_elem(&mut self) -> Result<(), EncodeError> {
        Ok(self.write_array_elem()?)
    }

    fn array_end(&mut self) -> Result<(), EncodeError> {
        Ok(self.write_array_end()?)
    }

    fn map_start(&mut self, len: usize) -> Result<(), EncodeError> {
        Ok(self.write_map_start(len)?)
    }

    fn map_key(&mut self) -> Result<(), EncodeError> {
        Ok(self.write_map_elem_key()?)
    }

    fn map_value(&mut self) -> Result<(), EncodeError> {
        Ok(self.write_map_elem_value()?)
    }

    fn map_end(&mut self) -> Result<(), EncodeError> {
        Ok(self.write_map_end()?)
    }
}

impl<D> Debug for Encoder<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encoder")
            .field("writer", &self.wr)
            .field("container", &self.container)
            .field("calls", &self.calls)
            .field("circular", &self.circular.len())
            .finish_non_exhaustive()
    }
}
