//! Per-type encoding capabilities and the wrapper value types.
//!
//! A type advertises a capability by returning `Some(self)` from the matching
//! [`Reflect`] accessor. When a type offers several, the engine uses the first
//! one in this order:
//!
//! 1. [`SelfEncode`]
//! 2. an extension registered on the [`Handle`](crate::Handle)
//! 3. [`BinaryMarshal`]
//! 4. [`TextMarshal`]
//! 5. [`JsonMarshal`]
//! 6. [`Raw`] pass-through
//! 7. the built-in handling for the value's [`Kind`](crate::Kind)

use crate::{
    encode::Emit,
    error::{BoxError, EncodeError},
    reflect::{Reflect, SeqValue, Value},
    type_info::{Kind, TypeInfo},
};

/// A type that drives its own encoding through the engine.
///
/// # Example
///
/// ```ignore
/// impl SelfEncode for Celsius {
///     fn encode_self(&self, e: &mut dyn Emit) -> Result<(), EncodeError> {
///         e.array_start(2)?;
///         e.array_elem()?;
///         e.emit_str("C")?;
///         e.array_elem()?;
///         e.emit_f64(self.0)?;
///         e.array_end()
///     }
/// }
/// ```
pub trait SelfEncode {
    /// Writes `self` through `e`.
    ///
    /// # Errors
    ///
    /// Returns any error produced while writing, including errors of nested
    /// encodes started with [`Emit::encode`].
    fn encode_self(&self, e: &mut dyn Emit) -> Result<(), EncodeError>;
}

/// A type with a binary serialization; the bytes are written as a raw byte
/// string.
pub trait BinaryMarshal {
    /// Serializes `self` into bytes.
    ///
    /// # Errors
    ///
    /// Any error is reported as
    /// [`EncodeError::CustomMarshalFailure`].
    fn marshal_binary(&self) -> Result<Vec<u8>, BoxError>;
}

/// A type with a textual serialization; the text is written as a UTF-8
/// string.
pub trait TextMarshal {
    /// Serializes `self` into text.
    ///
    /// # Errors
    ///
    /// Any error is reported as
    /// [`EncodeError::CustomMarshalFailure`].
    fn marshal_text(&self) -> Result<String, BoxError>;
}

/// A type with a JSON serialization; the bytes are written to the output
/// verbatim, so this is only meaningful for JSON-like wire formats.
pub trait JsonMarshal {
    /// Serializes `self` into a JSON document.
    ///
    /// # Errors
    ///
    /// Any error is reported as
    /// [`EncodeError::CustomMarshalFailure`].
    fn marshal_json(&self) -> Result<Vec<u8>, BoxError>;
}

/// A struct carrying dynamic fields beyond its declared ones.
///
/// A struct with this capability is always encoded as a map; the extra
/// fields follow the declared ones.
pub trait MissingFields {
    /// Returns the extra fields as name/value pairs.
    fn missing_fields(&self) -> Vec<(String, Box<dyn Reflect>)>;
}

// =============================================================================
// Wrapper value types
// =============================================================================

/// Bytes that are already in the target wire format.
///
/// Written verbatim when [`CodecOptions::raw`](crate::CodecOptions::raw) is
/// set; rejected with [`EncodeError::RawDisallowed`] otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Raw(pub Vec<u8>);

impl Reflect for Raw {
    fn describe(&self) -> TypeInfo { TypeInfo::of_kind::<Self>(Kind::Raw) }

    fn reflect(&self) -> Value<'_> { Value::Raw(&self.0) }
}

/// An extension value that already carries its tag and payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RawExt {
    /// The application-defined extension tag.
    pub tag: u64,

    /// The encoded payload.
    pub data: Vec<u8>,
}

impl Reflect for RawExt {
    fn describe(&self) -> TypeInfo { TypeInfo::of_kind::<Self>(Kind::RawExt) }

    fn reflect(&self) -> Value<'_> { Value::RawExt(self) }
}

/// A sequence of alternating keys and values encoded as a map.
///
/// ```ignore
/// let pairs = MapBySlice(vec!["a".to_owned(), "1".to_owned()]);
/// encoder.encode(&pairs)?; // map of one entry: "a" => "1"
/// ```
///
/// An odd number of elements fails with
/// [`EncodeError::MalformedFlattenedSequence`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct MapBySlice<T>(pub T);

impl<T: Reflect + SeqValue> Reflect for MapBySlice<T> {
    fn describe(&self) -> TypeInfo {
        self.0.describe().rebind::<Self>().map_by_slice()
    }

    fn reflect(&self) -> Value<'_> { Value::Seq(&self.0) }
}
