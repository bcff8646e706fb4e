//! The reflection surface the engine walks.
//!
//! Rust has no runtime reflection, so every encodable type opts in by
//! implementing [`Reflect`]. The trait has two halves:
//!
//! - [`Reflect::describe`] returns the static [`TypeInfo`] of the type. The
//!   registry calls it once per concrete type and caches the result for the
//!   rest of the process.
//! - [`Reflect::reflect`] returns the value's active runtime form as a
//!   [`Value`], borrowing from `self`.
//!
//! Containers expose their contents through the object-safe accessor traits
//! [`SeqValue`], [`MapValue`], [`StructValue`] and [`ChanValue`], so the
//! engine can traverse them without knowing their concrete types.
//!
//! # Example
//!
//! ```ignore
//! use trellis_codec::{Field, Reflect, StructValue, TypeInfo, Value};
//!
//! struct Point { x: i32, y: i32 }
//!
//! impl Reflect for Point {
//!     fn describe(&self) -> TypeInfo {
//!         TypeInfo::structure::<Self>()
//!             .field(Field::new("x"))
//!             .field(Field::new("y").omit_empty())
//!             .build()
//!     }
//!
//!     fn reflect(&self) -> Value<'_> { Value::Struct(self) }
//! }
//!
//! impl StructValue for Point {
//!     fn field(&self, index: usize) -> Option<&dyn Reflect> {
//!         match index {
//!             0 => Some(&self.x),
//!             1 => Some(&self.y),
//!             _ => None,
//!         }
//!     }
//! }
//! ```

use std::{
    any::{Any, TypeId},
    time::SystemTime,
};

use enum_as_inner::EnumAsInner;

use crate::{
    marshal::{
        BinaryMarshal, JsonMarshal, MissingFields, RawExt, SelfEncode,
        TextMarshal,
    },
    options::ChanRecvTimeout,
    type_info::TypeInfo,
};

mod impls;

/// A type the engine can encode.
///
/// Capability accessors must answer the same way for every value of a type:
/// the registry probes them once, on the first value it sees, and decides the
/// encoding strategy for the whole type from that answer.
pub trait Reflect: Any {
    /// Returns the static description of this type.
    ///
    /// The result must not depend on the value of `self`.
    fn describe(&self) -> TypeInfo;

    /// Returns the active runtime form of this value.
    fn reflect(&self) -> Value<'_>;

    /// Returns `true` for interface-like types whose concrete type varies per
    /// value. Containers never cache an element strategy for such types.
    fn is_dynamic() -> bool
    where
        Self: Sized,
    {
        false
    }

    /// Returns the self-describing encode method of this type, if any.
    fn as_self_encode(&self) -> Option<&dyn SelfEncode> { None }

    /// Returns the binary marshal capability of this type, if any.
    fn as_binary_marshal(&self) -> Option<&dyn BinaryMarshal> { None }

    /// Returns the text marshal capability of this type, if any.
    fn as_text_marshal(&self) -> Option<&dyn TextMarshal> { None }

    /// Returns the document (JSON) marshal capability of this type, if any.
    fn as_json_marshal(&self) -> Option<&dyn JsonMarshal> { None }

    /// Returns the extra dynamic fields capability of a struct, if any.
    fn as_missing_fields(&self) -> Option<&dyn MissingFields> { None }

    /// Overrides emptiness when
    /// [`recursive_empty_check`](crate::CodecOptions::recursive_empty_check)
    /// is enabled.
    fn is_codec_empty(&self) -> Option<bool> { None }
}

/// The active runtime form of a value.
#[derive(Clone, Copy, EnumAsInner)]
pub enum Value<'a> {
    /// A nil pointer, interface, or container.
    Nil,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// An unsigned integer.
    Uint(u64),
    /// A 32-bit float.
    F32(f32),
    /// A 64-bit float.
    F64(f64),
    /// A UTF-8 string.
    Str(&'a str),
    /// A byte string.
    Bytes(&'a [u8]),
    /// A point in time.
    Time(SystemTime),
    /// A non-nil pointer with identity.
    Ptr(Pointer<'a>),
    /// A non-nil dynamic value whose concrete type is resolved per value.
    Interface(&'a dyn Reflect),
    /// A sequence of elements.
    Seq(&'a dyn SeqValue),
    /// A key-value map.
    Map(&'a dyn MapValue),
    /// A struct with described fields.
    Struct(&'a dyn StructValue),
    /// A channel drained on encode.
    Chan(&'a dyn ChanValue),
    /// Pre-encoded wire bytes.
    Raw(&'a [u8]),
    /// A pre-tagged extension value.
    RawExt(&'a RawExt),
    /// A function value, which has no encoding.
    Func,
}

impl std::fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nil => f.write_str("Nil"),
            Self::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Self::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Self::Uint(v) => f.debug_tuple("Uint").field(v).finish(),
            Self::F32(v) => f.debug_tuple("F32").field(v).finish(),
            Self::F64(v) => f.debug_tuple("F64").field(v).finish(),
            Self::Str(v) => f.debug_tuple("Str").field(v).finish(),
            Self::Bytes(v) => f.debug_tuple("Bytes").field(v).finish(),
            Self::Time(v) => f.debug_tuple("Time").field(v).finish(),
            Self::Ptr(p) => f
                .debug_tuple("Ptr")
                .field(&format_args!("{:#x}", p.addr))
                .finish(),
            Self::Interface(_) => f.write_str("Interface(..)"),
            Self::Seq(s) => {
                f.debug_struct("Seq").field("len", &s.len()).finish()
            }
            Self::Map(m) => {
                f.debug_struct("Map").field("len", &m.len()).finish()
            }
            Self::Struct(_) => f.write_str("Struct(..)"),
            Self::Chan(c) => {
                f.debug_struct("Chan").field("dir", &c.dir()).finish()
            }
            Self::Raw(v) => f.debug_tuple("Raw").field(v).finish(),
            Self::RawExt(v) => f.debug_tuple("RawExt").field(v).finish(),
            Self::Func => f.write_str("Func"),
        }
    }
}

/// A non-nil pointer: the address that identifies it and the value it
/// points to.
#[derive(Clone, Copy)]
pub struct Pointer<'a> {
    addr: usize,
    target: &'a dyn Reflect,
}

impl<'a> Pointer<'a> {
    /// Creates a pointer to `target`, identified by its address.
    #[must_use]
    pub fn new<T: Reflect>(target: &'a T) -> Self {
        Self { addr: std::ptr::from_ref(target).addr(), target }
    }

    /// Creates a pointer to a dynamic target, identified by the address of
    /// its data.
    #[must_use]
    pub fn new_dyn(target: &'a dyn Reflect) -> Self {
        Self { addr: std::ptr::from_ref(target).cast::<()>().addr(), target }
    }

    /// Returns the address of the pointee.
    #[must_use]
    pub const fn addr(&self) -> usize { self.addr }

    /// Returns the pointee.
    #[must_use]
    pub const fn target(&self) -> &'a dyn Reflect { self.target }
}

/// Indexed access to a slice or array.
pub trait SeqValue {
    /// Returns the number of elements.
    fn len(&self) -> usize;

    /// Returns `true` if the sequence has no elements.
    fn is_empty(&self) -> bool { self.len() == 0 }

    /// Returns the element at `index`.
    ///
    /// # Panics
    ///
    /// May panic if `index >= self.len()`.
    fn index(&self, index: usize) -> &dyn Reflect;

    /// Returns the elements as bytes when the element type is `u8`.
    fn as_bytes(&self) -> Option<&[u8]> { None }
}

/// Iteration over the entries of an associative container.
pub trait MapValue {
    /// Returns the number of entries.
    fn len(&self) -> usize;

    /// Returns `true` if the map has no entries.
    fn is_empty(&self) -> bool { self.len() == 0 }

    /// Iterates over the entries in the container's natural order.
    fn entries(
        &self,
    ) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_>;
}

/// Field access for a struct described by
/// [`TypeInfo::structure`](crate::TypeInfo::structure).
pub trait StructValue {
    /// Returns the field declared at `index`.
    ///
    /// `None` stands for an absent embedded struct and encodes as nil.
    fn field(&self, index: usize) -> Option<&dyn Reflect>;
}

/// The direction a channel value can be used in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChanDir {
    /// Only receiving is possible.
    Recv,

    /// Only sending is possible.
    Send,

    /// Both directions are possible.
    Both,
}

impl ChanDir {
    /// Returns `true` if values can be received from the channel.
    #[must_use]
    pub const fn can_recv(self) -> bool {
        matches!(self, Self::Recv | Self::Both)
    }
}

/// Receive access to a live channel.
pub trait ChanValue {
    /// Returns the direction of the channel.
    fn dir(&self) -> ChanDir;

    /// Returns the number of buffered elements.
    fn len(&self) -> usize;

    /// Returns `true` if nothing is buffered.
    fn is_empty(&self) -> bool { self.len() == 0 }

    /// Receives elements according to `timeout` into an owned sequence.
    fn drain(&self, timeout: ChanRecvTimeout) -> Box<dyn SeqValue>;

    /// Receives bytes according to `timeout` straight into `buf`.
    ///
    /// Returns `false` without receiving anything if the element type is not
    /// `u8`.
    fn drain_bytes(
        &self,
        timeout: ChanRecvTimeout,
        buf: &mut Vec<u8>,
    ) -> bool {
        let _ = (timeout, buf);
        false
    }
}

/// Follows `path` from `root` through embedded structs, looking through
/// pointers and interfaces on the way.
///
/// Returns `None` if a step is absent or nil.
pub(crate) fn field_at<'a>(
    root: &'a dyn StructValue,
    path: &[usize],
) -> Option<&'a dyn Reflect> {
    let (&first, rest) = path.split_first()?;
    let mut current = root.field(first)?;

    for &index in rest {
        current = as_struct(current)?.field(index)?;
    }

    Some(current)
}

fn as_struct(mut value: &dyn Reflect) -> Option<&dyn StructValue> {
    loop {
        match value.reflect() {
            Value::Struct(s) => return Some(s),
            Value::Ptr(p) => value = p.target(),
            Value::Interface(inner) => value = inner,
            _ => return None,
        }
    }
}

/// Returns the [`TypeId`] of the concrete type behind `value`.
#[must_use]
pub fn type_id_of(value: &dyn Reflect) -> TypeId {
    let any: &dyn Any = value;
    any.type_id()
}

/// Downcasts a dynamic value to a concrete type.
///
/// Extension and marshal authors receive `&dyn Reflect`; this recovers the
/// concrete value they registered for.
#[must_use]
pub fn downcast_ref<T: Reflect>(value: &dyn Reflect) -> Option<&T> {
    let any: &dyn Any = value;
    any.downcast_ref()
}
