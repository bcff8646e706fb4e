//! Trellis: a format-agnostic value encoding engine.
//!
//! This crate walks arbitrary in-memory values (scalars, sequences, maps,
//! structs, pointers, interfaces and channels) and turns them into a sequence
//! of primitive write operations on a pluggable wire-format [`Driver`]. The
//! engine owns every format-independent policy:
//!
//! - struct fields as a map or positionally as an array
//! - omission of empty fields, shallow or recursive
//! - canonical ordering of map keys and struct fields
//! - circular reference detection
//! - precedence between custom marshalers and built-in handling
//!
//! A driver only decides how each primitive looks on the wire.
//!
//! # Overview
//!
//! - [`Reflect`]: implemented by every encodable type. Describes the type
//!   once through a [`TypeInfo`] and exposes each value as a [`Value`].
//! - [`Driver`]: primitive write operations for one wire format.
//! - [`Handle`]: [`CodecOptions`], registered [`Extensions`] and the per-type
//!   strategy cache, shared by any number of encoders.
//! - [`Encoder`]: walks values and drives the driver into an output target.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use trellis_codec::{
//!     CodecOptions, Encoder, Field, Handle, Reflect, StructValue, TypeInfo,
//!     Value,
//! };
//!
//! struct User { name: String, email: Option<String> }
//!
//! impl Reflect for User {
//!     fn describe(&self) -> TypeInfo {
//!         TypeInfo::structure::<Self>()
//!             .field(Field::new("name"))
//!             .field(Field::new("email").omit_empty())
//!             .build()
//!     }
//!
//!     fn reflect(&self) -> Value<'_> { Value::Struct(self) }
//! }
//!
//! impl StructValue for User {
//!     fn field(&self, index: usize) -> Option<&dyn Reflect> {
//!         match index {
//!             0 => Some(&self.name),
//!             1 => Some(&self.email),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! let handle = Arc::new(Handle::new(
//!     CodecOptions::builder().canonical(true).build(),
//! ));
//! let mut encoder =
//!     Encoder::to_bytes(MyDriver::default(), handle, Vec::new());
//! encoder.encode(&User { name: "ada".into(), email: None })?;
//! ```

pub mod driver;
pub mod empty;
pub mod encode;
pub mod error;
pub mod ext;
pub mod handle;
pub mod marshal;
pub mod options;
pub mod reflect;
pub mod registry;
pub mod type_info;
pub mod writer;

#[cfg(test)]
mod testing;

pub use driver::{ContainerState, Driver};
pub use encode::{Emit, Encoder};
pub use error::{BoxError, EncodeError};
pub use ext::{Ext, ExtEntry, Extensions};
pub use handle::{CodecFn, Handle, Strategy};
pub use marshal::{
    BinaryMarshal, JsonMarshal, MapBySlice, MissingFields, Raw, RawExt,
    SelfEncode, TextMarshal,
};
pub use options::{ChanRecvTimeout, CodecOptions};
pub use reflect::{
    ChanDir, ChanValue, MapValue, Pointer, Reflect, SeqValue, StructValue,
    Value, downcast_ref, type_id_of,
};
pub use type_info::{
    Capabilities, Field, FieldInfo, Kind, KeyType, StructBuilder, TypeInfo,
};
pub use writer::EncWriter;
