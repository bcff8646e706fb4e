//! Shared fixtures and helpers for the trellis-codec integration tests.
//!
//! The tests drive the engine through [`compact::Compact`], a small
//! self-describing binary format, and read the output back with
//! [`compact::tokens`]. [`recorder::Recorder`] records the exact driver call
//! sequence where the nesting contract itself is under test.

#![allow(missing_docs)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_const_for_fn)]

use std::{
    cell::OnceCell,
    rc::Rc,
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use trellis_codec::{
    BinaryMarshal, BoxError, CodecOptions, Emit, EncodeError, Encoder, Field,
    Handle, Kind, MissingFields, Reflect, SelfEncode, StructValue,
    TextMarshal, TypeInfo, Value,
};

use crate::{
    compact::{Compact, Token, tokens},
    recorder::{Op, Recorder},
};

pub mod compact;
pub mod recorder;

// ============================================================================
// Helpers
// ============================================================================

/// Creates a shared handle with `options` and no extensions.
pub fn handle(options: CodecOptions) -> Arc<Handle> {
    Arc::new(Handle::new(options))
}

/// Encodes `value` with a fresh [`Compact`] encoder over `handle`.
///
/// # Errors
///
/// Returns the error of the encode call.
pub fn compact_with(
    handle: Arc<Handle>,
    value: &dyn Reflect,
) -> Result<Vec<u8>, EncodeError> {
    let mut encoder = Encoder::to_bytes(Compact::default(), handle, Vec::new());
    encoder.encode(value)?;

    Ok(encoder.take_bytes().unwrap_or_default())
}

/// Encodes `value` with a fresh [`Compact`] encoder.
///
/// # Errors
///
/// Returns the error of the encode call.
pub fn compact(
    options: CodecOptions,
    value: &dyn Reflect,
) -> Result<Vec<u8>, EncodeError> {
    compact_with(handle(options), value)
}

/// Encodes `value` and reads the output back as tokens.
///
/// # Errors
///
/// Returns the error of the encode call, or an I/O error if the output is
/// not well formed.
pub fn decode(
    options: CodecOptions,
    value: &dyn Reflect,
) -> Result<Vec<Token>, EncodeError> {
    Ok(tokens(&compact(options, value)?)?)
}

/// Encodes `value` and returns the driver calls it made.
///
/// # Errors
///
/// Returns the error of the encode call.
pub fn record(
    options: CodecOptions,
    value: &dyn Reflect,
) -> Result<Vec<Op>, EncodeError> {
    let mut encoder =
        Encoder::to_bytes(Recorder::default(), handle(options), Vec::new());
    encoder.encode(value)?;

    Ok(encoder.driver_mut().take_ops())
}

/// A fixed timestamp used by the fixtures.
pub fn created_at() -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(1_700_000_000)
}

// ============================================================================
// Address
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub zip: Option<String>,
}

impl Reflect for Address {
    fn describe(&self) -> TypeInfo {
        TypeInfo::structure::<Self>()
            .field(Field::new("street"))
            .field(Field::new("city"))
            .field(Field::new("zip").omit_empty())
            .build()
    }

    fn reflect(&self) -> Value<'_> { Value::Struct(self) }
}

impl StructValue for Address {
    fn field(&self, index: usize) -> Option<&dyn Reflect> {
        match index {
            0 => Some(&self.street),
            1 => Some(&self.city),
            2 => Some(&self.zip),
            _ => None,
        }
    }
}

// ============================================================================
// Audit (embedded)
// ============================================================================

/// Bookkeeping fields flattened into the structs that embed it.
#[derive(Debug, Clone)]
pub struct Audit {
    pub revision: u32,
    pub created: SystemTime,
}

impl Audit {
    pub fn type_info() -> TypeInfo {
        TypeInfo::structure::<Self>()
            .field(Field::new("revision"))
            .field(Field::new("created"))
            .build()
    }
}

impl Reflect for Audit {
    fn describe(&self) -> TypeInfo { Self::type_info() }

    fn reflect(&self) -> Value<'_> { Value::Struct(self) }
}

impl StructValue for Audit {
    fn field(&self, index: usize) -> Option<&dyn Reflect> {
        match index {
            0 => Some(&self.revision),
            1 => Some(&self.created),
            _ => None,
        }
    }
}

// ============================================================================
// Customer
// ============================================================================

/// Declares fields out of name order, embeds [`Audit`] and carries a field
/// that is never encoded.
#[derive(Debug, Clone)]
pub struct Customer {
    pub id: u64,
    pub name: String,
    pub address: Address,
    pub audit: Audit,
    pub email: Option<String>,
    pub lookups: usize,
}

impl Customer {
    pub fn sample() -> Self {
        Self {
            id: 7,
            name: "Ada".to_owned(),
            address: Address {
                street: "1 Loop Rd".to_owned(),
                city: "Lund".to_owned(),
                zip: None,
            },
            audit: Audit { revision: 3, created: created_at() },
            email: None,
            lookups: 99,
        }
    }
}

impl Reflect for Customer {
    fn describe(&self) -> TypeInfo {
        TypeInfo::structure::<Self>()
            .field(Field::new("id"))
            .field(Field::new("name"))
            .field(Field::new("address"))
            .embed(&Audit::type_info())
            .field(Field::new("email").omit_empty())
            .skip()
            .build()
    }

    fn reflect(&self) -> Value<'_> { Value::Struct(self) }
}

impl StructValue for Customer {
    fn field(&self, index: usize) -> Option<&dyn Reflect> {
        match index {
            0 => Some(&self.id),
            1 => Some(&self.name),
            2 => Some(&self.address),
            3 => Some(&self.audit),
            4 => Some(&self.email),
            5 => Some(&self.lookups),
            _ => None,
        }
    }
}

// ============================================================================
// Money (text marshal)
// ============================================================================

/// An amount in cents, written as decimal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Money(pub i64);

impl Reflect for Money {
    fn describe(&self) -> TypeInfo { TypeInfo::of_kind::<Self>(Kind::Int) }

    fn reflect(&self) -> Value<'_> { Value::Int(self.0) }

    fn as_text_marshal(&self) -> Option<&dyn TextMarshal> { Some(self) }
}

impl TextMarshal for Money {
    fn marshal_text(&self) -> Result<String, BoxError> {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.unsigned_abs();

        Ok(format!("{sign}{}.{:02}", cents / 100, cents % 100))
    }
}

// ============================================================================
// Ident (binary marshal)
// ============================================================================

/// An opaque identifier written as its raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ident(pub [u8; 4]);

impl Reflect for Ident {
    fn describe(&self) -> TypeInfo { TypeInfo::of_kind::<Self>(Kind::Bytes) }

    fn reflect(&self) -> Value<'_> { Value::Bytes(&self.0) }

    fn as_binary_marshal(&self) -> Option<&dyn BinaryMarshal> { Some(self) }
}

impl BinaryMarshal for Ident {
    fn marshal_binary(&self) -> Result<Vec<u8>, BoxError> {
        let mut out = self.0.to_vec();
        out.reverse();
        Ok(out)
    }
}

// ============================================================================
// LineItem (always an array)
// ============================================================================

#[derive(Debug, Clone)]
pub struct LineItem {
    pub sku: String,
    pub quantity: u32,
    pub price: Money,
}

impl Reflect for LineItem {
    fn describe(&self) -> TypeInfo {
        TypeInfo::structure::<Self>()
            .field(Field::new("sku"))
            .field(Field::new("quantity"))
            .field(Field::new("price"))
            .to_array()
            .build()
    }

    fn reflect(&self) -> Value<'_> { Value::Struct(self) }
}

impl StructValue for LineItem {
    fn field(&self, index: usize) -> Option<&dyn Reflect> {
        match index {
            0 => Some(&self.sku),
            1 => Some(&self.quantity),
            2 => Some(&self.price),
            _ => None,
        }
    }
}

// ============================================================================
// Order
// ============================================================================

#[derive(Debug, Clone)]
pub struct Order {
    pub id: Ident,
    pub customer: Arc<Customer>,
    pub items: Vec<LineItem>,
    pub note: String,
}

impl Order {
    pub fn sample() -> Self {
        Self {
            id: Ident([1, 2, 3, 4]),
            customer: Arc::new(Customer::sample()),
            items: vec![
                LineItem {
                    sku: "A-1".to_owned(),
                    quantity: 2,
                    price: Money(1250),
                },
                LineItem {
                    sku: "B-9".to_owned(),
                    quantity: 1,
                    price: Money(5),
                },
            ],
            note: String::new(),
        }
    }
}

impl Reflect for Order {
    fn describe(&self) -> TypeInfo {
        TypeInfo::structure::<Self>()
            .field(Field::new("id"))
            .field(Field::new("customer"))
            .field(Field::new("items"))
            .field(Field::new("note").omit_empty())
            .build()
    }

    fn reflect(&self) -> Value<'_> { Value::Struct(self) }
}

impl StructValue for Order {
    fn field(&self, index: usize) -> Option<&dyn Reflect> {
        match index {
            0 => Some(&self.id),
            1 => Some(&self.customer),
            2 => Some(&self.items),
            3 => Some(&self.note),
            _ => None,
        }
    }
}

// ============================================================================
// Temperature (self-encoding)
// ============================================================================

/// Writes itself as a `[unit, degrees]` pair. Also offers a text form that
/// the engine must never pick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Temperature(pub f64);

impl Reflect for Temperature {
    fn describe(&self) -> TypeInfo { TypeInfo::of_kind::<Self>(Kind::Float64) }

    fn reflect(&self) -> Value<'_> { Value::F64(self.0) }

    fn as_self_encode(&self) -> Option<&dyn SelfEncode> { Some(self) }

    fn as_text_marshal(&self) -> Option<&dyn TextMarshal> { Some(self) }
}

impl SelfEncode for Temperature {
    fn encode_self(&self, e: &mut dyn Emit) -> Result<(), EncodeError> {
        e.array_start(2)?;
        e.array_elem()?;
        e.emit_str("C")?;
        e.array_elem()?;
        e.emit_f64(self.0)?;
        e.array_end()
    }
}

impl TextMarshal for Temperature {
    fn marshal_text(&self) -> Result<String, BoxError> {
        Ok(format!("{}C", self.0))
    }
}

// ============================================================================
// Envelope (self-encoding, nested encode)
// ============================================================================

/// Wraps a value in a one-entry map by calling back into the encoder.
#[derive(Debug, Clone)]
pub struct Envelope<T>(pub T);

impl<T: Reflect> Reflect for Envelope<T> {
    fn describe(&self) -> TypeInfo {
        TypeInfo::structure::<Self>().field(Field::new("body")).build()
    }

    fn reflect(&self) -> Value<'_> { Value::Struct(self) }

    fn as_self_encode(&self) -> Option<&dyn SelfEncode> { Some(self) }
}

impl<T: Reflect> StructValue for Envelope<T> {
    fn field(&self, index: usize) -> Option<&dyn Reflect> {
        (index == 0).then_some(&self.0 as &dyn Reflect)
    }
}

impl<T: Reflect> SelfEncode for Envelope<T> {
    fn encode_self(&self, e: &mut dyn Emit) -> Result<(), EncodeError> {
        e.map_start(1)?;
        e.map_key()?;
        e.emit_str("body")?;
        e.map_value()?;
        e.encode(&self.0)?;
        e.map_end()
    }
}

// ============================================================================
// Link (cycles)
// ============================================================================

/// A linked node whose successor can be set after construction, so cycles
/// can be built.
#[derive(Debug, Default)]
pub struct Link {
    pub name: String,
    pub next: OnceCell<Rc<Link>>,
}

impl Link {
    pub fn new(name: &str) -> Rc<Self> {
        Rc::new(Self { name: name.to_owned(), next: OnceCell::new() })
    }
}

impl Reflect for Link {
    fn describe(&self) -> TypeInfo {
        TypeInfo::structure::<Self>()
            .field(Field::new("name"))
            .field(Field::new("next"))
            .build()
    }

    fn reflect(&self) -> Value<'_> { Value::Struct(self) }
}

impl StructValue for Link {
    fn field(&self, index: usize) -> Option<&dyn Reflect> {
        match index {
            0 => Some(&self.name),
            1 => Some(&self.next),
            _ => None,
        }
    }
}

// ============================================================================
// Bag (missing fields)
// ============================================================================

/// A struct with declared fields plus open-ended attributes. Empty values are
/// omitted throughout.
#[derive(Debug, Clone, Default)]
pub struct Bag {
    pub kind: String,
    pub attrs: Vec<(String, u32)>,
}

impl Reflect for Bag {
    fn describe(&self) -> TypeInfo {
        TypeInfo::structure::<Self>()
            .field(Field::new("kind"))
            .omit_empty()
            .build()
    }

    fn reflect(&self) -> Value<'_> { Value::Struct(self) }

    fn as_missing_fields(&self) -> Option<&dyn MissingFields> { Some(self) }
}

impl StructValue for Bag {
    fn field(&self, index: usize) -> Option<&dyn Reflect> {
        (index == 0).then_some(&self.kind as &dyn Reflect)
    }
}

impl MissingFields for Bag {
    fn missing_fields(&self) -> Vec<(String, Box<dyn Reflect>)> {
        self.attrs
            .iter()
            .map(|(k, v)| (k.clone(), Box::new(*v) as Box<dyn Reflect>))
            .collect()
    }
}
