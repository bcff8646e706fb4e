//! Static per-type descriptions.
//!
//! A [`TypeInfo`] is built once per concrete type, from
//! [`Reflect::describe`](crate::Reflect::describe), and shared immutably for
//! the rest of the process. Struct types are described with the builder
//! returned by [`TypeInfo::structure`].

use std::any::{TypeId, type_name};

use crate::reflect::{ChanDir, Reflect};

/// The built-in category of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// The absent value.
    Nil,
    /// A boolean.
    Bool,
    /// A signed integer.
    Int,
    /// An unsigned integer.
    Uint,
    /// A 32-bit float.
    Float32,
    /// A 64-bit float.
    Float64,
    /// A UTF-8 string.
    String,
    /// An owned byte string.
    Bytes,
    /// A point in time.
    Time,
    /// A pointer to another value.
    Ptr,
    /// A value whose concrete type is resolved at runtime.
    Interface,
    /// A variable-length sequence.
    Slice,
    /// A fixed-length sequence.
    Array,
    /// A key-value map.
    Map,
    /// A struct with named fields.
    Struct,
    /// A channel.
    Chan,
    /// Pre-encoded bytes written verbatim.
    Raw,
    /// A pre-built extension value.
    RawExt,
    /// A function; never encodable.
    Func,
}

impl Kind {
    /// Returns `true` for kinds whose empty omitted fields are written as nil
    /// in array mode rather than as their literal value.
    #[must_use]
    pub const fn is_reference_like(self) -> bool {
        matches!(
            self,
            Self::Struct
                | Self::Interface
                | Self::Ptr
                | Self::Array
                | Self::Map
                | Self::Slice
        )
    }
}

/// How struct field keys are written in map mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyType {
    /// The field name as a string.
    #[default]
    String,

    /// The field name parsed as a signed integer.
    Int,

    /// The field name parsed as an unsigned integer.
    Uint,

    /// The field name parsed as a float.
    Float,
}

/// The encoding capabilities a type advertises through its
/// [`Reflect`] accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct Capabilities {
    /// The type writes itself through `SelfEncode`.
    pub self_encode: bool,
    /// The type converts itself to bytes.
    pub binary_marshal: bool,
    /// The type converts itself to text.
    pub text_marshal: bool,
    /// The type converts itself to JSON.
    pub json_marshal: bool,
    /// The type carries extra fields of its own.
    pub missing_fields: bool,
}

impl Capabilities {
    /// Probes the capability accessors of `value`.
    #[must_use]
    pub fn probe(value: &dyn Reflect) -> Self {
        Self {
            self_encode: value.as_self_encode().is_some(),
            binary_marshal: value.as_binary_marshal().is_some(),
            text_marshal: value.as_text_marshal().is_some(),
            json_marshal: value.as_json_marshal().is_some(),
            missing_fields: value.as_missing_fields().is_some(),
        }
    }
}

/// An encoded struct field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    name: String,
    path: Vec<usize>,
    omit_empty: bool,
    ascii_alnum: bool,
}

impl FieldInfo {
    /// The key the field is written under.
    #[must_use]
    pub fn name(&self) -> &str { &self.name }

    /// The field indices leading from the outer struct to this field,
    /// through any flattened embedded structs.
    #[must_use]
    pub fn path(&self) -> &[usize] { &self.path }

    /// Whether the field is skipped in map mode when its value is empty.
    #[must_use]
    pub const fn omit_empty(&self) -> bool { self.omit_empty }

    /// Whether the name consists only of ASCII letters, digits and `_`.
    #[must_use]
    pub const fn ascii_alnum(&self) -> bool { self.ascii_alnum }
}

/// The declaration of a struct field passed to [`StructBuilder::field`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    omit_empty: Option<bool>,
}

impl Field {
    /// Declares a field written under `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), omit_empty: None }
    }

    /// Skips the field in map mode when its value is empty.
    #[must_use]
    pub fn omit_empty(mut self) -> Self {
        self.omit_empty = Some(true);
        self
    }

    /// Always writes the field, even if the struct omits empty fields by
    /// default.
    #[must_use]
    pub fn keep_empty(mut self) -> Self {
        self.omit_empty = Some(false);
        self
    }
}

/// The static description of a type.
#[derive(Debug, Clone)]
pub struct TypeInfo {
    type_id: TypeId,
    name: &'static str,
    kind: Kind,
    capabilities: Capabilities,
    fields: Vec<FieldInfo>,
    canonical: Vec<usize>,
    to_array: bool,
    omit_empty: bool,
    key_type: KeyType,
    elem_dynamic: bool,
    key_dynamic: bool,
    elem_is_byte: bool,
    map_by_slice: bool,
    chan_dir: Option<ChanDir>,
}

impl TypeInfo {
    fn new<T: ?Sized + 'static>(kind: Kind) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: type_name::<T>(),
            kind,
            capabilities: Capabilities::default(),
            fields: Vec::new(),
            canonical: Vec::new(),
            to_array: false,
            omit_empty: false,
            key_type: KeyType::String,
            elem_dynamic: false,
            key_dynamic: false,
            elem_is_byte: false,
            map_by_slice: false,
            chan_dir: None,
        }
    }

    /// Describes a type with no element or field structure.
    #[must_use]
    pub fn of_kind<T: ?Sized + 'static>(kind: Kind) -> Self {
        Self::new::<T>(kind)
    }

    /// Describes a variable-length sequence of `E`.
    #[must_use]
    pub fn slice<T: ?Sized + 'static, E: Reflect>() -> Self {
        Self::new::<T>(Kind::Slice).with_elem::<E>()
    }

    /// Describes a fixed-length sequence of `E`.
    #[must_use]
    pub fn array<T: ?Sized + 'static, E: Reflect>() -> Self {
        Self::new::<T>(Kind::Array).with_elem::<E>()
    }

    /// Describes a map from `K` to `V`.
    #[must_use]
    pub fn map<T: ?Sized + 'static, K: Reflect, V: Reflect>() -> Self {
        let mut info = Self::new::<T>(Kind::Map).with_elem::<V>();
        info.key_dynamic = K::is_dynamic();
        info
    }

    /// Describes a channel of `E` usable in `dir`.
    #[must_use]
    pub fn chan<T: ?Sized + 'static, E: Reflect>(dir: ChanDir) -> Self {
        let mut info = Self::new::<T>(Kind::Chan).with_elem::<E>();
        info.chan_dir = Some(dir);
        info
    }

    /// Starts describing a struct.
    #[must_use]
    pub fn structure<T: ?Sized + 'static>() -> StructBuilder {
        StructBuilder {
            info: Self::new::<T>(Kind::Struct),
            next_index: 0,
            omit: Vec::new(),
        }
    }

    /// Marks a sequence as alternating keys and values to be written as a
    /// map.
    #[must_use]
    pub fn map_by_slice(mut self) -> Self {
        self.map_by_slice = true;
        self
    }

    fn with_elem<E: Reflect>(mut self) -> Self {
        self.elem_dynamic = E::is_dynamic();
        self.elem_is_byte = TypeId::of::<E>() == TypeId::of::<u8>();
        self
    }

    /// Moves this description onto another type.
    pub(crate) fn rebind<T: ?Sized + 'static>(mut self) -> Self {
        self.type_id = TypeId::of::<T>();
        self.name = type_name::<T>();
        self
    }

    pub(crate) fn with_capabilities(
        mut self,
        capabilities: Capabilities,
    ) -> Self {
        self.capabilities = capabilities;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The [`TypeId`] of the described type.
    #[must_use]
    pub const fn type_id(&self) -> TypeId { self.type_id }

    /// The full Rust name of the described type.
    #[must_use]
    pub const fn name(&self) -> &'static str { self.name }

    /// The built-in category of the type.
    #[must_use]
    pub const fn kind(&self) -> Kind { self.kind }

    /// The encoding capabilities the type advertises.
    #[must_use]
    pub const fn capabilities(&self) -> Capabilities { self.capabilities }

    /// The struct fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldInfo] { &self.fields }

    /// Indices into [`fields`](Self::fields), ordered by field name.
    #[must_use]
    pub fn canonical_order(&self) -> &[usize] { &self.canonical }

    /// Whether the struct is always written positionally as an array.
    #[must_use]
    pub const fn to_array(&self) -> bool { self.to_array }

    /// Whether fields omit empty values unless declared otherwise. Also
    /// applies to the extra fields of a [`MissingFields`](crate::MissingFields)
    /// struct.
    #[must_use]
    pub const fn omit_empty(&self) -> bool { self.omit_empty }

    /// How field keys are written in map mode.
    #[must_use]
    pub const fn key_type(&self) -> KeyType { self.key_type }

    /// Whether the element (or map value) type resolves its concrete type per
    /// value.
    #[must_use]
    pub const fn elem_dynamic(&self) -> bool { self.elem_dynamic }

    /// Whether the map key type resolves its concrete type per value.
    #[must_use]
    pub const fn key_dynamic(&self) -> bool { self.key_dynamic }

    /// Whether the element type is `u8`.
    #[must_use]
    pub const fn elem_is_byte(&self) -> bool { self.elem_is_byte }

    /// Whether a sequence is written as a map of consecutive pairs.
    #[must_use]
    pub const fn is_map_by_slice(&self) -> bool { self.map_by_slice }

    /// The direction of a channel type.
    #[must_use]
    pub const fn chan_dir(&self) -> Option<ChanDir> { self.chan_dir }
}

/// Builds the [`TypeInfo`] of a struct.
///
/// Each call to [`field`](Self::field), [`embed`](Self::embed) or
/// [`skip`](Self::skip) consumes the next field index, which is the index the
/// engine later passes to [`StructValue::field`](crate::StructValue::field).
///
/// # Example
///
/// ```ignore
/// TypeInfo::structure::<Order>()
///     .field(Field::new("id"))
///     .skip() // cache, not encoded
///     .embed(&audit_info)
///     .field(Field::new("note").omit_empty())
///     .build()
/// ```
#[derive(Debug)]
pub struct StructBuilder {
    info: TypeInfo,
    next_index: usize,
    omit: Vec<Option<bool>>,
}

impl StructBuilder {
    /// Declares the next field.
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        let index = self.take_index();
        let ascii_alnum = is_ascii_alnum(&field.name);

        self.push(
            FieldInfo {
                name: field.name,
                path: vec![index],
                omit_empty: false,
                ascii_alnum,
            },
            field.omit_empty,
        );
        self
    }

    /// Flattens the fields of an embedded struct into this one.
    ///
    /// A name declared at a shallower depth hides deeper fields of the same
    /// name; among fields at the same depth, the first declared wins.
    #[must_use]
    pub fn embed(mut self, inner: &TypeInfo) -> Self {
        let index = self.take_index();

        for inner_field in &inner.fields {
            let mut path = Vec::with_capacity(inner_field.path.len() + 1);
            path.push(index);
            path.extend_from_slice(&inner_field.path);

            self.push(
                FieldInfo { path, ..inner_field.clone() },
                Some(inner_field.omit_empty),
            );
        }
        self
    }

    /// Consumes a field index without declaring an encoded field.
    #[must_use]
    pub fn skip(mut self) -> Self {
        self.next_index += 1;
        self
    }

    /// Always writes the struct positionally as an array.
    #[must_use]
    pub fn to_array(mut self) -> Self {
        self.info.to_array = true;
        self
    }

    /// Omits empty values of fields that do not say otherwise.
    #[must_use]
    pub fn omit_empty(mut self) -> Self {
        self.info.omit_empty = true;
        self
    }

    /// Sets how field keys are written in map mode.
    #[must_use]
    pub fn key_type(mut self, key_type: KeyType) -> Self {
        self.info.key_type = key_type;
        self
    }

    /// Finishes the description.
    #[must_use]
    pub fn build(mut self) -> TypeInfo {
        let default_omit = self.info.omit_empty;
        for (field, omit) in self.info.fields.iter_mut().zip(&self.omit) {
            field.omit_empty = omit.unwrap_or(default_omit);
        }

        let mut canonical: Vec<usize> = (0..self.info.fields.len()).collect();
        canonical.sort_by(|a, b| {
            self.info.fields[*a].name.cmp(&self.info.fields[*b].name)
        });
        self.info.canonical = canonical;

        self.info
    }

    const fn take_index(&mut self) -> usize {
        let index = self.next_index;
        self.next_index += 1;
        index
    }

    fn push(&mut self, field: FieldInfo, omit: Option<bool>) {
        let existing =
            self.info.fields.iter().position(|f| f.name == field.name);

        match existing {
            Some(pos) => {
                if self.info.fields[pos].path.len() > field.path.len() {
                    self.info.fields[pos] = field;
                    self.omit[pos] = omit;
                }
            }
            None => {
                self.info.fields.push(field);
                self.omit.push(omit);
            }
        }
    }
}

fn is_ascii_alnum(name: &str) -> bool {
    name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

#[cfg(test)]
mod test;
