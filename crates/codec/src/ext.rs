//! Application-defined extension encoders.
//!
//! An extension turns values of one concrete type into an opaque payload that
//! the driver writes under a numeric tag. Extensions are keyed by type, so
//! registering one for a type overrides the built-in handling of that type on
//! every encoder sharing the [`Handle`](crate::Handle).
//!
//! # Example
//!
//! ```ignore
//! use trellis_codec::{Extensions, downcast_ref};
//!
//! let mut extensions = Extensions::new();
//! extensions.register::<Point>(
//!     7,
//!     |value: &dyn Reflect| -> Result<Vec<u8>, BoxError> {
//!         let point = downcast_ref::<Point>(value).ok_or("not a point")?;
//!         Ok([point.x.to_le_bytes(), point.y.to_le_bytes()].concat())
//!     },
//! );
//!
//! assert_eq!(extensions.get::<Point>().map(|e| e.tag()), Some(7));
//! ```

use std::{any::TypeId, collections::HashMap, fmt::Debug, sync::Arc};

use fxhash::FxBuildHasher;

use crate::{error::BoxError, reflect::Reflect};

/// Encodes values of a registered type into an extension payload.
pub trait Ext: Send + Sync {
    /// Returns the payload for `value`.
    ///
    /// `value` is always of the type the extension was registered for; use
    /// [`downcast_ref`](crate::downcast_ref) to recover it.
    ///
    /// # Errors
    ///
    /// Any error is reported as
    /// [`EncodeError::CustomMarshalFailure`](crate::EncodeError).
    fn write_ext(&self, value: &dyn Reflect) -> Result<Vec<u8>, BoxError>;
}

impl<F> Ext for F
where
    F: Fn(&dyn Reflect) -> Result<Vec<u8>, BoxError> + Send + Sync,
{
    fn write_ext(&self, value: &dyn Reflect) -> Result<Vec<u8>, BoxError> {
        self(value)
    }
}

/// A registered extension and its tag.
#[derive(Clone)]
pub struct ExtEntry {
    tag: u64,
    ext: Arc<dyn Ext>,
}

impl ExtEntry {
    /// The tag the payload is written under.
    #[must_use]
    pub const fn tag(&self) -> u64 { self.tag }

    /// The extension encoder.
    #[must_use]
    pub fn ext(&self) -> &Arc<dyn Ext> { &self.ext }
}

impl Debug for ExtEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtEntry")
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}

/// Extensions keyed by the type they encode.
#[derive(Default, Clone)]
pub struct Extensions {
    entries: HashMap<TypeId, ExtEntry, FxBuildHasher>,
}

impl Extensions {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Registers `ext` for values of type `T` under `tag`.
    ///
    /// Returns the entry previously registered for `T`, if any.
    pub fn register<T: Reflect>(
        &mut self,
        tag: u64,
        ext: impl Ext + 'static,
    ) -> Option<ExtEntry> {
        let entry = ExtEntry { tag, ext: Arc::new(ext) };
        self.entries.insert(TypeId::of::<T>(), entry)
    }

    /// Returns the extension registered for `T`.
    #[must_use]
    pub fn get<T: Reflect>(&self) -> Option<&ExtEntry> {
        self.get_by_id(TypeId::of::<T>())
    }

    pub(crate) fn get_by_id(&self, type_id: TypeId) -> Option<&ExtEntry> {
        self.entries.get(&type_id)
    }

    /// Removes the extension registered for `T`.
    pub fn remove<T: Reflect>(&mut self) -> Option<ExtEntry> {
        self.entries.remove(&TypeId::of::<T>())
    }

    /// Returns `true` if an extension is registered for `T`.
    #[must_use]
    pub fn contains<T: Reflect>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of registered extensions.
    #[must_use]
    pub fn len(&self) -> usize { self.entries.len() }

    /// Returns `true` if no extension is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Removes all extensions.
    pub fn clear(&mut self) { self.entries.clear(); }
}

impl Debug for Extensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extensions")
            .field("count", &self.entries.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test;
