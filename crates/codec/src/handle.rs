//! Shared encoding configuration and the per-type strategy cache.

use std::{any::TypeId, fmt::Debug, sync::Arc};

use bon::Builder;
use dashmap::DashMap;
use fxhash::FxBuildHasher;

use crate::{
    ext::{ExtEntry, Extensions},
    options::CodecOptions,
    reflect::{Reflect, type_id_of},
    registry,
    type_info::{Kind, TypeInfo},
};

/// How values of one type are encoded.
#[derive(Debug, Clone)]
pub enum Strategy {
    /// The type's [`SelfEncode`](crate::SelfEncode) implementation.
    SelfEncode,

    /// An extension registered on the handle.
    Ext(ExtEntry),

    /// The type's [`BinaryMarshal`](crate::BinaryMarshal) implementation.
    BinaryMarshal,

    /// The type's [`TextMarshal`](crate::TextMarshal) implementation.
    TextMarshal,

    /// The type's [`JsonMarshal`](crate::JsonMarshal) implementation.
    JsonMarshal,

    /// Verbatim pre-encoded bytes.
    Raw,

    /// The built-in handling of the kind.
    Kind(Kind),
}

/// A resolved encoding strategy together with the type it applies to.
#[derive(Debug)]
pub struct CodecFn {
    info: Arc<TypeInfo>,
    strategy: Strategy,
}

impl CodecFn {
    /// The description of the type.
    #[must_use]
    pub const fn info(&self) -> &Arc<TypeInfo> { &self.info }

    /// How values of the type are encoded.
    #[must_use]
    pub const fn strategy(&self) -> &Strategy { &self.strategy }
}

/// The configuration shared by any number of [`Encoder`](crate::Encoder)s.
///
/// A handle owns the [`CodecOptions`], the registered [`Extensions`] and the
/// cache of resolved strategies. Both the options and the extensions are
/// fixed once the handle is built, so cached strategies never go stale.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use trellis_codec::{CodecOptions, Handle};
///
/// let handle = Arc::new(
///     Handle::builder()
///         .options(CodecOptions::builder().canonical(true).build())
///         .extensions(extensions)
///         .build(),
/// );
/// ```
#[derive(Builder)]
pub struct Handle {
    #[builder(default)]
    options: CodecOptions,

    #[builder(default)]
    extensions: Extensions,

    #[builder(skip)]
    fns: DashMap<TypeId, Arc<CodecFn>, FxBuildHasher>,
}

impl Handle {
    /// Creates a handle with `options` and no extensions.
    #[must_use]
    pub fn new(options: CodecOptions) -> Self {
        Self::builder().options(options).build()
    }

    /// The options shared by every encoder of this handle.
    #[must_use]
    pub const fn options(&self) -> &CodecOptions { &self.options }

    /// The extensions registered on this handle.
    #[must_use]
    pub const fn extensions(&self) -> &Extensions { &self.extensions }

    /// Returns the cached strategy for the concrete type behind `value`,
    /// resolving it on first use.
    pub fn codec_fn(&self, value: &dyn Reflect) -> Arc<CodecFn> {
        let type_id = type_id_of(value);

        if let Some(found) = self.fns.get(&type_id) {
            return found.clone();
        }

        let info = registry::type_info_for(value);
        let strategy = self.select_strategy(&info);

        tracing::debug!(
            type_name = info.name(),
            strategy = ?strategy,
            "resolved codec strategy"
        );

        self.fns
            .entry(type_id)
            .or_insert_with(|| Arc::new(CodecFn { info, strategy }))
            .clone()
    }

    /// Returns the number of types with a cached strategy.
    #[must_use]
    pub fn cached_len(&self) -> usize { self.fns.len() }

    fn select_strategy(&self, info: &TypeInfo) -> Strategy {
        let caps = info.capabilities();

        if caps.self_encode {
            return Strategy::SelfEncode;
        }

        if let Some(entry) = self.extensions.get_by_id(info.type_id()) {
            return Strategy::Ext(entry.clone());
        }

        if caps.binary_marshal {
            Strategy::BinaryMarshal
        } else if caps.text_marshal {
            Strategy::TextMarshal
        } else if caps.json_marshal {
            Strategy::JsonMarshal
        } else if info.kind() == Kind::Raw {
            Strategy::Raw
        } else {
            Strategy::Kind(info.kind())
        }
    }
}

impl Default for Handle {
    fn default() -> Self { Self::builder().build() }
}

impl Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("options", &self.options)
            .field("extensions", &self.extensions)
            .field("cached", &self.fns.len())
            .finish()
    }
}

#[cfg(test)]
mod test;
