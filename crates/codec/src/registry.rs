//! The process-wide [`TypeInfo`] cache.

use std::{
    any::TypeId,
    sync::{Arc, LazyLock},
};

use dashmap::DashMap;
use fxhash::FxBuildHasher;

use crate::{
    reflect::{Reflect, type_id_of},
    type_info::{Capabilities, TypeInfo},
};

static TYPE_INFOS: LazyLock<DashMap<TypeId, Arc<TypeInfo>, FxBuildHasher>> =
    LazyLock::new(|| DashMap::with_hasher(FxBuildHasher::default()));

/// Returns the memoized [`TypeInfo`] of the concrete type behind `value`.
///
/// The first call for a type runs [`Reflect::describe`] and probes the
/// capability accessors of `value`; every later call returns the same
/// [`Arc`]. Two threads racing on a new type may both describe it, but only
/// one description is ever published.
pub fn type_info_for(value: &dyn Reflect) -> Arc<TypeInfo> {
    let type_id = type_id_of(value);

    if let Some(info) = TYPE_INFOS.get(&type_id) {
        return info.clone();
    }

    // no map guard may be held here: `describe` can recurse into the
    // registry for embedded structs
    let info = value.describe().with_capabilities(Capabilities::probe(value));

    TYPE_INFOS
        .entry(type_id)
        .or_insert_with(|| {
            tracing::debug!(
                type_name = info.name(),
                kind = ?info.kind(),
                fields = info.fields().len(),
                "registered type info"
            );
            Arc::new(info)
        })
        .clone()
}

/// Returns the cached [`TypeInfo`] of `type_id`, if it has been seen.
#[must_use]
pub fn cached(type_id: TypeId) -> Option<Arc<TypeInfo>> {
    TYPE_INFOS.get(&type_id).map(|info| info.clone())
}

#[cfg(test)]
mod test;
