//! Emptiness checks used when omitting struct fields.

use std::{any::TypeId, time::SystemTime};

use crate::{
    reflect::{Pointer, Reflect, StructValue, Value, field_at, type_id_of},
    registry,
    type_info::Kind,
};

/// Returns `true` if `value` counts as empty for omission purposes.
///
/// The shallow check compares against the zero value: nil, `false`, zero
/// numbers, empty strings and containers, channels with nothing buffered and
/// the Unix epoch. A non-nil pointer or interface is never shallowly empty. A
/// struct or fixed-length array is empty when all of its parts are.
///
/// The recursive check additionally descends through pointers and interfaces
/// and lets a type decide for itself through
/// [`Reflect::is_codec_empty`]. A pointer already on the path being checked
/// counts as non-empty, so a cyclic value is left for the encoder's circular
/// reference check.
#[must_use]
pub fn is_empty(value: &dyn Reflect, recursive: bool) -> bool {
    Emptiness { recursive, path: Vec::new() }.check(value)
}

struct Emptiness {
    recursive: bool,
    path: Vec<(TypeId, usize)>,
}

impl Emptiness {
    fn check(&mut self, value: &dyn Reflect) -> bool {
        if self.recursive {
            if let Some(empty) = value.is_codec_empty() {
                return empty;
            }
        }

        match value.reflect() {
            Value::Nil => true,
            Value::Bool(v) => !v,
            Value::Int(v) => v == 0,
            Value::Uint(v) => v == 0,
            Value::F32(v) => v == 0.0,
            Value::F64(v) => v == 0.0,
            Value::Str(v) => v.is_empty(),
            Value::Bytes(v) | Value::Raw(v) => v.is_empty(),
            Value::RawExt(v) => v.data.is_empty(),
            Value::Time(t) => t == SystemTime::UNIX_EPOCH,
            Value::Ptr(p) => self.recursive && self.check_pointer(p),
            Value::Interface(inner) => self.recursive && self.check(inner),
            Value::Seq(seq) => {
                if registry::type_info_for(value).kind() == Kind::Array {
                    (0..seq.len()).all(|i| self.check(seq.index(i)))
                } else {
                    seq.is_empty()
                }
            }
            Value::Map(map) => map.is_empty(),
            Value::Chan(chan) => chan.is_empty(),
            Value::Struct(fields) => self.check_struct(value, fields),
            Value::Func => false,
        }
    }

    fn check_pointer(&mut self, ptr: Pointer<'_>) -> bool {
        let identity = (type_id_of(ptr.target()), ptr.addr());
        if self.path.contains(&identity) {
            return false;
        }

        self.path.push(identity);
        let empty = self.check(ptr.target());
        self.path.pop();

        empty
    }

    fn check_struct(
        &mut self,
        value: &dyn Reflect,
        fields: &dyn StructValue,
    ) -> bool {
        let info = registry::type_info_for(value);

        info.fields().iter().all(|field| {
            field_at(fields, field.path()).is_none_or(|v| self.check(v))
        })
    }
}

#[cfg(test)]
mod test;
