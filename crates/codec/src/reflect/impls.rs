//! [`Reflect`] implementations for standard library and crossbeam types.

use std::{
    any::Any,
    cell::OnceCell,
    collections::{BTreeMap, HashMap, VecDeque},
    rc::Rc,
    sync::Arc,
    time::{Duration, Instant, SystemTime},
};

use crossbeam::channel::{Receiver, Sender};

use crate::{
    options::ChanRecvTimeout,
    reflect::{
        ChanDir, ChanValue, MapValue, Pointer, Reflect, SeqValue, Value,
    },
    type_info::{Kind, TypeInfo},
};

// =============================================================================
// Scalars
// =============================================================================

macro_rules! impl_scalar {
    ($kind:ident, $variant:ident, $wide:ty => $($ty:ty),*) => {
        $(
            impl Reflect for $ty {
                fn describe(&self) -> TypeInfo {
                    TypeInfo::of_kind::<Self>(Kind::$kind)
                }

                fn reflect(&self) -> Value<'_> {
                    Value::$variant(<$wide>::from(*self))
                }
            }
        )*
    };
}

impl_scalar!(Int, Int, i64 => i8, i16, i32, i64);
impl_scalar!(Uint, Uint, u64 => u8, u16, u32, u64);

impl Reflect for isize {
    fn describe(&self) -> TypeInfo { TypeInfo::of_kind::<Self>(Kind::Int) }

    #[allow(clippy::cast_possible_truncation)]
    fn reflect(&self) -> Value<'_> { Value::Int(*self as i64) }
}

impl Reflect for usize {
    fn describe(&self) -> TypeInfo { TypeInfo::of_kind::<Self>(Kind::Uint) }

    #[allow(clippy::cast_possible_truncation)]
    fn reflect(&self) -> Value<'_> { Value::Uint(*self as u64) }
}

impl Reflect for bool {
    fn describe(&self) -> TypeInfo { TypeInfo::of_kind::<Self>(Kind::Bool) }

    fn reflect(&self) -> Value<'_> { Value::Bool(*self) }
}

impl Reflect for f32 {
    fn describe(&self) -> TypeInfo { TypeInfo::of_kind::<Self>(Kind::Float32) }

    fn reflect(&self) -> Value<'_> { Value::F32(*self) }
}

impl Reflect for f64 {
    fn describe(&self) -> TypeInfo { TypeInfo::of_kind::<Self>(Kind::Float64) }

    fn reflect(&self) -> Value<'_> { Value::F64(*self) }
}

impl Reflect for () {
    fn describe(&self) -> TypeInfo { TypeInfo::of_kind::<Self>(Kind::Nil) }

    fn reflect(&self) -> Value<'_> { Value::Nil }
}

impl Reflect for String {
    fn describe(&self) -> TypeInfo { TypeInfo::of_kind::<Self>(Kind::String) }

    fn reflect(&self) -> Value<'_> { Value::Str(self) }
}

impl Reflect for &'static str {
    fn describe(&self) -> TypeInfo { TypeInfo::of_kind::<Self>(Kind::String) }

    fn reflect(&self) -> Value<'_> { Value::Str(self) }
}

impl Reflect for Box<str> {
    fn describe(&self) -> TypeInfo { TypeInfo::of_kind::<Self>(Kind::String) }

    fn reflect(&self) -> Value<'_> { Value::Str(self) }
}

/// Encoded as a signed count of nanoseconds, saturating at `i64::MAX`.
impl Reflect for Duration {
    fn describe(&self) -> TypeInfo { TypeInfo::of_kind::<Self>(Kind::Int) }

    fn reflect(&self) -> Value<'_> {
        Value::Int(i64::try_from(self.as_nanos()).unwrap_or(i64::MAX))
    }
}

impl Reflect for SystemTime {
    fn describe(&self) -> TypeInfo { TypeInfo::of_kind::<Self>(Kind::Time) }

    fn reflect(&self) -> Value<'_> { Value::Time(*self) }
}

impl<R: 'static> Reflect for fn() -> R {
    fn describe(&self) -> TypeInfo { TypeInfo::of_kind::<Self>(Kind::Func) }

    fn reflect(&self) -> Value<'_> { Value::Func }
}

// =============================================================================
// Sequences
// =============================================================================

impl<T: Reflect> Reflect for Vec<T> {
    fn describe(&self) -> TypeInfo { TypeInfo::slice::<Self, T>() }

    fn reflect(&self) -> Value<'_> { Value::Seq(self) }
}

impl<T: Reflect> SeqValue for Vec<T> {
    fn len(&self) -> usize { self.len() }

    fn index(&self, index: usize) -> &dyn Reflect { &self[index] }

    fn as_bytes(&self) -> Option<&[u8]> {
        (self as &dyn Any).downcast_ref::<Vec<u8>>().map(Vec::as_slice)
    }
}

impl<T: Reflect> Reflect for Box<[T]> {
    fn describe(&self) -> TypeInfo { TypeInfo::slice::<Self, T>() }

    fn reflect(&self) -> Value<'_> { Value::Seq(self) }
}

impl<T: Reflect> SeqValue for Box<[T]> {
    fn len(&self) -> usize { <[T]>::len(self) }

    fn index(&self, index: usize) -> &dyn Reflect { &self[index] }

    fn as_bytes(&self) -> Option<&[u8]> {
        (self as &dyn Any).downcast_ref::<Box<[u8]>>().map(|b| &**b)
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn describe(&self) -> TypeInfo { TypeInfo::array::<Self, T>() }

    fn reflect(&self) -> Value<'_> { Value::Seq(self) }
}

impl<T: Reflect, const N: usize> SeqValue for [T; N] {
    fn len(&self) -> usize { N }

    fn index(&self, index: usize) -> &dyn Reflect { &self[index] }

    fn as_bytes(&self) -> Option<&[u8]> {
        (self as &dyn Any).downcast_ref::<[u8; N]>().map(<[u8; N]>::as_slice)
    }
}

/// Byte deques are written element by element since their storage is not
/// contiguous.
impl<T: Reflect> Reflect for VecDeque<T> {
    fn describe(&self) -> TypeInfo { TypeInfo::slice::<Self, T>() }

    fn reflect(&self) -> Value<'_> { Value::Seq(self) }
}

impl<T: Reflect> SeqValue for VecDeque<T> {
    fn len(&self) -> usize { self.len() }

    fn index(&self, index: usize) -> &dyn Reflect { &self[index] }
}

// =============================================================================
// Maps
// =============================================================================

impl<K: Reflect, V: Reflect, S: 'static> Reflect for HashMap<K, V, S> {
    fn describe(&self) -> TypeInfo { TypeInfo::map::<Self, K, V>() }

    fn reflect(&self) -> Value<'_> { Value::Map(self) }
}

impl<K: Reflect, V: Reflect, S: 'static> MapValue for HashMap<K, V, S> {
    fn len(&self) -> usize { self.len() }

    fn entries(
        &self,
    ) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_> {
        Box::new(
            self.iter().map(|(k, v)| (k as &dyn Reflect, v as &dyn Reflect)),
        )
    }
}

impl<K: Reflect, V: Reflect> Reflect for BTreeMap<K, V> {
    fn describe(&self) -> TypeInfo { TypeInfo::map::<Self, K, V>() }

    fn reflect(&self) -> Value<'_> { Value::Map(self) }
}

impl<K: Reflect, V: Reflect> MapValue for BTreeMap<K, V> {
    fn len(&self) -> usize { self.len() }

    fn entries(
        &self,
    ) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_> {
        Box::new(
            self.iter().map(|(k, v)| (k as &dyn Reflect, v as &dyn Reflect)),
        )
    }
}

// =============================================================================
// Pointers and interfaces
// =============================================================================

impl<T: Reflect> Reflect for Option<T> {
    fn describe(&self) -> TypeInfo { TypeInfo::of_kind::<Self>(Kind::Ptr) }

    fn reflect(&self) -> Value<'_> {
        self.as_ref().map_or(Value::Nil, |v| Value::Interface(v))
    }
}

impl<T: Reflect> Reflect for OnceCell<T> {
    fn describe(&self) -> TypeInfo { TypeInfo::of_kind::<Self>(Kind::Ptr) }

    fn reflect(&self) -> Value<'_> {
        self.get().map_or(Value::Nil, |v| Value::Interface(v))
    }
}

macro_rules! impl_pointer {
    ($($ptr:ident),*) => {
        $(
            impl<T: Reflect> Reflect for $ptr<T> {
                fn describe(&self) -> TypeInfo {
                    TypeInfo::of_kind::<Self>(Kind::Ptr)
                }

                fn reflect(&self) -> Value<'_> {
                    Value::Ptr(Pointer::new(&**self))
                }
            }
        )*
    };
}

impl_pointer!(Box, Rc, Arc);

impl Reflect for Box<dyn Reflect> {
    fn describe(&self) -> TypeInfo {
        TypeInfo::of_kind::<Self>(Kind::Interface)
    }

    fn reflect(&self) -> Value<'_> { Value::Interface(&**self) }

    fn is_dynamic() -> bool { true }
}

macro_rules! impl_dyn_pointer {
    ($($ptr:ident),*) => {
        $(
            impl Reflect for $ptr<dyn Reflect> {
                fn describe(&self) -> TypeInfo {
                    TypeInfo::of_kind::<Self>(Kind::Ptr)
                }

                fn reflect(&self) -> Value<'_> {
                    Value::Ptr(Pointer::new_dyn(&**self))
                }

                fn is_dynamic() -> bool { true }
            }
        )*
    };
}

impl_dyn_pointer!(Rc, Arc);

// =============================================================================
// Channels
// =============================================================================

fn receive<T>(
    rx: &Receiver<T>,
    timeout: ChanRecvTimeout,
    mut sink: impl FnMut(T),
) {
    match timeout {
        ChanRecvTimeout::Available => {
            while let Ok(v) = rx.try_recv() {
                sink(v);
            }
        }
        ChanRecvTimeout::For(limit) => {
            if let Some(deadline) = Instant::now().checked_add(limit) {
                while let Ok(v) = rx.recv_deadline(deadline) {
                    sink(v);
                }
            } else {
                rx.iter().for_each(sink);
            }
        }
        ChanRecvTimeout::UntilClosed => rx.iter().for_each(sink),
    }
}

impl<T: Reflect> Reflect for Receiver<T> {
    fn describe(&self) -> TypeInfo {
        TypeInfo::chan::<Self, T>(ChanDir::Recv)
    }

    fn reflect(&self) -> Value<'_> { Value::Chan(self) }
}

impl<T: Reflect> ChanValue for Receiver<T> {
    fn dir(&self) -> ChanDir { ChanDir::Recv }

    fn len(&self) -> usize { Receiver::len(self) }

    fn drain(&self, timeout: ChanRecvTimeout) -> Box<dyn SeqValue> {
        let mut items = Vec::new();
        receive(self, timeout, |v| items.push(v));
        Box::new(items)
    }

    fn drain_bytes(&self, timeout: ChanRecvTimeout, buf: &mut Vec<u8>) -> bool {
        let Some(rx) = (self as &dyn Any).downcast_ref::<Receiver<u8>>() else {
            return false;
        };

        receive(rx, timeout, |b| buf.push(b));
        true
    }
}

/// Sending ends cannot be drained; encoding one fails.
impl<T: Reflect> Reflect for Sender<T> {
    fn describe(&self) -> TypeInfo {
        TypeInfo::chan::<Self, T>(ChanDir::Send)
    }

    fn reflect(&self) -> Value<'_> { Value::Chan(self) }
}

impl<T: Reflect> ChanValue for Sender<T> {
    fn dir(&self) -> ChanDir { ChanDir::Send }

    fn len(&self) -> usize { Sender::len(self) }

    fn drain(&self, _: ChanRecvTimeout) -> Box<dyn SeqValue> {
        Box::new(Vec::<T>::new())
    }
}
