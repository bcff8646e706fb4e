use std::{
    collections::BTreeMap,
    rc::Rc,
    time::{Duration, UNIX_EPOCH},
};

use super::*;
use crate::{
    marshal::{Raw, RawExt},
    testing::{Chain, Point, Profile},
    type_info::TypeInfo,
};

/// Zero-valued in memory but not empty to the codec, and the other way
/// round.
struct Sentinel(u8);

impl Reflect for Sentinel {
    fn describe(&self) -> TypeInfo { TypeInfo::of_kind::<Self>(Kind::Uint) }

    fn reflect(&self) -> Value<'_> { Value::Uint(u64::from(self.0)) }

    fn is_codec_empty(&self) -> Option<bool> { Some(self.0 == u8::MAX) }
}

#[test]
fn zero_scalars_are_empty() {
    assert!(is_empty(&0i32, false));
    assert!(is_empty(&0u64, false));
    assert!(is_empty(&false, false));
    assert!(is_empty(&0.0f64, false));
    assert!(is_empty(&String::new(), false));
    assert!(is_empty(&UNIX_EPOCH, false));
    assert!(is_empty(&Duration::ZERO, false));
    assert!(is_empty(&(), false));

    assert!(!is_empty(&-1i8, false));
    assert!(!is_empty(&true, false));
    assert!(!is_empty(&"x", false));
    assert!(!is_empty(&(UNIX_EPOCH + Duration::from_secs(1)), false));
}

#[test]
fn containers_are_empty_without_elements() {
    assert!(is_empty(&Vec::<u8>::new(), false));
    assert!(is_empty(&BTreeMap::<u8, u8>::new(), false));
    assert!(is_empty(&Raw(Vec::new()), false));
    assert!(is_empty(&RawExt { tag: 1, data: Vec::new() }, false));

    assert!(!is_empty(&vec![0u8], false));
    assert!(!is_empty(&BTreeMap::from([(0u8, 0u8)]), false));
}

#[test]
fn arrays_are_empty_when_every_element_is() {
    assert!(is_empty(&[0u8; 3], false));
    assert!(!is_empty(&[0u8, 0, 1], false));
}

#[test]
fn structs_are_empty_when_every_field_is() {
    assert!(is_empty(&Point::default(), false));
    assert!(!is_empty(&Point { x: 0, y: 1 }, false));
    assert!(is_empty(&Profile::default(), false));
}

#[test]
fn pointers_are_only_recursively_empty() {
    let zero = Some(Box::new(Point::default()));

    assert!(is_empty(&None::<u8>, false));
    assert!(!is_empty(&zero, false));
    assert!(is_empty(&zero, true));

    let set = Some(Box::new(Point { x: 1, y: 0 }));
    assert!(!is_empty(&set, true));
}

#[test]
fn rings_are_not_recursively_empty() {
    let a = Chain::new(0);
    let b = Chain::new(0);
    assert!(b.next.set(Rc::clone(&a)).is_ok());
    assert!(is_empty(&b, true));

    assert!(a.next.set(Rc::clone(&b)).is_ok());
    assert!(!is_empty(&a, true));
    assert!(!is_empty(&b, true));
    assert!(!is_empty(&a.next, true));
}

#[test]
fn codec_empty_overrides_only_recursively() {
    assert!(!is_empty(&Sentinel(u8::MAX), false));
    assert!(is_empty(&Sentinel(u8::MAX), true));

    assert!(is_empty(&Sentinel(0), false));
    assert!(!is_empty(&Sentinel(0), true));
}
