use std::{sync::Barrier, thread};

use tracing_test::traced_test;

use super::*;
use crate::{
    error::BoxError,
    marshal::TextMarshal,
    reflect::Value,
    testing::Point,
    type_info::{Field, Kind},
};

/// Only used by this module so the first registration can be observed.
struct Fresh(u8);

impl Reflect for Fresh {
    fn describe(&self) -> TypeInfo { TypeInfo::of_kind::<Self>(Kind::Uint) }

    fn reflect(&self) -> Value<'_> { Value::Uint(u64::from(self.0)) }

    fn as_text_marshal(&self) -> Option<&dyn TextMarshal> { Some(self) }
}

impl TextMarshal for Fresh {
    fn marshal_text(&self) -> Result<String, BoxError> {
        Ok(self.0.to_string())
    }
}

/// Described concurrently by several threads.
struct Contended;

impl Reflect for Contended {
    fn describe(&self) -> TypeInfo {
        TypeInfo::structure::<Self>().field(Field::new("only")).build()
    }

    fn reflect(&self) -> Value<'_> { Value::Nil }
}

#[test]
#[traced_test]
fn first_lookup_describes_and_probes() {
    assert!(cached(TypeId::of::<Fresh>()).is_none());

    let info = type_info_for(&Fresh(1));

    assert_eq!(info.kind(), Kind::Uint);
    assert!(info.capabilities().text_marshal);
    assert!(!info.capabilities().binary_marshal);
    assert!(logs_contain("registered type info"));
}

#[test]
fn lookups_share_one_description() {
    let a = type_info_for(&Point { x: 1, y: 2 });
    let b = type_info_for(&Point::default());

    assert!(Arc::ptr_eq(&a, &b));
    assert!(cached(TypeId::of::<Point>()).is_some_and(|c| Arc::ptr_eq(&a, &c)));
}

#[test]
fn concurrent_lookups_publish_one_description() {
    const THREADS: usize = 8;

    let barrier = Barrier::new(THREADS);
    let infos: Vec<Arc<TypeInfo>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    type_info_for(&Contended)
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for info in &infos {
        assert!(Arc::ptr_eq(info, &infos[0]));
    }
}
