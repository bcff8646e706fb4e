use super::*;
use crate::{reflect::downcast_ref, testing::Point};

fn point_ext(value: &dyn Reflect) -> Result<Vec<u8>, BoxError> {
    let point = downcast_ref::<Point>(value).ok_or("not a point")?;
    Ok(vec![u8::try_from(point.x)?, u8::try_from(point.y)?])
}

/// An extension with state, as opposed to a plain function.
struct Fixed(Vec<u8>);

impl Ext for Fixed {
    fn write_ext(&self, _: &dyn Reflect) -> Result<Vec<u8>, BoxError> {
        Ok(self.0.clone())
    }
}

#[test]
fn register_and_lookup() {
    let mut extensions = Extensions::new();
    assert!(extensions.is_empty());

    assert!(extensions.register::<Point>(7, point_ext).is_none());

    assert!(extensions.contains::<Point>());
    assert!(!extensions.contains::<u8>());
    assert_eq!(extensions.len(), 1);

    let entry = extensions.get::<Point>().unwrap();
    assert_eq!(entry.tag(), 7);
    assert_eq!(
        entry.ext().write_ext(&Point { x: 3, y: 4 }).unwrap(),
        [3, 4]
    );
}

#[test]
fn registering_again_replaces() {
    let mut extensions = Extensions::new();
    extensions.register::<Point>(1, Fixed(vec![1]));

    let previous = extensions.register::<Point>(2, Fixed(vec![2])).unwrap();
    assert_eq!(previous.tag(), 1);

    let entry = extensions.get::<Point>().unwrap();
    assert_eq!(entry.tag(), 2);
    assert_eq!(entry.ext().write_ext(&Point::default()).unwrap(), [2]);
}

#[test]
fn errors_pass_through() {
    let mut extensions = Extensions::new();
    extensions.register::<Point>(7, point_ext);

    let entry = extensions.get::<Point>().unwrap();
    let error = entry.ext().write_ext(&Point { x: -1, y: 0 }).unwrap_err();

    assert!(!error.to_string().is_empty());
    assert!(entry.ext().write_ext(&5u8).is_err());
}

#[test]
fn remove_and_clear() {
    let mut extensions = Extensions::new();
    extensions.register::<Point>(7, point_ext);
    extensions.register::<u8>(8, Fixed(Vec::new()));

    assert_eq!(extensions.remove::<Point>().map(|e| e.tag()), Some(7));
    assert!(extensions.remove::<Point>().is_none());

    extensions.clear();
    assert!(extensions.is_empty());
}

#[test]
fn clones_share_extensions() {
    let mut extensions = Extensions::new();
    extensions.register::<Point>(7, point_ext);

    let copy = extensions.clone();
    let a = extensions.get::<Point>().unwrap();
    let b = copy.get::<Point>().unwrap();

    assert!(Arc::ptr_eq(a.ext(), b.ext()));
    assert_eq!(format!("{copy:?}"), "Extensions { count: 1, .. }");
}
