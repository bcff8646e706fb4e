use super::*;
use crate::{
    reflect::{ChanDir, Reflect},
    testing::{Point, Profile},
};

fn names(info: &TypeInfo) -> Vec<&str> {
    info.fields().iter().map(FieldInfo::name).collect()
}

#[test]
fn struct_fields_keep_declaration_order() {
    let info = Profile::type_info();

    assert_eq!(info.kind(), Kind::Struct);
    assert_eq!(names(&info), ["name", "age", "tags", "home"]);

    let canonical: Vec<&str> = info
        .canonical_order()
        .iter()
        .map(|&i| info.fields()[i].name())
        .collect();
    assert_eq!(canonical, ["age", "home", "name", "tags"]);
}

#[test]
fn skipped_fields_consume_an_index() {
    let info = TypeInfo::structure::<()>()
        .field(Field::new("a"))
        .skip()
        .field(Field::new("c"))
        .build();

    let paths: Vec<&[usize]> =
        info.fields().iter().map(FieldInfo::path).collect();
    assert_eq!(paths, [&[0usize][..], &[2usize][..]]);
}

#[test]
fn omit_empty_defaults_and_overrides() {
    let info = TypeInfo::structure::<()>()
        .field(Field::new("plain"))
        .field(Field::new("kept").keep_empty())
        .field(Field::new("dropped").omit_empty())
        .omit_empty()
        .build();

    let omit: Vec<bool> =
        info.fields().iter().map(FieldInfo::omit_empty).collect();
    assert_eq!(omit, [true, false, true]);
    assert!(info.omit_empty());
}

#[test]
fn embedded_fields_are_prefixed() {
    let point = Point::default().describe();
    let info = TypeInfo::structure::<()>()
        .field(Field::new("id"))
        .embed(&point)
        .build();

    assert_eq!(names(&info), ["id", "x", "y"]);
    assert_eq!(info.fields()[1].path(), [1, 0]);
    assert_eq!(info.fields()[2].path(), [1, 1]);
}

#[test]
fn shallower_names_hide_embedded_ones() {
    let point = Point::default().describe();

    // declared after the embed
    let after = TypeInfo::structure::<()>()
        .embed(&point)
        .field(Field::new("y"))
        .build();
    assert_eq!(names(&after), ["x", "y"]);
    assert_eq!(after.fields()[1].path(), [1]);

    // declared before the embed
    let before = TypeInfo::structure::<()>()
        .field(Field::new("x"))
        .embed(&point)
        .build();
    assert_eq!(names(&before), ["x", "y"]);
    assert_eq!(before.fields()[0].path(), [0]);
}

#[test]
fn same_depth_names_keep_the_first() {
    let point = Point::default().describe();
    let info = TypeInfo::structure::<()>().embed(&point).embed(&point).build();

    assert_eq!(names(&info), ["x", "y"]);
    assert_eq!(info.fields()[0].path(), [0, 0]);
}

#[test]
fn ascii_hint() {
    let info = TypeInfo::structure::<()>()
        .field(Field::new("snake_case9"))
        .field(Field::new("with space"))
        .field(Field::new("ünï"))
        .build();

    let hints: Vec<bool> =
        info.fields().iter().map(FieldInfo::ascii_alnum).collect();
    assert_eq!(hints, [true, false, false]);
}

#[test]
fn element_facts() {
    let bytes = TypeInfo::slice::<Vec<u8>, u8>();
    assert!(bytes.elem_is_byte());
    assert!(!bytes.elem_dynamic());

    let dynamic = TypeInfo::slice::<Vec<Box<dyn Reflect>>, Box<dyn Reflect>>();
    assert!(dynamic.elem_dynamic());
    assert!(!dynamic.elem_is_byte());

    let map = TypeInfo::map::<(), Box<dyn Reflect>, u8>();
    assert!(map.key_dynamic());
    assert!(!map.elem_dynamic());

    let chan = TypeInfo::chan::<(), u8>(ChanDir::Recv);
    assert_eq!(chan.chan_dir(), Some(ChanDir::Recv));
    assert_eq!(TypeInfo::array::<[u8; 4], u8>().kind(), Kind::Array);
}

#[test]
fn rebind_moves_identity() {
    let info =
        TypeInfo::slice::<Vec<u8>, u8>().rebind::<String>().map_by_slice();

    assert_eq!(info.type_id(), TypeId::of::<String>());
    assert_eq!(info.name(), type_name::<String>());
    assert!(info.is_map_by_slice());
    assert!(info.elem_is_byte());
}

#[test]
fn reference_like_kinds() {
    for kind in [Kind::Struct, Kind::Interface, Kind::Ptr, Kind::Map] {
        assert!(kind.is_reference_like(), "{kind:?}");
    }
    for kind in [Kind::Int, Kind::String, Kind::Bytes, Kind::Time] {
        assert!(!kind.is_reference_like(), "{kind:?}");
    }
}
