use super::*;
use crate::{
    encode::Emit,
    error::{BoxError, EncodeError},
    marshal::{BinaryMarshal, JsonMarshal, Raw, SelfEncode, TextMarshal},
    reflect::Value,
    testing::Point,
};

/// Offers every capability the strategy order looks at.
struct Everything;

impl Reflect for Everything {
    fn describe(&self) -> TypeInfo { TypeInfo::of_kind::<Self>(Kind::Bool) }

    fn reflect(&self) -> Value<'_> { Value::Bool(true) }

    fn as_self_encode(&self) -> Option<&dyn SelfEncode> { Some(self) }

    fn as_binary_marshal(&self) -> Option<&dyn BinaryMarshal> { Some(self) }

    fn as_text_marshal(&self) -> Option<&dyn TextMarshal> { Some(self) }

    fn as_json_marshal(&self) -> Option<&dyn JsonMarshal> { Some(self) }
}

impl SelfEncode for Everything {
    fn encode_self(&self, e: &mut dyn Emit) -> Result<(), EncodeError> {
        e.emit_bool(true)
    }
}

impl BinaryMarshal for Everything {
    fn marshal_binary(&self) -> Result<Vec<u8>, BoxError> { Ok(Vec::new()) }
}

impl TextMarshal for Everything {
    fn marshal_text(&self) -> Result<String, BoxError> { Ok(String::new()) }
}

impl JsonMarshal for Everything {
    fn marshal_json(&self) -> Result<Vec<u8>, BoxError> { Ok(Vec::new()) }
}

/// Offers text and JSON forms only.
struct Textual;

impl Reflect for Textual {
    fn describe(&self) -> TypeInfo { TypeInfo::of_kind::<Self>(Kind::String) }

    fn reflect(&self) -> Value<'_> { Value::Str("") }

    fn as_text_marshal(&self) -> Option<&dyn TextMarshal> { Some(self) }

    fn as_json_marshal(&self) -> Option<&dyn JsonMarshal> { Some(self) }
}

impl TextMarshal for Textual {
    fn marshal_text(&self) -> Result<String, BoxError> { Ok(String::new()) }
}

impl JsonMarshal for Textual {
    fn marshal_json(&self) -> Result<Vec<u8>, BoxError> { Ok(Vec::new()) }
}

fn empty_ext(_: &dyn Reflect) -> Result<Vec<u8>, BoxError> { Ok(Vec::new()) }

#[test]
fn self_encode_comes_first() {
    let mut extensions = Extensions::new();
    extensions.register::<Everything>(1, empty_ext);
    let handle = Handle::builder().extensions(extensions).build();

    let codec = handle.codec_fn(&Everything);
    assert!(matches!(codec.strategy(), Strategy::SelfEncode));
}

#[test]
fn extensions_come_before_marshalers() {
    let mut extensions = Extensions::new();
    extensions.register::<Textual>(3, empty_ext);
    let handle = Handle::builder().extensions(extensions).build();

    match handle.codec_fn(&Textual).strategy() {
        Strategy::Ext(entry) => assert_eq!(entry.tag(), 3),
        other => panic!("unexpected strategy {other:?}"),
    }
}

#[test]
fn text_marshal_comes_before_json() {
    let handle = Handle::default();

    assert!(matches!(
        handle.codec_fn(&Textual).strategy(),
        Strategy::TextMarshal
    ));
}

#[test]
fn raw_and_kinds() {
    let handle = Handle::default();

    assert!(matches!(
        handle.codec_fn(&Raw(Vec::new())).strategy(),
        Strategy::Raw
    ));
    assert!(matches!(
        handle.codec_fn(&Point::default()).strategy(),
        Strategy::Kind(Kind::Struct)
    ));
    assert!(matches!(
        handle.codec_fn(&vec![1u8]).strategy(),
        Strategy::Kind(Kind::Slice)
    ));
}

#[test]
fn strategies_are_cached_by_type() {
    let handle = Handle::default();

    let a = handle.codec_fn(&Point { x: 1, y: 1 });
    let b = handle.codec_fn(&Point::default());

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(handle.cached_len(), 1);
    assert_eq!(a.info().type_id(), TypeId::of::<Point>());
}

#[test]
fn builder_defaults() {
    let handle = Handle::default();

    assert_eq!(*handle.options(), CodecOptions::default());
    assert!(handle.extensions().is_empty());
    assert_eq!(handle.cached_len(), 0);

    let options = CodecOptions::builder().canonical(true).build();
    assert!(Handle::new(options).options().canonical);
}
