//! Circular reference detection.

use std::rc::Rc;

use trellis_codec::{
    CodecOptions, EncodeError, Encoder, Field, Reflect, StructValue, TypeInfo,
    Value,
};
use trellis_integration_test::{
    Link,
    compact::{Compact, Token, tokens},
    decode, handle,
};

/// Holds two references that may point at the same node.
struct Pair {
    left: Rc<Link>,
    right: Rc<Link>,
}

impl Reflect for Pair {
    fn describe(&self) -> TypeInfo {
        TypeInfo::structure::<Self>()
            .field(Field::new("left"))
            .field(Field::new("right"))
            .build()
    }

    fn reflect(&self) -> Value<'_> { Value::Struct(self) }
}

impl StructValue for Pair {
    fn field(&self, index: usize) -> Option<&dyn Reflect> {
        match index {
            0 => Some(&self.left),
            1 => Some(&self.right),
            _ => None,
        }
    }
}

fn checked() -> CodecOptions {
    CodecOptions::builder().check_circular_ref(true).build()
}

#[test]
fn cycles_are_detected() {
    let a = Link::new("a");
    let b = Link::new("b");
    a.next.set(Rc::clone(&b)).unwrap();
    b.next.set(Rc::clone(&a)).unwrap();

    let error = decode(checked(), &a).unwrap_err();

    match error {
        EncodeError::CircularReference { type_name, address } => {
            assert!(type_name.ends_with("Link"));
            assert_eq!(address, Rc::as_ptr(&a).addr());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn self_loops_are_detected() {
    let a = Link::new("a");
    a.next.set(Rc::clone(&a)).unwrap();

    assert!(matches!(
        decode(checked(), &a),
        Err(EncodeError::CircularReference { .. })
    ));
}

#[test]
fn shared_nodes_are_not_cycles() {
    let tail = Link::new("tail");
    let pair = Pair { left: Rc::clone(&tail), right: Rc::clone(&tail) };

    let node = [
        Token::Map(2),
        Token::str("name"),
        Token::str("tail"),
        Token::str("next"),
        Token::Nil,
    ];
    let mut expected = vec![Token::Map(2), Token::str("left")];
    expected.extend_from_slice(&node);
    expected.push(Token::str("right"));
    expected.extend_from_slice(&node);

    assert_eq!(decode(checked(), &pair).unwrap(), expected);
}

#[test]
fn chains_encode_with_or_without_the_check() {
    let c = Link::new("c");
    let b = Link::new("b");
    b.next.set(Rc::clone(&c)).unwrap();
    let a = Link::new("a");
    a.next.set(Rc::clone(&b)).unwrap();

    let unchecked = decode(CodecOptions::default(), &a).unwrap();

    assert_eq!(unchecked, decode(checked(), &a).unwrap());
    assert_eq!(unchecked.len(), 3 * 4 + 1);
    assert_eq!(unchecked[2], Token::str("a"));
}

#[test]
fn an_encoder_recovers_after_a_cycle() {
    let a = Link::new("a");
    a.next.set(Rc::clone(&a)).unwrap();
    let b = Link::new("b");

    let mut encoder =
        Encoder::to_bytes(Compact::default(), handle(checked()), Vec::new());

    assert!(encoder.encode(&a).is_err());

    encoder.reset_bytes(Vec::new());
    encoder.encode(&b).unwrap();
    encoder.encode(&b).unwrap();

    let decoded = tokens(&encoder.take_bytes().unwrap()).unwrap();
    assert_eq!(decoded.len(), 2 * 5);
}
