//! Struct layout: map and array modes, omission, embedding and extras.

use trellis_codec::{
    CodecOptions, EncodeError, Field, KeyType, Reflect, StructValue, TypeInfo,
    Value,
};
use trellis_integration_test::{
    Address, Bag, Customer, LineItem, Money, Order, compact::Token, decode,
    record, recorder::Op,
};

/// A struct whose keys are written as unsigned integers.
struct Numbered {
    first: String,
    second: bool,
}

impl Reflect for Numbered {
    fn describe(&self) -> TypeInfo {
        TypeInfo::structure::<Self>()
            .field(Field::new("1"))
            .field(Field::new("2"))
            .key_type(KeyType::Uint)
            .build()
    }

    fn reflect(&self) -> Value<'_> { Value::Struct(self) }
}

impl StructValue for Numbered {
    fn field(&self, index: usize) -> Option<&dyn Reflect> {
        match index {
            0 => Some(&self.first),
            1 => Some(&self.second),
            _ => None,
        }
    }
}

/// Declares a key that is not a number while asking for integer keys.
struct Mislabeled(u8);

impl Reflect for Mislabeled {
    fn describe(&self) -> TypeInfo {
        TypeInfo::structure::<Self>()
            .field(Field::new("one"))
            .key_type(KeyType::Int)
            .build()
    }

    fn reflect(&self) -> Value<'_> { Value::Struct(self) }
}

impl StructValue for Mislabeled {
    fn field(&self, index: usize) -> Option<&dyn Reflect> {
        (index == 0).then_some(&self.0 as &dyn Reflect)
    }
}

fn to_array() -> CodecOptions {
    CodecOptions::builder().struct_to_array(true).build()
}

// ============================================================================
// Map mode
// ============================================================================

#[test]
fn map_mode_omits_empty_fields_and_flattens_embeds() {
    assert_eq!(decode(CodecOptions::default(), &Customer::sample()).unwrap(), [
        Token::Map(5),
        Token::str("id"),
        Token::Uint(7),
        Token::str("name"),
        Token::str("Ada"),
        Token::str("address"),
        Token::Map(2),
        Token::str("street"),
        Token::str("1 Loop Rd"),
        Token::str("city"),
        Token::str("Lund"),
        Token::str("revision"),
        Token::Uint(3),
        Token::str("created"),
        Token::Time(1_700_000_000, 0),
    ]);
}

#[test]
fn present_optional_fields_are_written() {
    let customer = Customer {
        email: Some("ada@example.org".to_owned()),
        ..Customer::sample()
    };

    let tokens = decode(CodecOptions::default(), &customer).unwrap();

    assert_eq!(tokens[0], Token::Map(6));
    assert_eq!(tokens[tokens.len() - 2..], [
        Token::str("email"),
        Token::str("ada@example.org"),
    ]);
}

#[test]
fn field_names_carry_the_ascii_hint() {
    let ops = record(CodecOptions::default(), &Address::default()).unwrap();

    assert!(ops.contains(&Op::field("street")));
    assert!(ops.contains(&Op::field("city")));
}

#[test]
fn numeric_keys() {
    let value = Numbered { first: "a".to_owned(), second: true };

    assert_eq!(decode(CodecOptions::default(), &value).unwrap(), [
        Token::Map(2),
        Token::Uint(1),
        Token::str("a"),
        Token::Uint(2),
        Token::Bool(true),
    ]);
}

#[test]
fn unparsable_numeric_key_fails() {
    let error = decode(CodecOptions::default(), &Mislabeled(1)).unwrap_err();

    match error {
        EncodeError::InvalidKeyEncoding { key, key_type } => {
            assert_eq!(key, "one");
            assert_eq!(key_type, KeyType::Int);
        }
        other => panic!("unexpected error: {other}"),
    }
}

// ============================================================================
// Array mode
// ============================================================================

#[test]
fn array_mode_writes_every_field_positionally() {
    assert_eq!(decode(to_array(), &Customer::sample()).unwrap(), [
        Token::Array(6),
        Token::Uint(7),
        Token::str("Ada"),
        Token::Array(3),
        Token::str("1 Loop Rd"),
        Token::str("Lund"),
        Token::Nil,
        Token::Uint(3),
        Token::Time(1_700_000_000, 0),
        Token::Nil,
    ]);
}

#[test]
fn array_mode_keeps_empty_scalars() {
    let order = Order { note: String::new(), ..Order::sample() };

    let tokens = decode(to_array(), &order).unwrap();

    assert_eq!(tokens[0], Token::Array(4));
    assert_eq!(tokens.last(), Some(&Token::str("")));
}

#[test]
fn to_array_types_ignore_the_option() {
    let item = LineItem {
        sku: "A-1".to_owned(),
        quantity: 2,
        price: Money(-1250),
    };

    let expected = [
        Token::Array(3),
        Token::str("A-1"),
        Token::Uint(2),
        Token::str("-12.50"),
    ];
    assert_eq!(decode(CodecOptions::default(), &item).unwrap(), expected);
    assert_eq!(decode(to_array(), &item).unwrap(), expected);
}

// ============================================================================
// Extra fields
// ============================================================================

fn bag() -> Bag {
    Bag {
        kind: "box".to_owned(),
        attrs: vec![
            ("w".to_owned(), 3),
            (String::new(), 1),
            ("h".to_owned(), 0),
            ("d".to_owned(), 2),
        ],
    }
}

#[test]
fn extras_follow_declared_fields() {
    assert_eq!(decode(CodecOptions::default(), &bag()).unwrap(), [
        Token::Map(3),
        Token::str("kind"),
        Token::str("box"),
        Token::str("w"),
        Token::Uint(3),
        Token::str("d"),
        Token::Uint(2),
    ]);
}

#[test]
fn canonical_extras_are_sorted() {
    let options = CodecOptions::builder().canonical(true).build();

    assert_eq!(decode(options, &bag()).unwrap(), [
        Token::Map(3),
        Token::str("kind"),
        Token::str("box"),
        Token::str("d"),
        Token::Uint(2),
        Token::str("w"),
        Token::Uint(3),
    ]);
}

#[test]
fn extras_force_map_mode() {
    let tokens = decode(to_array(), &bag()).unwrap();

    assert_eq!(tokens[0], Token::Map(3));
}

#[test]
fn empty_bag_is_an_empty_map() {
    assert_eq!(decode(CodecOptions::default(), &Bag::default()).unwrap(), [
        Token::Map(0)
    ]);
}
