//! A driver writing a readable trace, and fixture types, for unit tests.

use std::{
    cell::OnceCell,
    fmt::Write as _,
    io::{self, Write},
    rc::Rc,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use crate::{
    ContainerState, Driver, EncWriter, Encoder, Field, Handle, Reflect,
    StructValue, TypeInfo, Value, options::CodecOptions,
};

/// Writes each operation as a short token:
///
/// - `nil`, `true`, `i-3`, `u7`, `f1.5`, `d2.5`, `"text"`, `b'00ff'`, `t12`
/// - `x5'0102'` for extensions
/// - `[2:a,b]` for arrays and `{2:k=v,k=v}` for maps, with the length first
/// - bare names for plain ASCII field names, quoted otherwise
#[derive(Debug, Default)]
pub struct Trace {
    pub ends: usize,
    pub resets: usize,
    pub json: bool,
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::new(), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

impl Driver for Trace {
    fn encode_nil(&mut self, w: &mut EncWriter) -> io::Result<()> {
        w.write_all(b"nil")
    }

    fn encode_int(&mut self, w: &mut EncWriter, v: i64) -> io::Result<()> {
        write!(w, "i{v}")
    }

    fn encode_uint(&mut self, w: &mut EncWriter, v: u64) -> io::Result<()> {
        write!(w, "u{v}")
    }

    fn encode_bool(&mut self, w: &mut EncWriter, v: bool) -> io::Result<()> {
        write!(w, "{v}")
    }

    fn encode_f32(&mut self, w: &mut EncWriter, v: f32) -> io::Result<()> {
        write!(w, "f{v}")
    }

    fn encode_f64(&mut self, w: &mut EncWriter, v: f64) -> io::Result<()> {
        write!(w, "d{v}")
    }

    fn encode_string(&mut self, w: &mut EncWriter, v: &str) -> io::Result<()> {
        write!(w, "{v:?}")
    }

    fn encode_string_bytes_raw(
        &mut self,
        w: &mut EncWriter,
        v: &[u8],
    ) -> io::Result<()> {
        write!(w, "b'{}'", hex(v))
    }

    fn encode_time(
        &mut self,
        w: &mut EncWriter,
        v: SystemTime,
    ) -> io::Result<()> {
        let secs = v.duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs());
        write!(w, "t{secs}")
    }

    fn encode_ext(
        &mut self,
        w: &mut EncWriter,
        tag: u64,
        data: &[u8],
    ) -> io::Result<()> {
        write!(w, "x{tag}'{}'", hex(data))
    }

    fn write_array_start(
        &mut self,
        w: &mut EncWriter,
        len: usize,
    ) -> io::Result<()> {
        write!(w, "[{len}:")
    }

    fn write_map_start(
        &mut self,
        w: &mut EncWriter,
        len: usize,
    ) -> io::Result<()> {
        write!(w, "{{{len}:")
    }

    fn encode_field_name(
        &mut self,
        w: &mut EncWriter,
        name: &str,
        ascii_alnum: bool,
    ) -> io::Result<()> {
        if ascii_alnum {
            w.write_all(name.as_bytes())
        } else {
            write!(w, "{name:?}")
        }
    }

    fn write_array_end(&mut self, w: &mut EncWriter) -> io::Result<()> {
        w.write_u8(b']')
    }

    fn write_map_end(&mut self, w: &mut EncWriter) -> io::Result<()> {
        w.write_u8(b'}')
    }

    fn write_array_elem(
        &mut self,
        w: &mut EncWriter,
        prev: ContainerState,
    ) -> io::Result<()> {
        if prev == ContainerState::ArrayStart {
            return Ok(());
        }
        w.write_u8(b',')
    }

    fn write_map_elem_key(
        &mut self,
        w: &mut EncWriter,
        prev: ContainerState,
    ) -> io::Result<()> {
        if prev == ContainerState::MapStart {
            return Ok(());
        }
        w.write_u8(b',')
    }

    fn write_map_elem_value(
        &mut self,
        w: &mut EncWriter,
        _: ContainerState,
    ) -> io::Result<()> {
        w.write_u8(b'=')
    }

    fn writes_json(&self) -> bool { self.json }

    fn reset(&mut self, _: &CodecOptions) { self.resets += 1; }

    fn at_end_of_encode(&mut self, _: &mut EncWriter) -> io::Result<()> {
        self.ends += 1;
        Ok(())
    }
}

pub fn encoder(options: CodecOptions) -> Encoder<Trace> {
    let handle = Arc::new(Handle::new(options));
    Encoder::to_bytes(Trace::default(), handle, Vec::new())
}

/// Encodes `value` and returns the trace, or the error message.
pub fn trace(options: CodecOptions, value: &dyn Reflect) -> String {
    let mut encoder = encoder(options);
    match encoder.encode(value) {
        Ok(()) => String::from_utf8(encoder.take_bytes().unwrap_or_default())
            .unwrap_or_default(),
        Err(error) => format!("error: {error}"),
    }
}

// =============================================================================
// Fixtures
// =============================================================================

#[derive(Debug, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Reflect for Point {
    fn describe(&self) -> TypeInfo {
        TypeInfo::structure::<Self>()
            .field(Field::new("x"))
            .field(Field::new("y"))
            .build()
    }

    fn reflect(&self) -> Value<'_> { Value::Struct(self) }
}

impl StructValue for Point {
    fn field(&self, index: usize) -> Option<&dyn Reflect> {
        match index {
            0 => Some(&self.x),
            1 => Some(&self.y),
            _ => None,
        }
    }
}

/// Declares fields out of name order, with omittable references and
/// scalars.
#[derive(Debug, Default)]
pub struct Profile {
    pub name: String,
    pub age: u32,
    pub tags: Vec<String>,
    pub home: Option<Box<Point>>,
}

impl Profile {
    pub fn type_info() -> TypeInfo {
        TypeInfo::structure::<Self>()
            .field(Field::new("name"))
            .field(Field::new("age").omit_empty())
            .field(Field::new("tags").omit_empty())
            .field(Field::new("home").omit_empty())
            .build()
    }
}

impl Reflect for Profile {
    fn describe(&self) -> TypeInfo { Self::type_info() }

    fn reflect(&self) -> Value<'_> { Value::Struct(self) }
}

impl StructValue for Profile {
    fn field(&self, index: usize) -> Option<&dyn Reflect> {
        match index {
            0 => Some(&self.name),
            1 => Some(&self.age),
            2 => Some(&self.tags),
            3 => Some(&self.home),
            _ => None,
        }
    }
}

/// A chain link that drops an empty `next`; links may form a ring.
#[derive(Default)]
pub struct Chain {
    pub id: u32,
    pub next: OnceCell<Rc<Chain>>,
}

impl Chain {
    pub fn new(id: u32) -> Rc<Self> {
        Rc::new(Self { id, next: OnceCell::new() })
    }
}

impl Reflect for Chain {
    fn describe(&self) -> TypeInfo {
        TypeInfo::structure::<Self>()
            .field(Field::new("id"))
            .field(Field::new("next").omit_empty())
            .build()
    }

    fn reflect(&self) -> Value<'_> { Value::Struct(self) }
}

impl StructValue for Chain {
    fn field(&self, index: usize) -> Option<&dyn Reflect> {
        match index {
            0 => Some(&self.id),
            1 => Some(&self.next),
            _ => None,
        }
    }
}
