//! A driver that records every call it receives.

use std::{io, time::SystemTime};

use trellis_codec::{CodecOptions, ContainerState, Driver, EncWriter, RawExt};

use crate::compact::Compact;

/// One driver call.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    F32(f32),
    F64(f64),
    Str(String),
    Bytes(Vec<u8>),
    Time(SystemTime),
    Ext(u64, Vec<u8>),
    RawExt(u64, Vec<u8>),
    FieldName(String, bool),
    ArrayStart(usize),
    ArrayElem(ContainerState),
    ArrayEnd,
    MapStart(usize),
    MapKey(ContainerState),
    MapValue(ContainerState),
    MapEnd,
    End,
}

impl Op {
    /// Shorthand for a field name with the ASCII hint set.
    #[must_use]
    pub fn field(name: &str) -> Self { Self::FieldName(name.to_owned(), true) }

    /// Shorthand for a string.
    #[must_use]
    pub fn str(s: &str) -> Self { Self::Str(s.to_owned()) }
}

/// Records calls, then forwards them to [`Compact`] so that the output is
/// still well formed.
#[derive(Debug, Default)]
pub struct Recorder {
    ops: Vec<Op>,
    resets: usize,
    inner: Compact,
}

impl Recorder {
    /// The calls recorded so far.
    #[must_use]
    pub fn ops(&self) -> &[Op] { &self.ops }

    /// Takes the calls recorded so far.
    pub fn take_ops(&mut self) -> Vec<Op> { std::mem::take(&mut self.ops) }

    /// Number of times the driver has been reset.
    #[must_use]
    pub const fn resets(&self) -> usize { self.resets }
}

impl Driver for Recorder {
    fn encode_nil(&mut self, w: &mut EncWriter) -> io::Result<()> {
        self.ops.push(Op::Nil);
        self.inner.encode_nil(w)
    }

    fn encode_int(&mut self, w: &mut EncWriter, v: i64) -> io::Result<()> {
        self.ops.push(Op::Int(v));
        self.inner.encode_int(w, v)
    }

    fn encode_uint(&mut self, w: &mut EncWriter, v: u64) -> io::Result<()> {
        self.ops.push(Op::Uint(v));
        self.inner.encode_uint(w, v)
    }

    fn encode_bool(&mut self, w: &mut EncWriter, v: bool) -> io::Result<()> {
        self.ops.push(Op::Bool(v));
        self.inner.encode_bool(w, v)
    }

    fn encode_f32(&mut self, w: &mut EncWriter, v: f32) -> io::Result<()> {
        self.ops.push(Op::F32(v));
        self.inner.encode_f32(w, v)
    }

    fn encode_f64(&mut self, w: &mut EncWriter, v: f64) -> io::Result<()> {
        self.ops.push(Op::F64(v));
        self.inner.encode_f64(w, v)
    }

    fn encode_string(&mut self, w: &mut EncWriter, v: &str) -> io::Result<()> {
        self.ops.push(Op::Str(v.to_owned()));
        self.inner.encode_string(w, v)
    }

    fn encode_string_bytes_raw(
        &mut self,
        w: &mut EncWriter,
        v: &[u8],
    ) -> io::Result<()> {
        self.ops.push(Op::Bytes(v.to_vec()));
        self.inner.encode_string_bytes_raw(w, v)
    }

    fn encode_time(
        &mut self,
        w: &mut EncWriter,
        v: SystemTime,
    ) -> io::Result<()> {
        self.ops.push(Op::Time(v));
        self.inner.encode_time(w, v)
    }

    fn encode_ext(
        &mut self,
        w: &mut EncWriter,
        tag: u64,
        data: &[u8],
    ) -> io::Result<()> {
        self.ops.push(Op::Ext(tag, data.to_vec()));
        self.inner.encode_ext(w, tag, data)
    }

    fn encode_raw_ext(
        &mut self,
        w: &mut EncWriter,
        ext: &RawExt,
    ) -> io::Result<()> {
        self.ops.push(Op::RawExt(ext.tag, ext.data.clone()));
        self.inner.encode_ext(w, ext.tag, &ext.data)
    }

    fn encode_field_name(
        &mut self,
        w: &mut EncWriter,
        name: &str,
        ascii_alnum: bool,
    ) -> io::Result<()> {
        self.ops.push(Op::FieldName(name.to_owned(), ascii_alnum));
        self.inner.encode_string(w, name)
    }

    fn write_array_start(
        &mut self,
        w: &mut EncWriter,
        len: usize,
    ) -> io::Result<()> {
        self.ops.push(Op::ArrayStart(len));
        self.inner.write_array_start(w, len)
    }

    fn write_map_start(
        &mut self,
        w: &mut EncWriter,
        len: usize,
    ) -> io::Result<()> {
        self.ops.push(Op::MapStart(len));
        self.inner.write_map_start(w, len)
    }

    fn write_array_end(&mut self, _: &mut EncWriter) -> io::Result<()> {
        self.ops.push(Op::ArrayEnd);
        Ok(())
    }

    fn write_map_end(&mut self, _: &mut EncWriter) -> io::Result<()> {
        self.ops.push(Op::MapEnd);
        Ok(())
    }

    fn write_array_elem(
        &mut self,
        _: &mut EncWriter,
        prev: ContainerState,
    ) -> io::Result<()> {
        self.ops.push(Op::ArrayElem(prev));
        Ok(())
    }

    fn write_map_elem_key(
        &mut self,
        _: &mut EncWriter,
        prev: ContainerState,
    ) -> io::Result<()> {
        self.ops.push(Op::MapKey(prev));
        Ok(())
    }

    fn write_map_elem_value(
        &mut self,
        _: &mut EncWriter,
        prev: ContainerState,
    ) -> io::Result<()> {
        self.ops.push(Op::MapValue(prev));
        Ok(())
    }

    fn reset(&mut self, options: &CodecOptions) {
        self.resets += 1;
        self.inner.reset(options);
    }

    fn at_end_of_encode(&mut self, w: &mut EncWriter) -> io::Result<()> {
        self.ops.push(Op::End);
        self.inner.at_end_of_encode(w)
    }
}
