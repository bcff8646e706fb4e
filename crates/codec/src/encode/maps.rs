use std::{cmp::Ordering, io::Write, mem, time::SystemTime};

use crate::{
    driver::Driver,
    encode::{Encoder, FnSlot},
    error::EncodeError,
    reflect::{MapValue, Reflect, Value},
    type_info::TypeInfo,
};

type Entry<'a> = (&'a dyn Reflect, &'a dyn Reflect);

/// A map key whose kind has a natural total order.
#[derive(Debug, Clone, Copy)]
enum NaturalKey<'a> {
    Bool(bool),
    Int(i64),
    Uint(u64),
    F32(f32),
    F64(f64),
    Str(&'a str),
    Time(SystemTime),
}

impl<'a> NaturalKey<'a> {
    fn of(key: &'a dyn Reflect) -> Option<Self> {
        Some(match key.reflect() {
            Value::Bool(v) => Self::Bool(v),
            Value::Int(v) => Self::Int(v),
            Value::Uint(v) => Self::Uint(v),
            Value::F32(v) => Self::F32(v),
            Value::F64(v) => Self::F64(v),
            Value::Str(v) => Self::Str(v),
            Value::Time(v) => Self::Time(v),
            _ => return None,
        })
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Uint(a), Self::Uint(b)) => a.cmp(b),
            (Self::F32(a), Self::F32(b)) => {
                float_order(f64::from(*a), f64::from(*b))
            }
            (Self::F64(a), Self::F64(b)) => float_order(*a, *b),
            (Self::Str(a), Self::Str(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Self::Time(a), Self::Time(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// Ascending order with NaN before every number.
fn float_order(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Returns the natural keys of `entries` if every key has the same naturally
/// ordered kind.
fn natural_keys<'a>(entries: &[Entry<'a>]) -> Option<Vec<NaturalKey<'a>>> {
    let mut keys: Vec<NaturalKey<'a>> = Vec::with_capacity(entries.len());

    for (key, _) in entries {
        let natural = NaturalKey::of(*key)?;

        let mismatch = keys.first().is_some_and(|first| {
            mem::discriminant(first) != mem::discriminant(&natural)
        });
        if mismatch {
            return None;
        }

        keys.push(natural);
    }

    Some(keys)
}

impl<D: Driver> Encoder<D> {
    pub(super) fn encode_map(
        &mut self,
        map: &dyn MapValue,
        info: &TypeInfo,
    ) -> Result<(), EncodeError> {
        let len = map.len();
        self.write_map_start(len)?;

        if len == 0 {
            self.write_map_end()?;
            return Ok(());
        }

        if self.handle.options().canonical {
            self.encode_map_canonical(map, info)?;
        } else {
            let mut key_slot = None;
            let mut value_slot = None;

            for (key, value) in map.entries() {
                let (mut fresh_key, mut fresh_value) = (None, None);

                self.write_map_elem_key()?;
                self.encode_value(
                    key,
                    pick(info.key_dynamic(), &mut key_slot, &mut fresh_key),
                )?;
                self.write_map_elem_value()?;
                let dynamic = info.elem_dynamic();
                let slot = pick(dynamic, &mut value_slot, &mut fresh_value);
                self.encode_value(value, slot)?;
            }
        }

        self.write_map_end()?;
        Ok(())
    }

    fn encode_map_canonical(
        &mut self,
        map: &dyn MapValue,
        info: &TypeInfo,
    ) -> Result<(), EncodeError> {
        let entries: Vec<Entry<'_>> = map.entries().collect();

        let natural =
            if info.key_dynamic() { None } else { natural_keys(&entries) };

        match natural {
            Some(keys) => self.encode_natural_entries(&entries, &keys, info),
            None => self.encode_out_of_band_entries(&entries, info),
        }
    }

    fn encode_natural_entries(
        &mut self,
        entries: &[Entry<'_>],
        keys: &[NaturalKey<'_>],
        info: &TypeInfo,
    ) -> Result<(), EncodeError> {
        let mut order: Vec<usize> = (0..entries.len()).collect();
        order.sort_by(|&a, &b| keys[a].compare(&keys[b]));

        let string_to_raw = self.handle.options().string_to_raw;
        let mut value_slot = None;

        for index in order {
            self.write_map_elem_key()?;

            let w = &mut self.wr;
            match keys[index] {
                NaturalKey::Bool(v) => self.driver.encode_bool(w, v)?,
                NaturalKey::Int(v) => self.driver.encode_int(w, v)?,
                NaturalKey::Uint(v) => self.driver.encode_uint(w, v)?,
                NaturalKey::F32(v) => self.driver.encode_f32(w, v)?,
                NaturalKey::F64(v) => self.driver.encode_f64(w, v)?,
                NaturalKey::Str(v) if string_to_raw => {
                    self.driver.encode_string_bytes_raw(w, v.as_bytes())?;
                }
                NaturalKey::Str(v) => self.driver.encode_string(w, v)?,
                NaturalKey::Time(v) => self.driver.encode_time(w, v)?,
            }

            self.write_map_elem_value()?;

            let mut fresh = None;
            self.encode_value(
                entries[index].1,
                pick(info.elem_dynamic(), &mut value_slot, &mut fresh),
            )?;
        }

        Ok(())
    }

    /// Orders entries by the encoded bytes of their keys, which are written
    /// verbatim.
    fn encode_out_of_band_entries(
        &mut self,
        entries: &[Entry<'_>],
        info: &TypeInfo,
    ) -> Result<(), EncodeError> {
        let mut buf = self.key_bufs.pop().unwrap_or_default();
        buf.clear();

        let mut spans = Vec::with_capacity(entries.len());
        for (index, (key, _)) in entries.iter().enumerate() {
            let start = buf.len();
            buf = self.encode_detached(*key, buf)?;
            spans.push((start, buf.len(), index));
        }

        tracing::trace!(
            keys = spans.len(),
            bytes = buf.len(),
            "encoded canonical map keys out of band"
        );

        spans.sort_by(|a, b| buf[a.0..a.1].cmp(&buf[b.0..b.1]));

        let mut value_slot = None;
        for &(start, end, index) in &spans {
            self.write_map_elem_key()?;
            self.wr.write_all(&buf[start..end])?;
            self.write_map_elem_value()?;

            let mut fresh = None;
            self.encode_value(
                entries[index].1,
                pick(info.elem_dynamic(), &mut value_slot, &mut fresh),
            )?;
        }

        self.key_bufs.push(buf);
        Ok(())
    }
}

/// Shares `cached` between homogeneous elements; dynamic elements resolve
/// afresh every time.
pub(super) fn pick<'s>(
    dynamic: bool,
    cached: &'s mut FnSlot,
    fresh: &'s mut FnSlot,
) -> &'s mut FnSlot {
    if dynamic { fresh } else { cached }
}
