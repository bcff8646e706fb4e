use crate::{
    driver::Driver,
    empty::is_empty,
    encode::{Encoder, FieldRecord},
    error::EncodeError,
    reflect::{Reflect, StructValue, field_at},
    registry,
    type_info::{KeyType, TypeInfo},
};

impl<D: Driver> Encoder<D> {
    pub(super) fn encode_struct(
        &mut self,
        value: &dyn Reflect,
        fields: &dyn StructValue,
        info: &TypeInfo,
    ) -> Result<(), EncodeError> {
        let extra = if info.capabilities().missing_fields {
            value.as_missing_fields().map(|m| m.missing_fields())
        } else {
            None
        };

        let options = self.handle.options();
        let to_array = info.to_array() || options.struct_to_array;

        match extra {
            Some(extra) => self.encode_struct_map(fields, info, extra),
            None if to_array => self.encode_struct_array(fields, info),
            None => self.encode_struct_map(fields, info, Vec::new()),
        }
    }

    fn encode_struct_map(
        &mut self,
        fields: &dyn StructValue,
        info: &TypeInfo,
        mut extra: Vec<(String, Box<dyn Reflect>)>,
    ) -> Result<(), EncodeError> {
        let options = *self.handle.options();
        let recursive = options.recursive_empty_check;

        let mut records = self.field_pool.pop().unwrap_or_default();
        records.clear();

        for pos in 0..info.fields().len() {
            let index = if options.canonical {
                info.canonical_order()[pos]
            } else {
                pos
            };
            let field = &info.fields()[index];

            if field.omit_empty()
                && field_at(fields, field.path())
                    .is_none_or(|v| is_empty(v, recursive))
            {
                continue;
            }

            records.push(FieldRecord { index, as_nil: false });
        }

        extra.retain(|(name, v)| {
            !name.is_empty()
                && !(info.omit_empty() && is_empty(&**v, recursive))
        });
        if options.canonical {
            extra.sort_by(|(a, _), (b, _)| a.cmp(b));
        }

        self.write_map_start(records.len() + extra.len())?;

        for record in &records {
            let field = &info.fields()[record.index];

            self.write_map_elem_key()?;
            self.encode_field_key(
                info.key_type(),
                field.name(),
                field.ascii_alnum(),
            )?;
            self.write_map_elem_value()?;

            match field_at(fields, field.path()) {
                Some(v) => self.encode_value(v, &mut None)?,
                None => self.driver.encode_nil(&mut self.wr)?,
            }
        }

        for (name, v) in &extra {
            self.write_map_elem_key()?;
            self.encode_field_key(info.key_type(), name, false)?;
            self.write_map_elem_value()?;
            self.encode_value(&**v, &mut None)?;
        }

        self.write_map_end()?;

        self.field_pool.push(records);
        Ok(())
    }

    fn encode_struct_array(
        &mut self,
        fields: &dyn StructValue,
        info: &TypeInfo,
    ) -> Result<(), EncodeError> {
        let recursive = self.handle.options().recursive_empty_check;

        let mut records = self.field_pool.pop().unwrap_or_default();
        records.clear();

        // empty omittable references collapse to nil; empty scalars keep
        // their literal zero
        for (index, field) in info.fields().iter().enumerate() {
            let as_nil = field.omit_empty()
                && field_at(fields, field.path()).is_none_or(|v| {
                    is_empty(v, recursive)
                        && registry::type_info_for(v).kind().is_reference_like()
                });

            records.push(FieldRecord { index, as_nil });
        }

        self.write_array_start(records.len())?;

        for record in &records {
            self.write_array_elem()?;

            let field = &info.fields()[record.index];
            match field_at(fields, field.path()) {
                Some(v) if !record.as_nil => self.encode_value(v, &mut None)?,
                _ => self.driver.encode_nil(&mut self.wr)?,
            }
        }

        self.write_array_end()?;

        self.field_pool.push(records);
        Ok(())
    }

    fn encode_field_key(
        &mut self,
        key_type: KeyType,
        name: &str,
        ascii_alnum: bool,
    ) -> Result<(), EncodeError> {
        let invalid = || EncodeError::InvalidKeyEncoding {
            key: name.to_owned(),
            key_type,
        };
        let w = &mut self.wr;

        match key_type {
            KeyType::String => {
                self.driver.encode_field_name(w, name, ascii_alnum)?;
            }
            KeyType::Int => {
                let v = name.parse::<i64>().map_err(|_| invalid())?;
                self.driver.encode_int(w, v)?;
            }
            KeyType::Uint => {
                let v = name.parse::<u64>().map_err(|_| invalid())?;
                self.driver.encode_uint(w, v)?;
            }
            KeyType::Float => {
                let v = name.parse::<f64>().map_err(|_| invalid())?;
                self.driver.encode_f64(w, v)?;
            }
        }

        Ok(())
    }
}
