use std::mem;

use crate::{
    driver::Driver,
    encode::{Encoder, maps::pick},
    error::EncodeError,
    reflect::{ChanValue, SeqValue},
    type_info::TypeInfo,
};

impl<D: Driver> Encoder<D> {
    pub(super) fn encode_seq(
        &mut self,
        seq: &dyn SeqValue,
        info: &TypeInfo,
    ) -> Result<(), EncodeError> {
        if info.is_map_by_slice() {
            return self.encode_map_by_slice(seq, info.elem_dynamic());
        }

        if info.elem_is_byte() {
            if let Some(bytes) = seq.as_bytes() {
                self.driver.encode_string_bytes_raw(&mut self.wr, bytes)?;
                return Ok(());
            }
        }

        self.encode_elems(seq, info.elem_dynamic())
    }

    fn encode_elems(
        &mut self,
        seq: &dyn SeqValue,
        dynamic: bool,
    ) -> Result<(), EncodeError> {
        let len = seq.len();
        self.write_array_start(len)?;

        let mut slot = None;
        for index in 0..len {
            self.write_array_elem()?;

            let mut fresh = None;
            self.encode_value(
                seq.index(index),
                pick(dynamic, &mut slot, &mut fresh),
            )?;
        }

        self.write_array_end()?;
        Ok(())
    }

    fn encode_map_by_slice(
        &mut self,
        seq: &dyn SeqValue,
        dynamic: bool,
    ) -> Result<(), EncodeError> {
        let len = seq.len();

        if len % 2 != 0 {
            return Err(EncodeError::MalformedFlattenedSequence { len });
        }

        self.write_map_start(len / 2)?;

        let mut slot = None;
        for index in 0..len {
            if index % 2 == 0 {
                self.write_map_elem_key()?;
            } else {
                self.write_map_elem_value()?;
            }

            let mut fresh = None;
            self.encode_value(
                seq.index(index),
                pick(dynamic, &mut slot, &mut fresh),
            )?;
        }

        self.write_map_end()?;
        Ok(())
    }

    pub(super) fn encode_chan(
        &mut self,
        chan: &dyn ChanValue,
        info: &TypeInfo,
    ) -> Result<(), EncodeError> {
        let dir = info.chan_dir().unwrap_or_else(|| chan.dir());
        if !dir.can_recv() {
            return Err(EncodeError::SendOnlyChannel { type_name: info.name() });
        }

        let timeout = self.handle.options().chan_recv_timeout;

        if info.elem_is_byte() && !info.is_map_by_slice() {
            let mut scratch = mem::take(&mut self.scratch);
            scratch.clear();

            if chan.drain_bytes(timeout, &mut scratch) {
                tracing::trace!(
                    len = scratch.len(),
                    ?timeout,
                    "drained byte channel"
                );

                let result =
                    self.driver.encode_string_bytes_raw(&mut self.wr, &scratch);
                self.scratch = scratch;
                return Ok(result?);
            }

            self.scratch = scratch;
        }

        let drained = chan.drain(timeout);
        tracing::trace!(len = drained.len(), ?timeout, "drained channel");

        if info.is_map_by_slice() {
            self.encode_map_by_slice(&*drained, info.elem_dynamic())
        } else {
            self.encode_elems(&*drained, info.elem_dynamic())
        }
    }
}
