// Copyright 2023 Datafuse Labs.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use byteorder::ByteOrder;
use byteorder::NativeEndian;

use crate::constants::*;
use crate::error::Error;
use crate::error::Result;
use crate::jentry::JEntry;
use crate::number::Number;
use crate::value::Value;

/// A borrowed, already-serialized jsonb container.
///
/// All read-side operations (lookup, iteration, compare, containment,
/// hashing, text output) work directly on these bytes without building a
/// value tree first.
#[derive(Debug, Clone, Copy)]
pub struct RawJsonb<'a> {
    pub(crate) data: &'a [u8],
}

/// Decoded container header word.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ContainerHeader {
    pub(crate) count: usize,
    pub(crate) is_object: bool,
    pub(crate) raw_scalar: bool,
}

impl ContainerHeader {
    /// Number of entry words: objects store keys and values as one run.
    pub(crate) fn entry_run(&self) -> usize {
        if self.is_object {
            self.count * 2
        } else {
            self.count
        }
    }
}

impl<'a> RawJsonb<'a> {
    pub fn new(data: &'a [u8]) -> RawJsonb<'a> {
        RawJsonb { data }
    }

    pub fn as_raw(&self) -> &'a [u8] {
        self.data
    }

    fn read_u32(&self, offset: usize) -> Result<u32> {
        self.data
            .get(offset..offset + 4)
            .map(NativeEndian::read_u32)
            .ok_or(Error::InvalidJsonb)
    }

    pub(crate) fn header(&self) -> Result<ContainerHeader> {
        let word = self.read_u32(0)?;
        let count = (word & CONTAINER_CMASK) as usize;
        let is_object = word & CONTAINER_FOBJECT != 0;
        let is_array = word & CONTAINER_FARRAY != 0;
        let raw_scalar = word & CONTAINER_FSCALAR != 0;
        if is_object == is_array {
            return Err(Error::InvalidJsonb);
        }
        if raw_scalar && (is_object || count != 1) {
            return Err(Error::InvalidJsonb);
        }
        Ok(ContainerHeader {
            count,
            is_object,
            raw_scalar,
        })
    }

    pub(crate) fn entry(&self, index: usize) -> Result<JEntry> {
        Ok(JEntry::decode(self.read_u32(4 + 4 * index)?))
    }

    /// Byte offset of an entry's payload, relative to the payload region.
    ///
    /// Reconstructed by walking backwards over stored lengths until the
    /// nearest entry that carries an end offset; the stride guarantees the
    /// walk stays short.
    pub(crate) fn entry_offset(&self, index: usize) -> Result<usize> {
        let mut offset = 0usize;
        for j in (0..index).rev() {
            let entry = self.entry(j)?;
            offset += entry.off_len as usize;
            if entry.has_off {
                break;
            }
        }
        Ok(offset)
    }

    pub(crate) fn entry_length(&self, index: usize) -> Result<usize> {
        let entry = self.entry(index)?;
        if entry.has_off {
            let start = self.entry_offset(index)?;
            (entry.off_len as usize)
                .checked_sub(start)
                .ok_or(Error::InvalidJsonb)
        } else {
            Ok(entry.off_len as usize)
        }
    }

    /// Decodes the payload of one entry into a value. Nested containers
    /// come back as `Value::Binary` borrowing this buffer.
    pub(crate) fn entry_value(&self, header: &ContainerHeader, index: usize) -> Result<Value<'a>> {
        let entry = self.entry(index)?;
        let offset = self.entry_offset(index)?;
        let length = self.entry_length(index)?;
        let base = 4 + 4 * header.entry_run();
        let payload = self
            .data
            .get(base + offset..base + offset + length)
            .ok_or(Error::InvalidJsonb)?;
        let pad = JEntry::pad_for(entry.type_code, offset);
        match entry.type_code {
            JENTRY_IS_NULL => Ok(Value::Null),
            JENTRY_IS_BOOL_TRUE => Ok(Value::Bool(true)),
            JENTRY_IS_BOOL_FALSE => Ok(Value::Bool(false)),
            JENTRY_IS_STRING => {
                let s = std::str::from_utf8(payload)?;
                Ok(Value::String(s.into()))
            }
            JENTRY_IS_NUMERIC => {
                let body = payload.get(pad..).ok_or(Error::InvalidJsonb)?;
                Ok(Value::Number(Number::compact_decode(body)?))
            }
            JENTRY_IS_CONTAINER => {
                let body = payload.get(pad..).ok_or(Error::InvalidJsonb)?;
                Ok(Value::Binary(RawJsonb::new(body)))
            }
            _ => Err(Error::InvalidJsonb),
        }
    }

    /// The key string of object pair `index`.
    pub(crate) fn key_at(&self, header: &ContainerHeader, index: usize) -> Result<&'a str> {
        let entry = self.entry(index)?;
        if entry.type_code != JENTRY_IS_STRING {
            return Err(Error::InvalidJsonb);
        }
        let offset = self.entry_offset(index)?;
        let length = self.entry_length(index)?;
        let base = 4 + 4 * header.entry_run();
        let bytes = self
            .data
            .get(base + offset..base + offset + length)
            .ok_or(Error::InvalidJsonb)?;
        Ok(std::str::from_utf8(bytes)?)
    }
}
