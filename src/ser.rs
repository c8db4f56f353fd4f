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

//! Value-tree to container-bytes encoder.
//!
//! Layout per container: a u32 header word, then one u32 entry word per
//! child (two runs for objects: all keys, then all values), then the
//! payload region. Words are host byte order. Number and nested container
//! payloads start on a 4-byte boundary relative to the payload region,
//! with zero padding counted into the entry length.

use byteorder::ByteOrder;
use byteorder::NativeEndian;
use byteorder::WriteBytesExt;

use crate::constants::*;
use crate::error::Error;
use crate::error::Result;
use crate::jentry::JEntry;
use crate::value::KeyValue;
use crate::value::Value;

impl Value<'_> {
    /// Serializes into a fresh buffer.
    ///
    /// A bare scalar becomes the one-element pseudo-array that marks a
    /// scalar root.
    ///
    /// # Examples
    ///
    /// ```
    /// let value = jsonbx::parse_value(b"[]").unwrap();
    /// assert_eq!(value.to_vec().unwrap().len(), 4);
    /// ```
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    /// Serializes onto the end of `buf`.
    pub fn write_to(&self, buf: &mut Vec<u8>) -> Result<()> {
        match self {
            Value::Array(array) => {
                let items: Vec<&Value<'_>> = array.elems.iter().collect();
                write_array(buf, &items, array.raw_scalar, 0)
            }
            Value::Object(object) => write_object(buf, &object.pairs, 0),
            Value::Binary(raw) => {
                raw.header()?;
                buf.extend_from_slice(raw.as_raw());
                Ok(())
            }
            scalar => write_array(buf, &[scalar], true, 0),
        }
    }
}

fn write_array(
    buf: &mut Vec<u8>,
    items: &[&Value<'_>],
    raw_scalar: bool,
    depth: usize,
) -> Result<()> {
    if depth >= MAX_NESTING_DEPTH {
        return Err(Error::NestingTooDeep);
    }
    if raw_scalar && items.len() != 1 {
        return Err(Error::InvalidJsonb);
    }
    let count = items.len();
    if count as u64 > CONTAINER_CMASK as u64 {
        return Err(Error::LimitExceeded);
    }
    let scalar_flag = if raw_scalar { CONTAINER_FSCALAR } else { 0 };
    buf.write_u32::<NativeEndian>(count as u32 | CONTAINER_FARRAY | scalar_flag)?;
    let entries_at = buf.len();
    buf.resize(entries_at + 4 * count, 0);
    let payload_base = buf.len();
    for (i, item) in items.iter().enumerate() {
        let entry = write_payload(buf, payload_base, item, depth)?;
        let end_rel = buf.len() - payload_base;
        patch_entry(buf, entries_at + 4 * i, entry, i, end_rel)?;
    }
    Ok(())
}

fn write_object(buf: &mut Vec<u8>, pairs: &[KeyValue<'_>], depth: usize) -> Result<()> {
    if depth >= MAX_NESTING_DEPTH {
        return Err(Error::NestingTooDeep);
    }
    let sorted = storage_pairs(pairs);
    let count = sorted.len();
    if count as u64 > CONTAINER_CMASK as u64 {
        return Err(Error::LimitExceeded);
    }
    buf.write_u32::<NativeEndian>(count as u32 | CONTAINER_FOBJECT)?;
    let entries_at = buf.len();
    buf.resize(entries_at + 4 * 2 * count, 0);
    let payload_base = buf.len();
    for (i, pair) in sorted.iter().enumerate() {
        buf.extend_from_slice(pair.key.as_bytes());
        let entry = JEntry::with_length(JENTRY_IS_STRING, pair.key.len())?;
        let end_rel = buf.len() - payload_base;
        patch_entry(buf, entries_at + 4 * i, entry, i, end_rel)?;
    }
    for (i, pair) in sorted.iter().enumerate() {
        let entry = write_payload(buf, payload_base, &pair.value, depth)?;
        let end_rel = buf.len() - payload_base;
        patch_entry(buf, entries_at + 4 * (count + i), entry, count + i, end_rel)?;
    }
    Ok(())
}

/// Storage order: keys sorted by length then bytes, duplicates collapsed
/// to the first occurrence in source order.
fn storage_pairs<'b, 'a>(pairs: &'b [KeyValue<'a>]) -> Vec<&'b KeyValue<'a>> {
    let mut sorted: Vec<&KeyValue<'_>> = pairs.iter().collect();
    sorted.sort_by(|a, b| {
        a.key
            .len()
            .cmp(&b.key.len())
            .then_with(|| a.key.as_bytes().cmp(b.key.as_bytes()))
            .then(a.order.cmp(&b.order))
    });
    sorted.dedup_by(|b, a| a.key == b.key);
    sorted
}

fn write_payload(
    buf: &mut Vec<u8>,
    payload_base: usize,
    value: &Value<'_>,
    depth: usize,
) -> Result<JEntry> {
    match value {
        Value::Null => JEntry::with_length(JENTRY_IS_NULL, 0),
        Value::Bool(true) => JEntry::with_length(JENTRY_IS_BOOL_TRUE, 0),
        Value::Bool(false) => JEntry::with_length(JENTRY_IS_BOOL_FALSE, 0),
        Value::String(s) => {
            buf.extend_from_slice(s.as_bytes());
            JEntry::with_length(JENTRY_IS_STRING, s.len())
        }
        Value::Datetime(d) => {
            let text = d.to_string();
            buf.extend_from_slice(text.as_bytes());
            JEntry::with_length(JENTRY_IS_STRING, text.len())
        }
        Value::Number(n) => {
            let pad = write_pad(buf, payload_base, JENTRY_IS_NUMERIC);
            let start = buf.len();
            n.compact_encode(buf)?;
            JEntry::with_length(JENTRY_IS_NUMERIC, pad + buf.len() - start)
        }
        Value::Array(array) => {
            let pad = write_pad(buf, payload_base, JENTRY_IS_CONTAINER);
            let start = buf.len();
            let items: Vec<&Value<'_>> = array.elems.iter().collect();
            write_array(buf, &items, array.raw_scalar, depth + 1)?;
            JEntry::with_length(JENTRY_IS_CONTAINER, pad + buf.len() - start)
        }
        Value::Object(object) => {
            let pad = write_pad(buf, payload_base, JENTRY_IS_CONTAINER);
            let start = buf.len();
            write_object(buf, &object.pairs, depth + 1)?;
            JEntry::with_length(JENTRY_IS_CONTAINER, pad + buf.len() - start)
        }
        Value::Binary(raw) => {
            let header = raw.header()?;
            if header.raw_scalar {
                // pseudo-arrays exist only at the root; splice the scalar
                let scalar = raw.entry_value(&header, 0)?;
                return write_payload(buf, payload_base, &scalar, depth);
            }
            let pad = write_pad(buf, payload_base, JENTRY_IS_CONTAINER);
            buf.extend_from_slice(raw.as_raw());
            JEntry::with_length(JENTRY_IS_CONTAINER, pad + raw.as_raw().len())
        }
    }
}

fn write_pad(buf: &mut Vec<u8>, payload_base: usize, type_code: u32) -> usize {
    let pad = JEntry::pad_for(type_code, buf.len() - payload_base);
    buf.resize(buf.len() + pad, 0);
    pad
}

fn patch_entry(
    buf: &mut [u8],
    at: usize,
    entry: JEntry,
    index: usize,
    end_rel: usize,
) -> Result<()> {
    let finalized = if index % JENTRY_OFFSET_STRIDE == 0 {
        entry.with_end_offset(end_rel)?
    } else {
        // entries between stride points store only a length, but the
        // running end offset must still fit the off/len field
        if end_rel as u64 > JENTRY_OFFLENMASK as u64 {
            return Err(Error::LimitExceeded);
        }
        entry
    };
    NativeEndian::write_u32(&mut buf[at..at + 4], finalized.encoded());
    Ok(())
}
