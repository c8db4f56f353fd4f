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

use crate::constants::*;
use crate::error::Error;

/// A decoded entry from a container's entry array.
///
/// `off_len` is the low 28 bits of the raw word: the payload length, or the
/// payload end offset when `has_off` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct JEntry {
    pub(crate) type_code: u32,
    pub(crate) has_off: bool,
    pub(crate) off_len: u32,
}

impl JEntry {
    pub(crate) fn decode(encoded: u32) -> JEntry {
        JEntry {
            type_code: encoded & JENTRY_TYPE_MASK,
            has_off: encoded & JENTRY_HAS_OFF != 0,
            off_len: encoded & JENTRY_OFFLENMASK,
        }
    }

    pub(crate) fn encoded(&self) -> u32 {
        let off_bit = if self.has_off { JENTRY_HAS_OFF } else { 0 };
        self.type_code | off_bit | self.off_len
    }

    pub(crate) fn with_length(type_code: u32, len: usize) -> Result<JEntry, Error> {
        if len as u64 > JENTRY_OFFLENMASK as u64 {
            return Err(Error::LimitExceeded);
        }
        Ok(JEntry {
            type_code,
            has_off: false,
            off_len: len as u32,
        })
    }

    /// Rewrites the length field into an end offset for stride entries.
    pub(crate) fn with_end_offset(self, end: usize) -> Result<JEntry, Error> {
        if end as u64 > JENTRY_OFFLENMASK as u64 {
            return Err(Error::LimitExceeded);
        }
        Ok(JEntry {
            type_code: self.type_code,
            has_off: true,
            off_len: end as u32,
        })
    }

    /// Zero-length pad bytes inserted before this entry's payload to align
    /// numbers and nested containers on a 4-byte boundary.
    pub(crate) fn pad_for(type_code: u32, payload_offset: usize) -> usize {
        match type_code {
            JENTRY_IS_NUMERIC | JENTRY_IS_CONTAINER => (4 - payload_offset % 4) % 4,
            _ => 0,
        }
    }
}
