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

use std::cmp::Ordering;
use std::fmt::Display;
use std::fmt::Formatter;
use std::str::FromStr;

use crate::error::Error;
use crate::parser::parse_owned_jsonb;
use crate::raw::RawJsonb;

/// An owned jsonb container.
///
/// # Examples
///
/// ```
/// use jsonbx::OwnedJsonb;
///
/// let owned: OwnedJsonb = r#"{"b":2,"a":1}"#.parse().unwrap();
/// assert_eq!(owned.to_string(), r#"{"a": 1, "b": 2}"#);
/// ```
#[derive(Debug, Clone, Default)]
pub struct OwnedJsonb {
    pub(crate) data: Vec<u8>,
}

impl OwnedJsonb {
    pub fn new(data: Vec<u8>) -> OwnedJsonb {
        OwnedJsonb { data }
    }

    pub fn as_raw(&self) -> RawJsonb<'_> {
        RawJsonb::new(&self.data)
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

impl From<Vec<u8>> for OwnedJsonb {
    fn from(data: Vec<u8>) -> OwnedJsonb {
        OwnedJsonb { data }
    }
}

impl AsRef<[u8]> for OwnedJsonb {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl FromStr for OwnedJsonb {
    type Err = Error;

    fn from_str(s: &str) -> Result<OwnedJsonb, Error> {
        parse_owned_jsonb(s.as_bytes())
    }
}

impl Display for OwnedJsonb {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.as_raw().to_text() {
            Ok(text) => f.write_str(&text),
            Err(_) => Err(std::fmt::Error),
        }
    }
}

impl PartialEq for OwnedJsonb {
    fn eq(&self, other: &Self) -> bool {
        self.as_raw() == other.as_raw()
    }
}

impl Eq for OwnedJsonb {}

impl PartialOrd for OwnedJsonb {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OwnedJsonb {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_raw().cmp(&other.as_raw())
    }
}
