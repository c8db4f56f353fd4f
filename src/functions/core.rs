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
use std::fmt::Write;

use crate::constants::*;
use crate::error::Error;
use crate::error::Result;
use crate::iterator::JsonbToken;
use crate::raw::RawJsonb;
use crate::value::write_quoted;
use crate::value::Value;

impl<'a> RawJsonb<'a> {
    /// The JSON type name of the root value. A scalar pseudo-array
    /// reports its scalar's type.
    ///
    /// # Examples
    ///
    /// ```
    /// let owned = jsonbx::parse_owned_jsonb(b"12.5").unwrap();
    /// assert_eq!(owned.as_raw().type_of().unwrap(), "number");
    /// let owned = jsonbx::parse_owned_jsonb(b"{}").unwrap();
    /// assert_eq!(owned.as_raw().type_of().unwrap(), "object");
    /// ```
    pub fn type_of(&self) -> Result<&'static str> {
        let header = self.header()?;
        if header.is_object {
            return Ok(TYPE_OBJECT);
        }
        if !header.raw_scalar {
            return Ok(TYPE_ARRAY);
        }
        match self.entry(0)?.type_code {
            JENTRY_IS_NULL => Ok(TYPE_NULL),
            JENTRY_IS_BOOL_TRUE | JENTRY_IS_BOOL_FALSE => Ok(TYPE_BOOLEAN),
            JENTRY_IS_NUMERIC => Ok(TYPE_NUMBER),
            JENTRY_IS_STRING => Ok(TYPE_STRING),
            _ => Err(Error::InvalidJsonb),
        }
    }

    /// Looks up an object key by binary search over the sorted key run.
    ///
    /// Returns `None` for a missing key and for non-object roots.
    ///
    /// # Examples
    ///
    /// ```
    /// use jsonbx::Value;
    ///
    /// let owned = jsonbx::parse_owned_jsonb(br#"{"a": 1, "bb": true}"#).unwrap();
    /// let raw = owned.as_raw();
    /// assert_eq!(raw.get_by_name("bb").unwrap(), Some(Value::Bool(true)));
    /// assert_eq!(raw.get_by_name("c").unwrap(), None);
    /// ```
    pub fn get_by_name(&self, name: &str) -> Result<Option<Value<'a>>> {
        let header = self.header()?;
        if !header.is_object {
            return Ok(None);
        }
        let mut lo = 0usize;
        let mut hi = header.count;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let key = self.key_at(&header, mid)?;
            match key
                .len()
                .cmp(&name.len())
                .then_with(|| key.as_bytes().cmp(name.as_bytes()))
            {
                Ordering::Equal => {
                    return self.entry_value(&header, header.count + mid).map(Some)
                }
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
            }
        }
        Ok(None)
    }

    /// Fetches an array element by position; `None` past the end and for
    /// object roots. Indexing a scalar pseudo-array at 0 yields the bare
    /// scalar.
    pub fn get_by_index(&self, index: usize) -> Result<Option<Value<'a>>> {
        let header = self.header()?;
        if header.is_object || index >= header.count {
            return Ok(None);
        }
        self.entry_value(&header, index).map(Some)
    }

    /// Renders the canonical text form: keys in storage order, `", "`
    /// between items, `": "` after keys, and a bare scalar for a
    /// pseudo-array root.
    ///
    /// # Examples
    ///
    /// ```
    /// let owned = jsonbx::parse_owned_jsonb(br#"{"b":[1,2],"a":"x"}"#).unwrap();
    /// assert_eq!(
    ///     owned.as_raw().to_text().unwrap(),
    ///     r#"{"a": "x", "b": [1, 2]}"#
    /// );
    /// ```
    pub fn to_text(&self) -> Result<String> {
        let mut out = String::new();
        let mut first_stack: Vec<bool> = Vec::new();
        let mut after_key = false;
        let mut it = self.iterator()?;
        while let Some(token) = it.next(false)? {
            match token {
                JsonbToken::BeginArray { raw_scalar: true, .. } => {
                    // transparent wrapper; the scalar prints bare
                }
                JsonbToken::BeginArray { .. } => {
                    separate(&mut out, &mut first_stack, &mut after_key);
                    out.push('[');
                    first_stack.push(true);
                }
                JsonbToken::BeginObject { .. } => {
                    separate(&mut out, &mut first_stack, &mut after_key);
                    out.push('{');
                    first_stack.push(true);
                }
                JsonbToken::EndArray => {
                    if first_stack.pop().is_some() {
                        out.push(']');
                    }
                }
                JsonbToken::EndObject => {
                    first_stack.pop();
                    out.push('}');
                }
                JsonbToken::Key(Value::String(key)) => {
                    separate(&mut out, &mut first_stack, &mut after_key);
                    write_quoted(&mut out, &key).map_err(|_| Error::InvalidJsonb)?;
                    out.push_str(": ");
                    after_key = true;
                }
                JsonbToken::Key(_) => return Err(Error::InvalidJsonb),
                JsonbToken::Value(v) | JsonbToken::Elem(v) => {
                    separate(&mut out, &mut first_stack, &mut after_key);
                    write!(out, "{v}").map_err(|_| Error::InvalidJsonb)?;
                }
            }
        }
        Ok(out)
    }
}

fn separate(out: &mut String, first_stack: &mut [bool], after_key: &mut bool) {
    if *after_key {
        *after_key = false;
        return;
    }
    if let Some(first) = first_stack.last_mut() {
        if *first {
            *first = false;
        } else {
            out.push_str(", ");
        }
    }
}
