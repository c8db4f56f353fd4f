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

use std::borrow::Cow;

use crate::error::Error;
use crate::error::Result;
use crate::iterator::JsonbToken;
use crate::raw::RawJsonb;
use crate::value::ArrayValue;
use crate::value::KeyValue;
use crate::value::ObjectValue;
use crate::value::Value;

#[derive(Debug)]
enum BuildFrame<'a> {
    Array {
        raw_scalar: bool,
        elems: Vec<Value<'a>>,
    },
    Object {
        pairs: Vec<KeyValue<'a>>,
        pending_key: Option<Cow<'a, str>>,
        next_order: u32,
    },
}

/// Assembles a [`Value`] tree from a stream of push events.
///
/// Object keys are sorted by length first and bytewise second when the
/// object closes. Duplicate keys collapse to the occurrence that arrived
/// first, unless `unique_keys` turns duplicates into an error. Pushing a
/// `Value::Binary` container splices it in by replaying its tokens, so
/// serialized subtrees can be reused without decoding them by hand.
///
/// # Examples
///
/// ```
/// use jsonbx::JsonbBuilder;
/// use jsonbx::Value;
///
/// let mut builder = JsonbBuilder::new();
/// builder.begin_object().unwrap();
/// builder.push_key("b").unwrap();
/// builder.push_scalar(Value::Bool(true)).unwrap();
/// builder.push_key("a").unwrap();
/// builder.push_scalar(Value::Null).unwrap();
/// builder.end_object().unwrap();
/// let value = builder.finish().unwrap();
/// assert_eq!(value.to_string(), r#"{"a": null, "b": true}"#);
/// ```
#[derive(Debug, Default)]
pub struct JsonbBuilder<'a> {
    stack: Vec<BuildFrame<'a>>,
    result: Option<Value<'a>>,
    unique_keys: bool,
    skip_nulls: bool,
}

impl<'a> JsonbBuilder<'a> {
    pub fn new() -> JsonbBuilder<'a> {
        JsonbBuilder::default()
    }

    pub fn with_options(unique_keys: bool, skip_nulls: bool) -> JsonbBuilder<'a> {
        JsonbBuilder {
            unique_keys,
            skip_nulls,
            ..JsonbBuilder::default()
        }
    }

    /// Feeds one token, as produced by [`JsonbIterator`](crate::JsonbIterator).
    pub fn push(&mut self, token: JsonbToken<'a>) -> Result<()> {
        match token {
            JsonbToken::BeginArray { raw_scalar, .. } => self.begin_array(raw_scalar),
            JsonbToken::BeginObject { .. } => self.begin_object(),
            JsonbToken::Key(Value::String(key)) => self.push_key(key),
            JsonbToken::Key(_) => Err(Error::Message("object key must be a string".to_string())),
            JsonbToken::Value(value) => self.push_value(value),
            JsonbToken::Elem(value) => self.push_elem(value),
            JsonbToken::EndArray => self.end_array(),
            JsonbToken::EndObject => self.end_object(),
        }
    }

    pub fn begin_object(&mut self) -> Result<()> {
        self.check_open()?;
        self.stack.push(BuildFrame::Object {
            pairs: Vec::new(),
            pending_key: None,
            next_order: 0,
        });
        Ok(())
    }

    pub fn begin_array(&mut self, raw_scalar: bool) -> Result<()> {
        self.check_open()?;
        self.stack.push(BuildFrame::Array {
            raw_scalar,
            elems: Vec::new(),
        });
        Ok(())
    }

    pub fn push_key(&mut self, key: impl Into<Cow<'a, str>>) -> Result<()> {
        match self.stack.last_mut() {
            Some(BuildFrame::Object { pending_key, .. }) if pending_key.is_none() => {
                *pending_key = Some(key.into());
                Ok(())
            }
            _ => Err(Error::Message("key pushed outside an object".to_string())),
        }
    }

    /// Pushes an object member value; a key must be pending.
    pub fn push_value(&mut self, value: Value<'a>) -> Result<()> {
        let value = match self.unnest(value)? {
            Some(value) => value,
            None => return Ok(()),
        };
        let skip_nulls = self.skip_nulls;
        match self.stack.last_mut() {
            Some(BuildFrame::Object {
                pairs,
                pending_key,
                next_order,
            }) => {
                let key = pending_key
                    .take()
                    .ok_or_else(|| Error::Message("value pushed without a key".to_string()))?;
                let order = *next_order;
                *next_order += 1;
                if skip_nulls && value == Value::Null {
                    return Ok(());
                }
                pairs.push(KeyValue { key, order, value });
                Ok(())
            }
            _ => Err(Error::Message("value pushed outside an object".to_string())),
        }
    }

    /// Pushes an array element.
    pub fn push_elem(&mut self, value: Value<'a>) -> Result<()> {
        let value = match self.unnest(value)? {
            Some(value) => value,
            None => return Ok(()),
        };
        match self.stack.last_mut() {
            Some(BuildFrame::Array { elems, .. }) => {
                elems.push(value);
                Ok(())
            }
            _ => Err(Error::Message("element pushed outside an array".to_string())),
        }
    }

    /// Pushes a scalar wherever the builder currently is: as an array
    /// element, an object member value, or - with nothing open - as a bare
    /// root scalar wrapped into its pseudo-array.
    pub fn push_scalar(&mut self, value: Value<'a>) -> Result<()> {
        match self.stack.last() {
            None => {
                self.begin_array(true)?;
                self.push_elem(value)?;
                self.end_array()
            }
            Some(BuildFrame::Object { .. }) => self.push_value(value),
            Some(BuildFrame::Array { .. }) => self.push_elem(value),
        }
    }

    pub fn end_array(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(BuildFrame::Array { raw_scalar, elems }) => {
                if raw_scalar && elems.len() != 1 {
                    return Err(Error::Message(
                        "raw-scalar array must hold exactly one element".to_string(),
                    ));
                }
                self.close(Value::Array(ArrayValue { raw_scalar, elems }))
            }
            _ => Err(Error::Message("unbalanced end of array".to_string())),
        }
    }

    pub fn end_object(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(BuildFrame::Object {
                mut pairs,
                pending_key: None,
                ..
            }) => {
                sort_and_unique(&mut pairs, self.unique_keys)?;
                self.close(Value::Object(ObjectValue { pairs }))
            }
            _ => Err(Error::Message("unbalanced end of object".to_string())),
        }
    }

    pub fn finish(mut self) -> Result<Value<'a>> {
        if !self.stack.is_empty() {
            return Err(Error::Message("unclosed container".to_string()));
        }
        self.result
            .take()
            .ok_or_else(|| Error::Message("nothing was built".to_string()))
    }

    fn check_open(&self) -> Result<()> {
        if self.stack.is_empty() && self.result.is_some() {
            return Err(Error::Message("root value already complete".to_string()));
        }
        Ok(())
    }

    fn close(&mut self, value: Value<'a>) -> Result<()> {
        match self.stack.last_mut() {
            None => {
                self.result = Some(value);
                Ok(())
            }
            Some(BuildFrame::Array { elems, .. }) => {
                elems.push(value);
                Ok(())
            }
            Some(BuildFrame::Object {
                pairs,
                pending_key,
                next_order,
            }) => {
                let key = pending_key
                    .take()
                    .ok_or_else(|| Error::Message("value pushed without a key".to_string()))?;
                let order = *next_order;
                *next_order += 1;
                pairs.push(KeyValue { key, order, value });
                Ok(())
            }
        }
    }

    /// Resolves a pushed `Value::Binary`: a pseudo-array unwraps to its
    /// bare scalar, any other container is spliced by replaying its
    /// tokens. Returns `None` when the splice already consumed the value.
    fn unnest(&mut self, value: Value<'a>) -> Result<Option<Value<'a>>> {
        let Value::Binary(raw) = value else {
            return Ok(Some(value));
        };
        let header = raw.header()?;
        if header.raw_scalar {
            let scalar = raw.entry_value(&header, 0)?;
            return Ok(Some(scalar));
        }
        self.splice(raw)?;
        Ok(None)
    }

    fn splice(&mut self, raw: RawJsonb<'a>) -> Result<()> {
        let target = self.stack.len();
        let mut it = raw.iterator()?;
        while let Some(token) = it.next(false)? {
            self.push(token)?;
            if self.stack.len() == target {
                break;
            }
        }
        Ok(())
    }
}

fn key_cmp(a: &str, b: &str) -> std::cmp::Ordering {
    a.len().cmp(&b.len()).then_with(|| a.as_bytes().cmp(b.as_bytes()))
}

/// Sorts pairs into storage order and collapses duplicates, keeping the
/// occurrence with the lowest order tag (the first one in the source).
fn sort_and_unique(pairs: &mut Vec<KeyValue<'_>>, unique_keys: bool) -> Result<()> {
    pairs.sort_by(|a, b| key_cmp(&a.key, &b.key).then(a.order.cmp(&b.order)));
    let mut dup = None;
    pairs.dedup_by(|b, a| {
        // b is the later-sorted entry, which has the higher order tag
        let same = a.key == b.key;
        if same && dup.is_none() {
            dup = Some(a.key.to_string());
        }
        same
    });
    if unique_keys {
        if let Some(key) = dup {
            return Err(Error::DuplicateKey(key));
        }
    }
    Ok(())
}
