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

use crate::error::Result;
use crate::raw::ContainerHeader;
use crate::raw::RawJsonb;
use crate::value::Value;

/// One step of a container walk, and also the push unit of the builder.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonbToken<'a> {
    BeginArray { len: usize, raw_scalar: bool },
    BeginObject { len: usize },
    /// An object key; always a string value.
    Key(Value<'a>),
    /// An object member value.
    Value(Value<'a>),
    /// An array element.
    Elem(Value<'a>),
    EndArray,
    EndObject,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum IterState {
    ArrayStart,
    ArrayElem,
    ObjectStart,
    ObjectKey,
    ObjectValue,
}

#[derive(Debug)]
struct IterFrame<'a> {
    container: RawJsonb<'a>,
    header: ContainerHeader,
    state: IterState,
    index: usize,
}

impl<'a> IterFrame<'a> {
    fn enter(container: RawJsonb<'a>) -> Result<IterFrame<'a>> {
        let header = container.header()?;
        let state = if header.is_object {
            IterState::ObjectStart
        } else {
            IterState::ArrayStart
        };
        Ok(IterFrame {
            container,
            header,
            state,
            index: 0,
        })
    }
}

/// Depth-first pull iterator over a serialized container.
///
/// Each call to [`next`](JsonbIterator::next) yields one token. With
/// `skip_nested` set, nested containers come back whole as
/// `Value::Binary` instead of being descended into.
///
/// # Examples
///
/// ```
/// use jsonbx::JsonbToken;
///
/// let owned = jsonbx::parse_owned_jsonb(br#"[1, [2]]"#).unwrap();
/// let raw = owned.as_raw();
/// let mut it = raw.iterator().unwrap();
/// let mut depth = 0;
/// while let Some(token) = it.next(false).unwrap() {
///     match token {
///         JsonbToken::BeginArray { .. } => depth += 1,
///         JsonbToken::EndArray => depth -= 1,
///         _ => {}
///     }
/// }
/// assert_eq!(depth, 0);
/// ```
#[derive(Debug)]
pub struct JsonbIterator<'a> {
    stack: Vec<IterFrame<'a>>,
}

impl<'a> RawJsonb<'a> {
    pub fn iterator(&self) -> Result<JsonbIterator<'a>> {
        Ok(JsonbIterator {
            stack: vec![IterFrame::enter(*self)?],
        })
    }
}

impl<'a> JsonbIterator<'a> {
    /// Yields the next token, or `None` once the root container is closed.
    pub fn next(&mut self, skip_nested: bool) -> Result<Option<JsonbToken<'a>>> {
        let Some(top) = self.stack.last_mut() else {
            return Ok(None);
        };
        match top.state {
            IterState::ArrayStart => {
                top.state = IterState::ArrayElem;
                Ok(Some(JsonbToken::BeginArray {
                    len: top.header.count,
                    raw_scalar: top.header.raw_scalar,
                }))
            }
            IterState::ArrayElem => {
                if top.index >= top.header.count {
                    self.stack.pop();
                    return Ok(Some(JsonbToken::EndArray));
                }
                let index = top.index;
                top.index += 1;
                let value = top.container.entry_value(&top.header, index)?;
                self.descend_or_emit(value, skip_nested, true)
            }
            IterState::ObjectStart => {
                top.state = IterState::ObjectKey;
                Ok(Some(JsonbToken::BeginObject {
                    len: top.header.count,
                }))
            }
            IterState::ObjectKey => {
                if top.index >= top.header.count {
                    self.stack.pop();
                    return Ok(Some(JsonbToken::EndObject));
                }
                let key = top.container.key_at(&top.header, top.index)?;
                top.state = IterState::ObjectValue;
                Ok(Some(JsonbToken::Key(Value::String(key.into()))))
            }
            IterState::ObjectValue => {
                let index = top.header.count + top.index;
                top.index += 1;
                top.state = IterState::ObjectKey;
                let value = top.container.entry_value(&top.header, index)?;
                self.descend_or_emit(value, skip_nested, false)
            }
        }
    }

    fn descend_or_emit(
        &mut self,
        value: Value<'a>,
        skip_nested: bool,
        is_elem: bool,
    ) -> Result<Option<JsonbToken<'a>>> {
        match value {
            Value::Binary(nested) if !skip_nested => {
                self.stack.push(IterFrame::enter(nested)?);
                // the new frame emits its begin token right away
                self.next(skip_nested)
            }
            value if is_elem => Ok(Some(JsonbToken::Elem(value))),
            value => Ok(Some(JsonbToken::Value(value))),
        }
    }
}
