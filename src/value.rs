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
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Write;

use rand::distr::Alphanumeric;
use rand::rngs::SmallRng;
use rand::Rng;
use rand::SeedableRng;

use crate::datetime::Datetime;
use crate::number::Number;
use crate::raw::RawJsonb;

/// An in-memory JSON value.
///
/// Strings borrow from the parsed input where possible. `Binary` holds an
/// already-serialized container and lets subtrees be spliced into a new
/// document without decoding them.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    Null,
    Bool(bool),
    Number(Number),
    String(Cow<'a, str>),
    Datetime(Datetime),
    Array(ArrayValue<'a>),
    Object(ObjectValue<'a>),
    Binary(RawJsonb<'a>),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArrayValue<'a> {
    /// Marks the one-element pseudo-array that wraps a bare root scalar.
    pub raw_scalar: bool,
    pub elems: Vec<Value<'a>>,
}

/// An object as an ordered pair list.
///
/// The builder stores pairs sorted by key (length first, then bytes); the
/// `order` tag remembers each pair's position in the source text so that
/// duplicate resolution can keep the first occurrence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectValue<'a> {
    pub pairs: Vec<KeyValue<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyValue<'a> {
    pub key: Cow<'a, str>,
    pub order: u32,
    pub value: Value<'a>,
}

impl<'a> Value<'a> {
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::Array(_) | Value::Object(_) | Value::Binary(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Number(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v.as_ref()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayValue<'a>> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectValue<'a>> {
        match self {
            Value::Object(v) => Some(v),
            _ => None,
        }
    }

    /// Generates a random value for test and bench corpora.
    pub fn rand_value() -> Value<'static> {
        let mut rng = SmallRng::from_rng(&mut rand::rng());
        rand_value_depth(&mut rng, 0)
    }
}

fn rand_value_depth(rng: &mut SmallRng, depth: usize) -> Value<'static> {
    let pick = if depth >= 3 {
        rng.random_range(0..4)
    } else {
        rng.random_range(0..6)
    };
    match pick {
        0 => Value::Null,
        1 => Value::Bool(rng.random()),
        2 => {
            if rng.random() {
                Value::Number(Number::Int64(rng.random()))
            } else {
                Value::Number(Number::Float64(rng.random_range(-1.0e3..1.0e3)))
            }
        }
        3 => Value::String(Cow::Owned(rand_string(rng))),
        4 => {
            let len = rng.random_range(0..8);
            let elems = (0..len).map(|_| rand_value_depth(rng, depth + 1)).collect();
            Value::Array(ArrayValue {
                raw_scalar: false,
                elems,
            })
        }
        _ => {
            let len = rng.random_range(0..8);
            let pairs = (0..len)
                .map(|i| KeyValue {
                    key: Cow::Owned(rand_string(rng)),
                    order: i as u32,
                    value: rand_value_depth(rng, depth + 1),
                })
                .collect();
            Value::Object(ObjectValue { pairs })
        }
    }
}

fn rand_string(rng: &mut SmallRng) -> String {
    let len = rng.random_range(0..20);
    rng.sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

impl Display for Value<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(true) => f.write_str("true"),
            Value::Bool(false) => f.write_str("false"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write_quoted(f, s),
            Value::Datetime(d) => write!(f, "\"{d}\""),
            Value::Array(array) => {
                if array.raw_scalar {
                    return write!(f, "{}", array.elems[0]);
                }
                f.write_char('[')?;
                for (i, elem) in array.elems.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{elem}")?;
                }
                f.write_char(']')
            }
            Value::Object(object) => {
                f.write_char('{')?;
                for (i, pair) in object.pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_quoted(f, &pair.key)?;
                    f.write_str(": ")?;
                    write!(f, "{}", pair.value)?;
                }
                f.write_char('}')
            }
            Value::Binary(raw) => match raw.to_text() {
                Ok(text) => f.write_str(&text),
                Err(_) => Err(std::fmt::Error),
            },
        }
    }
}

/// Writes a string literal with the short escapes and `\uXXXX` for the
/// remaining control characters.
pub(crate) fn write_quoted<W: Write>(out: &mut W, s: &str) -> std::fmt::Result {
    out.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => out.write_str("\\\"")?,
            '\\' => out.write_str("\\\\")?,
            '\u{0008}' => out.write_str("\\b")?,
            '\u{000C}' => out.write_str("\\f")?,
            '\n' => out.write_str("\\n")?,
            '\r' => out.write_str("\\r")?,
            '\t' => out.write_str("\\t")?,
            c if (c as u32) < 0x20 => write!(out, "\\u{:04x}", c as u32)?,
            c => out.write_char(c)?,
        }
    }
    out.write_char('"')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_escapes() {
        let value = Value::String(Cow::Borrowed("a\"b\\c\n\u{1}"));
        assert_eq!(value.to_string(), "\"a\\\"b\\\\c\\n\\u0001\"");
    }

    #[test]
    fn test_display_containers() {
        let value = Value::Array(ArrayValue {
            raw_scalar: false,
            elems: vec![
                Value::Null,
                Value::Bool(true),
                Value::Number(Number::Int64(3)),
            ],
        });
        assert_eq!(value.to_string(), "[null, true, 3]");

        let value = Value::Object(ObjectValue {
            pairs: vec![KeyValue {
                key: Cow::Borrowed("k"),
                order: 0,
                value: Value::String(Cow::Borrowed("v")),
            }],
        });
        assert_eq!(value.to_string(), "{\"k\": \"v\"}");
    }
}
