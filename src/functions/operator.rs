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

use crate::constants::*;
use crate::error::Result;
use crate::iterator::JsonbIterator;
use crate::iterator::JsonbToken;
use crate::raw::RawJsonb;
use crate::value::Value;

// Fixed keys so hashes are stable across processes.
const HASH_KEY0: u64 = 0x243F_6A88_85A3_08D3;
const HASH_KEY1: u64 = 0x1319_8A2E_0370_7344;
const HASH_KEY2: u64 = 0xA409_3822_299F_31D0;
const HASH_KEY3: u64 = 0x082E_FA98_EC4E_6C89;

impl<'a> RawJsonb<'a> {
    /// Total order over jsonb values, strings compared bytewise.
    ///
    /// Types rank null < boolean < number < string < array < object, with
    /// a bare scalar below a real array. Containers of different lengths
    /// order by length; equal lengths compare members in storage order.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::cmp::Ordering;
    ///
    /// let a = jsonbx::parse_owned_jsonb(br#"[1, 2]"#).unwrap();
    /// let b = jsonbx::parse_owned_jsonb(br#"[1, 3]"#).unwrap();
    /// assert_eq!(a.as_raw().compare(&b.as_raw()).unwrap(), Ordering::Less);
    /// ```
    pub fn compare(&self, other: &RawJsonb<'_>) -> Result<Ordering> {
        self.compare_with_collator(other, |a, b| a.as_bytes().cmp(b.as_bytes()))
    }

    /// [`compare`](RawJsonb::compare) with a caller-supplied string
    /// collation.
    pub fn compare_with_collator<F>(&self, other: &RawJsonb<'_>, collator: F) -> Result<Ordering>
    where
        F: Fn(&str, &str) -> Ordering,
    {
        let mut lhs = self.iterator()?;
        let mut rhs = other.iterator()?;
        loop {
            match (lhs.next(false)?, rhs.next(false)?) {
                (None, None) => return Ok(Ordering::Equal),
                (None, Some(_)) => return Ok(Ordering::Less),
                (Some(_), None) => return Ok(Ordering::Greater),
                (Some(a), Some(b)) => {
                    let ord = compare_token(a, b, &mut lhs, &mut rhs, &collator)?;
                    if ord != Ordering::Equal {
                        return Ok(ord);
                    }
                }
            }
        }
    }

    /// Structural containment, jsonb `@>` semantics.
    ///
    /// Objects contain objects whose pairs all match recursively; arrays
    /// contain every needle element somewhere (order and multiplicity
    /// ignored); a bare scalar only contains an equal bare scalar.
    ///
    /// # Examples
    ///
    /// ```
    /// let doc = jsonbx::parse_owned_jsonb(br#"{"a": [1, 2], "b": null}"#).unwrap();
    /// let part = jsonbx::parse_owned_jsonb(br#"{"a": [2]}"#).unwrap();
    /// assert!(doc.as_raw().contains(&part.as_raw()).unwrap());
    /// ```
    pub fn contains(&self, other: &RawJsonb<'_>) -> Result<bool> {
        container_contains(*self, *other)
    }

    /// Order-insensitive structural hash.
    ///
    /// Equal values hash equal regardless of source key order or number
    /// spelling, since objects store sorted keys and numbers hash their
    /// canonical form.
    pub fn hash_with_seed(&self, seed: u64) -> Result<u64> {
        let state = ahash::RandomState::with_seeds(HASH_KEY0, HASH_KEY1, HASH_KEY2, HASH_KEY3);
        let mut acc = seed;
        let mut it = self.iterator()?;
        while let Some(token) = it.next(false)? {
            match token {
                JsonbToken::BeginArray { raw_scalar: true, .. } => {}
                JsonbToken::BeginArray { .. } => acc ^= CONTAINER_FARRAY as u64,
                JsonbToken::BeginObject { .. } => acc ^= CONTAINER_FOBJECT as u64,
                JsonbToken::EndArray | JsonbToken::EndObject => {}
                JsonbToken::Key(v) | JsonbToken::Value(v) | JsonbToken::Elem(v) => {
                    acc = acc.rotate_left(1) ^ scalar_hash(&state, &v);
                }
            }
        }
        Ok(acc)
    }
}

impl PartialEq for RawJsonb<'_> {
    fn eq(&self, other: &Self) -> bool {
        matches!(self.compare(other), Ok(Ordering::Equal))
    }
}

impl Eq for RawJsonb<'_> {}

impl PartialOrd for RawJsonb<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RawJsonb<'_> {
    /// Invalid containers sort as equal; use
    /// [`compare`](RawJsonb::compare) to observe decode errors.
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other).unwrap_or(Ordering::Equal)
    }
}

fn compare_token<'a, F>(
    mut a: JsonbToken<'a>,
    mut b: JsonbToken<'a>,
    lhs: &mut JsonbIterator<'a>,
    rhs: &mut JsonbIterator<'a>,
    collator: &F,
) -> Result<Ordering>
where
    F: Fn(&str, &str) -> Ordering,
{
    // A pseudo-array facing anything else compares as its bare scalar.
    let a_pseudo = matches!(a, JsonbToken::BeginArray { raw_scalar: true, .. });
    let b_pseudo = matches!(b, JsonbToken::BeginArray { raw_scalar: true, .. });
    if a_pseudo && !b_pseudo {
        if let Some(next) = lhs.next(false)? {
            a = next;
        }
    } else if b_pseudo && !a_pseudo {
        if let Some(next) = rhs.next(false)? {
            b = next;
        }
    }
    let ord = match (a, b) {
        (
            JsonbToken::BeginArray {
                len: a_len,
                raw_scalar: a_raw,
            },
            JsonbToken::BeginArray {
                len: b_len,
                raw_scalar: b_raw,
            },
        ) => {
            if a_raw != b_raw {
                if a_raw {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            } else {
                a_len.cmp(&b_len)
            }
        }
        (JsonbToken::BeginObject { len: a_len }, JsonbToken::BeginObject { len: b_len }) => {
            a_len.cmp(&b_len)
        }
        (JsonbToken::EndArray, JsonbToken::EndArray)
        | (JsonbToken::EndObject, JsonbToken::EndObject) => Ordering::Equal,
        (JsonbToken::Key(x), JsonbToken::Key(y))
        | (JsonbToken::Value(x), JsonbToken::Value(y))
        | (JsonbToken::Elem(x), JsonbToken::Elem(y)) => compare_scalar(&x, &y, collator),
        (JsonbToken::EndArray | JsonbToken::EndObject, _) => Ordering::Less,
        (_, JsonbToken::EndArray | JsonbToken::EndObject) => Ordering::Greater,
        (x, y) => token_rank(&x).cmp(&token_rank(&y)),
    };
    Ok(ord)
}

fn token_rank(token: &JsonbToken<'_>) -> u8 {
    match token {
        JsonbToken::BeginArray { .. } => ARRAY_RANK,
        JsonbToken::BeginObject { .. } => OBJECT_RANK,
        JsonbToken::Key(v) | JsonbToken::Value(v) | JsonbToken::Elem(v) => scalar_rank(v),
        JsonbToken::EndArray | JsonbToken::EndObject => NULL_RANK,
    }
}

fn scalar_rank(value: &Value<'_>) -> u8 {
    match value {
        Value::Null => NULL_RANK,
        Value::Bool(_) => BOOL_RANK,
        Value::Number(_) => NUMBER_RANK,
        Value::String(_) | Value::Datetime(_) => STRING_RANK,
        Value::Array(_) => ARRAY_RANK,
        Value::Object(_) | Value::Binary(_) => OBJECT_RANK,
    }
}

fn compare_scalar<F>(a: &Value<'_>, b: &Value<'_>, collator: &F) -> Ordering
where
    F: Fn(&str, &str) -> Ordering,
{
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x.cmp(y),
        (Value::String(x), Value::String(y)) => collator(x, y),
        _ => scalar_rank(a).cmp(&scalar_rank(b)),
    }
}

fn scalar_equal(a: &Value<'_>, b: &Value<'_>) -> bool {
    compare_scalar(a, b, &|x: &str, y: &str| x.as_bytes().cmp(y.as_bytes())) == Ordering::Equal
}

fn container_contains(a: RawJsonb<'_>, b: RawJsonb<'_>) -> Result<bool> {
    let a_header = a.header()?;
    let b_header = b.header()?;
    if a_header.is_object != b_header.is_object {
        return Ok(false);
    }
    if a_header.is_object {
        if b_header.count > a_header.count {
            return Ok(false);
        }
        for i in 0..b_header.count {
            let key = b.key_at(&b_header, i)?;
            let b_value = b.entry_value(&b_header, b_header.count + i)?;
            let Some(a_value) = a.get_by_name(key)? else {
                return Ok(false);
            };
            match (&a_value, &b_value) {
                (Value::Binary(a_nested), Value::Binary(b_nested)) => {
                    if !container_contains(*a_nested, *b_nested)? {
                        return Ok(false);
                    }
                }
                (Value::Binary(_), _) | (_, Value::Binary(_)) => return Ok(false),
                (av, bv) => {
                    if !scalar_equal(av, bv) {
                        return Ok(false);
                    }
                }
            }
        }
        return Ok(true);
    }
    // A bare scalar never contains a real array, but a real array may
    // contain a scalar needle.
    if a_header.raw_scalar && !b_header.raw_scalar {
        return Ok(false);
    }
    let mut a_scalars = Vec::new();
    let mut a_containers = Vec::new();
    for i in 0..a_header.count {
        match a.entry_value(&a_header, i)? {
            Value::Binary(nested) => a_containers.push(nested),
            value => a_scalars.push(value),
        }
    }
    for i in 0..b_header.count {
        match b.entry_value(&b_header, i)? {
            Value::Binary(b_nested) => {
                let mut found = false;
                for a_nested in &a_containers {
                    if container_contains(*a_nested, b_nested)? {
                        found = true;
                        break;
                    }
                }
                if !found {
                    return Ok(false);
                }
            }
            b_value => {
                if !a_scalars.iter().any(|a_value| scalar_equal(a_value, &b_value)) {
                    return Ok(false);
                }
            }
        }
    }
    Ok(true)
}

fn scalar_hash(state: &ahash::RandomState, value: &Value<'_>) -> u64 {
    match value {
        Value::Null => HASH_NULL,
        Value::Bool(true) => HASH_TRUE,
        Value::Bool(false) => HASH_FALSE,
        Value::Number(n) => state.hash_one(n),
        Value::String(s) => state.hash_one(s.as_bytes()),
        Value::Datetime(d) => state.hash_one(d.to_string().as_bytes()),
        // containers are descended into, never hashed whole
        Value::Array(_) | Value::Object(_) | Value::Binary(_) => 0,
    }
}
