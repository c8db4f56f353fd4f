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
use std::hash::Hash;
use std::hash::Hasher;
use std::io::Write;

use byteorder::BigEndian;
use byteorder::WriteBytesExt;
use num_traits::cast::AsPrimitive;
use ordered_float::OrderedFloat;

use crate::constants::*;
use crate::error::Error;
use crate::error::Result;

/// A JSON number.
///
/// Numeric equality, ordering and hashing are semantic: `1`, `1.0` and
/// `1e0` are the same number no matter which variant holds them.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Int64(i64),
    UInt64(u64),
    Float64(f64),
    Decimal128(Decimal128),
}

/// A fixed-point decimal: `value * 10^(-scale)`.
#[derive(Debug, Clone, Copy)]
pub struct Decimal128 {
    pub value: i128,
    pub scale: u8,
}

/// Canonical form used for semantic compare and hash.
///
/// A number is `Decimal` whenever it has an exact finite decimal
/// representation that fits `i128`, with trailing zeros stripped so the
/// (mantissa, scale) pair is unique per value.
enum Canonical {
    Decimal { mantissa: i128, scale: u32 },
    Float(f64),
}

impl Number {
    /// Parses a number from JSON token text.
    ///
    /// The token is expected to already satisfy the JSON number grammar;
    /// values whose mantissa or scale cannot be held exactly fall back to
    /// `Float64`.
    ///
    /// # Examples
    ///
    /// ```
    /// use jsonbx::Number;
    ///
    /// assert_eq!(Number::from_text("123").unwrap(), Number::Int64(123));
    /// assert_eq!(Number::from_text("12.50").unwrap(), Number::from_text("1.25e1").unwrap());
    /// ```
    pub fn from_text(text: &str) -> Result<Number> {
        let bytes = text.as_bytes();
        let mut pos = 0;
        let negative = bytes.first() == Some(&b'-');
        if negative {
            pos += 1;
        }
        let mut mantissa: i128 = 0;
        let mut overflow = false;
        let mut frac_digits: i64 = 0;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            push_digit(&mut mantissa, bytes[pos], &mut overflow);
            pos += 1;
        }
        if pos < bytes.len() && bytes[pos] == b'.' {
            pos += 1;
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                push_digit(&mut mantissa, bytes[pos], &mut overflow);
                frac_digits += 1;
                pos += 1;
            }
        }
        let mut exp: i64 = 0;
        if pos < bytes.len() && (bytes[pos] | 0x20) == b'e' {
            pos += 1;
            let mut exp_negative = false;
            if pos < bytes.len() && (bytes[pos] == b'-' || bytes[pos] == b'+') {
                exp_negative = bytes[pos] == b'-';
                pos += 1;
            }
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                exp = exp.saturating_mul(10).saturating_add((bytes[pos] - b'0') as i64);
                pos += 1;
            }
            if exp_negative {
                exp = -exp;
            }
        }
        if overflow {
            return float_from_text(text);
        }
        if negative {
            mantissa = -mantissa;
        }
        let mut scale = frac_digits - exp;
        while scale < 0 {
            match mantissa.checked_mul(10) {
                Some(v) => mantissa = v,
                None => return float_from_text(text),
            }
            scale += 1;
        }
        if scale > u8::MAX as i64 {
            return float_from_text(text);
        }
        if scale == 0 {
            if let Ok(v) = i64::try_from(mantissa) {
                return Ok(Number::Int64(v));
            }
            if let Ok(v) = u64::try_from(mantissa) {
                return Ok(Number::UInt64(v));
            }
        }
        Ok(Number::Decimal128(Decimal128 {
            value: mantissa,
            scale: scale as u8,
        }))
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int64(v) => (*v).as_(),
            Number::UInt64(v) => (*v).as_(),
            Number::Float64(v) => *v,
            Number::Decimal128(d) => {
                let v: f64 = d.value.as_();
                v / 10f64.powi(d.scale as i32)
            }
        }
    }

    fn canonical(&self) -> Canonical {
        match self {
            Number::Int64(v) => strip_zeros(*v as i128, 0),
            Number::UInt64(v) => strip_zeros(*v as i128, 0),
            Number::Decimal128(d) => strip_zeros(d.value, d.scale as u32),
            Number::Float64(v) => {
                if !v.is_finite() {
                    return Canonical::Float(*v);
                }
                // ryu gives the shortest exact decimal form, which the
                // token parser turns back into a mantissa and scale.
                let mut buffer = ryu::Buffer::new();
                match Number::from_text(buffer.format_finite(*v)) {
                    Ok(Number::Float64(_)) | Err(_) => Canonical::Float(*v),
                    Ok(other) => other.canonical(),
                }
            }
        }
    }

    pub(crate) fn compact_encode(&self, buf: &mut Vec<u8>) -> Result<()> {
        match self {
            Number::Int64(0) | Number::UInt64(0) => buf.write_u8(NUMBER_ZERO)?,
            Number::Int64(v) => {
                let bytes = signed_be_bytes(*v as i128);
                buf.write_u8(NUMBER_INT | (bytes.len() as u8 - 1))?;
                buf.write_all(&bytes)?;
            }
            Number::UInt64(v) => {
                let bytes = unsigned_be_bytes(*v);
                buf.write_u8(NUMBER_UINT | (bytes.len() as u8 - 1))?;
                buf.write_all(&bytes)?;
            }
            Number::Float64(v) if v.is_nan() => buf.write_u8(NUMBER_NAN)?,
            Number::Float64(v) if v.is_infinite() => {
                buf.write_u8(if *v > 0.0 { NUMBER_INF } else { NUMBER_NEG_INF })?
            }
            Number::Float64(v) => {
                buf.write_u8(NUMBER_FLOAT | 7)?;
                buf.write_f64::<BigEndian>(*v)?;
            }
            Number::Decimal128(d) => {
                let bytes = signed_be_bytes(d.value);
                buf.write_u8(NUMBER_DECIMAL | (bytes.len() as u8 - 1))?;
                buf.write_u8(d.scale)?;
                buf.write_all(&bytes)?;
            }
        }
        Ok(())
    }

    pub(crate) fn compact_decode(bytes: &[u8]) -> Result<Number> {
        let tag = *bytes.first().ok_or(Error::InvalidJsonb)?;
        match tag & 0xF0 {
            NUMBER_ZERO => Ok(Number::UInt64(0)),
            NUMBER_NAN => Ok(Number::Float64(f64::NAN)),
            NUMBER_INF => Ok(Number::Float64(f64::INFINITY)),
            NUMBER_NEG_INF => Ok(Number::Float64(f64::NEG_INFINITY)),
            NUMBER_INT => {
                let len = (tag & 0x0F) as usize + 1;
                let data = bytes.get(1..1 + len).ok_or(Error::InvalidJsonb)?;
                let value = decode_signed_be(data);
                i64::try_from(value)
                    .map(Number::Int64)
                    .map_err(|_| Error::InvalidJsonb)
            }
            NUMBER_UINT => {
                let len = (tag & 0x0F) as usize + 1;
                let data = bytes.get(1..1 + len).ok_or(Error::InvalidJsonb)?;
                let mut value: u64 = 0;
                for b in data {
                    value = value.checked_shl(8).ok_or(Error::InvalidJsonb)? | *b as u64;
                }
                Ok(Number::UInt64(value))
            }
            NUMBER_FLOAT => {
                let data: [u8; 8] = bytes
                    .get(1..9)
                    .ok_or(Error::InvalidJsonb)?
                    .try_into()
                    .map_err(|_| Error::InvalidJsonb)?;
                Ok(Number::Float64(f64::from_be_bytes(data)))
            }
            NUMBER_DECIMAL => {
                let len = (tag & 0x0F) as usize + 1;
                let scale = *bytes.get(1).ok_or(Error::InvalidJsonb)?;
                let data = bytes.get(2..2 + len).ok_or(Error::InvalidJsonb)?;
                Ok(Number::Decimal128(Decimal128 {
                    value: decode_signed_be(data),
                    scale,
                }))
            }
            _ => Err(Error::InvalidJsonb),
        }
    }
}

fn push_digit(mantissa: &mut i128, digit: u8, overflow: &mut bool) {
    match mantissa
        .checked_mul(10)
        .and_then(|v| v.checked_add((digit - b'0') as i128))
    {
        Some(v) => *mantissa = v,
        None => *overflow = true,
    }
}

fn float_from_text(text: &str) -> Result<Number> {
    fast_float2::parse(text)
        .map(Number::Float64)
        .map_err(|_| Error::InvalidJsonb)
}

fn strip_zeros(mut mantissa: i128, mut scale: u32) -> Canonical {
    while scale > 0 && mantissa % 10 == 0 {
        mantissa /= 10;
        scale -= 1;
    }
    Canonical::Decimal { mantissa, scale }
}

/// Minimal-length big-endian two's complement encoding, 1..=16 bytes.
fn signed_be_bytes(v: i128) -> Vec<u8> {
    let magnitude_bits = if v >= 0 {
        128 - v.leading_zeros()
    } else {
        128 - (!v).leading_zeros()
    };
    let len = (magnitude_bits as usize + 1).div_ceil(8);
    v.to_be_bytes()[16 - len..].to_vec()
}

fn unsigned_be_bytes(v: u64) -> Vec<u8> {
    let len = ((64 - v.leading_zeros()) as usize).div_ceil(8).max(1);
    v.to_be_bytes()[8 - len..].to_vec()
}

fn decode_signed_be(data: &[u8]) -> i128 {
    let mut value: i128 = if data.first().is_some_and(|b| b & 0x80 != 0) {
        -1
    } else {
        0
    };
    for b in data {
        value = (value << 8) | *b as i128;
    }
    value
}

impl Canonical {
    fn as_f64(&self) -> f64 {
        match self {
            Canonical::Float(v) => *v,
            Canonical::Decimal { mantissa, scale } => {
                let v: f64 = (*mantissa).as_();
                v / 10f64.powi(*scale as i32)
            }
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Number {}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.canonical();
        let rhs = other.canonical();
        match (&lhs, &rhs) {
            (
                Canonical::Decimal { mantissa: lm, scale: ls },
                Canonical::Decimal { mantissa: rm, scale: rs },
            ) => match cmp_decimal(*lm, *ls, *rm, *rs) {
                Some(ord) => ord,
                None => OrderedFloat(lhs.as_f64()).cmp(&OrderedFloat(rhs.as_f64())),
            },
            _ => OrderedFloat(lhs.as_f64()).cmp(&OrderedFloat(rhs.as_f64())),
        }
    }
}

/// Exact compare of two decimals; `None` when scale alignment overflows.
fn cmp_decimal(lm: i128, ls: u32, rm: i128, rs: u32) -> Option<Ordering> {
    if lm.signum() != rm.signum() {
        return Some(lm.signum().cmp(&rm.signum()));
    }
    if ls == rs {
        return Some(lm.cmp(&rm));
    }
    let (low_m, low_s, high_m, high_s, swapped) = if ls < rs {
        (lm, ls, rm, rs, false)
    } else {
        (rm, rs, lm, ls, true)
    };
    let mut scaled = low_m;
    for _ in low_s..high_s {
        scaled = scaled.checked_mul(10)?;
    }
    let ord = if swapped {
        high_m.cmp(&scaled)
    } else {
        scaled.cmp(&high_m)
    };
    Some(ord)
}

impl Hash for Number {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.canonical() {
            Canonical::Decimal { mantissa, scale } => {
                state.write_u8(0);
                state.write_i128(mantissa);
                state.write_u32(scale);
            }
            Canonical::Float(v) => {
                state.write_u8(1);
                state.write_u64(v.to_bits());
            }
        }
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Number::Int64(v) => {
                let mut buffer = itoa::Buffer::new();
                f.write_str(buffer.format(*v))
            }
            Number::UInt64(v) => {
                let mut buffer = itoa::Buffer::new();
                f.write_str(buffer.format(*v))
            }
            Number::Float64(v) => {
                if v.is_nan() {
                    f.write_str("NaN")
                } else if v.is_infinite() {
                    f.write_str(if *v > 0.0 { "Infinity" } else { "-Infinity" })
                } else {
                    let mut buffer = ryu::Buffer::new();
                    f.write_str(buffer.format(*v))
                }
            }
            Number::Decimal128(d) => {
                if d.value < 0 {
                    f.write_str("-")?;
                }
                let digits = d.value.unsigned_abs().to_string();
                let scale = d.scale as usize;
                if scale == 0 {
                    f.write_str(&digits)
                } else if digits.len() > scale {
                    let (int_part, frac_part) = digits.split_at(digits.len() - scale);
                    write!(f, "{int_part}.{frac_part}")
                } else {
                    write!(f, "0.{}{digits}", "0".repeat(scale - digits.len()))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::hash::DefaultHasher;

    fn hash_of(n: &Number) -> u64 {
        let mut hasher = DefaultHasher::new();
        n.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_from_text() {
        assert_eq!(Number::from_text("0").unwrap(), Number::Int64(0));
        assert_eq!(Number::from_text("-12").unwrap(), Number::Int64(-12));
        assert_eq!(
            Number::from_text("18446744073709551615").unwrap(),
            Number::UInt64(u64::MAX)
        );
        assert_eq!(
            Number::from_text("1.25").unwrap(),
            Number::Decimal128(Decimal128 { value: 125, scale: 2 })
        );
        assert_eq!(
            Number::from_text("1.25e2").unwrap(),
            Number::Int64(125)
        );
        assert_eq!(
            Number::from_text("5e-3").unwrap(),
            Number::Decimal128(Decimal128 { value: 5, scale: 3 })
        );
    }

    #[test]
    fn test_semantic_equality() {
        let cases = [
            ("1", "1.0"),
            ("1", "1e0"),
            ("0.5", "5e-1"),
            ("100", "1e2"),
            ("-2.50", "-2.5"),
        ];
        for (lhs, rhs) in cases {
            let l = Number::from_text(lhs).unwrap();
            let r = Number::from_text(rhs).unwrap();
            assert_eq!(l, r, "{lhs} == {rhs}");
            assert_eq!(hash_of(&l), hash_of(&r), "hash {lhs} == hash {rhs}");
        }
        assert_eq!(Number::Float64(1.0), Number::Int64(1));
        assert_eq!(hash_of(&Number::Float64(1.0)), hash_of(&Number::Int64(1)));
    }

    #[test]
    fn test_ordering() {
        let mut values = vec![
            Number::from_text("10").unwrap(),
            Number::from_text("-3.5").unwrap(),
            Number::from_text("2.25").unwrap(),
            Number::Float64(0.5),
            Number::from_text("-100").unwrap(),
        ];
        values.sort();
        let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        assert_eq!(rendered, ["-100", "-3.5", "0.5", "2.25", "10"]);
    }

    #[test]
    fn test_compact_roundtrip() {
        let cases = [
            Number::Int64(0),
            Number::Int64(-1),
            Number::Int64(i64::MIN),
            Number::UInt64(u64::MAX),
            Number::Float64(1.5),
            Number::Float64(f64::NAN),
            Number::Decimal128(Decimal128 { value: -12345, scale: 3 }),
        ];
        for case in cases {
            let mut buf = Vec::new();
            case.compact_encode(&mut buf).unwrap();
            let back = Number::compact_decode(&buf).unwrap();
            if case.as_f64().is_nan() {
                assert!(back.as_f64().is_nan());
            } else {
                assert_eq!(case, back);
            }
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Number::from_text("1.25").unwrap().to_string(), "1.25");
        assert_eq!(Number::from_text("-0.05").unwrap().to_string(), "-0.05");
        assert_eq!(Number::from_text("12e2").unwrap().to_string(), "1200");
        assert_eq!(Number::Float64(0.25).to_string(), "0.25");
    }
}
