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

// Container header constants.
// The low 28 bits hold the element (or pair) count, the high bits the
// container kind. `SCALAR` is only ever set together with `ARRAY` and marks
// a one-element pseudo-array wrapping a bare root scalar.
pub(crate) const CONTAINER_CMASK: u32 = 0x0FFF_FFFF;
pub(crate) const CONTAINER_FSCALAR: u32 = 0x1000_0000;
pub(crate) const CONTAINER_FOBJECT: u32 = 0x2000_0000;
pub(crate) const CONTAINER_FARRAY: u32 = 0x4000_0000;

// JEntry constants.
// The low 28 bits hold either the payload length or, on every
// `JENTRY_OFFSET_STRIDE`-th entry of a run, the payload end offset
// (flagged by `JENTRY_HAS_OFF`). The top 3 bits hold the value type.
pub(crate) const JENTRY_OFFLENMASK: u32 = 0x0FFF_FFFF;
pub(crate) const JENTRY_HAS_OFF: u32 = 0x1000_0000;
pub(crate) const JENTRY_TYPE_MASK: u32 = 0xE000_0000;

pub(crate) const JENTRY_IS_STRING: u32 = 0x0000_0000;
pub(crate) const JENTRY_IS_NUMERIC: u32 = 0x2000_0000;
pub(crate) const JENTRY_IS_BOOL_FALSE: u32 = 0x4000_0000;
pub(crate) const JENTRY_IS_BOOL_TRUE: u32 = 0x6000_0000;
pub(crate) const JENTRY_IS_NULL: u32 = 0x8000_0000;
pub(crate) const JENTRY_IS_CONTAINER: u32 = 0xA000_0000;

// Storing an end offset on every 32nd entry bounds the backward walk that
// random access needs, while keeping most entries as plain lengths so that
// equal subtrees stay byte-equal wherever they land.
pub(crate) const JENTRY_OFFSET_STRIDE: usize = 32;

// Nesting limit shared by the parsers, the encoder and the decoder.
// The parse side is iterative, but encoding and rendering still recurse
// once per level, so the limit must fit inside a default thread stack.
pub(crate) const MAX_NESTING_DEPTH: usize = 1024;

// Initial prediction stack capacity for the table-driven parser.
pub(crate) const PREDICTION_STACK_INIT: usize = 64;

// Number payload encoding tags.
pub(crate) const NUMBER_ZERO: u8 = 0x00;
pub(crate) const NUMBER_NAN: u8 = 0x10;
pub(crate) const NUMBER_INF: u8 = 0x20;
pub(crate) const NUMBER_NEG_INF: u8 = 0x30;
pub(crate) const NUMBER_INT: u8 = 0x40;
pub(crate) const NUMBER_UINT: u8 = 0x50;
pub(crate) const NUMBER_FLOAT: u8 = 0x60;
pub(crate) const NUMBER_DECIMAL: u8 = 0x70;

// Ranks used by the ordered compare.
// Null < Bool < Number < String < Array < Object, with a raw-scalar
// pseudo-array sorting below a real array.
pub(crate) const NULL_RANK: u8 = 0;
pub(crate) const BOOL_RANK: u8 = 1;
pub(crate) const NUMBER_RANK: u8 = 2;
pub(crate) const STRING_RANK: u8 = 3;
pub(crate) const ARRAY_RANK: u8 = 4;
pub(crate) const OBJECT_RANK: u8 = 5;

// Per-scalar hash inputs, combined with `acc.rotate_left(1) ^ h`.
pub(crate) const HASH_NULL: u64 = 0x01;
pub(crate) const HASH_TRUE: u64 = 0x02;
pub(crate) const HASH_FALSE: u64 = 0x04;

pub(crate) const TYPE_NULL: &str = "null";
pub(crate) const TYPE_BOOLEAN: &str = "boolean";
pub(crate) const TYPE_NUMBER: &str = "number";
pub(crate) const TYPE_STRING: &str = "string";
pub(crate) const TYPE_ARRAY: &str = "array";
pub(crate) const TYPE_OBJECT: &str = "object";
