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

//! `jsonbx` is a binary format `JSON` representation modeled on the [PostgreSQL](https://www.postgresql.org/docs/current/datatype-json.html) jsonb on-disk layout. JSON text is parsed once into a packed container that supports typed access, key lookup, ordering, containment and hashing without re-parsing.
//!
//! ## Features
//!
//! - Event-driven parsing: a prediction-stack parser drives [`SemanticActions`] callbacks, so validation, tree building and direct binary encoding all share one front-end.
//! - Chunked input: [`IncrementalParser`] accepts a document split at arbitrary byte boundaries, including inside tokens and escape sequences.
//! - Binary operations: [`RawJsonb`] values compare, hash and test containment directly on the encoded bytes, and object key lookup is a binary search over the sorted key area.
//! - Normalized storage: object keys are stored sorted (shorter first, then bytewise), duplicate keys keep the first occurrence, and equal values encode to equal bytes.
//!
//! ## Encoding format
//!
//! A value is a tree of containers. Each container is a 32-bit header, one
//! 32-bit JEntry per child, and the concatenated child payloads.
//!
//! - Container header: the low 28 bits count the children, the high bits
//!   hold the kind.
//!   - `array` flag: `0x40000000`
//!   - `object` flag: `0x20000000`
//!   - `scalar` flag: `0x10000000`, always combined with the array flag to
//!     mark the one-element pseudo-array wrapping a bare root scalar.
//! - JEntry: 3 type bits, a has-offset bit, and 28 bits holding the payload
//!   length, or the payload end offset on every 32nd entry of a run.
//!   - `string` JEntry: `0x00000000`
//!   - `number` JEntry: `0x20000000`
//!   - `false` JEntry: `0x40000000`
//!   - `true` JEntry: `0x60000000`
//!   - `null` JEntry: `0x80000000`
//!   - `container` JEntry: `0xA0000000`
//! - Payloads: strings are raw UTF-8; numbers use a compact tagged
//!   encoding; nested containers repeat the structure recursively. Number
//!   and container payloads are padded to 4-byte alignment, with the pad
//!   counted in the entry length.
//!
//! An object with `n` pairs stores `2n` JEntries: all keys first, then all
//! values, so keys sit contiguously for lookup.
//!
//! #### An encoding example
//!
//! ```text
//! // JSON value
//! [false, "ab"]
//!
//! // binary encoding
//! 0x40000002    array container header (2 JEntries)
//! 0x40000000    false JEntry (no payload)
//! 0x00000002    string JEntry (payload length 2)
//! 0x6162        string payload ("ab")
//! ```

#![allow(clippy::uninlined_format_args)]

mod builder;
mod constants;
mod datetime;
mod error;
mod functions;
mod incremental;
mod iterator;
mod jentry;
mod lexer;
mod number;
mod owned;
mod parser;
mod raw;
mod ser;
mod value;

pub use builder::JsonbBuilder;
pub use datetime::Datetime;
pub use error::Error;
pub use error::Location;
pub use error::ParseErrorKind;
pub use error::Result;
pub use incremental::IncrementalParser;
pub use incremental::ParseStatus;
pub use iterator::JsonbIterator;
pub use iterator::JsonbToken;
pub use lexer::is_valid_number;
pub use lexer::JsonLexContext;
pub use lexer::TokenType;
pub use number::Decimal128;
pub use number::Number;
pub use owned::OwnedJsonb;
pub use parser::parse_owned_jsonb;
pub use parser::parse_text;
pub use parser::parse_value;
pub use parser::parse_with_lexer;
pub use parser::validate;
pub use parser::NullSemAction;
pub use parser::SemanticActions;
pub use raw::RawJsonb;
pub use value::ArrayValue;
pub use value::KeyValue;
pub use value::ObjectValue;
pub use value::Value;
