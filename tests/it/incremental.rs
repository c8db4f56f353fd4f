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

use jsonbx::parse_owned_jsonb;
use jsonbx::Error;
use jsonbx::IncrementalParser;
use jsonbx::JsonbBuilder;
use jsonbx::Number;
use jsonbx::NullSemAction;
use jsonbx::OwnedJsonb;
use jsonbx::ParseStatus;
use jsonbx::Result;
use jsonbx::SemanticActions;
use jsonbx::TokenType;
use jsonbx::Value;

/// Builds binary containers from parse events, entirely through the
/// public API.
#[derive(Default)]
struct BinaryBuilder {
    builder: JsonbBuilder<'static>,
}

impl BinaryBuilder {
    fn finish(self) -> Result<OwnedJsonb> {
        let value = self.builder.finish()?;
        Ok(OwnedJsonb::new(value.to_vec()?))
    }
}

impl SemanticActions for BinaryBuilder {
    fn object_start(&mut self) -> Result<()> {
        self.builder.begin_object()
    }
    fn object_end(&mut self) -> Result<()> {
        self.builder.end_object()
    }
    fn array_start(&mut self) -> Result<()> {
        self.builder.begin_array(false)
    }
    fn array_end(&mut self) -> Result<()> {
        self.builder.end_array()
    }
    fn object_field_start(&mut self, key: &str, _is_null: bool) -> Result<()> {
        self.builder.push_key(key.to_owned())
    }
    fn scalar(&mut self, text: &str, token: TokenType) -> Result<()> {
        let value = match token {
            TokenType::Null => Value::Null,
            TokenType::True => Value::Bool(true),
            TokenType::False => Value::Bool(false),
            TokenType::Number => Value::Number(Number::from_text(text)?),
            TokenType::String => Value::String(text.to_owned().into()),
            _ => return Err(Error::SemActionFailed),
        };
        self.builder.push_scalar(value)
    }
}

const DOC: &[u8] = concat!(
    r#"{"name": "café", "tags": [1, -2.5e2, true, null], "#,
    r#""nested": {"empty": {}, "list": ["x\ny", 18446744073709551615]}}"#
)
.as_bytes();

#[test]
fn test_chunked_output_matches_one_shot() {
    let expected = parse_owned_jsonb(DOC).unwrap();
    for split in 0..=DOC.len() {
        let mut sem = BinaryBuilder::default();
        let mut parser = IncrementalParser::new();
        assert_eq!(
            parser.parse_chunk(&DOC[..split], false, &mut sem).unwrap(),
            ParseStatus::Incomplete,
            "split at {split}"
        );
        assert_eq!(
            parser.parse_chunk(&DOC[split..], true, &mut sem).unwrap(),
            ParseStatus::Done,
            "split at {split}"
        );
        let owned = sem.finish().unwrap();
        assert_eq!(owned.as_ref(), expected.as_ref(), "split at {split}");
    }
}

#[test]
fn test_three_way_splits() {
    let expected = parse_owned_jsonb(DOC).unwrap();
    for first in (0..DOC.len()).step_by(7) {
        for second in (first..DOC.len()).step_by(13) {
            let mut sem = BinaryBuilder::default();
            let mut parser = IncrementalParser::new();
            parser.parse_chunk(&DOC[..first], false, &mut sem).unwrap();
            parser
                .parse_chunk(&DOC[first..second], false, &mut sem)
                .unwrap();
            parser.parse_chunk(&DOC[second..], true, &mut sem).unwrap();
            let owned = sem.finish().unwrap();
            assert_eq!(owned.as_ref(), expected.as_ref(), "splits {first}/{second}");
        }
    }
}

#[test]
fn test_whitespace_only_tail() {
    let mut sem = NullSemAction;
    let mut parser = IncrementalParser::new();
    assert_eq!(
        parser.parse_chunk(b"[1, 2]", false, &mut sem).unwrap(),
        ParseStatus::Incomplete
    );
    assert_eq!(
        parser.parse_chunk(b"  \n ", true, &mut sem).unwrap(),
        ParseStatus::Done
    );
}

#[test]
fn test_error_position_spans_chunks() {
    let mut sem = NullSemAction;
    let mut parser = IncrementalParser::new();
    parser.parse_chunk(b"[true,\n ", false, &mut sem).unwrap();
    let err = parser.parse_chunk(b"falze]", true, &mut sem).unwrap_err();
    match err {
        Error::Syntax(kind, loc) => {
            assert_eq!(kind, jsonbx::ParseErrorKind::InvalidToken);
            // offsets count from the start of the whole document
            assert_eq!(loc.offset, 8);
            assert_eq!(loc.line, 2);
            assert_eq!(loc.column, 2);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_truncated_document() {
    let mut sem = NullSemAction;
    let mut parser = IncrementalParser::new();
    parser.parse_chunk(br#"{"a": [1, "#, false, &mut sem).unwrap();
    let err = parser.parse_chunk(b"", true, &mut sem).unwrap_err();
    assert!(matches!(
        err,
        Error::Syntax(jsonbx::ParseErrorKind::ExpectedMore, _)
    ));
}
