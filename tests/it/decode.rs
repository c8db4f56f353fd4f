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
use jsonbx::JsonbToken;
use jsonbx::Number;
use jsonbx::OwnedJsonb;
use jsonbx::RawJsonb;
use jsonbx::Value;

fn owned(text: &str) -> OwnedJsonb {
    parse_owned_jsonb(text.as_bytes()).unwrap()
}

#[test]
fn test_type_of() {
    let cases = [
        ("null", "null"),
        ("true", "boolean"),
        ("12.5", "number"),
        ("\"x\"", "string"),
        ("[1]", "array"),
        (r#"{"a": 1}"#, "object"),
    ];
    for (doc, expected) in cases {
        assert_eq!(owned(doc).as_raw().type_of().unwrap(), expected, "{doc}");
    }
}

#[test]
fn test_get_by_name() {
    let doc = owned(r#"{"a": 1, "bb": "x", "cc": [true], "é": null}"#);
    let raw = doc.as_raw();
    assert_eq!(
        raw.get_by_name("a").unwrap(),
        Some(Value::Number(Number::Int64(1)))
    );
    assert_eq!(
        raw.get_by_name("bb").unwrap(),
        Some(Value::String("x".into()))
    );
    assert_eq!(raw.get_by_name("é").unwrap(), Some(Value::Null));
    assert_eq!(raw.get_by_name("b").unwrap(), None);
    assert_eq!(raw.get_by_name("").unwrap(), None);
    match raw.get_by_name("cc").unwrap() {
        Some(Value::Binary(nested)) => {
            assert_eq!(nested.get_by_index(0).unwrap(), Some(Value::Bool(true)))
        }
        other => panic!("unexpected {other:?}"),
    }
    // arrays have no keys
    assert_eq!(owned("[1]").as_raw().get_by_name("a").unwrap(), None);
}

#[test]
fn test_get_by_name_after_escape_decoding() {
    // keys are stored decoded, so lookup uses the plain character
    let doc = owned(r#"{"\u0061": 1}"#);
    assert_eq!(
        doc.as_raw().get_by_name("a").unwrap(),
        Some(Value::Number(Number::Int64(1)))
    );
}

#[test]
fn test_get_by_index() {
    let doc = owned(r#"[null, "s", 2]"#);
    let raw = doc.as_raw();
    assert_eq!(raw.get_by_index(0).unwrap(), Some(Value::Null));
    assert_eq!(raw.get_by_index(1).unwrap(), Some(Value::String("s".into())));
    assert_eq!(
        raw.get_by_index(2).unwrap(),
        Some(Value::Number(Number::Int64(2)))
    );
    assert_eq!(raw.get_by_index(3).unwrap(), None);
    // a bare scalar is indexable at 0 through its pseudo-array
    assert_eq!(
        owned("7").as_raw().get_by_index(0).unwrap(),
        Some(Value::Number(Number::Int64(7)))
    );
    assert_eq!(owned(r#"{"a": 1}"#).as_raw().get_by_index(0).unwrap(), None);
}

#[test]
fn test_lookup_past_offset_stride() {
    let text = format!(
        "{{{}}}",
        (0..100)
            .map(|i| format!("\"key{i:03}\": {i}"))
            .collect::<Vec<_>>()
            .join(", ")
    );
    let doc = owned(&text);
    let raw = doc.as_raw();
    for i in [0usize, 1, 31, 32, 33, 64, 99] {
        assert_eq!(
            raw.get_by_name(&format!("key{i:03}")).unwrap(),
            Some(Value::Number(Number::Int64(i as i64))),
            "key{i:03}"
        );
    }
}

#[test]
fn test_iterator_tokens() {
    let doc = owned(r#"{"a": [1, {"b": null}]}"#);
    let mut it = doc.as_raw().iterator().unwrap();
    let mut tokens = Vec::new();
    while let Some(token) = it.next(false).unwrap() {
        tokens.push(match token {
            JsonbToken::BeginObject { len } => format!("obj({len})"),
            JsonbToken::BeginArray { len, raw_scalar } => format!("arr({len},{raw_scalar})"),
            JsonbToken::Key(v) => format!("key({v})"),
            JsonbToken::Value(v) => format!("val({v})"),
            JsonbToken::Elem(v) => format!("elem({v})"),
            JsonbToken::EndObject => "endobj".to_string(),
            JsonbToken::EndArray => "endarr".to_string(),
        });
    }
    assert_eq!(
        tokens,
        vec![
            "obj(1)",
            "key(\"a\")",
            "arr(2,false)",
            "elem(1)",
            "obj(1)",
            "key(\"b\")",
            "val(null)",
            "endobj",
            "endarr",
            "endobj",
        ]
    );
}

#[test]
fn test_iterator_skip_nested() {
    let doc = owned(r#"[1, [2, 3], 4]"#);
    let mut it = doc.as_raw().iterator().unwrap();
    let mut nested = 0;
    while let Some(token) = it.next(true).unwrap() {
        if let JsonbToken::Elem(Value::Binary(raw)) = token {
            nested += 1;
            assert_eq!(raw.to_text().unwrap(), "[2, 3]");
        }
    }
    assert_eq!(nested, 1);
}

#[test]
fn test_invalid_binary_rejected() {
    for bytes in [
        &b""[..],
        &b"\x00\x00"[..],
        &[0u8, 0, 0, 0][..],             // no kind flag
        &[2u8, 0, 0, 0x60][..],          // both kinds set
        &[1u8, 0, 0, 0x40][..],          // entry word missing
        &[1u8, 0, 0, 0x40, 5, 0, 0, 0][..], // payload shorter than entry length
    ] {
        let raw = RawJsonb::new(bytes);
        assert!(raw.to_text().is_err(), "{bytes:?}");
    }
}

#[test]
fn test_to_text_canonical_form() {
    let cases = [
        ("null", "null"),
        ("  true", "true"),
        ("1.250", "1.250"),
        (r#""a\nb""#, "\"a\\nb\""),
        ("[1,2,[]]", "[1, 2, []]"),
        (r#"{"b":1,"a":{}}"#, r#"{"a": {}, "b": 1}"#),
    ];
    for (doc, expected) in cases {
        assert_eq!(owned(doc).to_string(), expected, "{doc}");
    }
}
