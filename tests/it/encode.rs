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
use jsonbx::RawJsonb;
use jsonbx::Value;
use proptest::prelude::*;

const DOCS: &[&str] = &[
    "null",
    "true",
    "-0.125",
    "18446744073709551615",
    "\"\"",
    "\"escape \\\"quotes\\\" and \\u00e9\"",
    "[]",
    "{}",
    "[1, [2, [3, [4]]]]",
    r#"{"a": {"b": {"c": [null, false]}}}"#,
    r#"{"numbers": [0, -1, 1.5, 2e10, 5e-5]}"#,
    r#"{"unicode": "héllo 😀", "k": "v"}"#,
];

#[test]
fn test_text_roundtrip_is_stable() {
    for doc in DOCS {
        let first = parse_owned_jsonb(doc.as_bytes()).unwrap();
        let text = first.to_string();
        let second = parse_owned_jsonb(text.as_bytes()).unwrap();
        assert_eq!(first.as_ref(), second.as_ref(), "{doc}");
        assert_eq!(second.to_string(), text, "{doc}");
    }
}

#[test]
fn test_serde_json_agrees() {
    // exponent-free docs render back to something serde_json reads as the
    // same value
    let safe: &[&str] = &[
        "[1, 2.5, -3]",
        r#"{"a": true, "b": [null, "x"]}"#,
        r#"{"deep": {"er": {"est": 1.25}}}"#,
    ];
    for doc in safe {
        let ours = parse_owned_jsonb(doc.as_bytes()).unwrap().to_string();
        let from_ours: serde_json::Value = serde_json::from_str(&ours).unwrap();
        let from_source: serde_json::Value = serde_json::from_str(doc).unwrap();
        assert_eq!(from_ours, from_source, "{doc}");
    }
}

#[test]
fn test_key_order_does_not_change_bytes() {
    let a = parse_owned_jsonb(br#"{"x": 1, "yy": [true], "z": null}"#).unwrap();
    let b = parse_owned_jsonb(br#"{"z": null, "x": 1, "yy": [true]}"#).unwrap();
    assert_eq!(a.as_ref(), b.as_ref());
}

#[test]
fn test_number_spelling_does_not_change_bytes() {
    let a = parse_owned_jsonb(b"[100]").unwrap();
    let b = parse_owned_jsonb(b"[1e2]").unwrap();
    assert_eq!(a.as_ref(), b.as_ref());
    let a = parse_owned_jsonb(b"[0.5]").unwrap();
    let b = parse_owned_jsonb(b"[5e-1]").unwrap();
    assert_eq!(a.as_ref(), b.as_ref());
}

#[test]
fn test_random_values_roundtrip() {
    for _ in 0..64 {
        let value = Value::rand_value();
        let bytes = value.to_vec().unwrap();
        let text = RawJsonb::new(&bytes).to_text().unwrap();
        let reparsed = parse_owned_jsonb(text.as_bytes()).unwrap();
        // reparsing the rendered text keeps the value, though a float may
        // come back in its exact decimal form
        assert_eq!(
            reparsed.as_raw().compare(&RawJsonb::new(&bytes)).unwrap(),
            std::cmp::Ordering::Equal,
            "{text}"
        );
        // and from there the bytes are a fixpoint
        let again = parse_owned_jsonb(reparsed.to_string().as_bytes()).unwrap();
        assert_eq!(again.as_ref(), reparsed.as_ref(), "{text}");
    }
}

#[test]
fn test_large_array_roundtrip() {
    let text = format!(
        "[{}]",
        (0..200)
            .map(|i| format!("{{\"k{i}\": {i}}}"))
            .collect::<Vec<_>>()
            .join(", ")
    );
    let owned = parse_owned_jsonb(text.as_bytes()).unwrap();
    assert_eq!(owned.to_string(), text);
}

fn arb_json() -> impl Strategy<Value = serde_json::Value> {
    let leaf = prop_oneof![
        Just(serde_json::Value::Null),
        any::<bool>().prop_map(serde_json::Value::from),
        any::<i64>().prop_map(serde_json::Value::from),
        "[ -~]{0,12}".prop_map(serde_json::Value::from),
    ];
    leaf.prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(serde_json::Value::from),
            prop::collection::btree_map("[a-z]{0,5}", inner, 0..6)
                .prop_map(|m| serde_json::Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn parse_encode_render_fixpoint(doc in arb_json()) {
        let text = doc.to_string();
        let first = parse_owned_jsonb(text.as_bytes()).unwrap();
        let rendered = first.to_string();
        let second = parse_owned_jsonb(rendered.as_bytes()).unwrap();
        prop_assert_eq!(first.as_ref(), second.as_ref());
        prop_assert_eq!(second.to_string(), rendered);
    }

    #[test]
    fn encoded_values_compare_equal_to_themselves(doc in arb_json()) {
        let text = doc.to_string();
        let owned = parse_owned_jsonb(text.as_bytes()).unwrap();
        prop_assert_eq!(
            owned.as_raw().compare(&owned.as_raw()).unwrap(),
            std::cmp::Ordering::Equal
        );
        prop_assert_eq!(
            owned.as_raw().hash_with_seed(1).unwrap(),
            owned.as_raw().hash_with_seed(1).unwrap()
        );
    }
}
