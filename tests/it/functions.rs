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

use jsonbx::parse_owned_jsonb;
use jsonbx::parse_value;
use jsonbx::JsonbBuilder;
use jsonbx::OwnedJsonb;
use jsonbx::Value;

fn owned(text: &str) -> OwnedJsonb {
    parse_owned_jsonb(text.as_bytes()).unwrap()
}

#[test]
fn test_sort_order_across_types() {
    let mut docs: Vec<OwnedJsonb> = [
        r#"{"a": 1}"#,
        "[1, 2]",
        "\"zz\"",
        "null",
        "[]",
        "true",
        "-5",
        "{}",
        "\"a\"",
        "false",
        "10",
    ]
    .iter()
    .map(|doc| owned(doc))
    .collect();
    docs.sort();
    let rendered: Vec<String> = docs.iter().map(|d| d.to_string()).collect();
    assert_eq!(
        rendered,
        [
            "null",
            "false",
            "true",
            "-5",
            "10",
            "\"a\"",
            "\"zz\"",
            "[]",
            "[1, 2]",
            "{}",
            "{\"a\": 1}",
        ]
    );
}

#[test]
fn test_equality_ignores_representation() {
    assert_eq!(owned(r#"{"a": 1, "b": 2}"#), owned(r#"{"b": 2, "a": 1}"#));
    assert_eq!(owned("[1.0, 2e1]"), owned("[1, 20]"));
    assert_ne!(owned("[1]"), owned("1"));
    assert_ne!(owned("{}"), owned("[]"));
}

#[test]
fn test_compare_nested() {
    let cases = [
        (r#"{"a": [1, 2]}"#, r#"{"a": [1, 3]}"#, Ordering::Less),
        (r#"{"a": 1}"#, r#"{"b": 1}"#, Ordering::Less),
        (r#"[{"x": 1}]"#, r#"[{"x": 1}]"#, Ordering::Equal),
        (r#"["a", null]"#, r#"["a"]"#, Ordering::Greater),
    ];
    for (lhs, rhs, expected) in cases {
        assert_eq!(
            owned(lhs).as_raw().compare(&owned(rhs).as_raw()).unwrap(),
            expected,
            "{lhs} vs {rhs}"
        );
    }
}

#[test]
fn test_contains() {
    let doc = owned(
        r#"{"product": "pen", "tags": ["blue", "cheap"], "stock": {"count": 5, "sold": 2}}"#,
    );
    let raw = doc.as_raw();
    for needle in [
        r#"{}"#,
        r#"{"product": "pen"}"#,
        r#"{"tags": ["cheap"]}"#,
        r#"{"tags": ["cheap", "blue"]}"#,
        r#"{"stock": {"sold": 2}}"#,
    ] {
        assert!(raw.contains(&owned(needle).as_raw()).unwrap(), "{needle}");
    }
    for needle in [
        r#"{"product": "pencil"}"#,
        r#"{"tags": ["red"]}"#,
        r#"{"tags": "blue"}"#,
        r#"{"stock": {"count": 5, "lost": 1}}"#,
        r#"["blue"]"#,
    ] {
        assert!(!raw.contains(&owned(needle).as_raw()).unwrap(), "{needle}");
    }
}

#[test]
fn test_contains_is_not_symmetric() {
    let big = owned("[1, 2, 3]");
    let small = owned("[2]");
    assert!(big.as_raw().contains(&small.as_raw()).unwrap());
    assert!(!small.as_raw().contains(&big.as_raw()).unwrap());
}

#[test]
fn test_hash_matches_equality() {
    let pairs = [
        (r#"{"a": 1, "b": [2.0]}"#, r#"{"b": [2], "a": 1.0}"#),
        ("\"text\"", "\"text\""),
        ("[null, true]", "[null, true]"),
    ];
    for (lhs, rhs) in pairs {
        let l = owned(lhs);
        let r = owned(rhs);
        assert_eq!(l, r);
        assert_eq!(
            l.as_raw().hash_with_seed(42).unwrap(),
            r.as_raw().hash_with_seed(42).unwrap(),
            "{lhs} vs {rhs}"
        );
    }
    assert_ne!(
        owned("[1, 2]").as_raw().hash_with_seed(0).unwrap(),
        owned("[2, 1]").as_raw().hash_with_seed(0).unwrap()
    );
}

#[test]
fn test_from_str_and_display() {
    let doc: OwnedJsonb = r#"{"z": 1, "y": [true, "s"]}"#.parse().unwrap();
    assert_eq!(doc.to_string(), r#"{"y": [true, "s"], "z": 1}"#);
    assert!(r#"{"z": }"#.parse::<OwnedJsonb>().is_err());
}

#[test]
fn test_splice_binary_subtree() {
    // lifting a serialized subtree into a new document gives the same
    // bytes as parsing the equivalent text
    let source = owned(r#"{"sub": {"a": 1, "b": [true, null]}}"#);
    let raw = source.as_raw();
    let Some(sub) = raw.get_by_name("sub").unwrap() else {
        panic!("missing subtree");
    };
    let mut builder = JsonbBuilder::new();
    builder.begin_object().unwrap();
    builder.push_key("outer").unwrap();
    builder.push_value(sub).unwrap();
    builder.push_key("n").unwrap();
    builder.push_scalar(Value::Null).unwrap();
    builder.end_object().unwrap();
    let built = builder.finish().unwrap().to_vec().unwrap();

    let direct = parse_value(br#"{"outer": {"a": 1, "b": [true, null]}, "n": null}"#)
        .unwrap()
        .to_vec()
        .unwrap();
    assert_eq!(built, direct);
}

#[test]
fn test_splice_scalar_pseudo_array_unwraps() {
    let scalar = owned("42");
    let mut builder = JsonbBuilder::new();
    builder.begin_array(false).unwrap();
    builder.push_elem(Value::Binary(scalar.as_raw())).unwrap();
    builder.end_array().unwrap();
    let built = builder.finish().unwrap().to_vec().unwrap();
    assert_eq!(built, owned("[42]").as_ref());
}
