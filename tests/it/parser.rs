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

use jsonbx::is_valid_number;
use jsonbx::parse_value;
use jsonbx::validate;
use jsonbx::ArrayValue;
use jsonbx::Number;
use jsonbx::Value;

fn test_parse_ok(tests: Vec<(&str, Value<'_>)>) {
    for (s, val) in tests {
        assert_eq!(parse_value(s.as_bytes()).unwrap(), val, "{s}");
    }
}

fn test_parse_err(errors: &[(&str, &'static str)]) {
    for &(s, err) in errors {
        let res = parse_value(s.as_bytes());
        assert!(res.is_err(), "{s}");
        assert_eq!(res.err().unwrap().to_string(), err, "{s}");
    }
}

fn scalar(value: Value<'static>) -> Value<'static> {
    Value::Array(ArrayValue {
        raw_scalar: true,
        elems: vec![value],
    })
}

#[test]
fn test_parse_scalars() {
    test_parse_ok(vec![
        ("null", scalar(Value::Null)),
        (" true ", scalar(Value::Bool(true))),
        ("false", scalar(Value::Bool(false))),
        ("0", scalar(Value::Number(Number::Int64(0)))),
        ("-125", scalar(Value::Number(Number::Int64(-125)))),
        (
            "18446744073709551615",
            scalar(Value::Number(Number::UInt64(u64::MAX))),
        ),
        ("1.25", scalar(Value::Number(Number::from_text("1.25").unwrap()))),
        ("2e3", scalar(Value::Number(Number::Int64(2000)))),
        ("\"\"", scalar(Value::String(Cow::Borrowed("")))),
        (
            r#""a\"bé😀""#,
            scalar(Value::String(Cow::Borrowed("a\"bé😀"))),
        ),
    ]);
}

#[test]
fn test_parse_containers() {
    test_parse_ok(vec![
        (
            "[]",
            Value::Array(ArrayValue {
                raw_scalar: false,
                elems: vec![],
            }),
        ),
        (
            "[null, [true]]",
            Value::Array(ArrayValue {
                raw_scalar: false,
                elems: vec![
                    Value::Null,
                    Value::Array(ArrayValue {
                        raw_scalar: false,
                        elems: vec![Value::Bool(true)],
                    }),
                ],
            }),
        ),
    ]);
    // objects come back in storage order: shorter keys first, then bytewise
    let value = parse_value(br#"{"bb": 1, "a": 2, "c": [3]}"#).unwrap();
    assert_eq!(value.to_string(), r#"{"a": 2, "c": [3], "bb": 1}"#);
}

#[test]
fn test_parse_duplicate_keys_keep_first() {
    let value = parse_value(br#"{"k": 1, "k": 2, "j": 3, "k": 4}"#).unwrap();
    assert_eq!(value.to_string(), r#"{"j": 3, "k": 1}"#);
    // escapes decode before duplicate resolution
    let value = parse_value(br#"{"k": 1, "\u006b": 2}"#).unwrap();
    assert_eq!(value.to_string(), r#"{"k": 1}"#);
}

#[test]
fn test_parse_errors() {
    test_parse_err(&[
        ("", "The input string ended unexpectedly. at line 1 column 1"),
        ("[1, 2", "The input string ended unexpectedly. at line 1 column 6"),
        ("1 2", "Expected end of input, but found \"\". at line 1 column 3"),
        ("[1: 2]", "Expected \",\" or \"]\", but found \"\". at line 1 column 3"),
        ("{1: 2}", "Expected string or \"}\", but found \"\". at line 1 column 2"),
        ("{\"a\" 1}", "Expected \":\", but found \"\". at line 1 column 6"),
        ("{\"a\": }", "Expected JSON value, but found \"\". at line 1 column 7"),
        ("falze", "Token \"\" is invalid. at line 1 column 1"),
        ("00", "Token \"\" is invalid. at line 1 column 1"),
    ]);
}

#[test]
fn test_parse_error_location_multiline() {
    let err = parse_value(b"{\n  \"a\": 1,\n  2\n}").unwrap_err();
    match err {
        jsonbx::Error::Syntax(kind, loc) => {
            assert_eq!(kind, jsonbx::ParseErrorKind::ExpectedString);
            assert_eq!(loc.line, 3);
            assert_eq!(loc.column, 3);
            assert_eq!(loc.offset, 14);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_validate_modes() {
    assert!(validate(br#"{"a": [1, {"b": "c"}]}"#, false));
    assert!(validate(br#"{"a": 1, "a": 2}"#, false));
    assert!(!validate(br#"{"a": 1, "a": 2}"#, true));
    assert!(!validate(b"[1, 2,]", false));
    assert!(!validate(b"", false));
    // validation checks string contents even without building values
    assert!(!validate(br#"["\ud83d"]"#, false));
}

#[test]
fn test_is_valid_number_standalone() {
    assert!(is_valid_number("-0.5e+10"));
    assert!(!is_valid_number("+1"));
    assert!(!is_valid_number("1e"));
    assert!(!is_valid_number("0x10"));
}

#[test]
fn test_deep_nesting_rejected() {
    let deep = format!("{}1{}", "[".repeat(10000), "]".repeat(10000));
    assert_eq!(
        parse_value(deep.as_bytes()).unwrap_err(),
        jsonbx::Error::NestingTooDeep
    );
    // under the limit the document parses, encodes and renders
    let ok = format!("{}1{}", "[".repeat(1000), "]".repeat(1000));
    let owned = jsonbx::parse_owned_jsonb(ok.as_bytes()).unwrap();
    assert_eq!(owned.to_string(), ok);
}
