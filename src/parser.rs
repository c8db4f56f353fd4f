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

//! One-shot JSON parsing entry points driving [`SemanticActions`]
//! callbacks. The grammar itself runs on the same prediction-stack
//! machine as [`IncrementalParser`](crate::IncrementalParser), fed the
//! whole document at once.

use crate::builder::JsonbBuilder;
use crate::error::Error;
use crate::error::ParseErrorKind;
use crate::error::Result;
use crate::incremental::IncrementalParser;
use crate::incremental::ParseStatus;
use crate::lexer::JsonLexContext;
use crate::lexer::TokenType;
use crate::number::Number;
use crate::owned::OwnedJsonb;
use crate::value::Value;

/// Callbacks invoked while walking JSON text.
///
/// All methods default to no-ops, so an implementation only overrides the
/// events it cares about. Returning an error aborts the parse; callbacks
/// that have nothing better to report can use
/// [`Error::SemActionFailed`](crate::Error::SemActionFailed).
///
/// `is_null` on the field/element hooks tells the callback up front whether
/// the upcoming value is the `null` literal, which is what a null-stripping
/// consumer needs before it decides to record the key at all.
pub trait SemanticActions {
    fn object_start(&mut self) -> Result<()> {
        Ok(())
    }
    fn object_end(&mut self) -> Result<()> {
        Ok(())
    }
    fn array_start(&mut self) -> Result<()> {
        Ok(())
    }
    fn array_end(&mut self) -> Result<()> {
        Ok(())
    }
    fn object_field_start(&mut self, _key: &str, _is_null: bool) -> Result<()> {
        Ok(())
    }
    fn object_field_end(&mut self, _key: &str, _is_null: bool) -> Result<()> {
        Ok(())
    }
    fn array_element_start(&mut self, _is_null: bool) -> Result<()> {
        Ok(())
    }
    fn array_element_end(&mut self, _is_null: bool) -> Result<()> {
        Ok(())
    }
    fn scalar(&mut self, _text: &str, _token: TokenType) -> Result<()> {
        Ok(())
    }
}

/// Does nothing with any event; parsing with it is pure validation.
#[derive(Debug, Default)]
pub struct NullSemAction;

impl SemanticActions for NullSemAction {}

/// Parses a complete JSON document, feeding events to `sem`.
///
/// # Examples
///
/// ```
/// use jsonbx::NullSemAction;
///
/// let mut sem = NullSemAction;
/// assert!(jsonbx::parse_text(br#"{"a": [1, 2]}"#, &mut sem).is_ok());
/// assert!(jsonbx::parse_text(b"[1, 2", &mut sem).is_err());
/// ```
pub fn parse_text(input: &[u8], sem: &mut dyn SemanticActions) -> Result<()> {
    let mut lex = JsonLexContext::new(input, true);
    parse_with_lexer(&mut lex, sem)
}

/// Like [`parse_text`] but over a caller-configured lexer, so validation
/// can skip escape decoding and error reports can use
/// [`JsonLexContext::errdetail`].
pub fn parse_with_lexer(lex: &mut JsonLexContext<'_>, sem: &mut dyn SemanticActions) -> Result<()> {
    if lex.is_incremental() {
        return Err(Error::InvalidLexerType);
    }
    let mut machine = IncrementalParser::new();
    match machine.drive(lex, sem)? {
        ParseStatus::Done => Ok(()),
        // a one-shot lexer never reports a partial token
        ParseStatus::Incomplete => Err(report(ParseErrorKind::ExpectedMore, lex)),
    }
}

/// Checks JSON text without building anything.
///
/// With `unique_keys` set, objects with repeated keys (after escape
/// decoding) are rejected as well.
///
/// # Examples
///
/// ```
/// assert!(jsonbx::validate(br#"{"a": 1, "b": 2}"#, true));
/// assert!(!jsonbx::validate(br#"{"a": 1, "a": 2}"#, true));
/// assert!(jsonbx::validate(br#"{"a": 1, "a": 2}"#, false));
/// ```
pub fn validate(input: &[u8], unique_keys: bool) -> bool {
    if unique_keys {
        let mut lex = JsonLexContext::new(input, true);
        let mut sem = UniqueKeysChecker::default();
        parse_with_lexer(&mut lex, &mut sem).is_ok()
    } else {
        // no key inspection, so string tokens need not be decoded
        let mut lex = JsonLexContext::new(input, false);
        let mut sem = NullSemAction;
        parse_with_lexer(&mut lex, &mut sem).is_ok()
    }
}

/// Parses JSON text into the in-memory value model.
///
/// Duplicate object keys keep the first occurrence.
///
/// # Examples
///
/// ```
/// let value = jsonbx::parse_value(br#"{"b": 1, "a": 2, "b": 3}"#).unwrap();
/// assert_eq!(value.to_string(), r#"{"a": 2, "b": 1}"#);
/// ```
pub fn parse_value(input: &[u8]) -> Result<Value<'static>> {
    let mut lex = JsonLexContext::new(input, true);
    let mut sem = ValueBuilder::default();
    parse_with_lexer(&mut lex, &mut sem)?;
    sem.finish()
}

/// Parses JSON text straight into an owned binary container.
///
/// # Examples
///
/// ```
/// let owned = jsonbx::parse_owned_jsonb(br#"[1, "a", null]"#).unwrap();
/// assert_eq!(owned.to_string(), r#"[1, "a", null]"#);
/// ```
pub fn parse_owned_jsonb(input: &[u8]) -> Result<OwnedJsonb> {
    let value = parse_value(input)?;
    Ok(OwnedJsonb::new(value.to_vec()?))
}

pub(crate) fn report(context: ParseErrorKind, lex: &JsonLexContext<'_>) -> Error {
    let kind = if lex.token_type == TokenType::End {
        ParseErrorKind::ExpectedMore
    } else {
        context
    };
    Error::Syntax(kind, lex.token_location())
}

pub(crate) fn starts_value(token: TokenType) -> bool {
    matches!(
        token,
        TokenType::ObjectStart
            | TokenType::ArrayStart
            | TokenType::String
            | TokenType::Number
            | TokenType::True
            | TokenType::False
            | TokenType::Null
    )
}

/// Rejects documents whose objects repeat a key.
#[derive(Debug, Default)]
struct UniqueKeysChecker {
    stack: Vec<Vec<String>>,
}

impl SemanticActions for UniqueKeysChecker {
    fn object_start(&mut self) -> Result<()> {
        self.stack.push(Vec::new());
        Ok(())
    }

    fn object_end(&mut self) -> Result<()> {
        self.stack.pop();
        Ok(())
    }

    fn object_field_start(&mut self, key: &str, _is_null: bool) -> Result<()> {
        let keys = self.stack.last_mut().ok_or(Error::SemActionFailed)?;
        if keys.iter().any(|k| k == key) {
            return Err(Error::DuplicateKey(key.to_string()));
        }
        keys.push(key.to_string());
        Ok(())
    }
}

/// Builds a [`Value`] tree out of parse events via the push builder.
#[derive(Default)]
pub(crate) struct ValueBuilder {
    builder: JsonbBuilder<'static>,
}

impl ValueBuilder {
    pub(crate) fn finish(self) -> Result<Value<'static>> {
        self.builder.finish()
    }
}

impl SemanticActions for ValueBuilder {
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
