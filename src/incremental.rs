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

//! Stack-machine JSON parsing.
//!
//! Grammar symbols live on an explicit prediction stack instead of the
//! call stack, so nesting depth is bounded by the configured limit rather
//! than the thread stack, and a parse can stop at a chunk boundary and
//! resume later. Grammar symbols are interleaved with semantic markers,
//! and a marker that does not need to look at the next token runs even
//! when the chunk is exhausted, so callbacks fire as early as possible.
//! The one-shot entry points in `parser` drive the same machine over a
//! single buffer.

use crate::constants::MAX_NESTING_DEPTH;
use crate::constants::PREDICTION_STACK_INIT;
use crate::error::Error;
use crate::error::ParseErrorKind;
use crate::error::Result;
use crate::lexer::JsonLexContext;
use crate::lexer::LexPersist;
use crate::lexer::LexStatus;
use crate::lexer::TokenType;
use crate::parser::report;
use crate::parser::starts_value;
use crate::parser::SemanticActions;

/// Outcome of feeding one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStatus {
    /// The document is complete and valid.
    Done,
    /// The chunk ended mid-document; feed the next one.
    Incomplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NonTerm {
    Json,
    KeyPairs,
    MoreKeyPairs,
    ArrayElements,
    MoreArrayElements,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    ObjectBegin,
    ObjectFinish,
    ArrayBegin,
    ArrayFinish,
    /// Captures an object key out of the current string token.
    FieldName,
    FieldBegin,
    FieldFinish,
    ElemBegin,
    ElemFinish,
    ScalarEmit,
}

impl Marker {
    fn needs_lookahead(self) -> bool {
        matches!(
            self,
            Marker::FieldName | Marker::FieldBegin | Marker::ElemBegin | Marker::ScalarEmit
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Symbol {
    Tok(TokenType),
    Nt(NonTerm),
    Sem(Marker),
}

/// A resumable JSON parser fed one chunk at a time.
///
/// Chunks may split the input anywhere, including inside tokens and
/// escape sequences. The same [`SemanticActions`] events fire as with
/// [`parse_text`](crate::parse_text), in the same order.
///
/// # Examples
///
/// ```
/// use jsonbx::IncrementalParser;
/// use jsonbx::NullSemAction;
/// use jsonbx::ParseStatus;
///
/// let mut parser = IncrementalParser::new();
/// let mut sem = NullSemAction;
/// let status = parser.parse_chunk(br#"{"a": [1, "#, false, &mut sem).unwrap();
/// assert_eq!(status, ParseStatus::Incomplete);
/// let status = parser.parse_chunk(b"2]}", true, &mut sem).unwrap();
/// assert_eq!(status, ParseStatus::Done);
/// ```
#[derive(Debug)]
pub struct IncrementalParser {
    lex: LexPersist,
    stack: Vec<Symbol>,
    fields: Vec<String>,
    nulls: Vec<bool>,
    depth: usize,
    done: bool,
}

impl Default for IncrementalParser {
    fn default() -> IncrementalParser {
        IncrementalParser::new()
    }
}

impl IncrementalParser {
    pub fn new() -> IncrementalParser {
        let mut stack = Vec::with_capacity(PREDICTION_STACK_INIT);
        stack.push(Symbol::Nt(NonTerm::Json));
        IncrementalParser {
            lex: LexPersist::new(true),
            stack,
            fields: Vec::new(),
            nulls: Vec::new(),
            depth: 0,
            done: false,
        }
    }

    /// Consumes one chunk, firing callbacks for everything that can be
    /// decided from the input so far. `is_last` marks the final chunk;
    /// only then can the document complete.
    pub fn parse_chunk(
        &mut self,
        chunk: &[u8],
        is_last: bool,
        sem: &mut dyn SemanticActions,
    ) -> Result<ParseStatus> {
        if self.done {
            return Err(Error::Message(
                "input past the end of the document".to_string(),
            ));
        }
        let mut lex = JsonLexContext::resume(std::mem::take(&mut self.lex), chunk, is_last, true);
        match self.drive(&mut lex, sem) {
            Ok(ParseStatus::Incomplete) => {
                self.lex = lex.suspend();
                Ok(ParseStatus::Incomplete)
            }
            Ok(ParseStatus::Done) => {
                self.done = true;
                Ok(ParseStatus::Done)
            }
            Err(err) => {
                self.done = true;
                Err(err)
            }
        }
    }

    pub(crate) fn drive(
        &mut self,
        lex: &mut JsonLexContext<'_>,
        sem: &mut dyn SemanticActions,
    ) -> Result<ParseStatus> {
        let mut have = false;
        loop {
            let need = match self.stack.last() {
                None | Some(Symbol::Tok(_)) | Some(Symbol::Nt(_)) => true,
                Some(Symbol::Sem(marker)) => marker.needs_lookahead(),
            };
            if need && !have {
                match lex.next_token()? {
                    LexStatus::Token => have = true,
                    LexStatus::Incomplete => return Ok(ParseStatus::Incomplete),
                }
            }
            let Some(top) = self.stack.last().copied() else {
                if lex.token_type == TokenType::End {
                    return Ok(ParseStatus::Done);
                }
                return Err(report(ParseErrorKind::ExpectedEnd, lex));
            };
            match top {
                Symbol::Tok(expected) => {
                    if lex.token_type != expected {
                        let kind = match expected {
                            TokenType::Colon => ParseErrorKind::ExpectedColon,
                            TokenType::ObjectEnd => ParseErrorKind::ExpectedObjectNext,
                            TokenType::ArrayEnd => ParseErrorKind::ExpectedArrayNext,
                            _ => ParseErrorKind::ExpectedJson,
                        };
                        return Err(report(kind, lex));
                    }
                    self.stack.pop();
                    have = false;
                }
                Symbol::Nt(nt) => {
                    self.stack.pop();
                    self.expand(nt, lex)?;
                }
                Symbol::Sem(marker) => {
                    self.stack.pop();
                    have = self.run_marker(marker, lex, sem, have)?;
                }
            }
        }
    }

    /// Replaces a non-terminal with its production for the current
    /// lookahead. Pushed in reverse so the stack pops in grammar order.
    fn expand(&mut self, nt: NonTerm, lex: &JsonLexContext<'_>) -> Result<()> {
        let token = lex.token_type;
        match nt {
            NonTerm::Json => match token {
                TokenType::ObjectStart => {
                    if self.depth >= MAX_NESTING_DEPTH {
                        return Err(Error::NestingTooDeep);
                    }
                    self.stack.extend([
                        Symbol::Sem(Marker::ObjectFinish),
                        Symbol::Tok(TokenType::ObjectEnd),
                        Symbol::Nt(NonTerm::KeyPairs),
                        Symbol::Sem(Marker::ObjectBegin),
                        Symbol::Tok(TokenType::ObjectStart),
                    ]);
                }
                TokenType::ArrayStart => {
                    if self.depth >= MAX_NESTING_DEPTH {
                        return Err(Error::NestingTooDeep);
                    }
                    self.stack.extend([
                        Symbol::Sem(Marker::ArrayFinish),
                        Symbol::Tok(TokenType::ArrayEnd),
                        Symbol::Nt(NonTerm::ArrayElements),
                        Symbol::Sem(Marker::ArrayBegin),
                        Symbol::Tok(TokenType::ArrayStart),
                    ]);
                }
                TokenType::String
                | TokenType::Number
                | TokenType::True
                | TokenType::False
                | TokenType::Null => self.stack.push(Symbol::Sem(Marker::ScalarEmit)),
                _ => return Err(report(ParseErrorKind::ExpectedJson, lex)),
            },
            NonTerm::KeyPairs => match token {
                TokenType::String => self.push_pair(),
                TokenType::ObjectEnd => {}
                _ => return Err(report(ParseErrorKind::ExpectedObjectFirst, lex)),
            },
            NonTerm::MoreKeyPairs => match token {
                TokenType::Comma => {
                    self.push_pair();
                    self.stack.push(Symbol::Tok(TokenType::Comma));
                }
                TokenType::ObjectEnd => {}
                _ => return Err(report(ParseErrorKind::ExpectedObjectNext, lex)),
            },
            NonTerm::ArrayElements => match token {
                TokenType::ArrayEnd => {}
                t if starts_value(t) => self.push_element(),
                _ => return Err(report(ParseErrorKind::ExpectedArrayFirst, lex)),
            },
            NonTerm::MoreArrayElements => match token {
                TokenType::Comma => {
                    self.push_element();
                    self.stack.push(Symbol::Tok(TokenType::Comma));
                }
                TokenType::ArrayEnd => {}
                _ => return Err(report(ParseErrorKind::ExpectedArrayNext, lex)),
            },
        }
        Ok(())
    }

    fn push_pair(&mut self) {
        self.stack.extend([
            Symbol::Nt(NonTerm::MoreKeyPairs),
            Symbol::Sem(Marker::FieldFinish),
            Symbol::Nt(NonTerm::Json),
            Symbol::Sem(Marker::FieldBegin),
            Symbol::Tok(TokenType::Colon),
            Symbol::Sem(Marker::FieldName),
        ]);
    }

    fn push_element(&mut self) {
        self.stack.extend([
            Symbol::Nt(NonTerm::MoreArrayElements),
            Symbol::Sem(Marker::ElemFinish),
            Symbol::Nt(NonTerm::Json),
            Symbol::Sem(Marker::ElemBegin),
        ]);
    }

    /// Runs one semantic marker. Returns whether the lookahead token is
    /// still unconsumed afterwards.
    fn run_marker(
        &mut self,
        marker: Marker,
        lex: &mut JsonLexContext<'_>,
        sem: &mut dyn SemanticActions,
        have: bool,
    ) -> Result<bool> {
        match marker {
            Marker::ObjectBegin => {
                self.depth += 1;
                sem.object_start()?;
                Ok(have)
            }
            Marker::ObjectFinish => {
                self.depth -= 1;
                sem.object_end()?;
                Ok(have)
            }
            Marker::ArrayBegin => {
                self.depth += 1;
                sem.array_start()?;
                Ok(have)
            }
            Marker::ArrayFinish => {
                self.depth -= 1;
                sem.array_end()?;
                Ok(have)
            }
            Marker::FieldName => {
                if lex.token_type != TokenType::String {
                    return Err(report(ParseErrorKind::ExpectedString, lex));
                }
                self.fields.push(lex.string_value().to_owned());
                Ok(false)
            }
            Marker::FieldBegin => {
                let is_null = lex.token_type == TokenType::Null;
                self.nulls.push(is_null);
                let key = self.fields.last().ok_or(Error::SemActionFailed)?;
                sem.object_field_start(key, is_null)?;
                Ok(have)
            }
            Marker::FieldFinish => {
                let key = self.fields.pop().ok_or(Error::SemActionFailed)?;
                let is_null = self.nulls.pop().ok_or(Error::SemActionFailed)?;
                sem.object_field_end(&key, is_null)?;
                Ok(have)
            }
            Marker::ElemBegin => {
                let is_null = lex.token_type == TokenType::Null;
                self.nulls.push(is_null);
                sem.array_element_start(is_null)?;
                Ok(have)
            }
            Marker::ElemFinish => {
                let is_null = self.nulls.pop().ok_or(Error::SemActionFailed)?;
                sem.array_element_end(is_null)?;
                Ok(have)
            }
            Marker::ScalarEmit => {
                match lex.token_type {
                    TokenType::String => sem.scalar(lex.string_value(), TokenType::String)?,
                    TokenType::Number
                    | TokenType::True
                    | TokenType::False
                    | TokenType::Null => {
                        let text = std::str::from_utf8(lex.token_text())?;
                        sem.scalar(text, lex.token_type)?;
                    }
                    _ => return Err(report(ParseErrorKind::ExpectedJson, lex)),
                }
                Ok(false)
            }
        }
    }
}
