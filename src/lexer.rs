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

//! JSON tokenizer with optional chunked input.
//!
//! In incremental mode a token cut off by the end of a chunk is stashed in
//! a partial-token buffer, completed out of the next chunk, and then
//! re-lexed as a whole. Everything downstream only ever sees complete
//! tokens.

use crate::error::Error;
use crate::error::Location;
use crate::error::ParseErrorKind;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenType {
    ObjectStart,
    ObjectEnd,
    ArrayStart,
    ArrayEnd,
    Comma,
    Colon,
    String,
    Number,
    True,
    False,
    Null,
    #[default]
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LexStatus {
    /// A complete token is available (possibly `TokenType::End`).
    Token,
    /// The chunk ended mid-token or between tokens; feed more input.
    Incomplete,
}

enum Scanned {
    Fin { end: usize },
    More,
}

enum NumScan {
    Fin { end: usize },
    Junk { end: usize },
    More,
}

/// Lexer state that survives across chunks in incremental mode.
#[derive(Debug, Default)]
pub(crate) struct LexPersist {
    need_escapes: bool,
    input_is_utf8: bool,
    token_type: TokenType,
    strval: String,
    partial: Vec<u8>,
    partial_escaped: bool,
    partial_completed: bool,
    token_in_partial: bool,
    partial_start_global: usize,
    line_number: usize,
    line_start_global: usize,
    offset_base: usize,
    detail_token: Option<String>,
}

impl LexPersist {
    pub(crate) fn new(need_escapes: bool) -> LexPersist {
        LexPersist {
            need_escapes,
            input_is_utf8: true,
            line_number: 1,
            ..Default::default()
        }
    }
}

/// A lexer positioned over one input buffer.
///
/// For one-shot parsing the buffer is the whole document; in incremental
/// mode it is the current chunk and the persistent state travels through
/// [`LexPersist`].
pub struct JsonLexContext<'a> {
    input: &'a [u8],
    is_last: bool,
    incremental: bool,
    need_escapes: bool,
    input_is_utf8: bool,
    pub(crate) token_type: TokenType,
    token_start: usize,
    pub(crate) token_terminator: usize,
    prev_token_terminator: usize,
    strval: String,
    partial: Vec<u8>,
    partial_escaped: bool,
    partial_completed: bool,
    token_in_partial: bool,
    partial_start_global: usize,
    line_number: usize,
    line_start_global: usize,
    offset_base: usize,
    detail_token: Option<String>,
}

impl<'a> JsonLexContext<'a> {
    /// One-shot lexer over a complete document.
    ///
    /// `need_escapes` asks for string tokens to be decoded into an owned
    /// buffer; pure validation can leave it off and skip the copies.
    pub fn new(input: &'a [u8], need_escapes: bool) -> JsonLexContext<'a> {
        Self::resume(LexPersist::new(need_escapes), input, true, false)
    }

    /// One-shot lexer for input in an encoding other than UTF-8, where
    /// `\uXXXX` escapes above U+007F cannot be decoded.
    pub fn new_with_encoding(
        input: &'a [u8],
        need_escapes: bool,
        input_is_utf8: bool,
    ) -> JsonLexContext<'a> {
        let mut persist = LexPersist::new(need_escapes);
        persist.input_is_utf8 = input_is_utf8;
        Self::resume(persist, input, true, false)
    }

    pub(crate) fn resume(
        persist: LexPersist,
        chunk: &'a [u8],
        is_last: bool,
        incremental: bool,
    ) -> JsonLexContext<'a> {
        JsonLexContext {
            input: chunk,
            is_last,
            incremental,
            need_escapes: persist.need_escapes,
            input_is_utf8: persist.input_is_utf8,
            token_type: persist.token_type,
            token_start: 0,
            token_terminator: 0,
            prev_token_terminator: 0,
            strval: persist.strval,
            partial: persist.partial,
            partial_escaped: persist.partial_escaped,
            partial_completed: persist.partial_completed,
            token_in_partial: persist.token_in_partial,
            partial_start_global: persist.partial_start_global,
            line_number: persist.line_number,
            line_start_global: persist.line_start_global,
            offset_base: persist.offset_base,
            detail_token: persist.detail_token,
        }
    }

    pub(crate) fn suspend(self) -> LexPersist {
        LexPersist {
            need_escapes: self.need_escapes,
            input_is_utf8: self.input_is_utf8,
            token_type: self.token_type,
            strval: self.strval,
            partial: self.partial,
            partial_escaped: self.partial_escaped,
            partial_completed: self.partial_completed,
            token_in_partial: self.token_in_partial,
            partial_start_global: self.partial_start_global,
            line_number: self.line_number,
            line_start_global: self.line_start_global,
            offset_base: self.offset_base + self.input.len(),
            detail_token: self.detail_token,
        }
    }

    pub(crate) fn is_incremental(&self) -> bool {
        self.incremental
    }

    /// The raw text of the current token.
    pub(crate) fn token_text(&self) -> &[u8] {
        if self.token_in_partial {
            &self.partial
        } else if self.token_start <= self.token_terminator
            && self.token_terminator <= self.input.len()
        {
            &self.input[self.token_start..self.token_terminator]
        } else {
            &[]
        }
    }

    /// Decoded content of the current string token. Only meaningful when
    /// the lexer was built with `need_escapes`.
    pub(crate) fn string_value(&self) -> &str {
        &self.strval
    }

    /// Human-readable detail for a parse failure, quoting the offending
    /// token the way the error position alone cannot.
    pub fn errdetail(&self, err: &Error) -> String {
        match err {
            Error::Syntax(kind, _) if kind.wants_token() => {
                let token = match &self.detail_token {
                    Some(t) => t.clone(),
                    None => String::from_utf8_lossy(self.token_text()).into_owned(),
                };
                kind.message(&token)
            }
            Error::Syntax(kind, _) => kind.message(""),
            other => other.to_string(),
        }
    }

    fn loc(&self, global_offset: usize) -> Location {
        Location {
            offset: global_offset,
            line: self.line_number,
            column: global_offset.saturating_sub(self.line_start_global) + 1,
        }
    }

    pub(crate) fn token_location(&self) -> Location {
        if self.token_in_partial {
            self.loc(self.partial_start_global)
        } else {
            self.loc(self.offset_base + self.token_start)
        }
    }

    fn syntax(&self, kind: ParseErrorKind, global_offset: usize) -> Error {
        Error::Syntax(kind, self.loc(global_offset))
    }

    /// Advances to the next token.
    ///
    /// `Incomplete` is only ever returned in incremental mode before the
    /// last chunk; the stashed bytes are picked up by the next call.
    pub(crate) fn next_token(&mut self) -> Result<LexStatus> {
        if self.partial_completed {
            self.partial.clear();
            self.partial_completed = false;
            self.token_in_partial = false;
        }
        self.detail_token = None;
        if self.incremental && !self.partial.is_empty() {
            return self.complete_partial_token();
        }
        self.lex_from(self.token_terminator)
    }

    fn lex_from(&mut self, start: usize) -> Result<LexStatus> {
        let input = self.input;
        let mut pos = start;
        while pos < input.len() && matches!(input[pos], b' ' | b'\t' | b'\n' | b'\r') {
            if input[pos] == b'\n' {
                self.line_number += 1;
                self.line_start_global = self.offset_base + pos + 1;
            }
            pos += 1;
        }
        self.prev_token_terminator = self.token_terminator;
        self.token_start = pos;
        self.token_in_partial = false;
        if pos >= input.len() {
            self.token_type = TokenType::End;
            self.token_terminator = pos;
            if self.incremental && !self.is_last {
                return Ok(LexStatus::Incomplete);
            }
            return Ok(LexStatus::Token);
        }
        match input[pos] {
            b'{' => self.punct(TokenType::ObjectStart, pos),
            b'}' => self.punct(TokenType::ObjectEnd, pos),
            b'[' => self.punct(TokenType::ArrayStart, pos),
            b']' => self.punct(TokenType::ArrayEnd, pos),
            b',' => self.punct(TokenType::Comma, pos),
            b':' => self.punct(TokenType::Colon, pos),
            b'"' => {
                let is_final = !self.incremental || self.is_last;
                match self.scan_string(input, pos, is_final, self.offset_base) {
                    Ok(Scanned::Fin { end }) => {
                        self.token_type = TokenType::String;
                        self.token_terminator = end;
                        Ok(LexStatus::Token)
                    }
                    Ok(Scanned::More) => self.stash_partial(pos),
                    Err(err) => {
                        self.token_terminator = input.len();
                        Err(err)
                    }
                }
            }
            b'-' | b'0'..=b'9' => {
                let is_final = !self.incremental || self.is_last;
                match scan_number(input, pos, is_final) {
                    NumScan::Fin { end } => {
                        self.token_type = TokenType::Number;
                        self.token_terminator = end;
                        Ok(LexStatus::Token)
                    }
                    NumScan::Junk { end } => {
                        self.token_terminator = end;
                        Err(self.syntax(ParseErrorKind::InvalidToken, self.offset_base + pos))
                    }
                    NumScan::More => self.stash_partial(pos),
                }
            }
            _ => {
                let run = keyword_run(input, pos);
                if run == pos {
                    self.token_terminator = pos + 1;
                    return Err(self.syntax(ParseErrorKind::InvalidToken, self.offset_base + pos));
                }
                if run == input.len() && self.incremental && !self.is_last {
                    return self.stash_partial(pos);
                }
                self.token_terminator = run;
                self.classify_keyword(&input[pos..run], self.offset_base + pos)?;
                Ok(LexStatus::Token)
            }
        }
    }

    fn punct(&mut self, ttype: TokenType, pos: usize) -> Result<LexStatus> {
        self.token_type = ttype;
        self.token_terminator = pos + 1;
        Ok(LexStatus::Token)
    }

    fn classify_keyword(&mut self, word: &[u8], global_offset: usize) -> Result<()> {
        self.token_type = match word {
            b"true" => TokenType::True,
            b"false" => TokenType::False,
            b"null" => TokenType::Null,
            _ => return Err(self.syntax(ParseErrorKind::InvalidToken, global_offset)),
        };
        Ok(())
    }

    fn stash_partial(&mut self, token_start: usize) -> Result<LexStatus> {
        self.partial.clear();
        self.partial.extend_from_slice(&self.input[token_start..]);
        self.partial_escaped = trailing_backslash_parity(&self.partial);
        self.partial_start_global = self.offset_base + token_start;
        self.token_start = token_start;
        self.token_terminator = self.input.len();
        Ok(LexStatus::Incomplete)
    }

    /// Finishes the token stashed at the end of the previous chunk by
    /// pulling its remaining bytes out of the current one, then re-lexes
    /// the assembled token as a whole.
    fn complete_partial_token(&mut self) -> Result<LexStatus> {
        let input = self.input;
        let consumed = match self.partial[0] {
            b'"' => {
                let mut escaped = self.partial_escaped;
                let mut close = None;
                for (i, b) in input.iter().enumerate() {
                    if escaped {
                        escaped = false;
                    } else if *b == b'\\' {
                        escaped = true;
                    } else if *b == b'"' {
                        close = Some(i);
                        break;
                    }
                }
                match close {
                    Some(i) => {
                        self.partial.extend_from_slice(&input[..=i]);
                        i + 1
                    }
                    None => {
                        self.partial.extend_from_slice(input);
                        self.partial_escaped = escaped;
                        self.token_terminator = input.len();
                        if !self.is_last {
                            return Ok(LexStatus::Incomplete);
                        }
                        input.len()
                    }
                }
            }
            b'-' | b'0'..=b'9' => {
                let n = input
                    .iter()
                    .take_while(|b| matches!(**b, b'+' | b'-' | b'e' | b'E' | b'.' | b'0'..=b'9'))
                    .count();
                self.partial.extend_from_slice(&input[..n]);
                if n == input.len() && !self.is_last {
                    self.token_terminator = n;
                    return Ok(LexStatus::Incomplete);
                }
                n
            }
            _ => {
                let n = input.iter().take_while(|b| is_json_alphanumeric(**b)).count();
                self.partial.extend_from_slice(&input[..n]);
                if n == input.len() && !self.is_last {
                    self.token_terminator = n;
                    return Ok(LexStatus::Incomplete);
                }
                n
            }
        };
        self.token_start = 0;
        self.token_terminator = consumed;
        self.relex_partial()
    }

    fn relex_partial(&mut self) -> Result<LexStatus> {
        let partial = std::mem::take(&mut self.partial);
        let result = self.lex_whole(&partial);
        self.partial = partial;
        self.partial_completed = true;
        self.token_in_partial = true;
        result?;
        Ok(LexStatus::Token)
    }

    /// Lexes a buffer that must hold exactly one complete token.
    fn lex_whole(&mut self, buf: &[u8]) -> Result<()> {
        let base = self.partial_start_global;
        match buf[0] {
            b'"' => match self.scan_string(buf, 0, true, base)? {
                Scanned::Fin { end } if end == buf.len() => {
                    self.token_type = TokenType::String;
                    Ok(())
                }
                _ => Err(self.syntax(ParseErrorKind::InvalidToken, base)),
            },
            b'-' | b'0'..=b'9' => match scan_number(buf, 0, true) {
                NumScan::Fin { end } if end == buf.len() => {
                    self.token_type = TokenType::Number;
                    Ok(())
                }
                _ => Err(self.syntax(ParseErrorKind::InvalidToken, base)),
            },
            _ => self.classify_keyword(buf, base),
        }
    }

    fn scan_string(
        &mut self,
        buf: &[u8],
        start: usize,
        is_final: bool,
        base: usize,
    ) -> Result<Scanned> {
        if self.need_escapes {
            self.strval.clear();
        }
        let mut pos = start + 1;
        let mut hi_surrogate: Option<u32> = None;
        loop {
            let special = find_string_special(&buf[pos..]);
            if special.is_none() && !is_final {
                // the chunk may end in the middle of a multi-byte character,
                // so nothing is decoded until the token is complete
                return Ok(Scanned::More);
            }
            let lit_end = pos + special.unwrap_or(buf.len() - pos);
            if lit_end > pos {
                if hi_surrogate.is_some() {
                    return Err(self.syntax(ParseErrorKind::UnicodeLowSurrogate, base + pos));
                }
                if self.need_escapes {
                    let segment = std::str::from_utf8(&buf[pos..lit_end])?;
                    self.strval.push_str(segment);
                }
                pos = lit_end;
            }
            if special.is_none() {
                return Err(self.syntax(ParseErrorKind::InvalidToken, base + start));
            }
            match buf[pos] {
                b'"' => {
                    if hi_surrogate.is_some() {
                        return Err(self.syntax(ParseErrorKind::UnicodeLowSurrogate, base + pos));
                    }
                    return Ok(Scanned::Fin { end: pos + 1 });
                }
                b'\\' => {
                    let Some(&esc) = buf.get(pos + 1) else {
                        if !is_final {
                            return Ok(Scanned::More);
                        }
                        return Err(self.syntax(ParseErrorKind::InvalidToken, base + start));
                    };
                    if esc == b'u' {
                        let mut code_point: u32 = 0;
                        for k in 0..4 {
                            let Some(&h) = buf.get(pos + 2 + k) else {
                                if !is_final {
                                    return Ok(Scanned::More);
                                }
                                return Err(
                                    self.syntax(ParseErrorKind::InvalidToken, base + start)
                                );
                            };
                            let Some(v) = hex_value(h) else {
                                return Err(self.syntax(
                                    ParseErrorKind::UnicodeEscapeFormat,
                                    base + pos,
                                ));
                            };
                            code_point = code_point << 4 | v;
                        }
                        if (0xD800..0xDC00).contains(&code_point) {
                            if hi_surrogate.is_some() {
                                return Err(self.syntax(
                                    ParseErrorKind::UnicodeHighSurrogate,
                                    base + pos,
                                ));
                            }
                            hi_surrogate = Some(code_point);
                        } else if (0xDC00..0xE000).contains(&code_point) {
                            match hi_surrogate.take() {
                                Some(hi) => {
                                    let combined =
                                        0x10000 + ((hi - 0xD800) << 10) + (code_point - 0xDC00);
                                    self.push_code_point(combined, base + pos)?;
                                }
                                None => {
                                    return Err(self.syntax(
                                        ParseErrorKind::UnicodeLowSurrogate,
                                        base + pos,
                                    ))
                                }
                            }
                        } else {
                            if hi_surrogate.is_some() {
                                return Err(self.syntax(
                                    ParseErrorKind::UnicodeLowSurrogate,
                                    base + pos,
                                ));
                            }
                            self.push_code_point(code_point, base + pos)?;
                        }
                        pos += 6;
                    } else {
                        if hi_surrogate.is_some() {
                            return Err(
                                self.syntax(ParseErrorKind::UnicodeLowSurrogate, base + pos)
                            );
                        }
                        let decoded = match esc {
                            b'"' => '"',
                            b'\\' => '\\',
                            b'/' => '/',
                            b'b' => '\u{0008}',
                            b'f' => '\u{000C}',
                            b'n' => '\n',
                            b'r' => '\r',
                            b't' => '\t',
                            _ => {
                                self.detail_token = Some(format!("\\{}", esc as char));
                                return Err(self.syntax(
                                    ParseErrorKind::EscapingInvalid,
                                    base + pos,
                                ));
                            }
                        };
                        if self.need_escapes {
                            self.strval.push(decoded);
                        }
                        pos += 2;
                    }
                }
                _ => {
                    // a bare control character
                    return Err(self.syntax(ParseErrorKind::EscapingRequired, base + pos));
                }
            }
        }
    }

    fn push_code_point(&mut self, code_point: u32, at: usize) -> Result<()> {
        if !self.need_escapes {
            return Ok(());
        }
        if code_point == 0 {
            return Err(self.syntax(ParseErrorKind::UnicodeCodePointZero, at));
        }
        if code_point > 0x7F && !self.input_is_utf8 {
            return Err(self.syntax(ParseErrorKind::UnicodeHighEscape, at));
        }
        match char::from_u32(code_point) {
            Some(c) => {
                self.strval.push(c);
                Ok(())
            }
            None => Err(self.syntax(ParseErrorKind::UnicodeUntranslatable, at)),
        }
    }
}

/// Whether a standalone piece of text satisfies the JSON number grammar.
///
/// # Examples
///
/// ```
/// assert!(jsonbx::is_valid_number("-12.5e3"));
/// assert!(!jsonbx::is_valid_number("012"));
/// assert!(!jsonbx::is_valid_number("1."));
/// ```
pub fn is_valid_number(text: &str) -> bool {
    let buf = text.as_bytes();
    if buf.is_empty() {
        return false;
    }
    matches!(scan_number(buf, 0, true), NumScan::Fin { end } if end == buf.len())
}

fn scan_number(buf: &[u8], start: usize, is_final: bool) -> NumScan {
    let mut pos = start;
    let mut error = false;
    if buf.get(pos) == Some(&b'-') {
        pos += 1;
    }
    match buf.get(pos) {
        Some(b'0') => pos += 1,
        Some(b'1'..=b'9') => {
            while buf.get(pos).is_some_and(u8::is_ascii_digit) {
                pos += 1;
            }
        }
        _ => error = true,
    }
    if !error && buf.get(pos) == Some(&b'.') {
        pos += 1;
        if !buf.get(pos).is_some_and(u8::is_ascii_digit) {
            error = true;
        }
        while buf.get(pos).is_some_and(u8::is_ascii_digit) {
            pos += 1;
        }
    }
    if !error && matches!(buf.get(pos), Some(b'e' | b'E')) {
        pos += 1;
        if matches!(buf.get(pos), Some(b'-' | b'+')) {
            pos += 1;
        }
        if !buf.get(pos).is_some_and(u8::is_ascii_digit) {
            error = true;
        }
        while buf.get(pos).is_some_and(u8::is_ascii_digit) {
            pos += 1;
        }
    }
    // A number token must not run straight into an identifier-like run;
    // the whole word is the invalid token then.
    if !error && buf.get(pos).copied().is_some_and(is_json_alphanumeric) {
        error = true;
    }
    if error {
        pos = keyword_run(buf, pos);
    }
    if pos == buf.len() && !is_final {
        // more digits (or junk) may still arrive
        NumScan::More
    } else if error {
        NumScan::Junk { end: pos }
    } else {
        NumScan::Fin { end: pos }
    }
}

pub(crate) fn is_json_alphanumeric(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

fn keyword_run(buf: &[u8], start: usize) -> usize {
    let mut pos = start;
    while buf.get(pos).copied().is_some_and(is_json_alphanumeric) {
        pos += 1;
    }
    pos
}

fn hex_value(b: u8) -> Option<u32> {
    match b {
        b'0'..=b'9' => Some((b - b'0') as u32),
        b'a'..=b'f' => Some((b - b'a' + 10) as u32),
        b'A'..=b'F' => Some((b - b'A' + 10) as u32),
        _ => None,
    }
}

fn trailing_backslash_parity(buf: &[u8]) -> bool {
    buf.iter().rev().take_while(|b| **b == b'\\').count() % 2 == 1
}

const SWAR_ONES: u64 = 0x0101_0101_0101_0101;
const SWAR_HIGHS: u64 = 0x8080_8080_8080_8080;

#[inline]
fn word_eq(word: u64, byte: u8) -> u64 {
    let x = word ^ (SWAR_ONES.wrapping_mul(byte as u64));
    x.wrapping_sub(SWAR_ONES) & !x & SWAR_HIGHS
}

#[inline]
fn word_lt(word: u64, bound: u8) -> u64 {
    word.wrapping_sub(SWAR_ONES.wrapping_mul(bound as u64)) & !word & SWAR_HIGHS
}

/// Position of the first quote, backslash or control byte, scanning 16
/// bytes per step without lookup tables.
fn find_string_special(data: &[u8]) -> Option<usize> {
    let mut i = 0;
    while i + 16 <= data.len() {
        for half in 0..2 {
            let at = i + half * 8;
            let word = u64::from_le_bytes(data[at..at + 8].try_into().unwrap());
            let hits = word_eq(word, b'"') | word_eq(word, b'\\') | word_lt(word, 0x20);
            if hits != 0 {
                return Some(at + (hits.trailing_zeros() / 8) as usize);
            }
        }
        i += 16;
    }
    data[i..]
        .iter()
        .position(|b| *b == b'"' || *b == b'\\' || *b < 0x20)
        .map(|p| i + p)
}
