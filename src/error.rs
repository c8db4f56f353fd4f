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

use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;

pub type Result<T> = std::result::Result<T, Error>;

/// Position of a syntax error in the input text.
///
/// `offset` counts bytes from the start of the whole document, across chunk
/// boundaries in incremental mode. `line` and `column` are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

/// The specific way a piece of JSON text failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The bytes at the error position form no JSON token at all.
    InvalidToken,
    /// The text ended while more tokens were required.
    ExpectedMore,
    /// A complete value was followed by trailing tokens.
    ExpectedEnd,
    /// A value was required but another token was found.
    ExpectedJson,
    /// An object key position held a non-string token.
    ExpectedString,
    /// The token after an object key was not `:`.
    ExpectedColon,
    /// The token after `[` was neither a value nor `]`.
    ExpectedArrayFirst,
    /// The token after an array element was neither `,` nor `]`.
    ExpectedArrayNext,
    /// The token after `{` was neither a string nor `}`.
    ExpectedObjectFirst,
    /// The token after an object member was neither `,` nor `}`.
    ExpectedObjectNext,
    /// A backslash escape used an unknown escape character.
    EscapingInvalid,
    /// A control character appeared unescaped inside a string.
    EscapingRequired,
    /// `\u` was not followed by four hex digits.
    UnicodeEscapeFormat,
    /// A high surrogate was followed by something other than a low surrogate.
    UnicodeHighSurrogate,
    /// A low surrogate appeared without a preceding high surrogate.
    UnicodeLowSurrogate,
    /// `\u0000` cannot be represented in text output.
    UnicodeCodePointZero,
    /// An escaped code point has no representation in the target encoding.
    UnicodeUntranslatable,
    /// `\uXXXX` above U+007F cannot be decoded for non-UTF8 input.
    UnicodeHighEscape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed JSON text, with the failure position.
    Syntax(ParseErrorKind, Location),
    /// Object or array nesting exceeded the hard depth limit.
    NestingTooDeep,
    /// A duplicate object key was rejected under `unique_keys`.
    DuplicateKey(String),
    /// A string, number or container payload overflowed the 28-bit
    /// length field of the binary format.
    LimitExceeded,
    /// A semantic action callback asked to abort the parse.
    SemActionFailed,
    /// A lexer built for one-shot input was fed to the chunked parser,
    /// or the other way round.
    InvalidLexerType,
    /// The binary container bytes are structurally broken.
    InvalidJsonb,
    /// Decoded string bytes were not valid UTF-8.
    InvalidUtf8,
    Message(String),
}

impl ParseErrorKind {
    /// Whether the detail message wants the offending token quoted.
    pub(crate) fn wants_token(&self) -> bool {
        !matches!(
            self,
            ParseErrorKind::ExpectedMore
                | ParseErrorKind::EscapingRequired
                | ParseErrorKind::UnicodeEscapeFormat
                | ParseErrorKind::UnicodeHighSurrogate
                | ParseErrorKind::UnicodeLowSurrogate
                | ParseErrorKind::UnicodeCodePointZero
                | ParseErrorKind::UnicodeUntranslatable
                | ParseErrorKind::UnicodeHighEscape
        )
    }

    pub(crate) fn message(&self, token: &str) -> String {
        match self {
            ParseErrorKind::InvalidToken => format!("Token {token:?} is invalid."),
            ParseErrorKind::ExpectedMore => "The input string ended unexpectedly.".to_string(),
            ParseErrorKind::ExpectedEnd => {
                format!("Expected end of input, but found {token:?}.")
            }
            ParseErrorKind::ExpectedJson => {
                format!("Expected JSON value, but found {token:?}.")
            }
            ParseErrorKind::ExpectedString => {
                format!("Expected string, but found {token:?}.")
            }
            ParseErrorKind::ExpectedColon => {
                format!("Expected \":\", but found {token:?}.")
            }
            ParseErrorKind::ExpectedArrayFirst => {
                format!("Expected array element or \"]\", but found {token:?}.")
            }
            ParseErrorKind::ExpectedArrayNext => {
                format!("Expected \",\" or \"]\", but found {token:?}.")
            }
            ParseErrorKind::ExpectedObjectFirst => {
                format!("Expected string or \"}}\", but found {token:?}.")
            }
            ParseErrorKind::ExpectedObjectNext => {
                format!("Expected \",\" or \"}}\", but found {token:?}.")
            }
            ParseErrorKind::EscapingInvalid => {
                format!("Escape sequence {token:?} is invalid.")
            }
            ParseErrorKind::EscapingRequired => {
                "Character with value 0x00-0x1f must be escaped.".to_string()
            }
            ParseErrorKind::UnicodeEscapeFormat => {
                "\"\\u\" must be followed by four hexadecimal digits.".to_string()
            }
            ParseErrorKind::UnicodeHighSurrogate => {
                "Unicode high surrogate must not follow a high surrogate.".to_string()
            }
            ParseErrorKind::UnicodeLowSurrogate => {
                "Unicode low surrogate must follow a high surrogate.".to_string()
            }
            ParseErrorKind::UnicodeCodePointZero => {
                "\\u0000 cannot be converted to text.".to_string()
            }
            ParseErrorKind::UnicodeUntranslatable => {
                "Unicode escape value could not be translated to the server's encoding."
                    .to_string()
            }
            ParseErrorKind::UnicodeHighEscape => {
                "Unicode escape values cannot be used for code point values above 007F when the encoding is not UTF8.".to_string()
            }
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::Syntax(kind, loc) => write!(
                f,
                "{} at line {} column {}",
                kind.message(""),
                loc.line,
                loc.column
            ),
            Error::NestingTooDeep => write!(f, "JSON is nested too deeply"),
            Error::DuplicateKey(key) => write!(f, "duplicate object key {key:?}"),
            Error::LimitExceeded => write!(f, "value too large for the binary format"),
            Error::SemActionFailed => write!(f, "semantic action callback failed"),
            Error::InvalidLexerType => write!(f, "lexer mode does not match the parser"),
            Error::InvalidJsonb => write!(f, "invalid jsonb binary data"),
            Error::InvalidUtf8 => write!(f, "invalid UTF-8 in string value"),
            Error::Message(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::str::Utf8Error> for Error {
    fn from(_: std::str::Utf8Error) -> Error {
        Error::InvalidUtf8
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(_: std::string::FromUtf8Error) -> Error {
        Error::InvalidUtf8
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Error {
        Error::Message(error.to_string())
    }
}
