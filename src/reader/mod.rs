//! Module for reading JSON data
//!
//! [`JsonStreamReader`] is a forward-only reader which pulls JSON tokens from a
//! [`CharSource`]. It offers a token-level API ([`peek_token`](JsonStreamReader::peek_token),
//! [`expect`](JsonStreamReader::expect)), scalar readers such as
//! [`read_string`](JsonStreamReader::read_string) and callback-driven traversal of
//! JSON arrays and objects.

use std::fmt::{Display, Formatter};

use thiserror::Error;

mod source;
mod stream_reader;
mod typed;

pub use source::*;
// Re-export streaming implementation under `reader` module
pub use stream_reader::*;

type IoError = std::io::Error;

/// Kind of a JSON token
///
/// A token is the smallest classified unit of JSON syntax: punctuation, a literal, or the
/// start of a string or number.
#[derive(PartialEq, Eq, Clone, Copy, strum::Display, Debug)]
pub enum TokenKind {
    /// No token has been classified yet, or the previously classified token has been consumed
    None,
    /// `{`
    ObjectOpen,
    /// `}`
    ObjectClose,
    /// `[`
    ArrayOpen,
    /// `]`
    ArrayClose,
    /// `:`
    Colon,
    /// `,`
    Comma,
    /// Start of a JSON string value, for example `"text in \"quotes\""`
    String,
    /// Start of a JSON number value, for example `123.4e+10`
    Number,
    /// `true`
    True,
    /// `false`
    False,
    /// `null`
    Null,
}

impl TokenKind {
    /// Whether this token starts a JSON value
    pub fn is_value_start(self) -> bool {
        matches!(
            self,
            TokenKind::ObjectOpen
                | TokenKind::ArrayOpen
                | TokenKind::String
                | TokenKind::Number
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
        )
    }
}

/// Describes what the reader expected when it encountered an unexpected token
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Expected {
    /// A token of a specific kind
    Token(TokenKind),
    /// The start of any JSON value
    Value,
    /// `true` or `false`
    Boolean,
    /// A comma (`,`) or the given closing bracket
    CommaOr(TokenKind),
    /// The end of the input, optionally preceded by whitespace
    EndOfInput,
}

impl Display for Expected {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Expected::Token(kind) => write!(f, "{kind}"),
            Expected::Value => write!(f, "value"),
            Expected::Boolean => write!(f, "True or False"),
            Expected::CommaOr(kind) => write!(f, "Comma or {kind}"),
            Expected::EndOfInput => write!(f, "end of input"),
        }
    }
}

/// Result of a property switch, see [`JsonStreamReader::read_object`]
#[derive(PartialEq, Eq, Clone, Copy, strum::Display, Debug)]
pub enum PropertyStatus {
    /// The property was recognized and its value has been consumed
    Handled,
    /// The property name is not known; reading the object fails with
    /// [`ReaderError::UnrecognizedProperty`]
    Unrecognized,
}

/// Error which occurred while reading from a JSON reader
///
/// All errors are terminal: once a method returned an error, processing the JSON document
/// must be aborted and the reader must not be used anymore.
///
/// Every error carries the `position` (starting at 0) of the character which caused it. For
/// errors caused by a premature end of the input the position is the number of characters
/// which were consumed.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ReaderError {
    /// The input ended in the middle of a token or before a value was complete
    #[error("unexpected end of input at position {position}")]
    UnexpectedEndOfInput {
        /// Position where the end of the input was reached
        position: u64,
    },
    /// A character which cannot start any token was encountered
    #[error("unexpected character {character:?} at position {position}")]
    UnexpectedCharacter {
        /// The unexpected character
        character: char,
        /// Position of the unexpected character
        position: u64,
    },
    /// A token did not fit the JSON grammar at the current state
    #[error("expected {expected} but got {actual} at position {position}")]
    UnexpectedToken {
        /// What the reader expected
        expected: Expected,
        /// Kind of the token which was encountered instead
        actual: TokenKind,
        /// Position where the unexpected token starts
        position: u64,
    },
    /// `t`, `f` or `n` was not followed by the rest of `true`, `false` or `null`
    #[error("malformed literal at position {position}")]
    MalformedLiteral {
        /// Position of the first mismatching character
        position: u64,
    },
    /// An unknown escape sequence, or malformed `\uXXXX` escape sequence was encountered
    #[error("malformed escape sequence '{sequence}' at position {position}")]
    MalformedEscape {
        /// The part of the escape sequence which has been read, without the leading `\`
        sequence: String,
        /// Position of the offending character
        position: u64,
    },
    /// A JSON number is malformed or cannot be represented by the requested number type
    #[error("malformed number '{text}' at position {position}")]
    MalformedNumber {
        /// The number text which has been read
        text: String,
        /// Position of a character which must not follow a number, otherwise the
        /// position where the number starts
        position: u64,
    },
    /// A string value is not a GUID in the canonical hyphenated form
    #[error("malformed GUID '{text}' at position {position}")]
    MalformedGuid {
        /// The string value
        text: String,
        /// Position where the string value starts
        position: u64,
    },
    /// A string value is not a valid date, time or duration representation
    #[error("malformed temporal value '{text}' at position {position}")]
    MalformedTemporalValue {
        /// The string value
        text: String,
        /// Position where the string value starts
        position: u64,
    },
    /// A property switch did not recognize the name of an object property
    #[error("unrecognized property '{name}' at position {position}")]
    UnrecognizedProperty {
        /// Name of the property
        name: String,
        /// Position where the property name starts
        position: u64,
    },
    /// Arrays and objects are nested deeper than [`ReaderSettings::max_nesting_depth`] allows
    #[error("maximum nesting depth {max_depth} exceeded at position {position}")]
    MaxNestingDepthExceeded {
        /// The configured maximum nesting depth
        max_depth: u32,
        /// Position of the opening bracket which exceeded the limit
        position: u64,
    },
    /// An IO error occurred while reading from the underlying source, or malformed
    /// UTF-8 data was encountered
    #[error("IO error '{error}' at (roughly) position {position}")]
    Io {
        /// The IO error which occurred
        error: IoError,
        /// Number of characters consumed before the error occurred
        position: u64,
    },
}

impl ReaderError {
    /// Gets the position at which this error occurred
    pub fn position(&self) -> u64 {
        match self {
            ReaderError::UnexpectedEndOfInput { position }
            | ReaderError::UnexpectedCharacter { position, .. }
            | ReaderError::UnexpectedToken { position, .. }
            | ReaderError::MalformedLiteral { position }
            | ReaderError::MalformedEscape { position, .. }
            | ReaderError::MalformedNumber { position, .. }
            | ReaderError::MalformedGuid { position, .. }
            | ReaderError::MalformedTemporalValue { position, .. }
            | ReaderError::UnrecognizedProperty { position, .. }
            | ReaderError::MaxNestingDepthExceeded { position, .. }
            | ReaderError::Io { position, .. } => *position,
        }
    }
}

/// Settings to customize the JSON reader behavior
///
/// These settings are used by [`JsonStreamReader::new_custom`]. To avoid repeating the
/// default values for unchanged settings `..Default::default()` can be used:
/// ```
/// # use pulson::reader::ReaderSettings;
/// ReaderSettings {
///     max_nesting_depth: Some(16),
///     // For all other settings use the default
///     ..Default::default()
/// }
/// # ;
/// ```
#[derive(Clone, Debug)]
pub struct ReaderSettings {
    /// Maximum nesting depth of JSON arrays and objects
    ///
    /// Reading arrays and objects with [`JsonStreamReader::read_array`] and
    /// [`JsonStreamReader::read_object`] calls the provided callbacks recursively, so
    /// deeply nested JSON data could overflow the stack. When the limit is exceeded a
    /// [`ReaderError::MaxNestingDepthExceeded`] is returned. The limit also applies to
    /// skipping values, even though skipping does not recurse.
    ///
    /// `None` disables the limit; this should only be done for trusted JSON data.
    pub max_nesting_depth: Option<u32>,

    /// Whether to replace unpaired UTF-16 surrogate escape sequences with U+FFFD
    ///
    /// A `\uXXXX` escape sequence for a high surrogate followed by one for a low surrogate is
    /// always combined into a single char. An escaped surrogate without its counterpart, for
    /// example `"\uD800"`, cannot be represented in a Rust string. By default such unpaired
    /// surrogates cause a [`ReaderError::MalformedEscape`]; when this setting is enabled they
    /// are replaced with the Unicode replacement character U+FFFD instead.
    pub replace_lone_surrogates: bool,
}

impl Default for ReaderSettings {
    /// Creates the default JSON reader settings
    ///
    /// - max nesting depth: 128
    /// - replace lone surrogates: disabled
    fn default() -> Self {
        ReaderSettings {
            max_nesting_depth: Some(128),
            replace_lone_surrogates: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            "expected ArrayOpen but got Number at position 3",
            ReaderError::UnexpectedToken {
                expected: Expected::Token(TokenKind::ArrayOpen),
                actual: TokenKind::Number,
                position: 3,
            }
            .to_string()
        );
        assert_eq!(
            "expected Comma or ArrayClose but got True at position 8",
            ReaderError::UnexpectedToken {
                expected: Expected::CommaOr(TokenKind::ArrayClose),
                actual: TokenKind::True,
                position: 8,
            }
            .to_string()
        );
        assert_eq!(
            "malformed escape sequence 'u12g' at position 5",
            ReaderError::MalformedEscape {
                sequence: "u12g".to_owned(),
                position: 5,
            }
            .to_string()
        );
        assert_eq!(
            "unexpected character '#' at position 0",
            ReaderError::UnexpectedCharacter {
                character: '#',
                position: 0,
            }
            .to_string()
        );
    }

    #[test]
    fn error_position() {
        assert_eq!(
            7,
            ReaderError::UnexpectedEndOfInput { position: 7 }.position()
        );
        assert_eq!(
            2,
            ReaderError::Io {
                error: IoError::new(std::io::ErrorKind::Other, "custom"),
                position: 2,
            }
            .position()
        );
    }

    #[test]
    fn value_start() {
        assert!(TokenKind::Null.is_value_start());
        assert!(TokenKind::ArrayOpen.is_value_start());
        assert!(!TokenKind::ArrayClose.is_value_start());
        assert!(!TokenKind::Comma.is_value_start());
        assert!(!TokenKind::None.is_value_start());
    }
}
