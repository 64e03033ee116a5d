//! Streaming implementation of the JSON reader

use std::io::Read;

use super::*;
use crate::json_number::is_valid_number;

/// Capacity of the scratch buffer; fits the longest literal suffix (`alse`) and
/// the 4 hex digits of a `\uXXXX` escape sequence
const SCRATCH_LEN: usize = 6;

/// Progress within a JSON array or object
#[derive(PartialEq, Clone, Copy, Debug)]
enum ElementState {
    /// Directly after the opening bracket
    First,
    /// After an item or member value; expecting `,` or the closing bracket
    AfterElement,
    /// After a `,`; expecting the next item or member
    AfterComma,
}

/// Piece of a JSON string value, as decoded by [`JsonStreamReader::read_string_piece`]
enum StringPiece {
    /// The closing `"`
    End,
    Char(char),
    /// UTF-16 code unit of a `\uXXXX` escape sequence, and the position of its `\`
    CodeUnit(u16, u64),
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

/// A forward-only JSON reader which pulls characters from a [`CharSource`]
///
/// The reader holds at most one classified token of lookahead. [`peek_token`](Self::peek_token)
/// classifies the next token without consuming it; the scalar reading methods such as
/// [`read_string`](Self::read_string) or [`read_i64`](Self::read_i64) consume a complete
/// value; [`read_array`](Self::read_array) and [`read_object`](Self::read_object) traverse
/// composite values by calling a caller-supplied function once per array item respectively
/// object property. Such a function must consume exactly one JSON value from the reader,
/// for example by calling a scalar reading method or by recursively calling `read_array`.
///
/// A reader is intended for exactly one top-level value. Once a method has returned an error
/// processing must be aborted; the state of the reader afterwards is unspecified.
///
/// # Examples
/// ```
/// # use pulson::reader::*;
/// let mut json_reader = JsonStreamReader::from_text(r#"{"a": 1, "b": [true, false]}"#);
///
/// let mut a = None;
/// let mut b = Vec::new();
/// json_reader.read_object(|json_reader, name| {
///     match name {
///         "a" => a = Some(json_reader.read_i64()?),
///         "b" => b = json_reader.read_array(|json_reader| json_reader.read_bool())?,
///         _ => return Ok(PropertyStatus::Unrecognized),
///     }
///     Ok(PropertyStatus::Handled)
/// })?;
/// json_reader.consume_trailing_whitespace()?;
///
/// assert_eq!(Some(1), a);
/// assert_eq!(vec![true, false], b);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
///
/// # Security
/// Besides the [nesting depth limit](ReaderSettings::max_nesting_depth) this reader does not
/// implement any security related measures. In particular it does **not**:
///
/// - Impose a limit on the length of the document, of member names and string values, or on
///   the number of array items and object members
/// - Detect duplicate member names
/// - Impose restrictions on the content of member names and string values; they may contain
///   unescaped control characters such as the NULL character (`\0`)
///
/// When processing JSON data from an untrusted source, users of this JSON reader must implement
/// protections against the above mentioned issues themselves.
#[derive(Debug)]
pub struct JsonStreamReader<S: CharSource> {
    source: S,
    /// Kind of the next, not yet consumed token; [`TokenKind::None`] if it has not been classified
    peeked: TokenKind,
    /// Position at which the most recently classified token starts
    token_start: u64,
    /// Number of characters consumed from [`source`](Self::source)
    position: u64,
    /// Used for reading literal suffixes and `\uXXXX` escape sequences
    scratch: [char; SCRATCH_LEN],
    /// First char of a peeked [`TokenKind::Number`]; the rest of the number is read lazily
    pending_first_digit: Option<char>,
    /// Number of arrays and objects currently being read
    depth: u32,
    /// Reused for decoding member names
    name_buf: String,
    /// Reused for number texts and string values which are parsed further
    value_buf: String,
    settings: ReaderSettings,
}

// Implementation with public constructor methods
impl<S: CharSource> JsonStreamReader<S> {
    /// Creates a JSON reader with [default settings](ReaderSettings::default)
    pub fn new(source: S) -> Self {
        JsonStreamReader::new_custom(source, ReaderSettings::default())
    }

    /// Creates a JSON reader with custom settings
    pub fn new_custom(source: S, settings: ReaderSettings) -> Self {
        JsonStreamReader {
            source,
            peeked: TokenKind::None,
            token_start: 0,
            position: 0,
            scratch: ['\0'; SCRATCH_LEN],
            pending_first_digit: None,
            depth: 0,
            name_buf: String::new(),
            value_buf: String::new(),
            settings,
        }
    }

    /// Returns the underlying character source
    pub fn into_inner(self) -> S {
        self.source
    }

    /// Gets the number of characters consumed so far
    ///
    /// This includes the characters of an already classified token, see
    /// [`peek_token`](Self::peek_token).
    pub fn position(&self) -> u64 {
        self.position
    }
}

impl<'a> JsonStreamReader<StrSource<'a>> {
    /// Creates a JSON reader with default settings which reads the characters of `json`
    pub fn from_text(json: &'a str) -> Self {
        JsonStreamReader::new(StrSource::new(json))
    }
}

impl<R: Read> JsonStreamReader<Utf8Source<R>> {
    /// Creates a JSON reader with default settings which reads UTF-8 data from `reader`
    ///
    /// The data must not start with a byte order mark (BOM).
    pub fn from_reader(reader: R) -> Self {
        JsonStreamReader::new(Utf8Source::new(reader))
    }
}

// Implementation with low level char reading methods
impl<S: CharSource> JsonStreamReader<S> {
    fn read_char(&mut self) -> Result<Option<char>, ReaderError> {
        match self.source.read_char() {
            Ok(Some(c)) => {
                self.position += 1;
                Ok(Some(c))
            }
            Ok(None) => Ok(None),
            Err(error) => Err(ReaderError::Io {
                error,
                position: self.position,
            }),
        }
    }

    /// Reads the next char, failing with [`ReaderError::UnexpectedEndOfInput`] if the end of
    /// the input has been reached
    fn read_char_no_eof(&mut self) -> Result<char, ReaderError> {
        match self.read_char()? {
            Some(c) => Ok(c),
            None => Err(self.end_of_input_error()),
        }
    }

    /// Reads up to `len` chars into the scratch buffer; returns how many were read
    fn read_scratch(&mut self, len: usize) -> Result<usize, ReaderError> {
        let count = self
            .source
            .read_chars(&mut self.scratch[..len])
            .map_err(|error| ReaderError::Io {
                error,
                position: self.position,
            })?;
        self.position += count as u64;
        Ok(count)
    }

    /// Position of the char which has been read last
    fn last_char_position(&self) -> u64 {
        debug_assert!(self.position > 0);
        self.position - 1
    }

    fn end_of_input_error(&self) -> ReaderError {
        ReaderError::UnexpectedEndOfInput {
            position: self.position,
        }
    }

    fn unexpected_token_error(&self, expected: Expected, actual: TokenKind) -> ReaderError {
        ReaderError::UnexpectedToken {
            expected,
            actual,
            position: self.token_start,
        }
    }
}

// Implementation with token classification logic
impl<S: CharSource> JsonStreamReader<S> {
    /// Peeks at the kind of the next token, without consuming it
    ///
    /// Whitespace in front of the token is skipped. Calling this method multiple times without
    /// consuming the token in between returns the same kind and does not read any further
    /// characters. The returned kind is never [`TokenKind::None`].
    ///
    /// For the literals `true`, `false` and `null` the complete literal is read and validated;
    /// for all other tokens only their first character is read.
    ///
    /// # Examples
    /// ```
    /// # use pulson::reader::*;
    /// let mut json_reader = JsonStreamReader::from_text("  [1]");
    /// assert_eq!(TokenKind::ArrayOpen, json_reader.peek_token()?);
    /// assert_eq!(3, json_reader.position());
    /// // Peeking again has no effect
    /// assert_eq!(TokenKind::ArrayOpen, json_reader.peek_token()?);
    /// assert_eq!(3, json_reader.position());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn peek_token(&mut self) -> Result<TokenKind, ReaderError> {
        if self.peeked != TokenKind::None {
            return Ok(self.peeked);
        }

        loop {
            match self.read_char()? {
                None => return Err(self.end_of_input_error()),
                Some(c) if is_whitespace(c) => continue,
                Some(c) => return self.classify(c),
            }
        }
    }

    /// Classifies the token starting with the char `c`, which has just been read
    fn classify(&mut self, c: char) -> Result<TokenKind, ReaderError> {
        let token_start = self.last_char_position();
        let kind = match c {
            '"' => TokenKind::String,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '[' => TokenKind::ArrayOpen,
            ']' => TokenKind::ArrayClose,
            '{' => TokenKind::ObjectOpen,
            '}' => TokenKind::ObjectClose,
            'f' => {
                self.match_literal_suffix("alse")?;
                TokenKind::False
            }
            't' => {
                self.match_literal_suffix("rue")?;
                TokenKind::True
            }
            'n' => {
                self.match_literal_suffix("ull")?;
                TokenKind::Null
            }
            '-' | '0'..='9' => {
                // Don't read further; the rest of the number is read by `read_number_body`
                self.pending_first_digit = Some(c);
                TokenKind::Number
            }
            _ => {
                return Err(ReaderError::UnexpectedCharacter {
                    character: c,
                    position: token_start,
                })
            }
        };

        log::trace!("classified {kind} at position {token_start}");
        self.token_start = token_start;
        self.peeked = kind;
        Ok(kind)
    }

    /// Reads the rest of a literal in one go and compares it with `suffix`
    fn match_literal_suffix(&mut self, suffix: &str) -> Result<(), ReaderError> {
        let suffix_start = self.position;
        let read_count = self.read_scratch(suffix.len())?;

        for (index, expected) in suffix.chars().enumerate() {
            // Short read means the input ended within the literal
            if index >= read_count || self.scratch[index] != expected {
                return Err(ReaderError::MalformedLiteral {
                    position: suffix_start + index as u64,
                });
            }
        }
        Ok(())
    }

    fn consume_peeked(&mut self) {
        debug_assert!(self.peeked != TokenKind::None);
        self.peeked = TokenKind::None;
    }

    /// Consumes the peeked token if it has the expected kind
    ///
    /// Unlike [`expect`](Self::expect) this does not read the remainder of string and number tokens.
    fn consume_token(&mut self, kind: TokenKind) -> Result<(), ReaderError> {
        let actual = self.peek_token()?;
        if actual == kind {
            self.consume_peeked();
            Ok(())
        } else {
            Err(self.unexpected_token_error(Expected::Token(kind), actual))
        }
    }
}

// Implementation with public token-level methods
impl<S: CharSource> JsonStreamReader<S> {
    /// Consumes the next token if it is of the given kind
    ///
    /// Fails with [`ReaderError::UnexpectedToken`] if the next token has a different kind.
    /// For [`TokenKind::String`] and [`TokenKind::Number`] the complete string respectively
    /// number is consumed (and discarded).
    ///
    /// # Examples
    /// ```
    /// # use pulson::reader::*;
    /// let mut json_reader = JsonStreamReader::from_text(r#"["ignored", 1]"#);
    /// json_reader.expect(TokenKind::ArrayOpen)?;
    /// json_reader.expect(TokenKind::String)?;
    /// json_reader.expect(TokenKind::Comma)?;
    /// assert_eq!(1, json_reader.read_i64()?);
    /// json_reader.expect(TokenKind::ArrayClose)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn expect(&mut self, kind: TokenKind) -> Result<(), ReaderError> {
        self.consume_token(kind)?;
        match kind {
            TokenKind::String => self.read_string_body(&mut |_| {}),
            TokenKind::Number => self.read_number_body(),
            _ => Ok(()),
        }
    }

    /// Consumes the next token if it is `null`
    ///
    /// Returns `true` if a JSON null was consumed, `false` if the next token is something
    /// else; in that case the token is not consumed.
    pub fn skip_if_null(&mut self) -> Result<bool, ReaderError> {
        if self.peek_token()? == TokenKind::Null {
            self.consume_peeked();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Consumes the remainder of the input, verifying that it only consists of whitespace
    ///
    /// This should be called after the top-level value has been read to detect trailing
    /// data, such as in `[1] [2]`.
    pub fn consume_trailing_whitespace(mut self) -> Result<(), ReaderError> {
        if self.peeked != TokenKind::None {
            return Err(self.unexpected_token_error(Expected::EndOfInput, self.peeked));
        }

        while let Some(c) = self.read_char()? {
            if !is_whitespace(c) {
                return Err(ReaderError::UnexpectedCharacter {
                    character: c,
                    position: self.last_char_position(),
                });
            }
        }
        Ok(())
    }
}

// Implementation with string reading methods
impl<S: CharSource> JsonStreamReader<S> {
    /// Reads the 4 hex digits of a `\uXXXX` escape sequence
    fn read_hex_code_unit(&mut self) -> Result<u16, ReaderError> {
        let digits_start = self.position;
        let read_count = self.read_scratch(4)?;

        let mut code_unit: u16 = 0;
        for index in 0..read_count {
            match self.scratch[index].to_digit(16) {
                Some(digit) => code_unit = code_unit << 4 | digit as u16,
                None => {
                    return Err(ReaderError::MalformedEscape {
                        sequence: std::iter::once('u')
                            .chain(self.scratch[..=index].iter().copied())
                            .collect(),
                        position: digits_start + index as u64,
                    })
                }
            }
        }
        if read_count < 4 {
            return Err(self.end_of_input_error());
        }
        Ok(code_unit)
    }

    /// Reads the next char or escape sequence of a member name or string value
    fn read_string_piece(&mut self) -> Result<StringPiece, ReaderError> {
        Ok(match self.read_char_no_eof()? {
            '"' => StringPiece::End,
            '\\' => {
                let escape_start = self.last_char_position();
                match self.read_char_no_eof()? {
                    c @ ('"' | '\\' | '/') => StringPiece::Char(c),
                    'b' => StringPiece::Char('\u{08}'),
                    'f' => StringPiece::Char('\u{0C}'),
                    'n' => StringPiece::Char('\n'),
                    'r' => StringPiece::Char('\r'),
                    't' => StringPiece::Char('\t'),
                    'u' => StringPiece::CodeUnit(self.read_hex_code_unit()?, escape_start),
                    c => {
                        return Err(ReaderError::MalformedEscape {
                            sequence: c.to_string(),
                            position: self.last_char_position(),
                        })
                    }
                }
            }
            c => StringPiece::Char(c),
        })
    }

    fn on_lone_surrogate<C: FnMut(char)>(
        &self,
        code_unit: u16,
        escape_start: u64,
        consumer: &mut C,
    ) -> Result<(), ReaderError> {
        if self.settings.replace_lone_surrogates {
            consumer(char::REPLACEMENT_CHARACTER);
            Ok(())
        } else {
            Err(ReaderError::MalformedEscape {
                sequence: format!("u{code_unit:04X}"),
                position: escape_start,
            })
        }
    }

    /// Reads the remainder of a member name or string value whose opening `"` has already
    /// been consumed, passing the decoded chars to `consumer`
    fn read_string_body<C: FnMut(char)>(&mut self, consumer: &mut C) -> Result<(), ReaderError> {
        // High surrogate which is waiting for its low surrogate counterpart
        let mut pending_high_surrogate: Option<(u16, u64)> = None;

        loop {
            let piece = self.read_string_piece()?;

            if let Some((high, high_start)) = pending_high_surrogate.take() {
                if let StringPiece::CodeUnit(low @ 0xDC00..=0xDFFF, _) = piece {
                    let code_point =
                        0x10000 + ((u32::from(high) - 0xD800) << 10 | (u32::from(low) - 0xDC00));
                    consumer(char::from_u32(code_point).unwrap_or(char::REPLACEMENT_CHARACTER));
                    continue;
                }
                self.on_lone_surrogate(high, high_start, consumer)?;
            }

            match piece {
                StringPiece::End => return Ok(()),
                StringPiece::Char(c) => consumer(c),
                StringPiece::CodeUnit(high @ 0xD800..=0xDBFF, escape_start) => {
                    pending_high_surrogate = Some((high, escape_start));
                }
                StringPiece::CodeUnit(low @ 0xDC00..=0xDFFF, escape_start) => {
                    self.on_lone_surrogate(low, escape_start, consumer)?;
                }
                StringPiece::CodeUnit(code_unit, _) => {
                    // Cannot fail, surrogates have been handled above
                    consumer(
                        char::from_u32(u32::from(code_unit))
                            .unwrap_or(char::REPLACEMENT_CHARACTER),
                    );
                }
            }
        }
    }

    /// Reads a JSON string value into [`value_buf`](Self::value_buf); returns the position
    /// where the string starts
    pub(super) fn read_string_to_buf(&mut self) -> Result<u64, ReaderError> {
        self.consume_token(TokenKind::String)?;
        let start = self.token_start;

        let mut buf = std::mem::take(&mut self.value_buf);
        buf.clear();
        let result = self.read_string_body(&mut |c| buf.push(c));
        self.value_buf = buf;
        result?;
        Ok(start)
    }

    pub(super) fn value_buf(&self) -> &str {
        &self.value_buf
    }

    /// Consumes and returns a JSON string value
    ///
    /// All escape sequences are decoded; a `\uXXXX` escape sequence for a UTF-16 high surrogate
    /// followed by one for a low surrogate is combined into a single char. How unpaired
    /// surrogates are handled depends on [`ReaderSettings::replace_lone_surrogates`].
    ///
    /// # Examples
    /// ```
    /// # use pulson::reader::*;
    /// let mut json_reader = JsonStreamReader::from_text(r#""a\tb ä 😀""#);
    /// assert_eq!("a\tb ä 😀", json_reader.read_string()?);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn read_string(&mut self) -> Result<String, ReaderError> {
        self.consume_token(TokenKind::String)?;
        let mut value = String::new();
        self.read_string_body(&mut |c| value.push(c))?;
        Ok(value)
    }

    /// Consumes a JSON string value without decoding it
    ///
    /// The string is validated the same way [`read_string`](Self::read_string) does.
    pub fn skip_string(&mut self) -> Result<(), ReaderError> {
        self.consume_token(TokenKind::String)?;
        self.read_string_body(&mut |_| {})
    }
}

// Implementation with number and literal reading methods
impl<S: CharSource> JsonStreamReader<S> {
    /// Reads the remainder of a number whose token has already been consumed into
    /// [`value_buf`](Self::value_buf)
    ///
    /// A following `,`, `]` or `}` is classified as next token; following whitespace is consumed.
    fn read_number_body(&mut self) -> Result<(), ReaderError> {
        let start = self.token_start;
        // Always clear the pending digit, even if reading fails below
        let first_digit = match self.pending_first_digit.take() {
            Some(c) => c,
            None => unreachable!("number token should have pending first digit"),
        };

        self.value_buf.clear();
        self.value_buf.push(first_digit);
        loop {
            match self.read_char()? {
                None => break,
                Some(c @ ('0'..='9' | '+' | '-' | '.' | 'e' | 'E')) => self.value_buf.push(c),
                Some(c @ (',' | ']' | '}')) => {
                    self.classify(c)?;
                    break;
                }
                Some(c) if is_whitespace(c) => break,
                Some(_) => {
                    return Err(ReaderError::MalformedNumber {
                        text: self.value_buf.clone(),
                        position: self.last_char_position(),
                    })
                }
            }
        }

        if is_valid_number(&self.value_buf) {
            Ok(())
        } else {
            Err(ReaderError::MalformedNumber {
                text: self.value_buf.clone(),
                position: start,
            })
        }
    }

    /// Reads a JSON number into [`value_buf`](Self::value_buf); returns the position where
    /// the number starts
    pub(super) fn read_number_to_buf(&mut self) -> Result<u64, ReaderError> {
        self.consume_token(TokenKind::Number)?;
        let start = self.token_start;
        self.read_number_body()?;
        Ok(start)
    }

    /// Consumes a JSON number and returns its string representation
    ///
    /// The number is returned exactly as it appears in the JSON data, for example `1.5e+10`.
    /// It is validated against the JSON number grammar, except that leading zeros such
    /// as in `007` are permitted.
    pub fn read_number_text(&mut self) -> Result<String, ReaderError> {
        self.read_number_to_buf()?;
        Ok(self.value_buf.clone())
    }

    /// Consumes a JSON number and returns its string representation as borrowed `str`
    ///
    /// Behaves like [`read_number_text`](Self::read_number_text) but avoids allocating a
    /// new `String`. The returned `str` is only valid until the next read operation.
    pub fn read_number_str(&mut self) -> Result<&str, ReaderError> {
        self.read_number_to_buf()?;
        Ok(&self.value_buf)
    }

    /// Consumes a JSON boolean value
    pub fn read_bool(&mut self) -> Result<bool, ReaderError> {
        let value = match self.peek_token()? {
            TokenKind::True => true,
            TokenKind::False => false,
            actual => return Err(self.unexpected_token_error(Expected::Boolean, actual)),
        };
        self.consume_peeked();
        Ok(value)
    }

    /// Consumes a JSON null value
    pub fn read_null(&mut self) -> Result<(), ReaderError> {
        self.consume_token(TokenKind::Null)
    }

    /// Reads a value which is either JSON null or some other value
    ///
    /// Returns `None` for JSON null, otherwise calls `read` and returns its result.
    pub fn read_nullable<T>(
        &mut self,
        read: impl FnOnce(&mut Self) -> Result<T, ReaderError>,
    ) -> Result<Option<T>, ReaderError> {
        if self.skip_if_null()? {
            Ok(None)
        } else {
            read(self).map(Some)
        }
    }
}

// Implementation with array and object traversal methods
impl<S: CharSource> JsonStreamReader<S> {
    fn enter_nesting(&mut self) -> Result<(), ReaderError> {
        self.depth += 1;
        if let Some(max_depth) = self.settings.max_nesting_depth {
            if self.depth > max_depth {
                log::debug!(
                    "maximum nesting depth {max_depth} exceeded at position {}",
                    self.token_start
                );
                return Err(ReaderError::MaxNestingDepthExceeded {
                    max_depth,
                    position: self.token_start,
                });
            }
        }
        Ok(())
    }

    fn exit_nesting(&mut self) {
        debug_assert!(self.depth > 0);
        self.depth -= 1;
    }

    /// Drives the shared array / object state machine
    ///
    /// `on_element` is called whenever an item respectively member is expected and the next
    /// token is not `,` or the closing bracket; it must consume the complete element.
    fn read_container<F: FnMut(&mut Self) -> Result<(), ReaderError>>(
        &mut self,
        open: TokenKind,
        close: TokenKind,
        mut on_element: F,
    ) -> Result<(), ReaderError> {
        self.consume_token(open)?;
        self.enter_nesting()?;
        log::trace!("entered {open} at position {}", self.token_start);

        let mut state = ElementState::First;
        loop {
            let token = self.peek_token()?;
            match state {
                ElementState::First | ElementState::AfterElement if token == close => {
                    self.consume_peeked();
                    break;
                }
                ElementState::AfterElement => {
                    if token != TokenKind::Comma {
                        return Err(self.unexpected_token_error(Expected::CommaOr(close), token));
                    }
                    self.consume_peeked();
                    state = ElementState::AfterComma;
                }
                ElementState::First | ElementState::AfterComma => {
                    on_element(self)?;
                    state = ElementState::AfterElement;
                }
            }
        }

        self.exit_nesting();
        log::trace!("left {open} at position {}", self.token_start);
        Ok(())
    }

    fn read_array_internal<F: FnMut(&mut Self) -> Result<(), ReaderError>>(
        &mut self,
        mut on_item: F,
    ) -> Result<(), ReaderError> {
        self.read_container(TokenKind::ArrayOpen, TokenKind::ArrayClose, |json_reader| {
            let token = json_reader.peek_token()?;
            if !token.is_value_start() {
                return Err(json_reader.unexpected_token_error(Expected::Value, token));
            }
            on_item(json_reader)
        })
    }

    fn read_object_internal<F: FnMut(&mut Self, &str) -> Result<PropertyStatus, ReaderError>>(
        &mut self,
        mut on_property: F,
    ) -> Result<(), ReaderError> {
        self.read_container(TokenKind::ObjectOpen, TokenKind::ObjectClose, |json_reader| {
            json_reader.consume_token(TokenKind::String)?;
            let name_start = json_reader.token_start;

            // Take the buffer to be able to lend the name to `on_property` together with the reader
            let mut name = std::mem::take(&mut json_reader.name_buf);
            name.clear();
            json_reader.read_string_body(&mut |c| name.push(c))?;
            json_reader.consume_token(TokenKind::Colon)?;

            match on_property(json_reader, &name)? {
                PropertyStatus::Handled => {
                    json_reader.name_buf = name;
                    Ok(())
                }
                PropertyStatus::Unrecognized => {
                    log::debug!("unrecognized property '{name}' at position {name_start}");
                    Err(ReaderError::UnrecognizedProperty {
                        name,
                        position: name_start,
                    })
                }
            }
        })
    }

    /// Consumes a JSON array, collecting the values produced by `item_factory`
    ///
    /// `item_factory` is called once for every item of the array and must consume exactly
    /// one JSON value, for example by calling [`read_string`](Self::read_string) or by
    /// recursively reading a nested array or object. For an empty array it is not called.
    ///
    /// # Examples
    /// ```
    /// # use pulson::reader::*;
    /// let mut json_reader = JsonStreamReader::from_text("[[1, 2], [], [3]]");
    /// let values = json_reader.read_array(|json_reader| {
    ///     json_reader.read_array(|json_reader| json_reader.read_u64())
    /// })?;
    /// assert_eq!(vec![vec![1, 2], vec![], vec![3]], values);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn read_array<T>(
        &mut self,
        mut item_factory: impl FnMut(&mut Self) -> Result<T, ReaderError>,
    ) -> Result<Vec<T>, ReaderError> {
        let mut items = Vec::new();
        self.read_array_internal(|json_reader| {
            items.push(item_factory(json_reader)?);
            Ok(())
        })?;
        Ok(items)
    }

    /// Consumes a JSON array, calling `item_action` for every item
    ///
    /// This is the same as [`read_array`](Self::read_array), except that no results are
    /// collected; it is intended for functions which process the items as side effect.
    pub fn read_array_items(
        &mut self,
        item_action: impl FnMut(&mut Self) -> Result<(), ReaderError>,
    ) -> Result<(), ReaderError> {
        self.read_array_internal(item_action)
    }

    /// Consumes a JSON object, calling `property_switch` for every property
    ///
    /// `property_switch` receives the name of the property, and must consume exactly one JSON
    /// value, the property value. If it returns [`PropertyStatus::Unrecognized`] reading fails
    /// with [`ReaderError::UnrecognizedProperty`]; in that case the value does not have to be
    /// consumed. For an empty object `property_switch` is not called.
    ///
    /// See [`read_object_tolerant`](Self::read_object_tolerant) for a variant which accepts
    /// all properties.
    pub fn read_object(
        &mut self,
        property_switch: impl FnMut(&mut Self, &str) -> Result<PropertyStatus, ReaderError>,
    ) -> Result<(), ReaderError> {
        self.read_object_internal(property_switch)
    }

    /// Consumes a JSON object like [`read_object`](Self::read_object), building the result
    /// from the properties
    ///
    /// `builder` is the state which `property_switch` fills while the properties are read.
    /// Once the closing `}` has been consumed `object_factory` turns the builder into the
    /// result. For an empty object the factory receives the builder unchanged, so its initial
    /// state acts as the default result.
    ///
    /// # Examples
    /// ```
    /// # use pulson::reader::*;
    /// #[derive(Debug, PartialEq)]
    /// struct Point {
    ///     x: i64,
    ///     y: i64,
    /// }
    ///
    /// let mut json_reader = JsonStreamReader::from_text(r#"{"x": 1, "y": -2}"#);
    /// let point = json_reader.read_object_into(
    ///     (None, None),
    ///     |json_reader, (x, y), name| {
    ///         match name {
    ///             "x" => *x = Some(json_reader.read_i64()?),
    ///             "y" => *y = Some(json_reader.read_i64()?),
    ///             _ => return Ok(PropertyStatus::Unrecognized),
    ///         }
    ///         Ok(PropertyStatus::Handled)
    ///     },
    ///     |(x, y)| Point {
    ///         x: x.unwrap_or_default(),
    ///         y: y.unwrap_or_default(),
    ///     },
    /// )?;
    /// assert_eq!(Point { x: 1, y: -2 }, point);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn read_object_into<B, T>(
        &mut self,
        mut builder: B,
        mut property_switch: impl FnMut(
            &mut Self,
            &mut B,
            &str,
        ) -> Result<PropertyStatus, ReaderError>,
        object_factory: impl FnOnce(B) -> T,
    ) -> Result<T, ReaderError> {
        self.read_object_internal(|json_reader, name| {
            property_switch(json_reader, &mut builder, name)
        })?;
        Ok(object_factory(builder))
    }

    /// Consumes a JSON object, calling `property_action` for every property
    ///
    /// Unlike [`read_object`](Self::read_object) every property is considered handled;
    /// `property_action` can use [`skip_value`](Self::skip_value) to ignore the values of
    /// unknown properties.
    pub fn read_object_tolerant(
        &mut self,
        mut property_action: impl FnMut(&mut Self, &str) -> Result<(), ReaderError>,
    ) -> Result<(), ReaderError> {
        self.read_object_internal(|json_reader, name| {
            property_action(json_reader, name)?;
            Ok(PropertyStatus::Handled)
        })
    }

    /// Consumes a JSON object like [`read_object_tolerant`](Self::read_object_tolerant),
    /// building the result from the properties
    ///
    /// `builder` and `object_factory` behave the same way as for
    /// [`read_object_into`](Self::read_object_into).
    pub fn read_object_tolerant_into<B, T>(
        &mut self,
        mut builder: B,
        mut property_action: impl FnMut(&mut Self, &mut B, &str) -> Result<(), ReaderError>,
        object_factory: impl FnOnce(B) -> T,
    ) -> Result<T, ReaderError> {
        self.read_object_tolerant(|json_reader, name| {
            property_action(json_reader, &mut builder, name)
        })?;
        Ok(object_factory(builder))
    }
}

// Implementation with skipping methods
impl<S: CharSource> JsonStreamReader<S> {
    /// Skips the next JSON value
    ///
    /// If the value is a JSON array or object, all nested values are skipped as well. This
    /// does not call itself recursively, so the stack usage is independent of the nesting
    /// depth. The skipped data is still validated.
    pub fn skip_value(&mut self) -> Result<(), ReaderError> {
        // Closing token and progress of the enclosing arrays and objects
        let mut stack: Vec<(TokenKind, ElementState)> = Vec::new();

        loop {
            if let Some(&(close, state)) = stack.last() {
                let top = stack.len() - 1;
                let token = self.peek_token()?;
                match state {
                    ElementState::First | ElementState::AfterElement if token == close => {
                        self.consume_peeked();
                        self.exit_nesting();
                        stack.pop();
                        if stack.is_empty() {
                            return Ok(());
                        }
                        continue;
                    }
                    ElementState::AfterElement => {
                        if token != TokenKind::Comma {
                            return Err(
                                self.unexpected_token_error(Expected::CommaOr(close), token)
                            );
                        }
                        self.consume_peeked();
                        stack[top].1 = ElementState::AfterComma;
                        continue;
                    }
                    ElementState::First | ElementState::AfterComma => {
                        stack[top].1 = ElementState::AfterElement;
                        if close == TokenKind::ObjectClose {
                            self.skip_string()?;
                            self.consume_token(TokenKind::Colon)?;
                        }
                        // Fall through to skipping the item or member value
                    }
                }
            }

            match self.peek_token()? {
                TokenKind::ArrayOpen => {
                    self.consume_peeked();
                    self.enter_nesting()?;
                    stack.push((TokenKind::ArrayClose, ElementState::First));
                }
                TokenKind::ObjectOpen => {
                    self.consume_peeked();
                    self.enter_nesting()?;
                    stack.push((TokenKind::ObjectClose, ElementState::First));
                }
                TokenKind::String => self.skip_string()?,
                TokenKind::Number => self.expect(TokenKind::Number)?,
                TokenKind::True | TokenKind::False | TokenKind::Null => self.consume_peeked(),
                actual => return Err(self.unexpected_token_error(Expected::Value, actual)),
            }

            if stack.is_empty() {
                return Ok(());
            }
        }
    }

    /// Consumes a JSON array, skipping all items, and returns the number of items
    ///
    /// Nested arrays and objects are skipped with [`skip_value`](Self::skip_value) without
    /// being traversed item by item through callbacks.
    pub fn skip_count_array(&mut self) -> Result<u64, ReaderError> {
        let mut count = 0;
        self.read_array_internal(|json_reader| {
            json_reader.skip_value()?;
            count += 1;
            Ok(())
        })?;
        Ok(count)
    }

    /// Consumes a JSON object, skipping all property values, and returns the number of properties
    pub fn skip_count_object(&mut self) -> Result<u64, ReaderError> {
        let mut count = 0;
        self.read_object_internal(|json_reader, _| {
            json_reader.skip_value()?;
            count += 1;
            Ok(PropertyStatus::Handled)
        })?;
        Ok(count)
    }
}
