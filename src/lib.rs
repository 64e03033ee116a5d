#![warn(missing_docs)]
#![forbid(unsafe_code)]
// Allow needless `return` because that makes it sometimes more obvious that
// an expression is the result of the function
#![allow(clippy::needless_return)]
// Allow `assert_eq!(true, ...)` because in some cases it is used to check a bool
// value and not a 'flag' / 'state', and `assert_eq!` makes that more explicit
#![allow(clippy::bool_assert_comparison)]
// Enable 'unused' warnings for doc tests (are disabled by default)
#![doc(test(no_crate_inject))]
#![doc(test(attr(warn(unused))))]
// Fail on warnings in doc tests
#![doc(test(attr(deny(warnings))))]

//! Pulson is a forward-only, low-allocation pull reader for [RFC 8259](https://www.rfc-editor.org/rfc/rfc8259.html)
//! JSON data.
//!
//! It reads JSON in a single pass without building a document tree. The reader holds one token of
//! lookahead and offers two layers of API:
//!
//! - a token-level API: [`peek_token`](reader::JsonStreamReader::peek_token),
//!   [`expect`](reader::JsonStreamReader::expect) and [`skip_if_null`](reader::JsonStreamReader::skip_if_null)
//! - a value-level API: scalar readers such as [`read_string`](reader::JsonStreamReader::read_string),
//!   [`read_i64`](reader::JsonStreamReader::read_i64) or [`read_guid`](reader::JsonStreamReader::read_guid),
//!   and callback driven traversal of arrays and objects with
//!   [`read_array`](reader::JsonStreamReader::read_array) and [`read_object`](reader::JsonStreamReader::read_object)
//!
//! Malformed JSON data is never tolerated: comments, trailing commas and other extensions are
//! rejected, and every error is terminal for the reader.
//!
//! # Terminology
//!
//! - *object*: `{ ... }`
//!   - *property*: Entry in an object. For example the JSON object `{"a": 1}` has the property
//!     `"a": 1` where `"a"` is the property *name* and `1` is the property *value*.
//! - *array*: `[ ... ]`
//! - *literal*: `true`, `false` or `null`
//! - *number*: number value, for example `123.4e+10`
//! - *string*: string value, for example `"text in \"quotes\""`
//!
//! # Usage example
//!
//! ```
//! # use pulson::reader::*;
//! #[derive(Debug, PartialEq)]
//! struct Item {
//!     id: u64,
//!     tags: Vec<String>,
//!     comment: Option<String>,
//! }
//!
//! // In this example JSON data comes from a string;
//! // normally it would come from a file or a network connection
//! let json = r#"[{"id": 1, "tags": ["a", "b"], "comment": null}, {"id": 2, "tags": []}]"#;
//! let mut json_reader = JsonStreamReader::from_text(json);
//!
//! let items = json_reader.read_array(|json_reader| {
//!     let mut item = Item { id: 0, tags: Vec::new(), comment: None };
//!     json_reader.read_object(|json_reader, name| {
//!         match name {
//!             "id" => item.id = json_reader.read_u64()?,
//!             "tags" => item.tags = json_reader.read_array(|json_reader| json_reader.read_string())?,
//!             "comment" => item.comment = json_reader.read_nullable_string()?,
//!             _ => return Ok(PropertyStatus::Unrecognized),
//!         }
//!         Ok(PropertyStatus::Handled)
//!     })?;
//!     Ok(item)
//! })?;
//! // Ensures that there is no trailing data
//! json_reader.consume_trailing_whitespace()?;
//!
//! assert_eq!(2, items.len());
//! assert_eq!(2, items[1].id);
//! assert_eq!(vec!["a", "b"], items[0].tags);
//! assert_eq!(None, items[1].comment);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Logging
//! The reader emits diagnostics through the [`log`](https://docs.rs/log) facade: token
//! classification and entering or leaving arrays and objects on the `trace` level, and
//! detected unrecognized properties or nesting depth violations on the `debug` level. No
//! logger is installed by this crate.

pub mod reader;

mod json_number;
mod utf8;
