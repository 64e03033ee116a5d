//! Integration test for custom `CharSource` implementations
//!
//! This ensures that the `CharSource` trait can be implemented by users, and does
//! not depend on something which is only accessible within Pulson.

use std::{
    cell::Cell,
    io::{Error as IoError, ErrorKind},
    rc::Rc,
};

use pulson::reader::{CharSource, JsonStreamReader, ReaderError, StrSource, TokenKind};

type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Source which fails once cancellation has been requested
struct CancellableSource<S> {
    delegate: S,
    cancelled: Rc<Cell<bool>>,
}

impl<S: CharSource> CharSource for CancellableSource<S> {
    fn read_char(&mut self) -> Result<Option<char>, IoError> {
        if self.cancelled.get() {
            return Err(IoError::new(ErrorKind::Interrupted, "cancelled"));
        }
        self.delegate.read_char()
    }
}

#[test]
fn cancellation() {
    let cancelled = Rc::new(Cell::new(false));
    let mut json_reader = JsonStreamReader::new(CancellableSource {
        delegate: StrSource::new("[1, 2, 3, 4]"),
        cancelled: Rc::clone(&cancelled),
    });

    let mut seen = Vec::new();
    let result = json_reader.read_array_items(|json_reader| {
        seen.push(json_reader.read_i64()?);
        if seen.len() == 2 {
            cancelled.set(true);
        }
        Ok(())
    });

    assert_eq!(vec![1, 2], seen);
    match result {
        Err(ReaderError::Io { error, position }) => {
            assert_eq!(ErrorKind::Interrupted, error.kind());
            // `2` was terminated by the `,` at position 5
            assert_eq!(6, position);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

/// Source which provides its chars one at a time and records how often it was called
struct CountingSource<'a> {
    chars: std::str::Chars<'a>,
    calls: usize,
}

impl CharSource for CountingSource<'_> {
    fn read_char(&mut self) -> Result<Option<char>, IoError> {
        self.calls += 1;
        Ok(self.chars.next())
    }
}

#[test]
fn default_bulk_read() -> TestResult {
    let json = r#"[true, "ä", null]"#;
    let mut json_reader = JsonStreamReader::new(CountingSource {
        chars: json.chars(),
        calls: 0,
    });
    let values = json_reader.read_array(|json_reader| {
        if json_reader.skip_if_null()? {
            return Ok(None);
        }
        Ok(Some(match json_reader.peek_token()? {
            TokenKind::String => json_reader.read_string()?,
            _ => json_reader.read_bool()?.to_string(),
        }))
    })?;
    assert_eq!(vec![Some("true".to_owned()), Some("ä".to_owned()), None], values);

    // Literals are read with the default `read_chars`, which delegates to `read_char`
    let source = json_reader.into_inner();
    assert_eq!(json.chars().count(), source.calls);
    Ok(())
}

#[test]
fn borrowed_source() -> TestResult {
    let mut source = StrSource::new("1 2");
    {
        let mut json_reader = JsonStreamReader::new(&mut source);
        assert_eq!(1, json_reader.read_u64()?);
    }
    // The reader consumed the whitespace terminating the number
    assert_eq!("2", source.remaining());
    Ok(())
}
