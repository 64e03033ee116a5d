use std::error::Error;

use criterion::{criterion_group, criterion_main, Criterion};
use pulson::reader::*;

fn call_unwrap<F: FnOnce() -> Result<(), Box<dyn Error>>>(f: F) {
    f().unwrap();
}

fn new_unlimited_reader(json: &str) -> JsonStreamReader<StrSource<'_>> {
    JsonStreamReader::new_custom(
        StrSource::new(json),
        ReaderSettings {
            max_nesting_depth: None,
            ..Default::default()
        },
    )
}

/// Reads the next value completely, decoding strings and numbers
fn pulson_read<S: CharSource>(json_reader: &mut JsonStreamReader<S>) -> Result<(), ReaderError> {
    match json_reader.peek_token()? {
        TokenKind::ArrayOpen => json_reader.read_array_items(pulson_read),
        TokenKind::ObjectOpen => {
            json_reader.read_object_tolerant(|json_reader, _| pulson_read(json_reader))
        }
        TokenKind::String => json_reader.read_string().map(drop),
        TokenKind::Number => json_reader.read_number_str().map(drop),
        TokenKind::True | TokenKind::False => json_reader.read_bool().map(drop),
        _ => json_reader.read_null(),
    }
}

fn bench_compare(c: &mut Criterion, name: &str, json: &str, compare_serde_json: bool) {
    let mut group = c.benchmark_group(name);
    group.bench_with_input("pulson-skip", json, |b, json| {
        b.iter(|| {
            call_unwrap(|| {
                let mut json_reader = new_unlimited_reader(json);
                json_reader.skip_value()?;
                json_reader.consume_trailing_whitespace()?;
                Ok(())
            });
        })
    });

    group.bench_with_input("pulson-read", json, |b, json| {
        b.iter(|| {
            call_unwrap(|| {
                let mut json_reader = new_unlimited_reader(json);
                pulson_read(&mut json_reader)?;
                json_reader.consume_trailing_whitespace()?;
                Ok(())
            });
        })
    });

    group.bench_with_input("pulson-read (reader)", json, |b, json| {
        b.iter(|| {
            call_unwrap(|| {
                let mut json_reader = JsonStreamReader::new_custom(
                    Utf8Source::new(json.as_bytes()),
                    ReaderSettings {
                        max_nesting_depth: None,
                        ..Default::default()
                    },
                );
                pulson_read(&mut json_reader)?;
                json_reader.consume_trailing_whitespace()?;
                Ok(())
            });
        })
    });

    // serde_json rejects deeply nested data unless its `unbounded_depth` feature is enabled
    if compare_serde_json {
        group.bench_with_input("serde_json-value", json, |b, json| {
            b.iter(|| serde_json::from_str::<serde_json::Value>(json).unwrap())
        });
    }

    group.finish();
}

fn benchmark_large_array(c: &mut Criterion) {
    let json = format!(
        "[{}true]",
        "true, false, null, 12345689.123e12, \"abcdabcdabcdabcd\",".repeat(1000)
    );
    bench_compare(c, "read-large-array", &json, true);

    let mut group = c.benchmark_group("skip-count-large-array");
    group.bench_with_input("pulson-skip-count", &json, |b, json| {
        b.iter(|| {
            call_unwrap(|| {
                let mut json_reader = JsonStreamReader::from_text(json);
                assert_eq!(5001, json_reader.skip_count_array()?);
                Ok(())
            });
        })
    });
    group.finish();
}

fn benchmark_nested_object(c: &mut Criterion) {
    let count = 1000;
    let json = r#"{"member name":"#.repeat(count) + "true" + "}".repeat(count).as_str();
    bench_compare(c, "read-nested-object", &json, false);
}

fn benchmark_large_ascii_string(c: &mut Criterion) {
    let json = format!("\"{}\"", "this is a test string".repeat(10_000));
    bench_compare(c, "read-large-ascii-string", &json, true);
}

fn benchmark_large_unicode_string(c: &mut Criterion) {
    let json = format!(
        "\"{}\"",
        "ab\u{0080}cd\u{0800}ef\u{1234}gh\u{10FFFF}".repeat(10_000)
    );
    bench_compare(c, "read-large-unicode-string", &json, true);
}

fn benchmark_escapes_string(c: &mut Criterion) {
    let json = format!(
        "\"{}\"",
        r#"a\nb\tc\\d\"e\u0000f\u0080g\u0800h\u1234i\uD800\uDC00"#.repeat(10_000)
    );
    bench_compare(c, "read-large-escapes-string", &json, true);
}

criterion_group!(
    benches,
    // Benchmark functions
    benchmark_large_array,
    benchmark_nested_object,
    benchmark_large_ascii_string,
    benchmark_large_unicode_string,
    benchmark_escapes_string
);
criterion_main!(benches);
