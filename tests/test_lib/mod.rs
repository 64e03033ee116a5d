//! Common library module for integration tests
// See https://doc.rust-lang.org/book/ch11-03-test-organization.html#submodules-in-integration-tests

use std::path::PathBuf;

use pulson::reader::{CharSource, JsonStreamReader, PropertyStatus, ReaderError, TokenKind};

pub fn get_test_data_file_path() -> PathBuf {
    // Get path of test file, see https://stackoverflow.com/a/30004252
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/test_data.json");
    path
}

#[derive(PartialEq, Eq, Debug)]
pub enum JsonEvent {
    ArrayStart,
    ArrayEnd,
    ObjectStart,
    ObjectEnd,
    PropertyName(String),

    StringValue(String),
    // Contains string representation of number value
    NumberValue(String),
    BoolValue(bool),
    NullValue,
}

/// Reads the next value with the callback based API of the reader, recording all events
pub fn read_events<S: CharSource>(
    json_reader: &mut JsonStreamReader<S>,
    events: &mut Vec<JsonEvent>,
) -> Result<(), ReaderError> {
    match json_reader.peek_token()? {
        TokenKind::ArrayOpen => {
            events.push(JsonEvent::ArrayStart);
            json_reader.read_array_items(|json_reader| read_events(json_reader, events))?;
            events.push(JsonEvent::ArrayEnd);
        }
        TokenKind::ObjectOpen => {
            events.push(JsonEvent::ObjectStart);
            json_reader.read_object(|json_reader, name| {
                events.push(JsonEvent::PropertyName(name.to_owned()));
                read_events(json_reader, events)?;
                Ok(PropertyStatus::Handled)
            })?;
            events.push(JsonEvent::ObjectEnd);
        }
        TokenKind::String => events.push(JsonEvent::StringValue(json_reader.read_string()?)),
        TokenKind::Number => events.push(JsonEvent::NumberValue(json_reader.read_number_text()?)),
        TokenKind::True | TokenKind::False => {
            events.push(JsonEvent::BoolValue(json_reader.read_bool()?))
        }
        TokenKind::Null => {
            json_reader.read_null()?;
            events.push(JsonEvent::NullValue);
        }
        // Let the reader report the unexpected token
        _ => json_reader.skip_value()?,
    }
    Ok(())
}

/// Gets the events expected for the JSON document at the path returned by [`get_test_data_file_path`]
pub fn get_expected_events() -> Vec<JsonEvent> {
    vec![
        JsonEvent::ArrayStart,
        // Arrays
        JsonEvent::ArrayStart,
        JsonEvent::ArrayEnd,
        //   Array with single item
        JsonEvent::ArrayStart,
        JsonEvent::NumberValue("1".to_owned()),
        JsonEvent::ArrayEnd,
        //   Array with multiple items
        JsonEvent::ArrayStart,
        JsonEvent::NumberValue("1".to_owned()),
        JsonEvent::StringValue("a".to_owned()),
        JsonEvent::BoolValue(true),
        JsonEvent::ObjectStart,
        JsonEvent::PropertyName("nested".to_owned()),
        JsonEvent::ArrayStart,
        JsonEvent::ObjectStart,
        JsonEvent::PropertyName("nested2".to_owned()),
        JsonEvent::ArrayStart,
        JsonEvent::NumberValue("2".to_owned()),
        JsonEvent::ArrayEnd,
        JsonEvent::ObjectEnd,
        JsonEvent::ArrayEnd,
        JsonEvent::ObjectEnd,
        JsonEvent::ArrayEnd,
        // Objects
        JsonEvent::ObjectStart,
        JsonEvent::ObjectEnd,
        //   Object with single property
        JsonEvent::ObjectStart,
        JsonEvent::PropertyName("name".to_owned()),
        JsonEvent::NumberValue("1".to_owned()),
        JsonEvent::ObjectEnd,
        //   Object with multiple properties
        JsonEvent::ObjectStart,
        JsonEvent::PropertyName("name1".to_owned()),
        JsonEvent::BoolValue(false),
        JsonEvent::PropertyName("name2".to_owned()),
        JsonEvent::StringValue("value".to_owned()),
        JsonEvent::PropertyName("name1".to_owned()),
        JsonEvent::NumberValue("2".to_owned()),
        JsonEvent::PropertyName("".to_owned()),
        JsonEvent::NumberValue("3".to_owned()),
        JsonEvent::ObjectEnd,
        // Strings
        JsonEvent::StringValue("string value".to_owned()),
        JsonEvent::StringValue("\0 test \n\t \\ \" /".to_owned()),
        JsonEvent::StringValue("unicode § ಀ ᠅ 𝄆 𝄞".to_owned()),
        // Numbers
        JsonEvent::NumberValue("0".to_owned()),
        JsonEvent::NumberValue("-1234".to_owned()),
        JsonEvent::NumberValue("567.89".to_owned()),
        JsonEvent::NumberValue("100e-10".to_owned()),
        JsonEvent::NumberValue("6.070e+010".to_owned()),
        // Booleans
        JsonEvent::BoolValue(true),
        JsonEvent::BoolValue(false),
        JsonEvent::NullValue,
        JsonEvent::ArrayEnd,
    ]
}
