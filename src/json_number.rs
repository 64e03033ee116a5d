//! Internal module for validating the text of JSON numbers

/// Checks whether `text` matches the JSON number grammar
///
/// ```text
/// number := "-"? digit+ ("." digit+)? (("e"|"E") ("+"|"-")? digit+)?
/// ```
///
/// Unlike RFC 8259 leading zeros such as in `007` are permitted.
pub(crate) fn is_valid_number(text: &str) -> bool {
    #[derive(PartialEq)]
    enum State {
        Start,
        Minus,
        IntDigit,
        DecimalPoint,
        DecimalDigit,
        ExpE,
        ExpSign,
        ExpDigit,
    }

    let mut state = State::Start;

    for byte in text.bytes() {
        state = match (state, byte) {
            (State::Start, b'-') => State::Minus,
            (State::Start | State::Minus | State::IntDigit, b'0'..=b'9') => State::IntDigit,
            (State::IntDigit, b'.') => State::DecimalPoint,
            (State::DecimalPoint | State::DecimalDigit, b'0'..=b'9') => State::DecimalDigit,
            (State::IntDigit | State::DecimalDigit, b'e' | b'E') => State::ExpE,
            (State::ExpE, b'+' | b'-') => State::ExpSign,
            (State::ExpE | State::ExpSign | State::ExpDigit, b'0'..=b'9') => State::ExpDigit,
            _ => return false,
        };
    }

    matches!(
        state,
        State::IntDigit | State::DecimalDigit | State::ExpDigit
    )
}
