//! Utility module for decoding UTF-8 data into `char`s

/// Maximum number of UTF-8 bytes needed to encode one Unicode `char`
pub(crate) const MAX_BYTES_PER_CHAR: usize = 4;

const _2BYTE_MASK: u8 = 0b1110_0000;
/// Bit mask which matches the value bits of the 2 byte start
const _2BYTE_MASK_VAL: u8 = !_2BYTE_MASK;

const _3BYTE_MASK: u8 = 0b1111_0000;
/// Bit mask which matches the value bits of the 3 byte start
const _3BYTE_MASK_VAL: u8 = !_3BYTE_MASK;

const _4BYTE_MASK: u8 = 0b1111_1000;
/// Bit mask which matches the value bits of the 4 byte start
const _4BYTE_MASK_VAL: u8 = !_4BYTE_MASK;

const CONT_MASK: u8 = 0b1100_0000;
/// Bit mask which matches the value bits of the continuation byte
const CONT_MASK_VAL: u8 = !CONT_MASK;

/// Gets the total number of bytes of the char whose first byte is `b0`
///
/// Returns `None` if `b0` cannot start a UTF-8 encoded char, for example
/// because it is a continuation byte.
pub(crate) fn char_len(b0: u8) -> Option<usize> {
    if b0 <= 0x7F {
        Some(1)
    } else if (b0 & _2BYTE_MASK) == 0b1100_0000 {
        // 110x_xxxx
        Some(2)
    } else if (b0 & _3BYTE_MASK) == 0b1110_0000 {
        // 1110_xxxx
        Some(3)
    } else if (b0 & _4BYTE_MASK) == 0b1111_0000 {
        // 1111_0xxx
        Some(4)
    } else {
        None
    }
}

/// Whether the byte is a continuation byte of a char which is UTF-8 encoded as 2, 3 or 4 bytes
fn is_continuation(b: u8) -> bool {
    // 10xx_xxxx
    (b & CONT_MASK) == 0b1000_0000
}

/// Decodes the bytes of a single char
///
/// `bytes` must have the length reported by [`char_len`] for its first byte. Returns `None`
/// for malformed data: missing continuation bytes, 'overlong encodings', UTF-16 surrogate
/// chars encoded in UTF-8, or code points larger than U+10FFFF.
pub(crate) fn decode_char(bytes: &[u8]) -> Option<char> {
    if !bytes[1..].iter().all(|b| is_continuation(*b)) {
        return None;
    }

    let code_point = match *bytes {
        [b0] => u32::from(b0),
        [b0, b1] => {
            let code_point = u32::from(b0 & _2BYTE_MASK_VAL) << 6 | u32::from(b1 & CONT_MASK_VAL);
            if code_point < 0x80 {
                return None;
            }
            code_point
        }
        [b0, b1, b2] => {
            let code_point = u32::from(b0 & _3BYTE_MASK_VAL) << 12
                | u32::from(b1 & CONT_MASK_VAL) << 6
                | u32::from(b2 & CONT_MASK_VAL);
            if code_point < 0x800 {
                return None;
            }
            code_point
        }
        [b0, b1, b2, b3] => {
            let code_point = u32::from(b0 & _4BYTE_MASK_VAL) << 18
                | u32::from(b1 & CONT_MASK_VAL) << 12
                | u32::from(b2 & CONT_MASK_VAL) << 6
                | u32::from(b3 & CONT_MASK_VAL);
            if code_point < 0x10000 {
                return None;
            }
            code_point
        }
        _ => return None,
    };
    // Rejects surrogates and values > U+10FFFF
    char::from_u32(code_point)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_len_values() {
        assert_eq!(Some(1), char_len(b'a'));
        assert_eq!(Some(2), char_len(0xC3));
        assert_eq!(Some(3), char_len(0xE2));
        assert_eq!(Some(4), char_len(0xF0));
        // Continuation byte
        assert_eq!(None, char_len(0x80));
        assert_eq!(None, char_len(0xF8));
    }

    #[test]
    fn decode_valid() {
        for c in ['a', '\u{7F}', '\u{80}', 'ä', '\u{7FF}', '\u{800}', '€', '\u{FFFF}', '\u{10000}', '\u{10FFFF}'] {
            let mut buf = [0_u8; MAX_BYTES_PER_CHAR];
            let bytes = c.encode_utf8(&mut buf).as_bytes();
            assert_eq!(Some(bytes.len()), char_len(bytes[0]), "length of {c:?}");
            assert_eq!(Some(c), decode_char(bytes), "decoding of {c:?}");
        }
    }

    #[test]
    fn decode_invalid() {
        // Overlong encodings
        assert_eq!(None, decode_char(b"\xC1\xBF"));
        assert_eq!(None, decode_char(b"\xE0\x9F\xBF"));
        assert_eq!(None, decode_char(b"\xF0\x8F\xBF\xBF"));
        // UTF-16 surrogate encoded in UTF-8
        assert_eq!(None, decode_char(b"\xED\xA0\x80"));
        // Larger than U+10FFFF
        assert_eq!(None, decode_char(b"\xF4\x90\x80\x80"));
        // Missing continuation byte
        assert_eq!(None, decode_char(b"\xC3a"));
    }
}
