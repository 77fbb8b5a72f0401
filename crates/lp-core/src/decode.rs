//! Query-component percent-decoding
//!
//! Captured groups and parameter names are decoded the way a query string
//! component is: `+` is a space and every `%` must introduce two hex digits.
//! Anything else is a decode failure and callers fall back to the raw text.

use std::borrow::Cow;

use percent_encoding::percent_decode;

/// Decode a query component, or `None` if the escape sequences are
/// malformed or the decoded bytes are not UTF-8.
pub fn decode_component(input: &str) -> Option<Cow<'_, str>> {
    let bytes = input.as_bytes();
    if !bytes.iter().any(|&b| b == b'%' || b == b'+') {
        return Some(Cow::Borrowed(input));
    }

    if !has_valid_escapes(bytes) {
        return None;
    }

    let spaced = input.replace('+', " ");
    percent_decode(spaced.as_bytes())
        .decode_utf8()
        .ok()
        .map(|decoded| Cow::Owned(decoded.into_owned()))
}

/// Decode a query component, returning the raw text unchanged on failure.
pub fn decode_or_raw(input: &str) -> Cow<'_, str> {
    decode_component(input).unwrap_or(Cow::Borrowed(input))
}

fn has_valid_escapes(bytes: &[u8]) -> bool {
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if i + 2 >= bytes.len()
                || !bytes[i + 1].is_ascii_hexdigit()
                || !bytes[i + 2].is_ascii_hexdigit()
            {
                return false;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    true
}
