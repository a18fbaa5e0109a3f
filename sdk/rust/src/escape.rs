//! Percent-encoding rules
//!
//! Two encoders live here. [`form_escape`] is what the search endpoint expects
//! for terms and filter values. [`aws_canonical_query`] produces the query
//! string that goes into a SigV4 canonical request, which escapes a wider set
//! of reserved characters than the form encoder does.

use percent_encoding::{
    AsciiSet, NON_ALPHANUMERIC, percent_decode_str, percent_encode, utf8_percent_encode,
};

/// Everything except `A-Z a-z 0-9 _ . - ~` is escaped
const FORM: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~');

/// Generic URI escaping: unreserved and reserved characters are left alone
const URI_UNSAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b';')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b',')
    .remove(b'[')
    .remove(b']');

/// Reserved characters the service escapes in canonical queries although
/// generic URI escaping leaves them alone.
const AWS_RESERVED: [(char, &str); 7] = [
    ('(', "%28"),
    (')', "%29"),
    ('[', "%5B"),
    (']', "%5D"),
    (':', "%3A"),
    ('\'', "%27"),
    (',', "%2C"),
];

/// Form-style percent encoding (space becomes `+`, uppercase hex)
pub fn form_escape(value: &str) -> String {
    value
        .split(' ')
        .map(|part| utf8_percent_encode(part, FORM).to_string())
        .collect::<Vec<_>>()
        .join("+")
}

/// Build the canonical query string for a SigV4 canonical request.
///
/// Parameters are stable-sorted by name, then the whole string is decoded
/// and re-escaped with the service's reserved-character rules.
pub fn aws_canonical_query(query: &str) -> String {
    if query.is_empty() {
        return String::new();
    }

    let mut pairs: Vec<(&str, &str)> = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    let sorted = pairs
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    // Decoded bytes need not be valid UTF-8
    let decoded: Vec<u8> = percent_decode_str(&sorted).collect();
    let mut escaped = percent_encode(&decoded, URI_UNSAFE).to_string();
    for (ch, replacement) in AWS_RESERVED {
        escaped = escaped.replace(ch, replacement);
    }
    escaped
}
