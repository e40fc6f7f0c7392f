//! Tokenizer for the tag-letter wire format.
//!
//! Grammar (ASCII):
//!
//! ```text
//! message := prefix? field*
//! field   := TAG value
//! TAG     := 'a'..='z' | 'A'..='Z'
//! value   := (any byte that is not a TAG)*
//! ```
//!
//! Letters never occur inside values, so the next letter always ends the
//! current value. Bytes before the first tag (the `_` of a sync response)
//! are not part of any field. A NUL byte ends the message.
//!
//! Number parsing mirrors C's `atoi`/`atof`: the longest numeric prefix of
//! the value is used and anything unparseable reads as zero. A bad field
//! never aborts the rest of the message.

/// One `tag value` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field<'a> {
    pub tag: u8,
    pub value: &'a [u8],
}

/// Cut the message at the first NUL, if any.
pub fn truncate_at_nul(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}

pub fn fields(message: &[u8]) -> Fields<'_> {
    Fields {
        rest: truncate_at_nul(message),
    }
}

pub struct Fields<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for Fields<'a> {
    type Item = Field<'a>;

    fn next(&mut self) -> Option<Field<'a>> {
        let start = self.rest.iter().position(|b| b.is_ascii_alphabetic())?;
        let tag = self.rest[start];
        let body = &self.rest[start + 1..];
        let len = body
            .iter()
            .position(|b| b.is_ascii_alphabetic())
            .unwrap_or(body.len());
        self.rest = &body[len..];
        Some(Field {
            tag,
            value: &body[..len],
        })
    }
}

fn skip_space(value: &[u8]) -> &[u8] {
    let start = value
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(value.len());
    &value[start..]
}

/// Leading integer of `value`, saturating on overflow; 0 when absent.
pub fn int_prefix(value: &[u8]) -> i64 {
    let value = skip_space(value);
    let (negative, digits) = match value.first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };

    let mut n: i64 = 0;
    for &b in digits.iter().take_while(|b| b.is_ascii_digit()) {
        n = n.saturating_mul(10).saturating_add(i64::from(b - b'0'));
    }
    if negative {
        -n
    } else {
        n
    }
}

/// Leading decimal number of `value`; 0.0 when absent.
pub fn float_prefix(value: &[u8]) -> f32 {
    let value = skip_space(value);
    let mut end = 0;
    if matches!(value.first(), Some(b'-' | b'+')) {
        end = 1;
    }
    let mut seen_dot = false;
    while let Some(&b) = value.get(end) {
        match b {
            b'0'..=b'9' => {}
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }

    std::str::from_utf8(&value[..end])
        .ok()
        .and_then(|s| s.parse::<f32>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Split a comma-joined list, keeping empty positions so callers can tell
/// "second entry missing" from "list ended".
pub fn comma_list(value: &[u8]) -> impl Iterator<Item = &[u8]> {
    value.split(|&b| b == b',')
}
