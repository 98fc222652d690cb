//! Storage-key normalisation
//!
//! Turns an arbitrary image key into a path-safe string usable as a file
//! system or object-store key:
//! - `.`/`..` segments are resolved and duplicate slashes collapsed,
//!   never climbing above the root
//! - leading and trailing `/` are trimmed
//! - bytes outside the safe set are percent-escaped, spaces become `+`

const UPPER_HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Line-break characters stripped from request paths and storage keys
const LINE_BREAKS: [char; 7] = [
    '\r', '\n', '\u{000B}', '\u{000C}', '\u{0085}', '\u{2028}', '\u{2029}',
];

/// Set of bytes left unescaped on top of the always-safe ones
///
/// Alphanumerics, `/`, `-`, `_`, `.` and `~` are always safe. Storage
/// backends widen the set through configuration (e.g. `{}`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeChars {
    extra: [bool; 256],
}

impl SafeChars {
    pub fn new(safe_chars: &str) -> Self {
        let mut extra = [false; 256];
        for b in safe_chars.bytes() {
            extra[b as usize] = true;
        }
        Self { extra }
    }

    /// Safe set for S3 object keys, which also tolerate `!'()*`
    pub fn s3(safe_chars: &str) -> Self {
        let mut chars = Self::new(safe_chars);
        for b in *b"!'()*" {
            chars.extra[b as usize] = true;
        }
        chars
    }

    pub fn should_escape(&self, c: u8) -> bool {
        default_should_escape(c) && !self.extra[c as usize]
    }
}

impl Default for SafeChars {
    fn default() -> Self {
        Self { extra: [false; 256] }
    }
}

/// Escape predicate used when no custom safe set is supplied
pub fn default_should_escape(c: u8) -> bool {
    !(c.is_ascii_alphanumeric() || matches!(c, b'/' | b'-' | b'_' | b'.' | b'~'))
}

/// Normalise an image key, optionally widening the safe set
pub fn normalize(image: &str, safe_chars: Option<&SafeChars>) -> String {
    match safe_chars {
        Some(chars) => normalize_with(image, |c| chars.should_escape(c)),
        None => normalize_with(image, default_should_escape),
    }
}

/// Normalise an image key with a caller-supplied escape predicate
pub fn normalize_with<F>(image: &str, should_escape: F) -> String
where
    F: Fn(u8) -> bool,
{
    let cleaned = strip_line_breaks(&clean(image));
    escape(cleaned.trim_matches('/'), should_escape)
}

pub(crate) fn is_line_break(c: char) -> bool {
    LINE_BREAKS.contains(&c)
}

pub(crate) fn strip_line_breaks(s: &str) -> String {
    if s.contains(is_line_break) {
        s.chars().filter(|c| !is_line_break(*c)).collect()
    } else {
        s.to_string()
    }
}

/// Lexically clean a path as if it were rooted
///
/// `..` at the root is dropped, so the result never refers above it.
fn clean(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

fn escape<F>(s: &str, should_escape: F) -> String
where
    F: Fn(u8) -> bool,
{
    let bytes = s.as_bytes();
    let mut space_count = 0;
    let mut hex_count = 0;
    for &c in bytes {
        if c == b' ' {
            space_count += 1;
        } else if should_escape(c) {
            hex_count += 1;
        }
    }

    if space_count == 0 && hex_count == 0 {
        return s.to_string();
    }

    if hex_count == 0 {
        if !should_escape(b' ') {
            return s.to_string();
        }
        return s.replace(' ', "+");
    }

    let mut out = String::with_capacity(bytes.len() + 2 * hex_count);
    let mut buf = [0u8; 4];
    for c in s.chars() {
        let encoded = c.encode_utf8(&mut buf).as_bytes();
        match encoded {
            [b' '] if should_escape(b' ') => out.push('+'),
            // a multi-byte character is escaped whole or not at all
            _ if encoded.iter().any(|&b| should_escape(b)) => {
                for &b in encoded {
                    out.push('%');
                    out.push(UPPER_HEX[(b >> 4) as usize] as char);
                    out.push(UPPER_HEX[(b & 15) as usize] as char);
                }
            }
            _ => out.push(c),
        }
    }
    out
}
