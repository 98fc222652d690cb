//! Request path parser
//!
//! A request path is decomposed in two stages. The outer stage peels off the
//! `params/` marker and the `unsafe/` marker or signature; what remains is the
//! canonical path. The inner stage walks the canonical path through a fixed
//! sequence of optional segments:
//!
//! ```text
//! [meta/][trim[:top-left|:bottom-right][:N]/][LxT:RxB/][fit-in/][stretch/]
//! [[-]Wx[-]H/][PxP[:PxP]/][left|right/][top|bottom/][smart/]
//! [filters:name(args)[:name(args)...]/]{image}
//! ```
//!
//! Each segment is a small parser taking the remaining input and returning
//! the parsed value together with what is left, or `None` when the segment is
//! absent. Absence never rejects the path: anything not recognised ends up in
//! the image.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

use super::normalize::strip_line_breaks;
use super::params::{Filter, HAlign, Params, TrimAnchor, VAlign};
use crate::constants::MIN_SIGNATURE_LEN;

/// Outcome of a segment parser: parsed value and the unconsumed input
type Parsed<'a, T> = Option<(T, &'a str)>;

/// Parse a request path into [`Params`]
pub fn parse(path: &str) -> Params {
    apply(Params::default(), path)
}

/// Parse a request path on top of existing params
///
/// Segments present in `path` overwrite the corresponding fields of `base`;
/// filters are appended after the base filters.
pub fn apply(mut params: Params, path: &str) -> Params {
    let path = strip_line_breaks(path);
    let mut rest = path.trim_start_matches('/');

    if let Some(r) = keyword(rest, "params") {
        params.is_meta_request = true;
        rest = r;
    }

    if let Some(r) = keyword(rest, "unsafe") {
        params.is_unsafe = true;
        rest = r;
    } else if let Some((token, r)) = signature(rest) {
        params.signature = token.to_string();
        rest = r;
    }

    params.canonical_path = rest.to_string();
    apply_segments(params, rest)
}

/// Walk the canonical path segments in order
pub(crate) fn apply_segments(mut params: Params, path: &str) -> Params {
    let mut rest = path.trim_start_matches('/');

    if let Some(r) = keyword(rest, "meta") {
        params.meta = true;
        rest = r;
    }
    if let Some(((anchor, tolerance), r)) = trim(rest) {
        params.trim = true;
        params.trim_anchor = anchor;
        params.trim_tolerance = tolerance;
        rest = r;
    }
    if let Some(([left, top, right, bottom], r)) = crop(rest) {
        params.crop_left = left;
        params.crop_top = top;
        params.crop_right = right;
        params.crop_bottom = bottom;
        rest = r;
    }
    if let Some(r) = keyword(rest, "fit-in") {
        params.fit_in = true;
        rest = r;
    }
    if let Some(r) = keyword(rest, "stretch") {
        params.stretch = true;
        rest = r;
    }
    if let Some((dims, r)) = dimensions(rest) {
        params.h_flip = dims.h_flip;
        params.width = dims.width;
        params.v_flip = dims.v_flip;
        params.height = dims.height;
        rest = r;
    }
    if let Some(([left, top, right, bottom], r)) = padding(rest) {
        params.padding_left = left;
        params.padding_top = top;
        params.padding_right = right;
        params.padding_bottom = bottom;
        rest = r;
    }
    if let Some((align, r)) = h_align(rest) {
        params.h_align = align;
        rest = r;
    }
    if let Some((align, r)) = v_align(rest) {
        params.v_align = align;
        rest = r;
    }
    if let Some(r) = keyword(rest, "smart") {
        params.smart = true;
        rest = r;
    }
    if let Some((chain, r)) = filters(rest) {
        params.filters.extend(chain);
        rest = r;
    }
    if !rest.is_empty() {
        let (image, base64) = decode_image(rest);
        params.image = image;
        params.base64_image = base64;
    }
    params
}

/// `word/`
fn keyword<'a>(input: &'a str, word: &str) -> Option<&'a str> {
    input.strip_prefix(word)?.strip_prefix('/')
}

/// Split off the leading run of ASCII digits (possibly empty)
fn digits(input: &str) -> (&str, &str) {
    let end = input
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(input.len());
    input.split_at(end)
}

/// One or more ASCII digits
fn digits1(input: &str) -> Parsed<'_, &str> {
    let (d, rest) = digits(input);
    if d.is_empty() {
        None
    } else {
        Some((d, rest))
    }
}

/// Integer value of a digit run; out-of-range values read as zero
fn int(digits: &str) -> i32 {
    digits.parse().unwrap_or_default()
}

fn is_signature_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'=')
}

/// URL-safe base64 token of at least [`MIN_SIGNATURE_LEN`] characters, then `/`
fn signature(input: &str) -> Parsed<'_, &str> {
    let end = input
        .bytes()
        .position(|b| !is_signature_byte(b))
        .unwrap_or(input.len());
    if end < MIN_SIGNATURE_LEN {
        return None;
    }
    let (token, rest) = input.split_at(end);
    Some((token, rest.strip_prefix('/')?))
}

/// `trim[:top-left|:bottom-right][:N]/`
fn trim(input: &str) -> Parsed<'_, (TrimAnchor, i32)> {
    let mut rest = input.strip_prefix("trim")?;
    let mut anchor = TrimAnchor::TopLeft;
    if let Some(r) = rest.strip_prefix(":top-left") {
        rest = r;
    } else if let Some(r) = rest.strip_prefix(":bottom-right") {
        anchor = TrimAnchor::BottomRight;
        rest = r;
    }
    let mut tolerance = 0;
    if let Some((d, r)) = rest.strip_prefix(':').and_then(digits1) {
        tolerance = int(d);
        rest = r;
    }
    Some(((anchor, tolerance), rest.strip_prefix('/')?))
}

/// Crop number: digits, optionally preceded by `.` or a single allowed
/// leading digit and `.` (`0.` for left/top, `0.` or `1.` for right/bottom)
fn crop_number<'a>(input: &'a str, leading: &[u8]) -> Parsed<'a, f64> {
    let bytes = input.as_bytes();
    let fraction_start = match bytes {
        [b'.', ..] => Some(1),
        [d, b'.', ..] if leading.contains(d) => Some(2),
        _ => None,
    };
    let end = match fraction_start {
        Some(start) => start + digits1(&input[start..])?.0.len(),
        None => digits1(input)?.0.len(),
    };
    let (number, rest) = input.split_at(end);
    let value = number
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or_default();
    Some((value, rest))
}

/// `LxT:RxB/`
fn crop(input: &str) -> Parsed<'_, [f64; 4]> {
    let (left, rest) = crop_number(input, b"0")?;
    let (top, rest) = crop_number(rest.strip_prefix('x')?, b"0")?;
    let (right, rest) = crop_number(rest.strip_prefix(':')?, b"01")?;
    let (bottom, rest) = crop_number(rest.strip_prefix('x')?, b"01")?;
    Some(([left, top, right, bottom], rest.strip_prefix('/')?))
}

struct Dimensions {
    h_flip: bool,
    width: i32,
    v_flip: bool,
    height: i32,
}

/// `[-]Wx[-]H/`, either number may be empty
fn dimensions(input: &str) -> Parsed<'_, Dimensions> {
    let (h_flip, rest) = match input.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, input),
    };
    let (width, rest) = digits(rest);
    let rest = rest.strip_prefix('x')?;
    let (v_flip, rest) = match rest.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, rest),
    };
    let (height, rest) = digits(rest);
    let dims = Dimensions {
        h_flip,
        width: int(width),
        v_flip,
        height: int(height),
    };
    Some((dims, rest.strip_prefix('/')?))
}

/// `LxT/` or `LxT:RxB/`; the short form mirrors left/top onto right/bottom
fn padding(input: &str) -> Parsed<'_, [i32; 4]> {
    let (left, rest) = digits1(input)?;
    let (top, rest) = digits1(rest.strip_prefix('x')?)?;
    let (left, top) = (int(left), int(top));

    let full = rest.strip_prefix(':').and_then(|r| {
        let (right, r) = digits1(r)?;
        let (bottom, r) = digits1(r.strip_prefix('x')?)?;
        Some(([left, top, int(right), int(bottom)], r))
    });
    match full {
        Some((values, r)) => Some((values, r.strip_prefix('/')?)),
        None => Some(([left, top, left, top], rest.strip_prefix('/')?)),
    }
}

fn h_align(input: &str) -> Parsed<'_, HAlign> {
    if let Some(r) = keyword(input, "left") {
        Some((HAlign::Left, r))
    } else {
        keyword(input, "right").map(|r| (HAlign::Right, r))
    }
}

fn v_align(input: &str) -> Parsed<'_, VAlign> {
    if let Some(r) = keyword(input, "top") {
        Some((VAlign::Top, r))
    } else {
        keyword(input, "bottom").map(|r| (VAlign::Bottom, r))
    }
}

/// `filters:<chain>/`
///
/// The chain ends at the first `)/` whose `)` closes a top-level `(`. A chain
/// that never closes before the end of input is not a filter segment.
fn filters(input: &str) -> Parsed<'_, Vec<Filter>> {
    let chain = input.strip_prefix("filters:")?;
    let bytes = chain.as_bytes();
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' if depth > 0 => {
                depth -= 1;
                if depth == 0 && bytes.get(i + 1) == Some(&b'/') {
                    return Some((split_filters(&chain[..=i]), &chain[i + 2..]));
                }
            }
            _ => {}
        }
    }
    tracing::trace!(input = %input, "unterminated filter chain treated as image");
    None
}

/// Split a chain on top-level `):` and read each piece as `name(args)`
///
/// A `):` nested inside an argument (for instance a watermark image path
/// carrying its own filter chain) does not split.
fn split_filters(chain: &str) -> Vec<Filter> {
    let bytes = chain.as_bytes();
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' if depth > 0 => {
                depth -= 1;
                if depth == 0 && bytes.get(i + 1) == Some(&b':') {
                    pieces.push(&chain[start..=i]);
                    start = i + 2;
                }
            }
            _ => {}
        }
    }
    pieces.push(&chain[start..]);

    pieces.into_iter().filter_map(filter).collect()
}

/// `name(args)` with a non-empty name
fn filter(piece: &str) -> Option<Filter> {
    let open = piece.find('(')?;
    let args = piece[open + 1..].strip_suffix(')')?;
    let name = &piece[..open];
    if name.is_empty() {
        return None;
    }
    Some(Filter {
        name: name.to_lowercase(),
        args: args.to_string(),
    })
}

/// Image identifier: `b64:` base64url payload, else query-unescaped
fn decode_image(raw: &str) -> (String, bool) {
    if let Some(encoded) = raw.strip_prefix("b64:") {
        let decoded = URL_SAFE_NO_PAD
            .decode(encoded)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok());
        if let Some(image) = decoded {
            return (image, true);
        }
    }
    match query_unescape(raw) {
        Some(image) => (image, false),
        None => (raw.to_string(), false),
    }
}

/// Query-string unescaping: `+` is a space and `%XX` a byte
///
/// All or nothing: a malformed escape or a result that is not UTF-8 yields
/// `None` and the caller keeps the raw text.
fn query_unescape(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b != b'%' {
            continue;
        }
        let well_formed = bytes
            .get(i + 1..i + 3)
            .map_or(false, |hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !well_formed {
            tracing::trace!(image = %raw, "malformed percent escape, image kept raw");
            return None;
        }
    }
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).ok().map(|decoded| decoded.into_owned())
}
