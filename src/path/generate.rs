//! Request path generator, the inverse of [`parse`](super::parse::parse)
//!
//! The generated string is both the canonical cache key and the message that
//! gets signed. It is re-read behind its `unsafe/` marker or signature, so
//! for any parsed params `p`:
//! ```text
//! generate_path(parse(generate_unsafe(p))) == generate_path(p)
//! ```
//! A bare canonical path is not self-delimiting: a leading token of nine or
//! more signature characters (`1000x1000/`, `photos2024/`) reads as a
//! signature when no marker precedes it.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

use super::normalize::is_line_break;
use super::params::{HAlign, Params, TrimAnchor, VAlign};
use super::parse::apply_segments;
use super::signer::Signer;

/// Canonical path of the params, without signature or `unsafe/` marker
pub fn generate_path(p: &Params) -> String {
    let mut parts: Vec<String> = Vec::new();

    if p.meta {
        parts.push("meta".to_string());
    }

    if p.trim {
        let mut trim = String::from("trim");
        if p.trim_anchor == TrimAnchor::BottomRight {
            trim.push(':');
            trim.push_str(TrimAnchor::BottomRight.as_str());
        }
        if p.trim_tolerance > 0 {
            trim.push_str(&format!(":{}", p.trim_tolerance));
        }
        parts.push(trim);
    }

    if p.crop_left != 0.0 || p.crop_top != 0.0 || p.crop_right != 0.0 || p.crop_bottom != 0.0 {
        // f64 Display is the shortest exact decimal, never exponent notation
        parts.push(format!(
            "{}x{}:{}x{}",
            p.crop_left, p.crop_top, p.crop_right, p.crop_bottom
        ));
    }

    if p.fit_in {
        parts.push("fit-in".to_string());
    }
    if p.stretch {
        parts.push("stretch".to_string());
    }

    if p.h_flip
        || p.width != 0
        || p.v_flip
        || p.height != 0
        || p.padding_left > 0
        || p.padding_top > 0
    {
        // negative sizes fold into the flip flags
        let h_flip = p.h_flip ^ (p.width < 0);
        let v_flip = p.v_flip ^ (p.height < 0);
        parts.push(format!(
            "{}{}x{}{}",
            if h_flip { "-" } else { "" },
            p.width.unsigned_abs(),
            if v_flip { "-" } else { "" },
            p.height.unsigned_abs()
        ));
    }

    if p.padding_left > 0 || p.padding_top > 0 || p.padding_right > 0 || p.padding_bottom > 0 {
        if p.padding_left == p.padding_right && p.padding_top == p.padding_bottom {
            parts.push(format!("{}x{}", p.padding_left, p.padding_top));
        } else {
            parts.push(format!(
                "{}x{}:{}x{}",
                p.padding_left, p.padding_top, p.padding_right, p.padding_bottom
            ));
        }
    }

    if p.h_align != HAlign::None {
        parts.push(p.h_align.as_str().to_string());
    }
    if p.v_align != VAlign::None {
        parts.push(p.v_align.as_str().to_string());
    }
    if p.smart {
        parts.push("smart".to_string());
    }

    if !p.filters.is_empty() {
        let chain: Vec<String> = p.filters.iter().map(|f| f.to_string()).collect();
        parts.push(format!("filters:{}", chain.join(":")));
    }

    parts.push(image_segment(p));
    parts.join("/")
}

/// `unsafe/` followed by the canonical path
pub fn generate_unsafe(p: &Params) -> String {
    generate(p, None)
}

/// Signed path `{signature}/{path}`, or the unsafe form without a signer
pub fn generate(p: &Params, signer: Option<&dyn Signer>) -> String {
    let path = generate_path(p);
    match signer {
        Some(signer) => format!("{}/{}", signer.sign(&path), path),
        None => format!("unsafe/{}", path),
    }
}

fn image_segment(p: &Params) -> String {
    if p.base64_image {
        return format!("b64:{}", URL_SAFE_NO_PAD.encode(&p.image));
    }
    if image_needs_escape(&p.image) {
        urlencoding::encode(&p.image).into_owned()
    } else {
        p.image.clone()
    }
}

/// Whether emitting the image verbatim could be read back differently
///
/// Query strings (`?`) are always escaped. So is anything a parser would
/// decode, strip or take for a leading directive.
fn image_needs_escape(image: &str) -> bool {
    if image.contains(['?', '%']) || image.starts_with('/') || image.contains(is_line_break) {
        return true;
    }
    let verbatim = Params {
        image: image.to_string(),
        ..Default::default()
    };
    apply_segments(Params::default(), image) != verbatim
}
