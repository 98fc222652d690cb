//! Transform program parsed from (or generated into) an image request path
//!
//! A [`Params`] value is the structured form of a path such as
//! `unsafe/fit-in/300x200/filters:format(webp)/bucket/image.jpg`.
//! It serialises to the JSON body served by the `params/` endpoint.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::generate::generate_path;
use crate::error::PathError;

/// Which corner's colour is sampled when trimming
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrimAnchor {
    #[default]
    TopLeft,
    BottomRight,
}

impl TrimAnchor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::BottomRight => "bottom-right",
        }
    }

    fn is_default(&self) -> bool {
        *self == Self::TopLeft
    }
}

/// Horizontal alignment used when cropping to fit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HAlign {
    #[default]
    None,
    Left,
    Right,
}

impl HAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    fn is_none(&self) -> bool {
        *self == Self::None
    }
}

/// Vertical alignment used when cropping to fit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VAlign {
    #[default]
    None,
    Top,
    Bottom,
}

impl VAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }

    fn is_none(&self) -> bool {
        *self == Self::None
    }
}

/// A single `name(args)` directive of a filter chain
///
/// `args` is kept verbatim; it may itself contain a nested image path with
/// its own filter chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub args: String,
}

impl Filter {
    pub fn new(name: impl Into<String>, args: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: args.into(),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.args)
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero_i32(value: &i32) -> bool {
    *value == 0
}

fn is_zero_f64(value: &f64) -> bool {
    *value == 0.0
}

/// Image request parameters
///
/// Crop values are stored exactly as written. Whether they are pixels or
/// fractions of the source dimensions is decided by the transform engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Request asked for metadata (`params/` prefix)
    #[serde(skip)]
    pub is_meta_request: bool,
    /// Memoised canonical path: everything after the signature or `unsafe/`
    #[serde(rename = "path", skip_serializing_if = "String::is_empty")]
    pub canonical_path: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub image: String,
    /// Emit the image as `b64:<base64url>` when generating
    #[serde(skip_serializing_if = "is_false")]
    pub base64_image: bool,
    #[serde(rename = "unsafe", skip_serializing_if = "is_false")]
    pub is_unsafe: bool,
    #[serde(rename = "hash", skip_serializing_if = "String::is_empty")]
    pub signature: String,
    #[serde(skip_serializing_if = "is_false")]
    pub meta: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub trim: bool,
    #[serde(rename = "trim_by", skip_serializing_if = "TrimAnchor::is_default")]
    pub trim_anchor: TrimAnchor,
    #[serde(skip_serializing_if = "is_zero_i32")]
    pub trim_tolerance: i32,
    #[serde(skip_serializing_if = "is_zero_f64")]
    pub crop_left: f64,
    #[serde(skip_serializing_if = "is_zero_f64")]
    pub crop_top: f64,
    #[serde(skip_serializing_if = "is_zero_f64")]
    pub crop_right: f64,
    #[serde(skip_serializing_if = "is_zero_f64")]
    pub crop_bottom: f64,
    #[serde(skip_serializing_if = "is_false")]
    pub fit_in: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub stretch: bool,
    #[serde(skip_serializing_if = "is_zero_i32")]
    pub width: i32,
    #[serde(skip_serializing_if = "is_zero_i32")]
    pub height: i32,
    #[serde(skip_serializing_if = "is_zero_i32")]
    pub padding_left: i32,
    #[serde(skip_serializing_if = "is_zero_i32")]
    pub padding_top: i32,
    #[serde(skip_serializing_if = "is_zero_i32")]
    pub padding_right: i32,
    #[serde(skip_serializing_if = "is_zero_i32")]
    pub padding_bottom: i32,
    #[serde(skip_serializing_if = "is_false")]
    pub h_flip: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub v_flip: bool,
    #[serde(skip_serializing_if = "HAlign::is_none")]
    pub h_align: HAlign,
    #[serde(skip_serializing_if = "VAlign::is_none")]
    pub v_align: VAlign,
    #[serde(skip_serializing_if = "is_false")]
    pub smart: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Filter>,
}

impl Params {
    /// Canonical path, generated on demand when not memoised
    pub fn canonical(&self) -> Cow<'_, str> {
        if self.canonical_path.is_empty() {
            Cow::Owned(generate_path(self))
        } else {
            Cow::Borrowed(&self.canonical_path)
        }
    }

    /// Memoise the generated canonical path
    ///
    /// Hand-built params must go through this (or carry a parsed path)
    /// before being handed to a signer or hasher that expects one.
    pub fn with_canonical_path(mut self) -> Self {
        self.canonical_path = generate_path(&self);
        self
    }

    /// Last filter with the given name, if any
    pub fn filter(&self, name: &str) -> Option<&Filter> {
        self.filters.iter().rev().find(|f| f.name == name)
    }

    /// True when the request carries no signature and no `unsafe/` marker
    pub fn is_internal(&self) -> bool {
        !self.is_unsafe && self.signature.is_empty()
    }

    /// Parse `path` on top of base params such as `filters:format(webp)`
    ///
    /// The base carries no image, so it is read as a directory prefix with an
    /// implied trailing `/`.
    pub fn apply_base(base: &str, path: &str) -> Self {
        let base = base.trim_end_matches('/');
        if base.is_empty() {
            return super::parse::parse(path);
        }
        let base = super::parse::parse(&format!("{}/", base));
        super::parse::apply(base, path)
    }

    /// JSON body served for `params/` requests
    pub fn to_json(&self) -> Result<String, PathError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PathError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl FromStr for Params {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(super::parse::parse(s))
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&generate_path(self))
    }
}
