//! Storage key strategies
//!
//! Source images and transformed results are stored under keys derived
//! either from the image key itself or from the whole transform program.
//!
//! # Key formats
//! - Digest: `{sha1[0..2]}/{sha1[2..4]}/{sha1[4..]}`
//! - Suffix: `{image stem}.{sha1[0..20]}{.ext}`
//! - Size suffix: `{image stem}.{sha1[0..20]}_{W}x{H}{.ext}`
//!
//! These are cache keys, not a security boundary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use super::normalize::{normalize, SafeChars};
use super::params::Params;
use crate::constants::SUFFIX_HASH_LEN;
use crate::error::PathError;

/// Key under which a source image is stored
pub trait StorageHasher: Send + Sync + fmt::Debug {
    fn hash(&self, image: &str) -> String;
}

/// Key under which a transformed result is stored
pub trait ResultStorageHasher: Send + Sync + fmt::Debug {
    fn hash_result(&self, params: &Params) -> String;
}

/// Lowercase hex SHA-1 of the input
fn sha1_hex(input: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Shard a hex digest into `aa/bb/rest`
fn digest_path(input: &str) -> String {
    let digest = sha1_hex(input);
    format!("{}/{}/{}", &digest[..2], &digest[2..4], &digest[4..])
}

/// Source key as the normalised image key
#[derive(Debug, Clone, Default)]
pub struct OriginalStorageHasher {
    safe_chars: SafeChars,
}

impl OriginalStorageHasher {
    pub fn new(safe_chars: SafeChars) -> Self {
        Self { safe_chars }
    }
}

impl StorageHasher for OriginalStorageHasher {
    fn hash(&self, image: &str) -> String {
        normalize(image, Some(&self.safe_chars))
    }
}

/// Source key as a sharded SHA-1 of the image key
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestStorageHasher;

impl StorageHasher for DigestStorageHasher {
    fn hash(&self, image: &str) -> String {
        digest_path(image)
    }
}

/// Result key as the normalised canonical path
#[derive(Debug, Clone, Default)]
pub struct OriginalResultStorageHasher {
    safe_chars: SafeChars,
}

impl OriginalResultStorageHasher {
    pub fn new(safe_chars: SafeChars) -> Self {
        Self { safe_chars }
    }
}

impl ResultStorageHasher for OriginalResultStorageHasher {
    fn hash_result(&self, params: &Params) -> String {
        normalize(&params.canonical(), Some(&self.safe_chars))
    }
}

/// Result key as a sharded SHA-1 of the canonical path
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestResultStorageHasher;

impl ResultStorageHasher for DigestResultStorageHasher {
    fn hash_result(&self, params: &Params) -> String {
        digest_path(&params.canonical())
    }
}

/// Result key next to the source image, hash inserted before the extension
#[derive(Debug, Clone, Copy, Default)]
pub struct SuffixResultStorageHasher;

impl ResultStorageHasher for SuffixResultStorageHasher {
    fn hash_result(&self, params: &Params) -> String {
        suffix_key(params, false)
    }
}

/// Like [`SuffixResultStorageHasher`], with `_{W}x{H}` after the hash
#[derive(Debug, Clone, Copy, Default)]
pub struct SizeSuffixResultStorageHasher;

impl ResultStorageHasher for SizeSuffixResultStorageHasher {
    fn hash_result(&self, params: &Params) -> String {
        suffix_key(params, true)
    }
}

fn suffix_key(params: &Params, with_size: bool) -> String {
    let digest = sha1_hex(&params.canonical());
    let mut suffix = format!(".{}", &digest[..SUFFIX_HASH_LEN]);
    if with_size {
        suffix.push_str(&format!("_{}x{}", params.width, params.height));
    }

    let image = params.image.as_str();
    let extension_at = image
        .rfind('.')
        .filter(|&dot| image.rfind('/').map_or(true, |slash| slash < dot));
    match extension_at {
        Some(dot) => {
            let extension = if params.meta {
                ".json".to_string()
            } else if let Some(format) = params.filter("format") {
                format!(".{}", format.args)
            } else {
                image[dot..].to_string()
            };
            format!("{}{}{}", &image[..dot], suffix, extension)
        }
        None => format!("{}{}", image, suffix),
    }
}

/// How source images are keyed in storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoragePathStyle {
    #[default]
    Original,
    Digest,
}

impl StoragePathStyle {
    pub fn hasher(&self, safe_chars: SafeChars) -> Box<dyn StorageHasher> {
        match self {
            Self::Original => Box::new(OriginalStorageHasher::new(safe_chars)),
            Self::Digest => Box::new(DigestStorageHasher),
        }
    }
}

impl FromStr for StoragePathStyle {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "original" => Ok(Self::Original),
            "digest" => Ok(Self::Digest),
            _ => Err(PathError::Config(format!(
                "unknown storage path style '{}', expected original or digest",
                s
            ))),
        }
    }
}

/// How transformed results are keyed in storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStoragePathStyle {
    #[default]
    Original,
    Digest,
    Suffix,
    SizeSuffix,
}

impl ResultStoragePathStyle {
    pub fn hasher(&self, safe_chars: SafeChars) -> Box<dyn ResultStorageHasher> {
        match self {
            Self::Original => Box::new(OriginalResultStorageHasher::new(safe_chars)),
            Self::Digest => Box::new(DigestResultStorageHasher),
            Self::Suffix => Box::new(SuffixResultStorageHasher),
            Self::SizeSuffix => Box::new(SizeSuffixResultStorageHasher),
        }
    }
}

impl FromStr for ResultStoragePathStyle {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "original" => Ok(Self::Original),
            "digest" => Ok(Self::Digest),
            "suffix" => Ok(Self::Suffix),
            "size_suffix" | "size-suffix" => Ok(Self::SizeSuffix),
            _ => Err(PathError::Config(format!(
                "unknown result storage path style '{}', expected original, digest, suffix or size_suffix",
                s
            ))),
        }
    }
}
