// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

use crate::constants::MIN_SIGNATURE_LEN;
use crate::error::PathError;
use crate::path::{
    parse, HmacSigner, Params, ResultStoragePathStyle, ResultStorageHasher, SafeChars,
    Signer, SignerAlgorithm, StorageHasher, StoragePathStyle,
};

/// Pattern for `${VAR_NAME}` references in YAML
static ENV_VAR_PATTERN: OnceLock<Regex> = OnceLock::new();

fn env_var_pattern() -> &'static Regex {
    ENV_VAR_PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("Invalid env var regex - this is a compile-time bug")
    })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub signer: SignerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    /// Params applied underneath every request, e.g. `filters:format(webp)`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_params: Option<String>,
}

/// URL signing configuration
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SignerConfig {
    /// HMAC secret
    #[serde(default)]
    pub secret: String,
    /// Digest algorithm (default: sha1)
    #[serde(default)]
    pub algorithm: SignerAlgorithm,
    /// Truncate signatures to this many characters (0 = full length)
    #[serde(default)]
    pub truncate: usize,
    /// Accept `unsafe/` paths without a signature (default: false)
    #[serde(default, rename = "unsafe")]
    pub allow_unsafe: bool,
}

impl std::fmt::Debug for SignerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignerConfig")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("truncate", &self.truncate)
            .field("allow_unsafe", &self.allow_unsafe)
            .finish()
    }
}

/// Storage key configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// How source images are keyed (default: original)
    #[serde(default)]
    pub path_style: StoragePathStyle,
    /// How results are keyed (default: original)
    #[serde(default)]
    pub result_path_style: ResultStoragePathStyle,
    /// Extra bytes left unescaped in normalised keys
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub safe_chars: String,
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, PathError> {
        let re = env_var_pattern();

        // First, check that all referenced environment variables exist
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                PathError::Config(format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                ))
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        Ok(serde_yaml::from_str(&substituted)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PathError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), PathError> {
        if self.signer.secret.is_empty() && !self.signer.allow_unsafe {
            return Err(PathError::Config(
                "signer.secret is required unless signer.unsafe is enabled".to_string(),
            ));
        }

        if self.signer.truncate > 0 && self.signer.truncate < MIN_SIGNATURE_LEN {
            return Err(PathError::Config(format!(
                "signer.truncate {} is shorter than the minimum signature length {}",
                self.signer.truncate, MIN_SIGNATURE_LEN
            )));
        }

        Ok(())
    }

    pub fn signer(&self) -> HmacSigner {
        HmacSigner::new(
            self.signer.algorithm,
            self.signer.truncate,
            self.signer.secret.as_bytes(),
        )
    }

    pub fn storage_hasher(&self) -> Box<dyn StorageHasher> {
        self.storage
            .path_style
            .hasher(SafeChars::new(&self.storage.safe_chars))
    }

    pub fn result_storage_hasher(&self) -> Box<dyn ResultStorageHasher> {
        self.storage
            .result_path_style
            .hasher(SafeChars::new(&self.storage.safe_chars))
    }

    /// Parse a request path on top of the configured base params
    pub fn parse_request(&self, path: &str) -> Params {
        match self.base_params.as_deref() {
            Some(base) => {
                tracing::trace!(base = %base, "applying base params");
                Params::apply_base(base, path)
            }
            None => parse(path),
        }
    }

    /// Check that a parsed request may be served
    ///
    /// Unsafe requests pass only when allowed; signed requests must carry the
    /// signature of their canonical path. Requests with neither are rejected.
    pub fn authorize(&self, params: &Params) -> Result<(), PathError> {
        if params.is_unsafe {
            if self.signer.allow_unsafe {
                return Ok(());
            }
            return Err(PathError::Unauthorized("unsafe requests are disabled".to_string()));
        }

        if params.signature.is_empty() {
            return Err(PathError::Unauthorized("missing URL signature".to_string()));
        }

        if self.signer().verify(&params.canonical_path, &params.signature) {
            Ok(())
        } else {
            Err(PathError::Unauthorized("invalid URL signature".to_string()))
        }
    }
}
