// Constants module - centralized default values
//
// Values that shape the wire format or the storage keys live here so the
// parser, generator and hashers agree on them.

// =============================================================================
// Path format
// =============================================================================

/// Minimum length of a token read as a URL signature
pub const MIN_SIGNATURE_LEN: usize = 9;

// =============================================================================
// Storage keys
// =============================================================================

/// Number of hex digest characters inserted by suffix result keys
pub const SUFFIX_HASH_LEN: usize = 20;

// =============================================================================
// Configuration defaults
// =============================================================================

/// Default configuration file looked up by the CLI
pub const DEFAULT_CONFIG_FILE: &str = "imagepath.yaml";

/// Default log filter when RUST_LOG is unset
pub const DEFAULT_LOG_FILTER: &str = "info";
