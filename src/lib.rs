// Image request path codec library
//
// Parses, generates, signs and hashes image-processing request paths.

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod path;

pub use error::PathError;
pub use path::{generate, generate_path, generate_unsafe, parse, Params};
