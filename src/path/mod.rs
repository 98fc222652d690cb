//! Image request path codec
//!
//! Provides:
//! - Parsing of request paths into [`Params`]
//! - Generation of canonical paths from [`Params`], the exact inverse
//! - HMAC URL signing and verification
//! - Storage and result-storage key derivation
//! - Storage key normalisation
//!
//! # URL Format
//!
//! ```text
//! /[params/][unsafe/|{signature}/][meta/][trim[:top-left|:bottom-right][:N]/]
//!   [LxT:RxB/][fit-in/][stretch/][[-]Wx[-]H/][PxP[:PxP]/][left|right/]
//!   [top|bottom/][smart/][filters:name(args)[:name(args)...]/]{image}
//! ```
//!
//! # Example
//!
//! ```
//! use imagepath::path::{generate, parse, HmacSigner, Signer};
//!
//! let signer = HmacSigner::default_signer("secret");
//! let params = parse("unsafe/fit-in/300x200/filters:format(webp)/bucket/cat.jpg");
//! assert_eq!(params.width, 300);
//! assert_eq!(params.image, "bucket/cat.jpg");
//!
//! let signed = generate(&params, Some(&signer));
//! let reparsed = parse(&signed);
//! assert!(signer.verify(&reparsed.canonical_path, &reparsed.signature));
//! ```

pub mod generate;
pub mod hasher;
pub mod normalize;
pub mod params;
pub mod parse;
pub mod signer;

pub use generate::{generate, generate_path, generate_unsafe};
pub use hasher::{
    DigestResultStorageHasher, DigestStorageHasher, OriginalResultStorageHasher,
    OriginalStorageHasher, ResultStoragePathStyle, ResultStorageHasher,
    SizeSuffixResultStorageHasher, StorageHasher, StoragePathStyle, SuffixResultStorageHasher,
};
pub use normalize::{default_should_escape, normalize, normalize_with, SafeChars};
pub use params::{Filter, HAlign, Params, TrimAnchor, VAlign};
pub use parse::{apply, parse};
pub use signer::{HmacSigner, Signer, SignerAlgorithm};
