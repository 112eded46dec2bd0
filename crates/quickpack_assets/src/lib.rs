//! Asset classification and content hashing for the quickpack pipeline.
//!
//! Given an asset's extension and byte size, this crate decides whether the
//! asset is inlined into the referencing bundle as a data URI or emitted as
//! a separate file under a category subdirectory, with a content-hash in
//! its name for long-term caching.

mod classifier;
mod hasher;

// Re-export public API
pub use classifier::{AssetCategory, AssetDisposition, classify};
pub use hasher::{content_hash, render_template};
