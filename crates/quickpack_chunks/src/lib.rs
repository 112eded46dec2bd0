//! Module graph construction and bundle partitioning.
//!
//! This crate walks the import graph from the entry file, records sizes and
//! reference counts, and assigns every script and style module to exactly
//! one named output bundle using ordered membership rules.

mod graph;
mod partitioner;
mod types;

// Re-export public API
pub use graph::build_graph;
pub use partitioner::assign_chunks;
pub use types::{Chunk, ChunkPlan, ModuleGraph, ModuleInfo};
