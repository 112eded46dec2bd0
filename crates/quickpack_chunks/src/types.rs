use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
};

use quickpack_core::ModuleKind;

#[derive(Debug, Clone)]
pub struct ModuleInfo {
    pub size: u64,
    pub kind: ModuleKind,
}

/// The resolved import graph of one build.
#[derive(Debug, Default)]
pub struct ModuleGraph {
    /// Modules in first-visit order; bundle contents keep this order so
    /// two builds of the same tree emit identical bytes
    pub order: Vec<PathBuf>,
    pub modules: HashMap<PathBuf, ModuleInfo>,
    /// Distinct importing modules, per module
    pub importers: HashMap<PathBuf, HashSet<PathBuf>>,
}

impl ModuleGraph {
    pub fn reference_count(&self, module: &Path) -> usize {
        self.importers.get(module).map_or(0, |s| s.len())
    }
}

/// One named output bundle and its member modules (in graph order).
#[derive(Debug, Clone)]
pub struct Chunk {
    pub name: String,
    pub modules: Vec<PathBuf>,
}

/// The partitioning decision for a whole build.
#[derive(Debug, Default)]
pub struct ChunkPlan {
    /// Bundles in emission order: split groups by descending priority,
    /// the entry bundle last
    pub chunks: Vec<Chunk>,
    pub assignments: HashMap<PathBuf, String>,
}
