use log::{debug, trace};
use std::collections::HashMap;

use quickpack_core::{CacheGroup, ModuleKind};

use crate::types::{Chunk, ChunkPlan, ModuleGraph};

/// Assign every script and style module to exactly one named bundle.
///
/// Groups are evaluated in descending priority, ties broken by declaration
/// order; the first satisfied predicate wins. A module no group claims
/// stays in the entry bundle — that is the normal case, never an error.
/// Asset modules are not partitioned; they go through the classifier.
pub fn assign_chunks(graph: &ModuleGraph, groups: &[CacheGroup], entry_chunk: &str) -> ChunkPlan {
    let mut ordered: Vec<&CacheGroup> = groups.iter().collect();
    ordered.sort_by_key(|g| std::cmp::Reverse(g.priority));

    let mut plan = ChunkPlan::default();
    let mut members: HashMap<&str, Vec<std::path::PathBuf>> = HashMap::new();

    for module in &graph.order {
        let info = &graph.modules[module];
        if info.kind == ModuleKind::Asset {
            continue;
        }
        let refs = graph.reference_count(module);
        let chunk = ordered
            .iter()
            .find(|g| matches_group(g, module, refs, info.size))
            .map(|g| g.name.as_str())
            .unwrap_or(entry_chunk);
        trace!("Assigned {} to bundle '{}'", module.display(), chunk);
        members.entry(chunk).or_default().push(module.clone());
        plan.assignments.insert(module.clone(), chunk.to_string());
    }

    // Emission order: split groups first (by evaluated priority), entry last
    for group in &ordered {
        if let Some(modules) = members.remove(group.name.as_str()) {
            plan.chunks.push(Chunk { name: group.name.clone(), modules });
        }
    }
    if let Some(modules) = members.remove(entry_chunk) {
        plan.chunks.push(Chunk { name: entry_chunk.to_string(), modules });
    }

    debug!("Partitioned {} modules into {} bundles", plan.assignments.len(), plan.chunks.len());
    plan
}

fn matches_group(group: &CacheGroup, module: &std::path::Path, refs: usize, size: u64) -> bool {
    if let Some(test) = &group.test
        && !module.to_string_lossy().contains(test.as_str())
    {
        return false;
    }
    refs >= group.min_chunks && size >= group.min_size
}
