use anyhow::{Context, Result};
use dashmap::DashMap;
use log::{debug, trace, warn};
use std::{
    collections::{HashSet, VecDeque},
    fs,
    path::PathBuf,
};

use quickpack_core::{ModuleKind, ResolveConfig, Specifier, imports_for, resolve};

use crate::types::{ModuleGraph, ModuleInfo};

/// Walk the import graph breadth-first from the entry, recording every
/// reachable module with its size, kind and distinct importers. Asset
/// modules are leaves; they are recorded but never parsed.
///
/// An import that fails to resolve is logged and skipped — the module may
/// reference something provided at runtime — while an unreadable module
/// file aborts the build.
pub fn build_graph(
    root: &std::path::Path,
    resolve_cfg: &ResolveConfig,
    entry: &PathBuf,
    import_cache: &DashMap<PathBuf, Vec<Specifier>>,
    resolve_cache: &DashMap<(PathBuf, String), Option<PathBuf>>,
) -> Result<ModuleGraph> {
    trace!("Building module graph from: {}", entry.display());
    let mut graph = ModuleGraph::default();
    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut queue: VecDeque<PathBuf> = VecDeque::from([entry.clone()]);

    while let Some(cur) = queue.pop_front() {
        if !visited.insert(cur.clone()) {
            continue;
        }
        trace!("Visiting module: {}", cur.display());

        let size = fs::metadata(&cur)
            .with_context(|| format!("failed to stat {}", cur.display()))?
            .len();
        let kind = ModuleKind::of(&cur);
        graph.order.push(cur.clone());
        graph.modules.insert(cur.clone(), ModuleInfo { size, kind });

        if kind == ModuleKind::Asset {
            continue;
        }

        let specs = imports_for(&cur, import_cache).unwrap_or_default();
        trace!("Module has {} imports", specs.len());

        for s in specs {
            match resolve(root, resolve_cfg, &cur, &s.request, resolve_cache)? {
                Some(next) => {
                    graph.importers.entry(next.clone()).or_default().insert(cur.clone());
                    if !visited.contains(&next) {
                        trace!("Queueing: {}", next.display());
                        queue.push_back(next);
                    }
                }
                None => {
                    warn!("Could not resolve '{}' from {}", s.request, cur.display());
                }
            }
        }
    }

    debug!("Module graph has {} modules", graph.order.len());
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, path: &str, content: &str) -> PathBuf {
        let file_path = dir.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }

    fn canon(p: &Path) -> PathBuf {
        p.canonicalize().unwrap_or_else(|_| p.to_path_buf())
    }

    fn graph_for(root: &Path, entry: &PathBuf) -> ModuleGraph {
        let import_cache = DashMap::new();
        let resolve_cache = DashMap::new();
        build_graph(root, &ResolveConfig::default(), entry, &import_cache, &resolve_cache)
            .unwrap()
    }

    #[test]
    fn test_graph_simple() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let entry = create_test_file(root, "src/main.js", "import './a'; import './b';");
        let a = create_test_file(root, "src/a.js", "// a");
        let b = create_test_file(root, "src/b.js", "// b");

        let graph = graph_for(root, &entry);
        assert_eq!(graph.order.len(), 3);
        assert!(graph.modules.contains_key(&canon(&a)));
        assert!(graph.modules.contains_key(&canon(&b)));
        // Entry visits first
        assert_eq!(graph.order[0], entry);
    }

    #[test]
    fn test_graph_circular() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let entry = create_test_file(root, "src/main.js", "import './a';");
        create_test_file(root, "src/a.js", "import './b';");
        create_test_file(root, "src/b.js", "import './a';");

        let graph = graph_for(root, &entry);
        assert_eq!(graph.order.len(), 3);
    }

    #[test]
    fn test_graph_reference_counts() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let entry = create_test_file(root, "src/main.js", "import './a'; import './b';");
        create_test_file(root, "src/a.js", "import './shared';");
        create_test_file(root, "src/b.js", "import './shared';");
        let shared = create_test_file(root, "src/shared.js", "// shared");

        let graph = graph_for(root, &entry);
        assert_eq!(graph.reference_count(&canon(&shared)), 2);
        assert_eq!(graph.reference_count(&entry), 0);
    }

    #[test]
    fn test_graph_assets_are_leaves() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let entry = create_test_file(root, "src/main.js", "import './logo.png';");
        let logo = create_test_file(root, "src/logo.png", "binary-ish");

        let graph = graph_for(root, &entry);
        let info = &graph.modules[&canon(&logo)];
        assert_eq!(info.kind, ModuleKind::Asset);
        assert_eq!(info.size, "binary-ish".len() as u64);
    }

    #[test]
    fn test_graph_unresolved_import_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let entry = create_test_file(root, "src/main.js", "import 'not-installed';");

        let graph = graph_for(root, &entry);
        assert_eq!(graph.order.len(), 1);
    }

    #[test]
    fn test_graph_styles_traversed() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let entry = create_test_file(root, "src/main.js", "import './app.css';");
        create_test_file(root, "src/app.css", "@import './base.css';\nbody {}\n");
        let base = create_test_file(root, "src/base.css", "* {}\n");

        let graph = graph_for(root, &entry);
        assert_eq!(graph.order.len(), 3);
        assert_eq!(graph.modules[&canon(&base)].kind, ModuleKind::Style);
    }
}
