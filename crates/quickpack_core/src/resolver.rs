use anyhow::Result;
use dashmap::DashMap;
use log::{debug, trace};
use path_clean::clean;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::config::ResolveConfig;
use crate::constants::INDEX_FILES;

/// Resolve a request to a file on disk, or `None` when nothing matches.
///
/// Lookup order follows the configuration: relative requests resolve against
/// the importing file, bare requests try the alias table, then the configured
/// module search directories, then a node_modules walk-up from the importing
/// file towards the root.
pub fn resolve(
    root: &Path,
    resolve_cfg: &ResolveConfig,
    from_file: &Path,
    request: &str,
    cache: &DashMap<(PathBuf, String), Option<PathBuf>>,
) -> Result<Option<PathBuf>> {
    let key = (from_file.to_path_buf(), request.to_string());
    if let Some(v) = cache.get(&key) {
        trace!("Cache hit for resolve: '{}' from {}", request, from_file.display());
        return Ok(v.clone());
    }
    trace!("Resolving: '{}' from {}", request, from_file.display());

    let resolved =
        if request.starts_with("./") || request.starts_with("../") || request.starts_with('/') {
            trace!("Resolving as relative request: '{}'", request);
            let base = from_file.parent().unwrap_or(root);
            let p = clean(base.join(request).to_string_lossy().to_string());
            resolve_file(Path::new(&p), &resolve_cfg.extensions)
        } else if let Some(hit) = resolve_alias(root, resolve_cfg, request) {
            hit
        } else if let Some(hit) = resolve_module_paths(root, resolve_cfg, request) {
            hit
        } else {
            trace!("Resolving as node_modules package: '{}'", request);
            let start_dir = from_file.parent().unwrap_or(root);
            resolve_node_module_from_dir(start_dir, request, root, &resolve_cfg.extensions)
        };

    cache.insert(key, resolved.clone());
    if resolved.is_some() {
        debug!("Resolved '{}' from {}", request, from_file.display());
    } else {
        trace!("Failed to resolve '{}' from {}", request, from_file.display());
    }
    Ok(resolved)
}

/// Alias lookup. Keys ending in `$` match the whole request; other keys
/// match as a prefix, with the remainder joined onto the target. Longer
/// keys are tried first so overlapping aliases resolve deterministically.
/// Returns `Some` when an alias key matched, even if no target resolved.
fn resolve_alias(
    root: &Path,
    resolve_cfg: &ResolveConfig,
    request: &str,
) -> Option<Option<PathBuf>> {
    let mut keys: Vec<&String> = resolve_cfg.alias.keys().collect();
    keys.sort_by_key(|k| std::cmp::Reverse(k.len()));

    for key in keys {
        let (matched, remainder) = if let Some(exact) = key.strip_suffix('$') {
            (request == exact, "")
        } else if request.starts_with(key.as_str()) {
            (true, request[key.len()..].trim_start_matches('/'))
        } else {
            (false, "")
        };
        if !matched {
            continue;
        }
        trace!("Matched alias '{}' for request '{}'", key, request);
        for target in &resolve_cfg.alias[key] {
            let base = root.join(target);
            let candidate = if remainder.is_empty() { base } else { base.join(remainder) };
            if let Some(resolved) = resolve_file(&candidate, &resolve_cfg.extensions) {
                trace!("Resolved alias '{}' to {:?}", key, resolved);
                return Some(Some(resolved));
            }
        }
        return Some(None);
    }
    None
}

/// Probe the configured module search directories (e.g. `src`,
/// `node_modules`) for a bare request.
fn resolve_module_paths(
    root: &Path,
    resolve_cfg: &ResolveConfig,
    request: &str,
) -> Option<Option<PathBuf>> {
    for dir in &resolve_cfg.modules {
        let candidate = root.join(dir).join(request);
        if let Some(resolved) = resolve_file(&candidate, &resolve_cfg.extensions) {
            trace!("Resolved '{}' via module path '{}'", request, dir);
            return Some(Some(resolved));
        }
    }
    None
}

fn resolve_file(p: &Path, extensions: &[String]) -> Option<PathBuf> {
    if p.is_file() {
        return Some(p.canonicalize().unwrap_or_else(|_| p.to_path_buf()));
    }

    for ext in extensions {
        let candidate = PathBuf::from(format!("{}.{}", p.display(), ext));
        if candidate.is_file() {
            return Some(candidate.canonicalize().unwrap_or(candidate));
        }
    }

    for index_file in INDEX_FILES {
        let candidate = p.join(index_file);
        if candidate.is_file() {
            return Some(candidate.canonicalize().unwrap_or(candidate));
        }
    }

    None
}

fn resolve_node_module_from_dir(
    start_dir: &Path,
    pkg: &str,
    workspace_root: &Path,
    extensions: &[String],
) -> Option<PathBuf> {
    trace!("Walking up from {:?} to find node_modules for '{}'", start_dir, pkg);
    let mut current_dir = start_dir;

    loop {
        let result = resolve_node_module(current_dir, pkg, extensions);
        if result.is_some() {
            return result;
        }

        // Stop at the project root
        if current_dir == workspace_root {
            break;
        }

        current_dir = current_dir.parent()?;
    }

    None
}

fn resolve_node_module(root: &Path, pkg: &str, extensions: &[String]) -> Option<PathBuf> {
    // Handles scoped packages like @scope/pkg through the plain join
    let nm = root.join("node_modules").join(pkg);
    if !nm.exists() {
        trace!("node_modules path does not exist: {:?}", nm);
        return None;
    }
    trace!("Checking node_modules at: {:?}", nm);

    // Request with an explicit subpath, e.g. lodash/merge
    if nm.is_file() {
        return Some(nm.canonicalize().unwrap_or(nm));
    }

    let pkg_json = nm.join("package.json");
    if pkg_json.exists()
        && let Ok(txt) = fs::read_to_string(&pkg_json)
        && let Ok(v) = serde_json::from_str::<serde_json::Value>(&txt)
    {
        // Prefer the ESM entry point, then main
        for field in ["module", "main"] {
            if let Some(s) = v.get(field).and_then(|x| x.as_str()) {
                let p = nm.join(s);
                if let Some(resolved) = resolve_file(&p, extensions) {
                    return Some(resolved);
                }
            }
        }
    }

    for index_file in INDEX_FILES {
        let p = nm.join(index_file);
        if p.is_file() {
            return Some(p.canonicalize().unwrap_or(p));
        }
    }

    None
}
