use anyhow::{Context, Result};
use ignore::WalkBuilder;
use log::{debug, trace, warn};
use std::{fs, path::Path};

use quickpack_core::CopyEntry;

/// Copy the configured static files/directories into the output tree.
/// Missing sources are logged and skipped; a project without a `static/`
/// directory still builds.
pub(crate) fn copy_entries(root: &Path, out_dir: &Path, entries: &[CopyEntry]) -> Result<usize> {
    let mut copied = 0;
    for entry in entries {
        let src = root.join(&entry.from);
        let dst = out_dir.join(&entry.to);

        if src.is_file() {
            if let Some(parent) = dst.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            fs::copy(&src, &dst)
                .with_context(|| format!("failed to copy {}", src.display()))?;
            trace!("Copied {} -> {}", src.display(), dst.display());
            copied += 1;
        } else if src.is_dir() {
            copied += copy_dir(&src, &dst)?;
        } else {
            warn!("Copy source {} does not exist, skipping", src.display());
        }
    }
    debug!("Copied {} static files", copied);
    Ok(copied)
}

fn copy_dir(src: &Path, dst: &Path) -> Result<usize> {
    let mut copied = 0;
    let walker = WalkBuilder::new(src).hidden(false).ignore(false).git_ignore(false).build();
    for res in walker {
        let dent = res?;
        let p = dent.path();
        if !p.is_file() {
            continue;
        }
        let rel = p.strip_prefix(src).unwrap_or(p);
        let target = dst.join(rel);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::copy(p, &target).with_context(|| format!("failed to copy {}", p.display()))?;
        trace!("Copied {} -> {}", p.display(), target.display());
        copied += 1;
    }
    Ok(copied)
}
