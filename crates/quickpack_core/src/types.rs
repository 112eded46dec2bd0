use std::path::Path;

use crate::constants::{SCRIPT_EXTENSIONS, STYLE_EXTENSIONS};

/// A single import request found in a source file.
#[derive(Debug, Clone)]
pub struct Specifier {
    pub request: String,
    pub kind: SpecKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecKind {
    Static,
    Dynamic,
}

/// How the pipeline treats a resolved module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    /// Parsed for imports, transformed, concatenated into a JS bundle
    Script,
    /// Scanned for `@import`, extracted into a per-bundle CSS file
    Style,
    /// Classified by size and either inlined or emitted as a file
    Asset,
}

impl ModuleKind {
    pub fn of(path: &Path) -> ModuleKind {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if SCRIPT_EXTENSIONS.contains(&ext) => ModuleKind::Script,
            Some(ext) if STYLE_EXTENSIONS.contains(&ext) => ModuleKind::Style,
            _ => ModuleKind::Asset,
        }
    }
}
