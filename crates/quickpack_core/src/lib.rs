//! Core utilities for the quickpack build pipeline.
//!
//! This crate provides the policy-free plumbing shared by the build stages:
//! - Loading the build configuration file (`quickpack.config.json`)
//! - Parsing import statements out of JS/JSX/Vue sources
//! - Resolving module requests (relative, aliased, module search paths,
//!   node_modules)
//! - Extension and module-kind tables

mod config;
mod constants;
mod parser;
mod resolver;
mod types;

// Re-export public API
pub use config::{
    AssetLimits, BuildConfig, CacheGroup, CopyEntry, HtmlConfig, Mode, OutputConfig, ResolveConfig,
    RuleConfig, TransformTag, TransformerDesc, CONFIG_FILE, find_project_root, load_build_config,
};
pub use constants::{INDEX_FILES, RESOLVE_EXTENSIONS, SCRIPT_EXTENSIONS, STYLE_EXTENSIONS};
pub use parser::{imports_for, script_block, syntax_errors};
pub use resolver::resolve;
pub use types::{ModuleKind, SpecKind, Specifier};
