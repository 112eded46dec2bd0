//! Extension tables shared by parsing, resolution and routing.
//!
//! The pipeline distinguishes three kinds of module:
//!
//! - **Script**: JavaScript-family sources that are parsed for imports
//! - **Style**: stylesheet sources that are scanned for `@import`
//! - **Asset**: everything else (classified by size, never parsed)

/// Extensions treated as script modules
pub const SCRIPT_EXTENSIONS: &[&str] = &[
    "js",  // JavaScript
    "jsx", // JavaScript with JSX
    "mjs", // JavaScript module
    "vue", // single-file component (script block is extracted)
    "json",
];

/// Extensions treated as style modules
pub const STYLE_EXTENSIONS: &[&str] = &["css", "less"];

/// Extensions to try when resolving extensionless requests (in priority
/// order). The configuration file may override this list.
pub const RESOLVE_EXTENSIONS: &[&str] = &["js", "vue", "json", "jsx"];

/// Index file names to try when a request resolves to a directory
pub const INDEX_FILES: &[&str] = &["index.js", "index.vue", "index.json", "index.jsx"];
