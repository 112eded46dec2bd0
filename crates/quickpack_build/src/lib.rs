//! The quickpack build driver.
//!
//! This crate wires the pipeline together: load the configuration once,
//! clean the output directory, walk the module graph, partition it into
//! named bundles, run each module through its transformer chain, classify
//! assets, and emit a hashed `dist/` tree with a generated HTML entry
//! document.
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```no_run
//! use quickpack_build::{Config, run_build};
//! use std::io::{BufWriter, Write};
//!
//! # fn main() -> anyhow::Result<()> {
//! let cfg = Config {
//!     root: Some(std::path::PathBuf::from("/path/to/project")),
//!     config: None,
//!     mode: None,
//!     build: None,
//! };
//!
//! let result = run_build(cfg)?;
//!
//! let mut stdout = BufWriter::new(std::io::stdout());
//! quickpack_build::print_build_report(&mut stdout, &result)?;
//! stdout.flush()?;
//! # Ok(())
//! # }
//! ```

mod collector;
mod config;
mod driver;
mod emitter;
mod html;
mod reporter;
mod transform;
mod types;

// Re-export public API
pub use config::Config;
pub use driver::run_build;
pub use reporter::print_build_report;
pub use types::{AssetOutput, BuildResult, EmittedAsset, EmittedChunk};
