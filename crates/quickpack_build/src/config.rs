use anyhow::{Result, anyhow};
use clap::Parser;
use log::{debug, info};
use std::path::PathBuf;

use quickpack_core::{BuildConfig, find_project_root, load_build_config};

#[derive(Debug, Clone, Parser)]
#[command(name = "build")]
#[command(about = "Build the project into a hashed output tree")]
pub struct Config {
    /// Root directory of the project (defaults to the nearest parent with a
    /// quickpack.config.json or .git)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Configuration file path, relative to the root
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the configured mode (development | production)
    #[arg(long)]
    pub mode: Option<String>,

    #[clap(skip)]
    pub build: Option<BuildConfig>,
}

impl Config {
    /// Initialize the config: resolve the root directory and load the
    /// configuration file.
    pub fn initialize(&mut self) -> Result<()> {
        let root = if let Some(r) = self.root.take() {
            debug!("Using provided root directory: {:?}", r);
            r.canonicalize().unwrap_or(r)
        } else {
            debug!("No root provided, searching for project root");
            find_project_root()?
        };
        info!("Using root directory: {}", root.display());

        let mut build = load_build_config(&root, self.config.as_deref())?;
        if let Some(mode) = &self.mode {
            build.mode = mode.parse()?;
            debug!("Mode overridden to {:?} from the command line", build.mode);
        }

        self.root = Some(root);
        self.build = Some(build);
        Ok(())
    }

    /// Get the root directory, returning an error if not initialized
    pub fn root(&self) -> Result<&PathBuf> {
        self.root
            .as_ref()
            .ok_or_else(|| anyhow!("Config not initialized - call initialize() first"))
    }

    /// Get the loaded build configuration, returning an error if not
    /// initialized
    pub fn build(&self) -> Result<&BuildConfig> {
        self.build
            .as_ref()
            .ok_or_else(|| anyhow!("Config not initialized - call initialize() first"))
    }
}
