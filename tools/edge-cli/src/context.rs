//! CLI execution context.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use cache_key_variations::VariationConfig;

use crate::config::{self, CONFIG_NAMES};
use crate::output::Output;

/// Execution context for CLI commands.
pub struct Context {
    /// Config file in use, if any.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Locate the config file. Nothing is parsed until a command asks.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let config_path = match config_path {
            Some(path) => Some(resolve_path(&cwd, path)),
            // Try to find config in current directory or parent directories
            None => Self::find_config(&cwd),
        };

        Ok(Self {
            config_path,
            output,
            cwd,
        })
    }

    /// The variations config: the located file, or the compiled-in defaults.
    pub fn variation_config(&self) -> Result<VariationConfig> {
        match &self.config_path {
            Some(path) => config::load(path),
            None => Ok(VariationConfig::embedded()?),
        }
    }

    /// Find config file in directory tree.
    fn find_config(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            for name in &CONFIG_NAMES {
                let config_path = current.join(name);
                if config_path.exists() {
                    return Some(config_path);
                }
            }

            if !current.pop() {
                return None;
            }
        }
    }
}

/// Resolve a path relative to the working directory.
fn resolve_path(cwd: &Path, path: &str) -> PathBuf {
    if Path::new(path).is_absolute() {
        PathBuf::from(path)
    } else {
        cwd.join(path)
    }
}
