//! On-disk locations used by the server.
//!
//! Everything lives under one home directory: `$CYCLE_SANDBOX_HOME`, or
//! `~/.cycle-sandbox` when unset.

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable overriding the home directory.
pub const HOME_ENV: &str = "CYCLE_SANDBOX_HOME";

#[derive(Debug, Clone)]
pub struct SandboxPaths {
    home: PathBuf,
}

impl SandboxPaths {
    pub fn from_base(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    pub fn base_dir(&self) -> PathBuf {
        self.home.clone()
    }

    /// JSONL tool-call logs.
    pub fn logs_dir(&self) -> PathBuf {
        self.home.join("logs").join("mcp")
    }

    /// Cycle definition files; relative `cycle_module_path` values resolve here.
    pub fn definitions_dir(&self) -> PathBuf {
        self.home.join("cycles")
    }

    /// Create the log and definition directories.
    pub fn ensure(&self) -> Result<()> {
        for dir in [self.logs_dir(), self.definitions_dir()] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        Ok(())
    }
}

pub fn default_paths() -> SandboxPaths {
    let home = std::env::var(HOME_ENV)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".cycle-sandbox")
        });
    SandboxPaths::from_base(home)
}
