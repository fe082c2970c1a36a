//! Build artifact cleanup.
//!
//! `anvil clean` removes the whole generated build tree (`<root>/build`):
//! the Makefile, objects and binaries. Sources and the build description are
//! never touched. The Makefile's own `clean` rule only removes objects and
//! binaries and keeps the Makefile around.

use super::layout::BUILD_DIR;
use crate::config::project_root;
use crate::ui;
use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::Path;

/// Returns whether anything was removed.
pub fn clean(config_path: &Path) -> Result<bool> {
    let build_dir = project_root(config_path).join(BUILD_DIR);

    if !build_dir.exists() {
        println!("{} Nothing to clean", "!".yellow());
        return Ok(false);
    }

    fs::remove_dir_all(&build_dir)
        .with_context(|| format!("Failed to remove {}", build_dir.display()))?;
    println!("{} Removed {}", "🗑️".red(), build_dir.display());
    ui::success("Clean complete.");
    Ok(true)
}
