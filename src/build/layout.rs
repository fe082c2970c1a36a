//! Where generated files live relative to the project root.
//!
//! ```text
//! <root>/build/Makefile
//! <root>/build/obj/*.o
//! <root>/build/<output_dir>/<target>   (or <root>/build/<target>)
//! ```

use crate::config::BuildConfig;
use crate::makefile::OBJ_DIR;
use crate::ui;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const BUILD_DIR: &str = "build";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLayout {
    pub build_dir: PathBuf,
    pub obj_dir: PathBuf,
    pub bin_dir: Option<PathBuf>,
}

impl BuildLayout {
    pub fn new(root: &Path, config: &BuildConfig) -> Self {
        let build_dir = root.join(BUILD_DIR);
        let bin_dir = config
            .uses_bin_dir()
            .then(|| build_dir.join(&config.output_dir));
        Self {
            obj_dir: build_dir.join(OBJ_DIR),
            bin_dir,
            build_dir,
        }
    }

    /// Directory the binaries end up in.
    pub fn output_dir(&self) -> &Path {
        self.bin_dir.as_deref().unwrap_or(&self.build_dir)
    }

    pub fn binary(&self, target: &str) -> PathBuf {
        self.output_dir().join(target)
    }

    /// Create every directory the generated Makefile expects.
    pub fn create(&self) -> Result<()> {
        let mut dirs = vec![&self.build_dir, &self.obj_dir];
        dirs.extend(self.bin_dir.as_ref());
        for dir in dirs {
            if dir.is_dir() {
                continue;
            }
            fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create directory {}", dir.display()))?;
            ui::step("📁", &format!("Created {}", dir.display()));
        }
        Ok(())
    }
}
