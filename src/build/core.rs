use super::layout::BuildLayout;
use super::runner::MakeRunner;
use super::watch_set::WatchSet;
use super::watcher::WatchSession;
use crate::config::{self, BuildConfig};
use crate::makefile;
use crate::ui;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// A parsed build description plus where its outputs go.
#[derive(Debug, Clone)]
pub struct Project {
    pub config_path: PathBuf,
    pub root: PathBuf,
    pub config: BuildConfig,
    pub layout: BuildLayout,
}

impl Project {
    pub fn new(config_path: &Path, config: BuildConfig) -> Self {
        let root = config::project_root(config_path);
        let layout = BuildLayout::new(&root, &config);
        Self {
            config_path: config_path.to_path_buf(),
            root,
            config,
            layout,
        }
    }
}

/// Parse `config_path`. Warnings are printed, an unreadable file is an error.
pub fn load_project(config_path: &Path) -> Result<Project> {
    let config = config::load_config(config_path)?;
    Ok(Project::new(config_path, config))
}

/// Create the build directories and write the Makefile.
pub fn generate(project: &Project) -> Result<PathBuf> {
    if !project.config.has_targets() {
        ui::warn(&format!(
            "{} defines no targets; the Makefile will build nothing",
            project.config_path.display()
        ));
    }
    project.layout.create()?;
    let path = makefile::write_makefile(&project.config, &project.layout.build_dir)?;
    ui::success(&format!("Generated {}", path.display()));
    Ok(path)
}

pub fn generate_project(config_path: &Path) -> Result<Project> {
    let project = load_project(config_path)?;
    generate(&project)?;
    Ok(project)
}

/// Generate, then watch sources and headers until interrupted.
pub fn watch_project(config_path: &Path, run_after_build: bool, make: &str) -> Result<()> {
    let project = generate_project(config_path)?;
    let files = WatchSet::from_config(&project.config, &project.root);
    let runner = MakeRunner::new(&project.layout.build_dir, &project.config).with_program(make);
    WatchSession::new(files, runner, run_after_build).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_generate_project_writes_makefile_next_to_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.c"), "int main(void){return 0;}\n").unwrap();
        let conf = dir.path().join("build.conf");
        fs::write(&conf, "project = t\ntarget = t\nsources = src/*\noutput_dir = bin\n").unwrap();

        let project = generate_project(&conf).unwrap();

        let text = fs::read_to_string(dir.path().join("build/Makefile")).unwrap();
        assert!(text.contains("t_SOURCES = $(SRC_DIR)/src/main.c\n"));
        assert!(dir.path().join("build/obj").is_dir());
        assert_eq!(project.config.targets[0].sources, vec!["src/main.c"]);
    }

    #[test]
    fn test_missing_config_aborts() {
        let dir = tempfile::tempdir().unwrap();
        assert!(generate_project(&dir.path().join("build.conf")).is_err());
        assert!(!dir.path().join("build").exists());
    }
}
