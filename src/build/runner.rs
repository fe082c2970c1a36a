use crate::config::BuildConfig;
use crate::ui;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

pub const DEFAULT_MAKE: &str = "make";

/// Something that can build the generated project and run what it built.
///
/// `Ok(false)` is a failed build or run; `Err` means the tool could not be
/// invoked at all. The watch loop survives both.
pub trait BuildRunner {
    fn build(&mut self) -> Result<bool>;
    fn run(&mut self) -> Result<bool>;
}

/// Drives the generated Makefile with an external `make`.
#[derive(Debug, Clone)]
pub struct MakeRunner {
    program: String,
    build_dir: PathBuf,
    run_goals: Vec<String>,
}

impl MakeRunner {
    pub fn new(build_dir: &Path, config: &BuildConfig) -> Self {
        Self {
            program: DEFAULT_MAKE.to_string(),
            build_dir: build_dir.to_path_buf(),
            run_goals: run_goals(config),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn goals(&self) -> &[String] {
        &self.run_goals
    }

    fn invoke(&self, goals: &[String]) -> Result<bool> {
        let status = Command::new(&self.program)
            .args(goals)
            .current_dir(&self.build_dir)
            .status()
            .with_context(|| format!("Failed to execute '{}'", self.program))?;
        Ok(status.success())
    }
}

impl BuildRunner for MakeRunner {
    fn build(&mut self) -> Result<bool> {
        self.invoke(&[])
    }

    fn run(&mut self) -> Result<bool> {
        // Each goal runs on its own so one failing goal doesn't skip the rest.
        let mut all_ok = true;
        for goal in &self.run_goals {
            match self.invoke(std::slice::from_ref(goal)) {
                Ok(ok) => all_ok &= ok,
                Err(e) => {
                    ui::error(&format!("{}: {:#}", goal, e));
                    all_ok = false;
                }
            }
        }
        Ok(all_ok)
    }
}

/// `run` for a single target, otherwise `run-<name>` for each target.
pub fn run_goals(config: &BuildConfig) -> Vec<String> {
    match config.targets.as_slice() {
        [_] => vec!["run".to_string()],
        targets => targets.iter().map(|t| format!("run-{}", t.name)).collect(),
    }
}
