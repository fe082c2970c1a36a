//! Build-description parsing (`build.conf`).
//!
//! The format is line oriented:
//!
//! ```text
//! project = demo
//! version = 1.2.0
//! includes = include
//! cflags = -Wall -O2
//! output_dir = bin
//!
//! [target:server]
//! sources = src/server/*.c src/common.c
//! ldflags = -lpthread
//! [/target]
//! ```
//!
//! The older single-target form (`target`, `sources`, `ldflags` at the top
//! level) is still accepted. It is folded into one [`Target`] at parse time,
//! and only when the file has no `[target:...]` block.
//!
//! Parsing itself never fails: malformed lines are skipped and reported as
//! warnings. The only hard error is a file that cannot be read.

use crate::glob::{self, Expansion};
use crate::ui;
use anyhow::Result;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "build.conf";
pub const DEFAULT_VERSION: &str = "1.0.0";
/// Sentinel meaning "place binaries directly in the build directory".
pub const NO_OUTPUT_DIR: &str = ".";

/// One compiled executable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub name: String,
    pub sources: Vec<String>,
    pub ldflags: Vec<String>,
}

impl Target {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            sources: Vec::new(),
            ldflags: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildConfig {
    pub project_name: String,
    pub version: String,
    pub output_dir: String,
    pub includes: Vec<String>,
    pub cflags: Vec<String>,
    pub targets: Vec<Target>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            project_name: String::new(),
            version: DEFAULT_VERSION.to_string(),
            output_dir: NO_OUTPUT_DIR.to_string(),
            includes: Vec::new(),
            cflags: Vec::new(),
            targets: Vec::new(),
        }
    }
}

impl BuildConfig {
    /// Whether binaries go into a subdirectory of the build directory.
    pub fn uses_bin_dir(&self) -> bool {
        self.output_dir != NO_OUTPUT_DIR
    }

    /// Object names are prefixed with the target name once more than one
    /// target shares the object directory.
    pub fn is_multi_target(&self) -> bool {
        self.targets.len() > 1
    }

    pub fn has_targets(&self) -> bool {
        !self.targets.is_empty()
    }

    /// Every source of every target, first occurrence wins.
    pub fn all_sources(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.targets
            .iter()
            .flat_map(|t| t.sources.iter())
            .map(String::as_str)
            .filter(|s| seen.insert(*s))
            .collect()
    }
}

/// Capacity defaults for every list the parser fills.
///
/// Entries beyond a limit are dropped with a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_targets: usize,
    pub max_sources: usize,
    pub max_flags: usize,
    pub max_includes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_targets: 16,
            max_sources: 256,
            max_flags: 32,
            max_includes: 16,
        }
    }
}

/// A parsed configuration together with every soft problem met on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    pub config: BuildConfig,
    pub warnings: Vec<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    /// The build-description file could not be opened or read.
    Read { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "Cannot open {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
        }
    }
}

/// Directory that relative paths in `config_path` are resolved against.
pub fn project_root(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Parse build-description text; globs are expanded relative to `root`.
pub fn parse_str(text: &str, root: &Path) -> Parsed {
    parse_str_with_limits(text, root, Limits::default())
}

pub fn parse_str_with_limits(text: &str, root: &Path, limits: Limits) -> Parsed {
    let mut parser = Parser::new(root, limits);
    for (idx, line) in text.lines().enumerate() {
        parser.line(idx + 1, line);
    }
    parser.finish()
}

/// Read and parse a build-description file.
pub fn parse_buildfile(path: &Path) -> Result<Parsed, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_str(&text, &project_root(path)))
}

/// Parse `path`, printing any warnings. Fails only if the file is unreadable.
pub fn load_config(path: &Path) -> Result<BuildConfig> {
    let parsed = parse_buildfile(path)?;
    for warning in &parsed.warnings {
        ui::warn(warning);
    }
    Ok(parsed.config)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Global,
    Target(usize),
    /// Inside a block that was rejected; its lines are ignored.
    Discarded,
}

/// Top-level single-target fields, kept only until [`Parser::finish`].
#[derive(Default)]
struct Legacy {
    name: String,
    sources: Vec<String>,
    ldflags: Vec<String>,
}

struct Parser<'a> {
    root: &'a Path,
    limits: Limits,
    config: BuildConfig,
    legacy: Legacy,
    scope: Scope,
    warnings: Vec<String>,
    truncated: HashSet<String>,
}

impl<'a> Parser<'a> {
    fn new(root: &'a Path, limits: Limits) -> Self {
        Self {
            root,
            limits,
            config: BuildConfig::default(),
            legacy: Legacy::default(),
            scope: Scope::Global,
            warnings: Vec::new(),
            truncated: HashSet::new(),
        }
    }

    fn line(&mut self, lineno: usize, raw: &str) {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            return;
        }

        if let Some(rest) = line.strip_prefix("[target:") {
            self.open_target(lineno, rest);
            return;
        }

        if line == "[/target]" {
            if self.scope == Scope::Global {
                self.warn(format!("line {}: [/target] without an open block", lineno));
            }
            self.scope = Scope::Global;
            return;
        }

        let Some((key, value)) = line.split_once('=') else {
            return;
        };
        let key = key.trim();
        let value = strip_comment(value.trim());

        match self.scope {
            Scope::Global => self.global_key(key, value),
            Scope::Target(idx) => self.target_key(idx, key, value),
            Scope::Discarded => {}
        }
    }

    fn open_target(&mut self, lineno: usize, rest: &str) {
        let Some(end) = rest.find(']') else {
            self.warn(format!("line {}: target marker is missing ']'", lineno));
            self.scope = Scope::Discarded;
            return;
        };
        let name = rest[..end].trim();
        if name.is_empty() {
            self.warn(format!("line {}: target block has no name", lineno));
            self.scope = Scope::Discarded;
            return;
        }

        if let Some(idx) = self.config.targets.iter().position(|t| t.name == name) {
            self.warn(format!(
                "line {}: target '{}' is defined again; the later definition wins",
                lineno, name
            ));
            self.config.targets[idx] = Target::named(name);
            self.scope = Scope::Target(idx);
            return;
        }

        if self.config.targets.len() >= self.limits.max_targets {
            self.warn(format!(
                "line {}: more than {} targets; '{}' ignored",
                lineno, self.limits.max_targets, name
            ));
            self.scope = Scope::Discarded;
            return;
        }

        self.config.targets.push(Target::named(name));
        self.scope = Scope::Target(self.config.targets.len() - 1);
    }

    fn global_key(&mut self, key: &str, value: &str) {
        match key {
            "project" => self.config.project_name = value.to_string(),
            "version" => {
                if semver::Version::parse(value).is_err() {
                    self.warn(format!("version '{}' is not a semantic version", value));
                }
                self.config.version = value.to_string();
            }
            "target" => self.legacy.name = value.to_string(),
            "sources" => {
                let mut sources = std::mem::take(&mut self.legacy.sources);
                self.append_sources("sources", &mut sources, value);
                self.legacy.sources = sources;
            }
            "includes" => {
                self.config.includes = self.list("includes", value, self.limits.max_includes)
            }
            "cflags" => self.config.cflags = self.list("cflags", value, self.limits.max_flags),
            "ldflags" => self.legacy.ldflags = self.list("ldflags", value, self.limits.max_flags),
            "output_dir" => {
                self.config.output_dir = if value.is_empty() {
                    NO_OUTPUT_DIR.to_string()
                } else {
                    value.to_string()
                }
            }
            _ => {}
        }
    }

    fn target_key(&mut self, idx: usize, key: &str, value: &str) {
        let label = format!("target '{}' {}", self.config.targets[idx].name, key);
        match key {
            "sources" => {
                let mut sources = std::mem::take(&mut self.config.targets[idx].sources);
                self.append_sources(&label, &mut sources, value);
                self.config.targets[idx].sources = sources;
            }
            "ldflags" => {
                self.config.targets[idx].ldflags = self.list(&label, value, self.limits.max_flags)
            }
            _ => {}
        }
    }

    fn append_sources(&mut self, label: &str, dest: &mut Vec<String>, value: &str) {
        let max = self.limits.max_sources;
        for token in value.split_whitespace() {
            let Expansion {
                truncated, warning, ..
            } = glob::expand_glob(self.root, token, dest, max);
            if let Some(warning) = warning {
                self.warn(warning);
            }
            if truncated {
                self.note_truncated(label, max);
                break;
            }
        }
    }

    fn list(&mut self, label: &str, value: &str, max: usize) -> Vec<String> {
        let tokens: Vec<String> = value.split_whitespace().map(str::to_string).collect();
        if tokens.len() > max {
            self.note_truncated(label, max);
        }
        tokens.into_iter().take(max).collect()
    }

    fn note_truncated(&mut self, label: &str, max: usize) {
        if self.truncated.insert(label.to_string()) {
            self.warn(format!("{} holds at most {} entries; the rest were dropped", label, max));
        }
    }

    fn warn(&mut self, message: String) {
        self.warnings.push(message);
    }

    fn finish(mut self) -> Parsed {
        let legacy = std::mem::take(&mut self.legacy);
        if self.config.targets.is_empty() {
            if !legacy.name.is_empty() {
                self.config.targets.push(Target {
                    name: legacy.name,
                    sources: legacy.sources,
                    ldflags: legacy.ldflags,
                });
            } else {
                self.warn("No targets defined; nothing will be built".to_string());
            }
        } else if !legacy.name.is_empty() {
            self.warn(format!(
                "top-level 'target = {}' ignored because [target:] blocks are present",
                legacy.name
            ));
        }

        Parsed {
            config: self.config,
            warnings: self.warnings,
        }
    }
}

/// Drop a trailing `# comment` from a value.
fn strip_comment(value: &str) -> &str {
    match value.find('#') {
        Some(idx) => value[..idx].trim(),
        None => value,
    }
}
