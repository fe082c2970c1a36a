//! Makefile generation.
//!
//! The Makefile is written to `<root>/build/Makefile` and is run from inside
//! `build/`, so sources are referenced through `SRC_DIR = ..` and objects land
//! in `build/obj`. Binaries go to `build/` or, when `output_dir` is set, to
//! `build/<output_dir>` through a `BIN_DIR` variable.
//!
//! Rendering is pure: the same [`BuildConfig`] always yields the same text.
//! Targets, sources and flags keep the order they were parsed in.

use crate::config::{BuildConfig, Target};
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

pub const MAKEFILE_NAME: &str = "Makefile";
pub const COMPILER: &str = "gcc";
pub const OBJ_DIR: &str = "obj";
pub const SRC_DIR: &str = "..";

/// `src/util.c` -> `util`.
pub fn object_key(source: &str) -> &str {
    let name = source.rsplit('/').next().unwrap_or(source);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(dot) => &name[..dot],
    }
}

/// Name of the object a source compiles to, unique across targets.
pub fn rule_id(target: &str, source: &str, multi_target: bool) -> String {
    if multi_target {
        format!("{}_{}", target, object_key(source))
    } else {
        object_key(source).to_string()
    }
}

struct Layout {
    use_bin_dir: bool,
    multi_target: bool,
}

impl Layout {
    fn binary(&self, target: &Target) -> String {
        if self.use_bin_dir {
            format!("$(BIN_DIR)/{}", target.name)
        } else {
            target.name.clone()
        }
    }

    fn executable(&self, target: &Target) -> String {
        if self.use_bin_dir {
            format!("$(BIN_DIR)/{}", target.name)
        } else {
            format!("./{}", target.name)
        }
    }

    fn object(&self, target: &Target, source: &str) -> String {
        format!(
            "$(OBJ_DIR)/{}.o",
            rule_id(&target.name, source, self.multi_target)
        )
    }
}

/// Render the complete Makefile text for `config`.
pub fn render(config: &BuildConfig) -> String {
    let layout = Layout {
        use_bin_dir: config.uses_bin_dir(),
        multi_target: config.is_multi_target(),
    };
    let mut out = String::new();
    if render_into(&mut out, config, &layout).is_err() {
        unreachable!("fmt::Write for String never fails");
    }
    out
}

fn render_into(out: &mut String, config: &BuildConfig, layout: &Layout) -> std::fmt::Result {
    write_header(out, config, layout)?;
    for target in &config.targets {
        write_target(out, target, layout)?;
    }
    write_footer(out, config, layout)
}

fn write_header(out: &mut String, config: &BuildConfig, layout: &Layout) -> std::fmt::Result {
    writeln!(out, "# Generated Makefile for {}", config.project_name)?;
    writeln!(out)?;
    writeln!(out, "VERSION = {}", config.version)?;
    writeln!(out, "CC = {}", COMPILER)?;
    writeln!(out, "OBJ_DIR = {}", OBJ_DIR)?;
    if layout.use_bin_dir {
        writeln!(out, "BIN_DIR = {}", config.output_dir)?;
    }
    writeln!(out, "SRC_DIR = {}", SRC_DIR)?;
    writeln!(out)?;

    write!(out, "CFLAGS =")?;
    for flag in &config.cflags {
        write!(out, " {}", flag)?;
    }
    for dir in &config.includes {
        write!(out, " -I$(SRC_DIR)/{}", dir)?;
    }
    writeln!(out)?;
    writeln!(out)?;

    writeln!(out, "# Targets")?;
    write!(out, "TARGETS =")?;
    for target in &config.targets {
        write!(out, " {}", layout.binary(target))?;
    }
    writeln!(out)?;
    writeln!(out)?;
    writeln!(out, "all: $(TARGETS)")?;
    writeln!(out)
}

fn write_target(out: &mut String, target: &Target, layout: &Layout) -> std::fmt::Result {
    let name = &target.name;
    writeln!(out, "# Target: {}", name)?;

    write!(out, "{}_SOURCES =", name)?;
    for source in &target.sources {
        write!(out, " $(SRC_DIR)/{}", source)?;
    }
    writeln!(out)?;

    write!(out, "{}_OBJECTS =", name)?;
    for source in &target.sources {
        write!(out, " {}", layout.object(target, source))?;
    }
    writeln!(out)?;

    write!(out, "{}_LDFLAGS =", name)?;
    for flag in &target.ldflags {
        write!(out, " {}", flag)?;
    }
    writeln!(out)?;
    writeln!(out)?;

    let binary = layout.binary(target);
    if layout.use_bin_dir {
        writeln!(out, "{}: $({}_OBJECTS) | $(BIN_DIR)", binary, name)?;
    } else {
        writeln!(out, "{}: $({}_OBJECTS)", binary, name)?;
    }
    writeln!(out, "\t$(CC) $({name}_OBJECTS) -o {binary} $({name}_LDFLAGS)")?;
    writeln!(out, "\t@echo \"Build complete: {}\"", binary)?;
    writeln!(out)?;

    for source in &target.sources {
        writeln!(
            out,
            "{}: $(SRC_DIR)/{} | $(OBJ_DIR)",
            layout.object(target, source),
            source
        )?;
        writeln!(out, "\t$(CC) $(CFLAGS) -c $< -o $@")?;
        writeln!(out)?;
    }
    Ok(())
}

fn write_footer(out: &mut String, config: &BuildConfig, layout: &Layout) -> std::fmt::Result {
    writeln!(out, "$(OBJ_DIR):")?;
    writeln!(out, "\tmkdir -p $(OBJ_DIR)")?;
    writeln!(out)?;
    if layout.use_bin_dir {
        writeln!(out, "$(BIN_DIR):")?;
        writeln!(out, "\tmkdir -p $(BIN_DIR)")?;
        writeln!(out)?;
    }

    for target in &config.targets {
        writeln!(out, "run-{}: {}", target.name, layout.binary(target))?;
        writeln!(out, "\t@echo \"Running {}...\"", target.name)?;
        writeln!(out, "\t@echo \"\"")?;
        writeln!(out, "\t@{}", layout.executable(target))?;
        writeln!(out)?;
    }

    let run_alias = match config.targets.as_slice() {
        [only] => Some(only.name.as_str()),
        _ => None,
    };
    if let Some(name) = run_alias {
        writeln!(out, "run: run-{}", name)?;
        writeln!(out)?;
    }

    writeln!(out, "clean:")?;
    if layout.use_bin_dir {
        writeln!(out, "\trm -rf $(OBJ_DIR) $(TARGETS) $(BIN_DIR)")?;
    } else {
        writeln!(out, "\trm -rf $(OBJ_DIR) $(TARGETS)")?;
    }
    writeln!(out, "\t@echo \"Clean complete\"")?;
    writeln!(out)?;

    write!(out, ".PHONY: all clean")?;
    for target in &config.targets {
        write!(out, " run-{}", target.name)?;
    }
    if run_alias.is_some() {
        write!(out, " run")?;
    }
    writeln!(out)
}

/// Render `config` and write it to `<build_dir>/Makefile`.
///
/// The write is not transactional; a failure midway may leave a partial file.
pub fn write_makefile(config: &BuildConfig, build_dir: &Path) -> Result<PathBuf> {
    let path = build_dir.join(MAKEFILE_NAME);
    fs::write(&path, render(config))
        .with_context(|| format!("Cannot create {}", path.display()))?;
    Ok(path)
}
