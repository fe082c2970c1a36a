//! Source glob expansion.
//!
//! A `sources` token containing `*` names a directory plus a file pattern
//! (`src/*`, `lib/*.c`). Expansion enumerates that one directory, without
//! recursing, and keeps every visible `.c` file whose name matches.
//!
//! Results follow directory enumeration order, which is filesystem-defined.
//! Callers must not rely on it being sorted.

use globset::Glob;
use std::fs;
use std::path::Path;

/// Extension of files the expander considers compilable.
pub const SOURCE_EXTENSION: &str = "c";

/// What happened while expanding one pattern.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Expansion {
    /// Number of paths appended to the destination.
    pub added: usize,
    /// True if at least one path was dropped because the destination was full.
    pub truncated: bool,
    /// Soft failure (unopenable directory, bad pattern). Never fatal.
    pub warning: Option<String>,
}

pub fn is_source_file(name: &str) -> bool {
    name.len() > SOURCE_EXTENSION.len() + 1
        && name
            .rsplit_once('.')
            .is_some_and(|(_, ext)| ext == SOURCE_EXTENSION)
}

pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Expand `pattern` relative to `root`, appending matches to `dest` until it
/// holds `max` entries.
///
/// Patterns without `*` are appended verbatim as a single literal entry.
pub fn expand_glob(root: &Path, pattern: &str, dest: &mut Vec<String>, max: usize) -> Expansion {
    let mut out = Expansion::default();

    if !pattern.contains('*') {
        if dest.len() < max {
            dest.push(pattern.to_string());
            out.added = 1;
        } else {
            out.truncated = true;
        }
        return out;
    }

    let (dir, wildcard) = match pattern.rsplit_once('/') {
        // `/*.c` is anchored at the filesystem root, not the project.
        Some(("", wildcard)) => ("/", wildcard),
        Some((dir, wildcard)) => (dir, wildcard),
        None => (".", pattern),
    };

    let matcher = match Glob::new(wildcard) {
        Ok(glob) => glob.compile_matcher(),
        Err(e) => {
            out.warning = Some(format!("Invalid pattern '{}': {}", pattern, e));
            return out;
        }
    };

    let entries = match fs::read_dir(root.join(dir)) {
        Ok(entries) => entries,
        Err(_) => {
            out.warning = Some(format!("Cannot open directory {}", dir));
            return out;
        }
    };

    for entry in entries.filter_map(|e| e.ok()) {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if is_hidden(&name) || !is_source_file(&name) || !matcher.is_match(name.as_ref()) {
            continue;
        }
        // Follows symlinks, so a link to a file still counts.
        if !entry.path().is_file() {
            continue;
        }
        if dest.len() >= max {
            out.truncated = true;
            break;
        }
        if dir == "." {
            dest.push(name.into_owned());
        } else if dir == "/" {
            dest.push(format!("/{}", name));
        } else {
            dest.push(format!("{}/{}", dir, name));
        }
        out.added += 1;
    }

    out
}
