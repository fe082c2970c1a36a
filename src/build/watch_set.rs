//! The set of files whose modification triggers a rebuild.
//!
//! A watch set holds every source of every target followed by every header
//! found under the include directories. Each entry remembers the mtime it
//! was last seen with; [`WatchSet::poll`] compares against that baseline.

use crate::config::BuildConfig;
use crate::glob::is_hidden;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

pub const MAX_WATCH_FILES: usize = 1024;
pub const HEADER_EXTENSIONS: &[&str] = &["h", "hpp", "hh"];

/// Last modification time of `path`, `None` if it cannot be read.
pub fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

pub fn is_header_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| HEADER_EXTENSIONS.iter().any(|h| ext == *h))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchFile {
    pub path: PathBuf,
    pub mtime: Option<SystemTime>,
}

impl WatchFile {
    pub fn new(path: PathBuf) -> Self {
        let mtime = modified_time(&path);
        Self { path, mtime }
    }
}

#[derive(Debug)]
pub struct WatchSet {
    files: Vec<WatchFile>,
    seen: HashSet<PathBuf>,
    max: usize,
    truncated: bool,
}

impl Default for WatchSet {
    fn default() -> Self {
        Self::with_limit(MAX_WATCH_FILES)
    }
}

impl WatchSet {
    pub fn with_limit(max: usize) -> Self {
        Self {
            files: Vec::new(),
            seen: HashSet::new(),
            max,
            truncated: false,
        }
    }

    /// Collect sources and include-directory headers for `config`.
    ///
    /// Paths in `config` are relative to `root`.
    pub fn from_config(config: &BuildConfig, root: &Path) -> Self {
        let mut set = Self::default();
        set.extend_from_config(config, root);
        set
    }

    pub fn extend_from_config(&mut self, config: &BuildConfig, root: &Path) {
        for source in config.all_sources() {
            self.add(root.join(source));
        }
        for dir in &config.includes {
            self.scan_headers(&root.join(dir));
        }
    }

    /// Start watching `path`. Returns false if it was already watched or the
    /// set is full.
    pub fn add(&mut self, path: PathBuf) -> bool {
        if self.seen.contains(&path) {
            return false;
        }
        if self.files.len() >= self.max {
            self.truncated = true;
            return false;
        }
        self.seen.insert(path.clone());
        self.files.push(WatchFile::new(path));
        true
    }

    /// Recursively add every visible header below `dir`.
    ///
    /// A missing or unreadable directory contributes nothing.
    pub fn scan_headers(&mut self, dir: &Path) {
        let walker = WalkDir::new(dir)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(&e.file_name().to_string_lossy()));

        for entry in walker.filter_map(|e| e.ok()) {
            if entry.file_type().is_file() && is_header_file(entry.path()) {
                self.add(entry.into_path());
            }
        }
    }

    /// Compare every file against its baseline and stop at the first one
    /// that changed. That file's baseline is updated before returning, so a
    /// second poll without further edits reports nothing for it.
    pub fn poll(&mut self) -> Option<PathBuf> {
        for file in &mut self.files {
            let current = modified_time(&file.path);
            if current != file.mtime {
                file.mtime = current;
                return Some(file.path.clone());
            }
        }
        None
    }

    pub fn files(&self) -> &[WatchFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// True if something was dropped because the set was full.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_str;
    use std::fs::File;
    use std::time::Duration;

    fn touch(path: &Path, at: SystemTime) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(at)
            .unwrap();
    }

    fn write(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "/* */\n").unwrap();
        path
    }

    #[test]
    fn test_change_is_reported_once() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "main.c");
        let t = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        touch(&file, t);

        let mut set = WatchSet::default();
        set.add(file.clone());
        assert_eq!(set.files()[0].mtime, Some(t));
        assert_eq!(set.poll(), None);

        let later = t + Duration::from_secs(1);
        touch(&file, later);

        assert_eq!(set.poll(), Some(file));
        assert_eq!(set.files()[0].mtime, Some(later));
        assert_eq!(set.poll(), None);
    }

    #[test]
    fn test_one_change_per_poll() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.c");
        let b = write(dir.path(), "b.c");
        let t = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        touch(&a, t);
        touch(&b, t);

        let mut set = WatchSet::default();
        set.add(a.clone());
        set.add(b.clone());

        let later = t + Duration::from_secs(5);
        touch(&a, later);
        touch(&b, later);

        assert_eq!(set.poll(), Some(a));
        assert_eq!(set.poll(), Some(b));
        assert_eq!(set.poll(), None);
    }

    #[test]
    fn test_deleted_file_counts_as_change() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "gone.c");
        let mut set = WatchSet::default();
        set.add(file.clone());

        fs::remove_file(&file).unwrap();

        assert_eq!(set.poll(), Some(file));
        assert_eq!(set.files()[0].mtime, None);
        assert_eq!(set.poll(), None);
    }

    #[test]
    fn test_from_config_collects_sources_and_headers() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/main.c");
        write(dir.path(), "include/app.h");
        write(dir.path(), "include/deep/nested/util.hpp");
        write(dir.path(), "include/notes.txt");
        write(dir.path(), "include/.cache/stale.h");

        let text = "target = app\nsources = src/main.c\nincludes = include\n";
        let config = parse_str(text, dir.path()).config;
        let set = WatchSet::from_config(&config, dir.path());

        let paths: HashSet<PathBuf> = set.files().iter().map(|f| f.path.clone()).collect();
        assert_eq!(set.len(), 3);
        assert_eq!(set.files()[0].path, dir.path().join("src/main.c"));
        assert!(paths.contains(&dir.path().join("include/app.h")));
        assert!(paths.contains(&dir.path().join("include/deep/nested/util.hpp")));
    }

    #[test]
    fn test_shared_sources_are_watched_once() {
        let dir = tempfile::tempdir().unwrap();
        let text = "[target:a]\nsources = common.c a.c\n[/target]\n[target:b]\nsources = common.c\n[/target]\n";
        let config = parse_str(text, dir.path()).config;
        let set = WatchSet::from_config(&config, dir.path());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_limit_drops_silently() {
        let dir = tempfile::tempdir().unwrap();
        let mut set = WatchSet::with_limit(1);
        assert!(set.add(dir.path().join("a.c")));
        assert!(!set.add(dir.path().join("b.c")));
        assert_eq!(set.len(), 1);
        assert!(set.is_truncated());
    }

    #[test]
    fn test_missing_include_dir_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut set = WatchSet::default();
        set.scan_headers(&dir.path().join("missing"));
        assert!(set.is_empty());
    }
}
