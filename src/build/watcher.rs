//! Poll-based watch & rebuild loop.
//!
//! The session builds once up front, then every [`POLL_INTERVAL`] compares
//! the watch set against its baselines. The first changed file triggers a
//! rebuild (and a run, if requested and the build succeeded). A failing
//! build is reported and the loop carries on polling; only an external
//! interrupt ends a session.

use super::runner::BuildRunner;
use super::watch_set::WatchSet;
use crate::ui;
use anyhow::Result;
use colored::*;
use std::path::Path;
use std::time::{Duration, Instant};

pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Polling,
    Building,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Succeeded,
    Failed,
}

pub struct WatchSession<R: BuildRunner> {
    files: WatchSet,
    runner: R,
    run_after_build: bool,
    interval: Duration,
    state: WatchState,
    builds: usize,
    failures: usize,
}

impl<R: BuildRunner> WatchSession<R> {
    pub fn new(files: WatchSet, runner: R, run_after_build: bool) -> Self {
        Self {
            files,
            runner,
            run_after_build,
            interval: POLL_INTERVAL,
            state: WatchState::Idle,
            builds: 0,
            failures: 0,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Number of builds attempted so far.
    pub fn builds(&self) -> usize {
        self.builds
    }

    pub fn failures(&self) -> usize {
        self.failures
    }

    /// Build, then run if requested. Always ends back in `Idle`.
    pub fn rebuild(&mut self) -> BuildOutcome {
        self.state = WatchState::Building;
        self.builds += 1;
        println!();
        println!("{} {} Building...", ui::timestamp(), "🔨".yellow());
        let started = Instant::now();

        let outcome = match self.runner.build() {
            Ok(true) => {
                println!(
                    "{} {} Build successful in {:.2?}",
                    ui::timestamp(),
                    "✓".green(),
                    started.elapsed()
                );
                BuildOutcome::Succeeded
            }
            Ok(false) => {
                println!("{} {} Build failed!", ui::timestamp(), "x".red());
                BuildOutcome::Failed
            }
            Err(e) => {
                println!("{} {} Build failed: {:#}", ui::timestamp(), "x".red(), e);
                BuildOutcome::Failed
            }
        };

        if outcome == BuildOutcome::Failed {
            self.failures += 1;
        } else if self.run_after_build {
            self.state = WatchState::Running;
            println!("{} {} Running...", ui::timestamp(), "🚀".magenta());
            ui::rule();
            // The program's own exit status doesn't affect the loop.
            if let Err(e) = self.runner.run() {
                ui::error(&format!("{:#}", e));
            }
            ui::rule();
            println!("{} {} Program finished", ui::timestamp(), "🏁".cyan());
        }

        self.state = WatchState::Idle;
        outcome
    }

    /// One poll pass. Rebuilds at most once, for the first changed file.
    pub fn tick(&mut self) -> Option<BuildOutcome> {
        self.state = WatchState::Polling;
        let changed = self.files.poll();
        self.state = WatchState::Idle;

        let path = changed?;
        println!(
            "\n{} {} File change detected: {}",
            ui::timestamp(),
            "📝".cyan(),
            display_path(&path)
        );
        let outcome = self.rebuild();
        println!("\n{} Watching for changes...", "👀".cyan());
        Some(outcome)
    }

    /// Announce the session and do the initial build, changed files or not.
    pub fn start(&mut self) -> BuildOutcome {
        self.print_banner();
        self.rebuild()
    }

    /// Block forever: [`start`](Self::start), then poll and rebuild on change.
    pub fn run(&mut self) -> Result<()> {
        self.start();
        loop {
            std::thread::sleep(self.interval);
            self.tick();
        }
    }

    fn print_banner(&self) {
        let title = if self.run_after_build {
            "Anvil Watch & Run Mode"
        } else {
            "Anvil Watch Mode"
        };
        println!("\n{} {}", "🔥".red(), title.bold());
        println!(
            "{} Watching {} files for changes...",
            "👀".cyan(),
            self.files.len().to_string().bold()
        );
        if self.files.is_truncated() {
            ui::warn("Watch list is full; some files are not watched");
        }
        println!("{} Press {} to stop watching", "💡".blue(), "Ctrl+C".bold());
    }
}

fn display_path(path: &Path) -> String {
    path.strip_prefix(".")
        .unwrap_or(path)
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::fs::{self, File};
    use std::time::SystemTime;

    /// Scripted runner: pops one result per build.
    struct FakeRunner {
        builds: Vec<Result<bool>>,
        runs: usize,
    }

    impl FakeRunner {
        fn new(builds: Vec<Result<bool>>) -> Self {
            Self { builds, runs: 0 }
        }
    }

    impl BuildRunner for FakeRunner {
        fn build(&mut self) -> Result<bool> {
            if self.builds.is_empty() {
                Ok(true)
            } else {
                self.builds.remove(0)
            }
        }

        fn run(&mut self) -> Result<bool> {
            self.runs += 1;
            Ok(false)
        }
    }

    fn touch(path: &Path, secs: u64) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap();
    }

    fn watched_file() -> (tempfile::TempDir, std::path::PathBuf, WatchSet) {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("main.c");
        fs::write(&file, "int main(void) { return 0; }\n").unwrap();
        touch(&file, 1_700_000_000);
        let mut set = WatchSet::default();
        set.add(file.clone());
        (dir, file, set)
    }

    #[test]
    fn test_no_change_no_build() {
        let (_dir, _file, set) = watched_file();
        let mut session = WatchSession::new(set, FakeRunner::new(vec![]), false);

        assert_eq!(session.tick(), None);
        assert_eq!(session.builds(), 0);
        assert_eq!(session.state(), WatchState::Idle);
    }

    #[test]
    fn test_start_builds_once_without_changes() {
        let (_dir, _file, set) = watched_file();
        let mut session = WatchSession::new(set, FakeRunner::new(vec![]), true);

        assert_eq!(session.start(), BuildOutcome::Succeeded);
        assert_eq!(session.builds(), 1);
        assert_eq!(session.runner().runs, 1);
        assert_eq!(session.state(), WatchState::Idle);

        // The initial build doesn't disturb the baselines.
        assert_eq!(session.tick(), None);
        assert_eq!(session.builds(), 1);
    }

    #[test]
    fn test_failed_build_keeps_polling() {
        let (_dir, file, set) = watched_file();
        let runner = FakeRunner::new(vec![Ok(false), Err(anyhow!("make: not found")), Ok(true)]);
        let mut session = WatchSession::new(set, runner, true);

        assert_eq!(session.rebuild(), BuildOutcome::Failed);
        assert_eq!(session.state(), WatchState::Idle);

        touch(&file, 1_700_000_001);
        assert_eq!(session.tick(), Some(BuildOutcome::Failed));

        touch(&file, 1_700_000_002);
        assert_eq!(session.tick(), Some(BuildOutcome::Succeeded));

        assert_eq!(session.builds(), 3);
        assert_eq!(session.failures(), 2);
        // Only the successful build ran the program.
        assert_eq!(session.runner().runs, 1);
    }

    #[test]
    fn test_run_skipped_without_flag() {
        let (_dir, file, set) = watched_file();
        let mut session = WatchSession::new(set, FakeRunner::new(vec![]), false);

        touch(&file, 1_700_000_005);
        assert_eq!(session.tick(), Some(BuildOutcome::Succeeded));
        assert_eq!(session.tick(), None);
        assert_eq!(session.runner().runs, 0);
    }
}
