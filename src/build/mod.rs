mod clean;
mod core;
pub mod layout;
pub mod runner;
pub mod summary;
pub mod watch_set;
pub mod watcher;

pub use clean::clean;
pub use self::core::{Project, generate, generate_project, load_project, watch_project};
pub use layout::BuildLayout;
pub use runner::{BuildRunner, MakeRunner};
pub use watch_set::{WatchFile, WatchSet};
pub use watcher::{BuildOutcome, POLL_INTERVAL, WatchSession, WatchState};
