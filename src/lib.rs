//! # anvil - a tiny build-description compiler for C projects
//!
//! anvil reads a small `build.conf`, expands source globs, and writes a
//! dependency-correct Makefile to `build/Makefile`. In watch mode it polls
//! the sources and include headers and re-runs `make` whenever one changes.
//!
//! ## Quick Start
//!
//! ```bash
//! # Generate build/Makefile from ./build.conf
//! anvil
//!
//! # Rebuild (and run) on every change
//! anvil watch --run
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - `build.conf` parsing into a [`config::BuildConfig`]
//! - [`glob`] - source pattern expansion
//! - [`makefile`] - Makefile rendering
//! - [`build`] - directory layout, watch loop, clean
//! - [`ui`] - terminal output helpers

/// Build orchestration: layout, generation, watch loop, clean.
pub mod build;

/// Build-description parsing (`build.conf`).
pub mod config;

/// Source glob expansion.
pub mod glob;

/// Makefile rendering.
pub mod makefile;

/// Terminal UI utilities (tables, status lines).
pub mod ui;
