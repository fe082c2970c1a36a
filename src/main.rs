//! # anvil CLI Entry Point
//!
//! Parses arguments with clap and hands the build description to the
//! library. Running `anvil` with no subcommand is the same as
//! `anvil generate build.conf`.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use std::path::{Path, PathBuf};

use anvil::build::{self, runner::DEFAULT_MAKE, summary};
use anvil::config::DEFAULT_CONFIG_FILE;
use anvil::ui;

#[cfg(windows)]
#[link(name = "kernel32")]
unsafe extern "system" {
    fn SetConsoleOutputCP(wCodePageID: u32) -> i32;
}

#[cfg(windows)]
fn enable_windows_utf8_console() {
    unsafe {
        SetConsoleOutputCP(65001);
    }
}

#[cfg(not(windows))]
fn enable_windows_utf8_console() {}

#[derive(Parser)]
#[command(name = "anvil")]
#[command(about = "Turn build.conf into a Makefile, and rebuild on change", version = env!("CARGO_PKG_VERSION"))]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Build description to generate from [default: build.conf]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate build/Makefile from the build description
    Generate {
        #[arg(default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },
    /// Generate, then rebuild whenever a source or header changes
    Watch {
        #[arg(default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
        /// Run the built program after every successful build
        #[arg(short, long)]
        run: bool,
    },
    /// Show what the build description defines
    Info {
        #[arg(default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
        /// Print the parsed configuration as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove the generated build directory
    Clean {
        #[arg(default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },
    /// Generate shell completion scripts
    Completion { shell: Shell },
}

fn main() -> Result<()> {
    enable_windows_utf8_console();

    let cli = Cli::parse();

    match cli.command {
        None => {
            let config = cli
                .config
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            run_generate(&config)
        }
        Some(Commands::Generate { config }) => run_generate(&config),
        Some(Commands::Watch { config, run }) => {
            let make = std::env::var("MAKE").unwrap_or_else(|_| DEFAULT_MAKE.to_string());
            build::watch_project(&config, run, &make)
        }
        Some(Commands::Info { config, json }) => {
            let project = build::load_project(&config)?;
            if json {
                println!("{}", summary::to_json(&project)?);
            } else {
                summary::print_summary(&project);
            }
            Ok(())
        }
        Some(Commands::Clean { config }) => build::clean(&config).map(|_| ()),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    }
}

fn run_generate(config: &Path) -> Result<()> {
    ui::info(&format!("Reading {}", config.display()));
    let project = build::generate_project(config)?;
    println!();
    summary::print_summary(&project);
    summary::print_next_steps(&project);
    Ok(())
}
