//! Human and JSON reports about a parsed project.

use super::core::Project;
use crate::ui::Table;
use anyhow::Result;
use colored::*;
use std::path::Path;

pub fn print_summary(project: &Project) {
    let config = &project.config;
    let name = if config.project_name.is_empty() {
        "(unnamed)"
    } else {
        config.project_name.as_str()
    };

    println!("{} {} v{}", "📦".cyan(), name.bold(), config.version);
    if !config.includes.is_empty() {
        println!(
            "   Includes: {} director{}",
            config.includes.len(),
            if config.includes.len() == 1 { "y" } else { "ies" }
        );
    }
    if !config.cflags.is_empty() {
        println!("   CFLAGS:   {}", config.cflags.join(" ").dimmed());
    }

    if !config.has_targets() {
        return;
    }

    let mut table = Table::new(&["Target", "Sources", "Output"]);
    for target in &config.targets {
        table.add_row(vec![
            target.name.green().to_string(),
            target.sources.len().to_string(),
            display(&project.layout.binary(&target.name)),
        ]);
    }
    table.print();
}

/// The `make` invocations that drive the generated Makefile.
pub fn next_steps(project: &Project) -> Vec<String> {
    let build_dir = display(&project.layout.build_dir);
    let mut steps = vec![
        format!("cd {}", build_dir),
        "make".to_string(),
    ];
    match project.config.targets.as_slice() {
        [_] => steps.push("make run".to_string()),
        targets => steps.extend(targets.iter().map(|t| format!("make run-{}", t.name))),
    }
    steps.push("make clean".to_string());
    steps
}

pub fn print_next_steps(project: &Project) {
    println!();
    println!("{}", "To build your project:".bold());
    for step in next_steps(project) {
        println!("  {}", step.cyan());
    }
}

pub fn to_json(project: &Project) -> Result<String> {
    Ok(serde_json::to_string_pretty(&project.config)?)
}

fn display(path: &Path) -> String {
    path.strip_prefix(".").unwrap_or(path).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_str;

    fn project(text: &str) -> Project {
        let config = parse_str(text, Path::new(".")).config;
        Project::new(Path::new("build.conf"), config)
    }

    #[test]
    fn test_next_steps_single_target() {
        let steps = next_steps(&project("target = app\n"));
        assert_eq!(steps, vec!["cd build", "make", "make run", "make clean"]);
    }

    #[test]
    fn test_next_steps_multi_target() {
        let steps = next_steps(&project("[target:a]\n[/target]\n[target:b]\n[/target]\n"));
        assert_eq!(
            steps,
            vec!["cd build", "make", "make run-a", "make run-b", "make clean"]
        );
    }

    #[test]
    fn test_json_contains_targets() {
        let json = to_json(&project("project = p\ntarget = app\nsources = a.c\n")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["project_name"], "p");
        assert_eq!(value["targets"][0]["name"], "app");
        assert_eq!(value["targets"][0]["sources"][0], "a.c");
    }
}
