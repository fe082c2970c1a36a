//! Terminal output helpers.
//!
//! Every status line anvil prints goes through here so the glyphs and colors
//! stay consistent between `generate`, `info` and the watch loop.
//!
//! - `warn` / `error` go to stderr, `info` / `success` / `step` to stdout
//! - `Table` renders a two-or-more column box table sized to the terminal

use colored::*;
use std::cmp;
use std::time::{SystemTime, UNIX_EPOCH};

pub fn warn(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message);
}

pub fn error(message: &str) {
    eprintln!("{} {}", "x".red(), message);
}

pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// An indented sub-step, e.g. `   📁 Created build/obj`.
pub fn step(glyph: &str, message: &str) {
    println!("   {} {}", glyph.cyan(), message);
}

pub fn rule() {
    println!("{}", "─".repeat(40).dimmed());
}

/// `[HH:MM:SS]` for a count of seconds since the Unix epoch, in UTC.
pub fn clock(secs_since_epoch: u64) -> String {
    let secs = secs_since_epoch % 86_400;
    format!(
        "[{:02}:{:02}:{:02}]",
        secs / 3600,
        secs / 60 % 60,
        secs % 60
    )
}

/// The current wall-clock time as `[HH:MM:SS]` (UTC), dimmed.
pub fn timestamp() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    clock(secs).dimmed().to_string()
}

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Rows with the wrong number of cells are ignored.
    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row);
        }
    }

    pub fn render(&self, max_width: usize) -> String {
        if self.headers.is_empty() {
            return String::new();
        }

        let mut widths: Vec<usize> = self.headers.iter().map(|h| visible_len(h)).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = cmp::max(widths[i], visible_len(cell));
            }
        }

        // Shrink the widest column until the table fits, never below 8.
        let overhead = 3 + 3 * widths.len();
        while overhead + widths.iter().sum::<usize>() > max_width {
            let Some((idx, &widest)) = widths.iter().enumerate().max_by_key(|(_, w)| **w) else {
                break;
            };
            if widest <= 8 {
                break;
            }
            widths[idx] -= 1;
        }

        let border = |left: &str, mid: &str, right: &str| {
            let cells: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("  {}{}{}\n", left, cells.join(mid), right)
        };
        let line = |cells: &[String], bold: bool| {
            let mut out = String::from("  │");
            for (cell, width) in cells.iter().zip(&widths) {
                let text = console::truncate_str(cell, *width, "...").to_string();
                let padding = width.saturating_sub(visible_len(&text));
                let text = if bold { text.bold().to_string() } else { text };
                out.push_str(&format!(" {}{} │", text, " ".repeat(padding)));
            }
            out.push('\n');
            out
        };

        let mut out = border("┌", "┬", "┐");
        out.push_str(&line(&self.headers, true));
        out.push_str(&border("├", "┼", "┤"));
        for row in &self.rows {
            out.push_str(&line(row, false));
        }
        out.push_str(&border("└", "┴", "┘"));
        out
    }

    pub fn print(&self) {
        let (_, width) = console::Term::stdout().size();
        print!("{}", self.render(width as usize));
    }
}

fn visible_len(s: &str) -> usize {
    console::measure_text_width(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_formats_time_of_day() {
        assert_eq!(clock(0), "[00:00:00]");
        assert_eq!(clock(3661), "[01:01:01]");
        assert_eq!(clock(86_399), "[23:59:59]");
        // 2023-11-14 22:13:20 UTC
        assert_eq!(clock(1_700_000_000), "[22:13:20]");
    }

    #[test]
    fn test_table_renders_rows() {
        colored::control::set_override(false);
        let mut table = Table::new(&["Target", "Sources"]);
        table.add_row(vec!["app".to_string(), "3".to_string()]);
        table.add_row(vec!["bad row".to_string()]);

        let out = table.render(80);

        assert!(out.contains("│ app    │ 3       │"));
        assert_eq!(out.lines().count(), 5);
    }

    #[test]
    fn test_table_shrinks_to_width() {
        colored::control::set_override(false);
        let mut table = Table::new(&["Name", "Path"]);
        table.add_row(vec!["x".to_string(), "a".repeat(100)]);

        let out = table.render(40);

        assert!(out.lines().all(|l| console::measure_text_width(l) <= 40));
        assert!(out.contains("..."));
    }
}
