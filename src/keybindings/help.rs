//! Help text generated from the commands available in the current mode.

use super::dispatch::{AvailableCommand, Dispatcher};

/// Category heading for commands that declare none.
const UNCATEGORIZED: &str = "General";

/// Help lines for the current mode, grouped by category.
///
/// Categories appear in order of first registration; hidden commands are
/// left out. Commands without a hotkey are listed with an empty key column.
pub fn help_lines(dispatcher: &mut Dispatcher) -> Vec<String> {
    let visible: Vec<AvailableCommand> = dispatcher
        .available_commands()
        .into_iter()
        .filter(|entry| !entry.command.hidden)
        .collect();

    let mut categories: Vec<&str> = Vec::new();
    for entry in &visible {
        let category = entry.command.category.as_deref().unwrap_or(UNCATEGORIZED);
        if !categories.contains(&category) {
            categories.push(category);
        }
    }

    let mut lines = Vec::new();
    for category in categories {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(format!("  {category}"));
        lines.push(format!("  {}", "─".repeat(category.chars().count())));

        for entry in visible
            .iter()
            .filter(|e| e.command.category.as_deref().unwrap_or(UNCATEGORIZED) == category)
        {
            let keys = entry
                .hotkey
                .as_ref()
                .map(|hotkey| hotkey.to_string())
                .unwrap_or_default();
            lines.push(format!("  {:14}{}", keys, entry.command.title));
        }
    }
    lines
}

/// Compact one-line hints, e.g. `"  q: Quit | g g: Go to top"`.
///
/// Only bound, visible commands are listed, at most `limit` of them.
pub fn footer_hints(dispatcher: &mut Dispatcher, limit: usize) -> String {
    let hints: Vec<String> = dispatcher
        .available_commands()
        .into_iter()
        .filter(|entry| !entry.command.hidden)
        .filter_map(|entry| {
            let hotkey = entry.hotkey?;
            Some(format!("{}: {}", hotkey, entry.command.title))
        })
        .take(limit)
        .collect();
    format!("  {}", hints.join(" | "))
}
