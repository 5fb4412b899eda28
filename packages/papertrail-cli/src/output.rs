//! Rendering of run results.

use colored::Colorize;
use papertrail_sync::{Action, Item};
use serde::Serialize;

/// One line per ledger item.
pub fn item_line(item: &Item) -> String {
    format!("- {} with ID {} and name '{}'", item.kind, item.id, item.name)
}

pub fn print_report(action: Action, items: &[Item]) {
    println!("{} {}", "Action:".bold(), action.name().bright_blue());
    if items.is_empty() {
        println!("{}", "Nothing to do".dimmed());
    }
    for item in items {
        let line = item_line(item);
        if item.created {
            println!("{}", line.green());
        } else if item.deleted {
            println!("{}", line.red());
        } else {
            println!("{line}");
        }
    }
}

// ============================================================================
// JSON Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct Response<'a> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<&'static str>,
    pub items: &'a [Item],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn print_json(response: &Response<'_>) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}
