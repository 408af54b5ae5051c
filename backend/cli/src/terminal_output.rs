//! Terminal output: colored notes and the permission table.

use portcullis_core::Scope;
use portcullis_security::PermissionStore;

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM").map(|t| t != "dumb").unwrap_or(false))
}

fn note(color: &str, symbol: &str, plain: &str, msg: &str) {
    if supports_color() {
        println!("{color}{BOLD}{symbol}{RESET} {msg}");
    } else {
        println!("{plain}: {msg}");
    }
}

pub fn note_info(msg: &str) {
    note(CYAN, "ℹ", "INFO", msg);
}

pub fn note_warn(msg: &str) {
    note(YELLOW, "⚠", "WARN", msg);
}

pub fn note_success(msg: &str) {
    note(GREEN, "✓", "OK", msg);
}

pub fn note_denied(msg: &str) {
    note(RED, "✗", "DENIED", msg);
}

/// Rows of (scope, scope id, permission) for everything the store holds.
pub fn permission_rows(store: &PermissionStore) -> Vec<[String; 3]> {
    let mut rows = Vec::new();
    for scope in Scope::ALL {
        let Some(partition) = store.partition(scope) else { continue };
        let id = partition.scope_id.clone().unwrap_or_else(|| "-".to_string());
        for token in &partition.permissions {
            rows.push([scope.to_string(), id.clone(), token.to_string()]);
        }
    }
    for token in store.testing_override() {
        rows.push(["override".to_string(), "-".to_string(), token.to_string()]);
    }
    rows
}

/// Left-aligned plain-text table.
pub fn render_table(headers: [&str; 3], rows: &[[String; 3]]) -> String {
    let mut widths = headers.map(str::len);
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let line = |cells: [&str; 3]| {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths)
            .map(|(cell, w)| format!("{cell:<w$}"))
            .collect();
        format!("  {}\n", padded.join("  ").trim_end())
    };

    let mut out = line(headers);
    out.push_str(&line(widths.map(|w| "-".repeat(w)).each_ref().map(String::as_str)));
    for row in rows {
        out.push_str(&line(row.each_ref().map(String::as_str)));
    }
    out
}
