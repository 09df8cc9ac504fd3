//! Terminal formatting for interpreter information.

use hookbridge_core::{InterpreterInfo, InterpreterStatus, InterpreterSummary};

/// Capabilities shown in the summary, in display order.
pub const KEY_CAPABILITIES: [&str; 7] =
    ["sys", "os", "json", "grpc", "grpcio", "fastapi", "requests"];

/// One line listing key capabilities, e.g. `sys ✓  grpc ✗`.
pub fn capability_line(info: &InterpreterInfo) -> String {
    KEY_CAPABILITIES
        .iter()
        .map(|name| {
            let mark = if info.has_capability(name) { "✓" } else { "✗" };
            format!("{name} {mark}")
        })
        .collect::<Vec<_>>()
        .join("  ")
}

/// Table row for `interpreters list`.
pub fn summary_row(summary: &InterpreterSummary, active: bool) -> String {
    let marker = if active { "*" } else { " " };
    let version = summary.version.as_deref().unwrap_or("-");
    format!(
        "{marker} {:<20} {:<10} {:<8} {}",
        summary.name,
        status_label(summary.status),
        version,
        summary.path
    )
}

pub const fn status_label(status: InterpreterStatus) -> &'static str {
    match status {
        InterpreterStatus::Unknown => "unknown",
        InterpreterStatus::Validating => "checking",
        InterpreterStatus::Ready => "ready",
        InterpreterStatus::Error => "error",
    }
}
