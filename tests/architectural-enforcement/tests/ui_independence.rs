//! Integration Test: UI Independence of the Chat Core
//!
//! **Policy**: `chat/core` is headless. It MUST NOT depend on ratatui,
//! crossterm, or any other terminal UI crate; surfaces depend on it, never
//! the other way around.

use std::fs;

use architectural_enforcement::{find_violations, workspace_root};

const UI_CRATES: &[&str] = &["ratatui", "crossterm"];

#[test]
fn test_core_manifest_has_no_ui_dependencies() {
    let manifest = workspace_root().join("chat/core/Cargo.toml");
    let content = fs::read_to_string(&manifest).expect("chat/core/Cargo.toml should exist");

    let offenders: Vec<&str> = UI_CRATES
        .iter()
        .copied()
        .filter(|krate| content.contains(krate))
        .collect();

    assert!(
        offenders.is_empty(),
        "chat/core depends on terminal UI crates: {offenders:?}"
    );
}

#[test]
fn test_core_sources_do_not_use_ui_crates() {
    let violations = find_violations(&["chat/core/src"], &["ratatui::", "crossterm::"]);

    if !violations.is_empty() {
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        panic!(
            "\nFound {} terminal UI reference(s) in chat/core.",
            violations.len()
        );
    }
}
