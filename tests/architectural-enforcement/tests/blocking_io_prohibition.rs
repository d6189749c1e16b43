//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: Production code in the chat core and the TUI runs on the
//! tokio runtime and MUST NOT block it.
//! **Required**: `reqwest` async client, `tokio::time::sleep`; never
//! `reqwest::blocking` or `std::thread::sleep`.

use architectural_enforcement::{find_violations, rust_sources};

const PRODUCTION_DIRS: &[&str] = &["chat/core/src", "tui/src"];

#[test]
fn test_sources_are_scanned() {
    // Guard against the scan silently passing on a moved tree
    for dir in PRODUCTION_DIRS {
        assert!(!rust_sources(dir).is_empty(), "no Rust sources found in {dir}");
    }
}

#[test]
fn test_no_blocking_io_in_production_code() {
    let violations = find_violations(
        PRODUCTION_DIRS,
        &["reqwest::blocking", "std::thread::sleep", "thread::sleep("],
    );

    if !violations.is_empty() {
        eprintln!("\n❌ CRITICAL: Blocking calls found in production code!\n");

        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }

        eprintln!("\n❌ FORBIDDEN:");
        eprintln!("  - reqwest::blocking::*");
        eprintln!("  - std::thread::sleep()");
        eprintln!("\n✅ REQUIRED:");
        eprintln!("  - reqwest::Client with .await");
        eprintln!("  - tokio::time::sleep().await");

        panic!(
            "\nFound {} blocking call(s) in production code.\nFix these before merging!",
            violations.len()
        );
    }
}
