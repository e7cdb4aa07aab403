//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code MUST NOT sleep. The core is driven by an
//! injected clock and the daemon ticks with `tokio::time::interval`.

use architectural_enforcement::{core_src, daemon_src, report, scan};

const SLEEP_PATTERNS: &[&str] = &["::sleep(", ".sleep(", "sleep_ms("];

#[test]
fn test_no_sleep_in_core() {
    let violations = scan(&core_src(), SLEEP_PATTERNS, &[]);
    report(&violations, "Sleep calls found in engine core");
}

#[test]
fn test_no_sleep_in_daemon() {
    let violations = scan(&daemon_src(), SLEEP_PATTERNS, &[]);
    report(&violations, "Sleep calls found in daemon");
}
