//! Integration Test: Deterministic Core
//!
//! **Policy**: Engine core code reads time only through the `Clock` trait
//! and never touches the filesystem, except for the config loader.
//! **Exceptions**: `clock.rs` (the system clock), `config.rs` (TOML file)

use architectural_enforcement::{core_src, report, scan};

#[test]
fn test_wall_clock_only_in_clock_module() {
    let violations = scan(
        &core_src(),
        &[
            "Utc::now(",
            "Local::now(",
            "SystemTime::now(",
            "Instant::now(",
        ],
        &["clock.rs"],
    );
    report(&violations, "Wall-clock reads outside clock.rs");
}

#[test]
fn test_no_file_io_outside_config_loader() {
    let violations = scan(
        &core_src(),
        &["std::fs", "fs::read", "fs::write", "File::open", "File::create"],
        &["config.rs"],
    );
    report(&violations, "File access in engine core");
}

#[test]
fn test_no_threads_in_core() {
    let violations = scan(&core_src(), &["thread::spawn(", "tokio::"], &[]);
    report(&violations, "Threads or async runtime in engine core");
}
