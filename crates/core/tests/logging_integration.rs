//! Integration test for the log file sink and level specs

use nx_core::logging::{log, LogCategory, LogConfig, LogLevel};
use std::fs;
use std::thread;
use std::time::Duration;

#[test]
fn test_log_file_receives_enabled_categories() {
    let path = std::env::temp_dir().join("nx_logging_integration.log");
    let _ = fs::remove_file(&path);

    let config = LogConfig::global();
    config.reset();
    assert!(config.apply_spec("error,disk=debug").is_empty());
    config.set_log_file(path.clone()).expect("open log file");

    log(LogCategory::Disk, LogLevel::Debug, || "disk message".to_string());
    log(LogCategory::Runtime, LogLevel::Debug, || "runtime message".to_string());
    log(LogCategory::Runtime, LogLevel::Error, || "runtime error".to_string());

    // The writer thread drains the channel asynchronously
    let mut contents = String::new();
    for _ in 0..50 {
        contents = fs::read_to_string(&path).unwrap_or_default();
        if contents.lines().count() >= 2 {
            break;
        }
        thread::sleep(Duration::from_millis(20));
    }
    config.clear_log_file();
    config.reset();

    assert!(contents.contains("disk message"));
    assert!(contents.contains("runtime error"));
    assert!(!contents.contains("runtime message"));

    let _ = fs::remove_file(&path);
}
