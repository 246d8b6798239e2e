#![allow(dead_code)]

use chrono::NaiveDateTime;
use colored::Colorize;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.len()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

// ============================================================================
// Pipeline event log
// ============================================================================

/// Print a timestamped pipeline event line
///
/// One line per event: "<timestamp> - <message>". This is the run log the
/// pipeline emits for every step outcome and failure.
pub fn event(msg: &str) {
    println!("{}", format_event(chrono::Local::now().naive_local(), msg));
}

fn format_event(at: NaiveDateTime, msg: &str) -> String {
    format!("{} - {}", at.format("%Y-%m-%d %H:%M:%S"), msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_format_event() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 30, 5)
            .unwrap();
        assert_eq!(
            format_event(at, "Installing package mysql-server"),
            "2024-03-09 14:30:05 - Installing package mysql-server"
        );
    }

    #[test]
    fn test_format_event_zero_pads() {
        let at = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        assert!(format_event(at, "x").starts_with("2024-01-02 03:04:05 - "));
    }
}
