/// ANSI color helper utilities for terminal output.
pub const RESET: &str = "\x1b[0m";

pub const GREY: &str = "\x1b[90m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";

pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

/// Confidence color:
/// \>= 0.8 → green
/// \>= 0.5 → yellow
/// otherwise → red
pub fn color_for_confidence(value: f64) -> &'static str {
    if value >= 0.8 {
        GREEN
    } else if value >= 0.5 {
        YELLOW
    } else {
        RED
    }
}

/// Grey out placeholder values ("--", empty) so real data stands out.
pub fn colorize_optional(value: &str) -> String {
    if value.trim().is_empty() || value.trim() == "--" {
        format!("{GREY}{value}{RESET}")
    } else {
        value.to_string()
    }
}
