//! Shared CLI helpers — status marks and section titles.

use colored::Colorize;

/// Print a bold cyan title with a blank line around it.
pub fn print_title(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
    println!();
}

/// `✓` in green, or `label` dimmed when the condition does not hold.
pub fn mark(ok: bool, missing_label: &str) -> String {
    if ok {
        "✓".green().to_string()
    } else {
        missing_label.dimmed().to_string()
    }
}

/// `user@host:port`, or a placeholder when the host is unset.
pub fn endpoint(username: &str, host: &str, port: u16) -> String {
    if host.trim().is_empty() {
        return "(not configured)".to_string();
    }
    if username.is_empty() {
        format!("{host}:{port}")
    } else {
        format!("{username}@{host}:{port}")
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_full() {
        assert_eq!(
            endpoint("me@example.com", "imap.example.com", 993),
            "me@example.com@imap.example.com:993"
        );
    }

    #[test]
    fn endpoint_without_user() {
        assert_eq!(endpoint("", "smtp.example.com", 587), "smtp.example.com:587");
    }

    #[test]
    fn endpoint_unset() {
        assert_eq!(endpoint("me", "  ", 993), "(not configured)");
    }

    #[test]
    fn mark_missing_shows_label() {
        colored::control::set_override(false);
        assert_eq!(mark(false, "(not found)"), "(not found)");
        assert_eq!(mark(true, "(not found)"), "✓");
    }
}
