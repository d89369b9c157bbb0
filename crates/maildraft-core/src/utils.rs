//! Utility helpers — path resolution and string manipulation.

use std::path::PathBuf;

/// Get the maildraft data directory (e.g. `~/.maildraft/`).
pub fn get_data_path() -> PathBuf {
    let home = dirs_next::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".maildraft")
}

/// Truncate a string to at most `max_chars` characters. Unicode-safe.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Expand `~` to the home directory in a path string.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Mask a secret for display.
///
/// Keys longer than 8 characters keep their first 4; shorter ones are
/// hidden entirely.
pub fn mask_secret(secret: &str) -> String {
    const SHOWN: usize = 4;
    let len = secret.chars().count();
    if len == 0 {
        return String::new();
    }
    if len <= 2 * SHOWN {
        return "*".repeat(len);
    }
    let head: String = secret.chars().take(SHOWN).collect();
    format!("{head}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_string() {
        assert_eq!(truncate_chars("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_exact_length() {
        assert_eq!(truncate_chars("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_long_string() {
        assert_eq!(truncate_chars("hello world", 5), "hello");
    }

    #[test]
    fn test_truncate_unicode() {
        assert_eq!(truncate_chars("Привет, мир", 6), "Привет");
    }

    #[test]
    fn test_expand_home_tilde() {
        let expanded = expand_home("~/test/path");
        assert!(!expanded.starts_with("~"));
        assert!(expanded.to_str().unwrap().ends_with("test/path"));
    }

    #[test]
    fn test_expand_home_absolute() {
        assert_eq!(expand_home("/absolute/path"), PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_data_path_ends_with_maildraft() {
        assert!(get_data_path().ends_with(".maildraft"));
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("sk-1234567"), "sk-1…");
        assert_eq!(mask_secret(""), "");
    }

    #[test]
    fn test_mask_short_secret_reveals_nothing() {
        assert_eq!(mask_secret("abc"), "***");
        assert_eq!(mask_secret("abcd"), "****");
        assert_eq!(mask_secret("пароль12"), "********");
        assert!(!mask_secret("abcdefgh").contains('a'));
    }
}
