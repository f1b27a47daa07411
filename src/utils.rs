//! Common utility functions used across the codebase.

/// Truncates a string to at most `max_chars` characters, adding "..." if truncated.
///
/// UTF-8 safe: counts characters, never slices inside a multi-byte sequence.
///
/// # Examples
/// ```ignore
/// assert_eq!(truncate_str("hello", 10), "hello");
/// assert_eq!(truncate_str("hello world", 8), "hello...");
/// ```
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    const SUFFIX: &str = "...";

    // Byte length bounds char count from above.
    if s.len() <= max_chars || s.chars().count() <= max_chars {
        return s.to_string();
    }

    let suffix_len = SUFFIX.len();
    if max_chars <= suffix_len {
        return SUFFIX.chars().take(max_chars).collect();
    }

    let truncated: String = s.chars().take(max_chars - suffix_len).collect();
    format!("{}{}", truncated, SUFFIX)
}

/// Pick the Russian plural form for `n`: `one` (1, 21), `few` (2-4, 22-24), `many` (5-20, 25).
pub fn plural_ru<'a>(n: u32, one: &'a str, few: &'a str, many: &'a str) -> &'a str {
    let (rem10, rem100) = (n % 10, n % 100);
    if rem10 == 1 && rem100 != 11 {
        one
    } else if (2..=4).contains(&rem10) && !(12..=14).contains(&rem100) {
        few
    } else {
        many
    }
}
