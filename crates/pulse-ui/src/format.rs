//! Human-readable formatting for dashboard values.
//!
//! All functions are pure and easy to test in isolation.

use chrono::{DateTime, Local};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: &str = "...";

/// Format a count with thousands separators.
///
/// Returns values like `"0"`, `"999"`, `"12,345"`.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Same as [`format_count`] but keeps the sign of scores.
pub fn format_score(n: i64) -> String {
    if n < 0 {
        format!("-{}", format_count(n.unsigned_abs()))
    } else {
        format_count(n as u64)
    }
}

/// Cut `title` to at most `width` display columns, ending in `...` when cut.
///
/// Width is measured in terminal columns, so wide characters count double.
pub fn truncate_title(title: &str, width: usize) -> String {
    if title.width() <= width {
        return title.to_string();
    }

    let budget = width.saturating_sub(ELLIPSIS.len());
    let mut used = 0;
    let mut out = String::new();
    for c in title.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push_str(ELLIPSIS);
    out
}

/// Format the snapshot timestamp shown in the header.
pub fn format_timestamp(at: &DateTime<Local>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}
