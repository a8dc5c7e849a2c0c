use chrono::Duration;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Render a second count as `MM:SS`. Minutes are not wrapped at 60.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Local part of an email address (everything before the first `@`)
pub fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

/// Rough age of an event: "just now", "5 min ago", "2 h ago", "3 days ago".
/// Negative spans (clock changes) count as just now.
pub fn format_elapsed(elapsed: Duration) -> String {
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();
    if minutes < 1 {
        "just now".to_string()
    } else if hours < 1 {
        format!("{} min ago", minutes)
    } else if days < 1 {
        format!("{} h ago", hours)
    } else if days == 1 {
        "1 day ago".to_string()
    } else {
        format!("{} days ago", days)
    }
}

/// Truncate to at most `max` terminal columns, marking the cut with `…`.
pub fn fit_width(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}
