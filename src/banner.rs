//! Banner text cleanup for terminal display.
//!
//! Banners are stored and written to the report verbatim; these helpers only
//! shape them for a single console line.

/// Default width of a displayed banner.
pub const DISPLAY_WIDTH: usize = 120;

/// Sanitize banner text by replacing non-printable characters and collapsing
/// whitespace so it fits on one line.
pub fn sanitize_banner(data: &str) -> String {
    let mut result = String::with_capacity(data.len());
    let mut prev_space = false;

    for c in data.chars() {
        let c = if c.is_whitespace() {
            ' '
        } else if c.is_control() {
            '.'
        } else {
            c
        };

        if c == ' ' {
            if !prev_space {
                result.push(c);
            }
            prev_space = true;
        } else {
            result.push(c);
            prev_space = false;
        }
    }

    result.trim().to_string()
}

/// Sanitize and truncate a banner to at most `max_chars` characters.
pub fn display_banner(data: &str, max_chars: usize) -> String {
    let clean = sanitize_banner(data);
    if clean.chars().count() <= max_chars {
        clean
    } else {
        let kept: String = clean.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
