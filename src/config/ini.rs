//! Line reader for ini-style control files.
//!
//! * `[name]` starts a section.
//! * `key = value` is an entry. Without `=`, the key ends at the first
//!   whitespace.
//! * Lines starting with `;` or `#` are comments, as is anything after a
//!   ` ;` outside quotes.

/// One meaningful line of a control file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IniLine {
    /// Section header, brackets removed.
    Section(String),
    /// `key = value` entry.
    Entry { key: String, value: String },
}

/// Parses every line of `contents`.
///
/// # Returns
///
/// `(line_number, line)` pairs, 1-based, for non-blank non-comment lines.
/// Malformed section headers are skipped.
///
/// # Examples
///
/// ```
/// use padmap::config::ini::{parse, IniLine};
///
/// let lines = parse("[controls]\na = enter ; confirm\n");
/// assert_eq!(lines[0], (1, IniLine::Section("controls".to_string())));
/// assert_eq!(
///     lines[1],
///     (2, IniLine::Entry { key: "a".to_string(), value: "enter".to_string() })
/// );
/// ```
#[must_use]
pub fn parse(contents: &str) -> Vec<(usize, IniLine)> {
    contents
        .lines()
        .enumerate()
        .filter_map(|(index, line)| parse_line(line).map(|parsed| (index + 1, parsed)))
        .collect()
}

/// Parses a single line.
#[must_use]
pub fn parse_line(line: &str) -> Option<IniLine> {
    let line = line.trim_start_matches('\u{feff}').trim();

    if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
        return None;
    }

    if let Some(rest) = line.strip_prefix('[') {
        let name = rest.split_once(']')?.0.trim();
        return Some(IniLine::Section(name.to_string()));
    }

    let line = strip_inline_comment(line);

    let (key, value) = match line.split_once('=') {
        Some((key, value)) => (key, value),
        None => line.split_once(char::is_whitespace).unwrap_or((line, "")),
    };

    let key = key.trim();
    if key.is_empty() {
        return None;
    }

    Some(IniLine::Entry {
        key: key.to_string(),
        value: value.trim().to_string(),
    })
}

/// Cuts a ` ;` comment that is not inside quotes.
fn strip_inline_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut previous_space = false;

    for (index, c) in line.char_indices() {
        match quote {
            Some(open) if c == open => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == ';' && previous_space => return line[..index].trim_end(),
            None => {}
        }
        previous_space = c.is_whitespace();
    }

    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, value: &str) -> Option<IniLine> {
        Some(IniLine::Entry {
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    // ====== Line Tests ======

    #[test]
    fn test_comments_and_blanks() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("   "), None);
        assert_eq!(parse_line("; note"), None);
        assert_eq!(parse_line("# note"), None);
    }

    #[test]
    fn test_section_headers() {
        assert_eq!(parse_line("[controls:menu]"), Some(IniLine::Section("controls:menu".to_string())));
        assert_eq!(parse_line("  [ config ]  "), Some(IniLine::Section("config".to_string())));
        assert_eq!(parse_line("[broken"), None);
    }

    #[test]
    fn test_key_value_entries() {
        assert_eq!(parse_line("a = enter"), entry("a", "enter"));
        assert_eq!(parse_line("start=push_state  menu"), entry("start", "push_state  menu"));
        assert_eq!(parse_line("overlay = "), entry("overlay", ""));
    }

    #[test]
    fn test_entry_without_equals() {
        assert_eq!(parse_line("back_hk esc"), entry("back_hk", "esc"));
        assert_eq!(parse_line("lonely"), entry("lonely", ""));
    }

    #[test]
    fn test_inline_comment_outside_quotes() {
        assert_eq!(parse_line("a = enter ; confirm"), entry("a", "enter"));
        assert_eq!(parse_line("b = \";\" ; semicolon key"), entry("b", "\";\""));
        assert_eq!(parse_line("c = x;y"), entry("c", "x;y"), "needs whitespace before ;");
    }

    #[test]
    fn test_parse_numbers_lines() {
        let lines = parse("\n[config]\n\nrepeat_delay = 300\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].0, 2);
        assert_eq!(lines[1].0, 4);
    }
}
