//! Quote-aware splitting of config values.
//!
//! Values split on whitespace, except inside a matching pair of `'` or `"`
//! quotes. Quotes are removed from the token; a quote of the other kind
//! inside a quoted run is literal, which is how `"'"` and `'"'` bind the
//! quote keys. An unterminated quote runs to the end of the value.

/// Splits `value` into tokens.
///
/// `""` yields an empty token, which callers skip.
///
/// # Examples
///
/// ```
/// use padmap::config::tokenize::tokenize;
///
/// assert_eq!(tokenize("a add_ctrl repeat"), vec!["a", "add_ctrl", "repeat"]);
/// assert_eq!(tokenize(r#"wordset "greetings" 'hello there'"#), vec!["wordset", "greetings", "hello there"]);
/// assert_eq!(tokenize(r#"'"' ";""#), vec!["\"", ";"]);
/// ```
#[must_use]
pub fn tokenize(value: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for c in value.chars() {
        match quote {
            Some(open) if c == open => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_token = true;
            }
            None if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if in_token {
        tokens.push(current);
    }

    tokens
}

/// Iterator over the non-empty tokens of a value.
pub fn non_empty(tokens: &[String]) -> impl Iterator<Item = &str> {
    tokens.iter().map(String::as_str).filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    // ====== Tokenize Tests ======

    #[test]
    fn test_whitespace_split() {
        assert_eq!(tokenize("  push_state \t menu  "), vec!["push_state", "menu"]);
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_quoted_runs_keep_spaces() {
        assert_eq!(tokenize("\"a b\" c"), vec!["a b", "c"]);
        assert_eq!(tokenize("'x  y'"), vec!["x  y"]);
    }

    #[test]
    fn test_quoted_punctuation() {
        assert_eq!(tokenize("\";\""), vec![";"]);
        assert_eq!(tokenize("'\"'"), vec!["\""]);
        assert_eq!(tokenize("\"'\" add_shift"), vec!["'", "add_shift"]);
    }

    #[test]
    fn test_quotes_join_adjacent_text() {
        assert_eq!(tokenize("ab\"c d\"e"), vec!["abc de"]);
    }

    #[test]
    fn test_empty_quotes_produce_empty_token() {
        let tokens = tokenize("\"\" enter");
        assert_eq!(tokens, vec!["", "enter"]);
        assert_eq!(non_empty(&tokens).collect::<Vec<_>>(), vec!["enter"]);
    }

    #[test]
    fn test_unterminated_quote_runs_to_end() {
        assert_eq!(tokenize("\"open ended"), vec!["open ended"]);
    }
}
