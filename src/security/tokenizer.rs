/// Split a free-form command into arguments.
///
/// Whitespace separates tokens. A double-quoted span is a single token with
/// its surrounding quotes removed; inside it `\"` and `\\` stand for a literal
/// quote and backslash. An unterminated quote falls back to plain
/// whitespace splitting for the rest of that word. Stray quotes at either end
/// of an unquoted word are trimmed.
///
/// This is the only place in the crate that turns a string into an argument
/// vector; every typed operation builds its vector directly.
pub fn tokenize(command: &str) -> Vec<String> {
    let chars: Vec<char> = command.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i].is_whitespace() {
            i += 1;
            continue;
        }

        if chars[i] == '"' {
            if let Some((token, next)) = quoted_span(&chars, i) {
                tokens.push(token);
                i = next;
                continue;
            }
        }

        let start = i;
        while i < chars.len() && !chars[i].is_whitespace() {
            i += 1;
        }
        let word: String = chars[start..i].iter().collect();
        tokens.push(word.trim_matches('"').to_string());
    }

    tokens
}

/// Parse a quoted span opening at `start`; returns the unescaped contents and
/// the index just past the closing quote.
fn quoted_span(chars: &[char], start: usize) -> Option<(String, usize)> {
    let mut token = String::new();
    let mut i = start + 1;

    while i < chars.len() {
        match chars[i] {
            '\\' if i + 1 < chars.len() => {
                let escaped = chars[i + 1];
                if escaped != '"' && escaped != '\\' {
                    token.push('\\');
                }
                token.push(escaped);
                i += 2;
            }
            '"' => return Some((token, i + 1)),
            c => {
                token.push(c);
                i += 1;
            }
        }
    }

    None
}
