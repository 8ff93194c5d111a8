//! Host string literals: decoding literal tokens and rendering values back
//! as literals.

/// Decode a string literal token into the value it denotes.
///
/// Returns `None` when the value is not known at compile time (f-strings),
/// is not text (bytes), or uses an escape this decoder does not model
/// (`\N{...}`).
pub fn decode(token_text: &str) -> Option<String> {
    let quote_at = token_text.find(['\'', '"'])?;
    let prefix = token_text[..quote_at].to_ascii_lowercase();
    if prefix.contains('f') || prefix.contains('b') {
        return None;
    }
    let raw = prefix.contains('r');

    let rest = &token_text[quote_at..];
    let q = rest.chars().next()?;
    let triple: String = std::iter::repeat_n(q, 3).collect();
    let delim_len = if rest.len() >= 6 && rest.starts_with(&triple) {
        3
    } else {
        1
    };
    if rest.len() < 2 * delim_len {
        return None;
    }
    let body = &rest[delim_len..rest.len() - delim_len];

    if raw {
        return Some(body.to_string());
    }
    unescape(body)
}

fn unescape(body: &str) -> Option<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(e) = chars.next() else {
            out.push('\\');
            break;
        };
        match e {
            '\n' => {}
            '\\' | '\'' | '"' => out.push(e),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\x0b'),
            '0'..='7' => {
                let mut value = e.to_digit(8)?;
                for _ in 0..2 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(value)?);
            }
            'x' => out.push(hex_escape(&mut chars, 2)?),
            'u' => out.push(hex_escape(&mut chars, 4)?),
            'U' => out.push(hex_escape(&mut chars, 8)?),
            'N' => return None,
            other => {
                // Unknown escapes keep their backslash (`\d` stays `\d`).
                out.push('\\');
                out.push(other);
            }
        }
    }
    Some(out)
}

fn hex_escape(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, digits: usize) -> Option<char> {
    let mut value = 0u32;
    for _ in 0..digits {
        value = value * 16 + chars.next()?.to_digit(16)?;
    }
    char::from_u32(value)
}

/// Render `value` as a single-line string literal, quoting like the host's
/// `repr`: single quotes unless the value contains `'` and no `"`.
pub fn quote(value: &str) -> String {
    let q = if value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(value.len() + 2);
    out.push(q);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == q => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(q);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_plain() {
        assert_eq!(decode("'abc'").as_deref(), Some("abc"));
        assert_eq!(decode("\"abc\"").as_deref(), Some("abc"));
    }

    #[test]
    fn decode_escapes() {
        assert_eq!(decode(r"'a\nb'").as_deref(), Some("a\nb"));
        assert_eq!(decode(r"'\x41\101é'").as_deref(), Some("AAé"));
        assert_eq!(decode(r"'it\'s'").as_deref(), Some("it's"));
    }

    #[test]
    fn decode_keeps_unknown_escapes() {
        assert_eq!(decode(r"'\d+\.'").as_deref(), Some(r"\d+\."));
    }

    #[test]
    fn decode_raw() {
        assert_eq!(decode(r"r'\n\d'").as_deref(), Some(r"\n\d"));
        assert_eq!(decode(r"R'\w'").as_deref(), Some(r"\w"));
    }

    #[test]
    fn decode_triple() {
        assert_eq!(decode("'''a'b'''").as_deref(), Some("a'b"));
        assert_eq!(decode("\"\"\"x\ny\"\"\"").as_deref(), Some("x\ny"));
    }

    #[test]
    fn decode_empty() {
        assert_eq!(decode("''").as_deref(), Some(""));
        assert_eq!(decode("''''''").as_deref(), Some(""));
    }

    #[test]
    fn decode_runtime_only() {
        assert!(decode("f'{x}'").is_none());
        assert!(decode("b'x'").is_none());
        assert!(decode("rb'x'").is_none());
        assert!(decode(r"'\N{BULLET}'").is_none());
    }

    #[test]
    fn quote_like_repr() {
        assert_eq!(quote("abc"), "'abc'");
        assert_eq!(quote("it's"), "\"it's\"");
        assert_eq!(quote("a'b\"c"), "'a\\'b\"c'");
        assert_eq!(quote("a\\b\n"), "'a\\\\b\\n'");
        assert_eq!(quote("\x1b[0m"), "'\\x1b[0m'");
    }

    #[test]
    fn quote_then_decode() {
        for value in ["plain", "tab\there", "both ' and \"", "back\\slash", "\u{7f}"] {
            assert_eq!(decode(&quote(value)).as_deref(), Some(value));
        }
    }
}
