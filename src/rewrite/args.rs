//! Turning unquoted command text into argument-list expressions.

use std::sync::LazyLock;

use regex::Regex;

use crate::scan::literal;

#[allow(clippy::expect_used)]
static ENV_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\benv\.([A-Za-z_][A-Za-z0-9_]*)").expect("constant regex pattern is valid")
});

const GLOB_CHARS: &[char] = &['*', '?', '['];

/// Split raw argument text into shell words. Backslash-newline
/// continuations are removed first, as a shell would.
pub fn split_words(raw: &str) -> Vec<String> {
    let folded = raw.replace("\\\r\n", "").replace("\\\n", "");
    shlex::split(&folded).unwrap_or_else(|| {
        // shlex rejects a dangling backslash (`echo a\`); keep it as text.
        folded.split_whitespace().map(String::from).collect()
    })
}

#[derive(Debug, PartialEq, Eq)]
enum Part<'w> {
    Text(&'w str),
    Env(&'w str),
}

fn parts(word: &str) -> Vec<Part<'_>> {
    let mut out = Vec::new();
    let mut last = 0;
    for caps in ENV_REF.captures_iter(word) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            out.push(Part::Text(&word[last..whole.start()]));
        }
        out.push(Part::Env(name.as_str()));
        last = whole.end();
    }
    if last < word.len() {
        out.push(Part::Text(&word[last..]));
    }
    out
}

/// Host expression for one shell word: a string literal, an
/// `env.NAME` concatenation, either of them wrapped in `globarg(...)` when
/// the literal text holds wildcard characters.
pub fn word_expr(word: &str) -> String {
    let word = shellexpand::tilde(word);
    let parts = parts(&word);
    if parts.is_empty() {
        return literal::quote("");
    }
    let globbed = parts
        .iter()
        .any(|p| matches!(p, Part::Text(t) if t.contains(GLOB_CHARS)));
    let expr = parts
        .iter()
        .map(|p| match p {
            Part::Text(t) => literal::quote(t),
            Part::Env(name) => format!("env.{name}"),
        })
        .collect::<Vec<_>>()
        .join("+");
    if globbed {
        format!("globarg({expr})")
    } else {
        expr
    }
}

/// Comma-separated list elements for a run of words.
pub fn words_expr(words: &[String]) -> String {
    words
        .iter()
        .map(|w| word_expr(w))
        .collect::<Vec<_>>()
        .join(", ")
}
