//! The `unbind` directive: leading `unbind NAME[, NAME...]` lines name
//! commands that should stay ordinary host names for the whole script.

use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::expect_used)]
static UNBIND_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]*unbind[ \t]+([\w.+-]+(?:[ \t,]+[\w.+-]+)*)[ \t,]*(?:#.*)?$")
        .expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static NAME_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,\s]+").expect("constant regex pattern is valid"));

/// Source with its directive lines blanked, plus the names they unbind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stripped {
    pub source: String,
    pub names: Vec<String>,
}

/// Blank out leading `unbind` lines. Only the header counts: an optional
/// shebang, comments and blank lines may precede the directives, and the
/// first other line ends the search. Line breaks are kept so line numbers
/// in diagnostics still match the script.
pub fn strip_unbind(source: &str) -> Stripped {
    let mut out = String::with_capacity(source.len());
    let mut names = Vec::new();
    let mut in_header = true;

    for line in source.split_inclusive('\n') {
        if !in_header {
            out.push_str(line);
            continue;
        }
        let body = line.trim_end_matches(['\n', '\r']);
        let trimmed = body.trim();
        if let Some(caps) = UNBIND_LINE.captures(body) {
            names.extend(
                NAME_SEPARATOR
                    .split(&caps[1])
                    .filter(|n| !n.is_empty())
                    .map(str::to_string),
            );
            out.push_str(&line[body.len()..]);
            continue;
        }
        if !(trimmed.is_empty() || trimmed.starts_with('#')) {
            in_header = false;
        }
        out.push_str(line);
    }

    Stripped { source: out, names }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_directive() {
        let src = "ls\nx = 1\n";
        let s = strip_unbind(src);
        assert_eq!(s.source, src);
        assert!(s.names.is_empty());
    }

    #[test]
    fn single_name() {
        let s = strip_unbind("unbind ls\nls = 5\n");
        assert_eq!(s.source, "\nls = 5\n");
        assert_eq!(s.names, vec!["ls"]);
    }

    #[test]
    fn comma_and_space_separated() {
        let s = strip_unbind("unbind ls, cat  grep\n");
        assert_eq!(s.names, vec!["ls", "cat", "grep"]);
    }

    #[test]
    fn after_shebang_and_comments() {
        let src = "#!/usr/bin/env shellweave\n# tools\n\nunbind test\nunbind file # mine\nprint(1)\n";
        let s = strip_unbind(src);
        assert_eq!(
            s.source,
            "#!/usr/bin/env shellweave\n# tools\n\n\n\nprint(1)\n"
        );
        assert_eq!(s.names, vec!["test", "file"]);
    }

    #[test]
    fn only_leading_lines_count() {
        let src = "x = 1\nunbind ls\n";
        let s = strip_unbind(src);
        assert_eq!(s.source, src);
        assert!(s.names.is_empty());
    }

    #[test]
    fn crlf_kept() {
        let s = strip_unbind("unbind ls\r\nls\r\n");
        assert_eq!(s.source, "\r\nls\r\n");
    }

    #[test]
    fn unbind_as_a_variable_is_code() {
        for src in ["unbind\n", "unbind = 3\n", "unbind(ls)\n"] {
            let s = strip_unbind(src);
            assert_eq!(s.source, src);
            assert!(s.names.is_empty());
        }
    }
}
