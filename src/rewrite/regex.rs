//! Regex sugar: `m/PAT/FLAGS`, `s/PAT/REPL/FLAGS` and `split/PAT/FLAGS`.
//!
//! A form becomes a `Matcher(...)`, `Substituter(...)` or `Splitter(...)`
//! call. Literal patterns are checked and recorded in the [`RegexTable`]
//! and referenced as `_regexen[N]`; any other pattern expression is passed
//! through for the runtime to compile. The `=~` infix forms are rewritten
//! afterwards on the emitted text by [`apply_infix`].

use std::sync::LazyLock;

use log::debug;
use regex::Regex;
use regex_syntax::ast::{ErrorKind, parse::Parser};

use super::Rewriter;
use super::context::Frame;
use crate::emit::emission_error;
use crate::error::CompileError;
use crate::scan::{Token, TokenKind, literal};

/// Flag letters accepted after the closing slash. `g` selects every match;
/// the rest are inline flags of the host regex engine.
const FLAG_LETTERS: &str = "gaiLmsux";

const CHARSET_FLAGS: &str = "aLu";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegexKind {
    Match,
    Substitute,
    Split,
}

impl RegexKind {
    pub fn from_trigger(name: &str) -> Option<Self> {
        match name {
            "m" => Some(RegexKind::Match),
            "s" => Some(RegexKind::Substitute),
            "split" => Some(RegexKind::Split),
            _ => None,
        }
    }

    pub fn constructor(self) -> &'static str {
        match self {
            RegexKind::Match => "Matcher",
            RegexKind::Substitute => "Substituter",
            RegexKind::Split => "Splitter",
        }
    }
}

/// One compile-time pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegexEntry {
    pattern: String,
}

impl RegexEntry {
    /// `pattern` as written; `flags` are inline flag letters (no `g`).
    pub fn new(pattern: &str, flags: &str) -> Self {
        let pattern = if flags.is_empty() {
            pattern.to_string()
        } else {
            format!("(?{flags}){pattern}")
        };
        Self { pattern }
    }

    /// Pattern source for the host engine, flags folded in as `(?flags)`.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

/// Patterns in discovery order. A slot is reserved when a literal pattern is
/// first seen and filled once its flags are known, so `_regexen[N]` always
/// names the N-th literal in the source.
#[derive(Debug, Clone, Default)]
pub struct RegexTable {
    slots: Vec<Option<RegexEntry>>,
}

impl RegexTable {
    pub fn reserve(&mut self) -> usize {
        self.slots.push(None);
        self.slots.len() - 1
    }

    pub fn fill(&mut self, index: usize, entry: RegexEntry) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = Some(entry);
        }
    }

    pub fn get(&self, index: usize) -> Option<&RegexEntry> {
        self.slots.get(index)?.as_ref()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slots in index order; `None` only for a slot never filled.
    pub fn iter(&self) -> impl Iterator<Item = Option<&RegexEntry>> {
        self.slots.iter().map(Option::as_ref)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Pattern,
    Replacement,
}

#[derive(Debug)]
struct LiteralPattern {
    slot: usize,
    pattern: String,
}

/// A regex form being rewritten.
#[derive(Debug)]
pub struct RegexFrame {
    kind: RegexKind,
    stage: Stage,
    /// Next token is the first of the current stage.
    at_start: bool,
    /// `[`/`{` nesting; slashes only delimit at zero.
    depth: usize,
    literal: Option<LiteralPattern>,
    line: usize,
}

impl RegexFrame {
    pub fn new(kind: RegexKind, line: usize) -> Self {
        Self {
            kind,
            stage: Stage::Pattern,
            at_start: true,
            depth: 0,
            literal: None,
            line,
        }
    }
}

/// Reject patterns the host engine would also reject for structural
/// reasons. Constructs only the host supports are left to it.
pub fn validate(pattern: &str, line: usize) -> Result<(), CompileError> {
    let Err(err) = Parser::new().parse(pattern) else {
        return Ok(());
    };
    match err.kind() {
        ErrorKind::GroupUnclosed
        | ErrorKind::GroupUnopened
        | ErrorKind::ClassUnclosed
        | ErrorKind::RepetitionMissing
        | ErrorKind::EscapeUnexpectedEof => Err(CompileError::tokenize(
            line,
            format!("invalid regex {}: {}", literal::quote(pattern), err.kind()),
        )),
        other => {
            debug!("line {line}: regex {pattern:?} left to the host engine ({other})");
            Ok(())
        }
    }
}

/// Check flag letters. `a`, `L` and `u` pick the character semantics and
/// exclude each other; `L` needs a bytes pattern, so it is refused when the
/// pattern is a known text literal.
fn validate_flags(flags: &str, text_literal: bool, line: usize) -> Result<(), CompileError> {
    if let Some(bad) = flags.chars().find(|c| !FLAG_LETTERS.contains(*c)) {
        return Err(CompileError::tokenize(
            line,
            format!("invalid regex flag '{bad}' in '{flags}'"),
        ));
    }
    let mut charset: Vec<char> = flags.chars().filter(|c| CHARSET_FLAGS.contains(*c)).collect();
    charset.dedup();
    if charset.len() > 1 {
        return Err(CompileError::tokenize(
            line,
            format!("regex flags '{}' are incompatible", charset.iter().collect::<String>()),
        ));
    }
    if text_literal && flags.contains('L') {
        return Err(CompileError::tokenize(
            line,
            "cannot use the 'L' regex flag with a text pattern",
        ));
    }
    Ok(())
}

impl Rewriter<'_, '_> {
    /// Trigger name directly followed by `/`, not an attribute access.
    pub(super) fn regex_trigger(&self, token: &Token) -> Option<RegexKind> {
        if token.kind != TokenKind::Name || token.synthetic {
            return None;
        }
        let kind = RegexKind::from_trigger(&token.text)?;
        let next = self.stream.peek()?;
        if !next.is_op("/") || !next.leading.is_empty() {
            return None;
        }
        if self.last.as_ref().is_some_and(|t| t.is_op(".")) {
            return None;
        }
        Some(kind)
    }

    pub(super) fn start_regex(&mut self, kind: RegexKind, trigger: Token) -> Result<(), CompileError> {
        // The opening slash.
        self.stream.next();
        self.replace_with(&format!("{}(", kind.constructor()), &trigger)?;
        self.frames
            .push(Frame::Regex(RegexFrame::new(kind, trigger.line)));
        Ok(())
    }

    pub(super) fn regex_step(&mut self, mut rx: RegexFrame, token: Token) -> Result<(), CompileError> {
        if rx.depth == 0 {
            let unterminated = token.ends_line()
                || token.kind == TokenKind::Comment
                || token.is_op(")")
                || token.is_op("]")
                || token.is_op("}");
            if unterminated {
                return Err(CompileError::tokenize(
                    rx.line,
                    format!("unterminated {} regex: missing '/'", rx.kind.constructor()),
                ));
            }
            if token.is_op("//") {
                return Err(CompileError::tokenize(
                    token.line,
                    "empty regex pattern or replacement",
                ));
            }
            if token.is_op("/") {
                if rx.stage == Stage::Pattern && rx.kind == RegexKind::Substitute {
                    rx.stage = Stage::Replacement;
                    rx.at_start = true;
                    self.insert(",", &token)?;
                    self.frames.push(Frame::Regex(rx));
                    return Ok(());
                }
                return self.finish_regex(rx, &token);
            }
        }

        let first = std::mem::replace(&mut rx.at_start, false);
        if first && rx.stage == Stage::Pattern && token.kind == TokenKind::String {
            let closes = self.stream.peek().is_some_and(|t| t.is_op("/"));
            if closes && let Some(pattern) = literal::decode(&token.text) {
                validate(&pattern, token.line)?;
                let slot = self.regexen.reserve();
                debug!("line {}: regex {slot} = {pattern:?}", token.line);
                rx.literal = Some(LiteralPattern { slot, pattern });
                self.replace_with(&format!("_regexen[{slot}]"), &token)?;
                self.frames.push(Frame::Regex(rx));
                return Ok(());
            }
        }

        let token = if first && rx.stage == Stage::Replacement && token.leading.is_empty() {
            token.with_leading(" ")
        } else {
            token
        };
        if token.is_op("[") || token.is_op("{") {
            rx.depth += 1;
        } else if token.is_op("]") || token.is_op("}") {
            rx.depth = rx.depth.saturating_sub(1);
        }
        self.frames.push(Frame::Regex(rx));
        self.host(token)
    }

    fn finish_regex(&mut self, rx: RegexFrame, slash: &Token) -> Result<(), CompileError> {
        let adjacent_name = self
            .stream
            .peek()
            .is_some_and(|t| t.kind == TokenKind::Name && t.leading.is_empty());
        let flags = if adjacent_name {
            self.stream.next().map(|t| t.text).unwrap_or_default()
        } else {
            String::new()
        };
        validate_flags(&flags, rx.literal.is_some(), slash.line)?;
        let global = flags.contains('g');
        let inline: String = flags.chars().filter(|&c| c != 'g').collect();

        let mut tail = String::new();
        if rx.kind != RegexKind::Split {
            tail.push_str(if global { ", 0" } else { ", 1" });
        }
        match rx.literal {
            Some(lit) => self.regexen.fill(lit.slot, RegexEntry::new(&lit.pattern, &inline)),
            None if !inline.is_empty() => {
                tail.push_str(", flags=");
                tail.push_str(&literal::quote(&inline));
            }
            None => {}
        }
        tail.push(')');
        self.insert(&tail, slash)
    }
}

#[allow(clippy::expect_used)]
static INFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<target>[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*|\[[^\[\]\n]*\])*)[ \t]*=~[ \t]*(?P<ctor>Substituter|Splitter|Matcher)\(",
    )
    .expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static LEFTOVER_INFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"=~[ \t]*(?:Substituter|Splitter|Matcher)\(").expect("constant regex pattern is valid")
});

/// Rewrite `T =~ Ctor(` into explicit calls on the emitted text:
/// substitution and split assign back to `T`, a match is just a call.
pub fn apply_infix(text: &str, tokens: &[Token]) -> Result<String, CompileError> {
    let rewritten = INFIX.replace_all(text, |caps: &regex::Captures| {
        let target = &caps["target"];
        let ctor = &caps["ctor"];
        if ctor == "Matcher" {
            format!("{ctor}.apply({target}, ")
        } else {
            format!("{target} = {ctor}.apply({target}, ")
        }
    });
    if let Some(m) = LEFTOVER_INFIX.find(&rewritten) {
        return Err(emission_error(
            format!("'=~' needs a name on its left: {:?}", m.as_str()),
            tokens,
        ));
    }
    Ok(rewritten.into_owned())
}
