use std::collections::VecDeque;

use super::types::{Token, TokenKind};
use crate::error::CompileError;

/// Operators, longest first so the first prefix match is the longest.
const OPERATORS: &[&str] = &[
    "**=", "//=", ">>=", "<<=", "...", "**", "//", ">>", "<<", "<=", ">=", "==", "!=", "->",
    ":=", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "@=", "+", "-", "*", "/", "%", "@",
    "&", "|", "^", "~", "<", ">", "(", ")", "[", "]", "{", "}", ",", ":", ";", ".", "=",
];

const STRING_PREFIXES: &[&str] = &["r", "u", "f", "b", "br", "rb", "fr", "rf"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Whole script: indentation, bracket matching, NEWLINE/ENDMARKER.
    Source,
    /// Generated snippet: no layout tracking, brackets may be unbalanced.
    Fragment,
}

/// Pull-based tokenizer for the host language's lexical grammar.
///
/// Yields `Err` once and then stops on malformed input.
pub struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    mode: Mode,
    /// Open brackets with the line they were opened on.
    brackets: Vec<(char, usize)>,
    indents: Vec<usize>,
    at_line_start: bool,
    /// Current logical line has produced code (decides NEWLINE vs NL).
    line_has_content: bool,
    queued: VecDeque<Token>,
    done: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Self::with_mode(src, Mode::Source)
    }

    /// Scanner for a generated snippet such as `grab([`.
    pub fn fragment(src: &'a str) -> Self {
        Self::with_mode(src, Mode::Fragment)
    }

    fn with_mode(src: &'a str, mode: Mode) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            mode,
            brackets: Vec::new(),
            indents: vec![0],
            at_line_start: mode == Mode::Source,
            line_has_content: false,
            queued: VecDeque::new(),
            done: false,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_at(&self, skip: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(skip)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn token(&self, kind: TokenKind, leading: &str, start: usize, line: usize) -> Token {
        Token {
            kind,
            text: self.src[start..self.pos].to_string(),
            leading: leading.to_string(),
            start,
            end: self.pos,
            line,
            synthetic: false,
        }
    }

    fn zero_width(&self, kind: TokenKind, at: usize) -> Token {
        Token {
            kind,
            text: String::new(),
            leading: String::new(),
            start: at,
            end: at,
            line: self.line,
            synthetic: false,
        }
    }

    /// Measure indentation at the start of a logical line and queue
    /// INDENT/DEDENT tokens. Blank and comment-only lines are left alone.
    fn indentation(&mut self) -> Result<(), CompileError> {
        let line_begin = self.pos;
        let mut probe = self.pos;
        let mut column = 0;
        for c in self.src[line_begin..].chars() {
            match c {
                ' ' => column += 1,
                '\t' => column = (column / 8 + 1) * 8,
                '\x0c' => column = 0,
                _ => break,
            }
            probe += c.len_utf8();
        }
        match self.src[probe..].chars().next() {
            None | Some('\n') | Some('\r') | Some('#') => return Ok(()),
            _ => {}
        }

        let current = self.indents.last().copied().unwrap_or(0);
        if column > current {
            self.indents.push(column);
            self.pos = probe;
            let indent = self.token(TokenKind::Indent, "", line_begin, self.line);
            self.queued.push_back(indent);
        } else if column < current {
            while self.indents.last().is_some_and(|&i| column < i) {
                self.indents.pop();
                let dedent = self.zero_width(TokenKind::Dedent, probe);
                self.queued.push_back(dedent);
            }
            if self.indents.last() != Some(&column) {
                return Err(CompileError::tokenize(
                    self.line,
                    "unindent does not match any outer indentation level",
                ));
            }
        }
        Ok(())
    }

    /// Whitespace and backslash continuations before the next token.
    fn leading(&mut self) -> usize {
        let start = self.pos;
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\x0c') => {
                    self.bump();
                }
                Some('\\') if self.peek_at(1) == Some('\n') => {
                    self.bump();
                    self.bump();
                }
                Some('\\') if self.peek_at(1) == Some('\r') && self.peek_at(2) == Some('\n') => {
                    self.bump();
                    self.bump();
                    self.bump();
                }
                _ => break,
            }
        }
        start
    }

    fn end_of_input(&mut self, leading: &str) -> Result<Option<Token>, CompileError> {
        if self.mode == Mode::Fragment {
            self.done = true;
            return Ok(None);
        }
        if let Some(&(open, line)) = self.brackets.last() {
            return Err(CompileError::tokenize(
                line,
                format!("'{open}' was never closed"),
            ));
        }
        if self.line_has_content {
            // The last logical line has no line break of its own.
            self.line_has_content = false;
            return Ok(Some(self.token(TokenKind::Newline, leading, self.pos, self.line)));
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            let dedent = self.zero_width(TokenKind::Dedent, self.pos);
            self.queued.push_back(dedent);
        }
        let end = self.token(TokenKind::EndMarker, leading, self.pos, self.line);
        self.queued.push_back(end);
        self.done = true;
        Ok(self.queued.pop_front())
    }

    fn next_token(&mut self) -> Result<Option<Token>, CompileError> {
        if let Some(t) = self.queued.pop_front() {
            return Ok(Some(t));
        }
        if self.done {
            return Ok(None);
        }

        if self.at_line_start {
            self.at_line_start = false;
            if self.mode == Mode::Source && self.brackets.is_empty() {
                self.indentation()?;
                if let Some(t) = self.queued.pop_front() {
                    return Ok(Some(t));
                }
            }
        }

        let src = self.src;
        let lead_start = self.leading();
        let leading = &src[lead_start..self.pos];
        let start = self.pos;
        let line = self.line;

        let Some(c) = self.peek() else {
            return self.end_of_input(leading);
        };

        let kind = match c {
            '#' => {
                while !matches!(self.peek(), None | Some('\n') | Some('\r')) {
                    self.bump();
                }
                TokenKind::Comment
            }
            '\n' | '\r' => {
                self.bump();
                if c == '\r' && self.peek() == Some('\n') {
                    self.bump();
                }
                self.at_line_start = true;
                if self.mode == Mode::Source
                    && self.brackets.is_empty()
                    && self.line_has_content
                {
                    self.line_has_content = false;
                    TokenKind::Newline
                } else {
                    TokenKind::Nl
                }
            }
            '\'' | '"' => {
                self.string()?;
                TokenKind::String
            }
            c if c.is_ascii_digit() => {
                self.number();
                TokenKind::Number
            }
            '.' if self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) => {
                self.number();
                TokenKind::Number
            }
            c if c.is_alphabetic() || c == '_' => {
                while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
                    self.bump();
                }
                let word = self.src[start..self.pos].to_ascii_lowercase();
                if matches!(self.peek(), Some('\'' | '"'))
                    && STRING_PREFIXES.contains(&word.as_str())
                {
                    self.string()?;
                    TokenKind::String
                } else {
                    TokenKind::Name
                }
            }
            _ => match OPERATORS
                .iter()
                .find(|op| self.src[self.pos..].starts_with(**op))
            {
                Some(op) => {
                    self.pos += op.len();
                    self.bracket(op, line)?;
                    TokenKind::Op
                }
                None => {
                    self.bump();
                    TokenKind::ErrorToken
                }
            },
        };

        if !matches!(kind, TokenKind::Comment | TokenKind::Newline | TokenKind::Nl) {
            self.line_has_content = true;
        }
        Ok(Some(self.token(kind, leading, start, line)))
    }

    fn bracket(&mut self, op: &str, line: usize) -> Result<(), CompileError> {
        if self.mode == Mode::Fragment {
            return Ok(());
        }
        match op {
            "(" | "[" | "{" => {
                let open = op.chars().next().unwrap_or('(');
                self.brackets.push((open, line));
            }
            ")" | "]" | "}" => {
                let expected = match op {
                    ")" => '(',
                    "]" => '[',
                    _ => '{',
                };
                match self.brackets.pop() {
                    Some((open, _)) if open == expected => {}
                    Some((open, _)) => {
                        return Err(CompileError::tokenize(
                            line,
                            format!("closing '{op}' does not match opening '{open}'"),
                        ));
                    }
                    None => {
                        return Err(CompileError::tokenize(line, format!("unmatched '{op}'")));
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Scan a string literal body; the cursor is on the opening quote.
    fn string(&mut self) -> Result<(), CompileError> {
        let line = self.line;
        let Some(q) = self.bump() else {
            return Ok(());
        };
        let triple = self.peek() == Some(q) && self.peek_at(1) == Some(q);
        if triple {
            self.bump();
            self.bump();
        }
        loop {
            let Some(c) = self.bump() else {
                let what = if triple {
                    "unterminated triple-quoted string literal"
                } else {
                    "unterminated string literal"
                };
                return Err(CompileError::tokenize(line, what));
            };
            match c {
                '\\' => {
                    self.bump();
                }
                '\n' if !triple => {
                    return Err(CompileError::tokenize(line, "unterminated string literal"));
                }
                c if c == q => {
                    if !triple {
                        return Ok(());
                    }
                    if self.peek() == Some(q) && self.peek_at(1) == Some(q) {
                        self.bump();
                        self.bump();
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
    }

    fn number(&mut self) {
        let radix = self.peek() == Some('0')
            && matches!(self.peek_at(1), Some('x' | 'X' | 'o' | 'O' | 'b' | 'B'));
        if radix {
            self.bump();
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
                self.bump();
            }
            return;
        }
        self.digits();
        if self.peek() == Some('.') {
            self.bump();
            self.digits();
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let signed = matches!(self.peek_at(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
                if signed {
                    self.bump();
                }
                self.digits();
            }
        }
        if matches!(self.peek(), Some('j' | 'J')) {
            self.bump();
        }
    }

    fn digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '_') {
            self.bump();
        }
    }
}

impl Iterator for Scanner<'_> {
    type Item = Result<Token, CompileError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_token() {
            Ok(token) => token.map(Ok),
            Err(e) => {
                self.done = true;
                self.queued.clear();
                Some(Err(e))
            }
        }
    }
}

/// Scan a whole script.
pub fn scan(src: &str) -> Result<Vec<Token>, CompileError> {
    Scanner::new(src).collect()
}

/// Scan generated code into synthetic tokens anchored at `anchor`.
pub fn fragment(code: &str, anchor: &Token) -> Result<Vec<Token>, CompileError> {
    Scanner::fragment(code)
        .map(|t| {
            t.map(|t| Token {
                start: anchor.start,
                end: anchor.start,
                line: anchor.line,
                synthetic: true,
                ..t
            })
        })
        .collect()
}
