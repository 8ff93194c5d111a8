//! Types produced by the scanner and consumed by the rewriter and emitter.

use serde::Serialize;

/// Lexical category of a token, following the host language's tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    /// Identifier or keyword.
    Name,
    Number,
    /// String literal, prefix and quotes included.
    String,
    /// Operator or delimiter.
    Op,
    /// `#` comment, without the line break.
    Comment,
    /// End of a logical line.
    Newline,
    /// Line break that does not end a logical line (blank line, inside brackets).
    Nl,
    /// Indentation increase; `text` holds the new indentation.
    Indent,
    /// Indentation decrease; zero-width.
    Dedent,
    /// A character the host grammar does not know (`$`, `?`, `!`, ...).
    /// Command lines use them freely, so they are tokens, not errors.
    ErrorToken,
    /// End of input; `leading` holds any trailing whitespace.
    EndMarker,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Name => "NAME",
            TokenKind::Number => "NUMBER",
            TokenKind::String => "STRING",
            TokenKind::Op => "OP",
            TokenKind::Comment => "COMMENT",
            TokenKind::Newline => "NEWLINE",
            TokenKind::Nl => "NL",
            TokenKind::Indent => "INDENT",
            TokenKind::Dedent => "DEDENT",
            TokenKind::ErrorToken => "ERRORTOKEN",
            TokenKind::EndMarker => "ENDMARKER",
        }
    }
}

/// A positioned lexical token.
///
/// `leading` is the exact whitespace (and backslash continuations) between
/// the previous token and this one, so `leading + text` over a scanned
/// stream reproduces the source byte for byte. Tokens are never mutated;
/// the rewriter copies them with [`Token::with_leading`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub leading: String,
    /// Inclusive start byte offset in the source.
    pub start: usize,
    /// Exclusive end byte offset in the source.
    pub end: usize,
    /// 1-based line of `start`.
    pub line: usize,
    /// Produced from generated code rather than the script. Synthetic
    /// tokens carry the span of the source token they stand in for.
    pub synthetic: bool,
}

impl Token {
    pub fn is_op(&self, op: &str) -> bool {
        self.kind == TokenKind::Op && self.text == op
    }

    pub fn is_name(&self, name: &str) -> bool {
        self.kind == TokenKind::Name && self.text == name
    }

    /// Line breaks, comments and indentation markers carry no code.
    pub fn is_layout(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Nl | TokenKind::Comment | TokenKind::Indent | TokenKind::Dedent
        )
    }

    /// Ends a physical line: NEWLINE, NL or end of input.
    pub fn ends_line(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Newline | TokenKind::Nl | TokenKind::EndMarker
        )
    }

    /// A copy of this token with different leading whitespace.
    pub fn with_leading(&self, leading: impl Into<String>) -> Token {
        Token {
            leading: leading.into(),
            ..self.clone()
        }
    }
}
