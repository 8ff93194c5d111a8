//! Rewriter frames. The rewriter keeps an explicit stack of these instead
//! of recursing per parenthesis level.

use super::mode::Mode;
use super::regex::RegexFrame;
use crate::scan::Token;

/// Delimiter that ends the context a command was opened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Closer {
    /// End of the logical line (top level).
    Newline,
    /// The `)` of the enclosing parentheses.
    Paren,
}

#[derive(Debug)]
pub enum Frame {
    TopLevel {
        at_line_start: bool,
    },
    /// Host parentheses, or a splice opened as `obj2args(`.
    Parens {
        /// No significant token seen yet: the next one is a command position.
        at_start: bool,
    },
    /// Just emitted `|`; the next significant token may start a pipe stage.
    PipeStart {
        closer: Closer,
    },
    Command(CommandFrame),
    Regex(RegexFrame),
}

impl Frame {
    pub fn top_level() -> Self {
        Frame::TopLevel {
            at_line_start: true,
        }
    }
}

/// What goes between two argument pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sep {
    /// First piece of the list.
    None,
    /// Next piece starts a new element.
    Comma,
    /// Next piece is glued to the previous one.
    Plus,
}

impl Sep {
    pub fn as_str(self) -> &'static str {
        match self {
            Sep::None => "",
            Sep::Comma => ", ",
            Sep::Plus => "+",
        }
    }
}

/// A command invocation being rewritten.
#[derive(Debug)]
pub struct CommandFrame {
    pub mode: Mode,
    pub closer: Closer,
    /// Raw tokens of the current unquoted stretch (the Pending Argument
    /// Buffer). Flushed before any other piece is emitted.
    pub buffer: Vec<Token>,
    /// `[`/`{` nesting within the arguments; closers only count at zero.
    pub depth: usize,
    /// At least one piece has been emitted into the list.
    pub started: bool,
    /// Past a top-level `,`: copying `key=value` arguments verbatim.
    pub keyword: bool,
}

impl CommandFrame {
    pub fn new(mode: Mode, closer: Closer) -> Self {
        Self {
            mode,
            closer,
            buffer: Vec::new(),
            depth: 0,
            started: false,
            keyword: false,
        }
    }

    /// Whether `token` ends the argument list (or the keyword continuation).
    pub fn is_closer(&self, token: &Token) -> bool {
        if self.depth > 0 {
            return false;
        }
        token.ends_line()
            || token.kind == crate::scan::TokenKind::Comment
            || token.is_op("|")
            || (self.closer == Closer::Paren && token.is_op(")"))
    }

    /// Separator before the next piece; the first piece of the list gets none.
    pub fn separator(&self, glued: bool) -> Sep {
        if !self.started {
            Sep::None
        } else if glued {
            Sep::Plus
        } else {
            Sep::Comma
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::scan;

    #[test]
    fn closers_at_depth_zero_only() {
        let toks = scan("ls [a|b] | x\n").unwrap();
        let mut frame = CommandFrame::new(Mode::Run, Closer::Newline);
        let pipes: Vec<&Token> = toks.iter().filter(|t| t.is_op("|")).collect();
        frame.depth = 1;
        assert!(!frame.is_closer(pipes[0]));
        frame.depth = 0;
        assert!(frame.is_closer(pipes[1]));
        assert!(frame.is_closer(toks.last().unwrap()));
    }

    #[test]
    fn paren_closes_only_inside_parens() {
        let toks = scan("(ls)\n").unwrap();
        let close = &toks[2];
        assert!(!CommandFrame::new(Mode::Run, Closer::Newline).is_closer(close));
        assert!(CommandFrame::new(Mode::Grab, Closer::Paren).is_closer(close));
    }

    #[test]
    fn separators() {
        let mut frame = CommandFrame::new(Mode::Run, Closer::Newline);
        assert_eq!(frame.separator(true), Sep::None);
        frame.started = true;
        assert_eq!(frame.separator(true), Sep::Plus);
        assert_eq!(frame.separator(false), Sep::Comma);
    }
}
