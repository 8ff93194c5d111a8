//! The token-stream rewriter.
//!
//! Walks the scanned tokens once and copies them to the output, replacing
//! command lines with runtime calls and regex sugar with constructor calls.
//! Nesting is tracked on an explicit [`Frame`] stack: each token is handed
//! to the innermost frame, which either consumes it or pops itself and lets
//! the enclosing frame see the same token.

pub mod args;
pub mod context;
pub mod mode;
pub mod regex;
pub mod stream;

use log::debug;

use crate::commands::CommandRegistry;
use crate::error::CompileError;
use crate::scan::{self, Token, TokenKind};
use context::{Closer, CommandFrame, Frame, Sep};
use mode::Mode;
use self::regex::RegexTable;
use stream::TokenStream;

/// Operators that bind the name on their left.
const BINDING_OPS: &[&str] = &[
    "=", ":=", "+=", "-=", "*=", "/=", "//=", "%=", "**=", ">>=", "<<=", "&=", "^=", "|=", "@=",
];

/// Keywords that bind the name on their right.
const BINDING_KEYWORDS: &[&str] = &["def", "class", "for", "as", "import", "global", "nonlocal"];

/// Rewriter output: the new token stream and the patterns it references.
#[derive(Debug)]
pub struct Rewritten {
    pub tokens: Vec<Token>,
    pub regexen: RegexTable,
}

pub struct Rewriter<'a, 'r> {
    stream: TokenStream<'a>,
    registry: &'r mut CommandRegistry,
    frames: Vec<Frame>,
    out: Vec<Token>,
    regexen: RegexTable,
    /// Last emitted token that carries code.
    last: Option<Token>,
}

impl<'a, 'r> Rewriter<'a, 'r> {
    pub fn new(src: &'a str, tokens: Vec<Token>, registry: &'r mut CommandRegistry) -> Self {
        Self {
            stream: TokenStream::new(src, tokens),
            registry,
            frames: vec![Frame::top_level()],
            out: Vec::new(),
            regexen: RegexTable::default(),
            last: None,
        }
    }

    pub fn rewrite(mut self) -> Result<Rewritten, CompileError> {
        while let Some(token) = self.stream.next() {
            self.dispatch(token)?;
        }
        Ok(Rewritten {
            tokens: self.out,
            regexen: self.regexen,
        })
    }

    /// Hand `token` to the innermost frame. The frame is popped for the
    /// duration of the step; handlers push it back if it stays open.
    fn dispatch(&mut self, token: Token) -> Result<(), CompileError> {
        match self.frames.pop().unwrap_or_else(Frame::top_level) {
            Frame::TopLevel { at_line_start } => self.top_level(at_line_start, token),
            Frame::Parens { at_start } => self.parens(at_start, token),
            Frame::PipeStart { closer } => self.pipe_start(closer, token),
            Frame::Command(frame) => self.command(frame, token),
            Frame::Regex(frame) => self.regex_step(frame, token),
        }
    }

    fn top_level(&mut self, at_line_start: bool, token: Token) -> Result<(), CompileError> {
        if at_line_start && token.is_layout() {
            self.frames.push(Frame::TopLevel {
                at_line_start: true,
            });
            self.emit(token);
            return Ok(());
        }
        self.frames.push(Frame::TopLevel {
            at_line_start: token.kind == TokenKind::Newline,
        });
        if at_line_start && let Some(word) = self.command_word(&token) {
            let mode = match self.builtin_mode(&word) {
                Some(mode) => mode,
                None => mode::statement_mode(self.stream.rest_of_line(token.start)),
            };
            return self.start_command(token, &word, mode, Closer::Newline);
        }
        self.host(token)
    }

    fn parens(&mut self, at_start: bool, token: Token) -> Result<(), CompileError> {
        if token.is_op(")") {
            self.emit(token);
            return Ok(());
        }
        if at_start && token.is_layout() {
            self.frames.push(Frame::Parens { at_start: true });
            self.emit(token);
            return Ok(());
        }
        self.frames.push(Frame::Parens { at_start: false });
        if at_start && let Some(word) = self.command_word(&token) {
            let mode = self.builtin_mode(&word).unwrap_or(Mode::Grab);
            return self.start_command(token, &word, mode, Closer::Paren);
        }
        self.host(token)
    }

    fn pipe_start(&mut self, closer: Closer, token: Token) -> Result<(), CompileError> {
        if matches!(token.kind, TokenKind::Nl | TokenKind::Comment) {
            self.frames.push(Frame::PipeStart { closer });
            self.emit(token);
            return Ok(());
        }
        if let Some(word) = self.command_word(&token) {
            let mode = match self.builtin_mode(&word) {
                Some(mode) => mode,
                None => mode::pipe_mode(
                    self.stream.rest_of_line(token.start),
                    closer == Closer::Newline,
                ),
            };
            return self.start_command(token, &word, mode, closer);
        }
        self.dispatch(token)
    }

    fn command(&mut self, mut frame: CommandFrame, token: Token) -> Result<(), CompileError> {
        if frame.is_closer(&token) {
            self.close_command(frame, &token)?;
            return self.dispatch(token);
        }

        if token.is_op("[") || token.is_op("{") {
            frame.depth += 1;
        } else if token.is_op("]") || token.is_op("}") {
            frame.depth = frame.depth.saturating_sub(1);
        }

        if frame.keyword {
            self.frames.push(Frame::Command(frame));
            return self.host(token);
        }

        if frame.depth == 0 && token.is_op(",") {
            self.flush(&mut frame)?;
            let close = frame.mode.list_close(true);
            if !close.is_empty() {
                self.insert(close, &token)?;
            }
            frame.keyword = true;
            self.frames.push(Frame::Command(frame));
            self.emit(token);
            return Ok(());
        }

        if token.kind == TokenKind::String {
            self.flush(&mut frame)?;
            let leading = self.separate(&mut frame, &token)?;
            self.frames.push(Frame::Command(frame));
            self.emit(token.with_leading(leading));
            return Ok(());
        }

        if token.is_op("(") {
            self.flush(&mut frame)?;
            let leading = self.separate(&mut frame, &token)?;
            self.replace_with("obj2args(", &token.with_leading(leading))?;
            self.frames.push(Frame::Command(frame));
            self.frames.push(Frame::Parens { at_start: true });
            return Ok(());
        }

        frame.buffer.push(token);
        self.frames.push(Frame::Command(frame));
        Ok(())
    }

    /// Shared handling of ordinary host tokens.
    fn host(&mut self, token: Token) -> Result<(), CompileError> {
        if token.is_op("(") {
            self.emit(token);
            self.frames.push(Frame::Parens { at_start: true });
            return Ok(());
        }
        if token.is_op("|") {
            let closer = self.context_closer();
            self.emit(token);
            self.frames.push(Frame::PipeStart { closer });
            return Ok(());
        }
        if let Some(kind) = self.regex_trigger(&token) {
            return self.start_regex(kind, token);
        }
        self.emit(token);
        Ok(())
    }

    /// The registered command starting at `token`, if any. The word runs to
    /// the first whitespace, quote, `|` or `)` on the line, so `test(x)` is
    /// the word `test(x)` and stays a host call.
    fn command_word(&self, token: &Token) -> Option<String> {
        if token.kind != TokenKind::Name {
            return None;
        }
        let rest = self.stream.rest_of_line(token.start);
        let end = rest
            .find(|c: char| c.is_whitespace() || matches!(c, '\'' | '"' | '|' | ')'))
            .unwrap_or(rest.len());
        let word = &rest[..end];
        self.registry.contains(word).then(|| word.to_string())
    }

    fn builtin_mode(&self, word: &str) -> Option<Mode> {
        let identifier = word
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_');
        (identifier && self.registry.is_builtin(word)).then_some(Mode::Builtin)
    }

    fn context_closer(&self) -> Closer {
        if self
            .frames
            .iter()
            .any(|f| matches!(f, Frame::Parens { .. }))
        {
            Closer::Paren
        } else {
            Closer::Newline
        }
    }

    fn start_command(
        &mut self,
        token: Token,
        word: &str,
        mode: Mode,
        closer: Closer,
    ) -> Result<(), CompileError> {
        debug!("line {}: {word} -> {}", token.line, mode.as_str());
        self.replace_with(&mode.opening(word), &token)?;
        let mut frame = CommandFrame::new(mode, closer);
        if mode.includes_command() {
            frame.buffer.push(token);
        }
        self.frames.push(Frame::Command(frame));
        Ok(())
    }

    fn close_command(&mut self, mut frame: CommandFrame, closer: &Token) -> Result<(), CompileError> {
        let close = if frame.keyword {
            ")"
        } else {
            self.flush(&mut frame)?;
            frame.mode.list_close(false)
        };
        self.insert(close, closer)
    }

    /// Emit the buffered unquoted words as list elements.
    fn flush(&mut self, frame: &mut CommandFrame) -> Result<(), CompileError> {
        let (Some(first), Some(last)) = (frame.buffer.first(), frame.buffer.last()) else {
            return Ok(());
        };
        let words = args::split_words(self.stream.text(first.start, last.end));
        let anchor = first.clone();
        frame.buffer.clear();
        if words.is_empty() {
            return Ok(());
        }
        let sep = frame.separator(self.glued(anchor.start));
        let code = format!("{}{}", sep.as_str(), args::words_expr(&words));
        self.insert(&code, &anchor)?;
        frame.started = true;
        Ok(())
    }

    /// Emit the separator before a string or spliced piece; returns the
    /// leading whitespace for the piece itself.
    fn separate(
        &mut self,
        frame: &mut CommandFrame,
        piece: &Token,
    ) -> Result<&'static str, CompileError> {
        let sep = frame.separator(self.glued(piece.start));
        frame.started = true;
        match sep {
            Sep::None => Ok(""),
            Sep::Plus => self.insert("+", piece).map(|()| ""),
            Sep::Comma => self.insert(",", piece).map(|()| " "),
        }
    }

    /// A piece starting at `offset` continues the previous word unless a
    /// space or tab precedes it.
    fn glued(&self, offset: usize) -> bool {
        !matches!(self.stream.char_before(offset), Some(' ' | '\t'))
    }

    /// Emit `code` in place of `token`, keeping its leading whitespace.
    fn replace_with(&mut self, code: &str, token: &Token) -> Result<(), CompileError> {
        let mut tokens = scan::fragment(code, token)?;
        if let Some(first) = tokens.first_mut() {
            first.leading = token.leading.clone();
        }
        for t in tokens {
            self.emit(t);
        }
        Ok(())
    }

    /// Emit generated `code` at the position of `anchor`.
    fn insert(&mut self, code: &str, anchor: &Token) -> Result<(), CompileError> {
        for t in scan::fragment(code, anchor)? {
            self.emit(t);
        }
        Ok(())
    }

    fn emit(&mut self, token: Token) {
        if !token.synthetic {
            self.shadow(&token);
        }
        if !token.is_layout() {
            self.last = Some(token.clone());
        }
        self.out.push(token);
    }

    /// Drop a command name from the registry once the script binds it.
    fn shadow(&mut self, token: &Token) {
        let Some(prev) = self.last.as_ref().filter(|t| !t.synthetic) else {
            return;
        };
        let bound = if token.kind == TokenKind::Op
            && BINDING_OPS.contains(&token.text.as_str())
            && prev.kind == TokenKind::Name
        {
            Some(prev.text.clone())
        } else if token.kind == TokenKind::Name
            && prev.kind == TokenKind::Name
            && BINDING_KEYWORDS.contains(&prev.text.as_str())
        {
            Some(token.text.clone())
        } else {
            None
        };
        if let Some(name) = bound {
            self.registry.discard(&name);
        }
    }
}

/// Rewrite `tokens` (scanned from `src`) against `registry`.
pub fn rewrite(
    src: &str,
    tokens: Vec<Token>,
    registry: &mut CommandRegistry,
) -> Result<Rewritten, CompileError> {
    Rewriter::new(src, tokens, registry).rewrite()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::emit;

    fn registry() -> CommandRegistry {
        CommandRegistry::from_names(["ls", "grep", "wc", "echo", "ssh-keygen"], ["cd"])
    }

    fn compile_with(src: &str, registry: &mut CommandRegistry) -> String {
        let tokens = scan::scan(src).unwrap();
        let out = rewrite(src, tokens, registry).unwrap();
        emit(&out.tokens).unwrap()
    }

    fn compile(src: &str) -> String {
        compile_with(src, &mut registry())
    }

    #[test]
    fn plain_code_unchanged() {
        let src = "def f(x):\n    return x * 2  # double\n\nprint(f(3))\n";
        assert_eq!(compile(src), src);
    }

    #[test]
    fn top_level_command() {
        assert_eq!(compile("ls -l /tmp\n"), "run(['ls', '-l', '/tmp'])\n");
    }

    #[test]
    fn indented_command_keeps_indent() {
        assert_eq!(
            compile("if x:\n    ls -a\n"),
            "if x:\n    run(['ls', '-a'])\n"
        );
    }

    #[test]
    fn trailing_comment_kept() {
        assert_eq!(compile("ls  # list\n"), "run(['ls'])  # list\n");
    }

    #[test]
    fn hyphenated_command() {
        assert_eq!(
            compile("ssh-keygen -t ed25519\n"),
            "run(['ssh-keygen', '-t', 'ed25519'])\n"
        );
    }

    #[test]
    fn command_in_parens_grabs() {
        assert_eq!(
            compile("files = (ls -a)\n"),
            "files = (grab(['ls', '-a']))\n"
        );
    }

    #[test]
    fn top_level_pipe() {
        assert_eq!(
            compile("ls | grep py\n"),
            "grab(['ls']) | Pipe(['grep', 'py'])\n"
        );
    }

    #[test]
    fn three_stage_pipe() {
        assert_eq!(
            compile("ls | grep py | wc -l\n"),
            "grab(['ls']) | GrabPipe(['grep', 'py']) | Pipe(['wc', '-l'])\n"
        );
    }

    #[test]
    fn pipe_inside_parens() {
        assert_eq!(
            compile("n = (ls | wc -l)\n"),
            "n = (grab(['ls']) | GrabPipe(['wc', '-l']))\n"
        );
    }

    #[test]
    fn string_into_pipe() {
        assert_eq!(
            compile("'a\\nb' | grep a\n"),
            "'a\\nb' | Pipe(['grep', 'a'])\n"
        );
    }

    #[test]
    fn quoted_arguments_spliced() {
        assert_eq!(
            compile("echo \"a b\" c'd'\n"),
            "run(['echo', \"a b\", 'c'+'d'])\n"
        );
    }

    #[test]
    fn host_expression_spliced() {
        assert_eq!(
            compile("echo (name) x(n)\n"),
            "run(['echo', obj2args(name), 'x'+obj2args(n)])\n"
        );
    }

    #[test]
    fn command_substitution() {
        assert_eq!(
            compile("echo (ls)\n"),
            "run(['echo', obj2args(grab(['ls']))])\n"
        );
    }

    #[test]
    fn keyword_continuation() {
        assert_eq!(
            compile("ls -l, stdout=out\n"),
            "run(['ls', '-l'], stdout=out)\n"
        );
    }

    #[test]
    fn builtin_call() {
        assert_eq!(compile("cd /tmp\n"), "builtin.cd('/tmp')\n");
        assert_eq!(compile("cd\n"), "builtin.cd()\n");
    }

    #[test]
    fn glob_argument() {
        assert_eq!(compile("ls *.py\n"), "run(['ls', globarg('*.py')])\n");
    }

    #[test]
    fn not_at_command_position() {
        let src = "x = ls\nf(1, ls)\n";
        assert_eq!(compile(src), src);
    }

    #[test]
    fn call_at_line_start_is_host_code() {
        let mut reg = CommandRegistry::from_names(["test", "ls"], ["cd"]);
        let src = "def main():\n    test(ARGV)\nls(1)\nx = (ls(2), 3)\n";
        assert_eq!(compile_with(src, &mut reg), src);
    }

    #[test]
    fn shadowing_assignment() {
        let mut reg = registry();
        let src = "for wc in range(3):\n    pass\nwc\n";
        assert_eq!(compile_with(src, &mut reg), src);
        assert!(!reg.contains("wc"));
    }

    #[test]
    fn shadowing_def() {
        let mut reg = registry();
        compile_with("def grep(x):\n    pass\n", &mut reg);
        assert!(!reg.contains("grep"));
        assert!(reg.contains("ls"));
    }

    #[test]
    fn regex_literal_registered() {
        let tokens = scan::scan("m/'a+'/\n").unwrap();
        let mut reg = registry();
        let out = rewrite("m/'a+'/\n", tokens, &mut reg).unwrap();
        assert_eq!(emit(&out.tokens).unwrap(), "Matcher(_regexen[0], 1)\n");
        assert_eq!(out.regexen.get(0).unwrap().pattern(), "a+");
    }

    #[test]
    fn regex_forms() {
        assert_eq!(
            compile("y = s/'a'/'b'/g\n"),
            "y = Substituter(_regexen[0], 'b', 0)\n"
        );
        assert_eq!(compile("z = split/p/\n"), "z = Splitter(p)\n");
        assert_eq!(
            compile("w = m/pat/i\n"),
            "w = Matcher(pat, 1, flags='i')\n"
        );
    }

    #[test]
    fn attribute_is_not_a_trigger() {
        let src = "parts = line.split/2\n";
        assert_eq!(compile(src), src);
    }

    #[test]
    fn unterminated_regex_fails() {
        let tokens = scan::scan("m/'a'\n").unwrap();
        let err = rewrite("m/'a'\n", tokens, &mut registry()).unwrap_err();
        assert!(matches!(err, CompileError::Tokenize { line: 1, .. }));
    }
}
