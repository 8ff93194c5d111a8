use crate::scan::Token;

/// Pull-model cursor over scanned tokens with access to the raw source.
///
/// Command detection and argument splitting look at source text rather than
/// tokens, so the stream keeps both.
pub struct TokenStream<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> TokenStream<'a> {
    pub fn new(src: &'a str, tokens: Vec<Token>) -> Self {
        Self {
            src,
            tokens,
            pos: 0,
        }
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    pub fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Source text between two byte offsets.
    pub fn text(&self, start: usize, end: usize) -> &'a str {
        self.src.get(start..end).unwrap_or("")
    }

    /// Source text from `start` to the end of its physical line.
    pub fn rest_of_line(&self, start: usize) -> &'a str {
        let rest = self.src.get(start..).unwrap_or("");
        match rest.find('\n') {
            Some(end) => &rest[..end],
            None => rest,
        }
    }

    /// The source character ending at byte `offset`.
    pub fn char_before(&self, offset: usize) -> Option<char> {
        self.src.get(..offset)?.chars().next_back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::scan;

    #[test]
    fn peek_then_next() {
        let src = "a b\n";
        let mut ts = TokenStream::new(src, scan(src).unwrap());
        assert!(ts.peek().unwrap().is_name("a"));
        assert!(ts.next().unwrap().is_name("a"));
        assert!(ts.next().unwrap().is_name("b"));
        ts.next();
        ts.next();
        assert!(ts.peek().is_none());
        assert!(ts.next().is_none());
    }

    #[test]
    fn raw_access() {
        let src = "ls -l | wc\nx\n";
        let ts = TokenStream::new(src, scan(src).unwrap());
        assert_eq!(ts.rest_of_line(3), "-l | wc");
        assert_eq!(ts.text(0, 2), "ls");
        assert_eq!(ts.char_before(3), Some(' '));
        assert_eq!(ts.char_before(0), None);
        assert_eq!(ts.char_before(src.len()), Some('\n'));
    }
}
