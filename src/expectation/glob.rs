/// Shell-style wildcard pattern over raw bytes
///
/// `*` matches any run of bytes (including none), `?` exactly one byte, and
/// every other byte itself. The whole input must be covered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Glob {
    tokens: Vec<Token>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Token {
    Literal(u8),
    AnyOne,
    AnyRun,
}

impl Glob {
    /// With `escapes`, `\*`, `\?` and `\\` stand for the literal byte
    pub(crate) fn new(pattern: &[u8], escapes: bool) -> Self {
        let mut tokens = Vec::with_capacity(pattern.len());
        let mut iter = pattern.iter().peekable();
        while let Some(byte) = iter.next() {
            let token = match byte {
                b'*' => Token::AnyRun,
                b'?' => Token::AnyOne,
                b'\\' if escapes => match iter.peek() {
                    Some(&&next) if matches!(next, b'*' | b'?' | b'\\') => {
                        iter.next();
                        Token::Literal(next)
                    }
                    _ => Token::Literal(b'\\'),
                },
                other => Token::Literal(*other),
            };
            // consecutive stars are equivalent to one
            if token == Token::AnyRun && tokens.last() == Some(&Token::AnyRun) {
                continue;
            }
            tokens.push(token);
        }
        Self { tokens }
    }

    pub(crate) fn matches(&self, text: &[u8]) -> bool {
        let mut pos = 0;
        let mut idx = 0;
        let mut backtrack: Option<(usize, usize)> = None;
        while idx < text.len() {
            match self.tokens.get(pos) {
                Some(Token::AnyRun) => {
                    backtrack = Some((pos, idx));
                    pos += 1;
                }
                Some(Token::AnyOne) => {
                    pos += 1;
                    idx += 1;
                }
                Some(Token::Literal(byte)) if *byte == text[idx] => {
                    pos += 1;
                    idx += 1;
                }
                _ => match backtrack {
                    Some((star, start)) => {
                        pos = star + 1;
                        idx = start + 1;
                        backtrack = Some((star, start + 1));
                    }
                    None => return false,
                },
            }
        }
        self.tokens[pos..].iter().all(|t| *t == Token::AnyRun)
    }
}
