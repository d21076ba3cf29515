use std::borrow::Cow;

/// Iterate over the physical lines of captured output, keeping each `\n`
///
/// A last line without terminator is yielded as-is; empty input has no lines.
#[derive(Clone, Debug)]
pub struct LinesWithTerminator<'a> {
    data: &'a [u8],
}

impl<'a> LinesWithTerminator<'a> {
    pub fn new(data: &'a [u8]) -> LinesWithTerminator<'a> {
        LinesWithTerminator { data }
    }
}

impl<'a> Iterator for LinesWithTerminator<'a> {
    type Item = &'a [u8];

    #[inline]
    fn next(&mut self) -> Option<&'a [u8]> {
        match self.data.iter().position(|b| *b == b'\n') {
            None if self.data.is_empty() => None,
            None => {
                let line = self.data;
                self.data = &[];
                Some(line)
            }
            Some(end) => {
                let line = &self.data[..end + 1];
                self.data = &self.data[end + 1..];
                Some(line)
            }
        }
    }
}

/// Strip all trailing `\n` and `\r`
pub fn trim_newlines(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|b| *b != b'\n' && *b != b'\r')
        .map_or(0, |idx| idx + 1);
    &line[..end]
}

pub fn ends_in_newline(data: &[u8]) -> bool {
    data.last() == Some(&b'\n')
}

/// Replace every `\r\n` with `\n`, leaving lone `\r` untouched
pub fn replace_crlf(data: &[u8]) -> Cow<'_, [u8]> {
    if !data.windows(2).any(|w| w == b"\r\n") {
        return Cow::Borrowed(data);
    }
    let mut replaced = Vec::with_capacity(data.len());
    let mut iter = data.iter().peekable();
    while let Some(b) = iter.next() {
        if *b == b'\r' && iter.peek() == Some(&&b'\n') {
            continue;
        }
        replaced.push(*b);
    }
    Cow::Owned(replaced)
}
