use super::Error;

fn is_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\n' | b'\r' | b'\t' | b'\0' | 0x0C)
}

/// Characters that always delimit tokens.
fn is_special(c: u8) -> bool {
    matches!(
        c,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

#[derive(Copy, Clone, PartialEq, Debug)]
pub(crate) enum Token<'a> {
    Number(f64),
    /// Literal strings, delimited by ()
    String(&'a str),
    /// Procedures, delimited by {}
    Procedure(&'a str),
    /// Names, preceded by /
    Name(&'a str),
    ArrayStart,
    ArrayEnd,
    /// All other raw tokens
    Operator(&'a str),
}

pub(crate) struct Lexer<'a> {
    data: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(data: &'a str) -> Self {
        Self { data, pos: 0 }
    }

    fn next_token(&mut self) -> Result<Option<Token<'a>>, Error> {
        loop {
            if self.skip_whitespace().is_none() {
                return Ok(None);
            }
            let start = self.pos;
            let Some(c) = self.next_byte() else {
                return Ok(None);
            };
            return Ok(Some(match c {
                // Line comment
                b'%' => {
                    while let Some(c) = self.next_byte() {
                        if c == b'\n' || c == b'\r' {
                            break;
                        }
                    }
                    continue;
                }
                b'{' => {
                    self.skip_nested(b'{', b'}', Error::UnterminatedProcedure)?;
                    Token::Procedure(&self.data[start + 1..self.pos - 1])
                }
                b'(' => {
                    self.skip_nested(b'(', b')', Error::UnterminatedString)?;
                    Token::String(&self.data[start + 1..self.pos - 1])
                }
                b'[' => Token::ArrayStart,
                b']' => Token::ArrayEnd,
                b'/' => {
                    self.skip_raw()?;
                    Token::Name(&self.data[start + 1..self.pos])
                }
                _ => {
                    if c == b'\\' {
                        self.next_byte().ok_or(Error::TrailingEscape)?;
                    }
                    self.skip_raw()?;
                    let raw = &self.data[start..self.pos];
                    match parse_number(raw) {
                        Some(n) => Token::Number(n),
                        None => Token::Operator(raw),
                    }
                }
            }));
        }
    }

    /// Skips to the byte after the matching close delimiter.
    fn skip_nested(&mut self, open: u8, close: u8, unterminated: Error) -> Result<(), Error> {
        let mut depth = 1;
        while let Some(c) = self.next_byte() {
            match c {
                b'\\' => {
                    self.next_byte().ok_or(Error::TrailingEscape)?;
                }
                c if c == open => depth += 1,
                c if c == close => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
        Err(unterminated)
    }

    fn skip_raw(&mut self) -> Result<(), Error> {
        while let Some(c) = self.peek_byte() {
            if is_whitespace(c) || is_special(c) {
                break;
            }
            self.pos += 1;
            if c == b'\\' {
                self.next_byte().ok_or(Error::TrailingEscape)?;
            }
        }
        Ok(())
    }

    fn next_byte(&mut self) -> Option<u8> {
        let byte = self.peek_byte()?;
        self.pos += 1;
        Some(byte)
    }

    fn peek_byte(&self) -> Option<u8> {
        self.data.as_bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) -> Option<()> {
        while is_whitespace(*self.data.as_bytes().get(self.pos)?) {
            self.pos += 1;
        }
        Some(())
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_token() {
            Ok(token) => token.map(Ok),
            Err(err) => {
                self.pos = self.data.len();
                Some(Err(err))
            }
        }
    }
}

/// Parses an optionally signed decimal number such as `3`, `-1.5` or `.25`.
fn parse_number(s: &str) -> Option<f64> {
    let digits = s.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(s);
    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (digits, None),
    };
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    let valid = all_digits(whole)
        && fraction.map_or(true, all_digits)
        && (!whole.is_empty() || fraction.is_some_and(|f| !f.is_empty()));
    if !valid {
        return None;
    }
    s.parse().ok()
}
