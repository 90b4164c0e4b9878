use crate::error::Diagnostic;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[rustfmt::skip]
pub enum TokenKind {
    Word, Text,
    Eol, Eof,

    Define, DefineInline, Ellipsis,
    LParen, RParen, LBracket, RBracket,
    Colon, Pipe, Question, Plus, Star, Percent,
    Unknown,
}

use TokenKind::*;

/// Single-pass scanner over grammar source text.
///
/// Tokens are produced one at a time by [`advance`] and consumed immediately
/// by the parser; there is no token buffer. `capture` and `previous` hold the
/// raw source text of the current and previously consumed tokens so that
/// diagnostics can point at both.
///
/// [`advance`]: Lexer::advance
pub struct Lexer<'a> {
    src: &'a [u8],
    pos: u32,
    pub token: TokenKind,
    pub line: u32,
    /// Decoded payload of the current `Word` or `Text` token.
    pub value: String,
    /// Raw source text of the current token.
    pub capture: String,
    /// Raw source text of the previously consumed token.
    pub previous: String,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Lexer<'a> {
        Lexer {
            src: src.as_bytes(),
            pos: 0,
            token: Eof,
            line: 1,
            value: String::new(),
            capture: String::new(),
            previous: String::new(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos as usize).copied()
    }

    fn next(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    fn consume(&mut self, value: u8) -> bool {
        if self.peek() == Some(value) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn consume_while(&mut self, predicate: impl Fn(u8) -> bool) {
        while let Some(byte) = self.peek() {
            if !predicate(byte) {
                break;
            }
            self.pos += 1;
        }
    }

    fn sequence(&mut self, sequence: &[u8]) -> bool {
        if self.src[self.pos as usize..].starts_with(sequence) {
            self.pos += sequence.len() as u32;
            true
        } else {
            false
        }
    }

    fn restore_pos(&mut self, pos: u32) {
        debug_assert!(pos as usize <= self.src.len());
        self.pos = pos;
    }

    fn raw(&self, start: u32) -> String {
        String::from_utf8_lossy(&self.src[start as usize..self.pos as usize]).into_owned()
    }

    /// Builds a diagnostic at the current line, attaching the previous and
    /// current token texts when present.
    pub fn diagnostic(&self, message: impl ToString) -> Diagnostic {
        let non_empty = |s: &String| (!s.is_empty()).then(|| s.clone());
        Diagnostic {
            line: Some(self.line),
            message: message.to_string(),
            after: non_empty(&self.previous),
            found: non_empty(&self.capture),
            rule: None,
        }
    }

    /// Classifies the next token into `self.token`. Whitespace and `//`
    /// comments are skipped and never surface as tokens; end of input yields
    /// a sticky `Eof`. The only lexical error is an unterminated text
    /// literal.
    pub fn advance(&mut self) -> Result<(), Diagnostic> {
        self.previous = std::mem::take(&mut self.capture);
        loop {
            let start = self.pos;
            let Some(byte) = self.next() else {
                self.token = Eof;
                self.capture = "end of file".to_owned();
                return Ok(());
            };
            match byte {
                b'\n' | b'\r' => {
                    if byte == b'\r' {
                        self.consume(b'\n');
                    }
                    self.line += 1;
                    self.token = Eol;
                    self.capture = "beginning of line".to_owned();
                    return Ok(());
                }
                b'\t' | b'\x0B' | b'\x0C' | b' ' => {
                    self.consume_while(|c| matches!(c, b'\t' | b'\x0B' | b'\x0C' | b' '));
                    continue;
                }
                b'/' if self.peek() == Some(b'/') => {
                    self.consume_while(|c| c != b'\n' && c != b'\r');
                    continue;
                }
                quote @ (b'\'' | b'"') => {
                    self.value = self.text_literal(start, quote)?;
                    self.capture = self.raw(start);
                    self.token = Text;
                    return Ok(());
                }
                b'@' | b'_' | b'A'..=b'Z' | b'a'..=b'z' => {
                    self.consume_while(
                        |c| matches!(c, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-'),
                    );
                    self.capture = self.raw(start);
                    self.value = self.capture.clone();
                    self.token = Word;
                    return Ok(());
                }
                _ => {
                    self.restore_pos(start);
                    self.token = 'symbol: {
                        if self.sequence(b"...") {
                            break 'symbol Ellipsis;
                        }
                        if self.sequence(b"::=") {
                            break 'symbol Define;
                        }
                        if self.sequence(b"::-") {
                            break 'symbol DefineInline;
                        }
                        self.pos += 1;
                        match byte {
                            b'(' => LParen,
                            b')' => RParen,
                            b'[' => LBracket,
                            b']' => RBracket,
                            b':' => Colon,
                            b'|' => Pipe,
                            b'?' => Question,
                            b'+' => Plus,
                            b'*' => Star,
                            b'%' => Percent,
                            _ => {
                                // step over the continuation bytes of a multi-byte character
                                self.consume_while(|c| c & 0xC0 == 0x80);
                                Unknown
                            }
                        }
                    };
                    self.capture = self.raw(start);
                    return Ok(());
                }
            }
        }
    }

    /// Scans the remainder of a quoted literal and decodes its escapes. The
    /// literal must close before end of line or end of input.
    fn text_literal(&mut self, start: u32, quote: u8) -> Result<String, Diagnostic> {
        let mut out = Vec::new();
        loop {
            match self.peek() {
                None | Some(b'\n') | Some(b'\r') => {
                    self.capture = self.raw(start);
                    return Err(self.diagnostic("unterminated text literal"));
                }
                Some(b'\\') => {
                    self.pos += 1;
                    match self.peek() {
                        // leave the line break in place so the arm above reports it
                        None | Some(b'\n') | Some(b'\r') => continue,
                        Some(escaped) => {
                            self.pos += 1;
                            out.push(unescape(escaped));
                        }
                    }
                }
                Some(byte) => {
                    self.pos += 1;
                    if byte == quote {
                        break;
                    }
                    out.push(byte);
                }
            }
        }
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}

/// The escape set of quoted literals; any other escaped byte maps to itself.
fn unescape(byte: u8) -> u8 {
    match byte {
        b'b' => 0x08,
        b'f' => 0x0C,
        b'n' => b'\n',
        b'r' => b'\r',
        b't' => b'\t',
        b'v' => 0x0B,
        b'0' => 0x00,
        other => other,
    }
}
