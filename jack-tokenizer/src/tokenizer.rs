//! Lazy byte-level lexer for Jack source.
//!
//! Scans the source by byte offset rather than through a `Chars` iterator —
//! every delimiter this lexer looks for (`"`, digits, identifier
//! characters, the fixed symbol set, `/`, `*`, newline) is single-byte
//! ASCII, so byte slicing never lands inside a multi-byte UTF-8 sequence
//! even when a string constant's contents are not ASCII.

use crate::error::{LexError, Result};
use crate::token::{Keyword, Token, SYMBOLS};

pub struct Tokenizer<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Self {
            bytes: source.as_bytes(),
            pos: 0,
        }
    }

    #[must_use]
    pub fn has_more_tokens(&self) -> bool {
        self.pos < self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<()> {
        loop {
            match self.peek() {
                Some(b) if b.is_ascii_whitespace() => self.pos += 1,
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    self.pos += 2;
                    while let Some(b) = self.peek() {
                        if b == b'\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    self.pos += 2;
                    loop {
                        match self.peek() {
                            None => return Err(LexError::UnterminatedComment),
                            Some(b'*') if self.peek_at(1) == Some(b'/') => {
                                self.pos += 2;
                                break;
                            }
                            Some(_) => self.pos += 1,
                        }
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Fetches the next token, or `None` at end of input.
    pub fn advance(&mut self) -> Result<Option<Token>> {
        self.skip_whitespace_and_comments()?;
        let Some(b) = self.peek() else {
            return Ok(None);
        };

        match b {
            b'"' => self.read_string().map(Some),
            b'0'..=b'9' => self.read_int().map(Some),
            b if is_identifier_start(b) => Ok(Some(self.read_identifier_or_keyword())),
            b if SYMBOLS.as_bytes().contains(&b) => {
                self.pos += 1;
                Ok(Some(Token::Symbol(b as char)))
            }
            other => Err(LexError::UnrecognizedCharacter(other as char)),
        }
    }

    fn read_string(&mut self) -> Result<Token> {
        self.pos += 1; // opening quote
        let start = self.pos;
        loop {
            match self.peek() {
                None | Some(b'\n') => return Err(LexError::UnterminatedString),
                Some(b'"') => break,
                Some(_) => self.pos += 1,
            }
        }
        let contents = std::str::from_utf8(&self.bytes[start..self.pos])
            .expect("byte scan never splits a UTF-8 sequence")
            .to_string();
        self.pos += 1; // closing quote
        Ok(Token::StringConst(contents))
    }

    fn read_int(&mut self) -> Result<Token> {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        let digits = std::str::from_utf8(&self.bytes[start..self.pos]).unwrap();
        digits
            .parse::<i32>()
            .map(Token::IntConst)
            .map_err(|_| LexError::IntegerOverflow(digits.to_string()))
    }

    fn read_identifier_or_keyword(&mut self) -> Token {
        let start = self.pos;
        while self.peek().is_some_and(is_identifier_continue) {
            self.pos += 1;
        }
        let spelling = std::str::from_utf8(&self.bytes[start..self.pos]).unwrap();
        Keyword::lookup(spelling).map_or_else(
            || Token::Identifier(spelling.to_string()),
            Token::Keyword,
        )
    }
}

fn is_identifier_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_identifier_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Tokenizes a whole source string eagerly; convenient for callers (tests,
/// the XML writer's tokens-only pass) that want the full stream at once
/// rather than driving `advance()` by hand.
pub fn tokenize_all(source: &str) -> Result<Vec<Token>> {
    let mut tokenizer = Tokenizer::new(source);
    let mut tokens = Vec::new();
    while let Some(token) = tokenizer.advance()? {
        tokens.push(token);
    }
    Ok(tokens)
}
