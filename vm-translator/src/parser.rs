//! Parser for the VM bytecode grammar.
//!
//! Pre-loads the whole command sequence, stripping `//` comments and
//! surrounding whitespace per line, exactly as the assembler's own
//! `ParserLines` pre-loads assembly source. Recognizes the full Project 8
//! surface (arithmetic, push/pop, label/goto/if-goto, function/call/return)
//! in one pass; there is no reduced mode.

use crate::error::{Result, VmError};
use std::fs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Arithmetic,
    Push,
    Pop,
    Label,
    Goto,
    If,
    Function,
    Return,
    Call,
}

pub struct Parser {
    lines: Vec<String>,
    current_line: usize,
    /// Whitespace-split tokens of the command currently under the cursor.
    cached_parts: Vec<String>,
}

impl Parser {
    /// Reads and pre-processes a `.vm` file from disk.
    pub fn new(filename: &str) -> Result<Self> {
        let source = fs::read_to_string(filename)?;
        Ok(Self::from_source(&source))
    }

    /// Builds a parser directly from in-memory VM source, stripping
    /// comments and blank lines the same way the file-backed constructor
    /// does. Used by tests and by directory-mode concatenation.
    #[must_use]
    pub fn from_source(source: &str) -> Self {
        let mut lines = Vec::new();
        for line in source.lines() {
            let line = if let Some(pos) = line.find("//") {
                &line[..pos]
            } else {
                line
            };
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                lines.push(trimmed.to_string());
            }
        }

        Self {
            lines,
            current_line: 0,
            cached_parts: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn has_more_commands(&self) -> bool {
        self.current_line < self.lines.len()
    }

    pub fn advance(&mut self) {
        if self.has_more_commands() {
            self.cached_parts.clear();
            self.cached_parts.extend(
                self.lines[self.current_line]
                    .split_whitespace()
                    .map(str::to_string),
            );
            self.current_line += 1;
        }
    }

    pub fn command_type(&self) -> Result<CommandType> {
        let head = self.cached_parts.first().ok_or(VmError::EmptyCommand)?;
        Ok(match head.as_str() {
            "push" => CommandType::Push,
            "pop" => CommandType::Pop,
            "label" => CommandType::Label,
            "goto" => CommandType::Goto,
            "if-goto" => CommandType::If,
            "function" => CommandType::Function,
            "return" => CommandType::Return,
            "call" => CommandType::Call,
            _ => CommandType::Arithmetic,
        })
    }

    pub fn arg1(&self) -> Result<&str> {
        match self.command_type()? {
            CommandType::Arithmetic => Ok(&self.cached_parts[0]),
            CommandType::Return => Err(VmError::NoSuchArg("arg1")),
            _ => self
                .cached_parts
                .get(1)
                .map(String::as_str)
                .ok_or(VmError::NoSuchArg("arg1")),
        }
    }

    pub fn arg2(&self) -> Result<i32> {
        match self.command_type()? {
            CommandType::Push | CommandType::Pop | CommandType::Function | CommandType::Call => {
                let raw = self
                    .cached_parts
                    .get(2)
                    .ok_or_else(|| VmError::MissingArg2(self.cached_parts.join(" ")))?;
                raw.parse::<i32>()
                    .map_err(|_| VmError::InvalidArg2(raw.clone()))
            }
            _ => Err(VmError::NoSuchArg("arg2")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_comments_and_blank_lines() {
        let mut p = Parser::from_source("// header\n\npush constant 7 // inline\nadd\n");
        assert!(p.has_more_commands());
        p.advance();
        assert_eq!(p.command_type().unwrap(), CommandType::Push);
        assert_eq!(p.arg1().unwrap(), "constant");
        assert_eq!(p.arg2().unwrap(), 7);

        p.advance();
        assert_eq!(p.command_type().unwrap(), CommandType::Arithmetic);
        assert_eq!(p.arg1().unwrap(), "add");

        assert!(!p.has_more_commands());
    }

    #[test]
    fn recognizes_full_project_8_surface() {
        let source = "label L1\ngoto L1\nif-goto L1\nfunction Foo.bar 2\ncall Foo.bar 0\nreturn\n";
        let mut p = Parser::from_source(source);
        let expected = [
            CommandType::Label,
            CommandType::Goto,
            CommandType::If,
            CommandType::Function,
            CommandType::Call,
            CommandType::Return,
        ];
        for want in expected {
            p.advance();
            assert_eq!(p.command_type().unwrap(), want);
        }
    }

    #[test]
    fn missing_arg2_is_an_error_not_a_panic() {
        let mut p = Parser::from_source("push constant\n");
        p.advance();
        assert!(p.arg2().is_err());
    }

    #[test]
    fn arg1_on_return_is_an_error() {
        let mut p = Parser::from_source("return\n");
        p.advance();
        assert!(p.arg1().is_err());
    }
}
