//! Parse-tree XML writer.
//!
//! Shares the tokenizer and grammar skeleton with the VM-emitting engine
//! (one routine per nonterminal, same lookahead rules) but carries no
//! symbol table: every nonterminal routine brackets its children with an
//! open/close tag named after the nonterminal, and every consumed token is
//! written as a leaf tag named after its token kind.

use crate::error::{JackError, Result};
use jack_tokenizer::{Keyword, Token};
use std::io::Write;

const EXPRESSION_OPS: &[char] = &['+', '-', '*', '/', '&', '|', '<', '>', '='];

pub struct CompilationEngine<'a, W: Write> {
    tokens: &'a [Token],
    pos: usize,
    output: W,
    indent: usize,
}

impl<'a, W: Write> CompilationEngine<'a, W> {
    #[must_use]
    pub fn new(tokens: &'a [Token], output: W) -> Self {
        Self {
            tokens,
            pos: 0,
            output,
            indent: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.output
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn write_indent(&mut self) -> Result<()> {
        for _ in 0..self.indent {
            write!(self.output, "  ")?;
        }
        Ok(())
    }

    fn open_tag(&mut self, tag: &str) -> Result<()> {
        self.write_indent()?;
        writeln!(self.output, "<{tag}>")?;
        self.indent += 1;
        Ok(())
    }

    fn close_tag(&mut self, tag: &str) -> Result<()> {
        self.indent -= 1;
        self.write_indent()?;
        writeln!(self.output, "</{tag}>")?;
        Ok(())
    }

    /// Writes the current token as a leaf tag and advances past it.
    fn write_terminal(&mut self) -> Result<()> {
        let token = self
            .peek()
            .ok_or_else(|| JackError::UnexpectedEof {
                expected: "a token".to_string(),
            })?
            .clone();
        self.write_indent()?;
        write_leaf_tag(&token, &mut self.output)?;
        self.pos += 1;
        Ok(())
    }

    fn current_is_symbol(&self, sym: char) -> bool {
        matches!(self.peek(), Some(Token::Symbol(s)) if *s == sym)
    }

    fn current_is_keyword(&self, kw: Keyword) -> bool {
        matches!(self.peek(), Some(Token::Keyword(k)) if *k == kw)
    }

    fn describe_current(&self) -> String {
        self.peek()
            .map_or_else(|| "end of input".to_string(), |t| t.to_string())
    }

    fn eat_symbol(&mut self, sym: char) -> Result<()> {
        if !self.current_is_symbol(sym) {
            return Err(JackError::UnexpectedToken {
                expected: format!("symbol `{sym}`"),
                found: self.describe_current(),
            });
        }
        self.write_terminal()
    }

    fn eat_keyword(&mut self, kw: Keyword) -> Result<()> {
        if !self.current_is_keyword(kw) {
            return Err(JackError::UnexpectedToken {
                expected: format!("keyword `{kw}`"),
                found: self.describe_current(),
            });
        }
        self.write_terminal()
    }

    /// `class` className `{` classVarDec* subroutineDec* `}`
    pub fn compile_class(&mut self) -> Result<()> {
        self.open_tag("class")?;
        self.eat_keyword(Keyword::Class)?;
        self.write_terminal()?; // className
        self.eat_symbol('{')?;

        while self.current_is_keyword(Keyword::Static) || self.current_is_keyword(Keyword::Field) {
            self.compile_class_var_dec()?;
        }

        while self.current_is_keyword(Keyword::Constructor)
            || self.current_is_keyword(Keyword::Function)
            || self.current_is_keyword(Keyword::Method)
        {
            self.compile_subroutine()?;
        }

        self.eat_symbol('}')?;
        self.close_tag("class")
    }

    fn compile_class_var_dec(&mut self) -> Result<()> {
        self.open_tag("classVarDec")?;
        self.write_terminal()?; // static | field
        self.write_terminal()?; // type
        self.write_terminal()?; // varName

        while self.current_is_symbol(',') {
            self.eat_symbol(',')?;
            self.write_terminal()?; // varName
        }

        self.eat_symbol(';')?;
        self.close_tag("classVarDec")
    }

    fn compile_subroutine(&mut self) -> Result<()> {
        self.open_tag("subroutineDec")?;
        self.write_terminal()?; // constructor | function | method
        self.write_terminal()?; // void | type
        self.write_terminal()?; // subroutineName
        self.eat_symbol('(')?;
        self.compile_parameter_list()?;
        self.eat_symbol(')')?;

        self.open_tag("subroutineBody")?;
        self.eat_symbol('{')?;

        while self.current_is_keyword(Keyword::Var) {
            self.compile_var_dec()?;
        }

        self.compile_statements()?;

        self.eat_symbol('}')?;
        self.close_tag("subroutineBody")?;
        self.close_tag("subroutineDec")
    }

    fn compile_parameter_list(&mut self) -> Result<()> {
        self.open_tag("parameterList")?;

        if !self.current_is_symbol(')') {
            self.write_terminal()?; // type
            self.write_terminal()?; // varName

            while self.current_is_symbol(',') {
                self.eat_symbol(',')?;
                self.write_terminal()?; // type
                self.write_terminal()?; // varName
            }
        }

        self.close_tag("parameterList")
    }

    fn compile_var_dec(&mut self) -> Result<()> {
        self.open_tag("varDec")?;
        self.eat_keyword(Keyword::Var)?;
        self.write_terminal()?; // type
        self.write_terminal()?; // varName

        while self.current_is_symbol(',') {
            self.eat_symbol(',')?;
            self.write_terminal()?; // varName
        }

        self.eat_symbol(';')?;
        self.close_tag("varDec")
    }

    fn compile_statements(&mut self) -> Result<()> {
        self.open_tag("statements")?;

        loop {
            if self.current_is_keyword(Keyword::Let) {
                self.compile_let()?;
            } else if self.current_is_keyword(Keyword::If) {
                self.compile_if()?;
            } else if self.current_is_keyword(Keyword::While) {
                self.compile_while()?;
            } else if self.current_is_keyword(Keyword::Do) {
                self.compile_do()?;
            } else if self.current_is_keyword(Keyword::Return) {
                self.compile_return()?;
            } else {
                break;
            }
        }

        self.close_tag("statements")
    }

    fn compile_do(&mut self) -> Result<()> {
        self.open_tag("doStatement")?;
        self.eat_keyword(Keyword::Do)?;
        self.write_terminal()?; // subroutineName | className | varName

        if self.current_is_symbol('.') {
            self.eat_symbol('.')?;
            self.write_terminal()?; // subroutineName
        }

        self.eat_symbol('(')?;
        self.compile_expression_list()?;
        self.eat_symbol(')')?;
        self.eat_symbol(';')?;
        self.close_tag("doStatement")
    }

    fn compile_let(&mut self) -> Result<()> {
        self.open_tag("letStatement")?;
        self.eat_keyword(Keyword::Let)?;
        self.write_terminal()?; // varName

        if self.current_is_symbol('[') {
            self.eat_symbol('[')?;
            self.compile_expression()?;
            self.eat_symbol(']')?;
        }

        self.eat_symbol('=')?;
        self.compile_expression()?;
        self.eat_symbol(';')?;
        self.close_tag("letStatement")
    }

    fn compile_while(&mut self) -> Result<()> {
        self.open_tag("whileStatement")?;
        self.eat_keyword(Keyword::While)?;
        self.eat_symbol('(')?;
        self.compile_expression()?;
        self.eat_symbol(')')?;
        self.eat_symbol('{')?;
        self.compile_statements()?;
        self.eat_symbol('}')?;
        self.close_tag("whileStatement")
    }

    fn compile_return(&mut self) -> Result<()> {
        self.open_tag("returnStatement")?;
        self.eat_keyword(Keyword::Return)?;

        if !self.current_is_symbol(';') {
            self.compile_expression()?;
        }

        self.eat_symbol(';')?;
        self.close_tag("returnStatement")
    }

    fn compile_if(&mut self) -> Result<()> {
        self.open_tag("ifStatement")?;
        self.eat_keyword(Keyword::If)?;
        self.eat_symbol('(')?;
        self.compile_expression()?;
        self.eat_symbol(')')?;
        self.eat_symbol('{')?;
        self.compile_statements()?;
        self.eat_symbol('}')?;

        if self.current_is_keyword(Keyword::Else) {
            self.eat_keyword(Keyword::Else)?;
            self.eat_symbol('{')?;
            self.compile_statements()?;
            self.eat_symbol('}')?;
        }

        self.close_tag("ifStatement")
    }

    fn compile_expression(&mut self) -> Result<()> {
        self.open_tag("expression")?;
        self.compile_term()?;

        while let Some(Token::Symbol(c)) = self.peek() {
            if !EXPRESSION_OPS.contains(c) {
                break;
            }
            self.write_terminal()?;
            self.compile_term()?;
        }

        self.close_tag("expression")
    }

    fn compile_term(&mut self) -> Result<()> {
        self.open_tag("term")?;

        match self.peek() {
            Some(Token::IntConst(_) | Token::StringConst(_) | Token::Keyword(_)) => {
                self.write_terminal()?;
            }
            Some(Token::Symbol('(')) => {
                self.eat_symbol('(')?;
                self.compile_expression()?;
                self.eat_symbol(')')?;
            }
            Some(Token::Symbol('-' | '~')) => {
                self.write_terminal()?; // unary op
                self.compile_term()?;
            }
            Some(Token::Identifier(_)) => {
                self.write_terminal()?; // varName | className

                if self.current_is_symbol('[') {
                    self.eat_symbol('[')?;
                    self.compile_expression()?;
                    self.eat_symbol(']')?;
                } else if self.current_is_symbol('(') {
                    self.eat_symbol('(')?;
                    self.compile_expression_list()?;
                    self.eat_symbol(')')?;
                } else if self.current_is_symbol('.') {
                    self.eat_symbol('.')?;
                    self.write_terminal()?; // subroutineName
                    self.eat_symbol('(')?;
                    self.compile_expression_list()?;
                    self.eat_symbol(')')?;
                }
            }
            _ => {
                return Err(JackError::UnexpectedToken {
                    expected: "a term".to_string(),
                    found: self.describe_current(),
                });
            }
        }

        self.close_tag("term")
    }

    fn compile_expression_list(&mut self) -> Result<()> {
        self.open_tag("expressionList")?;

        if !self.current_is_symbol(')') {
            self.compile_expression()?;

            while self.current_is_symbol(',') {
                self.eat_symbol(',')?;
                self.compile_expression()?;
            }
        }

        self.close_tag("expressionList")
    }
}

/// Writes a single token as its leaf tag (no surrounding indentation),
/// shared by the parse-tree engine and the standalone token-stream writer.
pub fn write_leaf_tag<W: Write>(token: &Token, out: &mut W) -> Result<()> {
    match token {
        Token::Keyword(k) => writeln!(out, "<keyword> {k} </keyword>")?,
        Token::Symbol(c) => writeln!(out, "<symbol> {} </symbol>", escape_xml(*c))?,
        Token::Identifier(s) => writeln!(out, "<identifier> {} </identifier>", escape_xml_str(s))?,
        Token::IntConst(n) => writeln!(out, "<integerConstant> {n} </integerConstant>")?,
        Token::StringConst(s) => writeln!(
            out,
            "<stringConstant> {} </stringConstant>",
            escape_xml_str(s)
        )?,
    }
    Ok(())
}

fn escape_xml(c: char) -> String {
    escape_xml_str(&c.to_string())
}

fn escape_xml_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use jack_tokenizer::tokenize_all;

    fn render_class(source: &str) -> String {
        let tokens = tokenize_all(source).unwrap();
        let mut engine = CompilationEngine::new(&tokens, Vec::new());
        engine.compile_class().unwrap();
        String::from_utf8(engine.into_inner()).unwrap()
    }

    #[test]
    fn empty_class_brackets_open_and_close_tags() {
        let xml = render_class("class Main { }");
        assert!(xml.starts_with("<class>\n"));
        assert!(xml.trim_end().ends_with("</class>"));
        assert!(xml.contains("<keyword> class </keyword>"));
        assert!(xml.contains("<identifier> Main </identifier>"));
    }

    #[test]
    fn symbol_less_than_is_escaped() {
        let xml = render_class("class Main { function void f() { do g(1 < 2); return; } }");
        assert!(xml.contains("&lt;"));
        assert!(!xml.contains("<symbol> < </symbol>"));
    }

    #[test]
    fn string_constant_escapes_angle_brackets_and_ampersand() {
        let source = "class Main { function void f() { do g(\"<a & b>\"); return; } }";
        let xml = render_class(source);
        assert!(xml.contains("&lt;a &amp; b&gt;"));
    }

    #[test]
    fn unary_minus_term_nests_one_more_term() {
        let source = "class Main { function void f() { let x = -1; return; } }";
        let xml = render_class(source);
        assert!(xml.contains("<symbol> - </symbol>"));
    }

    #[test]
    fn mismatched_symbol_is_a_parse_error() {
        let tokens = tokenize_all("class Main ( }").unwrap();
        let mut engine = CompilationEngine::new(&tokens, Vec::new());
        assert!(engine.compile_class().is_err());
    }
}
