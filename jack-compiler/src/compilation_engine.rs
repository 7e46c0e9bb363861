//! Single-pass recursive-descent Jack-to-VM code generator.
//!
//! Parser and code generator are interleaved so emission order matches
//! source order. Shares its grammar skeleton (one routine per nonterminal)
//! with the parse-tree variant but carries a symbol table and a VM writer
//! instead of an XML tree.

use crate::error::{JackError, Result};
use crate::symbol_table::{SegmentKind, SymbolTable};
use crate::vm_writer::{Command, Segment, VmWriter};
use jack_tokenizer::{Keyword, Token};
use std::io::Write;

const EXPRESSION_OPS: &[char] = &['+', '-', '*', '/', '&', '|', '<', '>', '='];

pub struct CompilationEngine<'a, W: Write> {
    tokens: &'a [Token],
    pos: usize,
    writer: VmWriter<W>,
    symbols: SymbolTable,
    class_name: String,
    label_counter: usize,
}

impl<'a, W: Write> CompilationEngine<'a, W> {
    #[must_use]
    pub fn new(tokens: &'a [Token], output: W) -> Self {
        Self {
            tokens,
            pos: 0,
            writer: VmWriter::new(output),
            symbols: SymbolTable::new(),
            class_name: String::new(),
            label_counter: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn describe_current(&self) -> String {
        self.peek()
            .map_or_else(|| "end of input".to_string(), ToString::to_string)
    }

    fn advance(&mut self) -> Result<Token> {
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| JackError::UnexpectedEof {
                expected: "a token".to_string(),
            })?;
        self.pos += 1;
        Ok(token)
    }

    fn identifier(&mut self) -> Result<String> {
        match self.advance()? {
            Token::Identifier(name) => Ok(name),
            other => Err(JackError::UnexpectedToken {
                expected: "an identifier".to_string(),
                found: other.to_string(),
            }),
        }
    }

    /// A type or return-type token: either a keyword (`int`, `void`, ...)
    /// or a class-name identifier. Consumed and discarded — the XML writer
    /// would render it, but VM emission never needs it except as text
    /// recorded in the symbol table (handled by the caller).
    fn type_token(&mut self) -> Result<String> {
        match self.advance()? {
            Token::Keyword(k) => Ok(k.to_string()),
            Token::Identifier(name) => Ok(name),
            other => Err(JackError::UnexpectedToken {
                expected: "a type".to_string(),
                found: other.to_string(),
            }),
        }
    }

    fn current_is_symbol(&self, sym: char) -> bool {
        matches!(self.peek(), Some(Token::Symbol(s)) if *s == sym)
    }

    fn current_is_keyword(&self, kw: Keyword) -> bool {
        matches!(self.peek(), Some(Token::Keyword(k)) if *k == kw)
    }

    fn eat_symbol(&mut self, sym: char) -> Result<()> {
        if !self.current_is_symbol(sym) {
            return Err(JackError::UnexpectedToken {
                expected: format!("symbol `{sym}`"),
                found: self.describe_current(),
            });
        }
        self.pos += 1;
        Ok(())
    }

    fn eat_keyword(&mut self, kw: Keyword) -> Result<()> {
        if !self.current_is_keyword(kw) {
            return Err(JackError::UnexpectedToken {
                expected: format!("keyword `{kw}`"),
                found: self.describe_current(),
            });
        }
        self.pos += 1;
        Ok(())
    }

    fn kind_to_segment(kind: SegmentKind) -> Segment {
        match kind {
            SegmentKind::Static => Segment::Static,
            SegmentKind::Field => Segment::This,
            SegmentKind::Arg => Segment::Arg,
            SegmentKind::Var => Segment::Local,
        }
    }

    fn segment_of(&self, name: &str) -> Result<(Segment, u16)> {
        let kind = self
            .symbols
            .kind_of(name)
            .ok_or_else(|| JackError::UndeclaredIdentifier(name.to_string()))?;
        let index = self.symbols.index_of(name).expect("kind_of succeeded");
        Ok((Self::kind_to_segment(kind), index))
    }

    fn fresh_label_index(&mut self) -> usize {
        let i = self.label_counter;
        self.label_counter += 1;
        i
    }

    /// `class` className `{` classVarDec* subroutineDec* `}`
    pub fn compile_class(&mut self) -> Result<()> {
        self.eat_keyword(Keyword::Class)?;
        self.class_name = self.identifier()?;
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

        self.eat_symbol('}')
    }

    fn compile_class_var_dec(&mut self) -> Result<()> {
        let kind = if self.current_is_keyword(Keyword::Static) {
            self.pos += 1;
            SegmentKind::Static
        } else {
            self.eat_keyword(Keyword::Field)?;
            SegmentKind::Field
        };

        let ty = self.type_token()?;
        let name = self.identifier()?;
        self.symbols.define(&name, &ty, kind);

        while self.current_is_symbol(',') {
            self.eat_symbol(',')?;
            let name = self.identifier()?;
            self.symbols.define(&name, &ty, kind);
        }

        self.eat_symbol(';')
    }

    fn compile_subroutine(&mut self) -> Result<()> {
        self.symbols.start_subroutine();

        let is_method = self.current_is_keyword(Keyword::Method);
        let is_constructor = self.current_is_keyword(Keyword::Constructor);
        self.pos += 1; // constructor | function | method

        self.type_token()?; // void | return type
        let subroutine_name = self.identifier()?;
        let qualified = format!("{}.{subroutine_name}", self.class_name);

        if is_method {
            let class_name = self.class_name.clone();
            self.symbols.define("this", &class_name, SegmentKind::Arg);
        }

        self.eat_symbol('(')?;
        self.compile_parameter_list()?;
        self.eat_symbol(')')?;

        self.eat_symbol('{')?;
        while self.current_is_keyword(Keyword::Var) {
            self.compile_var_dec()?;
        }

        let n_locals = self.symbols.var_count(SegmentKind::Var);
        self.writer.write_function(&qualified, n_locals)?;

        if is_constructor {
            let n_fields = self.symbols.var_count(SegmentKind::Field);
            self.writer.write_push(Segment::Const, n_fields)?;
            self.writer.write_call("Memory.alloc", 1)?;
            self.writer.write_pop(Segment::Pointer, 0)?;
        } else if is_method {
            self.writer.write_push(Segment::Arg, 0)?;
            self.writer.write_pop(Segment::Pointer, 0)?;
        }

        self.compile_statements()?;
        self.eat_symbol('}')
    }

    fn compile_parameter_list(&mut self) -> Result<()> {
        if !self.current_is_symbol(')') {
            let ty = self.type_token()?;
            let name = self.identifier()?;
            self.symbols.define(&name, &ty, SegmentKind::Arg);

            while self.current_is_symbol(',') {
                self.eat_symbol(',')?;
                let ty = self.type_token()?;
                let name = self.identifier()?;
                self.symbols.define(&name, &ty, SegmentKind::Arg);
            }
        }
        Ok(())
    }

    fn compile_var_dec(&mut self) -> Result<()> {
        self.eat_keyword(Keyword::Var)?;
        let ty = self.type_token()?;
        let name = self.identifier()?;
        self.symbols.define(&name, &ty, SegmentKind::Var);

        while self.current_is_symbol(',') {
            self.eat_symbol(',')?;
            let name = self.identifier()?;
            self.symbols.define(&name, &ty, SegmentKind::Var);
        }

        self.eat_symbol(';')
    }

    fn compile_statements(&mut self) -> Result<()> {
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
        Ok(())
    }

    /// Compiles a call's receiver + argument list and returns the fully
    /// qualified callee name and total argument count (implicit receiver
    /// included). `name` is the identifier already consumed before the `.`
    /// or `(` lookahead.
    fn compile_call(&mut self, name: &str) -> Result<(String, u16)> {
        let mut n_args = 0u16;
        let callee;

        if self.current_is_symbol('.') {
            self.eat_symbol('.')?;
            let subroutine_name = self.identifier()?;

            if self.symbols.exists(name) {
                let ty = self.symbols.type_of(name).expect("exists").to_string();
                callee = format!("{ty}.{subroutine_name}");
                let (segment, index) = self.segment_of(name)?;
                self.writer.write_push(segment, index)?;
                n_args = 1;
            } else {
                callee = format!("{name}.{subroutine_name}");
            }
        } else {
            callee = format!("{}.{name}", self.class_name);
            self.writer.write_push(Segment::Pointer, 0)?;
            n_args = 1;
        }

        self.eat_symbol('(')?;
        n_args += self.compile_expression_list()?;
        self.eat_symbol(')')?;

        Ok((callee, n_args))
    }

    fn compile_do(&mut self) -> Result<()> {
        self.eat_keyword(Keyword::Do)?;
        let name = self.identifier()?;
        let (callee, n_args) = self.compile_call(&name)?;
        self.writer.write_call(&callee, n_args)?;
        self.writer.write_pop(Segment::Temp, 0)?;
        self.eat_symbol(';')
    }

    fn compile_let(&mut self) -> Result<()> {
        self.eat_keyword(Keyword::Let)?;
        let var_name = self.identifier()?;

        let is_array = self.current_is_symbol('[');
        if is_array {
            let (segment, index) = self.segment_of(&var_name)?;
            self.writer.write_push(segment, index)?;

            self.eat_symbol('[')?;
            self.compile_expression()?;
            self.eat_symbol(']')?;

            self.writer.write_arithmetic(Command::Add)?;
        }

        self.eat_symbol('=')?;
        self.compile_expression()?;

        if is_array {
            self.writer.write_pop(Segment::Temp, 0)?;
            self.writer.write_pop(Segment::Pointer, 1)?;
            self.writer.write_push(Segment::Temp, 0)?;
            self.writer.write_pop(Segment::That, 0)?;
        } else {
            let (segment, index) = self.segment_of(&var_name)?;
            self.writer.write_pop(segment, index)?;
        }

        self.eat_symbol(';')
    }

    fn compile_while(&mut self) -> Result<()> {
        let i = self.fresh_label_index();
        let label_exp = format!("WHILE_EXP_{i}");
        let label_end = format!("WHILE_END_{i}");

        self.writer.write_label(&label_exp)?;
        self.eat_keyword(Keyword::While)?;
        self.eat_symbol('(')?;
        self.compile_expression()?;
        self.eat_symbol(')')?;

        self.writer.write_arithmetic(Command::Not)?;
        self.writer.write_if(&label_end)?;

        self.eat_symbol('{')?;
        self.compile_statements()?;
        self.eat_symbol('}')?;

        self.writer.write_goto(&label_exp)?;
        self.writer.write_label(&label_end)
    }

    fn compile_return(&mut self) -> Result<()> {
        self.eat_keyword(Keyword::Return)?;

        if self.current_is_symbol(';') {
            self.writer.write_push(Segment::Const, 0)?;
        } else {
            self.compile_expression()?;
        }

        self.writer.write_return()?;
        self.eat_symbol(';')
    }

    fn compile_if(&mut self) -> Result<()> {
        let i = self.fresh_label_index();
        let label_true = format!("IF_TRUE_{i}");
        let label_false = format!("IF_FALSE_{i}");
        let label_end = format!("IF_END_{i}");

        self.eat_keyword(Keyword::If)?;
        self.eat_symbol('(')?;
        self.compile_expression()?;
        self.eat_symbol(')')?;

        self.writer.write_if(&label_true)?;
        self.writer.write_goto(&label_false)?;

        self.writer.write_label(&label_true)?;
        self.eat_symbol('{')?;
        self.compile_statements()?;
        self.eat_symbol('}')?;

        if self.current_is_keyword(Keyword::Else) {
            self.writer.write_goto(&label_end)?;
            self.writer.write_label(&label_false)?;
            self.eat_keyword(Keyword::Else)?;
            self.eat_symbol('{')?;
            self.compile_statements()?;
            self.eat_symbol('}')?;
            self.writer.write_label(&label_end)?;
        } else {
            self.writer.write_label(&label_false)?;
        }

        Ok(())
    }

    fn compile_expression(&mut self) -> Result<()> {
        self.compile_term()?;

        while let Some(Token::Symbol(op)) = self.peek() {
            let op = *op;
            if !EXPRESSION_OPS.contains(&op) {
                break;
            }
            self.pos += 1;
            self.compile_term()?;

            match op {
                '+' => self.writer.write_arithmetic(Command::Add)?,
                '-' => self.writer.write_arithmetic(Command::Sub)?,
                '*' => self.writer.write_call("Math.multiply", 2)?,
                '/' => self.writer.write_call("Math.divide", 2)?,
                '&' => self.writer.write_arithmetic(Command::And)?,
                '|' => self.writer.write_arithmetic(Command::Or)?,
                '<' => self.writer.write_arithmetic(Command::Lt)?,
                '>' => self.writer.write_arithmetic(Command::Gt)?,
                '=' => self.writer.write_arithmetic(Command::Eq)?,
                _ => unreachable!("filtered by EXPRESSION_OPS"),
            }
        }

        Ok(())
    }

    fn compile_term(&mut self) -> Result<()> {
        match self.peek().cloned() {
            Some(Token::IntConst(value)) => {
                self.pos += 1;
                self.writer.write_push(Segment::Const, value as u16)?;
            }
            Some(Token::StringConst(s)) => {
                self.pos += 1;
                self.writer.write_push(Segment::Const, s.len() as u16)?;
                self.writer.write_call("String.new", 1)?;
                for c in s.chars() {
                    self.writer.write_push(Segment::Const, c as u16)?;
                    self.writer.write_call("String.appendChar", 2)?;
                }
            }
            Some(Token::Keyword(kw)) => {
                self.pos += 1;
                match kw {
                    Keyword::True => {
                        self.writer.write_push(Segment::Const, 0)?;
                        self.writer.write_arithmetic(Command::Not)?;
                    }
                    Keyword::False | Keyword::Null => {
                        self.writer.write_push(Segment::Const, 0)?;
                    }
                    Keyword::This => {
                        self.writer.write_push(Segment::Pointer, 0)?;
                    }
                    other => {
                        return Err(JackError::UnexpectedToken {
                            expected: "a keyword constant".to_string(),
                            found: other.to_string(),
                        })
                    }
                }
            }
            Some(Token::Symbol('(')) => {
                self.eat_symbol('(')?;
                self.compile_expression()?;
                self.eat_symbol(')')?;
            }
            Some(Token::Symbol(op @ ('-' | '~'))) => {
                self.pos += 1;
                self.compile_term()?;
                self.writer.write_arithmetic(if op == '-' {
                    Command::Neg
                } else {
                    Command::Not
                })?;
            }
            Some(Token::Identifier(name)) => {
                self.pos += 1;

                if self.current_is_symbol('[') {
                    let (segment, index) = self.segment_of(&name)?;
                    self.writer.write_push(segment, index)?;

                    self.eat_symbol('[')?;
                    self.compile_expression()?;
                    self.eat_symbol(']')?;

                    self.writer.write_arithmetic(Command::Add)?;
                    self.writer.write_pop(Segment::Pointer, 1)?;
                    self.writer.write_push(Segment::That, 0)?;
                } else if self.current_is_symbol('(') || self.current_is_symbol('.') {
                    let (callee, n_args) = self.compile_call(&name)?;
                    self.writer.write_call(&callee, n_args)?;
                } else {
                    let (segment, index) = self.segment_of(&name)?;
                    self.writer.write_push(segment, index)?;
                }
            }
            other => {
                return Err(JackError::UnexpectedToken {
                    expected: "a term".to_string(),
                    found: other.map_or_else(|| "end of input".to_string(), |t| t.to_string()),
                })
            }
        }

        Ok(())
    }

    fn compile_expression_list(&mut self) -> Result<u16> {
        let mut n_args = 0u16;

        if !self.current_is_symbol(')') {
            self.compile_expression()?;
            n_args += 1;

            while self.current_is_symbol(',') {
                self.eat_symbol(',')?;
                self.compile_expression()?;
                n_args += 1;
            }
        }

        Ok(n_args)
    }
}
