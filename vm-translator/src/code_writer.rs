//! Lowers VM stack-machine commands to Hack assembly.
//!
//! Generalizes the original push/pop + arithmetic-only writer to the full
//! calling convention: `label`/`goto`/`if-goto`, `function`/`call`/`return`,
//! and the bootstrap sequence. Monotonic label counters live on the writer
//! itself (never as process globals) and are reset only by constructing a
//! fresh `CodeWriter`.

use crate::error::{Result, VmError};
use phf::phf_map;
use std::fs::File;
use std::io::{BufWriter, Write};

macro_rules! write_asm {
    ($writer:expr, $($line:literal)*) => {
        $writer.write_all(concat!($($line, "\n"),*).as_bytes())
    };
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Segment {
    Local,
    Argument,
    This,
    That,
    Temp,
    Pointer,
    Static,
    Constant,
}

static SEGMENTS: phf::Map<&'static str, Segment> = phf_map! {
    "local" => Segment::Local,
    "argument" => Segment::Argument,
    "this" => Segment::This,
    "that" => Segment::That,
    "temp" => Segment::Temp,
    "pointer" => Segment::Pointer,
    "static" => Segment::Static,
    "constant" => Segment::Constant,
};

impl Segment {
    /// The base-register symbol for the four pointer-relative segments.
    fn base_symbol(self) -> &'static str {
        match self {
            Self::Local => "LCL",
            Self::Argument => "ARG",
            Self::This => "THIS",
            Self::That => "THAT",
            _ => unreachable!("base_symbol only called for pointer-relative segments"),
        }
    }
}

pub struct CodeWriter<W: Write> {
    output: W,
    label_counter: usize,
    call_counter: usize,
    current_function: String,
    filename: String,
}

impl CodeWriter<BufWriter<File>> {
    /// Creates a writer backed by a newly-created output file.
    pub fn new(output_filename: &str) -> Result<Self> {
        let file = File::create(output_filename)?;
        Ok(Self::from_writer(BufWriter::with_capacity(8192, file)))
    }
}

impl<W: Write> CodeWriter<W> {
    /// Creates a writer over any `Write` sink — used directly by tests that
    /// want generated assembly in memory rather than on disk.
    pub fn from_writer(output: W) -> Self {
        Self {
            output,
            label_counter: 0,
            call_counter: 0,
            current_function: String::new(),
            filename: String::new(),
        }
    }

    /// Sets the file-stem used for static-segment name mangling.
    ///
    /// Two different `.vm` files in the same output never collide because
    /// their stems differ; this is the whole "linking" story.
    pub fn set_filename(&mut self, filename: &str) {
        let name = std::path::Path::new(filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Unknown");
        self.filename.clear();
        self.filename.push_str(name);
    }

    fn qualify(&self, label: &str) -> String {
        if self.current_function.is_empty() {
            label.to_string()
        } else {
            format!("{}${}", self.current_function, label)
        }
    }

    pub fn write_arithmetic(&mut self, command: &str) -> Result<()> {
        writeln!(self.output, "// {command}")?;
        match command {
            "add" => self.write_binary_op("D+M"),
            "sub" => self.write_binary_op("D-M"),
            "and" => self.write_binary_op("D&M"),
            "or" => self.write_binary_op("D|M"),
            "neg" => self.write_unary_op(true),
            "not" => self.write_unary_op(false),
            "eq" => self.write_comparison("JEQ"),
            "gt" => self.write_comparison("JGT"),
            "lt" => self.write_comparison("JLT"),
            other => Err(VmError::UnknownArithmetic(other.to_string())),
        }
    }

    fn write_binary_op(&mut self, operation: &str) -> Result<()> {
        self.write_pop_to_d()?;
        write_asm!(self.output, "@R14" "M=D")?;
        self.write_pop_to_d()?;
        write!(self.output, "@R13\nM=D\n@R13\nD=M\n@R14\nD={operation}\n")?;
        self.write_push_d()?;
        Ok(())
    }

    fn write_unary_op(&mut self, is_neg: bool) -> Result<()> {
        self.write_pop_to_d()?;
        if is_neg {
            write_asm!(self.output, "@0" "D=A-D")?;
        } else {
            write_asm!(self.output, "D=!D")?;
        }
        self.write_push_d()
    }

    fn write_comparison(&mut self, jump: &str) -> Result<()> {
        let n = self.label_counter;
        self.label_counter += 1;

        self.write_pop_to_d()?;
        write_asm!(self.output, "@R14" "M=D")?;
        self.write_pop_to_d()?;
        write!(
            self.output,
            "@R13\nM=D\n@R13\nD=M\n@R14\nD=D-M\n@TRUE_{n}\nD;{jump}\n\
             @SP\nA=M\nM=0\n@SP\nM=M+1\n@END_{n}\n0;JMP\n\
             (TRUE_{n})\n@SP\nA=M\nM=-1\n@SP\nM=M+1\n(END_{n})\n"
        )?;
        Ok(())
    }

    pub fn write_push_pop(&mut self, command: &str, segment: &str, index: i32) -> Result<()> {
        writeln!(self.output, "// {command} {segment} {index}")?;
        match command {
            "push" => self.write_push(segment, index),
            "pop" => self.write_pop(segment, index),
            _ => unreachable!("write_push_pop only called with push/pop"),
        }
    }

    fn write_push(&mut self, segment: &str, index: i32) -> Result<()> {
        let seg = SEGMENTS
            .get(segment)
            .copied()
            .ok_or_else(|| VmError::UnknownSegment(segment.to_string()))?;
        match seg {
            Segment::Constant => {
                write!(self.output, "@{index}\nD=A\n")?;
                self.write_push_d()
            }
            Segment::Local | Segment::Argument | Segment::This | Segment::That => {
                write!(
                    self.output,
                    "@{}\nD=M\n@{index}\nA=D+A\nD=M\n",
                    seg.base_symbol()
                )?;
                self.write_push_d()
            }
            Segment::Temp => {
                write!(self.output, "@R5\nD=A\n@{index}\nA=D+A\nD=M\n")?;
                self.write_push_d()
            }
            Segment::Pointer => {
                write!(self.output, "@THIS\nD=A\n@{index}\nA=D+A\nD=M\n")?;
                self.write_push_d()
            }
            Segment::Static => {
                write!(self.output, "@{}.{index}\nD=M\n", self.filename)?;
                self.write_push_d()
            }
        }
    }

    fn write_pop(&mut self, segment: &str, index: i32) -> Result<()> {
        let seg = SEGMENTS
            .get(segment)
            .copied()
            .ok_or_else(|| VmError::UnknownSegment(segment.to_string()))?;
        match seg {
            Segment::Constant => Err(VmError::PopToConstant),
            Segment::Local | Segment::Argument | Segment::This | Segment::That => {
                write!(
                    self.output,
                    "@{}\nD=M\n@{index}\nD=D+A\n@R13\nM=D\n",
                    seg.base_symbol()
                )?;
                self.write_pop_to_d()?;
                write_asm!(self.output, "@R13" "A=M" "M=D")?;
                Ok(())
            }
            Segment::Temp => {
                write!(self.output, "@R5\nD=A\n@{index}\nD=D+A\n@R13\nM=D\n")?;
                self.write_pop_to_d()?;
                write_asm!(self.output, "@R13" "A=M" "M=D")?;
                Ok(())
            }
            Segment::Pointer => {
                write!(self.output, "@THIS\nD=A\n@{index}\nD=D+A\n@R13\nM=D\n")?;
                self.write_pop_to_d()?;
                write_asm!(self.output, "@R13" "A=M" "M=D")?;
                Ok(())
            }
            Segment::Static => {
                self.write_pop_to_d()?;
                write!(self.output, "@{}.{index}\nM=D\n", self.filename)?;
                Ok(())
            }
        }
    }

    pub fn write_label(&mut self, label: &str) -> Result<()> {
        writeln!(self.output, "({})", self.qualify(label))?;
        Ok(())
    }

    pub fn write_goto(&mut self, label: &str) -> Result<()> {
        write!(self.output, "@{}\n0;JMP\n", self.qualify(label))?;
        Ok(())
    }

    pub fn write_if(&mut self, label: &str) -> Result<()> {
        self.write_pop_to_d()?;
        write!(self.output, "@{}\nD;JNE\n", self.qualify(label))?;
        Ok(())
    }

    pub fn write_function(&mut self, name: &str, n_locals: i32) -> Result<()> {
        self.current_function = name.to_string();
        writeln!(self.output, "({name})")?;
        for _ in 0..n_locals {
            self.write_push("constant", 0)?;
        }
        Ok(())
    }

    pub fn write_call(&mut self, name: &str, n_args: i32) -> Result<()> {
        let return_label = format!("RETURN_{}", self.call_counter);
        self.call_counter += 1;

        write!(self.output, "@{return_label}\nD=A\n")?;
        self.write_push_d()?;
        for saved in ["LCL", "ARG", "THIS", "THAT"] {
            write!(self.output, "@{saved}\nD=M\n")?;
            self.write_push_d()?;
        }

        write!(
            self.output,
            "@SP\nD=M\n@{}\nD=D-A\n@ARG\nM=D\n@SP\nD=M\n@LCL\nM=D\n@{name}\n0;JMP\n({return_label})\n",
            n_args + 5
        )?;
        Ok(())
    }

    pub fn write_return(&mut self) -> Result<()> {
        // FRAME = LCL, kept in R13 so it survives ARG/LCL being overwritten below.
        write_asm!(self.output, "@LCL" "D=M" "@R13" "M=D")?;
        // RET = *(FRAME - 5), captured before `*ARG = pop()` can clobber it
        // for zero-argument calls (where RET lives at ARG[0]).
        write!(self.output, "@R13\nD=M\n@5\nA=D-A\nD=M\n@R14\nM=D\n")?;

        self.write_pop_to_d()?;
        write_asm!(self.output, "@ARG" "A=M" "M=D")?;
        write_asm!(self.output, "@ARG" "D=M" "@SP" "M=D+1")?;

        for (offset, dest) in [(1, "THAT"), (2, "THIS"), (3, "ARG"), (4, "LCL")] {
            write!(
                self.output,
                "@R13\nD=M\n@{offset}\nA=D-A\nD=M\n@{dest}\nM=D\n"
            )?;
        }

        write_asm!(self.output, "@R14" "A=M" "0;JMP")?;
        Ok(())
    }

    /// Emits the bootstrap prelude: `SP = 256; call Sys.init 0`.
    pub fn write_init(&mut self) -> Result<()> {
        write_asm!(self.output, "@256" "D=A" "@SP" "M=D")?;
        self.write_call("Sys.init", 0)
    }

    fn write_push_d(&mut self) -> Result<()> {
        write_asm!(self.output, "@SP" "A=M" "M=D" "@SP" "M=M+1")?;
        Ok(())
    }

    fn write_pop_to_d(&mut self) -> Result<()> {
        write_asm!(self.output, "@SP" "M=M-1" "A=M" "D=M")?;
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        self.output.flush()?;
        Ok(())
    }

    /// Unwraps the writer, returning the underlying sink. Used by callers
    /// that translate into an in-memory buffer rather than a file.
    pub fn into_inner(self) -> W {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer() -> CodeWriter<Vec<u8>> {
        CodeWriter::from_writer(Vec::new())
    }

    fn rendered(w: CodeWriter<Vec<u8>>) -> String {
        String::from_utf8(w.into_inner()).unwrap()
    }

    #[test]
    fn unknown_arithmetic_is_an_error() {
        let mut w = writer();
        assert!(w.write_arithmetic("xor").is_err());
    }

    #[test]
    fn unknown_segment_is_an_error() {
        let mut w = writer();
        assert!(w.write_push_pop("push", "bogus", 0).is_err());
    }

    #[test]
    fn pop_constant_is_an_error() {
        let mut w = writer();
        assert!(w.write_push_pop("pop", "constant", 0).is_err());
    }

    #[test]
    fn comparisons_allocate_unique_labels() {
        let mut w = writer();
        w.write_arithmetic("eq").unwrap();
        w.write_arithmetic("gt").unwrap();
        let out = rendered(w);
        assert!(out.contains("TRUE_0"));
        assert!(out.contains("END_0"));
        assert!(out.contains("TRUE_1"));
        assert!(out.contains("END_1"));
    }

    #[test]
    fn control_flow_labels_are_scoped_to_current_function() {
        let mut w = writer();
        w.write_function("Foo.bar", 0).unwrap();
        w.write_label("LOOP").unwrap();
        w.write_goto("LOOP").unwrap();
        let out = rendered(w);
        assert!(out.contains("(Foo.bar$LOOP)"));
        assert!(out.contains("@Foo.bar$LOOP"));
    }

    #[test]
    fn static_segment_uses_file_stem_mangling() {
        let mut w = writer();
        w.set_filename("Foo.vm");
        w.write_push_pop("pop", "static", 3).unwrap();
        let out = rendered(w);
        assert!(out.contains("@Foo.3"));
    }

    #[test]
    fn pointer_zero_and_one_map_to_this_and_that() {
        let mut w = writer();
        w.write_push_pop("push", "pointer", 0).unwrap();
        w.write_push_pop("push", "pointer", 1).unwrap();
        // Both reads go through the THIS base symbol (address 3); index 1
        // lands on address 4, i.e. THAT. We only assert the instruction
        // shape here since evaluating the arithmetic requires a simulator.
        let out = rendered(w);
        assert_eq!(out.matches("@THIS\nD=A\n").count(), 2);
    }

    #[test]
    fn call_emits_a_unique_return_label_each_time() {
        let mut w = writer();
        w.write_call("Foo.bar", 2).unwrap();
        w.write_call("Foo.bar", 2).unwrap();
        let out = rendered(w);
        assert!(out.contains("(RETURN_0)"));
        assert!(out.contains("(RETURN_1)"));
    }

    #[test]
    fn function_emits_label_then_n_locals_zero_pushes() {
        let mut w = writer();
        w.write_function("Foo.bar", 2).unwrap();
        let out = rendered(w);
        assert!(out.starts_with("(Foo.bar)\n"));
        assert_eq!(out.matches("@0\nD=A\n").count(), 2);
    }
}
