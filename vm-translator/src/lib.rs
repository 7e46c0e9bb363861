//! VM-to-Hack-assembly translator for the `Nand2Tetris` Project 7/8 bytecode.
//!
//! # Architecture
//! - [`parser`]: pre-loads and classifies each VM command
//! - [`code_writer`]: lowers commands to assembly, including the full
//!   calling convention and the bootstrap sequence
//! - [`error`]: the shared [`VmError`] taxonomy
//!
//! # Example
//!
//! ```rust
//! use vm_translator::{translate_unit, TranslationUnit};
//!
//! let units = vec![TranslationUnit {
//!     file_stem: "Add".to_string(),
//!     source: "push constant 7\npush constant 8\nadd\n".to_string(),
//! }];
//! let asm = translate_unit(&units, false).unwrap();
//! assert!(asm.contains("@R14"));
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

pub mod code_writer;
pub mod error;
pub mod parser;

pub use code_writer::CodeWriter;
pub use error::{Result, VmError};
pub use parser::{CommandType, Parser};

/// One `.vm` input, already associated with the file stem used for its
/// static-segment mangling.
pub struct TranslationUnit {
    pub file_stem: String,
    pub source: String,
}

fn translate_one<W: std::io::Write>(
    unit: &TranslationUnit,
    writer: &mut CodeWriter<W>,
) -> Result<usize> {
    writer.set_filename(&unit.file_stem);
    let mut parser = Parser::from_source(&unit.source);
    let mut emitted = 0usize;

    while parser.has_more_commands() {
        parser.advance();
        match parser.command_type()? {
            CommandType::Arithmetic => {
                writer.write_arithmetic(parser.arg1()?)?;
            }
            CommandType::Push => {
                writer.write_push_pop("push", parser.arg1()?, parser.arg2()?)?;
            }
            CommandType::Pop => {
                writer.write_push_pop("pop", parser.arg1()?, parser.arg2()?)?;
            }
            CommandType::Label => {
                writer.write_label(parser.arg1()?)?;
            }
            CommandType::Goto => {
                writer.write_goto(parser.arg1()?)?;
            }
            CommandType::If => {
                writer.write_if(parser.arg1()?)?;
            }
            CommandType::Function => {
                writer.write_function(parser.arg1()?, parser.arg2()?)?;
            }
            CommandType::Call => {
                writer.write_call(parser.arg1()?, parser.arg2()?)?;
            }
            CommandType::Return => {
                writer.write_return()?;
            }
        }
        emitted += 1;
    }

    Ok(emitted)
}

/// Whether a set of translation units needs the bootstrap prelude: either
/// there is more than one unit, or the single unit is literally `Sys.vm`.
#[must_use]
pub fn needs_bootstrap(units: &[TranslationUnit]) -> bool {
    units.len() > 1 || units.first().is_some_and(|u| u.file_stem == "Sys")
}

/// Translates a batch of `.vm` units into one assembly program, emitting
/// exactly one bootstrap prelude when [`needs_bootstrap`] says one is due.
/// Used both for single-file mode (a batch of one) and directory mode
/// (a batch of every `.vm` file found, bootstrap first).
pub fn translate_unit(units: &[TranslationUnit], verbose: bool) -> Result<String> {
    let mut writer = CodeWriter::from_writer(Vec::new());

    if needs_bootstrap(units) {
        writer.write_init()?;
        if verbose {
            eprintln!("vm: emitted bootstrap (SP=256; call Sys.init 0)");
        }
    }

    for unit in units {
        let emitted = translate_one(unit, &mut writer)?;
        if verbose {
            eprintln!("vm: {} -> {emitted} command(s) translated", unit.file_stem);
        }
    }

    writer.close()?;
    Ok(String::from_utf8(writer.into_inner()).expect("assembly output is always ASCII"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_file_not_named_sys_has_no_bootstrap() {
        let units = vec![TranslationUnit {
            file_stem: "Add".to_string(),
            source: "push constant 2\n".to_string(),
        }];
        let asm = translate_unit(&units, false).unwrap();
        assert!(!asm.contains("Sys.init"));
    }

    #[test]
    fn single_sys_file_gets_exactly_one_bootstrap() {
        let units = vec![TranslationUnit {
            file_stem: "Sys".to_string(),
            source: "function Sys.init 0\npush constant 0\nreturn\n".to_string(),
        }];
        let asm = translate_unit(&units, false).unwrap();
        assert_eq!(asm.matches("Sys.init").count(), 2); // bootstrap call + function label
    }

    #[test]
    fn multi_file_program_gets_exactly_one_bootstrap() {
        let units = vec![
            TranslationUnit {
                file_stem: "Main".to_string(),
                source: "call Sys.init 0\n".to_string(),
            },
            TranslationUnit {
                file_stem: "Sys".to_string(),
                source: "function Sys.init 0\npush constant 0\nreturn\n".to_string(),
            },
        ];
        let asm = translate_unit(&units, false).unwrap();
        assert_eq!(asm.matches("@256").count(), 1);
    }

    #[test]
    fn push_push_add_round_trips_through_the_same_shape_twice() {
        let units = vec![TranslationUnit {
            file_stem: "Foo".to_string(),
            source: "push constant 7\npush constant 8\nadd\n".to_string(),
        }];
        let first = translate_unit(&units, false).unwrap();
        let second = translate_unit(&units, false).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_command_propagates_as_an_error() {
        let units = vec![TranslationUnit {
            file_stem: "Bad".to_string(),
            source: "push bogus 0\n".to_string(),
        }];
        assert!(translate_unit(&units, false).is_err());
    }
}
