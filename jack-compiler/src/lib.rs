pub mod compilation_engine;
pub mod error;
pub mod symbol_table;
pub mod vm_writer;

pub use compilation_engine::CompilationEngine;
pub use error::{JackError, Result};
pub use symbol_table::{SegmentKind, SymbolTable};
pub use vm_writer::{Command, Segment, VmWriter};

use jack_tokenizer::tokenize_all;

/// Tokenizes and compiles one Jack source unit, returning the generated VM
/// text.
pub fn compile_source(source: &str) -> Result<String> {
    let tokens = tokenize_all(source)?;
    let mut engine = CompilationEngine::new(&tokens, Vec::new());
    engine.compile_class()?;
    Ok(String::from_utf8_lossy(&engine.into_inner()).into_owned())
}
