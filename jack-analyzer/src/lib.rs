pub mod compilation_engine;
pub mod error;

pub use compilation_engine::CompilationEngine;
pub use error::{JackError, Result};

use compilation_engine::write_leaf_tag;
use jack_tokenizer::{tokenize_all, Token};
use std::io::Write;

/// Writes the flat `<tokens>...</tokens>` stream for one source unit, the
/// `<X>T.xml` half of the per-input output pair.
pub fn write_token_stream<W: Write>(tokens: &[Token], mut out: W) -> Result<()> {
    writeln!(out, "<tokens>")?;
    for token in tokens {
        write_leaf_tag(token, &mut out)?;
    }
    writeln!(out, "</tokens>")?;
    Ok(())
}

/// Tokenizes and parses one Jack source unit, returning the rendered
/// `(tokenStreamXml, parseTreeXml)` pair.
pub fn analyze_source(source: &str) -> Result<(String, String)> {
    let tokens = tokenize_all(source)?;

    let mut token_xml = Vec::new();
    write_token_stream(&tokens, &mut token_xml)?;

    let mut engine = CompilationEngine::new(&tokens, Vec::new());
    engine.compile_class()?;
    let tree_xml = engine.into_inner();

    Ok((
        String::from_utf8_lossy(&token_xml).into_owned(),
        String::from_utf8_lossy(&tree_xml).into_owned(),
    ))
}
