//! VM Translator - Main Entry Point
//!
//! Translates `Nand2Tetris` VM bytecode (`.vm`) into Hack assembly (`.asm`).
//!
//! # Usage
//! ```bash
//! vm [-v] [-f] <input.vm | directory>
//! ```
//!
//! Directory mode concatenates the bootstrap plus every `.vm` file found
//! (sorted by name, for determinism) into a single output whose label
//! counters are shared across all inputs.

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use vm_translator::{translate_unit, TranslationUnit};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

struct Options {
    verbose: bool,
    input: String,
}

fn parse_args(args: &[String]) -> std::result::Result<Options, String> {
    let mut verbose = false;
    let mut input = None;

    for arg in &args[1..] {
        match arg.as_str() {
            "-v" => verbose = true,
            "-f" | "-n" | "-y" => {}
            _ if arg.starts_with('-') => return Err(format!("unknown flag: {arg}")),
            _ => {
                if input.is_some() {
                    return Err("too many positional arguments".to_string());
                }
                input = Some(arg.clone());
            }
        }
    }

    let input = input.ok_or("missing <input.vm | directory>")?;
    Ok(Options { verbose, input })
}

fn collect_vm_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<_> = fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "vm"))
        .collect();
    files.sort();
    Ok(files)
}

fn load_units(input: &str) -> Result<(Vec<TranslationUnit>, String)> {
    let path = Path::new(input);

    if path.is_dir() {
        let files = collect_vm_files(path)?;
        if files.is_empty() {
            return Err(format!("no .vm files found in directory {input}").into());
        }
        let mut units = Vec::with_capacity(files.len());
        for file in &files {
            let stem = file
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Unknown")
                .to_string();
            let source = fs::read_to_string(file)?;
            units.push(TranslationUnit {
                file_stem: stem,
                source,
            });
        }
        let dir_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("output")
            .to_string();
        let output = path.join(format!("{dir_name}.asm"));
        Ok((units, output.to_string_lossy().into_owned()))
    } else {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Unknown")
            .to_string();
        let source = fs::read_to_string(path)?;
        let output = path.with_extension("asm").to_string_lossy().into_owned();
        Ok((
            vec![TranslationUnit {
                file_stem: stem,
                source,
            }],
            output,
        ))
    }
}

fn run(opts: &Options) -> Result<()> {
    let (units, output_path) = load_units(&opts.input)?;
    if opts.verbose {
        eprintln!("vm: translating {} unit(s) -> {output_path}", units.len());
    }

    let asm = translate_unit(&units, opts.verbose)?;
    fs::write(&output_path, asm)?;

    println!("Translation complete: {} -> {output_path}", opts.input);
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let opts = match parse_args(&args) {
        Ok(opts) => opts,
        Err(msg) => {
            eprintln!("{msg}");
            eprintln!(
                "Usage: {} [-v] [-f] <input.vm | directory>",
                args.first().map_or("vm", String::as_str)
            );
            process::exit(1);
        }
    };

    if let Err(e) = run(&opts) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_verbose_and_ignored_flags() {
        let args: Vec<String> = vec!["vm".into(), "-v".into(), "-n".into(), "Foo.vm".into()];
        let opts = parse_args(&args).unwrap();
        assert!(opts.verbose);
        assert_eq!(opts.input, "Foo.vm");
    }

    #[test]
    fn rejects_unknown_flags() {
        let args: Vec<String> = vec!["vm".into(), "--nope".into(), "Foo.vm".into()];
        assert!(parse_args(&args).is_err());
    }
}
