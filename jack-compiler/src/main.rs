//! Jack Compiler - Main Entry Point
//!
//! Compiles `.jack` source into `.vm` bytecode.
//!
//! # Usage
//! ```bash
//! compiler [-v] [-f] <input.jack | directory>
//! ```
//!
//! Directory mode compiles every `.jack` file found; a compile error in one
//! file is reported but does not stop the remaining files from being
//! attempted.

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use jack_compiler::compile_source;

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

    let input = input.ok_or("missing <input.jack | directory>")?;
    Ok(Options { verbose, input })
}

fn collect_jack_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<_> = fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "jack"))
        .collect();
    files.sort();
    Ok(files)
}

fn compile_file(path: &Path, verbose: bool) -> Result<()> {
    if verbose {
        eprintln!("compiler: compiling {}", path.display());
    }
    let source = fs::read_to_string(path)?;
    let vm = compile_source(&source)?;
    let output_path = path.with_extension("vm");
    fs::write(&output_path, vm)?;
    Ok(())
}

fn run(opts: &Options) -> Result<()> {
    let path = Path::new(&opts.input);
    let files = if path.is_dir() {
        let files = collect_jack_files(path)?;
        if files.is_empty() {
            return Err(format!("no .jack files found in directory {}", opts.input).into());
        }
        files
    } else {
        vec![path.to_path_buf()]
    };

    let mut failures = 0usize;
    for file in &files {
        if let Err(e) = compile_file(file, opts.verbose) {
            eprintln!("Error compiling {}: {e}", file.display());
            failures += 1;
        }
    }

    if failures > 0 {
        return Err(format!("{failures} of {} file(s) failed to compile", files.len()).into());
    }

    println!("Compilation complete: {} file(s)", files.len());
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let opts = match parse_args(&args) {
        Ok(opts) => opts,
        Err(msg) => {
            eprintln!("{msg}");
            eprintln!(
                "Usage: {} [-v] [-f] <input.jack | directory>",
                args.first().map_or("compiler", String::as_str)
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
        let args: Vec<String> = vec!["compiler".into(), "-v".into(), "-y".into(), "Main.jack".into()];
        let opts = parse_args(&args).unwrap();
        assert!(opts.verbose);
        assert_eq!(opts.input, "Main.jack");
    }

    #[test]
    fn rejects_unknown_flags() {
        let args: Vec<String> = vec!["compiler".into(), "--nope".into(), "Main.jack".into()];
        assert!(parse_args(&args).is_err());
    }
}
