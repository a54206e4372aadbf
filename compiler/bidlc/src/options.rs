//! Command-line option parsing, shared by every subcommand.

use crate::CliError;
use bidl_check::CompileOptions;
use std::path::PathBuf;

/// Options accepted after the command word.
#[derive(Debug, Default)]
pub struct CliOptions {
    pub compile: CompileOptions,
    /// Roots searched when an import has no definition among the inputs.
    pub import_roots: Vec<PathBuf>,
    /// Preprocessed API indexes to register before the inputs.
    pub preprocessed: Vec<PathBuf>,
    pub out: Option<PathBuf>,
    /// Positional arguments: source files or directories.
    pub inputs: Vec<PathBuf>,
}

pub fn parse_args(args: &[String]) -> Result<CliOptions, CliError> {
    let mut options = CliOptions::default();
    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        if let Some(lang) = arg.strip_prefix("--lang=") {
            options.compile.backend = lang.parse().map_err(CliError::Usage)?;
        } else if arg == "--structured" {
            options.compile.structured = true;
        } else if arg == "-I" {
            let Some(root) = args.get(i + 1) else {
                return Err(CliError::Usage("`-I` needs a directory".to_string()));
            };
            options.import_roots.push(PathBuf::from(root));
            i += 1;
        } else if let Some(root) = arg.strip_prefix("-I") {
            options.import_roots.push(PathBuf::from(root));
        } else if let Some(path) = arg.strip_prefix("--preprocessed=") {
            options.preprocessed.push(PathBuf::from(path));
        } else if let Some(path) = arg.strip_prefix("--out=") {
            options.out = Some(PathBuf::from(path));
        } else if arg.starts_with('-') {
            return Err(CliError::Usage(format!("unknown option `{arg}`")));
        } else {
            options.inputs.push(PathBuf::from(arg));
        }
        i += 1;
    }
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bidl_check::Backend;
    use pretty_assertions::assert_eq;

    fn args(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| (*w).to_string()).collect()
    }

    #[test]
    fn parses_a_full_invocation() {
        let options = parse_args(&args(&[
            "--lang=ndk",
            "--structured",
            "-I",
            "roots/a",
            "-Iroots/b",
            "--preprocessed=frozen.bidl",
            "--out=gen",
            "src/p/IFoo.bidl",
        ]))
        .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(options.compile.backend, Backend::Ndk);
        assert!(options.compile.structured);
        assert_eq!(
            options.import_roots,
            vec![PathBuf::from("roots/a"), PathBuf::from("roots/b")]
        );
        assert_eq!(options.preprocessed, vec![PathBuf::from("frozen.bidl")]);
        assert_eq!(options.out, Some(PathBuf::from("gen")));
        assert_eq!(options.inputs, vec![PathBuf::from("src/p/IFoo.bidl")]);
    }

    #[test]
    fn rejects_unknown_options_and_backends() {
        assert!(parse_args(&args(&["--wat"])).is_err());
        let err = parse_args(&args(&["--lang=rust"]));
        assert!(matches!(err, Err(CliError::Usage(_))));
        assert!(parse_args(&args(&["-I"])).is_err());
    }
}
