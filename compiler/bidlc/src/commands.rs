//! The driver commands. Each returns `Ok(true)` on success, `Ok(false)`
//! when the inputs had errors (already emitted to stderr), and `Err` for
//! driver-level failures.

use crate::unit::{collect_sources, load_unit, read};
use crate::{CliError, CliOptions};
use bidl_check::CompileOptions;
use bidl_diagnostic::Diagnostics;
use bidl_ir::Typenames;
use std::path::Path;
use std::sync::Arc;

/// `bidlc check`: compile the unit and report every diagnostic.
pub fn check(options: &CliOptions) -> Result<bool, CliError> {
    let (mut typenames, mut diagnostics) = load_unit(options)?;
    bidl_check::check_documents(&mut typenames, &options.compile, &mut diagnostics);
    diagnostics.emit_to_stderr();
    Ok(!diagnostics.has_errors())
}

/// `bidlc dump-api`: compile the unit and write one canonical file per type
/// under `--out`.
pub fn dump_api(options: &CliOptions) -> Result<bool, CliError> {
    let Some(out) = &options.out else {
        return Err(CliError::Usage(
            "dump-api needs `--out=<dir>`".to_string(),
        ));
    };

    let (mut typenames, mut diagnostics) = load_unit(options)?;
    bidl_check::check_documents(&mut typenames, &options.compile, &mut diagnostics);
    if diagnostics.has_errors() {
        diagnostics.emit_to_stderr();
        return Ok(false);
    }

    let files = bidl_api::dump_api(&typenames, &mut diagnostics);
    for file in &files {
        let path = out.join(&file.path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| CliError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&path, &file.contents).map_err(|source| CliError::Write {
            path: path.clone(),
            source,
        })?;
    }
    diagnostics.emit_to_stderr();
    Ok(!diagnostics.has_errors())
}

/// `bidlc check-api <old> <new>`: compile two dump trees and compare.
pub fn check_api(options: &CliOptions) -> Result<bool, CliError> {
    let [old_dir, new_dir] = options.inputs.as_slice() else {
        return Err(CliError::Usage(
            "check-api takes exactly two dump directories".to_string(),
        ));
    };

    let Some(old) = load_dump(old_dir, &options.compile)? else {
        return Ok(false);
    };
    let Some(new) = load_dump(new_dir, &options.compile)? else {
        return Ok(false);
    };

    let mut diagnostics = Diagnostics::new();
    let compatible = bidl_api::check_api(&old, &new, &mut diagnostics);
    diagnostics.emit_to_stderr();
    Ok(compatible)
}

/// `bidlc preprocess`: condense the inputs into a single index, one
/// declaration per line, for consumption via `--preprocessed=`.
pub fn preprocess(options: &CliOptions) -> Result<bool, CliError> {
    let (typenames, mut diagnostics) = load_unit(options)?;
    diagnostics.emit_to_stderr();
    if diagnostics.has_errors() {
        return Ok(false);
    }

    let mut lines: Vec<String> = typenames
        .iter_types()
        .filter(|t| !t.from_preprocessed)
        .map(|t| format!("{} {};", t.kind.keyword(), t.canonical_name()))
        .collect();
    lines.sort();
    let mut text = lines.join("\n");
    text.push('\n');

    match &options.out {
        Some(path) => std::fs::write(path, text).map_err(|source| CliError::Write {
            path: path.clone(),
            source,
        })?,
        None => print!("{text}"),
    }
    Ok(true)
}

/// Compile one dump directory into its own registry. `None` means the dump
/// itself had errors (emitted here).
fn load_dump(dir: &Path, compile: &CompileOptions) -> Result<Option<Typenames>, CliError> {
    let mut files = Vec::new();
    collect_sources(dir, &mut files)?;

    let mut typenames = Typenames::new();
    let mut diagnostics = Diagnostics::new();
    for path in files {
        let text = read(&path)?;
        let file: Arc<str> = Arc::from(path.to_string_lossy().as_ref());
        bidl_check::load_source(&text, &file, &mut typenames, &mut diagnostics);
    }
    bidl_check::check_documents(&mut typenames, compile, &mut diagnostics);
    if diagnostics.has_errors() {
        diagnostics.emit_to_stderr();
        return Ok(None);
    }
    Ok(Some(typenames))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write(root: &Path, relative: &str, text: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("{e}"));
        }
        std::fs::write(path, text).unwrap_or_else(|e| panic!("{e}"));
    }

    #[test]
    fn dump_api_writes_one_file_per_type() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let root = dir.path();
        write(
            root,
            "src/p/IFoo.bidl",
            "package p; import p.Mode; interface IFoo { Mode next(in Mode m); }",
        );
        write(root, "src/p/Mode.bidl", "package p; enum Mode { A, B }");

        let options = CliOptions {
            inputs: vec![root.join("src")],
            out: Some(root.join("api")),
            ..CliOptions::default()
        };
        let ok = dump_api(&options).unwrap_or_else(|e| panic!("{e}"));
        assert!(ok);

        let dumped = std::fs::read_to_string(root.join("api/p/Mode.bidl"))
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(dumped.contains("enum Mode {"));
        assert!(dumped.contains("  A = 0,"));
        assert!(root.join("api/p/IFoo.bidl").is_file());
    }

    #[test]
    fn check_api_compares_two_dump_trees() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let root = dir.path();
        write(root, "old/p/I.bidl", "package p; interface I { void a(); }");
        write(
            root,
            "new/p/I.bidl",
            "package p; interface I { void a(); void b(); }",
        );

        let options = CliOptions {
            inputs: vec![root.join("old"), root.join("new")],
            ..CliOptions::default()
        };
        assert!(check_api(&options).unwrap_or_else(|e| panic!("{e}")));

        // The reverse direction removes a method.
        let options = CliOptions {
            inputs: vec![root.join("new"), root.join("old")],
            ..CliOptions::default()
        };
        assert!(!check_api(&options).unwrap_or_else(|e| panic!("{e}")));
    }

    #[test]
    fn preprocess_writes_a_sorted_index() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let root = dir.path();
        write(root, "src/q/Data.bidl", "package q; parcelable Data;");
        write(root, "src/p/IFoo.bidl", "package p; interface IFoo { void f(); }");
        write(root, "src/p/Mode.bidl", "package p; enum Mode { A }");

        let options = CliOptions {
            inputs: vec![root.join("src")],
            out: Some(root.join("frozen.bidl")),
            ..CliOptions::default()
        };
        assert!(preprocess(&options).unwrap_or_else(|e| panic!("{e}")));

        let index = std::fs::read_to_string(root.join("frozen.bidl"))
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(
            index,
            "enum p.Mode;\ninterface p.IFoo;\nparcelable q.Data;\n"
        );

        // The index round-trips through --preprocessed.
        write(
            root,
            "user/IUser.bidl",
            "package u; import q.Data; interface IUser { Data get(); }",
        );
        let options = CliOptions {
            preprocessed: vec![root.join("frozen.bidl")],
            inputs: vec![root.join("user/IUser.bidl")],
            ..CliOptions::default()
        };
        assert!(check(&options).unwrap_or_else(|e| panic!("{e}")));
    }

    #[test]
    fn check_reports_failure_through_the_exit_status() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let root = dir.path();
        write(root, "I.bidl", "package p; interface I { Missing f(); }");

        let options = CliOptions {
            inputs: vec![root.join("I.bidl")],
            ..CliOptions::default()
        };
        assert!(!check(&options).unwrap_or_else(|e| panic!("{e}")));
    }

    #[test]
    fn missing_out_dir_is_a_usage_error() {
        let options = CliOptions {
            inputs: vec![PathBuf::from("whatever.bidl")],
            ..CliOptions::default()
        };
        assert!(matches!(dump_api(&options), Err(CliError::Usage(_))));
    }
}
