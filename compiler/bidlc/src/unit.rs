//! Compilation-unit loading: inputs, preprocessed indexes, and transitive
//! import resolution through `-I` roots.

use crate::{CliError, CliOptions};
use bidl_diagnostic::{Diagnostic, Diagnostics, ErrorCode};
use bidl_ir::{Location, Typenames};
use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Load every input (and everything they import) into one registry.
///
/// Imports already satisfied by a loaded file or a preprocessed index are
/// not searched. A file found under more than one distinct root is an error;
/// the roots themselves are deduplicated first so repeating `-I dir` is
/// harmless.
pub(crate) fn load_unit(options: &CliOptions) -> Result<(Typenames, Diagnostics), CliError> {
    let mut typenames = Typenames::new();
    let mut diagnostics = Diagnostics::new();
    let mut loaded: FxHashSet<PathBuf> = FxHashSet::default();
    let mut pending: Vec<(String, Location)> = Vec::new();

    for path in &options.preprocessed {
        let text = read(path)?;
        let file: Arc<str> = Arc::from(path.to_string_lossy().as_ref());
        bidl_check::load_preprocessed(&text, &file, &mut typenames, &mut diagnostics);
    }

    for input in &options.inputs {
        if input.is_dir() {
            let mut files = Vec::new();
            collect_sources(input, &mut files)?;
            for file in files {
                load_file(&file, &mut typenames, &mut diagnostics, &mut loaded, &mut pending)?;
            }
        } else {
            load_file(input, &mut typenames, &mut diagnostics, &mut loaded, &mut pending)?;
        }
    }

    let mut roots: Vec<&PathBuf> = Vec::new();
    for root in &options.import_roots {
        if !roots.contains(&root) {
            roots.push(root);
        }
    }

    while let Some((import, location)) = pending.pop() {
        if typenames.get(&import).is_some() {
            continue;
        }
        let mut relative: PathBuf = import.split('.').collect();
        relative.set_extension("bidl");
        let candidates: Vec<PathBuf> = roots
            .iter()
            .map(|root| root.join(&relative))
            .filter(|path| path.is_file())
            .collect();
        match candidates.as_slice() {
            [] => diagnostics.report(
                Diagnostic::error(ErrorCode::E3002, location)
                    .with_message(format!("could not find `{import}` in any import root")),
            ),
            [path] => {
                let path = path.clone();
                load_file(&path, &mut typenames, &mut diagnostics, &mut loaded, &mut pending)?;
            }
            found => {
                let paths: Vec<String> = found
                    .iter()
                    .map(|p| p.to_string_lossy().into_owned())
                    .collect();
                diagnostics.report(
                    Diagnostic::error(ErrorCode::E3003, location)
                        .with_message(format!("`{import}` found in multiple import roots"))
                        .with_note(paths.join(", ")),
                );
            }
        }
    }

    Ok((typenames, diagnostics))
}

fn load_file(
    path: &Path,
    typenames: &mut Typenames,
    diagnostics: &mut Diagnostics,
    loaded: &mut FxHashSet<PathBuf>,
    pending: &mut Vec<(String, Location)>,
) -> Result<(), CliError> {
    if !loaded.insert(path.to_path_buf()) {
        return Ok(());
    }
    let text = read(path)?;
    let file: Arc<str> = Arc::from(path.to_string_lossy().as_ref());
    tracing::debug!(file = %file, "loading source");
    if bidl_check::load_source(&text, &file, typenames, diagnostics) {
        if let Some(document) = typenames.documents().last() {
            for import in &document.imports {
                pending.push((import.path.clone(), import.location.clone()));
            }
        }
    }
    Ok(())
}

/// Recursively collect `.bidl` files, sorted for deterministic load order.
pub(crate) fn collect_sources(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), CliError> {
    let entries = std::fs::read_dir(dir).map_err(|source| CliError::Read {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| CliError::Read {
            path: dir.to_path_buf(),
            source,
        })?;
        paths.push(entry.path());
    }
    paths.sort();
    for path in paths {
        if path.is_dir() {
            collect_sources(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == "bidl") {
            files.push(path);
        }
    }
    Ok(())
}

pub(crate) fn read(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}
