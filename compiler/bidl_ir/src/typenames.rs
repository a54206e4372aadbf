//! The typenames registry: the single owner of all defined types.
//!
//! Every cross-reference between types is a lookup by canonical name through
//! this registry — no pointers between AST nodes. The registry is intended
//! for one compilation unit at a time (`reset` and repopulate); the
//! compatibility checker uses two independent instances.

use crate::ast::builtin;
use crate::ast::{DefinedType, Document, Import};
use crate::ConstArena;
use rustc_hash::FxHashMap;

/// Stable handle to a defined type inside a `Typenames` registry.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct TypeHandle {
    doc: u32,
    index: u32,
}

/// Outcome of resolving a type name against the registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Unique match; the fully-qualified name to record on the specifier.
    Resolved(String),
    /// Several distinct types answer to the simple name.
    Ambiguous(Vec<String>),
    /// No match anywhere.
    Unresolved,
}

/// Registry mapping canonical names to owned defined types.
#[derive(Debug, Default)]
pub struct Typenames {
    /// Shared constant-expression arena for every document in this unit.
    pub arena: ConstArena,
    documents: Vec<Document>,
    by_name: FxHashMap<String, TypeHandle>,
}

impl Typenames {
    pub fn new() -> Self {
        Typenames::default()
    }

    /// Drop all state so the registry can host another compilation unit.
    pub fn reset(&mut self) {
        self.arena = ConstArena::new();
        self.documents.clear();
        self.by_name.clear();
    }

    /// Register a parsed document.
    ///
    /// A defined type whose canonical name is already present is a duplicate
    /// — except that a directly parsed definition silently replaces one that
    /// came from a preprocessed index (first-match-by-source-kind). Returns
    /// the canonical names that were genuine duplicates so the caller can
    /// report them.
    pub fn add_document(&mut self, document: Document) -> Vec<String> {
        let doc_idx = self.documents.len() as u32;
        let mut duplicates = Vec::new();
        for (index, ty) in document.defined_types.iter().enumerate() {
            let canonical = ty.canonical_name();
            let handle = TypeHandle {
                doc: doc_idx,
                index: index as u32,
            };
            match self.by_name.get(&canonical) {
                None => {
                    self.by_name.insert(canonical, handle);
                }
                Some(existing) => {
                    let existing_preprocessed = self.get_by_handle(*existing).from_preprocessed;
                    if existing_preprocessed && !ty.from_preprocessed {
                        // Direct definition wins over the preprocessed index.
                        self.by_name.insert(canonical, handle);
                    } else if !existing_preprocessed && ty.from_preprocessed {
                        // Keep the direct definition.
                    } else {
                        duplicates.push(canonical);
                    }
                }
            }
        }
        self.documents.push(document);
        duplicates
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn documents_mut(&mut self) -> &mut [Document] {
        &mut self.documents
    }

    /// Split borrow for passes that rewrite documents while allocating new
    /// constant expressions (enumerator auto-fill).
    pub fn documents_and_arena_mut(&mut self) -> (&mut [Document], &mut ConstArena) {
        (&mut self.documents, &mut self.arena)
    }

    pub fn handle(&self, canonical: &str) -> Option<TypeHandle> {
        self.by_name.get(canonical).copied()
    }

    pub fn get(&self, canonical: &str) -> Option<&DefinedType> {
        self.handle(canonical).map(|h| self.get_by_handle(h))
    }

    pub fn get_by_handle(&self, handle: TypeHandle) -> &DefinedType {
        &self.documents[handle.doc as usize].defined_types[handle.index as usize]
    }

    /// All registered defined types (preprocessed entries included).
    pub fn iter_types(&self) -> impl Iterator<Item = &DefinedType> {
        self.by_name.values().map(|h| self.get_by_handle(*h))
    }

    /// Resolve a written type name against a package and import context.
    ///
    /// Order: builtins, then a qualified name as-is, then explicit imports
    /// by simple name, then the document's own package, then a unique
    /// simple-name match anywhere in the registry. Directly parsed types
    /// beat preprocessed entries with the same simple name; two distinct
    /// survivors are ambiguous.
    pub fn resolve_name(
        &self,
        package: &[String],
        imports: &[Import],
        written: &str,
    ) -> Resolution {
        if builtin::is_builtin(written) {
            return Resolution::Resolved(written.to_string());
        }

        if written.contains('.') {
            return if self.by_name.contains_key(written) {
                Resolution::Resolved(written.to_string())
            } else {
                Resolution::Unresolved
            };
        }

        // Explicit import wins outright.
        let imported: Vec<&Import> = imports
            .iter()
            .filter(|i| i.simple_name() == written)
            .collect();
        if imported.len() > 1 {
            let mut paths: Vec<String> = imported.iter().map(|i| i.path.clone()).collect();
            paths.dedup();
            if paths.len() > 1 {
                return Resolution::Ambiguous(paths);
            }
        }
        if let Some(import) = imported.first() {
            return if self.by_name.contains_key(&import.path) {
                Resolution::Resolved(import.path.clone())
            } else {
                Resolution::Unresolved
            };
        }

        // Same package.
        let same_package = if package.is_empty() {
            written.to_string()
        } else {
            format!("{}.{}", package.join("."), written)
        };
        if self.by_name.contains_key(&same_package) {
            return Resolution::Resolved(same_package);
        }

        // Global simple-name search; direct definitions shadow preprocessed.
        let mut direct = Vec::new();
        let mut preprocessed = Vec::new();
        for (canonical, handle) in &self.by_name {
            let simple = canonical.rsplit('.').next().unwrap_or(canonical);
            if simple == written {
                if self.get_by_handle(*handle).from_preprocessed {
                    preprocessed.push(canonical.clone());
                } else {
                    direct.push(canonical.clone());
                }
            }
        }
        let candidates = if direct.is_empty() { preprocessed } else { direct };
        match candidates.len() {
            0 => Resolution::Unresolved,
            1 => Resolution::Resolved(candidates.into_iter().next().unwrap_or_default()),
            _ => {
                let mut sorted = candidates;
                sorted.sort();
                Resolution::Ambiguous(sorted)
            }
        }
    }
}
