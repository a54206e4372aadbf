//! Stable API tooling: dumping a checked compilation unit to a canonical
//! textual form, and comparing two dumps for backward compatibility.
//!
//! Both halves work over checked [`bidl_ir::Typenames`] registries; a dump
//! is itself valid source, so the compatibility checker simply compiles the
//! old and new dump trees and walks the results.

mod compat;
mod dump;

pub use compat::check_api;
pub use dump::{dump_api, ApiFile};
