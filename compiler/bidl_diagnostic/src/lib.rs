//! Diagnostics for the bidl compiler.
//!
//! Every user-facing problem is a [`Diagnostic`] with an [`ErrorCode`],
//! accumulated in a [`Diagnostics`] collector that is threaded explicitly
//! through the pipeline. Internal invariant violations are not diagnostics:
//! they panic, because they indicate a bug in the compiler itself.

mod collector;
mod diagnostic;
mod error_code;

pub use collector::Diagnostics;
pub use diagnostic::{Diagnostic, Severity};
pub use error_code::ErrorCode;
