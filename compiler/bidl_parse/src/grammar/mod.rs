//! Grammar productions, grouped by syntactic category.

mod expr;
mod item;
mod ty;
