//! CLI command implementations.

pub mod check;
pub mod codegen;
pub mod common;
pub mod documents;
pub mod kinds;
pub mod settings;
pub mod simulate;
