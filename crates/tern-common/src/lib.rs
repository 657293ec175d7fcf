//! Shared types for the Tern compiler.
//!
//! Small, dependency-light building blocks used across the compiler
//! crates. Currently just source spans; anything here must stay free
//! of compiler-phase-specific logic.

pub mod span;

pub use span::Span;
