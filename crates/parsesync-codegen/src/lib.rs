//! Type-definition generation for schema sets
//!
//! Renders TypeScript declarations for the Parse JavaScript SDK from a
//! resolved schema set.

pub mod typescript;

pub use typescript::{generate_typescript, CodegenError};
