//! The frontend handles probability query notation.
//!
//! This module provides:
//! - **parser**: Transforms query text into an AST
//! - **ast**: Type definitions for the AST
//! - **validate**: Resolves names against a network

pub mod parser;
pub mod ast;
pub mod validate;
