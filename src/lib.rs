//! # SLiM/Eidos Analysis Library
//!
//! This library is the analysis core behind the SLiM language server. It
//! builds a document-wide symbol and context model from raw script text and
//! runs a battery of semantic checks against it, without a grammar-based
//! parser: everything is derived from line-oriented regex scanning plus
//! small hand-rolled state machines, so the analysis stays usable while a
//! script is mid-edit.
//!
//! ## Modules
//! - `docs` - static documentation tables (functions, classes, callbacks)
//! - `lexer` - string/comment-aware scanning and line sanitizing
//! - `inference` - expression class inference
//! - `tracker` - the single-pass symbol & context tracker
//! - `validation` - the generic rule-application framework
//! - `validators` - the concrete diagnostic rules and the orchestrator

pub mod docs;
pub mod inference;
pub mod lexer;
pub mod patterns;
pub mod tracker;
pub mod types;
pub mod validation;
pub mod validators;
