//! Error-tolerant JSON/JSONC parsing and JSON Schema validation with source
//! positions, built for language tooling.
//!
//! - 🌳 Recovering parser: never aborts, always returns the largest
//!   well-formed tree, with byte-offset ranges on every node
//! - 📐 JSON Schema validation (draft-07 subset) directly over the tree
//! - 🎯 Best-match `anyOf`/`oneOf` scoring, so diagnostics come from the
//!   branch the user most plausibly meant
//! - 🔍 Node-to-schema associations for hover, completion and
//!   goto-definition features
//!
//! # Parsing and validating
//!
//! ```rust
//! use serde_json::json;
//!
//! let source = r#"{
//!     // comments are fine
//!     "name": "db",
//!     "port": 5432,
//! }"#;
//! let document = jsondoc::parse(source, &jsondoc::ParseOptions::default());
//! // The trailing comma is flagged but the tree is complete.
//! assert_eq!(document.syntax_errors.len(), 1);
//!
//! let schema = json!({
//!     "type": "object",
//!     "properties": {
//!         "name": { "type": "string" },
//!         "port": { "type": "integer", "minimum": 1024 }
//!     },
//!     "required": ["name"]
//! });
//! assert!(document.validate(&schema).is_empty());
//! ```
//!
//! # Schemas at a position
//!
//! ```rust
//! use serde_json::json;
//!
//! let source = r#"{"port": 5432}"#;
//! let document = jsondoc::parse(source, &jsondoc::ParseOptions::default());
//! let schema = json!({
//!     "type": "object",
//!     "properties": { "port": { "type": "integer" } }
//! });
//! // Which schemas apply at the cursor (inside `5432`)?
//! let matches = document.matching_schemas(&schema, Some(10), None);
//! assert_eq!(matches.len(), 2);
//! ```
//!
//! # Scope
//!
//! Schemas are plain [`serde_json::Value`]s and are expected to be fully
//! dereferenced: `$ref` resolution and schema loading are the caller's
//! concern. Offsets throughout are byte offsets into the UTF-8 source.
#![warn(
    clippy::doc_markdown,
    clippy::redundant_closure,
    clippy::explicit_iter_loop,
    clippy::match_same_arms,
    clippy::print_stdout,
    missing_docs,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications
)]

mod ast;
mod diagnostics;
mod document;
mod formats;
mod parser;
mod scanner;
mod schema;
mod validation;

pub use ast::{Ast, Node, NodeId, NodeKind, PathSegment};
pub use diagnostics::{Diagnostic, ErrorCode, Range, Severity};
pub use document::Document;
pub use parser::{parse, ParseOptions};
pub use scanner::{ScanError, Scanner, TokenKind};
pub use validation::{SchemaMatch, ValidationResult};
