//! The parsed-document façade.
use serde_json::Value;

use crate::ast::{Ast, Node, NodeId};
use crate::diagnostics::{Diagnostic, Range};
use crate::validation::{self, Collector, SchemaMatch, ValidationResult};

/// The outcome of parsing one source text: the syntax tree, the syntax
/// diagnostics, and (when requested) the comment ranges.
///
/// Documents are immutable; validating the same document against several
/// schemas, even concurrently, is fine because each validation owns its
/// accumulators.
#[derive(Debug)]
pub struct Document {
    /// The syntax tree. Its root is absent only for empty input.
    pub ast: Ast,
    /// Problems found while parsing, in source order.
    pub syntax_errors: Vec<Diagnostic>,
    /// Comment ranges, populated when
    /// [`ParseOptions::collect_comments`](crate::ParseOptions) is set.
    pub comments: Vec<Range>,
}

impl Document {
    /// The root node; absent only for empty input.
    #[must_use]
    pub fn root(&self) -> Option<Node<'_>> {
        self.ast.root()
    }

    /// The deepest node containing `offset`; see [`Ast::node_at_offset`].
    #[must_use]
    pub fn node_at_offset(&self, offset: usize, include_end: bool) -> Option<Node<'_>> {
        self.ast.node_at_offset(offset, include_end)
    }

    /// Validate the document against `schema`, returning the semantic
    /// diagnostics. Syntax errors are not repeated here.
    #[must_use]
    pub fn validate(&self, schema: &Value) -> Vec<Diagnostic> {
        let Some(root) = self.ast.root() else {
            return Vec::new();
        };
        let mut result = ValidationResult::new();
        let mut collector = Collector::no_op();
        validation::validate(root, schema, &mut result, &mut collector);
        result.problems
    }

    /// Report which schemas applied to which nodes.
    ///
    /// With a `focus_offset`, collection is pruned to nodes whose range
    /// contains the offset (right-inclusive) — the shape hover and
    /// completion need. `exclude` drops one node from consideration. With no
    /// focus, every node qualifies.
    #[must_use]
    pub fn matching_schemas<'s>(
        &self,
        schema: &'s Value,
        focus_offset: Option<usize>,
        exclude: Option<NodeId>,
    ) -> Vec<SchemaMatch<'s>> {
        let Some(root) = self.ast.root() else {
            return Vec::new();
        };
        let mut result = ValidationResult::new();
        let mut collector = Collector::focused(focus_offset, exclude);
        validation::validate(root, schema, &mut result, &mut collector);
        collector.into_matches()
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::{parse, ParseOptions};
    use serde_json::json;

    #[test]
    fn empty_document_validates_cleanly() {
        let document = parse("", &ParseOptions::default());
        assert!(document.validate(&json!({"type": "object"})).is_empty());
        assert!(document
            .matching_schemas(&json!({"type": "object"}), None, None)
            .is_empty());
    }

    #[test]
    fn matching_schemas_without_focus_covers_all_nodes() {
        let schema = json!({
            "type": "object",
            "properties": {"a": {"type": "number"}}
        });
        let document = parse(r#"{"a": 1}"#, &ParseOptions::default());
        let matches = document.matching_schemas(&schema, None, None);
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn focused_matching_schemas_prune_other_subtrees() {
        let schema = json!({
            "type": "object",
            "properties": {
                "a": {"type": "number"},
                "b": {"type": "number"}
            }
        });
        let text = r#"{"a": 1, "b": 2}"#;
        let document = parse(text, &ParseOptions::default());
        let inside_a_value = text.find('1').unwrap();
        let matches = document.matching_schemas(&schema, Some(inside_a_value), None);
        // The object and the `a` value qualify; `b` is pruned.
        let nodes: Vec<_> = matches.iter().map(|m| m.node).collect();
        let b_value = document.node_at_offset(text.find('2').unwrap(), false).unwrap();
        assert!(!nodes.contains(&b_value.id()));
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn excluded_node_is_skipped() {
        let schema = json!({"type": "object", "properties": {"a": {"type": "number"}}});
        let text = r#"{"a": 1}"#;
        let document = parse(text, &ParseOptions::default());
        let value = document.node_at_offset(text.find('1').unwrap(), false).unwrap();
        let matches = document.matching_schemas(&schema, None, Some(value.id()));
        assert!(matches.iter().all(|m| m.node != value.id()));
    }
}
