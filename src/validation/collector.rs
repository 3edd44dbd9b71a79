//! Node-to-schema association sink.
use serde_json::Value;

use crate::ast::{Node, NodeId};

/// One schema recorded as applicable to one node. `inverted` marks schemas
/// reached through `not`.
#[derive(Clone, Copy, Debug)]
pub struct SchemaMatch<'s> {
    /// The node the schema applied to.
    pub node: NodeId,
    /// The (normalized) schema object.
    pub schema: &'s Value,
    /// Whether the schema holds inverted, via a `not`.
    pub inverted: bool,
}

/// Collects `(node, schema)` associations during validation.
///
/// Two modes behind one type: the no-op collector records nothing (used when
/// only diagnostics are wanted, and for `contains`/`propertyNames` probes);
/// the recording collector optionally filters by a focus offset and an
/// excluded node. Combinator branches get isolated sub-collectors via
/// [`Collector::new_sub`], folded back with [`Collector::merge`] only when
/// the branch wins.
#[derive(Debug)]
pub(crate) struct Collector<'s> {
    enabled: bool,
    focus_offset: Option<usize>,
    exclude: Option<NodeId>,
    matches: Vec<SchemaMatch<'s>>,
}

impl<'s> Collector<'s> {
    pub(crate) fn no_op() -> Collector<'s> {
        Collector {
            enabled: false,
            focus_offset: None,
            exclude: None,
            matches: Vec::new(),
        }
    }

    pub(crate) fn focused(focus_offset: Option<usize>, exclude: Option<NodeId>) -> Collector<'s> {
        Collector {
            enabled: true,
            focus_offset,
            exclude,
            matches: Vec::new(),
        }
    }

    /// Whether validation should descend into `node` at all. This is how
    /// focused queries prune subtrees away from the cursor.
    pub(crate) fn include(&self, node: Node<'_>) -> bool {
        if !self.enabled {
            return true;
        }
        self.focus_offset
            .map_or(true, |offset| node.range().contains(offset, true))
            && Some(node.id()) != self.exclude
    }

    pub(crate) fn add(&mut self, schema_match: SchemaMatch<'s>) {
        if self.enabled {
            self.matches.push(schema_match);
        }
    }

    // Branch collectors drop the offset filter: a winning branch folds in
    // wholesale, and the caller filters by node afterwards.
    pub(crate) fn new_sub(&self) -> Collector<'s> {
        Collector {
            enabled: self.enabled,
            focus_offset: None,
            exclude: self.exclude,
            matches: Vec::new(),
        }
    }

    pub(crate) fn merge(&mut self, other: Collector<'s>) {
        self.matches.extend(other.matches);
    }

    pub(crate) fn into_matches(self) -> Vec<SchemaMatch<'s>> {
        self.matches
    }
}
