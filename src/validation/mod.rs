//! Schema validation over the syntax tree.
//!
//! The validator walks the schema object directly, dispatching on node kind
//! and schema keyword. Every keyword check is independent and additive;
//! validation never aborts. The non-trivial part is `anyOf`/`oneOf`: every
//! branch is evaluated into its own result and sub-collector, and a
//! lexicographic score decides whose diagnostics and schema associations
//! survive (see [`ValidationResult`]).
mod array;
mod collector;
mod number;
mod object;
mod result;
mod string;

use std::cmp::Ordering;

use serde_json::{Map, Value};

use crate::ast::{Node, NodeKind};
use crate::diagnostics::{Diagnostic, ErrorCode, Range, Severity};
use crate::schema;

pub use collector::SchemaMatch;
pub(crate) use collector::Collector;
pub use result::ValidationResult;

/// Validate `node` against the schema reference `reference`, accumulating
/// into `result` and `collector`. Booleans normalize to the accept-all /
/// reject-all schemas; other non-object references are ignored.
pub(crate) fn validate<'a, 's>(
    node: Node<'a>,
    reference: &'s Value,
    result: &mut ValidationResult<'s>,
    collector: &mut Collector<'s>,
) {
    let Some(schema_value) = schema::normalize(reference) else {
        return;
    };
    let schema = schema_value
        .as_object()
        .expect("normalized schema is an object");
    if !collector.include(node) {
        return;
    }
    // Properties validate through their value.
    let node = if let NodeKind::Property { .. } = node.kind() {
        match node.property_value() {
            Some(value) => value,
            None => return,
        }
    } else {
        node
    };

    validate_common(node, schema, result, collector);

    match node.kind() {
        NodeKind::Object(_) => object::validate_object(node, schema, result, collector),
        NodeKind::Array(_) => array::validate_array(node, schema, result, collector),
        NodeKind::String { .. } => string::validate_string(node, schema, result),
        NodeKind::Number { .. } => number::validate_number(node, schema, result),
        _ => {}
    }

    if let Some(message) = schema::get_str(schema, "deprecationMessage") {
        // Highlight the enclosing property, not just the value.
        if let Some(parent) = node.parent() {
            result
                .problems
                .push(Diagnostic::warning(parent.range(), message));
        }
    }

    collector.add(SchemaMatch {
        node: node.id(),
        schema: schema_value,
        inverted: false,
    });
}

// The kind-independent keywords: type, combinators, enum/const.
fn validate_common<'a, 's>(
    node: Node<'a>,
    schema: &'s Map<String, Value>,
    result: &mut ValidationResult<'s>,
    collector: &mut Collector<'s>,
) {
    let range = node.range();

    match schema.get("type") {
        Some(Value::Array(names)) => {
            if !names
                .iter()
                .filter_map(Value::as_str)
                .any(|name| matches_type(node, name))
            {
                let message = schema::get_str(schema, "errorMessage").map_or_else(
                    || {
                        let expected = names
                            .iter()
                            .filter_map(Value::as_str)
                            .collect::<Vec<_>>()
                            .join(", ");
                        format!("Incorrect type. Expected one of {expected}.")
                    },
                    str::to_string,
                );
                result.problems.push(Diagnostic::warning(range, message));
            }
        }
        Some(Value::String(name)) => {
            if !matches_type(node, name) {
                let message = schema::get_str(schema, "errorMessage").map_or_else(
                    || format!("Incorrect type. Expected \"{name}\"."),
                    str::to_string,
                );
                result.problems.push(Diagnostic::warning(range, message));
            }
        }
        _ => {}
    }

    if let Some(all_of) = schema::get_array(schema, "allOf") {
        for sub in all_of {
            validate(node, sub, result, collector);
        }
    }

    if let Some(not_ref) = schema.get("not") {
        if schema::normalize(not_ref).is_some() {
            let mut sub_result = ValidationResult::new();
            let mut sub_collector = collector.new_sub();
            validate(node, not_ref, &mut sub_result, &mut sub_collector);
            if !sub_result.has_problems() {
                result.problems.push(Diagnostic::warning(
                    range,
                    "Matches a schema that is not allowed.",
                ));
            }
            for mut schema_match in sub_collector.into_matches() {
                schema_match.inverted = !schema_match.inverted;
                collector.add(schema_match);
            }
        }
    }

    if let Some(alternatives) = schema::get_array(schema, "anyOf") {
        test_alternatives(node, alternatives, false, result, collector);
    }
    if let Some(alternatives) = schema::get_array(schema, "oneOf") {
        test_alternatives(node, alternatives, true, result, collector);
    }

    if let Some(values) = schema::get_array(schema, "enum") {
        let actual = node.value();
        let matched = values.iter().any(|value| schema::equal(&actual, value));
        result.enum_values = Some(values.iter().collect());
        result.enum_value_match = matched;
        if !matched {
            let message = schema::get_str(schema, "errorMessage").map_or_else(
                || {
                    let listed = values
                        .iter()
                        .map(Value::to_string)
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("Value is not accepted. Valid values: {listed}.")
                },
                str::to_string,
            );
            result.problems.push(Diagnostic::new(
                range,
                Severity::Warning,
                Some(ErrorCode::EnumValueMismatch),
                message,
            ));
        }
    }

    if let Some(constant) = schema.get("const") {
        let actual = node.value();
        if schema::equal(&actual, constant) {
            result.enum_value_match = true;
        } else {
            let message = schema::get_str(schema, "errorMessage")
                .map_or_else(|| format!("Value must be {constant}."), str::to_string);
            result.problems.push(Diagnostic::new(
                range,
                Severity::Warning,
                Some(ErrorCode::EnumValueMismatch),
                message,
            ));
            result.enum_value_match = false;
        }
        result.enum_values = Some(vec![constant]);
    }
}

fn matches_type(node: Node<'_>, name: &str) -> bool {
    if name == "integer" {
        return matches!(node.kind(), NodeKind::Number { integer: true, .. });
    }
    node.node_type() == name
}

// Evaluates every alternative into its own result and sub-collector, keeps
// the best-scoring branch, and folds it into the parent. With `max_one_match`
// (oneOf) two fully valid branches produce an ambiguity warning; without it
// (anyOf) equally clean branches have their collectors unioned so editor
// features see every applicable schema.
fn test_alternatives<'a, 's>(
    node: Node<'a>,
    alternatives: &'s [Value],
    max_one_match: bool,
    result: &mut ValidationResult<'s>,
    collector: &mut Collector<'s>,
) -> usize {
    let mut matches = 0;
    let mut best: Option<(ValidationResult<'s>, Collector<'s>)> = None;

    for sub in alternatives {
        let mut sub_result = ValidationResult::new();
        let mut sub_collector = collector.new_sub();
        validate(node, sub, &mut sub_result, &mut sub_collector);
        if !sub_result.has_problems() {
            matches += 1;
        }
        let Some((best_result, best_collector)) = &mut best else {
            best = Some((sub_result, sub_collector));
            continue;
        };
        if !max_one_match && !sub_result.has_problems() && !best_result.has_problems() {
            // Equally good clean matches: union them.
            best_collector.merge(sub_collector);
            best_result.properties_matches += sub_result.properties_matches;
            best_result.properties_value_matches += sub_result.properties_value_matches;
        } else {
            match sub_result.compare(best_result) {
                Ordering::Greater => {
                    *best_result = sub_result;
                    *best_collector = sub_collector;
                }
                Ordering::Equal => {
                    best_collector.merge(sub_collector);
                    best_result.merge_enum_values(&sub_result);
                }
                Ordering::Less => {}
            }
        }
    }

    if matches > 1 && max_one_match {
        let start = node.range().start;
        result.problems.push(Diagnostic::warning(
            Range::new(start, start + 1),
            "Matches multiple schemas when only one must validate.",
        ));
    }
    if let Some((best_result, best_collector)) = best {
        let properties_matches = best_result.properties_matches;
        let properties_value_matches = best_result.properties_value_matches;
        result.merge(best_result);
        result.properties_matches += properties_matches;
        result.properties_value_matches += properties_value_matches;
        collector.merge(best_collector);
    }
    matches
}

fn override_message<'s>(schema: &'s Map<String, Value>) -> Option<&'s str> {
    schema::get_str(schema, "patternErrorMessage").or_else(|| schema::get_str(schema, "errorMessage"))
}
