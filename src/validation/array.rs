//! Array assertions and applicators.
use serde_json::{Map, Value};

use crate::ast::{Node, NodeKind};
use crate::diagnostics::Diagnostic;
use crate::schema;

use super::{validate, Collector, ValidationResult};

pub(super) fn validate_array<'a, 's>(
    node: Node<'a>,
    schema: &'s Map<String, Value>,
    result: &mut ValidationResult<'s>,
    collector: &mut Collector<'s>,
) {
    if !matches!(node.kind(), NodeKind::Array(_)) {
        return;
    }
    let items = node.children();
    let range = node.range();

    match schema.get("items") {
        Some(Value::Array(positional)) => {
            for (sub, item) in positional.iter().zip(&items) {
                let mut item_result = ValidationResult::new();
                validate(*item, sub, &mut item_result, collector);
                result.merge_property_match(item_result);
            }
            if items.len() > positional.len() {
                match schema.get("additionalItems") {
                    Some(additional @ Value::Object(_)) => {
                        for item in &items[positional.len()..] {
                            let mut item_result = ValidationResult::new();
                            validate(*item, additional, &mut item_result, collector);
                            result.merge_property_match(item_result);
                        }
                    }
                    Some(Value::Bool(false)) => {
                        result.problems.push(Diagnostic::warning(
                            range,
                            format!(
                                "Array has too many items according to schema. Expected {} or fewer.",
                                positional.len()
                            ),
                        ));
                    }
                    _ => {}
                }
            }
        }
        Some(uniform) => {
            for item in &items {
                let mut item_result = ValidationResult::new();
                validate(*item, uniform, &mut item_result, collector);
                result.merge_property_match(item_result);
            }
        }
        None => {}
    }

    if let Some(contains) = schema.get("contains") {
        if schema::normalize(contains).is_some() {
            // Probes use a no-op collector so that hover associations are
            // not polluted by items that merely failed the probe.
            let found = items.iter().any(|item| {
                let mut probe = ValidationResult::new();
                let mut no_op = Collector::no_op();
                validate(*item, contains, &mut probe, &mut no_op);
                !probe.has_problems()
            });
            if !found {
                result.problems.push(Diagnostic::warning(
                    range,
                    "Array does not contain required item.",
                ));
            }
        }
    }

    if let Some(min_items) = schema::get_usize(schema, "minItems") {
        if items.len() < min_items {
            result.problems.push(Diagnostic::warning(
                range,
                format!("Array has too few items. Expected {min_items} or more."),
            ));
        }
    }
    if let Some(max_items) = schema::get_usize(schema, "maxItems") {
        if items.len() > max_items {
            result.problems.push(Diagnostic::warning(
                range,
                format!("Array has too many items. Expected {max_items} or fewer."),
            ));
        }
    }

    if schema.get("uniqueItems") == Some(&Value::Bool(true)) {
        // Pairwise over projected values; arrays hitting this keyword are
        // expected to be small.
        let values: Vec<Value> = items.iter().map(Node::value).collect();
        let has_duplicates = values
            .iter()
            .enumerate()
            .any(|(index, value)| values[index + 1..].iter().any(|other| schema::equal(value, other)));
        if has_duplicates {
            result
                .problems
                .push(Diagnostic::warning(range, "Array has duplicate items."));
        }
    }
}
