//! Object assertions and applicators.
use ahash::AHashMap;
use serde_json::{Map, Value};

use crate::ast::{Node, NodeKind};
use crate::diagnostics::{Diagnostic, Range};
use crate::schema;

use super::{validate, Collector, ValidationResult};

pub(super) fn validate_object<'a, 's>(
    node: Node<'a>,
    schema: &'s Map<String, Value>,
    result: &mut ValidationResult<'s>,
    collector: &mut Collector<'s>,
) {
    if !matches!(node.kind(), NodeKind::Object(_)) {
        return;
    }
    let properties = node.children();

    // One pass over the members: a name-to-value map plus the worklist of
    // names no applicator has claimed yet. A property that lost its value to
    // error recovery stays in the map with `None` so `required` still flags
    // it as missing.
    let mut seen_keys: AHashMap<&'a str, Option<Node<'a>>> = AHashMap::new();
    let mut unprocessed: Vec<&'a str> = Vec::new();
    for property in &properties {
        let Some(key) = property.property_key().and_then(|key| key.string_value()) else {
            continue;
        };
        seen_keys.insert(key, property.property_value());
        unprocessed.push(key);
    }

    if let Some(required) = schema::get_array(schema, "required") {
        for name in required.iter().filter_map(Value::as_str) {
            if seen_keys.get(name).map_or(true, Option::is_none) {
                // Pin to the enclosing property's key when the object is a
                // property value, otherwise to the opening brace.
                let location = node
                    .parent()
                    .filter(|parent| matches!(parent.kind(), NodeKind::Property { .. }))
                    .and_then(|parent| parent.property_key())
                    .map_or_else(
                        || Range::new(node.range().start, node.range().start + 1),
                        |key| key.range(),
                    );
                result.problems.push(Diagnostic::warning(
                    location,
                    format!("Missing property \"{name}\"."),
                ));
            }
        }
    }

    if let Some(property_schemas) = schema::get_object(schema, "properties") {
        for (name, sub) in property_schemas {
            unprocessed.retain(|key| *key != name.as_str());
            if let Some(Some(child)) = seen_keys.get(name.as_str()) {
                validate_member(*child, name, sub, result, collector);
            }
        }
    }

    if let Some(pattern_schemas) = schema::get_object(schema, "patternProperties") {
        for (pattern, sub) in pattern_schemas {
            let Some(regex) = schema::compile_pattern(pattern) else {
                continue;
            };
            // Snapshot so explicit `properties` entries and earlier pattern
            // matches are not counted twice.
            for name in unprocessed.clone() {
                if regex.is_match(name).unwrap_or(false) {
                    unprocessed.retain(|key| *key != name);
                    if let Some(Some(child)) = seen_keys.get(name) {
                        validate_member(*child, name, sub, result, collector);
                    }
                }
            }
        }
    }

    match schema.get("additionalProperties") {
        Some(additional @ Value::Object(_)) => {
            for name in &unprocessed {
                if let Some(Some(child)) = seen_keys.get(name) {
                    let mut member_result = ValidationResult::new();
                    validate(*child, additional, &mut member_result, collector);
                    result.merge_property_match(member_result);
                }
            }
        }
        Some(Value::Bool(false)) => {
            for name in &unprocessed {
                if let Some(Some(child)) = seen_keys.get(name) {
                    result.problems.push(Diagnostic::warning(
                        key_range(*child),
                        format!("Property {name} is not allowed."),
                    ));
                }
            }
        }
        _ => {}
    }

    if let Some(max_properties) = schema::get_usize(schema, "maxProperties") {
        if properties.len() > max_properties {
            result.problems.push(Diagnostic::warning(
                node.range(),
                format!("Object has more properties than limit of {max_properties}."),
            ));
        }
    }
    if let Some(min_properties) = schema::get_usize(schema, "minProperties") {
        if properties.len() < min_properties {
            result.problems.push(Diagnostic::warning(
                node.range(),
                format!("Object has fewer properties than the required number of {min_properties}"),
            ));
        }
    }

    if let Some(dependencies) = schema::get_object(schema, "dependencies") {
        for (trigger, dependency) in dependencies {
            if !matches!(seen_keys.get(trigger.as_str()), Some(Some(_))) {
                continue;
            }
            match dependency {
                Value::Array(names) => {
                    for name in names.iter().filter_map(Value::as_str) {
                        if seen_keys.get(name).map_or(true, Option::is_none) {
                            result.problems.push(Diagnostic::warning(
                                Range::new(node.range().start, node.range().start + 1),
                                format!(
                                    "Object is missing property {name} required by property {trigger}."
                                ),
                            ));
                        } else {
                            result.properties_value_matches += 1;
                        }
                    }
                }
                _ => {
                    if schema::normalize(dependency).is_some() {
                        // Schema dependency: the whole object re-validates.
                        let mut dependency_result = ValidationResult::new();
                        validate(node, dependency, &mut dependency_result, collector);
                        result.merge_property_match(dependency_result);
                    }
                }
            }
        }
    }

    if let Some(property_names) = schema.get("propertyNames") {
        if schema::normalize(property_names).is_some() {
            for property in &properties {
                if let Some(key) = property.property_key() {
                    let mut no_op = Collector::no_op();
                    validate(key, property_names, result, &mut no_op);
                }
            }
        }
    }
}

// Validates one claimed member. A literal `false` schema flags the key as
// not allowed; `true` counts the member as matched without descending.
fn validate_member<'a, 's>(
    child: Node<'a>,
    name: &str,
    sub: &'s Value,
    result: &mut ValidationResult<'s>,
    collector: &mut Collector<'s>,
) {
    match sub {
        Value::Bool(allowed) => {
            if *allowed {
                result.properties_matches += 1;
                result.properties_value_matches += 1;
            } else {
                result.problems.push(Diagnostic::warning(
                    key_range(child),
                    format!("Property {name} is not allowed."),
                ));
            }
        }
        _ => {
            let mut member_result = ValidationResult::new();
            validate(child, sub, &mut member_result, collector);
            result.merge_property_match(member_result);
        }
    }
}

// The key range of the property enclosing a value node; falls back to the
// value's own range if the tree is unexpectedly shaped.
fn key_range(child: Node<'_>) -> Range {
    child
        .parent()
        .and_then(|parent| parent.property_key())
        .map_or_else(|| child.range(), |key| key.range())
}
