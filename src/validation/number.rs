//! Numeric assertions.
use serde_json::{Map, Value};

use crate::ast::{Node, NodeKind};
use crate::diagnostics::Diagnostic;
use crate::schema;

use super::ValidationResult;

// Resolves the draft-04 and draft-06+ spellings of exclusive bounds: a
// boolean `true` turns the plain bound exclusive (and suppresses the
// inclusive check), a number is an independent exclusive bound.
fn exclusive_bound(bound: Option<f64>, exclusive: Option<&Value>) -> Option<f64> {
    match exclusive {
        Some(Value::Number(limit)) => limit.as_f64(),
        Some(Value::Bool(true)) => bound,
        _ => None,
    }
}

fn inclusive_bound(bound: Option<f64>, exclusive: Option<&Value>) -> Option<f64> {
    match exclusive {
        Some(Value::Bool(true)) => None,
        _ => bound,
    }
}

pub(super) fn validate_number(
    node: Node<'_>,
    schema: &Map<String, Value>,
    result: &mut ValidationResult<'_>,
) {
    let NodeKind::Number { value, .. } = node.kind() else {
        return;
    };
    let value = *value;
    let range = node.range();

    // f64 remainder semantics; fractional divisors are best-effort.
    if let Some(divisor) = schema::get_f64(schema, "multipleOf") {
        if value % divisor != 0.0 {
            result.problems.push(Diagnostic::warning(
                range,
                format!("Value is not divisible by {divisor}."),
            ));
        }
    }

    let minimum = schema::get_f64(schema, "minimum");
    let exclusive_minimum = schema.get("exclusiveMinimum");
    if let Some(bound) = exclusive_bound(minimum, exclusive_minimum) {
        if value <= bound {
            result.problems.push(Diagnostic::warning(
                range,
                format!("Value is below the exclusive minimum of {bound}."),
            ));
        }
    }
    if let Some(bound) = inclusive_bound(minimum, exclusive_minimum) {
        if value < bound {
            result.problems.push(Diagnostic::warning(
                range,
                format!("Value is below the minimum of {bound}."),
            ));
        }
    }

    let maximum = schema::get_f64(schema, "maximum");
    let exclusive_maximum = schema.get("exclusiveMaximum");
    if let Some(bound) = exclusive_bound(maximum, exclusive_maximum) {
        if value >= bound {
            result.problems.push(Diagnostic::warning(
                range,
                format!("Value is above the exclusive maximum of {bound}."),
            ));
        }
    }
    if let Some(bound) = inclusive_bound(maximum, exclusive_maximum) {
        if value > bound {
            result.problems.push(Diagnostic::warning(
                range,
                format!("Value is above the maximum of {bound}."),
            ));
        }
    }
}
