//! String assertions.
use serde_json::{Map, Value};

use crate::ast::{Node, NodeKind};
use crate::diagnostics::Diagnostic;
use crate::{formats, schema};

use super::{override_message, ValidationResult};

// Lengths count Unicode code points, not UTF-16 units or bytes.
pub(super) fn validate_string(
    node: Node<'_>,
    schema: &Map<String, Value>,
    result: &mut ValidationResult<'_>,
) {
    let NodeKind::String { value, .. } = node.kind() else {
        return;
    };
    let range = node.range();

    if let Some(min_length) = schema::get_usize(schema, "minLength") {
        if value.chars().count() < min_length {
            result.problems.push(Diagnostic::warning(
                range,
                format!("String is shorter than the minimum length of {min_length}."),
            ));
        }
    }
    if let Some(max_length) = schema::get_usize(schema, "maxLength") {
        if value.chars().count() > max_length {
            result.problems.push(Diagnostic::warning(
                range,
                format!("String is longer than the maximum length of {max_length}."),
            ));
        }
    }

    if let Some(pattern) = schema::get_str(schema, "pattern") {
        if let Some(regex) = schema::compile_pattern(pattern) {
            if !regex.is_match(value).unwrap_or(false) {
                let message = override_message(schema).map_or_else(
                    || format!("String does not match the pattern of \"{pattern}\"."),
                    str::to_string,
                );
                result.problems.push(Diagnostic::warning(range, message));
            }
        }
    }

    if let Some(format) = schema::get_str(schema, "format") {
        match format {
            "uri" | "uri-reference" => {
                if let Some(detail) = formats::check_uri(value, format == "uri") {
                    result.problems.push(Diagnostic::warning(
                        range,
                        format!("String is not a URI: {detail}"),
                    ));
                }
            }
            "email" => {
                if !formats::is_email(value) {
                    let message = override_message(schema)
                        .map_or_else(|| "String is not an e-mail address.".to_string(), str::to_string);
                    result.problems.push(Diagnostic::warning(range, message));
                }
            }
            "color-hex" => {
                if !formats::is_color_hex(value) {
                    let message = override_message(schema).map_or_else(
                        || "Invalid color format. Use #RGB, #RGBA, #RRGGBB or #RRGGBBAA.".to_string(),
                        str::to_string,
                    );
                    result.problems.push(Diagnostic::warning(range, message));
                }
            }
            _ => {}
        }
    }
}
