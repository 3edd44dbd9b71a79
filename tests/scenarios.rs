//! End-to-end scenarios: parse, validate, query.
use jsondoc::{parse, ErrorCode, NodeKind, ParseOptions, PathSegment, Severity};
use serde_json::{json, Value};
use test_case::test_case;

fn parse_default(text: &str) -> jsondoc::Document {
    parse(text, &ParseOptions::default())
}

#[test]
fn clean_object_with_focused_schema_query() {
    let text = r#"{"a":1,"b":2}"#;
    let schema = json!({
        "type": "object",
        "properties": {"a": {"type": "number"}, "b": {"type": "number"}},
        "required": ["a"]
    });
    let document = parse_default(text);
    assert!(document.syntax_errors.is_empty());
    assert!(document.validate(&schema).is_empty());

    // Inside the value of "a": the outer schema and the number schema apply.
    let matches = document.matching_schemas(&schema, Some(5), None);
    assert_eq!(matches.len(), 2);
    let schemas: Vec<&Value> = matches.iter().map(|m| m.schema).collect();
    assert!(schemas.contains(&&schema));
    assert!(schemas.contains(&&schema["properties"]["a"]));
}

#[test]
fn trailing_comma_keeps_the_tree() {
    let text = r#"{"a": 1,}"#;
    let document = parse_default(text);
    assert_eq!(document.syntax_errors.len(), 1);
    let problem = &document.syntax_errors[0];
    assert_eq!(problem.code, Some(ErrorCode::TrailingComma));
    assert_eq!(problem.range.start, text.find(',').unwrap());
    let root = document.root().unwrap();
    let NodeKind::Object(properties) = root.kind() else {
        panic!("expected object root");
    };
    assert_eq!(properties.len(), 1);
}

#[test]
fn array_warnings_land_on_the_array() {
    let text = "[1,2,2,3]";
    let schema = json!({
        "type": "array",
        "items": {"type": "integer"},
        "uniqueItems": true,
        "maxItems": 3
    });
    let document = parse_default(text);
    let problems = document.validate(&schema);
    assert_eq!(problems.len(), 2);
    let messages: Vec<&str> = problems.iter().map(|p| p.message.as_str()).collect();
    assert!(messages.contains(&"Array has duplicate items."));
    assert!(messages.contains(&"Array has too many items. Expected 3 or fewer."));
    for problem in &problems {
        assert_eq!(problem.severity, Severity::Warning);
        assert_eq!((problem.range.start, problem.range.end), (0, text.len()));
    }
}

#[test]
fn email_format_warning() {
    let document = parse_default(r#""2020-01-01""#);
    let problems = document.validate(&json!({"type": "string", "format": "email"}));
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].message, "String is not an e-mail address.");
}

#[test]
fn discriminated_one_of_picks_the_claimed_branch() {
    let text = r#"{"kind":"A","x":1}"#;
    let schema = json!({
        "oneOf": [
            {"properties": {"kind": {"const": "A"}, "x": {"type": "integer"}}},
            {"properties": {"kind": {"const": "B"}, "x": {"type": "string"}}}
        ]
    });
    let document = parse_default(text);
    assert!(document.syntax_errors.is_empty());
    assert!(document.validate(&schema).is_empty());

    let matches = document.matching_schemas(&schema, None, None);
    let branch_a = &schema["oneOf"][0];
    let branch_b = &schema["oneOf"][1];
    assert!(matches.iter().any(|m| std::ptr::eq(m.schema, branch_a)));
    assert!(!matches.iter().any(|m| std::ptr::eq(m.schema, branch_b)));
}

#[test]
fn missing_comma_still_yields_both_properties() {
    let document = parse_default(r#"{"a":1 "b":2}"#);
    let codes: Vec<_> = document
        .syntax_errors
        .iter()
        .filter_map(|p| p.code)
        .collect();
    assert_eq!(codes, vec![ErrorCode::CommaExpected]);
    let root = document.root().unwrap();
    let NodeKind::Object(properties) = root.kind() else {
        panic!("expected object root");
    };
    assert_eq!(properties.len(), 2);
}

#[test]
fn any_of_with_accept_all_branch_produces_no_diagnostics() {
    for subject in ["1", "\"s\"", "{}", "[]", "null"] {
        let document = parse_default(subject);
        let schema = json!({"anyOf": [{"type": "object", "required": ["x"]}, true]});
        assert!(document.validate(&schema).is_empty(), "subject: {subject}");
    }
}

#[test]
fn ambiguous_one_of_warns_exactly_once() {
    let document = parse_default("3");
    let schema = json!({"oneOf": [{"type": "integer"}, {"type": "number"}]});
    let problems = document.validate(&schema);
    assert_eq!(problems.len(), 1);
    assert_eq!(
        problems[0].message,
        "Matches multiple schemas when only one must validate."
    );
}

#[test]
fn rejecting_any_of_branches_surface_their_enum_union() {
    let document = parse_default("\"z\"");
    let schema = json!({"anyOf": [{"enum": ["a"]}, {"enum": ["b"]}, {"enum": ["c"]}]});
    let problems = document.validate(&schema);
    assert_eq!(problems.len(), 1);
    assert_eq!(
        problems[0].message,
        "Value is not accepted. Valid values: \"a\", \"b\", \"c\"."
    );
}

#[test_case(r#"{"a": 1, "b": [true, null, "s"]}"#)]
#[test_case("[[], {}, [{}], {\"x\": []}]")]
#[test_case("\"plain\"")]
#[test_case("-12.75")]
#[test_case("null")]
fn projection_agrees_with_serde(text: &str) {
    let document = parse_default(text);
    assert!(document.syntax_errors.is_empty());
    let projected = document.root().unwrap().value();
    let reference: Value = serde_json::from_str(text).unwrap();
    assert_eq!(projected, reference);
}

// Structural invariants hold on every tree the parser can produce, including
// recovered ones.
#[test_case(r#"{"a": 1, "b": 2}"#; "well formed")]
#[test_case(r#"{"a": 1,}"#; "trailing comma")]
#[test_case(r#"{"a":1 "b":2}"#; "missing comma")]
#[test_case(r#"{"a":}"#; "missing value")]
#[test_case("{\"a\"\n\"b\": 1}"; "missing colon")]
#[test_case("[1,,2]"; "array hole")]
#[test_case("[1, {\"x\": [true,"; "truncated")]
#[test_case("{a: 1, b: }"; "unquoted keys")]
#[test_case("[}"; "mismatched brackets")]
fn recovered_trees_are_well_formed(text: &str) {
    let document = parse_default(text);
    let Some(root) = document.root() else {
        return;
    };
    root.visit(&mut |node| {
        let range = node.range();
        assert!(range.start <= range.end);
        if let Some(parent) = node.parent() {
            assert!(parent.range().start <= range.start && range.end <= parent.range().end);
        }
        // Sibling order and disjointness.
        let children = node.children();
        for pair in children.windows(2) {
            assert!(pair[0].range().end <= pair[1].range().start);
        }
        // Location invariants.
        match node.kind() {
            NodeKind::Array(_) => {
                for (index, item) in children.iter().enumerate() {
                    assert_eq!(item.location(), Some(&PathSegment::Index(index)));
                }
            }
            NodeKind::Property { value, .. } => {
                let key = node.property_key().expect("property has a key");
                assert!(matches!(key.kind(), NodeKind::String { key: true, .. }));
                assert_eq!(
                    node.location(),
                    Some(&PathSegment::Property(key.string_value().unwrap().to_string()))
                );
                match value {
                    Some(_) => assert_eq!(
                        node.range().end,
                        node.property_value().unwrap().range().end
                    ),
                    None => assert_eq!(node.range().end, key.range().end),
                }
            }
            _ => {}
        }
        true
    });
}

#[test]
fn node_at_offset_returns_the_deepest_containing_node() {
    let text = r#"{"a": [10, {"b": null}], "c": "str"}"#;
    let document = parse_default(text);
    let root = document.root().unwrap();
    for offset in root.range().start..root.range().end {
        let node = document
            .node_at_offset(offset, false)
            .expect("offset inside root");
        assert!(node.range().contains(offset, false));
        for child in node.children() {
            assert!(!child.range().contains(offset, false));
        }
    }
}

#[test]
fn validation_never_panics_and_is_idempotent() {
    let schema = json!({
        "type": "object",
        "properties": {"a": {"enum": [1, 2]}},
        "patternProperties": {"^x-": {"type": "string"}},
        "additionalProperties": false,
        "dependencies": {"a": ["dep"]},
        "propertyNames": {"maxLength": 10}
    });
    for text in [
        "", "{", r#"{"a":}"#, r#"{"a": 3, "x-1": 2, "other": null}"#, "[1,2", "tru", "%%",
    ] {
        let document = parse_default(text);
        let first = document.validate(&schema);
        let second = document.validate(&schema);
        assert_eq!(first, second, "text: {text}");
    }
}

#[test]
fn comments_only_collected_when_asked() {
    let text = "/* a */ {\"x\": 1} // b";
    let with = parse(text, &ParseOptions { collect_comments: true });
    assert_eq!(with.comments.len(), 2);
    let without = parse_default(text);
    assert!(without.comments.is_empty());
}

#[test]
fn schemas_reachable_through_not_are_inverted() {
    let text = "5";
    let schema = json!({"not": {"type": "string"}});
    let document = parse_default(text);
    let matches = document.matching_schemas(&schema, None, None);
    let inverted: Vec<_> = matches.iter().filter(|m| m.inverted).collect();
    assert_eq!(inverted.len(), 1);
}
