//! Recovering recursive-descent parser.
//!
//! The parser never fails: every malformed construct produces a diagnostic
//! plus a recovery action (finalizing a partial node, skipping to a
//! synchronization token, or both), and the result is always the largest
//! well-formed tree the input supports.
use ahash::AHashMap;

use crate::ast::{Ast, NodeData, NodeId, NodeKind, PathSegment};
use crate::diagnostics::{Diagnostic, ErrorCode, Range, Severity};
use crate::document::Document;
use crate::scanner::{ScanError, Scanner, TokenKind};

/// Parser configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParseOptions {
    /// Record comment ranges on the resulting document.
    pub collect_comments: bool,
}

/// Parse `text` into a [`Document`]. Always returns; syntax problems are
/// reported through [`Document::syntax_errors`].
#[must_use]
pub fn parse(text: &str, options: &ParseOptions) -> Document {
    Parser::new(text, options).parse()
}

// Tracks how a repeated object key has been reported so far.
enum SeenKey {
    Once(Range),
    Flagged,
}

struct Parser<'a> {
    text: &'a str,
    scanner: Scanner<'a>,
    nodes: Vec<NodeData>,
    problems: Vec<Diagnostic>,
    last_problem_offset: Option<usize>,
    comments: Vec<Range>,
    collect_comments: bool,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str, options: &ParseOptions) -> Parser<'a> {
        Parser {
            text,
            scanner: Scanner::new(text),
            nodes: Vec::new(),
            problems: Vec::new(),
            last_problem_offset: None,
            comments: Vec::new(),
            collect_comments: options.collect_comments,
        }
    }

    fn parse(mut self) -> Document {
        self.scan_next();
        let root = if self.scanner.token() == TokenKind::Eof {
            None
        } else {
            match self.parse_value(None) {
                None => {
                    self.error(
                        "Expected a JSON object, array or literal.",
                        ErrorCode::Undefined,
                        None,
                        &[],
                        &[],
                    );
                    None
                }
                Some(root) => {
                    if self.scanner.token() != TokenKind::Eof {
                        self.error("End of file expected.", ErrorCode::Undefined, None, &[], &[]);
                    }
                    Some(root)
                }
            }
        };
        Document {
            ast: Ast {
                nodes: self.nodes,
                root,
            },
            syntax_errors: self.problems,
            comments: self.comments,
        }
    }

    // Pulls tokens until the next one the grammar cares about, folding scan
    // errors into diagnostics and collecting comments on the way.
    fn scan_next(&mut self) -> TokenKind {
        loop {
            let token = self.scanner.scan();
            self.check_scan_error();
            match token {
                TokenKind::LineComment | TokenKind::BlockComment => {
                    if self.collect_comments {
                        self.comments.push(Range::new(
                            self.scanner.token_offset(),
                            self.scanner.token_end(),
                        ));
                    }
                }
                TokenKind::Trivia | TokenKind::LineBreak => {}
                _ => return token,
            }
        }
    }

    fn check_scan_error(&mut self) {
        let (message, code) = match self.scanner.token_error() {
            ScanError::None => return,
            ScanError::InvalidUnicode => {
                ("Invalid unicode sequence in string.", ErrorCode::InvalidUnicode)
            }
            ScanError::InvalidEscapeCharacter => (
                "Invalid escape character in string.",
                ErrorCode::InvalidEscapeCharacter,
            ),
            ScanError::UnexpectedEndOfNumber => {
                ("Unexpected end of number.", ErrorCode::UnexpectedEndOfNumber)
            }
            ScanError::UnexpectedEndOfComment => {
                ("Unexpected end of comment.", ErrorCode::UnexpectedEndOfComment)
            }
            ScanError::UnexpectedEndOfString => {
                ("Unexpected end of string.", ErrorCode::UnexpectedEndOfString)
            }
            ScanError::InvalidCharacter => (
                "Invalid characters in string. Control characters must be escaped.",
                ErrorCode::InvalidCharacter,
            ),
        };
        self.error(message, code, None, &[], &[]);
    }

    fn error_at_range(
        &mut self,
        message: &str,
        code: ErrorCode,
        start: usize,
        end: usize,
        severity: Severity,
    ) {
        // Consecutive errors at one offset collapse into the first.
        if self.problems.is_empty() || self.last_problem_offset != Some(start) {
            self.problems.push(Diagnostic::new(
                Range::new(start, end),
                severity,
                Some(code),
                message,
            ));
            self.last_problem_offset = Some(start);
        }
    }

    // Emits a diagnostic at the current token, optionally finalizes a partial
    // node, then skips tokens until just after one in `skip_until_after` or
    // up to one in `skip_until`, whichever fires first. EOF always stops the
    // skip.
    fn error(
        &mut self,
        message: &str,
        code: ErrorCode,
        node: Option<NodeId>,
        skip_until_after: &[TokenKind],
        skip_until: &[TokenKind],
    ) -> Option<NodeId> {
        let mut start = self.scanner.token_offset();
        let mut end = self.scanner.token_end();
        if start == end && start > 0 {
            // Zero-width token (EOF or synthesized): back up so the squiggle
            // lands on the previous visible character.
            let visible = self.text[..start].trim_end_matches(char::is_whitespace);
            match visible.chars().last() {
                Some(last) => {
                    start = visible.len() - last.len_utf8();
                    end = visible.len();
                }
                None => {
                    start = 0;
                    end = self.text.chars().next().map_or(0, char::len_utf8);
                }
            }
        }
        self.error_at_range(message, code, start, end, Severity::Error);

        if let Some(node) = node {
            self.finalize(node, false);
        }
        if !skip_until_after.is_empty() || !skip_until.is_empty() {
            let mut token = self.scanner.token();
            while token != TokenKind::Eof {
                if skip_until_after.contains(&token) {
                    self.scan_next();
                    break;
                }
                if skip_until.contains(&token) {
                    break;
                }
                token = self.scan_next();
            }
        }
        node
    }

    fn start_node(&mut self, kind: NodeKind, parent: Option<NodeId>, start: usize) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            range: Range::new(start, start),
            parent,
            location: None,
        });
        id
    }

    // Closes the node at the end of the current token.
    fn finalize(&mut self, id: NodeId, scan_next: bool) -> NodeId {
        self.nodes[id.index()].range.end = self.scanner.token_end();
        if scan_next {
            self.scan_next();
        }
        id
    }

    fn parse_value(&mut self, parent: Option<NodeId>) -> Option<NodeId> {
        self.parse_array(parent)
            .or_else(|| self.parse_object(parent))
            .or_else(|| self.parse_string(parent, false))
            .or_else(|| self.parse_number(parent))
            .or_else(|| self.parse_literal(parent))
    }

    fn parse_literal(&mut self, parent: Option<NodeId>) -> Option<NodeId> {
        let kind = match self.scanner.token() {
            TokenKind::True => NodeKind::Boolean(true),
            TokenKind::False => NodeKind::Boolean(false),
            TokenKind::Null => NodeKind::Null,
            _ => return None,
        };
        let id = self.start_node(kind, parent, self.scanner.token_offset());
        Some(self.finalize(id, true))
    }

    fn parse_string(&mut self, parent: Option<NodeId>, key: bool) -> Option<NodeId> {
        if self.scanner.token() != TokenKind::String {
            return None;
        }
        let id = self.start_node(
            NodeKind::String {
                value: self.scanner.token_value().to_string(),
                key,
            },
            parent,
            self.scanner.token_offset(),
        );
        Some(self.finalize(id, true))
    }

    fn parse_number(&mut self, parent: Option<NodeId>) -> Option<NodeId> {
        if self.scanner.token() != TokenKind::Number {
            return None;
        }
        let id = self.start_node(
            NodeKind::Number {
                value: f64::NAN,
                integer: true,
            },
            parent,
            self.scanner.token_offset(),
        );
        if self.scanner.token_error() == ScanError::None {
            // The scanner validated the grammar; re-parse strictly to get the
            // value and catch overflow to infinity.
            let literal = self.scanner.token_value().to_string();
            match literal.parse::<f64>() {
                Ok(value) if value.is_finite() => {
                    if let NodeKind::Number { value: slot, .. } = &mut self.nodes[id.index()].kind {
                        *slot = value;
                    }
                }
                _ => {
                    self.error("Invalid number format.", ErrorCode::Undefined, None, &[], &[]);
                }
            }
            if let NodeKind::Number { integer, .. } = &mut self.nodes[id.index()].kind {
                *integer = !literal.contains('.');
            }
        }
        Some(self.finalize(id, true))
    }

    fn parse_array(&mut self, parent: Option<NodeId>) -> Option<NodeId> {
        if self.scanner.token() != TokenKind::OpenBracket {
            return None;
        }
        let node = self.start_node(NodeKind::Array(Vec::new()), parent, self.scanner.token_offset());
        self.scan_next();

        let mut needs_comma = false;
        while !matches!(self.scanner.token(), TokenKind::CloseBracket | TokenKind::Eof) {
            if self.scanner.token() == TokenKind::Comma {
                if !needs_comma {
                    self.error("Value expected", ErrorCode::ValueExpected, None, &[], &[]);
                }
                let comma_offset = self.scanner.token_offset();
                self.scan_next();
                if self.scanner.token() == TokenKind::CloseBracket {
                    if needs_comma {
                        self.error_at_range(
                            "Trailing comma",
                            ErrorCode::TrailingComma,
                            comma_offset,
                            comma_offset + 1,
                            Severity::Error,
                        );
                    }
                    continue;
                }
            } else if needs_comma {
                self.error("Expected comma", ErrorCode::CommaExpected, None, &[], &[]);
            }
            match self.parse_value(Some(node)) {
                None => {
                    self.error(
                        "Value expected",
                        ErrorCode::ValueExpected,
                        None,
                        &[],
                        &[TokenKind::CloseBracket, TokenKind::Comma],
                    );
                }
                Some(item) => {
                    let index = match &self.nodes[node.index()].kind {
                        NodeKind::Array(items) => items.len(),
                        _ => unreachable!(),
                    };
                    self.nodes[item.index()].location = Some(PathSegment::Index(index));
                    if let NodeKind::Array(items) = &mut self.nodes[node.index()].kind {
                        items.push(item);
                    }
                }
            }
            needs_comma = true;
        }

        if self.scanner.token() != TokenKind::CloseBracket {
            return self.error(
                "Expected comma or closing bracket",
                ErrorCode::CommaOrCloseBracketExpected,
                Some(node),
                &[],
                &[],
            );
        }
        Some(self.finalize(node, true))
    }

    fn parse_object(&mut self, parent: Option<NodeId>) -> Option<NodeId> {
        if self.scanner.token() != TokenKind::OpenBrace {
            return None;
        }
        let node = self.start_node(NodeKind::Object(Vec::new()), parent, self.scanner.token_offset());
        let mut keys_seen: AHashMap<String, SeenKey> = AHashMap::new();
        self.scan_next();

        let mut needs_comma = false;
        while !matches!(self.scanner.token(), TokenKind::CloseBrace | TokenKind::Eof) {
            if self.scanner.token() == TokenKind::Comma {
                if !needs_comma {
                    self.error("Property expected", ErrorCode::PropertyExpected, None, &[], &[]);
                }
                let comma_offset = self.scanner.token_offset();
                self.scan_next();
                if self.scanner.token() == TokenKind::CloseBrace {
                    if needs_comma {
                        self.error_at_range(
                            "Trailing comma",
                            ErrorCode::TrailingComma,
                            comma_offset,
                            comma_offset + 1,
                            Severity::Error,
                        );
                    }
                    continue;
                }
            } else if needs_comma {
                self.error("Expected comma", ErrorCode::CommaExpected, None, &[], &[]);
            }
            match self.parse_property(node, &mut keys_seen) {
                None => {
                    self.error(
                        "Property expected",
                        ErrorCode::PropertyExpected,
                        None,
                        &[],
                        &[TokenKind::CloseBrace, TokenKind::Comma],
                    );
                }
                Some(property) => {
                    if let NodeKind::Object(properties) = &mut self.nodes[node.index()].kind {
                        properties.push(property);
                    }
                }
            }
            needs_comma = true;
        }

        if self.scanner.token() != TokenKind::CloseBrace {
            return self.error(
                "Expected comma or closing brace",
                ErrorCode::CommaOrCloseBraceExpected,
                Some(node),
                &[],
                &[],
            );
        }
        Some(self.finalize(node, true))
    }

    fn parse_property(
        &mut self,
        parent: NodeId,
        keys_seen: &mut AHashMap<String, SeenKey>,
    ) -> Option<NodeId> {
        let start = self.scanner.token_offset();
        let key = match self.parse_string(None, true) {
            Some(key) => key,
            None => {
                if self.scanner.token() != TokenKind::Unknown {
                    return None;
                }
                // Unquoted key: manufacture a string node from the raw token
                // so the rest of the property still parses.
                self.error(
                    "Property keys must be doublequoted",
                    ErrorCode::Undefined,
                    None,
                    &[],
                    &[],
                );
                let key = self.start_node(
                    NodeKind::String {
                        value: self.scanner.token_value().to_string(),
                        key: true,
                    },
                    None,
                    self.scanner.token_offset(),
                );
                self.finalize(key, false);
                self.scan_next();
                key
            }
        };
        let key_range = self.nodes[key.index()].range;
        let key_value = match &self.nodes[key.index()].kind {
            NodeKind::String { value, .. } => value.clone(),
            _ => unreachable!(),
        };

        let property = self.start_node(
            NodeKind::Property {
                key,
                value: None,
                colon_offset: None,
            },
            Some(parent),
            start,
        );
        self.nodes[property.index()].range.end = key_range.end;
        self.nodes[property.index()].location = Some(PathSegment::Property(key_value.clone()));
        self.nodes[key.index()].parent = Some(property);

        match keys_seen.get(&key_value) {
            Some(SeenKey::Once(first_range)) => {
                let first_range = *first_range;
                self.error_at_range(
                    "Duplicate object key",
                    ErrorCode::Undefined,
                    key_range.start,
                    key_range.end,
                    Severity::Warning,
                );
                self.error_at_range(
                    "Duplicate object key",
                    ErrorCode::Undefined,
                    first_range.start,
                    first_range.end,
                    Severity::Warning,
                );
                // Further repeats only flag themselves.
                keys_seen.insert(key_value, SeenKey::Flagged);
            }
            Some(SeenKey::Flagged) => {
                self.error_at_range(
                    "Duplicate object key",
                    ErrorCode::Undefined,
                    key_range.start,
                    key_range.end,
                    Severity::Warning,
                );
            }
            None => {
                keys_seen.insert(key_value, SeenKey::Once(key_range));
            }
        }

        if self.scanner.token() == TokenKind::Colon {
            let colon = self.scanner.token_offset();
            if let NodeKind::Property { colon_offset, .. } = &mut self.nodes[property.index()].kind
            {
                *colon_offset = Some(colon);
            }
            self.scan_next();
        } else {
            self.error("Colon expected", ErrorCode::ColonExpected, None, &[], &[]);
            if self.scanner.token() == TokenKind::String
                && self.has_line_break_between(key_range.end, self.scanner.token_offset())
            {
                // The key of the next property; end this one at its own key.
                return Some(property);
            }
        }

        match self.parse_value(Some(property)) {
            None => {
                // The property keeps its key's end so that `end == key.end`
                // holds whenever the value is absent.
                self.error(
                    "Value expected",
                    ErrorCode::ValueExpected,
                    None,
                    &[],
                    &[TokenKind::CloseBrace, TokenKind::Comma],
                );
                Some(property)
            }
            Some(value) => {
                let value_end = self.nodes[value.index()].range.end;
                self.nodes[property.index()].range.end = value_end;
                if let NodeKind::Property { value: slot, .. } =
                    &mut self.nodes[property.index()].kind
                {
                    *slot = Some(value);
                }
                Some(property)
            }
        }
    }

    fn has_line_break_between(&self, from: usize, to: usize) -> bool {
        from <= to
            && self.text[from..to]
                .bytes()
                .any(|byte| byte == b'\n' || byte == b'\r')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;
    use serde_json::json;

    fn parse_default(text: &str) -> Document {
        parse(text, &ParseOptions::default())
    }

    fn codes(document: &Document) -> Vec<ErrorCode> {
        document
            .syntax_errors
            .iter()
            .filter_map(|problem| problem.code)
            .collect()
    }

    #[test]
    fn empty_input_has_no_root() {
        let document = parse_default("");
        assert!(document.ast.root().is_none());
        assert!(document.syntax_errors.is_empty());

        let document = parse_default("  \n\t");
        assert!(document.ast.root().is_none());
        assert!(document.syntax_errors.is_empty());
    }

    #[test]
    fn valid_document_roundtrips() {
        let document = parse_default(r#"{"a": [1, true, null], "b": "x"}"#);
        assert!(document.syntax_errors.is_empty());
        assert_eq!(
            document.ast.root().unwrap().value(),
            json!({"a": [1, true, null], "b": "x"})
        );
    }

    #[test]
    fn trailing_comma_in_object() {
        let text = r#"{"a": 1,}"#;
        let document = parse_default(text);
        assert_eq!(codes(&document), vec![ErrorCode::TrailingComma]);
        let comma = text.find(',').unwrap();
        assert_eq!(document.syntax_errors[0].range, Range::new(comma, comma + 1));
        assert_eq!(document.ast.root().unwrap().value(), json!({"a": 1}));
    }

    #[test]
    fn trailing_comma_in_array() {
        let document = parse_default("[1, 2,]");
        assert_eq!(codes(&document), vec![ErrorCode::TrailingComma]);
        assert_eq!(document.ast.root().unwrap().value(), json!([1, 2]));
    }

    #[test]
    fn missing_comma_recovers() {
        let document = parse_default(r#"{"a":1 "b":2}"#);
        assert_eq!(codes(&document), vec![ErrorCode::CommaExpected]);
        assert_eq!(document.ast.root().unwrap().value(), json!({"a": 1, "b": 2}));
    }

    #[test]
    fn missing_value_in_object() {
        let document = parse_default(r#"{"a":}"#);
        assert_eq!(codes(&document), vec![ErrorCode::ValueExpected]);
        let root = document.ast.root().unwrap();
        let NodeKind::Object(properties) = root.kind() else {
            panic!("expected object");
        };
        assert_eq!(properties.len(), 1);
        let property = document.ast.node(properties[0]);
        assert!(matches!(
            property.kind(),
            NodeKind::Property { value: None, .. }
        ));
    }

    #[test]
    fn missing_value_in_array() {
        let document = parse_default("[1,,2]");
        assert_eq!(codes(&document), vec![ErrorCode::ValueExpected]);
        assert_eq!(document.ast.root().unwrap().value(), json!([1, 2]));
    }

    #[test]
    fn unclosed_array() {
        let document = parse_default("[1, 2");
        assert_eq!(codes(&document), vec![ErrorCode::CommaOrCloseBracketExpected]);
        assert_eq!(document.ast.root().unwrap().value(), json!([1, 2]));
    }

    #[test]
    fn unclosed_object_squiggle_backs_up() {
        let text = r#"{"a": 1  "#;
        let document = parse_default(text);
        assert_eq!(codes(&document), vec![ErrorCode::CommaOrCloseBraceExpected]);
        // EOF is zero-width; the diagnostic lands on the last visible char.
        let one = text.find('1').unwrap();
        assert_eq!(document.syntax_errors[0].range, Range::new(one, one + 1));
    }

    #[test]
    fn unquoted_key_is_synthesized() {
        let document = parse_default("{a: 1}");
        assert_eq!(codes(&document), vec![ErrorCode::Undefined]);
        assert_eq!(
            document.syntax_errors[0].message,
            "Property keys must be doublequoted"
        );
        assert_eq!(document.ast.root().unwrap().value(), json!({"a": 1}));
    }

    #[test]
    fn missing_colon_same_line_still_parses_value() {
        let document = parse_default(r#"{"a" 1}"#);
        assert_eq!(codes(&document), vec![ErrorCode::ColonExpected]);
        assert_eq!(document.ast.root().unwrap().value(), json!({"a": 1}));
    }

    #[test]
    fn missing_colon_next_line_starts_new_property() {
        let document = parse_default("{\"a\"\n\"b\": 2}");
        assert!(codes(&document).contains(&ErrorCode::ColonExpected));
        let root = document.ast.root().unwrap();
        let NodeKind::Object(properties) = root.kind() else {
            panic!("expected object");
        };
        assert_eq!(properties.len(), 2);
        // The orphaned property ends at its key.
        let orphan = document.ast.node(properties[0]);
        assert_eq!(orphan.range(), Range::new(1, 4));
        assert!(matches!(orphan.kind(), NodeKind::Property { value: None, .. }));
    }

    #[test]
    fn duplicate_keys_flag_both_then_later_only() {
        let document = parse_default(r#"{"a":1,"a":2,"a":3}"#);
        let warnings: Vec<_> = document
            .syntax_errors
            .iter()
            .filter(|problem| problem.severity == Severity::Warning)
            .collect();
        // Second occurrence flags itself and the first; the third only
        // flags itself.
        assert_eq!(warnings.len(), 3);
        assert_eq!(warnings[0].range, Range::new(7, 10));
        assert_eq!(warnings[1].range, Range::new(1, 4));
        assert_eq!(warnings[2].range, Range::new(13, 16));
    }

    #[test]
    fn consecutive_errors_at_one_offset_collapse() {
        let document = parse_default("{,}");
        let at_comma: Vec<_> = document
            .syntax_errors
            .iter()
            .filter(|problem| problem.range.start == 1)
            .collect();
        assert_eq!(at_comma.len(), 1);
    }

    #[test]
    fn scan_errors_become_diagnostics() {
        let document = parse_default(r#"{"a": "unterminated"#);
        assert!(codes(&document).contains(&ErrorCode::UnexpectedEndOfString));
    }

    #[test]
    fn malformed_number_keeps_node() {
        let document = parse_default("[1.]");
        assert!(codes(&document).contains(&ErrorCode::UnexpectedEndOfNumber));
        let root = document.ast.root().unwrap();
        let NodeKind::Array(items) = root.kind() else {
            panic!("expected array");
        };
        assert_eq!(items.len(), 1);
        assert!(matches!(
            document.ast.node(items[0]).kind(),
            NodeKind::Number { value, .. } if value.is_nan()
        ));
    }

    #[test]
    fn comments_are_collected_on_request() {
        let text = "// header\n{\"a\": /* inline */ 1}";
        let document = parse_default(text);
        assert!(document.comments.is_empty());

        let document = parse(
            text,
            &ParseOptions {
                collect_comments: true,
            },
        );
        assert_eq!(document.comments.len(), 2);
        assert_eq!(document.comments[0], Range::new(0, 9));
        assert!(document.syntax_errors.is_empty());
        assert_eq!(document.ast.root().unwrap().value(), json!({"a": 1}));
    }

    #[test]
    fn garbage_never_panics() {
        for text in [
            "}", "]", ":", ",", "{{{{", "[[[", "{\"a\"", "tru", "\"\\u12", "{]", "[}", "-",
            "{\"a\": [}", "%%%", "{:1}", "[,]",
        ] {
            let document = parse_default(text);
            if let Some(root) = document.ast.root() {
                root.visit(&mut |node| {
                    assert!(node.range().start <= node.range().end);
                    true
                });
            }
        }
    }

    #[test]
    fn property_end_matches_value_end() {
        let text = r#"{"key": [1, 2]}"#;
        let document = parse_default(text);
        let root = document.ast.root().unwrap();
        let NodeKind::Object(properties) = root.kind() else {
            panic!("expected object");
        };
        let property = document.ast.node(properties[0]);
        let NodeKind::Property {
            value: Some(value),
            colon_offset,
            ..
        } = property.kind()
        else {
            panic!("expected property with value");
        };
        assert_eq!(
            property.range().end,
            document.ast.node(*value).range().end
        );
        assert_eq!(*colon_offset, Some(text.find(':').unwrap()));
    }
}
