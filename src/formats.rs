//! Checks backing the string `format` assertion.
use fancy_regex::Regex;
use fluent_uri::UriRef;
use once_cell::sync::Lazy;

// The ECMA-derived pattern of the original tooling: dotted or quoted local
// part, dotted-quad or DNS hostname domain.
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(([^<>()\[\]\\.,;:\s@"]+(\.[^<>()\[\]\\.,;:\s@"]+)*)|(".+"))@((\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(([a-zA-Z\-0-9]+\.)+[a-zA-Z]{2,}))$"#,
    )
    .expect("Is a valid regex")
});

static COLOR_HEX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#([0-9A-Fa-f]{3,4}|([0-9A-Fa-f]{2}){3,4})$").expect("Is a valid regex"));

/// Check a `uri` / `uri-reference` format value. Returns the failure detail,
/// or `None` when the value passes. Empty strings always fail.
pub(crate) fn check_uri(value: &str, require_scheme: bool) -> Option<&'static str> {
    if value.is_empty() {
        return Some("URI expected.");
    }
    match UriRef::parse(value) {
        Ok(uri) => {
            if require_scheme && uri.scheme().is_none() {
                Some("URI with a scheme is expected.")
            } else {
                None
            }
        }
        Err(_) => Some("URI is expected."),
    }
}

pub(crate) fn is_email(value: &str) -> bool {
    EMAIL_RE.is_match(value).unwrap_or(false)
}

pub(crate) fn is_color_hex(value: &str) -> bool {
    COLOR_HEX_RE.is_match(value).unwrap_or(false)
}
