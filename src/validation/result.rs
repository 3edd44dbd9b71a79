//! Per-subtree validation accumulator.
use std::cmp::Ordering;

use serde_json::Value;

use crate::diagnostics::{Diagnostic, ErrorCode};

/// Accumulates the outcome of validating one subtree against one schema.
///
/// Beyond the diagnostics themselves, the counters feed the best-match
/// scoring for `anyOf`/`oneOf`: branches are ranked by how much of the
/// subject they managed to account for, so the diagnostics surfaced to the
/// user come from the branch they most plausibly meant.
#[derive(Debug, Default)]
pub struct ValidationResult<'s> {
    /// Schema violations found in this subtree.
    pub problems: Vec<Diagnostic>,
    /// Object properties that were evaluated against some schema.
    pub properties_matches: usize,
    /// Properties whose value validated successfully.
    pub properties_value_matches: usize,
    /// Properties whose value matched a singleton `enum`/`const` — the
    /// branch "claimed" the object via its discriminator.
    pub primary_value_matches: usize,
    /// Whether the subject satisfied an `enum`/`const`.
    pub enum_value_match: bool,
    /// The accepted values when an `enum`/`const` was active, kept so sibling
    /// branches can merge their accepted sets into one message.
    pub enum_values: Option<Vec<&'s Value>>,
}

impl<'s> ValidationResult<'s> {
    pub(crate) fn new() -> ValidationResult<'s> {
        ValidationResult::default()
    }

    /// Whether any violation was recorded.
    #[must_use]
    pub fn has_problems(&self) -> bool {
        !self.problems.is_empty()
    }

    // Folds another result's diagnostics in. Counters are merged explicitly
    // by the call sites that need them.
    pub(crate) fn merge(&mut self, other: ValidationResult<'s>) {
        self.problems.extend(other.problems);
    }

    // Concatenates the accepted enum sets of two rejecting branches and
    // rewrites the retained mismatch messages to list the union, so the user
    // sees every value any branch would have accepted.
    pub(crate) fn merge_enum_values(&mut self, other: &ValidationResult<'s>) {
        if self.enum_value_match || other.enum_value_match {
            return;
        }
        let (Some(values), Some(other_values)) = (&mut self.enum_values, &other.enum_values)
        else {
            return;
        };
        values.extend(other_values.iter().copied());
        let listed = values
            .iter()
            .map(|value| value.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        for problem in &mut self.problems {
            if problem.code == Some(ErrorCode::EnumValueMismatch) {
                problem.message = format!("Value is not accepted. Valid values: {listed}.");
            }
        }
    }

    // Folds in the result of validating one property value, updating the
    // match counters the best-match scoring runs on.
    pub(crate) fn merge_property_match(&mut self, property: ValidationResult<'s>) {
        let clean = !property.has_problems();
        let enum_match = property.enum_value_match;
        let singleton_enum =
            enum_match && property.enum_values.as_ref().map_or(false, |v| v.len() == 1);
        self.merge(property);
        self.properties_matches += 1;
        if enum_match || clean {
            self.properties_value_matches += 1;
        }
        if singleton_enum {
            self.primary_value_matches += 1;
        }
    }

    // Lexicographic branch ordering: clean beats dirty, enum match beats
    // none, then the discriminator / value / attempt counters in turn.
    // `Greater` means `self` is the better branch.
    pub(crate) fn compare(&self, other: &ValidationResult<'_>) -> Ordering {
        let dirty = self.has_problems();
        if dirty != other.has_problems() {
            return if dirty { Ordering::Less } else { Ordering::Greater };
        }
        if self.enum_value_match != other.enum_value_match {
            return if other.enum_value_match {
                Ordering::Less
            } else {
                Ordering::Greater
            };
        }
        if self.primary_value_matches != other.primary_value_matches {
            return self.primary_value_matches.cmp(&other.primary_value_matches);
        }
        if self.properties_value_matches != other.properties_value_matches {
            return self
                .properties_value_matches
                .cmp(&other.properties_value_matches);
        }
        self.properties_matches.cmp(&other.properties_matches)
    }
}
