//! # Size Calculator
//!
//! Turns an input selection into a System Size Number and a System Size
//! Category.
//!
//! - [`selection_weights`] resolves each selected option label to its weight
//! - [`system_size_number`] sums the weights, rejecting placeholder (0) entries
//! - [`classify`] walks the ordered threshold rules and returns the first match

use crate::error::{DetectError, ExprError, Result};
use crate::expr::{self, Expr, Scope};
use crate::model::{DetectModel, Selection, SizeRuleDef};
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::debug;

/// Weight carried by the "TBD" option of every input.
pub const PLACEHOLDER_WEIGHT: i64 = 0;

// =============================================================================
// SIZE CATEGORY
// =============================================================================

/// One label of the ordered size scale.
///
/// Ordering follows the declaration order of the scale, so `Small < Medium`
/// when the scale is declared smallest first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SizeCategory {
    rank: usize,
    name: String,
}

impl SizeCategory {
    /// The category label.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position in the scale (0 = smallest).
    #[must_use]
    pub fn rank(&self) -> usize {
        self.rank
    }
}

impl fmt::Display for SizeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Serialize for SizeCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

/// The ordered set of size categories defined by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeScale {
    labels: Vec<String>,
}

impl SizeScale {
    /// Build a scale from labels, smallest first.
    ///
    /// The scale must be non-empty and its labels unique.
    pub fn new(labels: &[String]) -> Result<Self> {
        if labels.is_empty() {
            return Err(DetectError::MissingField("size_categories".to_string()));
        }
        let mut seen = BTreeSet::new();
        for label in labels {
            if !seen.insert(label.as_str()) {
                return Err(DetectError::invalid(
                    "size_categories",
                    format!("'{label}' is declared more than once"),
                ));
            }
        }
        Ok(Self {
            labels: labels.to_vec(),
        })
    }

    /// Look up a category by label.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<SizeCategory> {
        self.labels
            .iter()
            .position(|label| label == name)
            .map(|rank| SizeCategory {
                rank,
                name: name.to_string(),
            })
    }

    /// All labels, smallest first.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

// =============================================================================
// CALCULATION
// =============================================================================

/// Resolve every input field's selected option to its weight.
///
/// Every finished input defined by the model must have a selection naming
/// one of its options. Selections for unfinished (skipped) inputs are
/// ignored; selections for fields the model does not define are rejected.
pub fn selection_weights(
    model: &DetectModel,
    selection: &Selection,
) -> Result<BTreeMap<String, i64>> {
    let inputs = model
        .inputs()
        .ok_or_else(|| DetectError::MissingField("inputs".to_string()))?;

    for field in selection.keys() {
        if model.input(field).is_some() {
            continue;
        }
        if model.is_skipped_input(field) {
            debug!(field = %field, "ignoring selection for unfinished input");
            continue;
        }
        return Err(DetectError::invalid(
            format!("input '{field}'"),
            "not defined in the model",
        ));
    }

    let mut weights = BTreeMap::new();
    for field in inputs {
        let label = selection.get(&field.name).ok_or_else(|| {
            DetectError::MissingField(format!("selection for input '{}'", field.name))
        })?;
        let option = field.option(label).ok_or_else(|| {
            DetectError::invalid(
                format!("input '{}'", field.name),
                format!("'{label}' is not one of its options"),
            )
        })?;
        weights.insert(field.name.clone(), option.value);
    }
    Ok(weights)
}

/// Sum the selected weights into the System Size Number.
///
/// Any entry still at [`PLACEHOLDER_WEIGHT`] is rejected before summing; the
/// error lists every such field.
pub fn system_size_number(weights: &BTreeMap<String, i64>) -> Result<i64> {
    let placeholders: Vec<String> = weights
        .iter()
        .filter(|(_, weight)| **weight == PLACEHOLDER_WEIGHT)
        .map(|(field, _)| field.clone())
        .collect();
    if !placeholders.is_empty() {
        return Err(DetectError::Placeholder(placeholders));
    }

    weights
        .values()
        .try_fold(0i64, |acc, weight| acc.checked_add(*weight))
        .ok_or_else(|| DetectError::evaluation("system_size_number", ExprError::Overflow))
}

/// Map a System Size Number to its category.
///
/// Rules are evaluated in order with `system_size_number` bound; the first
/// rule whose condition holds wins. Every rule is compiled and its category
/// checked before any is evaluated.
pub fn classify(number: i64, scale: &SizeScale, rules: &[SizeRuleDef]) -> Result<SizeCategory> {
    if rules.is_empty() {
        return Err(DetectError::MissingField("size_rules".to_string()));
    }

    let compiled: Vec<(SizeCategory, Expr)> = rules
        .iter()
        .map(|rule| -> Result<(SizeCategory, Expr)> {
            let category = scale.get(&rule.category).ok_or_else(|| {
                DetectError::MissingField(format!("size category '{}'", rule.category))
            })?;
            let condition = expr::compile(&rule.when)
                .map_err(|e| DetectError::evaluation(rule_subject(rule), e))?;
            Ok((category, condition))
        })
        .collect::<Result<_>>()?;

    let scope = Scope::new(scale).with_number(number);
    for ((category, condition), rule) in compiled.into_iter().zip(rules) {
        let holds = condition
            .evaluate_bool(&scope)
            .map_err(|e| DetectError::evaluation(rule_subject(rule), e))?;
        if holds {
            debug!(number, category = %category, rule = %rule.when, "size rule matched");
            return Ok(category);
        }
    }

    Err(DetectError::NoMatchingSize(number))
}

fn rule_subject(rule: &SizeRuleDef) -> String {
    format!("size rule for {}", rule.category)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scale() -> SizeScale {
        SizeScale::new(&["Small".to_string(), "Medium".to_string(), "Large".to_string()])
            .unwrap()
    }

    fn rule(category: &str, when: &str) -> SizeRuleDef {
        SizeRuleDef {
            category: category.to_string(),
            when: when.to_string(),
        }
    }

    fn thresholds() -> Vec<SizeRuleDef> {
        vec![
            rule("Small", "system_size_number <= 5"),
            rule("Medium", "system_size_number <= 10"),
            rule("Large", "true"),
        ]
    }

    fn weights(pairs: &[(&str, i64)]) -> BTreeMap<String, i64> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
    }

    #[test]
    fn sums_weights() {
        let number = system_size_number(&weights(&[("a", 1), ("b", 2), ("c", 3)])).unwrap();
        assert_eq!(number, 6);
    }

    #[test]
    fn rejects_every_placeholder_field() {
        let result = system_size_number(&weights(&[("a", 0), ("b", 2), ("c", 0)]));
        match result {
            Err(DetectError::Placeholder(fields)) => {
                assert_eq!(fields, vec!["a".to_string(), "c".to_string()]);
            }
            other => unreachable!("expected placeholder error, got {other:?}"),
        }
    }

    #[test]
    fn sum_overflow_is_an_error() {
        let result = system_size_number(&weights(&[("a", i64::MAX), ("b", 1)]));
        assert!(matches!(
            result,
            Err(DetectError::Evaluation {
                source: ExprError::Overflow,
                ..
            })
        ));
    }

    #[test]
    fn classify_picks_first_matching_rule() {
        let scale = scale();
        let rules = thresholds();
        assert_eq!(classify(5, &scale, &rules).unwrap().name(), "Small");
        assert_eq!(classify(6, &scale, &rules).unwrap().name(), "Medium");
        assert_eq!(classify(10, &scale, &rules).unwrap().name(), "Medium");
        assert_eq!(classify(11, &scale, &rules).unwrap().name(), "Large");
    }

    #[test]
    fn classify_without_match_fails() {
        let scale = scale();
        let rules = vec![rule("Small", "system_size_number <= 5")];
        assert!(matches!(
            classify(9, &scale, &rules),
            Err(DetectError::NoMatchingSize(9))
        ));
    }

    #[test]
    fn classify_rejects_unknown_category() {
        let scale = scale();
        let rules = vec![rule("Small", "true"), rule("Huge", "true")];
        assert!(matches!(
            classify(1, &scale, &rules),
            Err(DetectError::MissingField(_))
        ));
    }

    #[test]
    fn classify_rejects_non_boolean_rule() {
        let scale = scale();
        let rules = vec![rule("Small", "system_size_number + 1")];
        assert!(matches!(
            classify(1, &scale, &rules),
            Err(DetectError::Evaluation { .. })
        ));
    }

    #[test]
    fn classify_requires_rules() {
        let scale = scale();
        assert!(matches!(
            classify(1, &scale, &[]),
            Err(DetectError::MissingField(_))
        ));
    }

    #[test]
    fn scale_rejects_duplicates_and_empty() {
        assert!(SizeScale::new(&[]).is_err());
        assert!(SizeScale::new(&["Small".to_string(), "Small".to_string()]).is_err());
    }

    #[test]
    fn categories_order_by_rank() {
        let scale = scale();
        let small = scale.get("Small").unwrap();
        let large = scale.get("Large").unwrap();
        assert!(small < large);
        assert_eq!(large.rank(), 2);
        assert!(scale.get("Tiny").is_none());
    }
}
