//! # Evaluation
//!
//! One full classification-and-filter pass over a loaded model:
//!
//! ```text
//! selection -> weights -> System Size Number -> System Size -> records
//! ```
//!
//! The pass reads the model and never mutates it; the computed size reaches
//! the record predicates through an explicit [`Scope`].

use crate::error::Result;
use crate::expr::Scope;
use crate::filter::{filter_criteria, filter_requirements};
use crate::model::{DetectModel, Selection};
use crate::natural::sort_naturally;
use crate::records::{Criteria, Requirement};
use crate::size::{SizeCategory, classify, selection_weights, system_size_number};
use serde::Serialize;
use tracing::info;

/// The size half of an evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeAssessment {
    pub system_size_number: i64,
    pub system_size: SizeCategory,
}

impl SizeAssessment {
    /// Compute the System Size Number and Category for a selection.
    pub fn assess(model: &DetectModel, selection: &Selection) -> Result<Self> {
        let weights = selection_weights(model, selection)?;
        let number = system_size_number(&weights)?;
        let scale = model.size_scale()?;
        let size = classify(number, &scale, model.size_rules())?;

        info!(system_size_number = number, system_size = %size, "system size computed");
        Ok(Self {
            system_size_number: number,
            system_size: size,
        })
    }
}

/// The result of a full pass: size plus applicable records in natural order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub system_size_number: i64,
    pub system_size: SizeCategory,
    pub requirements: Vec<Requirement>,
    pub criteria: Vec<Criteria>,
}

impl Evaluation {
    /// Classify the selection and filter both record lists.
    pub fn run(model: &DetectModel, selection: &Selection) -> Result<Self> {
        let assessment = SizeAssessment::assess(model, selection)?;
        Self::for_assessment(model, assessment)
    }

    /// Filter both record lists for an already computed size.
    pub fn for_assessment(model: &DetectModel, assessment: SizeAssessment) -> Result<Self> {
        let scale = model.size_scale()?;
        let scope = Scope::new(&scale)
            .with_number(assessment.system_size_number)
            .with_size(assessment.system_size.clone());

        let mut requirements = filter_requirements(model.requirements()?, &scope)?;
        let mut criteria = filter_criteria(model.criteria()?, &scope)?;
        sort_naturally(&mut requirements);
        sort_naturally(&mut criteria);

        info!(
            system_size = %assessment.system_size,
            requirements = requirements.len(),
            criteria = criteria.len(),
            "records filtered"
        );
        Ok(Self {
            system_size_number: assessment.system_size_number,
            system_size: assessment.system_size,
            requirements,
            criteria,
        })
    }

    /// The size half of this evaluation.
    #[must_use]
    pub fn assessment(&self) -> SizeAssessment {
        SizeAssessment {
            system_size_number: self.system_size_number,
            system_size: self.system_size.clone(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::DetectError;
    use crate::model::ModelBuilder;

    const DEFINITIONS: &str = r#"{
        "size_categories": ["Small", "Medium", "Large"],
        "size_rules": [
            {"category": "Small", "when": "system_size_number <= 5"},
            {"category": "Medium", "when": "system_size_number <= 10"},
            {"category": "Large", "when": "true"}
        ],
        "inputs": [
            {"name": "a", "description": "A", "question": "A?",
             "options": [{"label": "TBD", "value": 0}, {"label": "one", "value": 1}]},
            {"name": "b", "description": "B", "question": "B?",
             "options": [{"label": "TBD", "value": 0}, {"label": "two", "value": 2}]},
            {"name": "c", "description": "C", "question": "C?",
             "options": [{"label": "TBD", "value": 0}, {"label": "three", "value": 3}, {"label": "nine", "value": 9}]}
        ]
    }"#;

    const RECORDS: &str = r#"{
        "requirements": [
            {"id": "R10", "description": "ten", "weight": 1, "applies_when": ["system_size >= Medium"]},
            {"id": "R2", "description": "two", "weight": 2, "applies_when": ["system_size == SystemSize::Medium"]},
            {"id": "R1", "description": "one", "weight": 1, "applies_when": ["true"]},
            {"id": "R3", "description": "three", "weight": 1, "applies_when": ["system_size == Large"]}
        ],
        "criteria": [
            {"id": "C1", "criteria": "c", "context": "x", "weight": 1, "applies_when": ["system_size == Small"]}
        ]
    }"#;

    fn model() -> DetectModel {
        let mut builder = ModelBuilder::new();
        assert!(builder.add_source("definitions", DEFINITIONS));
        assert!(builder.add_source("records", RECORDS));
        let (model, diagnostics) = builder.build();
        assert!(diagnostics.is_empty());
        model
    }

    fn selection(pairs: &[(&str, &str)]) -> Selection {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn medium_example_end_to_end() {
        let model = model();
        let result =
            Evaluation::run(&model, &selection(&[("a", "one"), ("b", "two"), ("c", "three")]))
                .unwrap();

        assert_eq!(result.system_size_number, 6);
        assert_eq!(result.system_size.name(), "Medium");
        let ids: Vec<&str> = result.requirements.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["R1", "R2", "R10"]);
        assert!(result.criteria.is_empty());
    }

    #[test]
    fn large_selection_changes_the_records() {
        let model = model();
        let result =
            Evaluation::run(&model, &selection(&[("a", "one"), ("b", "two"), ("c", "nine")]))
                .unwrap();
        assert_eq!(result.system_size.name(), "Large");
        let ids: Vec<&str> = result.requirements.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["R1", "R3", "R10"]);
    }

    #[test]
    fn placeholder_selection_stops_the_pass() {
        let model = model();
        let result = Evaluation::run(&model, &selection(&[("a", "TBD"), ("b", "two"), ("c", "TBD")]));
        match result {
            Err(DetectError::Placeholder(fields)) => assert_eq!(fields, vec!["a", "c"]),
            other => unreachable!("expected placeholder error, got {other:?}"),
        }
    }

    #[test]
    fn missing_record_section_is_an_error() {
        let mut builder = ModelBuilder::new();
        assert!(builder.add_source("definitions", DEFINITIONS));
        assert!(builder.add_source(
            "records",
            r#"{"requirements": [{"id": "R1", "description": "one", "weight": 1, "applies_when": ["true"]}]}"#
        ));
        let (model, _) = builder.build();

        let result = Evaluation::run(&model, &selection(&[("a", "one"), ("b", "two"), ("c", "three")]));
        match result {
            Err(DetectError::MissingField(field)) => assert_eq!(field, "criteria"),
            other => unreachable!("expected missing criteria, got {other:?}"),
        }
    }

    #[test]
    fn evaluation_does_not_touch_the_model() {
        let model = model();
        let before = format!("{model:?}");
        Evaluation::run(&model, &selection(&[("a", "one"), ("b", "two"), ("c", "three")]))
            .unwrap();
        assert_eq!(format!("{model:?}"), before);
    }

    #[test]
    fn serializes_size_as_label() {
        let model = model();
        let result =
            Evaluation::run(&model, &selection(&[("a", "one"), ("b", "two"), ("c", "three")]))
                .unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["system_size"], "Medium");
        assert_eq!(json["requirements"][0]["id"], "R1");
        assert_eq!(json["requirements"][0]["value"], 1);
    }
}
