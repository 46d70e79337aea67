//! # Filter Engine
//!
//! Selects the requirement and criteria records that apply to a computed
//! system size.
//!
//! Every record carries exactly one applicability predicate. The shape check
//! and the predicate evaluation run for every record; content fields are only
//! validated for records that apply, so an unfinished record that never
//! applies does not break the run.
//!
//! Records are returned in model order. Presentation order (natural sort by
//! id) is applied by [`crate::Evaluation`] and by the exporter.

use crate::error::{DetectError, Result};
use crate::expr::{self, Scope};
use crate::model::{CriteriaDef, RequirementDef};
use crate::records::{Criteria, Requirement};
use tracing::debug;

/// A record definition gated by an applicability predicate.
pub trait Applicable {
    /// Name used in error messages.
    fn label(&self) -> &str;

    /// The authored predicates. Well-formed records have exactly one.
    fn predicates(&self) -> &[String];
}

impl Applicable for RequirementDef {
    fn label(&self) -> &str {
        RequirementDef::label(self)
    }

    fn predicates(&self) -> &[String] {
        &self.applies_when
    }
}

impl Applicable for CriteriaDef {
    fn label(&self) -> &str {
        CriteriaDef::label(self)
    }

    fn predicates(&self) -> &[String] {
        &self.applies_when
    }
}

/// Evaluate a record's single predicate against the scope.
pub fn applies<R: Applicable + ?Sized>(record: &R, scope: &Scope<'_>) -> Result<bool> {
    let predicate = match record.predicates() {
        [predicate] => predicate,
        other => {
            return Err(DetectError::Shape {
                record: record.label().to_string(),
                count: other.len(),
            });
        }
    };

    let subject = || format!("applicability of '{}'", record.label());
    let condition = expr::compile(predicate).map_err(|e| DetectError::evaluation(subject(), e))?;
    let holds = condition
        .evaluate_bool(scope)
        .map_err(|e| DetectError::evaluation(subject(), e))?;

    debug!(record = %record.label(), holds, "applicability evaluated");
    Ok(holds)
}

/// The definitions whose predicate holds, in model order.
pub fn select<'r, R: Applicable>(records: &'r [R], scope: &Scope<'_>) -> Result<Vec<&'r R>> {
    let mut selected = Vec::new();
    for record in records {
        if applies(record, scope)? {
            selected.push(record);
        }
    }
    Ok(selected)
}

/// Requirements that apply to the scope, validated.
pub fn filter_requirements(
    records: &[RequirementDef],
    scope: &Scope<'_>,
) -> Result<Vec<Requirement>> {
    let mut out = Vec::new();
    for record in records {
        if applies(record, scope)? {
            out.push(Requirement::from_def(record)?);
        }
    }
    Ok(out)
}

/// Criteria that apply to the scope, validated.
pub fn filter_criteria(records: &[CriteriaDef], scope: &Scope<'_>) -> Result<Vec<Criteria>> {
    let mut out = Vec::new();
    for record in records {
        if applies(record, scope)? {
            out.push(Criteria::from_def(record)?);
        }
    }
    Ok(out)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::size::SizeScale;
    use serde_json::json;

    fn scale() -> SizeScale {
        SizeScale::new(&["Small".to_string(), "Medium".to_string(), "Large".to_string()])
            .unwrap()
    }

    fn requirement(id: &str, predicates: &[&str]) -> RequirementDef {
        RequirementDef {
            id: Some(id.to_string()),
            name: Some(format!("req_{id}")),
            description: Some(format!("Requirement {id}")),
            weight: Some(json!(1)),
            applies_when: predicates.iter().map(|p| (*p).to_string()).collect(),
        }
    }

    fn medium_scope(scale: &SizeScale) -> Scope<'_> {
        Scope::new(scale)
            .with_number(6)
            .with_size(scale.get("Medium").unwrap())
    }

    #[test]
    fn keeps_records_whose_predicate_holds() {
        let scale = scale();
        let scope = medium_scope(&scale);
        let records = vec![
            requirement("R1", &["true"]),
            requirement("R2", &["system_size == SystemSize::Small"]),
            requirement("R3", &["system_size >= Medium"]),
            requirement("R4", &["system_size == Large"]),
        ];

        let ids: Vec<String> = filter_requirements(&records, &scope)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["R1", "R3"]);
    }

    #[test]
    fn zero_or_many_predicates_is_a_shape_error() {
        let scale = scale();
        let scope = medium_scope(&scale);

        let cases: [&[&str]; 2] = [&[], &["true", "false"]];
        for predicates in cases {
            let records = vec![requirement("R1", predicates)];
            match filter_requirements(&records, &scope) {
                Err(DetectError::Shape { record, count }) => {
                    assert_eq!(record, "req_R1");
                    assert_eq!(count, predicates.len());
                }
                other => unreachable!("expected shape error, got {other:?}"),
            }
        }
    }

    #[test]
    fn shape_is_checked_even_when_content_is_missing() {
        let scale = scale();
        let scope = medium_scope(&scale);
        let mut record = requirement("R1", &[]);
        record.description = None;
        assert!(matches!(
            filter_requirements(&[record], &scope),
            Err(DetectError::Shape { .. })
        ));
    }

    #[test]
    fn non_applying_record_may_be_unfinished() {
        let scale = scale();
        let scope = medium_scope(&scale);
        let mut unfinished = requirement("R9", &["system_size == Large"]);
        unfinished.description = None;
        unfinished.weight = None;

        let result = filter_requirements(&[requirement("R1", &["true"]), unfinished], &scope);
        assert_eq!(result.unwrap().len(), 1);
    }

    #[test]
    fn applying_record_with_missing_content_fails() {
        let scale = scale();
        let scope = medium_scope(&scale);
        let mut record = requirement("R1", &["true"]);
        record.weight = None;
        assert!(matches!(
            filter_requirements(&[record], &scope),
            Err(DetectError::MissingField(_))
        ));
    }

    #[test]
    fn non_boolean_predicate_is_an_evaluation_error() {
        let scale = scale();
        let scope = medium_scope(&scale);
        let records = vec![requirement("R1", &["system_size_number"])];
        assert!(matches!(
            filter_requirements(&records, &scope),
            Err(DetectError::Evaluation { .. })
        ));
    }

    #[test]
    fn filtering_selected_definitions_again_is_idempotent() {
        let scale = scale();
        let scope = medium_scope(&scale);
        let records = vec![
            requirement("R1", &["system_size <= Medium"]),
            requirement("R2", &["system_size == Small"]),
            requirement("R3", &["system_size_number > 5"]),
        ];

        let once: Vec<RequirementDef> = select(&records, &scope)
            .unwrap()
            .into_iter()
            .cloned()
            .collect();
        let twice: Vec<RequirementDef> = select(&once, &scope)
            .unwrap()
            .into_iter()
            .cloned()
            .collect();
        assert_eq!(once, twice);
        assert_eq!(once.len(), 2);
    }

    #[test]
    fn criteria_are_filtered_the_same_way() {
        let scale = scale();
        let scope = medium_scope(&scale);
        let records = vec![CriteriaDef {
            id: Some("C1".into()),
            name: None,
            criteria: Some("Interfaces are modelled".into()),
            context: Some("Architecture".into()),
            weight: Some(json!(3)),
            applies_when: vec!["system_size != Small".into()],
        }];
        let criteria = filter_criteria(&records, &scope).unwrap();
        assert_eq!(criteria.len(), 1);
        assert_eq!(criteria[0].context, "Architecture");
    }
}
