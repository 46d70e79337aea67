//! # Form Configuration
//!
//! Turns the model's available inputs into the select fields of the web form
//! and maps submitted labels back to a [`Selection`].

use detect_core::{AvailableInput, PLACEHOLDER_WEIGHT, Selection};
use std::collections::BTreeMap;

/// The field that gets a flag icon and the full form width.
const STATUS_FIELD: &str = "project_status";

/// One select field of the configuration form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    /// `"{n}. Title Case Name"`.
    pub label: String,
    /// Markdown shown above the select.
    pub description: String,
    /// The input's question, shown as the select's placeholder.
    pub placeholder: String,
    pub icon: &'static str,
    pub full_width: bool,
    /// Option labels in ascending weight order.
    pub options: Vec<String>,
    pub weights: BTreeMap<String, i64>,
}

impl FormField {
    /// The option preselected when the form is first shown.
    #[must_use]
    pub fn initial(&self) -> Option<&str> {
        self.options.first().map(String::as_str)
    }

    /// Title-cased field name without the ordinal.
    #[must_use]
    pub fn display_name(&self) -> String {
        title_case(&self.name)
    }
}

/// Build the form fields, numbered from 1 in model order.
#[must_use]
pub fn form_fields(inputs: &[AvailableInput]) -> Vec<FormField> {
    inputs
        .iter()
        .enumerate()
        .map(|(i, input)| {
            let status = input.name == STATUS_FIELD;
            FormField {
                name: input.name.clone(),
                label: format!("{}. {}", i + 1, title_case(&input.name)),
                description: input.description.clone(),
                placeholder: input.question.clone(),
                icon: if status { "flag" } else { "tune" },
                full_width: status,
                options: input.options.iter().map(|o| o.label.clone()).collect(),
                weights: input
                    .options
                    .iter()
                    .map(|o| (o.label.clone(), o.value))
                    .collect(),
            }
        })
        .collect()
}

/// Every field at its first option.
#[must_use]
pub fn initial_selection(fields: &[FormField]) -> Selection {
    fields
        .iter()
        .filter_map(|f| f.initial().map(|label| (f.name.clone(), label.to_string())))
        .collect()
}

/// Read the form's fields out of submitted key/value pairs.
///
/// A field that is absent or empty falls back to its first option; other
/// submitted keys are ignored.
#[must_use]
pub fn selection_from_form(fields: &[FormField], submitted: &BTreeMap<String, String>) -> Selection {
    fields
        .iter()
        .filter_map(|field| {
            let label = submitted
                .get(&field.name)
                .map(String::as_str)
                .filter(|label| !label.is_empty())
                .or_else(|| field.initial())?;
            Some((field.name.clone(), label.to_string()))
        })
        .collect()
}

/// Display names of the fields whose selected option is the placeholder.
#[must_use]
pub fn placeholder_fields(fields: &[FormField], selection: &Selection) -> Vec<String> {
    fields
        .iter()
        .filter(|field| {
            selection
                .get(&field.name)
                .and_then(|label| field.weights.get(label))
                .is_some_and(|weight| *weight == PLACEHOLDER_WEIGHT)
        })
        .map(FormField::display_name)
        .collect()
}

/// `team_size` -> `Team Size`.
///
/// Each run of letters starts upper case and continues lower case.
#[must_use]
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_word = false;
    for c in name.replace('_', " ").chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

// =============================================================================
// TESTS
// =============================================================================
