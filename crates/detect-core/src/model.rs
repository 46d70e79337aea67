//! # Model Loader
//!
//! In-memory model assembled from the DETECT model documents.
//!
//! Each model file is a JSON document with the same optional sections:
//! - `size_categories`: ordered size labels, smallest first
//! - `size_rules`: ordered threshold rules `{category, when}`
//! - `inputs`: input field definitions with weighted options
//! - `selections`: field name -> chosen option label
//! - `requirements` / `criteria`: the static record lists
//!
//! The [`ModelBuilder`] merges documents in the order they are added. Parse
//! failures and conflicting sections are recorded as [`Diagnostics`] and
//! loading carries on with whatever could be read.
//!
//! Note: reading files is the app layer's job; this module only sees text.

use crate::error::{DetectError, Result};
use crate::size::SizeScale;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{error, warn};

/// Field name -> selected option label.
pub type Selection = BTreeMap<String, String>;

// =============================================================================
// DOCUMENT SCHEMA
// =============================================================================

/// One parsed model file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_categories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_rules: Option<Vec<SizeRuleDef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Vec<InputFieldDef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selections: Option<Selection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Vec<RequirementDef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<Vec<CriteriaDef>>,
}

/// A threshold rule: `category` applies when `when` holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeRuleDef {
    pub category: String,
    pub when: String,
}

/// One selectable option of an input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputOption {
    pub label: String,
    /// Integer weight; 0 marks the placeholder ("TBD") option.
    pub value: i64,
}

/// An input field definition.
///
/// A definition without options is unfinished and is skipped by the builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFieldDef {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub options: Vec<InputOption>,
}

impl InputFieldDef {
    /// Find an option by label.
    #[must_use]
    pub fn option(&self, label: &str) -> Option<&InputOption> {
        self.options.iter().find(|o| o.label == label)
    }
}

/// A requirement record as authored.
///
/// Content fields are optional here; the filter engine reports the missing
/// ones for records that apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementDef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub weight: Option<serde_json::Value>,
    #[serde(default)]
    pub applies_when: Vec<String>,
}

/// A criteria record as authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriteriaDef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub criteria: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub weight: Option<serde_json::Value>,
    #[serde(default)]
    pub applies_when: Vec<String>,
}

// =============================================================================
// DIAGNOSTICS
// =============================================================================

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// A problem found while loading the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// The model file the problem was found in.
    pub source: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.source, self.severity, self.message)
    }
}

/// The diagnostics report returned alongside the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    fn push(&mut self, severity: Severity, source: &str, message: String) {
        match severity {
            Severity::Warning => warn!(source, "{message}"),
            Severity::Error => error!(source, "{message}"),
        }
        self.entries.push(Diagnostic {
            severity,
            source: source.to_string(),
            message,
        });
    }

    /// True if any entry is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|d| d.severity == Severity::Error)
    }

    /// Error entries only.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    /// All entries in the order they were found.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Merges model documents into a [`DetectModel`].
#[derive(Debug, Default)]
pub struct ModelBuilder {
    document: ModelDocument,
    origins: BTreeMap<&'static str, String>,
    diagnostics: Diagnostics,
}

impl ModelBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one document and merge it.
    ///
    /// Returns `false` (and records an error diagnostic) if the text does not
    /// parse; the builder stays usable.
    pub fn add_source(&mut self, source: &str, text: &str) -> bool {
        match serde_json::from_str::<ModelDocument>(text) {
            Ok(document) => {
                self.add_document(source, document);
                true
            }
            Err(e) => {
                self.report_error(source, format!("failed to parse model document: {e}"));
                false
            }
        }
    }

    /// Merge an already parsed document.
    ///
    /// A section already provided by an earlier document is kept; the later
    /// definition is ignored with a warning.
    pub fn add_document(&mut self, source: &str, document: ModelDocument) {
        let ModelDocument {
            size_categories,
            size_rules,
            inputs,
            selections,
            requirements,
            criteria,
        } = document;

        let target = &mut self.document;
        let mut merge = Merge {
            source,
            origins: &mut self.origins,
            diagnostics: &mut self.diagnostics,
        };
        merge.section("size_categories", &mut target.size_categories, size_categories);
        merge.section("size_rules", &mut target.size_rules, size_rules);
        merge.section("inputs", &mut target.inputs, inputs);
        merge.section("selections", &mut target.selections, selections);
        merge.section("requirements", &mut target.requirements, requirements);
        merge.section("criteria", &mut target.criteria, criteria);
    }

    /// Record a problem that prevented a source from being read at all.
    pub fn report_error(&mut self, source: &str, message: impl Into<String>) {
        self.diagnostics
            .push(Severity::Error, source, message.into());
    }

    /// Finish loading.
    ///
    /// Unfinished input definitions (no options) are skipped with a warning.
    /// A repeated input name keeps the first definition and records an error.
    #[must_use]
    pub fn build(mut self) -> (DetectModel, Diagnostics) {
        let document = self.document;
        let inputs_origin = self
            .origins
            .get("inputs")
            .cloned()
            .unwrap_or_default();

        let mut skipped_inputs = BTreeSet::new();
        let inputs = document.inputs.map(|definitions| {
            let mut seen = BTreeSet::new();
            let mut finished = Vec::new();
            for definition in definitions {
                if definition.options.is_empty() {
                    self.diagnostics.push(
                        Severity::Warning,
                        &inputs_origin,
                        format!("input '{}' has no options and is skipped", definition.name),
                    );
                    skipped_inputs.insert(definition.name);
                } else if !seen.insert(definition.name.clone()) {
                    self.diagnostics.push(
                        Severity::Error,
                        &inputs_origin,
                        format!("input '{}' is defined more than once", definition.name),
                    );
                } else {
                    finished.push(definition);
                }
            }
            finished
        });

        if let (Some(categories), Some(rules)) = (&document.size_categories, &document.size_rules) {
            let origin = self.origins.get("size_rules").cloned().unwrap_or_default();
            if let Err(e) = SizeScale::new(categories) {
                self.diagnostics.push(Severity::Error, &origin, e.to_string());
            }
            for rule in rules.iter().filter(|r| !categories.contains(&r.category)) {
                self.diagnostics.push(
                    Severity::Error,
                    &origin,
                    format!("size rule refers to undeclared category '{}'", rule.category),
                );
            }
        }

        let model = DetectModel {
            size_categories: document.size_categories,
            size_rules: document.size_rules.unwrap_or_default(),
            inputs,
            skipped_inputs,
            selections: document.selections.unwrap_or_default(),
            requirements: document.requirements,
            criteria: document.criteria,
        };
        (model, self.diagnostics)
    }
}

struct Merge<'a> {
    source: &'a str,
    origins: &'a mut BTreeMap<&'static str, String>,
    diagnostics: &'a mut Diagnostics,
}

impl Merge<'_> {
    fn section<T>(&mut self, name: &'static str, slot: &mut Option<T>, incoming: Option<T>) {
        let Some(value) = incoming else {
            return;
        };
        if slot.is_some() {
            let first = self
                .origins
                .get(name)
                .map_or("an earlier document", String::as_str);
            let message = format!("section '{name}' is already defined in {first}; ignored");
            self.diagnostics
                .push(Severity::Warning, self.source, message);
            return;
        }
        *slot = Some(value);
        self.origins.insert(name, self.source.to_string());
    }
}

// =============================================================================
// MODEL
// =============================================================================

/// An input field as presented to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailableInput {
    pub name: String,
    pub description: String,
    pub question: String,
    /// Options in ascending weight order.
    pub options: Vec<InputOption>,
}

/// The loaded, read-only model.
#[derive(Debug, Clone, Default)]
pub struct DetectModel {
    size_categories: Option<Vec<String>>,
    size_rules: Vec<SizeRuleDef>,
    inputs: Option<Vec<InputFieldDef>>,
    skipped_inputs: BTreeSet<String>,
    selections: Selection,
    requirements: Option<Vec<RequirementDef>>,
    criteria: Option<Vec<CriteriaDef>>,
}

impl DetectModel {
    /// The ordered size scale.
    pub fn size_scale(&self) -> Result<SizeScale> {
        let labels = self
            .size_categories
            .as_deref()
            .ok_or_else(|| DetectError::MissingField("size_categories".to_string()))?;
        SizeScale::new(labels)
    }

    /// Threshold rules in evaluation order.
    #[must_use]
    pub fn size_rules(&self) -> &[SizeRuleDef] {
        &self.size_rules
    }

    /// Finished input definitions, or `None` if no document defines inputs.
    #[must_use]
    pub fn inputs(&self) -> Option<&[InputFieldDef]> {
        self.inputs.as_deref()
    }

    /// Look up a finished input definition.
    #[must_use]
    pub fn input(&self, name: &str) -> Option<&InputFieldDef> {
        self.inputs
            .as_deref()
            .and_then(|inputs| inputs.iter().find(|i| i.name == name))
    }

    /// True if `name` was defined but skipped as unfinished.
    #[must_use]
    pub fn is_skipped_input(&self, name: &str) -> bool {
        self.skipped_inputs.contains(name)
    }

    /// The selection stored in the model documents.
    #[must_use]
    pub fn selections(&self) -> &Selection {
        &self.selections
    }

    /// Requirement definitions; an error if no document defines the section.
    pub fn requirements(&self) -> Result<&[RequirementDef]> {
        self.requirements
            .as_deref()
            .ok_or_else(|| DetectError::MissingField("requirements".to_string()))
    }

    /// Criteria definitions; an error if no document defines the section.
    pub fn criteria(&self) -> Result<&[CriteriaDef]> {
        self.criteria
            .as_deref()
            .ok_or_else(|| DetectError::MissingField("criteria".to_string()))
    }

    /// The finished inputs with their description, question and options,
    /// options sorted by ascending weight.
    pub fn available_inputs(&self) -> Result<Vec<AvailableInput>> {
        let inputs = self
            .inputs()
            .ok_or_else(|| DetectError::MissingField("inputs".to_string()))?;

        inputs
            .iter()
            .map(|input| {
                let description = input.description.clone().ok_or_else(|| {
                    DetectError::MissingField(format!("description for input '{}'", input.name))
                })?;
                let question = input.question.clone().ok_or_else(|| {
                    DetectError::MissingField(format!("question for input '{}'", input.name))
                })?;
                let mut options = input.options.clone();
                options.sort_by_key(|o| o.value);
                Ok(AvailableInput {
                    name: input.name.clone(),
                    description,
                    question,
                    options,
                })
            })
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
