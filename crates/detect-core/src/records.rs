//! # Records
//!
//! The validated output records produced by the filter engine.

use crate::error::{DetectError, Result};
use crate::model::{CriteriaDef, RequirementDef};
use crate::natural::Identified;
use serde::Serialize;
use std::fmt;

/// A record weight, kept exactly as authored (integer or decimal).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Weight(serde_json::Number);

impl Weight {
    /// Accept a JSON number; anything else is an invalid value.
    pub fn from_json(subject: &str, value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Number(n) => Ok(Self(n.clone())),
            other => Err(DetectError::invalid(
                subject,
                format!("expected a numeric weight, found {other}"),
            )),
        }
    }
}

impl From<i64> for Weight {
    fn from(value: i64) -> Self {
        Self(serde_json::Number::from(value))
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A requirement that applies to the computed size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Requirement {
    pub id: String,
    pub value: Weight,
    pub description: String,
}

impl Requirement {
    /// Validate an authored requirement's content fields.
    pub fn from_def(def: &RequirementDef) -> Result<Self> {
        let label = def.label();
        Ok(Self {
            id: required(def.id.as_deref(), "short name", "requirement", label)?,
            description: required(def.description.as_deref(), "description", "requirement", label)?,
            value: weight(def.weight.as_ref(), "requirement", label)?,
        })
    }
}

impl Identified for Requirement {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A criteria record that applies to the computed size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Criteria {
    pub id: String,
    pub value: Weight,
    pub criteria: String,
    pub context: String,
}

impl Criteria {
    /// Validate an authored criteria record's content fields.
    pub fn from_def(def: &CriteriaDef) -> Result<Self> {
        let label = def.label();
        Ok(Self {
            id: required(def.id.as_deref(), "short name", "criteria", label)?,
            criteria: required(def.criteria.as_deref(), "criteria", "criteria", label)?,
            context: required(def.context.as_deref(), "context", "criteria", label)?,
            value: weight(def.weight.as_ref(), "criteria", label)?,
        })
    }
}

impl Identified for Criteria {
    fn id(&self) -> &str {
        &self.id
    }
}

impl RequirementDef {
    /// Name used in error messages.
    #[must_use]
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or("<unnamed>")
    }
}

impl CriteriaDef {
    /// Name used in error messages.
    #[must_use]
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or("<unnamed>")
    }
}

fn required(value: Option<&str>, field: &str, kind: &str, label: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .ok_or_else(|| DetectError::MissingField(format!("{field} of {kind} '{label}'")))
}

fn weight(value: Option<&serde_json::Value>, kind: &str, label: &str) -> Result<Weight> {
    let subject = format!("weight of {kind} '{label}'");
    let value = value.ok_or_else(|| DetectError::MissingField(subject.clone()))?;
    Weight::from_json(&subject, value)
}

// =============================================================================
// TESTS
// =============================================================================
