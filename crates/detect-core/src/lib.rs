//! # DETECT Core
//!
//! Pure, deterministic logic of the DETECT system size classifier.
//!
//! - [`model`]: JSON model documents, merged into a read-only [`DetectModel`]
//! - [`expr`]: the expression evaluator used by size rules and record predicates
//! - [`size`]: System Size Number and System Size Category
//! - [`filter`]: applicability filtering of requirement and criteria records
//! - [`natural`]: numeric-aware identifier ordering
//! - [`export`]: CSV rendering
//! - [`evaluation`]: the full pass, from selection to sorted records
//!
//! No I/O, no async. Callers read model files and write CSV bytes.

pub mod error;
pub mod evaluation;
pub mod export;
pub mod expr;
pub mod filter;
pub mod model;
pub mod natural;
pub mod records;
pub mod size;

pub use error::{DetectError, ExprError, Result};
pub use evaluation::{Evaluation, SizeAssessment};
pub use export::{CRITERIA_FILE, REQUIREMENTS_FILE, criteria_csv, requirements_csv};
pub use expr::{Expr, Scope, Value, compile};
pub use filter::{Applicable, filter_criteria, filter_requirements, select};
pub use model::{
    AvailableInput, CriteriaDef, DetectModel, Diagnostic, Diagnostics, InputFieldDef,
    InputOption, ModelBuilder, ModelDocument, RequirementDef, Selection, Severity, SizeRuleDef,
};
pub use natural::{Identified, natural_cmp, sort_naturally};
pub use records::{Criteria, Requirement, Weight};
pub use size::{
    PLACEHOLDER_WEIGHT, SizeCategory, SizeScale, classify, selection_weights, system_size_number,
};
