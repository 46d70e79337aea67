//! # CSV Exporter
//!
//! Renders the filtered records into CSV bytes.
//!
//! The rendering is in memory; callers write the bytes to disk or serve them
//! as a download, so both are byte-identical. Dialect: comma delimiter,
//! minimal quoting, CRLF record terminator. Rows are sorted naturally by id
//! regardless of input order.

use crate::error::{DetectError, Result};
use crate::natural::sort_naturally;
use crate::records::{Criteria, Requirement};

/// File name of the requirements table.
pub const REQUIREMENTS_FILE: &str = "requirements.csv";

/// File name of the criteria table.
pub const CRITERIA_FILE: &str = "criteria.csv";

pub const REQUIREMENTS_HEADER: [&str; 3] = ["id", "value", "description"];
pub const CRITERIA_HEADER: [&str; 4] = ["id", "value", "criteria", "context"];

/// Render requirements as `id,value,description`.
pub fn requirements_csv(records: &[Requirement]) -> Result<Vec<u8>> {
    let mut sorted: Vec<&Requirement> = records.iter().collect();
    sort_naturally(&mut sorted);

    let mut writer = writer();
    writer.write_record(REQUIREMENTS_HEADER)?;
    for record in sorted {
        let value = record.value.to_string();
        writer.write_record([record.id.as_str(), value.as_str(), record.description.as_str()])?;
    }
    finish(writer)
}

/// Render criteria as `id,value,criteria,context`.
pub fn criteria_csv(records: &[Criteria]) -> Result<Vec<u8>> {
    let mut sorted: Vec<&Criteria> = records.iter().collect();
    sort_naturally(&mut sorted);

    let mut writer = writer();
    writer.write_record(CRITERIA_HEADER)?;
    for record in sorted {
        let value = record.value.to_string();
        writer.write_record([
            record.id.as_str(),
            value.as_str(),
            record.criteria.as_str(),
            record.context.as_str(),
        ])?;
    }
    finish(writer)
}

fn writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| DetectError::Export(e.into_error().into()))
}

// =============================================================================
// TESTS
// =============================================================================
