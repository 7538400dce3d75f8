//! Catalog row validation
//!
//! Column layout of the source file: barcode (optional), description,
//! internal code. Rejected rows are collected with their file line number
//! and raw content so the operator can fix the source; they never abort
//! the import.

use thiserror::Error;

use stocktake_server::db::models::ProductCreate;

/// Minimum number of fields a data row must carry
pub const MIN_FIELDS: usize = 3;

/// Why a row was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("fewer than 3 fields (got {0})")]
    MalformedRow(usize),

    #[error("empty required field: {0}")]
    MissingRequiredField(&'static str),
}

/// A rejected row, kept for the end-of-run report
#[derive(Debug, Clone)]
pub struct RejectedRow {
    /// 1-based line number in the source file
    pub line_number: usize,
    pub reason: RowError,
    pub raw: String,
}

/// Convert one parsed field sequence into a catalog record.
///
/// Field 0 is the barcode (empty means none), field 1 the description,
/// field 2 the internal code. Extra fields are ignored.
pub fn parse_record(fields: &[String]) -> Result<ProductCreate, RowError> {
    if fields.len() < MIN_FIELDS {
        return Err(RowError::MalformedRow(fields.len()));
    }

    let barcode = &fields[0];
    let description = &fields[1];
    let code = &fields[2];

    if description.is_empty() {
        return Err(RowError::MissingRequiredField("description"));
    }
    if code.is_empty() {
        return Err(RowError::MissingRequiredField("code"));
    }

    Ok(ProductCreate {
        code: code.clone(),
        description: description.clone(),
        barcode: (!barcode.is_empty()).then(|| barcode.clone()),
        category: None,
        unit: "UN".to_string(),
        is_active: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv::parse_line;

    fn fields(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn builds_record_with_defaults() {
        let record =
            parse_record(&fields(&["7891000100101", "Adubo NPK", "ADUBO001"])).expect("valid row");
        assert_eq!(record.code, "ADUBO001");
        assert_eq!(record.description, "Adubo NPK");
        assert_eq!(record.barcode.as_deref(), Some("7891000100101"));
        assert_eq!(record.unit, "UN");
        assert!(record.is_active);
        assert!(record.category.is_none());
    }

    #[test]
    fn empty_barcode_becomes_none() {
        let record = parse_record(&fields(&["", "Adubo NPK", "ADUBO001"])).expect("valid row");
        assert!(record.barcode.is_none());
    }

    #[test]
    fn two_fields_is_malformed() {
        let err = parse_record(&fields(&["A", "B"])).expect_err("short row");
        assert_eq!(err, RowError::MalformedRow(2));
    }

    #[test]
    fn empty_required_fields_are_rejected() {
        // ";;" parses into three empty fields
        let err = parse_record(&parse_line(";;")).expect_err("all empty");
        assert_eq!(err, RowError::MissingRequiredField("description"));

        let err = parse_record(&fields(&["123", "Descrição", ""])).expect_err("empty code");
        assert_eq!(err, RowError::MissingRequiredField("code"));
    }

    #[test]
    fn parses_quoted_source_line_end_to_end() {
        let record = parse_record(&parse_line("7891000;\"FECHO 3\"\" REF:839\";FECHO839"))
            .expect("valid row");
        assert_eq!(record.description, "FECHO 3\" REF:839");
        assert_eq!(record.code, "FECHO839");
    }
}
