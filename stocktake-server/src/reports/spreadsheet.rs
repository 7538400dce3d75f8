//! XLSX inventory export
//!
//! One sheet, four fixed-width columns, built entirely in memory.

use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};

use shared::ConsolidatedRow;

use crate::utils::AppError;

const SHEET_NAME: &str = "Inventário";

// (header, width) per column
const COLUMNS: [(&str, f64); 4] = [
    ("CÓDIGO INTERNO", 15.0),
    ("CÓDIGO EAN", 18.0),
    ("DESCRIÇÃO", 50.0),
    ("QUANTIDADE", 15.0),
];

/// Build the consolidated inventory workbook and return its bytes.
pub fn build_inventory_xlsx(rows: &[ConsolidatedRow]) -> Result<Vec<u8>, AppError> {
    build(rows).map_err(|e| AppError::internal(format!("XLSX generation failed: {e}")))
}

fn build(rows: &[ConsolidatedRow]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();
    worksheet.set_name(SHEET_NAME)?;

    for (col, (header, width)) in COLUMNS.iter().enumerate() {
        worksheet.set_column_width(col as u16, *width)?;
        worksheet.write_string(0, col as u16, *header)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        worksheet.write_string(r, 0, &row.code)?;
        worksheet.write_string(r, 1, row.barcode.as_deref().unwrap_or(""))?;
        worksheet.write_string(r, 2, &row.description)?;
        worksheet.write_number(r, 3, row.quantity)?;
    }

    workbook.push_worksheet(worksheet);
    workbook.save_to_buffer()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_a_zip_container() {
        let rows = vec![ConsolidatedRow {
            code: "ADUBO001".into(),
            description: "Adubo NPK".into(),
            category: None,
            barcode: Some("7891000100101".into()),
            unit: "UN".into(),
            quantity: 5.0,
            record_count: 1,
            contributors: vec!["Ana".into()],
            last_updated_at: 0,
        }];
        let bytes = build_inventory_xlsx(&rows).unwrap();
        // XLSX is a ZIP archive: PK magic
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn empty_report_still_produces_a_workbook() {
        let bytes = build_inventory_xlsx(&[]).unwrap();
        assert!(!bytes.is_empty());
    }
}
