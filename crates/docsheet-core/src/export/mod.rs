//! Conversion of an [`ExtractionResult`] into a spreadsheet workbook.
//!
//! Table results become one sheet per table (`Table1`, `Table2`, ...). Text
//! results become a single `OCR Text` sheet holding the whole text in A1.
//! Cells are written verbatim as strings.

pub mod reader;
pub mod xlsx;

use std::path::Path;

use tracing::info;

use crate::error::DocsheetError;
use crate::model::{ExtractionResult, Row};

pub const TEXT_SHEET_NAME: &str = "OCR Text";

/// File name used when the caller does not pick one.
pub const DEFAULT_OUTPUT_FILE: &str = "ocr_result.xlsx";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn from_result(result: &ExtractionResult) -> Self {
        let sheets = if result.tables.is_empty() {
            vec![Sheet {
                name: TEXT_SHEET_NAME.to_string(),
                rows: vec![vec![result.plain_text.clone()]],
            }]
        } else {
            result
                .tables
                .iter()
                .enumerate()
                .map(|(idx, table)| Sheet {
                    name: format!("Table{}", idx + 1),
                    rows: table.rows.clone(),
                })
                .collect()
        };
        Workbook { sheets }
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Build the complete `.xlsx` file in memory.
pub fn export_xlsx(result: &ExtractionResult) -> Result<Vec<u8>, DocsheetError> {
    let workbook = Workbook::from_result(result);
    let bytes = xlsx::write_workbook(&workbook)?;
    info!(
        sheets = workbook.sheets.len(),
        bytes = bytes.len(),
        "built workbook"
    );
    Ok(bytes)
}

/// Build the workbook and write it to `path` in one go.
pub fn write_xlsx_file(result: &ExtractionResult, path: &Path) -> Result<(), DocsheetError> {
    let bytes = export_xlsx(result)?;
    std::fs::write(path, bytes)?;
    Ok(())
}
