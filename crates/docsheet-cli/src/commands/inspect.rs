use docsheet_core::error::DocsheetError;
use docsheet_core::export::reader::read_workbook;
use std::path::Path;

use crate::output;

pub fn run(path: &Path) -> Result<(), DocsheetError> {
    let bytes = std::fs::read(path)?;
    let workbook = read_workbook(&bytes)?;
    output::table::print_workbook(&workbook);
    Ok(())
}
