use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};

use crate::error::DocsheetError;
use crate::export::{Sheet, Workbook};

/// Read an `.xlsx` file back into string grids, one [`Sheet`] per worksheet.
///
/// Rows keep their absolute position (leading blank rows and columns are
/// preserved); trailing empty cells of each row are dropped.
pub fn read_workbook(bytes: &[u8]) -> Result<Workbook, DocsheetError> {
    let cursor = Cursor::new(bytes);
    let mut workbook: Xlsx<_> = calamine::open_workbook_from_rs(cursor)
        .map_err(|e| DocsheetError::Workbook(format!("failed to open xlsx: {e}")))?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| DocsheetError::Workbook(format!("sheet '{name}' unreadable: {e}")))?;

        let (first_row, first_col) = range.start().unwrap_or((0, 0));
        let mut rows: Vec<Vec<String>> = vec![Vec::new(); first_row as usize];
        for cells in range.rows() {
            let mut row: Vec<String> = vec![String::new(); first_col as usize];
            let used = cells
                .iter()
                .rposition(|c| !matches!(c, Data::Empty))
                .map_or(0, |last| last + 1);
            row.extend(cells[..used].iter().map(cell_as_string));
            rows.push(row);
        }

        sheets.push(Sheet { name, rows });
    }

    Ok(Workbook { sheets })
}

fn cell_as_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::Empty => String::new(),
        _ => format!("{cell}"),
    }
}
