use docsheet_core::export::{Sheet, Workbook};
use docsheet_core::model::ExtractionResult;

/// Widest a column is allowed to grow before cells are cut.
const MAX_COLUMN_WIDTH: usize = 40;

pub fn print(result: &ExtractionResult) {
    println!("{}\n", result.summary());

    if result.is_failure() {
        return;
    }

    if result.is_table {
        for (idx, table) in result.tables.iter().enumerate() {
            if result.tables.len() > 1 {
                println!("--- Table {} ---", idx + 1);
            }
            print_grid(&table.rows);
            println!();
        }
    } else {
        println!("{}", result.plain_text);
    }
}

pub fn print_workbook(workbook: &Workbook) {
    for (i, sheet) in workbook.sheets.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print_sheet(sheet);
    }
}

fn print_sheet(sheet: &Sheet) {
    println!("=== {} ({} rows) ===\n", sheet.name, sheet.rows.len());
    print_grid(&sheet.rows);
}

fn print_grid(rows: &[Vec<String>]) {
    let col_count = rows.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..col_count)
        .map(|col| {
            rows.iter()
                .filter_map(|r| r.get(col))
                .map(|c| c.chars().count())
                .max()
                .unwrap_or(0)
                .min(MAX_COLUMN_WIDTH)
        })
        .collect();

    for row in rows {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(col, cell)| format!("{:<width$}", clip(cell), width = widths[col]))
            .collect();
        println!("  {}", line.join(" | ").trim_end());
    }
}

fn clip(cell: &str) -> String {
    let single_line = cell.replace('\n', " ");
    if single_line.chars().count() <= MAX_COLUMN_WIDTH {
        return single_line;
    }
    let cut: String = single_line.chars().take(MAX_COLUMN_WIDTH - 1).collect();
    format!("{cut}…")
}
