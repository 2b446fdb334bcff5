//! Table extraction from HTML markup.
//!
//! Every `<table>` becomes one [`Table`]; rows and cells are visited in the
//! same order the DOM's `table.rows` / `row.cells` collections expose them.
//! Documents without any table fall back to the text content of `<body>`.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::error::DocsheetError;
use crate::model::{ExtractionMethod, ExtractionResult, Row, Table};

pub fn extract_html(source: &[u8]) -> Result<ExtractionResult, DocsheetError> {
    let html = std::str::from_utf8(source)
        .map_err(|e| DocsheetError::html_parse(format!("document is not valid UTF-8: {e}")))?;
    extract_html_str(html)
}

pub fn extract_html_str(html: &str) -> Result<ExtractionResult, DocsheetError> {
    let document = Html::parse_document(html);
    let table_selector = selector("table")?;

    let tables: Vec<Table> = document
        .select(&table_selector)
        .map(|table| Table::new(table_rows(table).into_iter().map(row_cells).collect()))
        .collect();

    if tables.is_empty() {
        let body_selector = selector("body")?;
        let text: String = document
            .select(&body_selector)
            .next()
            .map(|body| body.text().collect())
            .unwrap_or_default();
        debug!(chars = text.len(), "no <table> elements, using body text");
        return Ok(ExtractionResult::text(text, ExtractionMethod::TextExtraction));
    }

    debug!(tables = tables.len(), "extracted HTML tables");
    let plain_text = tables
        .iter()
        .map(Table::to_plain_text)
        .collect::<Vec<_>>()
        .join("\n\n");
    Ok(ExtractionResult::tabular(
        tables,
        plain_text,
        ExtractionMethod::TextExtraction,
    ))
}

fn selector(css: &str) -> Result<Selector, DocsheetError> {
    Selector::parse(css).map_err(|e| DocsheetError::html_parse(format!("{e:?}")))
}

/// Rows of `table` only (not of nested tables): `<thead>` rows first, then
/// direct and `<tbody>` rows in tree order, then `<tfoot>` rows.
fn table_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut head = Vec::new();
    let mut body = Vec::new();
    let mut foot = Vec::new();

    for child in child_elements(table) {
        match child.value().name() {
            "tr" => body.push(child),
            "thead" => head.extend(child_elements(child).filter(|e| is_named(e, "tr"))),
            "tbody" => body.extend(child_elements(child).filter(|e| is_named(e, "tr"))),
            "tfoot" => foot.extend(child_elements(child).filter(|e| is_named(e, "tr"))),
            _ => {}
        }
    }

    head.into_iter().chain(body).chain(foot).collect()
}

fn row_cells(row: ElementRef<'_>) -> Row {
    child_elements(row)
        .filter(|e| is_named(e, "td") || is_named(e, "th"))
        .map(|cell| cell.text().collect::<String>().trim().to_string())
        .collect()
}

fn child_elements<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element.children().filter_map(ElementRef::wrap)
}

fn is_named(element: &ElementRef<'_>, name: &str) -> bool {
    element.value().name() == name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_table_cells_trimmed() {
        let result =
            extract_html_str("<table><tr><td> foo </td><td>bar</td></tr></table>").unwrap();
        assert!(result.is_table);
        assert_eq!(result.method, ExtractionMethod::TextExtraction);
        assert_eq!(result.tables, vec![Table::new(vec![vec!["foo".into(), "bar".into()]])]);
    }

    #[test]
    fn test_multiple_tables_in_document_order() {
        let html = r#"
            <html><body>
              <table><tr><th>Name</th><th>Qty</th></tr><tr><td>Apple</td><td>3</td></tr></table>
              <p>between</p>
              <table><tr><td>second</td></tr></table>
            </body></html>"#;
        let result = extract_html_str(html).unwrap();
        assert_eq!(result.tables.len(), 2);
        assert_eq!(result.tables[0].rows, vec![vec!["Name", "Qty"], vec!["Apple", "3"]]);
        assert_eq!(result.tables[1].rows, vec![vec!["second"]]);
    }

    #[test]
    fn test_section_order_head_body_foot() {
        let html = r#"<table>
            <tfoot><tr><td>foot</td></tr></tfoot>
            <tbody><tr><td>body</td></tr></tbody>
            <thead><tr><td>head</td></tr></thead>
        </table>"#;
        let result = extract_html_str(html).unwrap();
        assert_eq!(
            result.tables[0].rows,
            vec![vec!["head"], vec!["body"], vec!["foot"]]
        );
    }

    #[test]
    fn test_nested_table_text_stays_in_outer_cell() {
        let html = r#"<table><tr>
            <td>outer <table><tr><td>inner</td></tr></table></td>
            <td>next</td>
        </tr></table>"#;
        let result = extract_html_str(html).unwrap();
        assert_eq!(result.tables.len(), 2);
        assert_eq!(result.tables[0].rows.len(), 1);
        assert_eq!(result.tables[0].rows[0][0], "outer inner");
        assert_eq!(result.tables[0].rows[0][1], "next");
        assert_eq!(result.tables[1].rows, vec![vec!["inner"]]);
    }

    #[test]
    fn test_cell_text_concatenates_descendants() {
        let html = "<table><tr><td><b>bold</b> and <i>italic</i>\n</td></tr></table>";
        let result = extract_html_str(html).unwrap();
        assert_eq!(result.tables[0].rows, vec![vec!["bold and italic"]]);
    }

    #[test]
    fn test_no_tables_falls_back_to_body_text() {
        let result = extract_html_str("<html><body>hello world</body></html>").unwrap();
        assert!(!result.is_table);
        assert!(result.tables.is_empty());
        assert_eq!(result.plain_text, "hello world");
    }

    #[test]
    fn test_body_text_is_not_trimmed() {
        let result = extract_html_str("<body>\n  <p>a</p>\n</body>").unwrap();
        assert!(result.plain_text.starts_with("\n  a"));
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let err = extract_html(&[0x3c, 0x70, 0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, DocsheetError::DocumentParse { kind: "HTML", .. }));
    }
}
