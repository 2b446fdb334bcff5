use serde::{Deserialize, Serialize};
use std::fmt;

/// A positioned run of text from a PDF page's text layer.
///
/// Coordinates are in page space with the origin at the bottom-left corner,
/// so `y` grows upward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub page_index: usize,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, x: f64, y: f64, page_index: usize) -> Self {
        TextFragment {
            text: text.into(),
            x,
            y,
            page_index,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Cells of one row, left to right.
pub type Row = Vec<String>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(rows: Vec<Row>) -> Self {
        Table { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cells joined by a single space, rows joined by newlines.
    pub fn to_plain_text(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.join(" "))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    TextExtraction,
    Ocr,
    Mixed,
    None,
}

impl ExtractionMethod {
    /// Derive the session method from how many processed pages needed OCR.
    pub fn from_page_counts(ocr_pages: usize, total_pages: usize) -> Self {
        if total_pages == 0 || ocr_pages == 0 {
            ExtractionMethod::TextExtraction
        } else if ocr_pages == total_pages {
            ExtractionMethod::Ocr
        } else {
            ExtractionMethod::Mixed
        }
    }

    pub fn used_ocr(&self) -> bool {
        matches!(self, ExtractionMethod::Ocr | ExtractionMethod::Mixed)
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMethod::TextExtraction => write!(f, "Text Extraction"),
            ExtractionMethod::Ocr => write!(f, "OCR"),
            ExtractionMethod::Mixed => write!(f, "Mixed"),
            ExtractionMethod::None => write!(f, "None"),
        }
    }
}

/// Outcome of one extraction session.
///
/// `is_table` selects which view is authoritative: `tables` when true,
/// `plain_text` otherwise. A failed session carries its diagnostic in
/// `plain_text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub tables: Vec<Table>,
    pub plain_text: String,
    pub method: ExtractionMethod,
    pub is_table: bool,
}

impl ExtractionResult {
    pub fn tabular(tables: Vec<Table>, plain_text: String, method: ExtractionMethod) -> Self {
        let is_table = !tables.is_empty();
        ExtractionResult {
            tables,
            plain_text,
            method,
            is_table,
        }
    }

    pub fn text(plain_text: String, method: ExtractionMethod) -> Self {
        ExtractionResult {
            tables: Vec::new(),
            plain_text,
            method,
            is_table: false,
        }
    }

    pub fn failed(diagnostic: String) -> Self {
        ExtractionResult {
            tables: Vec::new(),
            plain_text: diagnostic,
            method: ExtractionMethod::None,
            is_table: false,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.method == ExtractionMethod::None
    }

    /// Short status line for display next to the result.
    pub fn summary(&self) -> String {
        if self.is_failure() {
            return self.plain_text.clone();
        }
        if self.is_table {
            let rows: usize = self.tables.iter().map(|t| t.rows.len()).sum();
            format!(
                "{} table(s), {} row(s) extracted via {}",
                self.tables.len(),
                rows,
                self.method
            )
        } else {
            format!("Plain text extracted via {}", self.method)
        }
    }
}
