use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DocsheetError {
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("failed to parse {kind} document: {reason}")]
    DocumentParse { kind: &'static str, reason: String },

    #[error("text recognition failed on page {page}: {reason}")]
    Recognition { page: usize, reason: String },

    #[error("failed to render page {page}: {reason}")]
    Render { page: usize, reason: String },

    #[error("{tool} not found. Install poppler-utils and tesseract-ocr, or point the config at the binaries")]
    ToolNotFound { tool: String },

    #[error("{tool} failed with exit code {code}: {stderr}")]
    ToolFailed {
        tool: String,
        code: i32,
        stderr: String,
    },

    #[error("failed to write workbook: {0}")]
    Export(String),

    #[error("failed to read workbook: {0}")]
    Workbook(String),

    #[error("invalid configuration in {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DocsheetError {
    pub(crate) fn pdf_parse(reason: impl Into<String>) -> Self {
        DocsheetError::DocumentParse {
            kind: "PDF",
            reason: reason.into(),
        }
    }

    pub(crate) fn html_parse(reason: impl Into<String>) -> Self {
        DocsheetError::DocumentParse {
            kind: "HTML",
            reason: reason.into(),
        }
    }

    /// Message shown in place of the extracted text when a session fails.
    pub fn diagnostic(&self) -> String {
        match self {
            DocsheetError::UnsupportedFileType(_) => "Unsupported file type.".to_string(),
            DocsheetError::DocumentParse { kind, reason } => {
                format!("{kind} parsing error: {reason}")
            }
            DocsheetError::Recognition { page, reason } => {
                format!("Recognition failed: page {page}: {reason}")
            }
            _ => format!("Extraction failed: {self}"),
        }
    }
}
