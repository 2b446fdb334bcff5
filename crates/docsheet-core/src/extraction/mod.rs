pub mod pdftoppm;
pub mod poppler;
pub mod tesseract;

use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, Output};

use tracing::debug;

use crate::error::DocsheetError;
use crate::model::TextFragment;

/// Backend that opens PDF bytes into a page-addressable document.
pub trait PdfBackend: Send + Sync {
    fn open(&self, pdf_bytes: &[u8]) -> Result<Box<dyn PdfDocument>, DocsheetError>;

    /// Name of this backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// An opened PDF. Pages are numbered from 1.
pub trait PdfDocument {
    fn page_count(&self) -> usize;

    /// Text-layer fragments of one page, in content-stream order.
    fn text_fragments(&self, page_number: usize) -> Result<Vec<TextFragment>, DocsheetError>;

    /// File backing this document, for renderers that work on paths.
    fn source_path(&self) -> Option<&Path> {
        None
    }
}

/// A rasterized page, PNG-encoded.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pub page_number: usize,
    pub scale: f32,
    pub png: Vec<u8>,
}

/// Page + scale factor to bitmap.
pub trait RasterRenderer: Send + Sync {
    fn render(
        &self,
        document: &dyn PdfDocument,
        page_number: usize,
        scale: f32,
    ) -> Result<RasterImage, DocsheetError>;
}

/// Optical character recognition over a rasterized page.
pub trait RecognitionEngine: Send + Sync {
    /// Recognize the text in `image`. `progress` receives fractions in
    /// `[0, 1]` while recognition runs.
    fn recognize(
        &self,
        image: &RasterImage,
        progress: &mut dyn FnMut(f32),
    ) -> Result<String, DocsheetError>;

    fn engine_name(&self) -> &str;
}

/// Run an external tool, mapping a missing binary to `ToolNotFound`.
pub(crate) fn run_tool<I, S>(program: &Path, args: I) -> Result<Output, DocsheetError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let tool = tool_name(program);
    debug!(tool = %tool, "running external tool");
    Command::new(program).args(args).output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DocsheetError::ToolNotFound { tool }
        } else {
            DocsheetError::Io(e)
        }
    })
}

pub(crate) fn tool_failed(program: &Path, output: &Output) -> DocsheetError {
    DocsheetError::ToolFailed {
        tool: tool_name(program),
        code: output.status.code().unwrap_or(-1),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

fn tool_name(program: &Path) -> String {
    program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string())
}
