use std::ffi::OsStr;
use std::io::Write;
use std::path::PathBuf;

use tracing::debug;

use crate::error::DocsheetError;
use crate::extraction::{run_tool, tool_failed, RasterImage, RecognitionEngine};

/// Recognition engine running the `tesseract` CLI on each page image.
///
/// The CLI gives no intermediate progress, so only the start (0.0) and the
/// end (1.0) of recognition are reported.
pub struct TesseractEngine {
    tesseract: PathBuf,
    language: String,
}

impl TesseractEngine {
    pub fn new(tesseract: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        TesseractEngine {
            tesseract: tesseract.into(),
            language: language.into(),
        }
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new("tesseract", crate::config::DEFAULT_OCR_LANGUAGE)
    }
}

impl RecognitionEngine for TesseractEngine {
    fn recognize(
        &self,
        image: &RasterImage,
        progress: &mut dyn FnMut(f32),
    ) -> Result<String, DocsheetError> {
        progress(0.0);

        let mut file = tempfile::Builder::new().suffix(".png").tempfile()?;
        file.write_all(&image.png)?;
        file.flush()?;

        debug!(page = image.page_number, lang = %self.language, "running OCR");
        let output = run_tool(
            &self.tesseract,
            [
                file.path().as_os_str(),
                OsStr::new("stdout"),
                OsStr::new("-l"),
                OsStr::new(&self.language),
            ],
        )?;

        if !output.status.success() {
            return Err(tool_failed(&self.tesseract, &output));
        }

        progress(1.0);
        Ok(strip_page_separator(&String::from_utf8_lossy(&output.stdout)).to_string())
    }

    fn engine_name(&self) -> &str {
        "tesseract"
    }
}

/// tesseract terminates each page with a form feed; drop it.
fn strip_page_separator(text: &str) -> &str {
    text.strip_suffix('\x0c').unwrap_or(text)
}
