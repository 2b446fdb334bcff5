use std::ffi::OsStr;
use std::path::PathBuf;

use tracing::debug;

use crate::error::DocsheetError;
use crate::extraction::{run_tool, tool_failed, PdfDocument, RasterImage, RasterRenderer};

/// Resolution of a PDF page at scale 1.0.
const POINTS_PER_INCH: f32 = 72.0;

/// Raster renderer using `pdftoppm` (from poppler-utils).
pub struct PdftoppmRenderer {
    pdftoppm: PathBuf,
}

impl PdftoppmRenderer {
    pub fn new(pdftoppm: impl Into<PathBuf>) -> Self {
        PdftoppmRenderer {
            pdftoppm: pdftoppm.into(),
        }
    }
}

impl Default for PdftoppmRenderer {
    fn default() -> Self {
        Self::new("pdftoppm")
    }
}

impl RasterRenderer for PdftoppmRenderer {
    fn render(
        &self,
        document: &dyn PdfDocument,
        page_number: usize,
        scale: f32,
    ) -> Result<RasterImage, DocsheetError> {
        let render_error = |reason: String| DocsheetError::Render {
            page: page_number,
            reason,
        };

        let source = document
            .source_path()
            .ok_or_else(|| render_error("document has no file to render from".into()))?;

        let out_dir = tempfile::tempdir()?;
        let prefix = out_dir.path().join("page");
        let page = page_number.to_string();
        let dpi = dpi_for_scale(scale).to_string();

        debug!(page = page_number, dpi = %dpi, "rasterizing page");
        let output = run_tool(
            &self.pdftoppm,
            [
                OsStr::new("-f"),
                OsStr::new(&page),
                OsStr::new("-l"),
                OsStr::new(&page),
                OsStr::new("-r"),
                OsStr::new(&dpi),
                OsStr::new("-png"),
                OsStr::new("-singlefile"),
                source.as_os_str(),
                prefix.as_os_str(),
            ],
        )?;

        if !output.status.success() {
            return Err(render_error(tool_failed(&self.pdftoppm, &output).to_string()));
        }

        let png = std::fs::read(prefix.with_extension("png"))
            .map_err(|e| render_error(format!("pdftoppm produced no image: {e}")))?;

        Ok(RasterImage {
            page_number,
            scale,
            png,
        })
    }
}

fn dpi_for_scale(scale: f32) -> u32 {
    (POINTS_PER_INCH * scale).round().max(1.0) as u32
}
