use tracing::{debug, info};

use crate::config::ExtractionConfig;
use crate::error::DocsheetError;
use crate::extraction::{PdfBackend, RasterRenderer, RecognitionEngine};
use crate::layout::reconstruct_rows;
use crate::model::{ExtractionMethod, ExtractionResult, Row, Table};
use crate::progress::ProgressTracker;

/// Per-page extraction over a PDF.
///
/// Pages are visited strictly in order. A page whose text layer holds at least
/// one non-blank fragment is reconstructed from that layer; any other page is
/// rasterized and run through OCR, one single-cell row per recognized line.
/// All rows land in one aggregate table.
pub struct PageAnalyzer<'a> {
    pub backend: &'a dyn PdfBackend,
    pub renderer: &'a dyn RasterRenderer,
    pub engine: &'a dyn RecognitionEngine,
    pub config: &'a ExtractionConfig,
}

impl PageAnalyzer<'_> {
    pub fn analyze(
        &self,
        pdf_bytes: &[u8],
        progress: &mut ProgressTracker<'_>,
    ) -> Result<ExtractionResult, DocsheetError> {
        let document = self.backend.open(pdf_bytes)?;
        let total = document.page_count();
        info!(
            pages = total,
            backend = self.backend.backend_name(),
            "opened PDF"
        );

        let mut rows: Vec<Row> = Vec::new();
        let mut ocr_pages = 0;

        for page in 1..=total {
            let fragments = document.text_fragments(page)?;

            if fragments.iter().any(|f| !f.is_blank()) {
                let page_rows = reconstruct_rows(&fragments, self.config.row_tolerance);
                debug!(
                    page,
                    fragments = fragments.len(),
                    rows = page_rows.len(),
                    "using text layer"
                );
                rows.extend(page_rows);
            } else {
                info!(page, engine = self.engine.engine_name(), "no usable text layer, running OCR");
                ocr_pages += 1;

                let image = self
                    .renderer
                    .render(document.as_ref(), page, self.config.raster_scale)?;
                let text = self
                    .engine
                    .recognize(&image, &mut |fraction| {
                        progress.ocr_progress(page, total, fraction)
                    })
                    .map_err(|e| match e {
                        DocsheetError::Recognition { .. } => e,
                        other => DocsheetError::Recognition {
                            page,
                            reason: other.to_string(),
                        },
                    })?;

                rows.extend(ocr_rows(&text));
            }

            progress.page_completed(page, total);
        }

        let method = ExtractionMethod::from_page_counts(ocr_pages, total);
        let table = Table::new(rows);
        let plain_text = table.to_plain_text();
        info!(
            rows = table.rows.len(),
            method = %method,
            "PDF extraction finished"
        );

        Ok(ExtractionResult::tabular(vec![table], plain_text, method))
    }
}

/// One single-cell row per line of recognized text.
fn ocr_rows(text: &str) -> impl Iterator<Item = Row> + '_ {
    text.split('\n').map(|line| vec![line.to_string()])
}
