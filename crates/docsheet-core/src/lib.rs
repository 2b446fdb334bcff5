pub mod analyzer;
pub mod config;
pub mod error;
pub mod export;
pub mod extraction;
pub mod html;
pub mod layout;
pub mod model;
pub mod progress;

use std::fmt;

use tracing::{info, warn};

use analyzer::PageAnalyzer;
use config::ExtractionConfig;
use error::DocsheetError;
use extraction::pdftoppm::PdftoppmRenderer;
use extraction::poppler::PopplerBackend;
use extraction::tesseract::TesseractEngine;
use extraction::{PdfBackend, RasterRenderer, RecognitionEngine};
use model::ExtractionResult;
use progress::{ProgressSink, ProgressTracker};

/// Kind of document accepted for extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Html,
}

impl DocumentKind {
    /// Decide the document kind from its MIME type, falling back to the
    /// `.html` extension for markup.
    pub fn detect(mime_type: Option<&str>, file_name: &str) -> Result<Self, DocsheetError> {
        let mime = mime_type.map(|m| m.trim().to_ascii_lowercase());
        match mime.as_deref() {
            Some("application/pdf") => Ok(DocumentKind::Pdf),
            Some("text/html") => Ok(DocumentKind::Html),
            _ if file_name.ends_with(".html") => Ok(DocumentKind::Html),
            other => Err(DocsheetError::UnsupportedFileType(
                other.map_or_else(|| file_name.to_string(), str::to_string),
            )),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Pdf => write!(f, "PDF"),
            DocumentKind::Html => write!(f, "HTML"),
        }
    }
}

/// One uploaded file.
#[derive(Debug, Clone, Copy)]
pub struct InputDocument<'a> {
    pub file_name: &'a str,
    pub mime_type: Option<&'a str>,
    pub bytes: &'a [u8],
}

/// Extraction pipeline with its external collaborators.
///
/// Each call to [`Extractor::extract`] is an independent session: progress
/// starts at 0, pages are processed one after another on the calling thread,
/// and nothing carries over to the next file.
pub struct Extractor {
    config: ExtractionConfig,
    backend: Box<dyn PdfBackend>,
    renderer: Box<dyn RasterRenderer>,
    engine: Box<dyn RecognitionEngine>,
}

impl Extractor {
    pub fn new(
        config: ExtractionConfig,
        backend: Box<dyn PdfBackend>,
        renderer: Box<dyn RasterRenderer>,
        engine: Box<dyn RecognitionEngine>,
    ) -> Self {
        Extractor {
            config,
            backend,
            renderer,
            engine,
        }
    }

    /// Pipeline backed by poppler-utils and tesseract, as configured.
    pub fn with_local_tools(config: ExtractionConfig) -> Self {
        let backend = PopplerBackend::new(config.tools.pdftotext.clone());
        let renderer = PdftoppmRenderer::new(config.tools.pdftoppm.clone());
        let engine = TesseractEngine::new(config.tools.tesseract.clone(), config.ocr_language.clone());
        Self::new(config, Box::new(backend), Box::new(renderer), Box::new(engine))
    }

    /// Run one session and fold any failure into the result: the diagnostic
    /// replaces the text, tables are cleared and the method is `None`.
    pub fn extract(&self, input: &InputDocument<'_>, sink: &mut dyn ProgressSink) -> ExtractionResult {
        match self.try_extract(input, sink) {
            Ok(result) => result,
            Err(e) => {
                warn!(file = input.file_name, error = %e, "extraction failed");
                ExtractionResult::failed(e.diagnostic())
            }
        }
    }

    /// Run one session, surfacing failures as typed errors.
    ///
    /// On error nothing accumulated so far is returned and progress reporting
    /// stops where it was.
    pub fn try_extract(
        &self,
        input: &InputDocument<'_>,
        sink: &mut dyn ProgressSink,
    ) -> Result<ExtractionResult, DocsheetError> {
        let mut progress = ProgressTracker::new(sink);

        let outcome = DocumentKind::detect(input.mime_type, input.file_name).and_then(|kind| {
            info!(file = input.file_name, kind = %kind, bytes = input.bytes.len(), "extracting");
            match kind {
                DocumentKind::Pdf => PageAnalyzer {
                    backend: self.backend.as_ref(),
                    renderer: self.renderer.as_ref(),
                    engine: self.engine.as_ref(),
                    config: &self.config,
                }
                .analyze(input.bytes, &mut progress),
                DocumentKind::Html => html::extract_html(input.bytes),
            }
        });

        match outcome {
            Ok(result) => {
                progress.complete();
                Ok(result)
            }
            Err(e) => {
                progress.halt();
                Err(e)
            }
        }
    }
}
