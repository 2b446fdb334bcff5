use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::error::DocsheetError;
use crate::extraction::{run_tool, tool_failed, PdfBackend, PdfDocument};
use crate::model::TextFragment;

/// pdftotext exit code for "error opening the PDF file".
const EXIT_OPEN_FAILED: i32 = 1;

/// PDF backend using `pdftotext -bbox-layout` (from poppler-utils).
///
/// Every text line poppler detects becomes one [`TextFragment`]. Poppler
/// starts a new line or block at wide horizontal gaps, so separate table
/// cells stay separate fragments while multi-word cells stay whole. Boxes
/// come with a top-left origin and are converted to a bottom-left origin
/// using the bottom edge of the line box.
pub struct PopplerBackend {
    pdftotext: PathBuf,
}

impl PopplerBackend {
    pub fn new(pdftotext: impl Into<PathBuf>) -> Self {
        PopplerBackend {
            pdftotext: pdftotext.into(),
        }
    }
}

impl Default for PopplerBackend {
    fn default() -> Self {
        Self::new("pdftotext")
    }
}

impl PdfBackend for PopplerBackend {
    fn open(&self, pdf_bytes: &[u8]) -> Result<Box<dyn PdfDocument>, DocsheetError> {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile()?;
        file.write_all(pdf_bytes)?;
        file.flush()?;

        let output = run_tool(
            &self.pdftotext,
            [
                file.path().as_os_str(),
                OsStr::new("-bbox-layout"),
                OsStr::new("-enc"),
                OsStr::new("UTF-8"),
                OsStr::new("-"),
            ],
        )?;

        if !output.status.success() {
            let err = tool_failed(&self.pdftotext, &output);
            return Err(match output.status.code() {
                Some(EXIT_OPEN_FAILED) => DocsheetError::pdf_parse(err.to_string()),
                _ => err,
            });
        }

        let xml = String::from_utf8_lossy(&output.stdout);
        let pages = parse_bbox_xml(&xml)?;
        debug!(pages = pages.len(), "pdftotext read document");

        Ok(Box::new(PopplerDocument { file, pages }))
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

/// Document opened by [`PopplerBackend`]. Keeps the temp copy alive so that
/// renderers can work from its path.
pub struct PopplerDocument {
    file: tempfile::NamedTempFile,
    pages: Vec<Vec<TextFragment>>,
}

impl PdfDocument for PopplerDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn text_fragments(&self, page_number: usize) -> Result<Vec<TextFragment>, DocsheetError> {
        page_number
            .checked_sub(1)
            .and_then(|i| self.pages.get(i))
            .cloned()
            .ok_or_else(|| {
                DocsheetError::pdf_parse(format!(
                    "page {page_number} out of range (document has {} pages)",
                    self.pages.len()
                ))
            })
    }

    fn source_path(&self) -> Option<&Path> {
        Some(self.file.path())
    }
}

#[derive(Debug, Default)]
struct LineBox {
    x_min: f64,
    y_max: f64,
    words: Vec<String>,
}

/// Parse `pdftotext -bbox-layout` XHTML into per-page fragments, one per
/// `<line>`: its words joined by a space, positioned at the line's box.
fn parse_bbox_xml(xml: &str) -> Result<Vec<Vec<TextFragment>>, DocsheetError> {
    let mut reader = Reader::from_str(xml);
    let mut pages: Vec<Vec<TextFragment>> = Vec::new();
    let mut page_height = 0.0;
    let mut line: Option<LineBox> = None;
    let mut in_word = false;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(tag) if tag.local_name().as_ref() == b"page" => {
                page_height = attr_f64(&tag, b"height")?.unwrap_or(0.0);
                pages.push(Vec::new());
            }
            Event::Empty(tag) if tag.local_name().as_ref() == b"page" => {
                pages.push(Vec::new());
            }
            Event::Start(tag) if tag.local_name().as_ref() == b"line" => {
                line = Some(LineBox {
                    x_min: attr_f64(&tag, b"xMin")?.unwrap_or(0.0),
                    y_max: attr_f64(&tag, b"yMax")?.unwrap_or(0.0),
                    words: Vec::new(),
                });
            }
            Event::Start(tag) if tag.local_name().as_ref() == b"word" => {
                in_word = true;
                if let Some(l) = line.as_mut() {
                    l.words.push(String::new());
                }
            }
            Event::Text(text) if in_word => {
                if let Some(word) = line.as_mut().and_then(|l| l.words.last_mut()) {
                    word.push_str(&text.unescape().map_err(xml_error)?);
                }
            }
            Event::End(tag) if tag.local_name().as_ref() == b"word" => {
                in_word = false;
            }
            Event::End(tag) if tag.local_name().as_ref() == b"line" => {
                let page_index = pages.len().saturating_sub(1);
                let (Some(l), Some(page)) = (line.take(), pages.last_mut()) else {
                    continue;
                };
                let text = l
                    .words
                    .iter()
                    .map(|w| w.trim())
                    .filter(|w| !w.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                if !text.is_empty() {
                    page.push(TextFragment {
                        text,
                        x: l.x_min,
                        y: page_height - l.y_max,
                        page_index,
                    });
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(pages)
}

fn attr_f64(tag: &BytesStart<'_>, name: &[u8]) -> Result<Option<f64>, DocsheetError> {
    for attr in tag.attributes() {
        let attr = attr.map_err(xml_error)?;
        if attr.key.local_name().as_ref() == name {
            let value = attr.unescape_value().map_err(xml_error)?;
            return Ok(value.trim().parse().ok());
        }
    }
    Ok(None)
}

fn xml_error(e: impl std::fmt::Display) -> DocsheetError {
    DocsheetError::pdf_parse(format!("unreadable pdftotext output: {e}"))
}
