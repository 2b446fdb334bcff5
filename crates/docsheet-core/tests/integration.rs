//! End-to-end tests for the extraction session.
//!
//! Mock backends stand in for poppler and tesseract, so these tests run
//! without any external tools installed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use docsheet_core::config::ExtractionConfig;
use docsheet_core::error::DocsheetError;
use docsheet_core::export::reader::read_workbook;
use docsheet_core::export::{export_xlsx, TEXT_SHEET_NAME};
use docsheet_core::extraction::{
    PdfBackend, PdfDocument, RasterImage, RasterRenderer, RecognitionEngine,
};
use docsheet_core::model::{ExtractionMethod, ExtractionResult, TextFragment};
use docsheet_core::{Extractor, InputDocument};

// ---------------------------------------------------------------------------
// Mock collaborators
// ---------------------------------------------------------------------------

struct MockBackend {
    pages: Vec<Vec<(&'static str, f64, f64)>>,
    fail_open: bool,
}

struct MockDocument {
    pages: Vec<Vec<TextFragment>>,
}

impl PdfBackend for MockBackend {
    fn open(&self, _pdf_bytes: &[u8]) -> Result<Box<dyn PdfDocument>, DocsheetError> {
        if self.fail_open {
            return Err(DocsheetError::DocumentParse {
                kind: "PDF",
                reason: "Couldn't find trailer dictionary".into(),
            });
        }
        let pages = self
            .pages
            .iter()
            .enumerate()
            .map(|(idx, frags)| {
                frags
                    .iter()
                    .map(|(text, x, y)| TextFragment::new(*text, *x, *y, idx))
                    .collect()
            })
            .collect();
        Ok(Box::new(MockDocument { pages }))
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

impl PdfDocument for MockDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn text_fragments(&self, page_number: usize) -> Result<Vec<TextFragment>, DocsheetError> {
        Ok(self.pages[page_number - 1].clone())
    }
}

#[derive(Clone, Default)]
struct CallLog {
    renders: Arc<AtomicUsize>,
    recognitions: Arc<AtomicUsize>,
}

struct MockRenderer {
    log: CallLog,
}

impl RasterRenderer for MockRenderer {
    fn render(
        &self,
        _document: &dyn PdfDocument,
        page_number: usize,
        scale: f32,
    ) -> Result<RasterImage, DocsheetError> {
        self.log.renders.fetch_add(1, Ordering::SeqCst);
        Ok(RasterImage {
            page_number,
            scale,
            png: vec![0x89, b'P', b'N', b'G'],
        })
    }
}

struct MockEngine {
    log: CallLog,
    text: &'static str,
    fail: bool,
}

impl RecognitionEngine for MockEngine {
    fn recognize(
        &self,
        image: &RasterImage,
        progress: &mut dyn FnMut(f32),
    ) -> Result<String, DocsheetError> {
        self.log.recognitions.fetch_add(1, Ordering::SeqCst);
        assert_eq!(image.scale, 2.0);
        if self.fail {
            return Err(DocsheetError::Recognition {
                page: image.page_number,
                reason: "engine crashed".into(),
            });
        }
        for p in [0.0, 0.25, 0.5, 1.0] {
            progress(p);
        }
        Ok(self.text.to_string())
    }

    fn engine_name(&self) -> &str {
        "mock-ocr"
    }
}

struct Fixture {
    extractor: Extractor,
    log: CallLog,
}

fn fixture(pages: Vec<Vec<(&'static str, f64, f64)>>, ocr_text: &'static str) -> Fixture {
    build(pages, ocr_text, false, false)
}

fn build(
    pages: Vec<Vec<(&'static str, f64, f64)>>,
    ocr_text: &'static str,
    fail_open: bool,
    fail_ocr: bool,
) -> Fixture {
    let log = CallLog::default();
    let extractor = Extractor::new(
        ExtractionConfig::default(),
        Box::new(MockBackend { pages, fail_open }),
        Box::new(MockRenderer { log: log.clone() }),
        Box::new(MockEngine {
            log: log.clone(),
            text: ocr_text,
            fail: fail_ocr,
        }),
    );
    Fixture { extractor, log }
}

fn pdf_input() -> InputDocument<'static> {
    InputDocument {
        file_name: "scan.pdf",
        mime_type: Some("application/pdf"),
        bytes: b"%PDF-1.7",
    }
}

fn html_input(html: &'static str) -> InputDocument<'static> {
    InputDocument {
        file_name: "page.html",
        mime_type: Some("text/html"),
        bytes: html.as_bytes(),
    }
}

fn run(extractor: &Extractor, input: &InputDocument<'_>) -> (ExtractionResult, Vec<u8>) {
    let mut seen = Vec::new();
    let result = extractor.extract(input, &mut |p: u8| seen.push(p));
    (result, seen)
}

fn assert_non_decreasing(values: &[u8]) {
    assert!(
        values.windows(2).all(|w| w[0] <= w[1]),
        "progress went backwards: {values:?}"
    );
}

// ---------------------------------------------------------------------------
// PDF: text layer
// ---------------------------------------------------------------------------

#[test]
fn text_layer_page_reconstructs_rows() {
    let f = fixture(
        vec![vec![("C", 10.0, 80.0), ("B", 50.0, 100.0), ("A", 10.0, 100.0)]],
        "",
    );
    let (result, progress) = run(&f.extractor, &pdf_input());

    assert!(result.is_table);
    assert_eq!(result.method, ExtractionMethod::TextExtraction);
    assert_eq!(result.tables.len(), 1);
    assert_eq!(result.tables[0].rows, vec![vec!["A", "B"], vec!["C"]]);
    assert_eq!(result.plain_text, "A B\nC");
    assert_eq!(f.log.renders.load(Ordering::SeqCst), 0);
    assert_eq!(f.log.recognitions.load(Ordering::SeqCst), 0);
    assert_eq!(progress, vec![0, 100]);
}

#[test]
fn multi_page_rows_aggregate_into_one_table() {
    let f = fixture(
        vec![
            vec![("Item", 10.0, 700.0), ("Price", 200.0, 700.0)],
            vec![("Apple", 10.0, 700.0), ("1.20", 200.0, 700.0)],
            vec![("Total", 10.0, 650.0)],
        ],
        "",
    );
    let (result, progress) = run(&f.extractor, &pdf_input());

    assert_eq!(result.tables.len(), 1);
    assert_eq!(
        result.tables[0].rows,
        vec![vec!["Item", "Price"], vec!["Apple", "1.20"], vec!["Total"]]
    );
    assert_eq!(progress, vec![0, 33, 67, 100]);
}

// ---------------------------------------------------------------------------
// PDF: OCR fallback
// ---------------------------------------------------------------------------

#[test]
fn blank_page_falls_back_to_ocr_once() {
    let f = fixture(vec![vec![("   ", 10.0, 100.0), ("", 40.0, 100.0)]], "Line one\nLine two");
    let (result, progress) = run(&f.extractor, &pdf_input());

    assert_eq!(f.log.renders.load(Ordering::SeqCst), 1);
    assert_eq!(f.log.recognitions.load(Ordering::SeqCst), 1);
    assert_eq!(result.method, ExtractionMethod::Ocr);
    assert_eq!(result.tables[0].rows, vec![vec!["Line one"], vec!["Line two"]]);
    assert_eq!(progress, vec![0, 25, 50, 100]);
}

#[test]
fn page_without_fragments_uses_ocr() {
    let f = fixture(vec![vec![]], "only line");
    let (result, _) = run(&f.extractor, &pdf_input());
    assert_eq!(f.log.recognitions.load(Ordering::SeqCst), 1);
    assert_eq!(result.tables[0].rows, vec![vec!["only line"]]);
}

#[test]
fn mixed_document_reports_mixed_method() {
    let f = fixture(
        vec![
            vec![("Header", 10.0, 700.0)],
            vec![],
            vec![("Footer", 10.0, 50.0)],
            vec![],
        ],
        "scanned",
    );
    let (result, progress) = run(&f.extractor, &pdf_input());

    assert_eq!(result.method, ExtractionMethod::Mixed);
    assert_eq!(f.log.renders.load(Ordering::SeqCst), 2);
    assert_eq!(
        result.tables[0].rows,
        vec![vec!["Header"], vec!["scanned"], vec!["Footer"], vec!["scanned"]]
    );
    // Page 2 OCR runs from 25% to 50%, page 4 from 75% to 100%.
    assert_eq!(progress, vec![0, 25, 31, 38, 50, 75, 81, 88, 100]);
    assert_non_decreasing(&progress);
}

#[test]
fn recognition_failure_ends_session() {
    let f = build(vec![vec![("text", 1.0, 1.0)], vec![]], "", false, true);
    let (result, progress) = run(&f.extractor, &pdf_input());

    assert!(result.is_failure());
    assert!(result.tables.is_empty());
    assert!(!result.is_table);
    assert_eq!(result.plain_text, "Recognition failed: page 2: engine crashed");
    assert_eq!(progress, vec![0, 50]);
}

// ---------------------------------------------------------------------------
// PDF: failures
// ---------------------------------------------------------------------------

#[test]
fn corrupt_pdf_yields_diagnostic() {
    let f = build(vec![], "", true, false);
    let (result, progress) = run(&f.extractor, &pdf_input());

    assert!(result.tables.is_empty());
    assert_eq!(result.method, ExtractionMethod::None);
    assert!(result.plain_text.starts_with("PDF parsing error:"));
    assert_eq!(progress, vec![0]);
}

#[test]
fn try_extract_surfaces_typed_error() {
    let f = build(vec![], "", true, false);
    let err = f
        .extractor
        .try_extract(&pdf_input(), &mut |_p: u8| {})
        .unwrap_err();
    assert!(matches!(err, DocsheetError::DocumentParse { kind: "PDF", .. }));
}

#[test]
fn empty_pdf_completes_with_empty_table() {
    let f = fixture(vec![], "");
    let (result, progress) = run(&f.extractor, &pdf_input());
    assert!(result.is_table);
    assert_eq!(result.tables.len(), 1);
    assert!(result.tables[0].is_empty());
    assert_eq!(progress, vec![0, 100]);
}

#[test]
fn unsupported_file_type_is_not_processed() {
    let f = fixture(vec![vec![("A", 1.0, 1.0)]], "");
    let input = InputDocument {
        file_name: "photo.png",
        mime_type: Some("image/png"),
        bytes: &[1, 2, 3],
    };
    let (result, progress) = run(&f.extractor, &input);
    assert_eq!(result.plain_text, "Unsupported file type.");
    assert!(result.is_failure());
    assert_eq!(progress, vec![0]);
}

// ---------------------------------------------------------------------------
// HTML
// ---------------------------------------------------------------------------

#[test]
fn html_table_exports_as_table1() {
    let f = fixture(vec![], "");
    let (result, progress) = run(
        &f.extractor,
        &html_input("<table><tr><td> foo </td><td>bar</td></tr></table>"),
    );

    assert!(result.is_table);
    assert_eq!(result.tables[0].rows, vec![vec!["foo", "bar"]]);
    assert_eq!(progress, vec![0, 100]);

    let workbook = read_workbook(&export_xlsx(&result).unwrap()).unwrap();
    assert_eq!(workbook.sheet_names(), vec!["Table1"]);
    assert_eq!(workbook.sheets[0].rows, vec![vec!["foo", "bar"]]);
}

#[test]
fn html_without_tables_exports_text_sheet() {
    let f = fixture(vec![], "");
    let (result, _) = run(
        &f.extractor,
        &html_input("<html><body>hello world</body></html>"),
    );

    assert!(!result.is_table);
    assert_eq!(result.plain_text, "hello world");

    let workbook = read_workbook(&export_xlsx(&result).unwrap()).unwrap();
    assert_eq!(workbook.sheet_names(), vec![TEXT_SHEET_NAME]);
    assert_eq!(workbook.sheets[0].rows, vec![vec!["hello world"]]);
}

#[test]
fn html_detected_by_extension_without_mime() {
    let f = fixture(vec![], "");
    let input = InputDocument {
        file_name: "saved.html",
        mime_type: None,
        bytes: b"<table><tr><th>h</th></tr></table>",
    };
    let (result, _) = run(&f.extractor, &input);
    assert_eq!(result.tables[0].rows, vec![vec!["h"]]);
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

#[test]
fn pdf_result_round_trips_through_workbook() {
    let f = fixture(
        vec![vec![
            ("Name", 10.0, 700.0),
            ("Qty", 200.0, 700.0),
            ("Widget", 10.0, 680.0),
            ("4", 200.0, 680.0),
        ]],
        "",
    );
    let (result, _) = run(&f.extractor, &pdf_input());
    let workbook = read_workbook(&export_xlsx(&result).unwrap()).unwrap();

    assert_eq!(workbook.sheet_names(), vec!["Table1"]);
    assert_eq!(
        workbook.sheets[0].rows,
        vec![vec!["Name", "Qty"], vec!["Widget", "4"]]
    );
}

#[test]
fn failed_session_exports_diagnostic_text() {
    let f = build(vec![], "", true, false);
    let (result, _) = run(&f.extractor, &pdf_input());
    let workbook = read_workbook(&export_xlsx(&result).unwrap()).unwrap();
    assert_eq!(workbook.sheet_names(), vec![TEXT_SHEET_NAME]);
    assert!(workbook.sheets[0].rows[0][0].starts_with("PDF parsing error:"));
}
