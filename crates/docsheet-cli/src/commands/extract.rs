use docsheet_core::config::ExtractionConfig;
use docsheet_core::error::DocsheetError;
use docsheet_core::{export, Extractor, InputDocument};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::output;

pub struct ExtractArgs {
    pub input_file: PathBuf,
    /// `None` when exporting is disabled.
    pub out: Option<PathBuf>,
    pub output_format: String,
    pub mime: Option<String>,
    pub config: Option<PathBuf>,
    pub tolerance: Option<f64>,
    pub scale: Option<f32>,
    pub lang: Option<String>,
}

/// Returns whether the document was extracted. A failed extraction still
/// prints and exports its diagnostic.
pub fn run(args: ExtractArgs) -> Result<bool, DocsheetError> {
    let config = load_config(&args)?;
    let bytes = std::fs::read(&args.input_file)?;

    let file_name = args
        .input_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mime = args
        .mime
        .clone()
        .or_else(|| guess_mime(&args.input_file).map(str::to_string));

    eprintln!("Selected file: {file_name}");

    let extractor = Extractor::with_local_tools(config);
    let input = InputDocument {
        file_name: &file_name,
        mime_type: mime.as_deref(),
        bytes: &bytes,
    };

    let mut stderr = std::io::stderr();
    let result = extractor.extract(&input, &mut |percent: u8| {
        let _ = write!(stderr, "\rProcessing... {percent}%");
        let _ = stderr.flush();
    });
    eprintln!();

    match args.output_format.as_str() {
        "json" => output::json::print(&result)?,
        _ => output::table::print(&result),
    }

    if let Some(out) = &args.out {
        export::write_xlsx_file(&result, out)?;
        eprintln!("Workbook written to {}", out.display());
    }

    Ok(!result.is_failure())
}

fn load_config(args: &ExtractArgs) -> Result<ExtractionConfig, DocsheetError> {
    let mut config = ExtractionConfig::load(args.config.as_deref())?;
    if let Some(t) = args.tolerance {
        config.row_tolerance = t;
    }
    if let Some(s) = args.scale {
        config.raster_scale = s;
    }
    if let Some(ref lang) = args.lang {
        config.ocr_language = lang.clone();
    }
    config.validate(Path::new("<command line>"))?;
    Ok(config)
}

/// MIME type a browser file picker would report for this extension.
fn guess_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some("application/pdf"),
        "html" | "htm" => Some("text/html"),
        _ => None,
    }
}
