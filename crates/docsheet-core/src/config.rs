//! Extraction settings loaded from `<config dir>/docsheet/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::DocsheetError;
use crate::layout::DEFAULT_ROW_TOLERANCE;

/// Scale factor used when rasterizing pages for OCR.
pub const DEFAULT_RASTER_SCALE: f32 = 2.0;

pub const DEFAULT_OCR_LANGUAGE: &str = "eng";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Vertical distance (in PDF units) that fragments are bucketed by when
    /// grouping them into rows.
    pub row_tolerance: f64,
    pub raster_scale: f32,
    pub ocr_language: String,
    pub tools: ToolPaths,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        ExtractionConfig {
            row_tolerance: DEFAULT_ROW_TOLERANCE,
            raster_scale: DEFAULT_RASTER_SCALE,
            ocr_language: DEFAULT_OCR_LANGUAGE.to_string(),
            tools: ToolPaths::default(),
        }
    }
}

/// Binaries for the external collaborators. Bare names are resolved via `PATH`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub pdftotext: PathBuf,
    pub pdftoppm: PathBuf,
    pub tesseract: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        ToolPaths {
            pdftotext: PathBuf::from("pdftotext"),
            pdftoppm: PathBuf::from("pdftoppm"),
            tesseract: PathBuf::from("tesseract"),
        }
    }
}

impl ExtractionConfig {
    /// Load from an explicit file, or from the default location when `path`
    /// is `None`. A missing default file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, DocsheetError> {
        match path {
            Some(p) => Self::load_file(p),
            None => match default_config_path() {
                Some(p) if p.exists() => Self::load_file(&p),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn load_file(path: &Path) -> Result<Self, DocsheetError> {
        let content = std::fs::read_to_string(path).map_err(|e| DocsheetError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::parse(&content, path)
    }

    pub fn parse(toml_str: &str, source: &Path) -> Result<Self, DocsheetError> {
        let config: ExtractionConfig =
            toml::from_str(toml_str).map_err(|e| DocsheetError::Config {
                path: source.to_path_buf(),
                reason: e.to_string(),
            })?;
        config.validate(source)?;
        Ok(config)
    }

    pub fn validate(&self, source: &Path) -> Result<(), DocsheetError> {
        let invalid = |reason: String| DocsheetError::Config {
            path: source.to_path_buf(),
            reason,
        };

        if !(self.row_tolerance.is_finite() && self.row_tolerance > 0.0) {
            return Err(invalid(format!(
                "row_tolerance must be a positive number, got {}",
                self.row_tolerance
            )));
        }
        if !(self.raster_scale.is_finite() && self.raster_scale > 0.0) {
            return Err(invalid(format!(
                "raster_scale must be a positive number, got {}",
                self.raster_scale
            )));
        }
        if self.ocr_language.trim().is_empty() {
            return Err(invalid("ocr_language must not be empty".into()));
        }
        Ok(())
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("docsheet").join("config.toml"))
}
