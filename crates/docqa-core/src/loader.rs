//! Walks a source tree and turns recognized files into text units.
//!
//! Plain text and markdown produce one unit, PDFs one unit per page, raster
//! images one OCR unit. Unrecognized extensions are skipped and per-file
//! failures are recorded; neither stops the walk.

use anyhow::anyhow;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::traits::OcrEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Text,
    Pdf,
    Image,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" | "md" => Some(SourceFormat::Text),
            "pdf" => Some(SourceFormat::Pdf),
            "png" | "jpg" | "jpeg" | "bmp" | "tiff" => Some(SourceFormat::Image),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextUnit {
    pub text: String,
    pub page_number: Option<u32>,
    pub ocr: bool,
}

#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub path: PathBuf,
    pub units: Vec<TextUnit>,
}

#[derive(Debug, Clone)]
pub struct FileFailure {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub documents: Vec<LoadedDocument>,
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<FileFailure>,
}

/// Runs the `tesseract` program and reads its stdout.
pub struct TesseractCli {
    program: PathBuf,
}

impl TesseractCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl OcrEngine for TesseractCli {
    fn extract_text(&self, path: &Path) -> Result<String> {
        let output = match Command::new(&self.program).arg(path).arg("stdout").output() {
            Ok(output) => output,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::OcrUnavailable {
                    path: path.to_path_buf(),
                    reason: format!("{} is not installed", self.program.display()),
                });
            }
            Err(e) => return Err(e.into()),
        };
        if !output.status.success() {
            return Err(Error::Operation(format!(
                "OCR failed for {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

pub struct DocumentLoader {
    ocr: Box<dyn OcrEngine>,
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::new(Box::new(TesseractCli::default()))
    }
}

impl DocumentLoader {
    pub fn new(ocr: Box<dyn OcrEngine>) -> Self {
        Self { ocr }
    }

    pub fn load_dir(&self, root: &Path) -> Result<LoadOutcome> {
        if !root.is_dir() {
            return Err(Error::NotFound(format!("source directory {}", root.display())));
        }
        let mut outcome = LoadOutcome::default();
        for entry in walkdir::WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let Some(format) = SourceFormat::from_path(path) else {
                debug!(path = %path.display(), "skipping unrecognized extension");
                outcome.skipped.push(path.to_path_buf());
                continue;
            };
            match self.load_file(path, format) {
                Ok(units) => outcome.documents.push(LoadedDocument { path: path.to_path_buf(), units }),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load file");
                    outcome.failed.push(FileFailure { path: path.to_path_buf(), reason: e.to_string() });
                }
            }
        }
        info!(
            documents = outcome.documents.len(),
            skipped = outcome.skipped.len(),
            failed = outcome.failed.len(),
            "loaded source tree {}",
            root.display()
        );
        Ok(outcome)
    }

    pub fn load_file(&self, path: &Path, format: SourceFormat) -> Result<Vec<TextUnit>> {
        match format {
            SourceFormat::Text => Ok(vec![TextUnit { text: read_text_file(path)?, page_number: None, ocr: false }]),
            SourceFormat::Pdf => read_pdf_pages(path),
            SourceFormat::Image => {
                let text = self.ocr.extract_text(path)?;
                Ok(vec![TextUnit { text, page_number: None, ocr: true }])
            }
        }
    }
}

fn read_text_file(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(_) => Ok(String::from_utf8_lossy(&fs::read(path)?).to_string()),
    }
}

fn read_pdf_pages(path: &Path) -> Result<Vec<TextUnit>> {
    let doc = lopdf::Document::load(path).map_err(|e| anyhow!("Failed to open PDF {}: {}", path.display(), e))?;
    let mut units = Vec::new();
    for page_number in doc.get_pages().keys().copied() {
        let text = doc.extract_text(&[page_number]).unwrap_or_else(|e| {
            warn!(path = %path.display(), page = page_number, error = %e, "no text layer on page");
            String::new()
        });
        units.push(TextUnit { text, page_number: Some(page_number), ocr: false });
    }
    Ok(units)
}
