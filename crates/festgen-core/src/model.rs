use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::FestgenError;

/// Document format, derived from the file extension only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Hwp,
    /// Carries the lowercased extension ("" when the path has none).
    Unsupported(String),
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> DocumentFormat {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        DocumentFormat::from_extension(&ext)
    }

    pub fn from_extension(ext: &str) -> DocumentFormat {
        let lower = ext.trim().trim_start_matches('.').to_lowercase();
        match lower.as_str() {
            "pdf" => DocumentFormat::Pdf,
            "docx" => DocumentFormat::Docx,
            "hwp" => DocumentFormat::Hwp,
            _ => DocumentFormat::Unsupported(lower),
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, DocumentFormat::Unsupported(_))
    }

    /// Extension used when talking to conversion services.
    pub fn extension(&self) -> &str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
            DocumentFormat::Hwp => "hwp",
            DocumentFormat::Unsupported(ext) => ext,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Unsupported(ext) if ext.is_empty() => write!(f, "(none)"),
            other => write!(f, "{}", other.extension()),
        }
    }
}

/// A document path paired with its detected format. Lives for one
/// extraction call.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub format: DocumentFormat,
}

impl SourceDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = DocumentFormat::from_path(&path);
        SourceDocument { path, format }
    }

    /// Fails with `MissingFile` or `UnsupportedFormat` before any bytes are read.
    pub fn ensure_readable(&self) -> Result<(), FestgenError> {
        if !self.path.is_file() {
            return Err(FestgenError::MissingFile {
                path: self.path.clone(),
            });
        }
        if !self.format.is_supported() {
            return Err(FestgenError::UnsupportedFormat {
                extension: self.format.to_string(),
            });
        }
        Ok(())
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("document.{}", self.format.extension()))
    }
}
