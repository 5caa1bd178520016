//! Text extraction from uploaded documents.
//!
//! Every supported format is flattened into a single text blob. Tabular
//! formats emit one JSON object per record so that each line carries its own
//! column names.

mod tabular;

use std::fmt;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

pub use tabular::{extract_delimited, extract_spreadsheet};

/// Errors raised while reading or parsing an uploaded document.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not valid UTF-8 text")]
    Encoding { path: String },
    #[error("failed to parse delimited file: {0}")]
    Delimited(#[from] csv::Error),
    #[error("failed to parse spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),
    #[error("spreadsheet has no worksheets")]
    NoWorksheet,
    #[error("extraction worker failed: {0}")]
    Worker(String),
}

/// Document format, derived from the original file name's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// `.txt` and `.log`
    PlainText,
    /// `.csv`
    Delimited,
    /// `.xlsx`, `.xls`, `.xlsm`, `.xlsb` and `.ods`
    Spreadsheet,
    /// Anything else; read as plain text.
    Unknown,
}

impl DocumentFormat {
    /// Detect the format from a file name (case-insensitive extension match).
    pub fn from_file_name(name: &str) -> Self {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("txt") | Some("log") => Self::PlainText,
            Some("csv") => Self::Delimited,
            Some("xlsx") | Some("xls") | Some("xlsm") | Some("xlsb") | Some("ods") => {
                Self::Spreadsheet
            }
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlainText => "text",
            Self::Delimited => "csv",
            Self::Spreadsheet => "spreadsheet",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text extracted from a document, tagged with the format it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    text: String,
    format: DocumentFormat,
}

impl ExtractedContent {
    pub fn new(text: String, format: DocumentFormat) -> Self {
        Self { text, format }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Extract the text content of the file at `path`.
///
/// The source file is only read, never modified or removed.
pub fn extract_text(path: &Path, format: DocumentFormat) -> Result<ExtractedContent, ExtractError> {
    debug!(path = %path.display(), %format, "Extracting text");

    let text = match format {
        DocumentFormat::PlainText | DocumentFormat::Unknown => read_plain_text(path)?,
        DocumentFormat::Delimited => extract_delimited(&read_plain_text(path)?)?,
        DocumentFormat::Spreadsheet => extract_spreadsheet(path)?,
    };

    debug!(chars = text.chars().count(), "Extraction complete");
    Ok(ExtractedContent::new(text, format))
}

fn read_plain_text(path: &Path) -> Result<String, ExtractError> {
    let bytes = std::fs::read(path).map_err(|source| ExtractError::Io {
        path: path.display().to_string(),
        source,
    })?;

    String::from_utf8(bytes).map_err(|_| ExtractError::Encoding {
        path: path.display().to_string(),
    })
}
