use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Config directory not found at {0}. Run 'shipforms init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Unknown report type '{0}'. Run 'shipforms types' to list supported types.")]
    UnknownReportType(String),

    #[error("Malformed report payload: {0}")]
    MalformedInput(String),

    #[error("Payload at {path} does not match the '{expected}' nesting (found {found})")]
    ShapeMismatch {
        expected: &'static str,
        found: &'static str,
        path: String,
    },

    #[error("Missing required field '{field}' at {path}")]
    MissingRequiredField { field: &'static str, path: String },

    #[error("Report type '{0}' requires --title <name> for the document heading")]
    MissingTitle(&'static str),

    #[error("Typst not found. Install it from https://typst.app/ or run: cargo install typst-cli")]
    TypstNotFound,

    #[error("Failed to generate PDF: {0}")]
    PdfGeneration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
