pub mod config;
pub mod error;
pub mod pdf;
pub mod report;

pub use config::{Company, Config, PdfSettings};
pub use error::{ReportError, Result};
pub use report::{
    build_document, Cell, DateSection, ReportDocument, ReportKind, ReportPayload, RowRecord,
    RowRole, Span,
};
