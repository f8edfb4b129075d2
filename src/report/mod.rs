mod builder;
mod document;
mod input;
mod kind;

pub use builder::{build_document, GroupTotals};
pub use document::{
    Cell, DateSection, ReportDocument, RowRecord, RowRole, RowStyle, Span, SECTION_SPACING_PT,
};
pub use input::{
    Customer, Product, ReportPayload, ShipmentBatch, ShipmentItem, Waybill, UNALLOCATED,
};
pub use kind::ReportKind;
