use std::fmt;
use std::str::FromStr;

use crate::error::ReportError;

/// The four report variants. Each fixes the column set, the nesting shape
/// the payload must follow, the per-row field mapping and the totals rule
/// (see the builder). Adding a report type is a local change here plus a
/// builder arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Authorizes a storage facility to release goods to a transporter.
    ReleaseForm,
    /// Instructs a transporter on pickup details.
    CollectionForm,
    /// Itemized, priced summary of goods sold to a customer.
    CustomerSaleForm,
    /// Per-customer breakdown of items and pricing for one shipment.
    AllocationSheet,
}

impl ReportKind {
    pub const ALL: [ReportKind; 4] = [
        ReportKind::ReleaseForm,
        ReportKind::CollectionForm,
        ReportKind::CustomerSaleForm,
        ReportKind::AllocationSheet,
    ];

    /// Wire tag as stored on the report record.
    pub fn tag(self) -> &'static str {
        match self {
            ReportKind::ReleaseForm => "release-form",
            ReportKind::CollectionForm => "collection-form",
            ReportKind::CustomerSaleForm => "customer-sale-form",
            ReportKind::AllocationSheet => "allocation-sheet",
        }
    }

    /// Label the document title is composed from:
    /// `"<label> - <context name>"`.
    pub fn title_label(self) -> &'static str {
        match self {
            ReportKind::ReleaseForm => "Release Form Report",
            ReportKind::CollectionForm => "Collection Form Report",
            ReportKind::CustomerSaleForm => "Customer Sales Order",
            ReportKind::AllocationSheet => "Allocation Sheet",
        }
    }

    /// Column titles for the header row.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            ReportKind::ReleaseForm => &[
                "Customer / AWB",
                "Transport",
                "Product",
                "Box No",
                "Weight (Kgs)",
            ],
            ReportKind::CollectionForm => {
                &["Customer / AWB", "Collection Point", "Box No", "Weight (Kgs)"]
            }
            ReportKind::CustomerSaleForm => &[
                "Customer / AWB",
                "Product",
                "Box No",
                "Weight",
                "Price Per Kg",
                "Total",
            ],
            ReportKind::AllocationSheet => {
                &["Product", "Box No", "Weight (Kgs)", "£/kg", "Box Price"]
            }
        }
    }

    /// Nesting the payload must follow, as shown in shape-mismatch errors.
    pub fn shape(self) -> &'static str {
        match self {
            ReportKind::ReleaseForm | ReportKind::CollectionForm => {
                "customers[].awbs[].shipment_items[]"
            }
            ReportKind::CustomerSaleForm => "customers[].awbs[].products[].shipment_items[]",
            ReportKind::AllocationSheet => "customers[].items[]",
        }
    }

    /// Whether the payload is grouped into per-date batches. The
    /// allocation sheet is flat: one table, no date sections.
    pub fn batched(self) -> bool {
        !matches!(self, ReportKind::AllocationSheet)
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ReportKind {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "release-form" => Ok(ReportKind::ReleaseForm),
            "collection-form" => Ok(ReportKind::CollectionForm),
            "customer-sale-form" => Ok(ReportKind::CustomerSaleForm),
            "allocation-sheet" => Ok(ReportKind::AllocationSheet),
            other => Err(ReportError::UnknownReportType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip() {
        for kind in ReportKind::ALL {
            assert_eq!(kind.tag().parse::<ReportKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = "delivery-note".parse::<ReportKind>().unwrap_err();
        assert!(matches!(err, ReportError::UnknownReportType(tag) if tag == "delivery-note"));
    }

    #[test]
    fn only_the_allocation_sheet_is_flat() {
        assert!(ReportKind::ReleaseForm.batched());
        assert!(ReportKind::CollectionForm.batched());
        assert!(ReportKind::CustomerSaleForm.batched());
        assert!(!ReportKind::AllocationSheet.batched());
    }
}
