use chrono::DateTime;
use log::debug;

use crate::error::{ReportError, Result};
use crate::report::document::{
    Cell, DateSection, ReportDocument, RowRecord, RowRole, Span, SECTION_SPACING_PT,
};
use crate::report::input::{Customer, ReportPayload, ShipmentBatch};
use crate::report::kind::ReportKind;

/// Running totals for one customer group.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct GroupTotals {
    pub boxes: u32,
    pub weight: f64,
    pub value: f64,
}

/// Build the full document model for `kind` from a decoded payload.
///
/// `context_name` is the caller-supplied company/customer label composed
/// into the document title. The walk preserves source order at every
/// level and allocates fresh state per call; nothing persists between
/// invocations.
pub fn build_document(
    kind: ReportKind,
    payload: &ReportPayload,
    context_name: &str,
) -> Result<ReportDocument> {
    let sections = if kind.batched() {
        batch_sections(kind, payload.expect_batches(kind)?)?
    } else {
        vec![allocation_section(payload.expect_customers(kind)?)?]
    };

    debug!("built {} section(s) for {kind}", sections.len());

    Ok(ReportDocument {
        title: format!("{} - {}", kind.title_label(), context_name),
        columns: kind.columns().to_vec(),
        section_spacing_pt: SECTION_SPACING_PT,
        sections,
    })
}

/// One table per dispatch date, in batch order.
fn batch_sections(kind: ReportKind, batches: &[ShipmentBatch]) -> Result<Vec<DateSection>> {
    let ncols = kind.columns().len();
    let mut sections = Vec::with_capacity(batches.len());

    for (bi, batch) in batches.iter().enumerate() {
        let mut rows = vec![header_row(kind)];

        for (ci, customer) in batch.customers.iter().enumerate() {
            rows.push(group_header_row(customer.display_name(), ncols));
            let totals = match kind {
                ReportKind::CustomerSaleForm => sale_group(&mut rows, customer, bi, ci)?,
                _ => waybill_group(kind, &mut rows, customer, bi, ci)?,
            };
            rows.push(totals_row(kind, &totals));
        }

        debug!("section {bi}: {} row(s)", rows.len());
        sections.push(DateSection {
            heading: Some(dispatch_heading(batch, bi)?),
            repeat_header_row: true,
            rows,
        });
    }

    Ok(sections)
}

/// Item rows for a release or collection form customer: one row per box,
/// the waybill code shown only on the first row of its group.
fn waybill_group(
    kind: ReportKind,
    rows: &mut Vec<RowRecord>,
    customer: &Customer,
    bi: usize,
    ci: usize,
) -> Result<GroupTotals> {
    let awbs = customer.awbs.as_ref().ok_or_else(|| ReportError::ShapeMismatch {
        expected: kind.shape(),
        found: if customer.items.is_some() {
            "customers[].items[]"
        } else {
            "customer without awbs"
        },
        path: format!("batches[{bi}].customers[{ci}]"),
    })?;

    let mut totals = GroupTotals::default();

    for (wi, waybill) in awbs.iter().enumerate() {
        let items = waybill
            .shipment_items
            .as_ref()
            .ok_or_else(|| ReportError::ShapeMismatch {
                expected: kind.shape(),
                found: if waybill.products.is_some() {
                    "awbs[].products[]"
                } else {
                    "waybill without shipment_items"
                },
                path: format!("batches[{bi}].customers[{ci}].awbs[{wi}]"),
            })?;

        for (ii, item) in items.iter().enumerate() {
            let path =
                || format!("batches[{bi}].customers[{ci}].awbs[{wi}].shipment_items[{ii}]");
            let boxes = require(item.box_number, "box_number", path)?;
            let weight = require(item.net_weight, "net_weight", path)?;

            totals.boxes += boxes;
            totals.weight += weight;

            let awb_cell = if ii == 0 {
                Cell::Label(waybill.awb.clone())
            } else {
                Cell::Continuation
            };

            let cells = if kind == ReportKind::ReleaseForm {
                vec![
                    awb_cell,
                    dash_cell(item.transport_company.as_deref()),
                    dash_cell(item.product.as_deref()),
                    Cell::Text(boxes.to_string()),
                    Cell::Text(format!("{weight}kg")),
                ]
            } else {
                vec![
                    awb_cell,
                    dash_cell(item.storage_company.as_deref()),
                    Cell::Text(boxes.to_string()),
                    Cell::Text(format!("{weight}kg")),
                ]
            };
            rows.push(RowRecord {
                role: RowRole::Data,
                cells,
                span: None,
            });
        }
    }

    Ok(totals)
}

/// Item rows for a customer sale form customer: products nest under each
/// waybill and get their own sub-group row; the waybill code is shown on
/// the first item row under the waybill, across products.
fn sale_group(
    rows: &mut Vec<RowRecord>,
    customer: &Customer,
    bi: usize,
    ci: usize,
) -> Result<GroupTotals> {
    let kind = ReportKind::CustomerSaleForm;
    let ncols = kind.columns().len();

    let awbs = customer.awbs.as_ref().ok_or_else(|| ReportError::ShapeMismatch {
        expected: kind.shape(),
        found: if customer.items.is_some() {
            "customers[].items[]"
        } else {
            "customer without awbs"
        },
        path: format!("batches[{bi}].customers[{ci}]"),
    })?;

    let mut totals = GroupTotals::default();

    for (wi, waybill) in awbs.iter().enumerate() {
        let products = waybill
            .products
            .as_ref()
            .ok_or_else(|| ReportError::ShapeMismatch {
                expected: kind.shape(),
                found: if waybill.shipment_items.is_some() {
                    "awbs[].shipment_items[]"
                } else {
                    "waybill without products"
                },
                path: format!("batches[{bi}].customers[{ci}].awbs[{wi}]"),
            })?;

        let mut first_in_waybill = true;

        for (pi, product) in products.iter().enumerate() {
            rows.push(sub_group_header_row(&product.product, ncols));

            for (ii, item) in product.shipment_items.iter().enumerate() {
                let path = || {
                    format!(
                        "batches[{bi}].customers[{ci}].awbs[{wi}].products[{pi}].shipment_items[{ii}]"
                    )
                };
                let boxes = require(item.box_number, "box_number", path)?;
                let weight = require(item.net_weight, "net_weight", path)?;

                // Sale orders count boxes; the other variants sum box_number.
                totals.boxes += 1;
                totals.weight += weight;

                let awb_cell = if first_in_waybill {
                    first_in_waybill = false;
                    Cell::Label(waybill.awb.clone())
                } else {
                    Cell::Continuation
                };

                rows.push(RowRecord {
                    role: RowRole::Data,
                    cells: vec![
                        awb_cell,
                        Cell::Empty,
                        Cell::Text(boxes.to_string()),
                        Cell::Text(format!("{weight}kg")),
                        money_cell(item.price_per_kg),
                        money_cell(item.total),
                    ],
                    span: None,
                });
            }
        }
    }

    Ok(totals)
}

/// The allocation sheet: one flat table, one group per customer, no date
/// sections.
fn allocation_section(customers: &[Customer]) -> Result<DateSection> {
    let kind = ReportKind::AllocationSheet;
    let ncols = kind.columns().len();
    let mut rows = vec![header_row(kind)];

    for (ci, customer) in customers.iter().enumerate() {
        rows.push(group_header_row(customer.display_name(), ncols));

        let items = customer.items.as_ref().ok_or_else(|| ReportError::ShapeMismatch {
            expected: kind.shape(),
            found: if customer.awbs.is_some() {
                "customers[].awbs[]"
            } else {
                "customer without items"
            },
            path: format!("customers[{ci}]"),
        })?;

        let mut totals = GroupTotals::default();

        for (ii, item) in items.iter().enumerate() {
            let path = || format!("customers[{ci}].items[{ii}]");
            let boxes = require(item.box_number, "box_number", path)?;
            let weight = require(item.net_weight, "net_weight", path)?;

            totals.boxes += boxes;
            totals.weight += weight;
            totals.value += item.box_price.unwrap_or(0.0);

            rows.push(RowRecord {
                role: RowRole::Data,
                cells: vec![
                    dash_cell(item.product.as_deref()),
                    Cell::Text(boxes.to_string()),
                    Cell::Text(format!("{weight}kg")),
                    money_cell(item.price_per_kg),
                    money_cell(item.box_price),
                ],
                span: None,
            });
        }

        rows.push(totals_row(kind, &totals));
    }

    Ok(DateSection {
        heading: None,
        repeat_header_row: true,
        rows,
    })
}

fn dispatch_heading(batch: &ShipmentBatch, index: usize) -> Result<String> {
    let date = DateTime::parse_from_rfc3339(&batch.production_date).map_err(|e| {
        ReportError::MalformedInput(format!(
            "batches[{index}]: invalid production_date '{}': {e}",
            batch.production_date
        ))
    })?;
    Ok(format!(
        "For products dispatched on {}",
        date.format("%d %B %Y")
    ))
}

fn header_row(kind: ReportKind) -> RowRecord {
    RowRecord {
        role: RowRole::Header,
        cells: kind
            .columns()
            .iter()
            .map(|title| Cell::Text((*title).to_string()))
            .collect(),
        span: None,
    }
}

fn group_header_row(name: &str, ncols: usize) -> RowRecord {
    let mut cells = vec![Cell::Text(name.to_string())];
    cells.resize(ncols, Cell::Empty);
    RowRecord {
        role: RowRole::GroupHeader,
        cells,
        span: Some(Span::new(0, ncols - 1)),
    }
}

fn sub_group_header_row(product: &str, ncols: usize) -> RowRecord {
    let mut cells = vec![Cell::Empty, Cell::Text(product.to_string())];
    cells.resize(ncols, Cell::Empty);
    RowRecord {
        role: RowRole::SubGroupHeader,
        cells,
        span: Some(Span::new(1, ncols - 1)),
    }
}

fn totals_row(kind: ReportKind, totals: &GroupTotals) -> RowRecord {
    let label = Cell::Text("Totals".to_string());
    let boxes = Cell::Text(totals.boxes.to_string());
    let weight = Cell::Text(format!("{}kg", totals.weight));

    let cells = match kind {
        ReportKind::ReleaseForm => vec![label, Cell::Empty, Cell::Empty, boxes, weight],
        ReportKind::CollectionForm => vec![label, Cell::Empty, boxes, weight],
        ReportKind::CustomerSaleForm => {
            vec![label, Cell::Empty, boxes, weight, Cell::Empty, Cell::Empty]
        }
        ReportKind::AllocationSheet => vec![
            label,
            boxes,
            weight,
            Cell::Empty,
            Cell::Text(format!("£{}", totals.value)),
        ],
    };

    RowRecord {
        role: RowRole::Totals,
        cells,
        span: None,
    }
}

/// Default an optional display field to "-" at cell construction; the
/// source record is not mutated.
fn dash_cell(value: Option<&str>) -> Cell {
    match value {
        Some(text) if !text.is_empty() => Cell::Text(text.to_string()),
        _ => Cell::Text("-".to_string()),
    }
}

fn money_cell(value: Option<f64>) -> Cell {
    match value {
        Some(amount) => Cell::Text(format!("£{amount}")),
        None => Cell::Text("-".to_string()),
    }
}

fn require<T>(value: Option<T>, field: &'static str, path: impl Fn() -> String) -> Result<T> {
    value.ok_or_else(|| ReportError::MissingRequiredField { field, path: path() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(kind: ReportKind, value: serde_json::Value) -> ReportPayload {
        ReportPayload::decode(kind, &value).unwrap()
    }

    fn release_payload() -> serde_json::Value {
        json!([{
            "production_date": "2024-01-02T00:00:00.000Z",
            "customers": [{
                "customer_name": "ABC",
                "awbs": [{
                    "awb": "AWB1",
                    "shipment_items": [
                        { "box_number": 1, "net_weight": 10.0, "product": "Fillet" },
                        { "box_number": 2, "net_weight": 5.0, "product": "Fillet" }
                    ]
                }]
            }]
        }])
    }

    #[test]
    fn release_form_scenario_rows() {
        let payload = decode(ReportKind::ReleaseForm, release_payload());
        let document = build_document(ReportKind::ReleaseForm, &payload, "Coldstore Ltd").unwrap();

        assert_eq!(document.title, "Release Form Report - Coldstore Ltd");
        assert_eq!(document.sections.len(), 1);

        let section = &document.sections[0];
        assert_eq!(
            section.heading.as_deref(),
            Some("For products dispatched on 02 January 2024")
        );
        assert!(section.repeat_header_row);

        let rows = &section.rows;
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].role, RowRole::Header);

        assert_eq!(rows[1].role, RowRole::GroupHeader);
        assert_eq!(rows[1].cells[0], Cell::Text("ABC".into()));
        assert_eq!(rows[1].span, Some(Span::new(0, 4)));

        assert_eq!(rows[2].role, RowRole::Data);
        assert_eq!(rows[2].cells[0], Cell::Label("AWB1".into()));
        assert_eq!(rows[2].cells[3], Cell::Text("1".into()));
        assert_eq!(rows[2].cells[4], Cell::Text("10kg".into()));

        assert_eq!(rows[3].cells[0], Cell::Continuation);
        assert_eq!(rows[3].cells[3], Cell::Text("2".into()));
        assert_eq!(rows[3].cells[4], Cell::Text("5kg".into()));

        assert_eq!(rows[4].role, RowRole::Totals);
        assert_eq!(rows[4].cells[0], Cell::Text("Totals".into()));
        assert_eq!(rows[4].cells[3], Cell::Text("3".into()));
        assert_eq!(rows[4].cells[4], Cell::Text("15kg".into()));
    }

    #[test]
    fn sale_form_counts_items_not_box_numbers() {
        let payload = decode(
            ReportKind::CustomerSaleForm,
            json!([{
                "production_date": "2024-01-02T00:00:00.000Z",
                "customers": [{
                    "customer_name": "ABC",
                    "awbs": [{
                        "awb": "AWB1",
                        "products": [{
                            "product": "Fillet",
                            "shipment_items": [
                                { "box_number": 1, "net_weight": 10.0, "price_per_kg": 4.5, "total": 45.0 },
                                { "box_number": 2, "net_weight": 5.0, "price_per_kg": 4.5, "total": 22.5 }
                            ]
                        }]
                    }]
                }]
            }]),
        );
        let document = build_document(ReportKind::CustomerSaleForm, &payload, "ABC").unwrap();
        let rows = &document.sections[0].rows;

        let totals = rows.last().unwrap();
        assert_eq!(totals.role, RowRole::Totals);
        // Two items with box numbers 1 and 2: the count is 2, not 3.
        assert_eq!(totals.cells[2], Cell::Text("2".into()));
        assert_eq!(totals.cells[3], Cell::Text("15kg".into()));

        // Product sub-group row spans from the second column onward.
        assert_eq!(rows[2].role, RowRole::SubGroupHeader);
        assert_eq!(rows[2].cells[1], Cell::Text("Fillet".into()));
        assert_eq!(rows[2].span, Some(Span::new(1, 5)));

        // Priced cells.
        assert_eq!(rows[3].cells[4], Cell::Text("£4.5".into()));
        assert_eq!(rows[3].cells[5], Cell::Text("£45".into()));
    }

    #[test]
    fn waybill_label_only_on_first_row_of_each_group() {
        let payload = decode(
            ReportKind::CollectionForm,
            json!([{
                "production_date": "2024-01-02T00:00:00.000Z",
                "customers": [{
                    "customer_name": "ABC",
                    "awbs": [
                        {
                            "awb": "AWB1",
                            "shipment_items": [
                                { "box_number": 1, "net_weight": 1.0 },
                                { "box_number": 1, "net_weight": 2.0 },
                                { "box_number": 1, "net_weight": 3.0 }
                            ]
                        },
                        {
                            "awb": "AWB2",
                            "shipment_items": [
                                { "box_number": 1, "net_weight": 4.0 },
                                { "box_number": 1, "net_weight": 5.0 }
                            ]
                        }
                    ]
                }]
            }]),
        );
        let document = build_document(ReportKind::CollectionForm, &payload, "Haulier").unwrap();
        let rows = &document.sections[0].rows;

        let labels: Vec<_> = rows
            .iter()
            .filter(|row| row.role == RowRole::Data)
            .map(|row| row.cells[0].clone())
            .collect();
        assert_eq!(
            labels,
            vec![
                Cell::Label("AWB1".into()),
                Cell::Continuation,
                Cell::Continuation,
                Cell::Label("AWB2".into()),
                Cell::Continuation,
            ]
        );

        // Collection form sums box numbers.
        let totals = rows.last().unwrap();
        assert_eq!(totals.cells[2], Cell::Text("5".into()));
        assert_eq!(totals.cells[3], Cell::Text("15kg".into()));
    }

    #[test]
    fn unallocated_customers_keep_their_grouping_key() {
        let payload = decode(
            ReportKind::ReleaseForm,
            json!([{
                "production_date": "2024-01-02T00:00:00.000Z",
                "customers": [
                    { "customer_name": null, "awbs": [] },
                    { "customer_name": "", "awbs": [] }
                ]
            }]),
        );
        let document = build_document(ReportKind::ReleaseForm, &payload, "Coldstore Ltd").unwrap();
        let rows = &document.sections[0].rows;

        // Two separate groups, both displayed as Unallocated.
        let headers: Vec<_> = rows
            .iter()
            .filter(|row| row.role == RowRole::GroupHeader)
            .collect();
        assert_eq!(headers.len(), 2);
        for header in headers {
            assert_eq!(header.cells[0], Cell::Text("Unallocated".into()));
        }
    }

    #[test]
    fn sections_follow_batch_order_and_rebuild_identically() {
        let payload = decode(
            ReportKind::ReleaseForm,
            json!([
                { "production_date": "2024-03-05T00:00:00.000Z", "customers": [] },
                { "production_date": "2024-01-02T00:00:00.000Z", "customers": [] }
            ]),
        );
        let first = build_document(ReportKind::ReleaseForm, &payload, "Coldstore Ltd").unwrap();
        let second = build_document(ReportKind::ReleaseForm, &payload, "Coldstore Ltd").unwrap();

        assert_eq!(first, second);
        assert_eq!(first.sections.len(), 2);
        assert_eq!(
            first.sections[0].heading.as_deref(),
            Some("For products dispatched on 05 March 2024")
        );
        assert_eq!(
            first.sections[1].heading.as_deref(),
            Some("For products dispatched on 02 January 2024")
        );
    }

    #[test]
    fn allocation_sheet_object_and_list_build_identically() {
        let object = json!({
            "customer_name": "ABC",
            "items": [
                { "box_number": 3, "net_weight": 12.0, "product": "Fillet", "price_per_kg": 4.0, "box_price": 48.0 },
                { "box_number": 2, "net_weight": 6.0, "product": "Whole", "box_price": 20.0 }
            ]
        });
        let list = json!([object.clone()]);

        let from_object = build_document(
            ReportKind::AllocationSheet,
            &decode(ReportKind::AllocationSheet, object),
            "ABC",
        )
        .unwrap();
        let from_list = build_document(
            ReportKind::AllocationSheet,
            &decode(ReportKind::AllocationSheet, list),
            "ABC",
        )
        .unwrap();

        assert_eq!(from_object, from_list);
        assert_eq!(from_object.sections.len(), 1);
        assert_eq!(from_object.sections[0].heading, None);

        let rows = &from_object.sections[0].rows;
        let totals = rows.last().unwrap();
        // Sum of box numbers, sum of weights, sum of box prices.
        assert_eq!(totals.cells[1], Cell::Text("5".into()));
        assert_eq!(totals.cells[2], Cell::Text("18kg".into()));
        assert_eq!(totals.cells[4], Cell::Text("£68".into()));

        // Missing price fields render as "-".
        assert_eq!(rows[3].cells[3], Cell::Text("-".into()));
    }

    #[test]
    fn wrong_nesting_is_a_shape_mismatch_with_path() {
        // Sale-form payload (products) fed to the release form.
        let payload = decode(
            ReportKind::ReleaseForm,
            json!([{
                "production_date": "2024-01-02T00:00:00.000Z",
                "customers": [{
                    "customer_name": "ABC",
                    "awbs": [{ "awb": "AWB1", "products": [] }]
                }]
            }]),
        );
        let err = build_document(ReportKind::ReleaseForm, &payload, "Coldstore Ltd").unwrap_err();
        match err {
            ReportError::ShapeMismatch {
                expected,
                found,
                path,
            } => {
                assert_eq!(expected, "customers[].awbs[].shipment_items[]");
                assert_eq!(found, "awbs[].products[]");
                assert_eq!(path, "batches[0].customers[0].awbs[0]");
            }
            other => panic!("expected shape mismatch, got {other:?}"),
        }
    }

    #[test]
    fn missing_net_weight_names_the_item() {
        let payload = decode(
            ReportKind::ReleaseForm,
            json!([{
                "production_date": "2024-01-02T00:00:00.000Z",
                "customers": [{
                    "customer_name": "ABC",
                    "awbs": [{
                        "awb": "AWB1",
                        "shipment_items": [
                            { "box_number": 1, "net_weight": 10.0 },
                            { "box_number": 2 }
                        ]
                    }]
                }]
            }]),
        );
        let err = build_document(ReportKind::ReleaseForm, &payload, "Coldstore Ltd").unwrap_err();
        match err {
            ReportError::MissingRequiredField { field, path } => {
                assert_eq!(field, "net_weight");
                assert_eq!(path, "batches[0].customers[0].awbs[0].shipment_items[1]");
            }
            other => panic!("expected missing field, got {other:?}"),
        }
    }

    #[test]
    fn bad_production_date_is_malformed_input() {
        let payload = decode(
            ReportKind::ReleaseForm,
            json!([{ "production_date": "02/01/2024", "customers": [] }]),
        );
        let err = build_document(ReportKind::ReleaseForm, &payload, "Coldstore Ltd").unwrap_err();
        assert!(matches!(err, ReportError::MalformedInput(detail) if detail.contains("batches[0]")));
    }

    #[test]
    fn optional_display_fields_default_to_dash() {
        let payload = decode(
            ReportKind::ReleaseForm,
            json!([{
                "production_date": "2024-01-02T00:00:00.000Z",
                "customers": [{
                    "customer_name": "ABC",
                    "awbs": [{
                        "awb": "AWB1",
                        "shipment_items": [{ "box_number": 1, "net_weight": 10.0 }]
                    }]
                }]
            }]),
        );
        let document = build_document(ReportKind::ReleaseForm, &payload, "Coldstore Ltd").unwrap();
        let data = &document.sections[0].rows[2];
        assert_eq!(data.cells[1], Cell::Text("-".into()));
        assert_eq!(data.cells[2], Cell::Text("-".into()));
    }
}
