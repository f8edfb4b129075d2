use serde::Deserialize;
use serde_json::Value;

use crate::error::{ReportError, Result};
use crate::report::kind::ReportKind;

/// Display value for a customer with no name. The underlying
/// `customer_name` is left untouched so two unnamed customers are never
/// merged here.
pub const UNALLOCATED: &str = "Unallocated";

/// All dispatches for one production date, customers in source order.
#[derive(Debug, Clone, Deserialize)]
pub struct ShipmentBatch {
    pub production_date: String,
    #[serde(default)]
    pub customers: Vec<Customer>,
}

/// A customer group. Waybill-shaped variants populate `awbs`; the flat
/// allocation sheet populates `items` instead.
#[derive(Debug, Clone, Deserialize)]
pub struct Customer {
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub awbs: Option<Vec<Waybill>>,
    #[serde(default)]
    pub items: Option<Vec<ShipmentItem>>,
}

impl Customer {
    /// Name shown on the group header row.
    pub fn display_name(&self) -> &str {
        match self.customer_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => UNALLOCATED,
        }
    }
}

/// One air waybill. Release and collection forms carry items directly;
/// the customer sale form nests them under `products`.
#[derive(Debug, Clone, Deserialize)]
pub struct Waybill {
    pub awb: String,
    #[serde(default)]
    pub shipment_items: Option<Vec<ShipmentItem>>,
    #[serde(default)]
    pub products: Option<Vec<Product>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Product {
    pub product: String,
    #[serde(default)]
    pub shipment_items: Vec<ShipmentItem>,
}

/// A physical box. `box_number` and `net_weight` are required by every
/// variant but validated during the build walk so the error can name the
/// exact index path; the rest default to "-" at cell construction.
#[derive(Debug, Clone, Deserialize)]
pub struct ShipmentItem {
    #[serde(default)]
    pub box_number: Option<u32>,
    #[serde(default)]
    pub net_weight: Option<f64>,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub storage_company: Option<String>,
    #[serde(default)]
    pub transport_company: Option<String>,
    #[serde(default)]
    pub price_per_kg: Option<f64>,
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default)]
    pub box_price: Option<f64>,
}

/// Decoded report payload, shaped per report kind.
#[derive(Debug, Clone)]
pub enum ReportPayload {
    /// One batch per dispatch date (release, collection, customer sale).
    Batches(Vec<ShipmentBatch>),
    /// Flat customer list (allocation sheet).
    Customers(Vec<Customer>),
}

impl ReportPayload {
    /// Decode a payload for `kind` from the JSON value stored on the
    /// report record. A JSON *string* value is decoded first, so bodies
    /// persisted in serialized form pass through transparently.
    pub fn decode(kind: ReportKind, raw: &Value) -> Result<Self> {
        let decoded;
        let value = match raw {
            Value::String(text) => {
                decoded = serde_json::from_str::<Value>(text).map_err(|e| {
                    ReportError::MalformedInput(format!("payload is not valid JSON: {e}"))
                })?;
                &decoded
            }
            other => other,
        };
        Self::from_value(kind, value)
    }

    /// Decode serialized payload text for `kind`.
    pub fn decode_text(kind: ReportKind, text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| ReportError::MalformedInput(format!("payload is not valid JSON: {e}")))?;
        Self::decode(kind, &value)
    }

    fn from_value(kind: ReportKind, value: &Value) -> Result<Self> {
        if kind.batched() {
            Ok(ReportPayload::Batches(decode_as(value)?))
        } else {
            // The allocation sheet accepts a single customer object as
            // well as a list.
            let customers = if value.is_object() {
                vec![decode_as::<Customer>(value)?]
            } else {
                decode_as::<Vec<Customer>>(value)?
            };
            Ok(ReportPayload::Customers(customers))
        }
    }

    pub(crate) fn expect_batches(&self, kind: ReportKind) -> Result<&[ShipmentBatch]> {
        match self {
            ReportPayload::Batches(batches) => Ok(batches),
            ReportPayload::Customers(_) => Err(ReportError::ShapeMismatch {
                expected: kind.shape(),
                found: "flat customer list",
                path: "$".to_string(),
            }),
        }
    }

    pub(crate) fn expect_customers(&self, kind: ReportKind) -> Result<&[Customer]> {
        match self {
            ReportPayload::Customers(customers) => Ok(customers),
            ReportPayload::Batches(_) => Err(ReportError::ShapeMismatch {
                expected: kind.shape(),
                found: "per-date batches",
                path: "$".to_string(),
            }),
        }
    }
}

fn decode_as<T: serde::de::DeserializeOwned>(value: &Value) -> Result<T> {
    serde_json::from_value(value.clone()).map_err(|e| ReportError::MalformedInput(e.to_string()))
}
