//! Order record model and validation.
//!
//! [`RawRecord`] is the untyped wire shape, [`OrderRecord`] the validated
//! domain shape. The only crossing point between the two is
//! [`OrderRecord::from_raw`].

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Textual format of the `InvoiceDate` field, e.g. `12/1/2010 8:26`.
pub const INVOICE_DATE_FORMAT: &str = "%m/%d/%Y %H:%M";

/// Field map exactly as delivered by a stream entry, no type guarantees.
///
/// Accessors are total: absent keys fall back to a default instead of
/// failing.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    fields: HashMap<String, String>,
}

impl RawRecord {
    pub fn new(fields: HashMap<String, String>) -> Self {
        Self { fields }
    }

    /// Field value, or `""` when the key is absent.
    pub fn field(&self, name: &str) -> &str {
        self.field_or(name, "")
    }

    /// Field value, or `default` when the key is absent.
    pub fn field_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.fields.get(name).map(String::as_str).unwrap_or(default)
    }

    pub fn fields(&self) -> &HashMap<String, String> {
        &self.fields
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Why a record was rejected. Carries the offending raw value so the
/// rejection log line can show it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unit price is not a non-negative number: {0:?}")]
    BadPrice(String),
    #[error("invoice date is not in m/d/yyyy H:M form: {0:?}")]
    BadDate(String),
    #[error("quantity is not an integer: {0:?}")]
    BadQuantity(String),
}

/// Normalized product reference carried by an order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub stock_code: String,
    pub description: String,
    pub unit_price: f64,
}

/// One validated order line, immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub invoice_no: String,
    pub item: Item,
    pub quantity: i64,
    pub invoice_date: NaiveDate,
    pub customer_id: String,
    pub country: String,
}

impl OrderRecord {
    /// Validates and normalizes one raw field map.
    ///
    /// Absent keys take defaults first (empty code and description, unit
    /// price `"0"`, quantity `"1"`), then the numeric and date fields are
    /// parsed. Every failure path returns a [`ValidationError`] so the
    /// caller can skip the record and keep the stream moving.
    pub fn from_raw(raw: &RawRecord) -> Result<Self, ValidationError> {
        let price_text = raw.field_or("UnitPrice", "0");
        let unit_price = price_text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|price| price.is_finite() && *price >= 0.0)
            .ok_or_else(|| ValidationError::BadPrice(price_text.to_owned()))?;

        let date_text = raw.field("InvoiceDate");
        let invoice_date = NaiveDateTime::parse_from_str(date_text, INVOICE_DATE_FORMAT)
            .map(|stamp| stamp.date())
            .map_err(|_| ValidationError::BadDate(date_text.to_owned()))?;

        let quantity_text = raw.field_or("Quantity", "1");
        let quantity = quantity_text
            .trim()
            .parse::<i64>()
            .map_err(|_| ValidationError::BadQuantity(quantity_text.to_owned()))?;

        Ok(Self {
            invoice_no: raw.field("InvoiceNo").to_owned(),
            item: Item {
                stock_code: raw.field("StockCode").to_owned(),
                description: raw.field("Description").to_owned(),
                unit_price,
            },
            quantity,
            invoice_date,
            customer_id: raw.field("CustomerID").to_owned(),
            country: raw.field("Country").to_owned(),
        })
    }

    /// Key the record is stored under. Compound so that multiple line items
    /// on one invoice do not overwrite each other.
    pub fn storage_key(&self) -> String {
        format!("order:{}:{}", self.invoice_no, self.item.stock_code)
    }
}
