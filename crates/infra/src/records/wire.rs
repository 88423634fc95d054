//! Row shapes of the `product_c` and `sale_c` tables.
//!
//! Rows are decoded leniently: a missing numeric field reads as 0, a missing text
//! field as "", a missing timestamp as the time of decoding. Values that are present
//! but malformed (a negative price, an unparseable date) are decode errors.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use stockroom_core::{Money, ProductId, SaleId, StoreError, StoreResult};
use stockroom_products::{Product, ProductDraft, ProductPatch};
use stockroom_sales::{NewSale, SaleRecord};

pub const PRODUCT_FIELDS: &[&str] = &[
    "Name",
    "sku_c",
    "price_c",
    "quantity_c",
    "lowStockThreshold_c",
    "lastUpdated_c",
];

pub const SALE_FIELDS: &[&str] = &["Name", "productId_c", "quantity_c", "price_c", "timestamp_c"];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductRow {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "sku_c", default)]
    pub sku: Option<String>,
    #[serde(rename = "price_c", default)]
    pub price: Option<f64>,
    #[serde(rename = "quantity_c", default)]
    pub quantity: Option<i64>,
    #[serde(rename = "lowStockThreshold_c", default)]
    pub low_stock_threshold: Option<i64>,
    #[serde(rename = "lastUpdated_c", default)]
    pub last_updated: Option<String>,
}

impl ProductRow {
    pub fn into_product(self, now: DateTime<Utc>) -> StoreResult<Product> {
        Ok(Product {
            id: ProductId::new(self.id),
            name: self.name.unwrap_or_default(),
            sku: self.sku.unwrap_or_default(),
            price: decode_price(self.price)?,
            quantity: count(self.quantity),
            low_stock_threshold: count(self.low_stock_threshold),
            last_updated: decode_timestamp(self.last_updated.as_deref(), now)?,
        })
    }
}

/// A sale's product reference: either the bare id or a lookup object `{ "Id": n }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LookupRef {
    Id(i64),
    Lookup {
        #[serde(rename = "Id")]
        id: i64,
    },
}

impl LookupRef {
    pub fn id(self) -> i64 {
        match self {
            LookupRef::Id(id) | LookupRef::Lookup { id } => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SaleRow {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "productId_c", default)]
    pub product: Option<LookupRef>,
    #[serde(rename = "quantity_c", default)]
    pub quantity: Option<i64>,
    #[serde(rename = "price_c", default)]
    pub price: Option<f64>,
    #[serde(rename = "timestamp_c", default)]
    pub timestamp: Option<String>,
}

impl SaleRow {
    pub fn into_sale(self, now: DateTime<Utc>) -> StoreResult<SaleRecord> {
        let product = self
            .product
            .ok_or_else(|| StoreError::decode(format!("sale {} has no product reference", self.id)))?;

        Ok(SaleRecord {
            id: SaleId::new(self.id),
            product_id: ProductId::new(product.id()),
            quantity: count(self.quantity),
            price: decode_price(self.price)?,
            timestamp: decode_timestamp(self.timestamp.as_deref(), now)?,
        })
    }
}

/// The sale the store just accepted, built from its echo of the created row.
///
/// Only the echoed `Id` is required: the sale exists once the store has assigned one,
/// so every field the echo leaves out or garbles is taken from `sent`.
pub fn decode_recorded_sale(row: Value, sent: &NewSale, now: DateTime<Utc>) -> StoreResult<SaleRecord> {
    let id = row
        .get("Id")
        .and_then(Value::as_i64)
        .ok_or_else(|| StoreError::decode("created sale came back without an Id"))?;
    let echo = serde_json::from_value::<SaleRow>(row).unwrap_or(SaleRow {
        id,
        product: None,
        quantity: None,
        price: None,
        timestamp: None,
    });

    Ok(SaleRecord {
        id: SaleId::new(id),
        product_id: echo.product.map_or(sent.product_id, |p| ProductId::new(p.id())),
        quantity: echo
            .quantity
            .filter(|&q| q > 0)
            .map_or(sent.quantity, |q| count(Some(q))),
        price: echo
            .price
            .and_then(|p| Money::from_decimal(p).ok())
            .unwrap_or(sent.price),
        timestamp: echo
            .timestamp
            .and_then(|raw| decode_timestamp(Some(raw.as_str()), now).ok())
            .unwrap_or(now),
    })
}

/// Product fields written on create/update. Unset fields are left out of the payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductWrite {
    #[serde(rename = "Id", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "Name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "sku_c", skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(rename = "price_c", skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(rename = "quantity_c", skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(rename = "lowStockThreshold_c", skip_serializing_if = "Option::is_none")]
    pub low_stock_threshold: Option<u32>,
    #[serde(rename = "lastUpdated_c")]
    pub last_updated: String,
}

impl ProductWrite {
    pub fn from_draft(draft: &ProductDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            name: Some(draft.name.clone()),
            sku: Some(draft.sku.clone()),
            price: Some(draft.price.to_decimal()),
            quantity: Some(draft.quantity),
            low_stock_threshold: Some(draft.low_stock_threshold),
            last_updated: format_timestamp(now),
        }
    }

    pub fn from_patch(id: ProductId, patch: &ProductPatch, now: DateTime<Utc>) -> Self {
        Self {
            id: Some(id.get()),
            name: patch.name.clone(),
            sku: patch.sku.clone(),
            price: patch.price.map(Money::to_decimal),
            quantity: patch.quantity,
            low_stock_threshold: patch.low_stock_threshold,
            last_updated: format_timestamp(now),
        }
    }

    pub fn to_value(&self) -> StoreResult<Value> {
        serde_json::to_value(self).map_err(|e| StoreError::decode(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleWrite {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "productId_c")]
    pub product_id: i64,
    #[serde(rename = "quantity_c")]
    pub quantity: u32,
    #[serde(rename = "price_c")]
    pub price: f64,
    #[serde(rename = "timestamp_c")]
    pub timestamp: String,
}

impl SaleWrite {
    pub fn new(sale: &NewSale, now: DateTime<Utc>) -> Self {
        let timestamp = format_timestamp(now);
        Self {
            name: format!("Sale - {timestamp}"),
            product_id: sale.product_id.get(),
            quantity: sale.quantity,
            price: sale.price.to_decimal(),
            timestamp,
        }
    }

    pub fn to_value(&self) -> StoreResult<Value> {
        serde_json::to_value(self).map_err(|e| StoreError::decode(e.to_string()))
    }
}

pub fn decode_rows<T, U>(
    rows: Vec<Value>,
    now: DateTime<Utc>,
    convert: impl Fn(T, DateTime<Utc>) -> StoreResult<U>,
) -> StoreResult<Vec<U>>
where
    T: for<'de> Deserialize<'de>,
{
    rows.into_iter().map(|row| decode_row(row, now, &convert)).collect()
}

/// Like [`decode_rows`], but a row that fails to decode is logged and left out.
pub fn decode_rows_skipping<T, U>(
    table: &str,
    rows: Vec<Value>,
    now: DateTime<Utc>,
    convert: impl Fn(T, DateTime<Utc>) -> StoreResult<U>,
) -> Vec<U>
where
    T: for<'de> Deserialize<'de>,
{
    rows.into_iter()
        .filter_map(|row| {
            let id = row.get("Id").cloned();
            decode_row(row, now, &convert)
                .map_err(|e| tracing::warn!(table, ?id, error = %e, "skipping undecodable row"))
                .ok()
        })
        .collect()
}

pub fn decode_row<T, U>(
    row: Value,
    now: DateTime<Utc>,
    convert: impl Fn(T, DateTime<Utc>) -> StoreResult<U>,
) -> StoreResult<U>
where
    T: for<'de> Deserialize<'de>,
{
    let parsed: T = serde_json::from_value(row).map_err(|e| StoreError::decode(e.to_string()))?;
    convert(parsed, now)
}

/// Millisecond RFC 3339 in UTC, e.g. `2024-05-10T09:30:00.000Z`.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn decode_price(raw: Option<f64>) -> StoreResult<Money> {
    match raw {
        None => Ok(Money::ZERO),
        Some(value) => Money::from_decimal(value).map_err(|e| StoreError::decode(e.to_string())),
    }
}

/// Stock counts below zero are clamped to zero.
fn count(raw: Option<i64>) -> u32 {
    raw.map_or(0, |n| u32::try_from(n.max(0)).unwrap_or(u32::MAX))
}

fn decode_timestamp(raw: Option<&str>, now: DateTime<Utc>) -> StoreResult<DateTime<Utc>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(now);
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    // Zone-less timestamps are taken as UTC.
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| StoreError::decode(format!("bad timestamp {raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn full_product_row_decodes() {
        let product = decode_row(
            json!({
                "Id": 3,
                "Name": "Widget",
                "sku_c": "WG-3",
                "price_c": 12.5,
                "quantity_c": 40,
                "lowStockThreshold_c": 5,
                "lastUpdated_c": "2024-05-01T08:00:00.000Z"
            }),
            now(),
            ProductRow::into_product,
        )
        .unwrap();

        assert_eq!(product.id, ProductId::new(3));
        assert_eq!(product.name, "Widget");
        assert_eq!(product.price, Money::from_cents(1250));
        assert_eq!(product.quantity, 40);
        assert_eq!(product.low_stock_threshold, 5);
        assert_eq!(product.last_updated, Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap());
    }

    #[test]
    fn missing_product_fields_take_defaults() {
        let product = decode_row(
            json!({ "Id": 9, "price_c": null }),
            now(),
            ProductRow::into_product,
        )
        .unwrap();

        assert_eq!(product.name, "");
        assert_eq!(product.sku, "");
        assert_eq!(product.price, Money::ZERO);
        assert_eq!(product.quantity, 0);
        assert_eq!(product.low_stock_threshold, 0);
        assert_eq!(product.last_updated, now());
    }

    #[test]
    fn malformed_values_are_decode_errors() {
        let negative_price = decode_row(
            json!({ "Id": 1, "price_c": -2.0 }),
            now(),
            ProductRow::into_product,
        );
        assert!(matches!(negative_price, Err(StoreError::Decode(_))));

        let bad_date = decode_row(
            json!({ "Id": 1, "lastUpdated_c": "yesterday" }),
            now(),
            ProductRow::into_product,
        );
        assert!(matches!(bad_date, Err(StoreError::Decode(_))));
    }

    #[test]
    fn negative_quantity_clamps_to_zero() {
        let product = decode_row(
            json!({ "Id": 1, "quantity_c": -4 }),
            now(),
            ProductRow::into_product,
        )
        .unwrap();
        assert_eq!(product.quantity, 0);
    }

    #[test]
    fn sale_product_reference_accepts_both_shapes() {
        let bare = decode_row(
            json!({ "Id": 1, "productId_c": 7, "quantity_c": 2, "price_c": 1.5, "timestamp_c": "2024-05-10T09:00:00Z" }),
            now(),
            SaleRow::into_sale,
        )
        .unwrap();
        let lookup = decode_row(
            json!({ "Id": 2, "productId_c": { "Id": 7, "Name": "Widget" }, "quantity_c": 1 }),
            now(),
            SaleRow::into_sale,
        )
        .unwrap();

        assert_eq!(bare.product_id, ProductId::new(7));
        assert_eq!(bare.line_total(), Money::from_cents(300));
        assert_eq!(lookup.product_id, ProductId::new(7));
        assert_eq!(lookup.timestamp, now());
    }

    #[test]
    fn sale_without_product_reference_is_rejected() {
        let result = decode_row(json!({ "Id": 4, "quantity_c": 1 }), now(), SaleRow::into_sale);
        assert!(matches!(result, Err(StoreError::Decode(_))));
    }

    fn sent() -> NewSale {
        NewSale {
            product_id: ProductId::new(7),
            quantity: 2,
            price: Money::from_cents(1000),
        }
    }

    #[test]
    fn recorded_sale_falls_back_to_what_was_sent() {
        let sale = decode_recorded_sale(json!({ "Id": 11 }), &sent(), now()).unwrap();

        assert_eq!(sale, sent().into_record(SaleId::new(11), now()));
    }

    #[test]
    fn recorded_sale_prefers_echoed_fields_and_ignores_garbled_ones() {
        let sale = decode_recorded_sale(
            json!({
                "Id": 12,
                "productId_c": { "Id": 7 },
                "quantity_c": 2,
                "price_c": -3.0,
                "timestamp_c": "2024-05-10T09:00:00Z"
            }),
            &sent(),
            now(),
        )
        .unwrap();

        assert_eq!(sale.id, SaleId::new(12));
        assert_eq!(sale.price, Money::from_cents(1000));
        assert_eq!(sale.timestamp, Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap());

        let odd_shape = decode_recorded_sale(
            json!({ "Id": 13, "productId_c": "seven" }),
            &sent(),
            now(),
        )
        .unwrap();
        assert_eq!(odd_shape.product_id, ProductId::new(7));
    }

    #[test]
    fn recorded_sale_needs_an_id() {
        let result = decode_recorded_sale(json!({ "productId_c": 7 }), &sent(), now());
        assert!(matches!(result, Err(StoreError::Decode(_))));
    }

    #[test]
    fn skipping_decoder_drops_only_bad_rows() {
        let sales = decode_rows_skipping(
            "sale_c",
            vec![
                json!({ "Id": 1 }),
                json!({ "Id": 2, "productId_c": 7, "quantity_c": 1 }),
            ],
            now(),
            SaleRow::into_sale,
        );

        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].id, SaleId::new(2));
    }

    #[test]
    fn zone_less_timestamps_read_as_utc() {
        let sale = decode_row(
            json!({ "Id": 1, "productId_c": 2, "timestamp_c": "2024-05-10T09:15:00" }),
            now(),
            SaleRow::into_sale,
        )
        .unwrap();
        assert_eq!(sale.timestamp, Utc.with_ymd_and_hms(2024, 5, 10, 9, 15, 0).unwrap());
    }

    #[test]
    fn patch_payload_only_carries_changed_fields() {
        let write = ProductWrite::from_patch(ProductId::new(5), &ProductPatch::quantity(8), now());
        assert_eq!(
            write.to_value().unwrap(),
            json!({ "Id": 5, "quantity_c": 8, "lastUpdated_c": "2024-05-10T12:00:00.000Z" })
        );
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: a full product write decodes back to the same product.
            #[test]
            fn product_write_decodes_to_the_same_product(
                id in 1i64..1_000_000,
                name in "[A-Za-z][A-Za-z0-9 ]{0,20}",
                sku in "[A-Z]{2}-[0-9]{3}",
                cents in 0u64..10_000_000,
                quantity in 0u32..100_000,
                threshold in 0u32..1_000,
            ) {
                let patch = ProductPatch {
                    name: Some(name.clone()),
                    sku: Some(sku.clone()),
                    price: Some(Money::from_cents(cents)),
                    quantity: Some(quantity),
                    low_stock_threshold: Some(threshold),
                };
                let row = ProductWrite::from_patch(ProductId::new(id), &patch, now())
                    .to_value()
                    .unwrap();

                let product = decode_row(row, now(), ProductRow::into_product).unwrap();

                prop_assert_eq!(product.id, ProductId::new(id));
                prop_assert_eq!(product.name, name);
                prop_assert_eq!(product.sku, sku);
                prop_assert_eq!(product.price, Money::from_cents(cents));
                prop_assert_eq!(product.quantity, quantity);
                prop_assert_eq!(product.low_stock_threshold, threshold);
                prop_assert_eq!(product.last_updated, now());
            }

            /// Property: any stored count, however negative, decodes to a valid stock level.
            #[test]
            fn stored_counts_never_decode_negative(raw in any::<i64>()) {
                let product = decode_row(json!({ "Id": 1, "quantity_c": raw }), now(), ProductRow::into_product)
                    .unwrap();
                prop_assert_eq!(i64::from(product.quantity), raw.clamp(0, i64::from(u32::MAX)));
            }
        }
    }

    #[test]
    fn sale_payload_is_named_after_its_timestamp() {
        assert_eq!(
            SaleWrite::new(&sent(), now()).to_value().unwrap(),
            json!({
                "Name": "Sale - 2024-05-10T12:00:00.000Z",
                "productId_c": 7,
                "quantity_c": 2,
                "price_c": 10.0,
                "timestamp_c": "2024-05-10T12:00:00.000Z"
            })
        );
    }
}
