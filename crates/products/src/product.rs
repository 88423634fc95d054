use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity, Money, ProductId};

/// Default low-stock threshold used by catalog queries when none is given.
pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 10;

/// Product record as held by the catalog.
///
/// `quantity` is the authoritative on-hand stock. Instances handed to the cart are
/// snapshots: they are never refreshed in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub sku: String,
    pub price: Money,
    pub quantity: u32,
    pub low_stock_threshold: u32,
    pub last_updated: DateTime<Utc>,
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> ProductId {
        self.id
    }
}

impl Product {
    pub fn stock_status(&self) -> StockStatus {
        StockStatus::classify(self.quantity, self.low_stock_threshold)
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.quantity == 0
    }

    /// Value of the on-hand stock at the current price.
    pub fn stock_value(&self) -> Money {
        self.price.times(self.quantity)
    }

    /// Case-insensitive substring match on name or SKU.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&term) || self.sku.to_lowercase().contains(&term)
    }
}

/// Stock level classification used by alerts and listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl StockStatus {
    pub fn classify(quantity: u32, low_stock_threshold: u32) -> Self {
        if quantity == 0 {
            StockStatus::OutOfStock
        } else if quantity <= low_stock_threshold {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StockStatus::InStock => "In Stock",
            StockStatus::LowStock => "Low Stock",
            StockStatus::OutOfStock => "Out of Stock",
        }
    }

    pub fn alert_message(&self) -> &'static str {
        match self {
            StockStatus::InStock => "Stock level normal",
            StockStatus::LowStock => "Low stock - consider reordering soon",
            StockStatus::OutOfStock => "Out of stock - immediate attention required",
        }
    }
}

/// Payload for creating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub sku: String,
    pub price: Money,
    pub quantity: u32,
    pub low_stock_threshold: u32,
}

impl ProductDraft {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("product name is required"));
        }
        if self.sku.trim().is_empty() {
            return Err(DomainError::validation("SKU is required"));
        }
        if self.price == Money::ZERO {
            return Err(DomainError::validation("price must be positive"));
        }
        Ok(())
    }

    /// Materialize the draft once the catalog has assigned an id.
    pub fn into_product(self, id: ProductId, now: DateTime<Utc>) -> Product {
        Product {
            id,
            name: self.name,
            sku: self.sku,
            price: self.price,
            quantity: self.quantity,
            low_stock_threshold: self.low_stock_threshold,
            last_updated: now,
        }
    }
}

/// Partial update of a product; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub price: Option<Money>,
    pub quantity: Option<u32>,
    pub low_stock_threshold: Option<u32>,
}

impl ProductPatch {
    /// A patch that only sets the on-hand quantity.
    pub fn quantity(quantity: u32) -> Self {
        Self {
            quantity: Some(quantity),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.sku.is_none()
            && self.price.is_none()
            && self.quantity.is_none()
            && self.low_stock_threshold.is_none()
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(DomainError::validation("product name cannot be blank"));
        }
        if self.sku.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(DomainError::validation("SKU cannot be blank"));
        }
        Ok(())
    }

    /// Apply the patch, stamping `last_updated`.
    pub fn apply_to(&self, product: &mut Product, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(sku) = &self.sku {
            product.sku = sku.clone();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(quantity) = self.quantity {
            product.quantity = quantity;
        }
        if let Some(threshold) = self.low_stock_threshold {
            product.low_stock_threshold = threshold;
        }
        product.last_updated = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn widget(quantity: u32, threshold: u32) -> Product {
        Product {
            id: ProductId::new(1),
            name: "Blue Widget".to_string(),
            sku: "WID-BLU".to_string(),
            price: Money::from_cents(1250),
            quantity,
            low_stock_threshold: threshold,
            last_updated: test_time(),
        }
    }

    fn draft() -> ProductDraft {
        ProductDraft {
            name: "Gadget".to_string(),
            sku: "GAD-1".to_string(),
            price: Money::from_cents(999),
            quantity: 4,
            low_stock_threshold: 2,
        }
    }

    #[test]
    fn stock_status_boundaries() {
        assert_eq!(widget(0, 5).stock_status(), StockStatus::OutOfStock);
        assert_eq!(widget(5, 5).stock_status(), StockStatus::LowStock);
        assert_eq!(widget(6, 5).stock_status(), StockStatus::InStock);
        // A zero threshold never reports low stock.
        assert_eq!(widget(1, 0).stock_status(), StockStatus::InStock);
    }

    #[test]
    fn search_matches_name_or_sku_case_insensitively() {
        let product = widget(3, 1);
        assert!(product.matches_search("blue"));
        assert!(product.matches_search("wid-b"));
        assert!(product.matches_search("  "));
        assert!(!product.matches_search("red"));
    }

    #[test]
    fn stock_value_is_price_times_quantity() {
        assert_eq!(widget(4, 1).stock_value(), Money::from_cents(5000));
    }

    #[test]
    fn draft_requires_name_sku_and_price() {
        assert!(draft().validate().is_ok());

        let mut blank_name = draft();
        blank_name.name = "  ".to_string();
        assert!(matches!(blank_name.validate(), Err(DomainError::Validation(_))));

        let mut blank_sku = draft();
        blank_sku.sku = String::new();
        assert!(matches!(blank_sku.validate(), Err(DomainError::Validation(_))));

        let mut free = draft();
        free.price = Money::ZERO;
        assert!(matches!(free.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn patch_only_touches_given_fields_and_stamps_time() {
        let mut product = widget(10, 2);
        let later = test_time() + chrono::Duration::hours(1);

        ProductPatch::quantity(7).apply_to(&mut product, later);

        assert_eq!(product.quantity, 7);
        assert_eq!(product.name, "Blue Widget");
        assert_eq!(product.price, Money::from_cents(1250));
        assert_eq!(product.last_updated, later);
    }

    #[test]
    fn patch_rejects_blank_name() {
        let patch = ProductPatch {
            name: Some(" ".to_string()),
            ..ProductPatch::default()
        };
        assert!(patch.validate().is_err());
        assert!(!patch.is_empty());
        assert!(ProductPatch::default().is_empty());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: exactly one status applies, decided by the two boundaries.
            #[test]
            fn classify_respects_both_boundaries(quantity in 0u32..1_000, threshold in 0u32..1_000) {
                let status = StockStatus::classify(quantity, threshold);
                prop_assert_eq!(status == StockStatus::OutOfStock, quantity == 0);
                prop_assert_eq!(status == StockStatus::LowStock, quantity > 0 && quantity <= threshold);
                prop_assert_eq!(status == StockStatus::InStock, quantity > threshold);
            }

            /// Property: a quantity patch changes the stock and nothing else but the stamp.
            #[test]
            fn quantity_patch_touches_only_quantity(start in 0u32..500, next in 0u32..500) {
                let mut product = widget(start, 3);
                let before = product.clone();
                let later = test_time() + chrono::Duration::minutes(5);

                ProductPatch::quantity(next).apply_to(&mut product, later);

                prop_assert_eq!(product.quantity, next);
                prop_assert_eq!(&product.name, &before.name);
                prop_assert_eq!(product.price, before.price);
                prop_assert_eq!(product.low_stock_threshold, before.low_stock_threshold);
                prop_assert_eq!(product.last_updated, later);
            }
        }
    }
}
