//! Read-only stock projections: inventory stats and alert lists.
//!
//! Pure functions over a slice of products. Nothing here is transactional.

use serde::{Deserialize, Serialize};

use stockroom_core::Money;

use crate::product::{Product, StockStatus};

/// Headline numbers for the inventory listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryStats {
    pub total_products: usize,
    pub total_value: Money,
    /// Products at or below their threshold, out-of-stock ones included.
    pub low_stock_count: usize,
    pub out_of_stock_count: usize,
}

impl InventoryStats {
    pub fn from_products(products: &[Product]) -> Self {
        Self {
            total_products: products.len(),
            total_value: products.iter().map(Product::stock_value).sum(),
            low_stock_count: products
                .iter()
                .filter(|p| p.quantity <= p.low_stock_threshold)
                .count(),
            out_of_stock_count: products.iter().filter(|p| p.is_out_of_stock()).count(),
        }
    }
}

/// Alert counters. Unlike [`InventoryStats::low_stock_count`], low stock here
/// excludes out-of-stock products so the two buckets never overlap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertStats {
    pub total_alerts: usize,
    pub out_of_stock_count: usize,
    pub low_stock_count: usize,
}

impl AlertStats {
    pub fn from_products(products: &[Product]) -> Self {
        let mut stats = Self::default();
        for product in products {
            match product.stock_status() {
                StockStatus::OutOfStock => stats.out_of_stock_count += 1,
                StockStatus::LowStock => stats.low_stock_count += 1,
                StockStatus::InStock => {}
            }
        }
        stats.total_alerts = stats.out_of_stock_count + stats.low_stock_count;
        stats
    }
}

/// Which alerts to list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertFilter {
    #[default]
    All,
    OutOfStock,
    LowStock,
}

impl core::str::FromStr for AlertFilter {
    type Err = stockroom_core::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(AlertFilter::All),
            "out" | "out-of-stock" => Ok(AlertFilter::OutOfStock),
            "low" | "low-stock" => Ok(AlertFilter::LowStock),
            other => Err(stockroom_core::DomainError::validation(format!(
                "unknown alert filter '{other}' (expected all, out or low)"
            ))),
        }
    }
}

/// Products that need attention, according to `filter`.
pub fn alerts(products: &[Product], filter: AlertFilter) -> Vec<&Product> {
    products
        .iter()
        .filter(|p| match (filter, p.stock_status()) {
            (_, StockStatus::InStock) => false,
            (AlertFilter::All, _) => true,
            (AlertFilter::OutOfStock, status) => status == StockStatus::OutOfStock,
            (AlertFilter::LowStock, status) => status == StockStatus::LowStock,
        })
        .collect()
}

/// Low but not empty: the reorder banner shown on the inventory listing.
pub fn low_stock_banner(products: &[Product]) -> Vec<&Product> {
    alerts(products, AlertFilter::LowStock)
}
