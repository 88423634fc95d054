//! Cart reservation engine.
//!
//! A [`Cart`] holds product snapshots and the quantity the customer intends to buy.
//! Every mutation is checked against the stock known to the caller, so the cart
//! never asks for more than the shelf had. Rejected mutations return a
//! [`CartWarning`] and leave the cart exactly as it was.

use serde::Serialize;
use thiserror::Error;

use stockroom_core::entity::position_by_id;
use stockroom_core::{Entity, Money, ProductId};
use stockroom_products::{CatalogSnapshot, Product};

/// A product snapshot plus the quantity reserved for sale.
///
/// Invariant: `1 <= sale_quantity <= product.quantity`, where `product` is the
/// snapshot taken when the line was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    product: Product,
    sale_quantity: u32,
}

impl Entity for CartLine {
    type Id = ProductId;

    fn id(&self) -> ProductId {
        self.product.id
    }
}

impl CartLine {
    pub fn product(&self) -> &Product {
        &self.product
    }

    pub fn product_id(&self) -> ProductId {
        self.product.id
    }

    pub fn sale_quantity(&self) -> u32 {
        self.sale_quantity
    }

    pub fn unit_price(&self) -> Money {
        self.product.price
    }

    pub fn line_total(&self) -> Money {
        self.product.price.times(self.sale_quantity)
    }

    /// Stock left on the shelf if this line sells, per the add-time snapshot.
    pub fn remaining_after_sale(&self) -> u32 {
        self.product.quantity.saturating_sub(self.sale_quantity)
    }
}

/// Aggregate figures for the cart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CartTotals {
    pub line_count: usize,
    pub total_units: u64,
    pub total_amount: Money,
}

/// A rejected cart mutation. The cart is unchanged whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartWarning {
    #[error("{name} is out of stock")]
    OutOfStock { product_id: ProductId, name: String },

    #[error(
        "cannot exceed available stock for product {product_id}: requested {requested}, available {available}"
    )]
    ExceedsStock {
        product_id: ProductId,
        requested: i64,
        available: u32,
    },

    #[error("product {0} is not in the current catalog")]
    UnknownProduct(ProductId),
}

/// What an accepted cart mutation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartUpdate {
    Added { product_id: ProductId, quantity: u32 },
    QuantityChanged { product_id: ProductId, from: u32, to: u32 },
    Removed { product_id: ProductId },
    Unchanged,
}

/// Session-scoped cart: ordered lines, at most one per product id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn get(&self, product_id: ProductId) -> Option<&CartLine> {
        self.position(product_id).map(|idx| &self.lines[idx])
    }

    pub fn contains(&self, product_id: ProductId) -> bool {
        self.position(product_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Reserve one more unit of `product`.
    ///
    /// A product with no stock is refused outright. A product already in the cart
    /// goes through the same stock check as [`Cart::set_quantity`], using `product`
    /// as the live stock figure.
    pub fn add_to_cart(&mut self, product: &Product) -> Result<CartUpdate, CartWarning> {
        if product.quantity == 0 {
            return Err(CartWarning::OutOfStock {
                product_id: product.id,
                name: product.name.clone(),
            });
        }

        match self.position(product.id) {
            Some(idx) => {
                let requested = self.lines[idx].sale_quantity.saturating_add(1);
                self.set_line_quantity(idx, requested, product.quantity)
            }
            None => {
                self.lines.push(CartLine {
                    product: product.clone(),
                    sale_quantity: 1,
                });
                Ok(CartUpdate::Added {
                    product_id: product.id,
                    quantity: 1,
                })
            }
        }
    }

    /// Set the reserved quantity of a line.
    ///
    /// `new_quantity <= 0` removes the line. Otherwise the request must fit both the
    /// live stock in `snapshot` and the stock recorded when the line was created.
    /// A product that is not in the cart is left out of it.
    pub fn set_quantity(
        &mut self,
        product_id: ProductId,
        new_quantity: i64,
        snapshot: &CatalogSnapshot,
    ) -> Result<CartUpdate, CartWarning> {
        if new_quantity <= 0 {
            return Ok(self.remove_item(product_id));
        }

        let Some(idx) = self.position(product_id) else {
            return Ok(CartUpdate::Unchanged);
        };
        let live = snapshot
            .get(product_id)
            .ok_or(CartWarning::UnknownProduct(product_id))?;

        let requested = u32::try_from(new_quantity).map_err(|_| CartWarning::ExceedsStock {
            product_id,
            requested: new_quantity,
            available: live.quantity.min(self.lines[idx].product.quantity),
        })?;

        self.set_line_quantity(idx, requested, live.quantity)
    }

    pub fn increment_quantity(
        &mut self,
        product_id: ProductId,
        snapshot: &CatalogSnapshot,
    ) -> Result<CartUpdate, CartWarning> {
        let current = self.get(product_id).map_or(0, |line| line.sale_quantity);
        self.set_quantity(product_id, i64::from(current) + 1, snapshot)
    }

    /// Decrementing a line at quantity 1 removes it.
    pub fn decrement_quantity(
        &mut self,
        product_id: ProductId,
        snapshot: &CatalogSnapshot,
    ) -> Result<CartUpdate, CartWarning> {
        let current = self.get(product_id).map_or(0, |line| line.sale_quantity);
        self.set_quantity(product_id, i64::from(current) - 1, snapshot)
    }

    pub fn remove_item(&mut self, product_id: ProductId) -> CartUpdate {
        match self.position(product_id) {
            Some(idx) => {
                self.lines.remove(idx);
                CartUpdate::Removed { product_id }
            }
            None => CartUpdate::Unchanged,
        }
    }

    /// Empty the cart, returning how many lines were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.lines.len();
        self.lines.clear();
        dropped
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals {
            line_count: self.lines.len(),
            total_units: self.lines.iter().map(|l| u64::from(l.sale_quantity)).sum(),
            total_amount: self.lines.iter().map(CartLine::line_total).sum(),
        }
    }

    pub(crate) fn retain_lines(&mut self, keep: impl FnMut(&CartLine) -> bool) -> usize {
        let before = self.lines.len();
        self.lines.retain(keep);
        before - self.lines.len()
    }

    fn position(&self, product_id: ProductId) -> Option<usize> {
        position_by_id(&self.lines, product_id)
    }

    fn set_line_quantity(
        &mut self,
        idx: usize,
        requested: u32,
        live_quantity: u32,
    ) -> Result<CartUpdate, CartWarning> {
        let line = &mut self.lines[idx];
        let available = live_quantity.min(line.product.quantity);
        if requested > available {
            return Err(CartWarning::ExceedsStock {
                product_id: line.product.id,
                requested: i64::from(requested),
                available,
            });
        }

        let from = line.sale_quantity;
        if from == requested {
            return Ok(CartUpdate::Unchanged);
        }
        line.sale_quantity = requested;
        Ok(CartUpdate::QuantityChanged {
            product_id: line.product.id,
            from,
            to: requested,
        })
    }
}
