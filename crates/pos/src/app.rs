//! Command dispatch over a sales session.

use stockroom_products::ProductCatalog;
use stockroom_sales::{CartUpdate, CartWarning, CommitError, SaleLedger, SalesSession};

use crate::commands::{Command, HELP};
use crate::render;

pub enum Flow {
    Continue(String),
    Quit,
}

pub struct Terminal<C, L> {
    session: SalesSession<C, L>,
    reorder_threshold: u32,
}

impl<C, L> Terminal<C, L>
where
    C: ProductCatalog,
    L: SaleLedger,
{
    pub fn new(session: SalesSession<C, L>, reorder_threshold: u32) -> Self {
        Self {
            session,
            reorder_threshold,
        }
    }

    pub fn session(&self) -> &SalesSession<C, L> {
        &self.session
    }

    pub async fn execute(&mut self, command: Command) -> Flow {
        let session = &mut self.session;
        let text = match command {
            Command::Products => {
                let mut text = render::products(session.products());
                let banner = session.low_stock_banner();
                if !banner.is_empty() {
                    text.push_str(&format!("{} product(s) running low.\n", banner.len()));
                }
                text
            }
            Command::Find(term) => render::products(session.search(&term)),
            Command::Add(id) => cart_change(session.add_to_cart(id)),
            Command::Set(id, quantity) => cart_change(session.set_quantity(id, quantity)),
            Command::Inc(id) => cart_change(session.increment(id)),
            Command::Dec(id) => cart_change(session.decrement(id)),
            Command::Remove(id) => cart_change(Ok::<_, CartWarning>(session.remove(id))),
            Command::Clear => format!("Removed {} line(s).\n", session.clear_cart()),
            Command::Cart => render::cart(session.cart()),
            Command::Checkout => match session.process_sale().await {
                Ok(report) => render::report(&report),
                Err(CommitError::EmptyCart) => "Cart is empty.\n".to_string(),
                Err(e) => format!("Checkout failed: {e}\n"),
            },
            Command::DropCommitted => {
                format!("Dropped {} committed line(s).\n", session.discard_committed())
            }
            Command::Alerts(filter) => render::alerts(session.alerts(filter)),
            Command::Stats => render::stats(
                &session.stats(),
                &session.inventory_stats(),
                &session.alert_stats(),
            ),
            Command::Today => render::sales(&session.todays_sales().await),
            Command::Reorder => {
                let products = session.reorder_list(self.reorder_threshold).await;
                render::alerts(&products)
            }
            Command::Restock(id, quantity) => match session.adjust_stock(id, quantity).await {
                Ok(product) => format!("{} now has {} in stock.\n", product.name, product.quantity),
                Err(e) => format!("Restock failed: {e}\n"),
            },
            Command::Reload => match session.load().await {
                Ok(()) => format!(
                    "Loaded {} product(s) and {} sale(s).\n",
                    session.products().len(),
                    session.sales().len()
                ),
                Err(e) => format!("Reload failed: {e}\n"),
            },
            Command::Help => format!("{HELP}\n"),
            Command::Quit => return Flow::Quit,
        };
        Flow::Continue(text)
    }
}

fn cart_change<E: std::fmt::Display>(result: Result<CartUpdate, E>) -> String {
    match result {
        Ok(CartUpdate::Added { product_id, .. }) => format!("Added product {product_id}.\n"),
        Ok(CartUpdate::QuantityChanged { product_id, to, .. }) => {
            format!("Product {product_id} quantity is now {to}.\n")
        }
        Ok(CartUpdate::Removed { product_id }) => format!("Removed product {product_id}.\n"),
        Ok(CartUpdate::Unchanged) => "Nothing changed.\n".to_string(),
        Err(e) => format!("{e}\n"),
    }
}
