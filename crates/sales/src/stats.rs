//! Sales dashboard figures, derived from the ledger history and the cart.

use chrono::{NaiveDate, TimeZone};
use serde::Serialize;

use stockroom_core::Money;

use crate::cart::Cart;
use crate::sale::SaleRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SalesStats {
    /// Every sale record in the history, any day.
    pub total_sales: usize,
    pub todays_revenue: Money,
    pub todays_quantity: u64,
    pub cart_total: Money,
    pub cart_lines: usize,
}

impl SalesStats {
    /// A sale counts as "today" when its timestamp falls on `today` in `tz`.
    pub fn compute<Tz: TimeZone>(sales: &[SaleRecord], cart: &Cart, tz: &Tz, today: NaiveDate) -> Self {
        let todays = sales
            .iter()
            .filter(|s| s.timestamp.with_timezone(tz).date_naive() == today);

        let (todays_revenue, todays_quantity) = todays.fold((Money::ZERO, 0u64), |(revenue, qty), s| {
            (revenue + s.line_total(), qty + u64::from(s.quantity))
        });

        let totals = cart.totals();
        Self {
            total_sales: sales.len(),
            todays_revenue,
            todays_quantity,
            cart_total: totals.total_amount,
            cart_lines: totals.line_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone, Utc};
    use stockroom_core::{ProductId, SaleId};
    use stockroom_products::Product;

    fn sale(id: i64, cents: u64, quantity: u32, rfc3339: &str) -> SaleRecord {
        SaleRecord {
            id: SaleId::new(id),
            product_id: ProductId::new(1),
            quantity,
            price: Money::from_cents(cents),
            timestamp: chrono::DateTime::parse_from_rfc3339(rfc3339)
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    #[test]
    fn only_todays_sales_feed_revenue() {
        let sales = vec![
            sale(1, 1000, 2, "2024-05-10T09:00:00Z"),
            sale(2, 550, 1, "2024-05-10T23:59:59Z"),
            sale(3, 9999, 5, "2024-05-09T12:00:00Z"),
        ];
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();

        let stats = SalesStats::compute(&sales, &Cart::new(), &Utc, today);

        assert_eq!(stats.total_sales, 3);
        assert_eq!(stats.todays_revenue, Money::from_cents(2550));
        assert_eq!(stats.todays_quantity, 3);
        assert_eq!(stats.cart_total, Money::ZERO);
    }

    #[test]
    fn today_follows_the_given_time_zone() {
        // 23:30 UTC on the 9th is already the 10th at UTC+2.
        let sales = vec![sale(1, 100, 1, "2024-05-09T23:30:00Z")];
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();

        let stats = SalesStats::compute(&sales, &Cart::new(), &tz, today);
        assert_eq!(stats.todays_quantity, 1);

        let stats = SalesStats::compute(&sales, &Cart::new(), &Utc, today);
        assert_eq!(stats.todays_quantity, 0);
    }

    #[test]
    fn cart_total_tracks_the_cart() {
        let product = Product {
            id: ProductId::new(4),
            name: "Tape".into(),
            sku: "TP-1".into(),
            price: Money::from_cents(325),
            quantity: 10,
            low_stock_threshold: 2,
            last_updated: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        };
        let mut cart = Cart::new();
        cart.add_to_cart(&product).unwrap();
        cart.add_to_cart(&product).unwrap();

        let stats = SalesStats::compute(&[], &cart, &Utc, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

        assert_eq!(stats.cart_total, Money::from_cents(650));
        assert_eq!(stats.cart_lines, 1);
        assert_eq!(stats.total_sales, 0);
    }
}
