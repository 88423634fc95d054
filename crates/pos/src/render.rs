//! Plain-text rendering of catalog, cart and commit results.

use std::fmt::Write;

use chrono::Local;

use stockroom_products::{AlertStats, InventoryStats, Product};
use stockroom_sales::{Cart, CommitReport, LineStatus, SaleRecord, SalesStats};

pub fn products<'a>(products: impl IntoIterator<Item = &'a Product>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4}  {:<24} {:<10} {:>10} {:>6}  {}",
        "id", "name", "sku", "price", "stock", "status"
    );
    let mut any = false;
    for p in products {
        any = true;
        let _ = writeln!(
            out,
            "{:>4}  {:<24} {:<10} {:>10} {:>6}  {}",
            p.id,
            truncate(&p.name, 24),
            truncate(&p.sku, 10),
            p.price,
            p.quantity,
            p.stock_status().label()
        );
    }
    if !any {
        out.push_str("(no products)\n");
    }
    out
}

pub fn alerts<'a>(products: impl IntoIterator<Item = &'a Product>) -> String {
    let mut out = String::new();
    for p in products {
        let _ = writeln!(
            out,
            "{:>4}  {:<24} {:>6} left (threshold {})  {}",
            p.id,
            truncate(&p.name, 24),
            p.quantity,
            p.low_stock_threshold,
            p.stock_status().alert_message()
        );
    }
    if out.is_empty() {
        out.push_str("All products are well stocked.\n");
    }
    out
}

pub fn cart(cart: &Cart) -> String {
    if cart.is_empty() {
        return "Cart is empty.\n".to_string();
    }

    let mut out = String::new();
    for line in cart.lines() {
        let _ = writeln!(
            out,
            "{:>4}  {:<24} {:>4} x {:>9} = {:>10}",
            line.product_id(),
            truncate(&line.product().name, 24),
            line.sale_quantity(),
            line.unit_price(),
            line.line_total()
        );
    }
    let totals = cart.totals();
    let _ = writeln!(
        out,
        "{} line(s), {} unit(s), total {}",
        totals.line_count, totals.total_units, totals.total_amount
    );
    out
}

pub fn report(report: &CommitReport) -> String {
    let mut out = String::new();
    for outcome in report.lines() {
        let status = match &outcome.status {
            LineStatus::Committed { sale, product } => {
                format!("sold (sale {}, {} left)", sale.id, product.quantity)
            }
            LineStatus::Failed(e) => format!("FAILED: {e}"),
            LineStatus::NotAttempted => "not attempted".to_string(),
        };
        let _ = writeln!(
            out,
            "line {}: product {} x {}  {}",
            outcome.line, outcome.product_id, outcome.sale_quantity, status
        );
    }

    if report.is_success() {
        out.push_str("Sale processed successfully!\n");
    } else {
        let _ = writeln!(
            out,
            "Sale only partly processed ({} line(s) recorded). The cart was kept; \
             use `drop-committed` before retrying to avoid selling those lines twice.",
            report.committed_sales().len()
        );
    }
    out
}

pub fn sales(sales: &[SaleRecord]) -> String {
    if sales.is_empty() {
        return "No sales yet today.\n".to_string();
    }

    let mut out = String::new();
    for sale in sales {
        let _ = writeln!(
            out,
            "{}  sale {:>4}  product {:>4} x {:>3} @ {:>9} = {:>10}",
            sale.timestamp.with_timezone(&Local).format("%H:%M:%S"),
            sale.id,
            sale.product_id,
            sale.quantity,
            sale.price,
            sale.line_total()
        );
    }
    out
}

pub fn stats(sales: &SalesStats, inventory: &InventoryStats, alerts: &AlertStats) -> String {
    format!(
        "sales recorded: {}\n\
         today's revenue: {} ({} unit(s))\n\
         cart: {} line(s), {}\n\
         products: {} worth {}\n\
         alerts: {} ({} out of stock, {} low)\n",
        sales.total_sales,
        sales.todays_revenue,
        sales.todays_quantity,
        sales.cart_lines,
        sales.cart_total,
        inventory.total_products,
        inventory.total_value,
        alerts.total_alerts,
        alerts.out_of_stock_count,
        alerts.low_stock_count,
    )
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut cut: String = s.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
