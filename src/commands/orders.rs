use colored::Colorize;
use rust_decimal::Decimal;
use tabled::{settings::Style, Table, Tabled};

use crate::api::ShopApi;
use crate::config::Config;
use crate::error::Result;
use crate::output::{self, format_date, format_date_only, format_money, order_status_colored, truncate};
use crate::store::{orders, Store};
use crate::types::Order;

#[derive(Tabled)]
pub(crate) struct OrderRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Items")]
    items: u32,
    #[tabled(rename = "Total")]
    total: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl OrderRow {
    pub(crate) fn new(order: &Order, currency: &str) -> Self {
        Self {
            id: order.id.clone(),
            date: format_date_only(&order.created_at),
            items: order.order_items.iter().map(|i| i.quantity).sum(),
            total: format_money(order.total_price, currency),
            status: order_status_colored(order.status()),
        }
    }
}

pub(crate) fn compact_line(order: &Order, currency: &str) -> String {
    format!(
        "{}  {}  {}  {}",
        order.id,
        format_date_only(&order.created_at),
        format_money(order.total_price, currency),
        order.status()
    )
}

#[derive(Tabled)]
struct OrderItemRow {
    #[tabled(rename = "Product")]
    name: String,
    #[tabled(rename = "Qty")]
    quantity: u32,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Subtotal")]
    subtotal: String,
}

/// Print an order with its lines and totals.
pub(crate) fn print_order(order: &Order, currency: &str) {
    output::print_item(order, |o| {
        println!("{} {}", "Order".bold(), o.id.bold());
        println!("{}", "─".repeat(50));
        println!("Status:   {}", order_status_colored(o.status()));
        println!("Placed:   {}", format_date(&o.created_at));
        if let Some(paid_at) = &o.paid_at {
            println!("Paid:     {}", format_date(paid_at));
        }
        if let Some(delivered_at) = &o.delivered_at {
            println!("Delivered: {}", format_date(delivered_at));
        }
        println!("Ship to:  {}", o.shipping_address);
        println!("Payment:  {}", o.payment_method);
        if let Some(user) = &o.user {
            println!("Customer: {} {}", user.name, user.id.dimmed());
        }
        println!();

        let rows: Vec<OrderItemRow> = o
            .order_items
            .iter()
            .map(|item| OrderItemRow {
                name: truncate(&item.name, 40),
                quantity: item.quantity,
                price: format_money(item.price, currency),
                subtotal: format_money(item.price * Decimal::from(item.quantity), currency),
            })
            .collect();
        if !rows.is_empty() {
            println!("{}", Table::new(rows).with(Style::rounded()));
        }

        println!("Items:    {}", format_money(o.items_price, currency));
        if !o.discount.is_zero() {
            let code = o.voucher.as_ref().map_or("", |v| v.code.as_str());
            println!("Discount: -{} {}", format_money(o.discount, currency), code.dimmed());
        }
        println!("Shipping: {}", format_money(o.shipping_price, currency));
        println!("Tax:      {}", format_money(o.tax_price, currency));
        println!("{}    {}", "Total:".bold(), format_money(o.total_price, currency).bold());
    });
}

pub async fn list<A: ShopApi>(api: &A, config: &Config, store: &mut Store) -> Result<()> {
    store.auth.require_user()?;
    orders::fetch_mine(api, &mut store.orders).await?;

    let list: Vec<Order> = store.orders.list().into_iter().cloned().collect();
    if list.is_empty() && !output::is_json_output() {
        output::print_message("You have no orders yet.");
        return Ok(());
    }

    let currency = config.currency();
    output::print_table(&list, |o| OrderRow::new(o, currency), |o| compact_line(o, currency));
    Ok(())
}

pub async fn show<A: ShopApi>(api: &A, config: &Config, store: &mut Store, id: &str) -> Result<()> {
    store.auth.require_user()?;
    let order = orders::fetch_one(api, &mut store.orders, id).await?;
    print_order(&order, config.currency());

    if store.payment.order_id() == Some(order.id.as_str()) && !output::is_json_output() {
        println!("\nA checkout for this order is in progress. See 'shop checkout status'.");
    }
    Ok(())
}
