use colored::Colorize;
use rust_decimal::Decimal;
use tabled::Tabled;
use tracing::debug;

use crate::api::ShopApi;
use crate::cache::Cache;
use crate::cli::{CartAddArgs, VoucherArgs};
use crate::config::Config;
use crate::error::{Result, ShopError};
use crate::output::{self, format_money, truncate};
use crate::store::{cart, CartSlice, Store};
use crate::types::CartItem;

#[derive(Tabled)]
struct CartRow {
    #[tabled(rename = "Product")]
    name: String,
    #[tabled(rename = "Qty")]
    quantity: u32,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Subtotal")]
    subtotal: String,
    #[tabled(rename = "ID")]
    id: String,
}

impl CartRow {
    fn new(item: &CartItem, currency: &str) -> Self {
        Self {
            name: truncate(&item.name, 40),
            quantity: item.quantity,
            price: format_money(item.price, currency),
            subtotal: format_money(item.price * Decimal::from(item.quantity), currency),
            id: if cart::is_placeholder(item) {
                "(pending)".to_string()
            } else {
                item.id.clone()
            },
        }
    }
}

fn print_cart(slice: &CartSlice, currency: &str) {
    output::print_item(slice, |slice| {
        if slice.items.is_empty() {
            println!("Your cart is empty.");
            return;
        }

        println!("{} item(s)", slice.item_count());
        output::print_table(
            &slice.items,
            |i| CartRow::new(i, currency),
            |i| format!("{}  {} x {}", i.id, i.quantity, i.name),
        );
        print_totals(slice, currency);
    });
}

fn print_totals(slice: &CartSlice, currency: &str) {
    let totals = match slice.totals {
        Some(totals) if !slice.stale => totals,
        _ => {
            println!(
                "{} {}",
                "Subtotal (estimated):".bold(),
                format_money(slice.estimated_subtotal(), currency)
            );
            return;
        }
    };

    println!("Items:    {}", format_money(totals.items_price, currency));
    if !totals.discount.is_zero() {
        let code = slice.voucher.as_ref().map_or("", |v| v.code.as_str());
        println!(
            "Discount: {} {}",
            format!("-{}", format_money(totals.discount, currency)).green(),
            code.dimmed()
        );
    }
    println!("Shipping: {}", format_money(totals.shipping_price, currency));
    println!("Tax:      {}", format_money(totals.tax_price, currency));
    println!("{}    {}", "Total:".bold(), format_money(totals.total_price, currency).bold());
}

/// Refresh from the server unless the local copy is a confirmed server state.
async fn sync_if_needed<A: ShopApi>(api: &A, slice: &mut CartSlice) -> Result<()> {
    if slice.totals.is_none() || slice.stale {
        debug!("refreshing cart before edit");
        cart::fetch(api, slice).await?;
    }
    Ok(())
}

/// Accept either a cart line ID or the ID of a product in the cart.
fn resolve_item_id(slice: &CartSlice, id: &str) -> Result<String> {
    slice
        .find(id)
        .or_else(|| slice.find_product(id))
        .map(|item| item.id.clone())
        .ok_or_else(|| ShopError::CartItemNotFound(id.to_string()))
}

pub async fn show<A: ShopApi>(api: &A, config: &Config, store: &mut Store) -> Result<()> {
    store.auth.require_user()?;
    cart::fetch(api, &mut store.cart).await?;
    print_cart(&store.cart, config.currency());
    Ok(())
}

pub async fn add<A: ShopApi>(
    api: &A,
    config: &Config,
    store: &mut Store,
    cache: &mut Cache,
    args: CartAddArgs,
) -> Result<()> {
    store.auth.require_user()?;
    sync_if_needed(api, &mut store.cart).await?;

    let product = match cache.get_product(&args.product_id) {
        Some(product) => product.clone(),
        None => {
            let product = api.product(&args.product_id).await.map_err(|e| match e {
                ShopError::NotFound(_) => ShopError::ProductNotFound(args.product_id.clone()),
                other => other,
            })?;
            cache.set_products([&product]);
            product
        }
    };

    let line = cart::add_item(api, &mut store.cart, &product, args.quantity).await?;
    output::print_message(&format!(
        "Added {} x {} (now {} in cart)",
        args.quantity, line.name, line.quantity
    ));
    if !output::is_json_output() {
        print_totals(&store.cart, config.currency());
    }
    Ok(())
}

pub async fn set<A: ShopApi>(
    api: &A,
    config: &Config,
    store: &mut Store,
    id: &str,
    quantity: u32,
) -> Result<()> {
    store.auth.require_user()?;
    sync_if_needed(api, &mut store.cart).await?;
    let item_id = resolve_item_id(&store.cart, id)?;

    let line = cart::set_quantity(api, &mut store.cart, &item_id, quantity).await?;
    output::print_message(&format!("{} quantity set to {}", line.name, line.quantity));
    if !output::is_json_output() {
        print_totals(&store.cart, config.currency());
    }
    Ok(())
}

pub async fn remove<A: ShopApi>(api: &A, config: &Config, store: &mut Store, id: &str) -> Result<()> {
    store.auth.require_user()?;
    sync_if_needed(api, &mut store.cart).await?;
    let item_id = resolve_item_id(&store.cart, id)?;

    let removed = cart::remove_item(api, &mut store.cart, &item_id).await?;
    output::print_message(&format!("Removed {} from cart", removed.name));
    if !output::is_json_output() && !store.cart.items.is_empty() {
        print_totals(&store.cart, config.currency());
    }
    Ok(())
}

pub async fn clear<A: ShopApi>(api: &A, store: &mut Store) -> Result<()> {
    store.auth.require_user()?;
    cart::clear(api, &mut store.cart).await?;
    output::print_message("Cart cleared");
    Ok(())
}

pub async fn voucher<A: ShopApi>(
    api: &A,
    config: &Config,
    store: &mut Store,
    args: VoucherArgs,
) -> Result<()> {
    store.auth.require_user()?;

    match args.code {
        Some(code) if !args.remove => {
            cart::apply_voucher(api, &mut store.cart, &code).await?;
            let message = match store.cart.voucher.as_ref().and_then(|v| v.description.as_ref()) {
                Some(description) => format!("Voucher {} applied ({description})", code.trim()),
                None => format!("Voucher {} applied", code.trim()),
            };
            output::print_message(&message);
        }
        _ => {
            cart::remove_voucher(api, &mut store.cart).await?;
            output::print_message("Voucher removed");
        }
    }

    if !output::is_json_output() {
        print_totals(&store.cart, config.currency());
    }
    Ok(())
}
