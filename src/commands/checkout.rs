use std::path::Path;

use colored::Colorize;
use serde_json::json;

use crate::api::ShopApi;
use crate::checkout::{CheckoutFlow, CheckoutUrls, ReturnParams, StartedPayment};
use crate::cli::CheckoutStartArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::{self, format_relative};
use crate::store::{CheckoutStage, Store};
use crate::types::ShippingAddress;

use super::orders::print_order;

fn flow<'a, A: ShopApi>(
    api: &'a A,
    config: &Config,
    store: &'a mut Store,
    state_path: &Path,
) -> CheckoutFlow<'a, A> {
    let urls = CheckoutUrls {
        return_url: config.return_url().to_string(),
        cancel_url: config.cancel_url().to_string(),
    };
    CheckoutFlow::new(api, store, urls).persist_to(state_path.to_path_buf())
}

fn print_started(started: &StartedPayment) {
    if output::is_json_output() {
        println!(
            "{}",
            json!({
                "orderId": started.order_id,
                "paymentId": started.payment_id,
                "approvalUrl": started.approval_url,
            })
        );
        return;
    }

    println!("Order {} placed.", started.order_id.bold());
    println!("Approve the payment in your browser:\n");
    println!("  {}\n", started.approval_url.cyan().underline());
    println!("When PayPal sends you back, run:");
    println!("  shop checkout resume \"<the URL you were returned to>\"");
}

pub async fn start<A: ShopApi>(
    api: &A,
    config: &Config,
    store: &mut Store,
    state_path: &Path,
    args: CheckoutStartArgs,
) -> Result<()> {
    let shipping = ShippingAddress {
        address: args.address,
        city: args.city,
        postal_code: args.postal_code,
        country: args.country,
    };

    let started = flow(api, config, store, state_path)
        .start(&shipping, args.method)
        .await?;
    print_started(&started);
    Ok(())
}

pub async fn pay<A: ShopApi>(
    api: &A,
    config: &Config,
    store: &mut Store,
    state_path: &Path,
    order_id: &str,
) -> Result<()> {
    let started = flow(api, config, store, state_path).pay(order_id).await?;
    print_started(&started);
    Ok(())
}

pub async fn resume<A: ShopApi>(
    api: &A,
    config: &Config,
    store: &mut Store,
    state_path: &Path,
    return_url: &str,
) -> Result<()> {
    let params = ReturnParams::parse(return_url)?;
    let order = flow(api, config, store, state_path).resume(&params).await?;

    output::print_message(&format!("Payment complete. Order {} is paid.", order.id));
    if !output::is_json_output() {
        println!();
        print_order(&order, config.currency());
    }
    Ok(())
}

pub async fn cancel<A: ShopApi>(
    api: &A,
    config: &Config,
    store: &mut Store,
    state_path: &Path,
    abandon: bool,
) -> Result<()> {
    let order_id = flow(api, config, store, state_path).cancel(abandon).await?;

    if abandon {
        output::print_message(&format!(
            "Stopped tracking order {order_id}. It stays unpaid on your account."
        ));
    } else {
        output::print_message(&format!(
            "Payment cancelled. Run 'shop checkout start' again to retry paying order {order_id}."
        ));
    }
    Ok(())
}

pub fn status(store: &Store) -> Result<()> {
    let checkout = store.payment.checkout();

    if output::is_json_output() {
        println!(
            "{}",
            json!({
                "checkout": checkout,
                "lastCompleted": store.payment.last_completed(),
                "status": store.payment.status.to_string(),
            })
        );
        return Ok(());
    }

    match checkout {
        Some(checkout) => {
            println!("Order:   {}", checkout.order_id.bold());
            println!("Stage:   {}", checkout.stage);
            println!("Started: {}", format_relative(&checkout.started_at.to_rfc3339()));
            match &checkout.stage {
                CheckoutStage::OrderPlaced => {
                    println!("\nRun 'shop checkout start' to pay, or 'shop checkout cancel --abandon'.");
                }
                CheckoutStage::AwaitingApproval { approval_url, .. } => {
                    println!("Approve: {}", approval_url.cyan());
                    println!("\nThen run 'shop checkout resume \"<return url>\"'.");
                }
                CheckoutStage::PaymentExecuted { .. } => {
                    println!("\nRun 'shop checkout resume \"<return url>\"' to finish up.");
                }
            }
            if store.payment.status.is_failed() {
                println!("Last error: {}", store.payment.status.to_string().red());
            }
        }
        None => {
            println!("No checkout in progress.");
            if let Some(done) = store.payment.last_completed() {
                println!(
                    "Last paid order: {} ({})",
                    done.order_id,
                    format_relative(&done.completed_at.to_rfc3339())
                );
            }
        }
    }
    Ok(())
}
