use colored::Colorize;
use tabled::Tabled;

use crate::api::{ProductQuery, ShopApi};
use crate::cache::Cache;
use crate::cli::ProductListArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::{self, format_money, stars, stock_colored, truncate};
use crate::types::Product;

#[derive(Tabled)]
struct ProductRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Stock")]
    stock: String,
    #[tabled(rename = "Rating")]
    rating: String,
    #[tabled(rename = "ID")]
    id: String,
}

impl ProductRow {
    fn new(product: &Product, currency: &str) -> Self {
        Self {
            name: truncate(&product.name, 40),
            price: format_money(product.price, currency),
            stock: stock_colored(product.count_in_stock),
            rating: format!("{} ({})", stars(product.rating), product.num_reviews),
            id: product.id.clone(),
        }
    }
}

fn compact_line(product: &Product, currency: &str) -> String {
    format!(
        "{}  {}  {}",
        product.id,
        format_money(product.price, currency),
        product.name
    )
}

pub async fn list<A: ShopApi>(
    api: &A,
    config: &Config,
    cache: &mut Cache,
    args: ProductListArgs,
) -> Result<()> {
    let currency = config.currency();

    if args.top {
        let products = api.top_products().await?;
        cache.set_products(&products);
        output::print_table(
            &products,
            |p| ProductRow::new(p, currency),
            |p| compact_line(p, currency),
        );
        return Ok(());
    }

    let query = ProductQuery {
        keyword: args.search,
        category: args.category,
        page: Some(args.page),
        page_size: Some(config.page_size()),
    };
    let page = api.products(&query).await?;
    cache.set_products(&page.products);

    if page.products.is_empty() && !output::is_json_output() {
        output::print_message("No products found.");
        return Ok(());
    }

    output::print_table(
        &page.products,
        |p| ProductRow::new(p, currency),
        |p| compact_line(p, currency),
    );
    if !output::is_json_output() && page.pages > 1 {
        println!("{}", format!("Page {} of {}", page.page, page.pages).dimmed());
    }

    Ok(())
}

pub async fn show<A: ShopApi>(api: &A, config: &Config, cache: &mut Cache, id: &str) -> Result<()> {
    let product = api.product(id).await?;
    cache.set_products([&product]);
    let currency = config.currency();

    output::print_item(&product, |p| {
        println!("{}", p.name.bold());
        println!("{}", "─".repeat(50));
        println!("Price:    {}", format_money(p.price, currency));
        println!("Stock:    {}", stock_colored(p.count_in_stock));
        println!("Rating:   {} ({} reviews)", stars(p.rating), p.num_reviews);
        if !p.brand.is_empty() {
            println!("Brand:    {}", p.brand);
        }
        if !p.category.is_empty() {
            println!("Category: {}", p.category);
        }
        println!("ID:       {}", p.id.dimmed());
        if !p.description.is_empty() {
            println!("\n{}", p.description);
        }
    });

    Ok(())
}
