use colored::Colorize;
use tabled::Tabled;

use super::orders::{compact_line, print_order, OrderRow};
use crate::api::ShopApi;
use crate::cache::Cache;
use crate::cli::{ProductCreateArgs, ProductUpdateArgs};
use crate::config::Config;
use crate::error::{Result, ShopError};
use crate::output::{self, format_money};
use crate::store::Store;
use crate::types::{Order, OrderStatus, ProductInput, User};

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Admin")]
    admin: String,
    #[tabled(rename = "ID")]
    id: String,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            admin: if user.is_admin { "yes".yellow().to_string() } else { String::new() },
            id: user.id.clone(),
        }
    }
}

pub async fn create_product<A: ShopApi>(
    api: &A,
    config: &Config,
    store: &Store,
    cache: &mut Cache,
    args: ProductCreateArgs,
) -> Result<()> {
    store.auth.require_admin()?;

    let input = ProductInput {
        name: Some(args.name),
        brand: args.brand,
        category: args.category,
        description: args.description,
        image: args.image,
        price: Some(args.price),
        count_in_stock: Some(args.stock),
    };
    let product = api.create_product(&input).await?;
    cache.set_products([&product]);

    output::print_item(&product, |p| {
        println!(
            "Created {} ({}) at {}",
            p.name.bold(),
            p.id,
            format_money(p.price, config.currency())
        );
    });
    Ok(())
}

pub async fn update_product<A: ShopApi>(
    api: &A,
    store: &Store,
    cache: &mut Cache,
    args: ProductUpdateArgs,
) -> Result<()> {
    store.auth.require_admin()?;

    let input = ProductInput {
        name: args.name,
        brand: args.brand,
        category: args.category,
        description: args.description,
        image: args.image,
        price: args.price,
        count_in_stock: args.stock,
    };
    if input.is_empty() {
        return Err(ShopError::NothingToUpdate);
    }

    let product = api.update_product(&args.id, &input).await?;
    cache.set_products([&product]);
    output::print_message(&format!("Updated {} ({})", product.name, product.id));
    Ok(())
}

pub async fn delete_product<A: ShopApi>(api: &A, store: &Store, cache: &mut Cache, id: &str) -> Result<()> {
    store.auth.require_admin()?;
    api.delete_product(id).await?;
    cache.invalidate(id);
    output::print_message(&format!("Deleted product {id}"));
    Ok(())
}

/// Paid orders still waiting to ship, oldest first.
fn undelivered(mut orders: Vec<Order>) -> Vec<Order> {
    orders.retain(|o| o.status() == OrderStatus::Paid);
    orders.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    orders
}

pub async fn orders<A: ShopApi>(api: &A, config: &Config, store: &Store, only_undelivered: bool) -> Result<()> {
    store.auth.require_admin()?;

    let mut orders = api.all_orders().await?;
    if only_undelivered {
        orders = undelivered(orders);
    } else {
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }

    let currency = config.currency();
    output::print_table(&orders, |o| OrderRow::new(o, currency), |o| compact_line(o, currency));
    Ok(())
}

pub async fn deliver<A: ShopApi>(api: &A, config: &Config, store: &mut Store, order_id: &str) -> Result<()> {
    store.auth.require_admin()?;

    let order = api.mark_delivered(order_id).await?;
    // Keep the local copy current when the admin also placed the order.
    if store.orders.get(order_id).is_some() {
        store.orders.upsert(order.clone());
    }

    output::print_message(&format!("Order {order_id} marked as delivered"));
    if !output::is_json_output() {
        print_order(&order, config.currency());
    }
    Ok(())
}

pub async fn users<A: ShopApi>(api: &A, store: &Store) -> Result<()> {
    store.auth.require_admin()?;
    let users = api.users().await?;
    output::print_table(&users, |u| UserRow::from(u), |u| format!("{}  {}  {}", u.id, u.email, u.name));
    Ok(())
}

pub async fn delete_user<A: ShopApi>(api: &A, store: &Store, id: &str) -> Result<()> {
    let me = store.auth.require_admin()?;
    if me.id == id {
        return Err(ShopError::CannotDeleteSelf);
    }

    api.delete_user(id).await?;
    output::print_message(&format!("Deleted user {id}"));
    Ok(())
}

pub async fn promote<A: ShopApi>(api: &A, store: &Store, id: &str, revoke: bool) -> Result<()> {
    store.auth.require_admin()?;
    let user = api.set_admin(id, !revoke).await?;

    if user.is_admin {
        output::print_message(&format!("{} is now an admin", user.email));
    } else {
        output::print_message(&format!("{} is no longer an admin", user.email));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{dec, sample_order, sample_session, FakeApi};

    fn admin_store() -> Store {
        let mut store = Store::default();
        store.auth.set_session(sample_session(true));
        store
    }

    #[test]
    fn test_undelivered_filters_and_sorts() {
        let mut newer = sample_order("o2", true);
        newer.created_at = "2026-03-05T10:00:00Z".to_string();
        let older = sample_order("o1", true);
        let unpaid = sample_order("o3", false);
        let mut shipped = sample_order("o4", true);
        shipped.is_delivered = true;

        let ids: Vec<String> = undelivered(vec![newer, unpaid, shipped, older])
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, ["o1", "o2"]);
    }

    #[tokio::test]
    async fn test_admin_commands_require_admin() {
        let api = FakeApi::new();
        let mut store = Store::default();
        store.auth.set_session(sample_session(false));

        assert!(matches!(users(&api, &store).await, Err(ShopError::NotAdmin)));
        assert!(matches!(
            deliver(&api, &Config::default(), &mut store, "o1").await,
            Err(ShopError::NotAdmin)
        ));
        assert_eq!(api.calls("users"), 0);
        assert_eq!(api.calls("mark_delivered"), 0);
    }

    #[tokio::test]
    async fn test_create_product_fills_cache() {
        let api = FakeApi::new();
        let store = admin_store();
        let mut cache = Cache::default();
        let args = ProductCreateArgs {
            name: "Phone".to_string(),
            price: dec("499.99"),
            stock: 10,
            brand: None,
            category: None,
            description: None,
            image: None,
        };

        create_product(&api, &Config::default(), &store, &mut cache, args)
            .await
            .unwrap();

        let created = cache.get_product("p-1").unwrap();
        assert_eq!(created.name, "Phone");
        assert_eq!(created.price, dec("499.99"));
        assert_eq!(created.count_in_stock, 10);
    }

    #[tokio::test]
    async fn test_update_product_needs_a_field() {
        let api = FakeApi::new();
        let store = admin_store();
        let args = ProductUpdateArgs {
            id: "p1".to_string(),
            name: None,
            price: None,
            stock: None,
            brand: None,
            category: None,
            description: None,
            image: None,
        };

        let result = update_product(&api, &store, &mut Cache::default(), args).await;
        assert!(matches!(result, Err(ShopError::NothingToUpdate)));
        assert_eq!(api.calls("update_product"), 0);
    }

    #[tokio::test]
    async fn test_deliver_updates_cached_order() {
        let api = FakeApi::new();
        api.add_order(sample_order("o1", true));
        let mut store = admin_store();
        store.orders.upsert(sample_order("o1", true));

        deliver(&api, &Config::default(), &mut store, "o1").await.unwrap();

        assert!(store.orders.get("o1").is_some_and(|o| o.is_delivered));
    }

    #[tokio::test]
    async fn test_cannot_delete_self() {
        let api = FakeApi::new();
        let store = admin_store();
        assert!(matches!(
            delete_user(&api, &store, "u1").await,
            Err(ShopError::CannotDeleteSelf)
        ));
        assert_eq!(api.calls("delete_user"), 0);
    }
}
