//! Cart slice: local copy of the server cart with optimistic line edits.
//!
//! Line edits are applied to the local items before the request is sent and
//! either confirmed with the server's record or rolled back to the snapshot
//! taken before the edit. Totals are only ever taken from the server; while a
//! local edit is unconfirmed the slice is marked stale and callers fall back
//! to [`CartSlice::estimated_subtotal`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::ShopApi;
use crate::error::{Result, ShopError};
use crate::types::{Cart, CartItem, CartTotals, Product, Voucher};

use super::RequestStatus;

const PENDING_PREFIX: &str = "pending:";

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct CartSlice {
    pub items: Vec<CartItem>,
    pub voucher: Option<Voucher>,
    pub totals: Option<CartTotals>,
    /// Set when local items diverge from the last server response.
    #[serde(default)]
    pub stale: bool,
    #[serde(default)]
    pub status: RequestStatus,
}

/// State captured before an optimistic edit.
#[derive(Debug, Clone)]
pub struct CartSnapshot {
    items: Vec<CartItem>,
    voucher: Option<Voucher>,
    totals: Option<CartTotals>,
    stale: bool,
}

fn placeholder_id(product_id: &str) -> String {
    format!("{PENDING_PREFIX}{product_id}")
}

pub fn is_placeholder(item: &CartItem) -> bool {
    item.id.starts_with(PENDING_PREFIX)
}

fn check_quantity(requested: u32, max: u32) -> Result<()> {
    if requested == 0 || requested > max {
        return Err(ShopError::QuantityOutOfRange { requested, max });
    }
    Ok(())
}

impl CartSlice {
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            items: self.items.clone(),
            voucher: self.voucher.clone(),
            totals: self.totals,
            stale: self.stale,
        }
    }

    pub fn rollback(&mut self, snapshot: CartSnapshot) {
        self.items = snapshot.items;
        self.voucher = snapshot.voucher;
        self.totals = snapshot.totals;
        self.stale = snapshot.stale;
    }

    /// Authoritative sync with the server cart.
    pub fn replace(&mut self, cart: Cart) {
        self.items = cart.items;
        self.voucher = cart.voucher;
        self.totals = Some(cart.totals);
        self.stale = false;
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.voucher = None;
        self.totals = None;
        self.stale = false;
    }

    pub fn find(&self, item_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    pub fn find_product(&self, product_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn estimated_subtotal(&self) -> Decimal {
        self.items
            .iter()
            .map(|i| i.price * Decimal::from(i.quantity))
            .sum()
    }

    /// Add `quantity` of a product, merging with an existing line.
    pub fn optimistic_add(&mut self, product: &Product, quantity: u32) -> Result<CartSnapshot> {
        let current = self.find_product(&product.id).map_or(0, |i| i.quantity);
        if !product.in_stock() {
            return Err(ShopError::QuantityOutOfRange {
                requested: quantity,
                max: 0,
            });
        }
        let requested = current.checked_add(quantity).ok_or(ShopError::QuantityOutOfRange {
            requested: u32::MAX,
            max: product.count_in_stock,
        })?;
        check_quantity(requested, product.count_in_stock)?;

        let snapshot = self.snapshot();
        match self.items.iter_mut().find(|i| i.product_id == product.id) {
            Some(line) => {
                line.quantity += quantity;
                line.price = product.price;
                line.count_in_stock = product.count_in_stock;
            }
            None => self.items.push(CartItem {
                id: placeholder_id(&product.id),
                product_id: product.id.clone(),
                name: product.name.clone(),
                image: product.image.clone(),
                price: product.price,
                quantity,
                count_in_stock: product.count_in_stock,
            }),
        }
        self.stale = true;
        Ok(snapshot)
    }

    pub fn optimistic_set_quantity(&mut self, item_id: &str, quantity: u32) -> Result<CartSnapshot> {
        let line = self
            .find(item_id)
            .ok_or_else(|| ShopError::CartItemNotFound(item_id.to_string()))?;
        check_quantity(quantity, line.count_in_stock)?;

        let snapshot = self.snapshot();
        if let Some(line) = self.items.iter_mut().find(|i| i.id == item_id) {
            line.quantity = quantity;
        }
        self.stale = true;
        Ok(snapshot)
    }

    pub fn optimistic_remove(&mut self, item_id: &str) -> Result<CartSnapshot> {
        if self.find(item_id).is_none() {
            return Err(ShopError::CartItemNotFound(item_id.to_string()));
        }

        let snapshot = self.snapshot();
        self.items.retain(|i| i.id != item_id);
        self.stale = true;
        Ok(snapshot)
    }

    /// Replace the local line for the same product with the server's record.
    pub fn confirm_line(&mut self, confirmed: CartItem) {
        match self
            .items
            .iter_mut()
            .find(|i| i.product_id == confirmed.product_id)
        {
            Some(line) => *line = confirmed,
            None => self.items.push(confirmed),
        }
    }
}

/// Load the cart from the server, discarding unconfirmed local edits.
pub async fn fetch<A: ShopApi>(api: &A, cart: &mut CartSlice) -> Result<()> {
    cart.status = RequestStatus::Loading;
    let server_cart = cart.status.settle(api.cart().await)?;
    cart.replace(server_cart);
    Ok(())
}

pub async fn add_item<A: ShopApi>(
    api: &A,
    cart: &mut CartSlice,
    product: &Product,
    quantity: u32,
) -> Result<CartItem> {
    let snapshot = cart.optimistic_add(product, quantity)?;
    cart.status = RequestStatus::Loading;

    match cart.status.settle(api.add_cart_item(&product.id, quantity).await) {
        Ok(line) => {
            debug!(item = %line.id, product = %line.product_id, "cart line confirmed");
            cart.confirm_line(line.clone());
            Ok(line)
        }
        Err(e) => {
            cart.rollback(snapshot);
            Err(e)
        }
    }
}

pub async fn set_quantity<A: ShopApi>(
    api: &A,
    cart: &mut CartSlice,
    item_id: &str,
    quantity: u32,
) -> Result<CartItem> {
    let snapshot = cart.optimistic_set_quantity(item_id, quantity)?;
    cart.status = RequestStatus::Loading;

    match cart.status.settle(api.update_cart_item(item_id, quantity).await) {
        Ok(line) => {
            cart.confirm_line(line.clone());
            Ok(line)
        }
        Err(e) => {
            cart.rollback(snapshot);
            Err(e)
        }
    }
}

pub async fn remove_item<A: ShopApi>(api: &A, cart: &mut CartSlice, item_id: &str) -> Result<CartItem> {
    let removed = cart
        .find(item_id)
        .cloned()
        .ok_or_else(|| ShopError::CartItemNotFound(item_id.to_string()))?;
    let snapshot = cart.optimistic_remove(item_id)?;
    cart.status = RequestStatus::Loading;

    match cart.status.settle(api.remove_cart_item(item_id).await) {
        Ok(()) => Ok(removed),
        Err(e) => {
            cart.rollback(snapshot);
            Err(e)
        }
    }
}

/// Empty the cart on the server. Used by the user and after a completed checkout.
pub async fn clear<A: ShopApi>(api: &A, cart: &mut CartSlice) -> Result<()> {
    cart.status = RequestStatus::Loading;
    cart.status.settle(api.clear_cart().await)?;
    cart.clear();
    Ok(())
}

/// Apply a voucher. The discount is computed by the server, so this is not optimistic.
pub async fn apply_voucher<A: ShopApi>(api: &A, cart: &mut CartSlice, code: &str) -> Result<()> {
    let code = code.trim();
    cart.status = RequestStatus::Loading;
    let server_cart = cart.status.settle(api.apply_voucher(code).await)?;
    if server_cart.voucher.is_none() {
        warn!(code, "voucher accepted but not reflected in cart");
    }
    cart.replace(server_cart);
    Ok(())
}

pub async fn remove_voucher<A: ShopApi>(api: &A, cart: &mut CartSlice) -> Result<()> {
    cart.status = RequestStatus::Loading;
    let server_cart = cart.status.settle(api.remove_voucher().await)?;
    cart.replace(server_cart);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{dec, sample_item, sample_product, FakeApi};

    #[test]
    fn test_optimistic_add_inserts_placeholder() {
        let mut cart = CartSlice::default();
        let product = sample_product("p1", 5);

        cart.optimistic_add(&product, 2).unwrap();

        assert_eq!(cart.items.len(), 1);
        assert!(is_placeholder(&cart.items[0]));
        assert_eq!(cart.items[0].quantity, 2);
        assert!(cart.stale);
    }

    #[test]
    fn test_optimistic_add_merges_existing_line() {
        let mut cart = CartSlice::default();
        cart.items.push(sample_item("item-1", "p1", 1));

        cart.optimistic_add(&sample_product("p1", 5), 2).unwrap();

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].id, "item-1");
        assert_eq!(cart.items[0].quantity, 3);
    }

    #[test]
    fn test_optimistic_add_respects_stock() {
        let mut cart = CartSlice::default();
        cart.items.push(sample_item("item-1", "p1", 4));

        let err = cart.optimistic_add(&sample_product("p1", 5), 2).unwrap_err();
        assert!(matches!(
            err,
            ShopError::QuantityOutOfRange { requested: 6, max: 5 }
        ));
        assert_eq!(cart.items[0].quantity, 4);
        assert!(!cart.stale);

        assert!(cart.optimistic_add(&sample_product("p2", 0), 1).is_err());
        assert!(cart.optimistic_add(&sample_product("p3", 3), 0).is_err());
    }

    #[test]
    fn test_optimistic_add_overflowing_quantity() {
        let mut cart = CartSlice::default();
        cart.items.push(sample_item("item-1", "p1", 1));

        let err = cart
            .optimistic_add(&sample_product("p1", 5), u32::MAX)
            .unwrap_err();
        assert!(matches!(
            err,
            ShopError::QuantityOutOfRange { requested: u32::MAX, max: 5 }
        ));
        assert_eq!(cart.items[0].quantity, 1);
        assert!(!cart.stale);
    }

    #[test]
    fn test_set_quantity_rejects_zero() {
        let mut cart = CartSlice::default();
        cart.items.push(sample_item("item-1", "p1", 1));
        assert!(cart.optimistic_set_quantity("item-1", 0).is_err());
        assert!(matches!(
            cart.optimistic_set_quantity("nope", 1),
            Err(ShopError::CartItemNotFound(_))
        ));
    }

    #[test]
    fn test_rollback_restores_snapshot() {
        let mut cart = CartSlice::default();
        cart.items.push(sample_item("item-1", "p1", 1));
        cart.totals = Some(CartTotals {
            items_price: dec("10.00"),
            total_price: dec("10.00"),
            ..Default::default()
        });

        let snapshot = cart.optimistic_remove("item-1").unwrap();
        assert!(cart.items.is_empty());

        cart.rollback(snapshot);
        assert_eq!(cart.items.len(), 1);
        assert!(!cart.stale);
        assert_eq!(cart.totals.unwrap().total_price, dec("10.00"));
    }

    #[test]
    fn test_estimated_subtotal_and_count() {
        let mut cart = CartSlice::default();
        cart.items.push(sample_item("item-1", "p1", 2));
        cart.items.push(sample_item("item-2", "p2", 1));
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.estimated_subtotal(), dec("30.00"));
    }

    #[tokio::test]
    async fn test_add_item_replaces_placeholder_with_server_line() {
        let api = FakeApi::new();
        let mut cart = CartSlice::default();

        let line = add_item(&api, &mut cart, &sample_product("p1", 5), 2)
            .await
            .unwrap();

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0], line);
        assert!(!is_placeholder(&cart.items[0]));
        assert_eq!(cart.status, RequestStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_add_item_rolls_back_on_failure() {
        let api = FakeApi::new();
        api.fail_next("add_cart_item");
        let mut cart = CartSlice::default();
        cart.items.push(sample_item("item-1", "p1", 1));

        let result = add_item(&api, &mut cart, &sample_product("p2", 5), 1).await;

        assert!(result.is_err());
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].id, "item-1");
        assert!(cart.status.is_failed());
    }

    #[tokio::test]
    async fn test_remove_item_rolls_back_on_failure() {
        let api = FakeApi::new();
        api.fail_next("remove_cart_item");
        let mut cart = CartSlice::default();
        cart.items.push(sample_item("item-1", "p1", 1));

        assert!(remove_item(&api, &mut cart, "item-1").await.is_err());
        assert_eq!(cart.items.len(), 1);
    }

    #[tokio::test]
    async fn test_set_quantity_rolls_back_on_failure() {
        let api = FakeApi::new();
        api.fail_next("update_cart_item");
        let mut cart = CartSlice::default();
        cart.items.push(sample_item("item-1", "p1", 1));
        cart.totals = Some(CartTotals {
            items_price: dec("10.00"),
            total_price: dec("10.00"),
            ..Default::default()
        });

        assert!(set_quantity(&api, &mut cart, "item-1", 3).await.is_err());

        assert_eq!(cart.items[0].quantity, 1);
        assert!(!cart.stale);
        assert_eq!(cart.totals.unwrap().total_price, dec("10.00"));
        assert!(cart.status.is_failed());
    }

    #[tokio::test]
    async fn test_fetch_discards_unconfirmed_edits() {
        let api = FakeApi::new();
        api.add_to_server_cart(sample_item("item-9", "p9", 1));
        let mut cart = CartSlice::default();
        cart.optimistic_add(&sample_product("p1", 5), 1).unwrap();

        fetch(&api, &mut cart).await.unwrap();

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].id, "item-9");
        assert!(!cart.stale);
        assert!(cart.totals.is_some());
    }

    #[tokio::test]
    async fn test_apply_voucher_takes_server_totals() {
        let api = FakeApi::new();
        api.add_to_server_cart(sample_item("item-1", "p1", 2));
        let mut cart = CartSlice::default();

        apply_voucher(&api, &mut cart, " SAVE10 ").await.unwrap();

        assert_eq!(cart.voucher.as_ref().map(|v| v.code.as_str()), Some("SAVE10"));
        let totals = cart.totals.unwrap();
        assert_eq!(totals.items_price, dec("20.00"));
        assert_eq!(totals.discount, dec("2.00"));
        assert_eq!(totals.total_price, dec("18.00"));

        remove_voucher(&api, &mut cart).await.unwrap();
        assert!(cart.voucher.is_none());
        assert_eq!(cart.totals.unwrap().total_price, dec("20.00"));
    }

    #[tokio::test]
    async fn test_rejected_voucher_keeps_cart() {
        let api = FakeApi::new();
        api.add_to_server_cart(sample_item("item-1", "p1", 2));
        let mut cart = CartSlice::default();
        fetch(&api, &mut cart).await.unwrap();

        assert!(apply_voucher(&api, &mut cart, "BOGUS").await.is_err());
        assert!(cart.voucher.is_none());
        assert_eq!(cart.items.len(), 1);
    }
}
