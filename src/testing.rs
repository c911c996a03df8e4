//! In-memory backend and fixtures for unit tests.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;

use rust_decimal::Decimal;

use crate::api::{ProductQuery, ProfileUpdate, ShopApi};
use crate::error::{Result, ShopError};
use crate::types::{
    AuthSession, Cart, CartItem, CartTotals, Order, OrderItem, Payment, PaymentMethod,
    PaymentStatus, Product, ProductInput, ProductPage, Review, ShippingAddress, User, Voucher,
};

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("shop-test-{}-{name}.json", std::process::id()))
}

pub fn sample_user(is_admin: bool) -> User {
    User {
        id: "u1".to_string(),
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        is_admin,
    }
}

pub fn sample_session(is_admin: bool) -> AuthSession {
    AuthSession {
        token: "token-u1".to_string(),
        user: sample_user(is_admin),
    }
}

pub fn sample_product(id: &str, count_in_stock: u32) -> Product {
    Product {
        id: id.to_string(),
        name: format!("Product {id}"),
        brand: "Acme".to_string(),
        category: "Gadgets".to_string(),
        description: String::new(),
        image: None,
        price: dec("10.00"),
        count_in_stock,
        rating: 4.5,
        num_reviews: 2,
    }
}

pub fn sample_item(id: &str, product_id: &str, quantity: u32) -> CartItem {
    CartItem {
        id: id.to_string(),
        product_id: product_id.to_string(),
        name: format!("Product {product_id}"),
        image: None,
        price: dec("10.00"),
        quantity,
        count_in_stock: 10,
    }
}

pub fn sample_address() -> ShippingAddress {
    ShippingAddress {
        address: "1 Main St".to_string(),
        city: "Springfield".to_string(),
        postal_code: "12345".to_string(),
        country: "US".to_string(),
    }
}

pub fn sample_order(id: &str, is_paid: bool) -> Order {
    Order {
        id: id.to_string(),
        user: None,
        order_items: vec![OrderItem {
            product_id: "p1".to_string(),
            name: "Product p1".to_string(),
            quantity: 1,
            price: dec("10.00"),
        }],
        shipping_address: sample_address(),
        payment_method: "PayPal".to_string(),
        items_price: dec("10.00"),
        discount: Decimal::ZERO,
        shipping_price: Decimal::ZERO,
        tax_price: Decimal::ZERO,
        total_price: dec("10.00"),
        voucher: None,
        is_paid,
        paid_at: is_paid.then(|| "2026-03-01T12:00:00Z".to_string()),
        is_delivered: false,
        delivered_at: None,
        created_at: "2026-03-01T10:00:00Z".to_string(),
    }
}

fn simulated_failure(op: &str) -> ShopError {
    ShopError::ApiError {
        status: 500,
        message: format!("simulated {op} failure"),
    }
}

#[derive(Default)]
struct Backend {
    cart: Vec<CartItem>,
    voucher: Option<Voucher>,
    orders: HashMap<String, Order>,
    payments: HashMap<String, Payment>,
    profile: Option<User>,
    next_id: u32,
    failures: HashSet<String>,
    calls: HashMap<String, u32>,
    execute_status: Option<PaymentStatus>,
}

impl Backend {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn cart(&self) -> Cart {
        let items_price: Decimal = self
            .cart
            .iter()
            .map(|i| i.price * Decimal::from(i.quantity))
            .sum();
        let discount = self
            .voucher
            .as_ref()
            .and_then(|v| v.discount_percent)
            .map_or(Decimal::ZERO, |pct| items_price * pct / Decimal::from(100));

        Cart {
            items: self.cart.clone(),
            voucher: self.voucher.clone(),
            totals: CartTotals {
                items_price,
                discount,
                shipping_price: Decimal::ZERO,
                tax_price: Decimal::ZERO,
                total_price: items_price - discount,
            },
        }
    }
}

/// Scriptable stand-in for the REST backend.
pub struct FakeApi {
    backend: Mutex<Backend>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            backend: Mutex::new(Backend {
                profile: Some(sample_user(false)),
                ..Default::default()
            }),
        }
    }

    /// Make the next call of `op` fail with a server error.
    pub fn fail_next(&self, op: &str) {
        self.backend.lock().unwrap().failures.insert(op.to_string());
    }

    pub fn calls(&self, op: &str) -> u32 {
        self.backend
            .lock()
            .unwrap()
            .calls
            .get(op)
            .copied()
            .unwrap_or(0)
    }

    pub fn add_to_server_cart(&self, item: CartItem) {
        self.backend.lock().unwrap().cart.push(item);
    }

    pub fn server_cart_is_empty(&self) -> bool {
        self.backend.lock().unwrap().cart.is_empty()
    }

    pub fn add_order(&self, order: Order) {
        self.backend
            .lock()
            .unwrap()
            .orders
            .insert(order.id.clone(), order);
    }

    pub fn set_execute_status(&self, status: PaymentStatus) {
        self.backend.lock().unwrap().execute_status = Some(status);
    }

    /// Record the call and run `f` unless a failure was scripted for `op`.
    fn call<T>(&self, op: &str, f: impl FnOnce(&mut Backend) -> Result<T>) -> Result<T> {
        let mut backend = self.backend.lock().unwrap();
        *backend.calls.entry(op.to_string()).or_default() += 1;
        if backend.failures.remove(op) {
            return Err(simulated_failure(op));
        }
        f(&mut *backend)
    }
}

impl ShopApi for FakeApi {
    async fn login(&self, email: &str, _password: &str) -> Result<AuthSession> {
        self.call("login", |_| {
            if email == "ada@example.com" {
                return Ok(sample_session(false));
            }
            let local = email.split('@').next().unwrap_or(email);
            Ok(AuthSession {
                token: format!("token-u-{local}"),
                user: User {
                    id: format!("u-{local}"),
                    name: local.to_string(),
                    email: email.to_string(),
                    is_admin: false,
                },
            })
        })
    }

    async fn register(&self, name: &str, email: &str, _password: &str) -> Result<AuthSession> {
        self.call("register", |b| {
            let id = b.next_id("u");
            Ok(AuthSession {
                token: format!("token-{id}"),
                user: User {
                    id,
                    name: name.to_string(),
                    email: email.to_string(),
                    is_admin: false,
                },
            })
        })
    }

    async fn profile(&self) -> Result<User> {
        self.call("profile", |b| b.profile.clone().ok_or(ShopError::Unauthorized("no session".into())))
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<User> {
        self.call("update_profile", |b| {
            let profile = b
                .profile
                .as_mut()
                .ok_or(ShopError::Unauthorized("no session".into()))?;
            if let Some(name) = &update.name {
                profile.name = name.clone();
            }
            if let Some(email) = &update.email {
                profile.email = email.clone();
            }
            Ok(profile.clone())
        })
    }

    async fn products(&self, query: &ProductQuery) -> Result<ProductPage> {
        self.call("products", |_| {
            Ok(ProductPage {
                products: vec![sample_product("p1", 5), sample_product("p2", 0)],
                page: query.page.unwrap_or(1),
                pages: 1,
            })
        })
    }

    async fn top_products(&self) -> Result<Vec<Product>> {
        self.call("top_products", |_| Ok(vec![sample_product("p1", 5)]))
    }

    async fn product(&self, id: &str) -> Result<Product> {
        self.call("product", |_| Ok(sample_product(id, 5)))
    }

    async fn reviews(&self, _product_id: &str) -> Result<Vec<Review>> {
        self.call("reviews", |_| Ok(Vec::new()))
    }

    async fn add_review(&self, _product_id: &str, _rating: u8, _comment: &str) -> Result<()> {
        self.call("add_review", |_| Ok(()))
    }

    async fn cart(&self) -> Result<Cart> {
        self.call("cart", |b| Ok(b.cart()))
    }

    async fn add_cart_item(&self, product_id: &str, quantity: u32) -> Result<CartItem> {
        self.call("add_cart_item", |b| {
            if let Some(line) = b.cart.iter_mut().find(|i| i.product_id == product_id) {
                line.quantity += quantity;
                return Ok(line.clone());
            }
            let mut line = sample_item(&b.next_id("item"), product_id, quantity);
            line.count_in_stock = 5;
            b.cart.push(line.clone());
            Ok(line)
        })
    }

    async fn update_cart_item(&self, item_id: &str, quantity: u32) -> Result<CartItem> {
        self.call("update_cart_item", |b| {
            let line = b
                .cart
                .iter_mut()
                .find(|i| i.id == item_id)
                .ok_or_else(|| ShopError::NotFound(item_id.to_string()))?;
            line.quantity = quantity;
            Ok(line.clone())
        })
    }

    async fn remove_cart_item(&self, item_id: &str) -> Result<()> {
        self.call("remove_cart_item", |b| {
            b.cart.retain(|i| i.id != item_id);
            Ok(())
        })
    }

    async fn clear_cart(&self) -> Result<()> {
        self.call("clear_cart", |b| {
            b.cart.clear();
            b.voucher = None;
            Ok(())
        })
    }

    async fn apply_voucher(&self, code: &str) -> Result<Cart> {
        self.call("apply_voucher", |b| {
            if code != "SAVE10" {
                return Err(ShopError::ApiError {
                    status: 400,
                    message: "Invalid voucher".to_string(),
                });
            }
            b.voucher = Some(Voucher {
                code: code.to_string(),
                description: Some("10% off".to_string()),
                discount_percent: Some(Decimal::from(10)),
                discount_amount: None,
            });
            Ok(b.cart())
        })
    }

    async fn remove_voucher(&self) -> Result<Cart> {
        self.call("remove_voucher", |b| {
            b.voucher = None;
            Ok(b.cart())
        })
    }

    async fn create_order(
        &self,
        shipping: &ShippingAddress,
        method: PaymentMethod,
    ) -> Result<Order> {
        self.call("create_order", |b| {
            let cart = b.cart();
            let id = b.next_id("order");
            let order = Order {
                id: id.clone(),
                user: None,
                order_items: cart
                    .items
                    .iter()
                    .map(|i| OrderItem {
                        product_id: i.product_id.clone(),
                        name: i.name.clone(),
                        quantity: i.quantity,
                        price: i.price,
                    })
                    .collect(),
                shipping_address: shipping.clone(),
                payment_method: method.to_string(),
                items_price: cart.totals.items_price,
                discount: cart.totals.discount,
                shipping_price: cart.totals.shipping_price,
                tax_price: cart.totals.tax_price,
                total_price: cart.totals.total_price,
                voucher: cart.voucher,
                is_paid: false,
                paid_at: None,
                is_delivered: false,
                delivered_at: None,
                created_at: "2026-03-01T10:00:00Z".to_string(),
            };
            b.orders.insert(id, order.clone());
            Ok(order)
        })
    }

    async fn my_orders(&self) -> Result<Vec<Order>> {
        self.call("my_orders", |b| Ok(b.orders.values().cloned().collect()))
    }

    async fn order(&self, id: &str) -> Result<Order> {
        self.call("order", |b| {
            b.orders
                .get(id)
                .cloned()
                .ok_or_else(|| ShopError::NotFound(format!("order {id}")))
        })
    }

    async fn create_payment(
        &self,
        order_id: &str,
        _return_url: &str,
        _cancel_url: &str,
    ) -> Result<Payment> {
        self.call("create_payment", |b| {
            let id = b.next_id("pay");
            let payment = Payment {
                id: id.clone(),
                order_id: order_id.to_string(),
                approval_url: Some(format!("https://paypal.example/approve?token=EC-{id}")),
                status: PaymentStatus::Created,
            };
            b.payments.insert(id, payment.clone());
            Ok(payment)
        })
    }

    async fn execute_payment(&self, payment_id: &str, _payer_id: &str) -> Result<Payment> {
        self.call("execute_payment", |b| {
            let status = b.execute_status.unwrap_or(PaymentStatus::Completed);
            let payment = b
                .payments
                .get_mut(payment_id)
                .ok_or_else(|| ShopError::NotFound(format!("payment {payment_id}")))?;
            payment.status = status;
            let payment = payment.clone();

            if status == PaymentStatus::Completed {
                if let Some(order) = b.orders.get_mut(&payment.order_id) {
                    order.is_paid = true;
                    order.paid_at = Some("2026-03-01T10:05:00Z".to_string());
                }
            }
            Ok(payment)
        })
    }

    async fn cancel_payment(&self, payment_id: &str) -> Result<()> {
        self.call("cancel_payment", |b| {
            if let Some(payment) = b.payments.get_mut(payment_id) {
                payment.status = PaymentStatus::Cancelled;
            }
            Ok(())
        })
    }

    async fn create_product(&self, input: &ProductInput) -> Result<Product> {
        self.call("create_product", |b| {
            let mut product = sample_product(&b.next_id("p"), input.count_in_stock.unwrap_or(0));
            if let Some(name) = &input.name {
                product.name = name.clone();
            }
            if let Some(price) = input.price {
                product.price = price;
            }
            Ok(product)
        })
    }

    async fn update_product(&self, id: &str, input: &ProductInput) -> Result<Product> {
        self.call("update_product", |_| {
            let mut product = sample_product(id, input.count_in_stock.unwrap_or(5));
            if let Some(name) = &input.name {
                product.name = name.clone();
            }
            Ok(product)
        })
    }

    async fn delete_product(&self, _id: &str) -> Result<()> {
        self.call("delete_product", |_| Ok(()))
    }

    async fn all_orders(&self) -> Result<Vec<Order>> {
        self.call("all_orders", |b| Ok(b.orders.values().cloned().collect()))
    }

    async fn mark_delivered(&self, order_id: &str) -> Result<Order> {
        self.call("mark_delivered", |b| {
            let order = b
                .orders
                .get_mut(order_id)
                .ok_or_else(|| ShopError::NotFound(format!("order {order_id}")))?;
            order.is_delivered = true;
            order.delivered_at = Some("2026-03-02T09:00:00Z".to_string());
            Ok(order.clone())
        })
    }

    async fn users(&self) -> Result<Vec<User>> {
        self.call("users", |_| Ok(vec![sample_user(true)]))
    }

    async fn set_admin(&self, user_id: &str, is_admin: bool) -> Result<User> {
        self.call("set_admin", |_| {
            let mut user = sample_user(is_admin);
            user.id = user_id.to_string();
            Ok(user)
        })
    }

    async fn delete_user(&self, _user_id: &str) -> Result<()> {
        self.call("delete_user", |_| Ok(()))
    }
}
