//! Backend endpoints used by the store and the checkout workflow.
//!
//! `ShopApi` is implemented by [`ShopClient`] over HTTP; tests substitute an
//! in-memory backend.

use reqwest::Method;
use serde::Serialize;
use serde_json::json;

use crate::client::ShopClient;
use crate::error::Result;
use crate::types::{
    AuthSession, Cart, CartItem, Order, Payment, PaymentMethod, Product, ProductInput,
    ProductPage, Review, ShippingAddress, User,
};

/// Product listing filters.
#[derive(Serialize, Debug, Default, Clone)]
pub struct ProductQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(rename = "pageSize", skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

/// Profile fields; absent fields are left unchanged by the backend.
#[derive(Serialize, Debug, Default, Clone)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[allow(async_fn_in_trait)]
pub trait ShopApi {
    async fn login(&self, email: &str, password: &str) -> Result<AuthSession>;
    async fn register(&self, name: &str, email: &str, password: &str) -> Result<AuthSession>;
    async fn profile(&self) -> Result<User>;
    async fn update_profile(&self, update: &ProfileUpdate) -> Result<User>;

    async fn products(&self, query: &ProductQuery) -> Result<ProductPage>;
    async fn top_products(&self) -> Result<Vec<Product>>;
    async fn product(&self, id: &str) -> Result<Product>;
    async fn reviews(&self, product_id: &str) -> Result<Vec<Review>>;
    async fn add_review(&self, product_id: &str, rating: u8, comment: &str) -> Result<()>;

    async fn cart(&self) -> Result<Cart>;
    async fn add_cart_item(&self, product_id: &str, quantity: u32) -> Result<CartItem>;
    async fn update_cart_item(&self, item_id: &str, quantity: u32) -> Result<CartItem>;
    async fn remove_cart_item(&self, item_id: &str) -> Result<()>;
    async fn clear_cart(&self) -> Result<()>;
    async fn apply_voucher(&self, code: &str) -> Result<Cart>;
    async fn remove_voucher(&self) -> Result<Cart>;

    async fn create_order(
        &self,
        shipping: &ShippingAddress,
        method: PaymentMethod,
    ) -> Result<Order>;
    async fn my_orders(&self) -> Result<Vec<Order>>;
    async fn order(&self, id: &str) -> Result<Order>;

    async fn create_payment(
        &self,
        order_id: &str,
        return_url: &str,
        cancel_url: &str,
    ) -> Result<Payment>;
    async fn execute_payment(&self, payment_id: &str, payer_id: &str) -> Result<Payment>;
    async fn cancel_payment(&self, payment_id: &str) -> Result<()>;

    async fn create_product(&self, input: &ProductInput) -> Result<Product>;
    async fn update_product(&self, id: &str, input: &ProductInput) -> Result<Product>;
    async fn delete_product(&self, id: &str) -> Result<()>;
    async fn all_orders(&self) -> Result<Vec<Order>>;
    async fn mark_delivered(&self, order_id: &str) -> Result<Order>;
    async fn users(&self) -> Result<Vec<User>>;
    async fn set_admin(&self, user_id: &str, is_admin: bool) -> Result<User>;
    async fn delete_user(&self, user_id: &str) -> Result<()>;
}

impl ShopApi for ShopClient {
    async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        self.post(
            "/api/users/login",
            &json!({ "email": email, "password": password }),
        )
        .await
    }

    async fn register(&self, name: &str, email: &str, password: &str) -> Result<AuthSession> {
        self.post(
            "/api/users",
            &json!({ "name": name, "email": email, "password": password }),
        )
        .await
    }

    async fn profile(&self) -> Result<User> {
        self.get("/api/users/profile").await
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<User> {
        self.put("/api/users/profile", update).await
    }

    async fn products(&self, query: &ProductQuery) -> Result<ProductPage> {
        self.get_query("/api/products", query).await
    }

    async fn top_products(&self) -> Result<Vec<Product>> {
        self.get("/api/products/top").await
    }

    async fn product(&self, id: &str) -> Result<Product> {
        self.get(&format!("/api/products/{id}")).await
    }

    async fn reviews(&self, product_id: &str) -> Result<Vec<Review>> {
        self.get(&format!("/api/products/{product_id}/reviews"))
            .await
    }

    async fn add_review(&self, product_id: &str, rating: u8, comment: &str) -> Result<()> {
        self.send_empty(
            Method::POST,
            &format!("/api/products/{product_id}/reviews"),
            Some(&json!({ "rating": rating, "comment": comment })),
        )
        .await
    }

    async fn cart(&self) -> Result<Cart> {
        self.get("/api/cart").await
    }

    async fn add_cart_item(&self, product_id: &str, quantity: u32) -> Result<CartItem> {
        self.post(
            "/api/cart/items",
            &json!({ "productId": product_id, "quantity": quantity }),
        )
        .await
    }

    async fn update_cart_item(&self, item_id: &str, quantity: u32) -> Result<CartItem> {
        self.put(
            &format!("/api/cart/items/{item_id}"),
            &json!({ "quantity": quantity }),
        )
        .await
    }

    async fn remove_cart_item(&self, item_id: &str) -> Result<()> {
        self.send_empty(
            Method::DELETE,
            &format!("/api/cart/items/{item_id}"),
            None::<&()>,
        )
        .await
    }

    async fn clear_cart(&self) -> Result<()> {
        self.send_empty(Method::DELETE, "/api/cart", None::<&()>)
            .await
    }

    async fn apply_voucher(&self, code: &str) -> Result<Cart> {
        self.post("/api/cart/voucher", &json!({ "code": code }))
            .await
    }

    async fn remove_voucher(&self) -> Result<Cart> {
        self.delete("/api/cart/voucher").await
    }

    async fn create_order(
        &self,
        shipping: &ShippingAddress,
        method: PaymentMethod,
    ) -> Result<Order> {
        self.post(
            "/api/orders",
            &json!({ "shippingAddress": shipping, "paymentMethod": method }),
        )
        .await
    }

    async fn my_orders(&self) -> Result<Vec<Order>> {
        self.get("/api/orders/mine").await
    }

    async fn order(&self, id: &str) -> Result<Order> {
        self.get(&format!("/api/orders/{id}")).await
    }

    async fn create_payment(
        &self,
        order_id: &str,
        return_url: &str,
        cancel_url: &str,
    ) -> Result<Payment> {
        self.post(
            "/api/payments",
            &json!({
                "orderId": order_id,
                "returnUrl": return_url,
                "cancelUrl": cancel_url
            }),
        )
        .await
    }

    async fn execute_payment(&self, payment_id: &str, payer_id: &str) -> Result<Payment> {
        self.post(
            &format!("/api/payments/{payment_id}/execute"),
            &json!({ "payerId": payer_id }),
        )
        .await
    }

    async fn cancel_payment(&self, payment_id: &str) -> Result<()> {
        self.send_empty(
            Method::POST,
            &format!("/api/payments/{payment_id}/cancel"),
            None::<&()>,
        )
        .await
    }

    async fn create_product(&self, input: &ProductInput) -> Result<Product> {
        self.post("/api/products", input).await
    }

    async fn update_product(&self, id: &str, input: &ProductInput) -> Result<Product> {
        self.put(&format!("/api/products/{id}"), input).await
    }

    async fn delete_product(&self, id: &str) -> Result<()> {
        self.send_empty(
            Method::DELETE,
            &format!("/api/products/{id}"),
            None::<&()>,
        )
        .await
    }

    async fn all_orders(&self) -> Result<Vec<Order>> {
        self.get("/api/orders").await
    }

    async fn mark_delivered(&self, order_id: &str) -> Result<Order> {
        self.put(&format!("/api/orders/{order_id}/deliver"), &json!({}))
            .await
    }

    async fn users(&self) -> Result<Vec<User>> {
        self.get("/api/users").await
    }

    async fn set_admin(&self, user_id: &str, is_admin: bool) -> Result<User> {
        self.put(
            &format!("/api/users/{user_id}"),
            &json!({ "isAdmin": is_admin }),
        )
        .await
    }

    async fn delete_user(&self, user_id: &str) -> Result<()> {
        self.send_empty(
            Method::DELETE,
            &format!("/api/users/{user_id}"),
            None::<&()>,
        )
        .await
    }
}
