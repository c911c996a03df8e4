//! Checkout workflow: place order, start payment, hand off to the payment
//! provider, then execute the approved payment and empty the cart.
//!
//! Every step that changes the checkout stage is written to the state file
//! before the next request goes out, so an interrupted run (or the redirect
//! to the provider, which always ends the process) resumes from the last
//! confirmed step.

use std::path::PathBuf;

use chrono::Utc;
use tracing::{info, warn};
use url::Url;

use crate::api::ShopApi;
use crate::error::{Result, ShopError};
use crate::store::{cart, orders, CheckoutStage, RequestStatus, Store};
use crate::types::{CartItem, Order, PaymentMethod, PaymentStatus, ShippingAddress};

/// Where the payment provider sends the user back to.
#[derive(Debug, Clone)]
pub struct CheckoutUrls {
    pub return_url: String,
    pub cancel_url: String,
}

/// Query parameters the provider appends to the return URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnParams {
    pub payment_id: String,
    pub payer_id: String,
    pub token: Option<String>,
}

impl ReturnParams {
    /// Parse a full return URL or just its query string.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let url = Url::parse(input)
            .or_else(|_| Url::parse(&format!("http://localhost/?{}", input.trim_start_matches('?'))))
            .map_err(|_| ShopError::InvalidUrl(input.to_string()))?;

        let param = |name: &str| {
            url.query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
                .filter(|value| !value.is_empty())
        };

        Ok(Self {
            payment_id: param("paymentId").ok_or(ShopError::MissingReturnParam("paymentId"))?,
            payer_id: param("PayerID").ok_or(ShopError::MissingReturnParam("PayerID"))?,
            token: param("token"),
        })
    }
}

/// Result of starting a payment: where to send the user.
#[derive(Debug, Clone)]
pub struct StartedPayment {
    pub order_id: String,
    pub payment_id: String,
    pub approval_url: String,
}

pub struct CheckoutFlow<'a, A: ShopApi> {
    api: &'a A,
    store: &'a mut Store,
    urls: CheckoutUrls,
    state_path: Option<PathBuf>,
}

impl<'a, A: ShopApi> CheckoutFlow<'a, A> {
    pub fn new(api: &'a A, store: &'a mut Store, urls: CheckoutUrls) -> Self {
        Self {
            api,
            store,
            urls,
            state_path: None,
        }
    }

    /// Persist the store to `path` after every stage change.
    pub fn persist_to(mut self, path: PathBuf) -> Self {
        self.state_path = Some(path);
        self
    }

    fn persist(&self) -> Result<()> {
        match &self.state_path {
            Some(path) => self.store.save(path),
            None => Ok(()),
        }
    }

    /// Turn the cart into an order and start paying for it.
    ///
    /// A tracked order whose payment never started is reused instead of
    /// placing a second one.
    pub async fn start(
        &mut self,
        shipping: &ShippingAddress,
        method: PaymentMethod,
    ) -> Result<StartedPayment> {
        self.store.auth.require_user()?;

        if let Some(checkout) = self.store.payment.checkout() {
            let order_id = checkout.order_id.clone();
            if checkout.stage != CheckoutStage::OrderPlaced {
                return Err(ShopError::CheckoutInProgress { order_id });
            }
            let from_cart = checkout.from_cart;
            info!(order = %order_id, "retrying payment for placed order");

            if from_cart {
                cart::fetch(self.api, &mut self.store.cart).await?;
                let unchanged = self
                    .store
                    .orders
                    .get(&order_id)
                    .is_some_and(|order| cart_matches_order(&self.store.cart.items, order));
                if !unchanged {
                    warn!(order = %order_id, "cart changed since the order was placed, it will be kept after payment");
                    self.store.payment.set_from_cart(false);
                    self.persist()?;
                }
            }
            return self.initialize_payment(&order_id).await;
        }

        cart::fetch(self.api, &mut self.store.cart).await?;
        if self.store.cart.items.is_empty() {
            return Err(ShopError::EmptyCart);
        }

        self.store.orders.status = RequestStatus::Loading;
        let order = self
            .store
            .orders
            .status
            .settle(self.api.create_order(shipping, method).await)?;
        info!(order = %order.id, total = %order.total_price, "order placed");

        let order_id = order.id.clone();
        self.store.orders.upsert(order);
        self.store.payment.begin(&order_id, true);
        self.persist()?;

        self.initialize_payment(&order_id).await
    }

    /// Start a payment for an existing unpaid order.
    pub async fn pay(&mut self, order_id: &str) -> Result<StartedPayment> {
        self.store.auth.require_user()?;

        if let Some(checkout) = self.store.payment.checkout() {
            if checkout.order_id != order_id || checkout.stage != CheckoutStage::OrderPlaced {
                return Err(ShopError::CheckoutInProgress {
                    order_id: checkout.order_id.clone(),
                });
            }
        }

        let order = orders::fetch_one(self.api, &mut self.store.orders, order_id).await?;
        if order.is_paid {
            return Err(ShopError::OrderAlreadyPaid(order.id));
        }

        if self.store.payment.checkout().is_none() {
            self.store.payment.begin(order_id, false);
            self.persist()?;
        }

        self.initialize_payment(order_id).await
    }

    async fn initialize_payment(&mut self, order_id: &str) -> Result<StartedPayment> {
        self.store.payment.status = RequestStatus::Loading;
        let created = self
            .api
            .create_payment(order_id, &self.urls.return_url, &self.urls.cancel_url)
            .await;
        let payment = self.store.payment.status.settle(created)?;

        let Some(approval_url) = payment.approval_url.clone() else {
            self.store.payment.status = RequestStatus::Failed("no approval URL".to_string());
            return Err(ShopError::PaymentDeclined {
                payment_id: payment.id,
                status: payment.status.to_string(),
            });
        };

        self.store.payment.await_approval(&payment.id, &approval_url);
        self.persist()?;
        info!(order = %order_id, payment = %payment.id, "awaiting payment approval");

        Ok(StartedPayment {
            order_id: order_id.to_string(),
            payment_id: payment.id,
            approval_url,
        })
    }

    /// Finish the checkout after the provider redirected back.
    ///
    /// Safe to repeat: once the payment is executed only the remaining
    /// bookkeeping runs again.
    pub async fn resume(&mut self, params: &ReturnParams) -> Result<Order> {
        let checkout = self
            .store
            .payment
            .checkout()
            .cloned()
            .ok_or(ShopError::NoCheckout)?;
        let expected = checkout
            .pending_payment_id()
            .ok_or_else(|| ShopError::NoPendingPayment(checkout.order_id.clone()))?;

        if expected != params.payment_id {
            return Err(ShopError::PaymentMismatch {
                expected: expected.to_string(),
                got: params.payment_id.clone(),
            });
        }

        if let CheckoutStage::AwaitingApproval { .. } = checkout.stage {
            self.execute_payment(params).await?;
        }

        let order = self.refresh_paid_order(&checkout.order_id).await;

        if checkout.from_cart {
            if let Err(e) = cart::clear(self.api, &mut self.store.cart).await {
                warn!(error = %e, "payment completed but the server cart could not be cleared");
                self.store.cart.clear();
                self.store.cart.stale = true;
            }
        } else {
            // Ordered items may still be in the cart; the next command refetches.
            self.store.cart.stale = true;
        }

        self.store.payment.complete();
        self.persist()?;
        info!(order = %order.id, "checkout complete");

        Ok(order)
    }

    async fn execute_payment(&mut self, params: &ReturnParams) -> Result<()> {
        self.store.payment.status = RequestStatus::Loading;
        let executed = self
            .api
            .execute_payment(&params.payment_id, &params.payer_id)
            .await;
        let payment = self.store.payment.status.settle(executed)?;

        if payment.status != PaymentStatus::Completed {
            warn!(payment = %payment.id, status = %payment.status, "payment not completed");
            self.store.payment.reset_to_order_placed();
            self.store.payment.status =
                RequestStatus::Failed(format!("payment {}", payment.status));
            self.persist()?;
            return Err(ShopError::PaymentDeclined {
                payment_id: payment.id,
                status: payment.status.to_string(),
            });
        }

        self.store.payment.mark_executed(&payment.id);
        self.persist()?;
        info!(payment = %payment.id, "payment executed");
        Ok(())
    }

    /// Fetch the settled order, falling back to marking the cached copy paid.
    async fn refresh_paid_order(&mut self, order_id: &str) -> Order {
        match orders::fetch_one(self.api, &mut self.store.orders, order_id).await {
            Ok(order) => order,
            Err(e) => {
                warn!(order = %order_id, error = %e, "could not refresh paid order");
                let mut order = self
                    .store
                    .orders
                    .get(order_id)
                    .cloned()
                    .unwrap_or_else(|| placeholder_order(order_id));
                order.is_paid = true;
                order.paid_at.get_or_insert_with(|| Utc::now().to_rfc3339());
                self.store.orders.upsert(order.clone());
                order
            }
        }
    }

    /// Back out of the provider approval. The order stays on the server
    /// unpaid; with `abandon` it is no longer tracked here either.
    pub async fn cancel(&mut self, abandon: bool) -> Result<String> {
        let checkout = self
            .store
            .payment
            .checkout()
            .cloned()
            .ok_or(ShopError::NoCheckout)?;

        match &checkout.stage {
            CheckoutStage::PaymentExecuted { .. } => {
                return Err(ShopError::OrderAlreadyPaid(checkout.order_id));
            }
            CheckoutStage::AwaitingApproval { payment_id, .. } => {
                if let Err(e) = self.api.cancel_payment(payment_id).await {
                    warn!(payment = %payment_id, error = %e, "failed to cancel payment on the server");
                }
                self.store.payment.reset_to_order_placed();
            }
            CheckoutStage::OrderPlaced => {}
        }

        if abandon {
            self.store.payment.abandon();
        }
        self.persist()?;

        Ok(checkout.order_id)
    }
}

/// Same products in the same quantities, ignoring line order.
fn cart_matches_order(items: &[CartItem], order: &Order) -> bool {
    let mut cart: Vec<(&str, u32)> = items
        .iter()
        .map(|i| (i.product_id.as_str(), i.quantity))
        .collect();
    let mut ordered: Vec<(&str, u32)> = order
        .order_items
        .iter()
        .map(|i| (i.product_id.as_str(), i.quantity))
        .collect();
    cart.sort_unstable();
    ordered.sort_unstable();
    cart == ordered
}

fn placeholder_order(order_id: &str) -> Order {
    Order {
        id: order_id.to_string(),
        user: None,
        order_items: Vec::new(),
        shipping_address: ShippingAddress {
            address: String::new(),
            city: String::new(),
            postal_code: String::new(),
            country: String::new(),
        },
        payment_method: PaymentMethod::PayPal.to_string(),
        items_price: Default::default(),
        discount: Default::default(),
        shipping_price: Default::default(),
        tax_price: Default::default(),
        total_price: Default::default(),
        voucher: None,
        is_paid: false,
        paid_at: None,
        is_delivered: false,
        delivered_at: None,
        created_at: Utc::now().to_rfc3339(),
    }
}
