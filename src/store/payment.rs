use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RequestStatus;

/// Position of the in-flight checkout.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum CheckoutStage {
    /// Order exists on the server; no payment is pending for it.
    OrderPlaced,
    /// The user was sent to the payment provider to approve `payment_id`.
    AwaitingApproval {
        payment_id: String,
        approval_url: String,
    },
    /// The payment settled; the cart has not been cleared yet.
    PaymentExecuted { payment_id: String },
}

impl fmt::Display for CheckoutStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OrderPlaced => write!(f, "order placed, payment not started"),
            Self::AwaitingApproval { .. } => write!(f, "awaiting payment approval"),
            Self::PaymentExecuted { .. } => write!(f, "payment executed"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Checkout {
    pub order_id: String,
    #[serde(flatten)]
    pub stage: CheckoutStage,
    pub started_at: DateTime<Utc>,
    /// The order holds exactly the cart contents, so paying it empties the cart.
    #[serde(default)]
    pub from_cart: bool,
}

impl Checkout {
    pub fn pending_payment_id(&self) -> Option<&str> {
        match &self.stage {
            CheckoutStage::OrderPlaced => None,
            CheckoutStage::AwaitingApproval { payment_id, .. }
            | CheckoutStage::PaymentExecuted { payment_id } => Some(payment_id),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CompletedPayment {
    pub order_id: String,
    pub payment_id: String,
    pub completed_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct PaymentSlice {
    checkout: Option<Checkout>,
    last_completed: Option<CompletedPayment>,
    #[serde(default)]
    pub status: RequestStatus,
}

impl PaymentSlice {
    pub fn checkout(&self) -> Option<&Checkout> {
        self.checkout.as_ref()
    }

    pub fn order_id(&self) -> Option<&str> {
        self.checkout.as_ref().map(|c| c.order_id.as_str())
    }

    pub fn last_completed(&self) -> Option<&CompletedPayment> {
        self.last_completed.as_ref()
    }

    /// Track a freshly placed (or re-selected) order with no payment pending.
    pub fn begin(&mut self, order_id: &str, from_cart: bool) {
        self.checkout = Some(Checkout {
            order_id: order_id.to_string(),
            stage: CheckoutStage::OrderPlaced,
            started_at: Utc::now(),
            from_cart,
        });
    }

    pub fn set_from_cart(&mut self, from_cart: bool) {
        if let Some(checkout) = self.checkout.as_mut() {
            checkout.from_cart = from_cart;
        }
    }

    fn set_stage(&mut self, stage: CheckoutStage) {
        if let Some(checkout) = self.checkout.as_mut() {
            checkout.stage = stage;
        }
    }

    pub fn await_approval(&mut self, payment_id: &str, approval_url: &str) {
        self.set_stage(CheckoutStage::AwaitingApproval {
            payment_id: payment_id.to_string(),
            approval_url: approval_url.to_string(),
        });
    }

    pub fn mark_executed(&mut self, payment_id: &str) {
        self.set_stage(CheckoutStage::PaymentExecuted {
            payment_id: payment_id.to_string(),
        });
    }

    /// Forget the pending payment but keep the order tracked for a retry.
    pub fn reset_to_order_placed(&mut self) {
        self.set_stage(CheckoutStage::OrderPlaced);
    }

    pub fn complete(&mut self) -> Option<CompletedPayment> {
        let payment_id = self.checkout.as_ref()?.pending_payment_id()?.to_string();
        let checkout = self.checkout.take()?;
        let completed = CompletedPayment {
            order_id: checkout.order_id,
            payment_id,
            completed_at: Utc::now(),
        };
        self.last_completed = Some(completed.clone());
        Some(completed)
    }

    pub fn abandon(&mut self) -> Option<Checkout> {
        self.checkout.take()
    }
}
