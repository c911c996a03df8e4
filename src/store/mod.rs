//! Client-side store of server-owned entities.
//!
//! The store is split into slices (`auth`, `cart`, `orders`, `payment`), each
//! holding a denormalized copy of backend records plus the status of the last
//! request that touched it. Slices expose pure reducers for local bookkeeping
//! and async actions that call the backend and reconcile the result.
//!
//! The whole store is persisted as JSON between invocations so that an
//! in-flight checkout survives the redirect to the payment provider.

pub mod auth;
pub mod cart;
pub mod orders;
pub mod payment;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::Config;
use crate::error::{Result, ShopError};

pub use auth::AuthSlice;
pub use cart::CartSlice;
pub use orders::OrderSlice;
pub use payment::{CheckoutStage, PaymentSlice};

/// Outcome of the last request issued on behalf of a slice.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed(String),
}

impl RequestStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, RequestStatus::Failed(_))
    }

    /// Record the outcome of a request and pass it through.
    pub fn settle<T>(&mut self, result: Result<T>) -> Result<T> {
        *self = match &result {
            Ok(_) => RequestStatus::Succeeded,
            Err(e) => RequestStatus::Failed(e.summary()),
        };
        result
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Loading => write!(f, "loading"),
            Self::Succeeded => write!(f, "ok"),
            Self::Failed(message) => write!(f, "failed: {message}"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Store {
    #[serde(default)]
    pub auth: AuthSlice,
    #[serde(default)]
    pub cart: CartSlice,
    #[serde(default)]
    pub orders: OrderSlice,
    #[serde(default)]
    pub payment: PaymentSlice,
}

impl Store {
    pub fn default_path() -> Result<PathBuf> {
        Config::config_dir().map(|dir| dir.join("state.json"))
    }

    /// Load the persisted store. A missing file yields an empty store; an
    /// unreadable one is logged and replaced.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read state file, starting fresh");
                return Self::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(store) => store,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt state file, starting fresh");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let write_err = |source| ShopError::StateWrite {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(write_err)
    }

    /// Drop everything that belongs to the signed-in user.
    pub fn clear_user_data(&mut self) {
        self.cart = CartSlice::default();
        self.orders = OrderSlice::default();
        self.payment = PaymentSlice::default();
    }
}
