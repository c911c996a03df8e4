use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShopError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Not authorized: {0}. Run 'shop login' to sign in again")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("Failed to read config file at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write config file at {path}: {source}")]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("No API URL found. Set SHOP_API_URL env var or add api_url to ~/.config/shop/config.toml")]
    MissingApiUrl,

    #[error("Failed to write state file at {path}: {source}")]
    StateWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Password must not be empty")]
    EmptyPassword,

    #[error("Nothing to update. Pass at least one field")]
    NothingToUpdate,

    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("Not logged in. Run 'shop login' first")]
    NotLoggedIn,

    #[error("This command requires an admin account")]
    NotAdmin,

    #[error("Refusing to delete the signed-in account")]
    CannotDeleteSelf,

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Cart item not found: {0}")]
    CartItemNotFound(String),

    #[error("Quantity {requested} is out of range (1-{max} available)")]
    QuantityOutOfRange { requested: u32, max: u32 },

    #[error("Your cart is empty")]
    EmptyCart,

    #[error("No checkout in progress")]
    NoCheckout,

    #[error("A checkout for order {order_id} is already in progress. Resume or cancel it first")]
    CheckoutInProgress { order_id: String },

    #[error("No payment is pending for order {0}. Run 'shop checkout pay {0}' to start one")]
    NoPendingPayment(String),

    #[error("Order {0} is already paid")]
    OrderAlreadyPaid(String),

    #[error("Payment {got} does not match the pending payment {expected}")]
    PaymentMismatch { expected: String, got: String },

    #[error("Payment {payment_id} was not completed (status: {status})")]
    PaymentDeclined { payment_id: String, status: String },

    #[error("Return URL is missing the '{0}' parameter")]
    MissingReturnParam(&'static str),
}

impl ShopError {
    /// Short message suitable for recording in a slice's failed status.
    pub fn summary(&self) -> String {
        match self {
            ShopError::ApiError { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ShopError>;
