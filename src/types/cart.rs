use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub image: Option<String>,
    pub price: Decimal,
    pub quantity: u32,
    pub count_in_stock: u32,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Voucher {
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub discount_percent: Option<Decimal>,
    #[serde(default)]
    pub discount_amount: Option<Decimal>,
}

/// Totals as computed by the backend.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub items_price: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub shipping_price: Decimal,
    #[serde(default)]
    pub tax_price: Decimal,
    pub total_price: Decimal,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Cart {
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub voucher: Option<Voucher>,
    #[serde(flatten)]
    pub totals: CartTotals,
}
