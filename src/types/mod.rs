mod cart;
mod order;
mod payment;
mod product;
mod review;
mod user;

pub use cart::{Cart, CartItem, CartTotals, Voucher};
pub use order::{Order, OrderItem, OrderStatus, OrderUser, ShippingAddress};
pub use payment::{Payment, PaymentMethod, PaymentStatus};
pub use product::{Product, ProductInput, ProductPage};
pub use review::Review;
pub use user::{AuthSession, User};
