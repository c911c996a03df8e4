use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use rust_decimal::Decimal;

use crate::types::PaymentMethod;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Compact,
}

#[derive(Parser)]
#[command(name = "shop")]
#[command(about = "A terminal storefront: browse, fill your cart and check out", version)]
#[command(after_help = "EXAMPLES:
    shop products --search phone       Search the catalog
    shop cart add 64f1c2               Add a product to your cart
    shop cart voucher SAVE10           Apply a voucher
    shop checkout start --address \"1 Main St\" --city Springfield --postal-code 12345 --country US
    shop checkout resume \"<return url>\"  Finish paying after PayPal approval")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (table, json, compact)
    #[arg(long, short = 'o', global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Output as JSON (alias for --format json)
    #[arg(long, global = true, hide = true)]
    pub json: bool,

    /// Suppress success messages
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Show detailed error information and debug logs
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Get the effective output format, considering --json flag
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Browse the catalog
    #[command(
        alias = "p",
        after_help = "EXAMPLES:
    shop products
    shop products --search phone --page 2
    shop products --category Electronics
    shop products --top"
    )]
    Products(ProductListArgs),
    /// Show product details
    #[command(after_help = "EXAMPLES:
    shop product 64f1c2")]
    Product {
        /// Product ID
        id: String,
    },
    /// List reviews for a product
    #[command(after_help = "EXAMPLES:
    shop reviews 64f1c2")]
    Reviews {
        /// Product ID
        product_id: String,
    },
    /// Review a product
    #[command(after_help = "EXAMPLES:
    shop review 64f1c2 --rating 5 --comment \"Works great\"")]
    Review(ReviewArgs),
    /// Show or edit your cart
    #[command(
        alias = "c",
        after_help = "EXAMPLES:
    shop cart
    shop cart add 64f1c2 -n 2
    shop cart set 9a0e 3
    shop cart remove 9a0e
    shop cart voucher SAVE10
    shop cart voucher --remove"
    )]
    Cart {
        #[command(subcommand)]
        action: Option<CartCommands>,
    },
    /// Place an order and pay for it
    #[command(after_help = "EXAMPLES:
    shop checkout start --address \"1 Main St\" --city Springfield --postal-code 12345 --country US
    shop checkout resume \"http://localhost:3000/checkout/return?paymentId=PAY-1&PayerID=ABC\"
    shop checkout cancel
    shop checkout pay 65a0f1
    shop checkout status")]
    Checkout {
        #[command(subcommand)]
        action: CheckoutCommands,
    },
    /// List your orders
    #[command(after_help = "EXAMPLES:
    shop orders
    shop orders --format json")]
    Orders,
    /// Show order details
    #[command(after_help = "EXAMPLES:
    shop order 65a0f1")]
    Order {
        /// Order ID
        id: String,
    },
    /// Sign in
    #[command(after_help = "EXAMPLES:
    shop login ada@example.com")]
    Login(LoginArgs),
    /// Create an account
    #[command(after_help = "EXAMPLES:
    shop register --name Ada ada@example.com")]
    Register(RegisterArgs),
    /// Sign out and forget cached cart and orders
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Show or update your profile
    #[command(after_help = "EXAMPLES:
    shop profile
    shop profile --name \"Ada Lovelace\"")]
    Profile(ProfileArgs),
    /// Back-office commands (admin accounts only)
    #[command(after_help = "EXAMPLES:
    shop admin products create --name Phone --price 499.99 --stock 10
    shop admin orders --undelivered
    shop admin deliver 65a0f1
    shop admin users")]
    Admin {
        #[command(subcommand)]
        action: AdminCommands,
    },
    /// Generate shell completions
    #[command(after_help = "EXAMPLES:
    shop completions bash > ~/.bash_completion.d/shop
    shop completions zsh > ~/.zfunc/_shop
    shop completions fish > ~/.config/fish/completions/shop.fish")]
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
    /// Initialize configuration file interactively
    #[command(after_help = "EXAMPLES:
    shop init")]
    Init,
}

#[derive(Subcommand)]
pub enum CartCommands {
    /// Show cart contents and totals
    #[command(alias = "ls")]
    Show,
    /// Add a product
    Add(CartAddArgs),
    /// Change the quantity of a cart line
    Set {
        /// Cart item ID
        item_id: String,
        /// New quantity (at least 1)
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        quantity: u32,
    },
    /// Remove a cart line
    #[command(alias = "rm")]
    Remove {
        /// Cart item ID
        item_id: String,
    },
    /// Empty the cart
    Clear,
    /// Apply or remove a voucher code
    Voucher(VoucherArgs),
}

#[derive(Subcommand)]
pub enum CheckoutCommands {
    /// Place an order from the cart and get the PayPal approval link
    Start(CheckoutStartArgs),
    /// Finish paying after PayPal redirected back
    Resume {
        /// The return URL (or its query string) PayPal redirected to
        return_url: String,
    },
    /// Back out of a pending PayPal approval
    Cancel {
        /// Stop tracking the order entirely
        #[arg(long)]
        abandon: bool,
    },
    /// Pay for an existing unpaid order
    Pay {
        /// Order ID
        order_id: String,
    },
    /// Show the checkout in progress
    Status,
}

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Manage products
    Products {
        #[command(subcommand)]
        action: AdminProductCommands,
    },
    /// List all orders
    Orders {
        /// Only paid orders that are not delivered yet
        #[arg(long)]
        undelivered: bool,
    },
    /// Mark an order as delivered
    Deliver {
        /// Order ID
        order_id: String,
    },
    /// List users
    Users,
    /// Delete a user
    UserDelete {
        /// User ID
        id: String,
    },
    /// Grant (or with --revoke, remove) admin rights
    Promote {
        /// User ID
        id: String,
        #[arg(long)]
        revoke: bool,
    },
}

#[derive(Subcommand)]
pub enum AdminProductCommands {
    /// Create a product
    Create(ProductCreateArgs),
    /// Update a product
    Update(ProductUpdateArgs),
    /// Delete a product
    Delete {
        /// Product ID
        id: String,
    },
}

#[derive(Args, Clone)]
pub struct ProductListArgs {
    /// Search keyword
    #[arg(long, short)]
    pub search: Option<String>,

    /// Filter by category
    #[arg(long)]
    pub category: Option<String>,

    /// Page number (1-based)
    #[arg(long, default_value = "1")]
    pub page: u32,

    /// Show top rated products instead
    #[arg(long, conflicts_with_all = ["search", "category"])]
    pub top: bool,
}

#[derive(Args)]
pub struct ReviewArgs {
    /// Product ID
    pub product_id: String,

    /// Rating from 1 to 5
    #[arg(long, short)]
    pub rating: u8,

    /// Review text
    #[arg(long, short, default_value = "")]
    pub comment: String,
}

#[derive(Args)]
pub struct CartAddArgs {
    /// Product ID
    pub product_id: String,

    /// Quantity to add
    #[arg(long, short = 'n', default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    pub quantity: u32,
}

#[derive(Args)]
pub struct VoucherArgs {
    /// Voucher code
    #[arg(required_unless_present = "remove")]
    pub code: Option<String>,

    /// Remove the applied voucher
    #[arg(long, conflicts_with = "code")]
    pub remove: bool,
}

#[derive(Args)]
pub struct CheckoutStartArgs {
    /// Street address
    #[arg(long)]
    pub address: String,

    #[arg(long)]
    pub city: String,

    #[arg(long)]
    pub postal_code: String,

    #[arg(long)]
    pub country: String,

    /// Payment method
    #[arg(long, value_enum, default_value = "paypal")]
    pub method: PaymentMethod,
}

#[derive(Args)]
pub struct LoginArgs {
    /// Account email
    pub email: String,

    /// Password (prompted for when omitted)
    #[arg(long, env = "SHOP_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Args)]
pub struct RegisterArgs {
    /// Account email
    pub email: String,

    /// Display name
    #[arg(long)]
    pub name: String,

    /// Password (prompted for when omitted)
    #[arg(long, env = "SHOP_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Args)]
pub struct ProfileArgs {
    /// New display name
    #[arg(long)]
    pub name: Option<String>,

    /// New email
    #[arg(long)]
    pub email: Option<String>,

    /// Set a new password (prompted for)
    #[arg(long)]
    pub password: bool,
}

#[derive(Args)]
pub struct ProductCreateArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub price: Decimal,

    /// Units in stock
    #[arg(long, default_value = "0")]
    pub stock: u32,

    #[arg(long)]
    pub brand: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Image URL
    #[arg(long)]
    pub image: Option<String>,
}

#[derive(Args)]
pub struct ProductUpdateArgs {
    /// Product ID
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub price: Option<Decimal>,

    /// Units in stock
    #[arg(long)]
    pub stock: Option<u32>,

    #[arg(long)]
    pub brand: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Image URL
    #[arg(long)]
    pub image: Option<String>,
}
