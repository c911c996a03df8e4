mod api;
mod cache;
mod checkout;
mod cli;
mod client;
mod commands;
mod config;
mod error;
mod output;
mod store;
mod types;

#[cfg(test)]
mod testing;

use std::error::Error;
use std::io;
use std::path::Path;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cache::Cache;
use cli::{AdminCommands, AdminProductCommands, CartCommands, CheckoutCommands, Cli, Commands};
use client::ShopClient;
use config::Config;
use error::Result;
use store::Store;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    let verbose = cli.verbose;
    init_tracing(verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");

        if verbose {
            let mut source = e.source();
            while let Some(cause) = source {
                eprintln!("Caused by: {cause}");
                source = cause.source();
            }
        }

        std::process::exit(1);
    }
}

/// Logs go to stderr so they never mix with table or JSON output.
/// RUST_LOG wins over the --verbose default.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "shop=debug" } else { "shop=warn" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    output::set_format(cli.output_format());
    output::set_quiet(cli.quiet);

    match cli.command {
        // Commands that don't need config or a session
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "shop", &mut io::stdout());
            Ok(())
        }
        Commands::Init => commands::init::run().await,
        command => {
            let config = Config::load()?;
            let state_path = Store::default_path()?;
            let mut store = Store::load(&state_path);
            let mut cache = Cache::load();

            let token = Config::token_override().or_else(|| store.auth.token().map(String::from));
            let client = ShopClient::new(config.api_url()?, token);

            let result = dispatch(command, &client, &config, &mut store, &mut cache, &state_path).await;

            // State is saved even when the command failed: rollbacks and
            // failed statuses are part of it.
            cache.save();
            match store.save(&state_path) {
                Err(e) if result.is_ok() => Err(e),
                Err(e) => {
                    warn!(error = %e, "could not save state after failed command");
                    result
                }
                Ok(()) => result,
            }
        }
    }
}

async fn dispatch(
    command: Commands,
    client: &ShopClient,
    config: &Config,
    store: &mut Store,
    cache: &mut Cache,
    state_path: &Path,
) -> Result<()> {
    match command {
        Commands::Products(args) => commands::products::list(client, config, cache, args).await,
        Commands::Product { id } => commands::products::show(client, config, cache, &id).await,
        Commands::Reviews { product_id } => commands::reviews::list(client, &product_id).await,
        Commands::Review(args) => commands::reviews::add(client, store, cache, args).await,
        Commands::Cart { action } => match action.unwrap_or(CartCommands::Show) {
            CartCommands::Show => commands::cart::show(client, config, store).await,
            CartCommands::Add(args) => commands::cart::add(client, config, store, cache, args).await,
            CartCommands::Set { item_id, quantity } => {
                commands::cart::set(client, config, store, &item_id, quantity).await
            }
            CartCommands::Remove { item_id } => {
                commands::cart::remove(client, config, store, &item_id).await
            }
            CartCommands::Clear => commands::cart::clear(client, store).await,
            CartCommands::Voucher(args) => commands::cart::voucher(client, config, store, args).await,
        },
        Commands::Checkout { action } => match action {
            CheckoutCommands::Start(args) => {
                commands::checkout::start(client, config, store, state_path, args).await
            }
            CheckoutCommands::Resume { return_url } => {
                commands::checkout::resume(client, config, store, state_path, &return_url).await
            }
            CheckoutCommands::Cancel { abandon } => {
                commands::checkout::cancel(client, config, store, state_path, abandon).await
            }
            CheckoutCommands::Pay { order_id } => {
                commands::checkout::pay(client, config, store, state_path, &order_id).await
            }
            CheckoutCommands::Status => commands::checkout::status(store),
        },
        Commands::Orders => commands::orders::list(client, config, store).await,
        Commands::Order { id } => commands::orders::show(client, config, store, &id).await,
        Commands::Login(args) => commands::account::login(client, store, args).await,
        Commands::Register(args) => commands::account::register(client, store, args).await,
        Commands::Logout => commands::account::logout(store),
        Commands::Whoami => commands::account::whoami(store),
        Commands::Profile(args) => commands::account::profile(client, store, args).await,
        Commands::Admin { action } => match action {
            AdminCommands::Products { action } => match action {
                AdminProductCommands::Create(args) => {
                    commands::admin::create_product(client, config, store, cache, args).await
                }
                AdminProductCommands::Update(args) => {
                    commands::admin::update_product(client, store, cache, args).await
                }
                AdminProductCommands::Delete { id } => {
                    commands::admin::delete_product(client, store, cache, &id).await
                }
            },
            AdminCommands::Orders { undelivered } => {
                commands::admin::orders(client, config, store, undelivered).await
            }
            AdminCommands::Deliver { order_id } => {
                commands::admin::deliver(client, config, store, &order_id).await
            }
            AdminCommands::Users => commands::admin::users(client, store).await,
            AdminCommands::UserDelete { id } => commands::admin::delete_user(client, store, &id).await,
            AdminCommands::Promote { id, revoke } => {
                commands::admin::promote(client, store, &id, revoke).await
            }
        },
        Commands::Completions { .. } | Commands::Init => {
            // Already handled in run()
            Ok(())
        }
    }
}
