use url::Url;

use super::prompt;
use crate::config::Config;
use crate::error::{Result, ShopError};

pub async fn run() -> Result<()> {
    let config_path = Config::config_path()?;

    if config_path.exists() {
        let answer = prompt(&format!(
            "Config file already exists at {}. Overwrite? [y/N] ",
            config_path.display()
        ))?;

        if !answer.eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    println!("Shop CLI Configuration");
    println!("======================\n");

    let api_url = prompt("Enter the shop API URL (e.g., https://shop.example.com): ")?;
    if api_url.is_empty() {
        return Err(ShopError::MissingApiUrl);
    }
    Url::parse(&api_url).map_err(|_| ShopError::InvalidUrl(api_url.clone()))?;

    let currency = prompt("Currency code for prices [USD]: ")?;
    let return_url = prompt("PayPal return URL [http://localhost:3000/checkout/return]: ")?;

    let config = Config {
        api_url: Some(api_url),
        return_url: Some(return_url).filter(|u| !u.is_empty()),
        currency: Some(currency.to_uppercase()).filter(|c| !c.is_empty()),
        ..Default::default()
    };

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ShopError::ConfigWrite {
            path: config_path.clone(),
            source: e,
        })?;
    }

    std::fs::write(&config_path, toml::to_string(&config)?).map_err(|e| ShopError::ConfigWrite {
        path: config_path.clone(),
        source: e,
    })?;

    println!("\nConfig saved to {}", config_path.display());
    println!("You can now use 'shop' commands!");

    Ok(())
}
