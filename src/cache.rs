use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::types::Product;

const CACHE_TTL_SECS: u64 = 600; // 10 minutes

/// Products seen in recent listings, so cart edits can validate stock
/// without another round trip.
#[derive(Serialize, Deserialize, Default)]
pub struct Cache {
    products: HashMap<String, CachedProduct>,
}

#[derive(Serialize, Deserialize)]
struct CachedProduct {
    product: Product,
    fetched_at: u64,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

impl Cache {
    pub fn load() -> Self {
        let path = match Self::cache_path() {
            Ok(p) => p,
            Err(_) => return Self::default(),
        };

        if !path.exists() {
            return Self::default();
        }

        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return Self::default(),
        };

        Self::from_json(&contents, now_secs())
    }

    fn from_json(contents: &str, now: u64) -> Self {
        let mut cache: Self = match serde_json::from_str(contents) {
            Ok(c) => c,
            Err(_) => return Self::default(),
        };

        cache
            .products
            .retain(|_, entry| now.saturating_sub(entry.fetched_at) <= CACHE_TTL_SECS);
        cache
    }

    pub fn save(&self) {
        let path = match Self::cache_path() {
            Ok(p) => p,
            Err(_) => return,
        };

        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let contents = match serde_json::to_string_pretty(self) {
            Ok(c) => c,
            Err(_) => return,
        };

        let _ = std::fs::write(path, contents);
    }

    fn cache_path() -> Result<PathBuf, ()> {
        Config::config_path()
            .map(|p| p.with_file_name("cache.json"))
            .map_err(|_| ())
    }

    pub fn get_product(&self, id: &str) -> Option<&Product> {
        self.products.get(id).map(|entry| &entry.product)
    }

    pub fn set_products<'a>(&mut self, products: impl IntoIterator<Item = &'a Product>) {
        self.insert_at(products, now_secs());
    }

    fn insert_at<'a>(&mut self, products: impl IntoIterator<Item = &'a Product>, now: u64) {
        for product in products {
            let entry = CachedProduct {
                product: product.clone(),
                fetched_at: now,
            };
            self.products.insert(product.id.clone(), entry);
        }
    }

    /// Drop a product whose stock or price is known to have changed.
    pub fn invalidate(&mut self, id: &str) {
        self.products.remove(id);
    }
}
