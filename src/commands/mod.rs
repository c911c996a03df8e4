pub mod account;
pub mod admin;
pub mod cart;
pub mod checkout;
pub mod init;
pub mod orders;
pub mod products;
pub mod reviews;

use std::io::{self, Write};

use crate::error::Result;

/// Print `label` to stderr and read one trimmed line from stdin.
fn prompt(label: &str) -> Result<String> {
    eprint!("{label}");
    io::stderr().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
