use std::sync::LazyLock;

use colored::Colorize;
use regex::Regex;

use super::prompt;
use crate::api::{ProfileUpdate, ShopApi};
use crate::cli::{LoginArgs, ProfileArgs, RegisterArgs};
use crate::error::{Result, ShopError};
use crate::output;
use crate::store::{auth, Store};
use crate::types::User;

/// Something@something.tld with no whitespace.
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Invalid regex"));

fn validate_email(email: &str) -> Result<String> {
    let email = email.trim();
    if EMAIL_RE.is_match(email) {
        Ok(email.to_lowercase())
    } else {
        Err(ShopError::InvalidEmail(email.to_string()))
    }
}

fn password_or_prompt(password: Option<String>, label: &str) -> Result<String> {
    let password = match password {
        Some(password) => password,
        None => prompt(label)?,
    };

    if password.is_empty() {
        return Err(ShopError::EmptyPassword);
    }
    Ok(password)
}

fn print_user(user: &User) {
    output::print_item(user, |u| {
        println!("{} <{}>", u.name.bold(), u.email);
        if u.is_admin {
            println!("Role: {}", "admin".yellow());
        }
        println!("ID:   {}", u.id.dimmed());
    });
}

pub async fn login<A: ShopApi>(api: &A, store: &mut Store, args: LoginArgs) -> Result<()> {
    let email = validate_email(&args.email)?;
    let password = password_or_prompt(args.password, "Password: ")?;

    let user = auth::login(api, store, &email, &password).await?;
    output::print_message(&format!("Signed in as {} <{}>", user.name, user.email));
    Ok(())
}

pub async fn register<A: ShopApi>(api: &A, store: &mut Store, args: RegisterArgs) -> Result<()> {
    let email = validate_email(&args.email)?;
    let password = password_or_prompt(args.password, "Choose a password: ")?;

    let user = auth::register(api, store, args.name.trim(), &email, &password).await?;
    output::print_message(&format!("Account created. Signed in as {}", user.email));
    Ok(())
}

pub fn logout(store: &mut Store) -> Result<()> {
    match auth::logout(store) {
        Some(user) => output::print_message(&format!("Signed out {}", user.email)),
        None => output::print_message("Not signed in"),
    }
    Ok(())
}

pub fn whoami(store: &Store) -> Result<()> {
    let user = store.auth.require_user()?;
    print_user(user);
    Ok(())
}

pub async fn profile<A: ShopApi>(api: &A, store: &mut Store, args: ProfileArgs) -> Result<()> {
    let update = ProfileUpdate {
        name: args.name.map(|n| n.trim().to_string()),
        email: args.email.as_deref().map(validate_email).transpose()?,
        password: if args.password {
            Some(password_or_prompt(None, "New password: ")?)
        } else {
            None
        },
    };

    let user = if update.name.is_none() && update.email.is_none() && update.password.is_none() {
        auth::refresh_profile(api, store).await?
    } else {
        let user = auth::update_profile(api, store, &update).await?;
        output::print_message("Profile updated");
        user
    };

    print_user(&user);
    Ok(())
}
