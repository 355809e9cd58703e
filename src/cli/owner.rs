use chrono::Utc;
use inquire::{Confirm, Password, PasswordDisplayMode, Text};
use uuid::Uuid;

use crate::auth::{hash_password, issue_token};
use crate::server::validation::{normalize_email, validate_email, validate_password};
use crate::store::Store;
use crate::types::Owner;

use super::init_store;
use super::pickers::{confirm_action, get_or_pick_owner, pick_expiration};

fn check_email(email: &str) -> Result<(), String> {
    validate_email(email).map_err(|e| e.message)
}

fn check_password(password: &str) -> Result<(), String> {
    validate_password(password).map_err(|e| e.message)
}

fn prompt_password() -> anyhow::Result<Option<String>> {
    let password = Password::new("Password (leave empty for a token-only account):")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_validator(|input: &str| {
            if input.is_empty() {
                return Ok(inquire::validator::Validation::Valid);
            }
            Ok(check_password(input)
                .map(|()| inquire::validator::Validation::Valid)
                .unwrap_or_else(|e| inquire::validator::Validation::Invalid(e.into())))
        })
        .prompt()?;

    Ok((!password.is_empty()).then_some(password))
}

pub fn run_owner_add(
    data_dir: String,
    email: Option<String>,
    name: Option<String>,
    password: Option<String>,
    create_token_flag: bool,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;

    let email = if let Some(email) = email {
        check_email(&email).map_err(anyhow::Error::msg)?;
        email
    } else if non_interactive {
        anyhow::bail!("--email is required in non-interactive mode");
    } else {
        Text::new("Email:")
            .with_validator(|input: &str| {
                Ok(check_email(input)
                    .map(|()| inquire::validator::Validation::Valid)
                    .unwrap_or_else(|e| inquire::validator::Validation::Invalid(e.into())))
            })
            .prompt()?
    };
    let email = normalize_email(&email);

    if store.get_owner_by_email(&email)?.is_some() {
        anyhow::bail!("An owner with email '{}' already exists", email);
    }

    let password = match password {
        Some(password) => {
            check_password(&password).map_err(anyhow::Error::msg)?;
            Some(password)
        }
        None if non_interactive => None,
        None => prompt_password()?,
    };

    let password_hash = password.as_deref().map(hash_password).transpose()?;

    let owner = Owner {
        id: Uuid::new_v4().to_string(),
        email: email.clone(),
        name: name.filter(|n| !n.trim().is_empty()),
        phone: None,
        password_hash,
        created_at: Utc::now(),
    };

    store.create_owner(&owner)?;

    println!();
    println!("Created owner \"{}\" ({})", email, owner.id);

    let should_create_token = if create_token_flag {
        true
    } else if non_interactive {
        false
    } else {
        Confirm::new("Create access token?")
            .with_default(password.is_none())
            .prompt()?
    };

    if should_create_token {
        let expires_in = if non_interactive {
            None
        } else {
            match pick_expiration()? {
                Some(exp) => exp,
                None => {
                    println!("Token creation cancelled.");
                    return Ok(());
                }
            }
        };

        let now = Utc::now();
        let (_, raw_token) = issue_token(&store, Some(&owner.id), now, expires_in.map(|d| now + d))?;

        println!();
        println!("Token created: {raw_token}");
        println!("  Save this now - it cannot be retrieved later.");
    }

    println!();

    Ok(())
}

pub fn run_owner_remove(
    data_dir: String,
    owner_id: Option<String>,
    non_interactive: bool,
    yes: bool,
) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;

    let Some(owner) = get_or_pick_owner(&store, owner_id, non_interactive)? else {
        return Ok(());
    };

    let confirmed = confirm_action(
        &format!(
            "Delete owner '{}'? This also deletes their cafe, its stamps and redemptions, and their tokens.",
            owner.email
        ),
        yes,
        non_interactive,
    )?;

    if !confirmed {
        println!("Cancelled.");
        return Ok(());
    }

    store.delete_owner(&owner.id)?;

    println!();
    println!("Deleted owner '{}'", owner.email);
    println!();

    Ok(())
}
