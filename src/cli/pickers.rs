use std::fmt;

use chrono::{DateTime, Duration, Utc};
use inquire::{InquireError, Select};

use crate::store::Store;
use crate::types::{Owner, Token};

const LIST_LIMIT: i32 = 1000;

/// Owner with cafe name resolved for display
pub struct OwnerDisplay {
    pub owner: Owner,
    pub cafe_name: Option<String>,
}

impl fmt::Display for OwnerDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cafe = self.cafe_name.as_deref().unwrap_or("no cafe");
        write!(
            f,
            "{} [{}] ({}...)",
            self.owner.email,
            cafe,
            short_id(&self.owner.id)
        )
    }
}

/// Token with resolved owner email for display
pub struct TokenDisplay {
    pub token: Token,
    pub owner_email: Option<String>,
    pub now: DateTime<Utc>,
}

impl fmt::Display for TokenDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let owner = self.owner_email.as_deref().unwrap_or("admin");
        let created = format_relative_time(&self.token.created_at, self.now);
        let last_used = match &self.token.last_used_at {
            Some(dt) => format_relative_time(dt, self.now),
            None => "never used".to_string(),
        };
        write!(
            f,
            "stampbook_{}...  {}  created {}  {}",
            &self.token.token_lookup, owner, created, last_used
        )
    }
}

/// Token expiration option for display
#[derive(Clone)]
pub struct ExpirationOption {
    pub label: &'static str,
    pub days: Option<i64>,
}

impl fmt::Display for ExpirationOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Format a datetime relative to `now` (e.g., "2 days ago")
#[must_use]
pub fn format_relative_time(dt: &DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(*dt);

    if diff.num_seconds() < 0 {
        return "in the future".to_string();
    }

    if diff.num_seconds() < 60 {
        return "just now".to_string();
    }

    let (value, unit) = if diff.num_minutes() < 60 {
        (diff.num_minutes(), "minute")
    } else if diff.num_hours() < 24 {
        (diff.num_hours(), "hour")
    } else if diff.num_days() < 30 {
        (diff.num_days(), "day")
    } else if diff.num_days() < 365 {
        (diff.num_days() / 30, "month")
    } else {
        (diff.num_days() / 365, "year")
    };

    if value == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{value} {unit}s ago")
    }
}

fn load_owners_with_cafes(store: &impl Store) -> anyhow::Result<Vec<OwnerDisplay>> {
    let owners = store.list_owners("", LIST_LIMIT)?;
    let mut displays = Vec::with_capacity(owners.len());

    for owner in owners {
        let cafe_name = store.get_cafe_by_owner(&owner.id)?.map(|c| c.name);
        displays.push(OwnerDisplay { owner, cafe_name });
    }

    Ok(displays)
}

fn load_tokens_with_owners(
    store: &impl Store,
    now: DateTime<Utc>,
) -> anyhow::Result<Vec<TokenDisplay>> {
    let tokens = store.list_tokens("", LIST_LIMIT)?;
    let mut displays = Vec::with_capacity(tokens.len());

    for token in tokens {
        let owner_email = resolve_token_owner_email(store, &token)?;
        displays.push(TokenDisplay {
            token,
            owner_email,
            now,
        });
    }

    Ok(displays)
}

fn select<T: fmt::Display>(prompt: &str, options: Vec<T>) -> anyhow::Result<Option<T>> {
    let selection = Select::new(prompt, options)
        .with_page_size(15)
        .with_help_message("Type to filter, Enter to select")
        .with_vim_mode(true)
        .prompt();

    match selection {
        Ok(choice) => Ok(Some(choice)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Pick an owner from the list
pub fn pick_owner(store: &impl Store) -> anyhow::Result<Option<Owner>> {
    let owners = load_owners_with_cafes(store)?;

    if owners.is_empty() {
        println!("No owners found.");
        return Ok(None);
    }

    Ok(select("Select owner:", owners)?.map(|d| d.owner))
}

/// Pick a token from the list
pub fn pick_token(store: &impl Store, now: DateTime<Utc>) -> anyhow::Result<Option<Token>> {
    let tokens = load_tokens_with_owners(store, now)?;

    if tokens.is_empty() {
        println!("No tokens found.");
        return Ok(None);
    }

    Ok(select("Select token:", tokens)?.map(|d| d.token))
}

/// Pick token expiration
pub fn pick_expiration() -> anyhow::Result<Option<Option<Duration>>> {
    let options = vec![
        ExpirationOption {
            label: "30 days",
            days: Some(30),
        },
        ExpirationOption {
            label: "90 days",
            days: Some(90),
        },
        ExpirationOption {
            label: "1 year",
            days: Some(365),
        },
        ExpirationOption {
            label: "Never",
            days: None,
        },
    ];

    let selection = Select::new("Token expiration:", options)
        .with_page_size(4)
        .with_vim_mode(true)
        .prompt();

    match selection {
        Ok(opt) => Ok(Some(opt.days.map(Duration::days))),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Get all owners for listing
pub fn list_owners(store: &impl Store) -> anyhow::Result<Vec<OwnerDisplay>> {
    load_owners_with_cafes(store)
}

/// Get all tokens for listing
pub fn list_tokens(store: &impl Store, now: DateTime<Utc>) -> anyhow::Result<Vec<TokenDisplay>> {
    load_tokens_with_owners(store, now)
}

/// Get an owner by ID or interactively pick one
pub fn get_or_pick_owner(
    store: &impl Store,
    owner_id: Option<String>,
    non_interactive: bool,
) -> anyhow::Result<Option<Owner>> {
    if let Some(id) = owner_id {
        let owner = store
            .get_owner(&id)?
            .ok_or_else(|| anyhow::anyhow!("Owner not found: {}", id))?;
        Ok(Some(owner))
    } else if non_interactive {
        anyhow::bail!("--owner-id is required in non-interactive mode");
    } else {
        pick_owner(store)
    }
}

/// Resolve the email of the owner a token belongs to
pub fn resolve_token_owner_email(
    store: &impl Store,
    token: &Token,
) -> anyhow::Result<Option<String>> {
    match &token.owner_id {
        Some(owner_id) => Ok(store.get_owner(owner_id)?.map(|o| o.email)),
        None => Ok(None),
    }
}

/// Request confirmation for a destructive operation
pub fn confirm_action(message: &str, yes: bool, non_interactive: bool) -> anyhow::Result<bool> {
    if yes {
        Ok(true)
    } else if non_interactive {
        anyhow::bail!("--yes is required for destructive operations in non-interactive mode");
    } else {
        Ok(inquire::Confirm::new(message)
            .with_default(false)
            .prompt()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_relative_time() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

        assert_eq!(format_relative_time(&now, now), "just now");
        assert_eq!(
            format_relative_time(&(now - Duration::minutes(1)), now),
            "1 minute ago"
        );
        assert_eq!(
            format_relative_time(&(now - Duration::hours(5)), now),
            "5 hours ago"
        );
        assert_eq!(
            format_relative_time(&(now - Duration::days(45)), now),
            "1 month ago"
        );
        assert_eq!(
            format_relative_time(&(now - Duration::days(800)), now),
            "2 years ago"
        );
        assert_eq!(
            format_relative_time(&(now + Duration::hours(1)), now),
            "in the future"
        );
    }

    #[test]
    fn test_confirm_action_flags() {
        assert!(confirm_action("Delete?", true, true).unwrap());
        assert!(confirm_action("Delete?", false, true).is_err());
    }
}
