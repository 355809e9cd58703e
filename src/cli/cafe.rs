use std::path::PathBuf;

use chrono::{DateTime, Utc};
use inquire::Text;

use crate::clock::{Clock, SystemClock};
use crate::config::ServerConfig;
use crate::loyalty::{
    CustomerView, RedemptionVerifier, RedemptionView, StampLinks, list_redemptions,
    load_customers, owner_cafe, qr_filename, render_qr_svg,
};
use crate::types::Cafe;

use super::init_store;
use super::pickers::get_or_pick_owner;

/// Short label for a customer's last visit, as shown on the customer list.
#[must_use]
pub fn format_last_visit(last_visit: &DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = now.signed_duration_since(*last_visit).num_days();
    match days {
        i64::MIN..=0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        2..=6 => format!("{days} days ago"),
        _ => last_visit.format("%-d %b").to_string(),
    }
}

fn print_customers(cafe: &Cafe, customers: &[CustomerView], now: DateTime<Utc>) {
    if customers.is_empty() {
        println!("No customers yet. Share your QR code to get started.");
        return;
    }

    println!();
    for view in customers {
        let summary = &view.summary;
        println!(
            "  {:<20}  {:<14}  {:>3}/{:<3} {:>3}%  {}",
            summary.user_name.as_deref().unwrap_or("Customer"),
            summary.user_phone,
            summary.stamp_count,
            cafe.stamps_required,
            view.progress_percent,
            format_last_visit(&summary.last_visit, now),
        );
    }
    println!();
}

fn print_redemptions(redemptions: &[RedemptionView]) {
    if redemptions.is_empty() {
        println!("No redemptions yet.");
        return;
    }

    println!();
    for view in redemptions {
        println!(
            "  {}  {:<8}  {:<20}  {}  {}",
            view.redemption.redemption_code,
            view.status.as_str(),
            view.user_name.as_deref().unwrap_or("Customer"),
            view.redemption.reward_description,
            view.redemption.created_at.format("%-d %b %H:%M"),
        );
    }
    println!();
}

pub fn run_cafe_customers(
    data_dir: String,
    owner_id: Option<String>,
    non_interactive: bool,
    json: bool,
) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;
    let Some(owner) = get_or_pick_owner(&store, owner_id, non_interactive)? else {
        return Ok(());
    };

    let clock = SystemClock;
    let overview = load_customers(&store, &owner.id, &clock)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&overview)?);
        return Ok(());
    }

    let totals = &overview.totals;
    println!();
    println!("{}", overview.cafe.name);
    println!(
        "Customers: {}   Stamps: {}   Active this week: {}",
        totals.total_customers, totals.total_stamps, totals.active_this_week
    );
    print_customers(&overview.cafe, &overview.customers, clock.now());

    Ok(())
}

pub fn run_cafe_redemptions(
    data_dir: String,
    owner_id: Option<String>,
    non_interactive: bool,
    json: bool,
) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;
    let Some(owner) = get_or_pick_owner(&store, owner_id, non_interactive)? else {
        return Ok(());
    };

    let cafe = owner_cafe(&store, &owner.id)?;
    let redemptions = list_redemptions(&store, &cafe.id, &SystemClock)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&redemptions)?);
    } else {
        print_redemptions(&redemptions);
    }

    Ok(())
}

pub fn run_cafe_verify(
    data_dir: String,
    owner_id: Option<String>,
    code: Option<String>,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;
    let Some(owner) = get_or_pick_owner(&store, owner_id, non_interactive)? else {
        return Ok(());
    };

    let cafe = owner_cafe(&store, &owner.id)?;

    let code = if let Some(code) = code {
        code
    } else if non_interactive {
        anyhow::bail!("--code is required in non-interactive mode");
    } else {
        Text::new("Redemption code:")
            .with_help_message("6 characters, as shown on the customer's phone")
            .prompt()?
    };

    let verified = RedemptionVerifier::new(&store, &SystemClock).verify(&cafe.id, &code)?;

    println!();
    println!("{}", verified.message());
    println!();

    Ok(())
}

pub fn run_cafe_qr(
    data_dir: String,
    owner_id: Option<String>,
    output: Option<String>,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;
    let Some(owner) = get_or_pick_owner(&store, owner_id, non_interactive)? else {
        return Ok(());
    };

    let cafe = owner_cafe(&store, &owner.id)?;
    let config = ServerConfig::load(&PathBuf::from(&data_dir))?;
    let links = StampLinks::new(&config.stamp_base_url, &config.nfc_base_url, &cafe.id);

    let svg = render_qr_svg(&links.stamp_url)?;
    let path = output.map_or_else(|| PathBuf::from(qr_filename(&cafe.name)), PathBuf::from);
    std::fs::write(&path, svg)?;

    println!();
    println!("QR code written to {}", path.display());
    println!("  Stamp URL: {}", links.stamp_url);
    println!("  NFC link:  {}", links.nfc_url);
    println!();

    Ok(())
}
