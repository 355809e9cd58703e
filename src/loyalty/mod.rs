//! Loyalty program logic: customer aggregation, redemption verification, and
//! the stamp links printed at the counter.
//!
//! Everything here reads time through [`Clock`](crate::clock::Clock) and talks
//! to the database only through [`Store`].

pub mod customers;
pub mod links;
pub mod redemptions;

pub use customers::{
    CustomerOverview, CustomerTotals, CustomerView, UNKNOWN_PHONE, aggregate_customers,
    load_customers, progress_percent,
};
pub use links::{StampLinks, qr_filename, render_qr_svg};
pub use redemptions::{
    CounterVerification, RECENT_REDEMPTIONS_LIMIT, RedemptionVerifier, RedemptionView,
    VerifiedRedemption, VerifyError, list_redemptions, normalize_code, verify_at_counter,
};

use thiserror::Error;

use crate::store::Store;
use crate::types::Cafe;

#[derive(Debug, Error)]
pub enum LoyaltyError {
    #[error("No cafe configured. Complete setup first.")]
    NoCafeConfigured,

    #[error("store error: {0}")]
    Store(#[from] crate::error::Error),
}

/// Resolves the cafe an owner manages.
pub fn owner_cafe(store: &dyn Store, owner_id: &str) -> Result<Cafe, LoyaltyError> {
    store
        .get_cafe_by_owner(owner_id)?
        .ok_or(LoyaltyError::NoCafeConfigured)
}
