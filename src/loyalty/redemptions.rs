use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::clock::Clock;
use crate::store::Store;
use crate::types::{Redemption, RedemptionStatus};

pub const CODE_LENGTH: usize = 6;

/// How many redemptions the dashboard lists.
pub const RECENT_REDEMPTIONS_LIMIT: i32 = 50;

/// Why a code could not be redeemed. The messages are shown to staff as-is.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Redemption codes are 6 characters long.")]
    InvalidFormat,

    #[error("Invalid code. Please check and try again.")]
    NotFound,

    #[error("This code has already been used.")]
    AlreadyClaimed,

    #[error("This code has expired.")]
    Expired,

    #[error("store error: {0}")]
    Store(#[from] crate::error::Error),
}

impl VerifyError {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidFormat => "invalid_format",
            Self::NotFound => "not_found",
            Self::AlreadyClaimed => "already_claimed",
            Self::Expired => "expired",
            Self::Store(_) => "store",
        }
    }
}

/// Upper-cases a typed code and checks its length.
pub fn normalize_code(code: &str) -> Result<String, VerifyError> {
    let code = code.to_uppercase();
    if code.chars().count() != CODE_LENGTH {
        return Err(VerifyError::InvalidFormat);
    }
    Ok(code)
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifiedRedemption {
    pub redemption_id: String,
    pub redemption_code: String,
    pub reward_description: String,
    pub claimed_at: DateTime<Utc>,
}

impl VerifiedRedemption {
    #[must_use]
    pub fn message(&self) -> String {
        format!("Verified! Give the customer: {}", self.reward_description)
    }
}

/// Claims redemption codes presented at the counter.
///
/// A code moves from pending to claimed at most once. The final write is a
/// compare-and-set on `is_claimed`, so two devices verifying the same code
/// cannot both succeed even if both read it as pending.
pub struct RedemptionVerifier<'a> {
    store: &'a dyn Store,
    clock: &'a dyn Clock,
}

impl<'a> RedemptionVerifier<'a> {
    #[must_use]
    pub fn new(store: &'a dyn Store, clock: &'a dyn Clock) -> Self {
        Self { store, clock }
    }

    pub fn verify(&self, cafe_id: &str, code: &str) -> Result<VerifiedRedemption, VerifyError> {
        let result = self.try_verify(cafe_id, code);

        match &result {
            Ok(verified) => tracing::info!(
                cafe_id,
                redemption_id = %verified.redemption_id,
                "redemption claimed"
            ),
            Err(VerifyError::Store(e)) => {
                tracing::error!(cafe_id, "redemption verification failed: {e}");
            }
            Err(e) => tracing::warn!(cafe_id, kind = e.kind(), "redemption rejected"),
        }

        result
    }

    fn try_verify(&self, cafe_id: &str, code: &str) -> Result<VerifiedRedemption, VerifyError> {
        let code = normalize_code(code)?;

        let redemption = self
            .store
            .find_redemption_by_code(cafe_id, &code)?
            .ok_or(VerifyError::NotFound)?;

        let now = self.clock.now();
        check_claimable(&redemption, now)?;
        self.claim(&redemption, now)
    }

    /// Writes the claim. `redemption` may be stale; the store decides.
    fn claim(
        &self,
        redemption: &Redemption,
        now: DateTime<Utc>,
    ) -> Result<VerifiedRedemption, VerifyError> {
        if !self.store.claim_redemption(&redemption.id, now)? {
            return Err(VerifyError::AlreadyClaimed);
        }

        Ok(VerifiedRedemption {
            redemption_id: redemption.id.clone(),
            redemption_code: redemption.redemption_code.clone(),
            reward_description: redemption.reward_description.clone(),
            claimed_at: now,
        })
    }
}

/// Claimed is checked before expiry: a code claimed before it expired still
/// reports as used.
fn check_claimable(redemption: &Redemption, now: DateTime<Utc>) -> Result<(), VerifyError> {
    if redemption.is_claimed {
        return Err(VerifyError::AlreadyClaimed);
    }
    if redemption.expires_at < now {
        return Err(VerifyError::Expired);
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct RedemptionView {
    #[serde(flatten)]
    pub redemption: Redemption,
    pub user_name: Option<String>,
    pub user_phone: Option<String>,
    pub status: RedemptionStatus,
}

/// The cafe's most recent redemptions with their status as of now.
pub fn list_redemptions(
    store: &dyn Store,
    cafe_id: &str,
    clock: &dyn Clock,
) -> crate::error::Result<Vec<RedemptionView>> {
    let now = clock.now();
    let records = store.list_cafe_redemptions(cafe_id, RECENT_REDEMPTIONS_LIMIT)?;

    Ok(records
        .into_iter()
        .map(|record| {
            let (user_name, user_phone) = record
                .customer
                .map(|c| (c.name, c.phone))
                .unwrap_or_default();
            RedemptionView {
                status: record.redemption.status_at(now),
                redemption: record.redemption,
                user_name,
                user_phone,
            }
        })
        .collect())
}

/// A claimed code together with the refreshed redemption list.
#[derive(Debug, Clone)]
pub struct CounterVerification {
    pub verified: VerifiedRedemption,
    pub redemptions: Vec<RedemptionView>,
}

/// Verifies a code and reloads the list shown next to the counter.
///
/// Once the claim is written the outcome is a success. A failed reload is
/// logged and leaves `redemptions` empty.
pub fn verify_at_counter(
    store: &dyn Store,
    clock: &dyn Clock,
    cafe_id: &str,
    code: &str,
) -> Result<CounterVerification, VerifyError> {
    let verified = RedemptionVerifier::new(store, clock).verify(cafe_id, code)?;

    let redemptions = list_redemptions(store, cafe_id, clock).unwrap_or_else(|e| {
        tracing::error!(
            cafe_id,
            redemption_id = %verified.redemption_id,
            "failed to reload redemptions after claim: {e}"
        );
        Vec::new()
    });

    Ok(CounterVerification {
        verified,
        redemptions,
    })
}
