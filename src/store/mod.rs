pub mod projection;
mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Owner operations
    fn create_owner(&self, owner: &Owner) -> Result<()>;
    fn get_owner(&self, id: &str) -> Result<Option<Owner>>;
    fn get_owner_by_email(&self, email: &str) -> Result<Option<Owner>>;
    fn list_owners(&self, cursor: &str, limit: i32) -> Result<Vec<Owner>>;
    fn delete_owner(&self, id: &str) -> Result<bool>;

    // Token operations
    fn create_token(&self, token: &Token) -> Result<()>;
    fn get_token_by_id(&self, id: &str) -> Result<Option<Token>>;
    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>>;
    fn list_tokens(&self, cursor: &str, limit: i32) -> Result<Vec<Token>>;
    fn list_owner_tokens(&self, owner_id: &str) -> Result<Vec<Token>>;
    fn delete_token(&self, id: &str) -> Result<bool>;
    fn update_token_last_used(&self, id: &str) -> Result<()>;

    // Cafe operations
    fn create_cafe(&self, cafe: &Cafe) -> Result<()>;
    fn get_cafe(&self, id: &str) -> Result<Option<Cafe>>;
    /// The owner's first cafe by creation time.
    fn get_cafe_by_owner(&self, owner_id: &str) -> Result<Option<Cafe>>;
    fn update_cafe(&self, cafe: &Cafe) -> Result<()>;
    fn set_cafe_nfc_tag(&self, id: &str, nfc_tag_id: Option<&str>) -> Result<()>;

    // Customer operations
    fn create_customer(&self, customer: &Customer) -> Result<()>;
    fn get_customer(&self, id: &str) -> Result<Option<Customer>>;

    // Stamp operations
    fn create_stamp(&self, stamp: &StampEvent) -> Result<()>;
    /// Every stamp of a cafe joined to its customer, most recent first.
    fn list_cafe_stamps(&self, cafe_id: &str) -> Result<Vec<StampRecord>>;

    // Redemption operations
    fn create_redemption(&self, redemption: &Redemption) -> Result<()>;
    fn find_redemption_by_code(&self, cafe_id: &str, code: &str) -> Result<Option<Redemption>>;
    fn list_cafe_redemptions(&self, cafe_id: &str, limit: i32) -> Result<Vec<RedemptionRecord>>;
    /// Marks the redemption claimed only if it is still unclaimed.
    /// Returns false when no row changed.
    fn claim_redemption(&self, id: &str, claimed_at: DateTime<Utc>) -> Result<bool>;

    // Aggregations
    fn cafe_stats(&self, cafe_id: &str, now: DateTime<Utc>) -> Result<CafeStats>;

    // Admin token check
    fn has_admin_token(&self) -> Result<bool>;
}
