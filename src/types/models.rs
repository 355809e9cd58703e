use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Owner {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: String,
    #[serde(skip)]
    pub token_hash: String,
    #[serde(skip)]
    pub token_lookup: String,
    pub is_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cafe {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nfc_tag_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code_url: Option<String>,
    pub stamps_required: i32,
    pub reward_description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A person collecting stamps through the customer app.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StampEvent {
    pub id: String,
    pub user_id: String,
    pub cafe_id: String,
    pub stamped_at: DateTime<Utc>,
}

/// Display fields of the customer a stamp or redemption row was joined to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub name: Option<String>,
    pub phone: Option<String>,
}

/// A stamp event together with its customer's display fields, as read from a join.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StampRecord {
    pub user_id: String,
    pub cafe_id: String,
    pub stamped_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerProfile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSummary {
    pub user_id: String,
    pub user_name: Option<String>,
    pub user_phone: String,
    pub stamp_count: u32,
    pub last_visit: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Redemption {
    pub id: String,
    pub user_id: String,
    pub cafe_id: String,
    pub stamps_used: i32,
    pub reward_description: String,
    pub redemption_code: String,
    pub is_claimed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimed_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

/// A redemption row joined to the redeeming customer's display fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedemptionRecord {
    #[serde(flatten)]
    pub redemption: Redemption,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerProfile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedemptionStatus {
    Pending,
    Claimed,
    Expired,
}

impl RedemptionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Claimed => "claimed",
            Self::Expired => "expired",
        }
    }
}

impl Redemption {
    /// Claimed wins over expired: a code claimed before its expiry stays claimed.
    #[must_use]
    pub fn status_at(&self, now: DateTime<Utc>) -> RedemptionStatus {
        if self.is_claimed {
            RedemptionStatus::Claimed
        } else if self.expires_at < now {
            RedemptionStatus::Expired
        } else {
            RedemptionStatus::Pending
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CafeStats {
    pub total_stamps: i64,
    pub total_redemptions: i64,
    pub active_customers: i64,
    pub stamps_today: i64,
    pub stamps_this_week: i64,
    pub stamps_this_month: i64,
}
