//! Normalizes joined rows into the shapes the loyalty logic consumes.
//!
//! Stamp and redemption queries `LEFT JOIN customers`, so the customer columns
//! arrive as a nullable triple. Every query funnels them through
//! [`customer_profile`] instead of inspecting the columns at the call site.

use chrono::{DateTime, Utc};

use crate::types::{CustomerProfile, StampRecord};

/// The customer columns of a joined row, before normalization.
#[derive(Debug, Default, Clone)]
pub struct JoinedCustomer {
    /// `customers.id`; `None` when the join found no row.
    pub id: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
}

/// `None` when the join matched nothing. Blank fields become `None`.
#[must_use]
pub fn customer_profile(joined: JoinedCustomer) -> Option<CustomerProfile> {
    joined.id?;
    Some(CustomerProfile {
        name: non_blank(joined.name),
        phone: non_blank(joined.phone),
    })
}

#[must_use]
pub fn stamp_record(
    user_id: String,
    cafe_id: String,
    stamped_at: DateTime<Utc>,
    joined: JoinedCustomer,
) -> StampRecord {
    StampRecord {
        user_id,
        cafe_id,
        stamped_at,
        customer: customer_profile(joined),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmatched_join_has_no_profile() {
        let joined = JoinedCustomer {
            id: None,
            name: Some("ghost".to_string()),
            phone: None,
        };
        assert!(customer_profile(joined).is_none());
    }

    #[test]
    fn test_blank_fields_are_absent() {
        let joined = JoinedCustomer {
            id: Some("c-1".to_string()),
            name: Some("   ".to_string()),
            phone: Some(String::new()),
        };
        let profile = customer_profile(joined).unwrap();
        assert_eq!(profile, CustomerProfile::default());
    }

    #[test]
    fn test_stamp_record_keeps_fields() {
        let now = Utc::now();
        let record = stamp_record(
            "u-1".to_string(),
            "cafe-1".to_string(),
            now,
            JoinedCustomer {
                id: Some("u-1".to_string()),
                name: Some("Asha".to_string()),
                phone: Some("+91 98100 00000".to_string()),
            },
        );
        assert_eq!(record.user_id, "u-1");
        assert_eq!(record.stamped_at, now);
        let profile = record.customer.unwrap();
        assert_eq!(profile.name.as_deref(), Some("Asha"));
        assert_eq!(profile.phone.as_deref(), Some("+91 98100 00000"));
    }
}
