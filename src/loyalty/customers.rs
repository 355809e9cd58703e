use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::{LoyaltyError, owner_cafe};
use crate::clock::Clock;
use crate::store::Store;
use crate::types::{Cafe, CustomerSummary, StampRecord};

/// Shown in place of a phone number the customer never shared.
pub const UNKNOWN_PHONE: &str = "Unknown";

/// Used for progress when a cafe has no usable stamp requirement.
const FALLBACK_STAMPS_REQUIRED: u32 = 10;

const ACTIVE_WINDOW_DAYS: i64 = 7;

/// Reduces a cafe's stamp records to one summary per customer, most recent
/// visit first.
///
/// Name and phone come from the first record seen for a customer. Customers
/// with equal `last_visit` keep the order in which they were first seen.
#[must_use]
pub fn aggregate_customers(records: &[StampRecord]) -> Vec<CustomerSummary> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut summaries: Vec<CustomerSummary> = Vec::new();

    for record in records {
        if let Some(&i) = index.get(record.user_id.as_str()) {
            let summary = &mut summaries[i];
            summary.stamp_count += 1;
            if record.stamped_at > summary.last_visit {
                summary.last_visit = record.stamped_at;
            }
            continue;
        }

        let profile = record.customer.as_ref();
        index.insert(record.user_id.as_str(), summaries.len());
        summaries.push(CustomerSummary {
            user_id: record.user_id.clone(),
            user_name: profile.and_then(|p| p.name.clone()),
            user_phone: profile
                .and_then(|p| p.phone.clone())
                .unwrap_or_else(|| UNKNOWN_PHONE.to_string()),
            stamp_count: 1,
            last_visit: record.stamped_at,
        });
    }

    summaries.sort_by(|a, b| b.last_visit.cmp(&a.last_visit));
    summaries
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CustomerTotals {
    pub total_customers: usize,
    pub total_stamps: u64,
    pub active_this_week: usize,
}

impl CustomerTotals {
    /// `active_this_week` counts customers whose last visit is strictly after
    /// `now - 7 days`.
    #[must_use]
    pub fn from_summaries(summaries: &[CustomerSummary], now: DateTime<Utc>) -> Self {
        let week_ago = now - Duration::days(ACTIVE_WINDOW_DAYS);
        Self {
            total_customers: summaries.len(),
            total_stamps: summaries.iter().map(|s| u64::from(s.stamp_count)).sum(),
            active_this_week: summaries
                .iter()
                .filter(|s| s.last_visit > week_ago)
                .count(),
        }
    }
}

/// Percentage of the stamp card filled, capped at 100.
#[must_use]
pub fn progress_percent(stamp_count: u32, stamps_required: i32) -> u32 {
    let required = u32::try_from(stamps_required)
        .ok()
        .filter(|r| *r > 0)
        .unwrap_or(FALLBACK_STAMPS_REQUIRED);
    (stamp_count.saturating_mul(100) / required).min(100)
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerView {
    #[serde(flatten)]
    pub summary: CustomerSummary,
    pub progress_percent: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerOverview {
    pub cafe: Cafe,
    pub customers: Vec<CustomerView>,
    pub totals: CustomerTotals,
}

/// Loads and aggregates the customers of the cafe `owner_id` manages.
pub fn load_customers(
    store: &dyn Store,
    owner_id: &str,
    clock: &dyn Clock,
) -> Result<CustomerOverview, LoyaltyError> {
    let cafe = owner_cafe(store, owner_id)?;
    let records = store.list_cafe_stamps(&cafe.id)?;
    let summaries = aggregate_customers(&records);
    let totals = CustomerTotals::from_summaries(&summaries, clock.now());

    tracing::debug!(
        cafe_id = %cafe.id,
        stamps = records.len(),
        customers = summaries.len(),
        "aggregated customers"
    );

    let customers = summaries
        .into_iter()
        .map(|summary| CustomerView {
            progress_percent: progress_percent(summary.stamp_count, cafe.stamps_required),
            summary,
        })
        .collect();

    Ok(CustomerOverview {
        cafe,
        customers,
        totals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CustomerProfile;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 10, 0, 0).unwrap()
    }

    fn record(user: &str, stamped_at: DateTime<Utc>) -> StampRecord {
        StampRecord {
            user_id: user.to_string(),
            cafe_id: "cafe-1".to_string(),
            stamped_at,
            customer: Some(CustomerProfile {
                name: Some(format!("{user}-name")),
                phone: Some(format!("{user}-phone")),
            }),
        }
    }

    #[test]
    fn test_empty_input_yields_no_customers() {
        assert!(aggregate_customers(&[]).is_empty());
    }

    #[test]
    fn test_alice_and_bob_scenario() {
        let records = vec![
            record("alice", day(1)),
            record("alice", day(3)),
            record("bob", day(2)),
        ];

        let summaries = aggregate_customers(&records);

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].user_id, "alice");
        assert_eq!(summaries[0].stamp_count, 2);
        assert_eq!(summaries[0].last_visit, day(3));
        assert_eq!(summaries[1].user_id, "bob");
        assert_eq!(summaries[1].stamp_count, 1);
        assert_eq!(summaries[1].last_visit, day(2));
    }

    #[test]
    fn test_counts_and_last_visit_match_input() {
        let records = vec![
            record("carol", day(5)),
            record("dave", day(9)),
            record("carol", day(2)),
            record("erin", day(1)),
            record("carol", day(7)),
            record("dave", day(4)),
        ];

        let summaries = aggregate_customers(&records);
        assert_eq!(summaries.len(), 3);

        for summary in &summaries {
            let mine: Vec<_> = records
                .iter()
                .filter(|r| r.user_id == summary.user_id)
                .collect();
            assert_eq!(summary.stamp_count as usize, mine.len());
            assert_eq!(
                Some(summary.last_visit),
                mine.iter().map(|r| r.stamped_at).max()
            );
        }

        assert!(
            summaries
                .windows(2)
                .all(|pair| pair[0].last_visit >= pair[1].last_visit)
        );
    }

    #[test]
    fn test_input_order_does_not_change_result() {
        let records = vec![
            record("alice", day(1)),
            record("bob", day(6)),
            record("alice", day(8)),
            record("carol", day(3)),
            record("bob", day(2)),
        ];
        let mut reversed = records.clone();
        reversed.reverse();

        assert_eq!(aggregate_customers(&records), aggregate_customers(&reversed));
    }

    #[test]
    fn test_first_occurrence_wins_for_display_fields() {
        let mut later = record("alice", day(9));
        later.customer = Some(CustomerProfile {
            name: Some("Renamed".to_string()),
            phone: Some("000".to_string()),
        });
        let records = vec![record("alice", day(1)), later];

        let summaries = aggregate_customers(&records);
        assert_eq!(summaries[0].user_name.as_deref(), Some("alice-name"));
        assert_eq!(summaries[0].user_phone, "alice-phone");
        assert_eq!(summaries[0].last_visit, day(9));
    }

    #[test]
    fn test_missing_profile_defaults() {
        let mut anonymous = record("ghost", day(1));
        anonymous.customer = None;

        let summaries = aggregate_customers(&[anonymous]);
        assert!(summaries[0].user_name.is_none());
        assert_eq!(summaries[0].user_phone, UNKNOWN_PHONE);
    }

    #[test]
    fn test_totals_use_strict_week_boundary() {
        let now = day(15);
        let summaries = aggregate_customers(&[
            record("alice", now - Duration::days(7)),
            record("bob", now - Duration::days(7) + Duration::seconds(1)),
            record("bob", now - Duration::days(20)),
            record("carol", now - Duration::hours(1)),
        ]);

        let totals = CustomerTotals::from_summaries(&summaries, now);
        assert_eq!(
            totals,
            CustomerTotals {
                total_customers: 3,
                total_stamps: 4,
                active_this_week: 2,
            }
        );
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(0, 10), 0);
        assert_eq!(progress_percent(5, 10), 50);
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(14, 10), 100);
        assert_eq!(progress_percent(5, 0), 50);
        assert_eq!(progress_percent(5, -4), 50);
    }
}
