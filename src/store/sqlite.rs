use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::Store;
use super::projection::{JoinedCustomer, customer_profile, stamp_record};
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

const OWNER_COLUMNS: &str = "id, email, name, phone, password_hash, created_at";
const TOKEN_COLUMNS: &str =
    "id, token_hash, token_lookup, is_admin, owner_id, created_at, expires_at, last_used_at";
const CAFE_COLUMNS: &str = "id, owner_id, name, address, city, latitude, longitude, logo_url, \
     nfc_tag_id, qr_code_url, stamps_required, reward_description, is_active, created_at";
const REDEMPTION_COLUMNS: &str = "id, user_id, cafe_id, stamps_used, reward_description, \
     redemption_code, is_claimed, created_at, claimed_at, expires_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // SQLite's own datetime('now') format
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
}

/// Reads a timestamp column. Unparseable text is a conversion error.
fn datetime_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    parse_datetime(&text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn opt_datetime_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(_) => datetime_at(row, idx).map(Some),
        None => Ok(None),
    }
}

/// Fixed-width UTC so that range filters can compare the stored text directly.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn owner_from_row(row: &Row<'_>) -> rusqlite::Result<Owner> {
    Ok(Owner {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        phone: row.get(3)?,
        password_hash: row.get(4)?,
        created_at: datetime_at(row, 5)?,
    })
}

fn token_from_row(row: &Row<'_>) -> rusqlite::Result<Token> {
    Ok(Token {
        id: row.get(0)?,
        token_hash: row.get(1)?,
        token_lookup: row.get(2)?,
        is_admin: row.get(3)?,
        owner_id: row.get(4)?,
        created_at: datetime_at(row, 5)?,
        expires_at: opt_datetime_at(row, 6)?,
        last_used_at: opt_datetime_at(row, 7)?,
    })
}

fn cafe_from_row(row: &Row<'_>) -> rusqlite::Result<Cafe> {
    Ok(Cafe {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        address: row.get(3)?,
        city: row.get(4)?,
        latitude: row.get(5)?,
        longitude: row.get(6)?,
        logo_url: row.get(7)?,
        nfc_tag_id: row.get(8)?,
        qr_code_url: row.get(9)?,
        stamps_required: row.get(10)?,
        reward_description: row.get(11)?,
        is_active: row.get(12)?,
        created_at: datetime_at(row, 13)?,
    })
}

fn redemption_from_row(row: &Row<'_>) -> rusqlite::Result<Redemption> {
    Ok(Redemption {
        id: row.get(0)?,
        user_id: row.get(1)?,
        cafe_id: row.get(2)?,
        stamps_used: row.get(3)?,
        reward_description: row.get(4)?,
        redemption_code: row.get(5)?,
        is_claimed: row.get(6)?,
        created_at: datetime_at(row, 7)?,
        claimed_at: opt_datetime_at(row, 8)?,
        expires_at: datetime_at(row, 9)?,
    })
}

/// Reads the three joined customer columns starting at `first`.
fn joined_customer(row: &Row<'_>, first: usize) -> rusqlite::Result<JoinedCustomer> {
    Ok(JoinedCustomer {
        id: row.get(first)?,
        name: row.get(first + 1)?,
        phone: row.get(first + 2)?,
    })
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Owner operations

    fn create_owner(&self, owner: &Owner) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO owners (id, email, name, phone, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                owner.id,
                owner.email,
                owner.name,
                owner.phone,
                owner.password_hash,
                format_datetime(&owner.created_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(Error::AlreadyExists),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_owner(&self, id: &str) -> Result<Option<Owner>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {OWNER_COLUMNS} FROM owners WHERE id = ?1"),
            params![id],
            owner_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_owner_by_email(&self, email: &str) -> Result<Option<Owner>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {OWNER_COLUMNS} FROM owners WHERE email = ?1"),
            params![email],
            owner_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_owners(&self, cursor: &str, limit: i32) -> Result<Vec<Owner>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {OWNER_COLUMNS} FROM owners WHERE id > ?1 ORDER BY id LIMIT ?2"
        ))?;

        let rows = stmt.query_map(params![cursor, limit], owner_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_owner(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM owners WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Token operations

    fn create_token(&self, token: &Token) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO tokens (id, token_hash, token_lookup, is_admin, owner_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                token.id,
                token.token_hash,
                token.token_lookup,
                token.is_admin,
                token.owner_id,
                format_datetime(&token.created_at),
                token.expires_at.as_ref().map(format_datetime),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(Error::TokenLookupCollision),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_token_by_id(&self, id: &str) -> Result<Option<Token>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {TOKEN_COLUMNS} FROM tokens WHERE id = ?1"),
            params![id],
            token_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {TOKEN_COLUMNS} FROM tokens WHERE token_lookup = ?1"),
            params![lookup],
            token_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_tokens(&self, cursor: &str, limit: i32) -> Result<Vec<Token>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens WHERE id > ?1 ORDER BY id LIMIT ?2"
        ))?;

        let rows = stmt.query_map(params![cursor, limit], token_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_owner_tokens(&self, owner_id: &str) -> Result<Vec<Token>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens WHERE owner_id = ?1 ORDER BY created_at DESC"
        ))?;

        let rows = stmt.query_map(params![owner_id], token_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_token(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM tokens WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn update_token_last_used(&self, id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE tokens SET last_used_at = ?1 WHERE id = ?2",
            params![format_datetime(&Utc::now()), id],
        )?;
        Ok(())
    }

    // Cafe operations

    fn create_cafe(&self, cafe: &Cafe) -> Result<()> {
        self.conn().execute(
            "INSERT INTO cafes (id, owner_id, name, address, city, latitude, longitude, logo_url,
                                nfc_tag_id, qr_code_url, stamps_required, reward_description,
                                is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                cafe.id,
                cafe.owner_id,
                cafe.name,
                cafe.address,
                cafe.city,
                cafe.latitude,
                cafe.longitude,
                cafe.logo_url,
                cafe.nfc_tag_id,
                cafe.qr_code_url,
                cafe.stamps_required,
                cafe.reward_description,
                cafe.is_active,
                format_datetime(&cafe.created_at),
            ],
        )?;
        Ok(())
    }

    fn get_cafe(&self, id: &str) -> Result<Option<Cafe>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {CAFE_COLUMNS} FROM cafes WHERE id = ?1"),
            params![id],
            cafe_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_cafe_by_owner(&self, owner_id: &str) -> Result<Option<Cafe>> {
        let conn = self.conn();
        conn.query_row(
            &format!(
                "SELECT {CAFE_COLUMNS} FROM cafes WHERE owner_id = ?1
                 ORDER BY created_at, id LIMIT 1"
            ),
            params![owner_id],
            cafe_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn update_cafe(&self, cafe: &Cafe) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE cafes SET name = ?1, address = ?2, city = ?3, latitude = ?4, longitude = ?5,
                              logo_url = ?6, qr_code_url = ?7, stamps_required = ?8,
                              reward_description = ?9, is_active = ?10
             WHERE id = ?11",
            params![
                cafe.name,
                cafe.address,
                cafe.city,
                cafe.latitude,
                cafe.longitude,
                cafe.logo_url,
                cafe.qr_code_url,
                cafe.stamps_required,
                cafe.reward_description,
                cafe.is_active,
                cafe.id,
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn set_cafe_nfc_tag(&self, id: &str, nfc_tag_id: Option<&str>) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE cafes SET nfc_tag_id = ?1 WHERE id = ?2",
            params![nfc_tag_id, id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    // Customer operations

    fn create_customer(&self, customer: &Customer) -> Result<()> {
        self.conn().execute(
            "INSERT INTO customers (id, name, phone, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                customer.id,
                customer.name,
                customer.phone,
                format_datetime(&customer.created_at),
            ],
        )?;
        Ok(())
    }

    fn get_customer(&self, id: &str) -> Result<Option<Customer>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, phone, created_at FROM customers WHERE id = ?1",
            params![id],
            |row| {
                Ok(Customer {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    phone: row.get(2)?,
                    created_at: datetime_at(row, 3)?,
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    // Stamp operations

    fn create_stamp(&self, stamp: &StampEvent) -> Result<()> {
        self.conn().execute(
            "INSERT INTO stamps (id, user_id, cafe_id, stamped_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                stamp.id,
                stamp.user_id,
                stamp.cafe_id,
                format_datetime(&stamp.stamped_at),
            ],
        )?;
        Ok(())
    }

    fn list_cafe_stamps(&self, cafe_id: &str) -> Result<Vec<StampRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT s.user_id, s.cafe_id, s.stamped_at, c.id, c.name, c.phone
             FROM stamps s
             LEFT JOIN customers c ON c.id = s.user_id
             WHERE s.cafe_id = ?1
             ORDER BY s.stamped_at DESC",
        )?;

        let rows = stmt.query_map(params![cafe_id], |row| {
            Ok(stamp_record(
                row.get(0)?,
                row.get(1)?,
                datetime_at(row, 2)?,
                joined_customer(row, 3)?,
            ))
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Redemption operations

    fn create_redemption(&self, redemption: &Redemption) -> Result<()> {
        self.conn().execute(
            "INSERT INTO redemptions (id, user_id, cafe_id, stamps_used, reward_description,
                                      redemption_code, is_claimed, created_at, claimed_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                redemption.id,
                redemption.user_id,
                redemption.cafe_id,
                redemption.stamps_used,
                redemption.reward_description,
                redemption.redemption_code,
                redemption.is_claimed,
                format_datetime(&redemption.created_at),
                redemption.claimed_at.as_ref().map(format_datetime),
                format_datetime(&redemption.expires_at),
            ],
        )?;
        Ok(())
    }

    fn find_redemption_by_code(&self, cafe_id: &str, code: &str) -> Result<Option<Redemption>> {
        let conn = self.conn();
        conn.query_row(
            &format!(
                "SELECT {REDEMPTION_COLUMNS} FROM redemptions
                 WHERE cafe_id = ?1 AND redemption_code = ?2 COLLATE NOCASE
                 ORDER BY created_at DESC LIMIT 1"
            ),
            params![cafe_id, code],
            redemption_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_cafe_redemptions(&self, cafe_id: &str, limit: i32) -> Result<Vec<RedemptionRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT r.id, r.user_id, r.cafe_id, r.stamps_used, r.reward_description,
                    r.redemption_code, r.is_claimed, r.created_at, r.claimed_at, r.expires_at,
                    c.id, c.name, c.phone
             FROM redemptions r
             LEFT JOIN customers c ON c.id = r.user_id
             WHERE r.cafe_id = ?1
             ORDER BY r.created_at DESC
             LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![cafe_id, limit], |row| {
            Ok(RedemptionRecord {
                redemption: redemption_from_row(row)?,
                customer: customer_profile(joined_customer(row, 10)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn claim_redemption(&self, id: &str, claimed_at: DateTime<Utc>) -> Result<bool> {
        let rows = self.conn().execute(
            "UPDATE redemptions SET is_claimed = 1, claimed_at = ?1
             WHERE id = ?2 AND is_claimed = 0",
            params![format_datetime(&claimed_at), id],
        )?;
        Ok(rows > 0)
    }

    // Aggregations

    fn cafe_stats(&self, cafe_id: &str, now: DateTime<Utc>) -> Result<CafeStats> {
        let start_of_day = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map_or(now, |midnight| midnight.and_utc());
        let week_ago = now - Duration::days(7);
        let month_ago = now - Duration::days(30);

        let conn = self.conn();
        conn.query_row(
            "SELECT
                (SELECT COUNT(*) FROM stamps WHERE cafe_id = ?1),
                (SELECT COUNT(*) FROM redemptions WHERE cafe_id = ?1),
                (SELECT COUNT(DISTINCT user_id) FROM stamps WHERE cafe_id = ?1 AND stamped_at >= ?4),
                (SELECT COUNT(*) FROM stamps WHERE cafe_id = ?1 AND stamped_at >= ?2),
                (SELECT COUNT(*) FROM stamps WHERE cafe_id = ?1 AND stamped_at >= ?3),
                (SELECT COUNT(*) FROM stamps WHERE cafe_id = ?1 AND stamped_at >= ?4)",
            params![
                cafe_id,
                format_datetime(&start_of_day),
                format_datetime(&week_ago),
                format_datetime(&month_ago),
            ],
            |row| {
                Ok(CafeStats {
                    total_stamps: row.get(0)?,
                    total_redemptions: row.get(1)?,
                    active_customers: row.get(2)?,
                    stamps_today: row.get(3)?,
                    stamps_this_week: row.get(4)?,
                    stamps_this_month: row.get(5)?,
                })
            },
        )
        .map_err(Error::from)
    }

    fn has_admin_token(&self) -> Result<bool> {
        let conn = self.conn();
        let count: i32 = conn.query_row(
            "SELECT COUNT(*) FROM tokens WHERE is_admin = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn open_store(temp: &TempDir) -> SqliteStore {
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        store
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    fn seed_cafe(store: &SqliteStore) -> Cafe {
        let owner = Owner {
            id: "owner-1".to_string(),
            email: "owner@example.com".to_string(),
            name: None,
            phone: None,
            password_hash: None,
            created_at: at(1, 0),
        };
        store.create_owner(&owner).unwrap();

        let cafe = Cafe {
            id: "cafe-1".to_string(),
            owner_id: owner.id,
            name: "Blue Tokai".to_string(),
            address: None,
            city: Some("Delhi".to_string()),
            latitude: None,
            longitude: None,
            logo_url: None,
            nfc_tag_id: None,
            qr_code_url: None,
            stamps_required: 10,
            reward_description: "Free coffee".to_string(),
            is_active: true,
            created_at: at(1, 1),
        };
        store.create_cafe(&cafe).unwrap();
        cafe
    }

    fn seed_customer(store: &SqliteStore, id: &str, name: Option<&str>) {
        store
            .create_customer(&Customer {
                id: id.to_string(),
                name: name.map(str::to_string),
                phone: Some(format!("+91-{id}")),
                created_at: at(1, 0),
            })
            .unwrap();
    }

    fn stamp(store: &SqliteStore, id: &str, user_id: &str, stamped_at: DateTime<Utc>) {
        store
            .create_stamp(&StampEvent {
                id: id.to_string(),
                user_id: user_id.to_string(),
                cafe_id: "cafe-1".to_string(),
                stamped_at,
            })
            .unwrap();
    }

    fn redemption(id: &str, code: &str, created_at: DateTime<Utc>) -> Redemption {
        Redemption {
            id: id.to_string(),
            user_id: "alice".to_string(),
            cafe_id: "cafe-1".to_string(),
            stamps_used: 10,
            reward_description: "Free coffee".to_string(),
            redemption_code: code.to_string(),
            is_claimed: false,
            created_at,
            claimed_at: None,
            expires_at: created_at + Duration::days(1),
        }
    }

    #[test]
    fn test_initialize_creates_tables() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let conn = store.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        for table in ["owners", "tokens", "cafes", "customers", "stamps", "redemptions"] {
            assert!(tables.contains(&table.to_string()), "missing {table}");
        }
    }

    #[test]
    fn test_owner_crud_and_duplicate_email() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let owner = Owner {
            id: "owner-1".to_string(),
            email: "owner@example.com".to_string(),
            name: Some("Rhea".to_string()),
            phone: None,
            password_hash: Some("hash".to_string()),
            created_at: Utc::now(),
        };
        store.create_owner(&owner).unwrap();

        let fetched = store.get_owner("owner-1").unwrap().unwrap();
        assert_eq!(fetched.email, "owner@example.com");
        assert_eq!(fetched.password_hash.as_deref(), Some("hash"));

        let by_email = store
            .get_owner_by_email("owner@example.com")
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, "owner-1");

        let duplicate = Owner {
            id: "owner-2".to_string(),
            ..owner
        };
        assert!(matches!(
            store.create_owner(&duplicate),
            Err(Error::AlreadyExists)
        ));

        assert!(store.delete_owner("owner-1").unwrap());
        assert!(store.get_owner("owner-1").unwrap().is_none());
    }

    #[test]
    fn test_token_lookup_collision() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let token1 = Token {
            id: "token-1".to_string(),
            token_hash: "hash1".to_string(),
            token_lookup: "lookup123".to_string(),
            is_admin: true,
            owner_id: None,
            created_at: Utc::now(),
            expires_at: None,
            last_used_at: None,
        };
        store.create_token(&token1).unwrap();

        let token2 = Token {
            id: "token-2".to_string(),
            token_hash: "hash2".to_string(),
            ..token1
        };

        let result = store.create_token(&token2);
        assert!(matches!(result, Err(Error::TokenLookupCollision)));
        assert!(store.has_admin_token().unwrap());
    }

    #[test]
    fn test_cafe_by_owner_and_settings() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let mut cafe = seed_cafe(&store);

        let found = store.get_cafe_by_owner("owner-1").unwrap().unwrap();
        assert_eq!(found.id, "cafe-1");
        assert!(store.get_cafe_by_owner("nobody").unwrap().is_none());

        cafe.stamps_required = 8;
        cafe.reward_description = "Free Americano".to_string();
        store.update_cafe(&cafe).unwrap();
        store.set_cafe_nfc_tag("cafe-1", Some("04:A2:19")).unwrap();

        let updated = store.get_cafe("cafe-1").unwrap().unwrap();
        assert_eq!(updated.stamps_required, 8);
        assert_eq!(updated.reward_description, "Free Americano");
        assert_eq!(updated.nfc_tag_id.as_deref(), Some("04:A2:19"));

        store.set_cafe_nfc_tag("cafe-1", None).unwrap();
        assert!(store.get_cafe("cafe-1").unwrap().unwrap().nfc_tag_id.is_none());

        assert!(matches!(
            store.set_cafe_nfc_tag("missing", None),
            Err(Error::NotFound)
        ));
    }

    #[test]
    fn test_cafe_stamps_join_customers() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        seed_cafe(&store);
        seed_customer(&store, "alice", Some("Alice"));
        seed_customer(&store, "bob", None);

        stamp(&store, "s-1", "alice", at(1, 9));
        stamp(&store, "s-2", "bob", at(2, 9));
        stamp(&store, "s-3", "alice", at(3, 9));

        let records = store.list_cafe_stamps("cafe-1").unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].stamped_at, at(3, 9));
        assert_eq!(records[2].stamped_at, at(1, 9));

        let alice = records[0].customer.as_ref().unwrap();
        assert_eq!(alice.name.as_deref(), Some("Alice"));
        let bob = records[1].customer.as_ref().unwrap();
        assert!(bob.name.is_none());
        assert_eq!(bob.phone.as_deref(), Some("+91-bob"));

        let stored = store.get_customer("alice").unwrap().unwrap();
        assert_eq!(stored.name.as_deref(), Some("Alice"));
        assert!(store.get_customer("nobody").unwrap().is_none());
    }

    #[test]
    fn test_find_redemption_prefers_newest_code() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        seed_cafe(&store);
        seed_customer(&store, "alice", Some("Alice"));

        store
            .create_redemption(&redemption("r-old", "AB12CD", at(1, 9)))
            .unwrap();
        store
            .create_redemption(&redemption("r-new", "AB12CD", at(5, 9)))
            .unwrap();

        let found = store
            .find_redemption_by_code("cafe-1", "AB12CD")
            .unwrap()
            .unwrap();
        assert_eq!(found.id, "r-new");
        assert!(store
            .find_redemption_by_code("cafe-1", "ZZZZZZ")
            .unwrap()
            .is_none());
        assert!(store
            .find_redemption_by_code("other-cafe", "AB12CD")
            .unwrap()
            .is_none());

        store
            .create_redemption(&redemption("r-mixed", "xY34zw", at(2, 9)))
            .unwrap();
        let found = store
            .find_redemption_by_code("cafe-1", "XY34ZW")
            .unwrap()
            .unwrap();
        assert_eq!(found.id, "r-mixed");
        assert_eq!(found.redemption_code, "xY34zw");

        let listed = store.list_cafe_redemptions("cafe-1", 1).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].redemption.id, "r-new");
        assert_eq!(
            listed[0].customer.as_ref().unwrap().name.as_deref(),
            Some("Alice")
        );
    }

    #[test]
    fn test_claim_redemption_is_compare_and_set() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        seed_cafe(&store);
        seed_customer(&store, "alice", Some("Alice"));
        store
            .create_redemption(&redemption("r-1", "AB12CD", at(1, 9)))
            .unwrap();

        assert!(store.claim_redemption("r-1", at(1, 10)).unwrap());
        assert!(!store.claim_redemption("r-1", at(1, 11)).unwrap());
        assert!(!store.claim_redemption("missing", at(1, 11)).unwrap());

        let claimed = store
            .find_redemption_by_code("cafe-1", "AB12CD")
            .unwrap()
            .unwrap();
        assert!(claimed.is_claimed);
        assert_eq!(claimed.claimed_at, Some(at(1, 10)));
    }

    #[test]
    fn test_unreadable_timestamp_is_an_error() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        seed_cafe(&store);
        seed_customer(&store, "alice", Some("Alice"));
        store
            .create_redemption(&redemption("r-1", "AB12CD", at(1, 9)))
            .unwrap();

        store
            .conn()
            .execute(
                "UPDATE redemptions SET expires_at = '2024-01-02 09:00:00' WHERE id = 'r-1'",
                [],
            )
            .unwrap();
        let found = store
            .find_redemption_by_code("cafe-1", "AB12CD")
            .unwrap()
            .unwrap();
        assert_eq!(found.expires_at, at(2, 9));

        store
            .conn()
            .execute(
                "UPDATE redemptions SET expires_at = 'tomorrow' WHERE id = 'r-1'",
                [],
            )
            .unwrap();
        assert!(matches!(
            store.find_redemption_by_code("cafe-1", "AB12CD"),
            Err(Error::Database(_))
        ));
    }

    #[test]
    fn test_cafe_stats_windows() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        seed_cafe(&store);
        seed_customer(&store, "alice", Some("Alice"));
        seed_customer(&store, "bob", None);
        seed_customer(&store, "carol", None);

        let now = Utc.with_ymd_and_hms(2024, 3, 31, 15, 0, 0).unwrap();
        stamp(&store, "s-1", "alice", now - Duration::hours(1));
        stamp(&store, "s-2", "alice", now - Duration::days(3));
        stamp(&store, "s-3", "bob", now - Duration::days(10));
        stamp(&store, "s-4", "carol", now - Duration::days(45));
        store
            .create_redemption(&redemption("r-1", "AB12CD", now - Duration::days(2)))
            .unwrap();

        let stats = store.cafe_stats("cafe-1", now).unwrap();
        assert_eq!(
            stats,
            CafeStats {
                total_stamps: 4,
                total_redemptions: 1,
                active_customers: 2,
                stamps_today: 1,
                stamps_this_week: 2,
                stamps_this_month: 3,
            }
        );

        let empty = store.cafe_stats("other-cafe", now).unwrap();
        assert_eq!(empty, CafeStats::default());
    }
}
