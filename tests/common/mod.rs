//! In-process test harness: a router over a temp SQLite database and a clock
//! that only moves when a test says so.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use stampbook::auth::issue_token;
use stampbook::clock::FixedClock;
use stampbook::config::ServerConfig;
use stampbook::server::{AppState, create_router};
use stampbook::store::{SqliteStore, Store};
use stampbook::types::{Customer, Owner, Redemption, StampEvent};

pub fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub struct TestApp {
    _temp_dir: TempDir,
    pub store: Arc<SqliteStore>,
    pub clock: Arc<FixedClock>,
    pub router: Router,
    pub admin_token: String,
}

impl TestApp {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let config = ServerConfig {
            data_dir: temp_dir.path().to_path_buf(),
            ..ServerConfig::default()
        };

        let store = Arc::new(SqliteStore::new(config.db_path()).expect("open store"));
        store.initialize().expect("initialize store");

        let clock = Arc::new(FixedClock::new(noon()));
        let (_, admin_token) =
            issue_token(store.as_ref(), None, noon(), None).expect("admin token");

        let state = Arc::new(AppState {
            store: store.clone(),
            clock: clock.clone(),
            config,
        });

        Self {
            _temp_dir: temp_dir,
            store,
            clock,
            router: create_router(state),
            admin_token,
        }
    }

    pub async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");

        (status, headers, bytes.to_vec())
    }

    /// Sends a request and parses the JSON envelope. Empty bodies become `Null`.
    pub async fn json(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, _, bytes) = self.send(method, path, token, body).await;
        if bytes.is_empty() {
            return (status, Value::Null);
        }
        (status, serde_json::from_slice(&bytes).expect("JSON body"))
    }

    pub async fn get(&self, path: &str, token: &str) -> (StatusCode, Value) {
        self.json(Method::GET, path, Some(token), None).await
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.json(Method::POST, path, Some(token), Some(body)).await
    }

    /// Creates a token-only owner directly in the store.
    pub fn seed_owner(&self, email: &str) -> (Owner, String) {
        let owner = Owner {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            name: None,
            phone: None,
            password_hash: None,
            created_at: noon(),
        };
        self.store.create_owner(&owner).expect("create owner");
        let (_, token) =
            issue_token(self.store.as_ref(), Some(&owner.id), noon(), None).expect("owner token");
        (owner, token)
    }

    /// Runs cafe setup through the API and returns the cafe id.
    pub async fn setup_cafe(&self, token: &str, name: &str) -> String {
        let (status, body) = self
            .post("/api/v1/cafe", token, serde_json::json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_str().expect("cafe id").to_string()
    }

    pub fn seed_customer(&self, name: Option<&str>, phone: Option<&str>) -> String {
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: name.map(str::to_string),
            phone: phone.map(str::to_string),
            created_at: noon(),
        };
        self.store.create_customer(&customer).expect("create customer");
        customer.id
    }

    pub fn seed_stamp(&self, user_id: &str, cafe_id: &str, stamped_at: DateTime<Utc>) {
        self.store
            .create_stamp(&StampEvent {
                id: Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                cafe_id: cafe_id.to_string(),
                stamped_at,
            })
            .expect("create stamp");
    }

    pub fn seed_redemption(
        &self,
        user_id: &str,
        cafe_id: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> String {
        let redemption = Redemption {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            cafe_id: cafe_id.to_string(),
            stamps_used: 10,
            reward_description: "Free coffee".to_string(),
            redemption_code: code.to_string(),
            is_claimed: false,
            created_at: noon() - chrono::Duration::hours(1),
            claimed_at: None,
            expires_at,
        };
        self.store
            .create_redemption(&redemption)
            .expect("create redemption");
        redemption.id
    }
}
