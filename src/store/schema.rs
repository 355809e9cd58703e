pub const SCHEMA: &str = r#"
-- Cafe owners sign in to the dashboard
CREATE TABLE IF NOT EXISTS owners (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    name TEXT,
    phone TEXT,
    password_hash TEXT,             -- argon2id, NULL for owners without a password login
    created_at TEXT DEFAULT (datetime('now'))
);

-- Tokens are auth credentials; non-admin tokens must belong to an owner
CREATE TABLE IF NOT EXISTS tokens (
    id TEXT PRIMARY KEY,
    token_hash TEXT NOT NULL,          -- argon2id hash with embedded salt
    token_lookup TEXT NOT NULL,        -- first 8 chars of ID for fast lookup
    is_admin INTEGER NOT NULL DEFAULT 0,

    owner_id TEXT REFERENCES owners(id) ON DELETE CASCADE,

    created_at TEXT DEFAULT (datetime('now')),
    expires_at TEXT,            -- NULL = never
    last_used_at TEXT
);

-- One loyalty program per cafe
CREATE TABLE IF NOT EXISTS cafes (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL REFERENCES owners(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    address TEXT,
    city TEXT,
    latitude REAL,
    longitude REAL,
    logo_url TEXT,
    nfc_tag_id TEXT,
    qr_code_url TEXT,
    stamps_required INTEGER NOT NULL DEFAULT 10,
    reward_description TEXT NOT NULL DEFAULT 'Free coffee',
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Customers collecting stamps through the app
CREATE TABLE IF NOT EXISTS customers (
    id TEXT PRIMARY KEY,
    name TEXT,
    phone TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Stamps are append-only
CREATE TABLE IF NOT EXISTS stamps (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES customers(id) ON DELETE CASCADE,
    cafe_id TEXT NOT NULL REFERENCES cafes(id) ON DELETE CASCADE,
    stamped_at TEXT NOT NULL
);

-- Redemptions are claimed at most once and never deleted
CREATE TABLE IF NOT EXISTS redemptions (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES customers(id) ON DELETE CASCADE,
    cafe_id TEXT NOT NULL REFERENCES cafes(id) ON DELETE CASCADE,
    stamps_used INTEGER NOT NULL,
    reward_description TEXT NOT NULL,
    redemption_code TEXT NOT NULL COLLATE NOCASE,
    is_claimed INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    claimed_at TEXT,
    expires_at TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_tokens_lookup ON tokens(token_lookup);
CREATE INDEX IF NOT EXISTS idx_tokens_owner ON tokens(owner_id);
CREATE INDEX IF NOT EXISTS idx_cafes_owner ON cafes(owner_id);
CREATE INDEX IF NOT EXISTS idx_stamps_cafe ON stamps(cafe_id, stamped_at);
CREATE INDEX IF NOT EXISTS idx_stamps_user ON stamps(user_id);
CREATE INDEX IF NOT EXISTS idx_redemptions_cafe_code ON redemptions(cafe_id, redemption_code COLLATE NOCASE);
CREATE INDEX IF NOT EXISTS idx_redemptions_cafe_created ON redemptions(cafe_id, created_at);
"#;
