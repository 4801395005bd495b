//! SQL schema for the Ringline SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS pools (
    pool_id            TEXT PRIMARY KEY,
    company_id         TEXT NOT NULL,
    name               TEXT NOT NULL,
    category           TEXT NOT NULL,   -- 'online' | 'offline'
    sub_category       TEXT,
    active             INTEGER NOT NULL DEFAULT 1,
    recording_enabled  INTEGER NOT NULL DEFAULT 0,
    audio_clip_id      TEXT,
    whisper            TEXT,            -- JSON WhisperConfig or NULL
    forward_to         TEXT,
    forwarding_targets TEXT NOT NULL DEFAULT '[]',
    swap_rules         TEXT NOT NULL DEFAULT '[]'
);

-- last_assigned_at is written only through the guarded claim UPDATE;
-- removal is soft so historical calls keep resolving.
CREATE TABLE IF NOT EXISTS numbers (
    number_id          TEXT PRIMARY KEY,
    company_id         TEXT NOT NULL,
    digits             TEXT NOT NULL,   -- national-significant digits
    country_code       TEXT NOT NULL,
    category           TEXT NOT NULL,
    sub_category       TEXT,
    pool_id            TEXT REFERENCES pools(pool_id),
    recording_enabled  INTEGER NOT NULL DEFAULT 0,
    audio_clip_id      TEXT,
    whisper            TEXT,
    forward_to         TEXT,
    forwarding_targets TEXT NOT NULL DEFAULT '[]',
    swap_rules         TEXT NOT NULL DEFAULT '[]',
    last_assigned_at   TEXT,            -- RFC 3339 UTC, microseconds
    removed_at         TEXT,
    UNIQUE (country_code, digits)
);

CREATE TABLE IF NOT EXISTS sessions (
    session_id TEXT PRIMARY KEY,
    visitor_id TEXT NOT NULL,
    company_id TEXT NOT NULL,
    number_id  TEXT REFERENCES numbers(number_id),
    device     TEXT NOT NULL,           -- JSON DeviceInfo
    entry_url  TEXT,
    token      TEXT NOT NULL,
    started_at TEXT NOT NULL,
    ended_at   TEXT                     -- one-way transition
);

-- Session events are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS session_events (
    event_id    TEXT PRIMARY KEY,
    session_id  TEXT NOT NULL REFERENCES sessions(session_id),
    kind        TEXT NOT NULL,          -- 'started' | 'ended'
    recorded_at TEXT NOT NULL
);

-- Calls are never deleted; completion fields are written at most once.
CREATE TABLE IF NOT EXISTS calls (
    call_id          TEXT PRIMARY KEY,
    provider_call_id TEXT NOT NULL UNIQUE,
    caller_digits    TEXT NOT NULL,
    dialed_digits    TEXT NOT NULL,
    number_id        TEXT NOT NULL REFERENCES numbers(number_id),
    pool_id          TEXT,
    session_id       TEXT,
    recorded         INTEGER NOT NULL DEFAULT 0,
    started_at       TEXT NOT NULL,
    duration_secs    INTEGER,
    final_status     TEXT
);

CREATE TABLE IF NOT EXISTS campaigns (
    campaign_id  TEXT PRIMARY KEY,
    company_id   TEXT NOT NULL,
    name         TEXT NOT NULL,
    activated_at TEXT,
    suspended    INTEGER NOT NULL DEFAULT 0,
    ends_at      TEXT
);

CREATE TABLE IF NOT EXISTS campaign_numbers (
    campaign_id TEXT NOT NULL REFERENCES campaigns(campaign_id),
    number_id   TEXT NOT NULL REFERENCES numbers(number_id),
    PRIMARY KEY (campaign_id, number_id)
);

CREATE TABLE IF NOT EXISTS campaign_pools (
    campaign_id TEXT NOT NULL REFERENCES campaigns(campaign_id),
    pool_id     TEXT NOT NULL REFERENCES pools(pool_id),
    PRIMARY KEY (campaign_id, pool_id)
);

CREATE INDEX IF NOT EXISTS numbers_pool_idx     ON numbers(pool_id);
CREATE INDEX IF NOT EXISTS numbers_company_idx  ON numbers(company_id, category);
CREATE INDEX IF NOT EXISTS sessions_visitor_idx ON sessions(visitor_id, started_at);
CREATE INDEX IF NOT EXISTS sessions_number_idx  ON sessions(number_id);
CREATE INDEX IF NOT EXISTS events_session_idx   ON session_events(session_id);

PRAGMA user_version = 1;
";
