//! SQL schema for the Reel SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS campaigns (
    campaign_id INTEGER PRIMARY KEY,
    brand_id    INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS applications (
    campaign_id   INTEGER NOT NULL,
    influencer_id INTEGER NOT NULL,
    status        TEXT    NOT NULL,   -- 'pending' | 'approved' | 'brand_approved' | ...
    PRIMARY KEY (campaign_id, influencer_id)
);

-- One thread per (campaign, brand, influencer). The summary columns are a
-- cache recomputed on every commit.
CREATE TABLE IF NOT EXISTS threads (
    thread_id      INTEGER PRIMARY KEY AUTOINCREMENT,
    campaign_id    INTEGER NOT NULL,
    brand_id       INTEGER NOT NULL,
    influencer_id  INTEGER NOT NULL,
    latest_status  TEXT    NOT NULL DEFAULT 'open',
    latest_version INTEGER NOT NULL DEFAULT 0,
    verified       INTEGER NOT NULL DEFAULT 0,
    manual_used    INTEGER NOT NULL DEFAULT 0,
    platform_used  INTEGER NOT NULL DEFAULT 0,
    created_at     TEXT    NOT NULL,
    updated_at     TEXT    NOT NULL,
    UNIQUE (campaign_id, brand_id, influencer_id)
);

-- Content columns are written once. Only the review columns and
-- deleted_at are updated in place.
CREATE TABLE IF NOT EXISTS entries (
    entry_id        INTEGER PRIMARY KEY AUTOINCREMENT,
    thread_id       INTEGER NOT NULL REFERENCES threads(thread_id),
    parent_entry_id INTEGER REFERENCES entries(entry_id),  -- self for a chain root
    version         INTEGER NOT NULL,
    submitted_by    TEXT    NOT NULL,
    author_id       INTEGER NOT NULL,
    source          TEXT    NOT NULL,
    media_kind      TEXT    NOT NULL,
    metrics_json    TEXT    NOT NULL DEFAULT '{}',
    notes           TEXT,
    asset_json      TEXT,
    permalink       TEXT,
    status          TEXT    NOT NULL,
    reviewed_by     INTEGER,
    review_note     TEXT,
    reviewed_at     TEXT,
    created_at      TEXT    NOT NULL,
    deleted_at      TEXT,
    UNIQUE (thread_id, version)
);

CREATE TABLE IF NOT EXISTS comments (
    comment_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    thread_id   INTEGER NOT NULL REFERENCES threads(thread_id),
    author_role TEXT    NOT NULL,
    author_id   INTEGER NOT NULL,
    body        TEXT    NOT NULL,
    created_at  TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS threads_campaign_idx ON threads(campaign_id);
CREATE INDEX IF NOT EXISTS comments_thread_idx  ON comments(thread_id);

PRAGMA user_version = 1;
";
