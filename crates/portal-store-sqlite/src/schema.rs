//! SQL schema for the portal SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
///
/// Timestamps are fixed-width RFC 3339 UTC strings (microsecond precision,
/// `Z` suffix), so string comparison in SQL is chronological comparison.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,   -- lower-cased
    password_hash TEXT NOT NULL,          -- argon2 PHC string
    role          TEXT NOT NULL DEFAULT 'employee'
                  CHECK (role IN ('employee', 'manager', 'admin')),
    manager_id    TEXT REFERENCES users(id),
    created_at    TEXT NOT NULL
);

-- Rows are never deleted. Only the decision columns, status and updated_at
-- change after insert, and only while status is 'pending'.
CREATE TABLE IF NOT EXISTS requests (
    id            TEXT PRIMARY KEY,
    type          TEXT NOT NULL,
    title         TEXT NOT NULL,
    description   TEXT,
    status        TEXT NOT NULL DEFAULT 'pending'
                  CHECK (status IN ('pending', 'approved', 'rejected')),
    created_by    TEXT NOT NULL,
    assigned_to   TEXT,
    decision_by   TEXT,
    decision_note TEXT,
    start_at      TEXT,
    end_at        TEXT,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL,
    CHECK ((status = 'pending') = (decision_by IS NULL))
);

CREATE INDEX IF NOT EXISTS requests_overlap_idx
    ON requests(type, status, start_at, end_at);
CREATE INDEX IF NOT EXISTS requests_creator_idx
    ON requests(created_by, created_at);
CREATE INDEX IF NOT EXISTS requests_created_idx
    ON requests(created_at);

PRAGMA user_version = 1;
";
