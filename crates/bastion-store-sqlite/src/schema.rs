//! SQL schema for the Bastion SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS accounts (
    account_id    TEXT PRIMARY KEY,
    account_name  TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    account_kind  TEXT NOT NULL DEFAULT 'VISITOR',  -- 'VISITOR' | 'ADMIN'
    registered_at TEXT NOT NULL,                    -- RFC 3339 UTC
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS substances (
    substance_id TEXT PRIMARY KEY,
    name         TEXT NOT NULL UNIQUE,
    description  TEXT,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS executors (
    uid        TEXT PRIMARY KEY,
    name       TEXT NOT NULL UNIQUE,
    job        TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tasks (
    task_id      TEXT PRIMARY KEY,
    title        TEXT NOT NULL UNIQUE,
    content      TEXT NOT NULL,
    reward       INTEGER NOT NULL DEFAULT 0,
    rate         INTEGER NOT NULL DEFAULT 1,
    level        TEXT NOT NULL DEFAULT 'NORMAL',
    accomplished INTEGER NOT NULL DEFAULT 0,
    available    INTEGER NOT NULL DEFAULT 1,
    substance_id TEXT REFERENCES substances(substance_id),
    assignee_id  TEXT REFERENCES executors(uid),
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS tasks_assignee_idx  ON tasks(assignee_id);
CREATE INDEX IF NOT EXISTS tasks_substance_idx ON tasks(substance_id);

PRAGMA user_version = 1;
";
