//! SQLite schema

/// Idempotent schema creation
///
/// Array columns of `automations` hold JSON text. Timestamps are unix
/// microseconds so ordering is numeric.
pub(crate) const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS homes (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    created_at  INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS rooms (
    id          TEXT PRIMARY KEY,
    home_id     TEXT NOT NULL REFERENCES homes(id) ON DELETE CASCADE,
    name        TEXT NOT NULL,
    created_at  INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS gateways (
    id          TEXT PRIMARY KEY,
    home_id     TEXT NOT NULL REFERENCES homes(id) ON DELETE CASCADE,
    name        TEXT NOT NULL,
    created_at  INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS devices (
    id             TEXT PRIMARY KEY,
    gateway_id     TEXT NOT NULL REFERENCES gateways(id) ON DELETE CASCADE,
    room_id        TEXT NOT NULL REFERENCES rooms(id) ON DELETE CASCADE,
    name           TEXT NOT NULL DEFAULT '',
    physical_id    TEXT NOT NULL,
    physical_name  TEXT NOT NULL,
    plugin         TEXT NOT NULL,
    config         TEXT NOT NULL DEFAULT '',
    icon           TEXT NOT NULL DEFAULT '',
    created_at     INTEGER NOT NULL,
    UNIQUE (physical_id, gateway_id)
);
CREATE INDEX IF NOT EXISTS devices_physical_id ON devices (physical_id);

CREATE TABLE IF NOT EXISTS automations (
    id                 TEXT PRIMARY KEY,
    home_id            TEXT NOT NULL REFERENCES homes(id) ON DELETE CASCADE,
    name               TEXT NOT NULL,
    status             INTEGER NOT NULL DEFAULT 1,
    triggers           TEXT NOT NULL,
    trigger_keys       TEXT NOT NULL,
    trigger_values     TEXT NOT NULL,
    trigger_operators  TEXT NOT NULL,
    actions            TEXT NOT NULL,
    action_calls       TEXT NOT NULL,
    action_values      TEXT NOT NULL,
    creator_id         TEXT NOT NULL DEFAULT '',
    created_at         INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS datas (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    id          TEXT NOT NULL UNIQUE,
    device_id   TEXT NOT NULL,
    field       TEXT NOT NULL,
    value_nbr   REAL NOT NULL DEFAULT 0,
    value_str   TEXT NOT NULL DEFAULT '',
    value_bool  INTEGER NOT NULL DEFAULT 0,
    created_at  INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS datas_device_field ON datas (device_id, field, created_at);

CREATE TABLE IF NOT EXISTS logs (
    seq           INTEGER PRIMARY KEY AUTOINCREMENT,
    id            TEXT NOT NULL UNIQUE,
    type          TEXT NOT NULL,
    reference_id  TEXT NOT NULL,
    value         TEXT NOT NULL,
    created_at    INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS logs_reference ON logs (type, reference_id);

CREATE TABLE IF NOT EXISTS permissions (
    user_id   TEXT NOT NULL,
    type      TEXT NOT NULL,
    type_id   TEXT NOT NULL,
    read      INTEGER NOT NULL DEFAULT 0,
    write     INTEGER NOT NULL DEFAULT 0,
    manage    INTEGER NOT NULL DEFAULT 0,
    admin     INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (user_id, type, type_id)
);

CREATE TABLE IF NOT EXISTS tokens (
    token       TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL,
    created_at  INTEGER NOT NULL
);
"#;
