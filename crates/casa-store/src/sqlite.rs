//! SQLite-backed [`Store`]

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use casa_core::{AutomationRecord, Capability, Device, LogEntry, LogType, Reading, ResourceType};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::schema::SCHEMA;
use crate::store::Store;

const DEVICE_COLUMNS: &str =
    "d.id, d.gateway_id, d.room_id, d.name, d.physical_id, d.physical_name, d.plugin, d.config, d.icon";

const AUTOMATION_COLUMNS: &str = "id, home_id, name, status, triggers, trigger_keys, \
     trigger_values, trigger_operators, actions, action_calls, action_values, creator_id";

/// SQLite store guarded by a single connection mutex
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database file and ensure the schema exists
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        info!("Opening database {:?}", path);
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::init(conn)
    }

    /// Fresh in-memory database, mostly for tests
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    pub fn insert_home(&self, id: &str, name: &str) -> StoreResult<()> {
        self.conn()?
            .execute(
                "INSERT INTO homes (id, name, created_at) VALUES (?1, ?2, ?3)",
                params![id, name, now_micros()],
            )
            .map_err(|e| duplicate(e, "home", id))?;
        Ok(())
    }

    pub fn insert_room(&self, id: &str, home_id: &str, name: &str) -> StoreResult<()> {
        self.conn()?
            .execute(
                "INSERT INTO rooms (id, home_id, name, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![id, home_id, name, now_micros()],
            )
            .map_err(|e| duplicate(e, "room", id))?;
        Ok(())
    }

    pub fn insert_gateway(&self, id: &str, home_id: &str, name: &str) -> StoreResult<()> {
        self.conn()?
            .execute(
                "INSERT INTO gateways (id, home_id, name, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![id, home_id, name, now_micros()],
            )
            .map_err(|e| duplicate(e, "gateway", id))?;
        Ok(())
    }

    /// Register a device; a second device with the same
    /// `(physical_id, gateway_id)` is rejected
    pub fn insert_device(&self, device: &Device) -> StoreResult<()> {
        self.conn()?
            .execute(
                "INSERT INTO devices (id, gateway_id, room_id, name, physical_id, physical_name, \
                 plugin, config, icon, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    device.id,
                    device.gateway_id,
                    device.room_id,
                    device.name,
                    device.physical_id,
                    device.physical_name,
                    device.plugin,
                    device.config,
                    device.icon,
                    now_micros(),
                ],
            )
            .map_err(|e| duplicate(e, "device", &device.physical_id))?;
        debug!(device_id = %device.id, physical_id = %device.physical_id, "Device registered");
        Ok(())
    }

    /// Grant capabilities on a resource, merging with any existing row
    pub fn grant_permission(
        &self,
        user_id: &str,
        resource_type: ResourceType,
        resource_id: &str,
        capabilities: &[Capability],
    ) -> StoreResult<()> {
        let has = |c: Capability| capabilities.contains(&c);
        self.conn()?.execute(
            "INSERT INTO permissions (user_id, type, type_id, read, write, manage, admin) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
             ON CONFLICT (user_id, type, type_id) DO UPDATE SET \
             read = read OR excluded.read, write = write OR excluded.write, \
             manage = manage OR excluded.manage, admin = admin OR excluded.admin",
            params![
                user_id,
                resource_type.as_str(),
                resource_id,
                has(Capability::Read),
                has(Capability::Write),
                has(Capability::Manage),
                has(Capability::Admin),
            ],
        )?;
        Ok(())
    }

    pub fn insert_token(&self, token: &str, user_id: &str) -> StoreResult<()> {
        self.conn()?
            .execute(
                "INSERT INTO tokens (token, user_id, created_at) VALUES (?1, ?2, ?3)",
                params![token, user_id, now_micros()],
            )
            .map_err(|e| duplicate(e, "token", user_id))?;
        Ok(())
    }
}

impl Store for SqliteStore {
    fn device(&self, id: &str) -> StoreResult<Option<Device>> {
        let sql = format!("SELECT {DEVICE_COLUMNS} FROM devices d WHERE d.id = ?1");
        Ok(self
            .conn()?
            .query_row(&sql, params![id], device_from_row)
            .optional()?)
    }

    fn device_by_physical_id(&self, physical_id: &str) -> StoreResult<Option<Device>> {
        let sql = format!(
            "SELECT {DEVICE_COLUMNS} FROM devices d WHERE d.physical_id = ?1 ORDER BY d.rowid LIMIT 1"
        );
        Ok(self
            .conn()?
            .query_row(&sql, params![physical_id], device_from_row)
            .optional()?)
    }

    fn devices_for_home(&self, home_id: &str) -> StoreResult<Vec<Device>> {
        let sql = format!(
            "SELECT {DEVICE_COLUMNS} FROM devices d JOIN rooms r ON r.id = d.room_id \
             WHERE r.home_id = ?1 ORDER BY d.rowid"
        );
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let devices = stmt
            .query_map(params![home_id], device_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(devices)
    }

    fn gateway_home(&self, gateway_id: &str) -> StoreResult<Option<String>> {
        Ok(self
            .conn()?
            .query_row(
                "SELECT home_id FROM gateways WHERE id = ?1",
                params![gateway_id],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn automations(&self) -> StoreResult<Vec<AutomationRecord>> {
        let sql = format!("SELECT {AUTOMATION_COLUMNS} FROM automations ORDER BY rowid");
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], AutomationRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(AutomationRow::into_record).collect()
    }

    fn automation(&self, id: &str) -> StoreResult<Option<AutomationRecord>> {
        let sql = format!("SELECT {AUTOMATION_COLUMNS} FROM automations WHERE id = ?1");
        let row = self
            .conn()?
            .query_row(&sql, params![id], AutomationRow::from_row)
            .optional()?;
        row.map(AutomationRow::into_record).transpose()
    }

    fn automations_for_home(&self, home_id: &str) -> StoreResult<Vec<AutomationRecord>> {
        let sql = format!(
            "SELECT {AUTOMATION_COLUMNS} FROM automations WHERE home_id = ?1 ORDER BY rowid"
        );
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![home_id], AutomationRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(AutomationRow::into_record).collect()
    }

    fn insert_automation(&self, record: &AutomationRecord) -> StoreResult<()> {
        let [triggers, keys, values, operators, actions, calls, call_params] = encode_arrays(record)?;

        self.conn()?
            .execute(
                "INSERT INTO automations (id, home_id, name, status, triggers, trigger_keys, \
                 trigger_values, trigger_operators, actions, action_calls, action_values, \
                 creator_id, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    record.id,
                    record.home_id,
                    record.name,
                    record.status,
                    triggers,
                    keys,
                    values,
                    operators,
                    actions,
                    calls,
                    call_params,
                    record.creator_id,
                    now_micros(),
                ],
            )
            .map_err(|e| duplicate(e, "automation", &record.id))?;
        Ok(())
    }

    fn update_automation(&self, record: &AutomationRecord) -> StoreResult<bool> {
        let [triggers, keys, values, operators, actions, calls, call_params] = encode_arrays(record)?;

        let changed = self.conn()?.execute(
            "UPDATE automations SET name = ?3, status = ?4, triggers = ?5, trigger_keys = ?6, \
             trigger_values = ?7, trigger_operators = ?8, actions = ?9, action_calls = ?10, \
             action_values = ?11 \
             WHERE id = ?1 AND home_id = ?2",
            params![
                record.id,
                record.home_id,
                record.name,
                record.status,
                triggers,
                keys,
                values,
                operators,
                actions,
                calls,
                call_params,
            ],
        )?;
        debug!(automation_id = %record.id, changed, "Automation updated");
        Ok(changed > 0)
    }

    fn delete_automation(&self, home_id: &str, id: &str) -> StoreResult<bool> {
        let changed = self.conn()?.execute(
            "DELETE FROM automations WHERE id = ?1 AND home_id = ?2",
            params![id, home_id],
        )?;
        Ok(changed > 0)
    }

    fn insert_reading(&self, reading: &Reading) -> StoreResult<()> {
        self.conn()?
            .execute(
                "INSERT INTO datas (id, device_id, field, value_nbr, value_str, value_bool, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    reading.id,
                    reading.device_id,
                    reading.field,
                    reading.value_nbr,
                    reading.value_str,
                    reading.value_bool,
                    reading.created_at.timestamp_micros(),
                ],
            )
            .map_err(|e| duplicate(e, "reading", &reading.id))?;
        Ok(())
    }

    fn latest_reading(&self, device_id: &str, field: &str) -> StoreResult<Option<Reading>> {
        Ok(self
            .conn()?
            .query_row(
                "SELECT id, device_id, field, value_nbr, value_str, value_bool, created_at \
                 FROM datas WHERE device_id = ?1 AND field = ?2 \
                 ORDER BY created_at DESC, seq DESC LIMIT 1",
                params![device_id, field],
                |row| {
                    Ok(Reading {
                        id: row.get(0)?,
                        device_id: row.get(1)?,
                        field: row.get(2)?,
                        value_nbr: row.get(3)?,
                        value_str: row.get(4)?,
                        value_bool: row.get(5)?,
                        created_at: micros_column(row, 6)?,
                    })
                },
            )
            .optional()?)
    }

    fn append_log(&self, entry: &LogEntry) -> StoreResult<()> {
        self.conn()?.execute(
            "INSERT INTO logs (id, type, reference_id, value, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.id,
                entry.log_type.as_str(),
                entry.reference_id,
                entry.value,
                entry.created_at.timestamp_micros(),
            ],
        )?;
        Ok(())
    }

    fn logs_for(&self, log_type: LogType, reference_id: &str) -> StoreResult<Vec<LogEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, reference_id, value, created_at FROM logs \
             WHERE type = ?1 AND reference_id = ?2 ORDER BY seq",
        )?;
        let entries = stmt
            .query_map(params![log_type.as_str(), reference_id], |row| {
                Ok(LogEntry {
                    id: row.get(0)?,
                    log_type,
                    reference_id: row.get(1)?,
                    value: row.get(2)?,
                    created_at: micros_column(row, 3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn has_permission(
        &self,
        user_id: &str,
        resource_type: ResourceType,
        resource_id: &str,
        capability: Capability,
    ) -> StoreResult<bool> {
        // Column names come from a closed enum
        let sql = format!(
            "SELECT \"{}\" OR admin FROM permissions WHERE user_id = ?1 AND type = ?2 AND type_id = ?3",
            capability.column()
        );
        let allowed: Option<bool> = self
            .conn()?
            .query_row(
                &sql,
                params![user_id, resource_type.as_str(), resource_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(allowed.unwrap_or(false))
    }

    fn user_for_token(&self, token: &str) -> StoreResult<Option<String>> {
        Ok(self
            .conn()?
            .query_row(
                "SELECT user_id FROM tokens WHERE token = ?1",
                params![token],
                |row| row.get(0),
            )
            .optional()?)
    }
}

/// JSON text for the seven array columns, in column order
fn encode_arrays(record: &AutomationRecord) -> StoreResult<[String; 7]> {
    let json = |v: &Vec<String>| serde_json::to_string(v);
    Ok([
        json(&record.triggers)?,
        json(&record.trigger_keys)?,
        json(&record.trigger_values)?,
        json(&record.trigger_operators)?,
        json(&record.actions)?,
        json(&record.action_calls)?,
        json(&record.action_values)?,
    ])
}

/// Raw automation row before the JSON array columns are decoded
struct AutomationRow {
    id: String,
    home_id: String,
    name: String,
    status: bool,
    arrays: [String; 7],
    creator_id: String,
}

impl AutomationRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            home_id: row.get(1)?,
            name: row.get(2)?,
            status: row.get(3)?,
            arrays: [
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
                row.get(7)?,
                row.get(8)?,
                row.get(9)?,
                row.get(10)?,
            ],
            creator_id: row.get(11)?,
        })
    }

    fn into_record(self) -> StoreResult<AutomationRecord> {
        let [triggers, keys, values, operators, actions, calls, params] = self.arrays;
        let parse = |s: String| serde_json::from_str::<Vec<String>>(&s);
        Ok(AutomationRecord {
            id: self.id,
            home_id: self.home_id,
            name: self.name,
            status: self.status,
            triggers: parse(triggers)?,
            trigger_keys: parse(keys)?,
            trigger_values: parse(values)?,
            trigger_operators: parse(operators)?,
            actions: parse(actions)?,
            action_calls: parse(calls)?,
            action_values: parse(params)?,
            creator_id: self.creator_id,
        })
    }
}

fn device_from_row(row: &Row<'_>) -> rusqlite::Result<Device> {
    Ok(Device {
        id: row.get(0)?,
        gateway_id: row.get(1)?,
        room_id: row.get(2)?,
        name: row.get(3)?,
        physical_id: row.get(4)?,
        physical_name: row.get(5)?,
        plugin: row.get(6)?,
        config: row.get(7)?,
        icon: row.get(8)?,
    })
}

fn micros_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let micros: i64 = row.get(idx)?;
    DateTime::from_timestamp_micros(micros)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, micros))
}

fn now_micros() -> i64 {
    Utc::now().timestamp_micros()
}

fn duplicate(err: rusqlite::Error, kind: &'static str, id: &str) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _) if e.code == ErrorCode::ConstraintViolation => {
            StoreError::Duplicate {
                kind,
                id: id.to_string(),
            }
        }
        other => StoreError::Sqlite(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn device(id: &str, physical_id: &str, room_id: &str) -> Device {
        Device {
            id: id.to_string(),
            gateway_id: "gw1".to_string(),
            room_id: room_id.to_string(),
            name: id.to_string(),
            physical_id: physical_id.to_string(),
            physical_name: "sensor".to_string(),
            plugin: "zigbee".to_string(),
            config: String::new(),
            icon: String::new(),
        }
    }

    fn seeded() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_home("h1", "Home").unwrap();
        store.insert_home("h2", "Cabin").unwrap();
        store.insert_room("r1", "h1", "Kitchen").unwrap();
        store.insert_room("r2", "h2", "Porch").unwrap();
        store.insert_gateway("gw1", "h1", "Main").unwrap();
        store
    }

    #[test]
    fn test_device_lookup() {
        let store = seeded();
        store.insert_device(&device("d1", "0x01", "r1")).unwrap();

        assert_eq!(store.device("d1").unwrap().unwrap().physical_id, "0x01");
        assert_eq!(store.device_by_physical_id("0x01").unwrap().unwrap().id, "d1");
        assert!(store.device_by_physical_id("0xff").unwrap().is_none());
        assert_eq!(store.gateway_home("gw1").unwrap().as_deref(), Some("h1"));
    }

    #[test]
    fn test_duplicate_physical_device_rejected() {
        let store = seeded();
        store.insert_device(&device("d1", "0x01", "r1")).unwrap();

        let err = store.insert_device(&device("d2", "0x01", "r1")).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { kind: "device", .. }));
    }

    #[test]
    fn test_devices_for_home_scoped() {
        let store = seeded();
        store.insert_device(&device("d1", "0x01", "r1")).unwrap();
        store.insert_device(&device("d2", "0x02", "r2")).unwrap();

        let ids: Vec<_> = store
            .devices_for_home("h1")
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["d1"]);
    }

    #[test]
    fn test_automation_round_trip() {
        let store = seeded();
        let record = AutomationRecord {
            id: "a1".to_string(),
            home_id: "h1".to_string(),
            name: "Evening".to_string(),
            status: true,
            triggers: vec!["d1".to_string(), "d2".to_string()],
            trigger_keys: vec!["temp".to_string(), "motion".to_string()],
            trigger_values: vec![">20".to_string(), "true".to_string()],
            trigger_operators: vec!["AND".to_string()],
            actions: vec!["d3".to_string(), "d4".to_string()],
            action_calls: vec!["turnOn".to_string(), "setLevel".to_string()],
            action_values: vec![String::new(), "40".to_string()],
            creator_id: "u1".to_string(),
        };
        store.insert_automation(&record).unwrap();

        let loaded = store.automation("a1").unwrap().unwrap();
        assert_eq!(loaded, record);
        assert_eq!(store.automations().unwrap(), vec![record]);
    }

    fn rule(id: &str, home_id: &str) -> AutomationRecord {
        AutomationRecord {
            id: id.to_string(),
            home_id: home_id.to_string(),
            name: format!("rule {}", id),
            status: true,
            triggers: vec!["d1".to_string()],
            trigger_keys: vec!["temp".to_string()],
            trigger_values: vec![">20".to_string()],
            trigger_operators: vec![],
            actions: vec!["d2".to_string()],
            action_calls: vec!["turnOn".to_string()],
            action_values: vec![String::new()],
            creator_id: "u1".to_string(),
        }
    }

    #[test]
    fn test_automations_for_home() {
        let store = seeded();
        store.insert_automation(&rule("a1", "h1")).unwrap();
        store.insert_automation(&rule("a2", "h2")).unwrap();
        store.insert_automation(&rule("a3", "h1")).unwrap();

        let ids: Vec<String> = store
            .automations_for_home("h1")
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec!["a1", "a3"]);
    }

    #[test]
    fn test_update_automation() {
        let store = seeded();
        store.insert_automation(&rule("a1", "h1")).unwrap();

        let mut changed = rule("a1", "h1");
        changed.name = "Renamed".to_string();
        changed.status = false;
        changed.trigger_values = vec!["<5".to_string()];
        assert!(store.update_automation(&changed).unwrap());

        let loaded = store.automation("a1").unwrap().unwrap();
        assert_eq!(loaded.name, "Renamed");
        assert!(!loaded.status);
        assert_eq!(loaded.trigger_values, vec!["<5"]);
        assert_eq!(loaded.creator_id, "u1");

        // Scoped to the home
        assert!(!store.update_automation(&rule("a1", "h2")).unwrap());
        assert!(!store.update_automation(&rule("a9", "h1")).unwrap());
    }

    #[test]
    fn test_delete_automation() {
        let store = seeded();
        store.insert_automation(&rule("a1", "h1")).unwrap();

        assert!(!store.delete_automation("h2", "a1").unwrap());
        assert!(store.delete_automation("h1", "a1").unwrap());
        assert!(store.automation("a1").unwrap().is_none());
        assert!(!store.delete_automation("h1", "a1").unwrap());
    }

    #[test]
    fn test_latest_reading_ordering() {
        let store = seeded();
        let now = Utc::now();

        store
            .insert_reading(&Reading::new("d1", "temp").with_number(20.0).with_created_at(now))
            .unwrap();
        store
            .insert_reading(
                &Reading::new("d1", "temp")
                    .with_number(30.0)
                    .with_created_at(now - Duration::seconds(60)),
            )
            .unwrap();
        store
            .insert_reading(&Reading::new("d1", "humidity").with_number(55.0).with_created_at(now))
            .unwrap();

        let latest = store.latest_reading("d1", "temp").unwrap().unwrap();
        assert_eq!(latest.value_nbr, 20.0);

        // Same timestamp: the later insert wins
        store
            .insert_reading(&Reading::new("d1", "temp").with_number(25.0).with_created_at(now))
            .unwrap();
        let latest = store.latest_reading("d1", "temp").unwrap().unwrap();
        assert_eq!(latest.value_nbr, 25.0);

        assert!(store.latest_reading("d2", "temp").unwrap().is_none());
    }

    #[test]
    fn test_logs() {
        let store = seeded();
        store
            .append_log(&LogEntry::new(LogType::Automation, "a1", "[]"))
            .unwrap();
        store
            .append_log(&LogEntry::new(LogType::Device, "a1", "{}"))
            .unwrap();

        let logs = store.logs_for(LogType::Automation, "a1").unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].value, "[]");
        assert_eq!(logs[0].log_type, LogType::Automation);
    }

    #[test]
    fn test_permissions() {
        let store = seeded();
        store
            .grant_permission("u1", ResourceType::Device, "d1", &[Capability::Read])
            .unwrap();
        store
            .grant_permission("u2", ResourceType::Home, "h1", &[Capability::Admin])
            .unwrap();

        assert!(store
            .has_permission("u1", ResourceType::Device, "d1", Capability::Read)
            .unwrap());
        assert!(!store
            .has_permission("u1", ResourceType::Device, "d1", Capability::Write)
            .unwrap());
        assert!(store
            .has_permission("u2", ResourceType::Home, "h1", Capability::Write)
            .unwrap());
        assert!(!store
            .has_permission("u2", ResourceType::Home, "h2", Capability::Read)
            .unwrap());

        // Grants accumulate
        store
            .grant_permission("u1", ResourceType::Device, "d1", &[Capability::Write])
            .unwrap();
        assert!(store
            .has_permission("u1", ResourceType::Device, "d1", Capability::Read)
            .unwrap());
        assert!(store
            .has_permission("u1", ResourceType::Device, "d1", Capability::Write)
            .unwrap());
    }

    #[test]
    fn test_tokens() {
        let store = seeded();
        store.insert_token("secret", "u1").unwrap();
        assert_eq!(store.user_for_token("secret").unwrap().as_deref(), Some("u1"));
        assert!(store.user_for_token("other").unwrap().is_none());
    }

    #[test]
    fn test_file_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("casa.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.insert_home("h1", "Home").unwrap();
            store.insert_gateway("gw1", "h1", "Main").unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.gateway_home("gw1").unwrap().as_deref(), Some("h1"));
    }
}
