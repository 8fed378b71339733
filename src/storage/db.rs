// 🗄️ Database Storage - SQLite tables with foreign keys
//
// One table per entity kind plus the place_amenity join table. Writes go
// into a transaction opened lazily by the first new()/delete() of a unit of
// work; save() commits it, close() rolls back whatever was not saved.

use super::{Objects, Result, Storage, StorageError};
use crate::models::{Entity, EntityKind};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, info};

pub struct DbStorage {
    conn: Connection,
}

impl DbStorage {
    /// Open (or create) the database file and make sure the schema exists
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        setup_database(&conn)?;

        info!(path = %path.display(), "database storage opened");
        Ok(DbStorage { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;
        Ok(DbStorage { conn })
    }

    /// True while a unit of work has uncommitted writes
    pub fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    fn begin(&self) -> Result<()> {
        if self.conn.is_autocommit() {
            self.conn.execute_batch("BEGIN")?;
        }
        Ok(())
    }

    /// Rows of one kind, optionally a single id, oldest first
    fn query(&self, kind: EntityKind, id: Option<&str>) -> Result<Vec<Entity>> {
        let sql = match id {
            Some(_) => format!("SELECT * FROM {} WHERE id = ?1", kind.table()),
            None => format!("SELECT * FROM {} ORDER BY created_at, rowid", kind.table()),
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let read_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<Map<String, Value>> {
            let mut record = Map::new();
            for (index, column) in columns.iter().enumerate() {
                let value: SqlValue = row.get(index)?;
                record.insert(column.clone(), sql_to_json(value));
            }
            Ok(record)
        };

        let records = match id {
            Some(id) => stmt.query_map([id], read_row)?.collect::<rusqlite::Result<Vec<_>>>()?,
            None => stmt.query_map([], read_row)?.collect::<rusqlite::Result<Vec<_>>>()?,
        };

        records
            .into_iter()
            .map(|mut record| {
                let id = record
                    .get("id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();

                if kind == EntityKind::Place {
                    let linked = self.amenity_ids(&id)?;
                    record.insert("amenity_ids".to_string(), Value::from(linked));
                }

                Entity::from_record(kind, Value::Object(record)).map_err(|source| {
                    StorageError::Record {
                        key: kind.key(&id),
                        source,
                    }
                })
            })
            .collect()
    }

    fn amenity_ids(&self, place_id: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT amenity_id FROM place_amenity WHERE place_id = ?1 ORDER BY rowid")?;

        let ids = stmt
            .query_map([place_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;

        Ok(ids)
    }

    fn upsert(&self, entity: &Entity) -> Result<()> {
        let mut record = entity.to_record();
        record.remove("__class__");
        record.remove("amenity_ids");

        let columns: Vec<&str> = record.keys().map(String::as_str).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        let assignments: Vec<String> = columns
            .iter()
            .filter(|column| **column != "id")
            .map(|column| format!("{0} = excluded.{0}", column))
            .collect();

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT(id) DO UPDATE SET {}",
            entity.kind().table(),
            columns.join(", "),
            placeholders.join(", "),
            assignments.join(", "),
        );
        self.conn
            .execute(&sql, params_from_iter(record.values().map(json_to_sql)))?;

        if let Entity::Place(place) = entity {
            self.conn.execute(
                "DELETE FROM place_amenity WHERE place_id = ?1",
                params![place.base.id],
            )?;
            for amenity_id in &place.amenity_ids {
                self.conn.execute(
                    "INSERT INTO place_amenity (place_id, amenity_id) VALUES (?1, ?2)",
                    params![place.base.id, amenity_id],
                )?;
            }
        }

        Ok(())
    }

    fn count_kind(&self, kind: EntityKind) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", kind.table()),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // WAL for crash recovery; in-memory databases answer "memory"
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
    conn.pragma_update(None, "foreign_keys", true)?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS states (
            id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS cities (
            id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            state_id TEXT NOT NULL REFERENCES states(id),
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS amenities (
            id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            email TEXT NOT NULL,
            password TEXT NOT NULL,
            first_name TEXT NOT NULL DEFAULT '',
            last_name TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS places (
            id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            city_id TEXT NOT NULL REFERENCES cities(id),
            user_id TEXT NOT NULL REFERENCES users(id),
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            number_rooms INTEGER NOT NULL DEFAULT 0,
            number_bathrooms INTEGER NOT NULL DEFAULT 0,
            max_guest INTEGER NOT NULL DEFAULT 0,
            price_by_night INTEGER NOT NULL DEFAULT 0,
            latitude REAL NOT NULL DEFAULT 0,
            longitude REAL NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS reviews (
            id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            place_id TEXT NOT NULL REFERENCES places(id),
            user_id TEXT NOT NULL REFERENCES users(id),
            text TEXT NOT NULL
        );

        -- Links are owned by both sides and vanish with either
        CREATE TABLE IF NOT EXISTS place_amenity (
            place_id TEXT NOT NULL REFERENCES places(id) ON DELETE CASCADE,
            amenity_id TEXT NOT NULL REFERENCES amenities(id) ON DELETE CASCADE,
            PRIMARY KEY (place_id, amenity_id)
        );

        CREATE INDEX IF NOT EXISTS idx_cities_state ON cities(state_id);
        CREATE INDEX IF NOT EXISTS idx_places_city ON places(city_id);
        CREATE INDEX IF NOT EXISTS idx_places_user ON places(user_id);
        CREATE INDEX IF NOT EXISTS idx_reviews_place ON reviews(place_id);
        CREATE INDEX IF NOT EXISTS idx_reviews_user ON reviews(user_id);
        CREATE INDEX IF NOT EXISTS idx_place_amenity_amenity ON place_amenity(amenity_id);",
    )?;

    Ok(())
}

fn sql_to_json(value: SqlValue) -> Value {
    match value {
        SqlValue::Null | SqlValue::Blob(_) => Value::Null,
        SqlValue::Integer(i) => Value::from(i),
        SqlValue::Real(f) => Value::from(f),
        SqlValue::Text(s) => Value::String(s),
    }
}

fn json_to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

impl Storage for DbStorage {
    fn all(&self, kind: Option<EntityKind>) -> Result<Objects> {
        let kinds = match kind {
            Some(kind) => vec![kind],
            None => EntityKind::ALL.to_vec(),
        };

        let mut objects = Objects::new();
        for kind in kinds {
            for entity in self.query(kind, None)? {
                objects.insert(entity.key(), entity);
            }
        }

        Ok(objects)
    }

    fn get(&self, kind: EntityKind, id: &str) -> Result<Option<Entity>> {
        Ok(self.query(kind, Some(id))?.into_iter().next())
    }

    fn new(&mut self, entity: Entity) -> Result<()> {
        self.begin()?;
        self.upsert(&entity)
    }

    fn save(&mut self) -> Result<()> {
        if self.in_transaction() {
            self.conn.execute_batch("COMMIT")?;
            debug!("database transaction committed");
        }
        Ok(())
    }

    fn delete(&mut self, entity: &Entity) -> Result<()> {
        let kind = entity.kind();

        for (child, foreign_key) in kind.children() {
            let referenced = self
                .conn
                .query_row(
                    &format!(
                        "SELECT 1 FROM {} WHERE {} = ?1 LIMIT 1",
                        child.table(),
                        foreign_key
                    ),
                    [entity.id()],
                    |_| Ok(()),
                )
                .optional()?;

            if referenced.is_some() {
                return Err(StorageError::Referenced {
                    kind,
                    id: entity.id().to_string(),
                    child: *child,
                });
            }
        }

        self.begin()?;
        self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", kind.table()),
            [entity.id()],
        )?;

        Ok(())
    }

    fn reload(&mut self) -> Result<()> {
        // Every read goes to the database already
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.in_transaction() {
            self.conn.execute_batch("ROLLBACK")?;
            debug!("database transaction rolled back");
        }
        Ok(())
    }

    fn count(&self, kind: Option<EntityKind>) -> Result<usize> {
        match kind {
            Some(kind) => self.count_kind(kind),
            None => EntityKind::ALL
                .into_iter()
                .map(|kind| self.count_kind(kind))
                .sum(),
        }
    }

    fn backend(&self) -> &'static str {
        "db"
    }
}
