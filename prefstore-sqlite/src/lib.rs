use prefstore_core::{
    setting_key, store::SettingsStore, SerializeAs, SettingValue, SettingsError, SettingsMap,
    StoredSetting,
};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

// Two tables: a group per settings section, a value row per setting name.
// Every statement is idempotent so the batch can run on every write open.
const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS SettingGroups (
  Id        INTEGER NOT NULL,
  GroupName TEXT NOT NULL,
  PRIMARY KEY (Id)
);

CREATE UNIQUE INDEX IF NOT EXISTS index_GroupName ON SettingGroups (GroupName ASC);

CREATE TABLE IF NOT EXISTS SettingValues (
  Id          INTEGER NOT NULL,
  ValueName   TEXT NOT NULL,
  Value       TEXT,
  SerializeAs TEXT,
  GroupId     INTEGER,
  PRIMARY KEY (Id),
  CONSTRAINT GroupIdForeignKey FOREIGN KEY (GroupId) REFERENCES SettingGroups (Id)
    ON DELETE CASCADE ON UPDATE CASCADE
);

CREATE INDEX IF NOT EXISTS index_ValueName ON SettingValues (ValueName ASC);
CREATE UNIQUE INDEX IF NOT EXISTS index_ValueNameWithGroupId ON SettingValues (ValueName ASC, GroupId ASC);
"#;

const READ_QUERY: &str = "\
SELECT B.GroupName, A.ValueName, A.Value, A.SerializeAs
FROM SettingValues AS A
JOIN SettingGroups AS B ON A.GroupId = B.Id
WHERE B.GroupName = ?1";

// Holds no connection: each call opens the store file, does its work, and
// closes it on return.
#[derive(Clone, Copy, Debug, Default)]
pub struct SqliteStore;

impl SqliteStore {
    pub fn new() -> Self {
        Self
    }
}

// Idempotent; runs on every writable open since the store file may be
// freshly created.
pub fn ensure_schema(conn: &Connection) -> Result<(), SettingsError> {
    conn.execute_batch(SCHEMA)
        .map_err(|_| SettingsError::Storage("sqlite schema"))
}

impl SettingsStore for SqliteStore {
    fn read(&self, store_file: &Path, section: &str) -> Result<SettingsMap, SettingsError> {
        let mut out = SettingsMap::new();
        if !store_file.exists() {
            return Ok(out);
        }

        let conn = Connection::open_with_flags(store_file, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|_| SettingsError::Storage("sqlite open"))?;

        // A foreign database without our tables reads as empty, not as an error.
        let has_tables: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'SettingValues')",
                [],
                |row| row.get(0),
            )
            .map_err(|_| SettingsError::Storage("inspect schema"))?;
        if !has_tables {
            return Ok(out);
        }

        let mut stmt = conn
            .prepare(READ_QUERY)
            .map_err(|_| SettingsError::Storage("prepare read"))?;
        let rows = stmt
            .query_map(params![section], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            })
            .map_err(|_| SettingsError::Storage("read settings"))?;

        for row in rows {
            let (group, name, value, tag) =
                row.map_err(|_| SettingsError::Storage("read settings"))?;
            let serialize_as = match tag {
                Some(t) => SerializeAs::parse_tag(&t),
                None => SerializeAs::String,
            };
            out.insert(
                setting_key(&group, &name),
                StoredSetting {
                    group,
                    name,
                    value: value.unwrap_or_default(),
                    serialize_as,
                },
            );
        }
        Ok(out)
    }

    fn write(
        &self,
        store_file: &Path,
        section: &str,
        values: &BTreeMap<String, SettingValue>,
    ) -> Result<(), SettingsError> {
        if let Some(dir) = store_file.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)
                    .map_err(|_| SettingsError::Storage("create store directory"))?;
            }
        }

        let mut conn = Connection::open(store_file)
            .map_err(|_| SettingsError::Storage("sqlite open"))?;
        ensure_schema(&conn)?;

        let tx = conn
            .transaction()
            .map_err(|_| SettingsError::Storage("begin write"))?;

        let group_id: i64 = match tx
            .query_row(
                "SELECT Id FROM SettingGroups WHERE GroupName = ?1",
                params![section],
                |row| row.get(0),
            )
            .optional()
            .map_err(|_| SettingsError::Storage("select group"))?
        {
            Some(id) => id,
            None => {
                tx.execute(
                    "INSERT INTO SettingGroups (GroupName) VALUES (?1)",
                    params![section],
                )
                .map_err(|_| SettingsError::Storage("insert group"))?;
                tx.last_insert_rowid()
            }
        };

        {
            // Names already present are updated in place; the rest insert.
            let mut stmt = tx
                .prepare("SELECT ValueName FROM SettingValues WHERE GroupId = ?1")
                .map_err(|_| SettingsError::Storage("list values"))?;
            let existing = stmt
                .query_map(params![group_id], |row| row.get::<_, String>(0))
                .map_err(|_| SettingsError::Storage("list values"))?
                .collect::<Result<HashSet<_>, _>>()
                .map_err(|_| SettingsError::Storage("list values"))?;

            let mut update = tx
                .prepare(
                    "UPDATE SettingValues SET Value = ?1, SerializeAs = ?2 \
                     WHERE GroupId = ?3 AND ValueName = ?4",
                )
                .map_err(|_| SettingsError::Storage("prepare update"))?;
            let mut insert = tx
                .prepare(
                    "INSERT INTO SettingValues (ValueName, Value, SerializeAs, GroupId) \
                     VALUES (?1, ?2, ?3, ?4)",
                )
                .map_err(|_| SettingsError::Storage("prepare insert"))?;

            let (updates, inserts): (Vec<_>, Vec<_>) = values
                .iter()
                .partition(|(name, _)| existing.contains(name.as_str()));

            for (name, v) in updates {
                update
                    .execute(params![v.value, v.serialize_as.as_str(), group_id, name])
                    .map_err(|_| SettingsError::Storage("update value"))?;
            }
            for (name, v) in inserts {
                insert
                    .execute(params![name, v.value, v.serialize_as.as_str(), group_id])
                    .map_err(|_| SettingsError::Storage("insert value"))?;
            }
        }

        tx.commit()
            .map_err(|_| SettingsError::Storage("commit write"))?;
        Ok(())
    }
}
