use milestone_core::domain::{
    ChannelHistory, ChannelRegistry, MilestoneHistory, MilestoneRecord, TrackedChannel,
};
use milestone_core::ports::{HistoryStore, RegistryStore, Result};
use milestone_core::TrackerError;
use chrono::NaiveDate;
use rusqlite::{params, Connection, ErrorCode, Row};
use thiserror::Error;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS channels (
        channel_id TEXT PRIMARY KEY,
        position   INTEGER NOT NULL,
        name       TEXT NOT NULL,
        target     INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS channel_history (
        channel_id TEXT PRIMARY KEY,
        position   INTEGER NOT NULL,
        username   TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS milestones (
        channel_id TEXT NOT NULL,
        seq        INTEGER NOT NULL,
        milestone  INTEGER NOT NULL,
        date       TEXT NOT NULL,
        PRIMARY KEY (channel_id, seq)
    );
"#;

#[derive(Debug, Error)]
#[error("sqlite store {db_path}: {source}")]
pub struct SqliteStoreError {
    db_path: String,
    #[source]
    source: rusqlite::Error,
}

impl From<SqliteStoreError> for TrackerError {
    fn from(err: SqliteStoreError) -> Self {
        TrackerError::store("sqlite", err)
    }
}

/// Opens the database and makes sure the tables exist
fn open(db_path: &str) -> std::result::Result<Connection, rusqlite::Error> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}

/// A file that is not a database loads as an empty record. Saving over it
/// still fails, so the file is never clobbered.
fn or_empty<T: Default>(
    db_path: &str,
    result: std::result::Result<T, rusqlite::Error>,
) -> std::result::Result<T, SqliteStoreError> {
    match result {
        Err(e) if e.sqlite_error_code() == Some(ErrorCode::NotADatabase) => {
            tracing::warn!(db = %db_path, error = %e, "file is not a database, initializing as empty");
            Ok(T::default())
        }
        other => other.map_err(wrap(db_path)),
    }
}

fn wrap(db_path: &str) -> impl Fn(rusqlite::Error) -> SqliteStoreError + '_ {
    move |source| SqliteStoreError {
        db_path: db_path.to_string(),
        source,
    }
}

/// SQLite implementation of the RegistryStore trait.
/// Each save replaces the table contents inside one transaction.
pub struct SqliteRegistryStore {
    db_path: String,
}

impl SqliteRegistryStore {
    /// Creates a new SqliteRegistryStore with the given database path
    pub fn new(db_path: String) -> Self {
        Self { db_path }
    }

    fn read(&self) -> std::result::Result<ChannelRegistry, rusqlite::Error> {
        let conn = open(&self.db_path)?;
        let mut stmt =
            conn.prepare("SELECT channel_id, name, target FROM channels ORDER BY position ASC")?;

        let rows = stmt
            .query_map([], |row: &Row| {
                let channel_id: String = row.get(0)?;
                Ok((
                    channel_id,
                    TrackedChannel {
                        name: row.get(1)?,
                        target: row.get(2)?,
                    },
                ))
            })?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

        let mut registry = ChannelRegistry::new();
        for (channel_id, channel) in rows {
            registry.insert(channel_id, channel);
        }
        Ok(registry)
    }

    fn write(&self, registry: &ChannelRegistry) -> std::result::Result<(), rusqlite::Error> {
        let mut conn = open(&self.db_path)?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM channels", [])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO channels (channel_id, position, name, target) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (position, (channel_id, channel)) in registry.channels.iter().enumerate() {
                insert.execute(params![channel_id, position, channel.name, channel.target])?;
            }
        }
        tx.commit()
    }
}

impl RegistryStore for SqliteRegistryStore {
    fn load(&self) -> Result<ChannelRegistry> {
        Ok(or_empty(&self.db_path, self.read())?)
    }

    fn save(&self, registry: &ChannelRegistry) -> Result<()> {
        self.write(registry).map_err(wrap(&self.db_path))?;
        tracing::debug!(db = %self.db_path, channels = registry.len(), "registry saved");
        Ok(())
    }
}

/// SQLite implementation of the HistoryStore trait
pub struct SqliteHistoryStore {
    db_path: String,
}

impl SqliteHistoryStore {
    pub fn new(db_path: String) -> Self {
        Self { db_path }
    }

    fn read(&self) -> std::result::Result<MilestoneHistory, rusqlite::Error> {
        let conn = open(&self.db_path)?;
        let mut history = MilestoneHistory::new();

        let mut channels = conn
            .prepare("SELECT channel_id, username FROM channel_history ORDER BY position ASC")?;
        let rows = channels
            .query_map([], |row: &Row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
        for row in rows {
            let (channel_id, username) = row?;
            history.channels.insert(
                channel_id,
                ChannelHistory {
                    username,
                    history: Vec::new(),
                },
            );
        }

        let mut milestones = conn.prepare(
            "SELECT channel_id, milestone, date FROM milestones ORDER BY channel_id, seq ASC",
        )?;
        let rows = milestones.query_map([], |row: &Row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, NaiveDate>(2)?,
            ))
        })?;
        for row in rows {
            let (channel_id, milestone, date) = row?;
            match history.channels.get_mut(&channel_id) {
                Some(entry) => entry.history.push(MilestoneRecord { milestone, date }),
                None => tracing::warn!(%channel_id, "milestone row without channel, ignoring"),
            }
        }

        Ok(history)
    }

    fn write(&self, history: &MilestoneHistory) -> std::result::Result<(), rusqlite::Error> {
        let mut conn = open(&self.db_path)?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM milestones", [])?;
        tx.execute("DELETE FROM channel_history", [])?;
        {
            let mut insert_channel = tx.prepare(
                "INSERT INTO channel_history (channel_id, position, username) VALUES (?1, ?2, ?3)",
            )?;
            let mut insert_milestone = tx.prepare(
                "INSERT INTO milestones (channel_id, seq, milestone, date) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (position, (channel_id, entry)) in history.channels.iter().enumerate() {
                insert_channel.execute(params![channel_id, position, entry.username])?;
                for (seq, record) in entry.history.iter().enumerate() {
                    insert_milestone.execute(params![channel_id, seq, record.milestone, record.date])?;
                }
            }
        }
        tx.commit()
    }
}

impl HistoryStore for SqliteHistoryStore {
    fn load(&self) -> Result<MilestoneHistory> {
        Ok(or_empty(&self.db_path, self.read())?)
    }

    fn save(&self, history: &MilestoneHistory) -> Result<()> {
        Ok(self.write(history).map_err(wrap(&self.db_path))?)
    }
}
