// crates/gateway-workspace-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Entity Store
// Description: Durable EntityStore backed by SQLite WAL.
// Purpose: Persist workspace records with integrity-hashed canonical JSON.
// Dependencies: gateway-workspace-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`SqliteWorkspaceDatabase`] owns one `SQLite` connection and hands out a
//! typed [`SqliteEntityStore`] per entity kind. Records live in a single
//! `entities` table keyed by `(kind, entity_id)`; a monotonic `seq` column
//! keeps creation order stable when a rename rewrites the key. Each row holds
//! canonical JSON plus its hash, and loads fail closed on a mismatch.
//! Database contents are treated as untrusted input.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::marker::PhantomData;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use gateway_workspace_core::Entity;
use gateway_workspace_core::EntityStore;
use gateway_workspace_core::Mapping;
use gateway_workspace_core::Pipeline;
use gateway_workspace_core::Policy;
use gateway_workspace_core::StoreError;
use gateway_workspace_core::WorkspaceStores;
use gateway_workspace_core::hashing::DEFAULT_HASH_ALGORITHM;
use gateway_workspace_core::hashing::HashAlgorithm;
use gateway_workspace_core::hashing::canonical_json_bytes;
use gateway_workspace_core::hashing::hash_bytes;
use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::ToSql;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum canonical JSON size of one stored record.
pub const MAX_ENTITY_BYTES: usize = 1024 * 1024;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` entity store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Creates a config for `path` with default pragmas.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages name records by kind and id, never by payload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store corruption or hash mismatch.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Unique key violated by an insert or update.
    #[error("sqlite store duplicate record: {0}")]
    Duplicate(String),
    /// Addressed record does not exist.
    #[error("sqlite store missing record: {0}")]
    Missing(String),
    /// Record payload exceeded the size limit.
    #[error("sqlite store payload too large: {actual_bytes} bytes (max {max_bytes})")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual payload size in bytes.
        actual_bytes: usize,
    },
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
            SqliteStoreError::Duplicate(message) => Self::Duplicate(message),
            SqliteStoreError::Missing(message) => Self::Missing(message),
            SqliteStoreError::TooLarge {
                max_bytes,
                actual_bytes,
            } => Self::Invalid(format!(
                "entity_json exceeds size limit: {actual_bytes} bytes (max {max_bytes})"
            )),
        }
    }
}

/// Maps a `rusqlite` error, classifying unique-key violations.
fn map_db_error(err: &rusqlite::Error, context: impl FnOnce() -> String) -> SqliteStoreError {
    match err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            SqliteStoreError::Duplicate(context())
        }
        other => SqliteStoreError::Db(other.to_string()),
    }
}

// ============================================================================
// SECTION: Database
// ============================================================================

/// Shared `SQLite` database holding every entity kind of one workspace.
#[derive(Debug, Clone)]
pub struct SqliteWorkspaceDatabase {
    /// Connection guarded for single-writer access.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteWorkspaceDatabase {
    /// Opens (or creates) the database and validates its schema version.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the path is unsafe, the database
    /// cannot be opened, or the stored schema version is unsupported.
    pub fn open(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Returns a typed store over this database.
    #[must_use]
    pub fn store<E: Entity>(&self) -> SqliteEntityStore<E> {
        SqliteEntityStore {
            connection: Arc::clone(&self.connection),
            entity: PhantomData,
        }
    }

    /// Returns a workspace store context backed by this database.
    #[must_use]
    pub fn workspace_stores(&self) -> WorkspaceStores {
        WorkspaceStores::new(
            Arc::new(self.store::<Policy>()),
            Arc::new(self.store::<Pipeline>()),
            Arc::new(self.store::<Mapping>()),
        )
    }

    /// Runs a quick integrity check on the database file.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Corrupt`] when `SQLite` reports damage.
    pub fn check_integrity(&self) -> Result<(), SqliteStoreError> {
        let guard = lock(&self.connection)?;
        let verdict: String = guard
            .query_row("PRAGMA quick_check", params![], |row| row.get(0))
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        drop(guard);
        if verdict == "ok" {
            Ok(())
        } else {
            Err(SqliteStoreError::Corrupt(verdict))
        }
    }
}

// ============================================================================
// SECTION: Entity Store
// ============================================================================

/// `SQLite`-backed store for one entity kind.
#[derive(Debug)]
pub struct SqliteEntityStore<E> {
    /// Connection shared with the owning database.
    connection: Arc<Mutex<Connection>>,
    /// Entity type marker.
    entity: PhantomData<fn() -> E>,
}

impl<E> Clone for SqliteEntityStore<E> {
    fn clone(&self) -> Self {
        Self {
            connection: Arc::clone(&self.connection),
            entity: PhantomData,
        }
    }
}

/// Serialized row contents for one record.
struct PreparedRow {
    /// Record id (primary key within the kind).
    entity_id: String,
    /// Record name (unique within the kind when non-empty).
    name: String,
    /// Canonical JSON bytes.
    bytes: Vec<u8>,
    /// Hash of `bytes`.
    hash_value: String,
    /// Hash algorithm label.
    hash_algorithm: &'static str,
}

/// Raw row contents read back from the table.
struct StoredRow {
    /// Stored record id.
    entity_id: String,
    /// Stored JSON bytes.
    bytes: Vec<u8>,
    /// Stored hash value.
    hash_value: String,
    /// Stored hash algorithm label.
    hash_algorithm: String,
}

impl<E: Entity> SqliteEntityStore<E> {
    /// Serializes a record into row contents.
    fn prepare(entity: &E) -> Result<PreparedRow, SqliteStoreError> {
        let entity_id = entity.id().as_ref().to_string();
        if entity_id.is_empty() {
            return Err(SqliteStoreError::Invalid(format!("{} requires a name or id", E::KIND)));
        }
        let bytes =
            canonical_json_bytes(entity).map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        if bytes.len() > MAX_ENTITY_BYTES {
            return Err(SqliteStoreError::TooLarge {
                max_bytes: MAX_ENTITY_BYTES,
                actual_bytes: bytes.len(),
            });
        }
        let digest = hash_bytes(DEFAULT_HASH_ALGORITHM, &bytes);
        Ok(PreparedRow {
            entity_id,
            name: entity.name().to_string(),
            bytes,
            hash_value: digest.value,
            hash_algorithm: DEFAULT_HASH_ALGORITHM.as_str(),
        })
    }

    /// Verifies and decodes a stored row.
    fn decode(row: StoredRow) -> Result<E, SqliteStoreError> {
        let algorithm = parse_hash_algorithm(&row.hash_algorithm)?;
        let expected = hash_bytes(algorithm, &row.bytes);
        if expected.value != row.hash_value {
            return Err(SqliteStoreError::Corrupt(format!(
                "hash mismatch for {} {}",
                E::KIND,
                row.entity_id
            )));
        }
        let entity: E = serde_json::from_slice(&row.bytes)
            .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        if entity.id().as_ref() != row.entity_id {
            return Err(SqliteStoreError::Invalid(format!(
                "{} id mismatch between key and payload",
                E::KIND
            )));
        }
        Ok(entity)
    }

    /// Loads rows of this kind matching `sql`, in creation order.
    fn select(&self, sql: &str, key: Option<&str>) -> Result<Vec<E>, SqliteStoreError> {
        let kind = E::KIND.as_str();
        let bound: Vec<&dyn ToSql> = match &key {
            Some(value) => vec![&kind, value],
            None => vec![&kind],
        };
        let guard = lock(&self.connection)?;
        let rows = {
            let mut statement =
                guard.prepare_cached(sql).map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let mapped = statement
                .query_map(bound.as_slice(), |row| {
                    Ok(StoredRow {
                        entity_id: row.get(0)?,
                        bytes: row.get(1)?,
                        hash_value: row.get(2)?,
                        hash_algorithm: row.get(3)?,
                    })
                })
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            mapped
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?
        };
        drop(guard);
        rows.into_iter().map(Self::decode).collect()
    }
}

/// Selects every row of one kind.
const SELECT_ALL_SQL: &str = "SELECT entity_id, entity_json, entity_hash, hash_algorithm FROM \
                              entities WHERE kind = ?1 ORDER BY seq";
/// Selects rows of one kind by name.
const SELECT_BY_NAME_SQL: &str = "SELECT entity_id, entity_json, entity_hash, hash_algorithm \
                                  FROM entities WHERE kind = ?1 AND name = ?2 ORDER BY seq";
/// Selects rows of one kind by id.
const SELECT_BY_ID_SQL: &str = "SELECT entity_id, entity_json, entity_hash, hash_algorithm FROM \
                                entities WHERE kind = ?1 AND entity_id = ?2 ORDER BY seq";

impl<E: Entity> EntityStore<E> for SqliteEntityStore<E> {
    fn find_by_name(&self, name: &str) -> Result<Option<E>, StoreError> {
        Ok(self.select(SELECT_BY_NAME_SQL, Some(name))?.into_iter().next())
    }

    fn find_by_id(&self, id: &E::Id) -> Result<Option<E>, StoreError> {
        Ok(self.select(SELECT_BY_ID_SQL, Some(id.as_ref()))?.into_iter().next())
    }

    fn list(&self) -> Result<Vec<E>, StoreError> {
        Ok(self.select(SELECT_ALL_SQL, None)?)
    }

    fn create(&self, mut entity: E) -> Result<E, StoreError> {
        entity.assign_identity();
        let row = Self::prepare(&entity)?;
        let guard = lock(&self.connection)?;
        guard
            .execute(
                "INSERT INTO entities (kind, entity_id, name, entity_json, entity_hash, \
                 hash_algorithm, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    E::KIND.as_str(),
                    row.entity_id,
                    row.name,
                    row.bytes,
                    row.hash_value,
                    row.hash_algorithm,
                    unix_millis()
                ],
            )
            .map_err(|err| {
                map_db_error(&err, || format!("{} {} already exists", E::KIND, row.entity_id))
            })?;
        drop(guard);
        Ok(entity)
    }

    fn update(&self, current_id: &E::Id, mut entity: E) -> Result<E, StoreError> {
        entity.assign_identity();
        let row = Self::prepare(&entity)?;
        let guard = lock(&self.connection)?;
        let changed = guard
            .execute(
                "UPDATE entities SET entity_id = ?3, name = ?4, entity_json = ?5, entity_hash = \
                 ?6, hash_algorithm = ?7, updated_at = ?8 WHERE kind = ?1 AND entity_id = ?2",
                params![
                    E::KIND.as_str(),
                    current_id.as_ref(),
                    row.entity_id,
                    row.name,
                    row.bytes,
                    row.hash_value,
                    row.hash_algorithm,
                    unix_millis()
                ],
            )
            .map_err(|err| {
                map_db_error(&err, || format!("{} {} already exists", E::KIND, row.entity_id))
            })?;
        drop(guard);
        if changed == 0 {
            return Err(SqliteStoreError::Missing(format!("{} {current_id}", E::KIND)).into());
        }
        Ok(entity)
    }

    fn destroy(&self, id: &E::Id) -> Result<(), StoreError> {
        let guard = lock(&self.connection)?;
        let changed = guard
            .execute(
                "DELETE FROM entities WHERE kind = ?1 AND entity_id = ?2",
                params![E::KIND.as_str(), id.as_ref()],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        drop(guard);
        if changed == 0 {
            return Err(SqliteStoreError::Missing(format!("{} {id}", E::KIND)).into());
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Locks the shared connection.
fn lock(connection: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
    connection.lock().map_err(|_| SqliteStoreError::Db("mutex poisoned".to_string()))
}

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS entities (
                    seq INTEGER PRIMARY KEY AUTOINCREMENT,
                    kind TEXT NOT NULL,
                    entity_id TEXT NOT NULL,
                    name TEXT NOT NULL,
                    entity_json BLOB NOT NULL,
                    entity_hash TEXT NOT NULL,
                    hash_algorithm TEXT NOT NULL,
                    updated_at INTEGER NOT NULL,
                    UNIQUE (kind, entity_id)
                );
                CREATE UNIQUE INDEX IF NOT EXISTS idx_entities_kind_name
                    ON entities (kind, name) WHERE name <> '';",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Returns the current unix epoch in milliseconds.
fn unix_millis() -> i64 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}

/// Parses a hash algorithm label.
fn parse_hash_algorithm(label: &str) -> Result<HashAlgorithm, SqliteStoreError> {
    HashAlgorithm::from_label(label)
        .ok_or_else(|| SqliteStoreError::Invalid(format!("unsupported hash algorithm: {label}")))
}
