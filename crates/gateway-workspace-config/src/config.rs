// crates/gateway-workspace-config/src/config.rs
// ============================================================================
// Module: Gateway Workspace Configuration
// Description: Configuration loading and validation for the gateway workspace.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: gateway-workspace-core, gateway-workspace-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing or invalid configuration fails closed. A validated
//! [`WorkspaceConfig`] can assemble a ready [`GatewayWorkspace`]: stores,
//! cascade fan-out, audit sink, and an optional artifact import.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use gateway_workspace_core::DEFAULT_MAX_PARALLELISM;
use gateway_workspace_core::GatewayWorkspace;
use gateway_workspace_core::MAX_PARALLELISM_LIMIT;
use gateway_workspace_core::WorkspaceAuditSink;
use gateway_workspace_core::WorkspaceError;
use gateway_workspace_core::WorkspaceFileAuditSink;
use gateway_workspace_core::WorkspaceNoopAuditSink;
use gateway_workspace_core::WorkspaceOptions;
use gateway_workspace_core::WorkspaceStderrAuditSink;
use gateway_workspace_core::WorkspaceStores;
use gateway_workspace_store_sqlite::SqliteStoreConfig;
use gateway_workspace_store_sqlite::SqliteStoreMode;
use gateway_workspace_store_sqlite::SqliteSyncMode;
use gateway_workspace_store_sqlite::SqliteWorkspaceDatabase;
use serde::Deserialize;
use thiserror::Error;

use crate::artifact::ArtifactError;
use crate::artifact::read_policy_config;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "gateway-workspace.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "GATEWAY_WORKSPACE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default `SQLite` busy timeout in milliseconds.
const DEFAULT_STORE_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum `SQLite` busy timeout in milliseconds.
pub(crate) const MAX_STORE_BUSY_TIMEOUT_MS: u64 = 60_000;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Gateway workspace configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkspaceConfig {
    /// Entity store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Cascade fan-out configuration.
    #[serde(default)]
    pub cascade: CascadeConfig,
    /// Audit sink configuration.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Policy-config artifact configuration.
    #[serde(default)]
    pub artifact: ArtifactConfig,
}

impl WorkspaceConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store.validate()?;
        self.cascade.validate()?;
        self.audit.validate()?;
        self.artifact.validate()?;
        Ok(())
    }

    /// Returns the workspace options derived from this configuration.
    #[must_use]
    pub const fn workspace_options(&self) -> WorkspaceOptions {
        WorkspaceOptions {
            max_parallelism: self.cascade.max_parallelism,
        }
    }

    /// Assembles a workspace from this configuration.
    ///
    /// When `artifact.load_on_open` is set and the stores are empty, the
    /// artifact is imported; a populated store is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when validation fails, the store or audit log
    /// cannot be opened, or the artifact cannot be read or imported.
    pub fn open_workspace(&self) -> Result<GatewayWorkspace, ConfigError> {
        self.validate()?;
        let stores = self.store.open_stores()?;
        let audit = self.audit.build_sink()?;
        let workspace = GatewayWorkspace::with_options(stores, self.workspace_options(), audit);
        if self.artifact.load_on_open
            && let Some(path) = &self.artifact.path
            && workspace.export_document()?.is_empty()
        {
            let document = read_policy_config(path)?;
            workspace.import_document(document)?;
        }
        Ok(workspace)
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Entity store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Store backend type.
    #[serde(rename = "type", default)]
    pub store_type: StoreType,
    /// `SQLite` database path when using the sqlite backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_store_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_type: StoreType::default(),
            path: None,
            busy_timeout_ms: default_store_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl StoreConfig {
    /// Validates store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.store_type {
            StoreType::Memory => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid("memory store must not set path".to_string()));
                }
                Ok(())
            }
            StoreType::Sqlite => {
                let path = self.path.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("sqlite store requires path".to_string())
                })?;
                validate_path_string("store.path", &path.to_string_lossy())?;
                if self.busy_timeout_ms > MAX_STORE_BUSY_TIMEOUT_MS {
                    return Err(ConfigError::Invalid(format!(
                        "store.busy_timeout_ms must be at most {MAX_STORE_BUSY_TIMEOUT_MS}"
                    )));
                }
                Ok(())
            }
        }
    }

    /// Returns the `SQLite` settings when the sqlite backend is selected.
    #[must_use]
    pub fn sqlite_config(&self) -> Option<SqliteStoreConfig> {
        match (self.store_type, &self.path) {
            (StoreType::Sqlite, Some(path)) => Some(SqliteStoreConfig {
                path: path.clone(),
                busy_timeout_ms: self.busy_timeout_ms,
                journal_mode: self.journal_mode,
                sync_mode: self.sync_mode,
            }),
            _ => None,
        }
    }

    /// Opens the configured stores.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Store`] when the `SQLite` database cannot be
    /// opened.
    pub fn open_stores(&self) -> Result<WorkspaceStores, ConfigError> {
        match self.sqlite_config() {
            Some(config) => {
                let database = SqliteWorkspaceDatabase::open(&config)
                    .map_err(|err| ConfigError::Store(err.to_string()))?;
                Ok(database.workspace_stores())
            }
            None => Ok(WorkspaceStores::in_memory()),
        }
    }
}

/// Entity store backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    /// Use the in-memory store.
    #[default]
    Memory,
    /// Use the `SQLite`-backed durable store.
    Sqlite,
}

/// Returns the default busy timeout for `SQLite` stores.
const fn default_store_busy_timeout_ms() -> u64 {
    DEFAULT_STORE_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Cascade
// ============================================================================

/// Cascade fan-out configuration.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CascadeConfig {
    /// Maximum concurrent referencing-record writes per cascade.
    #[serde(default = "default_max_parallelism")]
    pub max_parallelism: usize,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            max_parallelism: default_max_parallelism(),
        }
    }
}

impl CascadeConfig {
    /// Validates cascade configuration.
    fn validate(self) -> Result<(), ConfigError> {
        if !(1 ..= MAX_PARALLELISM_LIMIT).contains(&self.max_parallelism) {
            return Err(ConfigError::Invalid(format!(
                "cascade.max_parallelism must be between 1 and {MAX_PARALLELISM_LIMIT}"
            )));
        }
        Ok(())
    }
}

/// Returns the default cascade fan-out bound.
const fn default_max_parallelism() -> usize {
    DEFAULT_MAX_PARALLELISM
}

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Audit sink configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditConfig {
    /// Sink type.
    #[serde(default)]
    pub sink: AuditSinkType,
    /// Log file path for the file sink.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkType::File, None) => {
                Err(ConfigError::Invalid("file audit sink requires path".to_string()))
            }
            (AuditSinkType::File, Some(path)) => {
                validate_path_string("audit.path", &path.to_string_lossy())
            }
            (_, Some(_)) => {
                Err(ConfigError::Invalid("audit.path is only valid for the file sink".to_string()))
            }
            (_, None) => Ok(()),
        }
    }

    /// Builds the configured audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the audit log cannot be opened.
    pub fn build_sink(&self) -> Result<Arc<dyn WorkspaceAuditSink>, ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkType::File, Some(path)) => {
                let sink = WorkspaceFileAuditSink::new(path)
                    .map_err(|err| ConfigError::Io(err.to_string()))?;
                Ok(Arc::new(sink))
            }
            (AuditSinkType::File, None) => {
                Err(ConfigError::Invalid("file audit sink requires path".to_string()))
            }
            (AuditSinkType::Stderr, _) => Ok(Arc::new(WorkspaceStderrAuditSink)),
            (AuditSinkType::None, _) => Ok(Arc::new(WorkspaceNoopAuditSink)),
        }
    }
}

/// Audit sink type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkType {
    /// Discard audit events.
    #[default]
    None,
    /// JSON lines on stderr.
    Stderr,
    /// JSON lines appended to a file.
    File,
}

// ============================================================================
// SECTION: Artifact
// ============================================================================

/// Policy-config artifact configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtifactConfig {
    /// Path to the policy-config JSON document.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Import the artifact into empty stores on open.
    #[serde(default)]
    pub load_on_open: bool,
}

impl ArtifactConfig {
    /// Validates artifact configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match &self.path {
            Some(path) => validate_path_string("artifact.path", &path.to_string_lossy()),
            None if self.load_on_open => {
                Err(ConfigError::Invalid("artifact.load_on_open requires path".to_string()))
            }
            None => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
    /// Configured store could not be opened.
    #[error("config store error: {0}")]
    Store(String),
    /// Configured artifact could not be read.
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    /// Workspace rejected the configured artifact.
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from an explicit path or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a configured path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} component too long")));
        }
    }
    Ok(())
}
