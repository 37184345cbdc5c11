// crates/gateway-workspace-config/src/artifact.rs
// ============================================================================
// Module: Policy Config Artifact
// Description: Read and write the persisted policy-config JSON document.
// Purpose: Bounded reads and crash-safe writes of the workspace artifact.
// Dependencies: gateway-workspace-core, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The workspace artifact is a JSON document with `policies`, `pipelines`,
//! and `mappings` arrays. Reads are size-capped before parsing. Writes go to
//! a sibling temporary file that is synced and then renamed over the target,
//! so readers never observe a half-written document.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use gateway_workspace_core::PolicyConfigDocument;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum artifact size accepted on read.
pub const MAX_ARTIFACT_BYTES: usize = 16 * 1024 * 1024;
/// Attempts made to allocate a unique temporary file.
const TEMP_ATTEMPTS: usize = 16;
/// Per-process counter for temporary file names.
static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Artifact read/write errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtifactError {
    /// Filesystem failure.
    #[error("artifact io error: {0}")]
    Io(String),
    /// Document is not valid JSON for the expected shape.
    #[error("artifact parse error: {0}")]
    Parse(String),
    /// Document exceeded the size limit.
    #[error("artifact too large: {actual_bytes} bytes (max {max_bytes})")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual size in bytes.
        actual_bytes: usize,
    },
}

// ============================================================================
// SECTION: Read / Write
// ============================================================================

/// Reads a policy-config document from `path`.
///
/// # Errors
///
/// Returns [`ArtifactError`] when the file cannot be read, is too large, or
/// does not parse.
pub fn read_policy_config(path: &Path) -> Result<PolicyConfigDocument, ArtifactError> {
    let bytes = fs::read(path).map_err(|err| ArtifactError::Io(err.to_string()))?;
    if bytes.len() > MAX_ARTIFACT_BYTES {
        return Err(ArtifactError::TooLarge {
            max_bytes: MAX_ARTIFACT_BYTES,
            actual_bytes: bytes.len(),
        });
    }
    serde_json::from_slice(&bytes).map_err(|err| ArtifactError::Parse(err.to_string()))
}

/// Writes `document` to `path` as pretty JSON, replacing any existing file.
///
/// # Errors
///
/// Returns [`ArtifactError::Io`] when any filesystem step fails.
pub fn write_policy_config(
    path: &Path,
    document: &PolicyConfigDocument,
) -> Result<(), ArtifactError> {
    let mut contents =
        serde_json::to_vec_pretty(document).map_err(|err| ArtifactError::Parse(err.to_string()))?;
    contents.push(b'\n');
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|err| ArtifactError::Io(err.to_string()))?;
    }
    let (temp_path, mut file) = create_temp_file(path)?;
    if let Err(err) = file.write_all(&contents).and_then(|()| file.sync_all()) {
        let _ = fs::remove_file(&temp_path);
        return Err(ArtifactError::Io(err.to_string()));
    }
    drop(file);
    fs::rename(&temp_path, path).map_err(|err| {
        let _ = fs::remove_file(&temp_path);
        ArtifactError::Io(err.to_string())
    })
}

/// Creates a unique temporary file next to `path`.
fn create_temp_file(path: &Path) -> Result<(PathBuf, fs::File), ArtifactError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| ArtifactError::Io("artifact path does not include a file name".to_string()))?;
    for _ in 0 .. TEMP_ATTEMPTS {
        let attempt = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let temp_path = parent.join(format!(".{file_name}.tmp.{}.{attempt}", std::process::id()));
        match OpenOptions::new().write(true).create_new(true).open(&temp_path) {
            Ok(file) => return Ok((temp_path, file)),
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(err) => return Err(ArtifactError::Io(err.to_string())),
        }
    }
    Err(ArtifactError::Io("failed to allocate temporary artifact path".to_string()))
}
