// crates/gateway-workspace-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across integration tests for gateway-workspace-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::path::Path;

use gateway_workspace_config::ConfigError;
use gateway_workspace_config::WorkspaceConfig;
use gateway_workspace_core::HttpVerb;
use gateway_workspace_core::Mapping;
use gateway_workspace_core::Pipeline;
use gateway_workspace_core::PipelineId;
use gateway_workspace_core::Policy;
use gateway_workspace_core::PolicyConfigDocument;

/// Parses a TOML string into a `WorkspaceConfig` for tests.
pub fn config_from_toml(toml_str: &str) -> Result<WorkspaceConfig, toml::de::Error> {
    toml::from_str(toml_str)
}

/// Returns a minimal config with all defaults applied.
pub fn minimal_config() -> Result<WorkspaceConfig, toml::de::Error> {
    config_from_toml("")
}

/// Writes `contents` to `dir/gateway-workspace.toml` and loads it.
pub fn load_from(dir: &Path, contents: &str) -> Result<WorkspaceConfig, ConfigError> {
    let path = dir.join("gateway-workspace.toml");
    std::fs::write(&path, contents).map_err(|err| ConfigError::Io(err.to_string()))?;
    WorkspaceConfig::load(Some(&path))
}

/// Asserts that `result` failed with a message containing `needle`.
pub fn assert_invalid<T>(result: Result<T, ConfigError>, needle: &str) -> Result<(), String> {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}

/// Returns a small policy-config document with one auth-protected route.
pub fn sample_document() -> PolicyConfigDocument {
    PolicyConfigDocument {
        policies: vec![
            Policy::auth("auth-catalog", ["catalog"]),
            Policy::new("rate-limiter-per-minute", "rateLimiting").with_setting("limit", 60),
        ],
        pipelines: vec![
            Pipeline::new("default-pipeline")
                .with_policies(["auth-catalog", "rate-limiter-per-minute"]),
        ],
        mappings: vec![Mapping::new(
            "catalog",
            HttpVerb::Get,
            "/api/catalog",
            Some(PipelineId::new("default-pipeline")),
        )],
    }
}
