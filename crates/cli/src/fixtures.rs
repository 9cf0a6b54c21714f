//! Reading and writing JSON fixture files.

use std::fs;
use std::path::Path;

use insticator_common::environment::{EnvironmentSnapshot, MemoryEnvironment};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CliError;

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| CliError::Fixture(format!("{}: {}", path.display(), e)))
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CliError> {
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content)?;
    Ok(())
}

/// Load a page environment fixture, or an empty page when none is given.
///
/// A missing file is treated as a fresh browser so `--environment` can be
/// pointed at a path that does not exist yet.
pub(crate) fn load_environment(path: Option<&Path>) -> Result<MemoryEnvironment, CliError> {
    match path {
        Some(path) if path.exists() => {
            let snapshot: EnvironmentSnapshot = read_json(path)?;
            Ok(MemoryEnvironment::from_snapshot(snapshot))
        }
        _ => Ok(MemoryEnvironment::default()),
    }
}

/// Persist storage and cookies so the next run sees the same user id.
pub(crate) fn save_environment(path: &Path, env: &MemoryEnvironment) -> Result<(), CliError> {
    write_json(path, &env.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;
    use insticator_common::host::HostEnvironment;
    use tempfile::TempDir;

    #[test]
    fn test_load_environment_missing_file_is_fresh() {
        let dir = TempDir::new().expect("should create temp dir");
        let env = load_environment(Some(&dir.path().join("env.json")))
            .expect("should create fresh environment");

        assert!(env.local_storage_enabled());
        assert_eq!(env.local_storage_get("anything"), None);
    }

    #[test]
    fn test_environment_round_trips_through_file() {
        let dir = TempDir::new().expect("should create temp dir");
        let path = dir.path().join("env.json");
        fs::write(
            &path,
            r#"{"page": {"hostname": "news.example", "href": "https://news.example/a"},
                "viewport": {"width": 1280, "height": 720},
                "userAgent": "Mozilla/5.0 (iPhone)"}"#,
        )
        .expect("should write fixture");

        let env = load_environment(Some(&path)).expect("should load environment");
        assert_eq!(env.page().hostname, "news.example");
        env.local_storage_set("key", "value");
        save_environment(&path, &env).expect("should save environment");

        let reloaded = load_environment(Some(&path)).expect("should reload environment");
        assert_eq!(reloaded.local_storage_get("key").as_deref(), Some("value"));
        assert_eq!(reloaded.user_agent().as_deref(), Some("Mozilla/5.0 (iPhone)"));
    }

    #[test]
    fn test_read_json_reports_path() {
        let dir = TempDir::new().expect("should create temp dir");
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").expect("should write fixture");

        let err = read_json::<serde_json::Value>(&path).expect_err("should reject bad JSON");
        assert!(err.to_string().contains("broken.json"));
    }
}
