//! File-backed stores: the channel registry and milestone history as
//! 4-space-indented JSON objects, and the candidate list as plain text.

use milestone_core::domain::{ChannelRegistry, MilestoneHistory};
use milestone_core::ports::{CandidateSource, HistoryStore, RegistryStore, Result};
use milestone_core::TrackerError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::error::Category;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JsonStoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path} is not a valid record: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl From<JsonStoreError> for TrackerError {
    fn from(err: JsonStoreError) -> Self {
        TrackerError::store("json", err)
    }
}

/// Reads a whole record. A missing, empty or syntactically broken file yields
/// the default record. Well-formed JSON of the wrong shape is an error, since
/// the next save would otherwise overwrite every entry in the file.
fn load_record<T: DeserializeOwned + Default>(path: &Path) -> std::result::Result<T, JsonStoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(T::default()),
        Err(source) => {
            return Err(JsonStoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if content.trim().is_empty() {
        return Ok(T::default());
    }

    match serde_json::from_str(&content) {
        Ok(record) => Ok(record),
        Err(e) if matches!(e.classify(), Category::Syntax | Category::Eof) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "file is empty or contains invalid JSON, initializing as empty"
            );
            Ok(T::default())
        }
        Err(source) => Err(JsonStoreError::Decode {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Replaces the whole file. The record is written to a sibling temp file
/// first and renamed into place.
fn save_record<T: Serialize>(path: &Path, record: &T) -> std::result::Result<(), JsonStoreError> {
    let io_err = |source| JsonStoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    record
        .serialize(&mut ser)
        .map_err(|source| JsonStoreError::Encode {
            path: path.to_path_buf(),
            source,
        })?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(&buf).map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

/// Channel registry stored as `{channel_id: {name, target}}`
pub struct JsonRegistryStore {
    path: PathBuf,
}

impl JsonRegistryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RegistryStore for JsonRegistryStore {
    fn load(&self) -> Result<ChannelRegistry> {
        Ok(load_record(&self.path)?)
    }

    fn save(&self, registry: &ChannelRegistry) -> Result<()> {
        Ok(save_record(&self.path, registry)?)
    }
}

/// Milestone history stored as `{channel_id: {username, history: [{milestone, date}]}}`
pub struct JsonHistoryStore {
    path: PathBuf,
}

impl JsonHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl HistoryStore for JsonHistoryStore {
    fn load(&self) -> Result<MilestoneHistory> {
        Ok(load_record(&self.path)?)
    }

    fn save(&self, history: &MilestoneHistory) -> Result<()> {
        Ok(save_record(&self.path, history)?)
    }
}

/// Candidate channel names, one per line
pub struct TextCandidateSource {
    path: PathBuf,
}

impl TextCandidateSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CandidateSource for TextCandidateSource {
    fn load_names(&self) -> Result<Vec<String>> {
        let content = fs::read_to_string(&self.path).map_err(|source| JsonStoreError::Io {
            path: self.path.clone(),
            source,
        })?;

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use milestone_core::domain::TrackedChannel;
    use tempfile::tempdir;

    #[test]
    fn test_missing_registry_loads_empty() {
        let dir = tempdir().unwrap();
        let store = JsonRegistryStore::new(dir.path().join("channels.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_json_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("milestone_history.json");
        fs::write(&path, "{ not json").unwrap();

        let store = JsonHistoryStore::new(&path);
        assert!(store.load().unwrap().channels.is_empty());
    }

    #[test]
    fn test_truncated_json_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("channels.json");
        fs::write(&path, "{\n    \"UC1\": {\n        \"name\": \"One\",").unwrap();

        assert!(JsonRegistryStore::new(&path).load().unwrap().is_empty());
    }

    #[test]
    fn test_wrong_shaped_history_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("milestone_history.json");
        let contents = r#"{
    "UC_keep": {
        "username": "@keep",
        "history": [{"milestone": 5000000, "date": "2024-01-02"}]
    },
    "UC_bad": {
        "username": "@bad",
        "history": [{"milestone": "6000000", "date": "2024-01-03"}]
    }
}"#;
        fs::write(&path, contents).unwrap();

        let store = JsonHistoryStore::new(&path);
        let err = store.load().unwrap_err();
        assert!(matches!(err, TrackerError::Store { store: "json", .. }));
        assert!(err.to_string().contains("not a valid record"));
        // nothing was overwritten
        assert_eq!(fs::read_to_string(&path).unwrap(), contents);
    }

    #[test]
    fn test_wrong_shaped_registry_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("channels.json");
        fs::write(
            &path,
            r#"{"UC1": {"name": "One", "target": 2000000}, "UC2": {"name": "Two"}}"#,
        )
        .unwrap();

        assert!(matches!(
            JsonRegistryStore::new(&path).load(),
            Err(TrackerError::Store { store: "json", .. })
        ));
    }

    #[test]
    fn test_empty_file_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("channels.json");
        fs::write(&path, "").unwrap();

        assert!(JsonRegistryStore::new(&path).load().unwrap().is_empty());
    }

    #[test]
    fn test_registry_save_then_load_preserves_order() {
        let dir = tempdir().unwrap();
        let store = JsonRegistryStore::new(dir.path().join("channels.json"));

        let mut registry = ChannelRegistry::new();
        registry.insert("UC_z", TrackedChannel { name: "Zed".into(), target: 12_000_000 });
        registry.insert("UC_a", TrackedChannel { name: "Ay".into(), target: 30_000_000 });
        store.save(&registry).unwrap();

        let loaded = store.load().unwrap();
        let keys: Vec<&str> = loaded.channels.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["UC_z", "UC_a"]);
        assert_eq!(loaded, registry);
    }

    #[test]
    fn test_registry_reads_existing_file_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("channels.json");
        fs::write(
            &path,
            r#"{
    "UCX6OQ3DkcsbYNE6H8uQQuVA": {
        "name": "MrBeast",
        "target": 301000000
    }
}"#,
        )
        .unwrap();

        let loaded = JsonRegistryStore::new(&path).load().unwrap();
        assert_eq!(loaded.get("UCX6OQ3DkcsbYNE6H8uQQuVA").unwrap().target, 301_000_000);
    }

    #[test]
    fn test_saved_file_uses_four_space_indent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("channels.json");
        let mut registry = ChannelRegistry::new();
        registry.insert("UC1", TrackedChannel { name: "One".into(), target: 2_000_000 });

        JsonRegistryStore::new(&path).save(&registry).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "{\n    \"UC1\": {\n        \"name\": \"One\",\n        \"target\": 2000000\n    }\n}"
        );
    }

    #[test]
    fn test_history_round_trips_dates() {
        let dir = tempdir().unwrap();
        let store = JsonHistoryStore::new(dir.path().join("milestone_history.json"));
        let mut history = MilestoneHistory::new();
        history.record("UC1", "@one", 5_000_000, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        store.save(&history).unwrap();

        let raw = fs::read_to_string(dir.path().join("milestone_history.json")).unwrap();
        assert!(raw.contains("\"date\": \"2024-02-29\""));
        assert_eq!(store.load().unwrap(), history);
    }

    #[test]
    fn test_candidates_are_trimmed_and_blank_lines_dropped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("channelname.txt");
        fs::write(&path, "  MrBeast \n\nT-Series\r\n   \nCocomelon").unwrap();

        let names = TextCandidateSource::new(&path).load_names().unwrap();
        assert_eq!(names, vec!["MrBeast", "T-Series", "Cocomelon"]);
    }

    #[test]
    fn test_missing_candidate_file_is_an_error() {
        let dir = tempdir().unwrap();
        let source = TextCandidateSource::new(dir.path().join("missing.txt"));
        assert!(matches!(source.load_names(), Err(TrackerError::Store { .. })));
    }
}
