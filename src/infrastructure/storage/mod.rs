//! File-based record storage
//!
//! One `users` file per scope, one record per line. The whole file is
//! rehydrated into an in-memory index on open and rewritten atomically
//! (temp file + rename) on every mutation.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::application::errors::StoreError;
use crate::domain::entities::ModerationRecord;
use crate::domain::traits::RecordStore;

const RECORDS_FILE: &str = "users";

#[derive(Debug, Default)]
struct Index {
    records: Vec<ModerationRecord>,
    positions: HashMap<String, usize>,
}

impl Index {
    fn render(records: &[ModerationRecord]) -> String {
        let mut out = String::new();
        for record in records {
            out.push_str(&record.to_line());
            out.push('\n');
        }
        out
    }
}

/// Scope ids become a directory name under the data dir, so they must stay inside it
pub fn is_valid_scope_id(scope: &str) -> bool {
    !scope.is_empty() && !scope.contains(['/', '\\']) && !scope.starts_with('.')
}

/// Line-format store for a single scope
#[derive(Debug)]
pub struct FileRecordStore {
    path: PathBuf,
    index: RwLock<Index>,
}

impl FileRecordStore {
    /// Open the store for `scope` under `base_path`, creating directories as needed
    pub async fn open(base_path: impl AsRef<Path>, scope: &str) -> Result<Self, StoreError> {
        if !is_valid_scope_id(scope) {
            return Err(StoreError::Invalid(format!("invalid scope id {:?}", scope)));
        }
        let dir = base_path.as_ref().join(scope);
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(RECORDS_FILE);
        let index = load(&path).await?;
        tracing::debug!("Loaded {} record(s) from {}", index.records.len(), path.display());
        Ok(Self {
            path,
            index: RwLock::new(index),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn load(path: &Path) -> Result<Index, StoreError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Index::default()),
        Err(e) => return Err(e.into()),
    };

    let mut index = Index::default();
    for (n, line) in content.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        let record = ModerationRecord::from_line(line)
            .map_err(|reason| StoreError::Corrupt { line: n + 1, reason })?;
        if index.positions.contains_key(&record.id) {
            tracing::warn!("Duplicate record for {} on line {}, keeping the first", record.id, n + 1);
            continue;
        }
        index.positions.insert(record.id.clone(), index.records.len());
        index.records.push(record);
    }
    Ok(index)
}

/// Write the full contents next to `path` and rename over it
async fn write_atomic(path: &Path, contents: &str) -> Result<(), StoreError> {
    let tmp = path.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(contents.as_bytes()).await?;
    file.sync_all().await?;
    drop(file);
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn get(&self, id: &str) -> Result<Option<ModerationRecord>, StoreError> {
        let index = self.index.read().await;
        Ok(index.positions.get(id).map(|&i| index.records[i].clone()))
    }

    async fn upsert(&self, record: &ModerationRecord) -> Result<(), StoreError> {
        record.validate().map_err(StoreError::Invalid)?;

        let mut index = self.index.write().await;
        let mut records = index.records.clone();
        let position = index.positions.get(&record.id).copied();
        match position {
            Some(i) => records[i] = record.clone(),
            None => records.push(record.clone()),
        }

        write_atomic(&self.path, &Index::render(&records)).await?;

        if position.is_none() {
            index.positions.insert(record.id.clone(), records.len() - 1);
        }
        index.records = records;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ModerationRecord>, StoreError> {
        Ok(self.index.read().await.records.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, strikes: u32) -> ModerationRecord {
        ModerationRecord {
            strikes,
            ..ModerationRecord::new(id)
        }
    }

    #[tokio::test]
    async fn test_get_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRecordStore::open(dir.path(), "guild").await.unwrap();
        assert!(store.get("nobody").await.unwrap().is_none());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_replaces_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRecordStore::open(dir.path(), "guild").await.unwrap();

        store.upsert(&record("a", 1)).await.unwrap();
        store.upsert(&record("b", 0)).await.unwrap();
        store.upsert(&record("c", 2)).await.unwrap();
        store.upsert(&record("b", 5)).await.unwrap();

        let ids: Vec<(String, u32)> = store.list().await.unwrap().into_iter().map(|r| (r.id, r.strikes)).collect();
        let expected: Vec<(String, u32)> = vec![("a".to_string(), 1), ("b".to_string(), 5), ("c".to_string(), 2)];
        assert_eq!(ids, expected);

        let on_disk = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(on_disk, "a|1|0|0|\nb|5|0|0|\nc|2|0|0|\n");
    }

    #[tokio::test]
    async fn test_reopen_rehydrates() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileRecordStore::open(dir.path(), "guild").await.unwrap();
            let mut r = record("x", 3);
            r.unban_at = 1_700_000_000_000;
            r.courses = vec!["math-hl".to_string()];
            store.upsert(&r).await.unwrap();
            store.upsert(&record("y", 0)).await.unwrap();
        }

        let store = FileRecordStore::open(dir.path(), "guild").await.unwrap();
        let x = store.get("x").await.unwrap().unwrap();
        assert_eq!(x.strikes, 3);
        assert_eq!(x.unban_at, 1_700_000_000_000);
        assert_eq!(x.courses, vec!["math-hl"]);
        assert_eq!(store.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_scopes_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let one = FileRecordStore::open(dir.path(), "one").await.unwrap();
        let two = FileRecordStore::open(dir.path(), "two").await.unwrap();
        one.upsert(&record("a", 1)).await.unwrap();
        assert!(two.get("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejects_scope_outside_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("data");
        for scope in ["../x", "", ".hidden", "a/b", "a\\b"] {
            let err = FileRecordStore::open(&base, scope).await.unwrap_err();
            assert!(matches!(err, StoreError::Invalid(_)), "{:?} was accepted", scope);
        }
        assert!(!dir.path().join("x").exists());
        assert!(!base.exists());
    }

    #[tokio::test]
    async fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("guild")).unwrap();
        std::fs::write(dir.path().join("guild").join("users"), "a|0|0|0|\nbroken\n").unwrap();

        let err = FileRecordStore::open(dir.path(), "guild").await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { line: 2, .. }));
    }

    #[tokio::test]
    async fn test_invalid_record_leaves_file_intact() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRecordStore::open(dir.path(), "guild").await.unwrap();
        store.upsert(&record("a", 1)).await.unwrap();

        let err = store.upsert(&record("bad|id", 0)).await.unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "a|1|0|0|\n");
        assert_eq!(store.list().await.unwrap().len(), 1);
    }
}
