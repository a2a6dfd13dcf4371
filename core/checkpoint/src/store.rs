//! Content-addressed checkpoint store, deduplicated per (workspace, path)
//! against that file's most recent checkpoint, with retention bounded at
//! `EngineConfig::checkpoint_retention` (default K=100) per file.

use std::collections::HashMap;

use agentkit_config::EngineConfig;
use agentkit_error::CoreError;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FileKey {
    workspace: String,
    path: String,
}

/// One stored checkpoint: an opaque id (its content hash), the tag
/// describing which op produced it, and when it was recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointRecord {
    pub id: String,
    pub edit_type: String,
    pub created_at: DateTime<Utc>,
}

/// Result of [`CheckpointStore::save`]: the checkpoint id, and whether
/// this call allocated a new entry or reused the file's most recent one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedCheckpoint {
    pub id: String,
    pub newly_created: bool,
}

pub struct CheckpointStore {
    retention: usize,
    max_content_bytes: usize,
    content_by_hash: HashMap<String, (String, usize)>,
    by_file: HashMap<FileKey, Vec<CheckpointRecord>>,
}

impl CheckpointStore {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            retention: config.checkpoint_retention,
            max_content_bytes: config.checkpoint_max_content_bytes,
            content_by_hash: HashMap::new(),
            by_file: HashMap::new(),
        }
    }

    /// Save `content` as a checkpoint for `(workspace, path)`. If the most
    /// recent existing checkpoint for this file has the same content hash,
    /// this is a no-op that returns that checkpoint's id with
    /// `newly_created=false` (a non-consecutive repeat, or a repeat against
    /// a different file, still produces a new checkpoint).
    pub fn save(&mut self, workspace: &str, path: &str, content: &str, edit_type: &str) -> Result<CreatedCheckpoint, CoreError> {
        if content.len() > self.max_content_bytes {
            return Err(CoreError::ContentTooLarge {
                path: path.to_string(),
                size: content.len(),
                limit: self.max_content_bytes,
            });
        }
        let id = hash_content(content);
        let key = FileKey { workspace: workspace.to_string(), path: path.to_string() };
        let records = self.by_file.entry(key).or_default();

        if let Some(last) = records.last() {
            if last.id == id {
                return Ok(CreatedCheckpoint { id, newly_created: false });
            }
        }

        self.content_by_hash
            .entry(id.clone())
            .and_modify(|(_, refcount)| *refcount += 1)
            .or_insert_with(|| (content.to_string(), 1));
        records.push(CheckpointRecord { id: id.clone(), edit_type: edit_type.to_string(), created_at: Utc::now() });

        while records.len() > self.retention {
            let evicted = records.remove(0);
            self.release(&evicted.id);
        }

        Ok(CreatedCheckpoint { id, newly_created: true })
    }

    /// Most recent `limit` checkpoints for a file, oldest first.
    pub fn list(&self, workspace: &str, path: &str, limit: usize) -> Vec<CheckpointRecord> {
        let key = FileKey { workspace: workspace.to_string(), path: path.to_string() };
        match self.by_file.get(&key) {
            Some(records) => records.iter().rev().take(limit).rev().cloned().collect(),
            None => Vec::new(),
        }
    }

    /// The file's newest checkpoint, if any.
    pub fn latest(&self, workspace: &str, path: &str) -> Option<CheckpointRecord> {
        let key = FileKey { workspace: workspace.to_string(), path: path.to_string() };
        self.by_file.get(&key)?.last().cloned()
    }

    /// Trim a file's history down to its `keep` most recent checkpoints,
    /// releasing any content no longer referenced by any file.
    pub fn cleanup(&mut self, workspace: &str, path: &str, keep: usize) {
        let key = FileKey { workspace: workspace.to_string(), path: path.to_string() };
        let Some(records) = self.by_file.get_mut(&key) else { return };
        while records.len() > keep {
            let evicted = records.remove(0);
            self.release(&evicted.id);
        }
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.content_by_hash.get(id).map(|(content, _)| content.as_str())
    }

    pub fn retained_count(&self, workspace: &str, path: &str) -> usize {
        let key = FileKey { workspace: workspace.to_string(), path: path.to_string() };
        self.by_file.get(&key).map(Vec::len).unwrap_or(0)
    }

    fn release(&mut self, id: &str) {
        if let Some((_, refcount)) = self.content_by_hash.get_mut(id) {
            *refcount -= 1;
            if *refcount == 0 {
                self.content_by_hash.remove(id);
            }
        }
    }
}

fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(retention: usize) -> EngineConfig {
        EngineConfig {
            checkpoint_retention: retention,
            ..Default::default()
        }
    }

    #[test]
    fn consecutive_identical_content_deduplicates() {
        let mut store = CheckpointStore::new(&config(100));
        let a = store.save("w1", "a.txt", "hello", "file_write").unwrap();
        let b = store.save("w1", "a.txt", "hello", "file_write").unwrap();
        assert_eq!(a.id, b.id);
        assert!(a.newly_created);
        assert!(!b.newly_created);
    }

    #[test]
    fn non_consecutive_repeat_creates_a_new_checkpoint() {
        let mut store = CheckpointStore::new(&config(100));
        let x1 = store.save("w1", "a.txt", "x", "file_edit").unwrap();
        store.save("w1", "a.txt", "y", "file_edit").unwrap();
        let x2 = store.save("w1", "a.txt", "x", "file_edit").unwrap();
        assert!(x2.newly_created);
        assert_eq!(x1.id, x2.id);
        assert_eq!(store.retained_count("w1", "a.txt"), 3);
    }

    #[test]
    fn retention_evicts_oldest_checkpoint_for_the_file_only() {
        let mut store = CheckpointStore::new(&config(2));
        let first = store.save("w1", "a.txt", "v1", "file_edit").unwrap();
        store.save("w1", "a.txt", "v2", "file_edit").unwrap();
        store.save("w1", "a.txt", "v3", "file_edit").unwrap();
        assert_eq!(store.retained_count("w1", "a.txt"), 2);
        assert!(store.get(&first.id).is_none());
    }

    #[test]
    fn retention_is_scoped_per_file_not_per_workspace() {
        let mut store = CheckpointStore::new(&config(1));
        store.save("w1", "a.txt", "a-content", "file_write").unwrap();
        store.save("w1", "b.txt", "b-content", "file_write").unwrap();
        assert_eq!(store.retained_count("w1", "a.txt"), 1);
        assert_eq!(store.retained_count("w1", "b.txt"), 1);
    }

    #[test]
    fn shared_content_across_files_is_not_evicted_early() {
        let mut store = CheckpointStore::new(&config(1));
        let shared = store.save("w1", "a.txt", "shared", "file_write").unwrap();
        store.save("w1", "b.txt", "shared", "file_write").unwrap();
        // evicting a.txt's single slot must not remove content b.txt still holds.
        store.save("w1", "a.txt", "other", "file_write").unwrap();
        assert!(store.get(&shared.id).is_some());
    }

    #[test]
    fn oversized_content_is_rejected() {
        let mut store = CheckpointStore::new(&EngineConfig {
            checkpoint_max_content_bytes: 4,
            ..Default::default()
        });
        assert!(matches!(
            store.save("w1", "a.txt", "way too long", "file_write"),
            Err(CoreError::ContentTooLarge { .. })
        ));
    }

    #[test]
    fn list_and_latest_reflect_recorded_order() {
        let mut store = CheckpointStore::new(&config(100));
        store.save("w1", "a.txt", "v1", "file_write").unwrap();
        let v2 = store.save("w1", "a.txt", "v2", "file_edit").unwrap();
        let listed = store.list("w1", "a.txt", 10);
        assert_eq!(listed.len(), 2);
        assert_eq!(listed.last().unwrap().id, v2.id);
        assert_eq!(store.latest("w1", "a.txt").unwrap().id, v2.id);
    }

    #[test]
    fn cleanup_trims_a_file_down_to_keep() {
        let mut store = CheckpointStore::new(&config(100));
        store.save("w1", "a.txt", "v1", "file_write").unwrap();
        store.save("w1", "a.txt", "v2", "file_edit").unwrap();
        store.save("w1", "a.txt", "v3", "file_edit").unwrap();
        store.cleanup("w1", "a.txt", 1);
        assert_eq!(store.retained_count("w1", "a.txt"), 1);
    }
}
