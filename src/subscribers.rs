use crate::BoxError;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

/// Deduplicated set of messaging subscriber ids, persisted one per line.
///
/// The webhook listener and the form request path share one instance; the
/// lock makes the load-add-rewrite cycle a single-writer section instead of
/// the raw concurrent file rewrites the listener and form app used to race
/// on.
pub struct SubscriberStore {
    path: PathBuf,
    ids: RwLock<HashSet<String>>,
}

impl SubscriberStore {
    /// Load the subscriber list from disk. A missing file is an empty set.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, BoxError> {
        let path = path.into();
        let mut ids = HashSet::new();

        if path.exists() {
            let content = fs::read_to_string(&path)?;
            for line in content.lines() {
                let id = line.trim();
                if !id.is_empty() {
                    ids.insert(id.to_string());
                }
            }
        }

        Ok(SubscriberStore {
            path,
            ids: RwLock::new(ids),
        })
    }

    /// Add a subscriber id, rewriting the backing file if it was new.
    ///
    /// Idempotent: re-adding a known id is a no-op on both the set and the
    /// file. Returns whether the id was new.
    pub fn add(&self, id: &str) -> Result<bool, BoxError> {
        let id = id.trim();
        if id.is_empty() {
            return Ok(false);
        }

        let mut ids = self.ids.write().unwrap();
        if !ids.insert(id.to_string()) {
            return Ok(false);
        }
        self.save(&ids)?;
        Ok(true)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.read().unwrap().contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all known subscriber ids.
    pub fn all(&self) -> Vec<String> {
        let ids = self.ids.read().unwrap();
        let mut all: Vec<String> = ids.iter().cloned().collect();
        all.sort();
        all
    }

    fn save(&self, ids: &HashSet<String>) -> Result<(), BoxError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut sorted: Vec<&String> = ids.iter().collect();
        sorted.sort();
        let mut content = String::new();
        for id in sorted {
            content.push_str(id);
            content.push('\n');
        }
        fs::write(&self.path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SubscriberStore::load(dir.path().join("subscribers.txt")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn add_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SubscriberStore::load(dir.path().join("subscribers.txt")).unwrap();

        assert!(store.add("U1234").unwrap());
        assert_eq!(store.len(), 1);

        // Repeating the same id is a no-op on set size
        assert!(!store.add("U1234").unwrap());
        assert_eq!(store.len(), 1);

        assert!(store.add("U5678").unwrap());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn persists_across_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subscribers.txt");

        let store = SubscriberStore::load(&path).unwrap();
        store.add("U1").unwrap();
        store.add("U2").unwrap();

        let reloaded = SubscriberStore::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains("U1"));
        assert!(reloaded.contains("U2"));
    }

    #[test]
    fn blank_ids_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = SubscriberStore::load(dir.path().join("subscribers.txt")).unwrap();
        assert!(!store.add("   ").unwrap());
        assert!(store.is_empty());
    }
}
