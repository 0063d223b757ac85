use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::info;

use super::json_file::{self, StoreError};
use super::models::{GroupConfig, GroupDocument, RequestRecord};
use crate::platform::{ChannelId, MessageId};

/// Repository for the group state document. Holds the in-memory copy; every
/// mutation is followed by an explicit [`GroupStore::save`] from the caller.
#[derive(Debug)]
pub struct GroupStore {
    path: PathBuf,
    doc: GroupDocument,
}

impl GroupStore {
    /// Load the state file. Fails if the file is missing or malformed.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let doc: GroupDocument = json_file::load(&path)?;
        info!(
            path = %path.display(),
            groups = doc.groups.len(),
            requests = doc.requested.len(),
            "loaded group state"
        );
        Ok(Self { path, doc })
    }

    /// Write the whole document back to disk.
    pub fn save(&self) -> Result<(), StoreError> {
        json_file::save(&self.path, &self.doc)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // ── Groups ──────────────────────────────────────────────────────

    pub fn groups(&self) -> &BTreeMap<ChannelId, GroupConfig> {
        &self.doc.groups
    }

    pub fn group(&self, channel_id: &str) -> Option<&GroupConfig> {
        self.doc.groups.get(channel_id)
    }

    pub fn insert_group(&mut self, channel_id: ChannelId, group: GroupConfig) {
        self.doc.groups.insert(channel_id, group);
    }

    pub fn remove_group(&mut self, channel_id: &str) -> Option<GroupConfig> {
        self.doc.groups.remove(channel_id)
    }

    /// Swap in a complete group mapping (bulk initialization).
    pub fn replace_groups(&mut self, groups: BTreeMap<ChannelId, GroupConfig>) {
        self.doc.groups = groups;
    }

    // ── Requests ────────────────────────────────────────────────────

    pub fn requests(&self) -> &BTreeMap<MessageId, RequestRecord> {
        &self.doc.requested
    }

    pub fn request(&self, message_id: &str) -> Option<&RequestRecord> {
        self.doc.requested.get(message_id)
    }

    pub fn insert_request(&mut self, message_id: MessageId, request: RequestRecord) {
        self.doc.requested.insert(message_id, request);
    }

    pub fn remove_request(&mut self, message_id: &str) -> Option<RequestRecord> {
        self.doc.requested.remove(message_id)
    }

    // ── Directory ───────────────────────────────────────────────────

    pub fn directory_message_id(&self) -> Option<&str> {
        self.doc.messageid.as_deref()
    }

    pub fn set_directory_message_id(&mut self, message_id: MessageId) {
        self.doc.messageid = Some(message_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_group(channel_id: &str) -> GroupConfig {
        GroupConfig {
            owner_id: "42".into(),
            course: "1142".into(),
            name: "mathegenies".into(),
            semester: "sose22".into(),
            is_open: true,
            channel_id: Some(channel_id.into()),
            last_rename: None,
        }
    }

    fn empty_store() -> (tempfile::TempDir, GroupStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("groups.json");
        std::fs::write(&path, r#"{"requested": {}, "groups": {}}"#).unwrap();
        let store = GroupStore::load(&path).unwrap();
        (dir, store)
    }

    #[test]
    fn test_load_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = GroupStore::load(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_load_rejects_document_without_maps() {
        let dir = tempfile::tempdir().unwrap();
        for contents in ["{}", r#"{"requested": {}}"#, r#"{"groups": {}, "messageid": null}"#] {
            let path = dir.path().join("groups.json");
            std::fs::write(&path, contents).unwrap();
            let err = GroupStore::load(&path).unwrap_err();
            assert!(matches!(err, StoreError::Parse { .. }), "{contents} loaded");
        }
    }

    #[test]
    fn test_mutations_persist_after_save() {
        let (_dir, mut store) = empty_store();
        store.insert_group("100".into(), sample_group("100"));
        store.insert_request("555".into(), sample_group("ignored"));
        store.set_directory_message_id("999".into());
        store.save().unwrap();

        let reloaded = GroupStore::load(store.path()).unwrap();
        assert_eq!(reloaded.group("100"), Some(&sample_group("100")));
        assert!(reloaded.request("555").is_some());
        assert_eq!(reloaded.directory_message_id(), Some("999"));
    }

    #[test]
    fn test_unsaved_mutations_stay_in_memory() {
        let (_dir, mut store) = empty_store();
        store.insert_group("100".into(), sample_group("100"));

        let reloaded = GroupStore::load(store.path()).unwrap();
        assert!(reloaded.groups().is_empty());
    }

    #[test]
    fn test_remove_and_replace() {
        let (_dir, mut store) = empty_store();
        store.insert_group("100".into(), sample_group("100"));
        assert!(store.remove_group("100").is_some());
        assert!(store.remove_group("100").is_none());

        let mut all = BTreeMap::new();
        all.insert("1".to_string(), sample_group("1"));
        all.insert("2".to_string(), sample_group("2"));
        store.replace_groups(all);
        assert_eq!(store.groups().len(), 2);
    }
}
