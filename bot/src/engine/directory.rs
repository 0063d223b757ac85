use std::collections::BTreeMap;

use tracing::{info, warn};

use super::error::GroupError;
use crate::platform::{ChannelId, ChatPlatform, OutgoingMessage, PlatformError, channel_mention};
use crate::store::models::GroupConfig;
use crate::store::{GroupStore, HeaderStore};

pub const DIRECTORY_TITLE: &str = "**Learning groups**";

/// Render the directory of open groups, grouped by course.
pub fn render_directory(groups: &BTreeMap<ChannelId, GroupConfig>, headers: &HeaderStore) -> String {
    let mut open: Vec<&GroupConfig> = groups.values().filter(|g| g.is_open).collect();
    open.sort_by(|a, b| (&a.course, &a.name).cmp(&(&b.course, &b.name)));

    let mut msg = format!("{DIRECTORY_TITLE}\n\n");
    let mut current_course: Option<&str> = None;

    for group in open {
        let Some(channel_id) = group.channel_id.as_deref() else {
            warn!(course = %group.course, name = %group.name, "open group without channel");
            continue;
        };

        if current_course != Some(group.course.as_str()) {
            match headers.get(&group.course) {
                Some(header) => msg.push_str(&format!("**{header}**\n")),
                None => msg.push_str(&format!(
                    "**{} - -------------------------------------**\n",
                    group.course
                )),
            }
            current_course = Some(group.course.as_str());
        }

        msg.push_str(&format!("    {}\n", channel_mention(channel_id)));
    }

    msg
}

/// Keeps the single directory message in the directory channel up to date.
#[derive(Debug, Clone)]
pub struct DirectoryPublisher {
    channel_id: ChannelId,
}

impl DirectoryPublisher {
    pub fn new(channel_id: ChannelId) -> Self {
        Self { channel_id }
    }

    /// Re-render and publish. Edits the stored message in place; sends a new
    /// one (and records its id in the store) when none exists yet or the old
    /// one is gone. The caller persists the store.
    pub async fn publish(
        &self,
        platform: &dyn ChatPlatform,
        store: &mut GroupStore,
        headers: &HeaderStore,
    ) -> Result<(), GroupError> {
        let content = render_directory(store.groups(), headers);

        if let Some(message_id) = store.directory_message_id() {
            match platform
                .edit_message(&self.channel_id, message_id, &content)
                .await
            {
                Ok(()) => return Ok(()),
                Err(PlatformError::NotFound { .. }) => {
                    warn!(%message_id, "directory message is gone, posting a new one");
                }
                Err(e) => return Err(e.into()),
            }
        }

        let message_id = platform
            .send_message(&self.channel_id, OutgoingMessage::text(content))
            .await?;
        info!(%message_id, "directory message posted");
        store.set_directory_message_id(message_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::memory::MemoryPlatform;

    fn group(channel: &str, course: &str, name: &str, is_open: bool) -> GroupConfig {
        GroupConfig {
            owner_id: "1".into(),
            course: course.into(),
            name: name.into(),
            semester: "sose22".into(),
            is_open,
            channel_id: Some(channel.into()),
            last_rename: None,
        }
    }

    fn stores(headers_json: &str) -> (tempfile::TempDir, GroupStore, HeaderStore) {
        let dir = tempfile::tempdir().unwrap();
        let groups = dir.path().join("groups.json");
        let courses = dir.path().join("courses.json");
        std::fs::write(&groups, r#"{"requested": {}, "groups": {}}"#).unwrap();
        std::fs::write(&courses, headers_json).unwrap();
        let store = GroupStore::load(groups).unwrap();
        let headers = HeaderStore::load(courses).unwrap();
        (dir, store, headers)
    }

    #[test]
    fn test_single_group_under_registered_header() {
        let (_dir, mut store, headers) = stores(r#"{"1234": "1234 - Algebra"}"#);
        store.insert_group("10".into(), group("10", "1234", "algebra", true));

        let text = render_directory(store.groups(), &headers);
        assert_eq!(text.matches("**1234 - Algebra**").count(), 1);
        assert_eq!(text.matches("<#10>").count(), 1);
        assert_eq!(
            text,
            "**Learning groups**\n\n**1234 - Algebra**\n    <#10>\n"
        );
    }

    #[test]
    fn test_closed_groups_are_not_listed() {
        let (_dir, mut store, headers) = stores("{}");
        store.insert_group("10".into(), group("10", "1234", "a", false));
        let text = render_directory(store.groups(), &headers);
        assert_eq!(text, "**Learning groups**\n\n");
    }

    #[test]
    fn test_courses_sort_as_text_with_placeholder_header() {
        let (_dir, mut store, headers) = stores(r#"{"1142": "1142 - Lineare Algebra"}"#);
        store.insert_group("1".into(), group("1", "1142", "zeta", true));
        store.insert_group("2".into(), group("2", "999", "beta", true));
        store.insert_group("3".into(), group("3", "1142", "alpha", true));

        let text = render_directory(store.groups(), &headers);
        let expected = concat!(
            "**Learning groups**\n\n",
            "**1142 - Lineare Algebra**\n",
            "    <#3>\n",
            "    <#1>\n",
            "**999 - -------------------------------------**\n",
            "    <#2>\n",
        );
        assert_eq!(text, expected);
    }

    #[tokio::test]
    async fn test_publish_sends_then_edits() {
        let (_dir, mut store, headers) = stores("{}");
        let platform = MemoryPlatform::new();
        platform.add_channel("info", "lerngruppen", None);
        let publisher = DirectoryPublisher::new("info".into());

        publisher.publish(&platform, &mut store, &headers).await.unwrap();
        let first = store.directory_message_id().unwrap().to_string();

        store.insert_group("10".into(), group("10", "1234", "algebra", true));
        publisher.publish(&platform, &mut store, &headers).await.unwrap();

        assert_eq!(store.directory_message_id(), Some(first.as_str()));
        assert_eq!(platform.messages_in("info").len(), 1);
        assert!(platform.message(&first).unwrap().content.contains("<#10>"));
    }

    #[tokio::test]
    async fn test_publish_replaces_deleted_message() {
        let (_dir, mut store, headers) = stores("{}");
        let platform = MemoryPlatform::new();
        platform.add_channel("info", "lerngruppen", None);
        store.set_directory_message_id("gone".into());

        DirectoryPublisher::new("info".into())
            .publish(&platform, &mut store, &headers)
            .await
            .unwrap();

        assert_ne!(store.directory_message_id(), Some("gone"));
        assert_eq!(platform.messages_in("info").len(), 1);
    }
}
