use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::platform::{ChannelId, MessageId, UserId};

/// A learning group as persisted in the `groups` mapping.
///
/// The same shape is used for pending requests (see [`RequestRecord`]); those
/// carry no `channel_id` until they are approved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    #[serde(deserialize_with = "string_or_number")]
    pub owner_id: UserId,
    pub course: String,
    pub name: String,
    pub semester: String,
    pub is_open: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<ChannelId>,
    /// Unix timestamp (seconds) of the last rename-triggering transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_rename: Option<i64>,
}

/// A pending group request, keyed by the id of the message that created it.
pub type RequestRecord = GroupConfig;

/// The group state document: pending requests, active groups and the id of
/// the published directory message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDocument {
    pub requested: BTreeMap<MessageId, RequestRecord>,
    pub groups: BTreeMap<ChannelId, GroupConfig>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub messageid: Option<MessageId>,
}

/// Course number -> directory header text.
pub type CourseHeaders = BTreeMap<String, String>;

/// Older state files store snowflake ids as JSON numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(u64),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    StringOrNumber::deserialize(deserializer).map(String::from)
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<StringOrNumber>::deserialize(deserializer).map(|v| v.map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_omits_unset_optionals() {
        let group = GroupConfig {
            owner_id: "42".into(),
            course: "1142".into(),
            name: "mathegenies".into(),
            semester: "sose22".into(),
            is_open: true,
            channel_id: None,
            last_rename: None,
        };
        let json = serde_json::to_value(&group).unwrap();
        assert!(json.get("channel_id").is_none());
        assert!(json.get("last_rename").is_none());
        assert_eq!(json["owner_id"], "42");
    }

    #[test]
    fn test_legacy_numeric_ids() {
        let doc: GroupDocument = serde_json::from_str(
            r#"{
                "requested": {},
                "groups": {
                    "900": {"owner_id": 1234567, "course": "1142", "name": "x",
                            "semester": "wise21", "is_open": false, "channel_id": "900",
                            "last_rename": 1650000000}
                },
                "messageid": 777
            }"#,
        )
        .unwrap();
        assert_eq!(doc.groups["900"].owner_id, "1234567");
        assert_eq!(doc.groups["900"].last_rename, Some(1_650_000_000));
        assert_eq!(doc.messageid.as_deref(), Some("777"));
    }

    #[test]
    fn test_minimal_document() {
        let doc: GroupDocument = serde_json::from_str(r#"{"requested": {}, "groups": {}}"#).unwrap();
        assert!(doc.groups.is_empty());
        assert!(doc.messageid.is_none());
    }

    #[test]
    fn test_both_maps_are_required() {
        assert!(serde_json::from_str::<GroupDocument>("{}").is_err());
        assert!(serde_json::from_str::<GroupDocument>(r#"{"requested": {}}"#).is_err());
        assert!(serde_json::from_str::<GroupDocument>(r#"{"groups": {}}"#).is_err());
    }

    #[test]
    fn test_null_message_id() {
        let doc: GroupDocument =
            serde_json::from_str(r#"{"requested": {}, "groups": {}, "messageid": null}"#).unwrap();
        assert!(doc.messageid.is_none());
    }
}
