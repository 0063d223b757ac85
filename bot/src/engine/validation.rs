use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::platform::UserId;
use crate::store::models::GroupConfig;

/// Channel name prefix for open groups.
pub const OPEN_GLYPH: &str = "🌲";

/// Channel name prefix for closed groups.
pub const CLOSED_GLYPH: &str = "🛑";

/// Channel name prefix for archived groups (replaces the status glyph).
pub const ARCHIVE_PREFIX: &str = "archive-";

static COURSE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+$").unwrap());

static SEMESTER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(sose|wise)[0-9]{2}$").unwrap());

/// Shape of an existing channel name (glyph already stripped) accepted by
/// bulk initialization.
static CHANNEL_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4,6})-(.*)-([a-z0-9]+)$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please state whether the group is **open** or **closed**.")]
    MissingOpenStatus,
    #[error("The course number must be numeric.")]
    Course,
    #[error(
        "The semester must be given as **sose** or **wise** followed by the **two-digit year**."
    )]
    Semester,
}

/// Group fields as collected from user input, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupFields {
    pub owner_id: UserId,
    pub course: String,
    pub name: String,
    pub semester: String,
    /// `None` when the status argument was not recognised.
    pub is_open: Option<bool>,
}

/// Check the fields in order: open status, course, semester.
pub fn check(fields: &GroupFields) -> Result<(), ValidationError> {
    if fields.is_open.is_none() {
        return Err(ValidationError::MissingOpenStatus);
    }
    if !is_valid_course(&fields.course) {
        return Err(ValidationError::Course);
    }
    if !SEMESTER_PATTERN.is_match(&fields.semester) {
        return Err(ValidationError::Semester);
    }
    Ok(())
}

pub fn is_valid(fields: &GroupFields) -> bool {
    check(fields).is_ok()
}

/// Turn validated fields into a storable config (no channel yet).
pub fn validate(fields: GroupFields) -> Result<GroupConfig, ValidationError> {
    check(&fields)?;
    Ok(GroupConfig {
        owner_id: fields.owner_id,
        course: fields.course,
        name: fields.name,
        semester: fields.semester,
        is_open: fields.is_open.unwrap_or_default(),
        channel_id: None,
        last_rename: None,
    })
}

pub fn is_valid_course(course: &str) -> bool {
    COURSE_PATTERN.is_match(course)
}

/// Interpret the status argument of group commands.
pub fn parse_open_status(arg: &str) -> Option<bool> {
    match arg {
        "open" | "offen" => Some(true),
        "closed" | "close" | "geschlossen" => Some(false),
        _ => None,
    }
}

/// The display name a group's channel must carry.
pub fn canonical_name(group: &GroupConfig) -> String {
    let glyph = if group.is_open { OPEN_GLYPH } else { CLOSED_GLYPH };
    format!(
        "{glyph}{}-{}-{}",
        group.course, group.name, group.semester
    )
}

/// Channel name without its leading status glyph.
pub fn strip_glyph(channel_name: &str) -> &str {
    let mut chars = channel_name.chars();
    chars.next();
    chars.as_str()
}

pub fn archived_name(channel_name: &str) -> String {
    format!("{ARCHIVE_PREFIX}{}", strip_glyph(channel_name))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub course: String,
    pub name: String,
    pub semester: String,
}

/// Recover `(course, name, semester)` from an existing group channel name.
pub fn parse_canonical_name(channel_name: &str) -> Option<ParsedName> {
    let caps = CHANNEL_NAME_PATTERN.captures(strip_glyph(channel_name))?;
    Some(ParsedName {
        course: caps[1].to_string(),
        name: caps[2].to_string(),
        semester: caps[3].to_string(),
    })
}
