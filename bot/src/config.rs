use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::engine::lifecycle::GroupSettings;
use crate::engine::permissions::ModRole;
use crate::platform::UserId;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    /// A required setting is empty after merging file and environment.
    #[error("missing required setting {0}")]
    Missing(&'static str),
}

/// Top-level bot configuration, loaded from learning-groups.toml.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct BotConfig {
    pub learning_groups: LearningGroupsSection,
    pub roles: RolesSection,
    pub bot: BotSection,
}

/// Platform ids and file locations of the learning group feature.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct LearningGroupsSection {
    pub open_category: String,
    pub closed_category: String,
    pub archive_category: String,
    pub request_channel: String,
    pub info_channel: String,
    pub state_file: String,
    pub course_file: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RolesSection {
    pub mod_role: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BotSection {
    /// The bot's own user id; its own messages and reactions are ignored.
    pub user_id: UserId,
}

impl Default for BotSection {
    fn default() -> Self {
        Self {
            user_id: "0".into(),
        }
    }
}

impl BotConfig {
    /// Load config from a TOML file, falling back to defaults if the file
    /// doesn't exist. Environment variables override TOML values. Fails if a
    /// required setting is still empty afterwards.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            info!(path = %path.display(), "no config file found, using environment only");
            Self::default()
        };

        config.apply_env_overrides();
        config.check()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        let lg = &mut self.learning_groups;
        let overrides: [(&str, &mut String); 9] = [
            ("LEARNINGGROUPS_OPEN", &mut lg.open_category),
            ("LEARNINGGROUPS_CLOSE", &mut lg.closed_category),
            ("LEARNINGGROUPS_ARCHIVE", &mut lg.archive_category),
            ("LEARNINGGROUPS_REQUEST", &mut lg.request_channel),
            ("LEARNINGGROUPS_INFO", &mut lg.info_channel),
            ("LEARNINGGROUPS_FILE", &mut lg.state_file),
            ("LEARNINGGROUPS_COURSE_FILE", &mut lg.course_file),
            ("MOD_ROLE", &mut self.roles.mod_role),
            ("BOT_USER_ID", &mut self.bot.user_id),
        ];
        for (var, field) in overrides {
            if let Ok(v) = std::env::var(var) {
                *field = v.trim().to_string();
            }
        }
    }

    fn check(&self) -> Result<(), ConfigError> {
        let lg = &self.learning_groups;
        let required = [
            ("LEARNINGGROUPS_OPEN", &lg.open_category),
            ("LEARNINGGROUPS_CLOSE", &lg.closed_category),
            ("LEARNINGGROUPS_ARCHIVE", &lg.archive_category),
            ("LEARNINGGROUPS_REQUEST", &lg.request_channel),
            ("LEARNINGGROUPS_INFO", &lg.info_channel),
            ("LEARNINGGROUPS_FILE", &lg.state_file),
            ("LEARNINGGROUPS_COURSE_FILE", &lg.course_file),
            ("MOD_ROLE", &self.roles.mod_role),
        ];
        match required.into_iter().find(|(_, value)| value.is_empty()) {
            Some((var, _)) => Err(ConfigError::Missing(var)),
            None => Ok(()),
        }
    }

    pub fn state_file(&self) -> &Path {
        Path::new(&self.learning_groups.state_file)
    }

    pub fn course_file(&self) -> &Path {
        Path::new(&self.learning_groups.course_file)
    }

    /// Convert into the ids the lifecycle engine works with.
    pub fn to_group_settings(&self) -> GroupSettings {
        let lg = &self.learning_groups;
        GroupSettings {
            open_category: lg.open_category.clone(),
            closed_category: lg.closed_category.clone(),
            archive_category: lg.archive_category.clone(),
            request_channel: lg.request_channel.clone(),
            directory_channel: lg.info_channel.clone(),
            mod_role: ModRole(self.roles.mod_role.clone()),
        }
    }
}
