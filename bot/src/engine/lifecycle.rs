use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use super::directory::DirectoryPublisher;
use super::error::GroupError;
use super::events::{APPROVE_EMOJI, DISCARD_EMOJI, REQUEST_TITLE};
use super::permissions::{Actor, ModRole};
use super::rate_limiter::{Clock, RenameCooldown, SystemClock};
use super::validation::{self, GroupFields, ValidationError};
use crate::platform::{
    ChannelId, ChatPlatform, Embed, MessageId, OutgoingMessage, Placement, UserId,
    channel_mention, user_mention,
};
use crate::store::models::GroupConfig;
use crate::store::{GroupStore, HeaderStore};

/// Embed color of request prompts.
const REQUEST_COLOR: u32 = 19607;

/// Platform ids the lifecycle engine works with.
#[derive(Debug, Clone)]
pub struct GroupSettings {
    pub open_category: ChannelId,
    pub closed_category: ChannelId,
    pub archive_category: ChannelId,
    pub request_channel: ChannelId,
    pub directory_channel: ChannelId,
    pub mod_role: ModRole,
}

/// Learning group lifecycle: request, approval, open/close, rename, archive.
///
/// Owns the only in-memory copy of the group and header documents. Every
/// successful mutation ends with a full save; a failed or short-circuited
/// operation leaves both the documents and the platform untouched from the
/// point of failure on.
pub struct GroupEngine {
    settings: GroupSettings,
    store: GroupStore,
    headers: HeaderStore,
    platform: Arc<dyn ChatPlatform>,
    directory: DirectoryPublisher,
    cooldown: RenameCooldown,
    clock: Arc<dyn Clock>,
}

impl GroupEngine {
    pub fn new(
        settings: GroupSettings,
        store: GroupStore,
        headers: HeaderStore,
        platform: Arc<dyn ChatPlatform>,
    ) -> Self {
        let directory = DirectoryPublisher::new(settings.directory_channel.clone());
        Self {
            settings,
            store,
            headers,
            platform,
            directory,
            cooldown: RenameCooldown::default(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &GroupStore {
        &self.store
    }

    pub fn headers(&self) -> &HeaderStore {
        &self.headers
    }

    pub fn platform(&self) -> &Arc<dyn ChatPlatform> {
        &self.platform
    }

    pub fn is_mod(&self, actor: &Actor) -> bool {
        self.settings.mod_role.is_mod(actor)
    }

    fn require_mod(&self, actor: &Actor) -> Result<(), GroupError> {
        if self.is_mod(actor) {
            Ok(())
        } else {
            Err(GroupError::Unauthorized)
        }
    }

    fn category_for(&self, is_open: bool) -> &str {
        if is_open {
            &self.settings.open_category
        } else {
            &self.settings.closed_category
        }
    }

    fn group_of(&self, channel_id: &str) -> Result<GroupConfig, GroupError> {
        self.store
            .group(channel_id)
            .cloned()
            .ok_or(GroupError::NotFound("learning group"))
    }

    // ── Requests ────────────────────────────────────────────────────

    /// Post an approval prompt for a new group and remember the request under
    /// the prompt's message id. The request is stored as soon as the prompt
    /// exists, so it stays approvable even if adding the reactions fails.
    pub async fn request_group(
        &mut self,
        requester: &Actor,
        fields: GroupFields,
    ) -> Result<MessageId, GroupError> {
        let request = validation::validate(fields)?;
        let channel_name = validation::canonical_name(&request);

        let embed = Embed {
            title: REQUEST_TITLE.to_string(),
            description: format!(
                "{} would like to open the learning group **#{channel_name}**",
                user_mention(&requester.user_id)
            ),
            color: REQUEST_COLOR,
        };
        let channel_id = self.settings.request_channel.clone();
        let message_id = self
            .platform
            .send_message(&channel_id, OutgoingMessage::embed(embed))
            .await?;

        info!(%message_id, requester = %requester.user_id, %channel_name, "group requested");
        self.store.insert_request(message_id.clone(), request);
        self.store.save()?;

        self.platform
            .add_reaction(&channel_id, &message_id, APPROVE_EMOJI)
            .await?;
        self.platform
            .add_reaction(&channel_id, &message_id, DISCARD_EMOJI)
            .await?;
        Ok(message_id)
    }

    /// Moderator shortcut: create the group right away, owned by `fields.owner_id`.
    /// The request is keyed by the invoking message and consumed immediately.
    pub async fn add_group_direct(
        &mut self,
        actor: &Actor,
        invoking_message_id: &str,
        fields: GroupFields,
    ) -> Result<ChannelId, GroupError> {
        self.require_mod(actor)?;
        let request = validation::validate(fields)?;

        self.store
            .insert_request(invoking_message_id.to_string(), request);
        self.store.save()?;
        self.materialize(invoking_message_id, false).await
    }

    /// Approve a pending request: create its channel and start managing it.
    pub async fn approve_request(
        &mut self,
        actor: &Actor,
        message_id: &str,
    ) -> Result<ChannelId, GroupError> {
        self.require_mod(actor)?;
        if self.store.request(message_id).is_none() {
            return Err(GroupError::NotFound("group request"));
        }
        self.materialize(message_id, true).await
    }

    async fn materialize(
        &mut self,
        request_id: &str,
        delete_prompt: bool,
    ) -> Result<ChannelId, GroupError> {
        let mut group = self
            .store
            .request(request_id)
            .cloned()
            .ok_or(GroupError::NotFound("group request"))?;

        let name = validation::canonical_name(&group);
        let category = self.category_for(group.is_open).to_string();
        let channel = self.platform.create_text_channel(&category, &name).await?;
        group.channel_id = Some(channel.id.clone());

        let notice = format!(
            "Your learning group {} has been set up. Use **!open** and **!close** to set its \
             status. The platform limits how often channels can be renamed, so the status can \
             only change once every **5 minutes**.",
            channel_mention(&channel.id)
        );
        if let Err(e) = self.platform.send_dm(&group.owner_id, &notice).await {
            warn!(owner_id = %group.owner_id, error = %e, "could not notify group owner");
        }

        info!(channel_id = %channel.id, %name, owner_id = %group.owner_id, "group created");
        self.store.insert_group(channel.id.clone(), group);
        self.store.remove_request(request_id);

        if delete_prompt
            && let Err(e) = self
                .platform
                .delete_message(&self.settings.request_channel, request_id)
                .await
        {
            warn!(message_id = %request_id, error = %e, "could not delete request prompt");
        }

        self.republish().await?;
        self.store.save()?;
        Ok(channel.id)
    }

    /// Discard a pending request. Only its owner or a moderator may do this.
    pub async fn reject_request(&mut self, actor: &Actor, message_id: &str) -> Result<(), GroupError> {
        let request = self
            .store
            .request(message_id)
            .ok_or(GroupError::NotFound("group request"))?;
        if !self.settings.mod_role.may_manage(actor, request) {
            return Err(GroupError::Unauthorized);
        }

        self.store.remove_request(message_id);
        self.store.save()?;
        self.platform
            .delete_message(&self.settings.request_channel, message_id)
            .await?;

        info!(%message_id, actor = %actor.user_id, "group request discarded");
        Ok(())
    }

    // ── Group transitions ───────────────────────────────────────────

    /// Notify the group channel and fail if the rename cooldown is active.
    async fn check_rename_rate_limit(
        &self,
        channel_id: &str,
        group: &GroupConfig,
    ) -> Result<(), GroupError> {
        let Some(remaining) = self.cooldown.remaining(group.last_rename, self.clock.now()) else {
            return Ok(());
        };

        self.platform
            .send_message(
                channel_id,
                OutgoingMessage::text(format!(
                    "Error! You can run this action again in {remaining} seconds."
                )),
            )
            .await?;
        info!(%channel_id, remaining, "rename rate limited");
        Err(GroupError::RateLimited { remaining })
    }

    /// Open or close a group. Owner or moderator only; a no-op when the group
    /// is already in the requested state.
    pub async fn set_open_state(
        &mut self,
        actor: &Actor,
        channel_id: &str,
        is_open: bool,
    ) -> Result<(), GroupError> {
        let Some(current) = self.store.group(channel_id) else {
            return Err(if self.is_mod(actor) {
                GroupError::NotFound("learning group")
            } else {
                GroupError::Unauthorized
            });
        };
        if !self.settings.mod_role.may_manage(actor, current) {
            return Err(GroupError::Unauthorized);
        }
        if current.is_open == is_open {
            return Ok(());
        }

        let mut group = current.clone();
        self.check_rename_rate_limit(channel_id, &group).await?;

        group.is_open = is_open;
        group.last_rename = Some(self.clock.now());
        let name = validation::canonical_name(&group);

        self.platform.rename_channel(channel_id, &name).await?;
        let category = self.category_for(is_open).to_string();
        self.move_sorted(channel_id, &name, &category).await?;

        info!(%channel_id, %name, is_open, "group state changed");
        self.store.insert_group(channel_id.to_string(), group);
        self.republish().await?;
        self.store.save()?;
        Ok(())
    }

    /// Change the free-text part of a group's name. Moderator only.
    pub async fn rename(
        &mut self,
        actor: &Actor,
        channel_id: &str,
        new_name: &str,
    ) -> Result<(), GroupError> {
        self.require_mod(actor)?;
        let mut group = self.group_of(channel_id)?;
        self.check_rename_rate_limit(channel_id, &group).await?;

        group.name = new_name.to_string();
        group.last_rename = Some(self.clock.now());
        let name = validation::canonical_name(&group);
        self.platform.rename_channel(channel_id, &name).await?;

        info!(%channel_id, %name, "group renamed");
        self.store.insert_group(channel_id.to_string(), group);
        self.republish().await?;
        self.store.save()?;
        Ok(())
    }

    /// Move a group into the archive and stop managing it. Moderator only.
    pub async fn archive(&mut self, actor: &Actor, channel_id: &str) -> Result<(), GroupError> {
        self.require_mod(actor)?;
        let group = self.group_of(channel_id)?;

        let channel = self.platform.channel(channel_id).await?;
        let name = validation::archived_name(&channel.name);
        let category = self.settings.archive_category.clone();
        self.move_sorted(channel_id, &name, &category).await?;
        self.platform.rename_channel(channel_id, &name).await?;

        info!(%channel_id, %name, "group archived");
        self.store.remove_group(channel_id);
        if group.is_open {
            self.republish().await?;
        }
        self.store.save()?;
        Ok(())
    }

    /// Move a channel into a category, in front of the first channel whose
    /// name (status glyph ignored) sorts after it.
    async fn move_sorted(
        &self,
        channel_id: &str,
        channel_name: &str,
        category_id: &str,
    ) -> Result<(), GroupError> {
        let key = validation::strip_glyph(channel_name);
        let siblings = self.platform.category_channels(category_id).await?;
        let placement = siblings
            .into_iter()
            .find(|c| c.id != channel_id && validation::strip_glyph(&c.name) > key)
            .map(|c| Placement::Before(c.id))
            .unwrap_or(Placement::End);

        self.platform
            .move_channel(channel_id, category_id, placement)
            .await?;
        Ok(())
    }

    // ── Ownership ───────────────────────────────────────────────────

    /// Hand a group to another member. Moderator only.
    pub async fn set_owner(
        &mut self,
        actor: &Actor,
        channel_id: &str,
        new_owner: &str,
    ) -> Result<(), GroupError> {
        self.require_mod(actor)?;
        let mut group = self.group_of(channel_id)?;
        group.owner_id = new_owner.to_string();
        self.store.insert_group(channel_id.to_string(), group);
        self.store.save()?;

        info!(%channel_id, owner_id = %new_owner, "group owner changed");
        self.platform
            .send_message(
                channel_id,
                OutgoingMessage::text(format!(
                    "Congratulations {}! You are now the owner of this learning group.",
                    user_mention(new_owner)
                )),
            )
            .await?;
        Ok(())
    }

    /// Post the owner of a group into its channel. Moderator only.
    pub async fn get_owner(&self, actor: &Actor, channel_id: &str) -> Result<UserId, GroupError> {
        self.require_mod(actor)?;
        let group = self.group_of(channel_id)?;
        let user_name = self.platform.user_name(&group.owner_id).await?;
        self.platform
            .send_message(
                channel_id,
                OutgoingMessage::text(format!("Owner: @{user_name}")),
            )
            .await?;
        Ok(group.owner_id)
    }

    // ── Directory ───────────────────────────────────────────────────

    /// Set or replace the directory header of a course. Moderator only.
    pub async fn add_course(
        &mut self,
        actor: &Actor,
        course: &str,
        title: &[String],
    ) -> Result<(), GroupError> {
        self.require_mod(actor)?;
        if !validation::is_valid_course(course) {
            return Err(ValidationError::Course.into());
        }

        let header = format!("{course} - {}", title.join(" "));
        info!(%course, %header, "course header set");
        self.headers.set(course.to_string(), header);
        self.headers.save()?;
        self.republish().await?;
        self.store.save()?;
        Ok(())
    }

    /// Re-render the directory message from the current groups.
    pub async fn republish(&mut self) -> Result<(), GroupError> {
        self.directory
            .publish(self.platform.as_ref(), &mut self.store, &self.headers)
            .await
    }

    // ── Bootstrap ───────────────────────────────────────────────────

    /// Build the group mapping from the channels already present in the open
    /// and closed categories, all owned by `actor`. Refuses to run once groups
    /// exist. All or nothing: the first unparseable or invalid channel name
    /// aborts without touching the mapping.
    pub async fn bulk_initialize(&mut self, actor: &Actor) -> Result<usize, GroupError> {
        self.require_mod(actor)?;
        if !self.store.groups().is_empty() {
            return Err(GroupError::AlreadyInitialized);
        }

        let mut groups = BTreeMap::new();
        let mut summary = String::from("Initialization complete:\n");

        for is_open in [true, false] {
            let category = self.category_for(is_open).to_string();
            let category_name = self.platform.category_name(&category).await?;
            summary.push_str(&format!("**{category_name}**\n"));

            for channel in self.platform.category_channels(&category).await? {
                let parsed = validation::parse_canonical_name(&channel.name)
                    .ok_or_else(|| GroupError::ConfigIntegrity(channel.name.clone()))?;
                let fields = GroupFields {
                    owner_id: actor.user_id.clone(),
                    course: parsed.course,
                    name: parsed.name,
                    semester: parsed.semester,
                    is_open: Some(is_open),
                };
                let mut group = validation::validate(fields)
                    .map_err(|_| GroupError::ConfigIntegrity(channel.name.clone()))?;
                group.channel_id = Some(channel.id.clone());

                summary.push_str(&format!(
                    "   #{}-{}-{}\n",
                    group.course, group.name, group.semester
                ));
                groups.insert(channel.id, group);
            }
        }

        let count = groups.len();
        self.store.replace_groups(groups);
        info!(count, actor = %actor.user_id, "groups initialized from channels");

        if let Err(e) = self.platform.send_dm(&actor.user_id, &summary).await {
            warn!(error = %e, "could not send initialization summary");
        }
        self.republish().await?;
        self.store.save()?;
        Ok(count)
    }
}
