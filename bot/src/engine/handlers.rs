use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::commands::{Command, CommandError};
use super::error::GroupError;
use super::events::{
    BotEvent, IncomingMessage, RawReaction, ReactionAction, message_kind, reaction_action,
};
use super::lifecycle::GroupEngine;
use super::permissions::Actor;
use super::validation::{self, GroupFields};
use crate::help::HelpRegistry;
use crate::platform::{OutgoingMessage, UserId};

const GENERIC_FAILURE: &str =
    "Something went wrong. Please try again later or contact a moderator.";

/// Routes inbound events to the lifecycle engine and turns failures into
/// user-facing replies. Owns the engine; events are handled strictly one at
/// a time.
pub struct Dispatcher {
    engine: GroupEngine,
    help: HelpRegistry,
    bot_user_id: UserId,
}

impl Dispatcher {
    pub fn new(engine: GroupEngine, help: HelpRegistry, bot_user_id: impl Into<UserId>) -> Self {
        Self {
            engine,
            help,
            bot_user_id: bot_user_id.into(),
        }
    }

    pub fn engine(&self) -> &GroupEngine {
        &self.engine
    }

    /// Consume events until every sender is gone.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<BotEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(event).await;
        }
        info!("event channel closed, dispatcher stopping");
    }

    pub async fn handle(&mut self, event: BotEvent) {
        match event {
            BotEvent::Message(message) => self.on_message(message).await,
            BotEvent::ReactionAdd(reaction) => self.on_reaction(reaction).await,
        }
    }

    async fn on_message(&mut self, message: IncomingMessage) {
        if message.author.user_id == self.bot_user_id {
            return;
        }
        let command = match Command::parse(&message.content) {
            None => return,
            Some(Ok(command)) => command,
            Some(Err(e)) => {
                let reply = self.command_error_text(&e);
                self.reply(&message.channel_id, reply).await;
                return;
            }
        };

        debug!(command = command.name(), user_id = %message.author.user_id, "command received");
        let name = command.name();
        if let Err(e) = self.run_command(command, &message).await {
            self.report(e, &message.author, &message.channel_id, name)
                .await;
        }
    }

    async fn run_command(
        &mut self,
        command: Command,
        message: &IncomingMessage,
    ) -> Result<(), GroupError> {
        let actor = &message.author;
        let channel_id = message.channel_id.as_str();

        match command {
            Command::Help { command } => {
                self.send_help(actor, channel_id, command.as_deref(), false)
                    .await
            }
            Command::ModHelp { command } => {
                if !self.engine.is_mod(actor) {
                    return Err(GroupError::Unauthorized);
                }
                self.send_help(actor, channel_id, command.as_deref(), true)
                    .await
            }
            Command::RequestGroup {
                course,
                name,
                semester,
                status,
            } => {
                let fields = GroupFields {
                    owner_id: actor.user_id.clone(),
                    course,
                    name,
                    semester,
                    is_open: validation::parse_open_status(&status),
                };
                self.engine.request_group(actor, fields).await.map(|_| ())
            }
            Command::AddGroup {
                course,
                name,
                semester,
                status,
                owner,
            } => {
                let fields = GroupFields {
                    owner_id: owner,
                    course,
                    name,
                    semester,
                    is_open: validation::parse_open_status(&status),
                };
                self.engine
                    .add_group_direct(actor, &message.id, fields)
                    .await
                    .map(|_| ())
            }
            Command::AddCourse { course, title } => {
                self.engine.add_course(actor, &course, &title).await
            }
            Command::Open => self.engine.set_open_state(actor, channel_id, true).await,
            Command::Close => self.engine.set_open_state(actor, channel_id, false).await,
            Command::Rename { name } => self.engine.rename(actor, channel_id, &name).await,
            Command::Archive => self.engine.archive(actor, channel_id).await,
            Command::Owner { owner } => self.engine.set_owner(actor, channel_id, &owner).await,
            Command::ShowOwner => self.engine.get_owner(actor, channel_id).await.map(|_| ()),
            Command::InitGroups => self.engine.bulk_initialize(actor).await.map(|_| ()),
        }
    }

    /// DM the overview or a single help card; unknown entries are reported in
    /// the invoking channel.
    async fn send_help(
        &self,
        actor: &Actor,
        channel_id: &str,
        command: Option<&str>,
        mod_help: bool,
    ) -> Result<(), GroupError> {
        let is_mod = self.engine.is_mod(actor);
        let text = match command {
            None => self.help.overview(mod_help),
            Some(name) => match self.help.help_card(name, is_mod) {
                Ok(card) => card,
                Err(e) => {
                    debug!(error = %e, "help lookup failed");
                    self.reply(
                        channel_id,
                        format!("Error! There is no help entry for **{name}**."),
                    )
                    .await;
                    return Ok(());
                }
            },
        };
        self.engine
            .platform()
            .send_dm(&actor.user_id, &text)
            .await?;
        Ok(())
    }

    async fn on_reaction(&mut self, reaction: RawReaction) {
        if reaction.member.user_id == self.bot_user_id {
            return;
        }
        let message = match self
            .engine
            .platform()
            .fetch_message(&reaction.channel_id, &reaction.message_id)
            .await
        {
            Ok(message) => message,
            Err(e) => {
                warn!(message_id = %reaction.message_id, error = %e, "reaction on unknown message");
                return;
            }
        };

        let Some(action) = reaction_action(&reaction.emoji, message_kind(&message)) else {
            return;
        };
        let actor = &reaction.member;
        let result = match action {
            ReactionAction::ApproveRequest => self
                .engine
                .approve_request(actor, &reaction.message_id)
                .await
                .map(|_| ()),
            ReactionAction::DiscardRequest => {
                self.engine
                    .reject_request(actor, &reaction.message_id)
                    .await
            }
        };
        if let Err(e) = result {
            self.report(e, actor, &reaction.channel_id, "request-group")
                .await;
        }
    }

    fn command_error_text(&self, e: &CommandError) -> String {
        let command = e.command();
        match e {
            CommandError::MissingArgument { .. } => {
                let syntax = self
                    .help
                    .get(command)
                    .map(|h| h.syntax.clone())
                    .unwrap_or_else(|| format!("!{command}"));
                format!(
                    "Error! You forgot an argument. For more help type `!help {command}`.\n\
                     `Syntax: {syntax}`"
                )
            }
            CommandError::InvalidMention { value, .. } => format!(
                "Error! {value} is not a user mention. For more help type `!help {command}`."
            ),
        }
    }

    /// Map a failed operation to what the user gets to see.
    async fn report(&self, e: GroupError, actor: &Actor, channel_id: &str, command: &str) {
        match e {
            GroupError::Validation(v) => {
                self.reply(
                    channel_id,
                    format!("Error! {v} Type `!help {command}` for details."),
                )
                .await;
            }
            GroupError::Unauthorized => {
                debug!(user_id = %actor.user_id, %command, "unauthorized, ignoring");
            }
            GroupError::RateLimited { .. } => {}
            GroupError::NotFound(what) => {
                debug!(%channel_id, %what, "not found");
                self.reply(channel_id, "Error! There is no such entry.".to_string())
                    .await;
            }
            GroupError::ConfigIntegrity(name) => {
                warn!(channel_name = %name, "initialization aborted");
                let text = format!("Aborted! Channel name has wrong format: {name}");
                if let Err(e) = self.engine.platform().send_dm(&actor.user_id, &text).await {
                    warn!(user_id = %actor.user_id, error = %e, "could not send DM");
                }
            }
            GroupError::AlreadyInitialized => {
                self.reply(channel_id, "Nope. I'd better not do that.".to_string())
                    .await;
            }
            GroupError::Store(_) | GroupError::Platform(_) => {
                error!(%channel_id, %command, error = %e, "operation failed");
                self.reply(channel_id, GENERIC_FAILURE.to_string()).await;
            }
        }
    }

    async fn reply(&self, channel_id: &str, content: String) {
        if let Err(e) = self
            .engine
            .platform()
            .send_message(channel_id, OutgoingMessage::text(content))
            .await
        {
            warn!(%channel_id, error = %e, "could not send reply");
        }
    }
}
