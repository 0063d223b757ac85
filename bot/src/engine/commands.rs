use thiserror::Error;

use crate::platform::UserId;

/// Prefix that marks a message as a bot command.
pub const COMMAND_PREFIX: char = '!';

/// A parsed bot command.
///
/// Wire format: `!name arg1 arg2 ...`, arguments separated by whitespace.
/// Surplus arguments are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help {
        command: Option<String>,
    },
    ModHelp {
        command: Option<String>,
    },
    RequestGroup {
        course: String,
        name: String,
        semester: String,
        status: String,
    },
    AddGroup {
        course: String,
        name: String,
        semester: String,
        status: String,
        owner: UserId,
    },
    AddCourse {
        course: String,
        title: Vec<String>,
    },
    Open,
    Close,
    Rename {
        name: String,
    },
    Archive,
    Owner {
        owner: UserId,
    },
    ShowOwner,
    InitGroups,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("missing argument <{argument}> for !{command}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
    #[error("not a user mention: {value}")]
    InvalidMention {
        command: &'static str,
        value: String,
    },
}

impl CommandError {
    pub fn command(&self) -> &'static str {
        match self {
            CommandError::MissingArgument { command, .. } => command,
            CommandError::InvalidMention { command, .. } => command,
        }
    }
}

struct Args<'a> {
    command: &'static str,
    rest: std::str::SplitWhitespace<'a>,
}

impl<'a> Args<'a> {
    fn required(&mut self, argument: &'static str) -> Result<String, CommandError> {
        self.rest
            .next()
            .map(str::to_string)
            .ok_or(CommandError::MissingArgument {
                command: self.command,
                argument,
            })
    }

    fn optional(&mut self) -> Option<String> {
        self.rest.next().map(|s| s.trim_start_matches(COMMAND_PREFIX).to_string())
    }

    fn mention(&mut self, argument: &'static str) -> Result<UserId, CommandError> {
        let raw = self.required(argument)?;
        parse_mention(&raw).ok_or(CommandError::InvalidMention {
            command: self.command,
            value: raw,
        })
    }

    fn remaining(self) -> Vec<String> {
        self.rest.map(str::to_string).collect()
    }
}

impl Command {
    /// Parse a message. `None` if it is not addressed to a command this bot
    /// knows; other features may still handle it.
    pub fn parse(content: &str) -> Option<Result<Self, CommandError>> {
        let body = content.trim().strip_prefix(COMMAND_PREFIX)?;
        let mut words = body.split_whitespace();
        let name = words.next()?;
        let command = COMMAND_NAMES.iter().copied().find(|known| *known == name)?;
        Self::parse_args(Args {
            command,
            rest: words,
        })
        .transpose()
    }

    fn parse_args(mut args: Args<'_>) -> Result<Option<Self>, CommandError> {
        let command = args.command;
        let parsed = match command {
            "help" => Command::Help {
                command: args.optional(),
            },
            "mod-help" => Command::ModHelp {
                command: args.optional(),
            },
            "request-group" => Command::RequestGroup {
                course: args.required("coursenumber")?,
                name: args.required("name")?,
                semester: args.required("semester")?,
                status: args.required("status")?,
            },
            "add-group" => Command::AddGroup {
                course: args.required("coursenumber")?,
                name: args.required("name")?,
                semester: args.required("semester")?,
                status: args.required("status")?,
                owner: args.mention("@usermention")?,
            },
            "add-course" => Command::AddCourse {
                course: args.required("coursenumber")?,
                title: args.remaining(),
            },
            "open" => Command::Open,
            "close" => Command::Close,
            "rename" => Command::Rename {
                name: args.required("name")?,
            },
            "archive" => Command::Archive,
            "owner" => Command::Owner {
                owner: args.mention("@usermention")?,
            },
            "show-owner" => Command::ShowOwner,
            "init-groups" => Command::InitGroups,
            _ => return Ok(None),
        };
        Ok(Some(parsed))
    }

    /// The registered command name, as used in help lookups.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Help { .. } => "help",
            Command::ModHelp { .. } => "mod-help",
            Command::RequestGroup { .. } => "request-group",
            Command::AddGroup { .. } => "add-group",
            Command::AddCourse { .. } => "add-course",
            Command::Open => "open",
            Command::Close => "close",
            Command::Rename { .. } => "rename",
            Command::Archive => "archive",
            Command::Owner { .. } => "owner",
            Command::ShowOwner => "show-owner",
            Command::InitGroups => "init-groups",
        }
    }
}

/// Known command names.
const COMMAND_NAMES: &[&str] = &[
    "help",
    "mod-help",
    "request-group",
    "add-group",
    "add-course",
    "open",
    "close",
    "rename",
    "archive",
    "owner",
    "show-owner",
    "init-groups",
];

/// Accepts `<@id>`, `<@!id>` or a bare numeric id.
pub fn parse_mention(raw: &str) -> Option<UserId> {
    let id = raw
        .strip_prefix("<@")
        .and_then(|s| s.strip_suffix('>'))
        .map(|s| s.strip_prefix('!').unwrap_or(s))
        .unwrap_or(raw);

    (!id.is_empty() && id.chars().all(|c| c.is_ascii_digit())).then(|| id.to_string())
}
