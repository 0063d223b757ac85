//! Command help registry.
//!
//! Commands register their metadata explicitly at startup (see
//! [`commands::register_all`]); rendering is plain text for DMs.

pub mod commands;

use std::collections::BTreeMap;

use thiserror::Error;

/// Category used when a command names none.
pub const DEFAULT_CATEGORY: &str = "__none__";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HelpError {
    #[error("no help entry for {0}")]
    NotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpCategory {
    pub title: String,
    pub description: String,
}

/// Help metadata of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandHelp {
    pub name: String,
    pub syntax: String,
    pub example: Option<String>,
    pub brief: Option<String>,
    pub description: Option<String>,
    pub mod_only: bool,
    /// Parameter name and description, in display order.
    pub parameters: Vec<(String, String)>,
    pub category: String,
}

impl CommandHelp {
    /// A bare entry; the syntax defaults to `!name`.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            syntax: format!("!{name}"),
            example: None,
            brief: None,
            description: None,
            mod_only: false,
            parameters: Vec::new(),
            category: DEFAULT_CATEGORY.to_string(),
        }
    }

    pub fn syntax(mut self, syntax: &str) -> Self {
        self.syntax = syntax.trim().to_string();
        self
    }

    pub fn example(mut self, example: &str) -> Self {
        self.example = Some(example.to_string());
        self
    }

    pub fn brief(mut self, brief: &str) -> Self {
        self.brief = Some(brief.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn param(mut self, name: &str, description: &str) -> Self {
        self.parameters
            .push((name.to_string(), description.to_string()));
        self
    }

    pub fn mod_only(mut self) -> Self {
        self.mod_only = true;
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }
}

#[derive(Debug, Clone)]
pub struct HelpRegistry {
    categories: BTreeMap<String, HelpCategory>,
    commands: BTreeMap<String, CommandHelp>,
}

impl Default for HelpRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HelpRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            categories: BTreeMap::new(),
            commands: BTreeMap::new(),
        };
        registry.register_category(DEFAULT_CATEGORY, "Misc", "");
        registry
    }

    pub fn register_category(&mut self, key: &str, title: &str, description: &str) {
        self.categories.insert(
            key.to_string(),
            HelpCategory {
                title: title.to_string(),
                description: description.to_string(),
            },
        );
    }

    /// Add or replace the entry for `help.name`.
    pub fn register(&mut self, help: CommandHelp) {
        self.commands.insert(help.name.clone(), help);
    }

    /// Raw lookup, regardless of who is asking.
    pub fn get(&self, name: &str) -> Option<&CommandHelp> {
        self.commands.get(name.trim_start_matches('!'))
    }

    /// Lookup on behalf of a member; moderator entries stay hidden from others.
    pub fn lookup(&self, name: &str, is_mod: bool) -> Result<&CommandHelp, HelpError> {
        self.get(name)
            .filter(|help| is_mod || !help.mod_only)
            .ok_or_else(|| HelpError::NotFound(name.to_string()))
    }

    /// Detailed help for one command.
    pub fn help_card(&self, name: &str, is_mod: bool) -> Result<String, HelpError> {
        let help = self.lookup(name, is_mod)?;

        let mut text = format!("**{}**\n", help.name);
        if let Some(brief) = &help.brief {
            text.push_str(&format!("{brief}\n\n"));
        }
        text.push_str(&format!("**Syntax:**\n `{}`\n", help.syntax));
        if !help.parameters.is_empty() {
            text.push_str("**Parameters:**\n");
            for (param, desc) in &help.parameters {
                text.push_str(&format!("`{param}` - {desc}\n"));
            }
        }
        if let Some(example) = &help.example {
            text.push_str(&format!("**Example:**\n `{example}`\n"));
        }
        if let Some(description) = &help.description {
            text.push_str(&format!("\n{description}\n"));
        }
        Ok(text)
    }

    /// Command overview by category. The moderator overview lists only
    /// moderator commands, the regular one only the others.
    pub fn overview(&self, mod_overview: bool) -> String {
        let mut categories: Vec<(&String, &HelpCategory)> = self.categories.iter().collect();
        categories.sort_by(|a, b| a.1.title.cmp(&b.1.title));

        let mut commands: Vec<&CommandHelp> = self
            .commands
            .values()
            .filter(|c| c.mod_only == mod_overview)
            .collect();
        commands.sort_by(|a, b| a.syntax.cmp(&b.syntax));

        let mut text = String::from(
            "For detailed help on a command type **!help <command>**, \
             e.g. **!help request-group**.\n\n",
        );
        for (key, category) in categories {
            let listed: Vec<&&CommandHelp> =
                commands.iter().filter(|c| &c.category == key).collect();
            if listed.is_empty() {
                continue;
            }

            text.push_str(&format!("\n__**{}**__\n", category.title));
            if category.description.is_empty() {
                text.push('\n');
            } else {
                text.push_str(&format!("{}\n\n", category.description));
            }
            for command in listed {
                text.push_str(&format!("**{}**\n", command.syntax));
                match &command.brief {
                    Some(brief) => text.push_str(&format!("{brief}\n\n")),
                    None => text.push('\n'),
                }
            }
        }
        text
    }
}
