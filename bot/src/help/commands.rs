use super::{CommandHelp, HelpRegistry};

pub const HELP_CATEGORY: &str = "help";
pub const GROUPS_CATEGORY: &str = "learninggroups";

const COURSE_PARAM: &str =
    "Course number as given by the university, without leading zeros (e.g. 1142).";
const SEMESTER_PARAM: &str = "The semester the group is for: sose or wise followed by the \
                              two-digit year (e.g. sose22).";
const STATUS_PARAM: &str =
    "Whether the group is open to new members (open) or not (closed).";

/// Registry with every command of this bot registered.
pub fn default_registry() -> HelpRegistry {
    let mut registry = HelpRegistry::new();
    register_all(&mut registry);
    registry
}

pub fn register_all(registry: &mut HelpRegistry) {
    register_help(registry);
    register_learning_groups(registry);
}

fn register_help(registry: &mut HelpRegistry) {
    registry.register_category(
        HELP_CATEGORY,
        "Help",
        "If you are stuck, type `!help`.",
    );

    registry.register(
        CommandHelp::new("help")
            .syntax("!help <command?>")
            .brief(
                "Shows the available commands. Given a command, shows detailed help for it.",
            )
            .category(HELP_CATEGORY),
    );
    registry.register(
        CommandHelp::new("mod-help")
            .syntax("!mod-help <command?>")
            .brief(
                "Shows the commands available *to mods*. Given a command, shows detailed help \
                 for it.",
            )
            .mod_only()
            .category(HELP_CATEGORY),
    );
}

fn register_learning_groups(registry: &mut HelpRegistry) {
    registry.register_category(
        GROUPS_CATEGORY,
        "Learning groups",
        "Request learning group channels and manage them.",
    );

    registry.register(
        CommandHelp::new("request-group")
            .syntax("!request-group <coursenumber> <name> <semester> <status>")
            .brief("Requests a new learning group channel.")
            .example("!request-group 1142 mathegenies sose22 closed")
            .description(
                "Moderators can approve the request, then the group is set up. \
                 The member who posted the request owns the group.",
            )
            .param("coursenumber", COURSE_PARAM)
            .param("name", "Free text without spaces.")
            .param("semester", SEMESTER_PARAM)
            .param("status", STATUS_PARAM)
            .category(GROUPS_CATEGORY),
    );
    registry.register(
        CommandHelp::new("open")
            .brief("Opens the learning group channel if you own it.")
            .description(
                "Run it inside the group channel. Moves the channel to the category for open \
                 groups and changes its icon.",
            )
            .category(GROUPS_CATEGORY),
    );
    registry.register(
        CommandHelp::new("close")
            .brief("Closes the learning group channel if you own it.")
            .description(
                "Run it inside the group channel. Moves the channel to the category for closed \
                 groups and changes its icon.",
            )
            .category(GROUPS_CATEGORY),
    );

    registry.register(
        CommandHelp::new("add-group")
            .syntax("!add-group <coursenumber> <name> <semester> <status> <@usermention>")
            .brief("Adds a learning group channel. The name must not contain spaces.")
            .example("!add-group 1142 mathegenies sose22 closed @someuser")
            .param("coursenumber", COURSE_PARAM)
            .param("name", "Free text without spaces. Dashes are allowed.")
            .param("semester", SEMESTER_PARAM)
            .param("status", STATUS_PARAM)
            .param("@usermention", "The mentioned member becomes the owner of the group.")
            .mod_only()
            .category(GROUPS_CATEGORY),
    );
    registry.register(
        CommandHelp::new("add-course")
            .syntax("!add-course <coursenumber> <name...>")
            .brief("Adds a course heading to the learning group directory.")
            .example("!add-course 1141 Mathematische Grundlagen")
            .description(
                "Also edits an existing heading: for a known course number the heading is \
                 replaced.",
            )
            .param("coursenumber", COURSE_PARAM)
            .param("name...", "Free text, may contain spaces.")
            .mod_only()
            .category(GROUPS_CATEGORY),
    );
    registry.register(
        CommandHelp::new("rename")
            .syntax("!rename <name>")
            .brief("Renames the learning group channel the command is run in.")
            .example("!rename matheluschen")
            .description("The example turns #1142-matheprofis-sose22 into #1142-matheluschen-sose22.")
            .param("name", "The new group name, without spaces.")
            .mod_only()
            .category(GROUPS_CATEGORY),
    );
    registry.register(
        CommandHelp::new("archive")
            .brief("Archives the learning group channel.")
            .description("Moves the group channel the command is run in to the archive.")
            .mod_only()
            .category(GROUPS_CATEGORY),
    );
    registry.register(
        CommandHelp::new("owner")
            .syntax("!owner <@usermention>")
            .brief("Sets the owner of a learning group channel.")
            .example("!owner @someuser")
            .description("Run it inside the group channel.")
            .param("@usermention", "The new owner of the group.")
            .mod_only()
            .category(GROUPS_CATEGORY),
    );
    registry.register(
        CommandHelp::new("show-owner")
            .brief("Shows the owner of a learning group channel.")
            .description("Run it inside the group channel.")
            .mod_only()
            .category(GROUPS_CATEGORY),
    );
    registry.register(
        CommandHelp::new("init-groups")
            .brief("Builds the group data from the existing learning group channels.")
            .description(
                "Reads every channel in the open and closed group categories. Channel names \
                 must have the form #{symbol}{coursenumber}-{name}-{semester}. The member \
                 running the command becomes the owner of every group. Does nothing if groups \
                 are already managed.",
            )
            .mod_only()
            .category(GROUPS_CATEGORY),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::commands::Command;

    #[test]
    fn test_every_parsed_command_has_help() {
        let registry = default_registry();
        for content in [
            "!help",
            "!mod-help",
            "!request-group 1 a sose22 open",
            "!add-group 1 a sose22 open 2",
            "!add-course 1 x",
            "!open",
            "!close",
            "!rename a",
            "!archive",
            "!owner 1",
            "!show-owner",
            "!init-groups",
        ] {
            let command = Command::parse(content).unwrap().unwrap();
            assert!(
                registry.get(command.name()).is_some(),
                "{} has no help entry",
                command.name()
            );
        }
    }

    #[test]
    fn test_member_overview_has_no_mod_commands() {
        let text = default_registry().overview(false);
        assert!(text.contains("!request-group"));
        assert!(!text.contains("!archive"));
    }
}
