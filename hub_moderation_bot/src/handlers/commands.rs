use teloxide::types::BotCommand;

/// What a command does. Dispatch on this lives with the handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Start,
    Help,
    Stats,
    Users,
    Search,
    Premium,
    Pending,
    Questions,
    Broadcast,
}

pub struct Command {
    pub callname: &'static str,
    pub description: &'static str,
    pub kind: CommandKind,
    hidden: bool,
}

pub const COMMANDS: &[Command] = &[
    Command {
        callname: "/start",
        description: "",
        kind: CommandKind::Start,
        hidden: true,
    },
    Command {
        callname: "/help",
        description: "show this list",
        kind: CommandKind::Help,
        hidden: false,
    },
    Command {
        callname: "/stats",
        description: "user and article statistics",
        kind: CommandKind::Stats,
        hidden: false,
    },
    Command {
        callname: "/users",
        description: "list of users",
        kind: CommandKind::Users,
        hidden: false,
    },
    Command {
        callname: "/search &lt;username or id&gt;",
        description: "find a user",
        kind: CommandKind::Search,
        hidden: false,
    },
    Command {
        callname: "/premium",
        description: "premium users",
        kind: CommandKind::Premium,
        hidden: false,
    },
    Command {
        callname: "/pending",
        description: "articles waiting for moderation",
        kind: CommandKind::Pending,
        hidden: false,
    },
    Command {
        callname: "/questions",
        description: "unanswered support questions",
        kind: CommandKind::Questions,
        hidden: false,
    },
    Command {
        callname: "/broadcast &lt;text&gt;",
        description: "send a message to every user",
        kind: CommandKind::Broadcast,
        hidden: false,
    },
];

impl Command {
    pub fn is_matching_callname(&self, command: &str) -> bool {
        self.callname
            .split_ascii_whitespace()
            .next()
            .is_some_and(|x| x.eq_ignore_ascii_case(command))
    }

    pub fn get_help(&self, mut output: impl std::fmt::Write) -> Result<(), std::fmt::Error> {
        output.write_str(self.callname)?;
        if !self.description.is_empty() {
            output.write_str(" - ")?;
            output.write_str(self.description)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn generate_help() -> String {
        let mut response = String::from("🛠 <b>Admin commands:</b>\n\n");
        for command in COMMANDS {
            if command.hidden {
                continue;
            }
            // Writing to a String never fails.
            let _ = command.get_help(&mut response);
            response.push('\n');
        }
        response.push_str(concat!(
            "\nPress ❌ under an article, then send the reason as a message.\n",
            "Reply to a shown support question to answer it."
        ));
        response
    }

    #[must_use]
    pub fn generate_bot_commands() -> Vec<BotCommand> {
        let mut output = Vec::new();

        for command in COMMANDS {
            if command.hidden {
                continue;
            }
            let Some(callname) = command.callname.split_ascii_whitespace().next() else {
                continue;
            };

            // Cut off the /
            let callname = callname[1..].trim().to_string();
            output.push(BotCommand::new(callname, command.description));
        }

        output
    }
}

/// Split a message into a command and its parameters.
///
/// `/search@Hub_Bot  foo` gives `("/search", "foo")` if our username is
/// `Hub_Bot`. A command addressed to another bot, or text that's not a
/// command at all, gives `None`.
#[must_use]
pub fn split_command<'a>(text: &'a str, bot_username: Option<&str>) -> Option<(&'a str, &'a str)> {
    if !text.starts_with('/') {
        return None;
    }
    let command = text.split_whitespace().next()?;
    if !command.is_ascii() {
        // Telegram commands must be ASCII.
        // See https://core.telegram.org/bots/api#botcommand
        return None;
    }
    let params = text[command.len()..].trim_start();

    let callname = match command.find('@') {
        Some(username_start) => {
            // Bot names are guaranteed ASCII, so ignore ASCII case specifically.
            let addressee = &command[username_start + '@'.len_utf8()..];
            if !bot_username.is_some_and(|x| x.eq_ignore_ascii_case(addressee)) {
                return None;
            }
            &command[..username_start]
        }
        None => command,
    };
    Some((callname, params))
}

/// Find an admin command in a message, with its parameters.
#[must_use]
pub fn parse_command<'a>(
    text: &'a str,
    bot_username: Option<&str>,
) -> Option<(CommandKind, &'a str)> {
    let (callname, params) = split_command(text, bot_username)?;
    COMMANDS
        .iter()
        .find(|x| x.is_matching_callname(callname))
        .map(|x| (x.kind, params))
}
