//! Slash-command parsing.

/// Commands registered with Telegram for client autocomplete.
pub const BOT_COMMANDS: &[(&str, &str)] = &[
    ("start", "Reset settings and show the welcome message"),
    ("help", "How to use the bot"),
    ("settings", "Show current field index and delimiter"),
    ("set_index", "Set the field index (0-based)"),
    ("set_delimiter", "Set the field delimiter"),
];

/// A recognised slash command.
///
/// Setter arguments are kept raw so the handler can report what was wrong
/// with them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Settings,
    SetIndex(Option<String>),
    SetDelimiter(Option<String>),
}

impl Command {
    /// Parse a message text into a command.
    ///
    /// Returns `None` for plain text, unknown commands, and commands
    /// addressed to a different bot (`/help@other_bot`).
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let text = text.trim_start();
        let body = text.strip_prefix('/')?;
        let (head, rest) = body
            .split_once(char::is_whitespace)
            .unwrap_or((body, ""));
        let name = match head.split_once('@') {
            Some((name, mention)) => {
                if let Some(me) = bot_username
                    && !mention.eq_ignore_ascii_case(me)
                {
                    return None;
                }
                name
            },
            None => head,
        };
        let arg = Some(rest.trim_start())
            .filter(|a| !a.is_empty())
            .map(str::to_string);

        match name {
            "start" => Some(Self::Start),
            "help" => Some(Self::Help),
            "settings" => Some(Self::Settings),
            "set_index" => Some(Self::SetIndex(arg)),
            "set_delimiter" => Some(Self::SetDelimiter(arg)),
            _ => None,
        }
    }
}
