//! Slash command parsing.
//!
//! Lines starting with `/` are commands; anything else is a message for
//! the active channel. A leading `//` sends a message that starts with `/`.

use chrono::NaiveDate;
use huddle_app::Intent;
use huddle_proto::{DATE_FORMAT, SearchQuery};

/// Help text listing every command.
pub const HELP: &str = "/ws NAME | /ch NAME | /nick NAME | /create-ws NAME | /delete-ws NAME | \
                        /create-ch NAME [DESCRIPTION] | /delete-ch NAME | /search [TEXT] \
                        [by:NAME] [in:WS[/CH]] [from:DATE] [to:DATE] | /refresh | /quit";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Post to the active channel.
    Message(String),
    /// `/ws NAME`
    SelectWorkspace(String),
    /// `/ch NAME`
    SelectChannel(String),
    /// `/nick NAME`
    Nick(String),
    /// `/create-ws NAME`
    CreateWorkspace(String),
    /// `/delete-ws NAME`
    DeleteWorkspace(String),
    /// `/create-ch NAME [DESCRIPTION]`
    CreateChannel {
        /// Channel name
        name: String,
        /// Rest of the line, if any
        description: Option<String>,
    },
    /// `/delete-ch NAME`
    DeleteChannel(String),
    /// `/search` with at least one criterion
    Search(SearchQuery),
    /// `/search` alone: hide the results pane
    ClearSearch,
    /// `/refresh`
    Refresh,
    /// `/help`
    Help,
    /// `/quit`
    Quit,
    /// Not a known command.
    Unknown {
        /// The command word as typed
        input: String,
    },
    /// Known command, unusable arguments.
    InvalidArgs {
        /// The command word
        command: &'static str,
        /// What was wrong
        error: String,
    },
}

impl Command {
    /// The runtime intent for this command, if it has one.
    pub fn into_intent(self) -> Option<Intent> {
        let intent = match self {
            Self::Message(body) => Intent::SendMessage { body },
            Self::SelectWorkspace(name) => Intent::SelectWorkspace(name),
            Self::SelectChannel(name) => Intent::SelectChannel(name),
            Self::Nick(name) => Intent::RegisterIdentity(name),
            Self::CreateWorkspace(name) => Intent::CreateWorkspace { name },
            Self::DeleteWorkspace(name) => Intent::DeleteWorkspace { name },
            Self::CreateChannel { name, description } => {
                Intent::CreateChannel { name, description }
            },
            Self::DeleteChannel(name) => Intent::DeleteChannel { name },
            Self::Search(query) => Intent::Search(query),
            Self::Refresh => Intent::Refresh,
            Self::Quit => Intent::Quit,
            Self::ClearSearch | Self::Help | Self::Unknown { .. } | Self::InvalidArgs { .. } => {
                return None;
            },
        };
        Some(intent)
    }
}

/// Parse one input line.
pub fn parse(line: &str) -> Command {
    let line = line.trim_end();
    if let Some(escaped) = line.strip_prefix("//") {
        return Command::Message(format!("/{escaped}"));
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Message(line.to_owned());
    };

    let (word, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let args = args.trim();

    match word {
        "ws" => one_name("ws", args).map_or_else(|e| e, Command::SelectWorkspace),
        "ch" => one_name("ch", args).map_or_else(|e| e, Command::SelectChannel),
        "nick" => one_name("nick", args).map_or_else(|e| e, Command::Nick),
        "create-ws" => one_name("create-ws", args).map_or_else(|e| e, Command::CreateWorkspace),
        "delete-ws" => one_name("delete-ws", args).map_or_else(|e| e, Command::DeleteWorkspace),
        "delete-ch" => one_name("delete-ch", args).map_or_else(|e| e, Command::DeleteChannel),
        "create-ch" => create_channel(args),
        "search" => search(args),
        "refresh" => Command::Refresh,
        "help" => Command::Help,
        "quit" | "q" => Command::Quit,
        _ => Command::Unknown { input: format!("/{word}") },
    }
}

fn one_name(command: &'static str, args: &str) -> Result<String, Command> {
    let mut words = args.split_whitespace();
    match (words.next(), words.next()) {
        (Some(name), None) => Ok(name.to_owned()),
        (None, _) => Err(Command::InvalidArgs { command, error: "expected a name".into() }),
        (Some(_), Some(_)) => {
            Err(Command::InvalidArgs { command, error: "names cannot contain spaces".into() })
        },
    }
}

fn create_channel(args: &str) -> Command {
    let (name, description) = args.split_once(char::is_whitespace).unwrap_or((args, ""));
    if name.is_empty() {
        return Command::InvalidArgs { command: "create-ch", error: "expected a name".into() };
    }
    let description = description.trim();
    Command::CreateChannel {
        name: name.to_owned(),
        description: (!description.is_empty()).then(|| description.to_owned()),
    }
}

fn search(args: &str) -> Command {
    let mut query = SearchQuery::default();
    let mut text = Vec::new();

    for word in args.split_whitespace() {
        if let Some(sender) = word.strip_prefix("by:") {
            query.sender = Some(sender.to_owned());
        } else if let Some(scope) = word.strip_prefix("in:") {
            let (workspace, channel) = scope.split_once('/').unwrap_or((scope, ""));
            query.workspace = Some(workspace.to_owned()).filter(|w| !w.is_empty());
            query.channel = Some(channel.to_owned()).filter(|c| !c.is_empty());
        } else if let Some(date) = word.strip_prefix("from:") {
            match parse_date(date) {
                Ok(date) => query.date_from = Some(date),
                Err(error) => return error,
            }
        } else if let Some(date) = word.strip_prefix("to:") {
            match parse_date(date) {
                Ok(date) => query.date_to = Some(date),
                Err(error) => return error,
            }
        } else {
            text.push(word);
        }
    }

    if !text.is_empty() {
        query.query = Some(text.join(" "));
    }
    if query == SearchQuery::default() { Command::ClearSearch } else { Command::Search(query) }
}

fn parse_date(text: &str) -> Result<NaiveDate, Command> {
    NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|_| Command::InvalidArgs {
        command: "search",
        error: format!("bad date {text:?}, expected YYYY-MM-DD"),
    })
}
