//! Prefix command parsing (!roll, !tod start, etc).
//!
//! Commands are looked up in a static table of names and aliases. Unknown
//! commands and text without the prefix are ignored.

use tracing::debug;

/// Longer first tokens are never looked up.
const MAX_COMMAND_NAME_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    General,
    Fun,
    Games,
    AiChat,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::General,
        Category::Fun,
        Category::Games,
        Category::AiChat,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Category::General => "❓ General",
            Category::Fun => "😄 Fun",
            Category::Games => "🎮 Games",
            Category::AiChat => "🤖 AI Chat",
        }
    }
}

/// One entry of the command table.
#[derive(Debug)]
pub struct CommandSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub args: &'static str,
    pub category: Category,
    pub brief: &'static str,
}

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "help",
        aliases: &[],
        args: "[command]",
        category: Category::General,
        brief: "Show all commands, or details about one command",
    },
    CommandSpec {
        name: "meme",
        aliases: &[],
        args: "",
        category: Category::Fun,
        brief: "Get a random meme from Reddit",
    },
    CommandSpec {
        name: "joke",
        aliases: &["j"],
        args: "",
        category: Category::Fun,
        brief: "Get a random joke",
    },
    CommandSpec {
        name: "fact",
        aliases: &["uf", "uselessfact"],
        args: "",
        category: Category::Fun,
        brief: "Learn a random useless but interesting fact",
    },
    CommandSpec {
        name: "compliment",
        aliases: &["comp"],
        args: "[@users / @everyone]",
        category: Category::Fun,
        brief: "Send a nice compliment to yourself or others",
    },
    CommandSpec {
        name: "roast",
        aliases: &[],
        args: "[@users / @everyone]",
        category: Category::Fun,
        brief: "Send a playful roast (keep it friendly!)",
    },
    CommandSpec {
        name: "gif",
        aliases: &["g"],
        args: "<search term>",
        category: Category::Fun,
        brief: "Search and send a random GIF",
    },
    CommandSpec {
        name: "roll",
        aliases: &["dice"],
        args: "[notation]",
        category: Category::Games,
        brief: "Roll dice, e.g. `d20`, `2d6+3` (default `1d6`)",
    },
    CommandSpec {
        name: "flip",
        aliases: &["toss"],
        args: "",
        category: Category::Games,
        brief: "Flip a coin",
    },
    CommandSpec {
        name: "hangman",
        aliases: &["hg"],
        args: "",
        category: Category::Games,
        brief: "Start a game of Hangman",
    },
    CommandSpec {
        name: "guess",
        aliases: &[],
        args: "<letter>",
        category: Category::Games,
        brief: "Guess a letter in the current Hangman game",
    },
    CommandSpec {
        name: "hstop",
        aliases: &["hangmanstop"],
        args: "",
        category: Category::Games,
        brief: "Stop the current Hangman game (starter or moderator)",
    },
    CommandSpec {
        name: "tod",
        aliases: &[],
        args: "[start/join/leave/play/players/end/truth/dare]",
        category: Category::Games,
        brief: "Play Truth or Dare with friends",
    },
    CommandSpec {
        name: "done",
        aliases: &[],
        args: "",
        category: Category::Games,
        brief: "Finish your truth or dare",
    },
    CommandSpec {
        name: "nhie",
        aliases: &["neverhaveiever"],
        args: "",
        category: Category::Games,
        brief: "Play a round of Never Have I Ever",
    },
    CommandSpec {
        name: "ask",
        aliases: &["chat", "q"],
        args: "<prompt>",
        category: Category::AiChat,
        brief: "Ask the AI anything",
    },
];

/// Find a command by name or alias, case-insensitively.
pub fn find_command(name: &str) -> Option<&'static CommandSpec> {
    let name = name.trim().to_lowercase();
    let name = name.trim_start_matches('!');
    COMMANDS
        .iter()
        .find(|c| c.name == name || c.aliases.contains(&name))
}

/// Truth or Dare subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodAction {
    /// Bare `!tod` or an unknown subcommand.
    Help,
    Start,
    Join,
    Leave,
    Play,
    Players,
    End,
    Truth,
    Dare,
}

impl TodAction {
    fn parse(args: &str) -> Self {
        let sub = args.split_whitespace().next().unwrap_or("").to_lowercase();
        match sub.as_str() {
            "start" => TodAction::Start,
            "join" => TodAction::Join,
            "leave" => TodAction::Leave,
            "play" => TodAction::Play,
            "players" => TodAction::Players,
            "end" => TodAction::End,
            "truth" => TodAction::Truth,
            "dare" => TodAction::Dare,
            _ => TodAction::Help,
        }
    }
}

/// A parsed command with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help { topic: Option<String> },
    Meme,
    Joke,
    Fact,
    Compliment { args: String },
    Roast { args: String },
    Gif { term: String },
    Roll { notation: Option<String> },
    Flip,
    Hangman,
    Guess { input: String },
    HangmanStop,
    Tod(TodAction),
    Done,
    Nhie,
    Ask { prompt: String },
}

/// Parse a message into a command.
///
/// Returns `None` for text without the prefix and for unknown commands.
pub fn parse_command(prefix: &str, content: &str) -> Option<Command> {
    let rest = content.trim().strip_prefix(prefix)?;
    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };
    if name.is_empty() || name.len() > MAX_COMMAND_NAME_LEN {
        return None;
    }

    let spec = find_command(name)?;
    debug!("Processing command: {} with args: {:?}", spec.name, args);

    let optional = |s: &str| (!s.is_empty()).then(|| s.to_string());
    let command = match spec.name {
        "help" => Command::Help {
            topic: optional(args),
        },
        "meme" => Command::Meme,
        "joke" => Command::Joke,
        "fact" => Command::Fact,
        "compliment" => Command::Compliment {
            args: args.to_string(),
        },
        "roast" => Command::Roast {
            args: args.to_string(),
        },
        "gif" => Command::Gif {
            term: args.to_string(),
        },
        "roll" => Command::Roll {
            notation: args.split_whitespace().next().map(str::to_string),
        },
        "flip" => Command::Flip,
        "hangman" => Command::Hangman,
        "guess" => Command::Guess {
            input: args.to_string(),
        },
        "hstop" => Command::HangmanStop,
        "tod" => Command::Tod(TodAction::parse(args)),
        "done" => Command::Done,
        "nhie" => Command::Nhie,
        "ask" => Command::Ask {
            prompt: args.to_string(),
        },
        _ => return None,
    };
    Some(command)
}

/// Usage line of a command, e.g. `!gif <search term>`.
pub fn usage(prefix: &str, spec: &CommandSpec) -> String {
    if spec.args.is_empty() {
        format!("`{}{}`", prefix, spec.name)
    } else {
        format!("`{}{} {}`", prefix, spec.name, spec.args)
    }
}

/// One help field per category: (title, lines).
pub fn help_overview(prefix: &str) -> Vec<(&'static str, String)> {
    Category::ALL
        .iter()
        .map(|category| {
            let lines = COMMANDS
                .iter()
                .filter(|c| c.category == *category)
                .map(|c| format!("`{}{}` - {}", prefix, c.name, c.brief))
                .collect::<Vec<_>>()
                .join("\n");
            (category.title(), lines)
        })
        .filter(|(_, lines)| !lines.is_empty())
        .collect()
}

/// Aliases line of a command, or `None` when it has none.
pub fn aliases(prefix: &str, spec: &CommandSpec) -> Option<String> {
    if spec.aliases.is_empty() {
        return None;
    }
    Some(
        spec.aliases
            .iter()
            .map(|a| format!("`{}{}`", prefix, a))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// Help text listing the Truth or Dare subcommands.
pub fn tod_help(prefix: &str) -> String {
    format!(
        "🎮 Truth or Dare Commands:\n\
         `{p}tod start` - Start a new game\n\
         `{p}tod join` - Join the current game\n\
         `{p}tod leave` - Leave the game\n\
         `{p}tod play` - Begin playing\n\
         `{p}tod players` - List current players\n\
         `{p}tod end` - End the current game\n\
         `{p}tod truth` / `{p}tod dare` - Choose on your turn, then `{p}done`",
        p = prefix
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names_and_aliases() {
        assert_eq!(parse_command("!", "!meme"), Some(Command::Meme));
        assert_eq!(parse_command("!", "!J"), Some(Command::Joke));
        assert_eq!(parse_command("!", "!UselessFact"), Some(Command::Fact));
        assert_eq!(parse_command("!", "!hg"), Some(Command::Hangman));
        assert_eq!(
            parse_command("!", "!q what is rust?"),
            Some(Command::Ask {
                prompt: "what is rust?".to_string()
            })
        );
    }

    #[test]
    fn test_parse_keeps_arguments() {
        assert_eq!(
            parse_command("!", "!gif   happy dance "),
            Some(Command::Gif {
                term: "happy dance".to_string()
            })
        );
        assert_eq!(
            parse_command("!", "!roll 2d6+3"),
            Some(Command::Roll {
                notation: Some("2d6+3".to_string())
            })
        );
        assert_eq!(
            parse_command("!", "!dice"),
            Some(Command::Roll { notation: None })
        );
        assert_eq!(
            parse_command("!", "!guess E"),
            Some(Command::Guess {
                input: "E".to_string()
            })
        );
    }

    #[test]
    fn test_parse_tod_subcommands() {
        assert_eq!(
            parse_command("!", "!tod start"),
            Some(Command::Tod(TodAction::Start))
        );
        assert_eq!(
            parse_command("!", "!tod PLAYERS"),
            Some(Command::Tod(TodAction::Players))
        );
        assert_eq!(
            parse_command("!", "!tod"),
            Some(Command::Tod(TodAction::Help))
        );
        assert_eq!(
            parse_command("!", "!tod dance"),
            Some(Command::Tod(TodAction::Help))
        );
    }

    #[test]
    fn test_ignores_other_text() {
        assert_eq!(parse_command("!", "hello there"), None);
        assert_eq!(parse_command("!", "?meme"), None);
        assert_eq!(parse_command("!", "!unknown"), None);
        assert_eq!(parse_command("!", "!"), None);
        assert_eq!(parse_command("!", "! meme"), None);
    }

    #[test]
    fn test_custom_prefix() {
        assert_eq!(parse_command("fn.", "fn.flip"), Some(Command::Flip));
        assert_eq!(parse_command("fn.", "!flip"), None);
    }

    #[test]
    fn test_help_topics() {
        assert_eq!(find_command("comp").map(|c| c.name), Some("compliment"));
        assert_eq!(find_command("!toss").map(|c| c.name), Some("flip"));
        assert!(find_command("nope").is_none());

        let gif = find_command("gif").unwrap();
        assert_eq!(usage("!", gif), "`!gif <search term>`");
        assert_eq!(aliases("!", gif).as_deref(), Some("`!g`"));
        assert_eq!(aliases("!", find_command("meme").unwrap()), None);
    }

    #[test]
    fn test_help_overview_lists_every_command_once() {
        let overview = help_overview("!");
        assert_eq!(overview.len(), 4);
        let all: String = overview.iter().map(|(_, lines)| lines.as_str()).collect();
        for spec in COMMANDS {
            let needle = format!("`!{}`", spec.name);
            assert_eq!(all.matches(&needle).count(), 1, "{}", spec.name);
        }
    }
}
