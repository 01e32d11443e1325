//! Static resources: word lists, gallows drawings, phrase lists.

/// Words used when no word service answers.
pub const FALLBACK_WORDS: &[&str] = &[
    "python", "discord", "hangman", "bot", "developer", "coding", "cascade", "paradigm", "magic",
    "wizard", "google", "gemini",
];

/// Gallows drawings, from fully hanged (index 0) to the empty gallows.
///
/// Index `n` is shown when `n` attempts are left.
pub const HANGMAN_STAGES: [&str; 7] = [
    r"
  --------
  |      |
  |      O
  |     \|/
  |      |
  |     / \
  --------",
    r"
  --------
  |      |
  |      O
  |     \|/
  |      |
  |     /
  --------",
    r"
  --------
  |      |
  |      O
  |     \|/
  |      |
  |
  --------",
    r"
  --------
  |      |
  |      O
  |     \|
  |      |
  |
  --------",
    r"
  --------
  |      |
  |      O
  |      |
  |      |
  |
  --------",
    r"
  --------
  |      |
  |      O
  |
  |
  |
  --------",
    r"
  --------
  |      |
  |
  |
  |
  |
  --------",
];

/// Gallows drawing for the given number of attempts left, scaled so a
/// fresh game is always empty and a lost one always complete.
pub fn hangman_drawing(attempts_left: u8, max_misses: u8) -> &'static str {
    let last = HANGMAN_STAGES.len() - 1;
    if max_misses == 0 {
        return HANGMAN_STAGES[0];
    }
    let left = usize::from(attempts_left.min(max_misses));
    let index = (left * last + usize::from(max_misses) / 2) / usize::from(max_misses);
    HANGMAN_STAGES[index.min(last)]
}

/// Local compliments, used when the compliment service is unavailable.
pub const COMPLIMENTS: &[&str] = &[
    "You light up every channel you join.",
    "Your sense of humor is criminally underrated.",
    "You make hard things look easy.",
    "People feel smarter after talking to you.",
    "You have impeccable taste in memes.",
    "Your kindness is a balm to everyone around you.",
    "You're the reason the group chat is fun.",
    "You bring out the best in other people.",
];

/// Local roasts, used when the roast service is unavailable.
pub const ROASTS: &[&str] = &[
    "You're the human version of a loading screen.",
    "Your Wi-Fi signal has more personality than you.",
    "You bring everyone so much joy... when you log off.",
    "You're like a cloud: when you disappear it's a beautiful day.",
    "I'd agree with you, but then we'd both be wrong.",
    "You have something on your chin... no, the third one down.",
    "Your secrets are always safe with me. I never even listen when you tell me them.",
    "You're proof that evolution can go in reverse.",
];

/// Warning sent before roasts.
pub const ROAST_WARNING: &str = "⚠️ **Warning**: Roasts can be mean-spirited. Please use this command responsibly and only with friends who are okay with it!";

/// Title of the embed sent when the bot joins a server.
pub const INTRO_TITLE: &str = "👋 Hello, I'm Functopus, your new Discord Bot!";

/// Feature overview of the embed sent when the bot joins a server.
pub const INTRO_FEATURES: &str = "🎮 **Fun Games**\n\
• Multiplayer Truth or Dare\n\
• Classic Hangman\n\
• Never Have I Ever\n\n\
🤖 **AI Chat**\n\
• Ask me anything (`!ask`)\n\n\
😄 **Fun Activities**\n\
• Random Memes\n\
• Compliments\n\
• Roasts\n\
• Jokes\n\n\
🎯 **Getting Started**\n\
• Discover even more activities\n\
• Type `!help` to see all commands\n\
• Use `!help <command>` for detailed info\n";

/// Reaction used to answer Never Have I Ever rounds.
pub const NHIE_REACTION: char = '✅';
