//! Telling link-preview crawlers apart from people.

/// Substrings of `User-Agent` headers sent by crawlers, chat apps fetching
/// link previews, and common HTTP libraries. Matched case-insensitively.
pub const KNOWN_AGENTS: [&str; 31] = [
    "bot",
    "facebook",
    "embed",
    "got",
    "firefox/92",
    "firefox/38",
    "curl",
    "wget",
    "go-http",
    "yahoo",
    "generator",
    "whatsapp",
    "preview",
    "link",
    "proxy",
    "vkshare",
    "images",
    "analyzer",
    "index",
    "crawl",
    "spider",
    "python",
    "cfnetwork",
    "node",
    "mastodon",
    "http.rb",
    "discord",
    "ruby",
    "bun/",
    "fiddler",
    "revoltchat",
];

/// Is this client identifier one of the built-in [`KNOWN_AGENTS`]?
pub fn is_bot(user_agent: &str) -> bool {
    let user_agent = user_agent.to_lowercase();
    KNOWN_AGENTS.iter().any(|needle| user_agent.contains(needle))
}

/// [`KNOWN_AGENTS`] plus any configured extras.
#[derive(Debug, Clone)]
pub struct BotClassifier {
    extra: Vec<String>,
}
impl Default for BotClassifier {
    fn default() -> Self {
        Self::new(std::iter::empty::<String>())
    }
}
impl BotClassifier {
    pub fn new(extra: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        let extra = extra
            .into_iter()
            .map(|needle| needle.as_ref().trim().to_lowercase())
            .filter(|needle| !needle.is_empty())
            .collect();
        Self { extra }
    }

    /// Anything that doesn't identify itself at all is treated as automated;
    /// browsers always send a `User-Agent`.
    pub fn is_bot(&self, user_agent: Option<&str>) -> bool {
        let Some(user_agent) = user_agent.map(str::trim).filter(|ua| !ua.is_empty()) else {
            return true;
        };
        is_bot(user_agent) || {
            let user_agent = user_agent.to_lowercase();
            self.extra.iter().any(|needle| user_agent.contains(needle.as_str()))
        }
    }
}
