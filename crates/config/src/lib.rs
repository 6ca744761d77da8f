//! Configuration for the embedit service.
//!
//! Values are layered with [`figment`], later sources overriding earlier ones:
//!
//! 1. built-in defaults ([`Config::default`]),
//! 2. a configuration file (TOML, YAML or JSON, picked by extension),
//! 3. environment variables prefixed with `EMBEDIT_`, using `__` to reach
//!    nested keys (`EMBEDIT_PROVIDERS__TIKTOK__STRATEGY=ytdlp`).
//!
//! The file is the one passed explicitly, otherwise `./config.toml`, otherwise
//! `config.toml` in the platform configuration directory. No file at all is
//! fine; defaults and the environment are enough to run.

pub mod error;

use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::instrument;

use crate::error::{ErrorKind, Result};
use embedit_extract::providers::ytdlp::FormatPolicy;
use embedit_extract::providers::{DEFAULT_BEARER_TOKEN, DEFAULT_SESSION_TTL};

pub const ENV_PREFIX: &str = "EMBEDIT_";
const FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Public base URL of this service; oEmbed links point back here.
    pub url: String,
    /// Project homepage. `/` redirects here and oEmbed records name it.
    pub repo: String,
    /// `provider_name` of oEmbed records.
    pub name: String,
    /// Accent colour for posts whose provider doesn't set one.
    pub color: Option<String>,
    pub bind: SocketAddr,
    pub sqlite: SqliteConfig,
    pub cache: CacheConfig,
    pub extract: ExtractConfig,
    pub providers: ProvidersConfig,
    pub ytdlp: YtDlpConfig,
    pub bots: BotsConfig,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".to_string(),
            repo: "https://github.com/embedit/embedit".to_string(),
            name: "embedit".to_string(),
            color: None,
            bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8000)),
            sqlite: SqliteConfig::default(),
            cache: CacheConfig::default(),
            extract: ExtractConfig::default(),
            providers: ProvidersConfig::default(),
            ytdlp: YtDlpConfig::default(),
            bots: BotsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    pub file: PathBuf,
}
impl Default for SqliteConfig {
    fn default() -> Self {
        Self { file: PathBuf::from("cache.db") }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Seconds.
    pub ttl: u64,
}
impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl: 60 * 60 * 24 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Seconds.
    pub timeout: u64,
}
impl Default for ExtractConfig {
    fn default() -> Self {
        Self { timeout: 20 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub tiktok: TikTokConfig,
    pub twitter: TwitterConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TikTokStrategy {
    /// Query the app feed API directly.
    #[default]
    Api,
    /// Hand the URL to `yt-dlp`.
    Ytdlp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TikTokConfig {
    pub strategy: TikTokStrategy,
    /// `first`, `exact:<format id>` or `prefer:<format id>`.
    pub format: String,
}
impl Default for TikTokConfig {
    fn default() -> Self {
        Self { strategy: TikTokStrategy::default(), format: FormatPolicy::default().to_string() }
    }
}
impl TikTokConfig {
    pub fn format_policy(&self) -> Result<FormatPolicy> {
        self.format.parse::<FormatPolicy>().or_raise(|| ErrorKind::Invalid("providers.tiktok.format"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitterConfig {
    pub bearer_token: String,
    /// Seconds a guest session is used before it is renewed.
    pub session_ttl: u64,
}
impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            bearer_token: DEFAULT_BEARER_TOKEN.to_string(),
            session_ttl: DEFAULT_SESSION_TTL.as_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct YtDlpConfig {
    /// Explicit path to the executable; looked up on `PATH` otherwise.
    pub binary: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotsConfig {
    /// Client identifier substrings treated as crawlers, on top of the built-in list.
    pub extra: Vec<String>,
}

impl Config {
    /// Load and validate configuration, see the [crate docs](crate) for the
    /// order of sources.
    #[instrument]
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = locate(explicit)? {
            tracing::info!(path = %path.display(), "loading configuration file");
            figment = figment.merge(file_provider(&path)?);
        }
        Self::from_figment(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if url::Url::parse(&self.url).is_err() {
            exn::bail!(ErrorKind::Invalid("url"));
        }
        if url::Url::parse(&self.repo).is_err() {
            exn::bail!(ErrorKind::Invalid("repo"));
        }
        if self.color.as_deref().is_some_and(|color| !is_hex_color(color)) {
            exn::bail!(ErrorKind::Invalid("color"));
        }
        if self.cache.ttl == 0 {
            exn::bail!(ErrorKind::Invalid("cache.ttl"));
        }
        if self.extract.timeout == 0 {
            exn::bail!(ErrorKind::Invalid("extract.timeout"));
        }
        if self.providers.twitter.session_ttl == 0 {
            exn::bail!(ErrorKind::Invalid("providers.twitter.session_ttl"));
        }
        self.providers.tiktok.format_policy()?;
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl)
    }

    pub fn extract_timeout(&self) -> Duration {
        Duration::from_secs(self.extract.timeout)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.providers.twitter.session_ttl)
    }
}

/// The configuration file to read, if any.
fn locate(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.is_file() {
            exn::bail!(ErrorKind::NotFound(path.display().to_string()));
        }
        return Ok(Some(path.to_path_buf()));
    }
    let local = PathBuf::from(FILE_NAME);
    if local.is_file() {
        return Ok(Some(local));
    }
    Ok(ProjectDirs::from("", "", "embedit")
        .map(|dirs| dirs.config_dir().join(FILE_NAME))
        .filter(|path| path.is_file()))
}

fn file_provider(path: &Path) -> Result<Figment> {
    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or_default().to_ascii_lowercase();
    Ok(match extension.as_str() {
        "toml" => Figment::from(Toml::file_exact(path)),
        "yaml" | "yml" => Figment::from(Yaml::file_exact(path)),
        "json" => Figment::from(Json::file_exact(path)),
        _ => exn::bail!(ErrorKind::Format(path.display().to_string())),
    })
}

fn is_hex_color(color: &str) -> bool {
    color.len() == 7 && color.starts_with('#') && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;
    use std::io::Write;

    fn jailed<T>(err: exn::Exn<ErrorKind>) -> figment::error::Result<T> {
        Err(figment::Error::from(err.to_string()))
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.cache_ttl(), Duration::from_secs(86_400));
        assert_eq!(config.extract_timeout(), Duration::from_secs(20));
        assert_eq!(config.session_ttl(), Duration::from_secs(9_000));
        assert_eq!(config.providers.tiktok.format_policy().unwrap(), FormatPolicy::First);
        assert_eq!(config.bind.port(), 8000);
    }

    #[test]
    fn test_defaults_roundtrip_through_figment() {
        let config = Config::from_figment(Figment::from(Serialized::defaults(Config::default()))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_local_file_and_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r##"
                    url = "https://embed.example"
                    color = "#123abc"

                    [sqlite]
                    file = "/var/lib/embedit/cache.db"

                    [providers.tiktok]
                    strategy = "ytdlp"
                    format = "prefer:h264_540p"
                "##,
            )?;
            jail.set_env("EMBEDIT_CACHE__TTL", "60");
            jail.set_env("EMBEDIT_BOTS__EXTRA", "[\"matrix\"]");
            jail.set_env("EMBEDIT_URL", "https://override.example");

            let config = match Config::load(None) {
                Ok(config) => config,
                Err(err) => return jailed(err),
            };
            assert_eq!(config.url, "https://override.example");
            assert_eq!(config.color.as_deref(), Some("#123abc"));
            assert_eq!(config.sqlite.file, PathBuf::from("/var/lib/embedit/cache.db"));
            assert_eq!(config.providers.tiktok.strategy, TikTokStrategy::Ytdlp);
            assert_eq!(
                config.providers.tiktok.format_policy().unwrap(),
                FormatPolicy::Prefer("h264_540p".to_string())
            );
            assert_eq!(config.cache_ttl(), Duration::from_secs(60));
            assert_eq!(config.bots.extra, vec!["matrix".to_string()]);
            // Untouched values keep their defaults.
            assert_eq!(config.name, "embedit");
            assert_eq!(config.extract.timeout, 20);
            Ok(())
        });
    }

    #[test]
    fn test_no_file_is_fine() {
        Jail::expect_with(|jail| {
            jail.set_env("EMBEDIT_NAME", "fixer");
            let config = match Config::load(None) {
                Ok(config) => config,
                Err(err) => return jailed(err),
            };
            assert_eq!(config.name, "fixer");
            Ok(())
        });
    }

    #[rstest]
    #[case("yaml", "repo: https://git.example/embedit\nextract:\n  timeout: 5\n")]
    #[case("json", r#"{"repo": "https://git.example/embedit", "extract": {"timeout": 5}}"#)]
    #[case("toml", "repo = \"https://git.example/embedit\"\n[extract]\ntimeout = 5\n")]
    fn test_explicit_file_formats(#[case] extension: &str, #[case] content: &str) {
        let mut file = tempfile::Builder::new().suffix(&format!(".{extension}")).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        let config = Config::from_figment(
            Figment::from(Serialized::defaults(Config::default())).merge(file_provider(file.path()).unwrap()),
        )
        .unwrap();
        assert_eq!(config.repo, "https://git.example/embedit");
        assert_eq!(config.extract_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let err = Config::load(Some(Path::new("/nonexistent/embedit.toml"))).unwrap_err();
        assert!(matches!(*err, ErrorKind::NotFound(_)));
    }

    #[test]
    fn test_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        let err = file_provider(file.path()).unwrap_err();
        assert!(matches!(*err, ErrorKind::Format(_)));
    }

    #[test]
    fn test_wrong_type_is_load_error() {
        let figment =
            Figment::from(Serialized::defaults(Config::default())).merge(Toml::string("[cache]\nttl = \"soon\""));
        let err = Config::from_figment(figment).unwrap_err();
        assert_eq!(*err, ErrorKind::Load);
    }

    #[rstest]
    #[case("url = \"not a url\"", "url")]
    #[case("repo = \"\"", "repo")]
    #[case("color = \"red\"", "color")]
    #[case("color = \"#12345g\"", "color")]
    #[case("[cache]\nttl = 0", "cache.ttl")]
    #[case("[extract]\ntimeout = 0", "extract.timeout")]
    #[case("[providers.twitter]\nsession_ttl = 0", "providers.twitter.session_ttl")]
    #[case("[providers.tiktok]\nformat = \"best\"", "providers.tiktok.format")]
    fn test_validation(#[case] toml: &str, #[case] field: &'static str) {
        let figment = Figment::from(Serialized::defaults(Config::default())).merge(Toml::string(toml));
        let err = Config::from_figment(figment).unwrap_err();
        assert_eq!(*err, ErrorKind::Invalid(field));
    }

    #[rstest]
    #[case("#1DA1F2", true)]
    #[case("#ff0050", true)]
    #[case("1DA1F2", false)]
    #[case("#fff", false)]
    #[case("#ff00500", false)]
    fn test_is_hex_color(#[case] color: &str, #[case] expected: bool) {
        assert_eq!(is_hex_color(color), expected);
    }
}
