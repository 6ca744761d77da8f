use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

const SAFE_END: &str = "(?:$|\\?|#|/)";

regex!(
    TWEET_URL_REGEX,
    format!(r"^https?://(?:(?:www|mobile)\.)?(?:x|twitter)\.com/([A-Za-z0-9_]+)/status(?:es)?/(\d+){SAFE_END}").as_str()
);
// Video variants encode their resolution in the URL, e.g. `/vid/720x1280/`.
regex!(SIZE_REGEX, r"(\d+)x(\d+)");
regex!(
    TIKTOK_VIDEO_URL_REGEX,
    format!(r"^https?://(?:www\.)?tiktok\.com/@([A-Za-z0-9_.]+)/(?:video|photo)/(\d+){SAFE_END}").as_str()
);
