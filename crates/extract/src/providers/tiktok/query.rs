//! Query parameters impersonating the Android app's feed request.

use rand::Rng;
use rand::seq::SliceRandom;
use time::UtcDateTime;

const APP_NAME: &str = "musical_ly";
const APP_ID: &str = "0";
const APP_VERSION: &str = "34.1.2";
const APP_MANIFEST_VERSION: &str = "2023401020";

pub(super) const FEED_URL: &str = "https://api22-normal-c-useast2a.tiktokv.com/aweme/v1/feed/";

/// Install IDs of real app installs; the API answers some of them with an
/// empty body, so every request walks the list in a random order.
const INSTALL_IDS: [&str; 3] = ["7351144126450059040", "7351149742343391009", "7351153174894626592"];

const BASE_QUERY: [(&str, &str); 23] = [
    ("ssmix", "a"),
    ("channel", "googleplay"),
    ("resolution", "1080*2400"),
    ("dpi", "420"),
    ("language", "en"),
    ("os", "android"),
    ("os_api", "29"),
    ("os_version", "13"),
    ("ac", "wifi"),
    ("is_pad", "0"),
    ("current_region", "US"),
    ("app_type", "normal"),
    ("sys_region", "US"),
    ("timezone_name", "America/New_York"),
    ("residence", "US"),
    ("app_language", "en"),
    ("timezone_offset", "-14400"),
    ("host_abi", "armeabi-v7a"),
    ("locale", "en"),
    ("ac2", "wifi5g"),
    ("uoo", "1"),
    ("op_region", "US"),
    ("region", "US"),
];

pub(super) fn user_agent() -> String {
    format!(
        "com.zhiliaoapp.musically/{APP_VERSION} \
         (Linux; U; Android 13; en_US; Pixel 7; Build/TD1A.220804.031; Cronet/58.0.2991.0)"
    )
}

/// Install IDs in the order this request should try them.
pub(super) fn install_ids() -> Vec<&'static str> {
    let mut ids = INSTALL_IDS.to_vec();
    ids.shuffle(&mut rand::rng());
    ids
}

/// `x.y.z` becomes `x0y0z` (every component zero-padded to two digits).
fn version_code(version: &str) -> String {
    version.split('.').map(|part| format!("{part:0>2}")).collect()
}

/// Full query for one feed request. Device identifiers are random on every
/// call, only the install ID is chosen by the caller.
pub(super) fn feed_query(aweme_id: &str, install_id: &str) -> Vec<(&'static str, String)> {
    let mut rng = rand::rng();
    let now = UtcDateTime::now();
    let seconds = now.unix_timestamp();
    let millis = now.unix_timestamp_nanos() / 1_000_000;

    let mut query: Vec<(&'static str, String)> =
        BASE_QUERY.iter().map(|(key, value)| (*key, (*value).to_string())).collect();
    query.extend([
        ("aweme_id", aweme_id.to_string()),
        ("iid", install_id.to_string()),
        ("last_install_time", (seconds - rng.random_range(86_400..1_123_200)).to_string()),
        ("aid", APP_ID.to_string()),
        ("app_name", APP_NAME.to_string()),
        ("version_code", version_code(APP_VERSION)),
        ("version_name", APP_VERSION.to_string()),
        ("manifest_version_code", APP_MANIFEST_VERSION.to_string()),
        ("update_version_code", APP_MANIFEST_VERSION.to_string()),
        ("ab_version", APP_VERSION.to_string()),
        ("build_number", APP_VERSION.to_string()),
        ("_rticket", millis.to_string()),
        ("cdid", uuid::Uuid::new_v4().to_string()),
        ("openudid", format!("{:016x}", rng.random_range(0x1000_0000_0000_0000_u64..0x1111_1111_1111_1111))),
        ("ts", seconds.to_string()),
        ("device_id", rng.random_range(7_250_000_000_000_000_000_u64..7_351_147_085_025_500_000).to_string()),
        ("device_type", "Pixel 7".to_string()),
        ("device_brand", "Google".to_string()),
        ("device_platform", "android".to_string()),
    ]);
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_version_code() {
        assert_eq!(version_code("34.1.2"), "340102");
        assert_eq!(version_code("1.22.3"), "012203");
    }

    #[test]
    fn test_install_ids_are_a_permutation() {
        let mut ids = install_ids();
        ids.sort_unstable();
        let mut expected = INSTALL_IDS.to_vec();
        expected.sort_unstable();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_feed_query() {
        let query: HashMap<_, _> = feed_query("7106594312292453675", INSTALL_IDS[1]).into_iter().collect();
        assert_eq!(query["aweme_id"], "7106594312292453675");
        assert_eq!(query["iid"], INSTALL_IDS[1]);
        assert_eq!(query["region"], "US");
        assert_eq!(query["version_code"], "340102");
        assert_eq!(query["openudid"].len(), 16);
        assert!(uuid::Uuid::parse_str(&query["cdid"]).is_ok());
        let device_id: u64 = query["device_id"].parse().unwrap();
        assert!((7_250_000_000_000_000_000..7_351_147_085_025_500_000).contains(&device_id));
    }

    #[test]
    fn test_device_identifiers_change_per_request() {
        let first: HashMap<_, _> = feed_query("1", INSTALL_IDS[0]).into_iter().collect();
        let second: HashMap<_, _> = feed_query("1", INSTALL_IDS[0]).into_iter().collect();
        assert_ne!(first["cdid"], second["cdid"]);
    }
}
