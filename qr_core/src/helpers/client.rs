use std::net::IpAddr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const UNKNOWN: &str = "Unknown";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Mobile,
    Tablet,
    Desktop,
    Bot,
    Unknown,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Mobile => "mobile",
            DeviceType::Tablet => "tablet",
            DeviceType::Desktop => "desktop",
            DeviceType::Bot => "bot",
            DeviceType::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientInfo {
    pub device_type: DeviceType,
    pub browser: String,
    pub os: String,
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self {
            device_type: DeviceType::Unknown,
            browser: UNKNOWN.to_string(),
            os: UNKNOWN.to_string(),
        }
    }
}

fn table(entries: &[(&str, &'static str)]) -> Vec<(Regex, &'static str)> {
    entries
        .iter()
        .map(|(pattern, name)| (Regex::new(pattern).expect("user agent pattern"), *name))
        .collect()
}

// Order matters: Edge and Opera also advertise Chrome, Chrome advertises Safari.
static BROWSERS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    table(&[
        (r"Edg(e|A|iOS)?/", "Edge"),
        (r"OPR/|Opera", "Opera"),
        (r"SamsungBrowser/", "Samsung Internet"),
        (r"Firefox/|FxiOS/", "Firefox"),
        (r"Chrome/|CriOS/|Chromium/", "Chrome"),
        (r"Version/[\d.]+.*Safari/", "Safari"),
    ])
});

static OPERATING_SYSTEMS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    table(&[
        (r"iPhone|iPad|iPod", "iOS"),
        (r"Android", "Android"),
        (r"CrOS", "ChromeOS"),
        (r"Windows", "Windows"),
        (r"Mac OS X|Macintosh", "macOS"),
        (r"Linux", "Linux"),
    ])
});

static BOT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)bot|crawler|spider|slurp|curl/|wget/|python-requests|headless")
        .expect("bot pattern")
});

static TABLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"iPad|Tablet|Kindle|Silk/|PlayBook").expect("tablet pattern"));

static MOBILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Mobi|iPhone|iPod|Windows Phone|Opera Mini").expect("mobile pattern")
});

fn first_match(patterns: &[(Regex, &'static str)], user_agent: &str) -> String {
    patterns
        .iter()
        .find(|(pattern, _)| pattern.is_match(user_agent))
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn device_type(user_agent: &str) -> DeviceType {
    if BOT.is_match(user_agent) {
        DeviceType::Bot
    } else if TABLET.is_match(user_agent) {
        DeviceType::Tablet
    } else if MOBILE.is_match(user_agent) {
        DeviceType::Mobile
    } else if user_agent.contains("Android") {
        // Android without "Mobile" is a tablet.
        DeviceType::Tablet
    } else {
        DeviceType::Desktop
    }
}

/// Classify a `User-Agent` header into device, browser and OS families.
pub fn parse_user_agent(user_agent: &str) -> ClientInfo {
    let user_agent = user_agent.trim();
    if user_agent.is_empty() {
        return ClientInfo::default();
    }

    ClientInfo {
        device_type: device_type(user_agent),
        browser: first_match(&BROWSERS, user_agent),
        os: first_match(&OPERATING_SYSTEMS, user_agent),
    }
}

/// Best guess at the visitor address: proxy headers first, then the peer.
pub fn client_ip(
    forwarded_for: Option<&str>,
    real_ip: Option<&str>,
    peer: Option<IpAddr>,
) -> Option<String> {
    let from_header = |value: Option<&str>| {
        value
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| v.parse::<IpAddr>().is_ok())
            .map(str::to_string)
    };

    from_header(forwarded_for)
        .or_else(|| from_header(real_ip))
        .or_else(|| peer.map(|ip| ip.to_string()))
}
