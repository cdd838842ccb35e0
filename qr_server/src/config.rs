use std::env;

const DEFAULT_SERVER_DOMAIN: &str = "0.0.0.0:3000";
const DEFAULT_SLED_URL: &str = "qr_data";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub server_domain: String,
    pub sled_url: String,
    pub seed_path: Option<String>,
    pub public_base_url: Option<String>,
}

impl ServerConfig {
    /// Read settings from the environment (after `.env` has been loaded).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            server_domain: non_empty("SERVER_DOMAIN").unwrap_or_else(|| DEFAULT_SERVER_DOMAIN.to_string()),
            sled_url: non_empty("SLED_URL").unwrap_or_else(|| DEFAULT_SLED_URL.to_string()),
            seed_path: non_empty("QR_SEED_PATH"),
            public_base_url: non_empty("PUBLIC_BASE_URL").map(|url| url.trim_end_matches('/').to_string()),
        }
    }
}
