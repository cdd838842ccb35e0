use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::access::dto::ScheduleConfig;
use crate::helpers::client::{parse_user_agent, DeviceType};
use crate::helpers::utils::is_http_url;

fn default_true() -> bool {
    true
}

/// A QR code as persisted by the management side.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeRecord {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub short_code: String,
    #[serde(default)]
    pub target_url: String,
    #[serde(default = "default_true")]
    pub is_dynamic: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub schedule_config: Option<ScheduleConfig>,
    #[serde(default)]
    pub scan_count: u64,
    #[serde(default)]
    pub last_scanned_at: Option<DateTime<Utc>>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl QrCodeRecord {
    pub fn new(short_code: &str, target_url: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            short_code: short_code.to_string(),
            target_url: target_url.to_string(),
            is_dynamic: true,
            is_active: true,
            schedule_config: None,
            scan_count: 0,
            last_scanned_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_schedule(mut self, config: ScheduleConfig) -> Self {
        self.schedule_config = Some(config);
        self
    }

    /// Whether the redirect endpoint should serve this code at all. Checked
    /// before any schedule rule.
    pub fn is_redirectable(&self) -> bool {
        self.is_dynamic && self.is_active && is_http_url(&self.target_url)
    }
}

/// One allowed redirect, written after the visitor has been sent on.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanEvent {
    pub id: Uuid,
    pub short_code: String,
    pub scanned_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub device_type: DeviceType,
    pub browser: String,
    pub os: String,
}

impl ScanEvent {
    pub fn new(
        short_code: String,
        user_agent: Option<String>,
        ip_address: Option<String>,
        referer: Option<String>,
    ) -> Self {
        Self::at(Utc::now(), short_code, user_agent, ip_address, referer)
    }

    pub fn at(
        scanned_at: DateTime<Utc>,
        short_code: String,
        user_agent: Option<String>,
        ip_address: Option<String>,
        referer: Option<String>,
    ) -> Self {
        let client = parse_user_agent(user_agent.as_deref().unwrap_or_default());
        Self {
            id: Uuid::new_v4(),
            short_code,
            scanned_at,
            ip_address,
            user_agent,
            referer,
            device_type: client.device_type,
            browser: client.browser,
            os: client.os,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    pub short_code: String,
    pub total: u64,
    pub by_device: BTreeMap<String, u64>,
    pub by_browser: BTreeMap<String, u64>,
    pub by_os: BTreeMap<String, u64>,
    pub first_scanned_at: Option<DateTime<Utc>>,
    pub last_scanned_at: Option<DateTime<Utc>>,
}

impl ScanSummary {
    pub fn new(short_code: &str) -> Self {
        Self {
            short_code: short_code.to_string(),
            ..Self::default()
        }
    }

    pub fn add(&mut self, event: &ScanEvent) {
        self.total += 1;
        *self
            .by_device
            .entry(event.device_type.as_str().to_string())
            .or_default() += 1;
        *self.by_browser.entry(event.browser.clone()).or_default() += 1;
        *self.by_os.entry(event.os.clone()).or_default() += 1;

        self.first_scanned_at = Some(match self.first_scanned_at {
            Some(first) => first.min(event.scanned_at),
            None => event.scanned_at,
        });
        self.last_scanned_at = Some(match self.last_scanned_at {
            Some(last) => last.max(event.scanned_at),
            None => event.scanned_at,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_defaults_from_json() {
        let record: QrCodeRecord =
            serde_json::from_str(r#"{"shortCode": "menu", "targetUrl": "https://example.com/menu"}"#)
                .unwrap();
        assert!(record.is_dynamic);
        assert!(record.is_active);
        assert_eq!(record.scan_count, 0);
        assert!(record.schedule_config.is_none());
        assert!(record.is_redirectable());
    }

    #[test]
    fn test_is_redirectable() {
        let record = QrCodeRecord::new("menu", "https://example.com");
        assert!(record.is_redirectable());

        let mut inactive = record.clone();
        inactive.is_active = false;
        assert!(!inactive.is_redirectable());

        let mut static_code = record.clone();
        static_code.is_dynamic = false;
        assert!(!static_code.is_redirectable());

        assert!(!QrCodeRecord::new("menu", "").is_redirectable());
        assert!(!QrCodeRecord::new("menu", "   ").is_redirectable());
    }

    #[test]
    fn test_scan_summary_aggregates() {
        let base = Utc::now();
        let mut summary = ScanSummary::new("menu");
        let phone = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_2 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Mobile/15E148 Safari/604.1";

        summary.add(&ScanEvent::at(base, "menu".into(), Some(phone.into()), None, None));
        summary.add(&ScanEvent::at(
            base - chrono::Duration::hours(2),
            "menu".into(),
            Some(phone.into()),
            None,
            None,
        ));
        summary.add(&ScanEvent::at(base, "menu".into(), None, None, None));

        assert_eq!(summary.total, 3);
        assert_eq!(summary.by_device.get("mobile"), Some(&2));
        assert_eq!(summary.by_device.get("unknown"), Some(&1));
        assert_eq!(summary.by_browser.get("Safari"), Some(&2));
        assert_eq!(summary.by_os.get("iOS"), Some(&2));
        assert_eq!(summary.first_scanned_at, Some(base - chrono::Duration::hours(2)));
        assert_eq!(summary.last_scanned_at, Some(base));
    }
}
