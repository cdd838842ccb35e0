use chrono::{DateTime, Utc};
use qr_core::{
    access::dto::{ScheduleConfig, Verdict},
    qr_code::dto::QrCodeRecord,
};
use serde::Serialize;
use utoipa::ToSchema;

/// What the redirect endpoint would do for a code right now.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeStatus {
    pub short_code: String,
    pub target_url: String,
    pub is_dynamic: bool,
    pub is_active: bool,
    pub redirectable: bool,
    pub scan_count: u64,
    pub last_scanned_at: Option<DateTime<Utc>>,
    #[schema(value_type = Option<Object>)]
    pub schedule_config: Option<ScheduleConfig>,
    #[schema(value_type = Object)]
    pub verdict: Verdict,
}

impl From<(QrCodeRecord, Verdict)> for QrCodeStatus {
    fn from(parts: (QrCodeRecord, Verdict)) -> Self {
        let (record, verdict) = parts;
        Self {
            redirectable: record.is_redirectable(),
            short_code: record.short_code,
            target_url: record.target_url,
            is_dynamic: record.is_dynamic,
            is_active: record.is_active,
            scan_count: record.scan_count,
            last_scanned_at: record.last_scanned_at,
            schedule_config: record.schedule_config,
            verdict,
        }
    }
}
