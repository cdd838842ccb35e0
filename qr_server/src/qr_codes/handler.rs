use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use qr_core::{
    access::evaluator::evaluate, helpers::utils::normalize_short_code,
    qr_code::dto::QrCodeRecord, qr_code::dto::ScanSummary,
};

use crate::{error::ErrorServer, qr_codes::dto::QrCodeStatus, state::ServerState};

fn load_record(server_state: &ServerState, code: &str) -> Result<QrCodeRecord, ErrorServer> {
    let not_found = || ErrorServer {
        status: StatusCode::NOT_FOUND.into(),
        message: format!("QR code not found: {}", code),
    };

    let short_code = normalize_short_code(code).ok_or_else(not_found)?;
    server_state
        .storage()
        .get_qr_code(&short_code)?
        .ok_or_else(not_found)
}

#[utoipa::path(
    get,
    path = "/qr-codes",
    description = "Every stored QR code with its current access verdict",
    responses(
        (status = 200, description = "Success", body = Vec<QrCodeStatus>),
        (status = 500, description = "Internal Server Error"),
    )
)]
pub async fn list_qr_code_statuses(
    State(server_state): State<Arc<ServerState>>,
) -> Result<Json<Vec<QrCodeStatus>>, ErrorServer> {
    let now = Utc::now();
    let statuses = server_state
        .storage()
        .list_qr_codes()?
        .into_iter()
        .map(|record| {
            let verdict = evaluate(record.schedule_config.as_ref(), record.scan_count, now);
            QrCodeStatus::from((record, verdict))
        })
        .collect();

    Ok(Json(statuses))
}

#[utoipa::path(
    get,
    path = "/qr-codes/{code}",
    description = "Current configuration, counters and access verdict of a QR code",
    params(("code" = String, Path, description = "QR code short code")),
    responses(
        (status = 200, description = "Success", body = QrCodeStatus),
        (status = 404, description = "Not Found"),
        (status = 500, description = "Internal Server Error"),
    )
)]
pub async fn get_qr_code_status(
    State(server_state): State<Arc<ServerState>>,
    Path(code): Path<String>,
) -> Result<Json<QrCodeStatus>, ErrorServer> {
    let record = load_record(&server_state, &code)?;
    let verdict = evaluate(record.schedule_config.as_ref(), record.scan_count, Utc::now());

    Ok(Json(QrCodeStatus::from((record, verdict))))
}

#[utoipa::path(
    get,
    path = "/qr-codes/{code}/scans",
    description = "Scan totals for a QR code grouped by device, browser and OS",
    params(("code" = String, Path, description = "QR code short code")),
    responses(
        (status = 200, description = "Success", body = ScanSummary),
        (status = 404, description = "Not Found"),
        (status = 500, description = "Internal Server Error"),
    )
)]
pub async fn get_scan_summary(
    State(server_state): State<Arc<ServerState>>,
    Path(code): Path<String>,
) -> Result<Json<ScanSummary>, ErrorServer> {
    let record = load_record(&server_state, &code)?;
    let summary = server_state.storage().scan_summary(&record.short_code)?;

    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use qr_core::access::dto::{DayOfWeek, ScheduleConfig, TimeRange};
    use qr_core::qr_code::{dto::ScanEvent, storage::QrStorage};
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;
    use crate::router::router;

    fn test_state() -> (Arc<ServerState>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = QrStorage::open(temp_dir.path()).unwrap();
        (
            Arc::new(ServerState::from((storage, Some("https://qr.example.com".to_string())))),
            temp_dir,
        )
    }

    async fn get_json(state: &Arc<ServerState>, uri: &str) -> (StatusCode, Value) {
        let response = router(state.clone())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_status_reports_verdict() {
        let (state, _temp) = test_state();
        let mut record = QrCodeRecord::new("menu", "https://example.com/menu").with_schedule(ScheduleConfig {
            scan_limit: Some(3),
            ..ScheduleConfig::default()
        });
        record.scan_count = 3;
        state.storage().put_qr_code(&record).unwrap();

        let (status, body) = get_json(&state, "/qr-codes/menu").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["shortCode"], "menu");
        assert_eq!(body["scanCount"], 3);
        assert_eq!(body["redirectable"], true);
        assert_eq!(body["scheduleConfig"]["scanLimit"], 3);
        assert_eq!(body["verdict"]["verdict"], "deny");
        assert_eq!(body["verdict"]["reason"], "LIMIT_REACHED");
    }

    #[tokio::test]
    async fn test_status_allows_unrestricted_code() {
        let (state, _temp) = test_state();
        let record = QrCodeRecord::new("open", "https://example.com").with_schedule(ScheduleConfig {
            time_ranges: vec![TimeRange {
                enabled: false,
                ..TimeRange::new(DayOfWeek::Sunday, "10:00", "11:00")
            }],
            ..ScheduleConfig::default()
        });
        state.storage().put_qr_code(&record).unwrap();

        let (status, body) = get_json(&state, "/qr-codes/open").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["verdict"], serde_json::json!({"verdict": "allow"}));
    }

    #[tokio::test]
    async fn test_list_reports_every_code() {
        let (state, _temp) = test_state();
        let (status, body) = get_json(&state, "/qr-codes").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));

        let mut inactive = QrCodeRecord::new("off", "https://example.com/off");
        inactive.is_active = false;
        state.storage().put_qr_code(&inactive).unwrap();
        state
            .storage()
            .put_qr_code(&QrCodeRecord::new("menu", "https://example.com/menu"))
            .unwrap();

        let (status, body) = get_json(&state, "/qr-codes").await;
        assert_eq!(status, StatusCode::OK);
        let codes = body.as_array().unwrap();
        assert_eq!(codes.len(), 2);
        // sled iterates keys in order.
        assert_eq!(codes[0]["shortCode"], "menu");
        assert_eq!(codes[0]["redirectable"], true);
        assert_eq!(codes[0]["verdict"]["verdict"], "allow");
        assert_eq!(codes[1]["shortCode"], "off");
        assert_eq!(codes[1]["redirectable"], false);
    }

    #[tokio::test]
    async fn test_unknown_code_is_json_404() {
        let (state, _temp) = test_state();
        let (status, body) = get_json(&state, "/qr-codes/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], 404);

        let (status, _) = get_json(&state, "/qr-codes/nope/scans").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_scan_summary() {
        let (state, _temp) = test_state();
        state
            .storage()
            .put_qr_code(&QrCodeRecord::new("menu", "https://example.com"))
            .unwrap();
        let phone = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";
        for _ in 0..3 {
            let event = ScanEvent::new("menu".into(), Some(phone.into()), None, None);
            state.storage().record_scan(&event).unwrap();
        }

        let (status, body) = get_json(&state, "/qr-codes/menu/scans").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 3);
        assert_eq!(body["byDevice"]["mobile"], 3);
        assert_eq!(body["byBrowser"]["Chrome"], 3);
        assert_eq!(body["byOs"]["Android"], 3);
    }

    #[tokio::test]
    async fn test_info_counts_codes() {
        let (state, _temp) = test_state();
        state
            .storage()
            .put_qr_code(&QrCodeRecord::new("menu", "https://example.com"))
            .unwrap();

        let (status, body) = get_json(&state, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "qr_server");
        assert_eq!(body["qrCodes"], 1);
        assert_eq!(body["redirectBaseUrl"], "https://qr.example.com/r");

        let (status, docs) = get_json(&state, "/docs").await;
        assert_eq!(status, StatusCode::OK);
        assert!(docs["paths"]["/r/{code}"].is_object());
    }
}
