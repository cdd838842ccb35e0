use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{ConnectInfo, Path, Request, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use log::{error, info};
use qr_core::{
    access::{dto::Verdict, evaluator::evaluate},
    helpers::{client::client_ip, utils::normalize_short_code},
    qr_code::dto::ScanEvent,
};

use crate::{redirect::page, scan::handler::spawn_scan_record, state::ServerState};

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn scan_event(short_code: String, request: &Request) -> ScanEvent {
    let headers = request.headers();
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let ip_address = client_ip(
        header_value(headers, "x-forwarded-for").as_deref(),
        header_value(headers, "x-real-ip").as_deref(),
        peer,
    );

    ScanEvent::new(
        short_code,
        header_value(headers, header::USER_AGENT.as_str()),
        ip_address,
        header_value(headers, header::REFERER.as_str()),
    )
}

#[utoipa::path(
    get,
    path = "/r/{code}",
    description = "Redirect a dynamic QR code to its target when its schedule allows it",
    params(("code" = String, Path, description = "QR code short code")),
    responses(
        (status = 302, description = "Redirect to the target URL"),
        (status = 403, description = "Blocked by the schedule (HTML page)"),
        (status = 404, description = "Unknown or inactive QR code (HTML page)"),
    )
)]
pub async fn redirect(
    State(server_state): State<Arc<ServerState>>,
    Path(code): Path<String>,
    request: Request,
) -> Response {
    let Some(short_code) = normalize_short_code(&code) else {
        return page::not_found();
    };

    let record = match server_state.storage().get_qr_code(&short_code) {
        Ok(Some(record)) if record.is_redirectable() => record,
        Ok(_) => {
            info!("No redirectable QR code for {}", short_code);
            return page::not_found();
        }
        Err(e) => {
            error!("Failed to load QR code {}: {}", short_code, e);
            return page::unavailable();
        }
    };

    match evaluate(record.schedule_config.as_ref(), record.scan_count, Utc::now()) {
        Verdict::Deny { reason, message } => {
            info!("Scan of {} denied: {} ({})", short_code, reason, message);
            page::denied(reason, &message)
        }
        Verdict::Allow => {
            let event = scan_event(short_code, &request);
            spawn_scan_record(server_state.storage().clone(), event);
            (StatusCode::FOUND, [(header::LOCATION, record.target_url)]).into_response()
        }
    }
}
