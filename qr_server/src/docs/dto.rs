use crate::{info, qr_codes, redirect};
use qr_core::qr_code::dto::ScanSummary;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        info::handler::info,
        redirect::handler::redirect,
        qr_codes::handler::list_qr_code_statuses,
        qr_codes::handler::get_qr_code_status,
        qr_codes::handler::get_scan_summary,
    ),
    components(schemas(info::dto::Info, qr_codes::dto::QrCodeStatus, ScanSummary))
)]
pub struct ApiDoc;
