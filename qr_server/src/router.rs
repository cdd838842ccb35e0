use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

use crate::{
    docs::{dto::ApiDoc, handler::api_docs},
    info::handler::info,
    qr_codes::handler::{get_qr_code_status, get_scan_summary, list_qr_code_statuses},
    redirect::handler::redirect,
    state::ServerState,
};

pub fn router(state: Arc<ServerState>) -> Router {
    let doc = ApiDoc::openapi();

    let qr_router = Router::new()
        .route("/qr-codes", get(list_qr_code_statuses))
        .route("/qr-codes/{code}", get(get_qr_code_status))
        .route("/qr-codes/{code}/scans", get(get_scan_summary));

    Router::new()
        .merge(Redoc::with_url("/redoc", doc))
        .merge(qr_router)
        .route("/", get(info))
        .route("/r/{code}", get(redirect))
        .route("/docs", get(api_docs))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
