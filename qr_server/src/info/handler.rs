use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{info::dto::Info, state::ServerState};

#[utoipa::path(
    get,
    path = "/",
    description = "Service information",
    responses(
        (status = 200, description = "Success", body = Info),
    )
)]
pub async fn info(State(server_state): State<Arc<ServerState>>) -> Json<Info> {
    Json(Info {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        redirect_base_url: server_state.public_base_url().map(|url| format!("{url}/r")),
        qr_codes: server_state.storage().count_qr_codes(),
    })
}
