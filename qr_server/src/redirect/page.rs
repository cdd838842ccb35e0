use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use html_escape::{encode_double_quoted_attribute, encode_text};
use qr_core::access::dto::DenyReason;

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<meta name="robots" content="noindex">
<title>{title}</title>
<style>
body { font-family: system-ui, sans-serif; background: #f5f5f7; color: #1d1d1f; display: flex; min-height: 100vh; margin: 0; align-items: center; justify-content: center; }
main { background: #fff; border-radius: 12px; padding: 2.5rem; max-width: 28rem; text-align: center; box-shadow: 0 4px 24px rgba(0, 0, 0, 0.08); }
h1 { font-size: 1.4rem; margin: 0 0 0.75rem; }
p { margin: 0; line-height: 1.5; color: #515154; }
</style>
</head>
<body data-reason="{reason}">
<main>
<h1>{title}</h1>
<p>{message}</p>
</main>
</body>
</html>
"#;

fn render(status: StatusCode, reason: &str, title: &str, message: &str) -> Response {
    let body = PAGE_TEMPLATE
        .replace("{reason}", &encode_double_quoted_attribute(reason))
        .replace("{title}", &encode_text(title))
        .replace("{message}", &encode_text(message));
    (status, Html(body)).into_response()
}

pub fn not_found() -> Response {
    render(
        StatusCode::NOT_FOUND,
        "NOT_FOUND",
        "QR code not found",
        "This QR code does not exist or is no longer active.",
    )
}

pub fn denied(reason: DenyReason, message: &str) -> Response {
    let title = match reason {
        DenyReason::Expired => "QR code expired",
        DenyReason::TimeRestricted => "QR code not available right now",
        DenyReason::LimitReached => "Scan limit reached",
    };
    render(StatusCode::FORBIDDEN, reason.as_str(), title, message)
}

pub fn unavailable() -> Response {
    render(
        StatusCode::INTERNAL_SERVER_ERROR,
        "ERROR",
        "Something went wrong",
        "This QR code could not be opened. Please try again in a moment.",
    )
}
