use super::constants::headers;
use super::{HttpMethod, HttpResponse, StatusCode};

/// Build a JSON error response with a uniform shape
/// {
///   "error": "snake_code",
///   "message": "Human readable detail"
/// }
pub fn json_error(status: StatusCode, code: &str, message: &str) -> HttpResponse {
    let body = serde_json::json!({ "error": code, "message": message });
    HttpResponse::new(status).json_value(&body)
}

/// 405 Method Not Allowed with Allow header
pub fn method_not_allowed(allowed: &[HttpMethod]) -> HttpResponse {
    let allow = allowed.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(", ");
    let body = serde_json::json!({ "error": "method_not_allowed", "allow": allow });
    HttpResponse::new(StatusCode::MethodNotAllowed)
        .header(headers::ALLOW, &allow)
        .json_value(&body)
}
