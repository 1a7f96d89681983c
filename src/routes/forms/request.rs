use actix_web::http::header::HeaderMap;
use actix_web::http::StatusCode;
use actix_web::web::Bytes;
use serde_json::Value;

use super::SubmissionError;
use crate::domain::SubmissionFields;

/// Name of the header the hosting platform sets to the caller's address.
/// Wrapped so it can't be confused with other `String`s in `web::Data`.
#[derive(Debug, Clone)]
pub struct ClientIpHeader(pub String);

/// Largest body either form accepts; set on the app as `web::PayloadConfig`.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Extraction failures are turned into submission errors here rather than by
/// actix, so they get the same JSON body and CORS headers as everything else.
pub fn read_body(body: Result<Bytes, actix_web::Error>) -> Result<Bytes, SubmissionError> {
    body.map_err(|e| match e.as_response_error().status_code() {
        StatusCode::PAYLOAD_TOO_LARGE => SubmissionError::PayloadTooLarge,
        _ => SubmissionError::UnreadableBody(e),
    })
}

/// An empty body counts as `{}`.
pub fn parse_body(body: &[u8]) -> Result<SubmissionFields, SubmissionError> {
    if body.is_empty() {
        return Ok(SubmissionFields::default());
    }
    let value: Value = serde_json::from_slice(body).map_err(SubmissionError::InvalidJson)?;
    Ok(SubmissionFields::from_json(&value))
}

/// Platform header first, then the first hop of `x-forwarded-for`, else
/// `"unknown"` (which then shares one quota across all such callers).
pub fn client_ip(
    headers: &HeaderMap,
    platform_header: &str,
) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    header(platform_header)
        .or_else(|| {
            header("x-forwarded-for")
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        })
        .unwrap_or("unknown")
        .to_string()
}
