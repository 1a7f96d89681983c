use actix_web::http::header;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use actix_web::HttpResponseBuilder;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use super::FormProfile;
use crate::subscriber_client::SubscriberRecord;

/// The only thing a caller ever sees: `{ ok, message?, error?, ...extra }`
#[derive(Serialize, Debug)]
pub struct SubmissionOutcome {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SubmissionOutcome {
    pub fn success(
        profile: &FormProfile,
        created: Option<SubscriberRecord>,
    ) -> Self {
        let mut extra = Map::new();
        if let Some(record) = created {
            // a record of three strings always serialises
            if let Ok(record) = serde_json::to_value(record) {
                extra.insert(profile.echo_key().to_string(), record);
            }
        }
        Self {
            ok: true,
            message: Some(profile.success_message().to_string()),
            error: None,
            extra,
        }
    }

    pub fn failure(
        code: &'static str,
        message: String,
    ) -> Self {
        Self {
            ok: false,
            message: Some(message),
            error: Some(code),
            extra: Map::new(),
        }
    }
}

/// Builder with the headers every form response carries: JSON content type
/// and permissive CORS.
pub fn json_response(status: StatusCode) -> HttpResponseBuilder {
    let mut builder = HttpResponse::build(status);
    builder
        .insert_header((header::CONTENT_TYPE, "application/json; charset=utf-8"))
        .insert_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .insert_header((header::ACCESS_CONTROL_ALLOW_HEADERS, "content-type"))
        .insert_header((header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"));
    builder
}

/// `OPTIONS`: CORS headers, empty body
pub fn preflight() -> HttpResponse { json_response(StatusCode::OK).finish() }

pub fn success(
    profile: &FormProfile,
    created: Option<SubscriberRecord>,
) -> HttpResponse {
    json_response(StatusCode::OK).json(SubmissionOutcome::success(profile, created))
}
