use std::fmt::Debug;

use actix_web::http::header;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use actix_web::ResponseError;

use super::json_response;
use super::SubmissionOutcome;
use crate::domain::FormKind;
use crate::domain::ValidationError;
use crate::routes::error_chain_fmt;

/// Every way a submission can end other than success. Each variant maps to a
/// stable `error` code and a generic message; the source chain only ever
/// reaches the logs (via `Debug`), never the caller.
#[derive(thiserror::Error)]
pub enum SubmissionError {
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Request body is not valid JSON")]
    InvalidJson(#[source] serde_json::Error),
    #[error("Request body could not be read")]
    UnreadableBody(#[source] actix_web::Error),
    #[error("Request body exceeds the size limit")]
    PayloadTooLarge,
    #[error("No challenge token supplied")]
    ChallengeMissing,
    #[error("Challenge token was not accepted")]
    ChallengeFailed,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Rate limit exceeded, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },
    #[error("Email is already subscribed")]
    AlreadySubscribed,
    #[error("Upstream rejected the {kind} submission with status {upstream_status}")]
    UpstreamRejected { kind: FormKind, upstream_status: u16 },
    #[error("Subscriber API token is not configured")]
    Misconfigured,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl Debug for SubmissionError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl SubmissionError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed => "method_not_allowed",
            Self::InvalidJson(_) | Self::UnreadableBody(_) => "invalid_json",
            Self::PayloadTooLarge => "payload_too_large",
            Self::ChallengeMissing => "challenge_missing",
            Self::ChallengeFailed => "challenge_failed",
            Self::Validation(e) => e.code(),
            Self::RateLimited { .. } => "rate_limited",
            Self::AlreadySubscribed => "already_subscribed",
            Self::UpstreamRejected {
                kind: FormKind::Newsletter,
                ..
            } => "subscription_failed",
            Self::UpstreamRejected {
                kind: FormKind::Contact,
                ..
            } => "submission_failed",
            Self::Misconfigured => "server_misconfigured",
            Self::UnexpectedError(_) => "internal_error",
        }
    }

    /// Safe to display; never includes upstream or internal detail
    pub fn public_message(&self) -> String {
        match self {
            Self::MethodNotAllowed => "Method not allowed.".to_string(),
            Self::InvalidJson(_) | Self::UnreadableBody(_) => {
                "The request body could not be read.".to_string()
            }
            Self::PayloadTooLarge => "The request body is too large.".to_string(),
            Self::ChallengeMissing => "Please complete the verification challenge.".to_string(),
            Self::ChallengeFailed => "Verification failed. Please try again.".to_string(),
            Self::Validation(e) => e.to_string(),
            Self::RateLimited { .. } => "Too many requests. Please try again later.".to_string(),
            Self::AlreadySubscribed => {
                "This email is already subscribed to our newsletter".to_string()
            }
            Self::UpstreamRejected {
                kind: FormKind::Newsletter,
                ..
            } => "Failed to subscribe. Please try again later.".to_string(),
            Self::UpstreamRejected {
                kind: FormKind::Contact,
                ..
            } => "Failed to send message. Please try again later.".to_string(),
            Self::Misconfigured => "Server is not configured correctly.".to_string(),
            Self::UnexpectedError(_) => {
                "Internal server error. Please try again later.".to_string()
            }
        }
    }
}

impl ResponseError for SubmissionError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::InvalidJson(_)
            | Self::UnreadableBody(_)
            | Self::ChallengeMissing
            | Self::ChallengeFailed
            | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::AlreadySubscribed => StatusCode::CONFLICT,
            // the exact upstream status is never passed on
            Self::UpstreamRejected {
                upstream_status, ..
            } => match *upstream_status >= 500 {
                true => StatusCode::INTERNAL_SERVER_ERROR,
                false => StatusCode::BAD_REQUEST,
            },
            Self::Misconfigured | Self::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // supersedes the default plain-text body
    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        let mut resp = json_response(self.status_code());
        match self {
            Self::MethodNotAllowed => {
                resp.insert_header((header::ALLOW, "POST"));
            }
            Self::RateLimited {
                retry_after_seconds,
            } => {
                resp.insert_header((header::RETRY_AFTER, retry_after_seconds.to_string()));
            }
            _ => {}
        }
        resp.json(SubmissionOutcome::failure(self.code(), self.public_message()))
    }
}
