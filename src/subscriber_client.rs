use std::time::Duration;

use reqwest::Client;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Deserialize;
use serde::Serialize;

use crate::domain::NewSubmission;

/// Client for the email-marketing API's subscriber endpoint. Contact messages
/// are stored there too, as custom fields on the sender's subscriber record.
///
/// One `reqwest::Client` is kept for the lifetime of the app so connections
/// are pooled across requests.
pub struct SubscriberClient {
    http_client: Client,
    base_url: String,
    api_token: Option<Secret<String>>,
}

/// What is sent upstream. Built fresh per request.
#[derive(Serialize, Debug)]
pub struct UpstreamSubscriber<'a> {
    pub email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<UpstreamFields<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<u64>>,
}

#[derive(Serialize, Debug, Default)]
pub struct UpstreamFields<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'a str>,
}

impl<'a> UpstreamSubscriber<'a> {
    pub fn from_submission(
        submission: &'a NewSubmission,
        group_id: Option<u64>,
    ) -> Self {
        let fields = UpstreamFields {
            name: submission.name.as_ref().map(|n| n.as_ref()),
            subject: submission.message.as_ref().map(|m| m.subject.as_ref()),
            message: submission.message.as_ref().map(|m| m.body.as_ref()),
        };
        let has_fields =
            fields.name.is_some() || fields.subject.is_some() || fields.message.is_some();
        Self {
            email: submission.email.as_ref(),
            fields: has_fields.then_some(fields),
            groups: group_id.map(|g| vec![g]),
        }
    }
}

/// The record the API echoes back on success
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SubscriberRecord {
    pub id: String,
    pub email: String,
    pub status: String,
}

#[derive(Deserialize)]
struct CreatedBody {
    data: SubscriberRecord,
}

#[derive(Deserialize, Default, Debug)]
struct ErrorBody {
    #[serde(default)]
    errors: Option<FieldErrors>,
}

#[derive(Deserialize, Default, Debug)]
struct FieldErrors {
    #[serde(default)]
    email: Vec<String>,
}

/// Everything the API can tell us, reduced to what callers branch on
#[derive(Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(SubscriberRecord),
    /// 422 because the address is already on the list
    EmailConflict,
    Rejected { status: StatusCode },
}

#[derive(thiserror::Error, Debug)]
pub enum UpstreamError {
    #[error("No API token configured for the subscriber API")]
    MissingCredential,
    #[error("Failed to reach the subscriber API")]
    Transport(#[from] reqwest::Error),
    #[error("Subscriber API returned an unexpected success body")]
    UnexpectedBody(#[source] serde_json::Error),
}

impl SubscriberClient {
    pub fn new(
        base_url: String,
        api_token: Option<Secret<String>>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url,
            api_token,
        })
    }

    pub fn has_credential(&self) -> bool { self.api_token.is_some() }

    /// A single attempt; failures surface immediately and are never retried.
    #[tracing::instrument(name = "Creating upstream subscriber", skip_all)]
    pub async fn create_subscriber(
        &self,
        subscriber: &UpstreamSubscriber<'_>,
    ) -> Result<CreateOutcome, UpstreamError> {
        let token = self
            .api_token
            .as_ref()
            .ok_or(UpstreamError::MissingCredential)?;
        let url = format!("{}/api/subscribers", self.base_url);

        let resp = self
            .http_client
            .post(&url)
            .bearer_auth(token.expose_secret())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(subscriber)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.bytes().await?;

        if status.is_success() {
            let created: CreatedBody =
                serde_json::from_slice(&body).map_err(UpstreamError::UnexpectedBody)?;
            return Ok(CreateOutcome::Created(created.data));
        }

        // error bodies are best-effort; an unreadable one just has no field errors
        let errors: ErrorBody = serde_json::from_slice(&body).unwrap_or_default();
        tracing::error!(
            upstream.status = status.as_u16(),
            upstream.errors = ?errors.errors,
            "subscriber API rejected the request"
        );

        Ok(classify_rejection(status, errors))
    }
}

fn classify_rejection(
    status: StatusCode,
    body: ErrorBody,
) -> CreateOutcome {
    let conflict = status == StatusCode::UNPROCESSABLE_ENTITY
        && body
            .errors
            .and_then(|e| e.email.into_iter().next())
            .is_some_and(|first| first.contains("already exists"));
    match conflict {
        true => CreateOutcome::EmailConflict,
        false => CreateOutcome::Rejected { status },
    }
}
