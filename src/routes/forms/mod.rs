mod error;
mod profile;
mod request;
mod response;
pub use error::*;
pub use profile::*;
pub use request::*;
pub use response::*;

use actix_web::http::Method;
use actix_web::web;
use actix_web::HttpRequest;
use actix_web::HttpResponse;

use crate::challenge_client::ChallengeClient;
use crate::domain::NewSubmission;
use crate::rate_limit::RateLimitDecision;
use crate::rate_limit::RateLimiter;
use crate::subscriber_client::CreateOutcome;
use crate::subscriber_client::SubscriberClient;
use crate::subscriber_client::UpstreamError;
use crate::subscriber_client::UpstreamSubscriber;

/// The challenge verifier, if one is configured. Wrapped so that "no
/// verifier" is an explicit, shareable value rather than missing app data.
pub struct ChallengeGate(pub Option<ChallengeClient>);

/// Shared collaborators of both form endpoints, as handed out by
/// `App::app_data`
pub struct Collaborators<'a> {
    pub subscriber_client: &'a SubscriberClient,
    pub challenge: &'a ChallengeGate,
    pub rate_limiter: &'a RateLimiter,
    pub client_ip_header: &'a ClientIpHeader,
}

/// `/subscribe` (any method; only `POST` and `OPTIONS` succeed)
///
/// # Request example
///
/// ```sh
///     curl -v -H 'content-type: application/json' \
///         --data '{"email":"john@foo.com","name":"John"}' \
///         http://127.0.0.1:8000/subscribe
/// ```
pub async fn subscribe(
    req: HttpRequest,
    body: Result<web::Bytes, actix_web::Error>,
    profiles: web::Data<FormProfiles>,
    subscriber_client: web::Data<SubscriberClient>,
    challenge: web::Data<ChallengeGate>,
    rate_limiter: web::Data<RateLimiter>,
    client_ip_header: web::Data<ClientIpHeader>,
) -> Result<HttpResponse, SubmissionError> {
    let collaborators = Collaborators {
        subscriber_client: &subscriber_client,
        challenge: &challenge,
        rate_limiter: &rate_limiter,
        client_ip_header: &client_ip_header,
    };
    handle_submission(&profiles.newsletter, &req, body, collaborators).await
}

/// `/contact` (any method; only `POST` and `OPTIONS` succeed)
///
/// # Request example
///
/// ```sh
///     curl -v -H 'content-type: application/json' \
///         --data '{"email":"a@b.com","name":"Jo","subject":"Hi!","message":"1234567890"}' \
///         http://127.0.0.1:8000/contact
/// ```
pub async fn contact(
    req: HttpRequest,
    body: Result<web::Bytes, actix_web::Error>,
    profiles: web::Data<FormProfiles>,
    subscriber_client: web::Data<SubscriberClient>,
    challenge: web::Data<ChallengeGate>,
    rate_limiter: web::Data<RateLimiter>,
    client_ip_header: web::Data<ClientIpHeader>,
) -> Result<HttpResponse, SubmissionError> {
    let collaborators = Collaborators {
        subscriber_client: &subscriber_client,
        challenge: &challenge,
        rate_limiter: &rate_limiter,
        client_ip_header: &client_ip_header,
    };
    handle_submission(&profiles.contact, &req, body, collaborators).await
}

/// The shared pipeline. Stages run strictly in this order, and each can end
/// the request:
///
/// 1. method (`OPTIONS` short circuit, anything but `POST` rejected)
/// 2. upstream credential present
/// 3. body read (within `MAX_BODY_BYTES`), parsed and normalised
/// 4. honeypot: a filled one gets the normal success, and nothing else
///    happens
/// 5. challenge token verified (only if a verifier is configured)
/// 6. fields validated
/// 7. quota consumed (after validation, so junk can't exhaust it)
/// 8. forwarded upstream, once
/// 9. upstream outcome translated
#[tracing::instrument(
    name = "Handling form submission",
    skip_all,
    fields(
        form = %profile.kind,
        client_ip = tracing::field::Empty,
    )
)]
pub async fn handle_submission(
    profile: &FormProfile,
    req: &HttpRequest,
    body: Result<web::Bytes, actix_web::Error>,
    collaborators: Collaborators<'_>,
) -> Result<HttpResponse, SubmissionError> {
    match *req.method() {
        Method::OPTIONS => return Ok(preflight()),
        Method::POST => {}
        _ => return Err(SubmissionError::MethodNotAllowed),
    }

    if !collaborators.subscriber_client.has_credential() {
        tracing::error!("subscriber API token not configured");
        return Err(SubmissionError::Misconfigured);
    }

    let fields = parse_body(&read_body(body)?)?;

    // don't teach bots what gave them away
    if !fields.honeypot.is_empty() {
        tracing::info!("honeypot filled, reporting success without forwarding");
        return Ok(success(profile, None));
    }

    let client_ip = client_ip(req.headers(), &collaborators.client_ip_header.0);
    tracing::Span::current().record("client_ip", tracing::field::display(&client_ip));

    verify_challenge(collaborators.challenge, &fields.challenge_token, &client_ip).await?;

    let submission = NewSubmission::parse(profile.kind, fields)?;

    let key = profile.rate_limit_key(&client_ip);
    if let RateLimitDecision::Denied {
        retry_after_seconds,
    } = collaborators
        .rate_limiter
        .check(&key, profile.rate_limit_max, profile.rate_limit_window)
    {
        tracing::warn!(retry_after_seconds, "rate limit exceeded");
        return Err(SubmissionError::RateLimited {
            retry_after_seconds,
        });
    }

    let payload = UpstreamSubscriber::from_submission(&submission, profile.group_id);
    let outcome = match collaborators
        .subscriber_client
        .create_subscriber(&payload)
        .await
    {
        Ok(outcome) => outcome,
        Err(UpstreamError::MissingCredential) => return Err(SubmissionError::Misconfigured),
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context("Failed to forward submission upstream")
                .into())
        }
    };

    translate(profile, outcome)
}

async fn verify_challenge(
    challenge: &ChallengeGate,
    token: &str,
    client_ip: &str,
) -> Result<(), SubmissionError> {
    let Some(verifier) = &challenge.0 else {
        tracing::warn!("no challenge secret configured, skipping verification");
        return Ok(());
    };
    if token.is_empty() {
        return Err(SubmissionError::ChallengeMissing);
    }
    let remote_ip = (client_ip != "unknown").then_some(client_ip);
    match verifier.verify(token, remote_ip).await {
        true => Ok(()),
        false => Err(SubmissionError::ChallengeFailed),
    }
}

/// Same upstream outcome, different meaning per form: an address that
/// already exists fails a newsletter signup but still delivers a contact
/// message.
fn translate(
    profile: &FormProfile,
    outcome: CreateOutcome,
) -> Result<HttpResponse, SubmissionError> {
    match outcome {
        CreateOutcome::Created(record) => Ok(success(profile, Some(record))),
        CreateOutcome::EmailConflict if profile.rejects_existing_email() => {
            Err(SubmissionError::AlreadySubscribed)
        }
        CreateOutcome::EmailConflict => Ok(success(profile, None)),
        CreateOutcome::Rejected { status } => Err(SubmissionError::UpstreamRejected {
            kind: profile.kind,
            upstream_status: status.as_u16(),
        }),
    }
}
