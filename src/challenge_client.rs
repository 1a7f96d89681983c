use std::time::Duration;

use reqwest::Client;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Deserialize;
use serde::Serialize;

/// Server-side verification of the anti-automation widget's token. Only
/// constructed when a secret is configured; see
/// `ChallengeSettings::client`.
#[derive(Debug)]
pub struct ChallengeClient {
    http_client: Client,
    verify_url: String,
    secret: Secret<String>,
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    secret: &'a str,
    response: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    remoteip: Option<&'a str>,
}

#[derive(Deserialize, Debug)]
struct VerifyResponse {
    #[serde(default)]
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

impl ChallengeClient {
    pub fn new(
        verify_url: String,
        secret: Secret<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            verify_url,
            secret,
        })
    }

    /// `true` only on an explicit `success: true`. An unreachable service,
    /// non-2xx status or unreadable body all count as failed verification:
    /// the submission is rejected, not silently admitted.
    #[tracing::instrument(name = "Verifying challenge token", skip(self, token))]
    pub async fn verify(
        &self,
        token: &str,
        remote_ip: Option<&str>,
    ) -> bool {
        let request = VerifyRequest {
            secret: self.secret.expose_secret(),
            response: token,
            remoteip: remote_ip,
        };

        let resp = match self
            .http_client
            .post(&self.verify_url)
            .json(&request)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!(error.cause_chain = ?e, "challenge verification unreachable");
                return false;
            }
        };

        if !resp.status().is_success() {
            tracing::error!(status = resp.status().as_u16(), "challenge verification API error");
            return false;
        }

        match resp.json::<VerifyResponse>().await {
            Ok(VerifyResponse { success: true, .. }) => true,
            Ok(VerifyResponse { error_codes, .. }) => {
                tracing::warn!(?error_codes, "challenge verification failed");
                false
            }
            Err(e) => {
                tracing::error!(
                    error.cause_chain = ?e,
                    "unreadable challenge verification response"
                );
                false
            }
        }
    }
}
