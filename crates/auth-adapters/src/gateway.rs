//! Code exchange against the hosted auth provider's token endpoint.

use async_trait::async_trait;
use domains::{AuthGateway, DomainError, Result, SessionTokens};
use reqwest::Client;
use serde::Serialize;

#[derive(Serialize)]
struct ExchangeRequest<'a> {
    auth_code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code_verifier: Option<String>,
}

#[derive(Clone, Debug)]
pub struct HttpAuthGateway {
    http_client: Client,
    /// Provider auth base, e.g. `https://project.example.co/auth/v1`.
    base_url: String,
    /// Public (anon) key the provider expects in the `apikey` header.
    api_key: String,
}

impl HttpAuthGateway {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, api_key)
    }

    pub fn with_client(http_client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn token_url(&self) -> String {
        format!("{}/token?grant_type=pkce", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl AuthGateway for HttpAuthGateway {
    async fn exchange_code(&self, code: &str, code_verifier: Option<String>) -> Result<SessionTokens> {
        if code.trim().is_empty() {
            return Err(DomainError::Unauthorized("missing auth code".into()));
        }

        let response = self
            .http_client
            .post(self.token_url())
            .header("apikey", &self.api_key)
            .json(&ExchangeRequest {
                auth_code: code,
                code_verifier,
            })
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "auth provider unreachable");
                DomainError::Delivery(format!("code exchange failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "auth code exchange rejected");
            return Err(DomainError::Unauthorized("auth code exchange rejected".into()));
        }

        response.json::<SessionTokens>().await.map_err(|e| {
            tracing::error!(error = %e, "unexpected token response");
            DomainError::Delivery(format!("malformed token response: {e}"))
        })
    }
}
