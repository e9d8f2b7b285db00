//! Outbound email through the mail worker webhook. One attempt, no retry.

use async_trait::async_trait;
use domains::{DomainError, EmailSender, OutboundEmail, Result};
use reqwest::Client;
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookPayload<'a> {
    to_email: &'a str,
    to_name: &'a str,
    subject: &'a str,
    html_content: &'a str,
}

impl<'a> From<&'a OutboundEmail> for WebhookPayload<'a> {
    fn from(email: &'a OutboundEmail) -> Self {
        Self {
            to_email: &email.to_email,
            to_name: &email.to_name,
            subject: &email.subject,
            html_content: &email.html_content,
        }
    }
}

#[derive(Clone, Debug)]
pub struct WebhookEmailSender {
    http_client: Client,
    url: String,
}

impl WebhookEmailSender {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), url)
    }

    pub fn with_client(http_client: Client, url: impl Into<String>) -> Self {
        Self {
            http_client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl EmailSender for WebhookEmailSender {
    async fn send(&self, email: &OutboundEmail) -> Result<()> {
        let response = self
            .http_client
            .post(&self.url)
            .json(&WebhookPayload::from(email))
            .send()
            .await
            .map_err(|e| DomainError::Delivery(format!("mail webhook unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::Delivery(format!("mail webhook returned {status}: {body}")));
        }

        tracing::info!(to = %email.to_email, subject = %email.subject, "email handed to webhook");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn email() -> OutboundEmail {
        OutboundEmail {
            to_email: "org@example.com".into(),
            to_name: "浜松マルシェ".into(),
            subject: "掲載のご案内".into(),
            html_content: "<p>ようこそ</p>".into(),
        }
    }

    #[tokio::test]
    async fn posts_camel_case_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .and(body_json(json!({
                "toEmail": "org@example.com",
                "toName": "浜松マルシェ",
                "subject": "掲載のご案内",
                "htmlContent": "<p>ようこそ</p>"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        WebhookEmailSender::new(format!("{}/send", server.uri()))
            .send(&email())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn non_success_status_is_a_delivery_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("worker down"))
            .mount(&server)
            .await;

        let err = WebhookEmailSender::new(server.uri()).send(&email()).await.unwrap_err();
        match err {
            DomainError::Delivery(msg) => assert!(msg.contains("500")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
