//! Notification Relay.
//!
//! Delivers a human-readable notice as an in-app `Message` row or as an
//! outbound email. Nothing here retries; callers pick the fallback.

use std::sync::Arc;

use domains::{EmailSender, Message, MessageRepository, NewMessage, OutboundEmail, Result};
use uuid::Uuid;

/// Texts of the notices sent to an event owner after an off-owner action.
pub mod notices {
    pub fn event_deleted(title: &str, reason: &str) -> String {
        format!("【重要】あなたの投稿「{title}」は管理者により削除されました。\n\n理由: {reason}")
    }

    pub fn event_edited(title: &str, reason: &str) -> String {
        format!("【管理者通知】あなたの投稿「{title}」の内容が管理者により編集されました。\n\n理由: {reason}")
    }

    pub fn visibility_changed(title: &str, hidden: bool, reason: &str) -> String {
        let state = if hidden { "非表示に設定されました" } else { "再公開されました" };
        format!("【管理者通知】投稿「{title}」は{state}。\n理由: {reason}")
    }
}

/// An email before it is rendered for the webhook or for a mail client.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailDraft {
    pub to_email: String,
    pub to_name: String,
    pub subject: String,
    /// Plain text; newlines become line breaks in the HTML rendering.
    pub body: String,
}

impl EmailDraft {
    /// HTML body posted to the webhook. Every interpolated value is escaped.
    pub fn html(&self) -> String {
        let body = html_escape::encode_text(&self.body).replace('\n', "<br/>");
        format!(
            "<p>{} 様</p><p>{}</p>",
            html_escape::encode_text(&self.to_name),
            body
        )
    }

    pub fn to_outbound(&self) -> OutboundEmail {
        OutboundEmail {
            to_email: self.to_email.clone(),
            to_name: self.to_name.clone(),
            subject: self.subject.clone(),
            html_content: self.html(),
        }
    }

    /// `mailto:` URL pre-filled with the same subject and body, for the
    /// operator's own mail client when the webhook fails.
    pub fn mailto(&self) -> String {
        format!(
            "mailto:{}?subject={}&body={}",
            urlencoding::encode(&self.to_email),
            urlencoding::encode(&self.subject),
            urlencoding::encode(&self.body)
        )
    }
}

pub struct NotificationRelay {
    messages: Arc<dyn MessageRepository>,
    email: Arc<dyn EmailSender>,
}

impl NotificationRelay {
    pub fn new(messages: Arc<dyn MessageRepository>, email: Arc<dyn EmailSender>) -> Self {
        Self { messages, email }
    }

    /// Persists an in-app notice. `sender` is `None` for system notices.
    pub async fn notify_in_app(
        &self,
        sender: Option<Uuid>,
        receiver: Uuid,
        content: String,
    ) -> Result<Message> {
        let message = self
            .messages
            .insert(NewMessage {
                sender_id: sender,
                receiver_id: receiver,
                content,
            })
            .await?;
        tracing::debug!(message_id = %message.id, receiver = %receiver, "in-app notice stored");
        Ok(message)
    }

    /// Single attempt through the webhook.
    pub async fn send_email(&self, draft: &EmailDraft) -> Result<()> {
        self.email.send(&draft.to_outbound()).await.inspect_err(|e| {
            tracing::warn!(to = %draft.to_email, error = %e, "outbound email failed");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{DomainError, MockEmailSender, MockMessageRepository};

    fn draft() -> EmailDraft {
        EmailDraft {
            to_email: "info@example.org".into(),
            to_name: "<浜松> & Co".into(),
            subject: "件名 A&B".into(),
            body: "一行目\n二行目 <b>".into(),
        }
    }

    #[test]
    fn html_body_is_escaped_and_line_broken() {
        let html = draft().html();
        assert_eq!(
            html,
            "<p>&lt;浜松&gt; &amp; Co 様</p><p>一行目<br/>二行目 &lt;b&gt;</p>"
        );
    }

    #[test]
    fn mailto_link_is_percent_encoded() {
        let link = draft().mailto();
        assert!(link.starts_with("mailto:info%40example.org?subject="));
        assert!(link.contains("A%26B"));
        assert!(link.contains("%0A"));
        assert!(!link.contains(' '));
    }

    #[test]
    fn visibility_notice_names_the_new_state() {
        assert!(notices::visibility_changed("朝市", true, "重複").contains("非表示"));
        assert!(notices::visibility_changed("朝市", false, "解決").contains("再公開"));
    }

    #[tokio::test]
    async fn email_failure_is_returned_to_the_caller() {
        let mut email = MockEmailSender::new();
        email
            .expect_send()
            .times(1)
            .returning(|_| Err(DomainError::Delivery("502".into())));
        let relay = NotificationRelay::new(Arc::new(MockMessageRepository::new()), Arc::new(email));

        let err = relay.send_email(&draft()).await.unwrap_err();
        assert!(matches!(err, DomainError::Delivery(_)));
    }

    #[tokio::test]
    async fn in_app_notice_is_inserted_for_the_receiver() {
        let receiver = Uuid::new_v4();
        let mut messages = MockMessageRepository::new();
        messages
            .expect_insert()
            .withf(move |m| m.receiver_id == receiver && m.sender_id.is_none())
            .times(1)
            .returning(|m| {
                Ok(Message {
                    id: Uuid::new_v4(),
                    sender_id: m.sender_id,
                    receiver_id: m.receiver_id,
                    content: m.content,
                    is_read: false,
                    created_at: chrono::Utc::now(),
                })
            });
        let relay = NotificationRelay::new(Arc::new(messages), Arc::new(MockEmailSender::new()));

        let stored = relay
            .notify_in_app(None, receiver, notices::event_deleted("朝市", "重複投稿"))
            .await
            .unwrap();
        assert!(stored.content.contains("重複投稿"));
    }
}
