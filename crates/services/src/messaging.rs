//! Direct messages between members, with the anti-spam limits that apply to
//! non-privileged senders.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Duration;
use domains::{
    Clock, DomainError, Message, MessageRepository, NewMessage, PosterSummary, ProfileRepository,
    Result, Role,
};
use serde::Serialize;
use uuid::Uuid;

use crate::identity::Actor;

#[derive(Debug, Clone)]
pub struct MessagingPolicy {
    /// Messages per rolling window, counted per recipient row.
    pub daily_limit: u32,
    pub window: Duration,
    /// Minimum gap since the sender's previous message.
    pub cooldown: Duration,
    pub inbox_limit: u32,
}

impl Default for MessagingPolicy {
    fn default() -> Self {
        Self {
            daily_limit: 10,
            window: Duration::hours(24),
            cooldown: Duration::minutes(3),
            inbox_limit: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InboxEntry {
    #[serde(flatten)]
    pub message: Message,
    /// `None` for system notices and for senders without a profile.
    pub sender_name: Option<String>,
}

pub struct MessageService {
    messages: Arc<dyn MessageRepository>,
    profiles: Arc<dyn ProfileRepository>,
    clock: Arc<dyn Clock>,
    policy: MessagingPolicy,
}

impl MessageService {
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        profiles: Arc<dyn ProfileRepository>,
        clock: Arc<dyn Clock>,
        policy: MessagingPolicy,
    ) -> Self {
        Self {
            messages,
            profiles,
            clock,
            policy,
        }
    }

    pub async fn inbox(&self, actor: &Actor) -> Result<Vec<InboxEntry>> {
        let messages = self.messages.inbox(actor.id, self.policy.inbox_limit).await?;

        let mut sender_ids: Vec<Uuid> = messages.iter().filter_map(|m| m.sender_id).collect();
        sender_ids.sort_unstable();
        sender_ids.dedup();
        let names: HashMap<Uuid, String> = if sender_ids.is_empty() {
            HashMap::new()
        } else {
            self.profiles
                .find_many(&sender_ids)
                .await?
                .into_iter()
                .map(|p| (p.id, p.name))
                .collect()
        };

        Ok(messages
            .into_iter()
            .map(|message| InboxEntry {
                sender_name: message.sender_id.and_then(|id| names.get(&id).cloned()),
                message,
            })
            .collect())
    }

    pub async fn mark_read(&self, actor: &Actor, id: Uuid) -> Result<()> {
        if self.messages.mark_read(id, actor.id).await? {
            Ok(())
        } else {
            Err(DomainError::not_found("Message", id))
        }
    }

    /// Only the receiver may delete a message.
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<()> {
        if self.messages.delete(id, actor.id).await? {
            Ok(())
        } else {
            Err(DomainError::not_found("Message", id))
        }
    }

    /// Who the actor may write to. Posters reach administrators only.
    pub async fn recipients(&self, actor: &Actor) -> Result<Vec<PosterSummary>> {
        let roles = (!actor.has_elevated_privileges()).then(|| vec![Role::Admin, Role::SuperAdmin]);
        Ok(self
            .profiles
            .list(roles)
            .await?
            .iter()
            .filter(|p| p.id != actor.id)
            .map(PosterSummary::from)
            .collect())
    }

    /// Messages left in the rolling window, `None` when unlimited.
    pub async fn remaining(&self, actor: &Actor) -> Result<Option<u32>> {
        if actor.has_elevated_privileges() {
            return Ok(None);
        }
        let since = self.clock.now() - self.policy.window;
        let sent = self.messages.count_sent_since(actor.id, since).await?;
        let sent = u32::try_from(sent).unwrap_or(u32::MAX);
        Ok(Some(self.policy.daily_limit.saturating_sub(sent)))
    }

    /// Sends one message per distinct receiver. A batch that does not fit in
    /// the remaining quota is rejected whole.
    pub async fn send(&self, actor: &Actor, receivers: &[Uuid], content: &str) -> Result<Vec<Message>> {
        let content = content.trim();
        if content.is_empty() {
            return Err(DomainError::validation("message must not be empty"));
        }

        let mut seen = HashSet::new();
        let receivers: Vec<Uuid> = receivers.iter().copied().filter(|id| seen.insert(*id)).collect();
        if receivers.is_empty() {
            return Err(DomainError::validation("choose at least one recipient"));
        }

        let allowed: HashSet<Uuid> = self.recipients(actor).await?.into_iter().map(|p| p.id).collect();
        if let Some(id) = receivers.iter().find(|id| !allowed.contains(id)) {
            return Err(DomainError::forbidden(format!("cannot send a message to {id}")));
        }

        if let Some(remaining) = self.remaining(actor).await? {
            if let Some(last) = self.messages.last_sent_at(actor.id).await? {
                if self.clock.now() - last < self.policy.cooldown {
                    return Err(DomainError::QuotaExceeded(format!(
                        "wait {} minutes between messages",
                        self.policy.cooldown.num_minutes()
                    )));
                }
            }
            if receivers.len() > remaining as usize {
                return Err(DomainError::QuotaExceeded(format!(
                    "{remaining} messages left today"
                )));
            }
        }

        let batch = receivers
            .iter()
            .map(|&receiver_id| NewMessage {
                sender_id: Some(actor.id),
                receiver_id,
                content: content.to_string(),
            })
            .collect();
        let sent = self.messages.insert_many(batch).await?;
        tracing::info!(actor = %actor.id, count = sent.len(), "direct messages sent");
        Ok(sent)
    }
}
