//! Moderation Queue.
//!
//! Privileged actors work through pending applications and open reports.
//! Approve and reject are two independent steps: the email attempt, then the
//! row deletion. The row goes away whatever the email outcome; a failed send
//! hands the operator a `mailto:` link with the same content instead.

use std::sync::Arc;

use domains::{
    Application, ApplicationRepository, ApplicationStatus, DomainError, EventRepository,
    NewApplication, NewReport, Report, ReportRepository, Result,
};
use serde::Serialize;

use crate::identity::Actor;
use crate::notification::{EmailDraft, NotificationRelay};

pub const DEFAULT_SITE_NAME: &str = "浜松イベント情報";
pub const DEFAULT_REJECTION_REASON: &str = "活動内容が本サイトの趣旨と異なるため";

/// How the applicant was told about the decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Delivery {
    Sent,
    /// The webhook failed; the operator should send this by hand.
    Fallback { mailto: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub application_id: i64,
    pub status: ApplicationStatus,
    pub delivery: Delivery,
}

/// An open report with the title of the event it points at, when that
/// event still exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    #[serde(flatten)]
    pub report: Report,
    pub event_title: Option<String>,
}

pub struct ModerationService {
    applications: Arc<dyn ApplicationRepository>,
    reports: Arc<dyn ReportRepository>,
    events: Arc<dyn EventRepository>,
    relay: Arc<NotificationRelay>,
    site_name: String,
    invite_url: String,
}

impl ModerationService {
    pub fn new(
        applications: Arc<dyn ApplicationRepository>,
        reports: Arc<dyn ReportRepository>,
        events: Arc<dyn EventRepository>,
        relay: Arc<NotificationRelay>,
        invite_url: impl Into<String>,
    ) -> Self {
        Self {
            applications,
            reports,
            events,
            relay,
            site_name: DEFAULT_SITE_NAME.to_string(),
            invite_url: invite_url.into(),
        }
    }

    pub fn with_site_name(mut self, site_name: impl Into<String>) -> Self {
        self.site_name = site_name.into();
        self
    }

    // ── Public submissions ──────────────────────────────────────────────────

    pub async fn submit_application(&self, application: NewApplication) -> Result<Application> {
        let application = NewApplication {
            organization_name: required(&application.organization_name, "organization name")?,
            email: required(&application.email, "email")?,
            activity_details: required(&application.activity_details, "activity details")?,
        };
        if !application.email.contains('@') {
            return Err(DomainError::validation("email address is invalid"));
        }
        let stored = self.applications.insert(application).await?;
        tracing::info!(application_id = stored.id, "application received");
        Ok(stored)
    }

    pub async fn submit_report(&self, event_id: i64, reason: &str) -> Result<Report> {
        let reason = required(reason, "reason")?;
        self.events
            .find(event_id)
            .await?
            .filter(|e| !e.is_hidden)
            .ok_or_else(|| DomainError::not_found("Event", event_id))?;

        let report = self.reports.insert(NewReport { reason, event_id }).await?;
        tracing::info!(report_id = report.id, event_id, "event reported");
        Ok(report)
    }

    // ── Queue ───────────────────────────────────────────────────────────────

    pub async fn pending_applications(&self, actor: &Actor) -> Result<Vec<Application>> {
        require_privileged(actor)?;
        self.applications.list_pending().await
    }

    pub async fn open_reports(&self, actor: &Actor) -> Result<Vec<ReportEntry>> {
        require_privileged(actor)?;
        let reports = self.reports.list().await?;

        let mut entries = Vec::with_capacity(reports.len());
        for report in reports {
            let event_title = match report.event_id {
                Some(event_id) => self.events.find(event_id).await?.map(|e| e.title),
                None => None,
            };
            entries.push(ReportEntry {
                report,
                event_title,
            });
        }
        Ok(entries)
    }

    pub fn invite_link(&self, actor: &Actor) -> Result<String> {
        require_privileged(actor)?;
        Ok(self.invite_url.clone())
    }

    // ── Decisions ───────────────────────────────────────────────────────────

    pub async fn approve(&self, actor: &Actor, id: i64) -> Result<Decision> {
        require_privileged(actor)?;
        let application = self.load(id).await?;
        let draft = self.approval_email(&application);
        self.decide(actor, application, ApplicationStatus::Approved, draft)
            .await
    }

    /// `reason` falls back to the default text when absent or blank.
    pub async fn reject(&self, actor: &Actor, id: i64, reason: Option<&str>) -> Result<Decision> {
        require_privileged(actor)?;
        let application = self.load(id).await?;
        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_REJECTION_REASON);
        let draft = self.rejection_email(&application, reason);
        self.decide(actor, application, ApplicationStatus::Rejected, draft)
            .await
    }

    /// Removes a report. No one is notified.
    pub async fn dismiss_report(&self, actor: &Actor, id: i64) -> Result<()> {
        require_privileged(actor)?;
        if !self.reports.delete(id).await? {
            return Err(DomainError::not_found("Report", id));
        }
        tracing::info!(report_id = id, actor = %actor.id, "report dismissed");
        Ok(())
    }

    pub fn approval_email(&self, application: &Application) -> EmailDraft {
        EmailDraft {
            to_email: application.email.clone(),
            to_name: application.organization_name.clone(),
            subject: format!("【{}】利用申請の承認と招待について", self.site_name),
            body: format!(
                "承認いたしました。\n\n▼登録用リンク\n{}\n\nよろしくお願いいたします。",
                self.invite_url
            ),
        }
    }

    pub fn rejection_email(&self, application: &Application, reason: &str) -> EmailDraft {
        EmailDraft {
            to_email: application.email.clone(),
            to_name: application.organization_name.clone(),
            subject: format!("【{}】利用申請の結果について", self.site_name),
            body: format!("誠に残念ながら承認を見送らせていただくこととなりました。\n理由: {reason}"),
        }
    }

    async fn decide(
        &self,
        actor: &Actor,
        application: Application,
        status: ApplicationStatus,
        draft: EmailDraft,
    ) -> Result<Decision> {
        let delivery = match self.relay.send_email(&draft).await {
            Ok(()) => Delivery::Sent,
            Err(_) => Delivery::Fallback {
                mailto: draft.mailto(),
            },
        };

        // The decision stands regardless of how the email went.
        self.applications.delete(application.id).await?;
        tracing::info!(
            application_id = application.id,
            status = status.as_str(),
            actor = %actor.id,
            emailed = matches!(delivery, Delivery::Sent),
            "application decided"
        );

        Ok(Decision {
            application_id: application.id,
            status,
            delivery,
        })
    }

    async fn load(&self, id: i64) -> Result<Application> {
        self.applications
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Application", id))
    }
}

fn require_privileged(actor: &Actor) -> Result<()> {
    if actor.has_elevated_privileges() {
        Ok(())
    } else {
        Err(DomainError::forbidden("administrator role required"))
    }
}

fn required(value: &str, field: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domains::{
        MockApplicationRepository, MockEmailSender, MockEventRepository, MockMessageRepository,
        MockReportRepository, Role,
    };
    use uuid::Uuid;

    const INVITE: &str = "https://events.example.org/api/invite?code=hamamatsu";

    fn application(id: i64) -> Application {
        Application {
            id,
            organization_name: "浜松市民劇団".into(),
            email: "troupe@example.org".into(),
            activity_details: "演劇公演".into(),
            status: ApplicationStatus::Pending,
            created_at: Utc::now(),
        }
    }

    fn service(
        applications: MockApplicationRepository,
        reports: MockReportRepository,
        events: MockEventRepository,
        email: MockEmailSender,
    ) -> ModerationService {
        let relay = NotificationRelay::new(Arc::new(MockMessageRepository::new()), Arc::new(email));
        ModerationService::new(
            Arc::new(applications),
            Arc::new(reports),
            Arc::new(events),
            Arc::new(relay),
            INVITE,
        )
    }

    fn admin() -> Actor {
        Actor::new(Uuid::new_v4(), Role::Admin)
    }

    #[tokio::test]
    async fn approval_deletes_the_row_after_successful_email() {
        let mut applications = MockApplicationRepository::new();
        applications
            .expect_find()
            .returning(|id| Ok(Some(application(id))));
        applications.expect_delete().times(1).returning(|_| Ok(true));
        let mut email = MockEmailSender::new();
        email
            .expect_send()
            .withf(|e| e.subject.contains("承認と招待") && e.html_content.contains("invite?code=hamamatsu"))
            .times(1)
            .returning(|_| Ok(()));

        let svc = service(applications, MockReportRepository::new(), MockEventRepository::new(), email);
        let decision = svc.approve(&admin(), 4).await.unwrap();

        assert_eq!(decision.delivery, Delivery::Sent);
        assert_eq!(decision.status, ApplicationStatus::Approved);
    }

    #[tokio::test]
    async fn approval_deletes_the_row_even_when_email_fails() {
        let mut applications = MockApplicationRepository::new();
        applications
            .expect_find()
            .returning(|id| Ok(Some(application(id))));
        applications
            .expect_delete()
            .withf(|id| *id == 4)
            .times(1)
            .returning(|_| Ok(true));
        let mut email = MockEmailSender::new();
        email
            .expect_send()
            .returning(|_| Err(DomainError::Delivery("webhook returned 500".into())));

        let svc = service(applications, MockReportRepository::new(), MockEventRepository::new(), email);
        let decision = svc.approve(&admin(), 4).await.unwrap();

        match decision.delivery {
            Delivery::Fallback { mailto } => assert!(mailto.starts_with("mailto:troupe%40example.org")),
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn blank_rejection_reason_uses_the_default() {
        let mut applications = MockApplicationRepository::new();
        applications
            .expect_find()
            .returning(|id| Ok(Some(application(id))));
        applications.expect_delete().returning(|_| Ok(true));
        let mut email = MockEmailSender::new();
        email
            .expect_send()
            .withf(|e| e.html_content.contains(DEFAULT_REJECTION_REASON))
            .times(1)
            .returning(|_| Ok(()));

        let svc = service(applications, MockReportRepository::new(), MockEventRepository::new(), email);
        let decision = svc.reject(&admin(), 1, Some("   ")).await.unwrap();
        assert_eq!(decision.status, ApplicationStatus::Rejected);
    }

    #[tokio::test]
    async fn posters_cannot_see_the_queue() {
        let svc = service(
            MockApplicationRepository::new(),
            MockReportRepository::new(),
            MockEventRepository::new(),
            MockEmailSender::new(),
        );
        let poster = Actor::new(Uuid::new_v4(), Role::Poster);

        assert!(matches!(
            svc.pending_applications(&poster).await,
            Err(DomainError::Forbidden(_))
        ));
        assert!(svc.invite_link(&poster).is_err());
        assert_eq!(svc.invite_link(&admin()).unwrap(), INVITE);
    }

    #[tokio::test]
    async fn application_requires_every_field_and_an_address() {
        let mut applications = MockApplicationRepository::new();
        applications.expect_insert().never();
        let svc = service(
            applications,
            MockReportRepository::new(),
            MockEventRepository::new(),
            MockEmailSender::new(),
        );

        let missing = NewApplication {
            organization_name: "劇団".into(),
            email: "a@b".into(),
            activity_details: " ".into(),
        };
        assert!(svc.submit_application(missing).await.is_err());

        let bad_email = NewApplication {
            organization_name: "劇団".into(),
            email: "not-an-address".into(),
            activity_details: "公演".into(),
        };
        assert!(svc.submit_application(bad_email).await.is_err());
    }

    #[tokio::test]
    async fn report_entries_carry_the_event_title() {
        let mut reports = MockReportRepository::new();
        reports.expect_list().returning(|| {
            Ok(vec![
                Report {
                    id: 1,
                    reason: "spam".into(),
                    event_id: Some(10),
                    created_at: Utc::now(),
                },
                Report {
                    id: 2,
                    reason: "old".into(),
                    event_id: None,
                    created_at: Utc::now(),
                },
            ])
        });
        let mut events = MockEventRepository::new();
        events.expect_find().times(1).returning(|_| Ok(None));

        let svc = service(MockApplicationRepository::new(), reports, events, MockEmailSender::new());
        let entries = svc.open_reports(&admin()).await.unwrap();

        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.event_title.is_none()));
    }

    #[tokio::test]
    async fn dismissing_a_missing_report_is_not_found() {
        let mut reports = MockReportRepository::new();
        reports.expect_delete().returning(|_| Ok(false));
        let svc = service(
            MockApplicationRepository::new(),
            reports,
            MockEventRepository::new(),
            MockEmailSender::new(),
        );
        assert!(matches!(
            svc.dismiss_report(&admin(), 5).await,
            Err(DomainError::NotFound(..))
        ));
    }
}
