//! Prometheus counters served at `GET /metrics`.
//!
//! ## Counters
//! - `event_board_events_created_total`
//! - `event_board_moderation_decisions_total{decision}`
//! - `event_board_emails_total{outcome}`
//! - `event_board_posting_rejections_total{reason}`

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct DecisionLabels {
    pub decision: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct OutcomeLabels {
    pub outcome: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ReasonLabels {
    pub reason: String,
}

pub struct Metrics {
    registry: Registry,
    events_created: Counter,
    decisions: Family<DecisionLabels, Counter>,
    emails: Family<OutcomeLabels, Counter>,
    rejections: Family<ReasonLabels, Counter>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("event_board");
        let events_created = Counter::default();
        let decisions = Family::<DecisionLabels, Counter>::default();
        let emails = Family::<OutcomeLabels, Counter>::default();
        let rejections = Family::<ReasonLabels, Counter>::default();

        registry.register("events_created", "Events created through the dashboard", events_created.clone());
        registry.register(
            "moderation_decisions",
            "Application approvals and rejections",
            decisions.clone(),
        );
        registry.register("emails", "Outbound emails by delivery outcome", emails.clone());
        registry.register(
            "posting_rejections",
            "Create or edit attempts refused by the posting rules",
            rejections.clone(),
        );

        Self {
            registry,
            events_created,
            decisions,
            emails,
            rejections,
        }
    }

    pub fn event_created(&self) {
        self.events_created.inc();
    }

    pub fn decision(&self, decision: &str) {
        self.decisions
            .get_or_create(&DecisionLabels {
                decision: decision.to_string(),
            })
            .inc();
    }

    pub fn email(&self, outcome: &str) {
        self.emails
            .get_or_create(&OutcomeLabels {
                outcome: outcome.to_string(),
            })
            .inc();
    }

    pub fn posting_rejected(&self, reason: &str) {
        self.rejections
            .get_or_create(&ReasonLabels {
                reason: reason.to_string(),
            })
            .inc();
    }

    /// OpenMetrics text exposition.
    pub fn render(&self) -> Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}
