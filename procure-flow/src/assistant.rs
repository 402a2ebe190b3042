//! ChatAssistant: runs one chat turn against the session.
//!
//! A turn is: make sure a conversation exists, record the user's message,
//! classify it, run an analysis when it reads like a project description, then
//! record the reply. Conversation persistence lives in the backend; when it is
//! unavailable the turn still completes and the failure is only logged.

use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    classifier::{KeywordClassifier, MessageClassifier, MessageIntent},
    error::{ProcureError, Result},
    models::{ProcurementReport, Sender},
    session::{AnalysisOutcome, ProcurementSession},
    view::format_inr,
};

/// Longest conversation title taken from an opening message, in characters
pub const TITLE_MAX_CHARS: usize = 50;

const GUIDANCE_REPLY: &str = "Describe the project you want to build, for example \
\"25 MW data center, 200000 sqft, Mumbai\", and I will estimate the budget, \
materials, vendors and schedule.";

#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    /// `None` when no conversation could be recorded (anonymous or backend down)
    pub conversation_id: Option<String>,
    pub intent: MessageIntent,
    pub reply: String,
    pub analysis: Option<AnalysisOutcome>,
}

#[derive(Clone)]
pub struct ChatAssistant {
    session: Arc<ProcurementSession>,
    classifier: Arc<dyn MessageClassifier>,
}

impl ChatAssistant {
    pub fn new(session: Arc<ProcurementSession>) -> Self {
        Self::with_classifier(session, Arc::new(KeywordClassifier::new()))
    }

    pub fn with_classifier(
        session: Arc<ProcurementSession>,
        classifier: Arc<dyn MessageClassifier>,
    ) -> Self {
        Self {
            session,
            classifier,
        }
    }

    pub async fn send(&self, text: &str) -> Result<ChatTurn> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ProcureError::Validation("message is empty".to_string()));
        }

        let conversation_id = self.ensure_conversation(text).await;
        self.record(conversation_id.as_deref(), Sender::User, text).await;

        let intent = self.classifier.classify(text);
        info!(?intent, conversation_id = ?conversation_id, "Classified chat message");

        let (reply, analysis) = match intent {
            MessageIntent::Procurement => {
                let outcome = self.session.run_analysis(text).await;
                (describe(&outcome), Some(outcome))
            }
            MessageIntent::Conversation => (GUIDANCE_REPLY.to_string(), None),
        };

        self.record(conversation_id.as_deref(), Sender::Assistant, &reply).await;

        Ok(ChatTurn {
            conversation_id,
            intent,
            reply,
            analysis,
        })
    }

    async fn ensure_conversation(&self, opening: &str) -> Option<String> {
        if let Some(id) = self.session.current_conversation_id() {
            return Some(id);
        }
        if !self.session.is_authenticated() {
            return None;
        }

        match self.session.start_conversation(&conversation_title(opening)).await {
            Ok(created) => Some(created.id),
            Err(e) => {
                warn!(error = %e, "Could not start a conversation; continuing without history");
                None
            }
        }
    }

    async fn record(&self, conversation_id: Option<&str>, sender: Sender, text: &str) {
        let Some(id) = conversation_id else {
            return;
        };
        if let Err(e) = self.session.post_message(id, sender, text).await {
            warn!(conversation_id = id, ?sender, error = %e, "Failed to record chat message");
        }
    }
}

fn describe(outcome: &AnalysisOutcome) -> String {
    match outcome {
        AnalysisOutcome::Completed(report) => summarize(report),
        AnalysisOutcome::Failed(message) => message.clone(),
        AnalysisOutcome::Superseded => {
            "A newer request replaced this one before it finished.".to_string()
        }
    }
}

/// The first `TITLE_MAX_CHARS` characters of the opening message
pub fn conversation_title(opening: &str) -> String {
    opening.trim().chars().take(TITLE_MAX_CHARS).collect()
}

fn summarize(report: &ProcurementReport) -> String {
    let details = &report.project_details;
    let mut summary = format!(
        "Estimated total cost {}",
        format_inr(report.budget_breakdown.total_cost)
    );

    match (details.project_type.as_str(), details.location.as_str()) {
        ("", "") => {}
        (kind, "") => summary.push_str(&format!(" for the {kind} project")),
        ("", location) => summary.push_str(&format!(" for the project in {location}")),
        (kind, location) => summary.push_str(&format!(" for the {kind} project in {location}")),
    }

    summary.push_str(&format!(
        ", covering {} material{}",
        report.material_requirements.len(),
        if report.material_requirements.len() == 1 { "" } else { "s" }
    ));

    if report.project_schedule.total_months > 0 {
        summary.push_str(&format!(
            " over a {}-month schedule",
            report.project_schedule.total_months
        ));
    }
    summary.push('.');
    summary
}
