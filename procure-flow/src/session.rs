//! The procurement session: one shared object holding the signed-in user, the
//! active report and conversation bookkeeping, and mediating every backend call.
//!
//! State lives in memory behind a lock that is never held across an await.
//! Anything that must also reach durable storage goes through the commit lock,
//! which covers "write storage, then update memory" as one step so the two
//! never disagree after a reload.
//!
//! Each `run_analysis` call takes a request number. Only the response to the
//! latest request is applied; older responses are dropped and logged. Logout
//! advances the number too, so a late response cannot repopulate a signed-out
//! session.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::{
    api::ProcurementBackend,
    error::{ProcureError, Result},
    guard::{GuardDecision, RouteGuard, View},
    models::{
        AuthOutcome, ChatMessage, ConversationSummary, CreatedConversation, HealthStatus,
        ProcurementReport, RegisterRequest, Sender, UserIdentity, Vendor,
    },
    store::{REPORT_KEY, SessionStore, SessionStoreExt, USER_KEY},
};

/// Active conversation and the list shown in chat history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub current_id: Option<String>,
    pub conversations: Vec<ConversationSummary>,
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub user: Option<UserIdentity>,
    pub report: Option<ProcurementReport>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub conversation: ConversationState,
    latest_request: u64,
}

impl SessionState {
    pub fn phase(&self) -> SessionPhase {
        if self.user.is_none() {
            SessionPhase::Anonymous
        } else if self.is_loading {
            SessionPhase::Loading
        } else if self.error.is_some() {
            SessionPhase::Error
        } else if self.report.is_some() {
            SessionPhase::WithReport
        } else {
            SessionPhase::AuthenticatedNoReport
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Anonymous,
    AuthenticatedNoReport,
    Loading,
    WithReport,
    /// Last analysis failed; an earlier report may still be held
    Error,
}

/// How a `run_analysis` call ended
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// Carries the report this call stored
    Completed(Box<ProcurementReport>),
    Failed(String),
    /// A newer request (or a logout) replaced this one before it settled
    Superseded,
}

pub struct ProcurementSession {
    backend: Arc<dyn ProcurementBackend>,
    store: Arc<dyn SessionStore>,
    state: RwLock<SessionState>,
    guard: Mutex<RouteGuard>,
    commit: tokio::sync::Mutex<()>,
    navigation: watch::Sender<View>,
}

/// Clears `is_loading` for its request when dropped, including on cancellation or panic
struct LoadingRelease<'a> {
    session: &'a ProcurementSession,
    request: u64,
}

impl Drop for LoadingRelease<'_> {
    fn drop(&mut self) {
        let mut state = self.session.write_state();
        if state.latest_request == self.request {
            state.is_loading = false;
        }
    }
}

impl ProcurementSession {
    /// An anonymous session with nothing loaded
    pub fn new(backend: Arc<dyn ProcurementBackend>, store: Arc<dyn SessionStore>) -> Self {
        Self::with_state(backend, store, SessionState::default())
    }

    /// Rebuilds the session from durable storage without touching the network
    pub async fn restore(backend: Arc<dyn ProcurementBackend>, store: Arc<dyn SessionStore>) -> Self {
        let user = match store.load_user().await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Discarding unreadable persisted user");
                discard(store.as_ref(), USER_KEY).await;
                None
            }
        };

        let report = match store.load_report().await {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "Discarding unreadable persisted report");
                discard(store.as_ref(), REPORT_KEY).await;
                None
            }
        };

        let session = Self::with_state(
            backend,
            store,
            SessionState {
                user,
                report,
                ..SessionState::default()
            },
        );
        info!(phase = ?session.phase(), "Session restored from storage");
        session
    }

    fn with_state(
        backend: Arc<dyn ProcurementBackend>,
        store: Arc<dyn SessionStore>,
        state: SessionState,
    ) -> Self {
        let (navigation, _) = watch::channel(View::Landing);
        Self {
            backend,
            store,
            state: RwLock::new(state),
            guard: Mutex::new(RouteGuard::new()),
            commit: tokio::sync::Mutex::new(()),
            navigation,
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn route_guard(&self) -> MutexGuard<'_, RouteGuard> {
        self.guard.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> SessionState {
        self.read_state().clone()
    }

    pub fn phase(&self) -> SessionPhase {
        self.read_state().phase()
    }

    pub fn user(&self) -> Option<UserIdentity> {
        self.read_state().user.clone()
    }

    pub fn report(&self) -> Option<ProcurementReport> {
        self.read_state().report.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.read_state().is_loading
    }

    pub fn error(&self) -> Option<String> {
        self.read_state().error.clone()
    }

    pub fn clear_error(&self) {
        self.write_state().error = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.read_state().user.is_some()
    }

    // Navigation

    pub fn current_view(&self) -> View {
        self.navigation.borrow().clone()
    }

    pub fn subscribe_navigation(&self) -> watch::Receiver<View> {
        self.navigation.subscribe()
    }

    /// Enters `target`, or the login view if it is protected and nobody is signed in
    pub fn navigate(&self, target: View) -> GuardDecision {
        let authenticated = self.is_authenticated();
        let decision = self.route_guard().check(target, authenticated);
        match &decision {
            GuardDecision::Allow(view) => self.navigate_to(view.clone()),
            GuardDecision::RedirectToLogin { from } => {
                info!(from = %from, "Redirecting anonymous user to login");
                self.navigate_to(View::Login);
            }
        }
        decision
    }

    fn navigate_to(&self, view: View) {
        self.navigation.send_replace(view);
    }

    // Analysis

    pub async fn run_analysis(&self, query: &str) -> AnalysisOutcome {
        let query = query.trim();
        if query.is_empty() {
            let message = "Please describe your project before running an analysis".to_string();
            self.write_state().error = Some(message.clone());
            return AnalysisOutcome::Failed(message);
        }

        let request = {
            let mut state = self.write_state();
            state.latest_request += 1;
            state.is_loading = true;
            state.error = None;
            state.latest_request
        };
        let _release = LoadingRelease {
            session: self,
            request,
        };

        info!(request, query_len = query.len(), "Starting procurement analysis");

        match self.backend.analyze(query).await {
            Ok(report) => self.commit_report(request, report).await,
            Err(e) => self.record_failure(request, e),
        }
    }

    fn is_latest(&self, request: u64) -> bool {
        self.read_state().latest_request == request
    }

    async fn commit_report(&self, request: u64, report: ProcurementReport) -> AnalysisOutcome {
        let _commit = self.commit.lock().await;

        if !self.is_latest(request) {
            warn!(request, "Discarding analysis response superseded by a newer request");
            return AnalysisOutcome::Superseded;
        }

        if let Err(e) = self.store.save_report(&report).await {
            return self.record_failure(request, e);
        }

        {
            let mut state = self.write_state();
            state.report = Some(report.clone());
            // A newer request may have started during the save; its loading flag stays
            if state.latest_request == request {
                state.error = None;
                state.is_loading = false;
            }
        }
        info!(request, "Procurement analysis stored");
        self.navigate_to(View::Budget);
        AnalysisOutcome::Completed(Box::new(report))
    }

    fn record_failure(&self, request: u64, err: ProcureError) -> AnalysisOutcome {
        let mut state = self.write_state();
        if state.latest_request != request {
            warn!(request, error = %err, "Ignoring failure of a superseded analysis request");
            return AnalysisOutcome::Superseded;
        }

        let message = format!("Analysis failed: {}", err.user_message());
        error!(request, error = %err, "Procurement analysis failed");
        state.error = Some(message.clone());
        state.is_loading = false;
        AnalysisOutcome::Failed(message)
    }

    // Authentication

    pub async fn login(&self, email: &str, password: &str) -> AuthOutcome {
        if email.trim().is_empty() || password.is_empty() {
            return AuthOutcome::failed("Email and password are required");
        }

        let user = match self.backend.login(email.trim(), password).await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Login failed");
                return AuthOutcome::failed(e.user_message());
            }
        };

        {
            let _commit = self.commit.lock().await;
            if let Err(e) = self.store.save_user(&user).await {
                error!(error = %e, "Failed to persist signed-in user");
                return AuthOutcome::failed(format!("Could not save session: {}", e.user_message()));
            }
            self.write_state().user = Some(user.clone());
        }

        info!(user_id = %user.id, "User signed in");
        let destination = self.route_guard().resume();
        self.navigate_to(destination);
        AuthOutcome::authenticated(user)
    }

    /// Creates an account; the caller still has to log in afterwards
    pub async fn register(&self, request: &RegisterRequest) -> AuthOutcome {
        if request.name.trim().is_empty()
            || request.email.trim().is_empty()
            || request.password.is_empty()
        {
            return AuthOutcome::failed("Name, email and password are required");
        }

        match self.backend.register(request).await {
            Ok(()) => {
                info!(email = %request.email, "Account registered");
                self.navigate_to(View::Login);
                AuthOutcome::registered()
            }
            Err(e) => {
                warn!(error = %e, "Registration failed");
                AuthOutcome::failed(e.user_message())
            }
        }
    }

    /// Drops user, report and conversations from memory and storage. Safe to repeat.
    pub async fn logout(&self) {
        {
            let _commit = self.commit.lock().await;
            if let Err(e) = self.store.clear_session().await {
                error!(error = %e, "Failed to clear persisted session");
            }

            let mut state = self.write_state();
            let latest_request = state.latest_request + 1;
            *state = SessionState {
                latest_request,
                ..SessionState::default()
            };
        }

        self.route_guard().clear();
        info!("Session cleared");
        self.navigate_to(View::Landing);
    }

    // Conversations

    pub fn current_conversation_id(&self) -> Option<String> {
        self.read_state().conversation.current_id.clone()
    }

    pub fn set_current_conversation(&self, id: Option<String>) {
        self.write_state().conversation.current_id = id;
    }

    pub fn conversations(&self) -> Vec<ConversationSummary> {
        self.read_state().conversation.conversations.clone()
    }

    pub fn set_conversations(&self, conversations: Vec<ConversationSummary>) {
        self.write_state().conversation.conversations = conversations;
    }

    fn require_user(&self) -> Result<UserIdentity> {
        self.user()
            .ok_or_else(|| ProcureError::Validation("no user is signed in".to_string()))
    }

    /// Reloads the conversation list for the signed-in user from the backend
    pub async fn refresh_conversations(&self) -> Result<Vec<ConversationSummary>> {
        let user = self.require_user()?;
        let conversations = self.backend.list_conversations(&user.id).await?;
        self.set_conversations(conversations.clone());
        Ok(conversations)
    }

    /// Creates a conversation, puts it at the top of the list and makes it current
    pub async fn start_conversation(&self, title: &str) -> Result<CreatedConversation> {
        let user = self.require_user()?;
        let created = self.backend.create_conversation(&user.id, title).await?;

        let mut state = self.write_state();
        state.conversation.conversations.insert(
            0,
            ConversationSummary {
                id: created.id.clone(),
                title: created.title.clone(),
                created_at: Utc::now(),
            },
        );
        state.conversation.current_id = Some(created.id.clone());
        Ok(created)
    }

    pub async fn conversation_messages(&self, conversation_id: &str) -> Result<Vec<ChatMessage>> {
        self.backend.list_messages(conversation_id).await
    }

    pub async fn post_message(&self, conversation_id: &str, sender: Sender, text: &str) -> Result<()> {
        self.backend.post_message(conversation_id, sender, text).await
    }

    // Pass-throughs

    pub async fn search_vendors(&self, material: &str, location: Option<&str>) -> Result<Vec<Vendor>> {
        if material.trim().is_empty() {
            return Err(ProcureError::Validation("material is required".to_string()));
        }
        self.backend.search_vendors(material.trim(), location).await
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        self.backend.health().await
    }
}

async fn discard(store: &dyn SessionStore, key: &str) {
    if let Err(e) = store.remove_item(key).await {
        warn!(key, error = %e, "Failed to remove unreadable storage entry");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemorySessionStore;
    use crate::test_support::{FaultyStore, ScriptedBackend, sample_report, sample_user};
    use std::time::Duration;

    fn registration(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Asha Rao".to_string(),
            email: email.to_string(),
            password: "secret".to_string(),
            company: "Rao Infra".to_string(),
            project_type: "data_center".to_string(),
        }
    }

    fn session_with(backend: ScriptedBackend) -> (Arc<ProcurementSession>, Arc<ScriptedBackend>, Arc<InMemorySessionStore>) {
        let backend = Arc::new(backend);
        let store = Arc::new(InMemorySessionStore::new());
        let session = Arc::new(ProcurementSession::new(backend.clone(), store.clone()));
        (session, backend, store)
    }

    #[tokio::test]
    async fn test_successful_analysis_is_stored_and_persisted() {
        let backend = ScriptedBackend::default();
        backend.push_report(Duration::ZERO, sample_report(500_000_000.0));
        let (session, _, store) = session_with(backend);

        let outcome = session.run_analysis("25 MW data center, 200000 sqft, Mumbai").await;

        assert!(matches!(outcome, AnalysisOutcome::Completed(_)));
        assert!(!session.is_loading());
        assert!(session.error().is_none());
        assert_eq!(session.current_view(), View::Budget);
        assert_eq!(store.load_report().await.unwrap(), session.report());
    }

    #[tokio::test]
    async fn test_failed_analysis_keeps_previous_report() {
        let backend = ScriptedBackend::default();
        backend.push_report(Duration::ZERO, sample_report(1_000_000.0));
        backend.push_failure(Duration::ZERO, "connection reset");
        let (session, _, store) = session_with(backend);

        session.run_analysis("first").await;
        let before = session.report();

        let outcome = session.run_analysis("second").await;

        assert_eq!(
            outcome,
            AnalysisOutcome::Failed("Analysis failed: Transport error: connection reset".to_string())
        );
        assert!(!session.is_loading());
        assert_eq!(session.report(), before);
        assert_eq!(store.load_report().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_empty_query_never_reaches_backend() {
        let (session, backend, _) = session_with(ScriptedBackend::default());

        let outcome = session.run_analysis("   ").await;

        assert!(matches!(outcome, AnalysisOutcome::Failed(_)));
        assert!(session.error().is_some());
        assert!(!session.is_loading());
        assert_eq!(backend.analyze_calls(), 0);
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let backend = ScriptedBackend::default();
        backend.push_report(Duration::from_millis(300), sample_report(1.0));
        backend.push_report(Duration::from_millis(10), sample_report(2.0));
        let (session, _, store) = session_with(backend);

        let slow = {
            let session = session.clone();
            tokio::spawn(async move { session.run_analysis("slow").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(session.is_loading());

        let fast = session.run_analysis("fast").await;
        assert!(matches!(fast, AnalysisOutcome::Completed(_)));

        let slow = slow.await.unwrap();
        assert_eq!(slow, AnalysisOutcome::Superseded);
        assert!(!session.is_loading());

        let held = session.report().unwrap();
        assert_eq!(held.budget_breakdown.total_cost, 2.0);
        assert_eq!(store.load_report().await.unwrap(), Some(held));
    }

    #[tokio::test]
    async fn test_slow_save_of_older_request_keeps_newer_request_loading() {
        let backend = ScriptedBackend::with_user(sample_user());
        backend.push_report(Duration::ZERO, sample_report(1.0));
        backend.push_report(Duration::from_millis(500), sample_report(2.0));
        let backend = Arc::new(backend);
        let store = Arc::new(FaultyStore::slow_set(REPORT_KEY, Duration::from_millis(200)));
        let session = Arc::new(ProcurementSession::new(backend, store.clone()));
        session.login("asha@example.com", "secret").await;

        let first = {
            let session = session.clone();
            tokio::spawn(async move { session.run_analysis("first").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        let second = {
            let session = session.clone();
            tokio::spawn(async move { session.run_analysis("second").await })
        };

        let first = first.await.unwrap();
        assert!(matches!(first, AnalysisOutcome::Completed(ref r) if r.budget_breakdown.total_cost == 1.0));
        assert!(session.is_loading());
        assert_eq!(session.phase(), SessionPhase::Loading);

        let second = second.await.unwrap();
        assert!(matches!(second, AnalysisOutcome::Completed(_)));
        assert!(!session.is_loading());
        assert_eq!(session.report().unwrap().budget_breakdown.total_cost, 2.0);
        assert_eq!(store.load_report().await.unwrap(), session.report());
    }

    #[tokio::test]
    async fn test_loading_flag_released_when_call_is_dropped() {
        let backend = ScriptedBackend::default();
        backend.push_report(Duration::from_secs(5), sample_report(1.0));
        let (session, _, _) = session_with(backend);

        let result =
            tokio::time::timeout(Duration::from_millis(50), session.run_analysis("slow")).await;

        assert!(result.is_err());
        assert!(!session.is_loading());
        assert!(session.report().is_none());
    }

    #[tokio::test]
    async fn test_loading_flag_released_when_backend_panics() {
        let backend = ScriptedBackend::default();
        backend.push_panic();
        let (session, _, _) = session_with(backend);

        let handle = {
            let session = session.clone();
            tokio::spawn(async move { session.run_analysis("boom").await })
        };

        assert!(handle.await.unwrap_err().is_panic());
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_bad_credentials_leave_user_unset() {
        let (session, _, store) = session_with(ScriptedBackend::default());

        let outcome = session.login("bad@x.com", "wrong").await;

        assert_eq!(outcome, AuthOutcome::failed("Invalid credentials"));
        assert!(session.user().is_none());
        assert!(store.load_user().await.unwrap().is_none());
        assert_eq!(session.phase(), SessionPhase::Anonymous);
    }

    #[tokio::test]
    async fn test_login_resumes_requested_view() {
        let (session, _, store) = session_with(ScriptedBackend::with_user(sample_user()));

        let decision = session.navigate(View::Schedule);
        assert_eq!(decision, GuardDecision::RedirectToLogin { from: View::Schedule });
        assert_eq!(session.current_view(), View::Login);

        let outcome = session.login("asha@example.com", "secret").await;

        assert!(outcome.success);
        assert_eq!(session.current_view(), View::Schedule);
        assert_eq!(store.load_user().await.unwrap(), Some(sample_user()));
        assert_eq!(session.phase(), SessionPhase::AuthenticatedNoReport);
    }

    #[tokio::test]
    async fn test_login_without_pending_view_lands_on_landing() {
        let (session, _, _) = session_with(ScriptedBackend::with_user(sample_user()));
        session.navigate(View::Signup);

        session.login("asha@example.com", "secret").await;

        assert_eq!(session.current_view(), View::Landing);
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let backend = ScriptedBackend::with_user(sample_user());
        backend.push_report(Duration::ZERO, sample_report(10.0));
        let (session, _, store) = session_with(backend);
        session.login("asha@example.com", "secret").await;
        session.run_analysis("warehouse").await;
        session.set_current_conversation(Some("c-1".to_string()));

        session.logout().await;
        session.logout().await;

        let state = session.snapshot();
        assert!(state.user.is_none());
        assert!(state.report.is_none());
        assert_eq!(state.conversation, ConversationState::default());
        assert!(store.get_item(USER_KEY).await.unwrap().is_none());
        assert!(store.get_item(REPORT_KEY).await.unwrap().is_none());
        assert_eq!(session.current_view(), View::Landing);
    }

    #[tokio::test]
    async fn test_logout_clears_user_even_when_report_removal_fails() {
        let backend = Arc::new(ScriptedBackend::with_user(sample_user()));
        let store = Arc::new(FaultyStore::failing_remove(REPORT_KEY));
        let session = ProcurementSession::new(backend.clone(), store.clone());
        session.login("asha@example.com", "secret").await;

        session.logout().await;

        assert!(session.user().is_none());
        assert!(store.load_user().await.unwrap().is_none());
        let reloaded = ProcurementSession::restore(backend, store).await;
        assert_eq!(reloaded.phase(), SessionPhase::Anonymous);
    }

    #[tokio::test]
    async fn test_register_success_goes_to_login_without_signing_in() {
        let (session, _, store) = session_with(ScriptedBackend::with_user(sample_user()));

        let outcome = session.register(&registration("new@example.com")).await;

        assert_eq!(outcome, AuthOutcome::registered());
        assert_eq!(serde_json::to_value(&outcome).unwrap(), serde_json::json!({ "success": true }));
        assert!(session.user().is_none());
        assert!(store.load_user().await.unwrap().is_none());
        assert_eq!(session.current_view(), View::Login);
        assert_eq!(session.phase(), SessionPhase::Anonymous);
    }

    #[tokio::test]
    async fn test_register_conflict_returns_server_message() {
        let (session, _, _) = session_with(ScriptedBackend::default());

        let outcome = session.register(&registration("taken@example.com")).await;

        assert_eq!(outcome, AuthOutcome::failed("Email already registered"));
        assert!(session.user().is_none());
        assert_eq!(session.current_view(), View::Landing);
    }

    #[tokio::test]
    async fn test_register_requires_name_email_and_password() {
        let (session, backend, _) = session_with(ScriptedBackend::default());
        let mut request = registration("new@example.com");
        request.name = "   ".to_string();

        let outcome = session.register(&request).await;

        assert_eq!(outcome, AuthOutcome::failed("Name, email and password are required"));
        assert_eq!(backend.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_conversation_messages_pass_through() {
        let (session, _, _) = session_with(ScriptedBackend::with_user(sample_user()));
        session.login("asha@example.com", "secret").await;
        let created = session.start_conversation("Warehouse").await.unwrap();

        session
            .post_message(&created.id, Sender::User, "200000 sqft warehouse")
            .await
            .unwrap();
        let messages = session.conversation_messages(&created.id).await.unwrap();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender, Sender::User);
        assert!(session.conversation_messages("c-missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_response_arriving_after_logout_is_dropped() {
        let backend = ScriptedBackend::with_user(sample_user());
        backend.push_report(Duration::from_millis(200), sample_report(10.0));
        let (session, _, store) = session_with(backend);
        session.login("asha@example.com", "secret").await;

        let pending = {
            let session = session.clone();
            tokio::spawn(async move { session.run_analysis("warehouse").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        session.logout().await;

        assert_eq!(pending.await.unwrap(), AnalysisOutcome::Superseded);
        assert!(session.report().is_none());
        assert!(store.load_report().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_restore_drops_corrupt_report() {
        let store = Arc::new(InMemorySessionStore::new());
        store.save_user(&sample_user()).await.unwrap();
        store.set_item(REPORT_KEY, "{\"broken\":".to_string()).await.unwrap();
        let backend = Arc::new(ScriptedBackend::default());

        let session = ProcurementSession::restore(backend.clone(), store.clone()).await;

        assert_eq!(session.phase(), SessionPhase::AuthenticatedNoReport);
        assert!(store.get_item(REPORT_KEY).await.unwrap().is_none());
        assert_eq!(backend.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_start_conversation_becomes_current() {
        let (session, backend, _) = session_with(ScriptedBackend::with_user(sample_user()));
        assert!(session.start_conversation("Warehouse").await.is_err());

        session.login("asha@example.com", "secret").await;
        let created = session.start_conversation("Warehouse").await.unwrap();

        assert_eq!(session.current_conversation_id(), Some(created.id.clone()));
        assert_eq!(session.conversations()[0].title, "Warehouse");

        let refreshed = session.refresh_conversations().await.unwrap();
        assert_eq!(refreshed.len(), backend.conversation_count());
    }
}
