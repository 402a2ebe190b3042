pub mod api;
pub mod assistant;
pub mod classifier;
pub mod config;
pub mod error;
pub mod guard;
pub mod models;
pub mod session;
pub mod store;
pub mod telemetry;
pub mod view;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use api::{HttpBackend, ProcurementBackend};
pub use assistant::{ChatAssistant, ChatTurn};
pub use classifier::{KeywordClassifier, MessageClassifier, MessageIntent};
pub use config::{ClientConfig, LogFormat, StoreConfig};
pub use error::{ProcureError, Result};
pub use guard::{GuardDecision, RouteGuard, View};
pub use models::*;
pub use session::{AnalysisOutcome, ConversationState, ProcurementSession, SessionPhase, SessionState};
#[cfg(feature = "postgres")]
pub use store::PostgresSessionStore;
pub use store::{FileSessionStore, InMemorySessionStore, SessionStore, SessionStoreExt};
