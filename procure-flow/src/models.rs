use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Structured result of analysing a procurement query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcurementReport {
    pub project_details: ProjectDetails,
    pub budget_breakdown: BudgetBreakdown,
    #[serde(default)]
    pub material_requirements: Vec<MaterialRequirement>,
    /// Vendors keyed by material name
    #[serde(default)]
    pub vendor_recommendations: BTreeMap<String, Vec<Vendor>>,
    #[serde(default)]
    pub project_schedule: ProjectSchedule,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDetails {
    #[serde(default)]
    pub built_area: f64,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub project_type: String,
    /// Megawatts, for power-bound projects such as data centers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_capacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_volume: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetBreakdown {
    #[serde(default)]
    pub material_cost: f64,
    #[serde(default)]
    pub labor_cost: f64,
    #[serde(default)]
    pub equipment_cost: f64,
    #[serde(default)]
    pub overhead_cost: f64,
    #[serde(default)]
    pub profit: f64,
    pub total_cost: f64,
    #[serde(default)]
    pub cost_per_sqft: f64,
    /// Backend-computed shares; not guaranteed to sum to 100
    #[serde(default)]
    pub percentage_breakdown: PercentageBreakdown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PercentageBreakdown {
    #[serde(default)]
    pub material: f64,
    #[serde(default)]
    pub labor: f64,
    #[serde(default)]
    pub equipment: f64,
    #[serde(default)]
    pub overhead: f64,
    #[serde(default)]
    pub profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRequirement {
    #[serde(alias = "material")]
    pub name: String,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub unit_cost: f64,
    #[serde(default)]
    pub total_cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    #[serde(alias = "vendor_name")]
    pub name: String,
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSchedule {
    #[serde(default)]
    pub phases: Vec<SchedulePhase>,
    /// Days
    #[serde(default)]
    pub total_duration: u32,
    #[serde(default)]
    pub total_months: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulePhase {
    pub id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Days
    #[serde(default)]
    pub duration: u32,
    /// Completion, 0 to 100
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub documents_loaded: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VendorSearchRequest {
    pub material: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VendorSearchResponse {
    #[serde(default)]
    pub vendors: Vec<Vendor>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: UserIdentity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub company: String,
    pub project_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateConversationRequest {
    pub user_id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedConversation {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostMessageRequest {
    pub sender: Sender,
    pub text: String,
}

/// Body shape the backend uses for failures
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Result of a login or registration attempt, shaped the way views consume it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserIdentity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthOutcome {
    pub fn authenticated(user: UserIdentity) -> Self {
        Self {
            success: true,
            user: Some(user),
            error: None,
        }
    }

    pub fn registered() -> Self {
        Self {
            success: true,
            user: None,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            user: None,
            error: Some(error.into()),
        }
    }
}
