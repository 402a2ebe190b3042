use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::{
    api::ProcurementBackend,
    error::{ProcureError, Result},
    models::*,
    store::{InMemorySessionStore, SessionStore},
};

pub fn sample_user() -> UserIdentity {
    UserIdentity {
        id: "u-42".to_string(),
        name: "Asha Rao".to_string(),
        email: "asha@example.com".to_string(),
        company: Some("Rao Infra".to_string()),
        project_type: Some("data_center".to_string()),
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn vendor(name: &str, product: &str) -> Vendor {
    Vendor {
        name: name.to_string(),
        product: product.to_string(),
        location: "Navi Mumbai".to_string(),
        rating: Some(4.2),
        contact: Some("+91 22 5555 0101".to_string()),
        source_url: None,
    }
}

pub fn sample_report(total_cost: f64) -> ProcurementReport {
    let mut vendors = BTreeMap::new();
    vendors.insert(
        "Cement".to_string(),
        vec![vendor("UltraTech", "OPC 53"), vendor("ACC", "PPC")],
    );
    vendors.insert("TMT Steel".to_string(), vec![vendor("JSW", "Fe 500D")]);

    ProcurementReport {
        project_details: ProjectDetails {
            built_area: 200_000.0,
            location: "Mumbai".to_string(),
            project_type: "data_center".to_string(),
            power_capacity: Some(25.0),
            project_volume: None,
        },
        budget_breakdown: BudgetBreakdown {
            material_cost: total_cost * 0.55,
            labor_cost: total_cost * 0.2,
            equipment_cost: total_cost * 0.1,
            overhead_cost: total_cost * 0.08,
            profit: total_cost * 0.07,
            total_cost,
            cost_per_sqft: total_cost / 200_000.0,
            percentage_breakdown: PercentageBreakdown {
                material: 55.0,
                labor: 20.0,
                equipment: 10.0,
                overhead: 8.0,
                profit: 7.0,
            },
        },
        material_requirements: vec![
            MaterialRequirement {
                name: "TMT Steel".to_string(),
                quantity: 500.0,
                unit: "tons".to_string(),
                unit_cost: 60_000.0,
                total_cost: 30_000_000.0,
                priority: Some("high".to_string()),
                vendor_count: Some(1),
            },
            MaterialRequirement {
                name: "Cement".to_string(),
                quantity: 80_000.0,
                unit: "bags".to_string(),
                unit_cost: 125.0,
                total_cost: 10_000_000.0,
                priority: None,
                vendor_count: Some(2),
            },
            MaterialRequirement {
                name: "Copper Cable".to_string(),
                quantity: 12.0,
                unit: "km".to_string(),
                unit_cost: 0.0,
                total_cost: 0.0,
                priority: None,
                vendor_count: None,
            },
        ],
        vendor_recommendations: vendors,
        project_schedule: ProjectSchedule {
            phases: vec![
                SchedulePhase {
                    id: "1".to_string(),
                    name: "Site preparation".to_string(),
                    start_date: date(2026, 1, 1),
                    end_date: date(2026, 1, 31),
                    duration: 30,
                    progress: 100.0,
                    color: "#4f46e5".to_string(),
                    dependencies: vec![],
                },
                SchedulePhase {
                    id: "2".to_string(),
                    name: "Foundation".to_string(),
                    start_date: date(2026, 1, 31),
                    end_date: date(2026, 4, 1),
                    duration: 60,
                    progress: 40.0,
                    color: "#059669".to_string(),
                    dependencies: vec!["1".to_string()],
                },
            ],
            total_duration: 90,
            total_months: 3,
        },
    }
}

enum AnalyzeStep {
    Report(Duration, ProcurementReport),
    Failure(Duration, String),
    Panic,
}

/// In-process backend with canned answers
#[derive(Default)]
pub struct ScriptedBackend {
    analyses: Mutex<VecDeque<AnalyzeStep>>,
    user: Option<UserIdentity>,
    conversations: Mutex<Vec<ConversationSummary>>,
    messages: Mutex<Vec<(String, Sender, String)>>,
    analyze_calls: AtomicUsize,
    total_calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn with_user(user: UserIdentity) -> Self {
        Self {
            user: Some(user),
            ..Self::default()
        }
    }

    pub fn push_report(&self, delay: Duration, report: ProcurementReport) {
        self.analyses.lock().unwrap().push_back(AnalyzeStep::Report(delay, report));
    }

    pub fn push_failure(&self, delay: Duration, message: &str) {
        self.analyses
            .lock()
            .unwrap()
            .push_back(AnalyzeStep::Failure(delay, message.to_string()));
    }

    pub fn push_panic(&self) {
        self.analyses.lock().unwrap().push_back(AnalyzeStep::Panic);
    }

    pub fn analyze_calls(&self) -> usize {
        self.analyze_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }

    pub fn conversation_count(&self) -> usize {
        self.conversations.lock().unwrap().len()
    }

    pub fn messages(&self) -> Vec<(String, Sender, String)> {
        self.messages.lock().unwrap().clone()
    }

    fn touch(&self) {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProcurementBackend for ScriptedBackend {
    async fn analyze(&self, _query: &str) -> Result<ProcurementReport> {
        self.touch();
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        let step = self.analyses.lock().unwrap().pop_front();
        match step {
            Some(AnalyzeStep::Report(delay, report)) => {
                tokio::time::sleep(delay).await;
                Ok(report)
            }
            Some(AnalyzeStep::Failure(delay, message)) => {
                tokio::time::sleep(delay).await;
                Err(ProcureError::Transport(message))
            }
            Some(AnalyzeStep::Panic) => panic!("scripted backend panic"),
            None => Err(ProcureError::Api {
                status: 500,
                message: "no scripted analysis".to_string(),
            }),
        }
    }

    async fn search_vendors(&self, material: &str, _location: Option<&str>) -> Result<Vec<Vendor>> {
        self.touch();
        Ok(vec![vendor("Scripted Supplies", material)])
    }

    async fn health(&self) -> Result<HealthStatus> {
        self.touch();
        Ok(HealthStatus {
            status: "ok".to_string(),
            documents_loaded: 3,
        })
    }

    async fn login(&self, _email: &str, _password: &str) -> Result<UserIdentity> {
        self.touch();
        self.user.clone().ok_or_else(|| ProcureError::Api {
            status: 401,
            message: "Invalid credentials".to_string(),
        })
    }

    async fn register(&self, request: &RegisterRequest) -> Result<()> {
        self.touch();
        if request.email == "taken@example.com" {
            return Err(ProcureError::Api {
                status: 409,
                message: "Email already registered".to_string(),
            });
        }
        Ok(())
    }

    async fn list_conversations(&self, _user_id: &str) -> Result<Vec<ConversationSummary>> {
        self.touch();
        Ok(self.conversations.lock().unwrap().clone())
    }

    async fn create_conversation(&self, _user_id: &str, title: &str) -> Result<CreatedConversation> {
        self.touch();
        let mut conversations = self.conversations.lock().unwrap();
        let id = format!("c-{}", conversations.len() + 1);
        conversations.insert(
            0,
            ConversationSummary {
                id: id.clone(),
                title: title.to_string(),
                created_at: Utc::now(),
            },
        );
        Ok(CreatedConversation {
            id,
            title: title.to_string(),
        })
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<ChatMessage>> {
        self.touch();
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _, _)| id == conversation_id)
            .map(|(_, sender, text)| ChatMessage {
                sender: *sender,
                text: text.clone(),
                timestamp: Utc::now(),
            })
            .collect())
    }

    async fn post_message(&self, conversation_id: &str, sender: Sender, text: &str) -> Result<()> {
        self.touch();
        self.messages
            .lock()
            .unwrap()
            .push((conversation_id.to_string(), sender, text.to_string()));
        Ok(())
    }
}

/// In-memory store with a slow write or a failing removal on chosen keys
#[derive(Default)]
pub struct FaultyStore {
    inner: InMemorySessionStore,
    slow_set: Option<(&'static str, Duration)>,
    failing_remove: Option<&'static str>,
}

impl FaultyStore {
    pub fn slow_set(key: &'static str, delay: Duration) -> Self {
        Self {
            slow_set: Some((key, delay)),
            ..Self::default()
        }
    }

    pub fn failing_remove(key: &'static str) -> Self {
        Self {
            failing_remove: Some(key),
            ..Self::default()
        }
    }
}

#[async_trait]
impl SessionStore for FaultyStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.inner.get_item(key).await
    }

    async fn set_item(&self, key: &str, value: String) -> Result<()> {
        if let Some((slow_key, delay)) = self.slow_set
            && slow_key == key
        {
            tokio::time::sleep(delay).await;
        }
        self.inner.set_item(key, value).await
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        if self.failing_remove == Some(key) {
            return Err(ProcureError::Storage("disk busy".to_string()));
        }
        self.inner.remove_item(key).await
    }
}
