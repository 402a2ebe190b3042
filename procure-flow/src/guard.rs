use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ProcureError;

/// Routed views of the application
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum View {
    Landing,
    Login,
    Signup,
    Budget,
    Schedule,
    Materials,
    /// Vendors for one material
    VendorDetail(String),
}

impl View {
    /// Views that require an authenticated user
    pub fn is_protected(&self) -> bool {
        !matches!(self, View::Landing | View::Login | View::Signup)
    }

    pub fn path(&self) -> String {
        match self {
            View::Landing => "/".to_string(),
            View::Login => "/login".to_string(),
            View::Signup => "/signup".to_string(),
            View::Budget => "/budget".to_string(),
            View::Schedule => "/schedule".to_string(),
            View::Materials => "/materials".to_string(),
            View::VendorDetail(material) => format!("/vendors/{material}"),
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl FromStr for View {
    type Err = ProcureError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let trimmed = path.trim();
        let view = match trimmed.trim_end_matches('/') {
            "" => View::Landing,
            "/login" => View::Login,
            "/signup" => View::Signup,
            "/budget" => View::Budget,
            "/schedule" => View::Schedule,
            "/materials" => View::Materials,
            other => match other.strip_prefix("/vendors/") {
                Some(material) if !material.is_empty() => View::VendorDetail(material.to_string()),
                _ => {
                    return Err(ProcureError::Validation(format!("unknown view path: {trimmed}")));
                }
            },
        };
        Ok(view)
    }
}

/// Outcome of trying to enter a view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow(View),
    /// Send the user to login; `from` is resumed after a successful login
    RedirectToLogin { from: View },
}

/// Redirects anonymous users away from protected views and remembers where they were going
#[derive(Debug, Default)]
pub struct RouteGuard {
    pending: Option<View>,
}

impl RouteGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, target: View, authenticated: bool) -> GuardDecision {
        if target.is_protected() && !authenticated {
            self.pending = Some(target.clone());
            return GuardDecision::RedirectToLogin { from: target };
        }
        GuardDecision::Allow(target)
    }

    pub fn pending(&self) -> Option<&View> {
        self.pending.as_ref()
    }

    /// Where to go after login: the remembered view, or the landing view
    pub fn resume(&mut self) -> View {
        self.pending.take().unwrap_or(View::Landing)
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }
}
