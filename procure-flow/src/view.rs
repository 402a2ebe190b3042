//! Shapes report data for dashboards: currency strings, budget rows, vendor
//! groups, material cost shares and Gantt bar geometry.
//!
//! Nothing here fails. Missing data comes back as empty collections so views can
//! render an explicit "no data" state.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{BudgetBreakdown, ProcurementReport, ProjectSchedule, Vendor};

const CRORE: f64 = 10_000_000.0;
const LAKH: f64 = 100_000.0;

/// Formats rupees the way the dashboards show them: crores, lakhs, or grouped digits
pub fn format_inr(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let abs = amount.abs();

    if abs >= CRORE {
        format!("{sign}₹{:.2} Cr", abs / CRORE)
    } else if abs >= LAKH {
        format!("{sign}₹{:.2} L", abs / LAKH)
    } else {
        format!("{sign}₹{}", group_indian(abs.round() as u64))
    }
}

/// `1234567` -> `12,34,567`
fn group_indian(value: u64) -> String {
    let digits = value.to_string();
    if digits.len() <= 3 {
        return digits;
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{}", groups.join(","), tail)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetRow {
    pub label: &'static str,
    pub amount: f64,
    pub formatted: String,
    /// As reported by the backend
    pub percentage: f64,
}

pub fn budget_rows(breakdown: &BudgetBreakdown) -> Vec<BudgetRow> {
    let shares = &breakdown.percentage_breakdown;
    [
        ("Material", breakdown.material_cost, shares.material),
        ("Labor", breakdown.labor_cost, shares.labor),
        ("Equipment", breakdown.equipment_cost, shares.equipment),
        ("Overhead", breakdown.overhead_cost, shares.overhead),
        ("Profit", breakdown.profit, shares.profit),
    ]
    .into_iter()
    .map(|(label, amount, percentage)| BudgetRow {
        label,
        amount,
        formatted: format_inr(amount),
        percentage,
    })
    .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialVendors<'a> {
    pub material: &'a str,
    pub vendors: &'a [Vendor],
}

impl MaterialVendors<'_> {
    pub fn is_empty(&self) -> bool {
        self.vendors.is_empty()
    }
}

/// Vendors for one material; exact key first, then a case-insensitive match
pub fn vendors_for<'a>(report: &'a ProcurementReport, material: &str) -> &'a [Vendor] {
    if let Some(vendors) = report.vendor_recommendations.get(material) {
        return vendors;
    }
    report
        .vendor_recommendations
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(material))
        .map(|(_, vendors)| vendors.as_slice())
        .unwrap_or(&[])
}

/// Vendor groups in material-requirement order, followed by vendor keys no requirement names
pub fn vendors_by_material(report: &ProcurementReport) -> Vec<MaterialVendors<'_>> {
    let mut groups: Vec<MaterialVendors<'_>> = Vec::new();

    for requirement in &report.material_requirements {
        if groups.iter().any(|g| g.material.eq_ignore_ascii_case(&requirement.name)) {
            continue;
        }
        groups.push(MaterialVendors {
            material: requirement.name.as_str(),
            vendors: vendors_for(report, &requirement.name),
        });
    }

    for (material, vendors) in &report.vendor_recommendations {
        if groups.iter().any(|g| g.material.eq_ignore_ascii_case(material)) {
            continue;
        }
        groups.push(MaterialVendors {
            material: material.as_str(),
            vendors: vendors.as_slice(),
        });
    }

    groups
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialShare {
    pub name: String,
    pub total_cost: f64,
    pub percentage: f64,
}

/// Each material's share of the summed material totals, for pie and bar charts
pub fn material_cost_shares(report: &ProcurementReport) -> Vec<MaterialShare> {
    let total: f64 = report
        .material_requirements
        .iter()
        .map(|m| m.total_cost.max(0.0))
        .sum();

    report
        .material_requirements
        .iter()
        .map(|m| MaterialShare {
            name: m.name.clone(),
            total_cost: m.total_cost,
            percentage: if total > 0.0 {
                m.total_cost.max(0.0) / total * 100.0
            } else {
                0.0
            },
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GanttBar {
    pub id: String,
    pub name: String,
    pub offset_px: f64,
    pub width_px: f64,
    pub progress: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GanttLayout {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub span_days: i64,
    pub bars: Vec<GanttBar>,
}

impl GanttLayout {
    /// Maps each phase's date range onto a track `width_px` wide
    pub fn new(schedule: &ProjectSchedule, width_px: f64) -> Self {
        let start = schedule.phases.iter().map(|p| p.start_date).min();
        let end = schedule
            .phases
            .iter()
            .map(|p| p.end_date.max(p.start_date))
            .max();

        let (Some(start), Some(end)) = (start, end) else {
            return Self {
                start: None,
                end: None,
                span_days: 0,
                bars: Vec::new(),
            };
        };

        let span_days = (end - start).num_days().max(1);
        let px_per_day = width_px / span_days as f64;

        let bars = schedule
            .phases
            .iter()
            .map(|phase| {
                let offset_days = (phase.start_date - start).num_days();
                let duration_days = (phase.end_date - phase.start_date).num_days().max(1);
                GanttBar {
                    id: phase.id.clone(),
                    name: phase.name.clone(),
                    offset_px: offset_days as f64 * px_per_day,
                    width_px: duration_days as f64 * px_per_day,
                    progress: phase.progress.clamp(0.0, 100.0),
                    color: phase.color.clone(),
                }
            })
            .collect();

        Self {
            start: Some(start),
            end: Some(end),
            span_days,
            bars,
        }
    }
}
