use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::{SectionId, SectionWeights, Severity};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionAnalysis {
    pub section: SectionId,
    pub present: bool,
    pub section_score: f64,
    pub coverage: f64,
    pub severity: Severity,
    pub findings: String,
    pub recommendations: String,
    pub evidence_snippet: String,
    /// Comma-joined subclause labels; see [`parse_missing_subclauses`].
    pub missing_subclauses: String,
    pub page_number: Option<u32>,
    pub section_weight: u32,
}

impl SectionAnalysis {
    pub fn missing_subclause_list(&self) -> Vec<String> {
        parse_missing_subclauses(&self.missing_subclauses)
    }
}

pub fn join_missing_subclauses(labels: &[&str]) -> String {
    labels.join(", ")
}

pub fn parse_missing_subclauses(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceScore {
    /// Stable identity across re-evaluations.
    pub score_id: String,
    pub document_id: String,
    /// Bumped on every re-evaluation; section rows are keyed by it.
    pub generation: i64,
    pub overall_score: f64,
    pub structure_score: f64,
    pub completeness_score: f64,
    pub sections_found: u32,
    pub total_sections_required: u32,
    pub compliant: bool,
    pub summary: String,
    pub weighting: String,
    pub section_analyses: Vec<SectionAnalysis>,
    pub evaluated_at: DateTime<Utc>,
    pub professor_override: Option<f64>,
    pub professor_notes: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub override_stale: bool,
}

impl ComplianceScore {
    pub fn effective_score(&self) -> f64 {
        self.professor_override.unwrap_or(self.overall_score)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistorySource {
    AiEvaluation,
    ReEvaluation,
    Override,
}

impl HistorySource {
    pub fn as_str(self) -> &'static str {
        match self {
            HistorySource::AiEvaluation => "AI_EVALUATION",
            HistorySource::ReEvaluation => "RE_EVALUATION",
            HistorySource::Override => "OVERRIDE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "AI_EVALUATION" => Some(HistorySource::AiEvaluation),
            "RE_EVALUATION" => Some(HistorySource::ReEvaluation),
            "OVERRIDE" => Some(HistorySource::Override),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceScoreHistory {
    pub history_id: i64,
    pub document_id: String,
    pub score_id: String,
    pub version_number: i64,
    pub source: HistorySource,
    pub overall_score: f64,
    pub structure_score: f64,
    pub completeness_score: f64,
    pub sections_found: u32,
    pub total_sections_required: u32,
    pub compliant: bool,
    pub summary: String,
    pub professor_override: Option<f64>,
    pub professor_notes: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub recorded_by_user_id: String,
    pub recorded_at: DateTime<Utc>,
    pub evaluated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingCriteria {
    pub id: i64,
    pub owner_id: String,
    pub name: String,
    pub description: String,
    pub active: bool,
    #[serde(flatten)]
    pub weights: SectionWeights,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied fields for creating or updating a grading profile.
#[derive(Debug, Clone, PartialEq)]
pub struct GradingCriteriaDraft {
    pub name: String,
    pub description: String,
    pub active: bool,
    pub weights: SectionWeights,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub document_id: String,
    pub filename: String,
    pub sha256: String,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionReport {
    pub section_name: String,
    pub present: bool,
    pub section_score: f64,
    pub findings: String,
    pub recommendations: String,
    pub page_number: Option<u32>,
    pub coverage: f64,
    pub severity: Severity,
    pub evidence_snippet: String,
    pub missing_subclauses: Vec<String>,
    pub section_weight: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComplianceReport {
    pub document_id: String,
    pub document_name: String,
    pub overall_score: f64,
    pub structure_score: f64,
    pub completeness_score: f64,
    pub sections_found: u32,
    pub total_sections_required: u32,
    pub compliant: bool,
    pub summary: String,
    pub section_analyses: Vec<SectionReport>,
    pub evaluated_at: DateTime<Utc>,
    pub professor_override: Option<f64>,
    pub professor_notes: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_by_name: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub override_stale: bool,
    pub effective_score: f64,
    pub weighting: String,
}
