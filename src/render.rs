//! Pure view-model construction.
//!
//! Everything here turns backend data into exactly what the result panels
//! show, so it can be checked without a terminal.

use crate::api::AnalysisResult;

pub const SUMMARY_PLACEHOLDER: &str = "Your summary will appear here...";
pub const CONFIDENCE_PLACEHOLDER: &str = "Confidence: --";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 70.0 {
            ConfidenceLevel::High
        } else if score >= 50.0 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

/// Rendered contents of the result cards.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisView {
    pub title: String,
    pub summary: String,
    pub key_points: Vec<String>,
    pub decisions: Vec<String>,
    pub action_items: Vec<String>,
    pub confidence_text: String,
    pub confidence_level: ConfidenceLevel,
}

pub fn analysis_view(result: &AnalysisResult) -> AnalysisView {
    AnalysisView {
        title: result.meeting_title.clone(),
        summary: result.summary.clone(),
        key_points: result.key_points.clone(),
        decisions: result.decisions.clone(),
        action_items: result.action_items.clone(),
        confidence_text: confidence_text(result.confidence),
        confidence_level: ConfidenceLevel::from_score(result.confidence),
    }
}

/// `Confidence: {n}%`, with no decimals for whole numbers.
pub fn confidence_text(score: f64) -> String {
    format!("Confidence: {}%", format_score(score))
}

fn format_score(score: f64) -> String {
    if score.fract() == 0.0 && score.is_finite() {
        format!("{}", score as i64)
    } else {
        format!("{}", score)
    }
}

/// Text written by "copy summary" and "download as text".
pub fn summary_text(view: Option<&AnalysisView>) -> String {
    view.map(|v| v.summary.clone()).unwrap_or_default()
}
