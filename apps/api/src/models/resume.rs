//! The dashboard resume model. Populated wholesale from one analysis
//! response and mutated in place as the user accepts suggestions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a single bullet: PENDING until the user asks for a rewrite,
/// ANALYZING while the LLM call is in flight, REVIEW once options arrive,
/// APPROVED after the user accepts one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BulletStatus {
    Pending,
    Analyzing,
    Review,
    Approved,
}

/// One AI-suggested rewrite of a bullet or summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteOption {
    pub text: String,
    pub rationale: String,
    pub label: String,
    /// The AI's top choice among the offered options.
    #[serde(default)]
    pub is_recommended: bool,
}

/// AVCR check of a bullet: Action verb, Context, Result, Metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvcrAnalysis {
    pub action_verb: ActionVerbCheck,
    pub context: ContextCheck,
    pub result: ResultCheck,
    pub metric: MetricCheck,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionVerbCheck {
    pub current: String,
    pub strength: VerbStrength,
    pub feedback: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerbStrength {
    Strong,
    Weak,
    Missing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextCheck {
    pub current: String,
    pub clarity: Clarity,
    pub feedback: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Clarity {
    Clear,
    Vague,
    Missing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultCheck {
    pub current: String,
    pub specificity: Specificity,
    pub feedback: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Specificity {
    Specific,
    Vague,
    Missing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricCheck {
    pub current: String,
    pub quantified: bool,
    pub feedback: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulletPoint {
    pub id: Uuid,
    pub original: String,
    /// The currently selected revision, once one is accepted.
    pub revised: Option<String>,
    /// Alternatives offered by the AI, once optimization has run.
    pub rewrites: Option<Vec<RewriteOption>>,
    pub analysis: Option<AvcrAnalysis>,
    pub rationale: Option<String>,
    pub status: BulletStatus,
}

impl BulletPoint {
    pub fn pending(original: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            original,
            revised: None,
            rewrites: None,
            analysis: None,
            rationale: None,
            status: BulletStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkRole {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub bullets: Vec<BulletPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeData {
    pub summary: String,
    pub roles: Vec<WorkRole>,
    pub skills: Vec<String>,
    /// 1-10, fractional. Accepting a rewrite bumps it by 0.5, capped at 10.
    pub health_score: f64,
    pub red_flags: Vec<String>,
    pub top_priorities: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryOptimization {
    pub rewrites: Vec<RewriteOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillCategory {
    pub category: String,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillsOptimization {
    pub categorized: Vec<SkillCategory>,
    pub missing_critical: Vec<String>,
    pub recommendations: Vec<String>,
}
