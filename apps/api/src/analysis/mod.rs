//! Resume analysis operations — the LLM-backed core of the service.
//!
//! Flow per operation: build prompt → LLM call with schema constraint →
//! parse JSON reply → convert into the dashboard model.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::agent::AgentPersona;
use crate::errors::AppError;
use crate::filters::{style_instruction, OptimizationFilter};
use crate::llm::{LlmClient, LlmError};
use crate::models::{
    AvcrAnalysis, BulletPoint, ResumeData, RewriteOption, SkillsOptimization, SummaryOptimization,
    WorkRole,
};

pub mod prompts;

// ────────────────────────────────────────────────────────────────────────────
// Payloads
// ────────────────────────────────────────────────────────────────────────────

/// Raw analysis reply as the model returns it. Lenient on purpose: missing
/// fields get documented defaults rather than failing the whole analysis.
#[derive(Debug, Deserialize)]
struct AnalysisPayload {
    #[serde(default)]
    health_score: Option<f64>,
    #[serde(default)]
    red_flags: Vec<String>,
    #[serde(default)]
    top_priorities: Vec<String>,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    roles: Vec<RolePayload>,
    #[serde(default)]
    skills: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RolePayload {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    company: Option<String>,
    #[serde(default)]
    bullets: Vec<String>,
}

impl AnalysisPayload {
    fn into_resume_data(self) -> ResumeData {
        ResumeData {
            summary: self.summary,
            skills: self.skills,
            health_score: self.health_score.unwrap_or(5.0),
            red_flags: self.red_flags,
            top_priorities: self.top_priorities,
            roles: self
                .roles
                .into_iter()
                .map(|role| WorkRole {
                    id: Uuid::new_v4(),
                    title: role.title.unwrap_or_else(|| "Untitled Role".to_string()),
                    company: role.company.unwrap_or_else(|| "Unknown Company".to_string()),
                    bullets: role.bullets.into_iter().map(BulletPoint::pending).collect(),
                })
                .collect(),
        }
    }
}

/// Reply of a bullet optimization call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulletOptimization {
    #[serde(default)]
    pub avcr_analysis: Option<AvcrAnalysis>,
    pub rewrites: Vec<RewriteOption>,
    /// Some models emit a top-level rationale; the first rewrite's rationale
    /// serves as the fallback when applying the result.
    #[serde(default)]
    pub rationale: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Operations
// ────────────────────────────────────────────────────────────────────────────

/// Runs the full-resume analysis and builds the dashboard model.
/// All bullets start out PENDING.
pub async fn analyze_resume(
    llm: &LlmClient,
    persona: AgentPersona,
    resume_text: &str,
) -> Result<ResumeData, AppError> {
    let prompt = build_analysis_prompt(resume_text);
    let payload: AnalysisPayload = llm
        .call_json(persona.profile(), &prompt, prompts::ANALYSIS_SCHEMA)
        .await
        .map_err(|e| map_llm_error("Resume analysis", e))?;

    let resume = payload.into_resume_data();
    info!(
        "Analysis complete: health_score={}, {} roles, {} red flags",
        resume.health_score,
        resume.roles.len(),
        resume.red_flags.len()
    );
    Ok(resume)
}

/// Analyzes and rewrites a single bullet in its role context, steered by the
/// active refinement filters.
pub async fn optimize_bullet(
    llm: &LlmClient,
    persona: AgentPersona,
    bullet: &str,
    role_context: &str,
    filters: &[OptimizationFilter],
) -> Result<BulletOptimization, AppError> {
    let prompt = build_bullet_prompt(bullet, role_context, filters);
    llm.call_json(persona.profile(), &prompt, prompts::OPTIMIZATION_SCHEMA)
        .await
        .map_err(|e| map_llm_error("Bullet optimization", e))
}

/// Produces three summary narratives: standard PM template, executive, growth.
pub async fn optimize_summary(
    llm: &LlmClient,
    persona: AgentPersona,
    current_summary: &str,
    resume_context: &str,
) -> Result<SummaryOptimization, AppError> {
    let prompt = build_summary_prompt(current_summary, resume_context);
    llm.call_json(persona.profile(), &prompt, prompts::SUMMARY_SCHEMA)
        .await
        .map_err(|e| map_llm_error("Summary optimization", e))
}

/// Categorizes the skill list and flags gaps for a product-manager profile.
pub async fn optimize_skills(
    llm: &LlmClient,
    persona: AgentPersona,
    skills: &[String],
) -> Result<SkillsOptimization, AppError> {
    let skills_json = serde_json::to_string(skills)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize skills: {e}")))?;
    let prompt = prompts::SKILLS_PROMPT_TEMPLATE.replace("{skills_json}", &skills_json);
    llm.call_json(persona.profile(), &prompt, prompts::SKILLS_SCHEMA)
        .await
        .map_err(|e| map_llm_error("Skills analysis", e))
}

/// Free-form chat in the active persona's voice.
pub async fn chat(
    llm: &LlmClient,
    persona: AgentPersona,
    message: &str,
) -> Result<String, AppError> {
    llm.call_text(persona.profile(), message)
        .await
        .map_err(|e| map_llm_error("Chat", e))
}

// ────────────────────────────────────────────────────────────────────────────
// Prompt builders
// ────────────────────────────────────────────────────────────────────────────

fn build_analysis_prompt(resume_text: &str) -> String {
    prompts::ANALYSIS_PROMPT_TEMPLATE
        .replace("{current_date}", &Utc::now().format("%B %Y").to_string())
        .replace("{resume_text}", resume_text)
}

fn build_bullet_prompt(bullet: &str, role_context: &str, filters: &[OptimizationFilter]) -> String {
    prompts::BULLET_PROMPT_TEMPLATE
        .replace("{role_context}", role_context)
        .replace("{bullet}", bullet)
        .replace("{style_instruction}", &style_instruction(filters))
}

fn build_summary_prompt(current_summary: &str, resume_context: &str) -> String {
    prompts::SUMMARY_PROMPT_TEMPLATE
        .replace("{current_summary}", current_summary)
        .replace("{resume_context}", resume_context)
        .replace("{summary_template}", prompts::PM_SUMMARY_TEMPLATE)
}

/// Maps transport-layer failures to the user-facing hints surfaced by the
/// dashboard.
fn map_llm_error(operation: &str, e: LlmError) -> AppError {
    let message = match &e {
        LlmError::Api {
            status: 401 | 403, ..
        } => format!("{operation} failed: API key rejected by the provider"),
        LlmError::Api { status: 404, .. } => format!(
            "{operation} failed: AI model not found; the selected model might be unavailable"
        ),
        LlmError::Api { status: 503, .. } => format!(
            "{operation} failed: service temporarily unavailable, please try again in a moment"
        ),
        LlmError::Parse(_) => format!("{operation} failed: AI returned invalid JSON"),
        _ => format!("{operation} failed: {e}"),
    };
    AppError::Llm(message)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BulletStatus;

    #[test]
    fn test_analysis_payload_full_conversion() {
        let json = r#"{
            "health_score": 7.5,
            "red_flags": ["Two gaps longer than a year"],
            "top_priorities": ["Quantify outcomes in the last role"],
            "summary": "Product leader with 8 years of experience.",
            "roles": [
                {
                    "title": "Senior PM",
                    "company": "Acme",
                    "bullets": ["Launched checkout v2", "Cut churn by 12%"]
                }
            ],
            "skills": ["SQL", "Roadmapping"]
        }"#;
        let payload: AnalysisPayload = serde_json::from_str(json).unwrap();
        let resume = payload.into_resume_data();

        assert_eq!(resume.health_score, 7.5);
        assert_eq!(resume.roles.len(), 1);
        assert_eq!(resume.roles[0].bullets.len(), 2);
        assert!(resume
            .roles[0]
            .bullets
            .iter()
            .all(|b| b.status == BulletStatus::Pending));
        assert_eq!(resume.skills, vec!["SQL", "Roadmapping"]);
    }

    #[test]
    fn test_analysis_payload_defaults_applied() {
        // Sparse reply: no score, role missing title and company
        let json = r#"{
            "summary": "",
            "roles": [{"bullets": ["Did things"]}]
        }"#;
        let payload: AnalysisPayload = serde_json::from_str(json).unwrap();
        let resume = payload.into_resume_data();

        assert_eq!(resume.health_score, 5.0);
        assert_eq!(resume.roles[0].title, "Untitled Role");
        assert_eq!(resume.roles[0].company, "Unknown Company");
        assert!(resume.red_flags.is_empty());
    }

    #[test]
    fn test_bullet_optimization_tolerates_missing_avcr() {
        let json = r#"{
            "rewrites": [
                {"text": "Drove 12% churn reduction", "rationale": "Leads with impact", "label": "High Impact", "is_recommended": true}
            ]
        }"#;
        let opt: BulletOptimization = serde_json::from_str(json).unwrap();
        assert!(opt.avcr_analysis.is_none());
        assert!(opt.rationale.is_none());
        assert_eq!(opt.rewrites.len(), 1);
        assert!(opt.rewrites[0].is_recommended);
    }

    #[test]
    fn test_analysis_prompt_embeds_resume_text() {
        let prompt = build_analysis_prompt("John Doe, Product Manager");
        assert!(prompt.contains("John Doe, Product Manager"));
        assert!(prompt.contains("health score (1-10)"));
        assert!(!prompt.contains("{resume_text}"));
        assert!(!prompt.contains("{current_date}"));
    }

    #[test]
    fn test_bullet_prompt_embeds_context_and_default_instruction() {
        let prompt = build_bullet_prompt("Helped the team ship", "Senior PM at Acme", &[]);
        assert!(prompt.contains("Senior PM at Acme"));
        assert!(prompt.contains("\"Helped the team ship\""));
        assert!(prompt.contains("Concise (1-Liner)"));
    }

    #[test]
    fn test_bullet_prompt_uses_filter_labels() {
        let prompt = build_bullet_prompt(
            "Helped the team ship",
            "Senior PM at Acme",
            &[OptimizationFilter::MaximizeMetrics],
        );
        assert!(prompt.contains("Strictly follow these filters: [Maximize Metrics]"));
    }

    #[test]
    fn test_summary_prompt_embeds_template() {
        let prompt = build_summary_prompt("Old summary", "Full resume text");
        assert!(prompt.contains("\"Old summary\""));
        assert!(prompt.contains("Full resume text"));
        assert!(prompt.contains("Experienced X [field] PM"));
    }

    #[test]
    fn test_map_llm_error_hints() {
        let err = map_llm_error(
            "Resume analysis",
            LlmError::Api {
                status: 404,
                message: "no model".to_string(),
            },
        );
        assert!(err.to_string().contains("model not found"));

        let err = map_llm_error(
            "Chat",
            LlmError::Api {
                status: 503,
                message: String::new(),
            },
        );
        assert!(err.to_string().contains("temporarily unavailable"));

        let err = map_llm_error(
            "Resume analysis",
            LlmError::Api {
                status: 401,
                message: String::new(),
            },
        );
        assert!(err.to_string().contains("API key"));
    }
}
