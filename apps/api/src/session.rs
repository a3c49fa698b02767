//! Session layer: the per-user dashboard state machine and its in-memory
//! store. A session moves INTAKE → ANALYZING → DASHBOARD and is discarded on
//! reset; nothing is persisted.
//!
//! Concurrency rule: at most one LLM-backed operation per session. Handlers
//! claim the session's processing slot before calling out and release it
//! after; a second concurrent operation gets SESSION_BUSY.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::agent::AgentPersona;
use crate::analysis::BulletOptimization;
use crate::errors::AppError;
use crate::filters::{apply_toggle, OptimizationFilter};
use crate::models::{BulletPoint, BulletStatus, ChatMessage, ResumeData};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionPhase {
    Intake,
    Analyzing,
    Dashboard,
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub persona: AgentPersona,
    pub phase: SessionPhase,
    pub resume_text: String,
    pub resume: Option<ResumeData>,
    pub chat: Vec<ChatMessage>,
    pub active_filters: Vec<OptimizationFilter>,
    pub processing: bool,
    pub created_at: DateTime<Utc>,
}

impl Session {
    fn new(persona: AgentPersona) -> Self {
        Self {
            id: Uuid::new_v4(),
            persona,
            phase: SessionPhase::Intake,
            resume_text: String::new(),
            resume: None,
            chat: Vec::new(),
            active_filters: Vec::new(),
            processing: false,
            created_at: Utc::now(),
        }
    }

    /// Stores pasted or extracted resume text. Only valid before analysis.
    pub fn set_resume_text(&mut self, text: String) -> Result<(), AppError> {
        if self.phase != SessionPhase::Intake {
            return Err(AppError::Validation(
                "Resume text can only be changed during intake; reset the session first"
                    .to_string(),
            ));
        }
        self.resume_text = text;
        Ok(())
    }

    /// Transitions INTAKE → ANALYZING and hands back the text to analyze.
    pub fn begin_analysis(&mut self) -> Result<String, AppError> {
        if self.phase != SessionPhase::Intake {
            return Err(AppError::Validation(
                "Analysis can only start from the intake phase".to_string(),
            ));
        }
        if self.resume_text.trim().is_empty() {
            return Err(AppError::Validation("Resume text is empty".to_string()));
        }
        self.phase = SessionPhase::Analyzing;
        Ok(self.resume_text.clone())
    }

    /// Transitions ANALYZING → DASHBOARD and seeds the chat transcript with
    /// the persona greeting and the analysis summary line.
    pub fn complete_analysis(&mut self, resume: ResumeData) {
        let summary_line = format!(
            "Analysis Complete. Health Score: {}/10. {} vectors identified.",
            resume.health_score,
            resume.red_flags.len()
        );
        self.resume = Some(resume);
        self.phase = SessionPhase::Dashboard;
        self.chat.push(ChatMessage::model(self.persona.profile().greeting));
        self.chat.push(ChatMessage::model(summary_line));
    }

    /// A failed analysis returns the session to intake so the user can retry.
    pub fn fail_analysis(&mut self) {
        self.phase = SessionPhase::Intake;
    }

    /// Switches persona. On an active dashboard the new agent announces the
    /// switchover in the transcript.
    pub fn switch_persona(&mut self, persona: AgentPersona) {
        self.persona = persona;
        if self.phase == SessionPhase::Dashboard && self.resume.is_some() {
            self.chat.push(ChatMessage::model(format!(
                "[SYSTEM SWITCHOVER] {}",
                persona.profile().greeting
            )));
        }
    }

    pub fn toggle_filter(&mut self, filter: OptimizationFilter) {
        self.active_filters = apply_toggle(&self.active_filters, filter);
    }

    /// Replaces the summary with an accepted rewrite.
    pub fn accept_summary(&mut self, text: String) -> Result<(), AppError> {
        let resume = self.resume_mut()?;
        resume.summary = text;
        Ok(())
    }

    /// Adds a recommended skill, skipping duplicates.
    pub fn add_skill(&mut self, skill: String) -> Result<(), AppError> {
        let resume = self.resume_mut()?;
        if !resume.skills.contains(&skill) {
            resume.skills.push(skill);
        }
        Ok(())
    }

    /// Marks a bullet ANALYZING and returns its text plus the role context
    /// string for the prompt. Approved bullets are final.
    pub fn begin_bullet_optimization(
        &mut self,
        role_id: Uuid,
        bullet_id: Uuid,
    ) -> Result<(String, String), AppError> {
        let resume = self.resume_mut()?;
        let role = resume
            .roles
            .iter_mut()
            .find(|r| r.id == role_id)
            .ok_or_else(|| AppError::NotFound(format!("Role {role_id} not found")))?;
        let role_context = format!("{} at {}", role.title, role.company);
        let bullet = role
            .bullets
            .iter_mut()
            .find(|b| b.id == bullet_id)
            .ok_or_else(|| AppError::NotFound(format!("Bullet {bullet_id} not found")))?;
        if bullet.status == BulletStatus::Approved {
            return Err(AppError::Validation(
                "Bullet is already approved".to_string(),
            ));
        }
        bullet.status = BulletStatus::Analyzing;
        Ok((bullet.original.clone(), role_context))
    }

    /// Attaches the optimization result and moves the bullet to REVIEW.
    pub fn complete_bullet_optimization(
        &mut self,
        role_id: Uuid,
        bullet_id: Uuid,
        optimization: BulletOptimization,
    ) -> Result<(), AppError> {
        let bullet = self.bullet_mut(role_id, bullet_id)?;
        let rationale = optimization
            .rationale
            .clone()
            .or_else(|| optimization.rewrites.first().map(|r| r.rationale.clone()));
        bullet.analysis = optimization.avcr_analysis;
        bullet.rewrites = Some(optimization.rewrites);
        bullet.rationale = rationale;
        bullet.status = BulletStatus::Review;
        Ok(())
    }

    /// A failed optimization puts the bullet back to PENDING.
    pub fn revert_bullet(&mut self, role_id: Uuid, bullet_id: Uuid) {
        if let Ok(bullet) = self.bullet_mut(role_id, bullet_id) {
            bullet.status = BulletStatus::Pending;
        }
    }

    /// Accepts one of the offered rewrites: the bullet's text is replaced,
    /// the bullet is APPROVED, and the health score gains 0.5 (capped at 10).
    pub fn accept_rewrite(
        &mut self,
        role_id: Uuid,
        bullet_id: Uuid,
        option_index: usize,
    ) -> Result<(), AppError> {
        {
            let bullet = self.bullet_mut(role_id, bullet_id)?;
            let rewrites = bullet.rewrites.as_ref().ok_or_else(|| {
                AppError::Validation("Bullet has no rewrite options to accept".to_string())
            })?;
            let option = rewrites
                .get(option_index)
                .ok_or_else(|| {
                    AppError::Validation(format!("Rewrite option {option_index} out of range"))
                })?
                .clone();
            bullet.revised = Some(option.text.clone());
            bullet.original = option.text;
            bullet.rationale = Some(option.rationale);
            bullet.status = BulletStatus::Approved;
        }
        if let Some(resume) = self.resume.as_mut() {
            resume.health_score = (resume.health_score + 0.5).min(10.0);
        }
        Ok(())
    }

    pub fn push_chat(&mut self, message: ChatMessage) {
        self.chat.push(message);
    }

    pub fn clear_chat(&mut self) {
        self.chat.clear();
    }

    /// Back to intake: wipes text, analysis, and transcript. Active filters
    /// survive a reset, matching the dashboard behavior.
    pub fn reset(&mut self) {
        self.phase = SessionPhase::Intake;
        self.resume_text.clear();
        self.resume = None;
        self.chat.clear();
    }

    fn resume_mut(&mut self) -> Result<&mut ResumeData, AppError> {
        self.resume.as_mut().ok_or_else(|| {
            AppError::Validation("No analyzed resume in this session".to_string())
        })
    }

    fn bullet_mut(&mut self, role_id: Uuid, bullet_id: Uuid) -> Result<&mut BulletPoint, AppError> {
        let resume = self.resume_mut()?;
        let role = resume
            .roles
            .iter_mut()
            .find(|r| r.id == role_id)
            .ok_or_else(|| AppError::NotFound(format!("Role {role_id} not found")))?;
        role.bullets
            .iter_mut()
            .find(|b| b.id == bullet_id)
            .ok_or_else(|| AppError::NotFound(format!("Bullet {bullet_id} not found")))
    }
}

/// In-memory session store shared across handlers.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, persona: AgentPersona) -> Session {
        let session = Session::new(persona);
        self.inner.write().await.insert(session.id, session.clone());
        session
    }

    /// Returns a point-in-time copy of the session.
    pub async fn snapshot(&self, id: Uuid) -> Result<Session, AppError> {
        self.inner
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| session_not_found(id))
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        self.inner
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| session_not_found(id))
    }

    /// Runs a mutation under the store lock. LLM calls must never happen
    /// inside the closure.
    pub async fn with_session<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut Session) -> Result<R, AppError>,
    ) -> Result<R, AppError> {
        let mut guard = self.inner.write().await;
        let session = guard.get_mut(&id).ok_or_else(|| session_not_found(id))?;
        f(session)
    }

    /// Claims the session's single-flight slot for an LLM-backed operation.
    pub async fn begin_processing(&self, id: Uuid) -> Result<(), AppError> {
        self.with_session(id, |session| {
            if session.processing {
                return Err(AppError::Busy(
                    "Another operation is already in flight for this session".to_string(),
                ));
            }
            session.processing = true;
            Ok(())
        })
        .await
    }

    pub async fn end_processing(&self, id: Uuid) {
        let _ = self
            .with_session(id, |session| {
                session.processing = false;
                Ok(())
            })
            .await;
    }
}

fn session_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Session {id} not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RewriteOption;

    fn analyzed_session() -> Session {
        let mut session = Session::new(AgentPersona::Friday);
        session.set_resume_text("resume body".to_string()).unwrap();
        session.begin_analysis().unwrap();
        session.complete_analysis(sample_resume());
        session
    }

    fn sample_resume() -> ResumeData {
        ResumeData {
            summary: "Seasoned PM.".to_string(),
            roles: vec![crate::models::WorkRole {
                id: Uuid::new_v4(),
                title: "Senior PM".to_string(),
                company: "Acme".to_string(),
                bullets: vec![BulletPoint::pending("Helped ship checkout".to_string())],
            }],
            skills: vec!["SQL".to_string()],
            health_score: 6.0,
            red_flags: vec!["No metrics".to_string()],
            top_priorities: vec!["Quantify outcomes".to_string()],
        }
    }

    fn sample_optimization() -> BulletOptimization {
        BulletOptimization {
            avcr_analysis: None,
            rewrites: vec![
                RewriteOption {
                    text: "Shipped checkout v2, lifting conversion 8%".to_string(),
                    rationale: "Quantifies the outcome".to_string(),
                    label: "High Impact".to_string(),
                    is_recommended: true,
                },
                RewriteOption {
                    text: "Launched redesigned checkout".to_string(),
                    rationale: "Tighter phrasing".to_string(),
                    label: "Concise".to_string(),
                    is_recommended: false,
                },
            ],
            rationale: None,
        }
    }

    #[test]
    fn test_new_session_starts_at_intake() {
        let session = Session::new(AgentPersona::Friday);
        assert_eq!(session.phase, SessionPhase::Intake);
        assert!(session.resume.is_none());
        assert!(!session.processing);
    }

    #[test]
    fn test_begin_analysis_requires_text() {
        let mut session = Session::new(AgentPersona::Friday);
        assert!(session.begin_analysis().is_err());
        session.set_resume_text("some resume".to_string()).unwrap();
        assert_eq!(session.begin_analysis().unwrap(), "some resume");
        assert_eq!(session.phase, SessionPhase::Analyzing);
    }

    #[test]
    fn test_begin_analysis_rejected_outside_intake() {
        let mut session = analyzed_session();
        assert!(session.begin_analysis().is_err());
    }

    #[test]
    fn test_complete_analysis_seeds_chat() {
        let session = analyzed_session();
        assert_eq!(session.phase, SessionPhase::Dashboard);
        assert_eq!(session.chat.len(), 2);
        assert!(session.chat[0].text.contains("F.R.I.D.A.Y."));
        assert!(session.chat[1]
            .text
            .contains("Health Score: 6/10. 1 vectors identified."));
    }

    #[test]
    fn test_fail_analysis_returns_to_intake() {
        let mut session = Session::new(AgentPersona::Friday);
        session.set_resume_text("text".to_string()).unwrap();
        session.begin_analysis().unwrap();
        session.fail_analysis();
        assert_eq!(session.phase, SessionPhase::Intake);
        // Text survives so the user can retry
        assert_eq!(session.resume_text, "text");
    }

    #[test]
    fn test_set_resume_text_rejected_after_analysis() {
        let mut session = analyzed_session();
        assert!(session.set_resume_text("new text".to_string()).is_err());
    }

    #[test]
    fn test_bullet_optimization_lifecycle() {
        let mut session = analyzed_session();
        let resume = session.resume.as_ref().unwrap();
        let role_id = resume.roles[0].id;
        let bullet_id = resume.roles[0].bullets[0].id;

        let (text, context) = session
            .begin_bullet_optimization(role_id, bullet_id)
            .unwrap();
        assert_eq!(text, "Helped ship checkout");
        assert_eq!(context, "Senior PM at Acme");
        assert_eq!(
            session.resume.as_ref().unwrap().roles[0].bullets[0].status,
            BulletStatus::Analyzing
        );

        session
            .complete_bullet_optimization(role_id, bullet_id, sample_optimization())
            .unwrap();
        let bullet = &session.resume.as_ref().unwrap().roles[0].bullets[0];
        assert_eq!(bullet.status, BulletStatus::Review);
        assert_eq!(bullet.rewrites.as_ref().unwrap().len(), 2);
        // Rationale falls back to the first rewrite's
        assert_eq!(bullet.rationale.as_deref(), Some("Quantifies the outcome"));
    }

    #[test]
    fn test_revert_bullet_returns_to_pending() {
        let mut session = analyzed_session();
        let resume = session.resume.as_ref().unwrap();
        let role_id = resume.roles[0].id;
        let bullet_id = resume.roles[0].bullets[0].id;

        session
            .begin_bullet_optimization(role_id, bullet_id)
            .unwrap();
        session.revert_bullet(role_id, bullet_id);
        assert_eq!(
            session.resume.as_ref().unwrap().roles[0].bullets[0].status,
            BulletStatus::Pending
        );
    }

    #[test]
    fn test_accept_rewrite_approves_and_bumps_health() {
        let mut session = analyzed_session();
        let resume = session.resume.as_ref().unwrap();
        let role_id = resume.roles[0].id;
        let bullet_id = resume.roles[0].bullets[0].id;

        session
            .begin_bullet_optimization(role_id, bullet_id)
            .unwrap();
        session
            .complete_bullet_optimization(role_id, bullet_id, sample_optimization())
            .unwrap();
        session.accept_rewrite(role_id, bullet_id, 0).unwrap();

        let resume = session.resume.as_ref().unwrap();
        let bullet = &resume.roles[0].bullets[0];
        assert_eq!(bullet.status, BulletStatus::Approved);
        assert_eq!(bullet.original, "Shipped checkout v2, lifting conversion 8%");
        assert_eq!(
            bullet.revised.as_deref(),
            Some("Shipped checkout v2, lifting conversion 8%")
        );
        assert_eq!(resume.health_score, 6.5);
    }

    #[test]
    fn test_accept_rewrite_caps_health_at_ten() {
        let mut session = analyzed_session();
        session.resume.as_mut().unwrap().health_score = 9.8;
        let resume = session.resume.as_ref().unwrap();
        let role_id = resume.roles[0].id;
        let bullet_id = resume.roles[0].bullets[0].id;

        session
            .begin_bullet_optimization(role_id, bullet_id)
            .unwrap();
        session
            .complete_bullet_optimization(role_id, bullet_id, sample_optimization())
            .unwrap();
        session.accept_rewrite(role_id, bullet_id, 0).unwrap();
        assert_eq!(session.resume.as_ref().unwrap().health_score, 10.0);
    }

    #[test]
    fn test_accept_rewrite_out_of_range_rejected() {
        let mut session = analyzed_session();
        let resume = session.resume.as_ref().unwrap();
        let role_id = resume.roles[0].id;
        let bullet_id = resume.roles[0].bullets[0].id;

        session
            .begin_bullet_optimization(role_id, bullet_id)
            .unwrap();
        session
            .complete_bullet_optimization(role_id, bullet_id, sample_optimization())
            .unwrap();
        assert!(session.accept_rewrite(role_id, bullet_id, 5).is_err());
    }

    #[test]
    fn test_reoptimizing_approved_bullet_rejected() {
        let mut session = analyzed_session();
        let resume = session.resume.as_ref().unwrap();
        let role_id = resume.roles[0].id;
        let bullet_id = resume.roles[0].bullets[0].id;

        session
            .begin_bullet_optimization(role_id, bullet_id)
            .unwrap();
        session
            .complete_bullet_optimization(role_id, bullet_id, sample_optimization())
            .unwrap();
        session.accept_rewrite(role_id, bullet_id, 0).unwrap();
        assert!(session
            .begin_bullet_optimization(role_id, bullet_id)
            .is_err());
    }

    #[test]
    fn test_add_skill_deduplicates() {
        let mut session = analyzed_session();
        session.add_skill("SQL".to_string()).unwrap();
        session.add_skill("A/B testing".to_string()).unwrap();
        let skills = &session.resume.as_ref().unwrap().skills;
        assert_eq!(skills, &vec!["SQL".to_string(), "A/B testing".to_string()]);
    }

    #[test]
    fn test_accept_summary_replaces_text() {
        let mut session = analyzed_session();
        session
            .accept_summary("Sharper narrative.".to_string())
            .unwrap();
        assert_eq!(session.resume.as_ref().unwrap().summary, "Sharper narrative.");
    }

    #[test]
    fn test_switch_persona_announces_on_dashboard() {
        let mut session = analyzed_session();
        let before = session.chat.len();
        session.switch_persona(AgentPersona::Monday);
        assert_eq!(session.persona, AgentPersona::Monday);
        assert_eq!(session.chat.len(), before + 1);
        assert!(session.chat.last().unwrap().text.starts_with("[SYSTEM SWITCHOVER]"));
    }

    #[test]
    fn test_switch_persona_silent_during_intake() {
        let mut session = Session::new(AgentPersona::Friday);
        session.switch_persona(AgentPersona::Monday);
        assert!(session.chat.is_empty());
    }

    #[test]
    fn test_toggle_filter_clears_conflicts() {
        let mut session = Session::new(AgentPersona::Friday);
        session.toggle_filter(OptimizationFilter::Concise);
        session.toggle_filter(OptimizationFilter::Detailed);
        assert_eq!(session.active_filters, vec![OptimizationFilter::Detailed]);
    }

    #[test]
    fn test_reset_wipes_state_but_keeps_filters() {
        let mut session = analyzed_session();
        session.toggle_filter(OptimizationFilter::Executive);
        session.reset();
        assert_eq!(session.phase, SessionPhase::Intake);
        assert!(session.resume.is_none());
        assert!(session.resume_text.is_empty());
        assert!(session.chat.is_empty());
        assert_eq!(session.active_filters, vec![OptimizationFilter::Executive]);
    }

    #[tokio::test]
    async fn test_store_busy_guard_rejects_overlap() {
        let store = SessionStore::new();
        let session = store.create(AgentPersona::Friday).await;

        store.begin_processing(session.id).await.unwrap();
        let err = store.begin_processing(session.id).await.unwrap_err();
        assert!(matches!(err, AppError::Busy(_)));

        store.end_processing(session.id).await;
        assert!(store.begin_processing(session.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_store_unknown_session_not_found() {
        let store = SessionStore::new();
        let err = store.snapshot(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_store_remove_discards_session() {
        let store = SessionStore::new();
        let session = store.create(AgentPersona::Monday).await;
        store.remove(session.id).await.unwrap();
        assert!(store.snapshot(session.id).await.is_err());
    }
}
