//! Session API handlers. Every LLM-backed operation claims the session's
//! single-flight slot first and releases it when done, so a session never has
//! two provider calls in flight.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::agent::{AgentPersona, AgentProfile};
use crate::analysis;
use crate::errors::AppError;
use crate::extract::{self, DocumentKind};
use crate::filters::OptimizationFilter;
use crate::models::{ChatMessage, SkillsOptimization, SummaryOptimization};
use crate::session::{Session, SessionPhase};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / response bodies
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub persona: Option<AgentPersona>,
}

/// Client-facing card describing the active agent.
#[derive(Debug, Serialize)]
pub struct AgentCard {
    pub persona: AgentPersona,
    pub name: &'static str,
    pub acronym: &'static str,
    pub greeting: &'static str,
}

impl AgentCard {
    fn for_persona(persona: AgentPersona) -> Self {
        let profile: &AgentProfile = persona.profile();
        Self {
            persona,
            name: profile.name,
            acronym: profile.acronym,
            greeting: profile.greeting,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionEnvelope {
    pub session: Session,
    pub agent: AgentCard,
}

impl SessionEnvelope {
    fn new(session: Session) -> Self {
        let agent = AgentCard::for_persona(session.persona);
        Self { session, agent }
    }
}

#[derive(Debug, Deserialize)]
pub struct IntakeTextRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ExtractionResponse {
    pub format: &'static str,
    pub characters: usize,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct AcceptSummaryRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct AddSkillRequest {
    pub skill: String,
}

#[derive(Debug, Deserialize)]
pub struct AcceptRewriteRequest {
    pub option_index: usize,
}

#[derive(Debug, Deserialize)]
pub struct ToggleFilterRequest {
    pub filter: OptimizationFilter,
}

#[derive(Debug, Serialize)]
pub struct ActiveFiltersResponse {
    pub active_filters: Vec<OptimizationFilter>,
}

#[derive(Debug, Deserialize)]
pub struct SwitchPersonaRequest {
    #[serde(default)]
    pub persona: Option<AgentPersona>,
}

#[derive(Debug, Deserialize)]
pub struct ChatSendRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatSendResponse {
    pub reply: ChatMessage,
}

// ────────────────────────────────────────────────────────────────────────────
// Session lifecycle
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
    body: Option<Json<CreateSessionRequest>>,
) -> Result<Json<SessionEnvelope>, AppError> {
    let persona = body
        .and_then(|Json(req)| req.persona)
        .unwrap_or_default();
    let session = state.sessions.create(persona).await;
    info!("Created session {} with persona {:?}", session.id, persona);
    Ok(Json(SessionEnvelope::new(session)))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionEnvelope>, AppError> {
    let session = state.sessions.snapshot(id).await?;
    Ok(Json(SessionEnvelope::new(session)))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/sessions/:id/reset
pub async fn handle_reset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionEnvelope>, AppError> {
    let session = state
        .sessions
        .with_session(id, |session| {
            session.reset();
            Ok(session.clone())
        })
        .await?;
    Ok(Json(SessionEnvelope::new(session)))
}

// ────────────────────────────────────────────────────────────────────────────
// Intake
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/intake/text
pub async fn handle_intake_text(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<IntakeTextRequest>,
) -> Result<Json<SessionEnvelope>, AppError> {
    let session = state
        .sessions
        .with_session(id, |session| {
            session.set_resume_text(req.text)?;
            Ok(session.clone())
        })
        .await?;
    Ok(Json(SessionEnvelope::new(session)))
}

/// POST /api/v1/sessions/:id/intake/document
/// Multipart upload with a single `file` field. The extracted text becomes
/// the session's resume text and is echoed back for client display.
pub async fn handle_intake_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<ExtractionResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart payload: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("resume").to_string();
        let content_type = field.content_type().map(|ct| ct.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;

        let kind = DocumentKind::detect(&filename, content_type.as_deref())?;
        let text = extract::extract_text(kind, &data)?;
        info!(
            "Extracted {} characters from '{}' ({})",
            text.chars().count(),
            filename,
            kind.as_str()
        );

        let characters = text.chars().count();
        state
            .sessions
            .with_session(id, |session| session.set_resume_text(text.clone()))
            .await?;

        return Ok(Json(ExtractionResponse {
            format: kind.as_str(),
            characters,
            text,
        }));
    }

    Err(AppError::Validation(
        "Missing 'file' field in multipart upload".to_string(),
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// Analysis
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionEnvelope>, AppError> {
    state.sessions.begin_processing(id).await?;
    let result = run_analysis(&state, id).await;
    state.sessions.end_processing(id).await;
    result.map(|session| Json(SessionEnvelope::new(session)))
}

async fn run_analysis(state: &AppState, id: Uuid) -> Result<Session, AppError> {
    let (text, persona) = state
        .sessions
        .with_session(id, |session| {
            let text = session.begin_analysis()?;
            Ok((text, session.persona))
        })
        .await?;

    match analysis::analyze_resume(&state.llm, persona, &text).await {
        Ok(resume) => {
            state
                .sessions
                .with_session(id, |session| {
                    session.complete_analysis(resume);
                    Ok(session.clone())
                })
                .await
        }
        Err(e) => {
            let _ = state
                .sessions
                .with_session(id, |session| {
                    session.fail_analysis();
                    Ok(())
                })
                .await;
            Err(e)
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Summary
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/summary/optimize
pub async fn handle_optimize_summary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SummaryOptimization>, AppError> {
    state.sessions.begin_processing(id).await?;
    let result = run_summary_optimization(&state, id).await;
    state.sessions.end_processing(id).await;
    result.map(Json)
}

async fn run_summary_optimization(
    state: &AppState,
    id: Uuid,
) -> Result<SummaryOptimization, AppError> {
    let (persona, current_summary, resume_context) = state
        .sessions
        .with_session(id, |session| {
            let resume = session
                .resume
                .as_ref()
                .ok_or_else(|| no_analyzed_resume())?;
            Ok((
                session.persona,
                resume.summary.clone(),
                session.resume_text.clone(),
            ))
        })
        .await?;

    analysis::optimize_summary(&state.llm, persona, &current_summary, &resume_context).await
}

/// POST /api/v1/sessions/:id/summary/accept
pub async fn handle_accept_summary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AcceptSummaryRequest>,
) -> Result<Json<SessionEnvelope>, AppError> {
    let session = state
        .sessions
        .with_session(id, |session| {
            session.accept_summary(req.text)?;
            Ok(session.clone())
        })
        .await?;
    Ok(Json(SessionEnvelope::new(session)))
}

// ────────────────────────────────────────────────────────────────────────────
// Skills
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/skills/optimize
pub async fn handle_optimize_skills(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SkillsOptimization>, AppError> {
    state.sessions.begin_processing(id).await?;
    let result = run_skills_optimization(&state, id).await;
    state.sessions.end_processing(id).await;
    result.map(Json)
}

async fn run_skills_optimization(
    state: &AppState,
    id: Uuid,
) -> Result<SkillsOptimization, AppError> {
    let (persona, skills) = state
        .sessions
        .with_session(id, |session| {
            let resume = session
                .resume
                .as_ref()
                .ok_or_else(|| no_analyzed_resume())?;
            Ok((session.persona, resume.skills.clone()))
        })
        .await?;

    analysis::optimize_skills(&state.llm, persona, &skills).await
}

/// POST /api/v1/sessions/:id/skills/add
pub async fn handle_add_skill(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddSkillRequest>,
) -> Result<Json<SessionEnvelope>, AppError> {
    let session = state
        .sessions
        .with_session(id, |session| {
            session.add_skill(req.skill)?;
            Ok(session.clone())
        })
        .await?;
    Ok(Json(SessionEnvelope::new(session)))
}

// ────────────────────────────────────────────────────────────────────────────
// Bullets
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/roles/:role_id/bullets/:bullet_id/optimize
/// Uses the session's active refinement filters. The bullet is ANALYZING for
/// the duration of the call, then REVIEW on success or PENDING again on
/// failure.
pub async fn handle_optimize_bullet(
    State(state): State<AppState>,
    Path((id, role_id, bullet_id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<Json<SessionEnvelope>, AppError> {
    state.sessions.begin_processing(id).await?;
    let result = run_bullet_optimization(&state, id, role_id, bullet_id).await;
    state.sessions.end_processing(id).await;
    result.map(|session| Json(SessionEnvelope::new(session)))
}

async fn run_bullet_optimization(
    state: &AppState,
    id: Uuid,
    role_id: Uuid,
    bullet_id: Uuid,
) -> Result<Session, AppError> {
    let (persona, filters, bullet_text, role_context) = state
        .sessions
        .with_session(id, |session| {
            let (text, context) = session.begin_bullet_optimization(role_id, bullet_id)?;
            Ok((
                session.persona,
                session.active_filters.clone(),
                text,
                context,
            ))
        })
        .await?;

    match analysis::optimize_bullet(&state.llm, persona, &bullet_text, &role_context, &filters)
        .await
    {
        Ok(optimization) => {
            state
                .sessions
                .with_session(id, |session| {
                    session.complete_bullet_optimization(role_id, bullet_id, optimization)?;
                    Ok(session.clone())
                })
                .await
        }
        Err(e) => {
            let _ = state
                .sessions
                .with_session(id, |session| {
                    session.revert_bullet(role_id, bullet_id);
                    Ok(())
                })
                .await;
            Err(e)
        }
    }
}

/// POST /api/v1/sessions/:id/roles/:role_id/bullets/:bullet_id/accept
pub async fn handle_accept_rewrite(
    State(state): State<AppState>,
    Path((id, role_id, bullet_id)): Path<(Uuid, Uuid, Uuid)>,
    Json(req): Json<AcceptRewriteRequest>,
) -> Result<Json<SessionEnvelope>, AppError> {
    let session = state
        .sessions
        .with_session(id, |session| {
            session.accept_rewrite(role_id, bullet_id, req.option_index)?;
            Ok(session.clone())
        })
        .await?;
    Ok(Json(SessionEnvelope::new(session)))
}

// ────────────────────────────────────────────────────────────────────────────
// Filters and persona
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/filters/toggle
pub async fn handle_toggle_filter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ToggleFilterRequest>,
) -> Result<Json<ActiveFiltersResponse>, AppError> {
    let active_filters = state
        .sessions
        .with_session(id, |session| {
            session.toggle_filter(req.filter);
            Ok(session.active_filters.clone())
        })
        .await?;
    Ok(Json(ActiveFiltersResponse { active_filters }))
}

/// POST /api/v1/sessions/:id/persona
/// With an explicit persona in the body the session switches to it; with no
/// body (or no persona) the switch acts as a toggle, matching the dashboard's
/// core switch control.
pub async fn handle_switch_persona(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<SwitchPersonaRequest>>,
) -> Result<Json<SessionEnvelope>, AppError> {
    let requested = body.and_then(|Json(req)| req.persona);
    let session = state
        .sessions
        .with_session(id, |session| {
            let persona = requested.unwrap_or_else(|| session.persona.toggled());
            session.switch_persona(persona);
            Ok(session.clone())
        })
        .await?;
    Ok(Json(SessionEnvelope::new(session)))
}

// ────────────────────────────────────────────────────────────────────────────
// Chat
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/chat
pub async fn handle_chat_send(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChatSendRequest>,
) -> Result<Json<ChatSendResponse>, AppError> {
    state.sessions.begin_processing(id).await?;
    let result = run_chat(&state, id, req.message).await;
    state.sessions.end_processing(id).await;
    result.map(|reply| Json(ChatSendResponse { reply }))
}

async fn run_chat(state: &AppState, id: Uuid, message: String) -> Result<ChatMessage, AppError> {
    if message.trim().is_empty() {
        return Err(AppError::Validation("Chat message is empty".to_string()));
    }

    let persona = state
        .sessions
        .with_session(id, |session| {
            if session.phase != SessionPhase::Dashboard {
                return Err(AppError::Validation(
                    "Chat is available once a resume has been analyzed".to_string(),
                ));
            }
            session.push_chat(ChatMessage::user(message.clone()));
            Ok(session.persona)
        })
        .await?;

    let reply_text = analysis::chat(&state.llm, persona, &message).await?;
    let reply = ChatMessage::model(reply_text);
    state
        .sessions
        .with_session(id, |session| {
            session.push_chat(reply.clone());
            Ok(())
        })
        .await?;
    Ok(reply)
}

/// DELETE /api/v1/sessions/:id/chat
pub async fn handle_chat_clear(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .sessions
        .with_session(id, |session| {
            session.clear_chat();
            Ok(())
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

fn no_analyzed_resume() -> AppError {
    AppError::Validation("No analyzed resume in this session".to_string())
}
