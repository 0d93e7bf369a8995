//! Assistant chat and login/signup wizard endpoints.

use axum::extract::State;

use super::{success, ApiResult, AppJson};
use crate::assistant::wizard::{self, WizardRequest, WizardResponse};
use crate::assistant::{
    system_instruction, AssistantReply, AssistantRequest, Source, KNOWLEDGE_HITS,
};
use crate::errors::AppError;
use crate::AppState;

/// POST /api/assistant - Ask the assistant a question.
pub async fn ask_assistant(
    State(state): State<AppState>,
    AppJson(request): AppJson<AssistantRequest>,
) -> ApiResult<AssistantReply> {
    let Some(client) = state.assistant.as_ref() else {
        return Err(AppError::AssistantUnavailable(
            "The assistant is not configured".to_string(),
        ));
    };
    request.validate()?;

    let hits = state
        .search
        .search_any(&request.message, KNOWLEDGE_HITS)
        .unwrap_or_else(|e| {
            tracing::warn!("Knowledge lookup failed: {}", e);
            Vec::new()
        });
    let mut knowledge = Vec::with_capacity(hits.len());
    for hit in hits {
        if let Some(resource) = state.repo.get_resource(&hit.resource_id).await? {
            knowledge.push(resource);
        }
    }

    let system = system_instruction(&knowledge);
    let reply = client
        .generate(&system, request.recent_history(), request.message.trim())
        .await?;

    success(AssistantReply {
        reply,
        sources: knowledge.iter().map(Source::from).collect(),
    })
}

/// POST /api/assistant/wizard - Advance the login/signup chat wizard.
pub async fn wizard_step(
    State(state): State<AppState>,
    AppJson(request): AppJson<WizardRequest>,
) -> ApiResult<WizardResponse> {
    let response = wizard::step(&state.repo, &state.jwt, state.config.bcrypt_cost, request).await?;
    success(response)
}
