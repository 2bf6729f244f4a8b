//! The business advisor chat endpoint. Each exchange is grounded in the
//! caller's business profile and the last few logged exchanges, then
//! persisted as a chatlog for the next turn.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{post, MethodRouter};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::identity::Identity;
use crate::models::{new_id, Business, ChatLog};
use crate::state::AppState;

const HISTORY_WINDOW: usize = 5;

const SYSTEM_INSTRUCTION: &str = "You are a concise, practical business advisor for \
small business founders. Ground every answer in the founder's business profile. \
Give specific, actionable advice; do not pad with generalities.";

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", collection())
}

pub(crate) fn collection() -> MethodRouter<Arc<AppState>> {
    post(chat)
}

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

fn render_history(logs: &[ChatLog]) -> String {
    if logs.is_empty() {
        return "No prior context.".to_string();
    }
    let mut rendered = String::new();
    for log in logs {
        rendered.push_str(&format!(
            "Founder: {}\nAdvisor: {}\n\n",
            log.message, log.response
        ));
    }
    rendered
}

fn build_prompt(business: &Business, message: &str, history: &str) -> String {
    format!(
        "BUSINESS PROFILE\n\
         Name: {name}\n\
         Category: {category}\n\
         Description: {description}\n\
         Target audience: {audience}\n\
         Primary goal: {goal}\n\
         Brand tone: {tone}\n\
         Offerings: {offerings}\n\n\
         RECENT CONVERSATION\n{history}\n\
         FOUNDER'S QUESTION\n{message}\n\n\
         Answer in at most 150 words.",
        name = business.business_name,
        category = business.category,
        description = business.description,
        audience = business.target_audience,
        goal = business.primary_goal,
        tone = business.brand_tone,
        offerings = business.offerings,
    )
}

async fn chat(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(req): Json<ChatRequest>,
) -> Result<Json<Value>, ApiError> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(ApiError::Validation("Message cannot be empty.".into()));
    }

    let business_id = identity.business_id()?.to_owned();
    let business = state
        .store
        .get_business(&business_id)?
        .ok_or(ApiError::NotFound(
            "Business profile not found. Please set up your business first.",
        ))?;

    // Last few exchanges, oldest first, so the prompt reads chronologically.
    let scope = state.store.scope("chatlogs", &business_id)?;
    let mut logs: Vec<ChatLog> = scope.list()?;
    logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    logs.truncate(HISTORY_WINDOW);
    logs.reverse();

    let advisor = state
        .advisor
        .as_ref()
        .ok_or_else(|| ApiError::Upstream("completion service not configured".into()))?;
    let prompt = build_prompt(&business, message, &render_history(&logs));
    let response = advisor.complete(SYSTEM_INSTRUCTION, &prompt).await?;

    let log = ChatLog {
        id: new_id(),
        business_id,
        user_email: identity.0.email,
        message: message.to_owned(),
        response: response.clone(),
        timestamp: Utc::now(),
    };
    scope.insert(&log.id, &log)?;

    Ok(Json(json!({ "response": response })))
}
