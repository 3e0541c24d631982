// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Courier endpoints: webhook ingress, outbound send, claim/done/fail

use super::{ApiError, AppState};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use monoco_core::MessageId;
use monoco_ticket::{
    Direction, MailMessage, MailSession, MailStatus, Mention, Participants,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Provider-normalized inbound payload. Wire-level codecs live in the
/// adapters; by the time a request reaches this endpoint it speaks the
/// common schema.
#[derive(Debug, Deserialize)]
pub struct WebhookMessage {
    pub id: String,
    pub session_id: String,
    #[serde(default)]
    pub thread_key: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    pub text: String,
    #[serde(default)]
    pub mentions: Vec<Mention>,
    #[serde(default)]
    pub created_at: Option<chrono::NaiveDateTime>,
}

fn default_content_type() -> String {
    "text/markdown".to_string()
}

#[derive(Debug, Serialize)]
pub struct Accepted {
    pub path: PathBuf,
}

/// `POST /courier/webhook/{provider}/{slug}`
pub async fn webhook(
    State(state): State<Arc<AppState>>,
    Path((provider, slug)): Path<(String, String)>,
    Json(req): Json<WebhookMessage>,
) -> Result<(StatusCode, Json<Accepted>), ApiError> {
    match &state.slug {
        Some(own) if *own == slug => {}
        Some(_) => return Err(ApiError::not_found(format!("unknown project slug: {slug}"))),
        // Unregistered single-project daemon accepts any slug
        None => {}
    }

    let message = MailMessage {
        id: MessageId::new(&req.id),
        provider: provider.clone(),
        direction: Direction::Inbound,
        content_type: req.content_type,
        created_at: req
            .created_at
            .unwrap_or_else(|| chrono::Utc::now().naive_utc()),
        sent_at: None,
        status: MailStatus::Pending,
        retry_count: 0,
        next_retry_at: None,
        error_message: None,
        session: MailSession {
            id: req.session_id,
            thread_key: req.thread_key,
        },
        participants: Participants {
            from: req.from,
            mentions: req.mentions,
            ..Participants::default()
        },
        artifacts: vec![],
        extras: Default::default(),
        body: req.text,
    };
    message.validate().map_err(ApiError::from)?;

    let path = state
        .paths
        .mailbox_inbound(&provider)
        .join(message.file_name());
    message.save(&path).map_err(ApiError::from)?;
    Ok((StatusCode::ACCEPTED, Json(Accepted { path })))
}

#[derive(Debug, Deserialize)]
pub struct OutboundSend {
    pub draft_path: PathBuf,
}

/// `POST /courier/outbound/send`
pub async fn outbound_send(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OutboundSend>,
) -> Result<Json<Accepted>, ApiError> {
    let path = state.mailbox.submit_draft(&req.draft_path)?;
    Ok(Json(Accepted { path }))
}

#[derive(Debug, Deserialize)]
pub struct ClaimRequest {
    pub claimer: String,
}

/// `POST /mailbox/{id}/claim`
pub async fn claim(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ClaimRequest>,
) -> Result<Json<Accepted>, ApiError> {
    let now_ms = chrono::Utc::now().timestamp_millis().max(0) as u64;
    let path = state.mailbox.claim(&id, &req.claimer, now_ms)?;
    Ok(Json(Accepted { path }))
}

/// `POST /mailbox/{id}/done`
pub async fn done(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ClaimRequest>,
) -> Result<Json<Accepted>, ApiError> {
    let path = state.mailbox.done(&id, &req.claimer)?;
    Ok(Json(Accepted { path }))
}

#[derive(Debug, Deserialize)]
pub struct FailRequest {
    pub claimer: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct FailOutcome {
    pub status: monoco_ticket::MailStatus,
}

/// `POST /mailbox/{id}/fail`
pub async fn fail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<FailRequest>,
) -> Result<Json<FailOutcome>, ApiError> {
    let now = chrono::Utc::now().naive_utc();
    let status = state.mailbox.fail(&id, &req.claimer, &req.reason, now)?;
    Ok(Json(FailOutcome { status }))
}
