// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP surface, versioned at `/api/v1`
//!
//! Handlers complete synchronously: anything long-lived is dispatched to
//! the scheduler (returning a session id) or lands on the mailbox tree.
//! Errors map by category, not by type: validation 422, precondition and
//! hook-denial 409, quota 429, unknown ids 404.

mod courier;
mod events;
mod issues;

use crate::event_bus::EventBus;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use monoco_core::error::Classified;
use monoco_core::SystemClock;
use monoco_engine::{AgentScheduler, Mailbox, TransitionCore};
use monoco_ticket::ProjectPaths;
use std::sync::Arc;

/// Shared handler state.
#[derive(Debug)]
pub struct AppState {
    pub bus: EventBus<SystemClock>,
    pub scheduler: AgentScheduler<SystemClock>,
    pub transitions: Arc<TransitionCore>,
    pub mailbox: Mailbox,
    pub paths: ProjectPaths,
    /// Registry slug this project answers webhooks for
    pub slug: Option<String>,
}

/// Error payload: `{"error": "...", "class": "validation"}`.
pub struct ApiError {
    pub status: StatusCode,
    pub class: monoco_core::ErrorClass,
    pub message: String,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            class: monoco_core::ErrorClass::Validation,
            message: message.into(),
        }
    }

    pub fn from_classified<E: Classified + std::fmt::Display>(err: E) -> Self {
        let class = err.class();
        Self {
            status: StatusCode::from_u16(class.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            class,
            message: err.to_string(),
        }
    }
}

impl From<monoco_engine::TransitionError> for ApiError {
    fn from(err: monoco_engine::TransitionError) -> Self {
        match &err {
            monoco_engine::TransitionError::NotFound(id) => {
                Self::not_found(format!("issue not found: {id}"))
            }
            _ => Self::from_classified(err),
        }
    }
}

impl From<monoco_engine::MailboxError> for ApiError {
    fn from(err: monoco_engine::MailboxError) -> Self {
        match &err {
            monoco_engine::MailboxError::NotFound(id) => {
                Self::not_found(format!("message not found: {id}"))
            }
            _ => Self::from_classified(err),
        }
    }
}

impl From<monoco_ticket::TicketError> for ApiError {
    fn from(err: monoco_ticket::TicketError) -> Self {
        Self::from_classified(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "error": self.message,
            "class": self.class,
        }));
        (self.status, body).into_response()
    }
}

/// Build the `/api/v1` router.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/issues", get(issues::list).post(issues::create))
        .route("/issues/:id/content", patch(issues::patch_content))
        .route("/stats/dashboard", get(events::dashboard))
        .route("/events", get(events::stream).post(events::emit))
        .route("/courier/webhook/:provider/:slug", post(courier::webhook))
        .route("/courier/outbound/send", post(courier::outbound_send))
        .route("/mailbox/:id/claim", post(courier::claim))
        .route("/mailbox/:id/done", post(courier::done))
        .route("/mailbox/:id/fail", post(courier::fail))
        .with_state(state);

    Router::new().nest("/api/v1", api)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
