// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dashboard stats and the SSE event stream

use super::AppState;
use axum::extract::State;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::Json;
use futures_core::Stream;
use monoco_core::Envelope;
use monoco_ticket::scan_issues;
use serde::Serialize;
use std::collections::HashMap;
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub sessions: monoco_engine::SchedulerStats,
    pub issues_by_status: HashMap<String, usize>,
    pub issues_by_stage: HashMap<String, usize>,
}

/// `GET /stats/dashboard`
pub async fn dashboard(State(state): State<Arc<AppState>>) -> Json<Dashboard> {
    let mut by_status: HashMap<String, usize> = HashMap::new();
    let mut by_stage: HashMap<String, usize> = HashMap::new();
    for (_, issue) in scan_issues(&state.paths.issues_root()) {
        *by_status.entry(issue.status.to_string()).or_default() += 1;
        *by_stage.entry(issue.stage.to_string()).or_default() += 1;
    }

    Json(Dashboard {
        sessions: state.scheduler.stats(),
        issues_by_status: by_status,
        issues_by_stage: by_stage,
    })
}

/// Stream adapter over a bus subscription: one SSE frame per envelope,
/// named by the event's topic.
pub struct BusStream {
    rx: tokio::sync::mpsc::Receiver<Envelope>,
}

impl Stream for BusStream {
    type Item = Result<SseEvent, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.rx.poll_recv(cx) {
            Poll::Ready(Some(envelope)) => {
                let frame = SseEvent::default()
                    .event(envelope.event.name())
                    .json_data(&envelope)
                    .unwrap_or_else(|_| SseEvent::default().event("error"));
                Poll::Ready(Some(Ok(frame)))
            }
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// `GET /events`
pub async fn stream(State(state): State<Arc<AppState>>) -> Sse<BusStream> {
    let rx = state.bus.subscribe();
    Sse::new(BusStream { rx }).keep_alive(KeepAlive::default())
}

/// `POST /events`: external emitters (agents, git hook stubs, CI) inject
/// typed events onto the bus; `pr.created` arrives this way.
pub async fn emit(
    State(state): State<Arc<AppState>>,
    Json(event): Json<monoco_core::Event>,
) -> (axum::http::StatusCode, Json<monoco_core::Envelope>) {
    let envelope = state.bus.publish(event);
    (axum::http::StatusCode::ACCEPTED, Json(envelope))
}
