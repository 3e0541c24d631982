// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Issue endpoints

use super::{ApiError, AppState};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use monoco_core::IssueId;
use monoco_ticket::{find_issue, lint_issue, scan_issues, Issue, IssueType, Status};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct IssueSummary {
    pub id: IssueId,
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub status: Status,
    pub stage: monoco_ticket::Stage,
    pub title: String,
    pub files: Vec<String>,
}

impl From<&Issue> for IssueSummary {
    fn from(issue: &Issue) -> Self {
        Self {
            id: issue.id.clone(),
            issue_type: issue.issue_type,
            status: issue.status,
            stage: issue.stage,
            title: issue.title.clone(),
            files: issue.files.clone(),
        }
    }
}

/// `GET /issues`. Archived issues are excluded from the default view.
pub async fn list(State(state): State<Arc<AppState>>) -> Json<Vec<IssueSummary>> {
    let summaries: Vec<IssueSummary> = scan_issues(&state.paths.issues_root())
        .iter()
        .filter(|(_, issue)| issue.status != Status::Archived)
        .map(|(_, issue)| IssueSummary::from(issue))
        .collect();
    Json(summaries)
}

#[derive(Debug, Deserialize)]
pub struct CreateIssue {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub title: String,
    #[serde(default)]
    pub body: String,
}

/// `POST /issues`
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateIssue>,
) -> Result<(StatusCode, Json<IssueSummary>), ApiError> {
    let issue = state
        .transitions
        .create(req.issue_type, &req.title, &req.body)
        .await?;
    Ok((StatusCode::CREATED, Json(IssueSummary::from(&issue))))
}

#[derive(Debug, Deserialize)]
pub struct PatchContent {
    pub content: String,
}

/// `PATCH /issues/{id}/content`: full-document replace behind a lint gate.
pub async fn patch_content(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<PatchContent>,
) -> Result<Json<IssueSummary>, ApiError> {
    let id = IssueId::parse(&id)
        .ok_or_else(|| ApiError::not_found(format!("not an issue id: {id}")))?;
    let path = find_issue(&state.paths.issues_root(), &id)
        .ok_or_else(|| ApiError::not_found(format!("issue not found: {id}")))?;

    let issue = Issue::parse(&req.content).map_err(ApiError::from)?;
    if issue.id != id {
        return Err(ApiError {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            class: monoco_core::ErrorClass::Validation,
            message: format!("content carries id {}, path says {id}", issue.id),
        });
    }

    let known = scan_issues(&state.paths.issues_root())
        .into_iter()
        .map(|(_, i)| i.id.as_str().to_string())
        .collect();
    let violations = lint_issue(&issue, &path, &known);
    if !violations.is_empty() {
        return Err(ApiError {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            class: monoco_core::ErrorClass::Validation,
            message: violations
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        });
    }

    issue.save(&path).map_err(ApiError::from)?;
    Ok(Json(IssueSummary::from(&issue)))
}
