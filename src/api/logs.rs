// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Paginated transaction-log listing for operator back offices.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::storage::{LogRepository, StoredLog};
use crate::state::AppState;

/// Default page size when `per_page` is absent or unparseable.
const DEFAULT_PER_PAGE: u64 = 50;
/// Page-size ceiling under normal operation.
const MAX_PER_PAGE: u64 = 1000;
/// Raised ceiling when the caller passes `override_limit=true`.
const MAX_PER_PAGE_OVERRIDE: u64 = 2500;

/// Query parameters for the log listing.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListParams {
    /// 1-based page number.
    pub page: Option<String>,
    /// Page size, clamped to the allowed ceiling.
    pub per_page: Option<String>,
    /// Pass "true" to raise the page-size ceiling to 2500.
    pub override_limit: Option<String>,
}

/// One page of log entries, newest first.
#[derive(Debug, Serialize, ToSchema)]
pub struct LogPage {
    pub code: u16,
    pub status: String,
    pub page_item_count: usize,
    pub current_page: u64,
    pub data: Vec<StoredLog>,
    pub total: u64,
    pub per_page: u64,
    pub last_page: u64,
}

#[derive(Debug, Serialize, ToSchema)]
struct ListError {
    code: u16,
    status: String,
    message: String,
}

fn list_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ListError {
            code: status.as_u16(),
            status: "error".to_string(),
            message: message.into(),
        }),
    )
        .into_response()
}

fn effective_per_page(params: &ListParams) -> u64 {
    let requested = params
        .per_page
        .as_deref()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|&n| n >= 1)
        .unwrap_or(DEFAULT_PER_PAGE);
    let ceiling = if params.override_limit.as_deref() == Some("true") {
        MAX_PER_PAGE_OVERRIDE
    } else {
        MAX_PER_PAGE
    };
    requested.min(ceiling)
}

/// List transaction logs, newest first.
#[utoipa::path(
    get,
    path = "/list",
    tag = "Logs",
    params(ListParams),
    responses(
        (status = 200, description = "A page of log entries", body = LogPage),
        (status = 400, description = "Invalid page, no logs, or page out of range")
    )
)]
pub async fn list(State(state): State<AppState>, Query(params): Query<ListParams>) -> Response {
    let page = match params.page.as_deref() {
        None => 1,
        Some(raw) => match raw.parse::<u64>() {
            Ok(n) if n >= 1 => n,
            _ => {
                info!(page = ?params.page, "Log listing rejected: invalid page");
                return list_error(StatusCode::BAD_REQUEST, "Invalid page number");
            }
        },
    };
    let per_page = effective_per_page(&params);

    let entries = match LogRepository::new(&state.storage).list_desc() {
        Ok(entries) => entries,
        Err(e) => {
            return list_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };
    let total = entries.len() as u64;

    if total == 0 {
        return list_error(StatusCode::BAD_REQUEST, "No logs found");
    }

    let last_page = total.div_ceil(per_page);
    if page > last_page {
        return list_error(
            StatusCode::BAD_REQUEST,
            format!("Page {page} is out of range. Last page is {last_page}."),
        );
    }

    let offset = ((page - 1) * per_page) as usize;
    let data: Vec<StoredLog> = entries
        .into_iter()
        .skip(offset)
        .take(per_page as usize)
        .collect();

    info!(page, per_page, total, "Log listing served");
    Json(LogPage {
        code: 200,
        status: "success".to_string(),
        page_item_count: data.len(),
        current_page: page,
        data,
        total,
        per_page,
        last_page,
    })
    .into_response()
}
