//! Read-only projections: status lookup and email-scoped search.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use safari_types::{SearchPage, StatusView};

use crate::error::{FieldViolation, PlannerError, Result};
use crate::ports::{RequestStore, SearchCursor, SearchQuery};
use crate::validate::normalize_email;

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;

/// Caller-facing search parameters before normalization.
#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    pub email: String,
    /// Inclusive calendar-day bounds on creation time, UTC.
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub cursor: Option<String>,
    pub limit: Option<usize>,
}

pub struct StatusTracker {
    store: Arc<dyn RequestStore>,
}

impl StatusTracker {
    pub fn new(store: Arc<dyn RequestStore>) -> Self {
        Self { store }
    }

    /// Pure read; `NotFound` for unknown ids.
    pub async fn get_status(&self, request_id: Uuid) -> Result<StatusView> {
        self.store
            .load(request_id)
            .await?
            .map(|record| record.status_view())
            .ok_or_else(|| PlannerError::NotFound(format!("request {request_id}")))
    }

    /// Search one submitter's requests, ascending by creation time.
    ///
    /// Pages are keyset-continued: concatenating pages yields exactly the
    /// unpaginated result, and the final page carries no token.
    pub async fn search(&self, params: SearchParams) -> Result<SearchPage> {
        let email = normalize_email(&params.email);
        if email.is_empty() {
            return Err(PlannerError::Validation(vec![FieldViolation::new(
                "email",
                "search requires a submitter email",
            )]));
        }

        let cursor = match params.cursor.as_deref() {
            Some(token) => Some(SearchCursor::decode(token).map_err(|_| {
                PlannerError::Validation(vec![FieldViolation::new(
                    "cursor",
                    "malformed continuation token",
                )])
            })?),
            None => None,
        };

        let limit = params
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);

        let query = SearchQuery {
            email,
            created_from: params
                .from
                .map(|d| d.and_time(NaiveTime::MIN).and_utc()),
            // Upper bound is exclusive of the day after `to`, so `to` itself
            // stays inclusive.
            created_to: params
                .to
                .and_then(|d| d.succ_opt())
                .map(|d| d.and_time(NaiveTime::MIN).and_utc()),
            cursor,
            // One extra row tells us whether another page exists.
            limit: limit + 1,
        };

        let mut records = self.store.search(&query).await?;
        let next_cursor = if records.len() > limit {
            records.truncate(limit);
            records.last().map(|r| SearchCursor::after(r).encode())
        } else {
            None
        };

        Ok(SearchPage {
            items: records.iter().map(|r| r.summary()).collect(),
            next_cursor,
        })
    }
}
