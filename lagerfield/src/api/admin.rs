use std::collections::BTreeMap;

use axum::{Json, Router, extract::State, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{AdminOnly, ApiError, AppState, contact::recent_submissions, insights::sorted_insights};
use crate::models::{ContactSubmission, Insight, Service, TeamMember};

const RECENT_ACTIVITY: usize = 10;
const RECENT_INSIGHTS: usize = 5;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/statistics", get(statistics))
        .route("/activity", get(activity))
        .route("/insights-overview", get(insights_overview))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    total_insights: u64,
    total_services: u64,
    total_team_members: u64,
    total_contact_submissions: u64,
}

#[derive(Debug, Serialize)]
struct ActivityEntry {
    id: String,
    name: String,
    email: String,
    subject: String,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct InsightSummary {
    id: String,
    title: String,
    author: String,
    date: DateTime<Utc>,
    tags: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InsightsOverview {
    total_insights: usize,
    tag_distribution: BTreeMap<String, usize>,
    recent_insights: Vec<InsightSummary>,
}

async fn statistics(State(state): State<AppState>, _admin: AdminOnly) -> Result<Json<Statistics>, ApiError> {
    let (insights, services, team, contacts) = (
        state.repo::<Insight>(),
        state.repo::<Service>(),
        state.repo::<TeamMember>(),
        state.repo::<ContactSubmission>(),
    );
    let (insights, services, team, contacts) =
        tokio::try_join!(insights.count(), services.count(), team.count(), contacts.count())?;
    Ok(Json(Statistics {
        total_insights: insights,
        total_services: services,
        total_team_members: team,
        total_contact_submissions: contacts,
    }))
}

async fn activity(State(state): State<AppState>, _admin: AdminOnly) -> Result<Json<Vec<ActivityEntry>>, ApiError> {
    let entries = recent_submissions(&state)
        .await?
        .into_iter()
        .take(RECENT_ACTIVITY)
        .map(|contact| ActivityEntry {
            id: contact.id,
            name: contact.name,
            email: contact.email,
            subject: contact.subject,
            timestamp: contact.timestamp,
        })
        .collect();
    Ok(Json(entries))
}

async fn insights_overview(
    State(state): State<AppState>,
    _admin: AdminOnly,
) -> Result<Json<InsightsOverview>, ApiError> {
    let insights = sorted_insights(&state).await?;
    let mut tag_distribution = BTreeMap::new();
    for tag in insights.iter().flat_map(|insight| insight.tags.iter()) {
        *tag_distribution.entry(tag.clone()).or_insert(0) += 1;
    }
    let total_insights = insights.len();
    let recent_insights = insights
        .into_iter()
        .take(RECENT_INSIGHTS)
        .map(|insight| InsightSummary {
            id: insight.id,
            title: insight.title,
            author: insight.author,
            date: insight.date,
            tags: insight.tags,
        })
        .collect();
    Ok(Json(InsightsOverview {
        total_insights,
        tag_distribution,
        recent_insights,
    }))
}
