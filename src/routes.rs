//! HTTP routes for the relay.
//!
//! | Route | Handler |
//! |-------|---------|
//! | `GET /` | [`root`] |
//! | `GET /nytimes/topstories` | [`top_stories`] |
//! | `GET /nytimes/articlesearch` | [`article_search`] |

use crate::config::Settings;
use crate::error::ApiError;
use crate::models::{ArticleSearchResponse, SearchQuery, TopStoriesResponse};
use crate::nyt::NytService;
use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    routing::get,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, instrument};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub nyt: Arc<NytService>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(nyt: NytService, settings: Settings) -> Self {
        Self {
            nyt: Arc::new(nyt),
            settings: Arc::new(settings),
        }
    }
}

/// Build the application router with CORS and request tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .nest(
            "/nytimes",
            Router::new()
                .route("/topstories", get(top_stories))
                .route("/articlesearch", get(article_search)),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Basic API information.
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": format!("Welcome to the {}", state.settings.app_name),
    }))
}

/// Top stories from every configured category.
#[instrument(level = "info", skip_all)]
pub async fn top_stories(State(state): State<AppState>) -> Result<Json<TopStoriesResponse>, ApiError> {
    let settings = &state.settings;
    let agg = state
        .nyt
        .get_top_stories(&settings.categories, settings.stories_per_category)
        .await
        .map_err(|e| ApiError::internal("Failed to retrieve top stories", &e))?;

    info!(total = agg.total, "Serving top stories");
    Ok(Json(agg.into()))
}

/// Raw query string of `GET /nytimes/articlesearch`.
#[derive(Debug, Deserialize)]
pub struct ArticleSearchParams {
    pub q: Option<String>,
    pub begin_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl TryFrom<ArticleSearchParams> for SearchQuery {
    type Error = ApiError;

    fn try_from(params: ArticleSearchParams) -> Result<Self, Self::Error> {
        let q = params
            .q
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| ApiError::Validation("query parameter `q` is required".to_string()))?;
        Ok(SearchQuery {
            q,
            begin_date: params.begin_date,
            end_date: params.end_date,
        })
    }
}

/// Keyword search with optional `YYYY-MM-DD` date bounds.
#[instrument(level = "info", skip_all)]
pub async fn article_search(
    State(state): State<AppState>,
    params: Result<Query<ArticleSearchParams>, QueryRejection>,
) -> Result<Json<ArticleSearchResponse>, ApiError> {
    let Query(params) = params.map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
    let query = SearchQuery::try_from(params)?;

    let agg = state
        .nyt
        .search_articles(&query)
        .await
        .map_err(|e| ApiError::internal("Failed to search articles", &e))?;

    info!(q = %query.q, count = agg.results.len(), total = agg.total, "Serving article search");
    Ok(Json(ArticleSearchResponse::new(agg, query.q)))
}
