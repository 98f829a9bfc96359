//! New York Times aggregation service.
//!
//! Turns the two caller-facing operations into upstream calls through
//! [`UpstreamClient`] and normalizes the responses:
//!
//! | Operation | Upstream calls | Total |
//! |-----------|----------------|-------|
//! | [`NytService::get_top_stories`] | one per category, sequential | local count |
//! | [`NytService::search_articles`] | one | `response.meta.hits` |
//!
//! Any upstream failure aborts the operation; nothing partial is returned.
//! Individual items that are not JSON objects are skipped, and missing fields
//! inside an item become empty strings.

use crate::api::{QueryParams, UpstreamClient};
use crate::config::Settings;
use crate::error::NytError;
use crate::models::{AggregatedResult, Article, SearchQuery, TopStory};
use crate::utils::{section_url, str_field, upstream_date};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Aggregation service for Top Stories and Article Search.
#[derive(Debug, Clone)]
pub struct NytService {
    client: UpstreamClient,
    api_key: String,
    top_stories_url: String,
    article_search_url: String,
}

impl NytService {
    pub fn new(client: UpstreamClient, settings: &Settings) -> Self {
        Self {
            client,
            api_key: settings.api_key.clone(),
            top_stories_url: settings.top_stories_url.clone(),
            article_search_url: settings.article_search_url.clone(),
        }
    }

    fn base_params(&self) -> QueryParams {
        vec![("api-key", self.api_key.clone())]
    }

    /// Fetch up to `stories_per_category` stories from each category, in order.
    ///
    /// Categories are requested one after another. The first failing category
    /// aborts the whole call.
    #[instrument(level = "info", skip_all, fields(categories = categories.len(), stories_per_category = stories_per_category))]
    pub async fn get_top_stories(
        &self,
        categories: &[String],
        stories_per_category: usize,
    ) -> Result<AggregatedResult<TopStory>, NytError> {
        let t0 = Instant::now();
        let mut all_stories = Vec::new();

        for category in categories {
            let url = section_url(&self.top_stories_url, category);
            let data = self.client.fetch(&url, &self.base_params()).await.inspect_err(|e| {
                warn!(%category, kind = e.kind(), error = %e, "Top stories fetch failed; aborting");
            })?;

            let items = data
                .get("results")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let before = all_stories.len();
            all_stories.extend(
                items
                    .iter()
                    .take(stories_per_category)
                    .filter_map(|item| normalize_story(item, category)),
            );
            debug!(
                %category,
                upstream = items.len(),
                kept = all_stories.len() - before,
                "Normalized category"
            );
        }

        info!(
            count = all_stories.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "Fetched top stories"
        );
        Ok(AggregatedResult::counted(all_stories))
    }

    /// Search articles; `total` is the upstream hit count.
    #[instrument(level = "info", skip_all, fields(q = %query.q, begin_date = ?query.begin_date, end_date = ?query.end_date))]
    pub async fn search_articles(&self, query: &SearchQuery) -> Result<AggregatedResult<Article>, NytError> {
        let t0 = Instant::now();
        let params = self.search_params(query);

        let data = self.client.fetch(&self.article_search_url, &params).await?;

        let response = data.get("response");
        let docs = response
            .and_then(|r| r.get("docs"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let articles: Vec<Article> = docs.iter().filter_map(normalize_article).collect();
        let total = response
            .and_then(|r| r.pointer("/meta/hits"))
            .and_then(Value::as_u64)
            .unwrap_or(0);

        info!(
            count = articles.len(),
            total,
            elapsed_ms = t0.elapsed().as_millis(),
            "Searched articles"
        );
        Ok(AggregatedResult {
            results: articles,
            total,
        })
    }

    /// Build Article Search parameters; absent dates are omitted entirely.
    fn search_params(&self, query: &SearchQuery) -> QueryParams {
        let mut params = self.base_params();
        params.push(("q", query.q.clone()));
        if let Some(d) = query.begin_date {
            params.push(("begin_date", upstream_date(d)));
        }
        if let Some(d) = query.end_date {
            params.push(("end_date", upstream_date(d)));
        }
        params
    }
}

fn normalize_story(item: &Value, category: &str) -> Option<TopStory> {
    if !item.is_object() {
        warn!(%category, item = %item, "Skipping malformed top story");
        return None;
    }
    Some(TopStory {
        title: str_field(item, "title"),
        section: str_field(item, "section"),
        url: str_field(item, "url"),
        abstract_text: str_field(item, "abstract"),
        published_date: str_field(item, "published_date"),
    })
}

fn normalize_article(doc: &Value) -> Option<Article> {
    if !doc.is_object() {
        warn!(doc = %doc, "Skipping malformed search doc");
        return None;
    }
    let headline = doc
        .get("headline")
        .map(|h| str_field(h, "main"))
        .unwrap_or_default();
    Some(Article {
        headline,
        snippet: str_field(doc, "snippet"),
        web_url: str_field(doc, "web_url"),
        pub_date: str_field(doc, "pub_date"),
    })
}
