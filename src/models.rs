//! Data models for normalized stories, articles, and the response envelopes.
//!
//! This module defines the caller-facing shapes the relay produces:
//! - [`TopStory`]: one item from a Top Stories section feed
//! - [`Article`]: one document from an Article Search result page
//! - [`AggregatedResult`]: the ordered results plus a total, as returned by the service
//! - [`SearchQuery`]: the validated search parameters
//! - [`TopStoriesResponse`] / [`ArticleSearchResponse`]: JSON bodies of the two endpoints
//!
//! Every value here is created per request and dropped once serialized.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A story from the NYT Top Stories API.
///
/// All fields are copied verbatim from the upstream item. Missing fields are
/// empty strings, and `published_date` is never reparsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TopStory {
    /// Story headline.
    pub title: String,
    /// Editorial section the story belongs to (e.g. "arts").
    pub section: String,
    /// Absolute URL of the story on nytimes.com.
    pub url: String,
    /// Short summary of the story.
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Publication timestamp as reported upstream.
    pub published_date: String,
}

/// An article from the NYT Article Search API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Article {
    /// The main headline (`headline.main` upstream).
    pub headline: String,
    /// Search snippet.
    pub snippet: String,
    /// Absolute URL of the article.
    pub web_url: String,
    /// Publication timestamp as reported upstream.
    pub pub_date: String,
}

/// Ordered results of one logical operation plus its total.
///
/// For top stories `total` is always `results.len()`. For search it is the
/// upstream hit count, which is usually larger than the page returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedResult<T> {
    pub results: Vec<T>,
    pub total: u64,
}

impl<T> AggregatedResult<T> {
    /// Build a result whose total is the local count.
    pub fn counted(results: Vec<T>) -> Self {
        let total = results.len() as u64;
        Self { results, total }
    }
}

/// Validated Article Search parameters.
///
/// No ordering is enforced between `begin_date` and `end_date`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub q: String,
    pub begin_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Body of `GET /nytimes/topstories`.
#[derive(Debug, Deserialize, Serialize)]
pub struct TopStoriesResponse {
    pub results: Vec<TopStory>,
    /// Total number of stories returned.
    pub total: u64,
}

impl From<AggregatedResult<TopStory>> for TopStoriesResponse {
    fn from(agg: AggregatedResult<TopStory>) -> Self {
        Self {
            results: agg.results,
            total: agg.total,
        }
    }
}

/// Body of `GET /nytimes/articlesearch`.
#[derive(Debug, Deserialize, Serialize)]
pub struct ArticleSearchResponse {
    pub results: Vec<Article>,
    /// Total number of articles found upstream.
    pub total: u64,
    /// The search query that was used.
    pub query: String,
}

impl ArticleSearchResponse {
    pub fn new(agg: AggregatedResult<Article>, query: String) -> Self {
        Self {
            results: agg.results,
            total: agg.total,
            query,
        }
    }
}
