//! # Editor Boundary Endpoints
//!
//! The page search and URL embed lookups the editor's link and embed
//! pickers call. Each endpoint returns a plain [`ApiResponse`] for the host's
//! HTTP layer to send.
//!
//! Downstream failures never reach the caller: a failed search answers `[]`,
//! a failed embed answers `null` with status 404.

pub mod embed;
pub mod pages;

use std::collections::HashMap;

use blockshift_config::OembedOptions;
use serde::Serialize;
use serde_json::{Value, json};

pub use embed::{EmbedError, EmbedProvider, EmbedRecord};
pub use pages::{InMemoryPages, PageRecord, PageSource, PageSourceError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl ApiResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Parsed body.
    pub fn json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.body)
    }
}

/// Wrap a payload; `None` becomes a 404 with a `null` body.
pub fn output(data: Option<Value>) -> ApiResponse {
    let status = if data.is_some() { 200 } else { 404 };
    let body = data.unwrap_or(Value::Null).to_string();
    ApiResponse {
        status,
        headers: vec![
            (
                "Content-Type".to_string(),
                "application/json; charset=utf-8".to_string(),
            ),
            ("Access-Control-Allow-Methods".to_string(), "GET".to_string()),
            ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
        ],
        body,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub search: String,
    /// Maximum number of results; `None` is unlimited.
    pub per_page: Option<usize>,
}

#[derive(Debug, Serialize)]
struct PostSummary<'a> {
    id: u64,
    title: RenderedTitle<'a>,
    link: &'a str,
}

#[derive(Debug, Serialize)]
struct RenderedTitle<'a> {
    rendered: &'a str,
}

/// Pages whose title contains the search text, most recently edited first.
pub fn posts(source: &dyn PageSource, query: &SearchQuery) -> ApiResponse {
    let mut pages = match source.pages_titled(&query.search) {
        Ok(pages) => pages,
        Err(err) => {
            log::warn!("Page search for {:?} failed: {err}", query.search);
            Vec::new()
        }
    };
    pages.sort_by(|a, b| b.last_edited.cmp(&a.last_edited));
    if let Some(limit) = query.per_page {
        pages.truncate(limit);
    }

    let summaries: Vec<PostSummary<'_>> = pages
        .iter()
        .map(|page| PostSummary {
            id: page.id,
            title: RenderedTitle {
                rendered: &page.title,
            },
            link: &page.link,
        })
        .collect();
    log::debug!("Page search for {:?} found {}", query.search, summaries.len());
    output(Some(json!(summaries)))
}

/// oEmbed metadata for `url`, or a 404 when there is none.
pub fn oembed(
    provider: &dyn EmbedProvider,
    url: Option<&str>,
    options: &OembedOptions,
) -> ApiResponse {
    let Some(url) = url.filter(|url| !url.is_empty()) else {
        return output(None);
    };
    match provider.fetch(url, options) {
        Ok(Some(record)) => output(Some(Value::Object(record))),
        Ok(None) => {
            log::debug!("No oEmbed data for {url}");
            output(None)
        }
        Err(err) => {
            log::warn!("Embed lookup failed: {err}");
            output(None)
        }
    }
}

/// Placeholder endpoint answering an empty list.
pub fn none() -> ApiResponse {
    output(Some(json!([])))
}

/// Dispatches named actions with query-string parameters to the endpoints.
pub struct ApiController<'a> {
    pub pages: &'a dyn PageSource,
    pub embeds: &'a dyn EmbedProvider,
    pub options: OembedOptions,
}

impl ApiController<'_> {
    /// Unknown actions answer 404. A `per_page` that is not a number is ignored.
    pub fn handle(&self, action: &str, params: &HashMap<String, String>) -> ApiResponse {
        match action {
            "posts" => {
                let query = SearchQuery {
                    search: params.get("search").cloned().unwrap_or_default(),
                    per_page: params
                        .get("per_page")
                        .and_then(|value| value.trim().parse().ok()),
                };
                posts(self.pages, &query)
            }
            "oembed" => oembed(
                self.embeds,
                params.get("url").map(String::as_str),
                &self.options,
            ),
            "none" => none(),
            other => {
                log::debug!("Unknown API action '{other}'");
                output(None)
            }
        }
    }
}
